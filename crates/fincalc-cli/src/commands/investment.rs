use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use fincalc_core::calendar::Period;
use fincalc_core::investments::fixed_deposit::{self, FdInput, FdPayout, FdTenure};
use fincalc_core::investments::ppf::{self, PpfFrequency, PpfInput};
use fincalc_core::investments::rent_vs_buy::{self, RentVsBuyInput};
use fincalc_core::investments::sip::{self, SipInput};
use fincalc_core::investments::swp::{self, SwpInput};

use crate::input;

/// Arguments for a SIP projection
#[derive(Args)]
pub struct SipArgs {
    /// Monthly contribution
    #[arg(long)]
    pub monthly: Option<Decimal>,

    /// Annual return as a decimal fraction (e.g. 0.12 for 12%)
    #[arg(long)]
    pub annual_rate: Option<Decimal>,

    /// Tenure in months
    #[arg(long)]
    pub tenure_months: Option<u32>,

    /// Annual contribution step-up as a fraction (e.g. 0.10 for 10%)
    #[arg(long, default_value = "0")]
    pub step_up: Decimal,

    /// One-time lump sum invested up front
    #[arg(long)]
    pub lump_sum: Option<Decimal>,

    /// Stop contributing after this many months (limited-pay)
    #[arg(long)]
    pub contribution_months: Option<u32>,

    /// Start period as YYYY-MM (defaults to the current month)
    #[arg(long)]
    pub start: Option<Period>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a fixed-deposit schedule
#[derive(Args)]
pub struct FdArgs {
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual rate as a decimal fraction (e.g. 0.07 for 7%)
    #[arg(long)]
    pub annual_rate: Option<Decimal>,

    /// Tenure in months (mutually exclusive with --tenure-days)
    #[arg(long)]
    pub tenure_months: Option<u32>,

    /// Tenure in days (simple interest, no payout modes)
    #[arg(long)]
    pub tenure_days: Option<u32>,

    /// Payout mode: cumulative, monthly, quarterly, half-yearly or yearly
    #[arg(long, default_value = "cumulative")]
    pub payout: String,

    #[arg(long)]
    pub start: Option<Period>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a PPF projection
#[derive(Args)]
pub struct PpfArgs {
    /// Amount per installment
    #[arg(long)]
    pub installment: Option<Decimal>,

    /// Deposit cadence: monthly, quarterly, half-yearly or yearly
    #[arg(long, default_value = "yearly")]
    pub frequency: String,

    /// Annual rate as a decimal fraction (e.g. 0.071 for 7.1%)
    #[arg(long)]
    pub annual_rate: Option<Decimal>,

    /// Tenure in years (raised to the statutory 15-year minimum)
    #[arg(long, default_value = "15")]
    pub tenure_years: u32,

    /// Calendar year the first financial year begins (defaults to this year)
    #[arg(long)]
    pub start_year: Option<i32>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a systematic withdrawal plan
#[derive(Args)]
pub struct SwpArgs {
    /// Initial corpus
    #[arg(long)]
    pub corpus: Option<Decimal>,

    /// Monthly withdrawal
    #[arg(long)]
    pub withdrawal: Option<Decimal>,

    /// Annual return as a decimal fraction
    #[arg(long)]
    pub annual_rate: Option<Decimal>,

    /// Tenure in months
    #[arg(long)]
    pub tenure_months: Option<u32>,

    #[arg(long)]
    pub start: Option<Period>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the rent-vs-buy comparison
#[derive(Args)]
pub struct RentVsBuyArgs {
    #[arg(long)]
    pub home_price: Option<Decimal>,

    #[arg(long)]
    pub down_payment: Option<Decimal>,

    /// Annual rate on the financed portion
    #[arg(long)]
    pub loan_rate: Option<Decimal>,

    #[arg(long, default_value = "240")]
    pub loan_tenure_months: u32,

    /// Annual property appreciation as a fraction
    #[arg(long, default_value = "0.05")]
    pub appreciation: Decimal,

    #[arg(long)]
    pub monthly_rent: Option<Decimal>,

    /// Annual rent escalation as a fraction
    #[arg(long, default_value = "0.05")]
    pub rent_inflation: Decimal,

    /// Annual return on the renter's invested capital
    #[arg(long, default_value = "0.10")]
    pub investment_rate: Decimal,

    #[arg(long, default_value = "20")]
    pub horizon_years: u32,

    #[arg(long)]
    pub start: Option<Period>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_sip(args: SipArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sip_input: SipInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        SipInput {
            monthly_contribution: args
                .monthly
                .ok_or("--monthly is required (or provide --input)")?,
            annual_return_rate: args
                .annual_rate
                .ok_or("--annual-rate is required (or provide --input)")?,
            tenure_months: args
                .tenure_months
                .ok_or("--tenure-months is required (or provide --input)")?,
            annual_step_up: args.step_up,
            lump_sum: args.lump_sum,
            contribution_months: args.contribution_months,
            start: start_or_now(args.start)?,
        }
    };

    let result = sip::build_sip_schedule(&sip_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_fd(args: FdArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let fd_input: FdInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let tenure = match (args.tenure_months, args.tenure_days) {
            (Some(_), Some(_)) => {
                return Err("Give either --tenure-months or --tenure-days, not both".into())
            }
            (Some(m), None) => FdTenure::Months(m),
            (None, Some(d)) => FdTenure::Days(d),
            (None, None) => {
                return Err("--tenure-months or --tenure-days is required (or provide --input)".into())
            }
        };
        FdInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate: args
                .annual_rate
                .ok_or("--annual-rate is required (or provide --input)")?,
            tenure,
            payout: parse_payout(&args.payout)?,
            start: start_or_now(args.start)?,
        }
    };

    let result = fixed_deposit::build_fd_schedule(&fd_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_ppf(args: PpfArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let ppf_input: PpfInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        PpfInput {
            installment: args
                .installment
                .ok_or("--installment is required (or provide --input)")?,
            frequency: parse_ppf_frequency(&args.frequency)?,
            annual_rate: args
                .annual_rate
                .ok_or("--annual-rate is required (or provide --input)")?,
            tenure_years: args.tenure_years,
            start_year: match args.start_year {
                Some(y) => y,
                None => super::current_period()?.year,
            },
        }
    };

    let result = ppf::build_ppf_schedule(&ppf_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_swp(args: SwpArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let swp_input: SwpInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        SwpInput {
            initial_corpus: args
                .corpus
                .ok_or("--corpus is required (or provide --input)")?,
            monthly_withdrawal: args
                .withdrawal
                .ok_or("--withdrawal is required (or provide --input)")?,
            annual_return_rate: args
                .annual_rate
                .ok_or("--annual-rate is required (or provide --input)")?,
            tenure_months: args
                .tenure_months
                .ok_or("--tenure-months is required (or provide --input)")?,
            start: start_or_now(args.start)?,
        }
    };

    let result = swp::build_swp_schedule(&swp_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_rent_vs_buy(args: RentVsBuyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let rvb_input: RentVsBuyInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        RentVsBuyInput {
            home_price: args
                .home_price
                .ok_or("--home-price is required (or provide --input)")?,
            down_payment: args
                .down_payment
                .ok_or("--down-payment is required (or provide --input)")?,
            loan_annual_rate: args
                .loan_rate
                .ok_or("--loan-rate is required (or provide --input)")?,
            loan_tenure_months: args.loan_tenure_months,
            property_appreciation_rate: args.appreciation,
            monthly_rent: args
                .monthly_rent
                .ok_or("--monthly-rent is required (or provide --input)")?,
            annual_rent_inflation: args.rent_inflation,
            investment_return_rate: args.investment_rate,
            horizon_years: args.horizon_years,
            start: start_or_now(args.start)?,
        }
    };

    let result = rent_vs_buy::build_rent_vs_buy_ledger(&rvb_input)?;
    Ok(serde_json::to_value(result)?)
}

fn start_or_now(start: Option<Period>) -> Result<Period, Box<dyn std::error::Error>> {
    match start {
        Some(p) => Ok(p),
        None => super::current_period(),
    }
}

fn parse_payout(s: &str) -> Result<FdPayout, Box<dyn std::error::Error>> {
    match s.to_ascii_lowercase().as_str() {
        "cumulative" => Ok(FdPayout::Cumulative),
        "monthly" => Ok(FdPayout::Monthly),
        "quarterly" => Ok(FdPayout::Quarterly),
        "half-yearly" | "halfyearly" => Ok(FdPayout::HalfYearly),
        "yearly" => Ok(FdPayout::Yearly),
        other => Err(format!("Unknown payout mode '{}'", other).into()),
    }
}

fn parse_ppf_frequency(s: &str) -> Result<PpfFrequency, Box<dyn std::error::Error>> {
    match s.to_ascii_lowercase().as_str() {
        "monthly" => Ok(PpfFrequency::Monthly),
        "quarterly" => Ok(PpfFrequency::Quarterly),
        "half-yearly" | "halfyearly" => Ok(PpfFrequency::HalfYearly),
        "yearly" => Ok(PpfFrequency::Yearly),
        other => Err(format!("Unknown deposit frequency '{}'", other).into()),
    }
}
