use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use fincalc_core::calendar::Period;
use fincalc_core::loans::advanced::{
    self, AdvancedLoanInput, EmiStepUp, Prepayment, PrepaymentFrequency, PrepaymentStrategy,
    RateChange,
};
use fincalc_core::loans::basic::{self, LoanInput};
use fincalc_core::loans::moratorium::{self, MoratoriumLoanInput, MoratoriumTreatment};
use fincalc_core::loans::stepup::{self, StepUpLoanInput};
use fincalc_core::loans::topup::{self, LoanTerms, TopUpLoanInput};
use fincalc_core::rates;

use crate::input;

/// Arguments for a quick EMI computation
#[derive(Args)]
pub struct EmiArgs {
    /// Loan principal
    #[arg(long)]
    pub principal: Decimal,

    /// Annual rate as a decimal fraction (e.g. 0.10 for 10%)
    #[arg(long)]
    pub annual_rate: Decimal,

    /// Tenure in months
    #[arg(long)]
    pub tenure_months: u32,
}

/// Arguments for a full amortisation schedule
#[derive(Args)]
pub struct LoanArgs {
    /// Loan principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual rate as a decimal fraction (e.g. 0.10 for 10%)
    #[arg(long)]
    pub annual_rate: Option<Decimal>,

    /// Tenure in months
    #[arg(long)]
    pub tenure_months: Option<u32>,

    /// Supplied EMI (derived from the terms when omitted)
    #[arg(long)]
    pub emi: Option<Decimal>,

    /// Start period as YYYY-MM (defaults to the current month)
    #[arg(long)]
    pub start: Option<Period>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for an advanced schedule with prepayments, rate changes and
/// EMI step-ups
#[derive(Args)]
pub struct AdvancedLoanArgs {
    #[arg(long)]
    pub principal: Option<Decimal>,

    #[arg(long)]
    pub annual_rate: Option<Decimal>,

    #[arg(long)]
    pub tenure_months: Option<u32>,

    #[arg(long)]
    pub emi: Option<Decimal>,

    /// Recurring prepayment amount
    #[arg(long)]
    pub prepay_amount: Option<Decimal>,

    /// Month the prepayments begin (1-based)
    #[arg(long, default_value = "1")]
    pub prepay_from_month: u32,

    /// Prepayment cadence: once, monthly, quarterly or yearly
    #[arg(long, default_value = "yearly")]
    pub prepay_frequency: String,

    /// What prepayments reduce: reduce-tenure or reduce-emi
    #[arg(long, default_value = "reduce-tenure")]
    pub strategy: String,

    /// Month a new rate takes effect (requires --new-rate)
    #[arg(long)]
    pub rate_change_month: Option<u32>,

    /// New annual rate from --rate-change-month onward
    #[arg(long)]
    pub new_rate: Option<Decimal>,

    /// Annual EMI step-up as a fraction (e.g. 0.05 for 5%)
    #[arg(long)]
    pub step_up_percent: Option<Decimal>,

    /// Annual EMI step-up as an absolute amount
    #[arg(long)]
    pub step_up_absolute: Option<Decimal>,

    /// Fiscal year start month (e.g. 4 for April) to add fiscal-year rollups
    #[arg(long)]
    pub fiscal_start_month: Option<u32>,

    #[arg(long)]
    pub start: Option<Period>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a base-plus-top-up schedule
#[derive(Args)]
pub struct TopupLoanArgs {
    #[arg(long)]
    pub principal: Option<Decimal>,

    #[arg(long)]
    pub annual_rate: Option<Decimal>,

    #[arg(long)]
    pub tenure_months: Option<u32>,

    /// Top-up principal
    #[arg(long)]
    pub topup_principal: Option<Decimal>,

    /// Top-up annual rate (defaults to the base rate)
    #[arg(long)]
    pub topup_rate: Option<Decimal>,

    /// Top-up tenure in months
    #[arg(long)]
    pub topup_tenure_months: Option<u32>,

    /// Month (1-based, on the base schedule) the top-up disburses
    #[arg(long)]
    pub topup_start_month: Option<u32>,

    #[arg(long)]
    pub start: Option<Period>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a schedule with an initial payment holiday
#[derive(Args)]
pub struct MoratoriumLoanArgs {
    #[arg(long)]
    pub principal: Option<Decimal>,

    #[arg(long)]
    pub annual_rate: Option<Decimal>,

    #[arg(long)]
    pub tenure_months: Option<u32>,

    /// Length of the payment holiday in months
    #[arg(long)]
    pub moratorium_months: Option<u32>,

    /// Holiday interest treatment: interest-only or capitalize
    #[arg(long, default_value = "capitalize")]
    pub treatment: String,

    #[arg(long)]
    pub start: Option<Period>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a schedule whose EMI rises on each anniversary
#[derive(Args)]
pub struct StepupLoanArgs {
    #[arg(long)]
    pub principal: Option<Decimal>,

    #[arg(long)]
    pub annual_rate: Option<Decimal>,

    #[arg(long)]
    pub tenure_months: Option<u32>,

    #[arg(long)]
    pub emi: Option<Decimal>,

    /// Annual step-up as a fraction (e.g. 0.05 for 5%)
    #[arg(long)]
    pub step_percent: Option<Decimal>,

    /// Annual step-up as an absolute amount
    #[arg(long)]
    pub step_absolute: Option<Decimal>,

    #[arg(long)]
    pub start: Option<Period>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_emi(args: EmiArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let emi = rates::emi(args.principal, args.annual_rate / dec!(12), args.tenure_months)?;
    Ok(serde_json::json!({ "emi": emi.to_string() }))
}

pub fn run_loan(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan_input: LoanInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        LoanInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate: args
                .annual_rate
                .ok_or("--annual-rate is required (or provide --input)")?,
            tenure_months: args
                .tenure_months
                .ok_or("--tenure-months is required (or provide --input)")?,
            emi: args.emi,
            start: start_or_now(args.start)?,
        }
    };

    let result = basic::build_loan_schedule(&loan_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_advanced_loan(args: AdvancedLoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan_input: AdvancedLoanInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let prepayments = match args.prepay_amount {
            Some(amount) => vec![Prepayment {
                from_month: args.prepay_from_month,
                amount,
                frequency: parse_frequency(&args.prepay_frequency)?,
            }],
            None => Vec::new(),
        };
        let rate_changes = match (args.rate_change_month, args.new_rate) {
            (Some(from_month), Some(annual_rate)) => vec![RateChange {
                from_month,
                annual_rate,
            }],
            (None, None) => Vec::new(),
            _ => return Err("--rate-change-month and --new-rate must be given together".into()),
        };

        AdvancedLoanInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate: args
                .annual_rate
                .ok_or("--annual-rate is required (or provide --input)")?,
            tenure_months: args
                .tenure_months
                .ok_or("--tenure-months is required (or provide --input)")?,
            emi: args.emi,
            start: start_or_now(args.start)?,
            prepayments,
            rate_changes,
            emi_step_up: parse_step_up(args.step_up_percent, args.step_up_absolute)?,
            strategy: parse_strategy(&args.strategy)?,
            fiscal_start_month: args.fiscal_start_month,
        }
    };

    let result = advanced::build_advanced_loan_schedule(&loan_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_topup_loan(args: TopupLoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan_input: TopUpLoanInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let annual_rate = args
            .annual_rate
            .ok_or("--annual-rate is required (or provide --input)")?;
        TopUpLoanInput {
            base: LoanTerms {
                principal: args
                    .principal
                    .ok_or("--principal is required (or provide --input)")?,
                annual_rate,
                tenure_months: args
                    .tenure_months
                    .ok_or("--tenure-months is required (or provide --input)")?,
                emi: None,
            },
            top_up: LoanTerms {
                principal: args
                    .topup_principal
                    .ok_or("--topup-principal is required (or provide --input)")?,
                annual_rate: args.topup_rate.unwrap_or(annual_rate),
                tenure_months: args
                    .topup_tenure_months
                    .ok_or("--topup-tenure-months is required (or provide --input)")?,
                emi: None,
            },
            top_up_start_month: args
                .topup_start_month
                .ok_or("--topup-start-month is required (or provide --input)")?,
            start: start_or_now(args.start)?,
        }
    };

    let result = topup::build_top_up_loan_schedule(&loan_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_moratorium_loan(args: MoratoriumLoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan_input: MoratoriumLoanInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        MoratoriumLoanInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate: args
                .annual_rate
                .ok_or("--annual-rate is required (or provide --input)")?,
            tenure_months: args
                .tenure_months
                .ok_or("--tenure-months is required (or provide --input)")?,
            moratorium_months: args
                .moratorium_months
                .ok_or("--moratorium-months is required (or provide --input)")?,
            treatment: parse_treatment(&args.treatment)?,
            start: start_or_now(args.start)?,
        }
    };

    let result = moratorium::build_moratorium_loan_schedule(&loan_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_stepup_loan(args: StepupLoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan_input: StepUpLoanInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let step = parse_step_up(args.step_percent, args.step_absolute)?
            .ok_or("--step-percent or --step-absolute is required (or provide --input)")?;
        StepUpLoanInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate: args
                .annual_rate
                .ok_or("--annual-rate is required (or provide --input)")?,
            tenure_months: args
                .tenure_months
                .ok_or("--tenure-months is required (or provide --input)")?,
            emi: args.emi,
            step,
            start: start_or_now(args.start)?,
        }
    };

    let result = stepup::build_step_up_loan_schedule(&loan_input)?;
    Ok(serde_json::to_value(result)?)
}

fn start_or_now(start: Option<Period>) -> Result<Period, Box<dyn std::error::Error>> {
    match start {
        Some(p) => Ok(p),
        None => super::current_period(),
    }
}

fn parse_frequency(s: &str) -> Result<PrepaymentFrequency, Box<dyn std::error::Error>> {
    match s.to_ascii_lowercase().as_str() {
        "once" => Ok(PrepaymentFrequency::Once),
        "monthly" => Ok(PrepaymentFrequency::Monthly),
        "quarterly" => Ok(PrepaymentFrequency::Quarterly),
        "yearly" => Ok(PrepaymentFrequency::Yearly),
        other => Err(format!("Unknown prepayment frequency '{}'", other).into()),
    }
}

fn parse_strategy(s: &str) -> Result<PrepaymentStrategy, Box<dyn std::error::Error>> {
    match s.to_ascii_lowercase().as_str() {
        "reduce-tenure" => Ok(PrepaymentStrategy::ReduceTenure),
        "reduce-emi" => Ok(PrepaymentStrategy::ReduceEmi),
        other => Err(format!("Unknown prepayment strategy '{}'", other).into()),
    }
}

fn parse_treatment(s: &str) -> Result<MoratoriumTreatment, Box<dyn std::error::Error>> {
    match s.to_ascii_lowercase().as_str() {
        "interest-only" => Ok(MoratoriumTreatment::InterestOnly),
        "capitalize" | "capitalise" => Ok(MoratoriumTreatment::Capitalize),
        other => Err(format!("Unknown moratorium treatment '{}'", other).into()),
    }
}

fn parse_step_up(
    percent: Option<Decimal>,
    absolute: Option<Decimal>,
) -> Result<Option<EmiStepUp>, Box<dyn std::error::Error>> {
    match (percent, absolute) {
        (Some(_), Some(_)) => Err("Give either a percent or an absolute step-up, not both".into()),
        (Some(p), None) => Ok(Some(EmiStepUp::Percent(p))),
        (None, Some(a)) => Ok(Some(EmiStepUp::Absolute(a))),
        (None, None) => Ok(None),
    }
}
