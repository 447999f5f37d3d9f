use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use fincalc_core::rates;
use fincalc_core::tax::{calculate_ltcg, LtcgConfig};
use fincalc_core::types::Currency;

/// Arguments for the LTCG overlay
#[derive(Args)]
pub struct LtcgArgs {
    /// Realised gain
    #[arg(long)]
    pub gain: Decimal,

    /// Amount originally invested
    #[arg(long)]
    pub invested: Decimal,

    /// Tax rate as a fraction (0.10) or percentage (10)
    #[arg(long)]
    pub tax_rate: Decimal,

    /// Currency code (INR, USD, EUR, GBP, or anything else)
    #[arg(long, default_value = "INR")]
    pub currency: String,

    /// Exemption to apply, clamped to the currency ceiling
    #[arg(long)]
    pub exemption: Option<Decimal>,
}

/// Arguments for a CAGR computation
#[derive(Args)]
pub struct CagrArgs {
    /// Starting value
    #[arg(long)]
    pub start_value: Decimal,

    /// Ending value
    #[arg(long)]
    pub end_value: Decimal,

    /// Holding period in years (fractional allowed)
    #[arg(long)]
    pub years: Decimal,
}

pub fn run_ltcg(args: LtcgArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config = LtcgConfig {
        tax_rate: args.tax_rate,
        currency: parse_currency(&args.currency),
        exemption_applied: args.exemption.is_some(),
        exemption_limit: args.exemption.unwrap_or(Decimal::ZERO),
    };
    let result = calculate_ltcg(args.gain, args.invested, true, &config)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_cagr(args: CagrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let cagr = rates::cagr(args.start_value, args.end_value, args.years);
    Ok(serde_json::json!({ "cagr": cagr.to_string() }))
}

fn parse_currency(s: &str) -> Currency {
    match s.to_ascii_uppercase().as_str() {
        "INR" => Currency::INR,
        "USD" => Currency::USD,
        "EUR" => Currency::EUR,
        "GBP" => Currency::GBP,
        _ => Currency::Other(s.to_string()),
    }
}
