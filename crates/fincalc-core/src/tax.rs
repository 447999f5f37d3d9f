//! LTCG (long-term capital gains) overlay, applied post-hoc to any
//! investment result. Out-of-policy rates and exemptions are normalised and
//! clamped, never rejected.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Currency, Money, Rate};
use crate::FinCalcResult;

/// Policy ceiling on the applicable tax rate.
pub const MAX_LTCG_RATE: Decimal = dec!(0.35);

/// Per-currency ceiling on the exemption amount.
pub fn exemption_ceiling(currency: &Currency) -> Money {
    match currency {
        Currency::INR => dec!(200000),
        Currency::USD | Currency::EUR | Currency::GBP | Currency::Other(_) => dec!(100000),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LtcgConfig {
    /// Accepts either a fraction (0.10) or a percentage (10); values above
    /// 1 are treated as percentages.
    pub tax_rate: Decimal,
    #[serde(default)]
    pub currency: Currency,
    #[serde(default)]
    pub exemption_applied: bool,
    #[serde(default)]
    pub exemption_limit: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LtcgOutput {
    /// Tax due, rounded to the nearest whole currency unit exactly once.
    pub tax_amount: Money,
    pub taxable_gain: Money,
    /// Exemption after clamping to the currency ceiling; compare with the
    /// requested `exemption_limit` to detect the clamp.
    pub exemption_used: Money,
    pub tax_rate_used: Rate,
    pub net_gain: Money,
    pub net_future_value: Money,
}

/// Apply the LTCG overlay to a realised gain.
///
/// When `applied` is false or the gain is non-positive, tax is zero and net
/// values equal gross.
pub fn calculate_ltcg(
    gain: Money,
    invested: Money,
    applied: bool,
    config: &LtcgConfig,
) -> FinCalcResult<LtcgOutput> {
    if !applied || gain <= Decimal::ZERO {
        return Ok(LtcgOutput {
            tax_amount: Decimal::ZERO,
            taxable_gain: Decimal::ZERO,
            exemption_used: Decimal::ZERO,
            tax_rate_used: Decimal::ZERO,
            net_gain: gain,
            net_future_value: invested + gain,
        });
    }

    let normalised = if config.tax_rate > Decimal::ONE {
        config.tax_rate / dec!(100)
    } else {
        config.tax_rate
    };
    let rate = normalised.clamp(Decimal::ZERO, MAX_LTCG_RATE);

    let exemption_used = if config.exemption_applied {
        config
            .exemption_limit
            .clamp(Decimal::ZERO, exemption_ceiling(&config.currency))
    } else {
        Decimal::ZERO
    };

    let taxable_gain = (gain - exemption_used).max(Decimal::ZERO);
    let tax_amount = (taxable_gain * rate)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let net_gain = gain - tax_amount;

    Ok(LtcgOutput {
        tax_amount,
        taxable_gain,
        exemption_used,
        tax_rate_used: rate,
        net_gain,
        net_future_value: invested + net_gain,
    })
}
