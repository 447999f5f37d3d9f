//! PPF (Public Provident Fund) schedule: statutory contribution ceiling,
//! deposit-frequency caps, annual compounding, 15-year minimum lock-in.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::{FinCalcError, FinCalcResult};

/// Statutory per-financial-year contribution ceiling (₹1,50,000).
pub const PPF_ANNUAL_CEILING: Decimal = dec!(150000);

/// Statutory minimum tenure in years.
pub const PPF_MIN_TENURE_YEARS: u32 = 15;

/// Deposit cadence within a financial year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PpfFrequency {
    Monthly,
    Quarterly,
    HalfYearly,
    Yearly,
}

impl PpfFrequency {
    pub fn deposits_per_year(&self) -> u32 {
        match self {
            PpfFrequency::Monthly => 12,
            PpfFrequency::Quarterly => 4,
            PpfFrequency::HalfYearly => 2,
            PpfFrequency::Yearly => 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PpfInput {
    /// Amount per installment.
    pub installment: Money,
    pub frequency: PpfFrequency,
    /// Annual rate as a decimal fraction (the statutory rate, e.g. 0.071).
    pub annual_rate: Rate,
    pub tenure_years: u32,
    /// Calendar year in which the first financial year begins.
    pub start_year: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PpfYearlyRow {
    /// Calendar year in which this financial year begins.
    pub year: i32,
    pub opening_balance: Money,
    pub deposited: Money,
    pub interest: Money,
    pub closing_balance: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PpfSchedule {
    pub maturity_value: Money,
    pub total_deposited: Money,
    pub total_interest: Money,
    /// Annualised contribution as requested (installment × frequency).
    pub requested_annual_contribution: Money,
    /// Annualised contribution after the statutory ceiling clamp.
    pub applied_annual_contribution: Money,
    /// Tenure after the 15-year minimum is enforced.
    pub effective_tenure_years: u32,
    pub yearly_rows: Vec<PpfYearlyRow>,
}

/// Build a PPF schedule. Statutory violations are clamped and surfaced as
/// warnings, never errors.
pub fn build_ppf_schedule(input: &PpfInput) -> FinCalcResult<ComputationOutput<PpfSchedule>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.annual_rate < Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: "annual_rate".into(),
            reason: "Rate must not be negative".into(),
        });
    }

    let schedule = simulate(input, &mut warnings);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "PPF schedule (annual compounding, statutory caps)",
        &serde_json::json!({
            "installment": input.installment.to_string(),
            "frequency": format!("{:?}", input.frequency),
            "annual_rate": input.annual_rate.to_string(),
            "tenure_years": input.tenure_years,
        }),
        warnings,
        elapsed,
        schedule,
    ))
}

fn simulate(input: &PpfInput, warnings: &mut Vec<String>) -> PpfSchedule {
    let requested_annual = input.installment * Decimal::from(input.frequency.deposits_per_year());

    if input.installment <= Decimal::ZERO || input.tenure_years == 0 {
        return PpfSchedule {
            maturity_value: Decimal::ZERO,
            total_deposited: Decimal::ZERO,
            total_interest: Decimal::ZERO,
            requested_annual_contribution: requested_annual.max(Decimal::ZERO),
            applied_annual_contribution: Decimal::ZERO,
            effective_tenure_years: 0,
            yearly_rows: Vec::new(),
        };
    }

    let applied_annual = if requested_annual > PPF_ANNUAL_CEILING {
        warnings.push(format!(
            "Annualised contribution {requested_annual} exceeds the statutory ceiling {PPF_ANNUAL_CEILING}; clamped"
        ));
        PPF_ANNUAL_CEILING
    } else {
        requested_annual
    };

    let effective_tenure = if input.tenure_years < PPF_MIN_TENURE_YEARS {
        warnings.push(format!(
            "Tenure raised to the statutory {PPF_MIN_TENURE_YEARS}-year minimum"
        ));
        PPF_MIN_TENURE_YEARS
    } else {
        input.tenure_years
    };

    let mut balance = Decimal::ZERO;
    let mut total_interest = Decimal::ZERO;
    let mut yearly_rows = Vec::with_capacity(effective_tenure as usize);

    for y in 0..effective_tenure {
        let opening = balance;
        // Interest is credited once at financial-year end on the deposited
        // year balance.
        let interest = (opening + applied_annual) * input.annual_rate;
        balance = opening + applied_annual + interest;
        total_interest += interest;

        yearly_rows.push(PpfYearlyRow {
            year: input.start_year + y as i32,
            opening_balance: opening,
            deposited: applied_annual,
            interest,
            closing_balance: balance,
        });
    }

    let total_deposited = applied_annual * Decimal::from(effective_tenure);

    PpfSchedule {
        maturity_value: balance,
        total_deposited,
        total_interest,
        requested_annual_contribution: requested_annual,
        applied_annual_contribution: applied_annual,
        effective_tenure_years: effective_tenure,
        yearly_rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> PpfInput {
        PpfInput {
            installment: dec!(10000),
            frequency: PpfFrequency::Monthly,
            annual_rate: dec!(0.071),
            tenure_years: 15,
            start_year: 2024,
        }
    }

    #[test]
    fn test_fifteen_year_schedule() {
        let result = build_ppf_schedule(&input()).unwrap();
        let s = &result.result;

        assert_eq!(s.yearly_rows.len(), 15);
        assert_eq!(s.total_deposited, dec!(1800000));
        assert_eq!(s.maturity_value, s.total_deposited + s.total_interest);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_ceiling_clamp_warns() {
        let mut i = input();
        i.installment = dec!(20000); // 240,000 annualised
        let result = build_ppf_schedule(&i).unwrap();
        let s = &result.result;

        assert_eq!(s.requested_annual_contribution, dec!(240000));
        assert_eq!(s.applied_annual_contribution, PPF_ANNUAL_CEILING);
        assert!(!result.warnings.is_empty());
    }

    #[test]
    fn test_yearly_frequency_under_ceiling() {
        let mut i = input();
        i.installment = dec!(150000);
        i.frequency = PpfFrequency::Yearly;
        let result = build_ppf_schedule(&i).unwrap();

        assert_eq!(result.result.applied_annual_contribution, dec!(150000));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_short_tenure_raised_to_minimum() {
        let mut i = input();
        i.tenure_years = 10;
        let result = build_ppf_schedule(&i).unwrap();

        assert_eq!(result.result.effective_tenure_years, 15);
        assert!(!result.warnings.is_empty());
    }

    #[test]
    fn test_annual_compounding_identity() {
        let result = build_ppf_schedule(&input()).unwrap();
        for row in &result.result.yearly_rows {
            assert_eq!(
                row.closing_balance,
                row.opening_balance + row.deposited + row.interest
            );
            assert_eq!(
                row.interest,
                (row.opening_balance + row.deposited) * dec!(0.071)
            );
        }
    }

    #[test]
    fn test_degenerate_input_returns_empty() {
        let mut i = input();
        i.installment = Decimal::ZERO;
        let result = build_ppf_schedule(&i).unwrap();
        assert!(result.result.yearly_rows.is_empty());
        assert_eq!(result.result.maturity_value, Decimal::ZERO);
    }
}
