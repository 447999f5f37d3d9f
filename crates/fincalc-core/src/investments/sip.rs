//! SIP growth schedules: plain, step-up, SIP+lump, and limited-pay in one
//! engine.
//!
//! The per-month recurrence is growth-then-deposit:
//! `balance = balance * (1 + r) + contribution`. The closed form in
//! `rates::sip_future_value` is derived from this same recurrence and the
//! two are tested against each other.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::calendar::Period;
use crate::investments::{
    aggregate_investment_by_year, InvestmentMonthlyRow, InvestmentYearlyRow,
};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::{FinCalcError, FinCalcResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SipInput {
    pub monthly_contribution: Money,
    /// Annual return as a decimal fraction.
    pub annual_return_rate: Rate,
    pub tenure_months: u32,
    /// Contribution increase applied on each anniversary (0 = plain SIP).
    #[serde(default)]
    pub annual_step_up: Rate,
    /// One-time investment made before the first month's growth.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lump_sum: Option<Money>,
    /// Stop contributing after this many months while the balance keeps
    /// compounding to the full tenure (limited pay).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contribution_months: Option<u32>,
    pub start: Period,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SipSchedule {
    pub monthly_rows: Vec<InvestmentMonthlyRow>,
    pub yearly_rows: Vec<InvestmentYearlyRow>,
    pub total_invested: Money,
    pub growth: Money,
    pub maturity_value: Money,
}

/// Build a month-by-month SIP schedule.
pub fn build_sip_schedule(input: &SipInput) -> FinCalcResult<ComputationOutput<SipSchedule>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.annual_return_rate < Decimal::NEGATIVE_ONE {
        return Err(FinCalcError::InvalidInput {
            field: "annual_return_rate".into(),
            reason: "Rate must be greater than -100%".into(),
        });
    }
    if let Some(cm) = input.contribution_months {
        if cm > input.tenure_months {
            warnings.push(format!(
                "contribution_months {cm} exceeds the tenure; contributions run the full term"
            ));
        }
    }

    let schedule = simulate(input);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "SIP growth schedule (growth-then-deposit recurrence)",
        &serde_json::json!({
            "monthly_contribution": input.monthly_contribution.to_string(),
            "annual_return_rate": input.annual_return_rate.to_string(),
            "tenure_months": input.tenure_months,
            "annual_step_up": input.annual_step_up.to_string(),
            "lump_sum": input.lump_sum.map(|l| l.to_string()),
        }),
        warnings,
        elapsed,
        schedule,
    ))
}

fn simulate(input: &SipInput) -> SipSchedule {
    let has_flows = input.monthly_contribution > Decimal::ZERO
        || input.lump_sum.is_some_and(|l| l > Decimal::ZERO);
    if input.tenure_months == 0 || !has_flows {
        return SipSchedule {
            monthly_rows: Vec::new(),
            yearly_rows: Vec::new(),
            total_invested: Decimal::ZERO,
            growth: Decimal::ZERO,
            maturity_value: Decimal::ZERO,
        };
    }

    let monthly_rate = input.annual_return_rate / dec!(12);
    let contribution_limit = input
        .contribution_months
        .unwrap_or(input.tenure_months)
        .min(input.tenure_months);

    let lump = input.lump_sum.unwrap_or(Decimal::ZERO).max(Decimal::ZERO);
    let mut balance = lump;
    let mut total_invested = lump;
    let mut contribution = input.monthly_contribution.max(Decimal::ZERO);
    let mut monthly_rows = Vec::with_capacity(input.tenure_months as usize);

    for m in 1..=input.tenure_months {
        if m > 1 && (m - 1) % 12 == 0 {
            contribution *= Decimal::ONE + input.annual_step_up;
        }

        balance *= Decimal::ONE + monthly_rate;

        let invested_this_month = if m <= contribution_limit {
            balance += contribution;
            total_invested += contribution;
            contribution
        } else {
            Decimal::ZERO
        };

        // The lump sum counts as month 1's contribution in the row.
        let row_invested = if m == 1 {
            invested_this_month + lump
        } else {
            invested_this_month
        };

        monthly_rows.push(InvestmentMonthlyRow::new(
            m,
            input.start,
            row_invested,
            total_invested,
            balance,
        ));
    }

    let yearly_rows = aggregate_investment_by_year(&monthly_rows);

    SipSchedule {
        monthly_rows,
        yearly_rows,
        total_invested,
        growth: balance - total_invested,
        maturity_value: balance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates;

    fn plain(contribution: Money, annual_rate: Rate, months: u32) -> SipInput {
        SipInput {
            monthly_contribution: contribution,
            annual_return_rate: annual_rate,
            tenure_months: months,
            annual_step_up: Decimal::ZERO,
            lump_sum: None,
            contribution_months: None,
            start: Period::new(2024, 1).unwrap(),
        }
    }

    #[test]
    fn test_plain_sip_matches_closed_form() {
        let input = plain(dec!(5000), dec!(0.12), 120);
        let result = build_sip_schedule(&input).unwrap();
        let closed = rates::sip_future_value(dec!(5000), dec!(0.12) / dec!(12), 120);

        assert!(
            (result.result.maturity_value - closed).abs() < dec!(0.000001),
            "loop={} closed={}",
            result.result.maturity_value,
            closed
        );
    }

    #[test]
    fn test_zero_rate_is_pure_sum() {
        let result = build_sip_schedule(&plain(dec!(1000), Decimal::ZERO, 24)).unwrap();
        assert_eq!(result.result.maturity_value, dec!(24000));
        assert_eq!(result.result.growth, Decimal::ZERO);
    }

    #[test]
    fn test_row_invariants() {
        let mut input = plain(dec!(2000), dec!(0.10), 36);
        input.lump_sum = Some(dec!(50000));
        let result = build_sip_schedule(&input).unwrap();
        let rows = &result.result.monthly_rows;

        for row in rows {
            assert_eq!(row.balance, row.total_invested + row.growth);
        }
        for pair in rows.windows(2) {
            assert!(pair[1].total_invested >= pair[0].total_invested);
        }
    }

    #[test]
    fn test_step_up_increases_contributions() {
        let mut input = plain(dec!(1000), dec!(0.10), 36);
        input.annual_step_up = dec!(0.10);
        let result = build_sip_schedule(&input).unwrap();
        let rows = &result.result.monthly_rows;

        assert_eq!(rows[0].invested, dec!(1000));
        assert_eq!(rows[12].invested, dec!(1100));
        assert_eq!(rows[24].invested, dec!(1210));
        assert_eq!(result.result.total_invested, dec!(12000) + dec!(13200) + dec!(14520));
    }

    #[test]
    fn test_lump_sum_compounds_from_month_one() {
        let mut input = plain(Decimal::ZERO, dec!(0.12), 12);
        input.lump_sum = Some(dec!(100000));
        let result = build_sip_schedule(&input).unwrap();

        let expected = rates::lump_future_value(dec!(100000), dec!(0.01), 12);
        assert!((result.result.maturity_value - expected).abs() < dec!(0.000001));
        assert_eq!(result.result.total_invested, dec!(100000));
    }

    #[test]
    fn test_limited_pay_keeps_compounding() {
        let mut input = plain(dec!(5000), dec!(0.12), 120);
        input.contribution_months = Some(60);
        let result = build_sip_schedule(&input).unwrap();
        let s = &result.result;

        assert_eq!(s.total_invested, dec!(300000));
        // Balance keeps growing after contributions stop
        let rows = &s.monthly_rows;
        assert_eq!(rows[60].invested, Decimal::ZERO);
        assert!(rows.last().unwrap().balance > rows[59].balance);
    }

    #[test]
    fn test_degenerate_input_returns_empty() {
        let result = build_sip_schedule(&plain(Decimal::ZERO, dec!(0.10), 12)).unwrap();
        assert!(result.result.monthly_rows.is_empty());
        assert_eq!(result.result.maturity_value, Decimal::ZERO);

        let result = build_sip_schedule(&plain(dec!(1000), dec!(0.10), 0)).unwrap();
        assert!(result.result.monthly_rows.is_empty());
    }
}
