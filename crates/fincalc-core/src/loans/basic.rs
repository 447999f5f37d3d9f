//! Standard reducing-balance loan amortisation.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::calendar::Period;
use crate::loans::schedule::{
    aggregate_by_calendar_year, MonthlyRow, YearlyRow, BALANCE_EPSILON,
};
use crate::rates;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::{FinCalcError, FinCalcResult};

/// Input for a single reducing-balance loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanInput {
    pub principal: Money,
    /// Annual rate as a decimal fraction (0.10 = 10%).
    pub annual_rate: Rate,
    pub tenure_months: u32,
    /// Fixed monthly installment. Derived from the other terms when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emi: Option<Money>,
    pub start: Period,
}

/// A full amortisation schedule plus scalar rollups. The summary fields are
/// the terminal state of the row sequence, always derivable by summing the
/// rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanSchedule {
    pub emi: Money,
    /// False when the EMI cannot cover the first month's interest
    /// (negative amortisation). Rows are empty in that case.
    pub viable: bool,
    pub monthly_rows: Vec<MonthlyRow>,
    pub yearly_rows: Vec<YearlyRow>,
    pub total_interest: Money,
    pub total_principal_paid: Money,
    pub total_paid: Money,
    pub months_elapsed: u32,
}

impl LoanSchedule {
    pub(crate) fn empty(emi: Money, viable: bool) -> Self {
        LoanSchedule {
            emi,
            viable,
            monthly_rows: Vec::new(),
            yearly_rows: Vec::new(),
            total_interest: Decimal::ZERO,
            total_principal_paid: Decimal::ZERO,
            total_paid: Decimal::ZERO,
            months_elapsed: 0,
        }
    }
}

/// Build a month-by-month reducing-balance schedule.
///
/// Degenerate inputs (non-positive principal, zero tenure) produce an empty
/// schedule rather than an error so callers can render an empty state.
pub fn build_loan_schedule(input: &LoanInput) -> FinCalcResult<ComputationOutput<LoanSchedule>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.annual_rate < Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: "annual_rate".into(),
            reason: "Rate must not be negative".into(),
        });
    }

    let schedule = simulate(input, &mut warnings)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Reducing-balance loan amortisation",
        &serde_json::json!({
            "principal": input.principal.to_string(),
            "annual_rate": input.annual_rate.to_string(),
            "tenure_months": input.tenure_months,
            "start": input.start.to_string(),
        }),
        warnings,
        elapsed,
        schedule,
    ))
}

/// Core simulation shared with the composite loan engines.
pub(crate) fn simulate(
    input: &LoanInput,
    warnings: &mut Vec<String>,
) -> FinCalcResult<LoanSchedule> {
    if input.principal <= Decimal::ZERO || input.tenure_months == 0 {
        return Ok(LoanSchedule::empty(Decimal::ZERO, true));
    }

    let monthly_rate = input.annual_rate / dec!(12);
    let emi = match input.emi {
        Some(e) => e,
        None => rates::emi(input.principal, monthly_rate, input.tenure_months)?,
    };

    // Negative amortisation: the balance would grow instead of shrink.
    // Detected up front, not by running away to overflow.
    if emi <= input.principal * monthly_rate + BALANCE_EPSILON && !monthly_rate.is_zero() {
        warnings.push(format!(
            "EMI {emi} does not cover the first month's interest; loan never amortises"
        ));
        return Ok(LoanSchedule::empty(emi, false));
    }

    let mut balance = input.principal;
    let mut monthly_rows = Vec::with_capacity(input.tenure_months as usize);
    let mut total_interest = Decimal::ZERO;
    let mut total_principal = Decimal::ZERO;

    for m in 1..=input.tenure_months {
        let opening = balance;
        let interest = opening * monthly_rate;
        let principal_component = (emi - interest).min(opening);
        balance = opening - principal_component;
        if balance < BALANCE_EPSILON {
            balance = Decimal::ZERO;
        }

        total_interest += interest;
        total_principal += principal_component;

        monthly_rows.push(MonthlyRow::new(
            m,
            input.start,
            opening,
            interest,
            principal_component,
            Decimal::ZERO,
            balance,
        ));

        if balance.is_zero() {
            break;
        }
    }

    if balance > Decimal::ZERO {
        warnings.push(format!(
            "Balance of {balance} remains at the end of the tenure"
        ));
    }

    let months_elapsed = monthly_rows.len() as u32;
    let yearly_rows = aggregate_by_calendar_year(&monthly_rows, input.principal);

    Ok(LoanSchedule {
        emi,
        viable: true,
        monthly_rows,
        yearly_rows,
        total_interest,
        total_principal_paid: total_principal,
        total_paid: total_interest + total_principal,
        months_elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn input(principal: Money, annual_rate: Rate, tenure_months: u32) -> LoanInput {
        LoanInput {
            principal,
            annual_rate,
            tenure_months,
            emi: None,
            start: Period::new(2024, 1).unwrap(),
        }
    }

    #[test]
    fn test_one_year_loan_closes_at_zero() {
        let result = build_loan_schedule(&input(dec!(100000), dec!(0.10), 12)).unwrap();
        let s = &result.result;

        assert!(s.viable);
        assert_eq!(s.monthly_rows.len(), 12);
        assert_eq!(s.yearly_rows.len(), 1);
        assert!((s.emi - dec!(8791.59)).abs() < dec!(0.01));
        assert_eq!(s.monthly_rows.last().unwrap().closing_balance, Decimal::ZERO);
    }

    #[test]
    fn test_conservation_of_principal() {
        let result = build_loan_schedule(&input(dec!(2500000), dec!(0.085), 240)).unwrap();
        let s = &result.result;

        let paid: Money = s.monthly_rows.iter().map(|r| r.principal_paid).sum();
        let final_balance = s.monthly_rows.last().unwrap().closing_balance;
        assert!((paid + final_balance - dec!(2500000)).abs() < dec!(1));

        let interest: Money = s.monthly_rows.iter().map(|r| r.interest).sum();
        assert_eq!(interest, s.total_interest);
    }

    #[test]
    fn test_monotonic_payoff() {
        let result = build_loan_schedule(&input(dec!(500000), dec!(0.12), 60)).unwrap();
        let rows = &result.result.monthly_rows;
        for pair in rows.windows(2) {
            assert!(pair[1].closing_balance <= pair[0].closing_balance);
        }
    }

    #[test]
    fn test_zero_rate_degenerates_to_straight_line() {
        let result = build_loan_schedule(&input(dec!(120000), Decimal::ZERO, 12)).unwrap();
        let s = &result.result;

        assert_eq!(s.emi, dec!(10000));
        assert_eq!(s.total_interest, Decimal::ZERO);
        assert_eq!(s.monthly_rows.last().unwrap().closing_balance, Decimal::ZERO);
    }

    #[test]
    fn test_insufficient_emi_flags_unviable() {
        let mut i = input(dec!(1000000), dec!(0.12), 120);
        // Monthly interest is 10,000; an EMI of 9,000 never amortises
        i.emi = Some(dec!(9000));
        let result = build_loan_schedule(&i).unwrap();

        assert!(!result.result.viable);
        assert!(result.result.monthly_rows.is_empty());
        assert!(!result.warnings.is_empty());
    }

    #[test]
    fn test_degenerate_inputs_return_empty() {
        let result = build_loan_schedule(&input(Decimal::ZERO, dec!(0.10), 12)).unwrap();
        assert!(result.result.monthly_rows.is_empty());
        assert_eq!(result.result.total_paid, Decimal::ZERO);

        let result = build_loan_schedule(&input(dec!(100000), dec!(0.10), 0)).unwrap();
        assert!(result.result.monthly_rows.is_empty());
    }

    #[test]
    fn test_negative_rate_rejected() {
        assert!(build_loan_schedule(&input(dec!(100000), dec!(-0.01), 12)).is_err());
    }

    #[test]
    fn test_rows_carry_calendar_mapping() {
        let mut i = input(dec!(100000), dec!(0.10), 12);
        i.start = Period::new(2024, 11).unwrap();
        let result = build_loan_schedule(&i).unwrap();
        let rows = &result.result.monthly_rows;

        assert_eq!(rows[0].year, 2024);
        assert_eq!(rows[0].month_name, "November");
        assert_eq!(rows[2].year, 2025);
        assert_eq!(rows[2].month_name, "January");
        // Rows span two calendar years
        assert_eq!(result.result.yearly_rows.len(), 2);
    }
}
