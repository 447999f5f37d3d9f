//! Step-up loan: the EMI rises on each loan anniversary, shortening the
//! effective tenure versus a flat-EMI loan on the same terms.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::calendar::Period;
use crate::loans::advanced::EmiStepUp;
use crate::loans::basic::{self, LoanInput};
use crate::loans::schedule::{
    aggregate_by_calendar_year, MonthlyRow, YearlyRow, BALANCE_EPSILON,
};
use crate::rates;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::{FinCalcError, FinCalcResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepUpLoanInput {
    pub principal: Money,
    pub annual_rate: Rate,
    pub tenure_months: u32,
    /// Starting EMI; derived from the full tenure when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emi: Option<Money>,
    pub step: EmiStepUp,
    pub start: Period,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepUpLoanSchedule {
    pub initial_emi: Money,
    pub final_emi: Money,
    pub viable: bool,
    pub monthly_rows: Vec<MonthlyRow>,
    pub yearly_rows: Vec<YearlyRow>,
    pub total_interest: Money,
    pub total_principal_paid: Money,
    pub total_paid: Money,
    pub months_elapsed: u32,
    /// Versus the flat-EMI loan with the same starting terms.
    pub flat_emi_total_interest: Money,
    pub interest_saved: Money,
    pub months_saved: i64,
}

/// Build a schedule whose EMI increases on each anniversary.
pub fn build_step_up_loan_schedule(
    input: &StepUpLoanInput,
) -> FinCalcResult<ComputationOutput<StepUpLoanSchedule>> {
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
        "Step-up loan amortisation (anniversary EMI increases)",
        &serde_json::json!({
            "principal": input.principal.to_string(),
            "annual_rate": input.annual_rate.to_string(),
            "tenure_months": input.tenure_months,
            "step": format!("{:?}", input.step),
        }),
        warnings,
        elapsed,
        schedule,
    ))
}

fn simulate(
    input: &StepUpLoanInput,
    warnings: &mut Vec<String>,
) -> FinCalcResult<StepUpLoanSchedule> {
    if input.principal <= Decimal::ZERO || input.tenure_months == 0 {
        return Ok(empty_schedule(Decimal::ZERO, true));
    }

    let monthly_rate = input.annual_rate / dec!(12);
    let initial_emi = match input.emi {
        Some(e) => e,
        None => rates::emi(input.principal, monthly_rate, input.tenure_months)?,
    };

    if initial_emi <= input.principal * monthly_rate + BALANCE_EPSILON && !monthly_rate.is_zero() {
        warnings.push(format!(
            "EMI {initial_emi} does not cover the first month's interest; loan never amortises"
        ));
        return Ok(empty_schedule(initial_emi, false));
    }

    let mut emi = initial_emi;
    let mut balance = input.principal;
    let mut monthly_rows: Vec<MonthlyRow> = Vec::new();
    let mut total_interest = Decimal::ZERO;
    let mut total_principal = Decimal::ZERO;

    for m in 1..=input.tenure_months {
        if m > 1 && (m - 1) % 12 == 0 {
            match &input.step {
                EmiStepUp::Percent(p) => emi *= Decimal::ONE + *p,
                EmiStepUp::Absolute(a) => emi += *a,
            }
        }

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

    let flat = basic::simulate(
        &LoanInput {
            principal: input.principal,
            annual_rate: input.annual_rate,
            tenure_months: input.tenure_months,
            emi: Some(initial_emi),
            start: input.start,
        },
        &mut Vec::new(),
    )?;

    let months_elapsed = monthly_rows.len() as u32;
    let yearly_rows = aggregate_by_calendar_year(&monthly_rows, input.principal);

    Ok(StepUpLoanSchedule {
        initial_emi,
        final_emi: emi,
        viable: true,
        monthly_rows,
        yearly_rows,
        total_interest,
        total_principal_paid: total_principal,
        total_paid: total_interest + total_principal,
        months_elapsed,
        flat_emi_total_interest: flat.total_interest,
        interest_saved: flat.total_interest - total_interest,
        months_saved: flat.months_elapsed as i64 - months_elapsed as i64,
    })
}

fn empty_schedule(emi: Money, viable: bool) -> StepUpLoanSchedule {
    StepUpLoanSchedule {
        initial_emi: emi,
        final_emi: emi,
        viable,
        monthly_rows: Vec::new(),
        yearly_rows: Vec::new(),
        total_interest: Decimal::ZERO,
        total_principal_paid: Decimal::ZERO,
        total_paid: Decimal::ZERO,
        months_elapsed: 0,
        flat_emi_total_interest: Decimal::ZERO,
        interest_saved: Decimal::ZERO,
        months_saved: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> StepUpLoanInput {
        StepUpLoanInput {
            principal: dec!(2000000),
            annual_rate: dec!(0.095),
            tenure_months: 240,
            emi: None,
            step: EmiStepUp::Percent(dec!(0.05)),
            start: Period::new(2024, 6).unwrap(),
        }
    }

    #[test]
    fn test_step_up_shortens_tenure() {
        let result = build_step_up_loan_schedule(&input()).unwrap();
        let s = &result.result;

        assert!(s.months_elapsed < 240);
        assert!(s.months_saved > 0);
        assert!(s.interest_saved > Decimal::ZERO);
    }

    #[test]
    fn test_emi_steps_at_anniversaries() {
        let result = build_step_up_loan_schedule(&input()).unwrap();
        let s = &result.result;

        // Month 13's payment (interest + principal) exceeds month 12's
        let paid_12 = s.monthly_rows[11].interest + s.monthly_rows[11].principal_paid;
        let paid_13 = s.monthly_rows[12].interest + s.monthly_rows[12].principal_paid;
        assert!((paid_13 - paid_12 * dec!(1.05)).abs() < dec!(0.01));
        assert!(s.final_emi > s.initial_emi);
    }

    #[test]
    fn test_absolute_step() {
        let mut i = input();
        i.step = EmiStepUp::Absolute(dec!(1000));
        let result = build_step_up_loan_schedule(&i).unwrap();
        let s = &result.result;

        assert!(s.months_elapsed < 240);
        assert!(s.final_emi > s.initial_emi);
    }

    #[test]
    fn test_conservation() {
        let result = build_step_up_loan_schedule(&input()).unwrap();
        let s = &result.result;
        let paid: Money = s.monthly_rows.iter().map(|r| r.principal_paid).sum();
        assert!((paid - dec!(2000000)).abs() < dec!(1));
    }

    #[test]
    fn test_unviable_emi_flagged() {
        let mut i = input();
        i.emi = Some(dec!(1000)); // Monthly interest is ~15,833
        let result = build_step_up_loan_schedule(&i).unwrap();
        assert!(!result.result.viable);
        assert!(result.result.monthly_rows.is_empty());
    }
}
