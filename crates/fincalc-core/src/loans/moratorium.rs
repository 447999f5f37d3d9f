//! Moratorium (payment holiday) loan: an interest-only or capitalised
//! holiday window followed by a recomputed EMI over the remaining tenure.

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

/// What happens to interest during the holiday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoratoriumTreatment {
    /// Interest is paid each month; the balance stays flat.
    InterestOnly,
    /// Accrued interest is added to the balance and compounds.
    Capitalize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoratoriumLoanInput {
    pub principal: Money,
    pub annual_rate: Rate,
    pub tenure_months: u32,
    pub moratorium_months: u32,
    pub treatment: MoratoriumTreatment,
    pub start: Period,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoratoriumLoanSchedule {
    /// EMI recomputed on the post-holiday balance over the remaining tenure.
    pub emi_after_moratorium: Money,
    /// Interest accrued during the holiday (paid out under InterestOnly,
    /// added to the balance under Capitalize).
    pub moratorium_interest: Money,
    /// Balance at the end of the holiday (grown under Capitalize).
    pub balance_after_moratorium: Money,
    pub monthly_rows: Vec<MonthlyRow>,
    pub yearly_rows: Vec<YearlyRow>,
    pub total_interest: Money,
    pub total_principal_paid: Money,
    pub total_paid: Money,
    pub months_elapsed: u32,
}

/// Build a schedule with an initial moratorium window.
pub fn build_moratorium_loan_schedule(
    input: &MoratoriumLoanInput,
) -> FinCalcResult<ComputationOutput<MoratoriumLoanSchedule>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.annual_rate < Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: "annual_rate".into(),
            reason: "Rate must not be negative".into(),
        });
    }
    if input.moratorium_months >= input.tenure_months && input.tenure_months > 0 {
        return Err(FinCalcError::InvalidInput {
            field: "moratorium_months".into(),
            reason: "Moratorium must be shorter than the tenure".into(),
        });
    }

    let schedule = simulate(input, &mut warnings)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Moratorium loan (holiday window, recomputed EMI)",
        &serde_json::json!({
            "principal": input.principal.to_string(),
            "annual_rate": input.annual_rate.to_string(),
            "tenure_months": input.tenure_months,
            "moratorium_months": input.moratorium_months,
            "treatment": format!("{:?}", input.treatment),
        }),
        warnings,
        elapsed,
        schedule,
    ))
}

fn simulate(
    input: &MoratoriumLoanInput,
    warnings: &mut Vec<String>,
) -> FinCalcResult<MoratoriumLoanSchedule> {
    if input.principal <= Decimal::ZERO || input.tenure_months == 0 {
        return Ok(MoratoriumLoanSchedule {
            emi_after_moratorium: Decimal::ZERO,
            moratorium_interest: Decimal::ZERO,
            balance_after_moratorium: Decimal::ZERO,
            monthly_rows: Vec::new(),
            yearly_rows: Vec::new(),
            total_interest: Decimal::ZERO,
            total_principal_paid: Decimal::ZERO,
            total_paid: Decimal::ZERO,
            months_elapsed: 0,
        });
    }

    let monthly_rate = input.annual_rate / dec!(12);
    let mut balance = input.principal;
    let mut monthly_rows: Vec<MonthlyRow> = Vec::new();
    let mut total_interest = Decimal::ZERO;
    let mut total_principal = Decimal::ZERO;
    let mut moratorium_interest = Decimal::ZERO;

    // Holiday window.
    for m in 1..=input.moratorium_months {
        let opening = balance;
        let interest = opening * monthly_rate;
        moratorium_interest += interest;
        total_interest += interest;

        match input.treatment {
            MoratoriumTreatment::InterestOnly => {
                // Interest paid; balance unchanged.
                monthly_rows.push(MonthlyRow::new(
                    m,
                    input.start,
                    opening,
                    interest,
                    Decimal::ZERO,
                    Decimal::ZERO,
                    opening,
                ));
            }
            MoratoriumTreatment::Capitalize => {
                balance = opening + interest;
                monthly_rows.push(MonthlyRow::new(
                    m,
                    input.start,
                    opening,
                    interest,
                    Decimal::ZERO,
                    Decimal::ZERO,
                    balance,
                ));
            }
        }
    }

    if input.treatment == MoratoriumTreatment::Capitalize
        && input.moratorium_months > 0
    {
        warnings.push(format!(
            "Capitalised moratorium grew the balance by {moratorium_interest}"
        ));
    }

    let balance_after_moratorium = balance;
    let remaining = input.tenure_months - input.moratorium_months;
    let emi = rates::emi(balance, monthly_rate, remaining)?;

    // Regular amortisation on the (possibly grown) balance.
    for m in input.moratorium_months + 1..=input.tenure_months {
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

    let months_elapsed = monthly_rows.len() as u32;
    let yearly_rows = aggregate_by_calendar_year(&monthly_rows, input.principal);

    // Capitalised holiday interest is accrued, not paid; the post-holiday
    // principal repayments already hand that money over. Counting it again
    // would overstate the cash outflow by exactly moratorium_interest.
    let capitalized_interest = match input.treatment {
        MoratoriumTreatment::Capitalize => moratorium_interest,
        MoratoriumTreatment::InterestOnly => Decimal::ZERO,
    };

    Ok(MoratoriumLoanSchedule {
        emi_after_moratorium: emi,
        moratorium_interest,
        balance_after_moratorium,
        monthly_rows,
        yearly_rows,
        total_interest,
        total_principal_paid: total_principal,
        total_paid: total_interest + total_principal - capitalized_interest,
        months_elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(treatment: MoratoriumTreatment) -> MoratoriumLoanInput {
        MoratoriumLoanInput {
            principal: dec!(1000000),
            annual_rate: dec!(0.10),
            tenure_months: 120,
            moratorium_months: 6,
            treatment,
            start: Period::new(2024, 1).unwrap(),
        }
    }

    #[test]
    fn test_interest_only_holds_balance_flat() {
        let result =
            build_moratorium_loan_schedule(&input(MoratoriumTreatment::InterestOnly)).unwrap();
        let s = &result.result;

        for row in &s.monthly_rows[..6] {
            assert_eq!(row.closing_balance, dec!(1000000));
            assert_eq!(row.principal_paid, Decimal::ZERO);
        }
        assert_eq!(s.balance_after_moratorium, dec!(1000000));
        // Simple interest: 6 months at 10%/12 on 1,000,000
        assert_eq!(s.moratorium_interest, dec!(1000000) * dec!(0.10) / dec!(12) * dec!(6));
    }

    #[test]
    fn test_capitalize_compounds_the_balance() {
        let result =
            build_moratorium_loan_schedule(&input(MoratoriumTreatment::Capitalize)).unwrap();
        let s = &result.result;

        // Balance grows each holiday month — the sole sanctioned violation
        // of monotonic payoff
        for row in &s.monthly_rows[..6] {
            assert!(row.closing_balance > row.opening_balance);
        }
        let expected = dec!(1000000) * rates::compound(dec!(0.10) / dec!(12), 6);
        assert!((s.balance_after_moratorium - expected).abs() < dec!(0.01));
        assert!(!result.warnings.is_empty());
    }

    #[test]
    fn test_capitalize_raises_emi_versus_interest_only() {
        let io =
            build_moratorium_loan_schedule(&input(MoratoriumTreatment::InterestOnly)).unwrap();
        let cap =
            build_moratorium_loan_schedule(&input(MoratoriumTreatment::Capitalize)).unwrap();

        assert!(cap.result.emi_after_moratorium > io.result.emi_after_moratorium);
    }

    #[test]
    fn test_loan_closes_on_schedule() {
        for treatment in [MoratoriumTreatment::InterestOnly, MoratoriumTreatment::Capitalize] {
            let result = build_moratorium_loan_schedule(&input(treatment)).unwrap();
            let s = &result.result;
            assert_eq!(s.months_elapsed, 120);
            assert_eq!(s.monthly_rows.last().unwrap().closing_balance, Decimal::ZERO);
        }
    }

    #[test]
    fn test_post_holiday_payoff_is_monotonic() {
        let result =
            build_moratorium_loan_schedule(&input(MoratoriumTreatment::Capitalize)).unwrap();
        let rows = &result.result.monthly_rows[6..];
        for pair in rows.windows(2) {
            assert!(pair[1].closing_balance <= pair[0].closing_balance);
        }
    }

    #[test]
    fn test_capitalize_total_paid_is_cash_handed_over() {
        let mut i = input(MoratoriumTreatment::Capitalize);
        i.annual_rate = dec!(0.12);
        let result = build_moratorium_loan_schedule(&i).unwrap();
        let s = &result.result;

        // No cash moves during the holiday; the outflow is exactly the
        // post-holiday EMIs, not the accrued-then-capitalised interest twice.
        let emi_cash: Money = s.monthly_rows[6..]
            .iter()
            .map(|r| r.interest + r.principal_paid)
            .sum();
        assert!(
            (s.total_paid - emi_cash).abs() < dec!(0.000001),
            "total_paid={} emi_cash={}",
            s.total_paid,
            emi_cash
        );
        assert!((s.total_paid + s.moratorium_interest
            - (s.total_interest + s.total_principal_paid))
            .abs()
            < dec!(0.000001));
    }

    #[test]
    fn test_interest_only_total_paid_includes_holiday_interest() {
        let result =
            build_moratorium_loan_schedule(&input(MoratoriumTreatment::InterestOnly)).unwrap();
        let s = &result.result;

        let cash: Money = s
            .monthly_rows
            .iter()
            .map(|r| r.interest + r.principal_paid)
            .sum();
        assert!((s.total_paid - cash).abs() < dec!(0.000001));
    }

    #[test]
    fn test_moratorium_longer_than_tenure_rejected() {
        let mut i = input(MoratoriumTreatment::InterestOnly);
        i.moratorium_months = 120;
        assert!(build_moratorium_loan_schedule(&i).is_err());
    }
}
