//! Dual/top-up loan: two amortisation streams merged at a pivot month.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::calendar::Period;
use crate::loans::basic::{self, LoanInput, LoanSchedule};
use crate::loans::schedule::{aggregate_by_calendar_year, MonthlyRow, YearlyRow};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::{FinCalcError, FinCalcResult};

/// Terms of one loan stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    pub annual_rate: Rate,
    pub tenure_months: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emi: Option<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopUpLoanInput {
    pub base: LoanTerms,
    pub top_up: LoanTerms,
    /// 1-based month at which the top-up stream begins.
    pub top_up_start_month: u32,
    pub start: Period,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopUpLoanSchedule {
    pub base_emi: Money,
    pub top_up_emi: Money,
    /// Base + top-up EMI while both streams are live.
    pub combined_peak_emi: Money,
    pub viable: bool,
    pub monthly_rows: Vec<MonthlyRow>,
    pub yearly_rows: Vec<YearlyRow>,
    pub base_total_interest: Money,
    pub top_up_total_interest: Money,
    pub total_interest: Money,
    pub total_paid: Money,
    pub months_elapsed: u32,
}

/// Merge a base loan (from month 1) and a top-up loan (from the pivot
/// month) into a single combined row sequence. Balances, interest, and
/// principal are summed per month; the combined EMI is the time-varying sum
/// of the two streams' EMIs.
pub fn build_top_up_loan_schedule(
    input: &TopUpLoanInput,
) -> FinCalcResult<ComputationOutput<TopUpLoanSchedule>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.top_up_start_month == 0 {
        return Err(FinCalcError::InvalidInput {
            field: "top_up_start_month".into(),
            reason: "Pivot month is 1-based".into(),
        });
    }

    let base = basic::simulate(
        &LoanInput {
            principal: input.base.principal,
            annual_rate: input.base.annual_rate,
            tenure_months: input.base.tenure_months,
            emi: input.base.emi,
            start: input.start,
        },
        &mut warnings,
    )?;

    let pivot = input.top_up_start_month;
    let top_up = basic::simulate(
        &LoanInput {
            principal: input.top_up.principal,
            annual_rate: input.top_up.annual_rate,
            tenure_months: input.top_up.tenure_months,
            emi: input.top_up.emi,
            start: input.start.offset(pivot),
        },
        &mut warnings,
    )?;

    let schedule = merge(input, &base, &top_up);
    if !schedule.viable {
        warnings.push("One of the loan streams never amortises".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Dual/top-up loan (two merged amortisation streams)",
        &serde_json::json!({
            "base_principal": input.base.principal.to_string(),
            "top_up_principal": input.top_up.principal.to_string(),
            "top_up_start_month": pivot,
            "start": input.start.to_string(),
        }),
        warnings,
        elapsed,
        schedule,
    ))
}

fn merge(input: &TopUpLoanInput, base: &LoanSchedule, top_up: &LoanSchedule) -> TopUpLoanSchedule {
    let pivot = input.top_up_start_month;
    let total_months = base
        .months_elapsed
        .max(pivot - 1 + top_up.months_elapsed);

    let mut monthly_rows = Vec::with_capacity(total_months as usize);
    for m in 1..=total_months {
        let b = base.monthly_rows.get(m as usize - 1);
        let t = if m >= pivot {
            top_up.monthly_rows.get((m - pivot) as usize)
        } else {
            None
        };

        let sum = |f: fn(&MonthlyRow) -> Money| {
            b.map_or(Decimal::ZERO, f) + t.map_or(Decimal::ZERO, f)
        };

        monthly_rows.push(MonthlyRow::new(
            m,
            input.start,
            sum(|r| r.opening_balance),
            sum(|r| r.interest),
            sum(|r| r.principal_paid),
            Decimal::ZERO,
            sum(|r| r.closing_balance),
        ));
    }

    let combined_principal = input.base.principal.max(dec!(0)) + input.top_up.principal.max(dec!(0));
    let yearly_rows = aggregate_by_calendar_year(&monthly_rows, combined_principal);
    let total_interest = base.total_interest + top_up.total_interest;

    TopUpLoanSchedule {
        base_emi: base.emi,
        top_up_emi: top_up.emi,
        combined_peak_emi: base.emi + top_up.emi,
        viable: base.viable && top_up.viable,
        monthly_rows,
        yearly_rows,
        base_total_interest: base.total_interest,
        top_up_total_interest: top_up.total_interest,
        total_interest,
        total_paid: base.total_paid + top_up.total_paid,
        months_elapsed: total_months,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> TopUpLoanInput {
        TopUpLoanInput {
            base: LoanTerms {
                principal: dec!(1000000),
                annual_rate: dec!(0.09),
                tenure_months: 120,
                emi: None,
            },
            top_up: LoanTerms {
                principal: dec!(300000),
                annual_rate: dec!(0.11),
                tenure_months: 60,
                emi: None,
            },
            top_up_start_month: 25,
            start: Period::new(2024, 1).unwrap(),
        }
    }

    #[test]
    fn test_combined_interest_is_sum_of_streams() {
        let result = build_top_up_loan_schedule(&input()).unwrap();
        let s = &result.result;

        assert_eq!(
            s.total_interest,
            s.base_total_interest + s.top_up_total_interest
        );
        let row_interest: Money = s.monthly_rows.iter().map(|r| r.interest).sum();
        assert!((row_interest - s.total_interest).abs() < dec!(0.000001));
    }

    #[test]
    fn test_balance_jumps_at_pivot_month() {
        let result = build_top_up_loan_schedule(&input()).unwrap();
        let rows = &result.result.monthly_rows;

        // Pivot month opens with the top-up principal added
        let before = &rows[23]; // month 24
        let at_pivot = &rows[24]; // month 25
        assert!(at_pivot.opening_balance > before.closing_balance);
        assert!(
            (at_pivot.opening_balance - before.closing_balance - dec!(300000)).abs()
                < dec!(0.01)
        );
    }

    #[test]
    fn test_horizon_covers_longer_stream() {
        let mut i = input();
        i.top_up_start_month = 100;
        let result = build_top_up_loan_schedule(&i).unwrap();
        // Top-up runs months 100..159, past the base loan's 120
        assert_eq!(result.result.months_elapsed, 159);
        // After the base closes, only the top-up balance remains
        let last = result.result.monthly_rows.last().unwrap();
        assert_eq!(last.closing_balance, Decimal::ZERO);
    }

    #[test]
    fn test_conservation_across_both_streams() {
        let result = build_top_up_loan_schedule(&input()).unwrap();
        let s = &result.result;
        let paid: Money = s.monthly_rows.iter().map(|r| r.principal_paid).sum();
        assert!((paid - dec!(1300000)).abs() < dec!(1));
    }

    #[test]
    fn test_zero_pivot_rejected() {
        let mut i = input();
        i.top_up_start_month = 0;
        assert!(build_top_up_loan_schedule(&i).is_err());
    }
}
