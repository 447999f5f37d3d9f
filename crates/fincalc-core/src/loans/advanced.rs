//! Advanced loan amortisation: prepayments (one-time and recurring),
//! mid-term rate changes, EMI step-ups, and a choice of prepayment strategy.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::calendar::Period;
use crate::loans::basic::{self, LoanInput, LoanSchedule};
use crate::loans::schedule::{
    aggregate_by_calendar_year, aggregate_by_fiscal_year, MonthlyRow, YearlyRow, BALANCE_EPSILON,
};
use crate::rates;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::{FinCalcError, FinCalcResult};

/// How often an extra payment recurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrepaymentFrequency {
    Once,
    Monthly,
    Quarterly,
    Yearly,
}

/// An extra payment against the outstanding balance, starting at a 1-based
/// month offset and recurring per `frequency`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prepayment {
    pub from_month: u32,
    pub amount: Money,
    pub frequency: PrepaymentFrequency,
}

impl Prepayment {
    fn due(&self, month: u32) -> bool {
        if month < self.from_month {
            return false;
        }
        match self.frequency {
            PrepaymentFrequency::Once => month == self.from_month,
            PrepaymentFrequency::Monthly => true,
            PrepaymentFrequency::Quarterly => (month - self.from_month) % 3 == 0,
            PrepaymentFrequency::Yearly => (month - self.from_month) % 12 == 0,
        }
    }
}

/// What a prepayment buys: an earlier payoff or a smaller installment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrepaymentStrategy {
    /// Keep the EMI constant; the loan finishes early.
    #[default]
    ReduceTenure,
    /// Recompute the EMI on the lower balance over the remaining original
    /// tenure; the loan finishes on schedule with lower payments.
    ReduceEmi,
}

/// A mid-term rate revision, effective from a 1-based month offset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateChange {
    pub from_month: u32,
    pub annual_rate: Rate,
}

/// Scheduled EMI increase applied at each loan anniversary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EmiStepUp {
    Percent(Rate),
    Absolute(Money),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedLoanInput {
    pub principal: Money,
    pub annual_rate: Rate,
    pub tenure_months: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emi: Option<Money>,
    pub start: Period,
    #[serde(default)]
    pub prepayments: Vec<Prepayment>,
    #[serde(default)]
    pub rate_changes: Vec<RateChange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emi_step_up: Option<EmiStepUp>,
    #[serde(default)]
    pub strategy: PrepaymentStrategy,
    /// When set, `fiscal_year_rows` buckets the same monthly rows by this
    /// fiscal-year start month (4 = April-March).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiscal_start_month: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedLoanSchedule {
    pub initial_emi: Money,
    pub final_emi: Money,
    pub viable: bool,
    pub monthly_rows: Vec<MonthlyRow>,
    pub yearly_rows: Vec<YearlyRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fiscal_year_rows: Option<Vec<YearlyRow>>,
    pub total_interest: Money,
    pub total_principal_paid: Money,
    pub total_prepaid: Money,
    pub total_paid: Money,
    pub months_elapsed: u32,
    /// Interest and tenure versus the same loan with no prepayments,
    /// step-ups, or rate changes.
    pub baseline_total_interest: Money,
    pub interest_saved: Money,
    pub months_saved: i64,
}

/// Build an amortisation schedule with prepayments, rate changes, and EMI
/// step-ups applied in that order within each month.
pub fn build_advanced_loan_schedule(
    input: &AdvancedLoanInput,
) -> FinCalcResult<ComputationOutput<AdvancedLoanSchedule>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.annual_rate < Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: "annual_rate".into(),
            reason: "Rate must not be negative".into(),
        });
    }
    for rc in &input.rate_changes {
        if rc.annual_rate < Decimal::ZERO {
            return Err(FinCalcError::InvalidInput {
                field: "rate_changes".into(),
                reason: "Rate must not be negative".into(),
            });
        }
        if rc.from_month == 0 {
            return Err(FinCalcError::InvalidInput {
                field: "rate_changes".into(),
                reason: "from_month is 1-based".into(),
            });
        }
    }
    for p in &input.prepayments {
        if p.from_month == 0 {
            return Err(FinCalcError::InvalidInput {
                field: "prepayments".into(),
                reason: "from_month is 1-based".into(),
            });
        }
    }

    let schedule = simulate(input, &mut warnings)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Advanced loan amortisation (prepayments, rate changes, EMI step-up)",
        &serde_json::json!({
            "principal": input.principal.to_string(),
            "annual_rate": input.annual_rate.to_string(),
            "tenure_months": input.tenure_months,
            "strategy": format!("{:?}", input.strategy),
            "prepayments": input.prepayments.len(),
            "rate_changes": input.rate_changes.len(),
        }),
        warnings,
        elapsed,
        schedule,
    ))
}

fn simulate(
    input: &AdvancedLoanInput,
    warnings: &mut Vec<String>,
) -> FinCalcResult<AdvancedLoanSchedule> {
    if input.principal <= Decimal::ZERO || input.tenure_months == 0 {
        return Ok(empty_schedule());
    }

    let mut monthly_rate = input.annual_rate / dec!(12);
    let initial_emi = match input.emi {
        Some(e) => e,
        None => rates::emi(input.principal, monthly_rate, input.tenure_months)?,
    };

    if initial_emi <= input.principal * monthly_rate + BALANCE_EPSILON && !monthly_rate.is_zero() {
        warnings.push(format!(
            "EMI {initial_emi} does not cover the first month's interest; loan never amortises"
        ));
        let mut s = empty_schedule();
        s.initial_emi = initial_emi;
        s.final_emi = initial_emi;
        s.viable = false;
        return Ok(s);
    }

    let mut rate_changes = input.rate_changes.clone();
    rate_changes.sort_by_key(|rc| rc.from_month);

    let mut emi = initial_emi;
    let mut balance = input.principal;
    let mut monthly_rows: Vec<MonthlyRow> = Vec::new();
    let mut total_interest = Decimal::ZERO;
    let mut total_principal = Decimal::ZERO;
    let mut total_prepaid = Decimal::ZERO;

    for m in 1..=input.tenure_months {
        // Rate revision: new rate applies from this month; EMI is recomputed
        // on the remaining balance over the remaining tenure.
        if let Some(rc) = rate_changes.iter().rev().find(|rc| rc.from_month == m) {
            monthly_rate = rc.annual_rate / dec!(12);
            let remaining = input.tenure_months - m + 1;
            emi = rates::emi(balance, monthly_rate, remaining)?;
        }

        // EMI step-up on loan anniversaries.
        if m > 1 && (m - 1) % 12 == 0 {
            match &input.emi_step_up {
                Some(EmiStepUp::Percent(p)) => emi *= Decimal::ONE + *p,
                Some(EmiStepUp::Absolute(a)) => emi += *a,
                None => {}
            }
        }

        let opening = balance;
        let interest = opening * monthly_rate;
        let principal_component = (emi - interest).min(opening);
        if principal_component <= Decimal::ZERO && !monthly_rate.is_zero() {
            warnings.push(format!(
                "EMI stopped covering interest at month {m}; schedule truncated"
            ));
            break;
        }
        balance = opening - principal_component;

        // Prepayments land after the regular EMI split, clamped to the
        // remaining balance.
        let due: Money = input
            .prepayments
            .iter()
            .filter(|p| p.due(m))
            .map(|p| p.amount)
            .sum();
        let prepayment = due.min(balance);
        balance -= prepayment;
        if balance < BALANCE_EPSILON {
            balance = Decimal::ZERO;
        }

        // Strategy is re-derived at every prepayment event, not just once.
        if prepayment > Decimal::ZERO
            && input.strategy == PrepaymentStrategy::ReduceEmi
            && balance > Decimal::ZERO
            && m < input.tenure_months
        {
            emi = rates::emi(balance, monthly_rate, input.tenure_months - m)?;
        }

        total_interest += interest;
        total_principal += principal_component;
        total_prepaid += prepayment;

        monthly_rows.push(MonthlyRow::new(
            m,
            input.start,
            opening,
            interest,
            principal_component,
            prepayment,
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

    // Baseline: the same terms with no prepayments, step-ups, or revisions.
    let baseline = baseline_schedule(input, initial_emi)?;
    let months_elapsed = monthly_rows.len() as u32;
    let yearly_rows = aggregate_by_calendar_year(&monthly_rows, input.principal);
    let fiscal_year_rows = input
        .fiscal_start_month
        .map(|fsm| aggregate_by_fiscal_year(&monthly_rows, input.principal, fsm));

    Ok(AdvancedLoanSchedule {
        initial_emi,
        final_emi: emi,
        viable: true,
        monthly_rows,
        yearly_rows,
        fiscal_year_rows,
        total_interest,
        total_principal_paid: total_principal,
        total_prepaid,
        total_paid: total_interest + total_principal + total_prepaid,
        months_elapsed,
        baseline_total_interest: baseline.total_interest,
        interest_saved: baseline.total_interest - total_interest,
        months_saved: baseline.months_elapsed as i64 - months_elapsed as i64,
    })
}

fn baseline_schedule(input: &AdvancedLoanInput, emi: Money) -> FinCalcResult<LoanSchedule> {
    let mut ignored = Vec::new();
    basic::simulate(
        &LoanInput {
            principal: input.principal,
            annual_rate: input.annual_rate,
            tenure_months: input.tenure_months,
            emi: Some(emi),
            start: input.start,
        },
        &mut ignored,
    )
}

fn empty_schedule() -> AdvancedLoanSchedule {
    AdvancedLoanSchedule {
        initial_emi: Decimal::ZERO,
        final_emi: Decimal::ZERO,
        viable: true,
        monthly_rows: Vec::new(),
        yearly_rows: Vec::new(),
        fiscal_year_rows: None,
        total_interest: Decimal::ZERO,
        total_principal_paid: Decimal::ZERO,
        total_prepaid: Decimal::ZERO,
        total_paid: Decimal::ZERO,
        months_elapsed: 0,
        baseline_total_interest: Decimal::ZERO,
        interest_saved: Decimal::ZERO,
        months_saved: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_input() -> AdvancedLoanInput {
        AdvancedLoanInput {
            principal: dec!(1000000),
            annual_rate: dec!(0.09),
            tenure_months: 120,
            emi: None,
            start: Period::new(2024, 4).unwrap(),
            prepayments: Vec::new(),
            rate_changes: Vec::new(),
            emi_step_up: None,
            strategy: PrepaymentStrategy::ReduceTenure,
            fiscal_start_month: None,
        }
    }

    #[test]
    fn test_no_extras_matches_basic_schedule() {
        let input = base_input();
        let advanced = build_advanced_loan_schedule(&input).unwrap();
        let basic = basic::build_loan_schedule(&LoanInput {
            principal: input.principal,
            annual_rate: input.annual_rate,
            tenure_months: input.tenure_months,
            emi: None,
            start: input.start,
        })
        .unwrap();

        assert_eq!(
            advanced.result.months_elapsed,
            basic.result.months_elapsed
        );
        assert!(
            (advanced.result.total_interest - basic.result.total_interest).abs()
                < dec!(0.000001)
        );
        assert_eq!(advanced.result.interest_saved, Decimal::ZERO);
        assert_eq!(advanced.result.months_saved, 0);
    }

    #[test]
    fn test_one_time_prepayment_reduces_tenure() {
        let mut input = base_input();
        input.prepayments.push(Prepayment {
            from_month: 12,
            amount: dec!(200000),
            frequency: PrepaymentFrequency::Once,
        });

        let result = build_advanced_loan_schedule(&input).unwrap();
        let s = &result.result;

        assert!(s.months_elapsed < 120);
        assert!(s.months_saved > 0);
        assert!(s.interest_saved > Decimal::ZERO);
        assert_eq!(s.total_prepaid, dec!(200000));
        // EMI unchanged under ReduceTenure
        assert_eq!(s.final_emi, s.initial_emi);
    }

    #[test]
    fn test_reduce_emi_keeps_tenure_and_lowers_emi() {
        let mut input = base_input();
        input.strategy = PrepaymentStrategy::ReduceEmi;
        input.prepayments.push(Prepayment {
            from_month: 12,
            amount: dec!(200000),
            frequency: PrepaymentFrequency::Once,
        });

        let result = build_advanced_loan_schedule(&input).unwrap();
        let s = &result.result;

        assert_eq!(s.months_elapsed, 120);
        assert!(s.final_emi < s.initial_emi);
        assert!(s.interest_saved > Decimal::ZERO);
        assert_eq!(s.monthly_rows.last().unwrap().closing_balance, Decimal::ZERO);
    }

    #[test]
    fn test_recurring_yearly_prepayment() {
        let mut input = base_input();
        input.prepayments.push(Prepayment {
            from_month: 12,
            amount: dec!(50000),
            frequency: PrepaymentFrequency::Yearly,
        });

        let result = build_advanced_loan_schedule(&input).unwrap();
        let s = &result.result;

        let prepay_months: Vec<u32> = s
            .monthly_rows
            .iter()
            .filter(|r| r.prepayment > Decimal::ZERO)
            .map(|r| r.period_index)
            .collect();
        assert!(prepay_months.starts_with(&[12, 24, 36]));
        assert!(s.months_elapsed < 120);
    }

    #[test]
    fn test_oversized_prepayment_closes_loan() {
        let mut input = base_input();
        input.prepayments.push(Prepayment {
            from_month: 6,
            amount: dec!(5000000),
            frequency: PrepaymentFrequency::Once,
        });

        let result = build_advanced_loan_schedule(&input).unwrap();
        let s = &result.result;

        assert_eq!(s.months_elapsed, 6);
        let last = s.monthly_rows.last().unwrap();
        assert_eq!(last.closing_balance, Decimal::ZERO);
        // Clamped to the remaining balance, not the requested amount
        assert!(s.total_prepaid < dec!(5000000));
    }

    #[test]
    fn test_rate_drop_recomputes_emi() {
        let mut input = base_input();
        input.rate_changes.push(RateChange {
            from_month: 25,
            annual_rate: dec!(0.07),
        });

        let result = build_advanced_loan_schedule(&input).unwrap();
        let s = &result.result;

        assert!(s.final_emi < s.initial_emi);
        assert_eq!(s.months_elapsed, 120);
        assert!(s.interest_saved > Decimal::ZERO);
        assert_eq!(s.monthly_rows.last().unwrap().closing_balance, Decimal::ZERO);
    }

    #[test]
    fn test_rate_rise_recomputes_emi_upward() {
        let mut input = base_input();
        input.rate_changes.push(RateChange {
            from_month: 25,
            annual_rate: dec!(0.11),
        });

        let result = build_advanced_loan_schedule(&input).unwrap();
        let s = &result.result;

        assert!(s.final_emi > s.initial_emi);
        // EMI recompute keeps the loan closing on schedule
        assert_eq!(s.months_elapsed, 120);
        assert_eq!(s.monthly_rows.last().unwrap().closing_balance, Decimal::ZERO);
    }

    #[test]
    fn test_emi_step_up_shortens_tenure() {
        let mut input = base_input();
        input.emi_step_up = Some(EmiStepUp::Percent(dec!(0.10)));

        let result = build_advanced_loan_schedule(&input).unwrap();
        let s = &result.result;

        assert!(s.months_elapsed < 120);
        assert!(s.months_saved > 0);
        assert!(s.final_emi > s.initial_emi);
    }

    #[test]
    fn test_fiscal_year_rows_rebucket_without_resimulating() {
        let mut input = base_input();
        input.fiscal_start_month = Some(4);

        let result = build_advanced_loan_schedule(&input).unwrap();
        let s = &result.result;
        let fiscal = s.fiscal_year_rows.as_ref().unwrap();

        let cal_interest: Money = s.yearly_rows.iter().map(|r| r.interest).sum();
        let fy_interest: Money = fiscal.iter().map(|r| r.interest).sum();
        assert_eq!(cal_interest, fy_interest);
    }
}
