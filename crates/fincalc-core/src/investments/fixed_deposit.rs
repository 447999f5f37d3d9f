//! Fixed deposit schedules: cumulative (quarterly compounding) and periodic
//! simple-interest payout modes, plus day-denominated simple-interest terms.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::calendar::Period;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::{FinCalcError, FinCalcResult};

/// Deposit term. Day-denominated terms accrue simple interest only and
/// disable payout modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FdTenure {
    Months(u32),
    Days(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FdPayout {
    /// Compound quarterly, pay everything at maturity.
    Cumulative,
    Monthly,
    Quarterly,
    HalfYearly,
    Yearly,
}

impl FdPayout {
    fn months_per_period(&self) -> Option<u32> {
        match self {
            FdPayout::Cumulative => None,
            FdPayout::Monthly => Some(1),
            FdPayout::Quarterly => Some(3),
            FdPayout::HalfYearly => Some(6),
            FdPayout::Yearly => Some(12),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FdInput {
    pub principal: Money,
    pub annual_rate: Rate,
    pub tenure: FdTenure,
    pub payout: FdPayout,
    pub start: Period,
}

/// A single month of a deposit schedule. `interest_credited` is interest
/// added to the balance (cumulative mode); `payout` is interest paid out to
/// the holder (payout modes).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FdMonthlyRow {
    pub period_index: u32,
    pub year: i32,
    pub month: u32,
    pub month_name: String,
    pub interest_accrued: Money,
    pub interest_credited: Money,
    pub payout: Money,
    pub balance: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FdYearlyRow {
    pub year: i32,
    pub interest_accrued: Money,
    pub payout: Money,
    pub balance: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FdSchedule {
    /// Principal plus credited interest (cumulative) or the returned
    /// principal (payout modes).
    pub maturity_value: Money,
    pub total_interest: Money,
    /// Per-period payout amount for payout modes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payout_amount: Option<Money>,
    pub payout_count: u32,
    pub simple_interest: bool,
    pub monthly_rows: Vec<FdMonthlyRow>,
    pub yearly_rows: Vec<FdYearlyRow>,
}

/// Build a fixed-deposit schedule.
pub fn build_fd_schedule(input: &FdInput) -> FinCalcResult<ComputationOutput<FdSchedule>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.annual_rate < Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: "annual_rate".into(),
            reason: "Rate must not be negative".into(),
        });
    }

    let schedule = match input.tenure {
        FdTenure::Days(days) => simulate_days(input, days, &mut warnings),
        FdTenure::Months(months) => simulate_months(input, months),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fixed deposit (quarterly compounding / simple-interest payouts)",
        &serde_json::json!({
            "principal": input.principal.to_string(),
            "annual_rate": input.annual_rate.to_string(),
            "tenure": format!("{:?}", input.tenure),
            "payout": format!("{:?}", input.payout),
        }),
        warnings,
        elapsed,
        schedule,
    ))
}

fn empty_schedule(simple_interest: bool) -> FdSchedule {
    FdSchedule {
        maturity_value: Decimal::ZERO,
        total_interest: Decimal::ZERO,
        payout_amount: None,
        payout_count: 0,
        simple_interest,
        monthly_rows: Vec::new(),
        yearly_rows: Vec::new(),
    }
}

fn simulate_days(input: &FdInput, days: u32, warnings: &mut Vec<String>) -> FdSchedule {
    if input.principal <= Decimal::ZERO || days == 0 {
        return empty_schedule(true);
    }
    if input.payout != FdPayout::Cumulative {
        warnings.push("Day-denominated deposits pay simple interest at maturity; payout mode ignored".into());
    }

    let interest = input.principal * input.annual_rate * Decimal::from(days) / dec!(365);
    FdSchedule {
        maturity_value: input.principal + interest,
        total_interest: interest,
        payout_amount: None,
        payout_count: 0,
        simple_interest: true,
        monthly_rows: Vec::new(),
        yearly_rows: Vec::new(),
    }
}

fn simulate_months(input: &FdInput, months: u32) -> FdSchedule {
    if input.principal <= Decimal::ZERO || months == 0 {
        return empty_schedule(false);
    }

    let monthly_rate = input.annual_rate / dec!(12);
    let mut monthly_rows = Vec::with_capacity(months as usize);

    match input.payout.months_per_period() {
        // Cumulative: interest accrues simply within a quarter and is
        // credited to the balance at quarter ends (and at maturity for a
        // trailing partial quarter), i.e. (1 + r/4)^q compounding.
        None => {
            let mut balance = input.principal;
            let mut pending = Decimal::ZERO;

            for m in 1..=months {
                let accrued = balance * monthly_rate;
                pending += accrued;
                let mut credited = Decimal::ZERO;
                if m % 3 == 0 || m == months {
                    credited = pending;
                    balance += pending;
                    pending = Decimal::ZERO;
                }
                monthly_rows.push(fd_row(m, input.start, accrued, credited, Decimal::ZERO, balance));
            }

            let total_interest = balance - input.principal;
            FdSchedule {
                maturity_value: balance,
                total_interest,
                payout_amount: None,
                payout_count: 0,
                simple_interest: false,
                yearly_rows: aggregate(&monthly_rows),
                monthly_rows,
            }
        }
        // Payout modes: simple interest accrues on the principal and is
        // paid out each period; the principal is returned at maturity.
        Some(period_months) => {
            let payout_amount =
                input.principal * input.annual_rate * Decimal::from(period_months) / dec!(12);
            let mut pending = Decimal::ZERO;
            let mut total_paid = Decimal::ZERO;
            let mut payout_count = 0u32;

            for m in 1..=months {
                let accrued = input.principal * monthly_rate;
                pending += accrued;
                let mut payout = Decimal::ZERO;
                if m % period_months == 0 || m == months {
                    payout = pending;
                    total_paid += pending;
                    pending = Decimal::ZERO;
                    payout_count += 1;
                }
                monthly_rows.push(fd_row(
                    m,
                    input.start,
                    accrued,
                    Decimal::ZERO,
                    payout,
                    input.principal,
                ));
            }

            FdSchedule {
                maturity_value: input.principal,
                total_interest: total_paid,
                payout_amount: Some(payout_amount),
                payout_count,
                simple_interest: true,
                yearly_rows: aggregate(&monthly_rows),
                monthly_rows,
            }
        }
    }
}

fn fd_row(
    period_index: u32,
    start: Period,
    interest_accrued: Money,
    interest_credited: Money,
    payout: Money,
    balance: Money,
) -> FdMonthlyRow {
    let at = start.offset(period_index);
    FdMonthlyRow {
        period_index,
        year: at.year,
        month: at.month,
        month_name: at.month_name().to_string(),
        interest_accrued,
        interest_credited,
        payout,
        balance,
    }
}

fn aggregate(rows: &[FdMonthlyRow]) -> Vec<FdYearlyRow> {
    let mut yearly: Vec<FdYearlyRow> = Vec::new();
    for row in rows {
        match yearly.last_mut() {
            Some(last) if last.year == row.year => {
                last.interest_accrued += row.interest_accrued;
                last.payout += row.payout;
                last.balance = row.balance;
            }
            _ => yearly.push(FdYearlyRow {
                year: row.year,
                interest_accrued: row.interest_accrued,
                payout: row.payout,
                balance: row.balance,
            }),
        }
    }
    yearly
}
