//! Shared amortisation row types and yearly aggregation.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calendar::Period;
use crate::types::Money;

/// Minimum balance below which a loan is considered fully paid.
pub const BALANCE_EPSILON: Decimal = dec!(0.01);

/// A single month of an amortisation schedule.
///
/// `interest` is the interest accrued in the month. It equals the interest
/// paid except during a capitalised moratorium, where it is added to the
/// balance instead. `closing_balance` is never negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyRow {
    /// 1-based offset from the start period.
    pub period_index: u32,
    pub year: i32,
    pub month: u32,
    pub month_name: String,
    pub opening_balance: Money,
    pub interest: Money,
    pub principal_paid: Money,
    pub prepayment: Money,
    pub closing_balance: Money,
}

impl MonthlyRow {
    pub fn new(
        period_index: u32,
        start: Period,
        opening_balance: Money,
        interest: Money,
        principal_paid: Money,
        prepayment: Money,
        closing_balance: Money,
    ) -> Self {
        let at = start.offset(period_index);
        MonthlyRow {
            period_index,
            year: at.year,
            month: at.month,
            month_name: at.month_name().to_string(),
            opening_balance,
            interest,
            principal_paid,
            prepayment,
            closing_balance,
        }
    }
}

/// Calendar- or fiscal-year aggregate of 1-12 consecutive monthly rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearlyRow {
    pub year: i32,
    pub interest: Money,
    pub principal_paid: Money,
    pub prepayment: Money,
    pub closing_balance: Money,
    /// Cumulative principal repaid (including prepayments) as a percentage
    /// of the original principal.
    pub total_paid_percent: Decimal,
}

/// Bucket monthly rows by calendar year.
pub fn aggregate_by_calendar_year(rows: &[MonthlyRow], principal: Money) -> Vec<YearlyRow> {
    aggregate_rows(rows, principal, |row| row.year)
}

/// Bucket the same monthly rows by the fiscal year containing each month
/// (e.g. fiscal_start_month = 4 for an April-March financial year). Never
/// re-simulates; only reassigns rows to buckets.
pub fn aggregate_by_fiscal_year(
    rows: &[MonthlyRow],
    principal: Money,
    fiscal_start_month: u32,
) -> Vec<YearlyRow> {
    aggregate_rows(rows, principal, |row| {
        Period {
            year: row.year,
            month: row.month,
        }
        .fiscal_year(fiscal_start_month)
    })
}

fn aggregate_rows<F>(rows: &[MonthlyRow], principal: Money, bucket: F) -> Vec<YearlyRow>
where
    F: Fn(&MonthlyRow) -> i32,
{
    let mut yearly: Vec<YearlyRow> = Vec::new();
    let mut cumulative_paid = Decimal::ZERO;

    for row in rows {
        let year = bucket(row);
        cumulative_paid += row.principal_paid + row.prepayment;
        let percent = if principal > Decimal::ZERO {
            cumulative_paid / principal * dec!(100)
        } else {
            Decimal::ZERO
        };

        match yearly.last_mut() {
            Some(last) if last.year == year => {
                last.interest += row.interest;
                last.principal_paid += row.principal_paid;
                last.prepayment += row.prepayment;
                last.closing_balance = row.closing_balance;
                last.total_paid_percent = percent;
            }
            _ => yearly.push(YearlyRow {
                year,
                interest: row.interest,
                principal_paid: row.principal_paid,
                prepayment: row.prepayment,
                closing_balance: row.closing_balance,
                total_paid_percent: percent,
            }),
        }
    }

    yearly
}
