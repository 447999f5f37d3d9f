//! Investment growth schedules: SIP, fixed deposits, PPF, SWP, and the
//! rent-vs-buy ledger.

pub mod fixed_deposit;
pub mod ppf;
pub mod rent_vs_buy;
pub mod sip;
pub mod swp;

use serde::{Deserialize, Serialize};

use crate::calendar::Period;
use crate::types::Money;

/// A single month of an investment growth schedule.
///
/// Invariants: `balance = total_invested + growth` at every row, and
/// `total_invested` never decreases between consecutive rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentMonthlyRow {
    /// 1-based offset from the start period.
    pub period_index: u32,
    pub year: i32,
    pub month: u32,
    pub month_name: String,
    /// Contribution made this month (including any lump sum).
    pub invested: Money,
    pub total_invested: Money,
    pub growth: Money,
    pub balance: Money,
}

impl InvestmentMonthlyRow {
    pub fn new(
        period_index: u32,
        start: Period,
        invested: Money,
        total_invested: Money,
        balance: Money,
    ) -> Self {
        let at = start.offset(period_index);
        InvestmentMonthlyRow {
            period_index,
            year: at.year,
            month: at.month,
            month_name: at.month_name().to_string(),
            invested,
            total_invested,
            growth: balance - total_invested,
            balance,
        }
    }
}

/// Calendar-year aggregate of investment rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentYearlyRow {
    pub year: i32,
    /// Contributions made during the year.
    pub invested: Money,
    pub total_invested: Money,
    pub growth: Money,
    pub balance: Money,
}

/// Bucket monthly investment rows by calendar year. The year-end state
/// (totals, balance) is the last row in the bucket.
pub fn aggregate_investment_by_year(rows: &[InvestmentMonthlyRow]) -> Vec<InvestmentYearlyRow> {
    let mut yearly: Vec<InvestmentYearlyRow> = Vec::new();

    for row in rows {
        match yearly.last_mut() {
            Some(last) if last.year == row.year => {
                last.invested += row.invested;
                last.total_invested = row.total_invested;
                last.growth = row.growth;
                last.balance = row.balance;
            }
            _ => yearly.push(InvestmentYearlyRow {
                year: row.year,
                invested: row.invested,
                total_invested: row.total_invested,
                growth: row.growth,
                balance: row.balance,
            }),
        }
    }

    yearly
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_yearly_aggregation_carries_terminal_state() {
        let start = Period::new(2024, 11).unwrap();
        let rows = vec![
            InvestmentMonthlyRow::new(1, start, dec!(100), dec!(100), dec!(101)),
            InvestmentMonthlyRow::new(2, start, dec!(100), dec!(200), dec!(203)),
            InvestmentMonthlyRow::new(3, start, dec!(100), dec!(300), dec!(306)),
        ];
        let yearly = aggregate_investment_by_year(&rows);

        assert_eq!(yearly.len(), 2);
        assert_eq!(yearly[0].year, 2024);
        assert_eq!(yearly[0].invested, dec!(200));
        assert_eq!(yearly[0].balance, dec!(203));
        assert_eq!(yearly[1].year, 2025);
        assert_eq!(yearly[1].total_invested, dec!(300));
    }

    #[test]
    fn test_row_growth_identity() {
        let start = Period::new(2024, 1).unwrap();
        let row = InvestmentMonthlyRow::new(1, start, dec!(500), dec!(500), dec!(512.5));
        assert_eq!(row.growth, dec!(12.5));
        assert_eq!(row.balance, row.total_invested + row.growth);
    }
}
