//! SWP (systematic withdrawal plan): a fixed monthly withdrawal drawn from
//! a compounding corpus, with exact depletion detection.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::calendar::Period;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::{FinCalcError, FinCalcResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwpInput {
    pub initial_corpus: Money,
    pub monthly_withdrawal: Money,
    /// Annual return as a decimal fraction.
    pub annual_return_rate: Rate,
    pub tenure_months: u32,
    pub start: Period,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwpMonthlyRow {
    pub period_index: u32,
    pub year: i32,
    pub month: u32,
    pub month_name: String,
    pub opening_balance: Money,
    /// Actual amount withdrawn (capped at the available balance).
    pub withdrawal: Money,
    pub growth: Money,
    pub closing_balance: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwpYearlyRow {
    pub year: i32,
    pub withdrawal: Money,
    pub growth: Money,
    pub closing_balance: Money,
}

/// The exact point at which the corpus ran out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepletionPoint {
    pub period_index: u32,
    pub year: i32,
    pub month: u32,
    pub month_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwpSchedule {
    pub monthly_rows: Vec<SwpMonthlyRow>,
    pub yearly_rows: Vec<SwpYearlyRow>,
    pub total_withdrawn: Money,
    pub final_balance: Money,
    /// Set when the corpus reached zero before the requested horizon.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depleted_at: Option<DepletionPoint>,
}

/// Build a withdrawal schedule: each month the withdrawal is deducted and
/// the remainder grows.
pub fn build_swp_schedule(input: &SwpInput) -> FinCalcResult<ComputationOutput<SwpSchedule>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.annual_return_rate < Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: "annual_return_rate".into(),
            reason: "Rate must not be negative".into(),
        });
    }

    let schedule = simulate(input, &mut warnings);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "SWP depletion schedule",
        &serde_json::json!({
            "initial_corpus": input.initial_corpus.to_string(),
            "monthly_withdrawal": input.monthly_withdrawal.to_string(),
            "annual_return_rate": input.annual_return_rate.to_string(),
            "tenure_months": input.tenure_months,
        }),
        warnings,
        elapsed,
        schedule,
    ))
}

fn simulate(input: &SwpInput, warnings: &mut Vec<String>) -> SwpSchedule {
    if input.initial_corpus <= Decimal::ZERO || input.tenure_months == 0 {
        return SwpSchedule {
            monthly_rows: Vec::new(),
            yearly_rows: Vec::new(),
            total_withdrawn: Decimal::ZERO,
            final_balance: Decimal::ZERO,
            depleted_at: None,
        };
    }

    let monthly_rate = input.annual_return_rate / dec!(12);
    let mut balance = input.initial_corpus;
    let mut total_withdrawn = Decimal::ZERO;
    let mut monthly_rows = Vec::with_capacity(input.tenure_months as usize);
    let mut depleted_at = None;

    for m in 1..=input.tenure_months {
        let opening = balance;
        let withdrawal = input.monthly_withdrawal.min(opening);
        let after_withdrawal = opening - withdrawal;
        let growth = after_withdrawal * monthly_rate;
        balance = after_withdrawal + growth;
        total_withdrawn += withdrawal;

        let at = input.start.offset(m);
        monthly_rows.push(SwpMonthlyRow {
            period_index: m,
            year: at.year,
            month: at.month,
            month_name: at.month_name().to_string(),
            opening_balance: opening,
            withdrawal,
            growth,
            closing_balance: balance,
        });

        if balance <= Decimal::ZERO {
            depleted_at = Some(DepletionPoint {
                period_index: m,
                year: at.year,
                month: at.month,
                month_name: at.month_name().to_string(),
            });
            break;
        }
    }

    if let Some(point) = &depleted_at {
        warnings.push(format!(
            "Corpus depleted in {} {} (month {})",
            point.month_name, point.year, point.period_index
        ));
    }

    SwpSchedule {
        yearly_rows: aggregate(&monthly_rows),
        monthly_rows,
        total_withdrawn,
        final_balance: balance.max(Decimal::ZERO),
        depleted_at,
    }
}

fn aggregate(rows: &[SwpMonthlyRow]) -> Vec<SwpYearlyRow> {
    let mut yearly: Vec<SwpYearlyRow> = Vec::new();
    for row in rows {
        match yearly.last_mut() {
            Some(last) if last.year == row.year => {
                last.withdrawal += row.withdrawal;
                last.growth += row.growth;
                last.closing_balance = row.closing_balance;
            }
            _ => yearly.push(SwpYearlyRow {
                year: row.year,
                withdrawal: row.withdrawal,
                growth: row.growth,
                closing_balance: row.closing_balance,
            }),
        }
    }
    yearly
}
