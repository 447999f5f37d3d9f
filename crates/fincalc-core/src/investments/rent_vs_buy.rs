//! Rent-vs-buy ledger: parallel net-worth trajectories for buying a home
//! (equity minus remaining loan) versus renting and investing the capital.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::calendar::Period;
use crate::rates;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::{FinCalcError, FinCalcResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentVsBuyInput {
    pub home_price: Money,
    pub down_payment: Money,
    /// Annual rate on the financed portion.
    pub loan_annual_rate: Rate,
    pub loan_tenure_months: u32,
    /// Annual property appreciation.
    pub property_appreciation_rate: Rate,
    pub monthly_rent: Money,
    /// Annual rent escalation.
    pub annual_rent_inflation: Rate,
    /// Annual return on the renter's invested capital.
    pub investment_return_rate: Rate,
    pub horizon_years: u32,
    pub start: Period,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentVsBuyYearlyRow {
    pub year: i32,
    pub home_value: Money,
    pub loan_balance: Money,
    /// Home value minus the outstanding loan.
    pub buy_net_worth: Money,
    /// Invested down-payment capital plus invested EMI-vs-rent savings.
    pub rent_net_worth: Money,
    pub annual_rent_paid: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentVsBuyLedger {
    pub emi: Money,
    pub yearly_rows: Vec<RentVsBuyYearlyRow>,
    pub final_buy_net_worth: Money,
    pub final_rent_net_worth: Money,
    /// First year-end at which buying overtakes renting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crossover_year: Option<i32>,
}

/// Simulate both trajectories month by month and report a year-by-year
/// comparison.
pub fn build_rent_vs_buy_ledger(
    input: &RentVsBuyInput,
) -> FinCalcResult<ComputationOutput<RentVsBuyLedger>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.down_payment > input.home_price {
        return Err(FinCalcError::InvalidInput {
            field: "down_payment".into(),
            reason: "Down payment cannot exceed the home price".into(),
        });
    }
    if input.loan_annual_rate < Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: "loan_annual_rate".into(),
            reason: "Rate must not be negative".into(),
        });
    }

    let ledger = simulate(input, &mut warnings)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Rent-vs-buy net-worth ledger",
        &serde_json::json!({
            "home_price": input.home_price.to_string(),
            "down_payment": input.down_payment.to_string(),
            "loan_annual_rate": input.loan_annual_rate.to_string(),
            "monthly_rent": input.monthly_rent.to_string(),
            "horizon_years": input.horizon_years,
        }),
        warnings,
        elapsed,
        ledger,
    ))
}

fn simulate(input: &RentVsBuyInput, warnings: &mut Vec<String>) -> FinCalcResult<RentVsBuyLedger> {
    if input.home_price <= Decimal::ZERO || input.horizon_years == 0 {
        return Ok(RentVsBuyLedger {
            emi: Decimal::ZERO,
            yearly_rows: Vec::new(),
            final_buy_net_worth: Decimal::ZERO,
            final_rent_net_worth: Decimal::ZERO,
            crossover_year: None,
        });
    }

    let financed = input.home_price - input.down_payment;
    let loan_rate = input.loan_annual_rate / dec!(12);
    let emi = if financed > Decimal::ZERO && input.loan_tenure_months > 0 {
        rates::emi(financed, loan_rate, input.loan_tenure_months)?
    } else {
        Decimal::ZERO
    };

    if !loan_rate.is_zero()
        && financed > Decimal::ZERO
        && emi <= financed * loan_rate
    {
        warnings.push("Loan never amortises at these terms; ledger not built".into());
        return Ok(RentVsBuyLedger {
            emi,
            yearly_rows: Vec::new(),
            final_buy_net_worth: Decimal::ZERO,
            final_rent_net_worth: Decimal::ZERO,
            crossover_year: None,
        });
    }

    let property_rate = input.property_appreciation_rate / dec!(12);
    let invest_rate = input.investment_return_rate / dec!(12);

    let mut home_value = input.home_price;
    let mut loan_balance = financed;
    let mut renter_corpus = input.down_payment;
    let mut rent = input.monthly_rent;
    let mut yearly_rows = Vec::with_capacity(input.horizon_years as usize);
    let mut crossover_year = None;

    let total_months = input.horizon_years * 12;
    let mut rent_paid_this_year = Decimal::ZERO;

    for m in 1..=total_months {
        if m > 1 && (m - 1) % 12 == 0 {
            rent *= Decimal::ONE + input.annual_rent_inflation;
        }

        home_value *= Decimal::ONE + property_rate;

        // Buyer's loan payment this month (zero once the loan closes).
        let payment = if loan_balance > Decimal::ZERO && m <= input.loan_tenure_months {
            let interest = loan_balance * loan_rate;
            let principal_component = (emi - interest).min(loan_balance);
            loan_balance -= principal_component;
            if loan_balance < dec!(0.01) {
                loan_balance = Decimal::ZERO;
            }
            interest + principal_component
        } else {
            Decimal::ZERO
        };

        // The renter invests the cash-flow difference when renting is
        // cheaper than the month's loan payment.
        let differential = (payment - rent).max(Decimal::ZERO);
        renter_corpus = renter_corpus * (Decimal::ONE + invest_rate) + differential;
        rent_paid_this_year += rent;

        if m % 12 == 0 {
            let at = input.start.offset(m);
            let buy_net_worth = home_value - loan_balance;
            if crossover_year.is_none() && buy_net_worth >= renter_corpus {
                crossover_year = Some(at.year);
            }
            yearly_rows.push(RentVsBuyYearlyRow {
                year: at.year,
                home_value,
                loan_balance,
                buy_net_worth,
                rent_net_worth: renter_corpus,
                annual_rent_paid: rent_paid_this_year,
            });
            rent_paid_this_year = Decimal::ZERO;
        }
    }

    let last = yearly_rows.last();
    Ok(RentVsBuyLedger {
        emi,
        final_buy_net_worth: last.map_or(Decimal::ZERO, |r| r.buy_net_worth),
        final_rent_net_worth: last.map_or(Decimal::ZERO, |r| r.rent_net_worth),
        crossover_year,
        yearly_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> RentVsBuyInput {
        RentVsBuyInput {
            home_price: dec!(8000000),
            down_payment: dec!(1600000),
            loan_annual_rate: dec!(0.09),
            loan_tenure_months: 240,
            property_appreciation_rate: dec!(0.05),
            monthly_rent: dec!(25000),
            annual_rent_inflation: dec!(0.05),
            investment_return_rate: dec!(0.11),
            horizon_years: 20,
            start: Period::new(2024, 1).unwrap(),
        }
    }

    #[test]
    fn test_ledger_has_one_row_per_year() {
        let result = build_rent_vs_buy_ledger(&input()).unwrap();
        assert_eq!(result.result.yearly_rows.len(), 20);
    }

    #[test]
    fn test_buy_net_worth_is_equity() {
        let result = build_rent_vs_buy_ledger(&input()).unwrap();
        for row in &result.result.yearly_rows {
            assert_eq!(row.buy_net_worth, row.home_value - row.loan_balance);
        }
    }

    #[test]
    fn test_loan_fully_paid_by_tenure_end() {
        let result = build_rent_vs_buy_ledger(&input()).unwrap();
        let last = result.result.yearly_rows.last().unwrap();
        assert_eq!(last.loan_balance, Decimal::ZERO);
        assert_eq!(last.buy_net_worth, last.home_value);
    }

    #[test]
    fn test_rent_inflates_annually() {
        let result = build_rent_vs_buy_ledger(&input()).unwrap();
        let rows = &result.result.yearly_rows;
        // Year 1: 12 x 25,000; year 2: 12 x 26,250
        assert_eq!(rows[0].annual_rent_paid, dec!(300000));
        assert!((rows[1].annual_rent_paid - dec!(315000)).abs() < dec!(0.01));
    }

    #[test]
    fn test_all_cash_purchase_has_no_loan() {
        let mut i = input();
        i.down_payment = i.home_price;
        let result = build_rent_vs_buy_ledger(&i).unwrap();
        let s = &result.result;

        assert_eq!(s.emi, Decimal::ZERO);
        assert!(s.yearly_rows.iter().all(|r| r.loan_balance == Decimal::ZERO));
    }

    #[test]
    fn test_down_payment_exceeding_price_rejected() {
        let mut i = input();
        i.down_payment = dec!(9000000);
        assert!(build_rent_vs_buy_ledger(&i).is_err());
    }

    #[test]
    fn test_degenerate_horizon_returns_empty() {
        let mut i = input();
        i.horizon_years = 0;
        let result = build_rent_vs_buy_ledger(&i).unwrap();
        assert!(result.result.yearly_rows.is_empty());
    }
}
