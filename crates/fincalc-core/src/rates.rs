//! Rate/value primitives: future values, EMI and its inverse, goal-seeking
//! contribution solvers, CAGR, and the inflation-adjusted (real) rate.
//!
//! All rates are decimal fractions per month unless stated otherwise. All
//! math in `rust_decimal::Decimal`.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;

use crate::error::FinCalcError;
use crate::types::{Money, Rate, Years};
use crate::FinCalcResult;

/// Compute (1 + r)^n via iterative multiplication (avoids Decimal::powd drift).
pub fn compound(rate: Rate, n: u32) -> Decimal {
    let mut result = Decimal::ONE;
    let factor = Decimal::ONE + rate;
    for _ in 0..n {
        result *= factor;
    }
    result
}

/// Future value of a monthly SIP under the growth-then-deposit recurrence
/// `balance = balance * (1 + r) + contribution`.
///
/// Closed form of that recurrence is the ordinary annuity
/// `P * ((1+r)^n - 1) / r`; zero rate degenerates to `P * n`.
pub fn sip_future_value(contribution: Money, monthly_rate: Rate, months: u32) -> Money {
    if monthly_rate.is_zero() {
        return contribution * Decimal::from(months);
    }
    contribution * (compound(monthly_rate, months) - Decimal::ONE) / monthly_rate
}

/// Future value of a lump sum: `L * (1+r)^n`.
pub fn lump_future_value(principal: Money, monthly_rate: Rate, months: u32) -> Money {
    principal * compound(monthly_rate, months)
}

/// Equated Monthly Installment for a reducing-balance loan:
/// `EMI = P * r * (1+r)^n / ((1+r)^n - 1)`, or `P / n` at zero rate.
pub fn emi(principal: Money, monthly_rate: Rate, months: u32) -> FinCalcResult<Money> {
    if months == 0 {
        return Err(FinCalcError::InvalidInput {
            field: "months".into(),
            reason: "Tenure must be at least 1 month".into(),
        });
    }
    if monthly_rate.is_zero() {
        return Ok(principal / Decimal::from(months));
    }

    let factor = compound(monthly_rate, months);
    let denom = factor - Decimal::ONE;
    if denom.is_zero() {
        return Err(FinCalcError::DivisionByZero {
            context: "EMI annuity factor".into(),
        });
    }
    Ok(principal * monthly_rate * factor / denom)
}

/// Loan principal affordable at a given EMI (algebraic inverse of `emi`).
pub fn principal_from_emi(emi: Money, monthly_rate: Rate, months: u32) -> FinCalcResult<Money> {
    if months == 0 {
        return Err(FinCalcError::InvalidInput {
            field: "months".into(),
            reason: "Tenure must be at least 1 month".into(),
        });
    }
    if monthly_rate.is_zero() {
        return Ok(emi * Decimal::from(months));
    }

    let factor = compound(monthly_rate, months);
    let denom = monthly_rate * factor;
    if denom.is_zero() {
        return Err(FinCalcError::DivisionByZero {
            context: "reverse-EMI factor".into(),
        });
    }
    Ok(emi * (factor - Decimal::ONE) / denom)
}

/// Monthly contribution needed to reach a target future value.
pub fn required_sip(target: Money, monthly_rate: Rate, months: u32) -> FinCalcResult<Money> {
    if months == 0 {
        return Err(FinCalcError::InvalidInput {
            field: "months".into(),
            reason: "Tenure must be at least 1 month".into(),
        });
    }
    let unit_fv = sip_future_value(Decimal::ONE, monthly_rate, months);
    if unit_fv.is_zero() {
        return Err(FinCalcError::DivisionByZero {
            context: "required SIP unit future value".into(),
        });
    }
    Ok(target / unit_fv)
}

/// Lump sum needed today to reach a target future value.
pub fn required_lump_sum(target: Money, monthly_rate: Rate, months: u32) -> FinCalcResult<Money> {
    if months == 0 {
        return Err(FinCalcError::InvalidInput {
            field: "months".into(),
            reason: "Tenure must be at least 1 month".into(),
        });
    }
    Ok(target / compound(monthly_rate, months))
}

/// Starting contribution for a step-up SIP that reaches a target.
///
/// The recurrence has no closed form once the contribution steps up each
/// anniversary, but it is linear in the starting contribution: simulate a
/// unit contribution through the schedule and divide the target by the
/// terminal multiplier.
pub fn required_step_up_sip(
    target: Money,
    monthly_rate: Rate,
    months: u32,
    annual_step_up: Rate,
) -> FinCalcResult<Money> {
    if months == 0 {
        return Err(FinCalcError::InvalidInput {
            field: "months".into(),
            reason: "Tenure must be at least 1 month".into(),
        });
    }

    let mut contribution = Decimal::ONE;
    let mut balance = Decimal::ZERO;
    for m in 1..=months {
        if m > 1 && (m - 1) % 12 == 0 {
            contribution *= Decimal::ONE + annual_step_up;
        }
        balance = balance * (Decimal::ONE + monthly_rate) + contribution;
    }

    if balance.is_zero() {
        return Err(FinCalcError::DivisionByZero {
            context: "step-up SIP unit multiplier".into(),
        });
    }
    Ok(target / balance)
}

/// Compound Annual Growth Rate as a decimal fraction.
///
/// Returns exactly 0 when the inputs are degenerate (`start <= 0`,
/// `years <= 0`, or `end == start`); negative when `end < start`.
pub fn cagr(start: Money, end: Money, years: Years) -> Rate {
    if start <= Decimal::ZERO || years <= Decimal::ZERO || end == start {
        return Decimal::ZERO;
    }
    if end <= Decimal::ZERO {
        // Total loss
        return Decimal::NEGATIVE_ONE;
    }
    (end / start).powd(Decimal::ONE / years) - Decimal::ONE
}

/// Inflation-adjusted return via the Fisher equation:
/// `(1 + nominal) / (1 + inflation) - 1`, floored at zero.
pub fn real_rate(nominal: Rate, inflation: Rate) -> Rate {
    if inflation.is_zero() {
        return nominal;
    }
    let real = (Decimal::ONE + nominal) / (Decimal::ONE + inflation) - Decimal::ONE;
    real.max(Decimal::ZERO)
}
