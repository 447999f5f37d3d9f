use fincalc_core::tax::{calculate_ltcg, exemption_ceiling, LtcgConfig, MAX_LTCG_RATE};
use fincalc_core::types::Currency;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[test]
fn test_exemption_clamped_to_inr_ceiling() {
    // A requested exemption far above the ceiling applies at exactly the
    // ceiling, wiping out the taxable gain entirely.
    let config = LtcgConfig {
        tax_rate: dec!(10),
        currency: Currency::INR,
        exemption_applied: true,
        exemption_limit: dec!(999999999),
    };
    let out = calculate_ltcg(dec!(50000), dec!(100000), true, &config).unwrap();

    assert_eq!(out.exemption_used, dec!(200000));
    assert_eq!(out.taxable_gain, Decimal::ZERO);
    assert_eq!(out.tax_amount, Decimal::ZERO);
    assert_eq!(out.net_future_value, dec!(150000));
}

#[test]
fn test_usd_ceiling_is_lower() {
    let config = LtcgConfig {
        tax_rate: dec!(0.15),
        currency: Currency::USD,
        exemption_applied: true,
        exemption_limit: dec!(500000),
    };
    let out = calculate_ltcg(dec!(300000), dec!(1000000), true, &config).unwrap();

    assert_eq!(exemption_ceiling(&Currency::USD), dec!(100000));
    assert_eq!(out.exemption_used, dec!(100000));
    assert_eq!(out.taxable_gain, dec!(200000));
    assert_eq!(out.tax_amount, dec!(30000));
}

#[test]
fn test_rate_normalisation_and_clamp() {
    let fraction = LtcgConfig {
        tax_rate: dec!(0.125),
        currency: Currency::INR,
        exemption_applied: false,
        exemption_limit: Decimal::ZERO,
    };
    let percent = LtcgConfig {
        tax_rate: dec!(12.5),
        ..fraction.clone()
    };
    let absurd = LtcgConfig {
        tax_rate: dec!(95),
        ..fraction.clone()
    };

    let a = calculate_ltcg(dec!(80000), dec!(200000), true, &fraction).unwrap();
    let b = calculate_ltcg(dec!(80000), dec!(200000), true, &percent).unwrap();
    assert_eq!(a.tax_amount, b.tax_amount);
    assert_eq!(a.tax_rate_used, dec!(0.125));

    let c = calculate_ltcg(dec!(80000), dec!(200000), true, &absurd).unwrap();
    assert_eq!(c.tax_rate_used, MAX_LTCG_RATE);
}

#[test]
fn test_overlay_never_errors_on_domain_inputs() {
    // Losses and the applied=false path both pass through untaxed.
    let config = LtcgConfig {
        tax_rate: dec!(10),
        currency: Currency::INR,
        exemption_applied: true,
        exemption_limit: dec!(100000),
    };

    let loss = calculate_ltcg(dec!(-50000), dec!(100000), true, &config).unwrap();
    assert_eq!(loss.tax_amount, Decimal::ZERO);
    assert_eq!(loss.net_future_value, dec!(50000));

    let off = calculate_ltcg(dec!(50000), dec!(100000), false, &config).unwrap();
    assert_eq!(off.tax_amount, Decimal::ZERO);
    assert_eq!(off.net_gain, dec!(50000));
}
