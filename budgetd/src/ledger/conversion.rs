//! Currency conversion.
//!
//! Rates are expressed as KRW per 1 USD. Conversion never rounds; rounding happens only when a value
//! is formatted for display.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Convert a KRW amount to USD at `krw_per_usd`.
///
/// Returns `0.0` when the rate is not a finite positive number.
pub fn convert(amount_krw: f64, krw_per_usd: f64) -> f64 {
    if !krw_per_usd.is_finite() || krw_per_usd <= 0.0 {
        return 0.0;
    }
    amount_krw / krw_per_usd
}

/// [`convert`] for stored decimal amounts.
pub fn convert_amount(amount_krw: Decimal, krw_per_usd: f64) -> f64 {
    convert(amount_krw.to_f64().unwrap_or(0.0), krw_per_usd)
}

/// `$1,500.00`
pub fn format_usd(usd: f64) -> String {
    format_grouped(usd, 2, "$")
}

/// `₩1,800,000`
pub fn format_krw(krw: f64) -> String {
    format_grouped(krw, 0, "₩")
}

fn format_grouped(value: f64, decimals: usize, symbol: &str) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    // "-0.00" is not a useful thing to show
    let negative = value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0');
    let sign = if negative { "-" } else { "" };

    match frac_part {
        Some(frac) => format!("{sign}{symbol}{grouped}.{frac}"),
        None => format!("{sign}{symbol}{grouped}"),
    }
}
