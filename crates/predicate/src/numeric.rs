//! Numeric model for observed JSON numbers.
//!
//! JSON does not distinguish integers from floats, but `serde_json::Number`
//! does: `1` and `1.0` are unequal there. Every numeric comparison in the
//! engine goes through `rust_decimal::Decimal` instead, so both spellings
//! denote the same number. Integers convert exactly; floats convert from
//! their shortest round-trip text (`0.1` is exactly one tenth).
//!
//! Decimal holds 28 significant digits and magnitudes up to about 7.9e28.
//! Numbers outside that range fall back to `f64` comparison.

use std::cmp::Ordering;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Number;

/// Normalized numeric value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Exact(Decimal),
    Float(f64),
}

/// Convert a JSON number into the engine's numeric model.
pub fn normalize(n: &Number) -> Numeric {
    if let Some(i) = n.as_i64() {
        return Numeric::Exact(Decimal::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Numeric::Exact(Decimal::from(u));
    }
    let text = n.to_string();
    if let Ok(d) = Decimal::from_str(&text) {
        return Numeric::Exact(d);
    }
    if let Ok(d) = Decimal::from_scientific(&text) {
        return Numeric::Exact(d);
    }
    Numeric::Float(n.as_f64().unwrap_or(f64::NAN))
}

impl Numeric {
    fn as_f64(self) -> f64 {
        match self {
            Numeric::Exact(d) => d.to_string().parse().unwrap_or(f64::NAN),
            Numeric::Float(f) => f,
        }
    }
}

/// Total order over two JSON numbers.
///
/// JSON numbers are always finite, so the `f64` fallback never sees NaN in
/// practice; `total_cmp` keeps the order total regardless.
pub fn compare_numbers(left: &Number, right: &Number) -> Ordering {
    match (normalize(left), normalize(right)) {
        (Numeric::Exact(l), Numeric::Exact(r)) => l.cmp(&r),
        (l, r) => l.as_f64().total_cmp(&r.as_f64()),
    }
}

/// Numeric equality under the decimal model (`1 == 1.0`).
pub fn numbers_equal(left: &Number, right: &Number) -> bool {
    compare_numbers(left, right) == Ordering::Equal
}
