//! Fixed-point-safe currency arithmetic.
//!
//! Amounts are stored as `f64` with two significant decimals. Summing them
//! directly accumulates binary floating-point drift, so every aggregate in
//! the engine converts to integer minor units (cents) first, sums in `i64`,
//! and rescales once at the end.

/// Round an amount to the nearest integer cent.
pub fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

pub fn from_cents(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Snap an amount to two decimal places.
pub fn round_to_cents(amount: f64) -> f64 {
    from_cents(to_cents(amount))
}

/// Sum the selected amounts over a list via minor-unit accumulation.
///
/// The result equals the mathematically exact sum to the cent regardless of
/// list length.
pub fn sum_amounts<T>(items: &[T], amount: impl Fn(&T) -> f64) -> f64 {
    from_cents(items.iter().map(|item| to_cents(amount(item))).sum())
}
