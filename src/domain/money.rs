//! Decimal aliases and unit conversions shared by pricing code.

use rust_decimal::Decimal;

/// Price in quote currency per unit of base.
pub type Price = Decimal;

/// Quantity in base currency.
pub type Volume = Decimal;

/// Fee rate as a decimal fraction: `0.001` is 0.1%.
pub type FeeRate = Decimal;

/// Smallest quantity treated as fillable: 1e-9.
pub const EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 9);

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Convert a percentage (`0.1` meaning 0.1%) into a fee fraction.
#[must_use]
pub fn percent_to_fraction(percent: Decimal) -> FeeRate {
    percent / HUNDRED
}

/// Convert a fee fraction back into percentage points.
#[must_use]
pub fn fraction_to_percent(fraction: FeeRate) -> Decimal {
    fraction * HUNDRED
}
