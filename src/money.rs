//! Fixed-scale conversion between major currency units and the processor's
//! integer minor units.
//!
//! The HTTP API accepts major-unit decimal amounts (e.g. `61.00`); the
//! processor and the local ledger only ever see integer minor units (cents).
//! Every boundary crossing goes through this module so the scale lives in
//! exactly one place.

/// Minor units per major unit. The processor tracks all amounts in cents.
pub const MINOR_UNITS_PER_MAJOR: i64 = 100;

/// Convert a major-unit amount to minor units, rounding to the nearest cent.
///
/// Request amounts are rounded before they are sent to the processor, so a
/// caller-supplied `10.004` becomes `1000` and `10.005` becomes `1001`.
pub fn to_minor_units(major: f64) -> i64 {
    (major * MINOR_UNITS_PER_MAJOR as f64).round() as i64
}

/// Convert an integer minor-unit amount to major units for display.
pub fn to_major_units(minor: i64) -> f64 {
    minor as f64 / MINOR_UNITS_PER_MAJOR as f64
}
