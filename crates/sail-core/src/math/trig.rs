// SPDX-License-Identifier: Apache-2.0
//! Deterministic `sin`/`cos` for [`Fixed`] radians.
//!
//! Backed by a 1024-entry lookup table keyed by `angle mod 2*pi` scaled
//! into `[0, 1024)`, baked in at compile time by `build.rs`. All
//! transcendentals that feed the simulation go through this table rather
//! than a platform math library, so results stay bit-identical across
//! targets. Intermediate angles linearly interpolate between adjacent
//! table entries.

use super::fixed::Fixed;

include!(concat!(env!("OUT_DIR"), "/sin_table.rs"));

const TABLE_LEN: i64 = SIN_TABLE.len() as i64;
/// 2*pi in Q16.16, used for range reduction.
const TAU_RAW: i64 = 411_775; // round(2*pi * 65536)
const QUARTER_TABLE: i64 = TABLE_LEN / 4;

fn table_lookup(index: i64) -> Fixed {
    let idx = index.rem_euclid(TABLE_LEN) as usize;
    Fixed::from_raw(SIN_TABLE[idx])
}

/// Maps a raw Q16.16 angle to a fixed-point table position in `[0, 1024)`
/// plus the fractional remainder used for linear interpolation, both
/// expressed in Q16.16-scaled table-step units.
fn angle_to_table_pos(angle: Fixed) -> (i64, Fixed) {
    use super::fixed::FRAC_BITS;
    let reduced = i64::from(angle.raw()).rem_euclid(TAU_RAW);
    // position = reduced / TAU_RAW * TABLE_LEN, kept in Q16.16 precision.
    let scaled = i128::from(reduced * TABLE_LEN) << FRAC_BITS;
    let scaled = scaled / i128::from(TAU_RAW);
    let pos_fixed = Fixed::from_raw(scaled as i32);
    let index = i64::from(pos_fixed.raw()) >> FRAC_BITS;
    let frac_raw = pos_fixed.raw() & ((1 << FRAC_BITS) - 1);
    (index, Fixed::from_raw(frac_raw))
}

/// Deterministic `sin` for a `Fixed` angle in radians.
#[must_use]
pub fn sin(angle: Fixed) -> Fixed {
    let (index, frac) = angle_to_table_pos(angle);
    let y0 = table_lookup(index);
    let y1 = table_lookup(index + 1);
    y0 + (y1 - y0) * frac
}

/// Deterministic `cos` for a `Fixed` angle in radians, derived as
/// `sin(angle + pi/2)` via the same table (quarter-phase shift).
#[must_use]
pub fn cos(angle: Fixed) -> Fixed {
    let (index, frac) = angle_to_table_pos(angle);
    let shifted = index + QUARTER_TABLE;
    let y0 = table_lookup(shifted);
    let y1 = table_lookup(shifted + 1);
    y0 + (y1 - y0) * frac
}

/// Returns `(sin, cos)` computed from a single table walk.
#[must_use]
pub fn sin_cos(angle: Fixed) -> (Fixed, Fixed) {
    (sin(angle), cos(angle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn approx(a: Fixed, b: f64, tol: f64) {
        assert!(
            (a.to_f64() - b).abs() < tol,
            "{} !~= {} (tol {})",
            a.to_f64(),
            b,
            tol
        );
    }

    #[test]
    fn sin_zero_is_zero() {
        approx(sin(Fixed::ZERO), 0.0, 1e-3);
    }

    #[test]
    fn cos_zero_is_one() {
        approx(cos(Fixed::ZERO), 1.0, 1e-3);
    }

    #[test]
    fn sin_half_pi_is_one() {
        approx(sin(Fixed::from_f64(PI / 2.0)), 1.0, 5e-3);
    }

    #[test]
    fn sin_pi_is_zero() {
        approx(sin(Fixed::from_f64(PI)), 0.0, 5e-3);
    }

    #[test]
    fn sin_cos_identity_holds_approximately() {
        for i in 0..16 {
            let angle = Fixed::from_f64(PI * f64::from(i) / 8.0);
            let (s, c) = sin_cos(angle);
            let mag = (s.to_f64().powi(2) + c.to_f64().powi(2)).sqrt();
            assert!((mag - 1.0).abs() < 1e-2, "angle {i}: mag {mag}");
        }
    }

    #[test]
    fn table_lookup_is_deterministic_across_calls() {
        let angle = Fixed::from_f64(1.2345);
        assert_eq!(sin(angle), sin(angle));
        assert_eq!(cos(angle), cos(angle));
    }
}
