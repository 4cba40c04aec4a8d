// SPDX-License-Identifier: Apache-2.0
//! Fixed-point 2D vector type used by ships, players, and projectiles.

use super::fixed::Fixed;
use super::trig;
use std::ops::{Add, AddAssign, Mul, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FixedVec2 {
    pub x: Fixed,
    pub y: Fixed,
}

impl FixedVec2 {
    pub const ZERO: FixedVec2 = FixedVec2 {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        FixedVec2 { x, y }
    }

    #[must_use]
    pub fn from_f64(x: f64, y: f64) -> Self {
        FixedVec2::new(Fixed::from_f64(x), Fixed::from_f64(y))
    }

    /// Squared length; cheaper than [`Self::length`] and sufficient for
    /// most comparisons (e.g. broad-phase collision checks).
    #[must_use]
    pub fn length_sq(self) -> Fixed {
        self.x * self.x + self.y * self.y
    }

    /// Integer square root over the Q16.16 raw magnitude, using Newton's
    /// method — deterministic and free of platform `sqrt`.
    #[must_use]
    pub fn length(self) -> Fixed {
        fixed_sqrt(self.length_sq())
    }

    /// Scales the vector so its length does not exceed `max`, preserving
    /// direction.
    #[must_use]
    pub fn clamp_length(self, max: Fixed) -> Self {
        let len = self.length();
        if len <= max || len == Fixed::ZERO {
            self
        } else {
            let scale = max.checked_div(len);
            FixedVec2::new(self.x * scale, self.y * scale)
        }
    }

    /// Rotates the vector by `angle` radians using the deterministic
    /// sin/cos table.
    #[must_use]
    pub fn rotate(self, angle: Fixed) -> Self {
        let (s, c) = trig::sin_cos(angle);
        FixedVec2::new(self.x * c - self.y * s, self.x * s + self.y * c)
    }

    /// The perpendicular vector `(-y, x)`, used to convert angular
    /// velocity into a linear velocity contribution at an offset.
    #[must_use]
    pub fn perp(self) -> Self {
        FixedVec2::new(-self.y, self.x)
    }

    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x * other.x + self.y * other.y
    }
}

fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }
    // Newton-Raphson on the raw integer, seeded from a bit-length estimate.
    let raw = i64::from(value.raw());
    let mut guess = 1_i64 << ((64 - raw.leading_zeros() as i64) / 2).max(1);
    for _ in 0..20 {
        if guess == 0 {
            break;
        }
        let next = (guess + raw / guess) / 2;
        if next == guess {
            break;
        }
        guess = next;
    }
    // `value` is in Q16.16; sqrt(raw / 2^16) = sqrt(raw) / 2^8, so the
    // integer sqrt of raw must be rescaled back to Q16.16 by 2^8.
    Fixed::from_raw(saturate_i64(guess << 8))
}

fn saturate_i64(value: i64) -> i32 {
    if value > i64::from(i32::MAX) {
        i32::MAX
    } else if value < i64::from(i32::MIN) {
        i32::MIN
    } else {
        value as i32
    }
}

impl Add for FixedVec2 {
    type Output = FixedVec2;
    fn add(self, rhs: Self) -> Self::Output {
        FixedVec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for FixedVec2 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for FixedVec2 {
    type Output = FixedVec2;
    fn sub(self, rhs: Self) -> Self::Output {
        FixedVec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<Fixed> for FixedVec2 {
    type Output = FixedVec2;
    fn mul(self, rhs: Fixed) -> Self::Output {
        FixedVec2::new(self.x * rhs, self.y * rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_of_3_4_5_triangle() {
        let v = FixedVec2::from_f64(3.0, 4.0);
        assert!((v.length().to_f64() - 5.0).abs() < 0.05);
    }

    #[test]
    fn clamp_length_preserves_direction_under_limit() {
        let v = FixedVec2::from_f64(1.0, 0.0);
        assert_eq!(v.clamp_length(Fixed::from_int(5)), v);
    }

    #[test]
    fn clamp_length_scales_down_over_limit() {
        let v = FixedVec2::from_f64(10.0, 0.0);
        let clamped = v.clamp_length(Fixed::from_int(2));
        assert!((clamped.length().to_f64() - 2.0).abs() < 0.05);
    }

    #[test]
    fn rotate_by_zero_is_identity() {
        let v = FixedVec2::from_f64(1.0, 2.0);
        let r = v.rotate(Fixed::ZERO);
        assert!((r.x.to_f64() - v.x.to_f64()).abs() < 1e-2);
        assert!((r.y.to_f64() - v.y.to_f64()).abs() < 1e-2);
    }

    #[test]
    fn perp_is_orthogonal() {
        let v = FixedVec2::from_f64(3.0, 4.0);
        let p = v.perp();
        assert_eq!(v.dot(p), Fixed::ZERO);
    }
}
