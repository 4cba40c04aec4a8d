// SPDX-License-Identifier: Apache-2.0
//! Field-level quantization (§4.5): position at 1/512 m as a 16-bit
//! unsigned offset from a world origin, velocity at 1/256 m/s as a
//! 16-bit signed value, rotation at 2π/1024, health/state at 8 bits.
//! This module is the single site where world units convert to wire
//! units and back (§6: "exactly one coordinate-conversion site").

use crate::math::{Fixed, FixedVec2};

const POSITION_SCALE: i64 = 512;
const VELOCITY_SCALE: i64 = 256;
const ROTATION_STEPS: i64 = 1024;

/// Quantizes a world position component, shifted by `origin_offset` so
/// it is non-negative, to a wire `u16` at 1/512 m resolution. Values
/// outside the representable range saturate at the `u16` bounds rather
/// than wrapping.
#[must_use]
pub fn quantize_position(value: Fixed, origin_offset: Fixed) -> u16 {
    let shifted = value + origin_offset;
    let raw = i64::from(shifted.raw());
    let scaled = (raw * POSITION_SCALE) >> 16;
    scaled.clamp(0, i64::from(u16::MAX)) as u16
}

#[must_use]
pub fn dequantize_position(wire: u16, origin_offset: Fixed) -> Fixed {
    let raw = (i64::from(wire) << 16) / POSITION_SCALE;
    Fixed::from_raw(raw as i32) - origin_offset
}

/// Quantizes a world velocity component to a wire `i16` at 1/256 m/s
/// resolution, clamped to the representable range.
#[must_use]
pub fn quantize_velocity(value: Fixed) -> i16 {
    let raw = i64::from(value.raw());
    let scaled = (raw * VELOCITY_SCALE) >> 16;
    scaled.clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i16
}

#[must_use]
pub fn dequantize_velocity(wire: i16) -> Fixed {
    let raw = (i64::from(wire) << 16) / VELOCITY_SCALE;
    Fixed::from_raw(raw as i32)
}

/// Quantizes a rotation (radians, `Fixed`) to one of 1024 steps around
/// the circle, wrapping into `[0, 1024)`.
#[must_use]
pub fn quantize_rotation(value: Fixed) -> u16 {
    const TAU_RAW: i64 = 411_775; // round(2*pi * 65536), matches trig::TAU_RAW
    let raw = i64::from(value.raw()).rem_euclid(TAU_RAW);
    let step = (raw * ROTATION_STEPS) / TAU_RAW;
    step.rem_euclid(ROTATION_STEPS) as u16
}

#[must_use]
pub fn dequantize_rotation(step: u16) -> Fixed {
    const TAU_RAW: i64 = 411_775;
    let raw = (i64::from(step) * TAU_RAW) / ROTATION_STEPS;
    Fixed::from_raw(raw as i32)
}

/// Quantizes a health value against `max` into an 8-bit fraction
/// (0 = dead, 255 = full health).
#[must_use]
pub fn quantize_health(value: Fixed, max: Fixed) -> u8 {
    if max <= Fixed::ZERO {
        return 0;
    }
    let frac = (value.max(Fixed::ZERO)).checked_div(max);
    let scaled = (i64::from(frac.raw()) * 255) >> 16;
    scaled.clamp(0, 255) as u8
}

#[must_use]
pub fn dequantize_health(wire: u8, max: Fixed) -> Fixed {
    max * Fixed::from_f64(f64::from(wire) / 255.0)
}

/// Quantizes a 2D world position into wire (x, y) pairs, both offset by
/// `origin_offset` so the unsigned wire value stays non-negative.
#[must_use]
pub fn quantize_vec2_position(v: FixedVec2, origin_offset: Fixed) -> (u16, u16) {
    (
        quantize_position(v.x, origin_offset),
        quantize_position(v.y, origin_offset),
    )
}

#[must_use]
pub fn dequantize_vec2_position(wire: (u16, u16), origin_offset: Fixed) -> FixedVec2 {
    FixedVec2::new(
        dequantize_position(wire.0, origin_offset),
        dequantize_position(wire.1, origin_offset),
    )
}

#[must_use]
pub fn quantize_vec2_velocity(v: FixedVec2) -> (i16, i16) {
    (quantize_velocity(v.x), quantize_velocity(v.y))
}

#[must_use]
pub fn dequantize_vec2_velocity(wire: (i16, i16)) -> FixedVec2 {
    FixedVec2::new(dequantize_velocity(wire.0), dequantize_velocity(wire.1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_roundtrips_within_quantization_step() {
        let origin = Fixed::from_int(2000);
        let v = Fixed::from_f64(-1876.544);
        let wire = quantize_position(v, origin);
        let back = dequantize_position(wire, origin);
        assert!((back.to_f64() - v.to_f64()).abs() < 1.0 / 512.0 + 1e-6);
    }

    #[test]
    fn position_outside_wire_range_saturates_instead_of_wrapping() {
        let origin = Fixed::from_int(2000);
        let v = Fixed::from_int(4000);
        let wire = quantize_position(v, origin);
        assert_eq!(wire, u16::MAX);
    }

    #[test]
    fn velocity_roundtrips_within_quantization_step() {
        let v = Fixed::from_f64(-12.5);
        let wire = quantize_velocity(v);
        let back = dequantize_velocity(wire);
        assert!((back.to_f64() - v.to_f64()).abs() < 1.0 / 256.0 + 1e-6);
    }

    #[test]
    fn rotation_wraps_into_1024_steps() {
        let v = Fixed::from_f64(std::f64::consts::TAU + 0.01);
        let step = quantize_rotation(v);
        assert!(step < 1024);
    }

    #[test]
    fn health_quantizes_to_full_range() {
        let max = Fixed::from_int(100);
        assert_eq!(quantize_health(Fixed::ZERO, max), 0);
        assert_eq!(quantize_health(max, max), 255);
    }

    #[test]
    fn health_dequantizes_approximately() {
        let max = Fixed::from_int(100);
        let wire = quantize_health(Fixed::from_int(50), max);
        let back = dequantize_health(wire, max);
        assert!((back.to_f64() - 50.0).abs() < 1.0);
    }
}
