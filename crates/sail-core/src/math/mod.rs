// SPDX-License-Identifier: Apache-2.0
//! Deterministic fixed-point math: Q16.16 scalars, 2D vectors, a
//! table-based sin/cos, and the world PRNG (§4.1).

pub mod fixed;
pub mod prng;
pub mod trig;
pub mod vec2;

pub use fixed::Fixed;
pub use prng::Rng64;
pub use vec2::FixedVec2;
