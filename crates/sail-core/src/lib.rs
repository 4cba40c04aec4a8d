// SPDX-License-Identifier: Apache-2.0
//! Deterministic fixed-point simulation, spatial index, and snapshot
//! encoder for the authoritative server core.
//!
//! `sail-core` has no knowledge of sessions, transports, or wire
//! formats beyond the quantized snapshot shapes in [`snapshot`] — those
//! concerns live in `sail-session` and the gateway crates.

pub mod aoi;
pub mod entities;
pub mod error;
pub mod hash;
pub mod ident;
pub mod interaction;
pub mod math;
pub mod sim;
pub mod snapshot;
pub mod telemetry;
pub mod world;

pub use error::SimError;
pub use world::{World, WorldCapacity};
