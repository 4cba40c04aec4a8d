// SPDX-License-Identifier: Apache-2.0
//! The deterministic simulation step (§4.3) and its collision passes.

pub mod collision;
pub mod step;

pub use step::{step, PlayerControl, ShipControl, StepConfig, StepInputs};
