// SPDX-License-Identifier: Apache-2.0
//! Wire schema and ingress validation shared by both transport
//! gateways (§6).

pub mod json;
pub mod udp_frame;
pub mod validate;

pub use json::{ClientMessage, InteractAction, InteractionFailureReason, ServerMessage};
pub use validate::{InputTier, RateLimiter, ValidationError};
