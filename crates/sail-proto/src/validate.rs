// SPDX-License-Identifier: Apache-2.0
//! Ingress validation (§4.6): movement clamps, rotation wraps,
//! sequence/rate limiting, name sanitization, and the per-session input
//! tier classification used purely as a cost optimization.

use thiserror::Error;

use crate::json::ClientMessage;

/// A pending input's tier (§4.6), used only to decide how eagerly the
/// session layer re-validates/dispatches it — never to change outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum InputTier {
    Idle,
    Background,
    Normal,
    Critical,
}

impl InputTier {
    #[must_use]
    pub fn classify(message: &ClientMessage) -> Self {
        match message {
            ClientMessage::Handshake { .. } => InputTier::Critical,
            ClientMessage::CannonFire { .. } | ClientMessage::ModuleInteract { .. } => {
                InputTier::Critical
            }
            ClientMessage::CannonAim { .. } | ClientMessage::InputFrame { .. } => {
                InputTier::Normal
            }
            ClientMessage::Ping { .. } => InputTier::Background,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("display name is empty after sanitization")]
    EmptyName,
    #[error("display name exceeds the maximum length")]
    NameTooLong,
    #[error("input sequence number went backwards")]
    SequenceRegressed,
    #[error("input rate exceeds the configured limit")]
    RateLimited,
}

const MAX_NAME_LEN: usize = 24;

/// Strips control characters and whitespace padding from a proposed
/// display name, rejecting it outright if nothing usable remains
/// (§4.6 name sanitization).
pub fn sanitize_name(raw: &str) -> Result<String, ValidationError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .to_string();
    if cleaned.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if cleaned.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::NameTooLong);
    }
    Ok(cleaned)
}

/// Clamps a raw throttle/turn/move axis value into `[-1, 1]`, since
/// malformed or out-of-range input is clamped rather than rejected
/// (§4.6).
#[must_use]
pub fn clamp_axis(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-1.0, 1.0)
    }
}

/// Wraps a raw aim/rotation value (radians) into `[0, 2*pi)`.
#[must_use]
pub fn wrap_rotation(radians: f32) -> f32 {
    if !radians.is_finite() {
        return 0.0;
    }
    let tau = std::f32::consts::TAU;
    radians.rem_euclid(tau)
}

/// Tracks per-session sequence and rate-limit state across input
/// frames (§4.6).
#[derive(Debug)]
pub struct RateLimiter {
    last_sequence: Option<u32>,
    window_start_tick: u64,
    window_count: u32,
    max_per_window: u32,
    window_ticks: u64,
}

impl RateLimiter {
    #[must_use]
    pub fn new(max_per_window: u32, window_ticks: u64) -> Self {
        RateLimiter {
            last_sequence: None,
            window_start_tick: 0,
            window_count: 0,
            max_per_window,
            window_ticks,
        }
    }

    /// Validates and records one input frame's sequence number against
    /// monotonicity, and the current tick against the rate window.
    pub fn accept(&mut self, sequence: u32, current_tick: u64) -> Result<(), ValidationError> {
        if let Some(last) = self.last_sequence {
            if sequence <= last {
                return Err(ValidationError::SequenceRegressed);
            }
        }
        if current_tick.saturating_sub(self.window_start_tick) >= self.window_ticks {
            self.window_start_tick = current_tick;
            self.window_count = 0;
        }
        if self.window_count >= self.max_per_window {
            return Err(ValidationError::RateLimited);
        }
        self.window_count += 1;
        self.last_sequence = Some(sequence);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_name_trims_and_strips_control_chars() {
        assert_eq!(sanitize_name("  Jack\u{7}  ").unwrap(), "Jack");
    }

    #[test]
    fn sanitize_name_rejects_all_whitespace() {
        assert_eq!(sanitize_name("   "), Err(ValidationError::EmptyName));
    }

    #[test]
    fn sanitize_name_rejects_overlong_names() {
        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert_eq!(sanitize_name(&long), Err(ValidationError::NameTooLong));
    }

    #[test]
    fn clamp_axis_bounds_and_handles_nan() {
        assert_eq!(clamp_axis(5.0), 1.0);
        assert_eq!(clamp_axis(-5.0), -1.0);
        assert_eq!(clamp_axis(f32::NAN), 0.0);
    }

    #[test]
    fn rate_limiter_rejects_regressed_sequence() {
        let mut limiter = RateLimiter::new(100, 20);
        limiter.accept(5, 0).unwrap();
        assert_eq!(limiter.accept(5, 0), Err(ValidationError::SequenceRegressed));
    }

    #[test]
    fn rate_limiter_enforces_window_cap() {
        let mut limiter = RateLimiter::new(2, 20);
        limiter.accept(1, 0).unwrap();
        limiter.accept(2, 0).unwrap();
        assert_eq!(limiter.accept(3, 0), Err(ValidationError::RateLimited));
    }

    #[test]
    fn rate_limiter_resets_after_window_elapses() {
        let mut limiter = RateLimiter::new(1, 10);
        limiter.accept(1, 0).unwrap();
        assert!(limiter.accept(2, 15).is_ok());
    }
}
