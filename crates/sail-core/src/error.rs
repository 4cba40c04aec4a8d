// SPDX-License-Identifier: Apache-2.0
//! Error kinds owned by `sail-core` (§7).

use thiserror::Error;

/// What kind of entity a capacity error or lookup failure concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Ship,
    Player,
    Projectile,
    Module,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EntityKind::Ship => "ship",
            EntityKind::Player => "player",
            EntityKind::Projectile => "projectile",
            EntityKind::Module => "module",
        };
        write!(f, "{s}")
    }
}

/// Simulation-layer errors. Only [`SimError::Invariant`] is fatal and
/// should ever reach the tick loop; everything else is handled at the
/// point it arises (§7).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimError {
    /// A dense array is at capacity (§4.2 `-> Full`).
    #[error("{kind} capacity exceeded")]
    CapacityExceeded { kind: EntityKind },
    /// Lookup by id found nothing.
    #[error("{kind} not found")]
    NotFound { kind: EntityKind },
    /// An internal invariant was violated. Fatal: triggers process
    /// shutdown (§4.3 failure semantics, §7).
    #[error("invariant violated: {0}")]
    Invariant(String),
}
