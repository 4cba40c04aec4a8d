// SPDX-License-Identifier: Apache-2.0
//! Cannonballs (§3). Finite lifetime; expired projectiles are removed at
//! the start of the next tick.

use crate::ident::{ProjectileId, ShipId};
use crate::math::{Fixed, FixedVec2};

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Projectile {
    pub id: ProjectileId,
    pub owner: ShipId,
    pub position: FixedVec2,
    pub velocity: FixedVec2,
    pub damage: Fixed,
    pub spawn_tick: u64,
    pub lifetime_ticks_remaining: u32,
}

impl Projectile {
    #[must_use]
    pub fn new(
        id: ProjectileId,
        owner: ShipId,
        position: FixedVec2,
        velocity: FixedVec2,
        damage: Fixed,
        spawn_tick: u64,
        lifetime_ticks: u32,
    ) -> Self {
        Projectile {
            id,
            owner,
            position,
            velocity,
            damage,
            spawn_tick,
            lifetime_ticks_remaining: lifetime_ticks,
        }
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.lifetime_ticks_remaining == 0
    }

    /// Whether the first-collision grace window against the owner ship
    /// is still active (I5), measured in ticks since spawn.
    #[must_use]
    pub fn in_owner_grace_window(&self, current_tick: u64) -> bool {
        const GRACE_TICKS: u64 = 3;
        current_tick.saturating_sub(self.spawn_tick) < GRACE_TICKS
    }
}
