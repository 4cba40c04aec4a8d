// SPDX-License-Identifier: Apache-2.0
//! Embodied players (§3). A player always exists once created; mounting
//! is expressed as a weak `Carrier` reference, resolved by lookup each
//! tick rather than held as a pointer (§9).

use crate::ident::{ModuleId, PlayerId, ShipId};
use crate::math::{Fixed, FixedVec2};

/// Weak reference to the ship/module a player is mounted on, plus the
/// player's offset in ship-local space.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Carrier {
    pub ship: ShipId,
    pub module: ModuleId,
    pub offset: FixedVec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PlayerState {
    Walking,
    Swimming,
    Falling,
    Mounted,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Player {
    pub id: PlayerId,
    pub position: FixedVec2,
    pub velocity: FixedVec2,
    pub rotation: Fixed,
    pub radius: Fixed,
    pub health: Fixed,
    pub state: PlayerState,
    pub carrier: Option<Carrier>,
}

impl Player {
    #[must_use]
    pub fn new(id: PlayerId, position: FixedVec2) -> Self {
        Player {
            id,
            position,
            velocity: FixedVec2::ZERO,
            rotation: Fixed::ZERO,
            radius: Fixed::from_f64(0.5),
            health: Fixed::from_int(100),
            state: PlayerState::Walking,
            carrier: None,
        }
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.carrier.is_some()
    }

    pub fn dismount_to(&mut self, position: FixedVec2, velocity: FixedVec2) {
        self.carrier = None;
        self.position = position;
        self.velocity = velocity;
        self.state = PlayerState::Falling;
    }
}
