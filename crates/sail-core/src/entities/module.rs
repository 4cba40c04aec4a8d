// SPDX-License-Identifier: Apache-2.0
//! Ship modules: helm, seat, cannon, mast, ladder, plank, deck, custom
//! (§3, §4.7). Modules are owned exclusively by their ship.

use crate::ident::{ModuleId, PlayerId, ShipId};
use crate::math::{Fixed, FixedVec2};

/// Frozen wire `typeId` mapping (§6): 0 helm, 1 seat, 2 cannon, 3 mast,
/// 4 steering-wheel, 5 ladder, 6 plank, 7 deck, 255 custom.
///
/// `Helm` and `SteeringWheel` are distinct wire kinds but share the same
/// in-sim behavior (mount + movement authority over the ship, §4.7) and
/// payload shape (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModuleKind {
    Helm,
    Seat,
    Cannon,
    Mast,
    SteeringWheel,
    Ladder,
    Plank,
    Deck,
    Custom,
}

impl ModuleKind {
    /// Frozen protocol `typeId` for this kind (§6).
    #[must_use]
    pub const fn type_id(self) -> u8 {
        match self {
            ModuleKind::Helm => 0,
            ModuleKind::Seat => 1,
            ModuleKind::Cannon => 2,
            ModuleKind::Mast => 3,
            ModuleKind::SteeringWheel => 4,
            ModuleKind::Ladder => 5,
            ModuleKind::Plank => 6,
            ModuleKind::Deck => 7,
            ModuleKind::Custom => 255,
        }
    }

    /// Whether this kind mounts a player on interaction (§4.7). Plank and
    /// deck are explicitly not interactive; ladder acknowledges without
    /// mounting.
    #[must_use]
    pub const fn is_mountable(self) -> bool {
        matches!(
            self,
            ModuleKind::Helm | ModuleKind::SteeringWheel | ModuleKind::Cannon | ModuleKind::Seat
        )
    }
}

/// Kind-specific module state (§3).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModulePayload {
    /// Helm or steering wheel: wheel rotation and the occupying player.
    Wheel {
        wheel_rotation: Fixed,
        occupied_by: PlayerId,
    },
    /// Cannon: aim direction (ship-local radians), ammo, reload state.
    Cannon {
        aim_direction: Fixed,
        ammo: u32,
        time_since_fire: Fixed,
        reload_duration: Fixed,
        occupied_by: PlayerId,
    },
    /// Mast: pole angle, sail openness (0..1), wind efficiency.
    Mast {
        pole_angle: Fixed,
        sail_openness: Fixed,
        wind_efficiency: Fixed,
    },
    /// Seat: passenger occupant.
    Seat { occupied_by: PlayerId },
    /// Plank: its own health pool, independent of hull health.
    Plank { health: Fixed, max_health: Fixed },
    /// Deck, ladder, custom: no kind-specific state.
    None,
}

impl ModulePayload {
    #[must_use]
    pub fn default_for(kind: ModuleKind) -> Self {
        match kind {
            ModuleKind::Helm | ModuleKind::SteeringWheel => ModulePayload::Wheel {
                wheel_rotation: Fixed::ZERO,
                occupied_by: PlayerId::NONE,
            },
            ModuleKind::Cannon => ModulePayload::Cannon {
                aim_direction: Fixed::ZERO,
                ammo: 0,
                // Starts fully reloaded, not mid-cooldown.
                time_since_fire: Fixed::from_int(3),
                reload_duration: Fixed::from_int(3),
                occupied_by: PlayerId::NONE,
            },
            ModuleKind::Mast => ModulePayload::Mast {
                pole_angle: Fixed::ZERO,
                sail_openness: Fixed::ZERO,
                wind_efficiency: Fixed::ONE,
            },
            ModuleKind::Seat => ModulePayload::Seat {
                occupied_by: PlayerId::NONE,
            },
            ModuleKind::Plank => ModulePayload::Plank {
                health: Fixed::from_int(100),
                max_health: Fixed::from_int(100),
            },
            ModuleKind::Deck | ModuleKind::Ladder | ModuleKind::Custom => ModulePayload::None,
        }
    }

    /// The player occupying this module, if any.
    #[must_use]
    pub fn occupant(&self) -> PlayerId {
        match self {
            ModulePayload::Wheel { occupied_by, .. }
            | ModulePayload::Cannon { occupied_by, .. }
            | ModulePayload::Seat { occupied_by, .. } => *occupied_by,
            _ => PlayerId::NONE,
        }
    }

    pub fn set_occupant(&mut self, player: PlayerId) {
        match self {
            ModulePayload::Wheel { occupied_by, .. }
            | ModulePayload::Cannon { occupied_by, .. }
            | ModulePayload::Seat { occupied_by, .. } => *occupied_by = player,
            _ => {}
        }
    }
}

/// A ship module (§3). `id` is globally unique (I2); `(ship, id)` is
/// also unique and dense.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Module {
    pub id: ModuleId,
    pub ship: ShipId,
    pub kind: ModuleKind,
    pub local_pos: FixedVec2,
    pub local_rotation: Fixed,
    pub health: Fixed,
    pub active: bool,
    pub damaged: bool,
    pub destroyed: bool,
    pub payload: ModulePayload,
}

impl Module {
    #[must_use]
    pub fn new(id: ModuleId, ship: ShipId, kind: ModuleKind, local_pos: FixedVec2) -> Self {
        Module {
            id,
            ship,
            kind,
            local_pos,
            local_rotation: Fixed::ZERO,
            health: Fixed::from_int(100),
            active: true,
            damaged: false,
            destroyed: false,
            payload: ModulePayload::default_for(kind),
        }
    }

    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.active && !self.destroyed && self.health > Fixed::ZERO
    }
}
