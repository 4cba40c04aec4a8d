// SPDX-License-Identifier: Apache-2.0
//! Ships: rigid bodies composed of modules (§3).

use crate::ident::{ModuleId, ShipId};
use crate::math::{Fixed, FixedVec2};

/// A ship (§3). Hull health is the sole life variable for the ship
/// (§9 open question (b): plank destruction does not by itself destroy
/// the ship in this core).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ship {
    pub id: ShipId,
    pub position: FixedVec2,
    pub rotation: Fixed,
    pub velocity: FixedVec2,
    pub angular_velocity: Fixed,

    pub mass: Fixed,
    pub moment_of_inertia: Fixed,
    pub max_speed: Fixed,
    pub turn_rate: Fixed,
    /// Linear drag coefficient, strictly in `(0, 1)`.
    pub water_drag: Fixed,
    /// Angular drag coefficient, strictly in `(0, 1)`.
    pub angular_drag: Fixed,

    pub health: Fixed,
    pub max_health: Fixed,

    /// Ship-local hull polygon, counter-clockwise, arbitrary vertex count.
    pub hull: Vec<FixedVec2>,
    /// Modules owned by this ship, in creation order.
    pub modules: Vec<ModuleId>,
}

impl Ship {
    #[must_use]
    pub fn new(id: ShipId, position: FixedVec2, rotation: Fixed, hull: Vec<FixedVec2>) -> Self {
        Ship {
            id,
            position,
            rotation,
            velocity: FixedVec2::ZERO,
            angular_velocity: Fixed::ZERO,
            mass: Fixed::from_int(1000),
            moment_of_inertia: Fixed::from_int(50_000),
            max_speed: Fixed::from_int(25),
            turn_rate: Fixed::from_f64(1.2),
            water_drag: Fixed::from_f64(0.98),
            angular_drag: Fixed::from_f64(0.95),
            health: Fixed::from_int(1000),
            max_health: Fixed::from_int(1000),
            hull,
            modules: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.health <= Fixed::ZERO
    }

    /// Approximate bounding radius used for ship↔ship broad phase (§4.3)
    /// and AOI radius checks: the farthest hull vertex from the origin.
    #[must_use]
    pub fn bounding_radius(&self) -> Fixed {
        self.hull
            .iter()
            .map(|v| v.length())
            .fold(Fixed::ZERO, Fixed::max)
    }

    /// Converts a ship-local point to world space using the ship's
    /// current position and rotation.
    #[must_use]
    pub fn local_to_world(&self, local: FixedVec2) -> FixedVec2 {
        self.position + local.rotate(self.rotation)
    }

    /// Converts a world-space point to the ship's local frame (inverse of
    /// [`Ship::local_to_world`]).
    #[must_use]
    pub fn world_to_local(&self, world_pos: FixedVec2) -> FixedVec2 {
        (world_pos - self.position).rotate(-self.rotation)
    }
}
