// SPDX-License-Identifier: Apache-2.0
//! Quantized wire representations and the baseline/delta frame shapes
//! (§4.5). Field order here is the single canonical order both the
//! baseline and delta encoders walk — reordering fields is a protocol
//! break.

use crate::ident::{ModuleId, PlayerId, ProjectileId, ShipId};
use crate::math::Fixed;
use crate::snapshot::quantize::{
    quantize_health, quantize_rotation, quantize_vec2_position, quantize_vec2_velocity,
};
use crate::world::World;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuantizedShip {
    pub id: ShipId,
    pub position: (u16, u16),
    pub velocity: (i16, i16),
    pub rotation: u16,
    pub health: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuantizedModule {
    pub id: ModuleId,
    pub ship: ShipId,
    pub health: u8,
    pub active: bool,
    pub occupied_by: PlayerId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuantizedPlayer {
    pub id: PlayerId,
    pub position: (u16, u16),
    pub velocity: (i16, i16),
    pub rotation: u16,
    pub health: u8,
    pub state: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuantizedProjectile {
    pub id: ProjectileId,
    pub position: (u16, u16),
}

/// A complete, self-contained snapshot of every entity currently
/// visible to a session: no delta is needed to interpret it (§4.5).
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BaselineFrame {
    pub tick: u64,
    pub ships: Vec<QuantizedShip>,
    pub modules: Vec<QuantizedModule>,
    pub players: Vec<QuantizedPlayer>,
    pub projectiles: Vec<QuantizedProjectile>,
}

/// Only the entities that changed since the session's last acknowledged
/// frame, plus explicit removal lists (§4.5). Interpreting a delta
/// requires the receiver to already hold the referenced baseline.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeltaFrame {
    pub tick: u64,
    pub baseline_tick: u64,
    pub changed_ships: Vec<QuantizedShip>,
    pub changed_modules: Vec<QuantizedModule>,
    pub changed_players: Vec<QuantizedPlayer>,
    pub changed_projectiles: Vec<QuantizedProjectile>,
    pub removed_ships: Vec<ShipId>,
    pub removed_players: Vec<PlayerId>,
    pub removed_projectiles: Vec<ProjectileId>,
}

pub fn quantize_ship(ship: &crate::entities::Ship, origin_offset: Fixed) -> QuantizedShip {
    QuantizedShip {
        id: ship.id,
        position: quantize_vec2_position(ship.position, origin_offset),
        velocity: quantize_vec2_velocity(ship.velocity),
        rotation: quantize_rotation(ship.rotation),
        health: quantize_health(ship.health, ship.max_health),
    }
}

pub fn quantize_module(module: &crate::entities::Module) -> QuantizedModule {
    QuantizedModule {
        id: module.id,
        ship: module.ship,
        health: quantize_health(module.health, crate::math::Fixed::from_int(100)),
        active: module.active && !module.destroyed,
        occupied_by: module.payload.occupant(),
    }
}

pub fn quantize_player(player: &crate::entities::Player, origin_offset: Fixed) -> QuantizedPlayer {
    QuantizedPlayer {
        id: player.id,
        position: quantize_vec2_position(player.position, origin_offset),
        velocity: quantize_vec2_velocity(player.velocity),
        rotation: quantize_rotation(player.rotation),
        health: quantize_health(player.health, crate::math::Fixed::from_int(100)),
        state: player_state_wire(player.state),
    }
}

pub fn quantize_projectile(
    projectile: &crate::entities::Projectile,
    origin_offset: Fixed,
) -> QuantizedProjectile {
    QuantizedProjectile {
        id: projectile.id,
        position: quantize_vec2_position(projectile.position, origin_offset),
    }
}

/// Frozen wire encoding of [`PlayerState`](crate::entities::PlayerState).
fn player_state_wire(state: crate::entities::PlayerState) -> u8 {
    use crate::entities::PlayerState;
    match state {
        PlayerState::Walking => 0,
        PlayerState::Swimming => 1,
        PlayerState::Falling => 2,
        PlayerState::Mounted => 3,
    }
}

/// Builds a full baseline frame over the given ship/player ids (the
/// set a session's AOI subscription currently resolves to), in
/// ascending-id order (I1). `origin_offset` is the world-origin shift
/// applied to every position field so the unsigned wire values stay
/// non-negative (§4.5).
#[must_use]
pub fn build_baseline(
    world: &World,
    ship_ids: &[ShipId],
    player_ids: &[PlayerId],
    origin_offset: Fixed,
) -> BaselineFrame {
    let mut ships: Vec<_> = ship_ids
        .iter()
        .filter_map(|id| world.ship(*id))
        .map(|s| quantize_ship(s, origin_offset))
        .collect();
    ships.sort_by_key(|s| s.id.0);

    let mut modules: Vec<_> = ship_ids
        .iter()
        .flat_map(|id| world.modules_of_ship(*id))
        .map(quantize_module)
        .collect();
    modules.sort_by_key(|m| m.id.0);

    let mut players: Vec<_> = player_ids
        .iter()
        .filter_map(|id| world.player(*id))
        .map(|p| quantize_player(p, origin_offset))
        .collect();
    players.sort_by_key(|p| p.id.0);

    BaselineFrame {
        tick: world.tick,
        ships,
        modules,
        players,
        projectiles: world
            .projectiles()
            .iter()
            .map(|p| quantize_projectile(p, origin_offset))
            .collect(),
    }
}
