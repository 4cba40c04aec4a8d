// SPDX-License-Identifier: Apache-2.0
//! Module interaction handler (§4.7): mounting, dismounting, cannon aim
//! and fire. Every entry point validates distance and occupancy before
//! mutating state; failures are typed and never panic.

use thiserror::Error;

use crate::entities::{Carrier, ModuleKind, ModulePayload, PlayerState};
use crate::error::SimError;
use crate::ident::{ModuleId, PlayerId, ProjectileId};
use crate::math::{Fixed, FixedVec2};
use crate::world::World;

/// Why a module interaction was refused (§4.7, §7). None of these are
/// fatal; the caller reports the failure back to the requesting
/// session and the tick continues.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InteractionError {
    #[error("player not found")]
    PlayerNotFound,
    #[error("module not found")]
    ModuleNotFound,
    #[error("ship not found")]
    ShipNotFound,
    #[error("module is destroyed")]
    ModuleDestroyed,
    #[error("module is not interactable")]
    NotInteractable,
    #[error("module is already occupied")]
    AlreadyOccupied,
    #[error("player is too far from the module")]
    TooFar,
    #[error("player does not occupy this module")]
    NotOccupant,
    #[error("cannon has no ammo")]
    NoAmmo,
    #[error("cannon is still reloading")]
    Reloading,
}

impl From<SimError> for InteractionError {
    fn from(err: SimError) -> Self {
        match err {
            SimError::NotFound {
                kind: crate::error::EntityKind::Player,
            } => InteractionError::PlayerNotFound,
            _ => InteractionError::ModuleNotFound,
        }
    }
}

fn check_distance(
    world: &World,
    player: PlayerId,
    module: ModuleId,
    max_distance: Fixed,
) -> Result<(), InteractionError> {
    let player = world.player(player).ok_or(InteractionError::PlayerNotFound)?;
    let module = world.module(module).ok_or(InteractionError::ModuleNotFound)?;
    let ship = world
        .ship(module.ship)
        .ok_or(InteractionError::ShipNotFound)?;
    let module_world_pos = ship.local_to_world(module.local_pos);
    let distance = (player.position - module_world_pos).length();
    if distance > max_distance {
        return Err(InteractionError::TooFar);
    }
    Ok(())
}

/// Mounts `player` onto `module` if it is mountable, unoccupied, and in
/// range (§4.7). Ladder acknowledges without mounting (it is not
/// `is_mountable`); plank and deck are never interactable this way.
pub fn mount(
    world: &mut World,
    player_id: PlayerId,
    module_id: ModuleId,
    max_distance: Fixed,
) -> Result<(), InteractionError> {
    check_distance(world, player_id, module_id, max_distance)?;

    let module = world
        .module(module_id)
        .ok_or(InteractionError::ModuleNotFound)?;
    if module.destroyed {
        return Err(InteractionError::ModuleDestroyed);
    }
    if !module.kind.is_mountable() || !module.is_usable() {
        return Err(InteractionError::NotInteractable);
    }
    if !module.payload.occupant().is_none() {
        return Err(InteractionError::AlreadyOccupied);
    }
    let ship = module.ship;

    let module_mut = world
        .module_mut(module_id)
        .map_err(InteractionError::from)?;
    module_mut.payload.set_occupant(player_id);

    let player = world
        .player_mut(player_id)
        .map_err(InteractionError::from)?;
    player.carrier = Some(Carrier {
        ship,
        module: module_id,
        offset: FixedVec2::ZERO,
    });
    player.state = PlayerState::Mounted;
    Ok(())
}

/// Dismounts `player` from whatever module they currently occupy.
pub fn dismount(world: &mut World, player_id: PlayerId) -> Result<(), InteractionError> {
    let carrier = world
        .player(player_id)
        .ok_or(InteractionError::PlayerNotFound)?
        .carrier;
    let Some(carrier) = carrier else {
        return Ok(());
    };
    if let Ok(module) = world.module_mut(carrier.module) {
        module.payload.set_occupant(PlayerId::NONE);
    }
    let position = world
        .ship(carrier.ship)
        .map(|s| s.local_to_world(carrier.offset))
        .unwrap_or(FixedVec2::ZERO);
    let player = world
        .player_mut(player_id)
        .map_err(InteractionError::from)?;
    player.dismount_to(position, FixedVec2::ZERO);
    Ok(())
}

/// Sets a cannon's aim direction (ship-local radians). The requesting
/// player must be the cannon's current occupant (§4.7).
pub fn set_cannon_aim(
    world: &mut World,
    player_id: PlayerId,
    module_id: ModuleId,
    aim_direction: Fixed,
) -> Result<(), InteractionError> {
    let module = world
        .module_mut(module_id)
        .map_err(InteractionError::from)?;
    if module.destroyed {
        return Err(InteractionError::ModuleDestroyed);
    }
    let ModulePayload::Cannon {
        aim_direction: current,
        occupied_by,
        ..
    } = &mut module.payload
    else {
        return Err(InteractionError::NotInteractable);
    };
    if *occupied_by != player_id {
        return Err(InteractionError::NotOccupant);
    }
    *current = aim_direction;
    Ok(())
}

/// Muzzle offset applied on top of the cannon's local position, a
/// small forward bias so the projectile does not spawn inside the
/// firing ship's own hull (§9 open question (c)).
const MUZZLE_FORWARD_BIAS: f64 = 1.5;

const PROJECTILE_SPEED: f64 = 40.0;
const PROJECTILE_LIFETIME_TICKS: u32 = 120;

/// Fires a cannon the requesting player occupies, spawning a
/// projectile along the cannon's aim direction (ship-local, rotated
/// into world space) if ammo remains and the reload timer has elapsed.
pub fn fire_cannon(
    world: &mut World,
    player_id: PlayerId,
    module_id: ModuleId,
) -> Result<ProjectileId, InteractionError> {
    let module = world.module(module_id).ok_or(InteractionError::ModuleNotFound)?;
    if module.destroyed {
        return Err(InteractionError::ModuleDestroyed);
    }
    let ModulePayload::Cannon {
        aim_direction,
        ammo,
        time_since_fire,
        reload_duration,
        occupied_by,
    } = &module.payload
    else {
        return Err(InteractionError::NotInteractable);
    };
    let (aim_direction, ammo, time_since_fire, reload_duration, occupied_by) =
        (*aim_direction, *ammo, *time_since_fire, *reload_duration, *occupied_by);
    if occupied_by != player_id {
        return Err(InteractionError::NotOccupant);
    }
    if ammo == 0 {
        return Err(InteractionError::NoAmmo);
    }
    if time_since_fire < reload_duration {
        return Err(InteractionError::Reloading);
    }

    let ship = world
        .ship(module.ship)
        .ok_or(InteractionError::ShipNotFound)?;
    let world_aim = ship.rotation + aim_direction;
    let muzzle_local = module.local_pos + FixedVec2::new(Fixed::from_f64(MUZZLE_FORWARD_BIAS), Fixed::ZERO).rotate(aim_direction);
    let spawn_pos = ship.local_to_world(muzzle_local);
    let direction = FixedVec2::new(Fixed::ONE, Fixed::ZERO).rotate(world_aim);
    let velocity = ship.velocity + direction * Fixed::from_f64(PROJECTILE_SPEED);
    let owner = module.ship;

    let projectile = world
        .create_projectile(
            spawn_pos,
            velocity,
            owner,
            Fixed::from_int(25),
            PROJECTILE_LIFETIME_TICKS,
        )
        .map_err(|_| InteractionError::NotInteractable)?;

    let module = world.module_mut(module_id).map_err(InteractionError::from)?;
    if let ModulePayload::Cannon {
        ammo,
        time_since_fire,
        ..
    } = &mut module.payload
    {
        *ammo -= 1;
        *time_since_fire = Fixed::ZERO;
    }
    Ok(projectile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::WorldCapacity;

    fn setup() -> (World, crate::ident::ShipId, ModuleId, PlayerId) {
        let mut world = World::new(WorldCapacity::default(), 1);
        let ship = world.create_ship(FixedVec2::ZERO, Fixed::ZERO, vec![]).unwrap();
        let module = world
            .create_module(ship, ModuleKind::Helm, FixedVec2::ZERO)
            .unwrap();
        let player = world.create_player(FixedVec2::ZERO, None).unwrap();
        (world, ship, module, player)
    }

    #[test]
    fn mount_succeeds_within_range_and_unoccupied() {
        let (mut world, _, module, player) = setup();
        assert!(mount(&mut world, player, module, Fixed::from_int(5)).is_ok());
        assert!(world.player(player).unwrap().is_mounted());
    }

    #[test]
    fn mount_fails_when_too_far() {
        let (mut world, _, module, player) = setup();
        world.player_mut(player).unwrap().position = FixedVec2::from_f64(100.0, 0.0);
        assert_eq!(
            mount(&mut world, player, module, Fixed::from_int(5)),
            Err(InteractionError::TooFar)
        );
    }

    #[test]
    fn mount_fails_when_already_occupied() {
        let (mut world, _, module, player) = setup();
        let other = world.create_player(FixedVec2::ZERO, None).unwrap();
        mount(&mut world, player, module, Fixed::from_int(5)).unwrap();
        assert_eq!(
            mount(&mut world, other, module, Fixed::from_int(5)),
            Err(InteractionError::AlreadyOccupied)
        );
    }

    #[test]
    fn dismount_clears_carrier_and_frees_module() {
        let (mut world, _, module, player) = setup();
        mount(&mut world, player, module, Fixed::from_int(5)).unwrap();
        dismount(&mut world, player).unwrap();
        assert!(!world.player(player).unwrap().is_mounted());
        assert!(world.module(module).unwrap().payload.occupant().is_none());
    }

    #[test]
    fn fire_cannon_requires_occupancy_and_ammo() {
        let mut world = World::new(WorldCapacity::default(), 1);
        let ship = world.create_ship(FixedVec2::ZERO, Fixed::ZERO, vec![]).unwrap();
        let cannon = world
            .create_module(ship, ModuleKind::Cannon, FixedVec2::ZERO)
            .unwrap();
        let player = world.create_player(FixedVec2::ZERO, None).unwrap();
        mount(&mut world, player, cannon, Fixed::from_int(5)).unwrap();
        assert_eq!(
            fire_cannon(&mut world, player, cannon),
            Err(InteractionError::NoAmmo)
        );
        if let ModulePayload::Cannon { ammo, .. } = &mut world.module_mut(cannon).unwrap().payload {
            *ammo = 3;
        }
        assert!(fire_cannon(&mut world, player, cannon).is_ok());
        assert_eq!(
            fire_cannon(&mut world, player, cannon),
            Err(InteractionError::Reloading)
        );
    }
}
