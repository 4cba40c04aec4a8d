// SPDX-License-Identifier: Apache-2.0
//! The fixed-timestep simulation step (§4.3).
//!
//! Order is fixed and must not change: drain inputs, integrate ships,
//! integrate/mount players, integrate projectiles, resolve collisions,
//! advance the tick counter. Every sub-phase iterates entities in
//! ascending-id order (I1), enforced by [`World::sort_by_id`] at the
//! top of the step.

use crate::entities::{ModulePayload, PlayerState};
use crate::ident::{PlayerId, ShipId};
use crate::math::{Fixed, FixedVec2};
use crate::sim::collision;
use crate::world::World;

/// A single ship's helm input for this tick: throttle in `[-1, 1]`
/// (reverse..full ahead) and turn in `[-1, 1]` (hard to port..hard to
/// starboard). Out-of-range values are clamped, never rejected (§4.6
/// clamps malformed input rather than failing the tick).
#[derive(Debug, Clone, Copy)]
pub struct ShipControl {
    pub ship: ShipId,
    pub throttle: Fixed,
    pub turn: Fixed,
}

/// An unmounted player's walking/swimming intent this tick.
#[derive(Debug, Clone, Copy)]
pub struct PlayerControl {
    pub player: PlayerId,
    pub move_dir: FixedVec2,
}

/// All player and ship inputs accepted for one tick, already validated
/// and clamped by the session layer (§4.6).
#[derive(Debug, Clone, Default)]
pub struct StepInputs {
    pub ship_controls: Vec<ShipControl>,
    pub player_controls: Vec<PlayerControl>,
}

/// Parameters that do not belong to any single entity.
#[derive(Debug, Clone, Copy)]
pub struct StepConfig {
    pub dt: Fixed,
    pub world_half_extent: Fixed,
    pub player_walk_speed: Fixed,
    pub player_swim_speed: Fixed,
}

/// Advances `world` by exactly one tick, in the order §4.3 fixes.
pub fn step(world: &mut World, inputs: &StepInputs, config: &StepConfig) {
    world.sort_by_id();

    apply_ship_controls(world, &inputs.ship_controls);
    integrate_ships(world, config.dt);
    update_modules(world, config.dt);

    integrate_players(world, inputs, config);

    integrate_projectiles(world, config.dt);
    world.reap_expired_projectiles(config.world_half_extent);

    collision::resolve_ship_ship(world);
    collision::resolve_projectile_ship(world);
    collision::resolve_player_ship(world);

    world.tick += 1;
}

fn apply_ship_controls(world: &mut World, controls: &[ShipControl]) {
    for control in controls {
        let Ok(ship) = world.ship_mut(control.ship) else {
            continue;
        };
        let throttle = control.throttle.clamp_abs(Fixed::ONE);
        let turn = control.turn.clamp_abs(Fixed::ONE);

        let forward = FixedVec2::new(Fixed::ONE, Fixed::ZERO).rotate(ship.rotation);
        let accel = forward * (throttle * ship.max_speed);
        ship.velocity = (ship.velocity + accel).clamp_length(ship.max_speed);
        ship.angular_velocity = (turn * ship.turn_rate).clamp_abs(ship.turn_rate);
    }
}

/// Integrates ship position/rotation, applying drag before integration
/// and re-clamping to the speed/turn limits after (I4: clamps are
/// enforced, not merely requested, and always follow the position/
/// rotation update within the same pass).
fn integrate_ships(world: &mut World, dt: Fixed) {
    for ship in world.ships_mut() {
        ship.velocity = ship.velocity * ship.water_drag;
        ship.angular_velocity = ship.angular_velocity * ship.angular_drag;

        ship.position = ship.position + ship.velocity * dt;
        ship.rotation = ship.rotation + ship.angular_velocity * dt;

        ship.velocity = ship.velocity.clamp_length(ship.max_speed);
        ship.angular_velocity = ship.angular_velocity.clamp_abs(ship.turn_rate);
    }
}

/// Decrements per-module timers (currently: cannon reload cooldown).
fn update_modules(world: &mut World, dt: Fixed) {
    for module in world.modules_mut() {
        if let ModulePayload::Cannon {
            time_since_fire, ..
        } = &mut module.payload
        {
            *time_since_fire = *time_since_fire + dt;
        }
    }
}

fn integrate_players(world: &mut World, inputs: &StepInputs, config: &StepConfig) {
    // Mounted players are carried: their world position tracks the
    // ship/module they're attached to rather than being integrated
    // independently.
    let player_ids: Vec<_> = world.players().iter().map(|p| p.id).collect();
    for player_id in player_ids {
        let carrier = world.player(player_id).and_then(|p| p.carrier);
        if let Some(carrier) = carrier {
            let Some(ship) = world.ship(carrier.ship) else {
                continue;
            };
            let world_pos = ship.local_to_world(carrier.offset);
            let ship_velocity = ship.velocity;
            if let Ok(player) = world.player_mut(player_id) {
                player.position = world_pos;
                player.velocity = ship_velocity;
            }
            continue;
        }

        let control = inputs
            .player_controls
            .iter()
            .find(|c| c.player == player_id);
        let Ok(player) = world.player_mut(player_id) else {
            continue;
        };
        if let Some(control) = control {
            let speed = match player.state {
                PlayerState::Swimming => config.player_swim_speed,
                _ => config.player_walk_speed,
            };
            let dir = control.move_dir.clamp_length(Fixed::ONE);
            player.velocity = dir * speed;
        }
        if player.state == PlayerState::Falling {
            // No control authority while falling; gravity is implicit
            // in the velocity carried over from the dismount impulse.
        }
        player.position = player.position + player.velocity * config.dt;
        if player.state == PlayerState::Falling {
            player.state = PlayerState::Swimming;
        }
    }
}

fn integrate_projectiles(world: &mut World, dt: Fixed) {
    for projectile in world.projectiles_mut() {
        projectile.position = projectile.position + projectile.velocity * dt;
        projectile.lifetime_ticks_remaining =
            projectile.lifetime_ticks_remaining.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::WorldCapacity;

    fn config() -> StepConfig {
        StepConfig {
            dt: Fixed::from_f64(1.0 / 20.0),
            world_half_extent: Fixed::from_int(1000),
            player_walk_speed: Fixed::from_int(3),
            player_swim_speed: Fixed::from_int(2),
        }
    }

    #[test]
    fn ship_throttle_accelerates_forward() {
        let mut world = World::new(WorldCapacity::default(), 1);
        let ship = world.create_ship(FixedVec2::ZERO, Fixed::ZERO, vec![]).unwrap();
        let inputs = StepInputs {
            ship_controls: vec![ShipControl {
                ship,
                throttle: Fixed::ONE,
                turn: Fixed::ZERO,
            }],
            player_controls: vec![],
        };
        step(&mut world, &inputs, &config());
        let s = world.ship(ship).unwrap();
        assert!(s.position.x > Fixed::ZERO);
    }

    #[test]
    fn ship_speed_never_exceeds_max(){
        let mut world = World::new(WorldCapacity::default(), 1);
        let ship = world.create_ship(FixedVec2::ZERO, Fixed::ZERO, vec![]).unwrap();
        let inputs = StepInputs {
            ship_controls: vec![ShipControl {
                ship,
                throttle: Fixed::from_int(5),
                turn: Fixed::ZERO,
            }],
            player_controls: vec![],
        };
        for _ in 0..50 {
            step(&mut world, &inputs, &config());
        }
        let s = world.ship(ship).unwrap();
        assert!(s.velocity.length() <= s.max_speed + Fixed::from_f64(0.01));
    }

    #[test]
    fn tick_counter_advances_by_one_per_step() {
        let mut world = World::new(WorldCapacity::default(), 1);
        let inputs = StepInputs::default();
        step(&mut world, &inputs, &config());
        assert_eq!(world.tick, 1);
    }

    #[test]
    fn mounted_player_tracks_ship_position() {
        let mut world = World::new(WorldCapacity::default(), 1);
        let ship = world.create_ship(FixedVec2::ZERO, Fixed::ZERO, vec![]).unwrap();
        let module = world
            .create_module(ship, crate::entities::ModuleKind::Helm, FixedVec2::ZERO)
            .unwrap();
        let carrier = crate::entities::Carrier {
            ship,
            module,
            offset: FixedVec2::ZERO,
        };
        let player = world.create_player(FixedVec2::ZERO, Some(carrier)).unwrap();
        let inputs = StepInputs {
            ship_controls: vec![ShipControl {
                ship,
                throttle: Fixed::ONE,
                turn: Fixed::ZERO,
            }],
            player_controls: vec![],
        };
        step(&mut world, &inputs, &config());
        let s = world.ship(ship).unwrap();
        let p = world.player(player).unwrap();
        assert_eq!(p.position, s.position);
    }

    #[test]
    fn projectile_lifetime_counts_down() {
        let mut world = World::new(WorldCapacity::default(), 1);
        let owner = world.create_ship(FixedVec2::ZERO, Fixed::ZERO, vec![]).unwrap();
        let proj = world
            .create_projectile(FixedVec2::ZERO, FixedVec2::ZERO, owner, Fixed::from_int(10), 2)
            .unwrap();
        step(&mut world, &StepInputs::default(), &config());
        assert!(world.projectile(proj).is_some());
        step(&mut world, &StepInputs::default(), &config());
        assert!(world.projectile(proj).is_none());
    }
}
