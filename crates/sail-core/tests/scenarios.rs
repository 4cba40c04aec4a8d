// SPDX-License-Identifier: Apache-2.0
//! Scenarios S2-S6, seeded with PRNG seed 42, tick rate 30 Hz.

use sail_core::entities::ModuleKind;
use sail_core::entities::ModulePayload;
use sail_core::interaction::{fire_cannon, mount, set_cannon_aim, InteractionError};
use sail_core::math::{Fixed, FixedVec2};
use sail_core::sim::{step, ShipControl, StepConfig, StepInputs};
use sail_core::world::{World, WorldCapacity};

const SEED: u64 = 42;

fn step_config() -> StepConfig {
    StepConfig {
        dt: Fixed::from_f64(1.0 / 30.0),
        world_half_extent: Fixed::from_int(2000),
        player_walk_speed: Fixed::from_int(3),
        player_swim_speed: Fixed::from_int(2),
    }
}

// S2: a stationary brigantine with no input stays put for 90 ticks.
#[test]
fn s2_stationary_ship_holds_position() {
    let mut world = World::new(WorldCapacity::default(), SEED);
    let ship = world
        .create_ship(FixedVec2::ZERO, Fixed::ZERO, World::brigantine_hull())
        .unwrap();
    let config = step_config();
    for _ in 0..90 {
        step(&mut world, &StepInputs::default(), &config);
    }
    let s = world.ship(ship).unwrap();
    assert_eq!(s.position, FixedVec2::ZERO);
    assert_eq!(s.velocity, FixedVec2::ZERO);
    assert_eq!(s.rotation, Fixed::ZERO);
}

// S3: a ship coasting under water drag alone decays at waterDrag per
// tick; after 30 ticks velocity_x ~= 20 * 0.98^30.
#[test]
fn s3_coasting_ship_decays_by_water_drag_per_tick() {
    let mut world = World::new(WorldCapacity::default(), SEED);
    let ship = world
        .create_ship(FixedVec2::ZERO, Fixed::ZERO, World::brigantine_hull())
        .unwrap();
    world.ship_mut(ship).unwrap().velocity = FixedVec2::from_f64(20.0, 0.0);
    assert_eq!(world.ship(ship).unwrap().water_drag, Fixed::from_f64(0.98));

    let config = step_config();
    step(&mut world, &StepInputs::default(), &config);
    let after_one = world.ship(ship).unwrap().velocity.x.to_f64();
    assert!((19.59..=19.61).contains(&after_one));

    for _ in 0..29 {
        step(&mut world, &StepInputs::default(), &config);
    }
    let after_thirty = world.ship(ship).unwrap().velocity.x.to_f64();
    let expected = 20.0 * 0.98_f64.powi(30);
    assert!((after_thirty - expected).abs() < 0.5);
}

// S4: two ships starting at the same position with zero velocity are
// pushed apart along the hull's narrowest cross-section after one
// collision-resolving step, and a second step does not push them any
// further once the hulls no longer overlap.
#[test]
fn s4_coincident_ships_separate_on_first_resolving_step() {
    let mut world = World::new(WorldCapacity::default(), SEED);
    let a = world
        .create_ship(FixedVec2::ZERO, Fixed::ZERO, World::brigantine_hull())
        .unwrap();
    let b = world
        .create_ship(FixedVec2::ZERO, Fixed::ZERO, World::brigantine_hull())
        .unwrap();
    let bounding_radius = world.ship(a).unwrap().bounding_radius();

    let config = step_config();
    step(&mut world, &StepInputs::default(), &config);

    let pos_a = world.ship(a).unwrap().position;
    let pos_b = world.ship(b).unwrap().position;
    let separation = (pos_a - pos_b).length();
    assert!(separation.to_f64() > 0.1);
    // Resolution pushes apart by the hull's minimum-width axis, not its
    // full extent, so the separation stays well under two ships' combined
    // bounding radius.
    assert!(separation <= bounding_radius * Fixed::from_int(2));

    step(&mut world, &StepInputs::default(), &config);
    let pos_a_2 = world.ship(a).unwrap().position;
    let pos_b_2 = world.ship(b).unwrap().position;
    let separation_2 = (pos_a_2 - pos_b_2).length();
    assert!((separation_2.to_f64() - separation.to_f64()).abs() < 0.5);
}

// S5: an interact attempt on a cannon within MAX_INTERACT_DISTANCE
// succeeds and occupies it; beyond that distance it fails with TooFar
// (wire reason OutOfRange).
#[test]
fn s5_interact_range_gates_cannon_occupancy() {
    const MAX_INTERACT_DISTANCE: f64 = 50.0;

    let mut world = World::new(WorldCapacity::default(), SEED);
    let ship = world.create_ship(FixedVec2::ZERO, Fixed::ZERO, vec![]).unwrap();
    let cannon = world
        .create_module(ship, ModuleKind::Cannon, FixedVec2::ZERO)
        .unwrap();

    let near_player = world
        .create_player(FixedVec2::from_f64(40.0, 0.0), None)
        .unwrap();
    let result = mount(
        &mut world,
        near_player,
        cannon,
        Fixed::from_f64(MAX_INTERACT_DISTANCE),
    );
    assert!(result.is_ok());
    assert_eq!(world.module(cannon).unwrap().payload.occupant(), near_player);

    let far_ship = world.create_ship(FixedVec2::from_f64(1000.0, 0.0), Fixed::ZERO, vec![]).unwrap();
    let other_cannon = world
        .create_module(far_ship, ModuleKind::Cannon, FixedVec2::ZERO)
        .unwrap();
    let far_player = world
        .create_player(FixedVec2::from_f64(1060.0, 0.0), None)
        .unwrap();
    let result = mount(
        &mut world,
        far_player,
        other_cannon,
        Fixed::from_f64(MAX_INTERACT_DISTANCE),
    );
    assert_eq!(result, Err(InteractionError::TooFar));
}

// S6: a mounted gunner aims a cannon ship-relative -pi/2 on a ship
// rotated to pi/2; the fired projectile's initial direction is world
// east (ship.rotation + aim_direction == 0).
#[test]
fn s6_cannon_fire_direction_combines_ship_rotation_and_aim() {
    let mut world = World::new(WorldCapacity::default(), SEED);
    let ship = world
        .create_ship(FixedVec2::ZERO, Fixed::from_f64(std::f64::consts::FRAC_PI_2), vec![])
        .unwrap();
    let cannon = world
        .create_module(ship, ModuleKind::Cannon, FixedVec2::ZERO)
        .unwrap();
    let gunner = world.create_player(FixedVec2::ZERO, None).unwrap();
    mount(&mut world, gunner, cannon, Fixed::from_int(5)).unwrap();

    set_cannon_aim(
        &mut world,
        gunner,
        cannon,
        Fixed::from_f64(-std::f64::consts::FRAC_PI_2),
    )
    .unwrap();
    if let ModulePayload::Cannon { ammo, .. } = &mut world.module_mut(cannon).unwrap().payload {
        *ammo = 1;
    }

    let projectile_id = fire_cannon(&mut world, gunner, cannon).unwrap();
    let projectile = world.projectile(projectile_id).unwrap();

    // World-east: positive x, ~zero y.
    assert!(projectile.velocity.x.to_f64() > 0.0);
    assert!(projectile.velocity.y.to_f64().abs() < 0.5);
}

// Sanity check that the throttle/turn control path used elsewhere in
// the scenario suite actually produces forward motion under seed 42
// (guards the fixture setup the other scenarios build on).
#[test]
fn throttle_under_fixed_seed_moves_ship_forward() {
    let mut world = World::new(WorldCapacity::default(), SEED);
    let ship = world
        .create_ship(FixedVec2::ZERO, Fixed::ZERO, World::brigantine_hull())
        .unwrap();
    let inputs = StepInputs {
        ship_controls: vec![ShipControl {
            ship,
            throttle: Fixed::ONE,
            turn: Fixed::ZERO,
        }],
        player_controls: vec![],
    };
    let config = step_config();
    step(&mut world, &inputs, &config);
    assert!(world.ship(ship).unwrap().position.x > Fixed::ZERO);
}
