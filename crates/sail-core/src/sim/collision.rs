// SPDX-License-Identifier: Apache-2.0
//! Collision detection and resolution (§4.3 step 4).
//!
//! Three independent passes, in the order the step defines them:
//! ship↔ship (SAT over convex hull polygons), projectile↔ship
//! (point-in-polygon), and player↔ship (deck/water transitions).

use crate::entities::{ModuleKind, ModulePayload, PlayerState, Ship};
use crate::ident::ShipId;
use crate::math::{Fixed, FixedVec2};
use crate::world::World;

/// World-space hull vertices for a ship, computed once per collision pass.
fn world_hull(ship: &Ship) -> Vec<FixedVec2> {
    ship.hull.iter().map(|v| ship.local_to_world(*v)).collect()
}

/// Minimum translation vector describing how far apart two overlapping
/// convex polygons must move to stop overlapping, and along which axis.
struct Overlap {
    axis: FixedVec2,
    depth: Fixed,
}

fn edge_axes(hull: &[FixedVec2]) -> Vec<FixedVec2> {
    let mut axes = Vec::with_capacity(hull.len());
    for i in 0..hull.len() {
        let a = hull[i];
        let b = hull[(i + 1) % hull.len()];
        let edge = b - a;
        let normal = edge.perp();
        let len = normal.length();
        if len > Fixed::ZERO {
            axes.push(FixedVec2::new(
                normal.x.checked_div(len),
                normal.y.checked_div(len),
            ));
        }
    }
    axes
}

fn project(hull: &[FixedVec2], axis: FixedVec2) -> (Fixed, Fixed) {
    let mut min = axis.dot(hull[0]);
    let mut max = min;
    for &v in &hull[1..] {
        let p = axis.dot(v);
        min = min.min(p);
        max = max.max(p);
    }
    (min, max)
}

/// Separating-axis test between two convex hulls. Returns `None` if a
/// separating axis exists (no overlap), else the minimum-depth overlap.
fn sat_overlap(a: &[FixedVec2], b: &[FixedVec2]) -> Option<Overlap> {
    if a.len() < 2 || b.len() < 2 {
        return None;
    }
    let mut best: Option<Overlap> = None;
    for axis in edge_axes(a).into_iter().chain(edge_axes(b)) {
        let (a_min, a_max) = project(a, axis);
        let (b_min, b_max) = project(b, axis);
        if a_max < b_min || b_max < a_min {
            return None;
        }
        let depth = (a_max.min(b_max)) - (a_min.max(b_min));
        if best.as_ref().map_or(true, |o| depth < o.depth) {
            best = Some(Overlap { axis, depth });
        }
    }
    best
}

/// Resolves ship↔ship overlaps by separating along the minimum-depth
/// axis and applying an elastic-ish impulse proportional to mass and
/// closing velocity, then clamping each ship back within its speed
/// limits (I4). Pairs are iterated in ascending-id order (I1).
///
/// A bounding-radius broad phase rejects pairs that can't possibly
/// overlap before the O(hull-vertex) SAT narrow phase runs on the rest.
pub fn resolve_ship_ship(world: &mut World) {
    let ids: Vec<ShipId> = world.ships().iter().map(|s| s.id).collect();
    for i in 0..ids.len() {
        for j in (i + 1)..ids.len() {
            let (a_id, b_id) = (ids[i], ids[j]);
            let Some((center_a, center_b, radius_a, radius_b)) = world
                .ship(a_id)
                .zip(world.ship(b_id))
                .map(|(a, b)| (a.position, b.position, a.bounding_radius(), b.bounding_radius()))
            else {
                continue;
            };
            let broad_radius = radius_a + radius_b;
            if (center_b - center_a).length_sq() > broad_radius * broad_radius {
                continue;
            }

            let Some((hull_a, hull_b)) = world
                .ship(a_id)
                .zip(world.ship(b_id))
                .map(|(a, b)| (world_hull(a), world_hull(b)))
            else {
                continue;
            };
            let Some(overlap) = sat_overlap(&hull_a, &hull_b) else {
                continue;
            };
            // Orient the axis from A to B.
            let to_b = center_b - center_a;
            let axis = if axis_points_away(overlap.axis, to_b) {
                overlap.axis
            } else {
                FixedVec2::new(-overlap.axis.x, -overlap.axis.y)
            };

            let Some((mass_a, mass_b, vel_a, vel_b, max_speed_a, max_speed_b)) = world
                .ship(a_id)
                .zip(world.ship(b_id))
                .map(|(a, b)| (a.mass, b.mass, a.velocity, b.velocity, a.max_speed, b.max_speed))
            else {
                continue;
            };
            let total_mass = mass_a + mass_b;
            if total_mass <= Fixed::ZERO {
                continue;
            }
            let push_a = axis * (overlap.depth * mass_b.checked_div(total_mass));
            let push_b = axis * (overlap.depth * mass_a.checked_div(total_mass));

            // Closing speed along the collision normal, redistributed by
            // relative mass (a cheap impulse, not full rigid-body response).
            let rel_vel = vel_b - vel_a;
            let closing = rel_vel.dot(axis);
            let restitution = Fixed::from_f64(0.3);
            let impulse_scalar = closing * restitution;
            let impulse = axis * impulse_scalar;

            if let Ok(a) = world.ship_mut(a_id) {
                a.position = a.position - push_a;
                a.velocity = (a.velocity + impulse * mass_b.checked_div(total_mass))
                    .clamp_length(max_speed_a);
            }
            if let Ok(b) = world.ship_mut(b_id) {
                b.position = b.position + push_b;
                b.velocity = (b.velocity - impulse * mass_a.checked_div(total_mass))
                    .clamp_length(max_speed_b);
            }
        }
    }
}

fn axis_points_away(axis: FixedVec2, to_other: FixedVec2) -> bool {
    axis.dot(to_other) >= Fixed::ZERO
}

/// Even-odd ray-casting point-in-polygon test against a world-space hull.
fn point_in_hull(point: FixedVec2, hull: &[FixedVec2]) -> bool {
    if hull.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = hull.len() - 1;
    for i in 0..hull.len() {
        let vi = hull[i];
        let vj = hull[j];
        let straddles = (vi.y > point.y) != (vj.y > point.y);
        if straddles {
            let slope = (vj.x - vi.x).checked_div(vj.y - vi.y);
            let x_at_y = vi.x + slope * (point.y - vi.y);
            if point.x < x_at_y {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Projectile↔ship point-in-polygon hits: applies damage and destroys
/// the projectile on first hit (I5's grace window excludes the owner
/// ship during the blast window after firing).
pub fn resolve_projectile_ship(world: &mut World) {
    let current_tick = world.tick;
    let projectile_ids: Vec<_> = world.projectiles().iter().map(|p| p.id).collect();
    let ship_snapshot: Vec<(ShipId, ShipId, Vec<FixedVec2>)> = world
        .ships()
        .iter()
        .map(|s| (s.id, s.id, world_hull(s)))
        .collect();

    let mut to_remove = Vec::new();
    let mut damage_events: Vec<(ShipId, Fixed, FixedVec2)> = Vec::new();

    for proj_id in projectile_ids {
        let Some(proj) = world.projectile(proj_id) else {
            continue;
        };
        let (owner, position, damage, grace) = (
            proj.owner,
            proj.position,
            proj.damage,
            proj.in_owner_grace_window(current_tick),
        );
        for (ship_id, _, hull) in &ship_snapshot {
            if grace && *ship_id == owner {
                continue;
            }
            if point_in_hull(position, hull) {
                damage_events.push((*ship_id, damage, position));
                to_remove.push(proj_id);
                break;
            }
        }
    }

    for (ship_id, damage, impact_point) in damage_events {
        if let Ok(ship) = world.ship_mut(ship_id) {
            ship.health = (ship.health - damage).max(Fixed::ZERO);
        }
        damage_nearest_plank(world, ship_id, impact_point, damage);
    }
    for proj_id in to_remove {
        let _ = world.destroy_projectile(proj_id);
    }
}

/// Finds the plank module closest to `impact_point` (in the ship's local
/// frame) and applies `damage` to it alongside the hull. A ship with no
/// plank modules takes hull damage only.
fn damage_nearest_plank(world: &mut World, ship_id: ShipId, impact_point: FixedVec2, damage: Fixed) {
    let Some(ship) = world.ship(ship_id) else {
        return;
    };
    let local_impact = ship.world_to_local(impact_point);
    let nearest = world
        .modules_of_ship(ship_id)
        .filter(|m| m.kind == ModuleKind::Plank)
        .min_by_key(|m| (m.local_pos - local_impact).length_sq())
        .map(|m| m.id);
    let Some(plank_id) = nearest else {
        return;
    };
    if let Ok(module) = world.module_mut(plank_id) {
        module.health = (module.health - damage).max(Fixed::ZERO);
        if let ModulePayload::Plank { health, .. } = &mut module.payload {
            *health = (*health - damage).max(Fixed::ZERO);
        }
        if module.health <= Fixed::ZERO {
            module.destroyed = true;
        }
    }
}

/// Player↔ship deck/water transitions: an unmounted player standing
/// inside a ship's hull footprint is carried passively by the ship
/// (Walking); outside every hull footprint they swim.
pub fn resolve_player_ship(world: &mut World) {
    let ship_snapshot: Vec<(ShipId, FixedVec2, Vec<FixedVec2>)> = world
        .ships()
        .iter()
        .map(|s| (s.id, s.velocity, world_hull(s)))
        .collect();

    let player_ids: Vec<_> = world.players().iter().map(|p| p.id).collect();
    for player_id in player_ids {
        let Ok(player) = world.player_mut(player_id) else {
            continue;
        };
        if player.is_mounted() {
            continue;
        }
        let mut on_deck_velocity = None;
        for (_, ship_vel, hull) in &ship_snapshot {
            if point_in_hull(player.position, hull) {
                on_deck_velocity = Some(*ship_vel);
                break;
            }
        }
        match on_deck_velocity {
            Some(ship_vel) => {
                player.state = PlayerState::Walking;
                player.velocity = ship_vel;
            }
            None if player.state == PlayerState::Walking => {
                player.state = PlayerState::Swimming;
            }
            None => {}
        }
    }
}
