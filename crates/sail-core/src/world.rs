// SPDX-License-Identifier: Apache-2.0
//! Process-wide world state (§4.2).
//!
//! `World` owns three dense arrays — ships, players, projectiles — plus
//! a module arena, each with a fixed capacity. Arrays are sorted by id
//! ascending at the start of each tick so simulation order is
//! deterministic (I1, §4.3).

use crate::entities::{Module, ModuleKind, Player, Projectile, Ship};
use crate::error::{EntityKind, SimError};
use crate::ident::{IdAllocator, ModuleId, PlayerId, ProjectileId, ShipId};
use crate::math::{Fixed, FixedVec2, Rng64};

/// Capacities from §4.2's example sizing.
#[derive(Debug, Clone, Copy)]
pub struct WorldCapacity {
    pub ships: usize,
    pub players: usize,
    pub projectiles: usize,
}

impl Default for WorldCapacity {
    fn default() -> Self {
        WorldCapacity {
            ships: 256,
            players: 1024,
            projectiles: 4096,
        }
    }
}

/// The single authoritative simulation state (§5: unshared, tick-thread
/// exclusive).
#[derive(Debug)]
pub struct World {
    pub tick: u64,
    pub rng: Rng64,
    capacity: WorldCapacity,

    ships: Vec<Ship>,
    players: Vec<Player>,
    projectiles: Vec<Projectile>,
    modules: Vec<Module>,

    ship_ids: IdAllocator,
    player_ids: IdAllocator,
    projectile_ids: IdAllocator,
    module_ids: IdAllocator,
}

impl World {
    #[must_use]
    pub fn new(capacity: WorldCapacity, seed: u64) -> Self {
        World {
            tick: 0,
            rng: Rng64::from_seed(seed),
            capacity,
            ships: Vec::new(),
            players: Vec::new(),
            projectiles: Vec::new(),
            modules: Vec::new(),
            ship_ids: IdAllocator::new(),
            player_ids: IdAllocator::new(),
            projectile_ids: IdAllocator::new(),
            module_ids: IdAllocator::new(),
        }
    }

    // -- creation -----------------------------------------------------

    pub fn create_ship(
        &mut self,
        position: FixedVec2,
        rotation: Fixed,
        hull: Vec<FixedVec2>,
    ) -> Result<ShipId, SimError> {
        if self.ships.len() >= self.capacity.ships {
            return Err(SimError::CapacityExceeded {
                kind: EntityKind::Ship,
            });
        }
        let id = ShipId(self.ship_ids.allocate());
        self.ships.push(Ship::new(id, position, rotation, hull));
        Ok(id)
    }

    pub fn create_module(
        &mut self,
        ship: ShipId,
        kind: ModuleKind,
        local_pos: FixedVec2,
    ) -> Result<ModuleId, SimError> {
        let id = ModuleId(self.module_ids.allocate());
        let module = Module::new(id, ship, kind, local_pos);
        self.modules.push(module);
        let ship_mut = self.ship_mut(ship)?;
        ship_mut.modules.push(id);
        Ok(id)
    }

    pub fn create_player(
        &mut self,
        position: FixedVec2,
        carrier: Option<crate::entities::Carrier>,
    ) -> Result<PlayerId, SimError> {
        if self.players.len() >= self.capacity.players {
            return Err(SimError::CapacityExceeded {
                kind: EntityKind::Player,
            });
        }
        let id = PlayerId(self.player_ids.allocate());
        let mut player = Player::new(id, position);
        player.carrier = carrier;
        if carrier.is_some() {
            player.state = crate::entities::PlayerState::Mounted;
        }
        self.players.push(player);
        Ok(id)
    }

    pub fn create_projectile(
        &mut self,
        position: FixedVec2,
        velocity: FixedVec2,
        owner: ShipId,
        damage: Fixed,
        lifetime_ticks: u32,
    ) -> Result<ProjectileId, SimError> {
        if self.projectiles.len() >= self.capacity.projectiles {
            return Err(SimError::CapacityExceeded {
                kind: EntityKind::Projectile,
            });
        }
        let id = ProjectileId(self.projectile_ids.allocate());
        self.projectiles.push(Projectile::new(
            id, owner, position, velocity, damage, self.tick, lifetime_ticks,
        ));
        Ok(id)
    }

    // -- destruction ----------------------------------------------------

    pub fn destroy_ship(&mut self, id: ShipId) -> Result<(), SimError> {
        let pos = self
            .ships
            .iter()
            .position(|s| s.id == id)
            .ok_or(SimError::NotFound {
                kind: EntityKind::Ship,
            })?;
        let ship = self.ships.remove(pos);
        self.modules.retain(|m| m.ship != ship.id);
        // Dismount any player carried by this ship (I3).
        for player in &mut self.players {
            if player.carrier.map(|c| c.ship) == Some(id) {
                player.dismount_to(player.position, player.velocity);
            }
        }
        Ok(())
    }

    pub fn destroy_player(&mut self, id: PlayerId) -> Result<(), SimError> {
        let pos = self
            .players
            .iter()
            .position(|p| p.id == id)
            .ok_or(SimError::NotFound {
                kind: EntityKind::Player,
            })?;
        self.players.remove(pos);
        for module in &mut self.modules {
            if module.payload.occupant() == id {
                module.payload.set_occupant(PlayerId::NONE);
            }
        }
        Ok(())
    }

    pub fn destroy_projectile(&mut self, id: ProjectileId) -> Result<(), SimError> {
        let pos = self
            .projectiles
            .iter()
            .position(|p| p.id == id)
            .ok_or(SimError::NotFound {
                kind: EntityKind::Projectile,
            })?;
        self.projectiles.remove(pos);
        Ok(())
    }

    pub fn destroy_module(&mut self, id: ModuleId) -> Result<(), SimError> {
        let pos = self
            .modules
            .iter()
            .position(|m| m.id == id)
            .ok_or(SimError::NotFound {
                kind: EntityKind::Module,
            })?;
        let occupant = self.modules[pos].payload.occupant();
        self.modules.remove(pos);
        if !occupant.is_none() {
            if let Some(player) = self.player_mut(occupant).ok() {
                if player.carrier.map(|c| c.module) == Some(id) {
                    player.dismount_to(player.position, player.velocity);
                }
            }
        }
        Ok(())
    }

    // -- lookups ----------------------------------------------------------

    #[must_use]
    pub fn ship(&self, id: ShipId) -> Option<&Ship> {
        self.ships.iter().find(|s| s.id == id)
    }

    pub fn ship_mut(&mut self, id: ShipId) -> Result<&mut Ship, SimError> {
        self.ships
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(SimError::NotFound {
                kind: EntityKind::Ship,
            })
    }

    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player, SimError> {
        self.players
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(SimError::NotFound {
                kind: EntityKind::Player,
            })
    }

    #[must_use]
    pub fn module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.iter().find(|m| m.id == id)
    }

    pub fn module_mut(&mut self, id: ModuleId) -> Result<&mut Module, SimError> {
        self.modules
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(SimError::NotFound {
                kind: EntityKind::Module,
            })
    }

    #[must_use]
    pub fn projectile(&self, id: ProjectileId) -> Option<&Projectile> {
        self.projectiles.iter().find(|p| p.id == id)
    }

    // -- bulk accessors (always id-ascending, I1/§4.3) -------------------

    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    pub fn ships_mut(&mut self) -> &mut [Ship] {
        &mut self.ships
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn players_mut(&mut self) -> &mut [Player] {
        &mut self.players
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn projectiles_mut(&mut self) -> &mut [Projectile] {
        &mut self.projectiles
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn modules_mut(&mut self) -> &mut [Module] {
        &mut self.modules
    }

    pub fn modules_of_ship(&self, ship: ShipId) -> impl Iterator<Item = &Module> {
        self.modules.iter().filter(move |m| m.ship == ship)
    }

    /// Structural consistency checks run once per tick (§7: the only
    /// error the tick loop treats as fatal). Catches bookkeeping bugs
    /// that would otherwise silently corrupt snapshots — a dangling
    /// module/carrier reference, or a ship claiming a module it doesn't
    /// own.
    pub fn check_invariants(&self) -> Result<(), SimError> {
        for module in &self.modules {
            if self.ship(module.ship).is_none() {
                return Err(SimError::Invariant(format!(
                    "module {:?} references missing ship {:?}",
                    module.id, module.ship
                )));
            }
        }
        for ship in &self.ships {
            for module_id in &ship.modules {
                match self.module(*module_id) {
                    Some(module) if module.ship == ship.id => {}
                    Some(module) => {
                        return Err(SimError::Invariant(format!(
                            "ship {:?} lists module {:?} owned by ship {:?}",
                            ship.id, module_id, module.ship
                        )));
                    }
                    None => {
                        return Err(SimError::Invariant(format!(
                            "ship {:?} lists missing module {:?}",
                            ship.id, module_id
                        )));
                    }
                }
            }
        }
        for player in &self.players {
            if let Some(carrier) = player.carrier {
                if self.ship(carrier.ship).is_none() {
                    return Err(SimError::Invariant(format!(
                        "player {:?} carried by missing ship {:?}",
                        player.id, carrier.ship
                    )));
                }
                if self.module(carrier.module).is_none() {
                    return Err(SimError::Invariant(format!(
                        "player {:?} carried by missing module {:?}",
                        player.id, carrier.module
                    )));
                }
            }
        }
        Ok(())
    }

    /// Sorts all dense arrays by ascending id. Called at the start of
    /// every tick (§4.2, §4.3).
    pub fn sort_by_id(&mut self) {
        self.ships.sort_by_key(|s| s.id.0);
        self.players.sort_by_key(|p| p.id.0);
        self.projectiles.sort_by_key(|p| p.id.0);
        self.modules.sort_by_key(|m| m.id.0);
    }

    /// Removes projectiles whose lifetime has expired or that have
    /// left the bounded world (§4.3 step 4).
    pub fn reap_expired_projectiles(&mut self, world_half_extent: Fixed) {
        self.projectiles.retain(|p| {
            !p.is_expired()
                && p.position.x.abs() <= world_half_extent
                && p.position.y.abs() <= world_half_extent
        });
    }

    /// The default "brigantine" hull: a ~49-vertex counter-clockwise
    /// polygon approximating an elongated hull shape (§3).
    #[must_use]
    pub fn brigantine_hull() -> Vec<FixedVec2> {
        const POINTS: usize = 49;
        const LENGTH: f64 = 18.0;
        const BEAM: f64 = 5.0;
        let mut hull = Vec::with_capacity(POINTS);
        for i in 0..POINTS {
            let t = i as f64 / POINTS as f64;
            let angle = t * std::f64::consts::TAU;
            // Superellipse-ish taper: pointed bow, blunt stern.
            let x = (angle.cos()) * LENGTH / 2.0;
            let taper = if x > 0.0 {
                1.0 - (x / (LENGTH / 2.0)).powi(2) * 0.3
            } else {
                1.0
            };
            let y = angle.sin() * BEAM / 2.0 * taper;
            hull.push(FixedVec2::from_f64(x, y));
        }
        hull
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        World::new(WorldCapacity::default(), 42)
    }

    #[test]
    fn create_ship_allocates_unique_ids() {
        let mut w = world();
        let a = w.create_ship(FixedVec2::ZERO, Fixed::ZERO, vec![]).unwrap();
        let b = w.create_ship(FixedVec2::ZERO, Fixed::ZERO, vec![]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn capacity_exceeded_returns_error_not_panic() {
        let mut w = World::new(
            WorldCapacity {
                ships: 1,
                players: 1,
                projectiles: 1,
            },
            1,
        );
        w.create_ship(FixedVec2::ZERO, Fixed::ZERO, vec![]).unwrap();
        let err = w.create_ship(FixedVec2::ZERO, Fixed::ZERO, vec![]);
        assert!(matches!(err, Err(SimError::CapacityExceeded { .. })));
    }

    #[test]
    fn destroying_ship_destroys_its_modules() {
        let mut w = world();
        let ship = w.create_ship(FixedVec2::ZERO, Fixed::ZERO, vec![]).unwrap();
        let m = w
            .create_module(ship, ModuleKind::Helm, FixedVec2::ZERO)
            .unwrap();
        w.destroy_ship(ship).unwrap();
        assert!(w.module(m).is_none());
    }

    #[test]
    fn destroying_ship_dismounts_its_players() {
        let mut w = world();
        let ship = w.create_ship(FixedVec2::ZERO, Fixed::ZERO, vec![]).unwrap();
        let m = w
            .create_module(ship, ModuleKind::Helm, FixedVec2::ZERO)
            .unwrap();
        let carrier = crate::entities::Carrier {
            ship,
            module: m,
            offset: FixedVec2::ZERO,
        };
        let player = w.create_player(FixedVec2::ZERO, Some(carrier)).unwrap();
        w.destroy_ship(ship).unwrap();
        assert!(!w.player(player).unwrap().is_mounted());
    }

    #[test]
    fn brigantine_hull_has_expected_vertex_count() {
        assert_eq!(World::brigantine_hull().len(), 49);
    }

    #[test]
    fn sort_by_id_orders_ships_ascending() {
        let mut w = world();
        w.create_ship(FixedVec2::ZERO, Fixed::ZERO, vec![]).unwrap();
        w.create_ship(FixedVec2::ZERO, Fixed::ZERO, vec![]).unwrap();
        w.sort_by_id();
        let ids: Vec<u32> = w.ships().iter().map(|s| s.id.0).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }
}
