// SPDX-License-Identifier: Apache-2.0
//! Per-session delta tracking: remembers the last frame sent to one
//! session and diffs the next baseline against it to build a
//! [`DeltaFrame`] (§4.5). Grounded in the dirty-flag comparison pattern
//! used to decide what a snapshot buffer must resend.

use rustc_hash::FxHashMap;

use super::frame::{BaselineFrame, DeltaFrame, QuantizedModule, QuantizedPlayer, QuantizedProjectile, QuantizedShip};
use crate::ident::{ModuleId, PlayerId, ProjectileId, ShipId};

/// The last frame sent to a single session, used as the delta
/// reference point until the next baseline resets it.
#[derive(Debug, Default)]
pub struct SessionSnapshotState {
    baseline_tick: u64,
    has_baseline: bool,
    ships: FxHashMap<ShipId, QuantizedShip>,
    modules: FxHashMap<ModuleId, QuantizedModule>,
    players: FxHashMap<PlayerId, QuantizedPlayer>,
    projectiles: FxHashMap<ProjectileId, QuantizedProjectile>,
}

impl SessionSnapshotState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a baseline has ever been adopted for this session. A
    /// session's first-ever frame must be a baseline (§4.6); this is
    /// what the tick loop checks to force that.
    #[must_use]
    pub fn has_baseline(&self) -> bool {
        self.has_baseline
    }

    /// Resets tracked state to a freshly-sent baseline (§4.5: a baseline
    /// is sent on session join and on a fixed interval thereafter).
    pub fn adopt_baseline(&mut self, frame: &BaselineFrame) {
        self.baseline_tick = frame.tick;
        self.has_baseline = true;
        self.ships = frame.ships.iter().map(|s| (s.id, *s)).collect();
        self.modules = frame.modules.iter().map(|m| (m.id, *m)).collect();
        self.players = frame.players.iter().map(|p| (p.id, *p)).collect();
        self.projectiles = frame.projectiles.iter().map(|p| (p.id, *p)).collect();
    }

    /// Diffs `current` against the tracked state, returning only what
    /// changed plus removals, and adopts `current` as the new
    /// reference point for the following tick.
    pub fn diff_and_adopt(&mut self, current: &BaselineFrame) -> DeltaFrame {
        let mut delta = DeltaFrame {
            tick: current.tick,
            baseline_tick: self.baseline_tick,
            ..Default::default()
        };

        let mut next_ships = FxHashMap::default();
        for ship in &current.ships {
            if self.ships.get(&ship.id) != Some(ship) {
                delta.changed_ships.push(*ship);
            }
            next_ships.insert(ship.id, *ship);
        }
        for id in self.ships.keys() {
            if !next_ships.contains_key(id) {
                delta.removed_ships.push(*id);
            }
        }
        self.ships = next_ships;

        let mut next_modules = FxHashMap::default();
        for module in &current.modules {
            if self.modules.get(&module.id) != Some(module) {
                delta.changed_modules.push(*module);
            }
            next_modules.insert(module.id, *module);
        }
        self.modules = next_modules;

        let mut next_players = FxHashMap::default();
        for player in &current.players {
            if self.players.get(&player.id) != Some(player) {
                delta.changed_players.push(*player);
            }
            next_players.insert(player.id, *player);
        }
        for id in self.players.keys() {
            if !next_players.contains_key(id) {
                delta.removed_players.push(*id);
            }
        }
        self.players = next_players;

        let mut next_projectiles = FxHashMap::default();
        for projectile in &current.projectiles {
            if self.projectiles.get(&projectile.id) != Some(projectile) {
                delta.changed_projectiles.push(*projectile);
            }
            next_projectiles.insert(projectile.id, *projectile);
        }
        for id in self.projectiles.keys() {
            if !next_projectiles.contains_key(id) {
                delta.removed_projectiles.push(*id);
            }
        }
        self.projectiles = next_projectiles;

        delta
    }
}
