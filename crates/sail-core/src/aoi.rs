// SPDX-License-Identifier: Apache-2.0
//! Area-of-interest grid and per-session tiered subscriptions (§4.4).

use crate::ident::{PlayerId, ShipId};
use crate::math::{Fixed, FixedVec2};
use rustc_hash::FxHashMap;

/// An entity that can be AOI-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntityRef {
    Ship(ShipId),
    Player(PlayerId),
}

/// AOI distance tier, determining snapshot send cadence (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Tier {
    High,
    Mid,
    Low,
}

/// Radii and cadences for each tier, sourced from [`Config`](../sail_config).
#[derive(Debug, Clone, Copy)]
pub struct TierConfig {
    pub r_high: Fixed,
    pub r_mid: Fixed,
    pub r_low: Fixed,
    pub hz_high: f64,
    pub hz_mid: f64,
    pub hz_low: f64,
}

impl TierConfig {
    #[must_use]
    pub fn hz(&self, tier: Tier) -> f64 {
        match tier {
            Tier::High => self.hz_high,
            Tier::Mid => self.hz_mid,
            Tier::Low => self.hz_low,
        }
    }

    /// Classifies a squared distance into a tier, or `None` if beyond
    /// tier L radius ("an entity beyond tier L radius never appears",
    /// P6).
    #[must_use]
    pub fn classify(&self, distance: Fixed) -> Option<Tier> {
        if distance <= self.r_high {
            Some(Tier::High)
        } else if distance <= self.r_mid {
            Some(Tier::Mid)
        } else if distance <= self.r_low {
            Some(Tier::Low)
        } else {
            None
        }
    }
}

/// Cell side length, on the order of tens of world units (§4.4).
const CELL_SIZE: f64 = 32.0;

fn cell_of(position: FixedVec2) -> (i32, i32) {
    let x = position.x.to_f64();
    let y = position.y.to_f64();
    ((x / CELL_SIZE).floor() as i32, (y / CELL_SIZE).floor() as i32)
}

/// Uniform square-cell spatial index over ships and players (§4.4).
#[derive(Debug, Default)]
pub struct AoiGrid {
    cells: FxHashMap<(i32, i32), Vec<EntityRef>>,
    membership: FxHashMap<EntityRef, (i32, i32)>,
}

impl AoiGrid {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or moves an entity, updating cell membership only when
    /// the owning cell actually changed.
    pub fn update(&mut self, entity: EntityRef, position: FixedVec2) {
        let new_cell = cell_of(position);
        if let Some(old_cell) = self.membership.get(&entity).copied() {
            if old_cell == new_cell {
                return;
            }
            if let Some(bucket) = self.cells.get_mut(&old_cell) {
                bucket.retain(|e| *e != entity);
            }
        }
        self.cells.entry(new_cell).or_default().push(entity);
        self.membership.insert(entity, new_cell);
    }

    pub fn remove(&mut self, entity: EntityRef) {
        if let Some(cell) = self.membership.remove(&entity) {
            if let Some(bucket) = self.cells.get_mut(&cell) {
                bucket.retain(|e| *e != entity);
            }
        }
    }

    /// Entities within `radius_cells` cells of `center`'s cell, used to
    /// scan a fixed radius of cells around a session's owner position.
    pub fn query_nearby(&self, center: FixedVec2, radius_cells: i32) -> Vec<EntityRef> {
        let (cx, cy) = cell_of(center);
        let mut out = Vec::new();
        for dx in -radius_cells..=radius_cells {
            for dy in -radius_cells..=radius_cells {
                if let Some(bucket) = self.cells.get(&(cx + dx, cy + dy)) {
                    out.extend_from_slice(bucket);
                }
            }
        }
        out
    }
}

/// Per-session AOI subscription state (§4.4).
#[derive(Debug, Default)]
pub struct AoiSubscription {
    tiers: FxHashMap<EntityRef, Tier>,
    /// Last tick each tier was sent to, for cadence gating (§4.5).
    last_sent_tick: FxHashMap<Tier, u64>,
    /// Entities that entered or left the visible set this tick.
    pub entered: Vec<EntityRef>,
    pub left: Vec<EntityRef>,
}

impl AoiSubscription {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn tier_of(&self, entity: EntityRef) -> Option<Tier> {
        self.tiers.get(&entity).copied()
    }

    /// Recomputes tier membership against candidates visible this tick
    /// (already distance-classified by the caller), recording
    /// entered/left sets. Entities that leave must be reported as
    /// removals before any baseline re-adds them (§4.4).
    pub fn reassign(&mut self, classified: Vec<(EntityRef, Tier)>) {
        self.entered.clear();
        self.left.clear();

        let mut next: FxHashMap<EntityRef, Tier> =
            FxHashMap::with_capacity_and_hasher(classified.len(), Default::default());
        for (entity, tier) in classified {
            next.insert(entity, tier);
            if !self.tiers.contains_key(&entity) {
                self.entered.push(entity);
            }
        }
        for entity in self.tiers.keys() {
            if !next.contains_key(entity) {
                self.left.push(*entity);
            }
        }
        self.tiers = next;
    }

    /// Whether `tier`'s send cadence allows a send at `current_tick`
    /// given `tick_rate` ticks/sec (§4.5: "currentTick -
    /// session.lastSentTickForTier[tier] >= 1 / tierFrequency").
    #[must_use]
    pub fn eligible(&self, tier: Tier, current_tick: u64, tick_rate: f64, hz: f64) -> bool {
        let ticks_per_send = (tick_rate / hz).max(1.0) as u64;
        match self.last_sent_tick.get(&tier) {
            None => true,
            Some(last) => current_tick.saturating_sub(*last) >= ticks_per_send,
        }
    }

    pub fn mark_sent(&mut self, tier: Tier, current_tick: u64) {
        self.last_sent_tick.insert(tier, current_tick);
    }

    #[must_use]
    pub fn visible(&self) -> impl Iterator<Item = (&EntityRef, &Tier)> {
        self.tiers.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_update_then_query_finds_entity() {
        let mut grid = AoiGrid::new();
        let e = EntityRef::Ship(ShipId(1));
        grid.update(e, FixedVec2::from_f64(10.0, 10.0));
        let found = grid.query_nearby(FixedVec2::ZERO, 1);
        assert!(found.contains(&e));
    }

    #[test]
    fn grid_remove_drops_entity_from_queries() {
        let mut grid = AoiGrid::new();
        let e = EntityRef::Ship(ShipId(1));
        grid.update(e, FixedVec2::ZERO);
        grid.remove(e);
        assert!(grid.query_nearby(FixedVec2::ZERO, 2).is_empty());
    }

    #[test]
    fn tier_config_classifies_by_distance() {
        let cfg = TierConfig {
            r_high: Fixed::from_int(10),
            r_mid: Fixed::from_int(20),
            r_low: Fixed::from_int(30),
            hz_high: 30.0,
            hz_mid: 15.0,
            hz_low: 5.0,
        };
        assert_eq!(cfg.classify(Fixed::from_int(5)), Some(Tier::High));
        assert_eq!(cfg.classify(Fixed::from_int(15)), Some(Tier::Mid));
        assert_eq!(cfg.classify(Fixed::from_int(25)), Some(Tier::Low));
        assert_eq!(cfg.classify(Fixed::from_int(35)), None);
    }

    #[test]
    fn reassign_tracks_entered_and_left() {
        let mut sub = AoiSubscription::new();
        let a = EntityRef::Ship(ShipId(1));
        let b = EntityRef::Ship(ShipId(2));
        sub.reassign(vec![(a, Tier::High)]);
        assert_eq!(sub.entered, vec![a]);
        assert!(sub.left.is_empty());

        sub.reassign(vec![(b, Tier::Mid)]);
        assert_eq!(sub.entered, vec![b]);
        assert_eq!(sub.left, vec![a]);
    }

    #[test]
    fn eligible_gates_by_cadence() {
        let mut sub = AoiSubscription::new();
        assert!(sub.eligible(Tier::Low, 0, 30.0, 5.0));
        sub.mark_sent(Tier::Low, 0);
        assert!(!sub.eligible(Tier::Low, 3, 30.0, 5.0));
        assert!(sub.eligible(Tier::Low, 6, 30.0, 5.0));
    }
}
