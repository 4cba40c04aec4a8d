// SPDX-License-Identifier: Apache-2.0
//! World-state hashing, used by property tests to verify bit-identical
//! determinism across two independently stepped instances (P1).
//!
//! Mixing is FNV-1a-shaped over the raw Q16.16/u32 representations of
//! every field, visited in the same ascending-id order the simulation
//! step itself requires (I1). No external hashing crate: the exact
//! mix must be stable across Rust/toolchain versions forever, which an
//! upstream crate does not promise.

use crate::world::World;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

struct Hasher64(u64);

impl Hasher64 {
    fn new() -> Self {
        Hasher64(FNV_OFFSET)
    }

    fn mix_u32(&mut self, value: u32) {
        for byte in value.to_le_bytes() {
            self.0 ^= u64::from(byte);
            self.0 = self.0.wrapping_mul(FNV_PRIME);
        }
    }

    fn mix_i32(&mut self, value: i32) {
        self.mix_u32(value as u32);
    }

    fn mix_u64(&mut self, value: u64) {
        self.mix_u32((value & 0xffff_ffff) as u32);
        self.mix_u32((value >> 32) as u32);
    }

    fn mix_bool(&mut self, value: bool) {
        self.mix_u32(u32::from(value));
    }

    fn finish(self) -> u64 {
        self.0
    }
}

/// Hashes the full world state: tick, PRNG state, and every ship,
/// module, player, and projectile field in id-ascending order.
///
/// Two worlds built from the same seed and fed the same input sequence
/// must produce identical hashes at every tick (P1).
#[must_use]
pub fn hash_world(world: &World) -> u64 {
    let mut h = Hasher64::new();
    h.mix_u64(world.tick);
    h.mix_u64(world.rng.state());

    for ship in world.ships() {
        h.mix_u32(ship.id.0);
        h.mix_i32(ship.position.x.raw());
        h.mix_i32(ship.position.y.raw());
        h.mix_i32(ship.rotation.raw());
        h.mix_i32(ship.velocity.x.raw());
        h.mix_i32(ship.velocity.y.raw());
        h.mix_i32(ship.angular_velocity.raw());
        h.mix_i32(ship.health.raw());
        for v in &ship.hull {
            h.mix_i32(v.x.raw());
            h.mix_i32(v.y.raw());
        }
        for m in &ship.modules {
            h.mix_u32(m.0);
        }
    }

    for module in world.modules() {
        h.mix_u32(module.id.0);
        h.mix_u32(module.ship.0);
        h.mix_i32(module.health.raw());
        h.mix_bool(module.active);
        h.mix_bool(module.destroyed);
    }

    for player in world.players() {
        h.mix_u32(player.id.0);
        h.mix_i32(player.position.x.raw());
        h.mix_i32(player.position.y.raw());
        h.mix_i32(player.velocity.x.raw());
        h.mix_i32(player.velocity.y.raw());
        h.mix_i32(player.health.raw());
    }

    for projectile in world.projectiles() {
        h.mix_u32(projectile.id.0);
        h.mix_i32(projectile.position.x.raw());
        h.mix_i32(projectile.position.y.raw());
        h.mix_u32(projectile.lifetime_ticks_remaining);
    }

    h.finish()
}
