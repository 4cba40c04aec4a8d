// SPDX-License-Identifier: Apache-2.0
//! Binary snapshot encoding: baseline and delta frames to bytes, with a
//! one's-complement 16-bit checksum trailer (§4.5). This is the wire
//! format `sail-udp-gateway` ships; `sail-ws-gateway` instead sends the
//! same [`BaselineFrame`]/[`DeltaFrame`] structs as JSON.

use super::frame::{
    BaselineFrame, DeltaFrame, QuantizedModule, QuantizedPlayer, QuantizedProjectile,
    QuantizedShip,
};

const FRAME_KIND_BASELINE: u8 = 0;
const FRAME_KIND_DELTA: u8 = 1;

/// One's-complement 16-bit checksum over `data`, summing 16-bit
/// little-endian words with end-around carry (classic IP-checksum
/// shape), then complementing.
#[must_use]
pub fn checksum16(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    let mut chunks = data.chunks_exact(2);
    for chunk in &mut chunks {
        sum += u32::from(u16::from_le_bytes([chunk[0], chunk[1]]));
    }
    if let [last] = *chunks.remainder() {
        sum += u32::from(last);
    }
    while sum >> 16 != 0 {
        sum = (sum & 0xffff) + (sum >> 16);
    }
    !(sum as u16)
}

fn write_ship(buf: &mut Vec<u8>, s: &QuantizedShip) {
    buf.extend_from_slice(&s.id.0.to_le_bytes());
    buf.extend_from_slice(&s.position.0.to_le_bytes());
    buf.extend_from_slice(&s.position.1.to_le_bytes());
    buf.extend_from_slice(&s.velocity.0.to_le_bytes());
    buf.extend_from_slice(&s.velocity.1.to_le_bytes());
    buf.extend_from_slice(&s.rotation.to_le_bytes());
    buf.push(s.health);
}

fn write_module(buf: &mut Vec<u8>, m: &QuantizedModule) {
    buf.extend_from_slice(&m.id.0.to_le_bytes());
    buf.extend_from_slice(&m.ship.0.to_le_bytes());
    buf.push(m.health);
    buf.push(u8::from(m.active));
    buf.extend_from_slice(&m.occupied_by.0.to_le_bytes());
}

fn write_player(buf: &mut Vec<u8>, p: &QuantizedPlayer) {
    buf.extend_from_slice(&p.id.0.to_le_bytes());
    buf.extend_from_slice(&p.position.0.to_le_bytes());
    buf.extend_from_slice(&p.position.1.to_le_bytes());
    buf.extend_from_slice(&p.velocity.0.to_le_bytes());
    buf.extend_from_slice(&p.velocity.1.to_le_bytes());
    buf.extend_from_slice(&p.rotation.to_le_bytes());
    buf.push(p.health);
    buf.push(p.state);
}

fn write_projectile(buf: &mut Vec<u8>, p: &QuantizedProjectile) {
    buf.extend_from_slice(&p.id.0.to_le_bytes());
    buf.extend_from_slice(&p.position.0.to_le_bytes());
    buf.extend_from_slice(&p.position.1.to_le_bytes());
}

fn write_count(buf: &mut Vec<u8>, count: usize) {
    buf.extend_from_slice(&(count as u32).to_le_bytes());
}

/// Encodes a baseline frame: `kind(1) tick(8) counts... entities...
/// checksum(2)`.
#[must_use]
pub fn encode_baseline(frame: &BaselineFrame) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.push(FRAME_KIND_BASELINE);
    buf.extend_from_slice(&frame.tick.to_le_bytes());

    write_count(&mut buf, frame.ships.len());
    for s in &frame.ships {
        write_ship(&mut buf, s);
    }
    write_count(&mut buf, frame.modules.len());
    for m in &frame.modules {
        write_module(&mut buf, m);
    }
    write_count(&mut buf, frame.players.len());
    for p in &frame.players {
        write_player(&mut buf, p);
    }
    write_count(&mut buf, frame.projectiles.len());
    for p in &frame.projectiles {
        write_projectile(&mut buf, p);
    }

    let sum = checksum16(&buf);
    buf.extend_from_slice(&sum.to_le_bytes());
    buf
}

/// Encodes a delta frame: changed entities plus explicit removal lists,
/// referencing the baseline tick it is relative to.
#[must_use]
pub fn encode_delta(frame: &DeltaFrame) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.push(FRAME_KIND_DELTA);
    buf.extend_from_slice(&frame.tick.to_le_bytes());
    buf.extend_from_slice(&frame.baseline_tick.to_le_bytes());

    write_count(&mut buf, frame.changed_ships.len());
    for s in &frame.changed_ships {
        write_ship(&mut buf, s);
    }
    write_count(&mut buf, frame.changed_modules.len());
    for m in &frame.changed_modules {
        write_module(&mut buf, m);
    }
    write_count(&mut buf, frame.changed_players.len());
    for p in &frame.changed_players {
        write_player(&mut buf, p);
    }
    write_count(&mut buf, frame.changed_projectiles.len());
    for p in &frame.changed_projectiles {
        write_projectile(&mut buf, p);
    }

    write_count(&mut buf, frame.removed_ships.len());
    for id in &frame.removed_ships {
        buf.extend_from_slice(&id.0.to_le_bytes());
    }
    write_count(&mut buf, frame.removed_players.len());
    for id in &frame.removed_players {
        buf.extend_from_slice(&id.0.to_le_bytes());
    }
    write_count(&mut buf, frame.removed_projectiles.len());
    for id in &frame.removed_projectiles {
        buf.extend_from_slice(&id.0.to_le_bytes());
    }

    let sum = checksum16(&buf);
    buf.extend_from_slice(&sum.to_le_bytes());
    buf
}

/// Verifies a previously-encoded frame's trailing checksum.
#[must_use]
pub fn verify_checksum(encoded: &[u8]) -> bool {
    if encoded.len() < 2 {
        return false;
    }
    let (body, trailer) = encoded.split_at(encoded.len() - 2);
    let expected = u16::from_le_bytes([trailer[0], trailer[1]]);
    checksum16(body) == expected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::frame::build_baseline;
    use crate::world::{World, WorldCapacity};
    use crate::math::{Fixed, FixedVec2};

    #[test]
    fn checksum_is_order_sensitive() {
        let a = checksum16(&[1, 2, 3, 4]);
        let b = checksum16(&[4, 3, 2, 1]);
        assert_ne!(a, b);
    }

    #[test]
    fn encoded_baseline_passes_its_own_checksum() {
        let mut world = World::new(WorldCapacity::default(), 1);
        let ship = world.create_ship(FixedVec2::ZERO, Fixed::ZERO, vec![]).unwrap();
        let frame = build_baseline(&world, &[ship], &[], Fixed::from_int(2000));
        let bytes = encode_baseline(&frame);
        assert!(verify_checksum(&bytes));
    }

    #[test]
    fn corrupted_baseline_fails_checksum() {
        let mut world = World::new(WorldCapacity::default(), 1);
        let ship = world.create_ship(FixedVec2::ZERO, Fixed::ZERO, vec![]).unwrap();
        let frame = build_baseline(&world, &[ship], &[], Fixed::from_int(2000));
        let mut bytes = encode_baseline(&frame);
        let mid = bytes.len() / 2;
        bytes[mid] ^= 0xff;
        assert!(!verify_checksum(&bytes));
    }

    #[test]
    fn empty_delta_still_encodes_and_verifies() {
        let frame = DeltaFrame {
            tick: 5,
            baseline_tick: 0,
            ..Default::default()
        };
        let bytes = encode_delta(&frame);
        assert!(verify_checksum(&bytes));
    }
}
