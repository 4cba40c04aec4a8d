// SPDX-License-Identifier: Apache-2.0
//! The fixed-timestep tick loop (§5).
//!
//! Runs on a dedicated OS thread, never a Tokio task, so a stalled
//! async runtime can never stall physics. Gateways hand inbound events
//! across a bounded channel and receive per-session outbound messages
//! back the same way; `World` itself never leaves this thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use sail_config::Config;
use sail_core::aoi::{AoiGrid, EntityRef, Tier, TierConfig};
use sail_core::ident::SessionId;
use sail_core::math::Fixed;
use sail_core::hash::hash_world;
use sail_core::sim::{step, StepConfig, StepInputs};
use sail_core::snapshot::build_baseline;
use sail_core::telemetry::{DegradationLevel, LodGovernor, PerfHistogram, TickTiming};
use sail_core::world::{World, WorldCapacity};
use sail_proto::{ClientMessage, ServerMessage};

use crate::dispatch::{dispatch, DispatchConfig};
use crate::session::SessionManager;

/// One message the tick thread owes back to a specific session. The
/// gateway that owns the session's transport encodes it (JSON for
/// `sail-ws-gateway`, the binary frame for `sail-udp-gateway`).
#[derive(Debug)]
pub struct Outbound {
    pub session_id: SessionId,
    pub message: ServerMessage,
}

/// One event crossing from an async gateway task into the tick thread.
pub enum InboundEvent {
    /// A new transport connection, requesting a session id and
    /// registering where its outbound messages should go.
    Connect {
        outbox: mpsc::Sender<Outbound>,
        reply: oneshot::Sender<SessionId>,
    },
    Message {
        session_id: SessionId,
        message: ClientMessage,
    },
    Disconnect {
        session_id: SessionId,
    },
}

/// Cloneable front door gateways use to talk to the tick thread.
#[derive(Clone)]
pub struct SessionHandle {
    inbound: mpsc::Sender<InboundEvent>,
}

impl SessionHandle {
    pub async fn send(&self, event: InboundEvent) {
        if self.inbound.send(event).await.is_err() {
            warn!("tick thread gone, dropping inbound event");
        }
    }
}

/// Owns the tick thread; joins it on drop.
pub struct TickScheduler {
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl TickScheduler {
    /// Spawns the tick thread and returns the handle gateways use to
    /// reach it, and the scheduler handle the composition root uses to
    /// shut it down.
    #[must_use]
    pub fn spawn(config: Config) -> (Self, SessionHandle) {
        let (inbound_tx, inbound_rx) = mpsc::channel(1024);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_thread = shutdown.clone();

        let handle = thread::Builder::new()
            .name("sail-tick".to_string())
            .spawn(move || run(config, inbound_rx, &shutdown_thread))
            .expect("failed to spawn tick thread");

        (
            TickScheduler {
                shutdown,
                handle: Some(handle),
            },
            SessionHandle { inbound: inbound_tx },
        )
    }

    pub fn shutdown(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn close_session(
    world: &mut World,
    sessions: &mut SessionManager,
    outboxes: &mut FxHashMap<SessionId, mpsc::Sender<Outbound>>,
    aoi_grid: &mut AoiGrid,
    session_id: SessionId,
) {
    let _ = sessions.begin_closing(session_id);
    if let Some(player) = sessions.remove(session_id) {
        aoi_grid.remove(EntityRef::Player(player));
        let _ = world.destroy_player(player);
    }
    outboxes.remove(&session_id);
}

fn handle_inbound_event(
    world: &mut World,
    sessions: &mut SessionManager,
    outboxes: &mut FxHashMap<SessionId, mpsc::Sender<Outbound>>,
    aoi_grid: &mut AoiGrid,
    step_inputs: &mut StepInputs,
    dispatch_config: &DispatchConfig,
    event: InboundEvent,
) {
    match event {
        InboundEvent::Connect { outbox, reply } => {
            let session_id = sessions.create(world.tick);
            outboxes.insert(session_id, outbox);
            let _ = reply.send(session_id);
        }
        InboundEvent::Message { session_id, message } => {
            let current_tick = world.tick;
            let responses = dispatch(
                world,
                sessions,
                step_inputs,
                session_id,
                message,
                current_tick,
                dispatch_config,
            );
            if let Some(outbox) = outboxes.get(&session_id) {
                for message in responses {
                    if outbox.try_send(Outbound { session_id, message }).is_err() {
                        warn!(?session_id, "outbound channel full, dropping message");
                    }
                }
            }
        }
        InboundEvent::Disconnect { session_id } => {
            close_session(world, sessions, outboxes, aoi_grid, session_id);
        }
    }
}

/// The tick thread's body. Blocks on `inbound.blocking_recv()` only
/// when truly idle between ticks; otherwise drains whatever arrived
/// during the previous tick and advances on a fixed schedule.
fn run(config: Config, mut inbound: mpsc::Receiver<InboundEvent>, shutdown: &AtomicBool) {
    info!(tick_rate = config.tick_rate, "tick thread starting");
    let tick_duration = Duration::from_secs_f64(1.0 / config.tick_rate);
    let budget_us = tick_duration.as_micros() as u32;

    let capacity = WorldCapacity {
        ships: config.max_ships,
        players: config.max_players,
        projectiles: config.max_projectiles,
    };
    let mut world = World::new(capacity, config.seed);
    let mut sessions = SessionManager::new(config.input_rate_limit_per_sec, config.tick_rate.round() as u64);
    let mut outboxes: FxHashMap<SessionId, mpsc::Sender<Outbound>> = FxHashMap::default();
    let mut aoi_grid = AoiGrid::new();
    let mut perf = PerfHistogram::new(120);
    let mut governor = LodGovernor::new();

    let tier_config = TierConfig {
        r_high: Fixed::from_f64(config.aoi_r_high),
        r_mid: Fixed::from_f64(config.aoi_r_mid),
        r_low: Fixed::from_f64(config.aoi_r_low),
        hz_high: config.aoi_hz_high,
        hz_mid: config.aoi_hz_mid,
        hz_low: config.aoi_hz_low,
    };
    let step_config = StepConfig {
        dt: Fixed::from_f64(1.0 / config.tick_rate),
        world_half_extent: Fixed::from_f64(config.world_half_extent),
        player_walk_speed: Fixed::from_int(3),
        player_swim_speed: Fixed::from_int(2),
    };
    let dispatch_config = DispatchConfig {
        max_interact_distance: Fixed::from_f64(config.max_interact_distance),
        tick_rate: config.tick_rate,
    };
    let handshake_timeout_ticks = (config.t_handshake_ms as f64 / 1000.0 * config.tick_rate) as u64;
    let disconnect_timeout_ticks = (config.t_disconnect_ms as f64 / 1000.0 * config.tick_rate) as u64;
    let baseline_interval_ticks = config.baseline_interval_ticks.max(1);
    let radius_cells = (config.aoi_r_low / 32.0).ceil() as i32 + 1;

    let mut next_deadline = Instant::now() + tick_duration;

    while !shutdown.load(Ordering::SeqCst) {
        let tick_start = Instant::now();

        let mut step_inputs = StepInputs::default();
        while let Ok(event) = inbound.try_recv() {
            handle_inbound_event(
                &mut world,
                &mut sessions,
                &mut outboxes,
                &mut aoi_grid,
                &mut step_inputs,
                &dispatch_config,
                event,
            );
        }
        let drain_time = tick_start.elapsed();

        let sim_start = Instant::now();
        step(&mut world, &step_inputs, &step_config);
        let sim_time = sim_start.elapsed();

        if let Err(err) = world.check_invariants() {
            tracing::error!(
                tick = world.tick,
                world_hash = hash_world(&world),
                recent_perf = ?perf.recent(),
                error = %err,
                "fatal invariant violation, tick thread exiting"
            );
            std::process::exit(1);
        }

        let timed_out = sessions.timed_out(world.tick, handshake_timeout_ticks, disconnect_timeout_ticks);
        for session_id in timed_out {
            close_session(&mut world, &mut sessions, &mut outboxes, &mut aoi_grid, session_id);
        }

        let aoi_start = Instant::now();
        for ship in world.ships() {
            aoi_grid.update(EntityRef::Ship(ship.id), ship.position);
        }
        for player in world.players() {
            aoi_grid.update(EntityRef::Player(player.id), player.position);
        }
        let aoi_time = aoi_start.elapsed();

        let encode_start = Instant::now();
        let send_time = send_snapshots(
            &world,
            &mut sessions,
            &outboxes,
            &aoi_grid,
            &tier_config,
            &governor,
            radius_cells,
            baseline_interval_ticks,
            config.tick_rate,
            step_config.world_half_extent,
        );
        let encode_time = encode_start.elapsed();

        let timing = TickTiming::from_durations(drain_time, sim_time, aoi_time, encode_time, send_time);
        perf.record(timing);
        governor.observe(timing.total_us, budget_us);

        let now = Instant::now();
        if now < next_deadline {
            thread::sleep(next_deadline - now);
        } else if timing.total_us > budget_us {
            warn!(total_us = timing.total_us, budget_us, "tick overran its budget");
        }
        next_deadline += tick_duration;
    }

    info!("tick thread stopping");
}

/// Builds and sends each active session its baseline or delta frame,
/// gated by its AOI subscription's highest-priority tier cadence
/// (§4.4, §4.5). Returns the wall-clock spent encoding and enqueuing.
#[allow(clippy::too_many_arguments)]
fn send_snapshots(
    world: &World,
    sessions: &mut SessionManager,
    outboxes: &FxHashMap<SessionId, mpsc::Sender<Outbound>>,
    aoi_grid: &AoiGrid,
    tier_config: &TierConfig,
    governor: &LodGovernor,
    radius_cells: i32,
    baseline_interval_ticks: u64,
    tick_rate: f64,
    origin_offset: Fixed,
) -> Duration {
    let start = Instant::now();
    for session_id in sessions.active_ids() {
        let Some(owner_pos) = sessions
            .get(session_id)
            .and_then(|s| s.player)
            .and_then(|p| world.player(p))
            .map(|p| p.position)
        else {
            continue;
        };

        let candidates = aoi_grid.query_nearby(owner_pos, radius_cells.max(1));
        let classified: Vec<(EntityRef, Tier)> = candidates
            .into_iter()
            .filter_map(|entity| {
                let pos = match entity {
                    EntityRef::Ship(id) => world.ship(id).map(|s| s.position),
                    EntityRef::Player(id) => world.player(id).map(|p| p.position),
                }?;
                let distance = (pos - owner_pos).length();
                let tier = tier_config.classify(distance)?;
                if governor.level() == DegradationLevel::SkipLowTier && tier == Tier::Low {
                    return None;
                }
                Some((entity, tier))
            })
            .collect();

        let Some(session) = sessions.get_mut(session_id) else {
            continue;
        };
        session.aoi.reassign(classified);

        let best_tier = session
            .aoi
            .visible()
            .map(|(_, tier)| *tier)
            .min()
            .unwrap_or(Tier::Low);
        let hz = tier_config.hz(best_tier);
        if !session.aoi.eligible(best_tier, world.tick, tick_rate, hz) {
            continue;
        }
        session.aoi.mark_sent(best_tier, world.tick);

        let mut ship_ids = Vec::new();
        let mut player_ids = Vec::new();
        for (entity, _tier) in session.aoi.visible() {
            match entity {
                EntityRef::Ship(id) => ship_ids.push(*id),
                EntityRef::Player(id) => player_ids.push(*id),
            }
        }
        ship_ids.sort_by_key(|id| id.0);
        player_ids.sort_by_key(|id| id.0);

        let baseline = build_baseline(world, &ship_ids, &player_ids, origin_offset);
        let send_full =
            !session.snapshot_state.has_baseline() || world.tick % baseline_interval_ticks == 0;

        let message = if send_full {
            session.snapshot_state.adopt_baseline(&baseline);
            ServerMessage::GameStateBaseline { frame: baseline }
        } else {
            let delta = session.snapshot_state.diff_and_adopt(&baseline);
            ServerMessage::GameStateDelta { frame: delta }
        };

        if let Some(outbox) = outboxes.get(&session_id) {
            if outbox.try_send(Outbound { session_id, message }).is_err() {
                warn!(?session_id, "outbound channel full, dropping snapshot");
            }
        }
    }
    start.elapsed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_then_disconnect_round_trips_through_events() {
        let mut world = World::new(WorldCapacity::default(), 1);
        let mut sessions = SessionManager::new(60, 20);
        let mut outboxes: FxHashMap<SessionId, mpsc::Sender<Outbound>> = FxHashMap::default();
        let mut aoi_grid = AoiGrid::new();
        let mut step_inputs = StepInputs::default();
        let dispatch_config = DispatchConfig {
            max_interact_distance: Fixed::from_int(5),
            tick_rate: 20.0,
        };

        let (outbox_tx, mut outbox_rx) = mpsc::channel(8);
        let (reply_tx, reply_rx) = oneshot::channel();
        handle_inbound_event(
            &mut world,
            &mut sessions,
            &mut outboxes,
            &mut aoi_grid,
            &mut step_inputs,
            &dispatch_config,
            InboundEvent::Connect {
                outbox: outbox_tx,
                reply: reply_tx,
            },
        );
        let session_id = reply_rx.try_recv().expect("reply sent synchronously");
        assert_eq!(sessions.len(), 1);

        handle_inbound_event(
            &mut world,
            &mut sessions,
            &mut outboxes,
            &mut aoi_grid,
            &mut step_inputs,
            &dispatch_config,
            InboundEvent::Message {
                session_id,
                message: ClientMessage::Ping { client_time_ms: 1 },
            },
        );
        let outbound = outbox_rx.try_recv().expect("pong queued");
        assert!(matches!(outbound.message, ServerMessage::Pong { .. }));

        handle_inbound_event(
            &mut world,
            &mut sessions,
            &mut outboxes,
            &mut aoi_grid,
            &mut step_inputs,
            &dispatch_config,
            InboundEvent::Disconnect { session_id },
        );
        assert!(sessions.is_empty());
        assert!(!outboxes.contains_key(&session_id));
    }

    #[test]
    fn handshake_then_snapshot_reaches_outbox() {
        let mut world = World::new(WorldCapacity::default(), 1);
        let mut sessions = SessionManager::new(60, 20);
        let mut outboxes: FxHashMap<SessionId, mpsc::Sender<Outbound>> = FxHashMap::default();
        let mut aoi_grid = AoiGrid::new();
        let mut step_inputs = StepInputs::default();
        let dispatch_config = DispatchConfig {
            max_interact_distance: Fixed::from_int(5),
            tick_rate: 20.0,
        };

        let (outbox_tx, mut outbox_rx) = mpsc::channel(8);
        let (reply_tx, reply_rx) = oneshot::channel();
        handle_inbound_event(
            &mut world,
            &mut sessions,
            &mut outboxes,
            &mut aoi_grid,
            &mut step_inputs,
            &dispatch_config,
            InboundEvent::Connect {
                outbox: outbox_tx,
                reply: reply_tx,
            },
        );
        let session_id = reply_rx.try_recv().unwrap();

        handle_inbound_event(
            &mut world,
            &mut sessions,
            &mut outboxes,
            &mut aoi_grid,
            &mut step_inputs,
            &dispatch_config,
            InboundEvent::Message {
                session_id,
                message: ClientMessage::Handshake {
                    name: "Anne".to_string(),
                    client_version: "1".to_string(),
                },
            },
        );
        let _handshake_ack = outbox_rx.try_recv().expect("handshake response queued");

        for player in world.players() {
            aoi_grid.update(EntityRef::Player(player.id), player.position);
        }
        let tier_config = TierConfig {
            r_high: Fixed::from_int(50),
            r_mid: Fixed::from_int(150),
            r_low: Fixed::from_int(400),
            hz_high: 20.0,
            hz_mid: 10.0,
            hz_low: 2.0,
        };
        let governor = LodGovernor::new();
        send_snapshots(
            &world,
            &mut sessions,
            &outboxes,
            &aoi_grid,
            &tier_config,
            &governor,
            20,
            100,
            20.0,
            Fixed::from_int(2000),
        );
        let snapshot = outbox_rx.try_recv().expect("baseline snapshot queued");
        assert!(matches!(snapshot.message, ServerMessage::GameStateBaseline { .. }));
    }

    #[test]
    fn first_snapshot_is_a_baseline_even_off_cadence() {
        use sail_core::math::FixedVec2;
        let mut world = World::new(WorldCapacity::default(), 1);
        world.tick = 37; // not a multiple of the 100-tick baseline interval
        let mut sessions = SessionManager::new(60, 20);
        let mut outboxes: FxHashMap<SessionId, mpsc::Sender<Outbound>> = FxHashMap::default();
        let mut aoi_grid = AoiGrid::new();

        let session_id = sessions.create(world.tick);
        sessions.get_mut(session_id).unwrap().transition(crate::state::SessionState::Handshaking).unwrap();
        let player = world.create_player(FixedVec2::ZERO, None).unwrap();
        sessions.bind_player(session_id, player).unwrap();
        aoi_grid.update(EntityRef::Player(player), FixedVec2::ZERO);

        let (outbox_tx, mut outbox_rx) = mpsc::channel(8);
        outboxes.insert(session_id, outbox_tx);

        let tier_config = TierConfig {
            r_high: Fixed::from_int(50),
            r_mid: Fixed::from_int(150),
            r_low: Fixed::from_int(400),
            hz_high: 20.0,
            hz_mid: 10.0,
            hz_low: 2.0,
        };
        let governor = LodGovernor::new();
        send_snapshots(
            &world,
            &mut sessions,
            &outboxes,
            &aoi_grid,
            &tier_config,
            &governor,
            20,
            100,
            20.0,
            Fixed::from_int(2000),
        );
        let snapshot = outbox_rx.try_recv().expect("baseline snapshot queued");
        assert!(matches!(snapshot.message, ServerMessage::GameStateBaseline { .. }));
    }
}
