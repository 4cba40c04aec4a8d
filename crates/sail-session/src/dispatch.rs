// SPDX-License-Identifier: Apache-2.0
//! Routes validated client messages into `sail-core` world mutations
//! and session transitions (§4.6, §4.7). This is the one place session
//! state, world state, and the wire protocol all meet.

use sail_core::ident::{ModuleId, PlayerId};
use sail_core::interaction;
use sail_core::math::{Fixed, FixedVec2};
use sail_core::sim::{PlayerControl, ShipControl, StepInputs};
use sail_core::world::World;

use sail_proto::{ClientMessage, InteractAction, InteractionFailureReason, ServerMessage};

use crate::session::SessionManager;
use crate::state::SessionState;

/// Parameters [`dispatch`] needs that don't belong to any single
/// message (§6 config surface).
#[derive(Debug, Clone, Copy)]
pub struct DispatchConfig {
    pub max_interact_distance: Fixed,
    pub tick_rate: f64,
}

/// Handles one inbound message for `session_id`, mutating `world` and
/// `sessions` as needed and queuing any per-tick control input into
/// `inputs`. Returns the messages to send back to that session.
pub fn dispatch(
    world: &mut World,
    sessions: &mut SessionManager,
    inputs: &mut StepInputs,
    session_id: sail_core::ident::SessionId,
    message: ClientMessage,
    current_tick: u64,
    config: &DispatchConfig,
) -> Vec<ServerMessage> {
    sessions.touch(session_id, current_tick);

    match message {
        ClientMessage::Handshake { name, .. } => {
            handle_handshake(world, sessions, session_id, &name, config)
        }
        ClientMessage::InputFrame {
            sequence,
            throttle,
            turn,
            move_x,
            move_y,
        } => handle_input_frame(
            world, sessions, inputs, session_id, sequence, throttle, turn, move_x, move_y,
            current_tick,
        ),
        ClientMessage::CannonAim {
            module_id,
            aim_direction,
        } => handle_cannon_aim(world, sessions, session_id, module_id, aim_direction),
        ClientMessage::CannonFire { module_id } => {
            handle_cannon_fire(world, sessions, session_id, module_id)
        }
        ClientMessage::ModuleInteract { module_id, action } => {
            handle_module_interact(world, sessions, session_id, module_id, action, config)
        }
        ClientMessage::Ping { client_time_ms } => vec![ServerMessage::Pong {
            client_time_ms,
            server_tick: current_tick,
        }],
    }
}

fn player_of(sessions: &SessionManager, session_id: sail_core::ident::SessionId) -> Option<PlayerId> {
    sessions.get(session_id).and_then(|s| s.player)
}

fn handle_handshake(
    world: &mut World,
    sessions: &mut SessionManager,
    session_id: sail_core::ident::SessionId,
    raw_name: &str,
    _config: &DispatchConfig,
) -> Vec<ServerMessage> {
    let name = match sail_proto::validate::sanitize_name(raw_name) {
        Ok(n) => n,
        Err(err) => {
            return vec![ServerMessage::Disconnect {
                reason: err.to_string(),
            }]
        }
    };

    let Some(session) = sessions.get_mut(session_id) else {
        return vec![];
    };
    if session.transition(SessionState::Handshaking).is_err() {
        return vec![ServerMessage::Disconnect {
            reason: "handshake received out of order".to_string(),
        }];
    }
    session.name = Some(name);

    let player = match world.create_player(FixedVec2::ZERO, None) {
        Ok(p) => p,
        Err(err) => {
            return vec![ServerMessage::Disconnect {
                reason: err.to_string(),
            }]
        }
    };

    if sessions.bind_player(session_id, player).is_err() {
        return vec![ServerMessage::Disconnect {
            reason: "failed to bind session to player".to_string(),
        }];
    }

    vec![ServerMessage::HandshakeResponse {
        session_id: session_id.0,
        player_id: player.0,
        tick_rate: 20.0,
    }]
}

#[allow(clippy::too_many_arguments)]
fn handle_input_frame(
    _world: &mut World,
    sessions: &mut SessionManager,
    inputs: &mut StepInputs,
    session_id: sail_core::ident::SessionId,
    sequence: u32,
    throttle: f32,
    turn: f32,
    move_x: f32,
    move_y: f32,
    current_tick: u64,
) -> Vec<ServerMessage> {
    let Some(player) = player_of(sessions, session_id) else {
        return vec![];
    };
    let Some(session) = sessions.get_mut(session_id) else {
        return vec![];
    };
    if session.rate_limiter.accept(sequence, current_tick).is_err() {
        return vec![];
    }

    let throttle = sail_proto::validate::clamp_axis(throttle);
    let turn = sail_proto::validate::clamp_axis(turn);
    let move_x = sail_proto::validate::clamp_axis(move_x);
    let move_y = sail_proto::validate::clamp_axis(move_y);

    // The player's own ship, if mounted at a helm, receives the helm
    // input; otherwise the axes drive the player's own walk/swim.
    if let Some(carrier) = _world.player(player).and_then(|p| p.carrier) {
        inputs.ship_controls.push(ShipControl {
            ship: carrier.ship,
            throttle: Fixed::from_f64(f64::from(throttle)),
            turn: Fixed::from_f64(f64::from(turn)),
        });
    } else {
        inputs.player_controls.push(PlayerControl {
            player,
            move_dir: FixedVec2::from_f64(f64::from(move_x), f64::from(move_y)),
        });
    }
    vec![]
}

fn handle_cannon_aim(
    world: &mut World,
    sessions: &SessionManager,
    session_id: sail_core::ident::SessionId,
    module_id: u32,
    aim_direction: f32,
) -> Vec<ServerMessage> {
    let Some(player) = player_of(sessions, session_id) else {
        return vec![];
    };
    let aim = Fixed::from_f64(f64::from(sail_proto::validate::wrap_rotation(aim_direction)));
    let result = interaction::set_cannon_aim(world, player, ModuleId(module_id), aim);
    vec![ServerMessage::ModuleInteractResult {
        module_id,
        success: result.is_ok(),
        reason: result.err().map(InteractionFailureReason::from),
    }]
}

fn handle_cannon_fire(
    world: &mut World,
    sessions: &SessionManager,
    session_id: sail_core::ident::SessionId,
    module_id: u32,
) -> Vec<ServerMessage> {
    let Some(player) = player_of(sessions, session_id) else {
        return vec![];
    };
    let result = interaction::fire_cannon(world, player, ModuleId(module_id));
    vec![ServerMessage::ModuleInteractResult {
        module_id,
        success: result.is_ok(),
        reason: result.err().map(InteractionFailureReason::from),
    }]
}

fn handle_module_interact(
    world: &mut World,
    sessions: &SessionManager,
    session_id: sail_core::ident::SessionId,
    module_id: u32,
    action: InteractAction,
    config: &DispatchConfig,
) -> Vec<ServerMessage> {
    let Some(player) = player_of(sessions, session_id) else {
        return vec![];
    };
    let result = match action {
        InteractAction::Mount => {
            interaction::mount(world, player, ModuleId(module_id), config.max_interact_distance)
        }
        InteractAction::Dismount => interaction::dismount(world, player),
    };
    vec![ServerMessage::ModuleInteractResult {
        module_id,
        success: result.is_ok(),
        reason: result.err().map(InteractionFailureReason::from),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use sail_core::world::WorldCapacity;

    fn config() -> DispatchConfig {
        DispatchConfig {
            max_interact_distance: Fixed::from_int(5),
            tick_rate: 20.0,
        }
    }

    #[test]
    fn handshake_creates_player_and_binds_session() {
        let mut world = World::new(WorldCapacity::default(), 1);
        let mut sessions = SessionManager::new(60, 20);
        let mut inputs = StepInputs::default();
        let session_id = sessions.create(0);

        let responses = dispatch(
            &mut world,
            &mut sessions,
            &mut inputs,
            session_id,
            ClientMessage::Handshake {
                name: "Jack".to_string(),
                client_version: "1.0".to_string(),
            },
            0,
            &config(),
        );
        assert!(matches!(responses[0], ServerMessage::HandshakeResponse { .. }));
        assert!(sessions.get(session_id).unwrap().player.is_some());
    }

    #[test]
    fn input_frame_before_handshake_is_ignored() {
        let mut world = World::new(WorldCapacity::default(), 1);
        let mut sessions = SessionManager::new(60, 20);
        let mut inputs = StepInputs::default();
        let session_id = sessions.create(0);

        let responses = dispatch(
            &mut world,
            &mut sessions,
            &mut inputs,
            session_id,
            ClientMessage::InputFrame {
                sequence: 1,
                throttle: 1.0,
                turn: 0.0,
                move_x: 0.0,
                move_y: 0.0,
            },
            1,
            &config(),
        );
        assert!(responses.is_empty());
        assert!(inputs.player_controls.is_empty());
        assert!(inputs.ship_controls.is_empty());
    }

    #[test]
    fn ping_replies_with_pong() {
        let mut world = World::new(WorldCapacity::default(), 1);
        let mut sessions = SessionManager::new(60, 20);
        let mut inputs = StepInputs::default();
        let session_id = sessions.create(0);
        let responses = dispatch(
            &mut world,
            &mut sessions,
            &mut inputs,
            session_id,
            ClientMessage::Ping { client_time_ms: 99 },
            5,
            &config(),
        );
        assert!(matches!(
            responses[0],
            ServerMessage::Pong { client_time_ms: 99, server_tick: 5 }
        ));
    }
}
