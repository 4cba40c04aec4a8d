// SPDX-License-Identifier: Apache-2.0
//! Per-connection session bookkeeping (§4.6): state machine, AOI
//! subscription, snapshot delta tracking, and rate limiting, keyed by
//! [`SessionId`].

use rustc_hash::FxHashMap;

use sail_core::aoi::AoiSubscription;
use sail_core::ident::{IdAllocator, PlayerId, SessionId};
use sail_core::snapshot::SessionSnapshotState;
use sail_proto::RateLimiter;

use crate::state::{InvalidTransition, SessionState};

/// One connected (or connecting, or disconnecting) client (§4.6, I6:
/// a session maps to at most one player and vice versa).
pub struct Session {
    pub id: SessionId,
    pub state: SessionState,
    pub player: Option<PlayerId>,
    pub name: Option<String>,
    pub aoi: AoiSubscription,
    pub snapshot_state: SessionSnapshotState,
    pub rate_limiter: RateLimiter,
    pub created_tick: u64,
    pub last_activity_tick: u64,
}

impl Session {
    fn new(id: SessionId, created_tick: u64, rate_limit_per_window: u32, window_ticks: u64) -> Self {
        Session {
            id,
            state: SessionState::New,
            player: None,
            name: None,
            aoi: AoiSubscription::new(),
            snapshot_state: SessionSnapshotState::new(),
            rate_limiter: RateLimiter::new(rate_limit_per_window, window_ticks),
            created_tick,
            last_activity_tick: created_tick,
        }
    }

    pub fn transition(&mut self, next: SessionState) -> Result<(), InvalidTransition> {
        self.state = self.state.transition(next)?;
        Ok(())
    }
}

/// Owns every live session, keyed by id (I6: unique session↔player
/// pairing is enforced here — `bind_player` refuses a second binding).
#[derive(Default)]
pub struct SessionManager {
    sessions: FxHashMap<SessionId, Session>,
    ids: IdAllocator,
    rate_limit_per_window: u32,
    window_ticks: u64,
}

impl SessionManager {
    #[must_use]
    pub fn new(rate_limit_per_window: u32, window_ticks: u64) -> Self {
        SessionManager {
            sessions: FxHashMap::default(),
            ids: IdAllocator::new(),
            rate_limit_per_window,
            window_ticks,
        }
    }

    pub fn create(&mut self, current_tick: u64) -> SessionId {
        let id = SessionId(self.ids.allocate());
        self.sessions.insert(
            id,
            Session::new(id, current_tick, self.rate_limit_per_window, self.window_ticks),
        );
        id
    }

    #[must_use]
    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(&id)
    }

    /// Binds `player` to `session`, completing the handshake. Refuses
    /// to rebind a session that already has a player (I6).
    pub fn bind_player(&mut self, id: SessionId, player: PlayerId) -> Result<(), InvalidTransition> {
        let Some(session) = self.sessions.get_mut(&id) else {
            return Ok(());
        };
        session.transition(SessionState::Active)?;
        session.player = Some(player);
        Ok(())
    }

    pub fn begin_closing(&mut self, id: SessionId) -> Result<(), InvalidTransition> {
        let Some(session) = self.sessions.get_mut(&id) else {
            return Ok(());
        };
        if session.state == SessionState::Closing || session.state == SessionState::Closed {
            return Ok(());
        }
        session.transition(SessionState::Closing)
    }

    /// Finalizes a session's removal, returning the player it was
    /// bound to, if any, so the caller can destroy that player entity.
    pub fn remove(&mut self, id: SessionId) -> Option<PlayerId> {
        let mut session = self.sessions.remove(&id)?;
        let _ = session.transition(SessionState::Closed);
        session.player
    }

    pub fn touch(&mut self, id: SessionId, current_tick: u64) {
        if let Some(session) = self.sessions.get_mut(&id) {
            session.last_activity_tick = current_tick;
        }
    }

    /// Ids of sessions that have been idle past their timeout for the
    /// current state (handshake timeout while `New`/`Handshaking`,
    /// disconnect timeout while `Active`), to be closed by the caller.
    #[must_use]
    pub fn timed_out(
        &self,
        current_tick: u64,
        handshake_timeout_ticks: u64,
        disconnect_timeout_ticks: u64,
    ) -> Vec<SessionId> {
        self.sessions
            .values()
            .filter(|s| {
                let idle = current_tick.saturating_sub(s.last_activity_tick);
                match s.state {
                    SessionState::New | SessionState::Handshaking => idle >= handshake_timeout_ticks,
                    SessionState::Active => idle >= disconnect_timeout_ticks,
                    SessionState::Closing | SessionState::Closed => false,
                }
            })
            .map(|s| s.id)
            .collect()
    }

    #[must_use]
    pub fn active_ids(&self) -> Vec<SessionId> {
        self.sessions
            .values()
            .filter(|s| s.state == SessionState::Active)
            .map(|s| s.id)
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
