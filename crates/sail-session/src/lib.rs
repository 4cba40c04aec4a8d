// SPDX-License-Identifier: Apache-2.0
//! Session state machine, the fixed-timestep tick scheduler, and the
//! transport-agnostic plumbing both network gateways sit on top of.

pub mod dispatch;
pub mod scheduler;
pub mod session;
pub mod state;
pub mod transport;

pub use dispatch::{dispatch, DispatchConfig};
pub use scheduler::{InboundEvent, Outbound, SessionHandle, TickScheduler};
pub use session::{Session, SessionManager};
pub use state::{InvalidTransition, SessionState};
pub use transport::{register, ConnectionChannels, RegisterError};
