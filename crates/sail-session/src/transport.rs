// SPDX-License-Identifier: Apache-2.0
//! Shared plumbing between the WebSocket and UDP gateways: each owns
//! its own wire format, but both register a connection with the tick
//! thread the same way and drain their outbox the same way.

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use sail_core::ident::SessionId;
use sail_proto::ClientMessage;

use crate::scheduler::{InboundEvent, Outbound, SessionHandle};

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("tick thread did not respond to the connect handshake")]
    NoReply,
}

/// The two channel ends a gateway needs to drive one connection after
/// it has registered with the tick thread: where to send inbound
/// events, and where outbound messages for this session arrive.
pub struct ConnectionChannels {
    pub session_id: SessionId,
    pub outbound: mpsc::Receiver<Outbound>,
}

/// Registers a new connection with the tick thread and waits for its
/// assigned session id. `outbox_capacity` bounds how many unsent
/// outbound messages this session may queue before the tick thread
/// starts dropping them.
pub async fn register(
    handle: &SessionHandle,
    outbox_capacity: usize,
) -> Result<ConnectionChannels, RegisterError> {
    let (outbox_tx, outbox_rx) = mpsc::channel(outbox_capacity);
    let (reply_tx, reply_rx) = oneshot::channel();
    handle
        .send(InboundEvent::Connect {
            outbox: outbox_tx,
            reply: reply_tx,
        })
        .await;
    let session_id = reply_rx.await.map_err(|_| RegisterError::NoReply)?;
    Ok(ConnectionChannels {
        session_id,
        outbound: outbox_rx,
    })
}

/// Forwards one decoded client message to the tick thread.
pub async fn forward_message(handle: &SessionHandle, session_id: SessionId, message: ClientMessage) {
    handle
        .send(InboundEvent::Message { session_id, message })
        .await;
}

/// Tells the tick thread this connection is gone.
pub async fn forward_disconnect(handle: &SessionHandle, session_id: SessionId) {
    handle.send(InboundEvent::Disconnect { session_id }).await;
}
