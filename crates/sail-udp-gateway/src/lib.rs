// SPDX-License-Identifier: Apache-2.0
//! UDP transport adapter for native clients. Datagrams are
//! connectionless, so this gateway keeps its own address-to-session
//! map and spawns a writer task per session that drains its outbox
//! back onto the shared socket.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use anyhow::Result;
use rustc_hash::FxHashMap;
use tokio::net::UdpSocket;
use tokio::sync::Mutex;
use tracing::{info, warn};

use sail_core::ident::SessionId;
use sail_proto::udp_frame::{decode_frame, decode_payload, encode_frame, encode_payload, server_frame_type};
use sail_session::{transport, SessionHandle};

const OUTBOX_CAPACITY: usize = 64;
const MAX_DATAGRAM: usize = 2048;

struct Client {
    session_id: SessionId,
    sequence: AtomicU32,
}

/// Binds `listen` and serves native UDP clients until the socket
/// errors. Runs forever otherwise; race against a cancellation signal
/// for graceful shutdown.
pub async fn serve(scheduler: SessionHandle, listen: SocketAddr) -> Result<()> {
    let socket = Arc::new(UdpSocket::bind(listen).await?);
    info!(%listen, "udp gateway listening");

    let clients: Arc<Mutex<FxHashMap<SocketAddr, Arc<Client>>>> =
        Arc::new(Mutex::new(FxHashMap::default()));

    let mut buf = vec![0u8; MAX_DATAGRAM];
    loop {
        let (len, peer) = socket.recv_from(&mut buf).await?;
        handle_datagram(&buf[..len], peer, &socket, &clients, &scheduler).await;
    }
}

async fn handle_datagram(
    datagram: &[u8],
    peer: SocketAddr,
    socket: &Arc<UdpSocket>,
    clients: &Arc<Mutex<FxHashMap<SocketAddr, Arc<Client>>>>,
    handle: &SessionHandle,
) {
    let frame = match decode_frame(datagram) {
        Ok(frame) => frame,
        Err(err) => {
            warn!(?peer, ?err, "dropped malformed udp frame");
            return;
        }
    };
    let decoded = match decode_payload::<sail_proto::ClientMessage>(&frame.payload) {
        Ok(message) => message,
        Err(err) => {
            warn!(?peer, %err, "failed to decode udp payload");
            return;
        }
    };

    let client = {
        let mut guard = clients.lock().await;
        if let Some(client) = guard.get(&peer) {
            client.clone()
        } else {
            let channels = match transport::register(handle, OUTBOX_CAPACITY).await {
                Ok(channels) => channels,
                Err(err) => {
                    warn!(?peer, %err, "failed to register udp connection with tick thread");
                    return;
                }
            };
            let client = Arc::new(Client {
                session_id: channels.session_id,
                sequence: AtomicU32::new(0),
            });
            guard.insert(peer, client.clone());
            spawn_writer(socket.clone(), peer, client.clone(), channels.outbound, clients.clone());
            info!(?peer, session_id = ?client.session_id, "udp client registered");
            client
        }
    };

    transport::forward_message(handle, client.session_id, decoded).await;
}

fn spawn_writer(
    socket: Arc<UdpSocket>,
    peer: SocketAddr,
    client: Arc<Client>,
    mut outbound: tokio::sync::mpsc::Receiver<sail_session::Outbound>,
    clients: Arc<Mutex<FxHashMap<SocketAddr, Arc<Client>>>>,
) {
    tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            let frame_type = server_frame_type(&frame.message);
            let payload = match encode_payload(&frame.message) {
                Ok(payload) => payload,
                Err(err) => {
                    warn!(%err, "failed to encode server message");
                    continue;
                }
            };
            let sequence = client.sequence.fetch_add(1, Ordering::Relaxed);
            let datagram = encode_frame(frame_type, 0, sequence, &payload);
            if socket.send_to(&datagram, peer).await.is_err() {
                break;
            }
        }
        clients.lock().await.remove(&peer);
    });
}
