//! Per-connection task: the state machine CONNECTING → ACTIVE → CLOSING →
//! CLOSED, built around a `tokio::select!` merging framed input with the
//! connection's own outbound queue, grounded in `shroom-net`'s
//! `ServerConnCtx::exec` (`server::server_conn`), minus its tick/ping
//! machinery, which has no counterpart here.

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::Framed;

use crate::broker::BrokerState;
use crate::codec::LineCodec;
use crate::dispatcher;
use crate::fanout;
use crate::handle::{ClientId, OUTBOUND_CAP};
use crate::registry::LOBBY;

/// Runs one connection to completion. Never panics on peer misbehavior —
/// every I/O error just ends this session.
pub async fn run(broker: Arc<BrokerState>, stream: TcpStream, handle: ClientId) {
    let framed = Framed::new(stream, LineCodec);
    let (mut writer, mut reader) = framed.split();

    let (tx, mut rx) = mpsc::channel::<String>(OUTBOUND_CAP);
    let name = enter_active(&broker, handle, tx, &mut writer).await;

    loop {
        tokio::select! {
            line = reader.next() => {
                match line {
                    Some(Ok(text)) => dispatcher::dispatch(&broker, handle, &text),
                    Some(Err(err)) => {
                        log::warn!("session {handle} ({name}): framing error: {err}");
                        break;
                    }
                    None => break,
                }
            }
            outgoing = rx.recv() => {
                match outgoing {
                    Some(payload) => {
                        if writer.send(payload).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    close(&broker, handle).await;
}

/// ACTIVE entry: register, join Lobby, send `ROOM|Lobby`, send the
/// catalogue, send the welcome lines, broadcast the catalogue to everyone,
/// log the join.
async fn enter_active(
    broker: &BrokerState,
    handle: ClientId,
    tx: mpsc::Sender<String>,
    writer: &mut (impl futures::Sink<String, Error = crate::codec::LineCodecError> + Unpin),
) -> String {
    let name = broker.enter(handle, tx);

    let _ = writer.send(format!("ROOM|{LOBBY}")).await;
    let _ = writer
        .send(fanout::catalogue_payload(&broker.rooms))
        .await;
    let _ = writer
        .send("[system] Welcome! Set your name with /name <nickname>.".to_string())
        .await;
    let _ = writer
        .send("[system] Use /msg <user> <message> for private chats.".to_string())
        .await;
    let _ = writer
        .send("[system] Use /rooms, /create <room> [password], and /join <room> [password] to manage rooms.".to_string())
        .await;

    fanout::push_catalogue_to_all(&broker.rooms, &broker.clients);
    broker.log.record(format!("{name} joined the chat."));

    name
}

/// CLOSING: removes the client from its room and the registry, sends the
/// farewell broadcast, logs departure. The socket itself closes when
/// `writer`/`reader` are dropped on return from [`run`].
async fn close(broker: &BrokerState, handle: ClientId) {
    let Some((name, _room)) = broker.leave_for_good(handle) else {
        return;
    };

    fanout::global_broadcast(
        &broker.clients,
        &format!("[system] {name} left the chat."),
        None,
    );
    broker.log.record(format!("{name} left the chat."));
}
