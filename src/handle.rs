//! Connection handle and outbound channel types shared across the registries,
//! the dispatcher, and the session loop.
//!
//! Grounded in `shroom-net`'s `server::ClientId`/`SharedConnHandle<Msg>` split:
//! a cheap, copyable identity plus a cloneable sender used to reach that
//! connection's outbound queue from anywhere holding a registry lock.

use tokio::sync::mpsc;

/// Opaque, per-process-unique identifier for one live connection.
pub type ClientId = u64;

/// Sentinel used for system-owned rooms that have no client owner (the
/// Lobby). No real `ClientId` is ever equal to this, since IDs start at 1.
pub const NO_OWNER: ClientId = 0;

/// Bounded outbound queue per connection: large enough to absorb a burst of
/// fan-out without a dedicated writer task falling behind, small enough that
/// a peer which stops reading gets dropped instead of growing unbounded.
pub const OUTBOUND_CAP: usize = 256;

/// A connection's identity plus a cloneable handle onto its outbound queue.
/// Registries hand these out so that any caller holding a registry lock can
/// reach a connection's writer task without touching the socket directly.
#[derive(Debug, Clone)]
pub struct OutboundHandle {
    pub id: ClientId,
    pub tx: mpsc::Sender<String>,
}

impl OutboundHandle {
    /// Non-blocking delivery. `false` means the peer is dead (channel closed)
    /// or saturated (channel full) — either way the caller must not block and
    /// must not itself mutate the registries; the owning session's own recv
    /// path is responsible for eventually noticing and tearing the
    /// connection down.
    pub fn send(&self, line: impl Into<String>) -> bool {
        self.tx.try_send(line.into()).is_ok()
    }
}
