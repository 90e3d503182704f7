//! Client registry: handle → `{name, current_room}`, name-unique.
//!
//! A single `parking_lot::Mutex` wraps an `IndexMap` keyed by handle, grounded
//! in `shroom-net`'s `server::session_set::SessionSet` (itself an
//! `IndexMap<ClientId, _>` with `broadcast`/`send_to` helpers) — generalized
//! here to also own the name-uniqueness index so rename and lookup share one
//! critical section: the find-by-name used by `/msg` and the uniqueness
//! check in `/name` must see a consistent snapshot of the same table.

use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::handle::{ClientId, OutboundHandle};

pub const LOBBY: &str = "Lobby";

#[derive(Debug, Clone)]
pub struct ClientRecord {
    pub name: String,
    pub room: String,
    pub outbound: OutboundHandle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSnapshot {
    pub name: String,
    pub room: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum RenameOutcome {
    Renamed { old_name: String },
    Empty,
    Duplicate,
    NotFound,
}

struct Inner {
    clients: IndexMap<ClientId, ClientRecord>,
    names: std::collections::HashMap<String, ClientId>,
}

pub struct ClientRegistry {
    inner: Mutex<Inner>,
    next_anon: AtomicU64,
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                clients: IndexMap::new(),
                names: std::collections::HashMap::new(),
            }),
            next_anon: AtomicU64::new(1),
        }
    }

    /// Inserts a new record with a placeholder `anon<N>` name and
    /// `current_room = "Lobby"`. `N` is strictly increasing for the broker's
    /// lifetime.
    pub fn register(&self, handle: ClientId, tx: tokio::sync::mpsc::Sender<String>) -> String {
        let n = self.next_anon.fetch_add(1, Ordering::Relaxed);
        let name = format!("anon{n}");

        let mut inner = self.inner.lock();
        inner.names.insert(name.clone(), handle);
        inner.clients.insert(
            handle,
            ClientRecord {
                name: name.clone(),
                room: LOBBY.to_string(),
                outbound: OutboundHandle { id: handle, tx },
            },
        );
        name
    }

    /// Removes and returns `(name, room)`. Used once per session at teardown.
    pub fn unregister(&self, handle: ClientId) -> Option<(String, String)> {
        let mut inner = self.inner.lock();
        let record = inner.clients.shift_remove(&handle)?;
        inner.names.remove(&record.name);
        Some((record.name, record.room))
    }

    /// Rejects empty names and names already in use by another live client;
    /// otherwise replaces the name in a single critical section.
    pub fn rename(&self, handle: ClientId, new_name: &str) -> RenameOutcome {
        if new_name.is_empty() {
            return RenameOutcome::Empty;
        }

        let mut inner = self.inner.lock();
        if !inner.clients.contains_key(&handle) {
            return RenameOutcome::NotFound;
        }
        if inner.names.contains_key(new_name) {
            return RenameOutcome::Duplicate;
        }

        let old_name = inner.clients[&handle].name.clone();
        inner.names.remove(&old_name);
        inner.names.insert(new_name.to_string(), handle);
        inner.clients[&handle].name = new_name.to_string();

        RenameOutcome::Renamed { old_name }
    }

    pub fn get(&self, handle: ClientId) -> Option<ClientSnapshot> {
        let inner = self.inner.lock();
        inner.clients.get(&handle).map(|r| ClientSnapshot {
            name: r.name.clone(),
            room: r.room.clone(),
        })
    }

    pub fn find_by_name(&self, name: &str) -> Option<ClientId> {
        self.inner.lock().names.get(name).copied()
    }

    /// Updates the current-room field only. The caller is responsible for
    /// also updating room membership atomically.
    pub fn set_room(&self, handle: ClientId, room_name: &str) -> bool {
        let mut inner = self.inner.lock();
        match inner.clients.get_mut(&handle) {
            Some(record) => {
                record.room = room_name.to_string();
                true
            }
            None => false,
        }
    }

    /// Non-blocking delivery to one client. `false` means the peer is dead or
    /// its outbound queue is saturated; the caller must not mutate the
    /// registry in response to that — the owning session's own recv path
    /// notices and tears the connection down.
    pub fn send_to(&self, handle: ClientId, payload: &str) -> bool {
        let inner = self.inner.lock();
        match inner.clients.get(&handle) {
            Some(record) => record.outbound.send(payload.to_string()),
            None => false,
        }
    }

    /// Delivers `payload` to every live client, optionally skipping one
    /// handle.
    pub fn broadcast_all(&self, payload: &str, exclude: Option<ClientId>) {
        let inner = self.inner.lock();
        for (&id, record) in inner.clients.iter() {
            if Some(id) == exclude {
                continue;
            }
            record.outbound.send(payload.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn handle_with_channel() -> (ClientId, tokio::sync::mpsc::Sender<String>) {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        let (tx, _rx) = mpsc::channel(16);
        (NEXT.fetch_add(1, Ordering::Relaxed), tx)
    }

    #[test]
    fn register_assigns_increasing_placeholder_names() {
        let reg = ClientRegistry::new();
        let (h1, tx1) = handle_with_channel();
        let (h2, tx2) = handle_with_channel();
        let n1 = reg.register(h1, tx1);
        let n2 = reg.register(h2, tx2);
        assert_ne!(n1, n2);
        assert_eq!(reg.get(h1).unwrap().room, LOBBY);
    }

    #[test]
    fn rename_rejects_empty_and_duplicate() {
        let reg = ClientRegistry::new();
        let (h1, tx1) = handle_with_channel();
        let (h2, tx2) = handle_with_channel();
        reg.register(h1, tx1);
        reg.register(h2, tx2);

        assert_eq!(reg.rename(h1, ""), RenameOutcome::Empty);

        let taken = reg.get(h2).unwrap().name;
        assert_eq!(reg.rename(h1, &taken), RenameOutcome::Duplicate);

        match reg.rename(h1, "alice") {
            RenameOutcome::Renamed { .. } => {}
            other => panic!("expected Renamed, got {other:?}"),
        }
        assert_eq!(reg.get(h1).unwrap().name, "alice");
        assert_eq!(reg.find_by_name("alice"), Some(h1));
    }

    quickcheck::quickcheck! {
        /// Whatever sequence of register/rename calls runs against the
        /// registry, no two live handles ever end up sharing a name, and
        /// `find_by_name` stays consistent with it.
        fn renames_never_produce_duplicate_names(ops: Vec<(u8, String)>) -> bool {
            let reg = ClientRegistry::new();
            let mut handles: Vec<ClientId> = Vec::new();

            for (slot, proposed) in ops {
                let slot = (slot % 8) as usize;
                if slot >= handles.len() {
                    let (h, tx) = handle_with_channel();
                    reg.register(h, tx);
                    handles.push(h);
                } else {
                    reg.rename(handles[slot], &proposed);
                }
            }

            let mut seen = std::collections::HashSet::new();
            for &h in &handles {
                if let Some(snapshot) = reg.get(h) {
                    if !seen.insert(snapshot.name.clone()) {
                        return false;
                    }
                    if reg.find_by_name(&snapshot.name) != Some(h) {
                        return false;
                    }
                }
            }
            true
        }
    }

    #[test]
    fn unregister_frees_the_name_for_reuse() {
        let reg = ClientRegistry::new();
        let (h1, tx1) = handle_with_channel();
        reg.register(h1, tx1);
        reg.rename(h1, "alice");
        reg.unregister(h1);

        let (h2, tx2) = handle_with_channel();
        reg.register(h2, tx2);
        let old_name = reg.get(h2).unwrap().name;
        assert_eq!(
            reg.rename(h2, "alice"),
            RenameOutcome::Renamed { old_name }
        );
    }
}
