//! The broker context: both registries and the event log, passed by
//! reference into every session task rather than kept as globals.
//!
//! The cross-table operations below are where the lock-ordering rule
//! actually matters: each one locks the room registry (via `RoomRegistry`'s
//! own internal mutex) to verify-and-mutate membership, *then* locks the
//! client registry to update `current_room` — never the reverse, and never
//! both held at once, since `RoomRegistry`/`ClientRegistry` each fully
//! release their lock before returning from a call.

use crate::event_log::EventLog;
use crate::handle::ClientId;
use crate::registry::room::DeleteOutcome as RoomDeleteOutcome;
use crate::registry::{ClientRegistry, RoomRegistry, LOBBY};

pub struct BrokerState {
    pub clients: ClientRegistry,
    pub rooms: RoomRegistry,
    pub log: EventLog,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ChangeRoomOutcome {
    Joined { from: String, to: String },
    AlreadyThere,
    Unavailable,
}

#[derive(Debug, PartialEq, Eq)]
pub enum CreateRoomOutcome {
    Created { from: String, to: String },
    AlreadyExists,
}

#[derive(Debug, PartialEq, Eq)]
pub enum DeleteRoomOutcome {
    Deleted { migrated: Vec<ClientId> },
    NotFound,
    NotOwner,
    IsLobby,
}

impl BrokerState {
    pub fn new(log: EventLog) -> Self {
        Self {
            clients: ClientRegistry::new(),
            rooms: RoomRegistry::new(),
            log,
        }
    }

    /// Registers a brand new connection and seats it in the Lobby. Returns
    /// the assigned placeholder name.
    pub fn enter(&self, handle: ClientId, tx: tokio::sync::mpsc::Sender<String>) -> String {
        let name = self.clients.register(handle, tx);
        self.rooms.join(handle, LOBBY, "");
        name
    }

    /// Removes a connection from whatever room it's in and from the client
    /// registry. Used once per session at teardown.
    pub fn leave_for_good(&self, handle: ClientId) -> Option<(String, String)> {
        let (name, room) = self.clients.unregister(handle)?;
        self.rooms.leave(handle, &room);
        Some((name, room))
    }

    /// Implements the atomic room-change sequence: verify-and-add to the
    /// target, then remove from the source, then update the client record.
    /// The left/joined broadcasts and the `ROOM|` push are the dispatcher's
    /// job, since they need the client's display name, not just its handle.
    ///
    /// `/join X` while already in X is a no-op, but the password is still
    /// checked first: a wrong password against the current room is still
    /// rejected even though no actual move would occur.
    pub fn change_room(&self, handle: ClientId, target: &str, password: &str) -> ChangeRoomOutcome {
        let Some(snapshot) = self.clients.get(handle) else {
            return ChangeRoomOutcome::Unavailable;
        };
        let from = snapshot.room;

        if !self.rooms.join(handle, target, password) {
            return ChangeRoomOutcome::Unavailable;
        }

        if from == target {
            return ChangeRoomOutcome::AlreadyThere;
        }

        self.rooms.leave(handle, &from);
        self.clients.set_room(handle, target);

        ChangeRoomOutcome::Joined {
            from,
            to: target.to_string(),
        }
    }

    /// `/create`: atomically creates the room owned by `handle`, then runs
    /// the same join sequence as [`Self::change_room`].
    pub fn create_and_join(
        &self,
        handle: ClientId,
        name: &str,
        password: Option<String>,
    ) -> CreateRoomOutcome {
        let from = self
            .clients
            .get(handle)
            .map(|s| s.room)
            .unwrap_or_else(|| LOBBY.to_string());

        if !self.rooms.create(name, password.clone(), handle) {
            return CreateRoomOutcome::AlreadyExists;
        }

        let join_password = password.unwrap_or_default();
        self.rooms.join(handle, name, &join_password);
        if from != name {
            self.rooms.leave(handle, &from);
        }
        self.clients.set_room(handle, name);

        CreateRoomOutcome::Created {
            from,
            to: name.to_string(),
        }
    }

    /// `/delete`: owner-only, Lobby-forbidden, migrates survivors to the
    /// Lobby.
    pub fn delete_room(&self, name: &str, requester: ClientId) -> DeleteRoomOutcome {
        match self.rooms.delete(name, requester) {
            RoomDeleteOutcome::IsLobby => DeleteRoomOutcome::IsLobby,
            RoomDeleteOutcome::NotFound => DeleteRoomOutcome::NotFound,
            RoomDeleteOutcome::NotOwner => DeleteRoomOutcome::NotOwner,
            RoomDeleteOutcome::Ok(members) => {
                let migrated: Vec<ClientId> = members.into_iter().collect();
                for &member in &migrated {
                    self.rooms.join(member, LOBBY, "");
                    self.clients.set_room(member, LOBBY);
                }
                DeleteRoomOutcome::Deleted { migrated }
            }
        }
    }
}
