//! Room registry: name → `{password, owner, members}`.
//!
//! A single `parking_lot::Mutex` wraps a `HashMap<String, RoomRecord>`; each
//! room's member set is an `IndexSet<ClientId>` rather than a plain
//! `HashSet`, so that `members()` returns a deterministic iteration order —
//! the same technique `shroom-net`'s `RoomSet` uses an `IndexMap` for
//! (`server::room::RoomSet`), here applied directly to a mutex-guarded table
//! rather than that crate's per-room actor/channel model: the broker's two
//! registries are plain locked tables with an explicit cross-table
//! lock-ordering rule, not message-passing rooms, so the actor machinery
//! (`mpsc`/`broadcast` channels per room) isn't reused here.

use std::collections::HashMap;

use indexmap::IndexSet;
use parking_lot::Mutex;

use crate::handle::{ClientId, NO_OWNER};

pub const LOBBY: &str = "Lobby";

#[derive(Debug, Clone)]
pub struct RoomRecord {
    pub password: Option<String>,
    pub owner: ClientId,
    pub members: IndexSet<ClientId>,
}

impl RoomRecord {
    fn new(password: Option<String>, owner: ClientId) -> Self {
        Self {
            password,
            owner,
            members: IndexSet::new(),
        }
    }

    pub fn is_locked(&self) -> bool {
        self.password.as_deref().is_some_and(|p| !p.is_empty())
    }
}

pub enum DeleteOutcome {
    Ok(IndexSet<ClientId>),
    NotFound,
    NotOwner,
    IsLobby,
}

pub struct RoomRegistry {
    rooms: Mutex<HashMap<String, RoomRecord>>,
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomRegistry {
    /// Bootstraps the undeletable, passwordless, ownerless Lobby: a room
    /// named `"Lobby"` exists for the entire lifetime of the broker.
    pub fn new() -> Self {
        let mut rooms = HashMap::new();
        rooms.insert(LOBBY.to_string(), RoomRecord::new(None, NO_OWNER));
        Self {
            rooms: Mutex::new(rooms),
        }
    }

    /// Fails if the name already exists; otherwise inserts an empty room.
    pub fn create(&self, name: &str, password: Option<String>, owner: ClientId) -> bool {
        let mut rooms = self.rooms.lock();
        if rooms.contains_key(name) {
            return false;
        }
        rooms.insert(name.to_string(), RoomRecord::new(password, owner));
        true
    }

    /// Fails if the room is missing, or if it's locked and `password` doesn't
    /// match exactly (an empty supplied password fails against a locked
    /// room). Otherwise adds `handle` to the member set.
    pub fn join(&self, handle: ClientId, name: &str, password: &str) -> bool {
        let mut rooms = self.rooms.lock();
        let Some(room) = rooms.get_mut(name) else {
            return false;
        };
        if room.is_locked() && room.password.as_deref() != Some(password) {
            return false;
        }
        room.members.insert(handle);
        true
    }

    /// No-op if the room is missing.
    pub fn leave(&self, handle: ClientId, name: &str) {
        let mut rooms = self.rooms.lock();
        if let Some(room) = rooms.get_mut(name) {
            room.members.shift_remove(&handle);
        }
    }

    /// The Lobby is undeletable; non-owners are rejected. On success, removes
    /// the room and returns a snapshot of its former member set.
    pub fn delete(&self, name: &str, requester: ClientId) -> DeleteOutcome {
        if name == LOBBY {
            return DeleteOutcome::IsLobby;
        }

        let mut rooms = self.rooms.lock();
        let Some(room) = rooms.get(name) else {
            return DeleteOutcome::NotFound;
        };
        if room.owner != requester {
            return DeleteOutcome::NotOwner;
        }

        let room = rooms.remove(name).expect("checked present above");
        DeleteOutcome::Ok(room.members)
    }

    /// `(name, locked?)` pairs for every live room, used for the `ROOMS|`
    /// catalogue. Iteration order follows the underlying `HashMap` and isn't
    /// meaningful beyond "Lobby is always present somewhere in the list".
    pub fn snapshot_list(&self) -> Vec<(String, bool)> {
        let rooms = self.rooms.lock();
        rooms
            .iter()
            .map(|(name, room)| (name.clone(), room.is_locked()))
            .collect()
    }

    pub fn members(&self, name: &str) -> Option<IndexSet<ClientId>> {
        self.rooms.lock().get(name).map(|r| r.members.clone())
    }

    pub fn exists(&self, name: &str) -> bool {
        self.rooms.lock().contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lobby_exists_from_the_start_and_cannot_be_deleted() {
        let rooms = RoomRegistry::new();
        assert!(rooms.exists(LOBBY));
        assert!(matches!(rooms.delete(LOBBY, 1), DeleteOutcome::IsLobby));
    }

    #[test]
    fn create_rejects_duplicate_names() {
        let rooms = RoomRegistry::new();
        assert!(rooms.create("chess", None, 1));
        assert!(!rooms.create("chess", None, 2));
    }

    #[test]
    fn join_enforces_exact_password_match() {
        let rooms = RoomRegistry::new();
        rooms.create("chess", Some("secret".to_string()), 1);

        assert!(!rooms.join(2, "chess", ""));
        assert!(!rooms.join(2, "chess", "wrong"));
        assert!(rooms.join(2, "chess", "secret"));
        assert!(rooms.members("chess").unwrap().contains(&2));
    }

    #[test]
    fn open_room_joins_with_any_password_including_empty() {
        let rooms = RoomRegistry::new();
        rooms.create("lounge", None, 1);
        assert!(rooms.join(2, "lounge", ""));
    }

    #[test]
    fn delete_is_owner_only() {
        let rooms = RoomRegistry::new();
        rooms.create("chess", None, 1);
        rooms.join(2, "chess", "");

        assert!(matches!(rooms.delete("chess", 2), DeleteOutcome::NotOwner));
        match rooms.delete("chess", 1) {
            DeleteOutcome::Ok(members) => {
                assert!(members.contains(&1));
                assert!(members.contains(&2));
            }
            _ => panic!("expected Ok"),
        }
        assert!(!rooms.exists("chess"));
    }

    #[test]
    fn delete_missing_room_is_not_found() {
        let rooms = RoomRegistry::new();
        assert!(matches!(rooms.delete("ghost", 1), DeleteOutcome::NotFound));
    }

    #[test]
    fn snapshot_list_reports_locked_state() {
        let rooms = RoomRegistry::new();
        rooms.create("chess", Some("secret".to_string()), 1);
        let list = rooms.snapshot_list();
        assert!(list.contains(&(LOBBY.to_string(), false)));
        assert!(list.contains(&("chess".to_string(), true)));
    }
}
