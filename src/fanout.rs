//! Delivery: room broadcast, global broadcast, catalogue payloads, and
//! private messages. These are plain functions over the two registries
//! rather than methods on either one — broadcasting only ever needs a *read*
//! of membership/client tables, never the cross-table mutation that
//! [`crate::broker`] handles, so no lock-ordering concern arises here.

use itertools::Itertools;

use crate::handle::ClientId;
use crate::registry::{ClientRegistry, RoomRegistry};

/// Delivers `payload` to every member of `room`, optionally skipping one
/// handle. Missing rooms deliver to nobody.
pub fn room_broadcast(
    rooms: &RoomRegistry,
    clients: &ClientRegistry,
    room: &str,
    payload: &str,
    exclude: Option<ClientId>,
) {
    let Some(members) = rooms.members(room) else {
        return;
    };
    for member in members {
        if Some(member) == exclude {
            continue;
        }
        clients.send_to(member, payload);
    }
}

pub fn global_broadcast(clients: &ClientRegistry, payload: &str, exclude: Option<ClientId>) {
    clients.broadcast_all(payload, exclude);
}

/// Builds the `ROOMS|<name>|<state>|...` catalogue line. An empty registry
/// (never happens, since Lobby always exists) would render as `ROOMS|`.
pub fn catalogue_payload(rooms: &RoomRegistry) -> String {
    let body = rooms
        .snapshot_list()
        .into_iter()
        .map(|(name, locked)| format!("{name}|{}", if locked { "locked" } else { "open" }))
        .join("|");
    format!("ROOMS|{body}")
}

pub fn push_catalogue_to_all(rooms: &RoomRegistry, clients: &ClientRegistry) {
    let payload = catalogue_payload(rooms);
    clients.broadcast_all(&payload, None);
}

pub fn push_catalogue_to_one(rooms: &RoomRegistry, clients: &ClientRegistry, handle: ClientId) {
    let payload = catalogue_payload(rooms);
    clients.send_to(handle, &payload);
}

/// Looks up `target_name`; on a hit, delivers the formatted private line to
/// both parties and returns `true`. On a miss, sends nothing (the dispatcher
/// is responsible for the "User not found" system reply, since that reply's
/// exact wording echoes the requested name back to the sender).
pub fn deliver_private(
    clients: &ClientRegistry,
    sender: ClientId,
    sender_name: &str,
    target_name: &str,
    text: &str,
) -> bool {
    let Some(target) = clients.find_by_name(target_name) else {
        return false;
    };
    let payload = format!("[private] {sender_name}: {text}");
    clients.send_to(target, &payload);
    clients.send_to(sender, &payload);
    true
}
