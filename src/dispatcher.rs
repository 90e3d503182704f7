//! Command parsing and execution. One line in, zero or more `fanout` calls
//! and registry mutations out; the dispatcher never returns an error to its
//! caller — every failure mode is reported to the initiating client as a
//! `[system]` line, and the session continues.

use crate::broker::{BrokerState, ChangeRoomOutcome, CreateRoomOutcome, DeleteRoomOutcome};
use crate::fanout;
use crate::handle::ClientId;
use crate::registry::{RenameOutcome, LOBBY};

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Name(&'a str),
    Msg(&'a str, &'a str),
    Rooms,
    Create(&'a str, Option<&'a str>),
    Join(&'a str, Option<&'a str>),
    Leave,
    Delete(&'a str),
    Unknown(&'a str),
    Chat(&'a str),
}

fn parse(line: &str) -> Command<'_> {
    if !line.starts_with('/') {
        return Command::Chat(line);
    }

    let mut head = line.splitn(2, ' ');
    let cmd = head.next().unwrap_or("");
    let rest = head.next().unwrap_or("").trim();

    match cmd {
        "/name" => Command::Name(rest),
        "/msg" => {
            let mut parts = rest.splitn(2, ' ');
            let user = parts.next().unwrap_or("");
            let text = parts.next().unwrap_or("").trim();
            Command::Msg(user, text)
        }
        "/rooms" => Command::Rooms,
        "/create" => {
            let mut parts = rest.splitn(2, ' ');
            let name = parts.next().unwrap_or("");
            let password = parts.next().map(str::trim).filter(|s| !s.is_empty());
            Command::Create(name, password)
        }
        "/join" => {
            let mut parts = rest.splitn(2, ' ');
            let name = parts.next().unwrap_or("");
            let password = parts.next().map(str::trim).filter(|s| !s.is_empty());
            Command::Join(name, password)
        }
        "/leave" => Command::Leave,
        "/delete" => Command::Delete(rest),
        other => Command::Unknown(other),
    }
}

fn reply_system(broker: &BrokerState, handle: ClientId, text: &str) {
    broker.clients.send_to(handle, &format!("[system] {text}"));
}

/// Runs one line from `handle` to completion. Never blocks on I/O beyond the
/// registries' own non-blocking sends.
pub fn dispatch(broker: &BrokerState, handle: ClientId, line: &str) {
    match parse(line) {
        Command::Name(new_name) => handle_name(broker, handle, new_name),
        Command::Msg(user, text) => handle_msg(broker, handle, user, text),
        Command::Rooms => fanout::push_catalogue_to_one(&broker.rooms, &broker.clients, handle),
        Command::Create(name, password) => handle_create(broker, handle, name, password),
        Command::Join(name, password) => handle_join(broker, handle, name, password),
        Command::Leave => handle_leave(broker, handle),
        Command::Delete(name) => handle_delete(broker, handle, name),
        Command::Unknown(cmd) => reply_system(broker, handle, &format!("Unknown command: {cmd}")),
        Command::Chat(text) => handle_chat(broker, handle, text),
    }
}

fn handle_name(broker: &BrokerState, handle: ClientId, new_name: &str) {
    match broker.clients.rename(handle, new_name) {
        RenameOutcome::Renamed { old_name } => {
            let line = format!("[system] {old_name} is now known as {new_name}.");
            fanout::global_broadcast(&broker.clients, &line, None);
            broker.log.record(format!("rename: {old_name} -> {new_name}"));
        }
        RenameOutcome::Empty => reply_system(broker, handle, "Name cannot be empty."),
        RenameOutcome::Duplicate => reply_system(broker, handle, "Name already in use."),
        RenameOutcome::NotFound => {}
    }
}

fn handle_msg(broker: &BrokerState, handle: ClientId, user: &str, text: &str) {
    if user.is_empty() || text.is_empty() {
        reply_system(broker, handle, "Usage: /msg <user> <message>");
        return;
    }

    let Some(sender) = broker.clients.get(handle) else {
        return;
    };

    if fanout::deliver_private(&broker.clients, handle, &sender.name, user, text) {
        broker
            .log
            .record(format!("private message: {} -> {user}", sender.name));
    } else {
        reply_system(broker, handle, &format!("User not found: {user}"));
    }
}

fn handle_create(broker: &BrokerState, handle: ClientId, name: &str, password: Option<&str>) {
    if name.is_empty() {
        reply_system(broker, handle, "Usage: /create <room> [password]");
        return;
    }

    match broker.create_and_join(handle, name, password.map(str::to_string)) {
        CreateRoomOutcome::Created { to, .. } => {
            fanout::push_catalogue_to_all(&broker.rooms, &broker.clients);
            broker.clients.send_to(handle, &format!("ROOM|{to}"));
            reply_system(broker, handle, &format!("Room created and joined: {to}"));
            broker.log.record(format!("room create: {to}"));
        }
        CreateRoomOutcome::AlreadyExists => reply_system(broker, handle, "Room already exists."),
    }
}

fn handle_join(broker: &BrokerState, handle: ClientId, name: &str, password: Option<&str>) {
    if name.is_empty() {
        reply_system(broker, handle, "Usage: /join <room> [password]");
        return;
    }

    apply_room_change(broker, handle, name, password.unwrap_or(""));
}

fn handle_leave(broker: &BrokerState, handle: ClientId) {
    apply_room_change(broker, handle, LOBBY, "");
}

/// Shared tail of `/join` and `/leave`: both resolve to the same
/// leave-then-join-then-notify sequence, just with a different target.
fn apply_room_change(broker: &BrokerState, handle: ClientId, target: &str, password: &str) {
    match broker.change_room(handle, target, password) {
        ChangeRoomOutcome::Joined { from, to } => {
            let mover_name = broker
                .clients
                .get(handle)
                .map(|s| s.name)
                .unwrap_or_default();

            fanout::room_broadcast(
                &broker.rooms,
                &broker.clients,
                &from,
                &format!("[system] {mover_name} left the room."),
                Some(handle),
            );
            fanout::room_broadcast(
                &broker.rooms,
                &broker.clients,
                &to,
                &format!("[system] {mover_name} joined the room."),
                Some(handle),
            );
            broker.clients.send_to(handle, &format!("ROOM|{to}"));
            broker
                .log
                .record(format!("room change: {mover_name} {from} -> {to}"));
        }
        ChangeRoomOutcome::AlreadyThere => {
            let text = if target == LOBBY {
                "You are already in the Lobby.".to_string()
            } else {
                format!("You are already in {target}.")
            };
            reply_system(broker, handle, &text);
        }
        ChangeRoomOutcome::Unavailable => {
            reply_system(broker, handle, "Unable to join room. Check name or password.");
        }
    }
}

fn handle_delete(broker: &BrokerState, handle: ClientId, name: &str) {
    if name.is_empty() {
        reply_system(broker, handle, "Usage: /delete <room>");
        return;
    }

    match broker.delete_room(name, handle) {
        DeleteRoomOutcome::Deleted { migrated } => {
            for member in migrated {
                broker.clients.send_to(member, &format!("ROOM|{LOBBY}"));
                broker.clients.send_to(
                    member,
                    "[system] Room deleted. You have been moved to Lobby.",
                );
            }
            fanout::push_catalogue_to_all(&broker.rooms, &broker.clients);
            broker.log.record(format!("room delete: {name}"));
        }
        DeleteRoomOutcome::NotFound => {
            reply_system(broker, handle, &format!("Room not found: {name}"))
        }
        DeleteRoomOutcome::NotOwner => {
            reply_system(broker, handle, "Only the room owner can delete it.")
        }
        DeleteRoomOutcome::IsLobby => reply_system(broker, handle, "The Lobby cannot be deleted."),
    }
}

fn handle_chat(broker: &BrokerState, handle: ClientId, text: &str) {
    let Some(sender) = broker.clients.get(handle) else {
        return;
    };

    let line = format!("[{}] {}: {text}", sender.room, sender.name);
    fanout::room_broadcast(&broker.rooms, &broker.clients, &sender.room, &line, None);
    broker
        .log
        .record(format!("room chat: {} in {}", sender.name, sender.room));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_and_chat() {
        assert_eq!(parse("/name alice"), Command::Name("alice"));
        assert_eq!(parse("/msg bob hello there"), Command::Msg("bob", "hello there"));
        assert_eq!(parse("/rooms"), Command::Rooms);
        assert_eq!(parse("/create chess secret"), Command::Create("chess", Some("secret")));
        assert_eq!(parse("/create chess"), Command::Create("chess", None));
        assert_eq!(parse("/join chess secret"), Command::Join("chess", Some("secret")));
        assert_eq!(parse("/leave"), Command::Leave);
        assert_eq!(parse("/delete chess"), Command::Delete("chess"));
        assert_eq!(parse("/xyzzy"), Command::Unknown("/xyzzy"));
        assert_eq!(parse("hello world"), Command::Chat("hello world"));
    }

    #[test]
    fn msg_without_a_message_has_no_trailing_whitespace() {
        assert_eq!(parse("/msg bob"), Command::Msg("bob", ""));
    }
}
