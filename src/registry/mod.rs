//! The two shared tables every connection task touches: who's connected
//! (`client`) and what rooms exist (`room`). Kept as sibling modules rather
//! than one struct so each can be locked, tested, and reasoned about on its
//! own; the lock-ordering rule ("room registry, then client registry") is
//! enforced by the call sequence in [`crate::broker`], not by nesting one
//! mutex inside the other.

pub mod client;
pub mod room;

pub use client::{ClientRegistry, ClientSnapshot, RenameOutcome};
pub use room::{DeleteOutcome, RoomRegistry, LOBBY};
