//! Append-only event log — one line per chat-visible event.
//!
//! Mirrors `log_message`/`log_file` from the reference `server.cpp`: a single
//! `std::fs::File` guarded by its own mutex (distinct from the `log` facade
//! used for operational diagnostics), flushed after every write, never read
//! back.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::Local;
use parking_lot::Mutex;

use crate::error::BrokerResult;

pub struct EventLog {
    file: Mutex<File>,
}

impl EventLog {
    pub fn open(path: impl AsRef<Path>) -> BrokerResult<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends `[YYYY-MM-DD HH:MM:SS] <event>\n` to the log file.
    pub fn record(&self, event: impl AsRef<str>) {
        let line = format!(
            "[{}] {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            event.as_ref()
        );
        let mut file = self.file.lock();
        if let Err(err) = file.write_all(line.as_bytes()) {
            log::warn!("event log write failed: {err}");
            return;
        }
        let _ = file.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_timestamped_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.log");

        let log = EventLog::open(&path).unwrap();
        log.record("alice joined the chat.");
        log.record("alice: hello");

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("alice joined the chat."));
        assert!(lines[0].starts_with('['));
        assert!(lines[1].ends_with("alice: hello"));
    }

    #[test]
    fn reopen_appends_rather_than_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.log");

        EventLog::open(&path).unwrap().record("first");
        EventLog::open(&path).unwrap().record("second");

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}
