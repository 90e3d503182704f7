use clap::Parser;

use crate::error::{BrokerError, BrokerResult};

const DEFAULT_PORT: u16 = 5555;
const DEFAULT_LOG_PATH: &str = "chat.log";

/// `broker [port] [log_path]` — positional, matching the reference CLI contract.
#[derive(Debug, Parser)]
#[command(name = "chat-broker", about = "Multi-room text chat broker")]
pub struct Cli {
    /// TCP port to listen on.
    port: Option<String>,

    /// Path to the append-only event log.
    log_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub log_path: std::path::PathBuf,
}

impl Cli {
    pub fn into_config(self) -> BrokerResult<Config> {
        let port = match self.port {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| BrokerError::Config(format!("invalid port: {raw}")))?,
            None => DEFAULT_PORT,
        };
        let log_path = self
            .log_path
            .map(std::path::PathBuf::from)
            .unwrap_or_else(|| std::path::PathBuf::from(DEFAULT_LOG_PATH));

        Ok(Config { port, log_path })
    }
}
