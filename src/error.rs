use thiserror::Error;

/// Top-level broker error — startup/listener faults only.
///
/// Per-session failures (dead peers, malformed commands) never surface as this
/// type; they are handled inline by the session loop and the dispatcher (see
/// `session` and `dispatcher`).
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type BrokerResult<T> = Result<T, BrokerError>;
