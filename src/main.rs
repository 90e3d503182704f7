use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use chat_broker::broker::BrokerState;
use chat_broker::config::Cli;
use chat_broker::event_log::EventLog;
use chat_broker::listener;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match Cli::parse().into_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("chat-broker: {err}");
            return ExitCode::FAILURE;
        }
    };

    let log = match EventLog::open(&config.log_path) {
        Ok(log) => log,
        Err(err) => {
            eprintln!(
                "chat-broker: cannot open log file {}: {err}",
                config.log_path.display()
            );
            return ExitCode::FAILURE;
        }
    };

    let tcp_listener = match listener::bind(config.port) {
        Ok(tcp_listener) => tcp_listener,
        Err(err) => {
            eprintln!("chat-broker: cannot bind port {}: {err}", config.port);
            return ExitCode::FAILURE;
        }
    };

    log::info!(
        "Chat server started on port {}. Log file: {}",
        config.port,
        config.log_path.display()
    );

    let broker = Arc::new(BrokerState::new(log));

    if let Err(err) = listener::serve(tcp_listener, Arc::clone(&broker)).await {
        eprintln!("chat-broker: {err}");
        return ExitCode::FAILURE;
    }

    broker.log.record("Server shutting down.");
    ExitCode::SUCCESS
}
