//! Shared pieces of the docker-credential-magic binaries

pub mod commands;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the log subscriber. Logs go to stderr; stdout carries command output.
pub fn init_logging(filter: EnvFilter) {
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
