pub mod aggregate;
pub mod chart;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod pipeline;
pub mod resolve;
pub mod store;

use tracing_subscriber::{fmt, EnvFilter};

/// Shared subscriber setup for the binaries.
pub fn init_logging() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
}
