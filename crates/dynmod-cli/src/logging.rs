//! Log subscriber setup.

use std::io;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding a filter directive (e.g. `dynmod::cache=trace`)
pub const LOG_ENV: &str = "DYNMOD_LOG";

/// Install the global subscriber. Logs go to stderr; stdout carries command output.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let stderr_layer = fmt::layer()
        .compact()
        .with_target(true)
        .with_writer(io::stderr);

    // A subscriber may already be installed (e.g. by a test harness).
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init();
}

fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "warn,dynmod=debug",
        _ => "warn,dynmod=trace",
    }
}
