//! Tracing subscriber setup. All diagnostics go to stderr so stdout stays
//! free.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_logging(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        let layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .json();
        let _ = registry.with(layer).try_init();
    } else {
        let layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact();
        let _ = registry.with(layer).try_init();
    }
}
