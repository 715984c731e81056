use tracing::info;
use tracing_subscriber::{prelude::*, fmt, EnvFilter};

pub fn init_logging() {
    let level = if cfg!(debug_assertions) { "debug" } else { "warn" };

    let (filter, from_env) = match EnvFilter::try_from_default_env() {
        Ok(f) => (f, true),
        Err(_) => (EnvFilter::new(level), false),
    };

    // Stdout is reserved for the report
    let fmt_layer = fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .init();

    // Logged once the subscriber is installed so the message isn't lost
    if !from_env {
        info!("\"RUST_LOG\" variable not set, defaulting to {level}");
    }
}
