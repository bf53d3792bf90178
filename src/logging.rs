use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// `-v` count to the default level: warn, info, then debug.
pub fn level_for(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    }
}

/// Installs the global subscriber, writing to stderr. `RUST_LOG` wins over `-v`.
pub fn init(verbosity: u8, with_ansi: bool) -> Result<(), String> {
    let default = format!("visitlog={}", level_for(verbosity).as_str().to_lowercase());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(with_ansi)
                .with_target(false)
                .compact(),
        )
        .try_init()
        .map_err(|e| format!("failed to initialise logging: {e}"))
}
