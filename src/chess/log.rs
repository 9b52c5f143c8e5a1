use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `CHESS_LOG=debug` or
/// `CHESS_LOG=chess_puzzles::chess::mistakes=debug`.
pub const LOG_ENV: &str = "CHESS_LOG";

const DEFAULT_DIRECTIVE: &str = "warn";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Installs a stderr subscriber. Safe to call more than once; later calls
/// leave the first subscriber in place.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
