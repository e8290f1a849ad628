use tracing_subscriber::EnvFilter;

const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise each `-v` raises the configured level
/// one step. Output goes to stderr so stdout stays machine-readable.
pub fn init(config_level: &str, verbosity: u8) {
    let level = effective_level(config_level, verbosity);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // try_init also routes `log` records from the library crates into tracing
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
    {
        eprintln!("Warning: failed to install logger: {}", e);
    }
}

/// The configured level raised by `verbosity` steps, capped at `trace`.
///
/// A configured value that is not a plain level (e.g. a directive list) is
/// kept as is without `-v`, and treated as `info` otherwise.
fn effective_level(config_level: &str, verbosity: u8) -> String {
    let configured = LEVELS
        .iter()
        .position(|level| level.eq_ignore_ascii_case(config_level.trim()));
    match (configured, verbosity) {
        (_, 0) => config_level.to_string(),
        (base, steps) => {
            let base = base.unwrap_or(2);
            LEVELS[(base + steps as usize).min(LEVELS.len() - 1)].to_string()
        }
    }
}
