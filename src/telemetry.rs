use tracing_subscriber::{fmt, EnvFilter};

use crate::settings::AppEnvironment;

const DEFAULT_FILTER: &str = "info";

/// Installs the global subscriber. `RUST_LOG` overrides the default level.
/// Production logs are JSON lines; everything else is human readable.
pub fn init_tracing(env: &AppEnvironment) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let result = match env {
        AppEnvironment::Production => fmt()
            .with_env_filter(filter)
            .json()
            .with_current_span(true)
            .try_init(),
        _ => fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init(),
    };

    if let Err(e) = result {
        eprintln!("tracing init failed: {e}");
    }
}
