//! Tracing setup.
//!
//! One-shot subscriber installation with env-filter support. Libraries in
//! this workspace only emit `tracing` events; installing the subscriber is
//! the embedding application's call, made once at startup.

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// Filter resolution order: `DOSSIER_LOG` env var, then the provided
/// default directive. Safe to call more than once; later calls are no-ops.
pub fn init(default_directive: &str) {
    let filter = EnvFilter::try_from_env("DOSSIER_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_init_does_not_panic() {
        init("info");
        init("debug");
    }
}
