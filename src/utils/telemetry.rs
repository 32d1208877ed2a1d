//! Logging setup
//!
//! Installs a global `tracing` subscriber. `RUST_LOG` overrides the default
//! filter.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

pub const DEFAULT_FILTER: &str = "challenge_evidence=info";

pub fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("challenge_evidence=debug")
        } else {
            EnvFilter::new(DEFAULT_FILTER)
        }
    });

    Registry::default()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init()?;

    Ok(())
}
