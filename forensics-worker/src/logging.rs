//! Tracing subscriber setup
//!
//! The subscriber is installed before configuration is resolved so that
//! config loading can log. Its filter starts from `RUST_LOG` (or `info`)
//! and is swapped for the configured level once the config file is known,
//! unless `RUST_LOG` was set.

use anyhow::{Context, Result};
use forensics_common::config::LoggingConfig;
use tracing_subscriber::{
    layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

/// Filter used until the config file has been read
pub const BOOTSTRAP_LEVEL: &str = "info";

type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Handle to the installed subscriber's filter
pub struct Logging {
    handle: FilterHandle,
    env_override: bool,
}

/// Install the global subscriber; call once, first thing in `main`
pub fn init() -> Logging {
    let env_filter = EnvFilter::try_from_default_env().ok();
    let env_override = env_filter.is_some();

    let (filter, handle) =
        reload::Layer::new(env_filter.unwrap_or_else(|| EnvFilter::new(BOOTSTRAP_LEVEL)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    Logging {
        handle,
        env_override,
    }
}

impl Logging {
    /// Apply the configured level; RUST_LOG, when set, wins
    pub fn apply_config(&self, config: &LoggingConfig) -> Result<()> {
        if self.env_override {
            return Ok(());
        }

        let filter = EnvFilter::try_new(&config.level)
            .with_context(|| format!("Invalid log level '{}'", config.level))?;
        self.handle
            .reload(filter)
            .context("Failed to apply configured log level")?;
        Ok(())
    }
}
