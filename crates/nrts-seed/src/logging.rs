//! Diagnostics for the seeder.
//!
//! stdout belongs to the status lines an init hook greps for, so every
//! `tracing` event goes to stderr. `RUST_LOG` replaces the `-v`/`-q` choice
//! entirely when set.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// How much the seeder reports on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only (`-q`).
    Quiet,
    /// Store selection and the seed outcome.
    #[default]
    Normal,
    /// Lookups and inserts (`-v`).
    Verbose,
    /// Everything the store drivers emit (`-vv`).
    Trace,
}

impl Verbosity {
    /// Most detailed level let through.
    #[must_use]
    pub fn level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// Filter directive used when `RUST_LOG` is unset.
    ///
    /// At `Trace` the driver crates are let through as well.
    #[must_use]
    pub fn directive(self) -> String {
        match self {
            Self::Trace => self.level().to_string().to_lowercase(),
            _ => format!("nrts_seed={}", self.level()).to_lowercase(),
        }
    }
}

/// Install the stderr subscriber. Later calls are no-ops.
pub fn init_logging(verbosity: Verbosity) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directive()));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .try_init();
}

/// Warnings only, captured by the test harness.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
