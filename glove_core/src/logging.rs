//! Tracing setup.
//!
//! Diagnostics always go to stderr. Stdout belongs to the operator view and
//! to `--events json`, which other programs may be parsing line by line.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber
///
/// `default_level` applies unless `RUST_LOG` is set. The CLI passes `warn` so
/// a normal run only shows swallowed narration or output failures.
pub fn init_with_level(default_level: &str) {
    let installed = tracing_subscriber::registry()
        .with(filter_for(default_level))
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .try_init();

    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

fn filter_for(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_install_is_harmless() {
        init_test();
        init_with_level("warn");
        tracing::info!("still logging after a repeated init");
    }
}
