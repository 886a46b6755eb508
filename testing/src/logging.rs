//! Tracing setup for test binaries.

use std::sync::Once;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,wallet_e2e=debug,rdkafka=warn";

static INIT: Once = Once::new();

/// Install the global subscriber once per test binary.
///
/// Output goes through the test writer so `cargo test` captures it per test.
/// `RUST_LOG` overrides [`DEFAULT_FILTER`]. Later calls do nothing.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let installed = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_test_writer().with_target(true))
            .try_init();
        if installed.is_err() {
            tracing::debug!("A global subscriber was already installed");
        }
    });
}
