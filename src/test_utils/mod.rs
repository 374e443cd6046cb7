//! Test utilities for modgraph
//!
//! Shared by unit tests and, through the `test-utils` feature, by the integration
//! suite: logging setup and on-disk module fixtures.
//!
//! ```rust,no_run
//! use modgraph::test_utils::ModuleFixture;
//!
//! let temp = tempfile::TempDir::new().unwrap();
//! let fixture = ModuleFixture::create(temp.path()).unwrap();
//! assert!(fixture.file("p1/a").exists());
//! ```

pub mod fixtures;

pub use fixtures::{ModuleFixture, amd_module, mtime, set_mtime, write_file};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

/// Install a test-friendly tracing subscriber once per process.
///
/// `level` wins over `RUST_LOG`; with neither set, logging stays off so test output is
/// not flooded by scan and snapshot messages.
///
/// ```rust,no_run
/// modgraph::test_utils::init_test_logging(Some(tracing::Level::DEBUG));
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = match level {
            Some(level) => EnvFilter::new(level.to_string()),
            None if std::env::var("RUST_LOG").is_ok() => EnvFilter::from_default_env(),
            None => return,
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}
