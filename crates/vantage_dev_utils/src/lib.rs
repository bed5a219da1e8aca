//! Test utilities for the Vantage crates.

pub mod backend;
pub mod fixtures;

pub use backend::RecordingBackend;
pub use fixtures::{FRAGMENT_SOURCE, VERTEX_SOURCE, npr_sources};

/// Installs `env_logger` for tests; repeated calls are harmless.
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
