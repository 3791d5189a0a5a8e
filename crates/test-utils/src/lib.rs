//! Shared helpers for dagflow's integration tests: a journal context that
//! records what tasks did, a handful of scripted tasks, and a name-based
//! workflow builder.

pub mod builders;
pub mod journal;
pub mod tasks;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

pub use builders::WorkflowBuilder;
pub use journal::{Event, Journal};

/// Upper bound for any single run in the test suite.
pub const RUN_TIMEOUT: Duration = Duration::from_secs(5);

static TRACING: Once = Once::new();

/// Install a test-writer subscriber once per test binary.
///
/// Output only shows for failing tests (or with `--nocapture`). The filter
/// comes from `RUST_LOG`, defaulting to `dagflow=debug` so engine traces are
/// available when a concurrency test goes wrong.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("warn,dagflow=debug"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_thread_ids(true)
            .init();
    });
}

/// Await `f`, panicking if it takes longer than [`RUN_TIMEOUT`].
///
/// A hung run means a lost completion signal or a stuck join barrier, so
/// failing loudly beats hanging the test binary.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(RUN_TIMEOUT, f).await {
        Ok(value) => value,
        Err(_) => panic!("workflow run did not complete within {RUN_TIMEOUT:?}"),
    }
}
