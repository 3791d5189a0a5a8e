#![allow(dead_code)]

pub use dagflow_test_utils::builders;
pub use dagflow_test_utils::tasks;
pub use dagflow_test_utils::{Event, Journal, WorkflowBuilder, init_tracing, with_timeout};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
