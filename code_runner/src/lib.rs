//! # Code Runner
//!
//! Executes untrusted submissions inside ephemeral, hardened sandboxes.
//!
//! ## Key Concepts
//! - **SandboxManager**: creates, runs, and destroys one disposable Docker
//!   container per submission, with layered resource and capability limits.
//! - **Harness**: a generated, self-contained program embedding the user
//!   code and test cases, emitting one JSON result array on stdout.
//! - **ResultCollector**: turns raw process output into a canonical
//!   [`ExecutionResult`].
//!
//! The only inter-process contract is the harness stdout array of
//! `{test_id, passed, expected, got, error}` records; everything else
//! (exit codes, stderr, elapsed time) is diagnostic.

pub mod collector;
pub mod error;
pub mod harness;
pub mod sandbox;
pub mod types;

pub use collector::ResultCollector;
pub use error::RunnerError;
pub use sandbox::{SandboxHandle, SandboxManager};
pub use types::{ExecutionResult, ExecutionVerdict, RawExecution, TestCase, TestOutcome};
