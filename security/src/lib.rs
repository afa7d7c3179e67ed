//! # Security Crate
//!
//! Pre-execution defenses for the submission pipeline: a static code
//! validator, a per-identity execution quota, and the audit sink every
//! security-relevant decision is reported to.
//!
//! None of this is a soundness guarantee. The validator is a cheap first
//! filter over untrusted source text; the sandbox in `code_runner` is the
//! real safety boundary.

pub mod audit;
pub mod quota;
pub mod validator;

pub use audit::{AuditEvent, AuditSink, LogAuditSink, MemoryAuditSink};
pub use quota::ExecutionQuotaTracker;
pub use validator::{FindingCategory, SecurityFinding, SecurityValidator, Severity};
