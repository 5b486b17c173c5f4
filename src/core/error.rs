// src/core/error.rs

use thiserror::Error;

/// Unified error type for every outbound lookup the auditor performs.
///
/// Each variant maps to a distinct failure class so callers can decide how
/// loudly to report it: a `Validation` error aborts the whole audit, while
/// everything else degrades to an absent result plus a log line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuditError {
    /// The per-request deadline elapsed before a response arrived.
    #[error("timed out after {0}ms")]
    Timeout(u64),

    /// The upstream was reachable but answered with a non-success status.
    #[error("HTTP {0}")]
    Http(u16),

    /// Transport-level failure: DNS resolution, connection refused, TLS,
    /// or a CORS-style opaque rejection. The reason is best-effort text.
    #[error("network error: {0}")]
    Network(String),

    /// The response arrived but its body could not be decoded.
    #[error("malformed response: {0}")]
    Parse(String),

    /// The input domain failed validation. Checked once, before any
    /// network activity, and fatal to the run.
    #[error("invalid domain: {0}")]
    Validation(String),
}

pub type AuditResult<T> = std::result::Result<T, AuditError>;
