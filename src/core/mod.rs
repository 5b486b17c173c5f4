// src/core/mod.rs

/// Data structures shared across the audit pipeline and the UI.
pub mod models;

/// Errors produced by lookups and validation.
pub mod error;

/// Runtime settings: timeouts, fast mode, resolution mode.
pub mod config;

/// Shared HTTP fetch helpers with timeout and status classification.
pub mod fetch;

/// DoH provider definitions and the provider registry.
pub mod providers;

/// Resolution strategies: the provider race, pinned mode, and the sweep.
pub mod resolver;

/// The record fan-out, derived checks, and side-channel scanners.
pub mod scanner;

/// Audit orchestration: normalization, phases, and the fast-mode deadline.
pub mod audit;

/// Static explanations and remediation advice for every finding code.
pub mod knowledge_base;
