// src/core/config.rs

use crate::core::providers::ResolveMode;

/// Default per-request deadline applied to every outbound call.
pub const DEFAULT_TIMEOUT_MS: u64 = 9000;

/// Soft deadline bounding the side-channel phase in fast mode.
pub const DEFAULT_FAST_DEADLINE_MS: u64 = 3500;

/// Environment variable overriding the per-request timeout, read once at
/// startup. Lowering it is the knob for slow or constrained networks.
pub const TIMEOUT_ENV: &str = "PALISADE_TIMEOUT_MS";

/// Settings for one audit run, captured by value when the run starts so a
/// mid-audit change in the UI only affects subsequent runs.
#[derive(Debug, Clone, Copy)]
pub struct AuditConfig {
    /// Deadline in milliseconds for every outbound request.
    pub timeout_ms: u64,
    /// In fast mode the side-channel phase is bounded by a soft deadline;
    /// lookups still running when it fires are detached, not awaited.
    pub fast_mode: bool,
    pub fast_deadline_ms: u64,
    /// Provider selection for every DNS resolution in this run.
    pub mode: ResolveMode,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            fast_mode: true,
            fast_deadline_ms: DEFAULT_FAST_DEADLINE_MS,
            mode: ResolveMode::Auto,
        }
    }
}

impl AuditConfig {
    /// Build the startup configuration, honoring the timeout override from
    /// the environment. This is an initialization-time policy decision; the
    /// value is never re-read mid-run.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(TIMEOUT_ENV)
            && let Ok(ms) = raw.trim().parse::<u64>()
            && ms > 0
        {
            config.timeout_ms = ms;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_fast_mode_auto_resolution() {
        let config = AuditConfig::default();
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert!(config.fast_mode);
        assert_eq!(config.mode, ResolveMode::Auto);
    }
}
