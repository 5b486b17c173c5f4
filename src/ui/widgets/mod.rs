// src/ui/widgets/mod.rs

pub mod analysis_view; // The findings list with the detail pane.
pub mod channels;      // Side-channel results (RDAP, preload, policies).
pub mod footer;        // The dynamic footer bar.
pub mod input;         // The domain input field and status line.
pub mod log_view;      // The tail of the audit's diagnostic log.
pub mod records;       // The DNS snapshot and derived checks.
pub mod summary;       // Score, gauge, and per-category checks.
