// src/core/scanner/mod.rs

pub mod dns_scanner;
pub mod extras_scanner;
pub mod ip_scanner;
pub mod posture;
pub mod rdap_scanner;
