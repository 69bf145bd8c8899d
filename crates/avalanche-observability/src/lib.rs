// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # avalanche-observability
//!
//! Logging setup shared by the avalanche analysis binaries, with per-crate
//! debug flag support.
//!
//! ## Features
//! - `file-logging`: timestamped run folders with rolling JSON log files

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

// Re-export commonly used items
pub use cli::*;
pub use config::*;
pub use init::*;

/// Known workspace crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "avalanche",
    "avalanche-core",
    "avalanche-config",
    "avalanche-analysis",
    "avalanche-observability",
];
