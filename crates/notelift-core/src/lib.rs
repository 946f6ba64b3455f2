// SPDX-License-Identifier: MIT
//
// notelift-core — shared types, configuration, and error definitions for the
// Notelift notebook digitizer.

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, SegmentConfig};
pub use error::{NoteliftError, Result};
pub use types::*;
