//! Forward and dividend-yield calibration from American option prices.
//!
//! - [`Deamericanizer`] — the fixed-point driver for a single tenor
//! - [`CalibrationConfig`] — lattice depth and per-solver settings
//! - [`term_structure`] — independent calibration of many tenors at once

pub mod config;
pub mod driver;
pub mod term_structure;

pub use config::{CalibrationConfig, ForwardConfig};
pub use driver::{BenchmarkQuotes, Deamericanizer, ForwardCalibration};
pub use term_structure::{ForwardPoint, TenorCalibration, TenorQuotes, forward_points};
