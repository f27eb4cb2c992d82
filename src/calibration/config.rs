//! Calibration settings.
//!
//! Every iteration cap and tolerance lives in one struct per solver, and
//! [`CalibrationConfig`] groups them. All structs deserialize with
//! `#[serde(default)]`, so a document only needs the fields it overrides:
//!
//! ```
//! use deamericanize::calibration::CalibrationConfig;
//!
//! let json = r#"{ "lattice": { "steps": 200 }, "forward": { "tolerance": 1e-4 } }"#;
//! let config: CalibrationConfig = serde_json::from_str(json).unwrap();
//! assert_eq!(config.lattice.steps, 200);
//! assert_eq!(config.forward.tolerance, 1e-4);
//! assert_eq!(config.forward.max_iterations, 750);
//! assert_eq!(config.newton.max_iterations, 300);
//! ```

use serde::{Deserialize, Serialize};

use crate::error;
use crate::implied::{BisectionConfig, NewtonConfig};
use crate::pricing::BinomialPricer;
use crate::validate::{validate_count, validate_positive};

/// Settings for the forward fixed-point iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwardConfig {
    /// Refinement passes allowed after the initial forward estimate.
    pub max_iterations: usize,
    /// Forward change `|Fₖ₊₁ − Fₖ|` at which the iteration has converged.
    pub tolerance: f64,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            max_iterations: 750,
            tolerance: 1e-3,
        }
    }
}

impl ForwardConfig {
    /// # Errors
    /// Returns [`CalibrationError::InvalidInput`](crate::CalibrationError::InvalidInput)
    /// for a zero iteration cap or a non-positive tolerance.
    pub fn validate(&self) -> error::Result<()> {
        validate_count(self.max_iterations, "forward max_iterations")?;
        validate_positive(self.tolerance, "forward tolerance")?;
        Ok(())
    }
}

/// Lattice depth plus the settings of every solver in the calibration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub lattice: BinomialPricer,
    pub bisection: BisectionConfig,
    pub newton: NewtonConfig,
    pub forward: ForwardConfig,
}

impl CalibrationConfig {
    /// Default settings with a `steps`-deep lattice.
    pub fn with_steps(steps: usize) -> Self {
        Self {
            lattice: BinomialPricer::new(steps),
            ..Self::default()
        }
    }

    /// # Errors
    /// Returns the first [`CalibrationError::InvalidInput`](crate::CalibrationError::InvalidInput)
    /// found among the grouped settings.
    pub fn validate(&self) -> error::Result<()> {
        self.lattice.validate()?;
        self.bisection.validate()?;
        self.newton.validate()?;
        self.forward.validate()
    }
}
