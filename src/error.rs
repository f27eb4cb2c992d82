//! Error types for the deamericanize library.
//!
//! All fallible operations return `Result<T, CalibrationError>` rather than
//! panicking. Every numerical loop reports its own non-convergence as a distinct
//! variant carrying the instrument (side and strike) or tenor that caused it, so
//! batch calibrations can skip a bad quote and keep going.

use thiserror::Error;

use crate::types::OptionType;

/// Convenience type alias for results in this crate.
pub type Result<T> = std::result::Result<T, CalibrationError>;

/// Errors raised by the lattice pricer, the implied-vol solvers and the
/// forward calibration driver.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum CalibrationError {
    /// American implied-vol bisection hit its iteration cap.
    #[error(
        "bisection did not converge for {side} at strike {strike} after {iterations} iterations"
    )]
    BisectionNonConvergence {
        side: OptionType,
        strike: f64,
        iterations: usize,
    },

    /// European implied-vol Newton-Raphson hit its iteration cap.
    #[error(
        "Newton-Raphson did not converge for {side} at strike {strike} after {iterations} iterations"
    )]
    NewtonNonConvergence {
        side: OptionType,
        strike: f64,
        iterations: usize,
    },

    /// Vega fell below the stability threshold during a Newton step.
    #[error("vega {vega:e} too small for a stable Newton step ({side} at strike {strike})")]
    NewtonUnstableDerivative {
        side: OptionType,
        strike: f64,
        vega: f64,
    },

    /// A Newton step produced a degenerate (near-zero or negative) volatility.
    #[error("Newton step produced degenerate volatility {vol} ({side} at strike {strike})")]
    NewtonDegenerateVolatility {
        side: OptionType,
        strike: f64,
        vol: f64,
    },

    /// The forward fixed-point iteration hit its iteration cap.
    #[error(
        "forward calibration did not converge for tenor {tenor} after {iterations} iterations (last forward {last_forward})"
    )]
    OuterLoopNonConvergence {
        tenor: f64,
        iterations: usize,
        last_forward: f64,
    },

    /// Input data is invalid (e.g. non-positive strike, zero lattice depth).
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// An intermediate quantity became unusable (e.g. a non-positive forward).
    #[error("numerical error: {message}")]
    NumericalError { message: String },
}

impl CalibrationError {
    /// The (side, strike) of the instrument whose solver failed, if any.
    pub fn instrument(&self) -> Option<(OptionType, f64)> {
        match *self {
            Self::BisectionNonConvergence { side, strike, .. }
            | Self::NewtonNonConvergence { side, strike, .. }
            | Self::NewtonUnstableDerivative { side, strike, .. }
            | Self::NewtonDegenerateVolatility { side, strike, .. } => Some((side, strike)),
            _ => None,
        }
    }
}
