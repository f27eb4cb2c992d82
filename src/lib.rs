//! # deamericanize
//!
//! Forward and dividend-yield calibration from American option prices.
//!
//! Put-call parity only holds for European exercise, so the forward of an
//! American-style chain cannot be read off its call and put directly. This
//! crate recovers it by a fixed point: imply a volatility from each American
//! price on a binomial lattice, re-price the European equivalent at that
//! volatility, apply European parity, and repeat until the forward settles.
//! The calibrated tenor then yields a European-equivalent volatility smile.
//!
//! ## Architecture
//!
//! - **`pricing`** — CRR binomial lattice and Black-Scholes closed form
//! - **`implied`** — American implied vol (bisection) and European implied vol (Newton)
//! - **`calibration`** — The forward fixed-point driver and multi-tenor batches
//! - **`smile`** — European smile recovery on a calibrated tenor
//! - **`chain`** — Quote chains and benchmark-strike selection
//! - **`conventions`** — Forward, parity and day-count helpers
//!
//! ## Design
//!
//! - **Newtypes for outputs, bare `f64` for inputs.** [`Vol`], [`Strike`] and
//!   [`Tenor`] wrap returned values; inputs are validated where they enter.
//! - **No panics.** Every fallible operation returns [`Result`]. Solver
//!   non-convergence is a [`CalibrationError`] naming the side and strike (or
//!   the tenor) that failed, so batch runs continue past individual failures.
//! - **Stateless solvers.** [`Deamericanizer`] holds only settings, so one
//!   instance serves many tenors across threads.
//! - **Serializable.** Settings, market inputs and results implement Serde
//!   `Serialize` / `Deserialize`, with validation where invariants exist.
//!
//! ## Example
//!
//! ```
//! use deamericanize::{BenchmarkQuotes, CalibrationConfig, Deamericanizer};
//!
//! let driver = Deamericanizer::new(CalibrationConfig::with_steps(100))?;
//! let quotes = BenchmarkQuotes::new(185.0, 7.625, 11.975);
//! let fit = driver.calibrate_forward(177.83, 0.05482, 127.0 / 365.0, 0.0001, &quotes)?;
//! assert!((fit.forward - 181.08).abs() < 0.1);
//! # Ok::<(), deamericanize::CalibrationError>(())
//! ```

pub mod calibration;
pub mod chain;
pub mod conventions;
pub mod error;
pub mod implied;
pub mod pricing;
pub mod smile;
pub mod types;
mod validate;

#[doc(inline)]
pub use calibration::{
    BenchmarkQuotes, CalibrationConfig, Deamericanizer, ForwardCalibration, TenorCalibration,
    TenorQuotes,
};
#[doc(inline)]
pub use error::{CalibrationError, Result};
#[doc(inline)]
pub use smile::{EuropeanSmile, SmilePoint, SmileQuote};
#[doc(inline)]
pub use types::{ExerciseStyle, Market, OptionSpec, OptionType, Strike, Tenor, Vol};
