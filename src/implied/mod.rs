//! Implied volatility extraction from option prices.
//!
//! - [`AmericanImpliedVol`] — bisection on the binomial lattice in American mode
//! - [`EuropeanImpliedVol`] — Newton-Raphson on the Black-Scholes closed form
//!
//! Both solvers assume the option price is strictly increasing in volatility
//! over their search range. This is a precondition, not checked at runtime.

pub mod american;
pub mod european;

pub use american::{AmericanImpliedVol, BisectionConfig};
pub use european::{EuropeanImpliedVol, NewtonConfig};
