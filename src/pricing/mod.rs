//! Option pricing engines.
//!
//! - [`lattice`] — recombining binomial lattice for European and American
//!   vanillas, valued by backward induction
//! - [`black_scholes`] — closed-form Black-Scholes-Merton price and vega with
//!   a continuous dividend yield

pub mod black_scholes;
pub mod lattice;

pub use black_scholes::{bs_price, bs_vega, norm_cdf, norm_pdf};
pub use lattice::{BinomialPricer, DEFAULT_STEPS, Lattice, lattice_price};
