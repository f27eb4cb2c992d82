//! Black-Scholes-Merton closed form with a continuous dividend yield.
//!
//! # Formula
//! ```text
//! d1 = (ln(S/K) + (r − q)T + σ²T/2) / (σ√T),   d2 = d1 − σ√T
//! V  = φ · (S·e^{−qT}·N(φ·d1) − K·e^{−rT}·N(φ·d2))
//! ∂V/∂σ = K·e^{−rT}·n(d2)·√T
//! ```
//!
//! Non-positive `vol` or `expiry` is a caller error; the functions return
//! NaN rather than panicking.

use std::f64::consts::{PI, SQRT_2};

use statrs::function::erf::erfc;

use crate::types::{Market, OptionType};

/// Standard normal CDF Φ(x).
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Standard normal PDF φ(x).
pub fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// The `(d1, d2)` pair.
pub fn d1_d2(market: &Market, strike: f64, expiry: f64, vol: f64) -> (f64, f64) {
    let vol_sqrt_t = vol * expiry.sqrt();
    let d1 = ((market.spot() / strike).ln()
        + (market.rate() - market.dividend_yield()) * expiry
        + 0.5 * vol * vol * expiry)
        / vol_sqrt_t;
    (d1, d1 - vol_sqrt_t)
}

/// European option price.
///
/// # Examples
/// ```
/// use deamericanize::pricing::bs_price;
/// use deamericanize::types::{Market, OptionType};
///
/// let market = Market::new(100.0, 0.05, 0.0)?;
/// let call = bs_price(&market, 100.0, 1.0, 0.2, OptionType::Call);
/// assert!((call - 10.4506).abs() < 1e-4);
/// # Ok::<(), deamericanize::CalibrationError>(())
/// ```
pub fn bs_price(
    market: &Market,
    strike: f64,
    expiry: f64,
    vol: f64,
    option_type: OptionType,
) -> f64 {
    let phi = option_type.phi();
    let (d1, d2) = d1_d2(market, strike, expiry, vol);
    let carry_df = (-market.dividend_yield() * expiry).exp();
    let df = (-market.rate() * expiry).exp();
    phi * (market.spot() * carry_df * norm_cdf(phi * d1) - strike * df * norm_cdf(phi * d2))
}

/// Vega ∂V/∂σ, identical for calls and puts.
pub fn bs_vega(market: &Market, strike: f64, expiry: f64, vol: f64) -> f64 {
    let (_, d2) = d1_d2(market, strike, expiry, vol);
    strike * (-market.rate() * expiry).exp() * norm_pdf(d2) * expiry.sqrt()
}
