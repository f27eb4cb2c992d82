//! Forward, dividend and day-count conventions.
//!
//! The forward calibration moves between three equivalent descriptions of the
//! carry on the underlying: a forward price `F`, a continuous dividend yield
//! `q`, and a cash-equivalent dividend `S0·e^{rT} − F`. The conversions here
//! are the only place those identities are written down.

use chrono::NaiveDate;

/// Day-count basis of [`year_fraction`].
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Forward price with continuous dividend yield: F = S · exp((r − q) · T).
pub fn forward_price(spot: f64, rate: f64, dividend_yield: f64, expiry: f64) -> f64 {
    spot * ((rate - dividend_yield) * expiry).exp()
}

/// Forward from European put-call parity: F = e^{rT} · (C − P) + K.
pub fn parity_forward(call: f64, put: f64, strike: f64, rate: f64, expiry: f64) -> f64 {
    (rate * expiry).exp() * (call - put) + strike
}

/// Continuous dividend yield implied by a forward: q = ln(S / F) / T + r.
pub fn implied_dividend_yield(spot: f64, forward: f64, rate: f64, expiry: f64) -> f64 {
    (spot / forward).ln() / expiry + rate
}

/// Cash-equivalent dividend paid over the tenor: S · e^{rT} − F.
pub fn cash_dividend(spot: f64, forward: f64, rate: f64, expiry: f64) -> f64 {
    spot * (rate * expiry).exp() - forward
}

/// ACT/365 year fraction between a valuation date and an expiry.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use deamericanize::conventions::year_fraction;
///
/// let valuation = NaiveDate::from_ymd_opt(2023, 8, 10).unwrap();
/// let expiry = NaiveDate::from_ymd_opt(2023, 12, 15).unwrap();
/// assert!((year_fraction(valuation, expiry) - 127.0 / 365.0).abs() < 1e-15);
/// ```
pub fn year_fraction(valuation: NaiveDate, expiry: NaiveDate) -> f64 {
    (expiry - valuation).num_days() as f64 / DAYS_PER_YEAR
}

/// Simple moneyness: m = K / F.
pub fn moneyness(strike: f64, forward: f64) -> f64 {
    strike / forward
}

/// Log-moneyness: k = ln(K / F).
pub fn log_moneyness(strike: f64, forward: f64) -> f64 {
    (strike / forward).ln()
}
