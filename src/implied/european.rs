//! European implied volatility by Newton-Raphson on the Black-Scholes price.
//!
//! ```text
//! σₙ₊₁ = σₙ − (V(σₙ) − V_mkt) / vega(σₙ)
//! ```
//!
//! The iteration stops when successive volatilities differ by less than the
//! tolerance. It fails rather than guessing when vega is too small to divide
//! by, when a step lands on a degenerate volatility, or when the cap is hit.

use serde::{Deserialize, Serialize};

use crate::error::{self, CalibrationError};
use crate::pricing::{bs_price, bs_vega};
use crate::types::{Market, OptionType, Vol};
use crate::validate::{validate_count, validate_positive};

/// Settings for the European Newton-Raphson solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewtonConfig {
    /// Iteration cap before reporting non-convergence.
    pub max_iterations: usize,
    /// Step size `|σₙ₊₁ − σₙ|` at which the iteration has converged.
    pub tolerance: f64,
    /// Smallest vega accepted as a Newton denominator.
    pub min_vega: f64,
    /// Smallest volatility a step may produce.
    pub min_vol: f64,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 300,
            tolerance: 1e-7,
            min_vega: 1e-4,
            min_vol: 1e-4,
        }
    }
}

impl NewtonConfig {
    /// # Errors
    /// Returns [`CalibrationError::InvalidInput`] for a zero iteration cap or
    /// non-positive thresholds.
    pub fn validate(&self) -> error::Result<()> {
        validate_count(self.max_iterations, "newton max_iterations")?;
        validate_positive(self.tolerance, "newton tolerance")?;
        validate_positive(self.min_vega, "newton min_vega")?;
        validate_positive(self.min_vol, "newton min_vol")?;
        Ok(())
    }
}

/// Black-Scholes implied volatility calculator.
///
/// # Examples
/// ```
/// use deamericanize::implied::EuropeanImpliedVol;
/// use deamericanize::pricing::bs_price;
/// use deamericanize::types::{Market, OptionType};
///
/// let market = Market::new(100.0, 0.03, 0.01)?;
/// let price = bs_price(&market, 105.0, 1.0, 0.25, OptionType::Call);
///
/// let vol = EuropeanImpliedVol::default()
///     .compute(price, 0.3, &market, 105.0, 1.0, OptionType::Call)?;
/// assert!((vol.0 - 0.25).abs() < 1e-7);
/// # Ok::<(), deamericanize::CalibrationError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EuropeanImpliedVol {
    config: NewtonConfig,
}

impl EuropeanImpliedVol {
    /// # Errors
    /// Returns [`CalibrationError::InvalidInput`] if the settings are malformed.
    pub fn new(config: NewtonConfig) -> error::Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &NewtonConfig {
        &self.config
    }

    /// Volatility at which the Black-Scholes price matches `option_price`.
    ///
    /// # Arguments
    /// * `option_price` — Target European price (must be > 0)
    /// * `initial_vol` — Starting point of the iteration (must be > 0)
    /// * `market` — Spot, rate and dividend yield
    /// * `strike` — Strike price (must be > 0)
    /// * `expiry` — Time to expiry in years (must be > 0)
    /// * `option_type` — Call or Put
    ///
    /// # Errors
    /// - [`CalibrationError::NewtonUnstableDerivative`] if vega drops below `min_vega`
    /// - [`CalibrationError::NewtonDegenerateVolatility`] if a step goes below `min_vol`
    /// - [`CalibrationError::NewtonNonConvergence`] after `max_iterations` steps
    /// - [`CalibrationError::InvalidInput`] for non-positive inputs
    pub fn compute(
        &self,
        option_price: f64,
        initial_vol: f64,
        market: &Market,
        strike: f64,
        expiry: f64,
        option_type: OptionType,
    ) -> error::Result<Vol> {
        validate_positive(option_price, "option_price")?;
        validate_positive(initial_vol, "initial_vol")?;
        validate_positive(strike, "strike")?;
        validate_positive(expiry, "expiry")?;

        let mut vol = initial_vol;
        for _ in 0..self.config.max_iterations {
            let vega = bs_vega(market, strike, expiry, vol);
            if vega.is_nan() || vega < self.config.min_vega {
                return Err(CalibrationError::NewtonUnstableDerivative {
                    side: option_type,
                    strike,
                    vega,
                });
            }

            let diff = bs_price(market, strike, expiry, vol, option_type) - option_price;
            let next = vol - diff / vega;
            if next.is_nan() || next < self.config.min_vol {
                return Err(CalibrationError::NewtonDegenerateVolatility {
                    side: option_type,
                    strike,
                    vol: next,
                });
            }

            if (next - vol).abs() < self.config.tolerance {
                return Ok(Vol(next));
            }
            vol = next;
        }

        Err(CalibrationError::NewtonNonConvergence {
            side: option_type,
            strike,
            iterations: self.config.max_iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn market() -> Market {
        Market::new(100.0, 0.02, 0.01).unwrap()
    }

    #[test]
    fn round_trip_call_and_put() {
        let m = market();
        let solver = EuropeanImpliedVol::default();
        for (side, strike, vol) in [
            (OptionType::Call, 110.0, 0.2),
            (OptionType::Put, 95.0, 0.45),
            (OptionType::Call, 100.0, 1.5),
        ] {
            let price = bs_price(&m, strike, 0.75, vol, side);
            let iv = solver.compute(price, 0.3, &m, strike, 0.75, side).unwrap();
            assert_abs_diff_eq!(iv.0, vol, epsilon = 1e-7);
        }
    }

    #[test]
    fn flat_vega_is_reported_as_unstable() {
        // Deep out-of-the-money call seeded at a tiny vol: vega is essentially zero.
        let m = Market::new(100.0, 0.03, 0.0).unwrap();
        let err = EuropeanImpliedVol::default()
            .compute(1e-3, 0.01, &m, 150.0, 0.25, OptionType::Call)
            .unwrap_err();
        assert!(matches!(
            err,
            CalibrationError::NewtonUnstableDerivative { side: OptionType::Call, strike, .. }
                if strike == 150.0
        ));
    }

    #[test]
    fn price_near_zero_vol_limit_is_unstable() {
        // Market price just above the σ→0 price: Newton walks down until vega vanishes.
        let m = Market::new(100.0, 0.03, 0.0).unwrap();
        let price = bs_price(&m, 120.0, 0.25, 1e-3, OptionType::Call) + 1e-9;
        let err = EuropeanImpliedVol::default()
            .compute(price, 0.2, &m, 120.0, 0.25, OptionType::Call)
            .unwrap_err();
        match err {
            CalibrationError::NewtonUnstableDerivative { side, strike, vega } => {
                assert_eq!(side, OptionType::Call);
                assert_eq!(strike, 120.0);
                assert!(vega < NewtonConfig::default().min_vega);
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn overshooting_step_is_degenerate() {
        // An at-the-forward call priced at ~0 pushes the first step below zero vol.
        let m = Market::new(100.0, 0.0, 0.0).unwrap();
        let err = EuropeanImpliedVol::default()
            .compute(1e-6, 0.2, &m, 100.0, 1.0, OptionType::Call)
            .unwrap_err();
        assert!(matches!(
            err,
            CalibrationError::NewtonDegenerateVolatility { vol, .. } if vol < 0.0
        ));
        assert_eq!(err.instrument(), Some((OptionType::Call, 100.0)));
    }

    #[test]
    fn iteration_cap_is_reported() {
        let config = NewtonConfig {
            max_iterations: 1,
            ..NewtonConfig::default()
        };
        let m = market();
        let price = bs_price(&m, 100.0, 1.0, 0.6, OptionType::Put);
        let err = EuropeanImpliedVol::new(config)
            .unwrap()
            .compute(price, 0.2, &m, 100.0, 1.0, OptionType::Put)
            .unwrap_err();
        assert_eq!(
            err,
            CalibrationError::NewtonNonConvergence {
                side: OptionType::Put,
                strike: 100.0,
                iterations: 1,
            }
        );
    }

    #[test]
    fn rejects_bad_config() {
        let config = NewtonConfig {
            min_vega: -1.0,
            ..NewtonConfig::default()
        };
        assert!(EuropeanImpliedVol::new(config).is_err());
    }
}
