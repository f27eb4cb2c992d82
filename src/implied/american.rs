//! American implied volatility by bisection on the binomial lattice.
//!
//! There is no closed form for American prices, so the volatility is bracketed
//! in `[vol_min, vol_max]` and halved until the bracket is narrower than the
//! tolerance or the lattice reproduces the market price exactly.

use serde::{Deserialize, Serialize};

use crate::error::{self, CalibrationError};
use crate::pricing::BinomialPricer;
use crate::types::{Market, OptionSpec, OptionType, Vol};
use crate::validate::{validate_count, validate_positive};

/// Settings for the American implied-vol bisection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BisectionConfig {
    /// Iteration cap before reporting non-convergence.
    pub max_iterations: usize,
    /// Bracket width at which the midpoint is accepted.
    pub tolerance: f64,
    /// Lower end of the initial bracket.
    pub vol_min: f64,
    /// Upper end of the initial bracket.
    pub vol_max: f64,
}

impl Default for BisectionConfig {
    fn default() -> Self {
        Self {
            max_iterations: 750,
            tolerance: 1e-5,
            vol_min: 0.001,
            vol_max: 10.0,
        }
    }
}

impl BisectionConfig {
    /// # Errors
    /// Returns [`CalibrationError::InvalidInput`] for a zero iteration cap, a
    /// non-positive tolerance, or a bracket that is not `0 < vol_min < vol_max`.
    pub fn validate(&self) -> error::Result<()> {
        validate_count(self.max_iterations, "bisection max_iterations")?;
        validate_positive(self.tolerance, "bisection tolerance")?;
        validate_positive(self.vol_min, "bisection vol_min")?;
        validate_positive(self.vol_max, "bisection vol_max")?;
        if self.vol_min >= self.vol_max {
            return Err(CalibrationError::InvalidInput {
                message: format!(
                    "bisection bracket must satisfy vol_min < vol_max, got [{}, {}]",
                    self.vol_min, self.vol_max
                ),
            });
        }
        Ok(())
    }
}

/// Volatility bracket `[lo, hi]` with `lo < hi`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Bracket {
    lo: f64,
    hi: f64,
}

impl Bracket {
    pub(crate) fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    pub(crate) fn midpoint(&self) -> f64 {
        0.5 * (self.lo + self.hi)
    }

    pub(crate) fn width(&self) -> f64 {
        self.hi - self.lo
    }

    /// Replace one end with `mid` given the pricing error there.
    ///
    /// Price increasing in vol: a negative error means the vol is too low.
    pub(crate) fn narrow(&mut self, mid: f64, diff: f64) {
        if diff < 0.0 {
            self.lo = mid;
        } else {
            self.hi = mid;
        }
    }

    #[cfg(test)]
    fn bounds(&self) -> (f64, f64) {
        (self.lo, self.hi)
    }
}

/// American implied volatility calculator.
///
/// # Examples
/// ```
/// use deamericanize::implied::{AmericanImpliedVol, BisectionConfig};
/// use deamericanize::pricing::BinomialPricer;
/// use deamericanize::types::{Market, OptionSpec, OptionType};
///
/// let market = Market::new(100.0, 0.05, 0.01)?;
/// let pricer = BinomialPricer::new(100);
/// let put = OptionSpec::american(OptionType::Put, 100.0, 0.5)?;
/// let price = pricer.price(&put, &market, 0.3)?;
///
/// let solver = AmericanImpliedVol::new(pricer, BisectionConfig::default())?;
/// let vol = solver.compute(price, &market, 100.0, 0.5, OptionType::Put)?;
/// assert!((vol.0 - 0.3).abs() < 1e-4);
/// # Ok::<(), deamericanize::CalibrationError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmericanImpliedVol {
    pricer: BinomialPricer,
    config: BisectionConfig,
}

impl Default for AmericanImpliedVol {
    fn default() -> Self {
        Self {
            pricer: BinomialPricer::default(),
            config: BisectionConfig::default(),
        }
    }
}

impl AmericanImpliedVol {
    /// # Errors
    /// Returns [`CalibrationError::InvalidInput`] if the pricer or the
    /// bisection settings are malformed.
    pub fn new(pricer: BinomialPricer, config: BisectionConfig) -> error::Result<Self> {
        pricer.validate()?;
        config.validate()?;
        Ok(Self { pricer, config })
    }

    pub fn pricer(&self) -> &BinomialPricer {
        &self.pricer
    }

    pub fn config(&self) -> &BisectionConfig {
        &self.config
    }

    /// Volatility at which the American lattice price matches `option_price`.
    ///
    /// # Arguments
    /// * `option_price` — Market price of the American option (must be > 0)
    /// * `market` — Spot, rate and the dividend yield to price under
    /// * `strike` — Strike price (must be > 0)
    /// * `expiry` — Time to expiry in years (must be > 0)
    /// * `option_type` — Call or Put
    ///
    /// # Errors
    /// Returns [`CalibrationError::InvalidInput`] for non-positive inputs and
    /// [`CalibrationError::BisectionNonConvergence`] if the bracket has not
    /// closed within `max_iterations`.
    pub fn compute(
        &self,
        option_price: f64,
        market: &Market,
        strike: f64,
        expiry: f64,
        option_type: OptionType,
    ) -> error::Result<Vol> {
        validate_positive(option_price, "option_price")?;
        let option = OptionSpec::american(option_type, strike, expiry)?;

        let mut bracket = Bracket::new(self.config.vol_min, self.config.vol_max);
        for _ in 0..self.config.max_iterations {
            let mid = bracket.midpoint();
            let diff = self.pricer.price(&option, market, mid)? - option_price;
            if diff == 0.0 || bracket.width() < self.config.tolerance {
                #[cfg(feature = "logging")]
                tracing::debug!(
                    side = %option_type,
                    strike,
                    dividend_yield = market.dividend_yield(),
                    vol = mid,
                    "American implied vol converged"
                );
                return Ok(Vol(mid));
            }
            bracket.narrow(mid, diff);
        }

        Err(CalibrationError::BisectionNonConvergence {
            side: option_type,
            strike,
            iterations: self.config.max_iterations,
        })
    }
}
