//! De-Americanization: the forward/dividend-yield fixed point.
//!
//! Put-call parity does not hold for American options, so the forward cannot
//! be read off the market call and put directly. Instead, starting from a
//! dividend-yield guess `q₀`, each pass:
//!
//! 1. implies the call and put volatilities on the American lattice at `qₖ`,
//! 2. re-prices both as European options at those volatilities,
//! 3. recovers the forward from European parity, `F = e^{rT}(C − P) + K`,
//! 4. inverts it to the next yield, `qₖ₊₁ = ln(S0/F)/T + r`.
//!
//! ```text
//!   Init ──► Iterating ──(|Fₖ₊₁ − Fₖ| < ε)──► Converged
//!               │  ▲
//!               └──┘ (k ≤ max_iterations)
//!               └────(cap exceeded)────────► Failed
//! ```
//!
//! Raising `q` lowers the lattice forward and the re-pricing is continuous
//! in `q`, which makes the map a contraction in practice. Global convergence
//! is not guaranteed; the iteration cap turns a stall into
//! [`CalibrationError::OuterLoopNonConvergence`].

use serde::{Deserialize, Serialize};

use crate::calibration::config::{CalibrationConfig, ForwardConfig};
use crate::conventions;
use crate::error::{self, CalibrationError};
use crate::implied::{AmericanImpliedVol, EuropeanImpliedVol};
use crate::types::{Market, OptionSpec, OptionType, Vol};
use crate::validate::validate_positive;

/// Market call and put prices at the benchmark (highest-volume) strike.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkQuotes {
    pub strike: f64,
    pub call_price: f64,
    pub put_price: f64,
}

impl BenchmarkQuotes {
    pub fn new(strike: f64, call_price: f64, put_price: f64) -> Self {
        Self {
            strike,
            call_price,
            put_price,
        }
    }

    /// # Errors
    /// Returns [`CalibrationError::InvalidInput`] unless strike and both
    /// prices are positive and finite.
    pub fn validate(&self) -> error::Result<()> {
        validate_positive(self.strike, "benchmark strike")?;
        validate_positive(self.call_price, "benchmark call price")?;
        validate_positive(self.put_price, "benchmark put price")?;
        Ok(())
    }
}

/// Calibrated forward and dividend yield for one tenor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForwardCalibration {
    pub spot: f64,
    pub rate: f64,
    pub expiry: f64,
    /// Benchmark strike the forward was recovered at.
    pub strike: f64,
    pub forward: f64,
    pub dividend_yield: f64,
    /// Refinement passes performed after the initial estimate.
    pub iterations: usize,
    /// American implied vol of the benchmark call at the final yield.
    pub call_vol: Vol,
    /// American implied vol of the benchmark put at the final yield.
    pub put_vol: Vol,
}

impl ForwardCalibration {
    /// Cash-equivalent dividend over the tenor: `S0·e^{rT} − F`.
    pub fn cash_dividend(&self) -> f64 {
        conventions::cash_dividend(self.spot, self.forward, self.rate, self.expiry)
    }

    /// The market environment at the calibrated dividend yield.
    ///
    /// # Errors
    /// Returns [`CalibrationError::InvalidInput`] if the stored fields were
    /// altered into an invalid environment.
    pub fn market(&self) -> error::Result<Market> {
        Market::new(self.spot, self.rate, self.dividend_yield)
    }
}

/// Mutable state of one calibration run.
#[derive(Debug, Clone, Copy)]
struct CalibrationState {
    iteration: usize,
    estimate: ParityEstimate,
}

/// Result of one pass through steps 1–4.
#[derive(Debug, Clone, Copy)]
struct ParityEstimate {
    forward: f64,
    dividend_yield: f64,
    call_vol: Vol,
    put_vol: Vol,
}

/// Forward calibration driver.
///
/// Owns the solver settings; holds no state between calls, so one instance
/// can serve many tenors, including from several threads.
///
/// # Examples
/// ```
/// use deamericanize::calibration::{BenchmarkQuotes, CalibrationConfig, Deamericanizer};
///
/// let driver = Deamericanizer::new(CalibrationConfig::with_steps(100))?;
/// let quotes = BenchmarkQuotes::new(100.0, 7.43, 6.54);
/// let fit = driver.calibrate_forward(100.0, 0.04, 0.5, 0.0, &quotes)?;
/// assert!(fit.forward > 100.0 && fit.dividend_yield > 0.0);
/// # Ok::<(), deamericanize::CalibrationError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Deamericanizer {
    config: CalibrationConfig,
    american: AmericanImpliedVol,
    european: EuropeanImpliedVol,
}

impl Default for Deamericanizer {
    fn default() -> Self {
        Self {
            config: CalibrationConfig::default(),
            american: AmericanImpliedVol::default(),
            european: EuropeanImpliedVol::default(),
        }
    }
}

impl Deamericanizer {
    /// # Errors
    /// Returns [`CalibrationError::InvalidInput`] if any setting is malformed.
    pub fn new(config: CalibrationConfig) -> error::Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            american: AmericanImpliedVol::new(config.lattice, config.bisection)?,
            european: EuropeanImpliedVol::new(config.newton)?,
        })
    }

    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    pub(crate) fn american(&self) -> &AmericanImpliedVol {
        &self.american
    }

    pub(crate) fn european(&self) -> &EuropeanImpliedVol {
        &self.european
    }

    /// Calibrate the forward and dividend yield of one tenor.
    ///
    /// # Arguments
    /// * `spot` — Underlying spot `S0` (must be > 0)
    /// * `rate` — Continuously compounded risk-free rate
    /// * `expiry` — Tenor in years (must be > 0)
    /// * `initial_dividend_yield` — Starting guess `q₀`
    /// * `quotes` — Market call and put at the benchmark strike
    ///
    /// # Errors
    /// - Solver errors for the benchmark call or put, unchanged
    /// - [`CalibrationError::OuterLoopNonConvergence`] if the forward has not
    ///   settled within `forward.max_iterations` passes
    /// - [`CalibrationError::NumericalError`] if parity yields a non-positive forward
    /// - [`CalibrationError::InvalidInput`] for invalid market data
    pub fn calibrate_forward(
        &self,
        spot: f64,
        rate: f64,
        expiry: f64,
        initial_dividend_yield: f64,
        quotes: &BenchmarkQuotes,
    ) -> error::Result<ForwardCalibration> {
        let market = Market::new(spot, rate, initial_dividend_yield)?;
        validate_positive(expiry, "expiry")?;
        quotes.validate()?;

        #[cfg(feature = "logging")]
        tracing::debug!(
            spot,
            rate,
            expiry,
            strike = quotes.strike,
            initial_dividend_yield,
            "forward calibration started"
        );

        let mut state = CalibrationState {
            iteration: 1,
            estimate: self.parity_estimate(&market, expiry, quotes)?,
        };

        let ForwardConfig {
            max_iterations,
            tolerance,
        } = self.config.forward;

        while state.iteration <= max_iterations {
            let market = market.with_dividend_yield(state.estimate.dividend_yield)?;
            let next = self.parity_estimate(&market, expiry, quotes)?;
            let delta = (next.forward - state.estimate.forward).abs();

            #[cfg(feature = "logging")]
            tracing::debug!(
                iteration = state.iteration,
                forward = next.forward,
                dividend_yield = next.dividend_yield,
                delta,
                "forward iteration"
            );

            if delta < tolerance {
                #[cfg(feature = "logging")]
                tracing::debug!(
                    iterations = state.iteration,
                    forward = next.forward,
                    dividend_yield = next.dividend_yield,
                    "forward calibration converged"
                );
                return Ok(ForwardCalibration {
                    spot,
                    rate,
                    expiry,
                    strike: quotes.strike,
                    forward: next.forward,
                    dividend_yield: next.dividend_yield,
                    iterations: state.iteration,
                    call_vol: next.call_vol,
                    put_vol: next.put_vol,
                });
            }

            state = CalibrationState {
                iteration: state.iteration + 1,
                estimate: next,
            };
        }

        Err(CalibrationError::OuterLoopNonConvergence {
            tenor: expiry,
            iterations: max_iterations,
            last_forward: state.estimate.forward,
        })
    }

    /// One pass: American vols at the market's yield, European re-pricing,
    /// parity forward, implied yield.
    fn parity_estimate(
        &self,
        market: &Market,
        expiry: f64,
        quotes: &BenchmarkQuotes,
    ) -> error::Result<ParityEstimate> {
        let strike = quotes.strike;
        let call_vol = self
            .american
            .compute(quotes.call_price, market, strike, expiry, OptionType::Call)?;
        let put_vol = self
            .american
            .compute(quotes.put_price, market, strike, expiry, OptionType::Put)?;

        let pricer = self.american.pricer();
        let call = OptionSpec::european(OptionType::Call, strike, expiry)?;
        let put = OptionSpec::european(OptionType::Put, strike, expiry)?;
        let euro_call = pricer.price(&call, market, call_vol.0)?;
        let euro_put = pricer.price(&put, market, put_vol.0)?;

        let forward =
            conventions::parity_forward(euro_call, euro_put, strike, market.rate(), expiry);
        if !forward.is_finite() || forward <= 0.0 {
            return Err(CalibrationError::NumericalError {
                message: format!(
                    "parity forward {forward} at strike {strike} cannot be inverted to a dividend yield"
                ),
            });
        }

        Ok(ParityEstimate {
            forward,
            dividend_yield: conventions::implied_dividend_yield(
                market.spot(),
                forward,
                market.rate(),
                expiry,
            ),
            call_vol,
            put_vol,
        })
    }
}
