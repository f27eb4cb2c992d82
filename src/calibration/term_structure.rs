//! Independent calibration of many tenors.
//!
//! Each tenor is calibrated on its own, with no shared state, so tenors run
//! in parallel under the `parallel` feature. Failures are kept per tenor and
//! per strike: a tenor whose forward does not converge, or a strike whose
//! vol cannot be recovered, leaves every other result intact.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::calibration::driver::{BenchmarkQuotes, Deamericanizer, ForwardCalibration};
use crate::chain::QuoteChain;
use crate::error;
use crate::smile::{SmilePoint, SmileQuote};
use crate::types::Tenor;

/// Quotes of one tenor: the benchmark pair and the strikes to recover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenorQuotes {
    pub expiry: f64,
    pub benchmark: BenchmarkQuotes,
    pub smile: Vec<SmileQuote>,
}

impl TenorQuotes {
    /// Benchmark pair and smile inputs of a quote chain.
    ///
    /// # Errors
    /// Propagates [`QuoteChain::benchmark`] errors.
    pub fn from_chain(chain: &QuoteChain) -> error::Result<Self> {
        Ok(Self {
            expiry: chain.expiry,
            benchmark: chain.benchmark()?,
            smile: chain.smile_quotes(),
        })
    }
}

/// Outcome of one tenor.
#[derive(Debug, Clone, PartialEq)]
pub struct TenorCalibration {
    pub expiry: f64,
    pub forward: error::Result<ForwardCalibration>,
    /// One result per smile quote, in quote order. Empty if the forward failed.
    pub smile: Vec<error::Result<SmilePoint>>,
}

impl TenorCalibration {
    /// Successfully recovered smile points.
    pub fn points(&self) -> impl Iterator<Item = &SmilePoint> {
        self.smile.iter().filter_map(|r| r.as_ref().ok())
    }
}

/// One row of the calibrated forward curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForwardPoint {
    pub tenor: Tenor,
    pub forward: f64,
    pub dividend_yield: f64,
    pub cash_dividend: f64,
}

/// Forward curve rows of the tenors that calibrated, in tenor order.
pub fn forward_points(results: &[TenorCalibration]) -> Vec<ForwardPoint> {
    results
        .iter()
        .filter_map(|r| r.forward.as_ref().ok())
        .map(|fit| ForwardPoint {
            tenor: Tenor(fit.expiry),
            forward: fit.forward,
            dividend_yield: fit.dividend_yield,
            cash_dividend: fit.cash_dividend(),
        })
        .collect()
}

impl Deamericanizer {
    /// Calibrate every tenor, then recover its smile.
    ///
    /// Every tenor starts from the same `initial_dividend_yield`. Results are
    /// sorted by expiry.
    pub fn calibrate_tenors(
        &self,
        spot: f64,
        rate: f64,
        initial_dividend_yield: f64,
        tenors: &[TenorQuotes],
    ) -> Vec<TenorCalibration> {
        let calibrate_tenor = |tenor: &TenorQuotes| -> TenorCalibration {
            let forward = self.calibrate_forward(
                spot,
                rate,
                tenor.expiry,
                initial_dividend_yield,
                &tenor.benchmark,
            );
            let smile = match &forward {
                Ok(fit) => tenor
                    .smile
                    .iter()
                    .map(|quote| self.european_vol(fit, quote))
                    .collect(),
                Err(_e) => {
                    #[cfg(feature = "logging")]
                    tracing::warn!(
                        expiry = tenor.expiry,
                        error = %_e,
                        "tenor calibration failed"
                    );
                    Vec::new()
                }
            };
            TenorCalibration {
                expiry: tenor.expiry,
                forward,
                smile,
            }
        };

        #[cfg(feature = "parallel")]
        let mut results: Vec<TenorCalibration> = tenors.par_iter().map(calibrate_tenor).collect();
        #[cfg(not(feature = "parallel"))]
        let mut results: Vec<TenorCalibration> = tenors.iter().map(calibrate_tenor).collect();

        results.sort_by(|a, b| a.expiry.total_cmp(&b.expiry));

        #[cfg(feature = "logging")]
        tracing::debug!(
            n_tenors = results.len(),
            n_failed = results.iter().filter(|r| r.forward.is_err()).count(),
            "term structure calibration complete"
        );

        results
    }
}
