//! Cox-Ross-Rubinstein binomial lattice.
//!
//! The lattice is a triangular grid of spot values: step `i` holds `i + 1`
//! nodes, node `j` having taken `i − j` up-moves and `j` down-moves, so
//!
//! ```text
//! S(i, j) = S0 · u^(i−j) · d^j,   u = exp(σ√Δt),  d = 1/u,  Δt = T/n
//! ```
//!
//! and values at a step decrease with node index. Options are valued by
//! backward induction under the risk-neutral up-probability
//!
//! ```text
//! p = (exp((r − q)Δt) − d) / (u − d)
//! ```
//!
//! American options take `max(φ·(S − K), continuation)` at every node.
//!
//! # Numerical notes
//! `p` must lie in (0, 1) for the market to be well posed. This is not
//! checked: an out-of-range `p` means the caller passed inconsistent data
//! (typically a vol too small for the carry over one step).
//!
//! Cost is O(n²) in time and memory per lattice.

use serde::{Deserialize, Serialize};

use crate::error::{self, CalibrationError};
use crate::types::{ExerciseStyle, Market, OptionSpec};
use crate::validate::{validate_count, validate_positive};

/// Default lattice depth, deep enough that discretization bias sits below
/// typical bid/ask tolerances.
pub const DEFAULT_STEPS: usize = 750;

/// Flat offset of node `(step, 0)` in triangular storage.
#[inline]
fn level_offset(step: usize) -> usize {
    step * (step + 1) / 2
}

/// A recombining binomial grid of spot values.
///
/// Fully determined by its four build parameters `(S0, σ, T, n)`.
///
/// # Examples
/// ```
/// use deamericanize::pricing::Lattice;
///
/// let lattice = Lattice::build(100.0, 0.2, 1.0, 4)?;
/// assert_eq!(lattice.spot_at(0, 0), Some(100.0));
/// assert_eq!(lattice.level(4).map(<[f64]>::len), Some(5));
/// assert!(lattice.level(5).is_none());
/// assert!(lattice.spot_at(2, 3).is_none());
/// # Ok::<(), deamericanize::CalibrationError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Lattice {
    spot: f64,
    vol: f64,
    expiry: f64,
    steps: usize,
    dt: f64,
    up: f64,
    down: f64,
    nodes: Vec<f64>,
}

impl Lattice {
    /// Build the spot grid for `steps` time steps over `expiry` years.
    ///
    /// Each step's nodes are the previous step's nodes scaled by `u`, plus a
    /// new bottom node: the previous bottom node scaled by `d`.
    ///
    /// # Errors
    /// Returns [`CalibrationError::InvalidInput`] if `spot`, `vol` or `expiry`
    /// is not positive and finite, or if `steps` is zero.
    pub fn build(spot: f64, vol: f64, expiry: f64, steps: usize) -> error::Result<Self> {
        validate_positive(spot, "spot")?;
        validate_positive(vol, "vol")?;
        validate_positive(expiry, "expiry")?;
        validate_count(steps, "lattice steps")?;

        let dt = expiry / steps as f64;
        let up = (vol * dt.sqrt()).exp();
        let down = 1.0 / up;

        let mut nodes = Vec::with_capacity(level_offset(steps + 1));
        nodes.push(spot);
        for step in 1..=steps {
            let prev = level_offset(step - 1);
            for node in 0..step {
                let s = nodes[prev + node] * up;
                nodes.push(s);
            }
            let bottom = nodes[prev + step - 1] * down;
            nodes.push(bottom);
        }

        Ok(Self {
            spot,
            vol,
            expiry,
            steps,
            dt,
            up,
            down,
            nodes,
        })
    }

    /// Number of time steps `n`.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Time increment `Δt = T / n`.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Up-factor `u`.
    pub fn up(&self) -> f64 {
        self.up
    }

    /// Down-factor `d = 1/u`.
    pub fn down(&self) -> f64 {
        self.down
    }

    pub fn spot(&self) -> f64 {
        self.spot
    }

    pub fn vol(&self) -> f64 {
        self.vol
    }

    pub fn expiry(&self) -> f64 {
        self.expiry
    }

    /// Spot value at `(step, node)`, or `None` outside the triangle.
    pub fn spot_at(&self, step: usize, node: usize) -> Option<f64> {
        if step > self.steps || node > step {
            return None;
        }
        Some(self.nodes[level_offset(step) + node])
    }

    /// All spot values at a time step, highest first, or `None` past the
    /// last step.
    pub fn level(&self, step: usize) -> Option<&[f64]> {
        if step > self.steps {
            return None;
        }
        Some(self.row(step))
    }

    /// Level `step`; callers keep `step <= self.steps`.
    fn row(&self, step: usize) -> &[f64] {
        let start = level_offset(step);
        &self.nodes[start..start + step + 1]
    }

    /// Risk-neutral up-probability for the given carry.
    pub fn up_probability(&self, rate: f64, dividend_yield: f64) -> f64 {
        (((rate - dividend_yield) * self.dt).exp() - self.down) / (self.up - self.down)
    }

    /// Value an option on this lattice by backward induction.
    ///
    /// # Errors
    /// Returns [`CalibrationError::InvalidInput`] if the option tenor or the
    /// market spot differ from the ones this lattice was built with.
    pub fn value(&self, option: &OptionSpec, market: &Market) -> error::Result<f64> {
        if !same_value(option.expiry(), self.expiry) || !same_value(market.spot(), self.spot) {
            return Err(CalibrationError::InvalidInput {
                message: format!(
                    "lattice built for spot {} and expiry {} cannot value spot {} and expiry {}",
                    self.spot,
                    self.expiry,
                    market.spot(),
                    option.expiry()
                ),
            });
        }

        let side = option.side();
        let strike = option.strike();
        let american = option.style() == ExerciseStyle::American;
        let phi = side.phi();

        let p = self.up_probability(market.rate(), market.dividend_yield());
        let disc = (-market.rate() * self.dt).exp();
        let disc_up = disc * p;
        let disc_down = disc * (1.0 - p);

        let mut values: Vec<f64> = self
            .row(self.steps)
            .iter()
            .map(|&s| side.intrinsic(s, strike))
            .collect();

        for step in (0..self.steps).rev() {
            for (node, &s) in self.row(step).iter().enumerate() {
                let continuation = disc_up * values[node] + disc_down * values[node + 1];
                values[node] = if american {
                    continuation.max(phi * (s - strike))
                } else {
                    continuation
                };
            }
        }

        Ok(values[0])
    }
}

fn same_value(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-12 * a.abs().max(b.abs()).max(1.0)
}

/// Binomial lattice pricer with a configurable depth.
///
/// # Examples
/// ```
/// use deamericanize::pricing::BinomialPricer;
/// use deamericanize::types::{Market, OptionSpec, OptionType};
///
/// let market = Market::new(100.0, 0.05, 0.0)?;
/// let put = OptionSpec::american(OptionType::Put, 100.0, 1.0)?;
///
/// let american = BinomialPricer::new(200).price(&put, &market, 0.2)?;
/// let european = BinomialPricer::new(200).price(&put.to_european(), &market, 0.2)?;
/// assert!(american > european);
/// # Ok::<(), deamericanize::CalibrationError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinomialPricer {
    /// Number of time steps `n`.
    pub steps: usize,
}

impl Default for BinomialPricer {
    fn default() -> Self {
        Self {
            steps: DEFAULT_STEPS,
        }
    }
}

impl BinomialPricer {
    /// Pricer with `steps` time steps.
    pub fn new(steps: usize) -> Self {
        Self { steps }
    }

    /// Reject a zero-depth lattice.
    ///
    /// # Errors
    /// Returns [`CalibrationError::InvalidInput`] if `steps` is zero.
    pub fn validate(&self) -> error::Result<()> {
        validate_count(self.steps, "lattice steps").map(|_| ())
    }

    /// Price `option` at volatility `vol`.
    ///
    /// # Errors
    /// Returns [`CalibrationError::InvalidInput`] for a non-positive `vol` or
    /// a zero-depth lattice.
    pub fn price(&self, option: &OptionSpec, market: &Market, vol: f64) -> error::Result<f64> {
        Lattice::build(market.spot(), vol, option.expiry(), self.steps)?
            .value(option, market)
    }
}

/// Price a vanilla option on a fresh `steps`-deep lattice.
///
/// # Errors
/// See [`BinomialPricer::price`].
pub fn lattice_price(
    option: &OptionSpec,
    market: &Market,
    vol: f64,
    steps: usize,
) -> error::Result<f64> {
    BinomialPricer::new(steps).price(option, market, vol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::black_scholes::bs_price;
    use crate::types::OptionType;
    use approx::assert_abs_diff_eq;

    fn market(q: f64) -> Market {
        Market::new(100.0, 0.05, q).unwrap()
    }

    #[test]
    fn grid_shape_and_root() {
        let lattice = Lattice::build(100.0, 0.25, 0.5, 10).unwrap();
        assert_eq!(lattice.steps(), 10);
        assert_eq!(lattice.spot_at(0, 0), Some(100.0));
        for step in 0..=10 {
            assert_eq!(lattice.level(step).unwrap().len(), step + 1);
        }
        assert!(lattice.level(11).is_none());
        assert!(lattice.spot_at(11, 0).is_none());
        assert_abs_diff_eq!(lattice.up() * lattice.down(), 1.0, epsilon = 1e-15);
    }

    #[test]
    fn levels_decrease_with_node_index() {
        let lattice = Lattice::build(177.83, 0.22, 0.35, 50).unwrap();
        for step in 1..=50 {
            let level = lattice.level(step).unwrap();
            assert!(level.windows(2).all(|w| w[0] > w[1]), "step {step} not decreasing");
        }
    }

    #[test]
    fn nodes_match_closed_form() {
        let lattice = Lattice::build(100.0, 0.3, 1.0, 20).unwrap();
        let (u, d) = (lattice.up(), lattice.down());
        for step in [1, 7, 20] {
            for node in 0..=step {
                let expected = 100.0 * u.powi((step - node) as i32) * d.powi(node as i32);
                assert_abs_diff_eq!(
                    lattice.spot_at(step, node).unwrap(),
                    expected,
                    epsilon = 1e-9
                );
            }
        }
    }

    #[test]
    fn recombines_after_up_down() {
        // An up then a down move returns to the root level.
        let lattice = Lattice::build(100.0, 0.2, 1.0, 4).unwrap();
        assert_abs_diff_eq!(lattice.spot_at(2, 1).unwrap(), 100.0, epsilon = 1e-12);
        assert_abs_diff_eq!(lattice.spot_at(4, 2).unwrap(), 100.0, epsilon = 1e-12);
    }

    #[test]
    fn build_rejects_bad_parameters() {
        assert!(Lattice::build(100.0, 0.2, 1.0, 0).is_err());
        assert!(Lattice::build(100.0, 0.0, 1.0, 10).is_err());
        assert!(Lattice::build(-1.0, 0.2, 1.0, 10).is_err());
        assert!(Lattice::build(100.0, 0.2, 0.0, 10).is_err());
    }

    #[test]
    fn european_converges_to_black_scholes() {
        let m = market(0.02);
        for side in [OptionType::Call, OptionType::Put] {
            let spec = OptionSpec::european(side, 105.0, 1.0).unwrap();
            let tree = lattice_price(&spec, &m, 0.2, 750).unwrap();
            let closed = bs_price(&m, 105.0, 1.0, 0.2, side);
            assert_abs_diff_eq!(tree, closed, epsilon = 0.01);
        }
    }

    #[test]
    fn american_call_without_dividends_equals_european() {
        let m = market(0.0);
        let call = OptionSpec::american(OptionType::Call, 100.0, 1.0).unwrap();
        let american = lattice_price(&call, &m, 0.2, 300).unwrap();
        let european = lattice_price(&call.to_european(), &m, 0.2, 300).unwrap();
        assert_abs_diff_eq!(american, european, epsilon = 1e-10);
    }

    #[test]
    fn american_put_carries_early_exercise_premium() {
        let m = market(0.0);
        let put = OptionSpec::american(OptionType::Put, 110.0, 1.0).unwrap();
        let american = lattice_price(&put, &m, 0.2, 300).unwrap();
        let european = lattice_price(&put.to_european(), &m, 0.2, 300).unwrap();
        assert!(american > european + 0.1);
        assert!(american >= 10.0, "never below intrinsic");
    }

    #[test]
    fn european_lattice_satisfies_put_call_parity() {
        let m = market(0.03);
        let call = OptionSpec::european(OptionType::Call, 95.0, 0.75).unwrap();
        let put = OptionSpec::european(OptionType::Put, 95.0, 0.75).unwrap();
        let c = lattice_price(&call, &m, 0.3, 200).unwrap();
        let p = lattice_price(&put, &m, 0.3, 200).unwrap();
        let parity = 100.0 * (-0.03_f64 * 0.75).exp() - 95.0 * (-0.05_f64 * 0.75).exp();
        assert_abs_diff_eq!(c - p, parity, epsilon = 1e-9);
    }

    #[test]
    fn value_rejects_mismatched_tenor() {
        let lattice = Lattice::build(100.0, 0.2, 1.0, 10).unwrap();
        let spec = OptionSpec::american(OptionType::Call, 100.0, 0.5).unwrap();
        assert!(matches!(
            lattice.value(&spec, &market(0.0)),
            Err(CalibrationError::InvalidInput { .. })
        ));
    }

    #[test]
    fn pricer_default_depth() {
        assert_eq!(BinomialPricer::default().steps, DEFAULT_STEPS);
        assert!(BinomialPricer::new(0).validate().is_err());
    }
}
