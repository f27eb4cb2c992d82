//! Core domain types for de-Americanization.
//!
//! # Newtype Strategy
//!
//! **Outputs use newtypes** — [`Vol`], [`Strike`], [`Tenor`] wrap solver
//! results so a recovered volatility can't be mistaken for a price or a strike.
//!
//! **Inputs use bare `f64`** or the validated [`OptionSpec`] / [`Market`]
//! records. Both records are immutable once constructed; the dividend yield,
//! which the forward calibration searches over, is changed by building a new
//! [`Market`] via [`Market::with_dividend_yield`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::conventions;
use crate::error::{self, CalibrationError};
use crate::validate::{validate_finite, validate_positive};

/// Strike price `K` of an option contract.
///
/// # Examples
/// ```
/// use deamericanize::types::Strike;
/// let strike = Strike(185.0);
/// assert_eq!(strike.0, 185.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Strike(pub f64);

/// Time to expiry `T` in years.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Tenor(pub f64);

/// Volatility `σ`, annualized. A vol of 0.20 is 20%.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Vol(pub f64);

/// Option side: call or put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    /// Right to buy at strike price.
    Call,
    /// Right to sell at strike price.
    Put,
}

impl OptionType {
    /// Payoff direction: +1 for call, -1 for put.
    pub fn phi(self) -> f64 {
        match self {
            OptionType::Call => 1.0,
            OptionType::Put => -1.0,
        }
    }

    /// Immediate-exercise value `max(φ·(S − K), 0)`.
    pub fn intrinsic(self, spot: f64, strike: f64) -> f64 {
        (self.phi() * (spot - strike)).max(0.0)
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => f.pad("call"),
            OptionType::Put => f.pad("put"),
        }
    }
}

/// Exercise style of a vanilla option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExerciseStyle {
    /// Exercise at expiry only.
    European,
    /// Exercise at any lattice node up to expiry.
    American,
}

/// Vanilla option contract: exercise style, side, strike and tenor.
///
/// # Examples
/// ```
/// use deamericanize::types::{ExerciseStyle, OptionSpec, OptionType};
///
/// let spec = OptionSpec::american(OptionType::Put, 185.0, 0.35)?;
/// assert_eq!(spec.style(), ExerciseStyle::American);
/// assert_eq!(spec.to_european().style(), ExerciseStyle::European);
/// # Ok::<(), deamericanize::CalibrationError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "OptionSpecRaw", into = "OptionSpecRaw")]
pub struct OptionSpec {
    style: ExerciseStyle,
    side: OptionType,
    strike: f64,
    expiry: f64,
}

#[derive(Serialize, Deserialize)]
struct OptionSpecRaw {
    style: ExerciseStyle,
    side: OptionType,
    strike: f64,
    expiry: f64,
}

impl TryFrom<OptionSpecRaw> for OptionSpec {
    type Error = CalibrationError;
    fn try_from(raw: OptionSpecRaw) -> Result<Self, Self::Error> {
        Self::new(raw.style, raw.side, raw.strike, raw.expiry)
    }
}

impl From<OptionSpec> for OptionSpecRaw {
    fn from(s: OptionSpec) -> Self {
        Self {
            style: s.style,
            side: s.side,
            strike: s.strike,
            expiry: s.expiry,
        }
    }
}

impl OptionSpec {
    /// Create an option specification.
    ///
    /// # Errors
    /// Returns [`CalibrationError::InvalidInput`](crate::CalibrationError::InvalidInput)
    /// if `strike` or `expiry` is not positive and finite.
    pub fn new(
        style: ExerciseStyle,
        side: OptionType,
        strike: f64,
        expiry: f64,
    ) -> error::Result<Self> {
        validate_positive(strike, "strike")?;
        validate_positive(expiry, "expiry")?;
        Ok(Self {
            style,
            side,
            strike,
            expiry,
        })
    }

    /// American option with the given side, strike and tenor.
    pub fn american(side: OptionType, strike: f64, expiry: f64) -> error::Result<Self> {
        Self::new(ExerciseStyle::American, side, strike, expiry)
    }

    /// European option with the given side, strike and tenor.
    pub fn european(side: OptionType, strike: f64, expiry: f64) -> error::Result<Self> {
        Self::new(ExerciseStyle::European, side, strike, expiry)
    }

    /// The same contract with European exercise.
    pub fn to_european(&self) -> Self {
        Self {
            style: ExerciseStyle::European,
            ..*self
        }
    }

    pub fn style(&self) -> ExerciseStyle {
        self.style
    }

    pub fn side(&self) -> OptionType {
        self.side
    }

    pub fn strike(&self) -> f64 {
        self.strike
    }

    pub fn expiry(&self) -> f64 {
        self.expiry
    }
}

/// Market environment: spot `S0`, continuously compounded rate `r` and
/// continuous dividend yield `q`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MarketRaw", into = "MarketRaw")]
pub struct Market {
    spot: f64,
    rate: f64,
    dividend_yield: f64,
}

#[derive(Serialize, Deserialize)]
struct MarketRaw {
    spot: f64,
    rate: f64,
    dividend_yield: f64,
}

impl TryFrom<MarketRaw> for Market {
    type Error = CalibrationError;
    fn try_from(raw: MarketRaw) -> Result<Self, Self::Error> {
        Self::new(raw.spot, raw.rate, raw.dividend_yield)
    }
}

impl From<Market> for MarketRaw {
    fn from(m: Market) -> Self {
        Self {
            spot: m.spot,
            rate: m.rate,
            dividend_yield: m.dividend_yield,
        }
    }
}

impl Market {
    /// Create a market environment.
    ///
    /// # Errors
    /// Returns [`CalibrationError::InvalidInput`](crate::CalibrationError::InvalidInput)
    /// if `spot` is not positive or `rate` / `dividend_yield` is not finite.
    pub fn new(spot: f64, rate: f64, dividend_yield: f64) -> error::Result<Self> {
        validate_positive(spot, "spot")?;
        validate_finite(rate, "rate")?;
        validate_finite(dividend_yield, "dividend_yield")?;
        Ok(Self {
            spot,
            rate,
            dividend_yield,
        })
    }

    /// The same spot and rate with a different dividend yield.
    ///
    /// # Errors
    /// Returns [`CalibrationError::InvalidInput`](crate::CalibrationError::InvalidInput)
    /// if `dividend_yield` is not finite.
    pub fn with_dividend_yield(&self, dividend_yield: f64) -> error::Result<Self> {
        Self::new(self.spot, self.rate, dividend_yield)
    }

    pub fn spot(&self) -> f64 {
        self.spot
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn dividend_yield(&self) -> f64 {
        self.dividend_yield
    }

    /// Forward price `S0 · exp((r − q) · T)`.
    pub fn forward(&self, expiry: f64) -> f64 {
        conventions::forward_price(self.spot, self.rate, self.dividend_yield, expiry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_type_payoff() {
        assert_eq!(OptionType::Call.phi(), 1.0);
        assert_eq!(OptionType::Put.phi(), -1.0);

        assert_eq!(OptionType::Call.intrinsic(110.0, 100.0), 10.0);
        assert_eq!(OptionType::Put.intrinsic(90.0, 100.0), 10.0);
        assert_eq!(OptionType::Call.intrinsic(90.0, 100.0), 0.0);
        assert_eq!(OptionType::Put.intrinsic(110.0, 100.0), 0.0);
    }

    #[test]
    fn option_spec_rejects_bad_inputs() {
        assert!(matches!(
            OptionSpec::american(OptionType::Call, 0.0, 1.0),
            Err(CalibrationError::InvalidInput { .. })
        ));
        assert!(OptionSpec::american(OptionType::Call, 100.0, -1.0).is_err());
        assert!(OptionSpec::american(OptionType::Call, f64::NAN, 1.0).is_err());
    }

    #[test]
    fn european_view_keeps_contract_terms() {
        let spec = OptionSpec::american(OptionType::Put, 95.0, 0.5).unwrap();
        let euro = spec.to_european();
        assert_eq!(euro.style(), ExerciseStyle::European);
        assert_eq!(euro.side(), OptionType::Put);
        assert_eq!(euro.strike(), 95.0);
        assert_eq!(euro.expiry(), 0.5);
    }

    #[test]
    fn market_with_dividend_yield_is_a_new_value() {
        let market = Market::new(100.0, 0.05, 0.0).unwrap();
        let bumped = market.with_dividend_yield(0.02).unwrap();
        assert_eq!(market.dividend_yield(), 0.0);
        assert_eq!(bumped.dividend_yield(), 0.02);
        assert_eq!(bumped.spot(), 100.0);
        assert!(bumped.forward(1.0) < market.forward(1.0));
    }

    #[test]
    fn market_rejects_non_positive_spot() {
        assert!(Market::new(0.0, 0.05, 0.0).is_err());
        assert!(Market::new(100.0, f64::INFINITY, 0.0).is_err());
    }

    #[test]
    fn serde_round_trip_spec() {
        let spec = OptionSpec::american(OptionType::Call, 185.0, 0.35).unwrap();
        let json = serde_json::to_string(&spec).unwrap();
        let back: OptionSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(spec, back);
    }

    #[test]
    fn serde_rejects_negative_strike() {
        let json = r#"{"style":"American","side":"Call","strike":-1.0,"expiry":0.5}"#;
        assert!(serde_json::from_str::<OptionSpec>(json).is_err());
    }

    #[test]
    fn serde_rejects_zero_spot() {
        let json = r#"{"spot":0.0,"rate":0.05,"dividend_yield":0.0}"#;
        assert!(serde_json::from_str::<Market>(json).is_err());
    }
}
