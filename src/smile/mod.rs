//! European-equivalent volatility smile of a calibrated tenor.
//!
//! Once the forward and dividend yield of a tenor are known, every quoted
//! American option can be converted to the European price it would have at
//! the same volatility, and that price inverted to a Black-Scholes vol. The
//! resulting points form the smile consumed by surface fitting.
//!
//! The conversion itself lives on [`Deamericanizer`](crate::calibration::Deamericanizer):
//! see [`european_vol`](crate::calibration::Deamericanizer::european_vol) and
//! [`recover_smile`](crate::calibration::Deamericanizer::recover_smile).

mod recovery;

use serde::{Deserialize, Serialize};

use crate::types::{OptionType, Strike, Vol};

/// A market American option price on a calibrated tenor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmileQuote {
    pub strike: f64,
    pub option_type: OptionType,
    pub price: f64,
}

impl SmileQuote {
    pub fn new(strike: f64, option_type: OptionType, price: f64) -> Self {
        Self {
            strike,
            option_type,
            price,
        }
    }
}

/// One recovered smile point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmilePoint {
    pub strike: Strike,
    pub option_type: OptionType,
    /// Lattice vol reproducing the American market price.
    pub american_vol: Vol,
    /// European lattice price at `american_vol`.
    pub european_price: f64,
    /// Black-Scholes vol reproducing `european_price`.
    pub european_vol: Vol,
}

/// European smile of one tenor, ordered by strike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EuropeanSmile {
    pub expiry: f64,
    pub forward: f64,
    pub points: Vec<SmilePoint>,
}

impl EuropeanSmile {
    /// `(strike, european vol)` pairs in strike order.
    pub fn vols(&self) -> Vec<(Strike, Vol)> {
        self.points
            .iter()
            .map(|p| (p.strike, p.european_vol))
            .collect()
    }

    /// Point quoted at `strike` on `option_type`, if any.
    pub fn point(&self, strike: f64, option_type: OptionType) -> Option<&SmilePoint> {
        self.points
            .iter()
            .find(|p| p.strike.0 == strike && p.option_type == option_type)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
