//! Option quotes of one expiry and benchmark-strike selection.
//!
//! The forward is calibrated from a single call/put pair, the benchmark. The
//! pair is taken at the most liquid strike: among strikes quoting both sides,
//! the one with the largest combined volume.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::calibration::BenchmarkQuotes;
use crate::error::{self, CalibrationError};
use crate::smile::SmileQuote;
use crate::types::OptionType;
use crate::validate::validate_positive;

/// A single American option quote.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionQuote {
    pub strike: f64,
    pub option_type: OptionType,
    pub price: f64,
    /// Traded volume, used for benchmark selection.
    pub volume: u64,
}

impl OptionQuote {
    pub fn new(strike: f64, option_type: OptionType, price: f64, volume: u64) -> Self {
        Self {
            strike,
            option_type,
            price,
            volume,
        }
    }
}

/// All quotes sharing one expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteChain {
    /// Time to expiry in years.
    pub expiry: f64,
    pub quotes: Vec<OptionQuote>,
}

/// Most liquid call and put seen at one strike.
#[derive(Debug, Default, Clone, Copy)]
struct StrikeSides {
    call: Option<OptionQuote>,
    put: Option<OptionQuote>,
}

impl StrikeSides {
    fn insert(&mut self, quote: OptionQuote) {
        let slot = match quote.option_type {
            OptionType::Call => &mut self.call,
            OptionType::Put => &mut self.put,
        };
        if slot.is_none_or(|q| quote.volume > q.volume) {
            *slot = Some(quote);
        }
    }
}

impl QuoteChain {
    pub fn new(expiry: f64, quotes: Vec<OptionQuote>) -> Self {
        Self { expiry, quotes }
    }

    /// Call/put pair at the strike with the largest combined volume.
    ///
    /// Only strikes quoting both sides qualify. Ties go to the lowest strike.
    /// Duplicate quotes on the same side keep the higher-volume one.
    ///
    /// # Errors
    /// Returns [`CalibrationError::InvalidInput`] if a strike is not positive
    /// and finite, or if no strike quotes both a call and a put.
    pub fn benchmark(&self) -> error::Result<BenchmarkQuotes> {
        let mut by_strike: BTreeMap<u64, StrikeSides> = BTreeMap::new();
        for quote in &self.quotes {
            validate_positive(quote.strike, "quote strike")?;
            // Positive finite f64 bit patterns sort like the values.
            by_strike
                .entry(quote.strike.to_bits())
                .or_default()
                .insert(*quote);
        }

        let mut best: Option<(u64, BenchmarkQuotes)> = None;
        for sides in by_strike.values() {
            let (Some(call), Some(put)) = (sides.call, sides.put) else {
                continue;
            };
            let volume = call.volume.saturating_add(put.volume);
            if best.is_none_or(|(v, _)| volume > v) {
                best = Some((
                    volume,
                    BenchmarkQuotes::new(call.strike, call.price, put.price),
                ));
            }
        }

        best.map(|(_, quotes)| quotes)
            .ok_or_else(|| CalibrationError::InvalidInput {
                message: format!(
                    "no strike quotes both a call and a put at expiry {}",
                    self.expiry
                ),
            })
    }

    /// Every quote as a smile input.
    pub fn smile_quotes(&self) -> Vec<SmileQuote> {
        self.quotes
            .iter()
            .map(|q| SmileQuote::new(q.strike, q.option_type, q.price))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(quotes: &[(f64, OptionType, f64, u64)]) -> QuoteChain {
        QuoteChain::new(
            0.5,
            quotes
                .iter()
                .map(|&(k, side, price, volume)| OptionQuote::new(k, side, price, volume))
                .collect(),
        )
    }

    #[test]
    fn picks_largest_combined_volume() {
        let c = chain(&[
            (95.0, OptionType::Call, 8.0, 500),
            (95.0, OptionType::Put, 3.0, 100),
            (100.0, OptionType::Call, 5.0, 400),
            (100.0, OptionType::Put, 5.5, 350),
            // Huge one-sided volume does not qualify.
            (105.0, OptionType::Call, 2.5, 10_000),
        ]);
        let b = c.benchmark().unwrap();
        assert_eq!(b, BenchmarkQuotes::new(100.0, 5.0, 5.5));
    }

    #[test]
    fn ties_go_to_the_lowest_strike() {
        let c = chain(&[
            (110.0, OptionType::Call, 1.0, 50),
            (110.0, OptionType::Put, 9.0, 50),
            (90.0, OptionType::Call, 11.0, 60),
            (90.0, OptionType::Put, 1.0, 40),
        ]);
        assert_eq!(c.benchmark().unwrap().strike, 90.0);
    }

    #[test]
    fn duplicate_side_keeps_most_liquid() {
        let c = chain(&[
            (100.0, OptionType::Call, 5.0, 10),
            (100.0, OptionType::Call, 5.2, 90),
            (100.0, OptionType::Put, 4.8, 20),
        ]);
        assert_eq!(c.benchmark().unwrap().call_price, 5.2);
    }

    #[test]
    fn one_sided_chain_is_rejected() {
        let c = chain(&[
            (100.0, OptionType::Call, 5.0, 10),
            (105.0, OptionType::Put, 6.0, 10),
        ]);
        assert!(matches!(
            c.benchmark(),
            Err(CalibrationError::InvalidInput { .. })
        ));
    }

    #[test]
    fn bad_strike_is_rejected() {
        let c = chain(&[(f64::NAN, OptionType::Call, 5.0, 10)]);
        assert!(c.benchmark().is_err());
    }

    #[test]
    fn smile_quotes_keep_every_quote() {
        let c = chain(&[
            (95.0, OptionType::Put, 3.0, 1),
            (105.0, OptionType::Call, 2.5, 0),
        ]);
        let quotes = c.smile_quotes();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[1], SmileQuote::new(105.0, OptionType::Call, 2.5));
    }
}
