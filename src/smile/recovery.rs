use crate::calibration::{Deamericanizer, ForwardCalibration};
use crate::error;
use crate::smile::{EuropeanSmile, SmilePoint, SmileQuote};
use crate::types::{OptionSpec, Strike};

impl Deamericanizer {
    /// European-equivalent vol of one American quote on a calibrated tenor.
    ///
    /// Implies the American vol at the calibrated yield, re-prices the option
    /// as European at that vol, and inverts the European price by Newton
    /// seeded with the American vol.
    ///
    /// # Errors
    /// Solver errors for this quote, unchanged.
    pub fn european_vol(
        &self,
        calibration: &ForwardCalibration,
        quote: &SmileQuote,
    ) -> error::Result<SmilePoint> {
        let market = calibration.market()?;
        let expiry = calibration.expiry;
        let american_vol = self.american().compute(
            quote.price,
            &market,
            quote.strike,
            expiry,
            quote.option_type,
        )?;

        let option = OptionSpec::european(quote.option_type, quote.strike, expiry)?;
        let european_price = self
            .american()
            .pricer()
            .price(&option, &market, american_vol.0)?;

        let european_vol = self.european().compute(
            european_price,
            american_vol.0,
            &market,
            quote.strike,
            expiry,
            quote.option_type,
        )?;

        Ok(SmilePoint {
            strike: Strike(quote.strike),
            option_type: quote.option_type,
            american_vol,
            european_price,
            european_vol,
        })
    }

    /// European smile of a calibrated tenor.
    ///
    /// All-or-nothing: the first failing quote aborts the smile. Use
    /// [`calibrate_tenors`](Deamericanizer::calibrate_tenors) for per-strike
    /// results.
    ///
    /// # Errors
    /// The first solver error encountered, unchanged.
    pub fn recover_smile(
        &self,
        calibration: &ForwardCalibration,
        quotes: &[SmileQuote],
    ) -> error::Result<EuropeanSmile> {
        let mut points = quotes
            .iter()
            .map(|q| self.european_vol(calibration, q))
            .collect::<error::Result<Vec<_>>>()?;
        points.sort_by(|a, b| a.strike.0.total_cmp(&b.strike.0));

        #[cfg(feature = "logging")]
        tracing::debug!(
            expiry = calibration.expiry,
            points = points.len(),
            "European smile recovered"
        );

        Ok(EuropeanSmile {
            expiry: calibration.expiry,
            forward: calibration.forward,
            points,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::calibration::{BenchmarkQuotes, CalibrationConfig, Deamericanizer};
    use crate::error::CalibrationError;
    use crate::pricing::BinomialPricer;
    use crate::smile::SmileQuote;
    use crate::types::{Market, OptionSpec, OptionType};
    use approx::assert_abs_diff_eq;

    const STEPS: usize = 100;

    fn american(market: &Market, side: OptionType, strike: f64, vol: f64) -> f64 {
        let spec = OptionSpec::american(side, strike, 0.5).unwrap();
        BinomialPricer::new(STEPS).price(&spec, market, vol).unwrap()
    }

    #[test]
    fn flat_smile_is_recovered() {
        let market = Market::new(100.0, 0.04, 0.02).unwrap();
        let driver = Deamericanizer::new(CalibrationConfig::with_steps(STEPS)).unwrap();
        let benchmark = BenchmarkQuotes::new(
            100.0,
            american(&market, OptionType::Call, 100.0, 0.25),
            american(&market, OptionType::Put, 100.0, 0.25),
        );
        let fit = driver
            .calibrate_forward(100.0, 0.04, 0.5, 0.0, &benchmark)
            .unwrap();

        let quotes: Vec<SmileQuote> = [
            (110.0, OptionType::Call),
            (90.0, OptionType::Put),
            (100.0, OptionType::Put),
        ]
        .into_iter()
        .map(|(k, side)| SmileQuote::new(k, side, american(&market, side, k, 0.25)))
        .collect();

        let smile = driver.recover_smile(&fit, &quotes).unwrap();
        assert_eq!(smile.len(), 3);
        assert_eq!(smile.points[0].strike.0, 90.0);
        for point in &smile.points {
            assert_abs_diff_eq!(point.american_vol.0, 0.25, epsilon = 5e-3);
            assert_abs_diff_eq!(point.european_vol.0, 0.25, epsilon = 5e-3);
        }
    }

    #[test]
    fn failing_quote_names_its_strike() {
        let driver = Deamericanizer::new(CalibrationConfig::with_steps(STEPS)).unwrap();
        let market = Market::new(100.0, 0.04, 0.02).unwrap();
        let benchmark = BenchmarkQuotes::new(
            100.0,
            american(&market, OptionType::Call, 100.0, 0.25),
            american(&market, OptionType::Put, 100.0, 0.25),
        );
        let fit = driver
            .calibrate_forward(100.0, 0.04, 0.5, 0.0, &benchmark)
            .unwrap();

        // Below intrinsic: bisection collapses onto vol_min, where vega vanishes.
        let quotes = [SmileQuote::new(130.0, OptionType::Put, 29.0)];
        let err = driver.recover_smile(&fit, &quotes).unwrap_err();
        assert_eq!(err.instrument(), Some((OptionType::Put, 130.0)));
        assert!(!matches!(err, CalibrationError::InvalidInput { .. }));
    }
}
