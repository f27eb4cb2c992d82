//! Worked example: calibrate the forward of a 127-day tenor from American
//! quotes, then recover its European smile.
//!
//! ```text
//! cargo run --example deamericanize --features logging
//! RUST_LOG=deamericanize=debug cargo run --example deamericanize --features logging
//! ```

use chrono::NaiveDate;
use deamericanize::chain::{OptionQuote, QuoteChain};
use deamericanize::conventions;
use deamericanize::{Deamericanizer, OptionType, TenorQuotes};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let spot = 177.83;
    let rate = 0.05482;
    let valuation = NaiveDate::from_ymd_opt(2023, 8, 10).ok_or("bad valuation date")?;
    let expiry_date = NaiveDate::from_ymd_opt(2023, 12, 15).ok_or("bad expiry date")?;
    let expiry = conventions::year_fraction(valuation, expiry_date);

    let chain = QuoteChain::new(
        expiry,
        vec![
            OptionQuote::new(170.0, OptionType::Put, 5.10, 820),
            OptionQuote::new(175.0, OptionType::Put, 7.05, 1_140),
            OptionQuote::new(180.0, OptionType::Call, 9.40, 1_310),
            OptionQuote::new(180.0, OptionType::Put, 9.35, 960),
            OptionQuote::new(185.0, OptionType::Call, 7.625, 2_450),
            OptionQuote::new(185.0, OptionType::Put, 11.975, 1_870),
            OptionQuote::new(190.0, OptionType::Call, 5.95, 1_620),
            OptionQuote::new(195.0, OptionType::Call, 4.55, 700),
        ],
    );

    let quotes = TenorQuotes::from_chain(&chain)?;
    let driver = Deamericanizer::default();
    let fit = driver.calibrate_forward(spot, rate, expiry, 0.0001, &quotes.benchmark)?;

    println!(
        "tenor           {:.6} y ({} days)",
        expiry,
        (expiry_date - valuation).num_days()
    );
    println!("benchmark       K = {}", fit.strike);
    println!("forward         {:.4}", fit.forward);
    println!("dividend yield  {:.6}", fit.dividend_yield);
    println!("cash dividend   {:.4}", fit.cash_dividend());
    println!("iterations      {}", fit.iterations);
    println!();
    println!(
        "{:>8} {:>5} {:>10} {:>10} {:>10}",
        "strike", "side", "am vol", "eu price", "eu vol"
    );

    for quote in &quotes.smile {
        match driver.european_vol(&fit, quote) {
            Ok(point) => println!(
                "{:>8.2} {:>5} {:>10.4} {:>10.4} {:>10.4}",
                point.strike.0,
                point.option_type,
                point.american_vol.0,
                point.european_price,
                point.european_vol.0
            ),
            Err(e) => println!("{:>8.2} {:>5} failed: {e}", quote.strike, quote.option_type),
        }
    }

    Ok(())
}
