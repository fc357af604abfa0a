//! Sample data
//!
//! Four portfolios with two years of monthly fees each. Amounts hover around
//! 0.01% of assets with one or two deliberate spikes so detection has
//! something to find.

use chrono::NaiveDate;

use super::state::{Fee, Ledger};
use crate::models::Portfolio;

const SAMPLE_PORTFOLIOS: [(&str, &str, f64); 4] = [
    ("Tech Growth Fund", "Alpha Investments", 50_000_000.0),
    ("Balanced Portfolio", "Beta Capital", 75_000_000.0),
    ("Conservative Fund", "Gamma Advisors", 30_000_000.0),
    ("Emerging Markets", "Delta Management", 40_000_000.0),
];

const MONTHS: u32 = 24;

pub fn populate(ledger: &mut Ledger) {
    let mut fee_id = 0;

    for (index, (name, manager, total_assets)) in SAMPLE_PORTFOLIOS.iter().enumerate() {
        let portfolio_id = index as i64 + 1;
        ledger.portfolios.push(Portfolio {
            id: portfolio_id,
            name: name.to_string(),
            manager: manager.to_string(),
            total_assets: *total_assets,
        });

        let base = total_assets * 0.0001;
        for month in 0..MONTHS {
            let Some(date) = NaiveDate::from_ymd_opt(2023 + (month / 12) as i32, month % 12 + 1, 1)
            else {
                continue;
            };

            let wobble = 1.0 + 0.03 * ((month as f64) * 1.7 + portfolio_id as f64).sin();
            let spike = match month {
                7 => 3.0,
                18 if portfolio_id % 2 == 0 => 2.5,
                _ => 1.0,
            };
            let amount = (base * wobble * spike * 100.0).round() / 100.0;

            fee_id += 1;
            ledger.fees.push(Fee {
                id: fee_id,
                portfolio_id,
                amount,
                date,
            });
        }
    }

    tracing::debug!(
        portfolios = ledger.portfolios.len(),
        fees = ledger.fees.len(),
        "Seeded sandbox ledger"
    );
}
