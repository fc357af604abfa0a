//! Fee anomaly scoring
//!
//! Flags fees whose amount sits at least `threshold` standard deviations
//! from the portfolio's mean fee. The score is the absolute z-score.

use super::state::Fee;

/// A fee that crossed the threshold
#[derive(Debug, Clone, PartialEq)]
pub struct FlaggedFee {
    pub fee_id: i64,
    pub score: f64,
}

pub fn score_fees(fees: &[Fee], threshold: f64) -> Vec<FlaggedFee> {
    if fees.len() < 2 {
        return Vec::new();
    }

    let n = fees.len() as f64;
    let mean = fees.iter().map(|f| f.amount).sum::<f64>() / n;
    let variance = fees.iter().map(|f| (f.amount - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    if std_dev == 0.0 || !std_dev.is_finite() {
        return Vec::new();
    }

    fees.iter()
        .filter_map(|fee| {
            let z = ((fee.amount - mean) / std_dev).abs();
            (z >= threshold).then(|| FlaggedFee {
                fee_id: fee.id,
                score: (z * 1000.0).round() / 1000.0,
            })
        })
        .collect()
}
