//! Star rating (1.0–5.0) from the blended probability plus corroborating
//! signals.
//!
//! A probability of 50% maps to a neutral 3 stars, each 12.5 points away from
//! 50 moves the base one star. The adjustment then rewards signals that agree
//! with the call. The over and under branches deliberately weight those
//! signals differently; the coefficients are calibrated and must not be
//! symmetrised.

use crate::model::{MatchupInput, RatingSignals, TeamInput};

pub const MIN_STARS: f64 = 1.0;
pub const MAX_STARS: f64 = 5.0;
const NEUTRAL_STARS: f64 = 3.0;
/// Probability points per star away from 50%.
const POINTS_PER_STAR: f64 = 12.5;

/// Divisor turning (combined runs − line) into `mean_diff`.
const MEAN_DIFF_SCALE: f64 = 3.0;
/// Divisor turning summed time-slot/season drift into `trend_strength`.
const TREND_SCALE: f64 = 5.0;

struct BranchWeights {
    mean_diff: f64,
    over_consistency: f64,
    volatility: f64,
    trend: f64,
}

const OVER_WEIGHTS: BranchWeights = BranchWeights {
    mean_diff: 0.5,
    over_consistency: 0.7,
    volatility: 0.3,
    trend: 0.4,
};

const UNDER_WEIGHTS: BranchWeights = BranchWeights {
    mean_diff: -0.6,
    over_consistency: -0.5,
    volatility: -0.4,
    trend: -0.3,
};

/// Map the final probability (percent) and signals to a star rating,
/// rounded to one decimal and clamped to [1.0, 5.0].
pub fn rate(final_probability: f64, signals: &RatingSignals) -> f64 {
    let (base, w) = if final_probability >= 50.0 {
        (
            NEUTRAL_STARS + (final_probability - 50.0) / POINTS_PER_STAR,
            &OVER_WEIGHTS,
        )
    } else {
        (
            NEUTRAL_STARS - (50.0 - final_probability) / POINTS_PER_STAR,
            &UNDER_WEIGHTS,
        )
    };

    let adj = w.mean_diff * signals.mean_diff
        + w.over_consistency * signals.over_consistency
        + w.volatility * signals.volatility.ln_1p()
        + w.trend * signals.trend_strength;

    round_one_decimal(base + adj).clamp(MIN_STARS, MAX_STARS)
}

/// Derive the rating signals from raw team data and the combined estimate.
pub fn signals(matchup: &MatchupInput, combined_expected_runs: f64) -> RatingSignals {
    let (home, away) = (&matchup.home, &matchup.away);
    RatingSignals {
        mean_diff: (combined_expected_runs - matchup.line) / MEAN_DIFF_SCALE,
        over_consistency: home.over_rate + away.over_rate - 1.0,
        volatility: (scoring_spread(home) + scoring_spread(away)) / 2.0,
        trend_strength: (trend(home) + trend(away)) / TREND_SCALE,
    }
}

fn scoring_spread(team: &TeamInput) -> f64 {
    sample_std_dev(&[team.time_slot_average, team.season_average])
}

fn trend(team: &TeamInput) -> f64 {
    team.time_slot_average - team.season_average
}

/// Sample (n − 1) standard deviation; 0 for fewer than two values.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (ss / (n - 1.0)).sqrt()
}

fn round_one_decimal(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
