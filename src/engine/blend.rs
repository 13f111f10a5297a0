/// Ensemble weights. They sum to 1, so the blend of three percentages is
/// itself a percentage.
pub const MONTE_CARLO_WEIGHT: f64 = 0.5;
pub const NEGATIVE_BINOMIAL_WEIGHT: f64 = 0.3;
pub const POISSON_WEIGHT: f64 = 0.2;

/// Fixed-weight blend of the three simulator outputs (all in percent).
pub fn blend(monte_carlo: f64, negative_binomial: f64, poisson: f64) -> f64 {
    MONTE_CARLO_WEIGHT * monte_carlo
        + NEGATIVE_BINOMIAL_WEIGHT * negative_binomial
        + POISSON_WEIGHT * poisson
}
