//! Run-total simulators.
//!
//! Each simulator estimates P(home + away > line) by drawing `draw_count`
//! independent game totals and counting strict exceedances of the line:
//! - **Monte Carlo**: per-team runs ~ Normal(mean, σ); continuous, symmetric.
//! - **Negative binomial**: per-team runs ~ NB(r, p = r / (r + mean)), drawn
//!   as a gamma-Poisson mixture; keeps the mean and adds overdispersion
//!   (variance = mean + mean²/r).
//! - **Poisson**: per-team runs ~ Poisson(mean); the equal mean/variance
//!   baseline.
//!
//! Every call owns its own seeded generator. Nothing here touches ambient
//! global randomness.

use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use statrs::distribution::{Gamma, Normal, Poisson};

use super::error::{PredictionError, Result};
use crate::model::{Side, SimulationConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatorKind {
    MonteCarlo,
    NegativeBinomial,
    Poisson,
}

impl SimulatorKind {
    pub const ALL: [SimulatorKind; 3] = [
        SimulatorKind::MonteCarlo,
        SimulatorKind::NegativeBinomial,
        SimulatorKind::Poisson,
    ];

    /// Stream id mixed into the base seed so the three simulators never share
    /// a random sequence.
    fn stream_id(self) -> u64 {
        match self {
            SimulatorKind::MonteCarlo => 0x4d43,
            SimulatorKind::NegativeBinomial => 0x4e42,
            SimulatorKind::Poisson => 0x504f,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SimulatorKind::MonteCarlo => "monte_carlo",
            SimulatorKind::NegativeBinomial => "negative_binomial",
            SimulatorKind::Poisson => "poisson",
        }
    }
}

/// Source of simulated game totals (home + away runs for one draw).
pub trait ScoreSampler {
    fn sample_total<R: Rng + ?Sized>(&self, rng: &mut R) -> f64;
}

pub struct NormalTotals {
    home: Normal,
    away: Normal,
}

impl NormalTotals {
    pub fn new(home_mean: f64, away_mean: f64, std_dev: f64) -> Result<Self> {
        Ok(NormalTotals {
            home: Normal::new(home_mean, std_dev).map_err(distribution_err)?,
            away: Normal::new(away_mean, std_dev).map_err(distribution_err)?,
        })
    }
}

impl ScoreSampler for NormalTotals {
    fn sample_total<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let home: f64 = self.home.sample(rng);
        let away: f64 = self.away.sample(rng);
        home + away
    }
}

/// Negative binomial drawn as a gamma-Poisson mixture: λ ~ Gamma(shape = r,
/// rate = p/(1 − p)), runs ~ Poisson(λ). E[λ] = r(1 − p)/p = mean.
pub struct NegativeBinomialTotals {
    home: Gamma,
    away: Gamma,
}

impl NegativeBinomialTotals {
    /// `dispersion` is the fixed `r`; each side's success probability is
    /// chosen so that the distribution mean equals that side's estimate.
    pub fn new(home_mean: f64, away_mean: f64, dispersion: f64) -> Result<Self> {
        ensure_positive_mean(Side::Home, home_mean)?;
        ensure_positive_mean(Side::Away, away_mean)?;
        Ok(NegativeBinomialTotals {
            home: mixing_gamma(dispersion, home_mean)?,
            away: mixing_gamma(dispersion, away_mean)?,
        })
    }
}

fn mixing_gamma(dispersion: f64, mean: f64) -> Result<Gamma> {
    let p = success_probability(dispersion, mean);
    Gamma::new(dispersion, p / (1.0 - p)).map_err(distribution_err)
}

fn mixed_poisson_draw<R: Rng + ?Sized>(gamma: &Gamma, rng: &mut R) -> f64 {
    let lambda: f64 = gamma.sample(rng);
    match Poisson::new(lambda) {
        Ok(poisson) => {
            let runs: f64 = poisson.sample(rng);
            runs
        }
        // λ underflowed to zero: a Poisson(0) draw is 0.
        Err(_) => 0.0,
    }
}

impl ScoreSampler for NegativeBinomialTotals {
    fn sample_total<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        mixed_poisson_draw(&self.home, rng) + mixed_poisson_draw(&self.away, rng)
    }
}

pub struct PoissonTotals {
    home: Poisson,
    away: Poisson,
}

impl PoissonTotals {
    pub fn new(home_mean: f64, away_mean: f64) -> Result<Self> {
        ensure_positive_mean(Side::Home, home_mean)?;
        ensure_positive_mean(Side::Away, away_mean)?;
        Ok(PoissonTotals {
            home: Poisson::new(home_mean).map_err(distribution_err)?,
            away: Poisson::new(away_mean).map_err(distribution_err)?,
        })
    }
}

impl ScoreSampler for PoissonTotals {
    fn sample_total<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let home: f64 = self.home.sample(rng);
        let away: f64 = self.away.sample(rng);
        home + away
    }
}

/// `p = r / (r + mean)`, so that `r(1 − p)/p == mean`.
pub fn success_probability(dispersion: f64, mean: f64) -> f64 {
    dispersion / (dispersion + mean)
}

/// Percentage (0–100) of `draws` sampled totals strictly greater than `line`.
/// A total exactly equal to the line does not count.
pub fn exceedance_probability<S, R>(sampler: &S, line: f64, draws: usize, rng: &mut R) -> f64
where
    S: ScoreSampler,
    R: Rng + ?Sized,
{
    if draws == 0 {
        return 0.0;
    }
    let hits = (0..draws)
        .filter(|_| sampler.sample_total(rng) > line)
        .count();
    hits as f64 / draws as f64 * 100.0
}

/// Run one simulator of `kind` and return P(total > line) in percent.
///
/// `seed` is the base seed of the prediction call; the simulator derives its
/// own stream from it.
pub fn simulate(
    kind: SimulatorKind,
    home_mean: f64,
    away_mean: f64,
    line: f64,
    config: &SimulationConfig,
    seed: u64,
) -> Result<f64> {
    if config.draw_count == 0 {
        return Err(PredictionError::invalid(
            "drawCount",
            0.0,
            "must be a positive integer",
        ));
    }
    let mut rng = stream_rng(seed, kind);
    let draws = config.draw_count;

    let p = match kind {
        SimulatorKind::MonteCarlo => {
            let sampler = NormalTotals::new(home_mean, away_mean, config.monte_carlo_std_dev)?;
            exceedance_probability(&sampler, line, draws, &mut rng)
        }
        SimulatorKind::NegativeBinomial => {
            let sampler = NegativeBinomialTotals::new(
                home_mean,
                away_mean,
                config.negative_binomial_dispersion,
            )?;
            exceedance_probability(&sampler, line, draws, &mut rng)
        }
        SimulatorKind::Poisson => {
            let sampler = PoissonTotals::new(home_mean, away_mean)?;
            exceedance_probability(&sampler, line, draws, &mut rng)
        }
    };
    Ok(p.clamp(0.0, 100.0))
}

/// Independent generator for one simulator, derived from the call's base seed.
pub fn stream_rng(seed: u64, kind: SimulatorKind) -> StdRng {
    StdRng::seed_from_u64(splitmix64(seed ^ kind.stream_id().rotate_left(32)))
}

/// splitmix64 finaliser: spreads nearby seeds across the whole u64 range.
fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Rejects expected runs at or below zero, which leave the negative binomial
/// (p >= 1) and Poisson (constant zero) degenerate.
pub(crate) fn ensure_positive_mean(team: Side, mean: f64) -> Result<()> {
    if mean > 0.0 && mean.is_finite() {
        Ok(())
    } else {
        Err(PredictionError::DegenerateMean { team, mean })
    }
}

fn distribution_err(e: impl std::fmt::Display) -> PredictionError {
    PredictionError::Distribution(e.to_string())
}
