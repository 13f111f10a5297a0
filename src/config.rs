use clap::Parser;
use std::path::PathBuf;

use crate::model::{
    SimulationConfig, DEFAULT_DRAW_COUNT, DEFAULT_MAX_DRAW_COUNT, DEFAULT_MC_STD_DEV,
    DEFAULT_NB_DISPERSION,
};

/// MLB over/under prediction engine
#[derive(Parser, Debug, Clone)]
#[command(name = "mlb-totals", version, about)]
pub struct Config {
    /// Prediction service listen address
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen_addr: String,

    /// Draws per simulator
    #[arg(long, env = "DRAW_COUNT", default_value_t = DEFAULT_DRAW_COUNT)]
    pub draw_count: usize,

    /// Upper bound on draws per simulator, for the server default and for
    /// every request override
    #[arg(long, env = "MAX_DRAW_COUNT", default_value_t = DEFAULT_MAX_DRAW_COUNT)]
    pub max_draw_count: usize,

    /// Per-team standard deviation (runs) of the Monte Carlo normal model
    #[arg(long, env = "MC_STD_DEV", default_value_t = DEFAULT_MC_STD_DEV)]
    pub mc_std_dev: f64,

    /// Negative-binomial dispersion r
    #[arg(long, env = "NB_DISPERSION", default_value_t = DEFAULT_NB_DISPERSION)]
    pub nb_dispersion: f64,

    /// Base seed for all simulators (random per call when unset)
    #[arg(long, env = "SEED")]
    pub seed: Option<u64>,

    /// One-shot mode: read a matchup JSON file, print the prediction, exit
    #[arg(long, env = "INPUT")]
    pub input: Option<PathBuf>,

    /// With --input, run advanced and basic mode and print both
    #[arg(long, default_value = "false")]
    pub compare: bool,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.draw_count == 0 {
            anyhow::bail!("draw_count must be positive");
        }
        if self.max_draw_count == 0 {
            anyhow::bail!("max_draw_count must be positive");
        }
        if self.draw_count > self.max_draw_count {
            anyhow::bail!(
                "draw_count ({}) exceeds max_draw_count ({})",
                self.draw_count,
                self.max_draw_count
            );
        }
        if !(self.mc_std_dev.is_finite() && self.mc_std_dev > 0.0) {
            anyhow::bail!("mc_std_dev must be positive");
        }
        if !(self.nb_dispersion.is_finite() && self.nb_dispersion > 0.0) {
            anyhow::bail!("nb_dispersion must be positive");
        }
        if self.compare && self.input.is_none() {
            anyhow::bail!("--compare only applies together with --input");
        }
        Ok(())
    }

    /// Process-wide default simulation settings.
    pub fn simulation(&self) -> SimulationConfig {
        SimulationConfig {
            draw_count: self.draw_count,
            monte_carlo_std_dev: self.mc_std_dev,
            negative_binomial_dispersion: self.nb_dispersion,
            max_draw_count: self.max_draw_count,
            seed: self.seed,
        }
    }
}
