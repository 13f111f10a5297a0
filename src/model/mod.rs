use serde::{Deserialize, Serialize};
use std::fmt;

/// Draws per simulator when the caller does not say otherwise.
pub const DEFAULT_DRAW_COUNT: usize = 50_000;
/// Per-team standard deviation (runs) for the Monte Carlo normal model.
pub const DEFAULT_MC_STD_DEV: f64 = 3.8;
/// Fixed negative-binomial dispersion `r` shared by both teams.
pub const DEFAULT_NB_DISPERSION: f64 = 5.3;
/// Upper bound on `draw_count`; keeps worst-case latency of one call bounded.
pub const DEFAULT_MAX_DRAW_COUNT: usize = 2_000_000;

/// Starting pitcher of one side. Only consulted in advanced mode, where it is
/// the *opponent's* pitcher that suppresses a team's run estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PitcherInput {
    /// Earned run average
    pub era: f64,
    /// Batting average against (0.0–1.0)
    pub batting_average_against: f64,
}

/// Raw per-team numbers for one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamInput {
    /// Runs/game in this start-time slot
    pub time_slot_average: f64,
    /// Runs/game over the season
    pub season_average: f64,
    /// Runs/game conceded
    pub runs_allowed_average: f64,
    /// Historical fraction of games that went over the line (0.0–1.0)
    pub over_rate: f64,
    pub team_batting_average: f64,
    pub team_on_base_percentage: f64,
    /// May be omitted by callers who only ever run basic mode
    #[serde(default)]
    pub starting_pitcher: Option<PitcherInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchupInput {
    pub home: TeamInput,
    pub away: TeamInput,
    /// Total-runs threshold the prediction is evaluated against
    pub line: f64,
    #[serde(default)]
    pub use_advanced_data: bool,
}

impl MatchupInput {
    /// Same matchup with the advanced flag forced to `advanced`.
    pub fn with_mode(&self, advanced: bool) -> Self {
        MatchupInput {
            use_advanced_data: advanced,
            ..self.clone()
        }
    }
}

/// Simulation knobs. A process-wide default is built from the CLI config;
/// requests adjust it through [`SimulationOverrides`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulationConfig {
    pub draw_count: usize,
    pub monte_carlo_std_dev: f64,
    pub negative_binomial_dispersion: f64,
    pub max_draw_count: usize,
    /// Base seed for all three simulator streams. `None` draws one from OS
    /// entropy per call.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            draw_count: DEFAULT_DRAW_COUNT,
            monte_carlo_std_dev: DEFAULT_MC_STD_DEV,
            negative_binomial_dispersion: DEFAULT_NB_DISPERSION,
            max_draw_count: DEFAULT_MAX_DRAW_COUNT,
            seed: None,
        }
    }
}

impl SimulationConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_draw_count(mut self, draw_count: usize) -> Self {
        self.draw_count = draw_count;
        self
    }
}

/// Per-request adjustments. Every field left out keeps the server's value;
/// the draw cap is not overridable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulationOverrides {
    pub draw_count: Option<usize>,
    pub monte_carlo_std_dev: Option<f64>,
    pub negative_binomial_dispersion: Option<f64>,
    pub seed: Option<u64>,
}

impl SimulationOverrides {
    pub fn apply_to(&self, defaults: &SimulationConfig) -> SimulationConfig {
        SimulationConfig {
            draw_count: self.draw_count.unwrap_or(defaults.draw_count),
            monte_carlo_std_dev: self.monte_carlo_std_dev.unwrap_or(defaults.monte_carlo_std_dev),
            negative_binomial_dispersion: self
                .negative_binomial_dispersion
                .unwrap_or(defaults.negative_binomial_dispersion),
            max_draw_count: defaults.max_draw_count,
            seed: self.seed.or(defaults.seed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Over,
    Under,
}

impl Recommendation {
    /// OVER iff the blended probability is at least 50%.
    pub fn from_probability(final_probability: f64) -> Self {
        if final_probability >= 50.0 {
            Recommendation::Over
        } else {
            Recommendation::Under
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    Advanced,
    Basic,
}

/// Which side of the matchup a value belongs to; used in error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Home,
    Away,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Home => f.write_str("home"),
            Side::Away => f.write_str("away"),
        }
    }
}

/// Auxiliary signals fed to the star rating alongside the final probability.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSignals {
    /// (combined expected runs − line) / 3
    pub mean_diff: f64,
    /// home.over_rate + away.over_rate − 1
    pub over_consistency: f64,
    /// Mean of each team's sample std-dev over {time slot, season} averages
    pub volatility: f64,
    /// Summed (time slot − season) drift of both teams, / 5
    pub trend_strength: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub home_expected_runs: f64,
    pub away_expected_runs: f64,
    pub combined_expected_runs: f64,
    pub line: f64,
    /// Percentages, 0–100
    pub monte_carlo_probability: f64,
    pub negative_binomial_probability: f64,
    pub poisson_probability: f64,
    pub final_probability: f64,
    /// 1.0–5.0, one decimal
    pub star_rating: f64,
    pub recommendation: Recommendation,
    pub mode: Mode,
    pub signals: RatingSignals,
}

/// Advanced and basic runs of the same matchup, side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub advanced: PredictionResult,
    pub basic: PredictionResult,
    /// advanced.final_probability − basic.final_probability
    pub probability_delta: f64,
    /// advanced.star_rating − basic.star_rating
    pub star_delta: f64,
    /// Both runs recommend the same side
    pub agree: bool,
}

impl Comparison {
    pub fn new(advanced: PredictionResult, basic: PredictionResult) -> Self {
        let probability_delta = advanced.final_probability - basic.final_probability;
        let star_delta = advanced.star_rating - basic.star_rating;
        let agree = advanced.recommendation == basic.recommendation;
        Comparison {
            advanced,
            basic,
            probability_delta,
            star_delta,
            agree,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recommendation_threshold_is_inclusive() {
        assert_eq!(Recommendation::from_probability(50.0), Recommendation::Over);
        assert_eq!(Recommendation::from_probability(49.999), Recommendation::Under);
        assert_eq!(Recommendation::from_probability(100.0), Recommendation::Over);
        assert_eq!(Recommendation::from_probability(0.0), Recommendation::Under);
    }

    #[test]
    fn enums_serialize_uppercase() {
        assert_eq!(serde_json::to_string(&Recommendation::Over).unwrap(), "\"OVER\"");
        assert_eq!(serde_json::to_string(&Mode::Basic).unwrap(), "\"BASIC\"");
    }

    #[test]
    fn partial_simulation_config_fills_defaults() {
        let cfg: SimulationConfig = serde_json::from_str(r#"{"drawCount": 1000, "seed": 7}"#).unwrap();
        assert_eq!(cfg.draw_count, 1000);
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.monte_carlo_std_dev, DEFAULT_MC_STD_DEV);
        assert_eq!(cfg.negative_binomial_dispersion, DEFAULT_NB_DISPERSION);
        assert_eq!(cfg.max_draw_count, DEFAULT_MAX_DRAW_COUNT);
    }

    #[test]
    fn overrides_keep_unset_fields_from_defaults() {
        let defaults = SimulationConfig {
            draw_count: 10_000,
            monte_carlo_std_dev: 4.5,
            negative_binomial_dispersion: 2.0,
            max_draw_count: 20_000,
            seed: Some(1),
        };
        let o: SimulationOverrides = serde_json::from_str(r#"{"seed": 7}"#).unwrap();
        assert_eq!(
            o.apply_to(&defaults),
            SimulationConfig {
                seed: Some(7),
                ..defaults.clone()
            }
        );

        let o: SimulationOverrides =
            serde_json::from_str(r#"{"drawCount": 500, "monteCarloStdDev": 3.0}"#).unwrap();
        let cfg = o.apply_to(&defaults);
        assert_eq!(cfg.draw_count, 500);
        assert_eq!(cfg.monte_carlo_std_dev, 3.0);
        assert_eq!(cfg.negative_binomial_dispersion, 2.0);
        assert_eq!(cfg.max_draw_count, 20_000);
        assert_eq!(cfg.seed, Some(1));
    }

    #[test]
    fn team_input_uses_camel_case_and_optional_pitcher() {
        let team: TeamInput = serde_json::from_str(
            r#"{
                "timeSlotAverage": 4.5,
                "seasonAverage": 4.2,
                "runsAllowedAverage": 3.8,
                "overRate": 0.55,
                "teamBattingAverage": 0.26,
                "teamOnBasePercentage": 0.33
            }"#,
        )
        .unwrap();
        assert!(team.starting_pitcher.is_none());
        assert_eq!(team.time_slot_average, 4.5);
    }
}
