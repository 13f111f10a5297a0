use tracing::{debug, info, warn};

use super::blend::blend;
use super::confidence::{rate, signals};
use super::error::{PredictionError, Result};
use super::estimator::estimate_runs;
use super::simulation::{ensure_positive_mean, simulate, SimulatorKind};
use crate::model::{
    Comparison, MatchupInput, Mode, PredictionResult, Recommendation, Side, SimulationConfig,
    TeamInput,
};

/// Runs the whole pipeline for one matchup: run estimates, three simulators,
/// blend, star rating. Holds only the default simulation settings; every call
/// is independent.
#[derive(Debug, Clone, Default)]
pub struct PredictionEngine {
    defaults: SimulationConfig,
}

impl PredictionEngine {
    pub fn new(defaults: SimulationConfig) -> Self {
        PredictionEngine { defaults }
    }

    pub fn defaults(&self) -> &SimulationConfig {
        &self.defaults
    }

    /// Predict with the engine's default simulation settings.
    pub fn predict_default(&self, matchup: &MatchupInput) -> Result<PredictionResult> {
        self.predict(matchup, &self.defaults)
    }

    /// Validate, estimate, simulate, blend and rate.
    pub fn predict(
        &self,
        matchup: &MatchupInput,
        config: &SimulationConfig,
    ) -> Result<PredictionResult> {
        if let Err(e) = validate_config(config).and_then(|_| validate_matchup(matchup)) {
            warn!("Rejected prediction request: {}", e);
            return Err(e);
        }

        let advanced = matchup.use_advanced_data;
        let (home, away) = (&matchup.home, &matchup.away);

        // Each team faces the *other* side's pitcher and run prevention.
        let home_runs = estimate_runs(
            home,
            away.runs_allowed_average,
            away.starting_pitcher.as_ref(),
            Some(away),
            advanced,
        );
        let away_runs = estimate_runs(
            away,
            home.runs_allowed_average,
            home.starting_pitcher.as_ref(),
            Some(home),
            advanced,
        );
        ensure_positive_mean(Side::Home, home_runs)?;
        ensure_positive_mean(Side::Away, away_runs)?;

        let seed = config.seed.unwrap_or_else(|| {
            let seed = rand::random::<u64>();
            debug!("No seed supplied, drew {} from entropy", seed);
            seed
        });

        let run = |kind: SimulatorKind| {
            let p = simulate(kind, home_runs, away_runs, matchup.line, config, seed);
            if let Ok(p) = p {
                debug!("{} P(over {:.1}) = {:.2}%", kind.label(), matchup.line, p);
            }
            p
        };
        let (mc, (nb, poisson)) = rayon::join(
            || run(SimulatorKind::MonteCarlo),
            || {
                rayon::join(
                    || run(SimulatorKind::NegativeBinomial),
                    || run(SimulatorKind::Poisson),
                )
            },
        );
        let (mc, nb, poisson) = (mc?, nb?, poisson?);

        let final_probability = blend(mc, nb, poisson).clamp(0.0, 100.0);
        let combined = home_runs + away_runs;
        let rating_signals = signals(matchup, combined);
        let star_rating = rate(final_probability, &rating_signals);
        let recommendation = Recommendation::from_probability(final_probability);
        let mode = if advanced { Mode::Advanced } else { Mode::Basic };

        info!(
            "{:?} prediction: {:.2} runs vs line {:.1} → {:.1}% ({:?}, {:.1}★)",
            mode, combined, matchup.line, final_probability, recommendation, star_rating
        );

        Ok(PredictionResult {
            home_expected_runs: home_runs,
            away_expected_runs: away_runs,
            combined_expected_runs: combined,
            line: matchup.line,
            monte_carlo_probability: mc,
            negative_binomial_probability: nb,
            poisson_probability: poisson,
            final_probability,
            star_rating,
            recommendation,
            mode,
            signals: rating_signals,
        })
    }

    /// Run the same matchup in advanced and basic mode and put the two
    /// results side by side. Both runs share the config (and seed).
    pub fn compare(
        &self,
        matchup: &MatchupInput,
        config: &SimulationConfig,
    ) -> Result<Comparison> {
        // Pin one seed so the two runs differ only by the run estimates.
        let config = SimulationConfig {
            seed: Some(config.seed.unwrap_or_else(rand::random)),
            ..config.clone()
        };
        let advanced = self.predict(&matchup.with_mode(true), &config)?;
        let basic = self.predict(&matchup.with_mode(false), &config)?;
        Ok(Comparison::new(advanced, basic))
    }
}

// ── Validation ───────────────────────────────────────────────────────────────

fn validate_config(config: &SimulationConfig) -> Result<()> {
    if config.draw_count == 0 {
        return Err(PredictionError::invalid(
            "drawCount",
            0.0,
            "must be a positive integer",
        ));
    }
    if config.draw_count > config.max_draw_count {
        return Err(PredictionError::invalid(
            "drawCount",
            config.draw_count as f64,
            "exceeds maxDrawCount",
        ));
    }
    positive("monteCarloStdDev", config.monte_carlo_std_dev)?;
    positive("negativeBinomialDispersion", config.negative_binomial_dispersion)?;
    Ok(())
}

fn validate_matchup(matchup: &MatchupInput) -> Result<()> {
    validate_team(Side::Home, &matchup.home, matchup.use_advanced_data)?;
    validate_team(Side::Away, &matchup.away, matchup.use_advanced_data)?;
    non_negative("line", matchup.line)?;
    Ok(())
}

fn validate_team(side: Side, team: &TeamInput, advanced: bool) -> Result<()> {
    let field = |name: &str| format!("{}.{}", side, name);

    non_negative(&field("timeSlotAverage"), team.time_slot_average)?;
    non_negative(&field("seasonAverage"), team.season_average)?;
    non_negative(&field("runsAllowedAverage"), team.runs_allowed_average)?;
    unit_interval(&field("overRate"), team.over_rate)?;
    unit_interval(&field("teamBattingAverage"), team.team_batting_average)?;
    unit_interval(&field("teamOnBasePercentage"), team.team_on_base_percentage)?;

    match &team.starting_pitcher {
        Some(pitcher) => {
            non_negative(&field("startingPitcher.era"), pitcher.era)?;
            unit_interval(
                &field("startingPitcher.battingAverageAgainst"),
                pitcher.batting_average_against,
            )?;
        }
        None if advanced => return Err(PredictionError::MissingAdvancedInputs { team: side }),
        None => {}
    }
    Ok(())
}

fn non_negative(field: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(PredictionError::invalid(field, value, "must be a finite value >= 0"))
    }
}

fn positive(field: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PredictionError::invalid(field, value, "must be a finite value > 0"))
    }
}

fn unit_interval(field: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(PredictionError::invalid(field, value, "must be within [0, 1]"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PitcherInput;
    use approx::assert_relative_eq;

    fn team() -> TeamInput {
        TeamInput {
            time_slot_average: 4.5,
            season_average: 4.2,
            runs_allowed_average: 3.8,
            over_rate: 0.55,
            team_batting_average: 0.260,
            team_on_base_percentage: 0.330,
            starting_pitcher: Some(PitcherInput {
                era: 3.5,
                batting_average_against: 0.230,
            }),
        }
    }

    fn matchup(advanced: bool) -> MatchupInput {
        MatchupInput {
            home: team(),
            away: team(),
            line: 8.5,
            use_advanced_data: advanced,
        }
    }

    fn config() -> SimulationConfig {
        SimulationConfig::default().with_seed(2024)
    }

    #[test]
    fn symmetric_basic_matchup_leans_under() {
        let engine = PredictionEngine::default();
        let r = engine.predict(&matchup(false), &config()).unwrap();

        let per_team = (4.5 * 0.5 + 4.2 * 0.3 + 3.8 * 0.15) * 1.0275;
        assert_relative_eq!(r.home_expected_runs, per_team, epsilon = 1e-12);
        assert_relative_eq!(r.away_expected_runs, per_team, epsilon = 1e-12);
        assert_relative_eq!(
            r.combined_expected_runs,
            r.home_expected_runs + r.away_expected_runs
        );
        assert!(r.combined_expected_runs < r.line);
        assert!(r.final_probability < 50.0, "final {:.2}", r.final_probability);
        assert_eq!(r.recommendation, Recommendation::Under);
        assert_eq!(r.mode, Mode::Basic);
    }

    #[test]
    fn result_satisfies_invariants() {
        let engine = PredictionEngine::default();
        for advanced in [false, true] {
            for line in [4.5, 8.5, 12.5] {
                let m = MatchupInput {
                    line,
                    ..matchup(advanced)
                };
                let cfg = config().with_draw_count(10_000);
                let r = engine.predict(&m, &cfg).unwrap();
                for p in [
                    r.monte_carlo_probability,
                    r.negative_binomial_probability,
                    r.poisson_probability,
                    r.final_probability,
                ] {
                    assert!((0.0..=100.0).contains(&p));
                }
                assert_relative_eq!(
                    r.final_probability,
                    0.5 * r.monte_carlo_probability
                        + 0.3 * r.negative_binomial_probability
                        + 0.2 * r.poisson_probability,
                    epsilon = 1e-9
                );
                assert!((1.0..=5.0).contains(&r.star_rating));
                assert_eq!(
                    r.recommendation == Recommendation::Over,
                    r.final_probability >= 50.0
                );
            }
        }
    }

    #[test]
    fn low_line_recommends_over() {
        let engine = PredictionEngine::default();
        let m = MatchupInput {
            line: 3.5,
            ..matchup(false)
        };
        let r = engine.predict(&m, &config()).unwrap();
        assert_eq!(r.recommendation, Recommendation::Over);
        assert!(r.star_rating > 3.0);
    }

    #[test]
    fn fixed_seed_is_reproducible() {
        let engine = PredictionEngine::default();
        let cfg = config().with_draw_count(20_000);
        let a = engine.predict(&matchup(true), &cfg).unwrap();
        let b = engine.predict(&matchup(true), &cfg).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn advanced_mode_is_reported() {
        let engine = PredictionEngine::default();
        let r = engine.predict(&matchup(true), &config()).unwrap();
        assert_eq!(r.mode, Mode::Advanced);
    }

    #[test]
    fn advanced_without_pitcher_is_rejected() {
        let mut m = matchup(true);
        m.away.starting_pitcher = None;
        let err = PredictionEngine::default().predict(&m, &config()).unwrap_err();
        assert_eq!(err, PredictionError::MissingAdvancedInputs { team: Side::Away });

        // Basic mode does not need pitchers.
        m.use_advanced_data = false;
        assert!(PredictionEngine::default().predict(&m, &config()).is_ok());
    }

    #[test]
    fn out_of_range_inputs_are_rejected() {
        let engine = PredictionEngine::default();
        let cases: Vec<(MatchupInput, &str)> = vec![
            (
                {
                    let mut m = matchup(false);
                    m.home.over_rate = 1.2;
                    m
                },
                "home.overRate",
            ),
            (
                {
                    let mut m = matchup(false);
                    m.away.season_average = -0.1;
                    m
                },
                "away.seasonAverage",
            ),
            (
                {
                    let mut m = matchup(false);
                    m.line = -1.0;
                    m
                },
                "line",
            ),
            (
                {
                    let mut m = matchup(true);
                    m.home.starting_pitcher = Some(PitcherInput {
                        era: -2.0,
                        batting_average_against: 0.2,
                    });
                    m
                },
                "home.startingPitcher.era",
            ),
            (
                {
                    let mut m = matchup(false);
                    m.away.team_on_base_percentage = f64::NAN;
                    m
                },
                "away.teamOnBasePercentage",
            ),
            (
                {
                    let mut m = matchup(false);
                    m.home.team_batting_average = 1.05;
                    m
                },
                "home.teamBattingAverage",
            ),
            (
                {
                    let mut m = matchup(false);
                    m.away.starting_pitcher = Some(PitcherInput {
                        era: 3.0,
                        batting_average_against: -0.01,
                    });
                    m
                },
                "away.startingPitcher.battingAverageAgainst",
            ),
            (
                {
                    let mut m = matchup(true);
                    m.home.starting_pitcher = Some(PitcherInput {
                        era: 3.0,
                        batting_average_against: 1.3,
                    });
                    m
                },
                "home.startingPitcher.battingAverageAgainst",
            ),
        ];
        for (m, expected_field) in cases {
            match engine.predict(&m, &config()) {
                Err(PredictionError::InvalidInput { field, .. }) => {
                    assert_eq!(field, expected_field)
                }
                other => panic!("expected InvalidInput for {expected_field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn bad_simulation_config_is_rejected() {
        let engine = PredictionEngine::default();
        let m = matchup(false);

        let zero_draws = config().with_draw_count(0);
        assert_eq!(engine.predict(&m, &zero_draws).unwrap_err().kind(), "invalid_input");

        let over_cap = SimulationConfig {
            max_draw_count: 1_000,
            ..config().with_draw_count(1_001)
        };
        assert_eq!(engine.predict(&m, &over_cap).unwrap_err().kind(), "invalid_input");

        let bad_sd = SimulationConfig {
            monte_carlo_std_dev: 0.0,
            ..config()
        };
        assert_eq!(engine.predict(&m, &bad_sd).unwrap_err().kind(), "invalid_input");

        let bad_r = SimulationConfig {
            negative_binomial_dispersion: -5.3,
            ..config()
        };
        assert_eq!(engine.predict(&m, &bad_r).unwrap_err().kind(), "invalid_input");
    }

    #[test]
    fn zero_scoring_team_is_degenerate() {
        let mut m = matchup(false);
        m.home.time_slot_average = 0.0;
        m.home.season_average = 0.0;
        m.away.runs_allowed_average = 0.0;
        let err = PredictionEngine::default().predict(&m, &config()).unwrap_err();
        assert_eq!(
            err,
            PredictionError::DegenerateMean {
                team: Side::Home,
                mean: 0.0
            }
        );
    }

    #[test]
    fn compare_runs_both_modes() {
        let engine = PredictionEngine::default();
        let c = engine.compare(&matchup(false), &config()).unwrap();
        assert_eq!(c.advanced.mode, Mode::Advanced);
        assert_eq!(c.basic.mode, Mode::Basic);
        assert_relative_eq!(
            c.probability_delta,
            c.advanced.final_probability - c.basic.final_probability
        );
        assert_eq!(c.agree, c.advanced.recommendation == c.basic.recommendation);

        // Basic half of the comparison equals a standalone basic call.
        let basic = engine.predict(&matchup(false), &config()).unwrap();
        assert_eq!(c.basic, basic);
    }

    #[test]
    fn compare_needs_pitchers() {
        let mut m = matchup(false);
        m.home.starting_pitcher = None;
        let err = PredictionEngine::default().compare(&m, &config()).unwrap_err();
        assert!(matches!(err, PredictionError::MissingAdvancedInputs { team: Side::Home }));
    }
}
