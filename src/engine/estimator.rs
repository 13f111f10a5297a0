//! Expected-runs estimate for one team.
//!
//! Two weighted blends of the team's recent scoring and the opponent's runs
//! allowed:
//! - **Basic**: time-slot, season and opponent-allowed averages, nudged by the
//!   team's historical over rate.
//! - **Advanced**: a re-weighted blend further scaled by opponent pitcher
//!   quality (ERA / BAA) and the team's own batting strength (AVG / OBP).

use crate::model::{PitcherInput, TeamInput};

// ── Basic weights ────────────────────────────────────────────────────────────

const BASIC_TIME_SLOT_W: f64 = 0.5;
const BASIC_SEASON_W: f64 = 0.3;
const OPPONENT_ALLOWED_W: f64 = 0.15;
/// Multiplier per unit of over rate: `1 + 0.05 · over_rate`.
const OVER_RATE_BOOST: f64 = 0.05;

// ── Advanced weights ─────────────────────────────────────────────────────────

const ADV_TIME_SLOT_W: f64 = 0.35;
const ADV_SEASON_W: f64 = 0.25;

const PITCHER_ERA_W: f64 = 0.7;
const PITCHER_BAA_W: f64 = 0.3;
/// League-average ERA used to normalise the pitcher factor.
const LEAGUE_ERA: f64 = 4.5;

const BATTING_AVG_W: f64 = 0.6;
const BATTING_OBP_W: f64 = 0.4;
const LEAGUE_AVG: f64 = 0.250;
const LEAGUE_OBP: f64 = 0.320;

/// Estimate one team's runs for this game.
///
/// Advanced mode is used only when `advanced` is set *and* both opponent
/// pitcher and opponent team are present; otherwise the basic blend applies.
/// The caller is responsible for rejecting an advanced request with missing
/// data before getting here.
pub fn estimate_runs(
    team: &TeamInput,
    opponent_allowed: f64,
    opponent_pitcher: Option<&PitcherInput>,
    opponent_team: Option<&TeamInput>,
    advanced: bool,
) -> f64 {
    match (advanced, opponent_pitcher, opponent_team) {
        (true, Some(pitcher), Some(_)) => advanced_runs(team, opponent_allowed, pitcher),
        _ => basic_runs(team, opponent_allowed),
    }
}

fn over_rate_multiplier(team: &TeamInput) -> f64 {
    1.0 + OVER_RATE_BOOST * team.over_rate
}

fn basic_runs(team: &TeamInput, opponent_allowed: f64) -> f64 {
    let base = BASIC_TIME_SLOT_W * team.time_slot_average
        + BASIC_SEASON_W * team.season_average
        + OPPONENT_ALLOWED_W * opponent_allowed;
    base * over_rate_multiplier(team)
}

fn advanced_runs(team: &TeamInput, opponent_allowed: f64, pitcher: &PitcherInput) -> f64 {
    let base = ADV_TIME_SLOT_W * team.time_slot_average
        + ADV_SEASON_W * team.season_average
        + OPPONENT_ALLOWED_W * opponent_allowed;

    // League-average starter (4.50 ERA, .250 BAA) gives a factor near 0.72.
    let pitcher_factor = pitcher_factor(pitcher);
    let batting_factor = batting_factor(team);

    base * over_rate_multiplier(team) * (1.2 - 0.4 * pitcher_factor) * (0.9 + 0.2 * batting_factor)
}

pub(crate) fn pitcher_factor(pitcher: &PitcherInput) -> f64 {
    (PITCHER_ERA_W * pitcher.era + PITCHER_BAA_W * pitcher.batting_average_against) / LEAGUE_ERA
}

pub(crate) fn batting_factor(team: &TeamInput) -> f64 {
    BATTING_AVG_W * (team.team_batting_average / LEAGUE_AVG)
        + BATTING_OBP_W * (team.team_on_base_percentage / LEAGUE_OBP)
}
