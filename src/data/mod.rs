//! Core data models for the basketball statistics gateway
//!
//! This module contains the local schema every upstream response is normalized
//! into, plus the aggregation and synthetic-data helpers built on it. Field names
//! follow the JSON the dashboard consumes.

pub mod aggregate;
pub mod synthetic;

pub use aggregate::{compute_standings, compute_team_stats};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Status string the providers use for completed games
pub const FINAL_STATUS: &str = "Final";

/// Season a date falls in, named by the year it starts (seasons tip off in October)
pub fn season_of(date: NaiveDate) -> u32 {
    let year = if date.month() >= 10 {
        date.year()
    } else {
        date.year() - 1
    };
    u32::try_from(year).unwrap_or_default()
}

/// League conference a team plays in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Conference {
    East,
    West,
    /// Defunct franchises listed by some providers without a conference
    #[serde(other)]
    Other,
}

/// An NBA franchise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: u32,
    pub abbreviation: String,
    pub city: String,
    pub conference: Conference,
    pub division: String,
    pub full_name: String,
    pub name: String,
}

/// Player biographical data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub height: Option<String>,
    pub weight: Option<String>,
    pub jersey_number: Option<String>,
    pub college: Option<String>,
    pub country: Option<String>,
    pub draft_year: Option<u32>,
    pub draft_round: Option<u32>,
    pub draft_number: Option<u32>,
    pub team: Team,
}

/// A scheduled, live, or completed game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: u64,
    /// Game date as reported by the provider (`YYYY-MM-DD`)
    pub date: String,
    pub season: u32,
    /// `Final`, a tip-off time, or the current quarter
    pub status: String,
    pub period: Option<u32>,
    pub time: Option<String>,
    pub postseason: bool,
    pub home_team: Team,
    pub visitor_team: Team,
    pub home_team_score: u32,
    pub visitor_team_score: u32,
}

impl Game {
    /// Whether the game has been played to completion
    pub fn is_final(&self) -> bool {
        self.status == FINAL_STATUS
    }

    /// Points scored by and against `team_id`, or `None` if it did not play
    pub fn score_for(&self, team_id: u32) -> Option<(u32, u32)> {
        if self.home_team.id == team_id {
            Some((self.home_team_score, self.visitor_team_score))
        } else if self.visitor_team.id == team_id {
            Some((self.visitor_team_score, self.home_team_score))
        } else {
            None
        }
    }

    /// The team `team_id` played against
    pub fn opponent_of(&self, team_id: u32) -> Option<&Team> {
        if self.home_team.id == team_id {
            Some(&self.visitor_team)
        } else if self.visitor_team.id == team_id {
            Some(&self.home_team)
        } else {
            None
        }
    }
}

/// One row of a conference standings table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub team: Team,
    pub wins: u32,
    pub losses: u32,
    /// Fraction of games won, 0.0 to 1.0
    pub win_pct: f64,
    pub games_behind: f64,
    /// Current run such as `W3` or `L1`
    pub streak: String,
    pub home_record: String,
    pub away_record: String,
    pub conf_record: String,
}

/// Per-game season averages for one player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonStats {
    pub player: Player,
    pub games_played: u32,
    pub min: f64,
    pub pts: f64,
    pub reb: f64,
    pub ast: f64,
    pub stl: f64,
    pub blk: f64,
    pub turnover: f64,
    pub fg_pct: f64,
    pub fg3_pct: f64,
    pub ft_pct: f64,
}

/// Season aggregates for one team
///
/// Shooting, rebounding and assist rates are not derivable from game scores, so
/// they are `None` when the aggregate is built from real games.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStats {
    pub team: Team,
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    /// Points per game
    pub ppg: f64,
    /// Opponent points per game
    pub opp_ppg: f64,
    pub fg_pct: Option<f64>,
    pub fg3_pct: Option<f64>,
    pub ft_pct: Option<f64>,
    /// Rebounds per game
    pub rpg: Option<f64>,
    /// Assists per game
    pub apg: Option<f64>,
}

/// Two- or three-point attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShotType {
    #[serde(rename = "2PT")]
    TwoPoint,
    #[serde(rename = "3PT")]
    ThreePoint,
}

/// A single field goal attempt on a half court
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotData {
    /// Court x coordinate in feet (0-50, basket at 25)
    pub x: f64,
    /// Court y coordinate in feet (0-47, baseline at 0)
    pub y: f64,
    pub made: bool,
    /// Distance from the basket in feet
    pub distance: f64,
    pub shot_type: ShotType,
    /// e.g. `Paint`, `Mid-Range`, `Corner 3`
    pub zone: String,
}

/// Where a player stands on the court during a play
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourtPosition {
    pub player_id: u64,
    pub x: f64,
    pub y: f64,
    pub jersey_number: String,
}

/// Where the ball is during a play
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallPosition {
    pub x: f64,
    pub y: f64,
}

/// One play-by-play action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayEvent {
    pub id: String,
    pub game_id: u64,
    pub period: u32,
    /// Game clock as `M:SS`
    pub clock: String,
    pub description: String,
    pub player_id: Option<u64>,
    pub team_id: Option<u64>,
    pub event_type: String,
    pub score_home: u32,
    pub score_away: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_positions: Option<Vec<CourtPosition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub away_positions: Option<Vec<CourtPosition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ball_position: Option<BallPosition>,
}

/// One row of a player's recent game log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameLogEntry {
    pub game_id: String,
    pub date: String,
    /// e.g. `GSW vs. LAL` or `GSW @ BOS`
    pub matchup: String,
    /// `W` or `L`
    pub result: String,
    pub minutes: f64,
    pub points: f64,
    pub rebounds: f64,
    pub assists: f64,
    pub steals: f64,
    pub blocks: f64,
    pub fg_pct: f64,
    pub fg3_pct: f64,
}
