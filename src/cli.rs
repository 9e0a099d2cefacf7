//! Command-line interface for courtside
//!
//! This module handles parsing of CLI arguments using clap and dispatching each
//! subcommand to the matching gateway operation.

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde_json::Value;
use thiserror::Error;

use crate::data::season_of;
use crate::gateway::{GatewayError, StatsGateway};

/// Error types for the command-line front end
#[derive(Debug, Error)]
pub enum CliError {
    /// A `--date` value was not a calendar date
    #[error("Invalid date: '{0}'. Expected YYYY-MM-DD")]
    InvalidDate(String),

    /// A `--nba-season` value was not in `2024-25` form
    #[error("Invalid season: '{0}'. Expected a form like 2024-25")]
    InvalidSeason(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Result could not be rendered as JSON
    #[error("Failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Basketball statistics with caching and offline fallbacks
#[derive(Parser, Debug)]
#[command(name = "courtside")]
#[command(about = "NBA scores, standings and player stats with a local cache")]
#[command(version)]
pub struct Cli {
    /// Season start year, e.g. 2024 for 2024-25 (defaults to the current season)
    #[arg(long, global = true)]
    pub season: Option<u32>,

    /// Seed for synthetic fallback data, for reproducible output
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Scoreboard for a day
    Games {
        /// Day to show (defaults to today, UTC)
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },
    /// A single game by id
    Game { id: u64 },
    /// Conference standings
    Standings,
    /// Scoring averages per team
    TeamStats,
    /// Season averages per player
    PlayerStats,
    /// A player's shot chart
    Shots {
        player: u64,
        /// Season in stats.nba.com form, e.g. 2024-25
        #[arg(long, value_parser = parse_nba_season_arg)]
        nba_season: Option<String>,
    },
    /// A player's recent games
    GameLog {
        player: u64,
        #[arg(long, value_parser = parse_nba_season_arg)]
        nba_season: Option<String>,
    },
    /// Play-by-play for a game
    Plays { game_id: u64 },
}

/// Parses a `YYYY-MM-DD` argument
pub fn parse_date_arg(s: &str) -> Result<NaiveDate, CliError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| CliError::InvalidDate(s.to_string()))
}

/// Validates a `2024-25` style season argument
pub fn parse_nba_season_arg(s: &str) -> Result<String, CliError> {
    let invalid = || CliError::InvalidSeason(s.to_string());
    let (start, end) = s.split_once('-').ok_or_else(invalid)?;
    let start: u32 = start.parse().map_err(|_| invalid())?;
    if end.len() != 2 || end.parse::<u32>().ok() != Some((start + 1) % 100) {
        return Err(invalid());
    }
    Ok(s.to_string())
}

/// stats.nba.com season label for a start year, e.g. `2024-25`
pub fn nba_season_label(season: u32) -> String {
    format!("{}-{:02}", season, (season + 1) % 100)
}

impl Cli {
    /// The season to query, falling back to the current one
    pub fn season(&self) -> u32 {
        self.season.unwrap_or_else(|| season_of(Utc::now().date_naive()))
    }

    fn nba_season(&self, explicit: &Option<String>) -> String {
        explicit.clone().unwrap_or_else(|| nba_season_label(self.season()))
    }
}

/// Runs the selected command and returns its result as JSON
pub async fn run(cli: &Cli, gateway: &StatsGateway) -> Result<Value, CliError> {
    let season = cli.season();
    let value = match &cli.command {
        Command::Games { date: Some(date) } => {
            serde_json::to_value(gateway.games_on(*date).await?)?
        }
        Command::Games { date: None } => serde_json::to_value(gateway.todays_games().await?)?,
        Command::Game { id } => serde_json::to_value(gateway.game(*id).await?)?,
        Command::Standings => serde_json::to_value(gateway.standings(season).await?)?,
        Command::TeamStats => serde_json::to_value(gateway.team_stats(season).await?)?,
        Command::PlayerStats => serde_json::to_value(gateway.player_stats(season).await?)?,
        Command::Shots { player, nba_season } => {
            serde_json::to_value(gateway.shot_chart(*player, &cli.nba_season(nba_season)).await?)?
        }
        Command::GameLog { player, nba_season } => {
            serde_json::to_value(gateway.game_log(*player, &cli.nba_season(nba_season)).await?)?
        }
        Command::Plays { game_id } => serde_json::to_value(gateway.play_by_play(*game_id).await?)?,
    };
    Ok(value)
}
