//! balldontlie API client
//!
//! Fetches teams, games, season averages and player bios, and maps the provider's
//! loosely typed game records into the local schema.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{check_status, http_client, read_json, UpstreamError};
use crate::data::{Game, Player, SeasonStats, Team};

/// Base URL for the balldontlie API
pub const BALLDONTLIE_BASE_URL: &str = "https://api.balldontlie.io/v1";

/// Largest page the provider serves
const PAGE_SIZE: u32 = 100;

/// Number of current franchises
const TEAM_PAGE_SIZE: u32 = 30;

/// Every list endpoint wraps its payload in `data`
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Game record as served by the provider; scores and flags may be null
#[derive(Debug, Deserialize)]
struct ApiGame {
    id: u64,
    date: String,
    season: u32,
    status: Option<String>,
    period: Option<u32>,
    time: Option<String>,
    postseason: Option<bool>,
    home_team: Team,
    visitor_team: Team,
    home_team_score: Option<u32>,
    visitor_team_score: Option<u32>,
}

impl From<ApiGame> for Game {
    fn from(game: ApiGame) -> Self {
        // Dates arrive either as `YYYY-MM-DD` or a full ISO timestamp
        let date = game.date.get(..10).unwrap_or(&game.date).to_string();
        Game {
            id: game.id,
            date,
            season: game.season,
            status: game.status.unwrap_or_else(|| "Scheduled".to_string()),
            period: game.period,
            time: game.time,
            postseason: game.postseason.unwrap_or(false),
            home_team: game.home_team,
            visitor_team: game.visitor_team,
            home_team_score: game.home_team_score.unwrap_or(0),
            visitor_team_score: game.visitor_team_score.unwrap_or(0),
        }
    }
}

/// Season averages row before it is joined with the player's bio
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SeasonAverage {
    pub player_id: u64,
    #[serde(default)]
    pub games_played: Option<u32>,
    /// Minutes per game as `MM:SS` or a decimal string
    #[serde(default)]
    pub min: Option<String>,
    #[serde(default)]
    pub pts: Option<f64>,
    #[serde(default)]
    pub reb: Option<f64>,
    #[serde(default)]
    pub ast: Option<f64>,
    #[serde(default)]
    pub stl: Option<f64>,
    #[serde(default)]
    pub blk: Option<f64>,
    #[serde(default)]
    pub turnover: Option<f64>,
    #[serde(default)]
    pub fg_pct: Option<f64>,
    #[serde(default)]
    pub fg3_pct: Option<f64>,
    #[serde(default)]
    pub ft_pct: Option<f64>,
}

impl SeasonAverage {
    /// Combines the averages with the player they belong to
    pub fn with_player(self, player: Player) -> SeasonStats {
        SeasonStats {
            player,
            games_played: self.games_played.unwrap_or(0),
            min: self.min.as_deref().map(parse_minutes).unwrap_or(0.0),
            pts: self.pts.unwrap_or(0.0),
            reb: self.reb.unwrap_or(0.0),
            ast: self.ast.unwrap_or(0.0),
            stl: self.stl.unwrap_or(0.0),
            blk: self.blk.unwrap_or(0.0),
            turnover: self.turnover.unwrap_or(0.0),
            fg_pct: self.fg_pct.unwrap_or(0.0),
            fg3_pct: self.fg3_pct.unwrap_or(0.0),
            ft_pct: self.ft_pct.unwrap_or(0.0),
        }
    }
}

/// Parses `34:30` or `34.5` into decimal minutes
fn parse_minutes(raw: &str) -> f64 {
    match raw.split_once(':') {
        Some((minutes, seconds)) => {
            let minutes: f64 = minutes.trim().parse().unwrap_or(0.0);
            let seconds: f64 = seconds.trim().parse().unwrap_or(0.0);
            minutes + seconds / 60.0
        }
        None => raw.trim().parse().unwrap_or(0.0),
    }
}

/// Client for the balldontlie API
#[derive(Debug, Clone)]
pub struct BallDontLieClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Base URL for the API (allows override for testing)
    base_url: String,
    /// API key sent as a bearer token
    api_key: Option<String>,
}

impl BallDontLieClient {
    /// Creates a client with the given credential and request timeout
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self, UpstreamError> {
        Ok(Self {
            http_client: http_client(timeout)?,
            base_url: BALLDONTLIE_BASE_URL.to_string(),
            api_key,
        })
    }

    /// Points the client at a different host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, UpstreamError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(UpstreamError::MissingCredential {
                provider: "balldontlie",
            })?;

        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(api_key)
            .query(query)
            .send()
            .await
            .map_err(|err| UpstreamError::from_reqwest(path, err))?;

        let response = check_status(path, response)?;
        let envelope: Envelope<T> = read_json(path, response).await?;
        Ok(envelope.data)
    }

    /// All current franchises
    pub async fn teams(&self) -> Result<Vec<Team>, UpstreamError> {
        self.get("/teams", &[("per_page", TEAM_PAGE_SIZE.to_string())])
            .await
    }

    /// Every game scheduled on `date`
    pub async fn games_on(&self, date: NaiveDate) -> Result<Vec<Game>, UpstreamError> {
        let games: Vec<ApiGame> = self
            .get(
                "/games",
                &[
                    ("dates[]", date.format("%Y-%m-%d").to_string()),
                    ("per_page", PAGE_SIZE.to_string()),
                ],
            )
            .await?;
        Ok(games.into_iter().map(Game::from).collect())
    }

    /// A single game by id
    pub async fn game(&self, id: u64) -> Result<Game, UpstreamError> {
        let game: ApiGame = self.get(&format!("/games/{}", id), &[]).await?;
        Ok(game.into())
    }

    /// The first page of a team's games for a season
    pub async fn team_games(&self, team_id: u32, season: u32) -> Result<Vec<Game>, UpstreamError> {
        let games: Vec<ApiGame> = self
            .get(
                "/games",
                &[
                    ("seasons[]", season.to_string()),
                    ("team_ids[]", team_id.to_string()),
                    ("per_page", PAGE_SIZE.to_string()),
                ],
            )
            .await?;
        Ok(games.into_iter().map(Game::from).collect())
    }

    /// League-wide season averages, one row per player
    pub async fn season_averages(&self, season: u32) -> Result<Vec<SeasonAverage>, UpstreamError> {
        self.get(
            "/season_averages",
            &[
                ("season", season.to_string()),
                ("per_page", PAGE_SIZE.to_string()),
            ],
        )
        .await
    }

    /// A player's biographical data
    pub async fn player(&self, id: u64) -> Result<Player, UpstreamError> {
        self.get(&format!("/players/{}", id), &[]).await
    }
}
