//! Gateway configuration
//!
//! Defaults suit a dashboard polled every few seconds; every value can be
//! overridden from the environment.

use std::time::Duration;

use thiserror::Error;

use crate::cache::DEFAULT_SWEEP_INTERVAL;
use crate::upstream::balldontlie::BALLDONTLIE_BASE_URL;
use crate::upstream::stats_nba::STATS_NBA_BASE_URL;

/// Environment variable holding the balldontlie API key
pub const API_KEY_VAR: &str = "BALLDONTLIE_API_KEY";

/// Default request timeout for both providers
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// Errors raised while reading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An override was set but is not a whole number of seconds
    #[error("Invalid value for {var}: '{value}' (expected whole seconds)")]
    InvalidSeconds { var: String, value: String },

    /// A TTL or timeout override was zero
    #[error("{var} must be at least one second")]
    ZeroSeconds { var: String },

    /// The HTTP clients could not be built
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] crate::upstream::UpstreamError),
}

/// How long each class of resource stays fresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlConfig {
    /// Scoreboards for a day, including in-progress games
    pub live: Duration,
    /// A single game looked up by id
    pub game: Duration,
    /// Standings, team and player aggregates, and their per-team game lists
    pub season_stats: Duration,
    pub play_by_play: Duration,
    /// Team list
    pub roster: Duration,
    pub shot_chart: Duration,
    pub game_log: Duration,
    /// Player biographical details
    pub biography: Duration,
}

impl Default for TtlConfig {
    fn default() -> Self {
        Self {
            live: Duration::from_secs(120),          // 2 minutes
            game: Duration::from_secs(120),          // 2 minutes
            season_stats: Duration::from_secs(300),  // 5 minutes
            play_by_play: Duration::from_secs(300),  // 5 minutes
            roster: Duration::from_secs(3600),       // 1 hour
            shot_chart: Duration::from_secs(3600),   // 1 hour
            game_log: Duration::from_secs(3600),     // 1 hour
            biography: Duration::from_secs(86400),   // 24 hours
        }
    }
}

impl TtlConfig {
    fn apply<F>(&mut self, lookup: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let classes: [(&str, &mut Duration); 8] = [
            ("LIVE", &mut self.live),
            ("GAME", &mut self.game),
            ("SEASON_STATS", &mut self.season_stats),
            ("PLAY_BY_PLAY", &mut self.play_by_play),
            ("ROSTER", &mut self.roster),
            ("SHOT_CHART", &mut self.shot_chart),
            ("GAME_LOG", &mut self.game_log),
            ("BIOGRAPHY", &mut self.biography),
        ];
        for (class, slot) in classes {
            let var = format!("COURTSIDE_TTL_{}_SECS", class);
            if let Some(ttl) = positive_seconds(lookup, &var)? {
                *slot = ttl;
            }
        }
        Ok(())
    }
}

/// Everything needed to build a gateway
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    /// balldontlie credential; without it those operations serve fallback data
    pub api_key: Option<String>,
    pub balldontlie_url: String,
    pub stats_nba_url: String,
    /// Upper bound on any single upstream request
    pub timeout: Duration,
    /// Interval between cache sweeps, zero to disable
    pub sweep_interval: Duration,
    pub ttl: TtlConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            balldontlie_url: BALLDONTLIE_BASE_URL.to_string(),
            stats_nba_url: STATS_NBA_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            ttl: TtlConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Reads overrides from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds a config from defaults plus whatever `lookup` returns per variable
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        config.api_key = lookup(API_KEY_VAR).filter(|key| !key.trim().is_empty());
        if let Some(url) = lookup("COURTSIDE_BALLDONTLIE_URL") {
            config.balldontlie_url = url;
        }
        if let Some(url) = lookup("COURTSIDE_STATS_NBA_URL") {
            config.stats_nba_url = url;
        }
        if let Some(timeout) = positive_seconds(&lookup, "COURTSIDE_TIMEOUT_SECS")? {
            config.timeout = timeout;
        }
        // Zero is allowed here and disables sweeping
        if let Some(interval) = seconds(&lookup, "COURTSIDE_SWEEP_SECS")? {
            config.sweep_interval = interval;
        }
        config.ttl.apply(&lookup)?;

        Ok(config)
    }
}

fn seconds<F>(lookup: &F, var: &str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|_| ConfigError::InvalidSeconds {
                var: var.to_string(),
                value,
            }),
    }
}

/// Like `seconds`, but zero is rejected
fn positive_seconds<F>(lookup: &F, var: &str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match seconds(lookup, var)? {
        Some(duration) if duration.is_zero() => Err(ConfigError::ZeroSeconds {
            var: var.to_string(),
        }),
        parsed => Ok(parsed),
    }
}
