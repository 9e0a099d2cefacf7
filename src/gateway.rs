//! Resource-level operations consumed by the dashboard
//!
//! `StatsGateway` names one cache key and one TTL per resource, runs the provider
//! call through the cache, and for everything except single-game lookups answers
//! with synthetic data when the provider cannot. Aggregates built from many
//! provider calls (standings, team and player stats) cache both the whole result
//! and each sub-fetch.

use std::convert::Infallible;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use futures::future::try_join_all;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::debug;

use crate::cache::{
    fetch_cached, fetch_resilient, recover, CacheKey, FallbackError, SingleFlight, TtlCache,
};
use crate::config::{ConfigError, GatewayConfig, TtlConfig};
use crate::data::{
    compute_standings, compute_team_stats, synthetic, Conference, Game, GameLogEntry, PlayEvent,
    Player, SeasonStats, ShotData, Standing, Team, TeamStats,
};
use crate::upstream::{BallDontLieClient, StatsNbaClient, UpstreamError};

/// Errors a gateway operation can surface to its caller
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Upstream failed for a resource that has no fallback
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// A fallback generator failed
    #[error(transparent)]
    Fallback(#[from] FallbackError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Front door to both providers
#[derive(Debug)]
pub struct StatsGateway {
    cache: TtlCache,
    balldontlie: BallDontLieClient,
    stats_nba: StatsNbaClient,
    ttl: TtlConfig,
    flights: SingleFlight,
    /// Source of randomness for fallback data
    rng: Mutex<StdRng>,
}

impl StatsGateway {
    /// Creates a gateway over an existing cache
    pub fn new(
        cache: TtlCache,
        balldontlie: BallDontLieClient,
        stats_nba: StatsNbaClient,
        ttl: TtlConfig,
    ) -> Self {
        Self {
            cache,
            balldontlie,
            stats_nba,
            ttl,
            flights: SingleFlight::new(),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Builds both provider clients from configuration
    pub fn from_config(config: &GatewayConfig, cache: TtlCache) -> Result<Self, ConfigError> {
        let balldontlie = BallDontLieClient::new(config.api_key.clone(), config.timeout)?
            .with_base_url(config.balldontlie_url.clone());
        let stats_nba =
            StatsNbaClient::new(config.timeout)?.with_base_url(config.stats_nba_url.clone());
        Ok(Self::new(cache, balldontlie, stats_nba, config.ttl))
    }

    /// Makes fallback data reproducible
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    /// The cache this gateway reads and fills
    pub fn cache(&self) -> &TtlCache {
        &self.cache
    }

    /// Runs a fallback generator against the shared random source
    fn generate<T>(&self, generator: impl FnOnce(&mut StdRng) -> T) -> Result<T, Infallible> {
        Ok(generator(&mut self.rng.lock()))
    }

    /// Games scheduled for today (UTC)
    pub async fn todays_games(&self) -> Result<Vec<Game>, GatewayError> {
        self.games_on(Utc::now().date_naive()).await
    }

    /// Games on `date`
    ///
    /// This is the key every open dashboard polls, so concurrent misses share a
    /// single upstream request and, when it fails, a single fallback decision.
    pub async fn games_on(&self, date: NaiveDate) -> Result<Vec<Game>, GatewayError> {
        let key = CacheKey::new("games").param(date.format("%Y-%m-%d"));
        let fetched = self
            .flights
            .fetch_cached(&self.cache, &key, self.ttl.live, || self.balldontlie.games_on(date))
            .await;
        Ok(recover(&key, fetched, || {
            self.generate(|rng| synthetic::games(rng, date))
        })?)
    }

    /// A single game; there is no synthetic substitute for a specific id
    pub async fn game(&self, id: u64) -> Result<Game, GatewayError> {
        let key = CacheKey::new("game").param(id);
        let game = fetch_cached(&self.cache, Some(&key), self.ttl.game, || {
            self.balldontlie.game(id)
        })
        .await?;
        Ok(game)
    }

    /// Every current franchise
    pub async fn teams(&self) -> Result<Vec<Team>, UpstreamError> {
        let key = CacheKey::new("teams");
        fetch_cached(&self.cache, Some(&key), self.ttl.roster, || self.balldontlie.teams()).await
    }

    async fn team_games(&self, team_id: u32, season: u32) -> Result<Vec<Game>, UpstreamError> {
        let key = CacheKey::new("team-games").param(team_id).param(season);
        fetch_cached(&self.cache, Some(&key), self.ttl.season_stats, || {
            self.balldontlie.team_games(team_id, season)
        })
        .await
    }

    async fn player(&self, id: u64) -> Result<Player, UpstreamError> {
        let key = CacheKey::new("player").param(id);
        fetch_cached(&self.cache, Some(&key), self.ttl.biography, || {
            self.balldontlie.player(id)
        })
        .await
    }

    /// Each conference team paired with its games for the season
    async fn season_games(&self, season: u32) -> Result<Vec<(Team, Vec<Game>)>, UpstreamError> {
        let teams: Vec<Team> = self
            .teams()
            .await?
            .into_iter()
            .filter(|team| team.conference != Conference::Other)
            .collect();
        debug!(teams = teams.len(), season, "fetching season games");

        let games = try_join_all(teams.iter().map(|team| self.team_games(team.id, season))).await?;
        Ok(teams.into_iter().zip(games).collect())
    }

    /// Conference standings derived from completed games
    pub async fn standings(&self, season: u32) -> Result<Vec<Standing>, GatewayError> {
        let key = CacheKey::new("standings").param(season);
        Ok(fetch_resilient(
            &self.cache,
            &key,
            self.ttl.season_stats,
            || async {
                let games = self.season_games(season).await?;
                Ok::<_, UpstreamError>(compute_standings(&games))
            },
            || self.generate(|rng| synthetic::standings(rng)),
        )
        .await?)
    }

    /// Scoring aggregates per team
    pub async fn team_stats(&self, season: u32) -> Result<Vec<TeamStats>, GatewayError> {
        let key = CacheKey::new("team-stats").param(season);
        Ok(fetch_resilient(
            &self.cache,
            &key,
            self.ttl.season_stats,
            || async {
                let games = self.season_games(season).await?;
                Ok::<_, UpstreamError>(compute_team_stats(&games))
            },
            || self.generate(|rng| synthetic::team_stats(rng)),
        )
        .await?)
    }

    /// Season averages joined with each player's bio
    pub async fn player_stats(&self, season: u32) -> Result<Vec<SeasonStats>, GatewayError> {
        let key = CacheKey::new("player-stats").param(season);
        Ok(fetch_resilient(
            &self.cache,
            &key,
            self.ttl.season_stats,
            || async {
                let averages = self.balldontlie.season_averages(season).await?;
                let players =
                    try_join_all(averages.iter().map(|row| self.player(row.player_id))).await?;
                Ok::<_, UpstreamError>(
                    averages
                        .into_iter()
                        .zip(players)
                        .map(|(row, player)| row.with_player(player))
                        .collect::<Vec<SeasonStats>>(),
                )
            },
            || self.generate(|rng| synthetic::player_stats(rng)),
        )
        .await?)
    }

    /// Field goal attempts for a player; `season` is in `2024-25` form
    pub async fn shot_chart(
        &self,
        player_id: u64,
        season: &str,
    ) -> Result<Vec<ShotData>, GatewayError> {
        let key = CacheKey::new("shot-chart").param(player_id).param(season);
        Ok(fetch_resilient(
            &self.cache,
            &key,
            self.ttl.shot_chart,
            || self.stats_nba.shot_chart(player_id, season),
            || self.generate(|rng| synthetic::shot_chart(rng)),
        )
        .await?)
    }

    /// A player's recent games; `season` is in `2024-25` form
    pub async fn game_log(
        &self,
        player_id: u64,
        season: &str,
    ) -> Result<Vec<GameLogEntry>, GatewayError> {
        let key = CacheKey::new("game-log").param(player_id).param(season);
        Ok(fetch_resilient(
            &self.cache,
            &key,
            self.ttl.game_log,
            || self.stats_nba.game_log(player_id, season),
            || self.generate(|rng| synthetic::game_log(rng, Utc::now().date_naive())),
        )
        .await?)
    }

    /// Opening actions of a game
    pub async fn play_by_play(&self, game_id: u64) -> Result<Vec<PlayEvent>, GatewayError> {
        let key = CacheKey::new("play-by-play").param(game_id);
        Ok(fetch_resilient(
            &self.cache,
            &key,
            self.ttl.play_by_play,
            || self.stats_nba.play_by_play(game_id),
            || self.generate(|rng| synthetic::play_by_play(rng, game_id)),
        )
        .await?)
    }

    /// Remaining freshness of a resource, mainly for diagnostics
    pub fn remaining_ttl(&self, key: &CacheKey) -> Option<Duration> {
        self.cache.remaining_ttl(key.as_str())
    }
}
