//! stats.nba.com client
//!
//! The site serves tabular `resultSets` (a header row plus positional rows) for
//! most endpoints and a nested action list for play-by-play. It rejects requests
//! that do not look like they come from a browser on nba.com, and is often simply
//! unreachable from cloud hosts, so callers should always have a fallback ready.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, ORIGIN, REFERER, USER_AGENT};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::{check_status, http_client, read_json, UpstreamError};
use crate::data::{GameLogEntry, PlayEvent, ShotData, ShotType};

/// Base URL for the stats.nba.com API
pub const STATS_NBA_BASE_URL: &str = "https://stats.nba.com/stats";

/// Rows kept from a game log
const GAME_LOG_LIMIT: usize = 20;

/// Actions kept from a play-by-play feed
const PLAY_BY_PLAY_LIMIT: usize = 100;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// One table from a `resultSets` response
#[derive(Debug, Deserialize)]
struct ResultSet {
    headers: Vec<String>,
    #[serde(rename = "rowSet")]
    rows: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct ResultSetsResponse {
    #[serde(rename = "resultSets")]
    result_sets: Vec<ResultSet>,
}

impl ResultSetsResponse {
    fn into_first(self, endpoint: &str) -> Result<ResultSet, UpstreamError> {
        self.result_sets
            .into_iter()
            .next()
            .ok_or_else(|| {
                UpstreamError::Malformed(format!("{} returned no result sets", endpoint))
            })
    }
}

impl ResultSet {
    /// Position of a named column
    fn column(&self, name: &str) -> Result<usize, UpstreamError> {
        self.headers
            .iter()
            .position(|header| header == name)
            .ok_or_else(|| UpstreamError::Malformed(format!("missing column {}", name)))
    }
}

#[derive(Debug, Deserialize)]
struct PlayByPlayResponse {
    game: PlayByPlayGame,
}

#[derive(Debug, Deserialize)]
struct PlayByPlayGame {
    actions: Vec<Value>,
}

fn number_at(row: &[Value], idx: usize) -> f64 {
    row.get(idx).map(number).unwrap_or(0.0)
}

fn text_at(row: &[Value], idx: usize) -> String {
    match row.get(idx) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Reads a number that may be encoded as a JSON number or a numeric string
fn number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn optional_id(value: Option<&Value>) -> Option<u64> {
    let id = value.map(number).unwrap_or(0.0);
    (id > 0.0).then_some(id as u64)
}

/// Formats a provider clock as `M:SS`
///
/// Accepts ISO-8601 durations (`PT11M42.00S`), plain seconds, or an already
/// formatted string.
pub fn game_clock(value: &Value) -> String {
    match value {
        Value::String(raw) if raw.starts_with("PT") => {
            parse_iso_clock(raw).unwrap_or_else(|| "0:00".to_string())
        }
        Value::String(raw) if !raw.is_empty() => raw.clone(),
        Value::Number(n) => {
            let total = n.as_u64().unwrap_or(0);
            format!("{}:{:02}", total / 60, total % 60)
        }
        _ => "0:00".to_string(),
    }
}

fn parse_iso_clock(raw: &str) -> Option<String> {
    let body = raw.strip_prefix("PT")?.strip_suffix('S')?;
    let (minutes, seconds) = body.split_once('M')?;
    let minutes: u32 = minutes.parse().ok()?;
    let seconds: f64 = seconds.parse().ok()?;
    Some(format!("{}:{:02}", minutes, seconds.floor() as u32))
}

/// Headers stats.nba.com expects from its own front end
fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(REFERER, HeaderValue::from_static("https://www.nba.com/"));
    headers.insert(ORIGIN, HeaderValue::from_static("https://www.nba.com"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers
}

/// Client for the stats.nba.com API
#[derive(Debug, Clone)]
pub struct StatsNbaClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Base URL for the API (allows override for testing)
    base_url: String,
}

impl StatsNbaClient {
    /// Creates a client with the given request timeout
    pub fn new(timeout: Duration) -> Result<Self, UpstreamError> {
        Ok(Self {
            http_client: http_client(timeout)?,
            base_url: STATS_NBA_BASE_URL.to_string(),
        })
    }

    /// Points the client at a different host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, UpstreamError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .http_client
            .get(&url)
            .headers(browser_headers())
            .query(query)
            .send()
            .await
            .map_err(|err| UpstreamError::from_reqwest(endpoint, err))?;

        let response = check_status(endpoint, response)?;
        read_json(endpoint, response).await
    }

    /// Every field goal attempt for a player in a season such as `2024-25`
    pub async fn shot_chart(
        &self,
        player_id: u64,
        season: &str,
    ) -> Result<Vec<ShotData>, UpstreamError> {
        const ENDPOINT: &str = "shotchartdetail";
        let response: ResultSetsResponse = self
            .get(
                ENDPOINT,
                &[
                    ("PlayerID", player_id.to_string()),
                    ("TeamID", "0".to_string()),
                    ("Season", season.to_string()),
                    ("SeasonType", "Regular Season".to_string()),
                    ("ContextMeasure", "FGA".to_string()),
                    ("LeagueID", "00".to_string()),
                    ("LastNGames", "0".to_string()),
                    ("Month", "0".to_string()),
                    ("OpponentTeamID", "0".to_string()),
                    ("Period", "0".to_string()),
                ],
            )
            .await?;
        let table = response.into_first(ENDPOINT)?;

        let loc_x = table.column("LOC_X")?;
        let loc_y = table.column("LOC_Y")?;
        let made = table.column("SHOT_MADE_FLAG")?;
        let distance = table.column("SHOT_DISTANCE")?;
        let shot_type = table.column("SHOT_TYPE")?;
        let zone = table.column("SHOT_ZONE_BASIC")?;

        // Locations are tenths of a foot relative to the basket
        Ok(table
            .rows
            .iter()
            .map(|row| ShotData {
                x: number_at(row, loc_x) / 10.0 + 25.0,
                y: number_at(row, loc_y) / 10.0 + 5.0,
                made: number_at(row, made) >= 1.0,
                distance: number_at(row, distance),
                shot_type: if text_at(row, shot_type).starts_with("3PT") {
                    ShotType::ThreePoint
                } else {
                    ShotType::TwoPoint
                },
                zone: Some(text_at(row, zone))
                    .filter(|z| !z.is_empty())
                    .unwrap_or_else(|| "Unknown".to_string()),
            })
            .collect())
    }

    /// A player's most recent games in a season
    pub async fn game_log(
        &self,
        player_id: u64,
        season: &str,
    ) -> Result<Vec<GameLogEntry>, UpstreamError> {
        const ENDPOINT: &str = "playergamelog";
        let response: ResultSetsResponse = self
            .get(
                ENDPOINT,
                &[
                    ("PlayerID", player_id.to_string()),
                    ("Season", season.to_string()),
                    ("SeasonType", "Regular Season".to_string()),
                    ("LeagueID", "00".to_string()),
                ],
            )
            .await?;
        let table = response.into_first(ENDPOINT)?;

        let game_id = table.column("Game_ID")?;
        let date = table.column("GAME_DATE")?;
        let matchup = table.column("MATCHUP")?;
        let result = table.column("WL")?;
        let minutes = table.column("MIN")?;
        let points = table.column("PTS")?;
        let rebounds = table.column("REB")?;
        let assists = table.column("AST")?;
        let steals = table.column("STL")?;
        let blocks = table.column("BLK")?;
        let fg_pct = table.column("FG_PCT")?;
        let fg3_pct = table.column("FG3_PCT")?;

        Ok(table
            .rows
            .iter()
            .take(GAME_LOG_LIMIT)
            .map(|row| GameLogEntry {
                game_id: text_at(row, game_id),
                date: text_at(row, date),
                matchup: text_at(row, matchup),
                result: text_at(row, result),
                minutes: number_at(row, minutes),
                points: number_at(row, points),
                rebounds: number_at(row, rebounds),
                assists: number_at(row, assists),
                steals: number_at(row, steals),
                blocks: number_at(row, blocks),
                fg_pct: number_at(row, fg_pct),
                fg3_pct: number_at(row, fg3_pct),
            })
            .collect())
    }

    /// The opening actions of a game
    ///
    /// Real feeds carry no player tracking, so court positions are left empty.
    pub async fn play_by_play(&self, game_id: u64) -> Result<Vec<PlayEvent>, UpstreamError> {
        let response: PlayByPlayResponse = self
            .get(
                "playbyplayv3",
                &[
                    ("GameID", format!("{:010}", game_id)),
                    ("LeagueID", "00".to_string()),
                ],
            )
            .await?;

        Ok(response
            .game
            .actions
            .iter()
            .take(PLAY_BY_PLAY_LIMIT)
            .enumerate()
            .map(|(index, action)| {
                let action_number = optional_id(action.get("actionNumber")).unwrap_or(index as u64);
                let text = |field: &str| {
                    action
                        .get(field)
                        .and_then(Value::as_str)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                };
                PlayEvent {
                    id: format!("{}-{}", game_id, action_number),
                    game_id,
                    period: action.get("period").map(number).unwrap_or(1.0).max(1.0) as u32,
                    clock: action
                        .get("clock")
                        .map(game_clock)
                        .unwrap_or_else(|| "0:00".to_string()),
                    description: text("description").unwrap_or_else(|| "Unknown play".to_string()),
                    player_id: optional_id(action.get("personId")),
                    team_id: optional_id(action.get("teamId")),
                    event_type: text("actionType").unwrap_or_else(|| "unknown".to_string()),
                    score_home: action.get("scoreHome").map(number).unwrap_or(0.0) as u32,
                    score_away: action.get("scoreAway").map(number).unwrap_or(0.0) as u32,
                    home_positions: None,
                    away_positions: None,
                    ball_position: None,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> StatsNbaClient {
        StatsNbaClient::new(Duration::from_secs(2))
            .expect("Client should build")
            .with_base_url(server.uri())
    }

    #[test]
    fn test_game_clock_formats() {
        assert_eq!(game_clock(&json!("PT11M42.00S")), "11:42");
        assert_eq!(game_clock(&json!("PT00M05.70S")), "0:05");
        assert_eq!(game_clock(&json!("PTbroken")), "0:00");
        assert_eq!(game_clock(&json!(125)), "2:05");
        assert_eq!(game_clock(&json!("4:10")), "4:10");
        assert_eq!(game_clock(&Value::Null), "0:00");
    }

    #[tokio::test]
    async fn test_shot_chart_maps_columns_by_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/shotchartdetail"))
            .and(query_param("PlayerID", "201939"))
            .and(query_param("Season", "2024-25"))
            .and(header("referer", "https://www.nba.com/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resultSets": [{
                    "name": "Shot_Chart_Detail",
                    "headers": [
                        "GAME_ID", "SHOT_ZONE_BASIC", "SHOT_TYPE", "SHOT_DISTANCE",
                        "LOC_X", "LOC_Y", "SHOT_MADE_FLAG"
                    ],
                    "rowSet": [
                        ["0022400001", "Above the Break 3", "3PT Field Goal", 26, -50, 250, 1],
                        ["0022400001", "Restricted Area", "2PT Field Goal", 1, 0, 5, 0]
                    ]
                }]
            })))
            .mount(&server)
            .await;

        let shots = client(&server)
            .shot_chart(201939, "2024-25")
            .await
            .expect("Should parse shots");

        assert_eq!(shots.len(), 2);
        assert!((shots[0].x - 20.0).abs() < 1e-9);
        assert!((shots[0].y - 30.0).abs() < 1e-9);
        assert!(shots[0].made);
        assert_eq!(shots[0].shot_type, ShotType::ThreePoint);
        assert_eq!(shots[1].shot_type, ShotType::TwoPoint);
        assert!(!shots[1].made);
        assert_eq!(shots[1].zone, "Restricted Area");
    }

    #[tokio::test]
    async fn test_missing_column_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resultSets": [{ "headers": ["LOC_X"], "rowSet": [] }]
            })))
            .mount(&server)
            .await;

        let err = client(&server).shot_chart(1, "2024-25").await.unwrap_err();

        assert!(matches!(err, UpstreamError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_game_log_keeps_twenty_rows() {
        let headers = [
            "Game_ID", "GAME_DATE", "MATCHUP", "WL", "MIN", "PTS", "REB", "AST", "STL", "BLK",
            "FG_PCT", "FG3_PCT",
        ];
        let rows: Vec<Value> = (0..25)
            .map(|i| {
                json!([
                    format!("00224{:05}", i),
                    "APR 13, 2025",
                    "GSW vs. LAC",
                    "W",
                    36, 30, 5, 6, 1, 0, 0.5, 0.4
                ])
            })
            .collect();

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/playergamelog"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resultSets": [{ "headers": headers, "rowSet": rows }]
            })))
            .mount(&server)
            .await;

        let log = client(&server).game_log(201939, "2024-25").await.expect("Should parse log");

        assert_eq!(log.len(), 20);
        assert_eq!(log[0].game_id, "0022400000");
        assert_eq!(log[0].matchup, "GSW vs. LAC");
        assert!((log[0].points - 30.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_play_by_play_reads_string_scores() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/playbyplayv3"))
            .and(query_param("GameID", "0022400061"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "game": {
                    "gameId": "0022400061",
                    "actions": [
                        {
                            "actionNumber": 4,
                            "clock": "PT11M42.00S",
                            "period": 1,
                            "teamId": 1610612744,
                            "personId": 201939,
                            "description": "Curry 26' 3PT Jump Shot",
                            "actionType": "Made Shot",
                            "scoreHome": "3",
                            "scoreAway": "0"
                        },
                        { "clock": "PT11M20.00S", "period": 1, "personId": 0, "teamId": 0 }
                    ]
                }
            })))
            .mount(&server)
            .await;

        let plays = client(&server).play_by_play(22400061).await.expect("Should parse plays");

        assert_eq!(plays.len(), 2);
        assert_eq!(plays[0].id, "22400061-4");
        assert_eq!(plays[0].clock, "11:42");
        assert_eq!(plays[0].score_home, 3);
        assert_eq!(plays[0].player_id, Some(201939));
        assert!(plays[0].home_positions.is_none(), "Real plays carry no positions");
        assert_eq!(plays[1].player_id, None);
        assert_eq!(plays[1].description, "Unknown play");
        assert_eq!(plays[1].event_type, "unknown");
    }

    #[tokio::test]
    async fn test_blocked_request_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = client(&server).play_by_play(1).await.unwrap_err();

        assert!(matches!(err, UpstreamError::Status { .. }));
    }
}
