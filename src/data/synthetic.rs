//! Synthetic stand-ins for upstream data
//!
//! Each generator builds a complete, schema-valid payload from an injected random
//! source. They are served only when the real provider cannot answer and are
//! never cached. Passing a seeded RNG makes the output reproducible.

use chrono::{Duration, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;

use super::{
    season_of, BallPosition, Conference, CourtPosition, Game, GameLogEntry, PlayEvent, Player,
    SeasonStats, ShotData, ShotType, Standing, Team, TeamStats,
};

/// Distance from the basket beyond which a shot counts for three
const THREE_POINT_DISTANCE: f64 = 23.75;

/// Basket location on the half court used for shot charts
const BASKET: (f64, f64) = (25.0, 5.0);

/// Games in a regular season
const SEASON_GAMES: u32 = 82;

/// id, abbreviation, city, name, conference, division
type TeamRow = (u32, &'static str, &'static str, &'static str, Conference, &'static str);

const TEAMS: [TeamRow; 10] = [
    (2, "BOS", "Boston", "Celtics", Conference::East, "Atlantic"),
    (17, "MIL", "Milwaukee", "Bucks", Conference::East, "Central"),
    (23, "PHI", "Philadelphia", "76ers", Conference::East, "Atlantic"),
    (6, "CLE", "Cleveland", "Cavaliers", Conference::East, "Central"),
    (16, "MIA", "Miami", "Heat", Conference::East, "Southeast"),
    (8, "DEN", "Denver", "Nuggets", Conference::West, "Northwest"),
    (24, "PHX", "Phoenix", "Suns", Conference::West, "Pacific"),
    (10, "GSW", "Golden State", "Warriors", Conference::West, "Pacific"),
    (14, "LAL", "Los Angeles", "Lakers", Conference::West, "Pacific"),
    (7, "DAL", "Dallas", "Mavericks", Conference::West, "Southwest"),
];

/// first name, last name, position, team abbreviation
const PLAYERS: [(&str, &str, &str, &str); 10] = [
    ("Luka", "Doncic", "G", "DAL"),
    ("Giannis", "Antetokounmpo", "F", "MIL"),
    ("Joel", "Embiid", "C", "PHI"),
    ("Nikola", "Jokic", "C", "DEN"),
    ("Jayson", "Tatum", "F", "BOS"),
    ("Stephen", "Curry", "G", "GSW"),
    ("Kevin", "Durant", "F", "PHX"),
    ("LeBron", "James", "F", "LAL"),
    ("Donovan", "Mitchell", "G", "CLE"),
    ("Anthony", "Davis", "C", "LAL"),
];

const EVENT_TYPES: [(&str, &str); 6] = [
    ("2pt", "Driving Layup"),
    ("3pt", "3PT Jump Shot"),
    ("rebound", "Defensive Rebound"),
    ("turnover", "Bad Pass Turnover"),
    ("freethrow", "Free Throw 1 of 2"),
    ("foul", "Personal Foul"),
];

fn team(row: &TeamRow) -> Team {
    let (id, abbreviation, city, name, conference, division) = *row;
    Team {
        id,
        abbreviation: abbreviation.to_string(),
        city: city.to_string(),
        conference,
        division: division.to_string(),
        full_name: format!("{} {}", city, name),
        name: name.to_string(),
    }
}

fn team_by_abbreviation(abbreviation: &str) -> Team {
    TEAMS
        .iter()
        .find(|row| row.1 == abbreviation)
        .map(team)
        .unwrap_or_else(|| team(&TEAMS[0]))
}

fn in_conference(conference: Conference) -> impl Iterator<Item = Team> {
    TEAMS
        .iter()
        .filter(move |row| row.4 == conference)
        .map(team)
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// A three-game slate for `date`: one finished game and two yet to tip off
pub fn games<R: Rng + ?Sized>(rng: &mut R, date: NaiveDate) -> Vec<Game> {
    let matchups = [("LAL", "BOS"), ("GSW", "MIA"), ("PHX", "MIL")];

    matchups
        .iter()
        .enumerate()
        .map(|(idx, (home, visitor))| {
            let finished = idx == 0;
            Game {
                id: 1000 + idx as u64,
                date: date.format("%Y-%m-%d").to_string(),
                season: season_of(date),
                status: if finished { "Final" } else { "Scheduled" }.to_string(),
                period: finished.then_some(4),
                time: (!finished).then(|| "7:00 PM ET".to_string()),
                postseason: false,
                home_team: team_by_abbreviation(home),
                visitor_team: team_by_abbreviation(visitor),
                home_team_score: if finished { rng.gen_range(108..118) } else { 0 },
                visitor_team_score: if finished { rng.gen_range(102..112) } else { 0 },
            }
        })
        .collect()
}

/// Season averages for ten headline players, best scorer first
pub fn player_stats<R: Rng + ?Sized>(rng: &mut R) -> Vec<SeasonStats> {
    PLAYERS
        .iter()
        .enumerate()
        .map(|(idx, (first_name, last_name, position, team))| SeasonStats {
            player: Player {
                id: idx as u64 + 1,
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                position: position.to_string(),
                height: Some("6-7".to_string()),
                weight: Some("220".to_string()),
                jersey_number: Some((idx + 1).to_string()),
                college: None,
                country: Some("USA".to_string()),
                draft_year: Some(2018),
                draft_round: Some(1),
                draft_number: Some(idx as u32 + 1),
                team: team_by_abbreviation(team),
            },
            games_played: rng.gen_range(65..82),
            min: rng.gen_range(32.0..37.0),
            pts: 28.0 - idx as f64 * 1.5 + rng.gen_range(0.0..1.5),
            reb: rng.gen_range(8.0..12.0),
            ast: rng.gen_range(7.0..10.0),
            stl: rng.gen_range(1.0..1.5),
            blk: rng.gen_range(0.8..1.5),
            turnover: rng.gen_range(2.0..3.5),
            fg_pct: rng.gen_range(0.45..0.53),
            fg3_pct: rng.gen_range(0.33..0.41),
            ft_pct: rng.gen_range(0.80..0.92),
        })
        .collect()
}

/// Five-team East and West tables, leaders first
pub fn standings<R: Rng + ?Sized>(rng: &mut R) -> Vec<Standing> {
    [Conference::East, Conference::West]
        .into_iter()
        .flat_map(in_conference)
        .collect::<Vec<_>>()
        .into_iter()
        .enumerate()
        .map(|(idx, team)| {
            let rank = (idx % 5) as u32;
            let wins = 45 - rank * 2;
            let losses = 37 + rank * 2;
            let streak = if rng.gen_bool(0.5) {
                format!("W{}", rng.gen_range(1..=3))
            } else {
                format!("L{}", rng.gen_range(1..=2))
            };
            let split = |share: f64, total: u32| (f64::from(total) * share).floor() as u32;

            Standing {
                team,
                wins,
                losses,
                win_pct: round3(f64::from(wins) / f64::from(wins + losses)),
                games_behind: f64::from(rank * 2),
                streak,
                home_record: format!("{}-{}", split(0.6, wins), split(0.4, losses)),
                away_record: format!("{}-{}", split(0.4, wins), split(0.6, losses)),
                conf_record: format!("{}-{}", split(0.55, wins), split(0.45, losses)),
            }
        })
        .collect()
}

/// Full-season aggregates for ten teams
pub fn team_stats<R: Rng + ?Sized>(rng: &mut R) -> Vec<TeamStats> {
    TEAMS
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let wins = 45 - idx as u32 * 2;
            TeamStats {
                team: team(row),
                games_played: SEASON_GAMES,
                wins,
                losses: SEASON_GAMES - wins,
                ppg: rng.gen_range(110.0..120.0),
                opp_ppg: rng.gen_range(105.0..115.0),
                fg_pct: Some(rng.gen_range(0.45..0.50)),
                fg3_pct: Some(rng.gen_range(0.35..0.40)),
                ft_pct: Some(rng.gen_range(0.77..0.85)),
                rpg: Some(rng.gen_range(42.0..47.0)),
                apg: Some(rng.gen_range(24.0..28.0)),
            }
        })
        .collect()
}

/// Zone label for a shot at (`x`, `y`) taken from `distance` feet
fn shot_zone(x: f64, distance: f64) -> &'static str {
    if distance < 8.0 {
        "Paint"
    } else if distance < 16.0 {
        "Mid-Range"
    } else if x < 14.0 || x > 36.0 {
        "Corner 3"
    } else {
        "Above the Break 3"
    }
}

/// Between 40 and 69 attempts scattered over a half court
pub fn shot_chart<R: Rng + ?Sized>(rng: &mut R) -> Vec<ShotData> {
    let attempts = rng.gen_range(40..70);

    (0..attempts)
        .map(|_| {
            let x = rng.gen_range(0.0..50.0);
            let y = rng.gen_range(0.0..47.0);
            let distance = ((x - BASKET.0).powi(2) + (y - BASKET.1).powi(2)).sqrt();
            let shot_type = if distance > THREE_POINT_DISTANCE {
                ShotType::ThreePoint
            } else {
                ShotType::TwoPoint
            };
            let make_rate = match shot_type {
                ShotType::ThreePoint => 0.36,
                ShotType::TwoPoint => 0.48,
            };

            ShotData {
                x,
                y,
                made: rng.gen_bool(make_rate),
                distance,
                shot_type,
                zone: shot_zone(x, distance).to_string(),
            }
        })
        .collect()
}

fn lineup<R: Rng + ?Sized>(
    rng: &mut R,
    first_id: u64,
    first_jersey: u32,
    x_range: std::ops::Range<f64>,
) -> Vec<CourtPosition> {
    (0..5)
        .map(|slot| CourtPosition {
            player_id: first_id + slot,
            x: rng.gen_range(x_range.clone()),
            y: rng.gen_range(10.0..40.0),
            jersey_number: (first_jersey + slot as u32).to_string(),
        })
        .collect()
}

/// Ten actions per quarter for four quarters, with on-court positions
pub fn play_by_play<R: Rng + ?Sized>(rng: &mut R, game_id: u64) -> Vec<PlayEvent> {
    let mut score_home = 0;
    let mut score_away = 0;
    let mut plays = Vec::with_capacity(40);

    for period in 1..=4u32 {
        for i in 0..10u32 {
            let seconds_left = 720 - (i + 1) * 65 - rng.gen_range(0..30);
            let (event_type, description) = *EVENT_TYPES
                .choose(rng)
                .unwrap_or(&EVENT_TYPES[0]);
            let points = match event_type {
                "2pt" => 2,
                "3pt" => 3,
                "freethrow" => 1,
                _ => 0,
            };
            if rng.gen_bool(0.5) {
                score_home += points;
            } else {
                score_away += points;
            }

            plays.push(PlayEvent {
                id: format!("{}-{}-{}", game_id, period, i),
                game_id,
                period,
                clock: format!("{}:{:02}", seconds_left / 60, seconds_left % 60),
                description: description.to_string(),
                player_id: None,
                team_id: None,
                event_type: event_type.to_string(),
                score_home,
                score_away,
                home_positions: Some(lineup(rng, 1, 10, 15.0..45.0)),
                away_positions: Some(lineup(rng, 6, 20, 50.0..80.0)),
                ball_position: Some(BallPosition { x: 47.0, y: 25.0 }),
            });
        }
    }

    plays
}

/// Fifteen recent games, one every three days back from `today`
pub fn game_log<R: Rng + ?Sized>(rng: &mut R, today: NaiveDate) -> Vec<GameLogEntry> {
    let base_points: f64 = rng.gen_range(22.0..30.0);
    let base_rebounds: f64 = rng.gen_range(5.0..10.0);
    let base_assists: f64 = rng.gen_range(4.0..8.0);
    let opponents = ["LAL", "GSW", "BOS", "MIA", "PHX"];

    (0..15i64)
        .map(|i| {
            let date = today - Duration::days(i * 3);
            let opponent = opponents.choose(rng).copied().unwrap_or("LAL");
            GameLogEntry {
                game_id: format!("00224{:05}", 1000 - i),
                date: date.format("%Y-%m-%d").to_string(),
                matchup: format!("vs {}", opponent),
                result: if rng.gen_bool(0.5) { "W" } else { "L" }.to_string(),
                minutes: rng.gen_range(28.0..38.0),
                points: (base_points + rng.gen_range(-7.5..7.5)).max(0.0),
                rebounds: (base_rebounds + rng.gen_range(-3.0..3.0)).max(0.0),
                assists: (base_assists + rng.gen_range(-2.5..2.5)).max(0.0),
                steals: f64::from(rng.gen_range(0..3u8)),
                blocks: f64::from(rng.gen_range(0..3u8)),
                fg_pct: rng.gen_range(0.35..0.60),
                fg3_pct: rng.gen_range(0.25..0.50),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_games_have_plausible_scores() {
        let games = games(&mut rng(), date(2024, 1, 1));

        assert_eq!(games.len(), 3);
        assert!(games[0].is_final());
        assert!((108..118).contains(&games[0].home_team_score));
        assert!((102..112).contains(&games[0].visitor_team_score));
        for game in &games[1..] {
            assert_eq!(game.status, "Scheduled");
            assert_eq!(game.home_team_score, 0);
            assert!(game.time.is_some());
        }
        assert!(games.iter().all(|g| g.date == "2024-01-01" && g.season == 2023));
    }

    #[test]
    fn test_season_starts_in_october() {
        assert_eq!(season_of(date(2024, 10, 22)), 2024);
        assert_eq!(season_of(date(2025, 4, 13)), 2024);
    }

    #[test]
    fn test_same_seed_gives_same_output() {
        let first = player_stats(&mut StdRng::seed_from_u64(42));
        let second = player_stats(&mut StdRng::seed_from_u64(42));

        assert_eq!(first, second);
    }

    #[test]
    fn test_player_stats_ranges() {
        let stats = player_stats(&mut rng());

        assert_eq!(stats.len(), 10);
        for row in &stats {
            assert!((65..82).contains(&row.games_played));
            assert!((0.0..=1.0).contains(&row.fg_pct));
            assert!((0.0..=1.0).contains(&row.ft_pct));
            assert!(row.pts > 0.0);
        }
        assert!(stats[0].pts > stats[9].pts, "Best scorer should come first");
    }

    #[test]
    fn test_standings_are_consistent_per_conference() {
        let table = standings(&mut rng());

        assert_eq!(table.len(), 10);
        let (east, west) = table.split_at(5);
        assert!(east.iter().all(|s| s.team.conference == Conference::East));
        assert!(west.iter().all(|s| s.team.conference == Conference::West));

        for conference in [east, west] {
            let leader = &conference[0];
            assert!((leader.games_behind - 0.0).abs() < f64::EPSILON);
            for row in conference {
                let expected = ((f64::from(leader.wins) - f64::from(row.wins))
                    + (f64::from(row.losses) - f64::from(leader.losses)))
                    / 2.0;
                assert!((row.games_behind - expected).abs() < f64::EPSILON);
                assert_eq!(row.wins + row.losses, 82);
                assert!(row.streak.starts_with('W') || row.streak.starts_with('L'));
            }
        }
    }

    #[test]
    fn test_team_stats_fill_every_split() {
        let stats = team_stats(&mut rng());

        assert_eq!(stats.len(), 10);
        for row in &stats {
            assert_eq!(row.wins + row.losses, row.games_played);
            assert!(row.fg_pct.is_some() && row.apg.is_some());
        }
    }

    #[test]
    fn test_shot_chart_geometry() {
        let shots = shot_chart(&mut rng());

        assert!((40..70).contains(&shots.len()));
        for shot in &shots {
            assert!((0.0..50.0).contains(&shot.x));
            assert!((0.0..47.0).contains(&shot.y));
            let three = shot.distance > THREE_POINT_DISTANCE;
            assert_eq!(shot.shot_type == ShotType::ThreePoint, three);
            if shot.distance < 8.0 {
                assert_eq!(shot.zone, "Paint");
            }
        }
    }

    #[test]
    fn test_play_by_play_shape() {
        let plays = play_by_play(&mut rng(), 401);

        assert_eq!(plays.len(), 40);
        assert_eq!(plays[0].id, "401-1-0");
        assert_eq!(plays[39].period, 4);

        let mut last_total = 0;
        for play in &plays {
            let total = play.score_home + play.score_away;
            assert!(total >= last_total, "Scores never go down");
            last_total = total;
            assert_eq!(play.home_positions.as_ref().map(Vec::len), Some(5));
            assert_eq!(play.away_positions.as_ref().map(Vec::len), Some(5));
            let (minutes, seconds) = play.clock.split_once(':').unwrap();
            assert!(minutes.parse::<u32>().unwrap() < 12);
            assert_eq!(seconds.len(), 2);
        }
    }

    #[test]
    fn test_game_log_spacing() {
        let log = game_log(&mut rng(), date(2025, 3, 31));

        assert_eq!(log.len(), 15);
        assert_eq!(log[0].date, "2025-03-31");
        assert_eq!(log[1].date, "2025-03-28");
        assert!(log.iter().all(|g| g.points >= 0.0 && (g.result == "W" || g.result == "L")));
    }

    #[test]
    fn test_game_log_lines_stay_near_baseline() {
        for seed in 0..20 {
            let log = game_log(&mut StdRng::seed_from_u64(seed), date(2025, 3, 31));

            for entry in &log {
                assert!((14.5..=37.5).contains(&entry.points), "points {}", entry.points);
                assert!((2.0..=13.0).contains(&entry.rebounds), "rebounds {}", entry.rebounds);
                assert!((1.5..=10.5).contains(&entry.assists), "assists {}", entry.assists);
                assert!((28.0..38.0).contains(&entry.minutes));
            }
        }
    }
}
