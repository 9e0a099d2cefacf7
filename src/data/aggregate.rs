//! Season aggregates derived from raw game results
//!
//! Standings and team stats are not served directly by the game provider; they
//! are computed from each team's list of games. Only completed games count.

use super::{Conference, Game, Standing, Team, TeamStats};

/// Streak label for a team with no completed games
const NO_STREAK: &str = "-";

/// Win/loss tally for a subset of games
#[derive(Debug, Default, Clone, Copy)]
struct Record {
    wins: u32,
    losses: u32,
}

impl Record {
    fn add(&mut self, won: bool) {
        if won {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
    }

    fn label(&self) -> String {
        format!("{}-{}", self.wins, self.losses)
    }
}

/// Completed games for a team, oldest first
fn completed_in_order<'a>(team: &Team, games: &'a [Game]) -> Vec<&'a Game> {
    let mut played: Vec<&Game> = games
        .iter()
        .filter(|game| game.is_final() && game.score_for(team.id).is_some())
        .collect();
    played.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
    played
}

/// Current run of consecutive results, e.g. `W3`
fn current_streak(results: &[bool]) -> String {
    let Some(&last) = results.last() else {
        return NO_STREAK.to_string();
    };
    let run = results.iter().rev().take_while(|&&won| won == last).count();
    format!("{}{}", if last { 'W' } else { 'L' }, run)
}

fn standing_for(team: &Team, games: &[Game]) -> Standing {
    let mut overall = Record::default();
    let mut home = Record::default();
    let mut away = Record::default();
    let mut conference = Record::default();
    let mut results = Vec::new();

    for game in completed_in_order(team, games) {
        let Some((scored, allowed)) = game.score_for(team.id) else {
            continue;
        };
        let won = scored > allowed;

        overall.add(won);
        results.push(won);
        if game.home_team.id == team.id {
            home.add(won);
        } else {
            away.add(won);
        }
        if game
            .opponent_of(team.id)
            .is_some_and(|opponent| opponent.conference == team.conference)
        {
            conference.add(won);
        }
    }

    let played = overall.wins + overall.losses;
    let win_pct = if played > 0 {
        f64::from(overall.wins) / f64::from(played)
    } else {
        0.0
    };

    Standing {
        team: team.clone(),
        wins: overall.wins,
        losses: overall.losses,
        win_pct,
        games_behind: 0.0,
        streak: current_streak(&results),
        home_record: home.label(),
        away_record: away.label(),
        conf_record: conference.label(),
    }
}

fn rank_conference(mut table: Vec<Standing>) -> Vec<Standing> {
    table.sort_by(|a, b| {
        b.win_pct
            .total_cmp(&a.win_pct)
            .then(b.wins.cmp(&a.wins))
            .then_with(|| a.team.full_name.cmp(&b.team.full_name))
    });

    if let Some((leader_wins, leader_losses)) = table.first().map(|s| (s.wins, s.losses)) {
        for standing in &mut table {
            let wins_gap = i64::from(leader_wins) - i64::from(standing.wins);
            let losses_gap = i64::from(standing.losses) - i64::from(leader_losses);
            standing.games_behind = (wins_gap + losses_gap) as f64 / 2.0;
        }
    }
    table
}

/// Builds conference standings from each team's games
///
/// Returns the East table followed by the West table, each sorted by win
/// percentage with games behind measured from the conference leader. Teams
/// without a current conference are left out.
pub fn compute_standings(teams: &[(Team, Vec<Game>)]) -> Vec<Standing> {
    let (east, west): (Vec<Standing>, Vec<Standing>) = teams
        .iter()
        .filter(|(team, _)| team.conference != Conference::Other)
        .map(|(team, games)| standing_for(team, games))
        .partition(|standing| standing.team.conference == Conference::East);

    let mut standings = rank_conference(east);
    standings.extend(rank_conference(west));
    standings
}

/// Builds scoring aggregates from each team's games
pub fn compute_team_stats(teams: &[(Team, Vec<Game>)]) -> Vec<TeamStats> {
    teams
        .iter()
        .filter(|(team, _)| team.conference != Conference::Other)
        .map(|(team, games)| {
            let mut record = Record::default();
            let mut points = 0u64;
            let mut allowed = 0u64;

            for game in completed_in_order(team, games) {
                if let Some((scored, conceded)) = game.score_for(team.id) {
                    record.add(scored > conceded);
                    points += u64::from(scored);
                    allowed += u64::from(conceded);
                }
            }

            let played = record.wins + record.losses;
            let per_game = |total: u64| match played {
                0 => 0.0,
                n => total as f64 / f64::from(n),
            };

            TeamStats {
                team: team.clone(),
                games_played: played,
                wins: record.wins,
                losses: record.losses,
                ppg: per_game(points),
                opp_ppg: per_game(allowed),
                fg_pct: None,
                fg3_pct: None,
                ft_pct: None,
                rpg: None,
                apg: None,
            }
        })
        .collect()
}
