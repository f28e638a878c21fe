//! Turns a season schedule into the list of games to fetch.
use std::collections::HashSet;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::Serialize;
use tracing::warn;

use crate::error::QueryError;
use crate::model::ScheduleResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum GameType {
    #[default]
    Regular,
    Spring,
    Any,
}

impl GameType {
    fn code(self) -> Option<&'static str> {
        match self {
            GameType::Regular => Some("R"),
            GameType::Spring => Some("S"),
            GameType::Any => None,
        }
    }
}

/// Which games to keep by `codedGameState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum GameState {
    #[default]
    Final,
    InProgress,
    Any,
}

impl GameState {
    pub fn allows(self, coded_state: Option<&str>) -> bool {
        match self {
            GameState::Final => coded_state == Some("F"),
            GameState::InProgress => coded_state == Some("I"),
            GameState::Any => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleQuery {
    pub season: u16,
    pub sport_id: u32,
    pub game_type: GameType,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub state: GameState,
}

impl ScheduleQuery {
    pub fn validate(&self) -> Result<(), QueryError> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) if start > end => Err(QueryError::InvertedRange { start, end }),
            _ => Ok(()),
        }
    }

    /// Path and query string, relative to the API base URL.
    pub fn path(&self) -> String {
        let mut path = format!("/api/v1/schedule/?sportId={}&season={}", self.sport_id, self.season);
        if let Some(code) = self.game_type.code() {
            path += &format!("&gameTypes={code}");
        }
        path += "&hydrate=lineup,players";
        path
    }

    pub fn contains(&self, date: Option<NaiveDate>) -> bool {
        if self.start_date.is_none() && self.end_date.is_none() {
            return true;
        }
        let Some(date) = date else {
            return false;
        };
        self.start_date.map_or(true, |start| date >= start) && self.end_date.map_or(true, |end| date <= end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledGame {
    pub game_pk: i64,
    pub official_date: Option<NaiveDate>,
    pub away: Option<String>,
    pub home: Option<String>,
    pub away_score: Option<i64>,
    pub home_score: Option<i64>,
    pub state: Option<String>,
    pub venue: Option<String>,
}

/// Games in schedule order, inside the query's date range and state filter,
/// each `gamePk` once.
pub fn resolve(response: ScheduleResponse, query: &ScheduleQuery) -> Vec<ScheduledGame> {
    let mut seen = HashSet::new();
    let games: Vec<ScheduledGame> = response
        .dates
        .into_iter()
        .flat_map(|date| date.games)
        .filter(|game| query.contains(game.official_date))
        .filter(|game| {
            let state = game.status.as_ref().and_then(|s| s.coded_game_state.as_deref());
            query.state.allows(state)
        })
        .filter(|game| seen.insert(game.game_pk))
        .map(|game| {
            let teams = game.teams.as_ref();
            let away = teams.and_then(|t| t.away.as_ref());
            let home = teams.and_then(|t| t.home.as_ref());
            ScheduledGame {
                game_pk: game.game_pk,
                official_date: game.official_date,
                away: away.and_then(|s| s.team.as_ref()).and_then(|t| t.name.clone()),
                home: home.and_then(|s| s.team.as_ref()).and_then(|t| t.name.clone()),
                away_score: away.and_then(|s| s.score),
                home_score: home.and_then(|s| s.score),
                state: game.status.and_then(|s| s.coded_game_state),
                venue: game.venue.and_then(|v| v.name),
            }
        })
        .collect();

    if games.is_empty() {
        warn!(season = query.season, sport_id = query.sport_id, "Schedule resolved to zero games");
    }

    games
}
