//! Wire shapes for the statsapi live game feed and schedule endpoints.
//!
//! Every field is optional: the feed omits whole subtrees (no `pitchData` on a
//! pickoff, no `hitData` on a called strike) and the flattener turns each absent
//! value into a missing cell rather than failing.
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// A list the feed may send as `null` or leave out; both read as empty.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// `/api/v1.1/game/{gamePk}/feed/live`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDocument {
    pub game_pk: Option<i64>,
    pub game_data: Option<GameData>,
    pub live_data: Option<LiveData>,
}

impl GameDocument {
    pub fn official_date(&self) -> Option<NaiveDate> {
        self.game_data.as_ref()?.datetime.as_ref()?.official_date
    }

    pub fn teams(&self) -> Option<&GameTeams> {
        self.game_data.as_ref()?.teams.as_ref()
    }

    pub fn all_plays(&self) -> Option<&[AtBat]> {
        self.live_data.as_ref()?.plays.as_ref()?.all_plays.as_deref()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameData {
    pub datetime: Option<GameDateTime>,
    pub teams: Option<GameTeams>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDateTime {
    pub official_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameTeams {
    pub away: Option<TeamInfo>,
    pub home: Option<TeamInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamInfo {
    pub id: Option<i64>,
    pub abbreviation: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LiveData {
    pub plays: Option<Plays>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plays {
    pub all_plays: Option<Vec<AtBat>>,
}

/// One plate appearance (`allPlays[]`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtBat {
    pub at_bat_index: Option<i64>,
    pub result: Option<AtBatResult>,
    pub about: Option<About>,
    pub matchup: Option<Matchup>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub play_events: Vec<PlayEvent>,
}

impl AtBat {
    pub fn index(&self) -> Option<i64> {
        self.at_bat_index
            .or_else(|| self.about.as_ref().and_then(|about| about.at_bat_index))
    }

    pub fn is_top_inning(&self) -> Option<bool> {
        self.about.as_ref()?.is_top_inning
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct About {
    pub at_bat_index: Option<i64>,
    pub is_top_inning: Option<bool>,
    pub inning: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtBatResult {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub event: Option<String>,
    pub event_type: Option<String>,
    pub description: Option<String>,
    pub rbi: Option<i64>,
    pub away_score: Option<i64>,
    pub home_score: Option<i64>,
    pub is_out: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Matchup {
    pub batter: Option<PlayerRef>,
    pub bat_side: Option<Code>,
    pub pitcher: Option<PlayerRef>,
    pub pitch_hand: Option<Code>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRef {
    pub id: Option<i64>,
    pub full_name: Option<String>,
}

/// The `{ "code": ..., "description": ... }` pair the feed uses for hands,
/// calls and pitch types.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Code {
    pub code: Option<String>,
    pub description: Option<String>,
}

/// One entry of `playEvents[]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayEvent {
    pub details: Option<EventDetails>,
    /// Count *after* this event.
    pub count: Option<Count>,
    pub pitch_data: Option<PitchData>,
    pub hit_data: Option<HitData>,
    pub index: Option<i64>,
    pub play_id: Option<String>,
    pub pitch_number: Option<i64>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub is_pitch: Option<bool>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl PlayEvent {
    pub fn code(&self) -> Option<&str> {
        self.details.as_ref()?.code.as_deref()
    }

    pub fn balls(&self) -> Option<i64> {
        self.count.as_ref()?.balls
    }

    pub fn strikes(&self) -> Option<i64> {
        self.count.as_ref()?.strikes
    }

    pub fn outs(&self) -> Option<i64> {
        self.count.as_ref()?.outs
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    pub call: Option<Code>,
    pub description: Option<String>,
    pub code: Option<String>,
    pub is_in_play: Option<bool>,
    pub is_strike: Option<bool>,
    pub is_ball: Option<bool>,
    pub is_out: Option<bool>,
    pub has_review: Option<bool>,
    #[serde(rename = "type")]
    pub pitch_type: Option<Code>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Count {
    pub balls: Option<i64>,
    pub strikes: Option<i64>,
    pub outs: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PitchData {
    pub start_speed: Option<f64>,
    pub end_speed: Option<f64>,
    pub strike_zone_top: Option<f64>,
    pub strike_zone_bottom: Option<f64>,
    pub coordinates: Option<PitchCoordinates>,
    pub breaks: Option<Breaks>,
    pub zone: Option<i64>,
    pub type_confidence: Option<f64>,
    pub plate_time: Option<f64>,
    pub extension: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PitchCoordinates {
    pub x: Option<f64>,
    pub y: Option<f64>,
    #[serde(rename = "aX")]
    pub a_x: Option<f64>,
    #[serde(rename = "aY")]
    pub a_y: Option<f64>,
    #[serde(rename = "aZ")]
    pub a_z: Option<f64>,
    #[serde(rename = "pfxX")]
    pub pfx_x: Option<f64>,
    #[serde(rename = "pfxZ")]
    pub pfx_z: Option<f64>,
    #[serde(rename = "pX")]
    pub p_x: Option<f64>,
    #[serde(rename = "pZ")]
    pub p_z: Option<f64>,
    #[serde(rename = "vX0")]
    pub v_x0: Option<f64>,
    #[serde(rename = "vY0")]
    pub v_y0: Option<f64>,
    #[serde(rename = "vZ0")]
    pub v_z0: Option<f64>,
    pub x0: Option<f64>,
    pub y0: Option<f64>,
    pub z0: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breaks {
    pub spin_rate: Option<f64>,
    pub spin_direction: Option<f64>,
    pub break_vertical_induced: Option<f64>,
    pub break_horizontal: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HitData {
    pub launch_speed: Option<f64>,
    pub launch_angle: Option<f64>,
    pub total_distance: Option<f64>,
    pub location: Option<String>,
    pub trajectory: Option<String>,
    pub hardness: Option<String>,
    pub coordinates: Option<HitCoordinates>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HitCoordinates {
    pub coord_x: Option<f64>,
    pub coord_y: Option<f64>,
}

// ---------------------------------------------------------------------------
// Schedule  (/api/v1/schedule)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub dates: Vec<ScheduleDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleDate {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub games: Vec<ScheduleGame>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleGame {
    pub game_pk: i64,
    pub game_date: Option<String>,
    pub official_date: Option<NaiveDate>,
    pub status: Option<ScheduleStatus>,
    pub teams: Option<ScheduleTeams>,
    pub venue: Option<Venue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleStatus {
    pub coded_game_state: Option<String>,
    pub detailed_state: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleTeams {
    pub away: Option<ScheduleSide>,
    pub home: Option<ScheduleSide>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleSide {
    pub team: Option<TeamInfo>,
    pub score: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Venue {
    pub id: Option<i64>,
    pub name: Option<String>,
}
