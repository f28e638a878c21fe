use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One value of the output table. `Missing` serializes as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Missing,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Int(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Float(value)
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<NaiveDate> for Cell {
    fn from(value: NaiveDate) -> Self {
        Cell::Text(value.format("%Y-%m-%d").to_string())
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Cell::Missing, Into::into)
    }
}

/// Declares the row struct together with its column list so the two can never
/// drift apart.
macro_rules! flat_record {
    ($($(#[$meta:meta])* $field:ident: $ty:ty,)*) => {
        /// One emitted pitch or event. Every value may be missing.
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct FlatRecord {
            $($(#[$meta])* pub $field: Option<$ty>,)*
        }

        impl FlatRecord {
            pub const COLUMNS: &'static [&'static str] = &[$(stringify!($field),)*];

            /// Cells in `COLUMNS` order.
            pub fn cells(&self) -> Vec<Cell> {
                vec![$(Cell::from(self.$field.clone()),)*]
            }
        }
    };
}

flat_record! {
    game_id: i64,
    game_date: NaiveDate,
    at_bat_index: i64,
    batter_id: i64,
    batter_name: String,
    batter_hand: String,
    batter_team: String,
    batter_team_id: i64,
    pitcher_id: i64,
    pitcher_name: String,
    pitcher_hand: String,
    pitcher_team: String,
    pitcher_team_id: i64,

    play_description: String,
    play_code: String,
    in_play: bool,
    is_strike: bool,
    is_swing: bool,
    is_whiff: bool,
    /// From the at-bat result, so only set where the result is.
    is_out: bool,
    is_ball: bool,
    is_review: bool,
    pitch_type: String,
    pitch_description: String,

    /// Count before the event.
    strikes: i64,
    balls: i64,
    outs: i64,

    start_speed: f64,
    end_speed: f64,
    sz_top: f64,
    sz_bot: f64,
    x: f64,
    y: f64,
    ax: f64,
    ay: f64,
    az: f64,
    pfxx: f64,
    pfxz: f64,
    px: f64,
    pz: f64,
    vx0: f64,
    vy0: f64,
    vz0: f64,
    x0: f64,
    y0: f64,
    z0: f64,
    zone: i64,
    type_confidence: f64,
    plate_time: f64,
    extension: f64,
    spin_rate: f64,
    spin_direction: f64,
    /// Induced vertical break.
    ivb: f64,
    /// Horizontal break.
    hb: f64,

    launch_speed: f64,
    launch_angle: f64,
    launch_distance: f64,
    launch_location: String,
    trajectory: String,
    hardness: String,
    hit_x: f64,
    hit_y: f64,

    index_play: i64,
    play_id: String,
    start_time: String,
    end_time: String,
    is_pitch: bool,
    type_type: String,

    type_ab: String,
    event: String,
    event_type: String,
    rbi: i64,
    away_score: i64,
    home_score: i64,

    is_walk_marker: bool,
}
