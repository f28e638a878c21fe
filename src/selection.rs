//! Picks one pitcher's pitches out of the flattened table and summarizes the
//! pitch mix.
use std::collections::BTreeMap;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::Serialize;

use crate::record::FlatRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum BatterHands {
    #[default]
    All,
    /// Left-handed hitters only.
    Left,
    /// Right-handed hitters only.
    Right,
}

impl BatterHands {
    pub fn allows(self, hand: Option<&str>) -> bool {
        match self {
            BatterHands::All => matches!(hand, Some("L") | Some("R")),
            BatterHands::Left => hand == Some("L"),
            BatterHands::Right => hand == Some("R"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PitchSelection {
    pub pitcher_id: i64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub batter_hands: BatterHands,
}

impl PitchSelection {
    pub fn new(pitcher_id: i64) -> Self {
        Self {
            pitcher_id,
            start_date: None,
            end_date: None,
            batter_hands: BatterHands::All,
        }
    }

    /// Real pitches by this pitcher with a classified pitch type, inside the
    /// date range, against an allowed batter hand.
    pub fn matches(&self, record: &FlatRecord) -> bool {
        if record.pitcher_id != Some(self.pitcher_id)
            || record.is_pitch != Some(true)
            || record.pitch_type.is_none()
        {
            return false;
        }
        if let Some(start) = self.start_date {
            if record.game_date.map_or(true, |date| date < start) {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if record.game_date.map_or(true, |date| date > end) {
                return false;
            }
        }
        self.batter_hands.allows(record.batter_hand.as_deref())
    }

    pub fn select<'a>(&self, records: &'a [FlatRecord]) -> Vec<&'a FlatRecord> {
        records.iter().filter(|record| self.matches(record)).collect()
    }
}

/// Usage and average movement for one pitch type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PitchUsage {
    pub pitch_type: String,
    pub pitch_name: Option<&'static str>,
    pub count: usize,
    pub usage: f64,
    pub avg_start_speed: Option<f64>,
    pub avg_ivb: Option<f64>,
    pub avg_hb: Option<f64>,
    pub avg_spin_rate: Option<f64>,
}

#[derive(Default)]
struct Mean {
    sum: f64,
    n: usize,
}

impl Mean {
    fn add(&mut self, value: Option<f64>) {
        if let Some(value) = value {
            self.sum += value;
            self.n += 1;
        }
    }

    fn get(&self) -> Option<f64> {
        (self.n > 0).then(|| self.sum / self.n as f64)
    }
}

#[derive(Default)]
struct Group {
    count: usize,
    start_speed: Mean,
    ivb: Mean,
    hb: Mean,
    spin_rate: Mean,
}

/// Most-used pitch first; ties by pitch code.
pub fn pitch_mix(pitches: &[&FlatRecord]) -> Vec<PitchUsage> {
    let mut groups: BTreeMap<&str, Group> = BTreeMap::new();
    for record in pitches {
        let Some(pitch_type) = record.pitch_type.as_deref() else {
            continue;
        };
        let group = groups.entry(pitch_type).or_default();
        group.count += 1;
        group.start_speed.add(record.start_speed);
        group.ivb.add(record.ivb);
        group.hb.add(record.hb);
        group.spin_rate.add(record.spin_rate);
    }

    let total: usize = groups.values().map(|g| g.count).sum();
    let mut mix: Vec<PitchUsage> = groups
        .into_iter()
        .map(|(pitch_type, group)| PitchUsage {
            pitch_type: pitch_type.to_string(),
            pitch_name: pitch_name(pitch_type),
            count: group.count,
            usage: group.count as f64 / total as f64,
            avg_start_speed: group.start_speed.get(),
            avg_ivb: group.ivb.get(),
            avg_hb: group.hb.get(),
            avg_spin_rate: group.spin_rate.get(),
        })
        .collect();
    mix.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.pitch_type.cmp(&b.pitch_type)));
    mix
}

pub fn pitch_name(code: &str) -> Option<&'static str> {
    let name = match code {
        // fastballs
        "FF" => "4-Seam Fastball",
        "FA" => "Fastball",
        "SI" => "Sinker",
        "FC" => "Cutter",
        // offspeed
        "CH" => "Changeup",
        "FS" => "Splitter",
        "SC" => "Screwball",
        "FO" => "Forkball",
        // sliders
        "SL" => "Slider",
        "ST" => "Sweeper",
        "SV" => "Slurve",
        // curveballs
        "KC" => "Knuckle Curve",
        "CU" => "Curveball",
        "CS" => "Slow Curve",
        "EP" => "Eephus",
        // other
        "KN" => "Knuckleball",
        "PO" => "Pitch Out",
        "UN" => "Unknown",
        _ => return None,
    };
    Some(name)
}
