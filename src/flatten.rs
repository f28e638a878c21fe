//! Walks a game's `allPlays` tree and emits one [`FlatRecord`] per pitch,
//! per coded non-pitch call, and one synthetic record per four-ball at-bat.
use tracing::debug;

use crate::error::FlattenError;
use crate::model::{AtBat, AtBatResult, GameDocument, GameTeams, PlayEvent, TeamInfo};
use crate::record::FlatRecord;

/// Pitch codes that count as a swing.
pub const SWING_CODES: [&str; 7] = ["X", "F", "S", "D", "E", "T", "W"];
/// Swing codes where the bat missed the ball.
pub const WHIFF_CODES: [&str; 3] = ["S", "T", "W"];

/// How the four-ball walk marker interacts with the at-bat result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlattenOptions {
    /// Emit a synthetic record when an at-bat reaches four balls.
    pub walk_markers: bool,
    /// Also keep the result on the at-bat's last event when a walk marker
    /// carries it. Off by default so exactly one record per at-bat holds the result.
    pub duplicate_walk_result: bool,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            walk_markers: true,
            duplicate_walk_result: false,
        }
    }
}

/// Game-level identity shared by every record of one document.
struct GameContext<'a> {
    game_id: Option<i64>,
    game_date: Option<chrono::NaiveDate>,
    teams: &'a GameTeams,
}

/// Batting and pitching side for one at-bat.
#[derive(Debug, Clone, Copy)]
struct Sides<'a> {
    batting: Option<&'a TeamInfo>,
    pitching: Option<&'a TeamInfo>,
}

impl<'a> Sides<'a> {
    /// Away bats in the top half, home in the bottom. Unknown half means unknown sides.
    fn for_at_bat(teams: &'a GameTeams, at_bat: &AtBat) -> Self {
        let away = teams.away.as_ref();
        let home = teams.home.as_ref();
        match at_bat.is_top_inning() {
            Some(true) => Sides { batting: away, pitching: home },
            Some(false) => Sides { batting: home, pitching: away },
            None => Sides { batting: None, pitching: None },
        }
    }
}

/// Pre-event count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PreCount {
    balls: Option<i64>,
    strikes: Option<i64>,
    outs: Option<i64>,
}

/// Count before `event`: 0-0 on the first pitch of the at-bat, otherwise the
/// count left by `prev`. With no previous event the at-bat has just started.
fn pre_event_count(event: &PlayEvent, prev: Option<&PlayEvent>) -> PreCount {
    match prev {
        Some(prev) if event.pitch_number != Some(1) => PreCount {
            balls: prev.balls(),
            strikes: prev.strikes(),
            outs: prev.outs(),
        },
        Some(_) => PreCount {
            balls: Some(0),
            strikes: Some(0),
            outs: event.outs(),
        },
        None => PreCount {
            balls: Some(0),
            strikes: Some(0),
            outs: event.outs().or(Some(0)),
        },
    }
}

fn qualifies(event: &PlayEvent) -> bool {
    event.is_pitch == Some(true) || event.code().is_some()
}

fn reaches_four_balls(event: &PlayEvent) -> bool {
    event.balls() == Some(4)
}

/// Swing and whiff flags. Missing details means both are unknown.
fn swing_whiff(event: &PlayEvent) -> (Option<bool>, Option<bool>) {
    match event.code() {
        Some(code) => (
            Some(SWING_CODES.contains(&code)),
            Some(WHIFF_CODES.contains(&code)),
        ),
        None => (None, None),
    }
}

pub fn flatten_game(doc: &GameDocument, options: &FlattenOptions) -> Result<Vec<FlatRecord>, FlattenError> {
    let all_plays = doc.all_plays().ok_or(FlattenError::MissingPath {
        game_pk: doc.game_pk,
        path: "liveData.plays.allPlays",
    })?;
    let teams = doc.teams().ok_or(FlattenError::MissingPath {
        game_pk: doc.game_pk,
        path: "gameData.teams",
    })?;

    let ctx = GameContext {
        game_id: doc.game_pk,
        game_date: doc.official_date(),
        teams,
    };

    let mut records = Vec::new();
    for at_bat in all_plays {
        flatten_at_bat(&ctx, at_bat, options, &mut records);
    }

    debug!(game_pk = ?doc.game_pk, at_bats = all_plays.len(), records = records.len(), "Flattened game");

    Ok(records)
}

fn flatten_at_bat(ctx: &GameContext, at_bat: &AtBat, options: &FlattenOptions, out: &mut Vec<FlatRecord>) {
    let base = at_bat_base(ctx, at_bat);
    let walk_event = if options.walk_markers {
        at_bat.play_events.iter().position(reaches_four_balls)
    } else {
        None
    };
    let last_result_allowed = walk_event.is_none() || options.duplicate_walk_result;
    let last = at_bat.play_events.len().saturating_sub(1);

    let mut prev: Option<&PlayEvent> = None;
    for (i, event) in at_bat.play_events.iter().enumerate() {
        if qualifies(event) {
            let result = if i == last && last_result_allowed {
                at_bat.result.as_ref()
            } else {
                None
            };
            out.push(event_record(&base, event, prev, result));
        }

        if walk_event == Some(i) {
            out.push(walk_record(&base, event, at_bat.result.as_ref()));
        }

        prev = Some(event);
    }
}

/// Fields shared by every record of one at-bat: game identity, matchup and sides.
fn at_bat_base(ctx: &GameContext, at_bat: &AtBat) -> FlatRecord {
    let sides = Sides::for_at_bat(ctx.teams, at_bat);
    let matchup = at_bat.matchup.as_ref();
    let batter = matchup.and_then(|m| m.batter.as_ref());
    let pitcher = matchup.and_then(|m| m.pitcher.as_ref());

    FlatRecord {
        game_id: ctx.game_id,
        game_date: ctx.game_date,
        at_bat_index: at_bat.index(),
        batter_id: batter.and_then(|p| p.id),
        batter_name: batter.and_then(|p| p.full_name.clone()),
        batter_hand: matchup
            .and_then(|m| m.bat_side.as_ref())
            .and_then(|side| side.code.clone()),
        batter_team: sides.batting.and_then(|t| t.abbreviation.clone()),
        batter_team_id: sides.batting.and_then(|t| t.id),
        pitcher_id: pitcher.and_then(|p| p.id),
        pitcher_name: pitcher.and_then(|p| p.full_name.clone()),
        pitcher_hand: matchup
            .and_then(|m| m.pitch_hand.as_ref())
            .and_then(|hand| hand.code.clone()),
        pitcher_team: sides.pitching.and_then(|t| t.abbreviation.clone()),
        pitcher_team_id: sides.pitching.and_then(|t| t.id),
        ..Default::default()
    }
}

fn event_record(base: &FlatRecord, event: &PlayEvent, prev: Option<&PlayEvent>, result: Option<&AtBatResult>) -> FlatRecord {
    let mut record = base.clone();

    let details = event.details.as_ref();
    record.play_description = details.and_then(|d| d.description.clone());
    record.play_code = details.and_then(|d| d.code.clone());
    record.in_play = details.and_then(|d| d.is_in_play);
    record.is_strike = details.and_then(|d| d.is_strike);
    record.is_ball = details.and_then(|d| d.is_ball);
    record.is_review = details.and_then(|d| d.has_review);
    let pitch_type = details.and_then(|d| d.pitch_type.as_ref());
    record.pitch_type = pitch_type.and_then(|t| t.code.clone());
    record.pitch_description = pitch_type.and_then(|t| t.description.clone());
    (record.is_swing, record.is_whiff) = swing_whiff(event);

    let count = pre_event_count(event, prev);
    record.balls = count.balls;
    record.strikes = count.strikes;
    record.outs = count.outs;

    let pitch = event.pitch_data.as_ref();
    record.start_speed = pitch.and_then(|p| p.start_speed);
    record.end_speed = pitch.and_then(|p| p.end_speed);
    record.sz_top = pitch.and_then(|p| p.strike_zone_top);
    record.sz_bot = pitch.and_then(|p| p.strike_zone_bottom);
    record.zone = pitch.and_then(|p| p.zone);
    record.type_confidence = pitch.and_then(|p| p.type_confidence);
    record.plate_time = pitch.and_then(|p| p.plate_time);
    record.extension = pitch.and_then(|p| p.extension);

    let coords = pitch.and_then(|p| p.coordinates.as_ref());
    record.x = coords.and_then(|c| c.x);
    record.y = coords.and_then(|c| c.y);
    record.ax = coords.and_then(|c| c.a_x);
    record.ay = coords.and_then(|c| c.a_y);
    record.az = coords.and_then(|c| c.a_z);
    record.pfxx = coords.and_then(|c| c.pfx_x);
    record.pfxz = coords.and_then(|c| c.pfx_z);
    record.px = coords.and_then(|c| c.p_x);
    record.pz = coords.and_then(|c| c.p_z);
    record.vx0 = coords.and_then(|c| c.v_x0);
    record.vy0 = coords.and_then(|c| c.v_y0);
    record.vz0 = coords.and_then(|c| c.v_z0);
    record.x0 = coords.and_then(|c| c.x0);
    record.y0 = coords.and_then(|c| c.y0);
    record.z0 = coords.and_then(|c| c.z0);

    let breaks = pitch.and_then(|p| p.breaks.as_ref());
    record.spin_rate = breaks.and_then(|b| b.spin_rate);
    record.spin_direction = breaks.and_then(|b| b.spin_direction);
    record.ivb = breaks.and_then(|b| b.break_vertical_induced);
    record.hb = breaks.and_then(|b| b.break_horizontal);

    let hit = event.hit_data.as_ref();
    record.launch_speed = hit.and_then(|h| h.launch_speed);
    record.launch_angle = hit.and_then(|h| h.launch_angle);
    record.launch_distance = hit.and_then(|h| h.total_distance);
    record.launch_location = hit.and_then(|h| h.location.clone());
    record.trajectory = hit.and_then(|h| h.trajectory.clone());
    record.hardness = hit.and_then(|h| h.hardness.clone());
    let hit_coords = hit.and_then(|h| h.coordinates.as_ref());
    record.hit_x = hit_coords.and_then(|c| c.coord_x);
    record.hit_y = hit_coords.and_then(|c| c.coord_y);

    copy_event_identity(&mut record, event);
    if let Some(result) = result {
        copy_result(&mut record, result);
    }
    record.is_walk_marker = Some(false);

    record
}

/// The automatic-walk record: matchup, sides, timing and the count the
/// fourth ball left behind. Physics stay missing. It is never a pitch and has
/// no `play_id` of its own, so pitch counts and play ids stay one per pitch.
fn walk_record(base: &FlatRecord, event: &PlayEvent, result: Option<&AtBatResult>) -> FlatRecord {
    let mut record = base.clone();

    record.balls = event.balls();
    record.strikes = event.strikes();
    record.outs = event.outs();
    copy_event_identity(&mut record, event);
    record.is_pitch = Some(false);
    record.play_id = None;
    match result {
        Some(result) => copy_result(&mut record, result),
        None => debug!(at_bat = ?base.at_bat_index, "Four-ball at-bat has no result"),
    }
    record.is_walk_marker = Some(true);

    record
}

fn copy_event_identity(record: &mut FlatRecord, event: &PlayEvent) {
    record.index_play = event.index;
    record.play_id = event.play_id.clone();
    record.start_time = event.start_time.clone();
    record.end_time = event.end_time.clone();
    record.is_pitch = event.is_pitch;
    record.type_type = event.kind.clone();
}

fn copy_result(record: &mut FlatRecord, result: &AtBatResult) {
    record.type_ab = result.kind.clone();
    record.event = result.event.clone();
    record.event_type = result.event_type.clone();
    record.rbi = result.rbi;
    record.away_score = result.away_score;
    record.home_score = result.home_score;
    record.is_out = result.is_out;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn pitch(number: i64, code: &str, balls: i64, strikes: i64, outs: i64) -> Value {
        json!({
            "isPitch": true,
            "type": "pitch",
            "pitchNumber": number,
            "index": number - 1,
            "playId": format!("p{number}"),
            "details": {
                "code": code,
                "description": format!("pitch {number}"),
                "isStrike": code != "B",
                "isBall": code == "B",
                "type": { "code": "FF", "description": "Four-Seam Fastball" }
            },
            "count": { "balls": balls, "strikes": strikes, "outs": outs },
            "pitchData": {
                "startSpeed": 95.1,
                "coordinates": { "pX": 0.25, "pZ": 2.5 },
                "breaks": { "spinRate": 2300, "breakVerticalInduced": 17.2, "breakHorizontal": -8.0 }
            }
        })
    }

    fn at_bat(index: i64, top: bool, events: Vec<Value>, result: Value) -> Value {
        json!({
            "atBatIndex": index,
            "about": { "atBatIndex": index, "isTopInning": top },
            "matchup": {
                "batter": { "id": 100 + index, "fullName": "Batter" },
                "batSide": { "code": "R" },
                "pitcher": { "id": 500, "fullName": "Pitcher" },
                "pitchHand": { "code": "L" }
            },
            "result": result,
            "playEvents": events
        })
    }

    fn game(plays: Vec<Value>) -> GameDocument {
        serde_json::from_value(json!({
            "gamePk": 745000,
            "gameData": {
                "datetime": { "officialDate": "2024-04-10" },
                "teams": {
                    "away": { "id": 141, "abbreviation": "TOR" },
                    "home": { "id": 147, "abbreviation": "NYY" }
                }
            },
            "liveData": { "plays": { "allPlays": plays } }
        }))
        .unwrap()
    }

    fn strikeout_result() -> Value {
        json!({ "type": "atBat", "event": "Strikeout", "eventType": "strikeout", "rbi": 0, "awayScore": 0, "homeScore": 0, "isOut": true })
    }

    fn walk_result() -> Value {
        json!({ "type": "atBat", "event": "Walk", "eventType": "walk", "rbi": 0, "awayScore": 1, "homeScore": 0, "isOut": false })
    }

    fn flatten(doc: &GameDocument) -> Vec<FlatRecord> {
        flatten_game(doc, &FlattenOptions::default()).unwrap()
    }

    #[test]
    fn three_pitch_at_bat_carries_counts_forward() {
        let doc = game(vec![at_bat(
            0,
            true,
            vec![pitch(1, "B", 1, 0, 0), pitch(2, "B", 2, 0, 0), pitch(3, "C", 2, 1, 0)],
            strikeout_result(),
        )]);
        let records = flatten(&doc);

        assert_eq!(records.len(), 3);
        let counts: Vec<_> = records.iter().map(|r| (r.balls, r.strikes)).collect();
        assert_eq!(counts, vec![(Some(0), Some(0)), (Some(1), Some(0)), (Some(2), Some(0))]);

        assert!(!records[0].has_result());
        assert!(!records[1].has_result());
        assert_eq!(records[2].event.as_deref(), Some("Strikeout"));
        assert_eq!(records[2].is_out, Some(true));
        assert_eq!(records[2].type_ab.as_deref(), Some("atBat"));
    }

    #[test]
    fn physics_fields_come_through() {
        let doc = game(vec![at_bat(0, true, vec![pitch(1, "S", 0, 1, 0)], strikeout_result())]);
        let record = &flatten(&doc)[0];

        assert_eq!(record.start_speed, Some(95.1));
        assert_eq!(record.px, Some(0.25));
        assert_eq!(record.spin_rate, Some(2300.0));
        assert_eq!(record.ivb, Some(17.2));
        assert_eq!(record.hb, Some(-8.0));
        assert_eq!(record.pitch_type.as_deref(), Some("FF"));
        assert_eq!(record.is_swing, Some(true));
        assert_eq!(record.is_whiff, Some(true));
        // Nested objects that are absent stay missing.
        assert_eq!(record.ax, None);
        assert_eq!(record.launch_speed, None);
        assert_eq!(record.hit_x, None);
    }

    fn in_play(hit_data: Value) -> Value {
        json!({
            "isPitch": true,
            "pitchNumber": 1,
            "playId": "hit",
            "details": { "code": "X", "isInPlay": true, "type": { "code": "SI" } },
            "count": { "balls": 0, "strikes": 0, "outs": 1 },
            "pitchData": {
                "startSpeed": 93.4,
                "endSpeed": 85.0,
                "strikeZoneTop": 3.4,
                "strikeZoneBottom": 1.6,
                "zone": 5,
                "typeConfidence": 0.91,
                "plateTime": 0.41,
                "extension": 6.5
            },
            "hitData": hit_data
        })
    }

    #[test]
    fn hit_data_comes_through() {
        let hit = json!({
            "launchSpeed": 101.2,
            "launchAngle": 12.0,
            "totalDistance": 380.0,
            "location": "8",
            "trajectory": "line_drive",
            "hardness": "hard",
            "coordinates": { "coordX": 120.5, "coordY": 60.1 }
        });
        let doc = game(vec![at_bat(0, true, vec![in_play(hit)], strikeout_result())]);
        let record = &flatten(&doc)[0];

        assert_eq!(record.in_play, Some(true));
        assert_eq!(record.launch_speed, Some(101.2));
        assert_eq!(record.launch_angle, Some(12.0));
        assert_eq!(record.launch_distance, Some(380.0));
        assert_eq!(record.launch_location.as_deref(), Some("8"));
        assert_eq!(record.trajectory.as_deref(), Some("line_drive"));
        assert_eq!(record.hardness.as_deref(), Some("hard"));
        assert_eq!(record.hit_x, Some(120.5));
        assert_eq!(record.hit_y, Some(60.1));
    }

    #[test]
    fn nested_objects_are_independently_optional() {
        let hit = json!({ "launchSpeed": 88.8, "trajectory": "ground_ball" });
        let doc = game(vec![at_bat(0, true, vec![in_play(hit)], strikeout_result())]);
        let record = &flatten(&doc)[0];

        // hitData without coordinates
        assert_eq!(record.launch_speed, Some(88.8));
        assert_eq!(record.trajectory.as_deref(), Some("ground_ball"));
        assert_eq!(record.launch_distance, None);
        assert_eq!((record.hit_x, record.hit_y), (None, None));

        // pitchData without coordinates or breaks
        assert_eq!(record.start_speed, Some(93.4));
        assert_eq!(record.end_speed, Some(85.0));
        assert_eq!(record.sz_top, Some(3.4));
        assert_eq!(record.sz_bot, Some(1.6));
        assert_eq!(record.zone, Some(5));
        assert_eq!(record.type_confidence, Some(0.91));
        assert_eq!(record.plate_time, Some(0.41));
        assert_eq!(record.extension, Some(6.5));
        assert_eq!((record.px, record.pz, record.vy0), (None, None, None));
        assert_eq!((record.spin_rate, record.ivb, record.hb), (None, None, None));
        assert_eq!(record.pitch_type.as_deref(), Some("SI"));
        assert_eq!(record.pitch_description, None);
    }

    #[test]
    fn swing_without_whiff() {
        let doc = game(vec![at_bat(0, true, vec![pitch(1, "F", 0, 1, 0)], strikeout_result())]);
        let record = &flatten(&doc)[0];
        assert_eq!(record.is_swing, Some(true));
        assert_eq!(record.is_whiff, Some(false));

        let doc = game(vec![at_bat(0, true, vec![pitch(1, "B", 1, 0, 0)], strikeout_result())]);
        let record = &flatten(&doc)[0];
        assert_eq!(record.is_swing, Some(false));
        assert_eq!(record.is_whiff, Some(false));
    }

    #[test]
    fn missing_details_leaves_swing_unknown() {
        let event = json!({ "isPitch": true, "pitchNumber": 1, "count": { "balls": 1, "strikes": 0, "outs": 0 } });
        let doc = game(vec![at_bat(0, true, vec![event], strikeout_result())]);
        let record = &flatten(&doc)[0];

        assert_eq!(record.is_swing, None);
        assert_eq!(record.is_whiff, None);
        assert_eq!(record.play_code, None);
        assert_eq!(record.pitch_type, None);
    }

    #[test]
    fn team_attribution_follows_half_inning() {
        let doc = game(vec![
            at_bat(0, true, vec![pitch(1, "X", 0, 0, 0)], strikeout_result()),
            at_bat(1, false, vec![pitch(1, "X", 0, 0, 0)], strikeout_result()),
        ]);
        let records = flatten(&doc);

        assert_eq!(records[0].batter_team.as_deref(), Some("TOR"));
        assert_eq!(records[0].batter_team_id, Some(141));
        assert_eq!(records[0].pitcher_team.as_deref(), Some("NYY"));
        assert_eq!(records[0].pitcher_team_id, Some(147));

        assert_eq!(records[1].batter_team.as_deref(), Some("NYY"));
        assert_eq!(records[1].batter_team_id, Some(147));
        assert_eq!(records[1].pitcher_team.as_deref(), Some("TOR"));
        assert_eq!(records[1].pitcher_team_id, Some(141));
    }

    #[test]
    fn unknown_half_inning_leaves_teams_missing() {
        let mut play = at_bat(0, true, vec![pitch(1, "X", 0, 0, 0)], strikeout_result());
        play["about"] = json!({});
        let record = &flatten(&game(vec![play]))[0];

        assert_eq!(record.batter_team, None);
        assert_eq!(record.pitcher_team_id, None);
        assert_eq!(record.batter_id, Some(100));
    }

    #[test]
    fn coded_non_pitch_events_are_emitted_and_uncoded_ones_skipped() {
        let pickoff = json!({
            "isPitch": false,
            "type": "pickoff",
            "details": { "code": "1", "description": "Pickoff Attempt 1B" },
            "count": { "balls": 1, "strikes": 0, "outs": 1 }
        });
        let visit = json!({
            "isPitch": false,
            "type": "action",
            "details": { "description": "Mound visit." },
            "count": { "balls": 1, "strikes": 0, "outs": 1 }
        });
        let doc = game(vec![at_bat(
            0,
            true,
            vec![pitch(1, "B", 1, 0, 1), pickoff, visit, pitch(2, "X", 1, 0, 1)],
            strikeout_result(),
        )]);
        let records = flatten(&doc);

        assert_eq!(records.len(), 3);
        assert_eq!(records[1].type_type.as_deref(), Some("pickoff"));
        assert_eq!(records[1].is_pitch, Some(false));
        assert_eq!((records[1].balls, records[1].strikes), (Some(1), Some(0)));
        // Pre-count of the last pitch comes from the skipped action just before it.
        assert_eq!((records[2].balls, records[2].strikes, records[2].outs), (Some(1), Some(0), Some(1)));
        assert!(records[2].has_result());
    }

    #[test]
    fn first_pitch_after_pickoff_resets_count_but_keeps_current_outs() {
        let pickoff = json!({
            "isPitch": false,
            "details": { "code": "1" },
            "count": { "balls": 0, "strikes": 0, "outs": 2 }
        });
        let doc = game(vec![at_bat(0, true, vec![pickoff, pitch(1, "X", 0, 0, 2)], strikeout_result())]);
        let records = flatten(&doc);

        assert_eq!(records.len(), 2);
        assert_eq!((records[0].balls, records[0].strikes, records[0].outs), (Some(0), Some(0), Some(2)));
        assert_eq!((records[1].balls, records[1].strikes, records[1].outs), (Some(0), Some(0), Some(2)));
    }

    #[test]
    fn outs_default_to_zero_only_on_first_event() {
        let first = json!({ "isPitch": true, "pitchNumber": 1, "details": { "code": "B" }, "count": { "balls": 1, "strikes": 0 } });
        let second = json!({ "isPitch": true, "pitchNumber": 2, "details": { "code": "B" }, "count": { "balls": 2, "strikes": 0 } });
        let doc = game(vec![at_bat(0, true, vec![first, second], strikeout_result())]);
        let records = flatten(&doc);

        assert_eq!(records[0].outs, Some(0));
        assert_eq!(records[1].outs, None);
    }

    #[test]
    fn four_ball_at_bat_emits_one_walk_marker() {
        let doc = game(vec![at_bat(
            3,
            false,
            vec![pitch(1, "B", 1, 0, 1), pitch(2, "B", 2, 0, 1), pitch(3, "B", 3, 0, 1), pitch(4, "B", 4, 0, 1)],
            walk_result(),
        )]);
        let records = flatten(&doc);

        assert_eq!(records.len(), 5);
        let marker = &records[4];
        assert_eq!(marker.is_walk_marker, Some(true));
        assert_eq!(marker.event.as_deref(), Some("Walk"));
        assert_eq!(marker.event_type.as_deref(), Some("walk"));
        assert_eq!(marker.away_score, Some(1));
        assert_eq!((marker.balls, marker.strikes, marker.outs), (Some(4), Some(0), Some(1)));
        assert_eq!(marker.start_speed, None);
        assert_eq!(marker.spin_rate, None);
        assert_eq!(marker.launch_speed, None);
        assert_eq!(marker.pitch_type, None);
        assert_eq!(marker.is_swing, None);
        assert_eq!(marker.batter_id, Some(103));
        assert_eq!(marker.batter_team.as_deref(), Some("NYY"));
        assert_eq!(marker.play_id, None);
        assert_eq!(marker.is_pitch, Some(false));
        assert_eq!(marker.index_play, Some(3));
        assert_eq!(records.iter().filter(|r| r.is_pitch == Some(true)).count(), 4);
        let play_ids: std::collections::HashSet<_> = records.iter().filter_map(|r| r.play_id.as_deref()).collect();
        assert_eq!(play_ids.len(), 4);

        let with_result: Vec<_> = records.iter().filter(|r| r.has_result()).collect();
        assert_eq!(with_result.len(), 1);
        assert!(records[..4].iter().all(|r| r.is_walk_marker == Some(false)));
    }

    #[test]
    fn automatic_walk_without_pitches_still_gets_a_marker() {
        let auto = json!({
            "isPitch": false,
            "type": "action",
            "details": { "description": "Intentional walk" },
            "count": { "balls": 4, "strikes": 0, "outs": 0 }
        });
        let doc = game(vec![at_bat(0, true, vec![auto], json!({ "event": "Intent Walk", "eventType": "intent_walk" }))]);
        let records = flatten(&doc);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].is_walk_marker, Some(true));
        assert_eq!(records[0].event.as_deref(), Some("Intent Walk"));
    }

    #[test]
    fn duplicate_walk_result_keeps_last_event_result_too() {
        let doc = game(vec![at_bat(
            0,
            true,
            vec![pitch(1, "B", 1, 0, 0), pitch(2, "B", 2, 0, 0), pitch(3, "B", 3, 0, 0), pitch(4, "B", 4, 0, 0)],
            walk_result(),
        )]);
        let options = FlattenOptions { walk_markers: true, duplicate_walk_result: true };
        let records = flatten_game(&doc, &options).unwrap();

        assert_eq!(records.len(), 5);
        assert_eq!(records.iter().filter(|r| r.has_result()).count(), 2);
    }

    #[test]
    fn walk_markers_can_be_disabled() {
        let doc = game(vec![at_bat(
            0,
            true,
            vec![pitch(1, "B", 1, 0, 0), pitch(2, "B", 2, 0, 0), pitch(3, "B", 3, 0, 0), pitch(4, "B", 4, 0, 0)],
            walk_result(),
        )]);
        let options = FlattenOptions { walk_markers: false, duplicate_walk_result: false };
        let records = flatten_game(&doc, &options).unwrap();

        assert_eq!(records.len(), 4);
        assert_eq!(records[3].event.as_deref(), Some("Walk"));
    }

    #[test]
    fn record_count_matches_qualifying_events_plus_walks() {
        let doc = game(vec![
            at_bat(0, true, vec![pitch(1, "B", 1, 0, 0), pitch(2, "X", 1, 0, 0)], strikeout_result()),
            at_bat(
                1,
                true,
                vec![pitch(1, "B", 1, 0, 0), pitch(2, "B", 2, 0, 0), pitch(3, "B", 3, 0, 0), pitch(4, "B", 4, 0, 0)],
                walk_result(),
            ),
            at_bat(2, false, vec![], strikeout_result()),
        ]);
        let records = flatten(&doc);

        assert_eq!(records.len(), 2 + 4 + 1);

        for index in 0..2 {
            let rows: Vec<_> = records.iter().filter(|r| r.at_bat_index == Some(index)).collect();
            assert_eq!(rows.iter().filter(|r| r.has_result()).count(), 1);
            assert!(rows.iter().all(|r| r.batter_team == rows[0].batter_team
                && r.pitcher_team_id == rows[0].pitcher_team_id));
        }
    }

    #[test]
    fn empty_game_yields_no_records() {
        assert!(flatten(&game(vec![])).is_empty());
    }

    #[test]
    fn missing_required_paths_are_fatal() {
        let doc: GameDocument = serde_json::from_value(json!({
            "gamePk": 9,
            "gameData": { "teams": {} },
            "liveData": { "plays": {} }
        }))
        .unwrap();
        match flatten_game(&doc, &FlattenOptions::default()) {
            Err(FlattenError::MissingPath { game_pk, path }) => {
                assert_eq!(game_pk, Some(9));
                assert_eq!(path, "liveData.plays.allPlays");
            }
            other => panic!("unexpected {other:?}"),
        }

        let doc: GameDocument = serde_json::from_value(json!({
            "gamePk": 9,
            "liveData": { "plays": { "allPlays": [] } }
        }))
        .unwrap();
        assert!(matches!(
            flatten_game(&doc, &FlattenOptions::default()),
            Err(FlattenError::MissingPath { path: "gameData.teams", .. })
        ));
    }

    #[test]
    fn flattening_is_deterministic() {
        let doc = game(vec![at_bat(
            0,
            true,
            vec![pitch(1, "B", 1, 0, 0), pitch(2, "S", 1, 1, 0), pitch(3, "X", 1, 1, 0)],
            strikeout_result(),
        )]);
        let first = serde_json::to_string(&flatten(&doc)).unwrap();
        let second = serde_json::to_string(&flatten(&doc)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn game_identity_on_every_record() {
        let doc = game(vec![at_bat(0, true, vec![pitch(1, "B", 1, 0, 0)], strikeout_result())]);
        let record = &flatten(&doc)[0];
        assert_eq!(record.game_id, Some(745000));
        assert_eq!(record.game_date, chrono::NaiveDate::from_ymd_opt(2024, 4, 10));
        assert_eq!(record.pitcher_hand.as_deref(), Some("L"));
        assert_eq!(record.batter_hand.as_deref(), Some("R"));
    }
}
