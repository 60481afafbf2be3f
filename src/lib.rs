//! Turns a hand-kept basketball game sheet into a play-by-play narrative and
//! per-team box scores.
//!
//! The input is one game's worth of spreadsheet data (see [`GameData`]): a
//! `Basics` sheet with team names, two roster sheets with per-player foul
//! minutes, and the `Rundown` — an ordered, minute-stamped log of plays that
//! records *cumulative* team scores rather than play types. [`build_rundown`]
//! makes a single pass over the rundown, infers each play from the score
//! delta, interleaves fouls and quarter breaks, and returns a
//! [`GameSummary`].
//!
//! Loading the workbooks and rendering the result are the caller's job; this
//! crate is a pure transform with no I/O.

pub mod rundown;
pub mod stats;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use rundown::{GameSummary, Narrative, PlayOutcome, RundownError, RundownResult, build_rundown};
pub use stats::{BoxScore, PlayerStatLine};

// ---------------------------------------------------------------------------
// Input contract — sheet-shaped game data, produced by an external loader
// ---------------------------------------------------------------------------

/// One game's sheets, in the shape the spreadsheet loader hands over.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameData {
    pub basics: Basics,
    pub team_a: TeamSheet,
    pub team_b: TeamSheet,
    /// Ordered play log. Occurrence order, not sorted by minute — several
    /// rows may share a minute.
    pub rundown: Vec<RawEvent>,
}

impl GameData {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

const SAMPLE_GAME_JSON: &str = include_str!("../sample_game.json");

/// A complete recorded game, embedded for demos and as an end-to-end
/// fixture.
pub fn sample_game() -> serde_json::Result<GameData> {
    GameData::from_json(SAMPLE_GAME_JSON)
}

/// The `Basics` sheet: team names plus whatever the bookkeeper wrote down
/// about the game itself.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Basics {
    pub team_a: String,
    pub team_b: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Final score as recorded on the sheet. The rundown is authoritative;
    /// a disagreement is logged, not fatal.
    #[serde(default)]
    pub final_a: Option<u16>,
    #[serde(default)]
    pub final_b: Option<u16>,
}

/// One team's roster sheet.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TeamSheet {
    pub players: Vec<RosterEntry>,
}

impl TeamSheet {
    /// Resolve a jersey number to its roster entry. Numbers are unique per
    /// team for the duration of a game.
    pub fn lookup(&self, number: u16) -> Option<&RosterEntry> {
        self.players.iter().find(|p| p.number == number)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RosterEntry {
    pub number: u16,
    pub name: String,
    #[serde(default)]
    pub fouls: FoulRecord,
}

/// Minutes at which a player committed a foul, in game order.
///
/// The paper sheet spreads these over per-quarter columns; the loader
/// flattens them so nothing downstream depends on column positions.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct FoulRecord(pub Vec<u32>);

impl FoulRecord {
    pub fn fouled_at(&self, minute: u32) -> bool {
        self.0.contains(&minute)
    }
}

/// One row of the rundown sheet.
///
/// At most one of `number_a`/`number_b` is set; a row with neither is a
/// continuation (the second shot of a two-shot foul) and inherits team and
/// shooter from the previous row. An absent `minute` means "same minute as
/// the row above".
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    #[serde(default)]
    pub minute: Option<u32>,
    #[serde(default)]
    pub number_a: Option<u16>,
    #[serde(default)]
    pub number_b: Option<u16>,
    pub score_a: ScoreCell,
    pub score_b: ScoreCell,
}

/// A cumulative-score cell: the team's running total after the play, or a
/// non-numeric marker. Only the dash is meaningful — it records a missed
/// free throw. Any other marker is a data error, surfaced by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ScoreCell {
    Points(u16),
    Marker(String),
}

impl ScoreCell {
    pub fn is_miss_marker(&self) -> bool {
        matches!(self, ScoreCell::Marker(m) if m.trim() == "-")
    }
}

/// Which side of the sheet acted. The `A`/`B` labels come straight from the
/// workbook's sheet names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamSide {
    A,
    B,
}

impl TeamSide {
    pub(crate) fn index(self) -> usize {
        match self {
            TeamSide::A => 0,
            TeamSide::B => 1,
        }
    }
}
