//! The single-pass engine: normalizes raw rundown rows, classifies plays
//! from cumulative-score deltas, interleaves fouls and quarter breaks, and
//! assembles the narrative plus box scores.

use crate::stats::{BoxScore, StatBook};
use crate::{Basics, GameData, RawEvent, RosterEntry, ScoreCell, TeamSide};
use log::{debug, warn};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

pub type RundownResult<T> = Result<T, RundownError>;

/// Errors that abort a game's pass. Each carries enough context to locate
/// the offending sheet row; retrying is pointless, the sheet is static.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RundownError {
    /// An event references a jersey number with no roster entry.
    UnknownNumber { minute: u32, team: String, number: u16 },
    /// The first rundown row names no acting player, so there is nothing to
    /// carry over.
    LeadingContinuation,
    /// A score cell held neither a running total nor the miss marker.
    BadScoreCell { minute: u32, team: String, cell: String },
    /// The score did not move and no miss marker was set.
    NoPointsNoMissMarker { minute: u32, team: String },
    /// The cumulative score moved by an amount no single play can produce.
    ImpossibleDelta { minute: u32, team: String, delta: i32 },
}

impl fmt::Display for RundownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RundownError::UnknownNumber { minute, team, number } => {
                write!(f, "minute {minute}: no #{number} on {team}'s roster")
            }
            RundownError::LeadingContinuation => {
                write!(f, "first rundown row names no acting player")
            }
            RundownError::BadScoreCell { minute, team, cell } => {
                write!(f, "minute {minute}: {team} score cell holds {cell:?}, expected a running total or \"-\"")
            }
            RundownError::NoPointsNoMissMarker { minute, team } => {
                write!(f, "minute {minute}: {team} scored no points and no miss marker is set")
            }
            RundownError::ImpossibleDelta { minute, team, delta } => {
                write!(f, "minute {minute}: {team}'s score moved by {delta}, no single play does that")
            }
        }
    }
}

impl std::error::Error for RundownError {}

/// What a rundown row did to the score. The sheet never records play types,
/// only cumulative totals, so the type is inferred from the delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    ThreePointer,
    FieldGoal,
    FreeThrowMade,
    FreeThrowMissed,
}

impl PlayOutcome {
    pub fn points(self) -> u16 {
        match self {
            PlayOutcome::ThreePointer => 3,
            PlayOutcome::FieldGoal => 2,
            PlayOutcome::FreeThrowMade => 1,
            PlayOutcome::FreeThrowMissed => 0,
        }
    }

    pub fn phrase(self) -> &'static str {
        match self {
            PlayOutcome::ThreePointer => "hit a three",
            PlayOutcome::FieldGoal => "made a bucket",
            PlayOutcome::FreeThrowMade => "made a free throw",
            PlayOutcome::FreeThrowMissed => "missed a free throw",
        }
    }

    fn is_free_throw(self) -> bool {
        matches!(self, PlayOutcome::FreeThrowMade | PlayOutcome::FreeThrowMissed)
    }
}

/// Ordered narrative lines. Append-only while the pass runs, immutable once
/// returned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Narrative(Vec<String>);

impl Narrative {
    fn push(&mut self, line: String) {
        self.0.push(line);
    }

    pub fn lines(&self) -> &[String] {
        &self.0
    }

    /// Join into one markdown block; every line is a table row or separator.
    pub fn to_markdown(&self) -> String {
        self.0.join("\n")
    }
}

/// Everything the renderer needs for one game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameSummary {
    pub narrative: Narrative,
    /// Team A's then team B's box score; rows follow roster order.
    pub box_scores: [BoxScore; 2],
}

impl GameSummary {
    pub fn box_score(&self, team: &str) -> Option<&BoxScore> {
        self.box_scores.iter().find(|b| b.team == team)
    }
}

/// Mutable state threaded through one pass, discarded afterwards.
#[derive(Debug, Default)]
struct RunningState {
    minute: u32,
    score_a: u16,
    score_b: u16,
    /// Side and jersey number of the last resolved actor; continuation rows
    /// repeat it.
    last_actor: Option<(TeamSide, u16)>,
    /// Suppresses a second foul line for the same minute.
    last_foul_minute: Option<u32>,
}

impl RunningState {
    fn score(&self, side: TeamSide) -> u16 {
        match side {
            TeamSide::A => self.score_a,
            TeamSide::B => self.score_b,
        }
    }

    fn add(&mut self, side: TeamSide, points: u16) {
        match side {
            TeamSide::A => self.score_a += points,
            TeamSide::B => self.score_b += points,
        }
    }
}

/// Run the full pass over a game's sheets.
///
/// One linear walk over the rundown: resolve the minute and the acting
/// player, classify the play from the score delta, emit narrative lines and
/// accumulate stats as we go. Pure — the same input always produces the
/// same summary.
pub fn build_rundown(game: &GameData) -> RundownResult<GameSummary> {
    let basics = &game.basics;
    debug!(
        "building rundown: {} vs. {}, {} rows",
        basics.team_a,
        basics.team_b,
        game.rundown.len()
    );

    let mut state = RunningState::default();
    let mut books = [StatBook::default(), StatBook::default()];
    let mut narrative = Narrative::default();
    push_title(&mut narrative, basics);

    for (idx, row) in game.rundown.iter().enumerate() {
        // Minute carry-forward: an absent stamp means "same minute as above".
        if let Some(minute) = row.minute {
            state.minute = minute;
        }

        let (side, player) = resolve_actor(game, row, &state)?;
        state.last_actor = Some((side, player.number));

        let outcome = classify(row, side, &state, basics)?;

        // Free throws are usually foul-triggered; surface the foul first.
        if outcome.is_free_throw() {
            detect_foul(game, &mut state, &mut narrative, &mut books);
        }

        state.add(side, outcome.points());
        books[side.index()].record_outcome(player.number, outcome);
        let entry = format!("{} {}", player.name, outcome.phrase());
        narrative.push(event_line(&state, side, &entry));

        // Catch fouls not tied to a shooting play. The per-minute suppression
        // keeps the two trigger points from double-reporting.
        detect_foul(game, &mut state, &mut narrative, &mut books);

        maybe_quarter_break(game, idx, &state, &mut narrative);
    }

    push_trailer(&mut narrative, basics, &state);
    check_recorded_final(basics, &state);

    let [book_a, book_b] = books;
    let box_scores = [
        book_a.finalize(&basics.team_a, &game.team_a),
        book_b.finalize(&basics.team_b, &game.team_b),
    ];
    debug!(
        "rundown complete: {} {}:{} {}",
        basics.team_a, state.score_a, state.score_b, basics.team_b
    );
    Ok(GameSummary { narrative, box_scores })
}

fn team_name(basics: &Basics, side: TeamSide) -> &str {
    match side {
        TeamSide::A => &basics.team_a,
        TeamSide::B => &basics.team_b,
    }
}

/// Resolve which team and player a row belongs to.
fn resolve_actor<'g>(
    game: &'g GameData,
    row: &RawEvent,
    state: &RunningState,
) -> RundownResult<(TeamSide, &'g RosterEntry)> {
    let (side, number) = if let Some(number) = row.number_a {
        (TeamSide::A, number)
    } else if let Some(number) = row.number_b {
        (TeamSide::B, number)
    } else {
        // Continuation row: the second shot of a two-shot foul repeats the
        // previous row's team and shooter.
        state.last_actor.ok_or(RundownError::LeadingContinuation)?
    };

    let sheet = match side {
        TeamSide::A => &game.team_a,
        TeamSide::B => &game.team_b,
    };
    let player = sheet.lookup(number).ok_or_else(|| RundownError::UnknownNumber {
        minute: state.minute,
        team: team_name(&game.basics, side).to_owned(),
        number,
    })?;
    Ok((side, player))
}

/// Classify the play from the change in the acting team's cumulative score.
fn classify(
    row: &RawEvent,
    side: TeamSide,
    state: &RunningState,
    basics: &Basics,
) -> RundownResult<PlayOutcome> {
    let cell = match side {
        TeamSide::A => &row.score_a,
        TeamSide::B => &row.score_b,
    };
    let delta = match cell {
        ScoreCell::Points(total) => i32::from(*total) - i32::from(state.score(side)),
        marker if marker.is_miss_marker() => 0,
        ScoreCell::Marker(m) => {
            return Err(RundownError::BadScoreCell {
                minute: state.minute,
                team: team_name(basics, side).to_owned(),
                cell: m.clone(),
            });
        }
    };
    match delta {
        3 => Ok(PlayOutcome::ThreePointer),
        2 => Ok(PlayOutcome::FieldGoal),
        1 => Ok(PlayOutcome::FreeThrowMade),
        0 if cell.is_miss_marker() => Ok(PlayOutcome::FreeThrowMissed),
        0 => Err(RundownError::NoPointsNoMissMarker {
            minute: state.minute,
            team: team_name(basics, side).to_owned(),
        }),
        delta => Err(RundownError::ImpossibleDelta {
            minute: state.minute,
            team: team_name(basics, side).to_owned(),
            delta,
        }),
    }
}

/// Scan both rosters for a foul at the current minute and emit at most one
/// line for it. Team A's sheet is scanned first and the first matching row
/// wins; the sheet format only has room for one foul note per minute, so
/// any further matches are dropped.
fn detect_foul(
    game: &GameData,
    state: &mut RunningState,
    narrative: &mut Narrative,
    books: &mut [StatBook; 2],
) {
    let minute = state.minute;
    if state.last_foul_minute == Some(minute) {
        return;
    }

    let hit_a = game.team_a.players.iter().find(|p| p.fouls.fouled_at(minute));
    let hit_b = game.team_b.players.iter().find(|p| p.fouls.fouled_at(minute));
    let (side, player) = match (hit_a, hit_b) {
        (Some(p), _) => (TeamSide::A, p),
        (None, Some(p)) => (TeamSide::B, p),
        (None, None) => return,
    };

    let matches = game
        .team_a
        .players
        .iter()
        .chain(&game.team_b.players)
        .filter(|p| p.fouls.fouled_at(minute))
        .count();
    if matches > 1 {
        warn!("minute {minute}: {} more foul(s) this minute go unreported", matches - 1);
    }

    state.last_foul_minute = Some(minute);
    books[side.index()].record_foul(player.number);
    let entry = format!("{} committed a foul", player.name);
    narrative.push(event_line(state, side, &entry));
}

/// One four-column table row; only the acting team's column is filled.
fn event_line(state: &RunningState, side: TeamSide, entry: &str) -> String {
    match side {
        TeamSide::A => format!(
            "{:02} | {} | {}:{} |",
            state.minute, entry, state.score_a, state.score_b
        ),
        TeamSide::B => format!(
            "{:02} | | {}:{} | {}",
            state.minute, state.score_a, state.score_b, entry
        ),
    }
}

fn push_title(narrative: &mut Narrative, basics: &Basics) {
    let heading = match basics.date {
        Some(date) => format!(
            "## {} vs. {} on {}",
            basics.team_a,
            basics.team_b,
            date.format("%d.%m.%Y")
        ),
        None => format!("## {} vs. {}", basics.team_a, basics.team_b),
    };
    narrative.push(heading);
    narrative.push(format!("Min | {} | Score | {}", basics.team_a, basics.team_b));
    narrative.push("--- | --- | --- | ---".to_owned());
}

/// Insert the quarter separator once all events of a boundary minute (10,
/// 20, 30) are done, detected by peeking at the next row's minute stamp.
/// Minute 40 is the game end, handled by the trailer.
fn maybe_quarter_break(
    game: &GameData,
    idx: usize,
    state: &RunningState,
    narrative: &mut Narrative,
) {
    let minute = state.minute;
    if minute % 10 != 0 || !(1..=3).contains(&(minute / 10)) {
        return;
    }
    let Some(next) = game.rundown.get(idx + 1) else {
        return;
    };
    // An absent stamp on the next row means it shares this minute.
    if next.minute.unwrap_or(minute) <= minute {
        return;
    }
    let ordinal = match minute / 10 {
        1 => "1st",
        2 => "2nd",
        _ => "3rd",
    };
    narrative.push(format!(
        "----- End of {ordinal} quarter - Score: {}:{} -----",
        state.score_a, state.score_b
    ));
}

fn push_trailer(narrative: &mut Narrative, basics: &Basics, state: &RunningState) {
    let (a, b) = (state.score_a, state.score_b);
    narrative.push(format!("----- End of 4th quarter - Score: {a}:{b} -----"));
    let closer = match a.cmp(&b) {
        Ordering::Greater => format!("----- End of game, {} wins {a}:{b} -----", basics.team_a),
        Ordering::Less => format!("----- End of game, {} wins {a}:{b} -----", basics.team_b),
        Ordering::Equal => format!(
            "----- End of game, {} and {} draw {a}:{b} -----",
            basics.team_a, basics.team_b
        ),
    };
    narrative.push(closer);
}

/// The Basics sheet repeats the final score. The rundown stays authoritative,
/// but a mismatch usually means a mistyped row, so flag it.
fn check_recorded_final(basics: &Basics, state: &RunningState) {
    if let (Some(final_a), Some(final_b)) = (basics.final_a, basics.final_b)
        && (final_a, final_b) != (state.score_a, state.score_b)
    {
        warn!(
            "recorded final {final_a}:{final_b} disagrees with rundown total {}:{}",
            state.score_a, state.score_b
        );
    }
}
