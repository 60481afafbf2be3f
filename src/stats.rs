//! Per-player stat accumulation and box-score finalization.

use crate::TeamSheet;
use crate::rundown::PlayOutcome;
use serde::Serialize;
use std::collections::HashMap;

/// One finalized box-score row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlayerStatLine {
    pub number: u16,
    pub name: String,
    pub personal_fouls: u16,
    pub field_goals_made: u16,
    pub three_pointers_made: u16,
    pub free_throws_made: u16,
    pub free_throw_attempts: u16,
    pub points: u16,
    /// `None` when the player never went to the line.
    pub free_throw_pct: Option<f64>,
}

impl PlayerStatLine {
    /// Display label for the free-throw percentage. Zero attempts renders a
    /// sentinel instead of dividing by zero.
    pub fn free_throw_pct_label(&self) -> String {
        match self.free_throw_pct {
            Some(pct) => format!("{pct:.1}%"),
            None => "no attempts".to_owned(),
        }
    }
}

/// A team's finalized box score.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoxScore {
    pub team: String,
    /// One row per roster player, in roster order.
    pub players: Vec<PlayerStatLine>,
}

impl BoxScore {
    /// Row for a jersey number, if that player is on the roster.
    pub fn get(&self, number: u16) -> Option<&PlayerStatLine> {
        self.players.iter().find(|p| p.number == number)
    }

    /// Team total derived from the rows. For a completed pass this equals
    /// the team's final cumulative score.
    pub fn total_points(&self) -> u32 {
        self.players.iter().map(|p| u32::from(p.points)).sum()
    }
}

/// Accumulates raw counters during a pass. Rows materialize lazily the
/// first time a player appears; the roster fills in the rest at the end.
#[derive(Debug, Default)]
pub(crate) struct StatBook {
    counters: HashMap<u16, Counters>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    personal_fouls: u16,
    field_goals_made: u16,
    three_pointers_made: u16,
    free_throws_made: u16,
    free_throw_attempts: u16,
    points: u16,
}

impl StatBook {
    pub(crate) fn record_outcome(&mut self, number: u16, outcome: PlayOutcome) {
        let c = self.counters.entry(number).or_default();
        match outcome {
            PlayOutcome::ThreePointer => c.three_pointers_made += 1,
            PlayOutcome::FieldGoal => c.field_goals_made += 1,
            PlayOutcome::FreeThrowMade => {
                c.free_throws_made += 1;
                c.free_throw_attempts += 1;
            }
            PlayOutcome::FreeThrowMissed => c.free_throw_attempts += 1,
        }
        c.points += outcome.points();
    }

    pub(crate) fn record_foul(&mut self, number: u16) {
        self.counters.entry(number).or_default().personal_fouls += 1;
    }

    /// Materialize the box score. Iterating the roster (not the counter map)
    /// keys the rows by jersey number in sheet order, so output is stable,
    /// and players without a single play still get their zeroed row.
    pub(crate) fn finalize(self, team: &str, roster: &TeamSheet) -> BoxScore {
        let players = roster
            .players
            .iter()
            .map(|entry| {
                let c = self.counters.get(&entry.number).copied().unwrap_or_default();
                PlayerStatLine {
                    number: entry.number,
                    name: entry.name.clone(),
                    personal_fouls: c.personal_fouls,
                    field_goals_made: c.field_goals_made,
                    three_pointers_made: c.three_pointers_made,
                    free_throws_made: c.free_throws_made,
                    free_throw_attempts: c.free_throw_attempts,
                    points: c.points,
                    free_throw_pct: (c.free_throw_attempts > 0).then(|| {
                        100.0 * f64::from(c.free_throws_made) / f64::from(c.free_throw_attempts)
                    }),
                }
            })
            .collect();
        BoxScore { team: team.to_owned(), players }
    }
}
