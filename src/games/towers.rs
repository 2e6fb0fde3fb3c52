//! Towers: climb ten rows of five cells, each row hiding 1-4 bombs. Clearing
//! a row raises the multiplier; reaching the top settles at the full-climb
//! multiplier.

use crate::errors::{EngineError, EngineResult};
use crate::games::{MAX_ROW_BOMBS, TOWER_ROWS, TOWER_ROW_CELLS};
use crate::payout;
use crate::rng::Randomness;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// When row bomb layouts are drawn.
///
/// `PerRow` draws a row's bombs at the moment the player steps into it, so a
/// row re-attempted after process restarts would re-roll. `FullBoard` commits
/// every row at session start, making the per-row survival odds match the
/// payout formula exactly. The policy is engine configuration, not an
/// implicit code path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommitmentPolicy {
    PerRow,
    FullBoard,
}

impl Default for CommitmentPolicy {
    fn default() -> Self {
        CommitmentPolicy::PerRow
    }
}

/// Live state of one Towers session.
#[derive(Debug, Clone)]
pub struct TowersGame {
    bet: f64,
    bombs_per_row: u8,
    current_row: u8,
    /// Populated only under `FullBoard`.
    board: Option<Vec<HashSet<u8>>>,
}

/// Result of stepping into a row.
#[derive(Debug, Clone, PartialEq)]
pub enum TowersStep {
    /// Safe cell; `row` rows are now cleared.
    Advanced { row: u8, multiplier: f64 },
    /// Cleared all ten rows; settles at the top multiplier.
    Crowned { multiplier: f64 },
    /// Hit a bomb; no payout.
    Fell,
}

impl TowersGame {
    pub fn start(
        bet: f64,
        bombs_per_row: u8,
        policy: CommitmentPolicy,
        rng: &dyn Randomness,
    ) -> EngineResult<Self> {
        if !(1..=MAX_ROW_BOMBS).contains(&bombs_per_row) {
            return Err(EngineError::Validation {
                field: "bombs_per_row",
                reason: format!("{} is out of range 1-{}", bombs_per_row, MAX_ROW_BOMBS),
            });
        }
        let board = match policy {
            CommitmentPolicy::PerRow => None,
            CommitmentPolicy::FullBoard => Some(
                (0..TOWER_ROWS)
                    .map(|_| rng.sample_distinct(TOWER_ROW_CELLS, bombs_per_row))
                    .collect(),
            ),
        };
        Ok(Self {
            bet,
            bombs_per_row,
            current_row: 0,
            board,
        })
    }

    pub fn bet(&self) -> f64 {
        self.bet
    }

    pub fn bombs_per_row(&self) -> u8 {
        self.bombs_per_row
    }

    /// Rows cleared so far; grows monotonically.
    pub fn current_row(&self) -> u8 {
        self.current_row
    }

    /// Multiplier at the current number of cleared rows.
    pub fn multiplier(&self) -> f64 {
        payout::towers_multiplier(self.current_row as u32, self.bombs_per_row as u32)
    }

    /// Steps into `row` at `cell`. The row must be the current one; anything
    /// else is rejected without state change or draw.
    pub fn step(&mut self, row: u8, cell: u8, rng: &dyn Randomness) -> EngineResult<TowersStep> {
        if row != self.current_row {
            return Err(EngineError::InvalidStep(format!(
                "row {} is not the current row {}",
                row, self.current_row
            )));
        }
        if cell >= TOWER_ROW_CELLS {
            return Err(EngineError::InvalidStep(format!(
                "cell {} is outside the {}-cell row",
                cell, TOWER_ROW_CELLS
            )));
        }

        let bombs = match &self.board {
            Some(rows) => rows[row as usize].clone(),
            None => rng.sample_distinct(TOWER_ROW_CELLS, self.bombs_per_row),
        };
        if bombs.contains(&cell) {
            return Ok(TowersStep::Fell);
        }

        self.current_row += 1;
        let multiplier = self.multiplier();
        if self.current_row == TOWER_ROWS {
            Ok(TowersStep::Crowned { multiplier })
        } else {
            Ok(TowersStep::Advanced {
                row: self.current_row,
                multiplier,
            })
        }
    }

    /// Multiplier locked in by cashing out; requires at least one cleared row.
    pub fn cashout(&self) -> EngineResult<f64> {
        if self.current_row == 0 {
            return Err(EngineError::InvalidStep(
                "cashout requires at least one cleared row".to_string(),
            ));
        }
        Ok(self.multiplier())
    }
}
