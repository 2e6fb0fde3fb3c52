//! Mines: progressive game over a 25-cell grid with a mine layout fixed at
//! session start. Every reveal either busts the session or raises the
//! multiplier; the player may cash out after the first safe reveal.

use crate::errors::{EngineError, EngineResult};
use crate::games::{MAX_MINES, MINES_CELLS};
use crate::payout;
use crate::rng::Randomness;
use std::collections::HashSet;

/// Live state of one Mines session.
#[derive(Debug, Clone)]
pub struct MinesGame {
    bet: f64,
    mine_count: u8,
    mine_positions: HashSet<u8>,
    opened: Vec<u8>,
}

/// Result of revealing one cell.
#[derive(Debug, Clone, PartialEq)]
pub enum MinesStep {
    /// Safe reveal; the session continues at a higher multiplier.
    Safe { opened: u32, multiplier: f64 },
    /// Every safe cell is open; settles at the maximum multiplier.
    FullClear { multiplier: f64 },
    /// Hit a mine; no payout.
    Busted,
}

impl MinesGame {
    /// Draws the board once. All later steps reveal against this fixed set.
    pub fn start(bet: f64, mine_count: u8, rng: &dyn Randomness) -> EngineResult<Self> {
        if !(1..=MAX_MINES).contains(&mine_count) {
            return Err(EngineError::Validation {
                field: "mine_count",
                reason: format!("{} is out of range 1-{}", mine_count, MAX_MINES),
            });
        }
        let mine_positions = rng.sample_distinct(MINES_CELLS, mine_count);
        Ok(Self {
            bet,
            mine_count,
            mine_positions,
            opened: Vec::new(),
        })
    }

    pub fn bet(&self) -> f64 {
        self.bet
    }

    pub fn mine_count(&self) -> u8 {
        self.mine_count
    }

    /// Cells opened so far, in reveal order.
    pub fn opened(&self) -> &[u8] {
        &self.opened
    }

    /// Mine layout, sorted; revealed to the player only after a bust.
    pub fn mine_positions_sorted(&self) -> Vec<u8> {
        let mut positions: Vec<u8> = self.mine_positions.iter().copied().collect();
        positions.sort_unstable();
        positions
    }

    /// Multiplier at the current number of safe reveals.
    pub fn multiplier(&self) -> f64 {
        payout::mines_multiplier(self.opened.len() as u32, self.mine_count as u32)
    }

    /// Reveals `cell`. Repeats and out-of-range cells are rejected without
    /// any state change.
    pub fn step(&mut self, cell: u8) -> EngineResult<MinesStep> {
        if cell >= MINES_CELLS {
            return Err(EngineError::InvalidStep(format!(
                "cell {} is outside the {}-cell board",
                cell, MINES_CELLS
            )));
        }
        if self.opened.contains(&cell) {
            return Err(EngineError::InvalidStep(format!(
                "cell {} is already open",
                cell
            )));
        }
        if self.mine_positions.contains(&cell) {
            return Ok(MinesStep::Busted);
        }

        self.opened.push(cell);
        let multiplier = self.multiplier();
        let safe_cells = MINES_CELLS - self.mine_count;
        if self.opened.len() == safe_cells as usize {
            Ok(MinesStep::FullClear { multiplier })
        } else {
            Ok(MinesStep::Safe {
                opened: self.opened.len() as u32,
                multiplier,
            })
        }
    }

    /// Multiplier locked in by cashing out; requires at least one safe reveal.
    pub fn cashout(&self) -> EngineResult<f64> {
        if self.opened.is_empty() {
            return Err(EngineError::InvalidStep(
                "cashout requires at least one opened cell".to_string(),
            ));
        }
        Ok(self.multiplier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedRandomness;

    fn game_with_mines(mines: &[u8]) -> MinesGame {
        let rng = ScriptedRandomness::new();
        rng.push_sample(mines.iter().copied());
        MinesGame::start(10.0, mines.len() as u8, &rng).unwrap()
    }

    #[test]
    fn test_mine_count_range_validated_before_draw() {
        let rng = ScriptedRandomness::new(); // empty script: no draw may happen
        assert!(matches!(
            MinesGame::start(10.0, 0, &rng),
            Err(EngineError::Validation { field: "mine_count", .. })
        ));
        assert!(matches!(
            MinesGame::start(10.0, 25, &rng),
            Err(EngineError::Validation { field: "mine_count", .. })
        ));
    }

    #[test]
    fn test_safe_steps_raise_multiplier() {
        let mut game = game_with_mines(&[22, 23, 24]);
        assert_eq!(game.multiplier(), 1.0);

        let first = game.step(0).unwrap();
        let expected_one = 0.95 * (25.0 / 22.0);
        assert!(matches!(first, MinesStep::Safe { opened: 1, .. }));
        assert!((game.multiplier() - expected_one).abs() < 1e-12);

        let second = game.step(1).unwrap();
        let expected_two = 0.95 * (25.0 / 22.0) * (24.0 / 21.0);
        match second {
            MinesStep::Safe { opened, multiplier } => {
                assert_eq!(opened, 2);
                assert!((multiplier - expected_two).abs() < 1e-12);
            }
            other => panic!("unexpected step result: {:?}", other),
        }
        assert_eq!(game.opened(), &[0, 1]);
    }

    #[test]
    fn test_mine_hit_busts_without_recording_cell() {
        let mut game = game_with_mines(&[5]);
        game.step(0).unwrap();

        assert_eq!(game.step(5).unwrap(), MinesStep::Busted);
        // Bust leaves progress untouched; discarding is the caller's job.
        assert_eq!(game.opened(), &[0]);
        assert_eq!(game.mine_positions_sorted(), vec![5]);
    }

    #[test]
    fn test_repeat_and_out_of_range_cells_are_rejected_no_ops() {
        let mut game = game_with_mines(&[24]);
        game.step(3).unwrap();
        let before = game.opened().to_vec();

        assert!(matches!(game.step(3), Err(EngineError::InvalidStep(_))));
        assert!(matches!(game.step(25), Err(EngineError::InvalidStep(_))));
        assert_eq!(game.opened(), before.as_slice());
    }

    #[test]
    fn test_opening_every_safe_cell_is_a_full_clear() {
        let mut game = game_with_mines(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22]);
        // 23 mines leave exactly two safe cells.
        assert!(matches!(game.step(23).unwrap(), MinesStep::Safe { .. }));
        match game.step(24).unwrap() {
            MinesStep::FullClear { multiplier } => {
                assert!((multiplier - payout::mines_multiplier(2, 23)).abs() < 1e-12);
            }
            other => panic!("expected full clear, got {:?}", other),
        }
    }

    #[test]
    fn test_cashout_requires_progress() {
        let mut game = game_with_mines(&[24]);
        assert!(matches!(game.cashout(), Err(EngineError::InvalidStep(_))));

        game.step(0).unwrap();
        let locked = game.cashout().unwrap();
        assert!((locked - 0.95 * (25.0 / 24.0)).abs() < 1e-12);
    }
}
