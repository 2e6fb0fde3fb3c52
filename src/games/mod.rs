//! Game engines: pure state machines from bet + randomness to an outcome.
//!
//! Engines hold state and transitions only. Ledger calls and event projection
//! live in the session manager, which talks to these types through their
//! step/cashout results.

pub mod instant;
pub mod mines;
pub mod towers;
pub mod types;

pub use instant::{InstantInput, InstantOutcome};
pub use mines::{MinesGame, MinesStep};
pub use towers::{CommitmentPolicy, TowersGame, TowersStep};
pub use types::{GameKind, GameParameter, Parity, StepPayload};

/// Mines board: 5x5 grid.
pub const MINES_CELLS: u8 = 25;
/// At least one cell must stay safe.
pub const MAX_MINES: u8 = 24;

/// Towers board: 10 rows of 5 cells.
pub const TOWER_ROWS: u8 = 10;
pub const TOWER_ROW_CELLS: u8 = 5;
/// At least one cell per row must stay safe.
pub const MAX_ROW_BOMBS: u8 = 4;

/// Die faces for the dice-based instant games.
pub const DIE_FACES: u8 = 6;
