use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of supported games.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    Duel,
    Fortune,
    Darts,
    Bowling,
    EvenOdd,
    GuessNumber,
    DiceProduct,
    Roulette,
    Mines,
    Towers,
}

impl GameKind {
    /// Games that need a parameter before the bet is debited and the first
    /// draw happens.
    pub fn requires_parameter(self) -> bool {
        matches!(
            self,
            GameKind::EvenOdd | GameKind::GuessNumber | GameKind::Mines | GameKind::Towers
        )
    }

    /// Games that keep step-by-step state instead of resolving in one draw.
    pub fn is_progressive(self) -> bool {
        matches!(self, GameKind::Mines | GameKind::Towers)
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameKind::Duel => write!(f, "duel"),
            GameKind::Fortune => write!(f, "fortune"),
            GameKind::Darts => write!(f, "darts"),
            GameKind::Bowling => write!(f, "bowling"),
            GameKind::EvenOdd => write!(f, "even_odd"),
            GameKind::GuessNumber => write!(f, "guess_number"),
            GameKind::DiceProduct => write!(f, "dice_product"),
            GameKind::Roulette => write!(f, "roulette"),
            GameKind::Mines => write!(f, "mines"),
            GameKind::Towers => write!(f, "towers"),
        }
    }
}

/// Side picked in the even/odd game.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    Even,
    Odd,
}

/// Pre-game parameter supplied after the bet is accepted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum GameParameter {
    MineCount(u8),
    BombsPerRow(u8),
    Guess(u8),
    Side(Parity),
}

/// Step payload routed to the account's live session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "game", rename_all = "snake_case")]
pub enum StepPayload {
    Mines { cell: u8 },
    Towers { row: u8, cell: u8 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_requirements() {
        assert!(GameKind::Mines.requires_parameter());
        assert!(GameKind::GuessNumber.requires_parameter());
        assert!(GameKind::EvenOdd.requires_parameter());
        assert!(!GameKind::Duel.requires_parameter());
        assert!(!GameKind::Roulette.requires_parameter());
    }

    #[test]
    fn test_progressive_flags() {
        assert!(GameKind::Mines.is_progressive());
        assert!(GameKind::Towers.is_progressive());
        assert!(!GameKind::GuessNumber.is_progressive());
    }

    #[test]
    fn test_serde_tags() {
        let json = serde_json::to_string(&GameKind::DiceProduct).unwrap();
        assert_eq!(json, "\"dice_product\"");

        let param = GameParameter::MineCount(3);
        let json = serde_json::to_string(&param).unwrap();
        assert_eq!(json, r#"{"kind":"mine_count","value":3}"#);
        let back: GameParameter = serde_json::from_str(&json).unwrap();
        assert_eq!(back, param);

        let step = StepPayload::Towers { row: 2, cell: 4 };
        let json = serde_json::to_string(&step).unwrap();
        assert_eq!(json, r#"{"game":"towers","row":2,"cell":4}"#);
    }
}
