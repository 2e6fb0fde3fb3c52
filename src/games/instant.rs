//! Instant-resolution engines: one or two draws, then settled.
//!
//! The session manager debits the bet before calling in here, so no payout
//! can ever precede its charge.

use crate::errors::{EngineError, EngineResult};
use crate::games::types::{GameKind, Parity};
use crate::games::DIE_FACES;
use crate::payout;
use crate::rng::Randomness;

/// Extra input some instant games need.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InstantInput {
    None,
    Guess(u8),
    Side(Parity),
}

/// What the draw produced: the raw rolls (for the collaborator to render) and
/// the resulting multiplier.
#[derive(Debug, Clone, PartialEq)]
pub struct InstantOutcome {
    pub rolls: Vec<u8>,
    pub multiplier: f64,
}

/// Resolves one instant game. Draw order is fixed: the player's roll first,
/// the house roll second where one exists.
pub fn resolve(
    kind: GameKind,
    input: InstantInput,
    rng: &dyn Randomness,
) -> EngineResult<InstantOutcome> {
    match (kind, input) {
        (GameKind::Duel, _) => {
            let player = rng.uniform(1, DIE_FACES);
            let house = rng.uniform(1, DIE_FACES);
            Ok(InstantOutcome {
                rolls: vec![player, house],
                multiplier: payout::duel_multiplier(player, house),
            })
        }
        (GameKind::Fortune, _) => Ok(one_die(rng, payout::fortune_multiplier)),
        (GameKind::Darts, _) => Ok(one_die(rng, payout::darts_multiplier)),
        (GameKind::Bowling, _) => Ok(one_die(rng, payout::bowling_multiplier)),
        (GameKind::Roulette, _) => {
            let chamber = rng.uniform(1, 6);
            Ok(InstantOutcome {
                rolls: vec![chamber],
                multiplier: payout::roulette_multiplier(chamber),
            })
        }
        (GameKind::DiceProduct, _) => {
            let first = rng.uniform(1, DIE_FACES);
            let second = rng.uniform(1, DIE_FACES);
            Ok(InstantOutcome {
                rolls: vec![first, second],
                multiplier: payout::dice_product_multiplier(first, second),
            })
        }
        (GameKind::GuessNumber, InstantInput::Guess(guess)) => {
            let face = rng.uniform(1, DIE_FACES);
            Ok(InstantOutcome {
                rolls: vec![face],
                multiplier: payout::guess_multiplier(guess, face),
            })
        }
        (GameKind::EvenOdd, InstantInput::Side(side)) => {
            let face = rng.uniform(1, DIE_FACES);
            Ok(InstantOutcome {
                rolls: vec![face],
                multiplier: payout::even_odd_multiplier(side == Parity::Even, face),
            })
        }
        (kind, input) => Err(EngineError::Validation {
            field: "parameter",
            reason: format!("{:?} does not resolve {}", input, kind),
        }),
    }
}

fn one_die(rng: &dyn Randomness, multiplier: fn(u8) -> f64) -> InstantOutcome {
    let face = rng.uniform(1, DIE_FACES);
    InstantOutcome {
        rolls: vec![face],
        multiplier: multiplier(face),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedRandomness;

    fn scripted(draws: &[u8]) -> ScriptedRandomness {
        let rng = ScriptedRandomness::new();
        for &d in draws {
            rng.push_draw(d);
        }
        rng
    }

    #[test]
    fn test_duel_draws_player_then_house() {
        let rng = scripted(&[5, 3]);
        let outcome = resolve(GameKind::Duel, InstantInput::None, &rng).unwrap();
        assert_eq!(outcome.rolls, vec![5, 3]);
        assert_eq!(outcome.multiplier, 1.9);

        let rng = scripted(&[4, 4]);
        let tie = resolve(GameKind::Duel, InstantInput::None, &rng).unwrap();
        assert_eq!(tie.multiplier, 1.0);

        let rng = scripted(&[2, 6]);
        let loss = resolve(GameKind::Duel, InstantInput::None, &rng).unwrap();
        assert_eq!(loss.multiplier, 0.0);
    }

    #[test]
    fn test_single_die_games() {
        let rng = scripted(&[1]);
        let fortune = resolve(GameKind::Fortune, InstantInput::None, &rng).unwrap();
        assert_eq!(fortune.multiplier, 2.4);

        let rng = scripted(&[4]);
        let darts = resolve(GameKind::Darts, InstantInput::None, &rng).unwrap();
        assert_eq!(darts.multiplier, 2.2);

        let rng = scripted(&[3]);
        let bowling = resolve(GameKind::Bowling, InstantInput::None, &rng).unwrap();
        assert_eq!(bowling.multiplier, 0.0);
    }

    #[test]
    fn test_roulette_fatal_chamber() {
        let rng = scripted(&[1]);
        let fatal = resolve(GameKind::Roulette, InstantInput::None, &rng).unwrap();
        assert_eq!(fatal.multiplier, 0.0);

        let rng = scripted(&[6]);
        let survived = resolve(GameKind::Roulette, InstantInput::None, &rng).unwrap();
        assert_eq!(survived.multiplier, 5.5);
    }

    #[test]
    fn test_dice_product_threshold() {
        let rng = scripted(&[6, 6]);
        let win = resolve(GameKind::DiceProduct, InstantInput::None, &rng).unwrap();
        assert_eq!(win.rolls, vec![6, 6]);
        assert_eq!(win.multiplier, 10.0);

        let rng = scripted(&[5, 6]);
        let exactly_thirty = resolve(GameKind::DiceProduct, InstantInput::None, &rng).unwrap();
        assert_eq!(exactly_thirty.multiplier, 0.0);
    }

    #[test]
    fn test_guess_and_parity_need_their_input() {
        let rng = scripted(&[4]);
        let hit = resolve(GameKind::GuessNumber, InstantInput::Guess(4), &rng).unwrap();
        assert_eq!(hit.multiplier, 5.0);

        let rng = scripted(&[2]);
        let even = resolve(GameKind::EvenOdd, InstantInput::Side(Parity::Even), &rng).unwrap();
        assert_eq!(even.multiplier, 1.9);

        let rng = ScriptedRandomness::new();
        let missing = resolve(GameKind::GuessNumber, InstantInput::None, &rng);
        assert!(matches!(
            missing,
            Err(EngineError::Validation { field: "parameter", .. })
        ));
    }
}
