//! Payout calculator: pure functions from game parameters and progress to a
//! multiplier. No state, no randomness; repeated evaluation for the same
//! inputs is bit-for-bit reproducible.

/// House retains 5% on progressive games.
pub const HOUSE_EDGE: f64 = 0.95;

/// Rounds a currency amount to two decimal places. Applied to payouts at the
/// settlement boundary only; multipliers are never rounded.
pub fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Mines multiplier after `opened` safe reveals with `mine_count` mines among
/// 25 cells: the product of reciprocal hypergeometric survival probabilities,
/// scaled by the house edge. 1.0 before the first reveal.
pub fn mines_multiplier(opened: u32, mine_count: u32) -> f64 {
    debug_assert!((1..=24).contains(&mine_count));
    debug_assert!(opened <= 25 - mine_count);
    if opened == 0 {
        return 1.0;
    }
    let mut product = 1.0_f64;
    for i in 0..opened {
        product *= (25 - i) as f64 / (25 - mine_count - i) as f64;
    }
    HOUSE_EDGE * product
}

/// Towers multiplier after clearing `rows` rows with `bombs` bombs per
/// five-cell row: `0.95 * (5 / (5 - bombs))^rows`.
pub fn towers_multiplier(rows: u32, bombs: u32) -> f64 {
    debug_assert!((1..=4).contains(&bombs));
    debug_assert!(rows <= 10);
    HOUSE_EDGE * (5.0 / (5.0 - bombs as f64)).powi(rows as i32)
}

/// Duel: 1.9x on a strict win over the house roll, stake back on a tie.
pub fn duel_multiplier(player: u8, house: u8) -> f64 {
    if player > house {
        1.9
    } else if player == house {
        1.0
    } else {
        0.0
    }
}

/// Fortune: 2.4x on the edge faces {1, 6}.
pub fn fortune_multiplier(face: u8) -> f64 {
    if face == 1 || face == 6 {
        2.4
    } else {
        0.0
    }
}

/// Darts: 2.2x on a face of 4 or higher.
pub fn darts_multiplier(face: u8) -> f64 {
    if face >= 4 {
        2.2
    } else {
        0.0
    }
}

/// Bowling: 2.0x on a face of 4 or higher.
pub fn bowling_multiplier(face: u8) -> f64 {
    if face >= 4 {
        2.0
    } else {
        0.0
    }
}

/// Even/odd: 1.9x when the face's parity matches the chosen side.
pub fn even_odd_multiplier(chose_even: bool, face: u8) -> f64 {
    if (face % 2 == 0) == chose_even {
        1.9
    } else {
        0.0
    }
}

/// Guess-the-number: 5.0x on an exact match.
pub fn guess_multiplier(guess: u8, face: u8) -> f64 {
    if guess == face {
        5.0
    } else {
        0.0
    }
}

/// Two independent dice: 10.0x when their product exceeds 30.
pub fn dice_product_multiplier(first: u8, second: u8) -> f64 {
    if u16::from(first) * u16::from(second) > 30 {
        10.0
    } else {
        0.0
    }
}

/// Roulette: one fatal chamber out of six; 5.5x on survival.
pub fn roulette_multiplier(chamber: u8) -> f64 {
    if chamber == 1 {
        0.0
    } else {
        5.5
    }
}
