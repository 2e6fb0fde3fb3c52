//! Transport-agnostic event contract with the messaging and payment
//! collaborators. Inbound payloads are the only way state changes enter the
//! engine. Outbound payloads are passive data values; the engine never
//! formats user-facing text.

use crate::games::types::{GameKind, GameParameter, StepPayload};
use crate::AccountId;
use serde::{Deserialize, Serialize};

/// Everything the engine consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InboundEvent {
    PlaceBet {
        account: AccountId,
        game: GameKind,
        amount: f64,
    },
    GameParameter {
        account: AccountId,
        parameter: GameParameter,
    },
    Step {
        account: AccountId,
        payload: StepPayload,
    },
    Cashout {
        account: AccountId,
    },
    DepositConfirmed {
        account: AccountId,
        invoice_id: String,
        amount: f64,
    },
    WithdrawRequest {
        account: AccountId,
        amount: f64,
    },
    WithdrawDecision {
        account: AccountId,
        request_id: String,
        approved: bool,
        amount: f64,
    },
}

/// Progress or settlement of the account's game session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "update", rename_all = "snake_case")]
pub enum GameUpdate {
    /// Bet accepted; the engine waits for a game parameter.
    AwaitingParameter { game: GameKind, bet: f64 },
    /// Progressive game live; the bet is debited.
    Started {
        game: GameKind,
        bet: f64,
        multiplier: f64,
    },
    /// Safe step; the session continues.
    Advanced {
        game: GameKind,
        progress: u32,
        multiplier: f64,
        potential_payout: f64,
    },
    /// Instant game settled in one resolution.
    Resolved {
        game: GameKind,
        rolls: Vec<u8>,
        multiplier: f64,
        payout: f64,
        new_balance: f64,
    },
    /// Progressive game lost; for Mines the layout is revealed.
    Busted {
        game: GameKind,
        mines: Option<Vec<u8>>,
    },
    /// Progressive game settled by the player.
    CashedOut {
        game: GameKind,
        multiplier: f64,
        payout: f64,
        new_balance: f64,
    },
    /// Every safe cell opened / every row cleared.
    FullClear {
        game: GameKind,
        multiplier: f64,
        payout: f64,
        new_balance: f64,
    },
    /// Stale unstarted session cleared by the idle policy.
    Abandoned { game: GameKind },
}

/// Result of a confirmed deposit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "deposit", rename_all = "snake_case")]
pub enum DepositOutcome {
    Credited { new_balance: f64 },
    AlreadyCredited,
}

/// A withdrawal was debited and now awaits the external decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingWithdrawal {
    pub request_id: String,
    pub amount: f64,
}

/// Result of applying a withdrawal decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum DecisionOutcome {
    /// Approved; the funds were already debited at request time.
    Paid { amount: f64 },
    /// Declined; the debit was refunded exactly once.
    DeclinedRefunded { amount: f64, new_balance: f64 },
    /// Replayed or already-settled request id; nothing changed.
    AlreadyDecided,
}

/// Everything the engine emits back to the collaborators.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum OutboundEvent {
    Game(GameUpdate),
    Deposit(DepositOutcome),
    Withdrawal(PendingWithdrawal),
    Decision(DecisionOutcome),
    Rejected { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_round_trip() {
        let event = InboundEvent::PlaceBet {
            account: 7,
            game: GameKind::Mines,
            amount: 10.0,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""event":"place_bet""#));
        assert!(json.contains(r#""game":"mines""#));

        let back: InboundEvent = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, InboundEvent::PlaceBet { account: 7, .. }));
    }

    #[test]
    fn test_outbound_wire_shape() {
        let update = OutboundEvent::Game(GameUpdate::CashedOut {
            game: GameKind::Towers,
            multiplier: 1.484375,
            payout: 14.84,
            new_balance: 104.84,
        });
        let json = serde_json::to_string(&update).unwrap();
        assert!(json.contains(r#""result":"game""#));
        assert!(json.contains(r#""update":"cashed_out""#));
        assert!(json.contains(r#""payout":14.84"#));

        let rejected = OutboundEvent::Rejected {
            reason: "insufficient funds".to_string(),
        };
        let json = serde_json::to_string(&rejected).unwrap();
        assert!(json.contains(r#""result":"rejected""#));
    }
}
