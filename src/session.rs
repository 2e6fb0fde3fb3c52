//! Session manager: per-account critical sections over the ledger.
//!
//! Every state change for an account (bets, steps, settlement, deposits,
//! withdrawals) runs inside that account's cell lock, so at most one game
//! session exists per account and no two operations interleave on the same
//! balance. Different accounts proceed in parallel on separate cells.

use crate::config::EngineConfig;
use crate::errors::{EngineError, EngineResult};
use crate::events::{
    DecisionOutcome, DepositOutcome, GameUpdate, InboundEvent, OutboundEvent, PendingWithdrawal,
};
use crate::games::instant::{self, InstantInput};
use crate::games::mines::{MinesGame, MinesStep};
use crate::games::towers::{TowersGame, TowersStep};
use crate::games::types::{GameKind, GameParameter, StepPayload};
use crate::games::{DIE_FACES, MAX_MINES, MAX_ROW_BOMBS};
use crate::ledger::{AppliedOutcome, Ledger};
use crate::payout;
use crate::rng::Randomness;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;

use crate::AccountId;

/// The account's exclusive session slot.
#[derive(Debug)]
enum Session {
    /// Bet accepted, nothing debited yet.
    AwaitingParameter { game: GameKind, bet: f64 },
    Mines(MinesGame),
    Towers(TowersGame),
}

/// Per-account state guarded by the cell lock.
#[derive(Default)]
struct AccountCell {
    session: Option<Session>,
    /// Withdrawals debited but not yet decided, keyed by request id.
    pending_withdrawals: HashMap<String, f64>,
}

/// Audit record for a debit whose matching credit could not be written.
/// The engine never retries a credit on its own; these records exist so an
/// operator can reconcile by hand.
#[derive(Debug, Clone, PartialEq)]
pub struct OrphanedDebit {
    pub account: AccountId,
    pub amount: f64,
    pub context: String,
}

/// Orchestrates game sessions and money movement for all accounts.
pub struct SessionManager<L: Ledger> {
    ledger: Arc<L>,
    rng: Arc<dyn Randomness>,
    config: EngineConfig,
    accounts: DashMap<AccountId, Arc<AsyncMutex<AccountCell>>>,
    orphaned: Mutex<Vec<OrphanedDebit>>,
}

impl<L: Ledger> SessionManager<L> {
    pub fn new(ledger: Arc<L>, rng: Arc<dyn Randomness>, config: EngineConfig) -> Self {
        Self {
            ledger,
            rng,
            config,
            accounts: DashMap::new(),
            orphaned: Mutex::new(Vec::new()),
        }
    }

    /// Single dispatch point for the messaging collaborator. Errors become
    /// `Rejected` payloads; they never tear down the engine.
    pub async fn handle(&self, event: InboundEvent) -> OutboundEvent {
        let result = match event {
            InboundEvent::PlaceBet {
                account,
                game,
                amount,
            } => self.place_bet(account, game, amount).await.map(OutboundEvent::Game),
            InboundEvent::GameParameter { account, parameter } => self
                .provide_parameter(account, parameter)
                .await
                .map(OutboundEvent::Game),
            InboundEvent::Step { account, payload } => {
                self.step(account, payload).await.map(OutboundEvent::Game)
            }
            InboundEvent::Cashout { account } => {
                self.cashout(account).await.map(OutboundEvent::Game)
            }
            InboundEvent::DepositConfirmed {
                account,
                invoice_id,
                amount,
            } => self
                .deposit_confirmed(account, &invoice_id, amount)
                .await
                .map(OutboundEvent::Deposit),
            InboundEvent::WithdrawRequest { account, amount } => self
                .withdraw_request(account, amount)
                .await
                .map(OutboundEvent::Withdrawal),
            InboundEvent::WithdrawDecision {
                account,
                request_id,
                approved,
                amount,
            } => self
                .withdraw_decision(account, &request_id, approved, amount)
                .await
                .map(OutboundEvent::Decision),
        };

        result.unwrap_or_else(|e| OutboundEvent::Rejected {
            reason: e.to_string(),
        })
    }

    /// Opens a session. Instant games resolve in place; games that need a
    /// parameter park in the awaiting state with nothing debited.
    pub async fn place_bet(
        &self,
        account: AccountId,
        game: GameKind,
        amount: f64,
    ) -> EngineResult<GameUpdate> {
        self.config.check_bet(amount)?;

        let cell = self.cell(account);
        let mut cell = cell.lock().await;
        if cell.session.is_some() {
            return Err(EngineError::SessionConflict(account));
        }

        let balance = self.ledger.balance(account).await?;
        if balance < amount {
            return Err(EngineError::InsufficientFunds {
                balance,
                required: amount,
            });
        }

        if game.requires_parameter() {
            cell.session = Some(Session::AwaitingParameter { game, bet: amount });
            return Ok(GameUpdate::AwaitingParameter { game, bet: amount });
        }

        self.resolve_instant(account, game, amount, InstantInput::None)
            .await
    }

    /// Supplies the parameter an awaiting session needs. The bet is debited
    /// here, after the parameter validates and immediately before the first
    /// draw.
    pub async fn provide_parameter(
        &self,
        account: AccountId,
        parameter: GameParameter,
    ) -> EngineResult<GameUpdate> {
        let cell = self.cell(account);
        let mut cell = cell.lock().await;
        let (game, bet) = match &cell.session {
            Some(Session::AwaitingParameter { game, bet }) => (*game, *bet),
            Some(_) => {
                return Err(EngineError::InvalidStep(
                    "session is already running".to_string(),
                ))
            }
            None => return Err(EngineError::UnknownSession(account)),
        };

        match (game, parameter) {
            (GameKind::Mines, GameParameter::MineCount(count)) => {
                // Range-checked up front so a rejected parameter never costs
                // the debit; the engine re-validates on start.
                if !(1..=MAX_MINES).contains(&count) {
                    return Err(EngineError::Validation {
                        field: "mine_count",
                        reason: format!("{} is out of range 1-{}", count, MAX_MINES),
                    });
                }
                self.debit_checked(account, bet).await?;
                match MinesGame::start(bet, count, self.rng.as_ref()) {
                    Ok(engine) => {
                        let multiplier = engine.multiplier();
                        cell.session = Some(Session::Mines(engine));
                        tracing::info!(account, bet, mine_count = count, "mines session started");
                        Ok(GameUpdate::Started {
                            game,
                            bet,
                            multiplier,
                        })
                    }
                    Err(e) => {
                        cell.session = None;
                        self.record_orphan(account, bet, format!("mines start failed: {}", e));
                        Err(e)
                    }
                }
            }
            (GameKind::Towers, GameParameter::BombsPerRow(bombs)) => {
                if !(1..=MAX_ROW_BOMBS).contains(&bombs) {
                    return Err(EngineError::Validation {
                        field: "bombs_per_row",
                        reason: format!("{} is out of range 1-{}", bombs, MAX_ROW_BOMBS),
                    });
                }
                self.debit_checked(account, bet).await?;
                match TowersGame::start(
                    bet,
                    bombs,
                    self.config.towers_commitment,
                    self.rng.as_ref(),
                ) {
                    Ok(engine) => {
                        let multiplier = engine.multiplier();
                        cell.session = Some(Session::Towers(engine));
                        tracing::info!(account, bet, bombs_per_row = bombs, "towers session started");
                        Ok(GameUpdate::Started {
                            game,
                            bet,
                            multiplier,
                        })
                    }
                    Err(e) => {
                        cell.session = None;
                        self.record_orphan(account, bet, format!("towers start failed: {}", e));
                        Err(e)
                    }
                }
            }
            (GameKind::GuessNumber, GameParameter::Guess(guess)) => {
                if !(1..=DIE_FACES).contains(&guess) {
                    return Err(EngineError::Validation {
                        field: "guess",
                        reason: format!("{} is out of range 1-{}", guess, DIE_FACES),
                    });
                }
                let update = self
                    .resolve_instant(account, game, bet, InstantInput::Guess(guess))
                    .await?;
                cell.session = None;
                Ok(update)
            }
            (GameKind::EvenOdd, GameParameter::Side(side)) => {
                let update = self
                    .resolve_instant(account, game, bet, InstantInput::Side(side))
                    .await?;
                cell.session = None;
                Ok(update)
            }
            (game, parameter) => Err(EngineError::Validation {
                field: "parameter",
                reason: format!("{:?} does not apply to {}", parameter, game),
            }),
        }
    }

    /// Advances the account's progressive session by one move.
    pub async fn step(&self, account: AccountId, payload: StepPayload) -> EngineResult<GameUpdate> {
        enum Next {
            Continue(GameUpdate),
            Settle {
                game: GameKind,
                bet: f64,
                multiplier: f64,
            },
            Bust {
                game: GameKind,
                mines: Option<Vec<u8>>,
            },
        }

        let cell = self.cell(account);
        let mut cell = cell.lock().await;

        let next = match (&mut cell.session, payload) {
            (Some(Session::Mines(engine)), StepPayload::Mines { cell }) => {
                match engine.step(cell)? {
                    MinesStep::Safe { opened, multiplier } => {
                        Next::Continue(GameUpdate::Advanced {
                            game: GameKind::Mines,
                            progress: opened,
                            multiplier,
                            potential_payout: payout::round_to_cents(engine.bet() * multiplier),
                        })
                    }
                    MinesStep::FullClear { multiplier } => Next::Settle {
                        game: GameKind::Mines,
                        bet: engine.bet(),
                        multiplier,
                    },
                    MinesStep::Busted => Next::Bust {
                        game: GameKind::Mines,
                        mines: Some(engine.mine_positions_sorted()),
                    },
                }
            }
            (Some(Session::Towers(engine)), StepPayload::Towers { row, cell }) => {
                match engine.step(row, cell, self.rng.as_ref())? {
                    TowersStep::Advanced { row, multiplier } => {
                        Next::Continue(GameUpdate::Advanced {
                            game: GameKind::Towers,
                            progress: row as u32,
                            multiplier,
                            potential_payout: payout::round_to_cents(engine.bet() * multiplier),
                        })
                    }
                    TowersStep::Crowned { multiplier } => Next::Settle {
                        game: GameKind::Towers,
                        bet: engine.bet(),
                        multiplier,
                    },
                    TowersStep::Fell => Next::Bust {
                        game: GameKind::Towers,
                        mines: None,
                    },
                }
            }
            (Some(Session::AwaitingParameter { .. }), _) => {
                return Err(EngineError::InvalidStep(
                    "session is awaiting its parameter".to_string(),
                ))
            }
            (Some(_), _) | (None, _) => return Err(EngineError::UnknownSession(account)),
        };

        match next {
            Next::Continue(update) => Ok(update),
            Next::Settle {
                game,
                bet,
                multiplier,
            } => {
                cell.session = None;
                let (payout, new_balance) = self.settle(account, bet, multiplier).await?;
                tracing::info!(account, %game, payout, "session fully cleared");
                Ok(GameUpdate::FullClear {
                    game,
                    multiplier,
                    payout,
                    new_balance,
                })
            }
            Next::Bust { game, mines } => {
                cell.session = None;
                tracing::info!(account, %game, "session busted");
                Ok(GameUpdate::Busted { game, mines })
            }
        }
    }

    /// Settles the progressive session at its current multiplier.
    pub async fn cashout(&self, account: AccountId) -> EngineResult<GameUpdate> {
        let cell = self.cell(account);
        let mut cell = cell.lock().await;

        let (game, bet, multiplier) = match &cell.session {
            Some(Session::Mines(engine)) => (GameKind::Mines, engine.bet(), engine.cashout()?),
            Some(Session::Towers(engine)) => (GameKind::Towers, engine.bet(), engine.cashout()?),
            Some(Session::AwaitingParameter { .. }) => {
                return Err(EngineError::InvalidStep(
                    "session is awaiting its parameter".to_string(),
                ))
            }
            None => return Err(EngineError::UnknownSession(account)),
        };

        cell.session = None;
        let (payout, new_balance) = self.settle(account, bet, multiplier).await?;
        tracing::info!(account, %game, payout, "session cashed out");
        Ok(GameUpdate::CashedOut {
            game,
            multiplier,
            payout,
            new_balance,
        })
    }

    /// Clears a stale session that never got its parameter. Sessions with a
    /// debited bet are never abandoned.
    pub async fn abandon_idle(&self, account: AccountId) -> EngineResult<GameUpdate> {
        let cell = self.cell(account);
        let mut cell = cell.lock().await;
        match &cell.session {
            Some(Session::AwaitingParameter { game, .. }) => {
                let game = *game;
                cell.session = None;
                tracing::debug!(account, %game, "idle unstarted session abandoned");
                Ok(GameUpdate::Abandoned { game })
            }
            Some(_) => Err(EngineError::InvalidStep(
                "a running session holds a debited bet".to_string(),
            )),
            None => Err(EngineError::UnknownSession(account)),
        }
    }

    /// Credits a confirmed deposit, at most once per invoice id.
    pub async fn deposit_confirmed(
        &self,
        account: AccountId,
        invoice_id: &str,
        amount: f64,
    ) -> EngineResult<DepositOutcome> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(EngineError::Validation {
                field: "amount",
                reason: "deposit must be a positive amount".to_string(),
            });
        }

        let cell = self.cell(account);
        let _cell = cell.lock().await;
        match self.ledger.credit_once(account, invoice_id, amount).await? {
            AppliedOutcome::Applied { new_balance } => {
                tracing::info!(account, invoice_id, amount, "deposit credited");
                Ok(DepositOutcome::Credited { new_balance })
            }
            AppliedOutcome::Duplicate => Ok(DepositOutcome::AlreadyCredited),
        }
    }

    /// Debits a withdrawal immediately and parks it for the external decision.
    pub async fn withdraw_request(
        &self,
        account: AccountId,
        amount: f64,
    ) -> EngineResult<PendingWithdrawal> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(EngineError::Validation {
                field: "amount",
                reason: "withdrawal must be a positive amount".to_string(),
            });
        }

        let cell = self.cell(account);
        let mut cell = cell.lock().await;
        self.debit_checked(account, amount).await?;

        let request_id = uuid::Uuid::new_v4().to_string();
        cell.pending_withdrawals.insert(request_id.clone(), amount);
        tracing::info!(account, %request_id, amount, "withdrawal debited, pending decision");
        Ok(PendingWithdrawal { request_id, amount })
    }

    /// Applies the external approve/decline decision exactly once. A decline
    /// refunds the debit; replays of either decision change nothing. The
    /// decision's amount must match what was debited at request time.
    pub async fn withdraw_decision(
        &self,
        account: AccountId,
        request_id: &str,
        approved: bool,
        amount: f64,
    ) -> EngineResult<DecisionOutcome> {
        let cell = self.cell(account);
        let mut cell = cell.lock().await;

        let debited = match cell.pending_withdrawals.remove(request_id) {
            Some(debited) => debited,
            None => return Ok(DecisionOutcome::AlreadyDecided),
        };
        if (debited - amount).abs() > f64::EPSILON {
            cell.pending_withdrawals.insert(request_id.to_string(), debited);
            return Err(EngineError::Validation {
                field: "amount",
                reason: format!("decision amount {} does not match debited {}", amount, debited),
            });
        }
        let amount = debited;

        // The decision is recorded through the idempotent ledger path so a
        // replay that races past the pending map still cannot refund twice.
        // A failed write leaves the request pending; the gateway retries.
        let refund = if approved { 0.0 } else { amount };
        let applied = match self.ledger.apply_once(account, request_id, refund).await {
            Ok(applied) => applied,
            Err(e) => {
                cell.pending_withdrawals.insert(request_id.to_string(), amount);
                return Err(e);
            }
        };
        match applied {
            AppliedOutcome::Duplicate => Ok(DecisionOutcome::AlreadyDecided),
            AppliedOutcome::Applied { new_balance } => {
                if approved {
                    tracing::info!(account, %request_id, amount, "withdrawal approved");
                    Ok(DecisionOutcome::Paid { amount })
                } else {
                    tracing::info!(account, %request_id, amount, "withdrawal declined, refunded");
                    Ok(DecisionOutcome::DeclinedRefunded {
                        amount,
                        new_balance,
                    })
                }
            }
        }
    }

    pub async fn balance(&self, account: AccountId) -> EngineResult<f64> {
        self.ledger.balance(account).await
    }

    /// Debits left without their matching credit, for manual reconciliation.
    pub fn orphaned_debits(&self) -> Vec<OrphanedDebit> {
        self.orphaned
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn cell(&self, account: AccountId) -> Arc<AsyncMutex<AccountCell>> {
        self.accounts
            .entry(account)
            .or_insert_with(|| Arc::new(AsyncMutex::new(AccountCell::default())))
            .clone()
    }

    /// Funds check plus debit, both under the caller's cell lock so no other
    /// operation can spend the balance in between.
    async fn debit_checked(&self, account: AccountId, amount: f64) -> EngineResult<f64> {
        let balance = self.ledger.balance(account).await?;
        if balance < amount {
            return Err(EngineError::InsufficientFunds {
                balance,
                required: amount,
            });
        }
        self.ledger.apply_delta(account, -amount).await
    }

    /// Debit, draw, credit for a single-resolution game. Caller holds the
    /// cell lock.
    async fn resolve_instant(
        &self,
        account: AccountId,
        game: GameKind,
        bet: f64,
        input: InstantInput,
    ) -> EngineResult<GameUpdate> {
        self.debit_checked(account, bet).await?;

        let outcome = match instant::resolve(game, input, self.rng.as_ref()) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.record_orphan(account, bet, format!("{} draw failed: {}", game, e));
                return Err(e);
            }
        };

        let (payout, new_balance) = self.settle(account, bet, outcome.multiplier).await?;
        tracing::info!(account, %game, payout, "instant game resolved");
        Ok(GameUpdate::Resolved {
            game,
            rolls: outcome.rolls,
            multiplier: outcome.multiplier,
            payout,
            new_balance,
        })
    }

    /// Credits `bet * multiplier`, rounded to cents at this boundary only.
    async fn settle(
        &self,
        account: AccountId,
        bet: f64,
        multiplier: f64,
    ) -> EngineResult<(f64, f64)> {
        let payout = payout::round_to_cents(bet * multiplier);
        if payout == 0.0 {
            let balance = self.ledger.balance(account).await?;
            return Ok((0.0, balance));
        }
        match self.ledger.apply_delta(account, payout).await {
            Ok(new_balance) => Ok((payout, new_balance)),
            Err(e) => {
                self.record_orphan(
                    account,
                    bet,
                    format!("payout {} could not be credited: {}", payout, e),
                );
                Err(e)
            }
        }
    }

    fn record_orphan(&self, account: AccountId, amount: f64, context: String) {
        tracing::error!(account, amount, %context, "debit left without matching credit");
        self.orphaned
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(OrphanedDebit {
                account,
                amount,
                context,
            });
    }
}
