//! Ledger: the authoritative, atomically-mutated balance store.
//!
//! The trait is the seam to the storage collaborator. Every mutation is a
//! single atomic operation on one account row; the non-negativity guarantee
//! comes from the session manager serializing all deltas for one account, not
//! from checks here.

use crate::errors::EngineResult;
use crate::AccountId;
use async_trait::async_trait;
use dashmap::DashMap;

/// Result of an idempotent, externally-keyed mutation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AppliedOutcome {
    Applied { new_balance: f64 },
    Duplicate,
}

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Current balance; zero for accounts never touched.
    async fn balance(&self, account: AccountId) -> EngineResult<f64>;

    /// Atomically adds `delta` to the account, creating the row at zero if
    /// absent. One upsert-and-add, never a read-then-write. Returns the new
    /// balance. Callers pre-validate sufficient funds for debits.
    async fn apply_delta(&self, account: AccountId, delta: f64) -> EngineResult<f64>;

    /// Applies `delta` at most once per `(account, external_id)`, surviving
    /// duplicate delivery of the triggering event.
    async fn apply_once(
        &self,
        account: AccountId,
        external_id: &str,
        delta: f64,
    ) -> EngineResult<AppliedOutcome>;

    /// Replay-safe deposit crediting keyed by the payment gateway's invoice id.
    async fn credit_once(
        &self,
        account: AccountId,
        invoice_id: &str,
        amount: f64,
    ) -> EngineResult<AppliedOutcome> {
        self.apply_once(account, invoice_id, amount).await
    }
}

/// Sharded in-memory ledger. Production deployments back the [`Ledger`] trait
/// with the storage collaborator; this implementation keeps the identical
/// atomicity contract for tests and single-process runs.
#[derive(Default)]
pub struct InMemoryLedger {
    balances: DashMap<AccountId, f64>,
    applied: DashMap<(AccountId, String), f64>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn balance(&self, account: AccountId) -> EngineResult<f64> {
        Ok(self.balances.get(&account).map(|b| *b).unwrap_or(0.0))
    }

    async fn apply_delta(&self, account: AccountId, delta: f64) -> EngineResult<f64> {
        // Entry guard holds the shard lock for the whole upsert-and-add, so
        // concurrent deltas on the same account never lose an update.
        let mut balance = self.balances.entry(account).or_insert(0.0);
        *balance += delta;
        Ok(*balance)
    }

    async fn apply_once(
        &self,
        account: AccountId,
        external_id: &str,
        delta: f64,
    ) -> EngineResult<AppliedOutcome> {
        use dashmap::mapref::entry::Entry;

        match self.applied.entry((account, external_id.to_string())) {
            Entry::Occupied(_) => {
                tracing::debug!(account, external_id, "duplicate external transaction ignored");
                Ok(AppliedOutcome::Duplicate)
            }
            Entry::Vacant(slot) => {
                slot.insert(delta);
                let mut balance = self.balances.entry(account).or_insert(0.0);
                *balance += delta;
                Ok(AppliedOutcome::Applied {
                    new_balance: *balance,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_untouched_account_reads_zero() {
        let ledger = InMemoryLedger::new();
        assert_eq!(ledger.balance(1).await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn test_apply_delta_creates_row_then_adds() {
        let ledger = InMemoryLedger::new();
        assert_eq!(ledger.apply_delta(1, 100.0).await.unwrap(), 100.0);
        assert_eq!(ledger.apply_delta(1, -10.0).await.unwrap(), 90.0);
        assert_eq!(ledger.balance(1).await.unwrap(), 90.0);
    }

    #[tokio::test]
    async fn test_balance_is_sum_of_deltas_under_concurrency() {
        let ledger = Arc::new(InMemoryLedger::new());

        let mut handles = Vec::new();
        for i in 0..100u32 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                let delta = if i % 2 == 0 { 2.5 } else { -1.5 };
                ledger.apply_delta(7, delta).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // 50 credits of 2.5 and 50 debits of 1.5; both exact in binary.
        assert_eq!(ledger.balance(7).await.unwrap(), 50.0 * 2.5 - 50.0 * 1.5);
    }

    #[tokio::test]
    async fn test_credit_once_applies_exactly_once() {
        let ledger = InMemoryLedger::new();

        let first = ledger.credit_once(1, "invoice-9", 25.0).await.unwrap();
        assert_eq!(first, AppliedOutcome::Applied { new_balance: 25.0 });

        let replay = ledger.credit_once(1, "invoice-9", 25.0).await.unwrap();
        assert_eq!(replay, AppliedOutcome::Duplicate);
        assert_eq!(ledger.balance(1).await.unwrap(), 25.0);
    }

    #[tokio::test]
    async fn test_external_ids_are_scoped_per_account() {
        let ledger = InMemoryLedger::new();

        ledger.credit_once(1, "invoice-9", 25.0).await.unwrap();
        let other = ledger.credit_once(2, "invoice-9", 25.0).await.unwrap();

        assert_eq!(other, AppliedOutcome::Applied { new_balance: 25.0 });
        assert_eq!(ledger.balance(1).await.unwrap(), 25.0);
        assert_eq!(ledger.balance(2).await.unwrap(), 25.0);
    }

    #[tokio::test]
    async fn test_concurrent_credit_once_single_winner() {
        let ledger = Arc::new(InMemoryLedger::new());

        let mut handles = Vec::new();
        for _ in 0..20 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger.credit_once(3, "invoice-dup", 10.0).await.unwrap()
            }));
        }

        let mut applied = 0;
        for handle in handles {
            if matches!(handle.await.unwrap(), AppliedOutcome::Applied { .. }) {
                applied += 1;
            }
        }

        assert_eq!(applied, 1);
        assert_eq!(ledger.balance(3).await.unwrap(), 10.0);
    }
}
