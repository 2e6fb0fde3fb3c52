//! Game session and ledger engine for a wagering service.
//!
//! The engine owns three things: an authoritative balance ledger mutated only
//! through atomic deltas, a per-account exclusive game session, and the
//! settlement rules of ten dice and grid games. Messaging, payment, and
//! storage collaborators talk to it through [`events::InboundEvent`] and get
//! [`events::OutboundEvent`] payloads back; the engine renders no text and
//! owns no transport.

pub mod config;
pub mod errors;
pub mod events;
pub mod games;
pub mod ledger;
pub mod payout;
pub mod rng;
pub mod session;

pub use config::EngineConfig;
pub use errors::{EngineError, EngineResult};
pub use events::{InboundEvent, OutboundEvent};
pub use ledger::{InMemoryLedger, Ledger};
pub use rng::{OsRandomness, Randomness};
pub use session::SessionManager;

/// Stable identifier the collaborators use for an account.
pub type AccountId = u64;

/// Install the process-wide tracing subscriber. `RUST_LOG` overrides the
/// default `info` filter. Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
