//! Randomness source behind every game outcome.
//!
//! Outcomes directly determine payouts, so the production source draws from
//! the operating system's CSPRNG and is never seedable by the player. Tests
//! (and collaborator crates testing against this engine) inject
//! [`ScriptedRandomness`] instead.

use rand::rngs::OsRng;
use rand::Rng;
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

/// Uniform draws for the game engines.
pub trait Randomness: Send + Sync {
    /// Uniform integer in `[lo, hi]`, both ends inclusive.
    fn uniform(&self, lo: u8, hi: u8) -> u8;

    /// `k` distinct values drawn uniformly from `[0, n)`. Callers guarantee
    /// `k <= n`.
    fn sample_distinct(&self, n: u8, k: u8) -> HashSet<u8>;
}

/// OS-backed source used in production.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsRandomness;

impl OsRandomness {
    pub fn new() -> Self {
        Self
    }
}

impl Randomness for OsRandomness {
    fn uniform(&self, lo: u8, hi: u8) -> u8 {
        let mut rng = OsRng;
        rng.gen_range(lo..=hi)
    }

    fn sample_distinct(&self, n: u8, k: u8) -> HashSet<u8> {
        let mut rng = OsRng;
        rand::seq::index::sample(&mut rng, n as usize, k as usize)
            .into_iter()
            .map(|i| i as u8)
            .collect()
    }
}

/// Replays queued outcomes in order. Test tooling only: panics when the
/// script runs dry, which is exactly the loud failure a test wants.
#[derive(Default)]
pub struct ScriptedRandomness {
    draws: Mutex<VecDeque<u8>>,
    samples: Mutex<VecDeque<HashSet<u8>>>,
}

impl ScriptedRandomness {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the next `uniform` result.
    pub fn push_draw(&self, value: u8) {
        self.draws.lock().expect("draw script poisoned").push_back(value);
    }

    /// Queues the next `sample_distinct` result.
    pub fn push_sample<I: IntoIterator<Item = u8>>(&self, values: I) {
        self.samples
            .lock()
            .expect("sample script poisoned")
            .push_back(values.into_iter().collect());
    }
}

impl Randomness for ScriptedRandomness {
    fn uniform(&self, lo: u8, hi: u8) -> u8 {
        let value = self
            .draws
            .lock()
            .expect("draw script poisoned")
            .pop_front()
            .expect("scripted draws exhausted");
        assert!(
            (lo..=hi).contains(&value),
            "scripted draw {} outside [{}, {}]",
            value,
            lo,
            hi
        );
        value
    }

    fn sample_distinct(&self, _n: u8, k: u8) -> HashSet<u8> {
        let sample = self
            .samples
            .lock()
            .expect("sample script poisoned")
            .pop_front()
            .expect("scripted samples exhausted");
        assert_eq!(sample.len(), k as usize, "scripted sample size mismatch");
        sample
    }
}
