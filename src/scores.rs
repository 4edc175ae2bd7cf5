//! Per-bin score counters
//!
//! Each bin keeps a digit counter (0-9) and an unbounded star tally. Ten
//! catches roll the counter over and mint one star. Scores load from the host
//! storage when a session starts and write back synchronously after every
//! mutation so a crash never loses more than the in-flight catch.

use serde::{Deserialize, Serialize};

use crate::consts::BIN_COUNT;
use crate::platform::Storage;

/// Storage key for the score blob
pub const SCORES_KEY: &str = "letters.scores";

/// Result of a single score bump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BumpResult {
    /// Counter value after the bump (0 right after a rollover)
    pub count: u8,
    /// True exactly when the bump rolled 9 -> 0 and minted a star
    pub rolled_over: bool,
}

/// Persistent per-bin counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BinScores {
    counts: [u8; BIN_COUNT],
    stars: [u32; BIN_COUNT],
}

impl BinScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from storage; a missing or corrupt blob yields fresh counters.
    ///
    /// A blob that parses but breaks the 0-9 counter invariant is treated as
    /// corrupt too, so `bump` can never overflow a tampered counter.
    pub fn load(storage: &dyn Storage) -> Self {
        match storage.get(SCORES_KEY) {
            Some(value) => match serde_json::from_value::<Self>(value) {
                Ok(scores) if scores.counts.iter().all(|c| *c <= 9) => scores,
                Ok(_) => {
                    log::warn!("score counter out of range, starting fresh");
                    Self::new()
                }
                Err(err) => {
                    log::warn!("corrupt score blob, starting fresh: {err}");
                    Self::new()
                }
            },
            None => Self::new(),
        }
    }

    /// Write the current counters back to storage.
    pub fn save(&self, storage: &mut dyn Storage) {
        match serde_json::to_value(self) {
            Ok(value) => storage.set(SCORES_KEY, value),
            Err(err) => log::warn!("failed to serialize scores: {err}"),
        }
    }

    /// Record one confirmed catch in `bin`.
    pub fn bump(&mut self, bin: usize) -> BumpResult {
        let count = &mut self.counts[bin];
        *count += 1;
        if *count >= 10 {
            *count = 0;
            self.stars[bin] += 1;
            BumpResult {
                count: 0,
                rolled_over: true,
            }
        } else {
            BumpResult {
                count: *count,
                rolled_over: false,
            }
        }
    }

    pub fn count(&self, bin: usize) -> u8 {
        self.counts[bin]
    }

    pub fn stars(&self, bin: usize) -> u32 {
        self.stars[bin]
    }
}
