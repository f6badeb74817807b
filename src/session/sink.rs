/*!
 * Round persistence hooks.
 *
 * The session hands every completed round to a `RoundSink` together with the
 * action it decided for that round. Persisting is the caller's business:
 * a sink failure is logged by the session and never changes its outcome.
 */

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::fmt::Debug;
use std::sync::Arc;

use super::models::{ReviewRound, RoundAction};

/// Receives rounds as the session completes them
#[async_trait]
pub trait RoundSink: Send + Sync + Debug {
    /// Record one round
    async fn record(&self, episode_id: &str, round: &ReviewRound, action: RoundAction)
        -> Result<()>;
}

/// Sink that discards every round
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

#[async_trait]
impl RoundSink for NullSink {
    async fn record(&self, _episode_id: &str, _round: &ReviewRound, _action: RoundAction)
        -> Result<()> {
        Ok(())
    }
}

/// Sink that keeps rounds in memory, in arrival order
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<(String, usize, RoundAction)>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(episode_id, round index, action)` for every recorded round
    pub fn records(&self) -> Vec<(String, usize, RoundAction)> {
        self.records.lock().clone()
    }
}

#[async_trait]
impl RoundSink for MemorySink {
    async fn record(&self, episode_id: &str, round: &ReviewRound, action: RoundAction)
        -> Result<()> {
        self.records
            .lock()
            .push((episode_id.to_string(), round.index, action));
        Ok(())
    }
}
