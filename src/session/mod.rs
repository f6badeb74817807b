/*!
 * Review sessions for generated episodes.
 *
 * This module provides:
 * - The per-episode review/rewrite loop
 * - Round history and terminal status models
 * - Round persistence through `RoundSink`
 * - Concurrent review of many episodes
 */

pub mod archive;
pub mod batch;
pub mod manager;
pub mod models;
pub mod sink;

// Re-export main types
pub use archive::RoundArchive;
pub use batch::{BatchReviewer, BatchSummary, EpisodeJob};
pub use manager::ReviewSession;
pub use models::{
    AbortReason, EpisodeReviewSession, ReviewRound, ReviewSettings, RoundAction, ScoringPolicy,
    TerminalStatus,
};
pub use sink::{MemorySink, NullSink, RoundSink};
