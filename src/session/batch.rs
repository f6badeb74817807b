/*!
 * Batch review of several episodes.
 *
 * Episodes are reviewed concurrently, at most `max_concurrent_sessions` at a
 * time, with the judge, rewriter and sink shared between sessions. One
 * episode aborting never stops the others.
 */

use futures::stream::{self, StreamExt};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::validation::StyleBounds;

use super::manager::ReviewSession;
use super::models::{EpisodeReviewSession, TerminalStatus};

/// One episode waiting for review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeJob {
    pub episode_id: String,
    pub script: String,
    /// Plan fragment handed to the judge
    #[serde(default)]
    pub plan: Option<Value>,
}

impl EpisodeJob {
    pub fn new(episode_id: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            episode_id: episode_id.into(),
            script: script.into(),
            plan: None,
        }
    }

    /// Attach the episode's plan fragment
    pub fn with_plan(mut self, plan: Value) -> Self {
        self.plan = Some(plan);
        self
    }
}

/// Count of sessions per terminal status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub passed: usize,
    pub fallback: usize,
    pub aborted: usize,
}

impl BatchSummary {
    pub fn from_sessions(sessions: &[EpisodeReviewSession]) -> Self {
        let mut summary = Self::default();
        for session in sessions {
            match session.terminal_status {
                Some(TerminalStatus::Passed) => summary.passed += 1,
                Some(TerminalStatus::FallbackBestEffort) => summary.fallback += 1,
                Some(TerminalStatus::Aborted(_)) | None => summary.aborted += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.passed + self.fallback + self.aborted
    }
}

impl std::fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} episodes: {} passed, {} best effort, {} aborted",
            self.total(),
            self.passed,
            self.fallback,
            self.aborted
        )
    }
}

/// Reviews many episodes with bounded concurrency
#[derive(Debug, Clone)]
pub struct BatchReviewer {
    session: ReviewSession,
    bounds: Arc<StyleBounds>,
    semaphore: Arc<Semaphore>,
    max_concurrent_sessions: usize,
}

impl BatchReviewer {
    /// Create a batch reviewer
    pub fn new(session: ReviewSession, bounds: StyleBounds, max_concurrent_sessions: usize) -> Self {
        let max_concurrent_sessions = max_concurrent_sessions.max(1);
        Self {
            session,
            bounds: Arc::new(bounds),
            semaphore: Arc::new(Semaphore::new(max_concurrent_sessions)),
            max_concurrent_sessions,
        }
    }

    /// Review every job; results come back in job order.
    pub async fn review_all(
        &self,
        jobs: Vec<EpisodeJob>,
        cancel: &CancellationToken,
    ) -> Vec<EpisodeReviewSession> {
        let total = jobs.len();
        let start_time = Instant::now();
        info!(
            "Reviewing {} episodes, {} at a time",
            total, self.max_concurrent_sessions
        );

        let mut results = stream::iter(jobs.into_iter().enumerate())
            .map(|(job_index, job)| {
                let semaphore = self.semaphore.clone();
                let session = &self.session;
                let bounds = self.bounds.as_ref();

                async move {
                    // Acquire a permit from the semaphore; it is never closed
                    let _permit = semaphore.acquire_owned().await.ok();

                    let outcome = session
                        .run(
                            &job.episode_id,
                            &job.script,
                            job.plan.as_ref(),
                            bounds,
                            cancel,
                        )
                        .await;
                    (job_index, outcome)
                }
            })
            .buffer_unordered(self.max_concurrent_sessions)
            .collect::<Vec<_>>()
            .await;

        // Sort results by job index to maintain original order
        results.sort_by_key(|(index, _)| *index);
        let sessions: Vec<EpisodeReviewSession> =
            results.into_iter().map(|(_, session)| session).collect();

        info!(
            "Batch finished in {:?}: {}",
            start_time.elapsed(),
            BatchSummary::from_sessions(&sessions)
        );
        sessions
    }
}
