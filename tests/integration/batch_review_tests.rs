/*!
 * Batch review tests: several episodes sharing collaborators
 */

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use scriptreview::errors::ProviderError;
use scriptreview::providers::{Judge, QualityIssue, QualityScore, Rewriter};
use scriptreview::retry::RetryPolicy;
use scriptreview::session::{
    BatchReviewer, BatchSummary, EpisodeJob, ReviewSession, ReviewSettings, TerminalStatus,
};

use crate::common::{malformed_episode, reference_bounds, sample_episode};

const REWRITE_MARK: &str = "▲重写完成。";
const POISON_MARK: &str = "▲坏账。";

/// Scores by content: rewritten scripts pass, poisoned ones fail fatally
#[derive(Debug, Default)]
struct ContentJudge {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Option<Duration>,
}

#[async_trait]
impl Judge for ContentJudge {
    async fn score(&self, script: &str, _plan: Option<&Value>) -> Result<QualityScore, ProviderError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if script.contains(POISON_MARK) {
            return Err(ProviderError::AuthenticationError("revoked".to_string()));
        }
        let overall = if script.contains(REWRITE_MARK) { 85.0 } else { 50.0 };
        Ok(QualityScore::with_overall(overall, 75.0))
    }
}

/// Appends a marker line to the script
#[derive(Debug)]
struct MarkingRewriter;

#[async_trait]
impl Rewriter for MarkingRewriter {
    async fn rewrite(&self, script: &str, _issues: &[QualityIssue]) -> Result<String, ProviderError> {
        Ok(format!("{}\n{}", script, REWRITE_MARK))
    }
}

fn batch(judge: Arc<ContentJudge>, concurrency: usize) -> BatchReviewer {
    let session = ReviewSession::new(judge, Arc::new(MarkingRewriter))
        .with_settings(ReviewSettings::default())
        .with_retry_policy(RetryPolicy::no_retry());
    BatchReviewer::new(session, reference_bounds(), concurrency)
}

#[tokio::test]
async fn test_reviewAll_withMixedEpisodes_shouldReportEachOutcomeInOrder() {
    let reviewer = batch(Arc::new(ContentJudge::default()), 2);
    let jobs = vec![
        EpisodeJob::new("1", sample_episode(1)),
        EpisodeJob::new("2", format!("{}\n{}", sample_episode(2), POISON_MARK)),
        EpisodeJob::new("3", malformed_episode()).with_plan(serde_json::json!({"beat": "reveal"})),
    ];

    let results = reviewer.review_all(jobs, &CancellationToken::new()).await;

    let ids: Vec<&str> = results.iter().map(|s| s.episode_id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);

    assert_eq!(results[0].terminal_status, Some(TerminalStatus::Passed));
    assert_eq!(results[0].selected_round, Some(1));
    assert!(results[1].is_aborted());
    assert_eq!(
        results[2].terminal_status,
        Some(TerminalStatus::FallbackBestEffort)
    );
    // Rounds 1 and 2 tie at 85; the earlier one wins
    assert_eq!(results[2].selected_round, Some(1));

    let summary = BatchSummary::from_sessions(&results);
    assert_eq!(
        summary,
        BatchSummary {
            passed: 1,
            fallback: 1,
            aborted: 1
        }
    );
    assert_eq!(summary.to_string(), "3 episodes: 1 passed, 1 best effort, 1 aborted");
}

#[tokio::test(start_paused = true)]
async fn test_reviewAll_shouldBoundConcurrentSessions() {
    let judge = Arc::new(ContentJudge {
        delay: Some(Duration::from_millis(50)),
        ..ContentJudge::default()
    });
    let reviewer = batch(judge.clone(), 2);
    let jobs = (1..=5)
        .map(|n| EpisodeJob::new(n.to_string(), sample_episode(n)))
        .collect();

    let results = reviewer.review_all(jobs, &CancellationToken::new()).await;

    assert_eq!(results.len(), 5);
    assert!(results.iter().all(|s| s.passed()));
    assert_eq!(judge.max_in_flight.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_reviewAll_withCancelledToken_shouldAbortEveryEpisode() {
    let reviewer = batch(Arc::new(ContentJudge::default()), 3);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let results = reviewer
        .review_all(
            vec![
                EpisodeJob::new("1", sample_episode(1)),
                EpisodeJob::new("2", sample_episode(2)),
            ],
            &cancel,
        )
        .await;

    assert!(results.iter().all(|s| s.is_aborted()));
    assert!(results.iter().all(|s| s.rounds.len() == 1));
    assert_eq!(BatchSummary::from_sessions(&results).aborted, 2);
}
