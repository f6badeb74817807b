/*!
 * Mock collaborators for testing.
 *
 * Both mocks replay a queue of scripted replies, one per call:
 * - `ScriptedJudge` - returns queued scores or errors
 * - `ScriptedRewriter` - returns queued scripts or errors
 *
 * When the queue runs dry the last reply is repeated. Clones share the queue
 * and the call counter, so a test can keep a handle after moving the mock
 * into a session.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{Judge, QualityIssue, QualityScore, Rewriter};

#[derive(Debug)]
struct ReplyQueue<T: Clone> {
    pending: VecDeque<T>,
    last: Option<T>,
}

impl<T: Clone> ReplyQueue<T> {
    fn new(replies: Vec<T>) -> Self {
        Self {
            pending: replies.into(),
            last: None,
        }
    }

    fn next(&mut self) -> Option<T> {
        if let Some(reply) = self.pending.pop_front() {
            self.last = Some(reply.clone());
        }
        self.last.clone()
    }
}

/// Judge that replays scripted replies
#[derive(Debug, Clone)]
pub struct ScriptedJudge {
    replies: Arc<Mutex<ReplyQueue<Result<QualityScore, ProviderError>>>>,
    /// Number of `score` calls made so far
    call_count: Arc<AtomicUsize>,
    /// Scripts received, in call order
    seen: Arc<Mutex<Vec<String>>>,
    delay: Option<Duration>,
}

impl ScriptedJudge {
    /// Create a judge from queued replies
    pub fn new(replies: Vec<Result<QualityScore, ProviderError>>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(ReplyQueue::new(replies))),
            call_count: Arc::new(AtomicUsize::new(0)),
            seen: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    /// Create a judge that returns these overall scores in order
    pub fn with_scores(scores: &[f64]) -> Self {
        let replies = scores
            .iter()
            .map(|&overall| {
                Ok(QualityScore::with_overall(overall, 75.0).with_issues(vec![QualityIssue::new(
                    format!("Scored {}", overall),
                    "Sharpen the conflict",
                )]))
            })
            .collect();
        Self::new(replies)
    }

    /// Create a judge that always fails with `error`
    pub fn failing(error: ProviderError) -> Self {
        Self::new(vec![Err(error)])
    }

    /// Wait this long before answering each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of calls made so far
    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Scripts received so far
    pub fn scripts_seen(&self) -> Vec<String> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl Judge for ScriptedJudge {
    async fn score(&self, script: &str, _plan: Option<&Value>) -> Result<QualityScore, ProviderError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(script.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self.replies.lock().next();
        reply.unwrap_or_else(|| {
            Err(ProviderError::RequestFailed(
                "Scripted judge has no replies".to_string(),
            ))
        })
    }
}

/// Rewriter that replays scripted replies
#[derive(Debug, Clone)]
pub struct ScriptedRewriter {
    replies: Arc<Mutex<ReplyQueue<Result<String, ProviderError>>>>,
    /// Number of `rewrite` calls made so far
    call_count: Arc<AtomicUsize>,
    /// Issue lists received, in call order
    seen_issues: Arc<Mutex<Vec<Vec<QualityIssue>>>>,
}

impl ScriptedRewriter {
    /// Create a rewriter from queued replies
    pub fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(ReplyQueue::new(replies))),
            call_count: Arc::new(AtomicUsize::new(0)),
            seen_issues: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a rewriter that returns these scripts in order
    pub fn with_scripts<S: Into<String>>(scripts: impl IntoIterator<Item = S>) -> Self {
        Self::new(scripts.into_iter().map(|s| Ok(s.into())).collect())
    }

    /// Create a rewriter that always fails with `error`
    pub fn failing(error: ProviderError) -> Self {
        Self::new(vec![Err(error)])
    }

    /// Number of calls made so far
    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Issue lists received so far
    pub fn issues_seen(&self) -> Vec<Vec<QualityIssue>> {
        self.seen_issues.lock().clone()
    }
}

#[async_trait]
impl Rewriter for ScriptedRewriter {
    async fn rewrite(&self, _script: &str, issues: &[QualityIssue]) -> Result<String, ProviderError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.seen_issues.lock().push(issues.to_vec());

        let reply = self.replies.lock().next();
        reply.unwrap_or_else(|| {
            Err(ProviderError::RequestFailed(
                "Scripted rewriter has no replies".to_string(),
            ))
        })
    }
}
