/*!
 * Review/rewrite loop for one episode.
 *
 * Each round is validated, scored by the judge and then either accepted,
 * rewritten, or (on the last round) settled by falling back to the best
 * round seen. Judge and rewriter calls go through the retry policy; a call
 * that still fails ends the session as aborted with every completed round
 * kept in its history.
 *
 * This module handles:
 * - Sequencing validation, scoring and rewriting per round
 * - Fallback selection when no round passes
 * - Cancellation between rounds
 * - Handing each completed round to a `RoundSink`
 */

use log::{debug, info, warn};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::errors::ProviderError;
use crate::providers::{Judge, QualityIssue, QualityScore, Rewriter};
use crate::retry::RetryPolicy;
use crate::validation::{validate, StyleBounds, ValidationResult};

use super::models::{
    AbortReason, EpisodeReviewSession, ReviewRound, ReviewSettings, RoundAction, ScoringPolicy,
    TerminalStatus,
};
use super::sink::{NullSink, RoundSink};

/// Runs the review loop against a judge and a rewriter
#[derive(Debug, Clone)]
pub struct ReviewSession {
    judge: Arc<dyn Judge>,
    rewriter: Arc<dyn Rewriter>,
    retry_policy: RetryPolicy,
    settings: ReviewSettings,
    sink: Arc<dyn RoundSink>,
}

impl ReviewSession {
    /// Create a session with default settings, default retry policy and no persistence
    pub fn new(judge: Arc<dyn Judge>, rewriter: Arc<dyn Rewriter>) -> Self {
        Self {
            judge,
            rewriter,
            retry_policy: RetryPolicy::default(),
            settings: ReviewSettings::default(),
            sink: Arc::new(NullSink),
        }
    }

    /// Set the review settings
    pub fn with_settings(mut self, settings: ReviewSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Set the retry policy for judge and rewriter calls
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Set where completed rounds go
    pub fn with_sink(mut self, sink: Arc<dyn RoundSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn settings(&self) -> &ReviewSettings {
        &self.settings
    }

    /// Review one episode until it passes, rounds run out, or the session aborts.
    ///
    /// # Arguments
    /// * `episode_id` - Identifier used in logs and passed to the sink
    /// * `script` - The generated episode script (round 0)
    /// * `plan` - Plan fragment handed to the judge as context
    /// * `bounds` - Structural bounds for validation
    /// * `cancel` - Checked before every judge and rewriter call
    ///
    /// # Returns
    /// * `EpisodeReviewSession` - The full round history and terminal status
    pub async fn run(
        &self,
        episode_id: &str,
        script: &str,
        plan: Option<&Value>,
        bounds: &StyleBounds,
        cancel: &CancellationToken,
    ) -> EpisodeReviewSession {
        let max_rounds = self.settings.max_rounds.max(1);
        let threshold = self.settings.pass_threshold;
        let mut session = EpisodeReviewSession::new(episode_id, max_rounds, threshold);

        let mut script = script.to_string();
        let mut index = 0;

        info!(
            "Reviewing episode {} (max {} rounds, pass at {})",
            episode_id, max_rounds, threshold
        );

        loop {
            let validation = validate(&script, bounds);
            debug!("Episode {} round {}: {}", episode_id, index, validation.summary());

            if cancel.is_cancelled() {
                let round = Self::new_round(index, script, validation, None);
                return self
                    .abort(session, round, AbortReason::Cancelled)
                    .await;
            }

            let skip_scoring =
                self.settings.scoring_policy == ScoringPolicy::SkipWhenInvalid && !validation.passed;

            let quality = if skip_scoring {
                info!(
                    "Episode {} round {}: {} structural issues, skipping judge",
                    episode_id,
                    index,
                    validation.issues.len()
                );
                None
            } else {
                let judge = self.judge.as_ref();
                let text = script.as_str();
                match self
                    .retry_policy
                    .execute(move || judge.score(text, plan), ProviderError::class)
                    .await
                {
                    Ok(quality) => Some(quality),
                    Err(e) => {
                        warn!("Episode {} round {}: judge failed: {}", episode_id, index, e);
                        let round = Self::new_round(index, script, validation, None);
                        return self
                            .abort(session, round, AbortReason::JudgeFailed(e.to_string()))
                            .await;
                    }
                }
            };

            let round = Self::new_round(index, script, validation, quality);
            let accepted = round.is_accepted(threshold);
            let last_round = index + 1 >= max_rounds;

            let action = if accepted {
                RoundAction::Pass
            } else if last_round {
                RoundAction::Fallback
            } else {
                RoundAction::Rewrite
            };

            info!(
                "Episode {} round {}: validation {}, score {}, {}",
                episode_id,
                index,
                if round.validation.passed { "passed" } else { "failed" },
                round
                    .overall()
                    .map(|s| format!("{:.1}", s))
                    .unwrap_or_else(|| "-".to_string()),
                action
            );

            let issues = self.rewrite_issues(&round);
            let current_script = round.script.clone();
            self.emit(&session.episode_id, &round, action).await;
            session.push_round(round);

            match action {
                RoundAction::Pass => {
                    session.finish(TerminalStatus::Passed, Some(index));
                    info!("{}", session);
                    return session;
                }
                RoundAction::Fallback => {
                    let selected = session.best_round().map(|r| r.index);
                    session.finish(TerminalStatus::FallbackBestEffort, selected);
                    info!("{} (best effort, round {:?})", session, selected);
                    return session;
                }
                RoundAction::Rewrite | RoundAction::Abort => {}
            }

            if cancel.is_cancelled() {
                session.finish(TerminalStatus::Aborted(AbortReason::Cancelled), None);
                info!("{}", session);
                return session;
            }

            let rewriter = self.rewriter.as_ref();
            let text = current_script.as_str();
            let issue_list = issues.as_slice();
            match self
                .retry_policy
                .execute(move || rewriter.rewrite(text, issue_list), ProviderError::class)
                .await
            {
                Ok(rewritten) => {
                    script = rewritten;
                    index += 1;
                }
                Err(e) => {
                    warn!("Episode {} round {}: rewriter failed: {}", episode_id, index, e);
                    session.finish(
                        TerminalStatus::Aborted(AbortReason::RewriterFailed(e.to_string())),
                        None,
                    );
                    info!("{}", session);
                    return session;
                }
            }
        }
    }

    fn new_round(
        index: usize,
        script: String,
        validation: ValidationResult,
        quality: Option<QualityScore>,
    ) -> ReviewRound {
        ReviewRound {
            index,
            script,
            validation,
            quality,
            rewritten: index > 0,
        }
    }

    /// Issues handed to the rewriter: the judge's first, then structural ones.
    fn rewrite_issues(&self, round: &ReviewRound) -> Vec<QualityIssue> {
        let mut issues = round
            .quality
            .as_ref()
            .map(|q| q.issues.clone())
            .unwrap_or_default();

        if self.settings.inject_validation_issues || round.quality.is_none() {
            issues.extend(
                round
                    .validation
                    .issues
                    .iter()
                    .map(|issue| issue.to_quality_issue()),
            );
        }
        issues
    }

    async fn abort(
        &self,
        mut session: EpisodeReviewSession,
        round: ReviewRound,
        reason: AbortReason,
    ) -> EpisodeReviewSession {
        self.emit(&session.episode_id, &round, RoundAction::Abort).await;
        session.push_round(round);
        session.finish(TerminalStatus::Aborted(reason), None);
        info!("{}", session);
        session
    }

    async fn emit(&self, episode_id: &str, round: &ReviewRound, action: RoundAction) {
        if let Err(e) = self.sink.record(episode_id, round, action).await {
            warn!(
                "Failed to record episode {} round {}: {:#}",
                episode_id, round.index, e
            );
        }
    }
}
