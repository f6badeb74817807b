/*!
 * Review session models.
 *
 * An `EpisodeReviewSession` owns the ordered history of `ReviewRound`s for
 * one episode. Rounds are appended in index order and never modified once
 * appended; the terminal status is set exactly once when the loop stops.
 */

use serde::{Deserialize, Serialize};

use crate::providers::QualityScore;
use crate::validation::ValidationResult;

/// Whether structurally invalid rounds are still sent to the judge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringPolicy {
    /// Score every round, so the rewriter always sees the judge's issues
    #[default]
    AlwaysScore,
    /// Skip the judge on rounds that fail validation
    SkipWhenInvalid,
}

/// Runtime settings of a review session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSettings {
    /// Rounds per episode, including the original script
    pub max_rounds: usize,
    /// Minimum overall score (0-100) for a round to pass
    pub pass_threshold: f64,
    pub scoring_policy: ScoringPolicy,
    /// Append structural issues to the judge's issues on rewrite
    pub inject_validation_issues: bool,
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self {
            max_rounds: 3,
            pass_threshold: 75.0,
            scoring_policy: ScoringPolicy::AlwaysScore,
            inject_validation_issues: true,
        }
    }
}

/// What the session did after a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundAction {
    Pass,
    Rewrite,
    Fallback,
    Abort,
}

impl std::fmt::Display for RoundAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RoundAction::Pass => "pass",
            RoundAction::Rewrite => "rewrite",
            RoundAction::Fallback => "fallback",
            RoundAction::Abort => "abort",
        };
        write!(f, "{}", name)
    }
}

/// One attempt at the episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRound {
    /// 0 for the original script
    pub index: usize,
    pub script: String,
    pub validation: ValidationResult,
    /// Absent when the round was not scored
    pub quality: Option<QualityScore>,
    /// True iff the script came from the rewriter
    pub rewritten: bool,
}

impl ReviewRound {
    /// Structurally valid and scored at or above the threshold
    pub fn is_accepted(&self, pass_threshold: f64) -> bool {
        self.validation.passed
            && self
                .quality
                .as_ref()
                .is_some_and(|q| q.overall >= pass_threshold)
    }

    /// Overall score, if the round was scored
    pub fn overall(&self) -> Option<f64> {
        self.quality.as_ref().map(|q| q.overall)
    }
}

/// Why a session stopped without a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum AbortReason {
    /// The caller cancelled between rounds
    Cancelled,
    /// The judge failed fatally or kept failing
    JudgeFailed(String),
    /// The rewriter failed fatally or kept failing
    RewriterFailed(String),
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbortReason::Cancelled => write!(f, "cancelled"),
            AbortReason::JudgeFailed(e) => write!(f, "judge failed: {}", e),
            AbortReason::RewriterFailed(e) => write!(f, "rewriter failed: {}", e),
        }
    }
}

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalStatus {
    Passed,
    FallbackBestEffort,
    Aborted(AbortReason),
}

impl TerminalStatus {
    /// Short label for logs and summaries
    pub fn label(&self) -> &'static str {
        match self {
            TerminalStatus::Passed => "passed",
            TerminalStatus::FallbackBestEffort => "fallback",
            TerminalStatus::Aborted(_) => "aborted",
        }
    }
}

/// The review history of one episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeReviewSession {
    pub episode_id: String,
    /// Rounds in index order
    pub rounds: Vec<ReviewRound>,
    pub max_rounds: usize,
    pub pass_threshold: f64,
    /// Set once, when the session stops
    pub terminal_status: Option<TerminalStatus>,
    /// Round whose script is the final output; `None` on abort
    pub selected_round: Option<usize>,
}

impl EpisodeReviewSession {
    pub fn new(episode_id: impl Into<String>, max_rounds: usize, pass_threshold: f64) -> Self {
        Self {
            episode_id: episode_id.into(),
            rounds: Vec::new(),
            max_rounds,
            pass_threshold,
            terminal_status: None,
            selected_round: None,
        }
    }

    /// Whether the session reached a terminal status
    pub fn is_finished(&self) -> bool {
        self.terminal_status.is_some()
    }

    pub fn passed(&self) -> bool {
        self.terminal_status == Some(TerminalStatus::Passed)
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self.terminal_status, Some(TerminalStatus::Aborted(_)))
    }

    /// Round with the highest overall score, earliest on ties.
    ///
    /// Unscored rounds rank below every scored round; when nothing was
    /// scored the original script (round 0) is the best available.
    pub fn best_round(&self) -> Option<&ReviewRound> {
        let mut best: Option<&ReviewRound> = None;
        for round in &self.rounds {
            let Some(score) = round.overall() else {
                continue;
            };
            match best.and_then(ReviewRound::overall) {
                Some(best_score) if score <= best_score => {}
                _ => best = Some(round),
            }
        }
        best.or_else(|| self.rounds.first())
    }

    /// Script of the selected round
    pub fn final_script(&self) -> Option<&str> {
        self.selected_round
            .and_then(|index| self.rounds.get(index))
            .map(|round| round.script.as_str())
    }

    /// Score of the selected round
    pub fn final_score(&self) -> Option<f64> {
        self.selected_round
            .and_then(|index| self.rounds.get(index))
            .and_then(ReviewRound::overall)
    }

    pub(crate) fn push_round(&mut self, round: ReviewRound) {
        debug_assert_eq!(round.index, self.rounds.len());
        self.rounds.push(round);
    }

    pub(crate) fn finish(&mut self, status: TerminalStatus, selected_round: Option<usize>) {
        debug_assert!(self.terminal_status.is_none());
        self.terminal_status = Some(status);
        self.selected_round = selected_round;
    }
}

impl std::fmt::Display for EpisodeReviewSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = self
            .terminal_status
            .as_ref()
            .map(TerminalStatus::label)
            .unwrap_or("running");
        write!(
            f,
            "Episode {} - {} after {} rounds",
            self.episode_id,
            status,
            self.rounds.len()
        )?;
        if let Some(score) = self.final_score() {
            write!(f, " (final score {:.1})", score)?;
        }
        Ok(())
    }
}
