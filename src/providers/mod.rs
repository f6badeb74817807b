/*!
 * Collaborator interfaces for the review loop.
 *
 * The review session never judges or writes text itself. It delegates to:
 * - a `Judge`, which scores a script and lists what to fix
 * - a `Rewriter`, which produces a complete replacement script
 *
 * Any backend (a hosted model, a local model, a scripted mock) plugs in by
 * implementing the matching trait.
 */

use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

use crate::errors::ProviderError;

pub mod mock;
pub mod score;

pub use score::{QualityIssue, QualityScore, JUDGE_DIMENSIONS};

/// Scores one episode script
///
/// Implementations must report `overall` on the same 0-100 scale as the
/// session's pass threshold. Calls are retried on retryable errors, so a
/// judge must be safe to call again with the same input.
#[async_trait]
pub trait Judge: Send + Sync + Debug {
    /// Score a script
    ///
    /// # Arguments
    /// * `script` - The full episode script
    /// * `plan` - The episode's plan fragment, used as scoring context
    ///
    /// # Returns
    /// * `Result<QualityScore, ProviderError>` - The score or a classified failure
    async fn score(&self, script: &str, plan: Option<&Value>) -> Result<QualityScore, ProviderError>;
}

/// Rewrites one episode script against a list of issues
#[async_trait]
pub trait Rewriter: Send + Sync + Debug {
    /// Rewrite a script
    ///
    /// # Arguments
    /// * `script` - The script of the round being rewritten
    /// * `issues` - Problems to fix, judge issues first
    ///
    /// # Returns
    /// * `Result<String, ProviderError>` - A complete replacement script, never a diff
    async fn rewrite(&self, script: &str, issues: &[QualityIssue]) -> Result<String, ProviderError>;
}
