/*!
 * # scriptreview - Structural validation and review loops for episode scripts
 *
 * A Rust library that checks generated short-drama episode scripts and runs
 * them through a judge/rewriter quality loop.
 *
 * ## Features
 *
 * - Deterministic structural validation of episode scripts:
 *   - Line classification (scene headers, character lists, action, dialogue,
 *     voiceover, transitions)
 *   - Count and ratio checks against configurable style bounds
 * - Retry with exponential backoff for calls to external collaborators
 * - A bounded review/rewrite loop with best-effort fallback
 * - Round archiving and concurrent batch review
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `validation`: Structural validator:
 *   - `validation::lines`: Line classification
 *   - `validation::bounds`: Style bounds
 *   - `validation::service`: Episode validation and reports
 * - `retry`: Retry policy with backoff
 * - `providers`: Judge and rewriter interfaces, scores and mocks
 * - `session`: Review sessions:
 *   - `session::manager`: The review/rewrite state machine
 *   - `session::archive`: On-disk round archive
 *   - `session::batch`: Concurrent review of many episodes
 * - `errors`: Custom error types for the library
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod errors;
pub mod providers;
pub mod retry;
pub mod session;
pub mod validation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{AppError, ConfigError, ProviderError};
pub use providers::{Judge, QualityIssue, QualityScore, Rewriter};
pub use retry::{ErrorClass, ExhaustedError, RetryError, RetryPolicy};
pub use session::{
    BatchReviewer, EpisodeReviewSession, ReviewSession, ReviewSettings, RoundArchive,
    TerminalStatus,
};
pub use validation::{validate, StyleBounds, ValidationIssue, ValidationResult};
