/*!
 * Structural validation for episode scripts.
 *
 * This module checks a generated episode against the script format and the
 * configured style bounds:
 * - Line classification (title, scene header, character list, action,
 *   dialogue, voiceover, transition)
 * - Line-level format issues, reported in document order
 * - Per-category counts and ratios against `StyleBounds`
 *
 * # Architecture
 *
 * - `lines`: Classifies individual script lines
 * - `bounds`: Count and ratio ranges, style-profile loading
 * - `service`: Validates an episode and renders reports
 */

pub mod bounds;
pub mod lines;
pub mod service;

// Re-export main types
pub use bounds::{CountRange, RatioRange, StyleBounds};
pub use lines::{classify_line, parse_lines, LineKind, ScriptLine};
pub use service::{
    format_report, validate, validate_script, CountCategory, IssueKind, LineStats, RatioCategory,
    ValidationIssue, ValidationResult,
};
