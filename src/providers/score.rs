/*!
 * Judge output: quality scores and actionable issues.
 *
 * The review loop only looks at `overall` and `pass`; dimension scores and
 * issues are carried through for the rewriter and for auditing.
 */

use std::collections::BTreeMap;

use log::error;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ProviderError;

/// Dimensions a judge reply is expected to score, on a 0-5 scale
pub const JUDGE_DIMENSIONS: [&str; 9] = [
    "open_hook",
    "core_conflict",
    "turn",
    "highlight",
    "rhythm",
    "character",
    "shootable",
    "end_hook",
    "safety",
];

/// One problem found by the judge, with a suggested fix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityIssue {
    pub description: String,
    pub suggestion: String,
}

impl QualityIssue {
    pub fn new(description: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            suggestion: suggestion.into(),
        }
    }
}

/// Scored judgement of one round's script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    /// Per-dimension scores as reported by the judge
    #[serde(default)]
    pub dimension_scores: BTreeMap<String, f64>,
    /// Overall score, on the same 0-100 scale as the pass threshold
    pub overall: f64,
    /// Problems to fix, in the judge's order
    #[serde(default)]
    pub issues: Vec<QualityIssue>,
    /// The judge's own verdict
    #[serde(default)]
    pub pass: bool,
}

impl QualityScore {
    /// A score with only an overall value, as returned by simple judges.
    pub fn with_overall(overall: f64, pass_threshold: f64) -> Self {
        Self {
            dimension_scores: BTreeMap::new(),
            overall,
            issues: Vec::new(),
            pass: overall >= pass_threshold,
        }
    }

    /// Attach issues.
    pub fn with_issues(mut self, issues: Vec<QualityIssue>) -> Self {
        self.issues = issues;
        self
    }

    /// Parse a raw judge reply.
    ///
    /// The reply is a JSON object, optionally wrapped in a Markdown code
    /// fence. `scores` holds 0-5 values for the dimensions in
    /// `JUDGE_DIMENSIONS`; the overall score is their mean scaled to 0-100
    /// and rounded to one decimal. `fix_list` entries become issues
    /// (`problem` -> description, `fix` -> suggestion).
    pub fn from_judge_response(text: &str, pass_threshold: f64) -> Result<Self, ProviderError> {
        let cleaned = strip_code_fence(text);

        let value: Value = serde_json::from_str(cleaned).map_err(|e| {
            let preview: String = text.chars().take(200).collect();
            error!("Judge reply is not valid JSON: {} (reply starts with: {})", e, preview);
            ProviderError::ParseError(format!("judge reply is not valid JSON: {}", e))
        })?;

        let Value::Object(object) = value else {
            return Err(ProviderError::ParseError(
                "judge reply is not a JSON object".to_string(),
            ));
        };

        let mut dimension_scores = BTreeMap::new();
        if let Some(Value::Object(scores)) = object.get("scores") {
            for dimension in JUDGE_DIMENSIONS {
                if let Some(score) = scores.get(dimension).and_then(Value::as_f64) {
                    dimension_scores.insert(dimension.to_string(), score);
                }
            }
        }

        let overall = if dimension_scores.is_empty() {
            0.0
        } else {
            let mean = dimension_scores.values().sum::<f64>() / dimension_scores.len() as f64;
            (mean * 20.0 * 10.0).round() / 10.0
        };

        let issues = object
            .get("fix_list")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(parse_fix).collect())
            .unwrap_or_default();

        Ok(Self {
            dimension_scores,
            overall,
            issues,
            pass: overall >= pass_threshold,
        })
    }
}

fn parse_fix(item: &Value) -> Option<QualityIssue> {
    let problem = item.get("problem").and_then(Value::as_str)?;
    let fix = item.get("fix").and_then(Value::as_str).unwrap_or_default();
    Some(QualityIssue::new(problem, fix))
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    match (trimmed.find('\n'), trimmed.rfind("```")) {
        (Some(first_newline), Some(last_fence)) if last_fence > first_newline => {
            trimmed[first_newline + 1..last_fence].trim()
        }
        _ => trimmed,
    }
}
