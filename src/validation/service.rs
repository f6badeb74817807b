/*!
 * Structural validation of episode scripts.
 *
 * `validate` classifies every line, reports lines that break the script
 * format, then checks the per-category counts and ratios against the
 * supplied `StyleBounds`. It is a pure function: no I/O, no shared state,
 * and the same input always yields the same result.
 */

use log::debug;
use serde::{Deserialize, Serialize};

use crate::providers::QualityIssue;

use super::bounds::StyleBounds;
use super::lines::{
    self, LineKind, ScriptLine, ALLOWED_TRANSITIONS, CHARACTER_LIST_LABEL, FULL_COLON,
};

/// Counted categories, in reporting order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CountCategory {
    TotalLines,
    DialogueLines,
    ActionLines,
    VoiceoverLines,
    Scenes,
}

impl CountCategory {
    pub fn label(&self) -> &'static str {
        match self {
            CountCategory::TotalLines => "total lines",
            CountCategory::DialogueLines => "dialogue lines",
            CountCategory::ActionLines => "action lines",
            CountCategory::VoiceoverLines => "voiceover lines",
            CountCategory::Scenes => "scenes",
        }
    }
}

/// Ratio categories, in reporting order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RatioCategory {
    DialogueToTotal,
    ActionToTotal,
}

impl RatioCategory {
    pub fn label(&self) -> &'static str {
        match self {
            RatioCategory::DialogueToTotal => "dialogue ratio",
            RatioCategory::ActionToTotal => "action ratio",
        }
    }
}

/// Kind of structural problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueKind {
    MissingEpisodeTitle,
    MalformedSceneHeader,
    MissingCharacterList,
    MalformedDialogue,
    DisallowedTransition,
    CountOutOfRange(CountCategory),
    RatioOutOfRange(RatioCategory),
}

/// A structural problem, at a 1-based line or at line 0 for the whole episode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub line_number: usize,
    pub description: String,
}

impl ValidationIssue {
    fn at_line(kind: IssueKind, line_number: usize, description: String) -> Self {
        Self {
            kind,
            line_number,
            description,
        }
    }

    fn document(kind: IssueKind, description: String) -> Self {
        Self::at_line(kind, 0, description)
    }

    /// Whether the issue concerns the episode as a whole
    pub fn is_document_level(&self) -> bool {
        self.line_number == 0
    }

    /// Location tag used in reports and rewrite requests
    pub fn location(&self) -> String {
        if self.is_document_level() {
            "episode".to_string()
        } else {
            format!("L{}", self.line_number)
        }
    }

    /// Express the issue as a fix request for the rewriter.
    pub fn to_quality_issue(&self) -> QualityIssue {
        let suggestion = match self.kind {
            IssueKind::MissingEpisodeTitle => {
                "Open the episode with a title line such as 第1集".to_string()
            }
            IssueKind::MalformedSceneHeader => {
                "Write scene headers as `<ep>-<scene>场 <place> <日|夜> <内|外>`".to_string()
            }
            IssueKind::MissingCharacterList => format!(
                "Follow every scene header with `{}` listing the characters",
                CHARACTER_LIST_LABEL
            ),
            IssueKind::MalformedDialogue => format!(
                "Write dialogue as `speaker{}text` or start action lines with ▲",
                FULL_COLON
            ),
            IssueKind::DisallowedTransition => {
                format!("Use one of {}", ALLOWED_TRANSITIONS.join(" "))
            }
            IssueKind::CountOutOfRange(category) => {
                format!("Bring the number of {} back into range", category.label())
            }
            IssueKind::RatioOutOfRange(category) => {
                format!("Rebalance the {}", category.label())
            }
        };
        QualityIssue::new(
            format!("[format {}] {}", self.location(), self.description),
            suggestion,
        )
    }
}

/// Line counts of one episode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineStats {
    pub scene_count: usize,
    pub total_lines: usize,
    pub dialogue_lines: usize,
    pub action_lines: usize,
    pub voiceover_lines: usize,
    pub transition_lines: usize,
    pub unrecognized_lines: usize,
}

impl LineStats {
    fn count(&self, category: CountCategory) -> usize {
        match category {
            CountCategory::TotalLines => self.total_lines,
            CountCategory::DialogueLines => self.dialogue_lines,
            CountCategory::ActionLines => self.action_lines,
            CountCategory::VoiceoverLines => self.voiceover_lines,
            CountCategory::Scenes => self.scene_count,
        }
    }

    fn ratio(&self, category: RatioCategory) -> Option<f64> {
        if self.total_lines == 0 {
            return None;
        }
        let part = match category {
            RatioCategory::DialogueToTotal => self.dialogue_lines,
            RatioCategory::ActionToTotal => self.action_lines,
        };
        Some(part as f64 / self.total_lines as f64)
    }
}

/// Outcome of validating one episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// True iff `issues` is empty
    pub passed: bool,
    /// Episode number from the title line, when present
    pub episode: Option<u32>,
    pub stats: LineStats,
    /// Line-level issues in document order, then count issues, then ratio issues
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Number of issues of a given kind
    pub fn count_of(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|i| i.kind == kind).count()
    }

    /// Get a summary string
    pub fn summary(&self) -> String {
        format!(
            "{}: scenes={} total={} dialogue={} action={} voiceover={}, {} issues",
            if self.passed { "PASS" } else { "FAIL" },
            self.stats.scene_count,
            self.stats.total_lines,
            self.stats.dialogue_lines,
            self.stats.action_lines,
            self.stats.voiceover_lines,
            self.issues.len()
        )
    }
}

/// Validate one episode script against `bounds`.
pub fn validate(script: &str, bounds: &StyleBounds) -> ValidationResult {
    let lines = lines::parse_lines(script);

    let mut stats = LineStats::default();
    let mut episode = None;
    let mut has_title = false;
    let mut line_issues = Vec::new();
    // Line number of a scene header still waiting for its character list
    let mut pending_scene: Option<usize> = None;

    for line in &lines {
        if let Some(scene_line) = pending_scene.take() {
            if line.kind != LineKind::CharacterList {
                line_issues.push(missing_character_list(scene_line));
            }
        }

        if line.kind.is_body() {
            stats.total_lines += 1;
        }

        match line.kind {
            LineKind::EpisodeTitle => {
                if !has_title {
                    has_title = true;
                    episode = lines::episode_number(&line.text);
                }
            }
            LineKind::SceneHeader => {
                stats.scene_count += 1;
                pending_scene = Some(line.number);
            }
            LineKind::CharacterList => {
                if lines::character_names(&line.text).is_empty() {
                    line_issues.push(ValidationIssue::at_line(
                        IssueKind::MissingCharacterList,
                        line.number,
                        "character list names nobody".to_string(),
                    ));
                }
            }
            LineKind::ActionLine => stats.action_lines += 1,
            LineKind::DialogueLine => stats.dialogue_lines += 1,
            LineKind::VoiceoverLine => stats.voiceover_lines += 1,
            LineKind::TransitionMarker => {
                stats.transition_lines += 1;
                if !lines::is_allowed_transition(&line.text) {
                    line_issues.push(ValidationIssue::at_line(
                        IssueKind::DisallowedTransition,
                        line.number,
                        format!(
                            "transition {} is not one of {}",
                            line.text,
                            ALLOWED_TRANSITIONS.join(" ")
                        ),
                    ));
                }
            }
            LineKind::Unrecognized => {
                stats.unrecognized_lines += 1;
                line_issues.push(unrecognized_issue(line));
            }
        }
    }

    if let Some(scene_line) = pending_scene {
        line_issues.push(missing_character_list(scene_line));
    }

    let mut issues = Vec::with_capacity(line_issues.len() + 8);
    if !has_title {
        issues.push(ValidationIssue::document(
            IssueKind::MissingEpisodeTitle,
            "episode title line (第N集) is missing".to_string(),
        ));
    }
    issues.extend(line_issues);
    issues.extend(check_counts(&stats, bounds));
    issues.extend(check_ratios(&stats, bounds));

    debug!(
        "Validated episode {:?}: {} lines classified, {} issues",
        episode,
        lines.len(),
        issues.len()
    );

    ValidationResult {
        passed: issues.is_empty(),
        episode,
        stats,
        issues,
    }
}

/// Validate a text holding several episodes, split on their title lines.
///
/// Text before the first title is ignored. A text without any title line is
/// validated as a single episode.
pub fn validate_script(text: &str, bounds: &StyleBounds) -> Vec<ValidationResult> {
    let mut episodes: Vec<Vec<&str>> = Vec::new();
    for raw in text.lines() {
        if lines::classify_line(raw) == Some(LineKind::EpisodeTitle) {
            episodes.push(vec![raw]);
        } else if let Some(current) = episodes.last_mut() {
            current.push(raw);
        }
    }

    if episodes.is_empty() {
        return vec![validate(text, bounds)];
    }

    episodes
        .iter()
        .map(|episode| validate(&episode.join("\n"), bounds))
        .collect()
}

/// Render results as a readable multi-episode report.
pub fn format_report(results: &[ValidationResult]) -> String {
    let mut out = Vec::new();
    let mut total_issues = 0;

    for result in results {
        let label = result
            .episode
            .map(|n| format!("Episode {}", n))
            .unwrap_or_else(|| "Unknown episode".to_string());
        out.push(format!("== {} {} ==", label, if result.passed { "PASS" } else { "FAIL" }));
        out.push(format!(
            "  stats: scenes={} total={} dialogue={} action={} voiceover={}",
            result.stats.scene_count,
            result.stats.total_lines,
            result.stats.dialogue_lines,
            result.stats.action_lines,
            result.stats.voiceover_lines
        ));
        if result.issues.is_empty() {
            out.push("  no issues".to_string());
        }
        for issue in &result.issues {
            out.push(format!("  [{}] {}", issue.location(), issue.description));
        }
        out.push(String::new());
        total_issues += result.issues.len();
    }

    let all_passed = results.iter().all(|r| r.passed);
    out.push(format!(
        "Summary: {} episodes, {} ({} issues)",
        results.len(),
        if all_passed { "all passed" } else { "some failed" },
        total_issues
    ));
    out.join("\n")
}

fn missing_character_list(scene_line: usize) -> ValidationIssue {
    ValidationIssue::at_line(
        IssueKind::MissingCharacterList,
        scene_line,
        format!("scene header is not followed by a {} line", CHARACTER_LIST_LABEL),
    )
}

fn unrecognized_issue(line: &ScriptLine) -> ValidationIssue {
    let preview: String = line.text.chars().take(40).collect();
    if lines::looks_like_scene_header(&line.text) {
        ValidationIssue::at_line(
            IssueKind::MalformedSceneHeader,
            line.number,
            format!("scene header is malformed: {}", preview),
        )
    } else if lines::uses_half_width_colon(&line.text) {
        ValidationIssue::at_line(
            IssueKind::MalformedDialogue,
            line.number,
            format!("dialogue uses a half-width colon instead of {}: {}", FULL_COLON, preview),
        )
    } else {
        ValidationIssue::at_line(
            IssueKind::MalformedDialogue,
            line.number,
            format!("unrecognized line: {}", preview),
        )
    }
}

fn check_counts(stats: &LineStats, bounds: &StyleBounds) -> Vec<ValidationIssue> {
    let checks = [
        (CountCategory::TotalLines, bounds.total_lines),
        (CountCategory::DialogueLines, bounds.dialogue_lines),
        (CountCategory::ActionLines, bounds.action_lines),
        (CountCategory::VoiceoverLines, bounds.voiceover_lines),
        (CountCategory::Scenes, bounds.scenes),
    ];

    checks
        .into_iter()
        .filter_map(|(category, range)| {
            let range = range?;
            let actual = stats.count(category);
            (!range.contains(actual)).then(|| {
                ValidationIssue::document(
                    IssueKind::CountOutOfRange(category),
                    format!("{} = {}, outside allowed range {}", category.label(), actual, range),
                )
            })
        })
        .collect()
}

fn check_ratios(stats: &LineStats, bounds: &StyleBounds) -> Vec<ValidationIssue> {
    let checks = [
        (RatioCategory::DialogueToTotal, bounds.dialogue_ratio),
        (RatioCategory::ActionToTotal, bounds.action_ratio),
    ];

    checks
        .into_iter()
        .filter_map(|(category, range)| {
            let range = range?;
            let actual = stats.ratio(category)?;
            (!range.contains(actual)).then(|| {
                ValidationIssue::document(
                    IssueKind::RatioOutOfRange(category),
                    format!(
                        "{} = {:.0}%, outside allowed range {}",
                        category.label(),
                        actual * 100.0,
                        range
                    ),
                )
            })
        })
        .collect()
}
