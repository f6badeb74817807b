/*!
 * Tests for the structural validator
 */

use scriptreview::validation::{
    classify_line, format_report, validate, validate_script, CountCategory, IssueKind, LineKind,
    StyleBounds,
};

use crate::common::{malformed_episode, reference_bounds, sample_episode, untitled_episode};

#[test]
fn test_validate_withSampleEpisode_shouldPassWithExpectedStats() {
    let result = validate(&sample_episode(1), &reference_bounds());

    assert!(result.passed, "{:?}", result.issues);
    assert_eq!(result.episode, Some(1));
    assert_eq!(result.stats.scene_count, 2);
    assert_eq!(result.stats.dialogue_lines, 12);
    assert_eq!(result.stats.action_lines, 10);
    assert_eq!(result.stats.voiceover_lines, 3);
    assert_eq!(result.stats.transition_lines, 1);
    assert_eq!(result.stats.total_lines, 26);
}

#[test]
fn test_validate_withDefaultBounds_shouldPassSampleEpisode() {
    assert!(validate(&sample_episode(4), &StyleBounds::default()).passed);
}

#[test]
fn test_validate_withMissingTitle_shouldReportOnlyTitleAtLineZero() {
    let result = validate(&untitled_episode(), &reference_bounds());

    assert!(!result.passed);
    assert_eq!(result.issues.len(), 1);
    assert_eq!(result.issues[0].kind, IssueKind::MissingEpisodeTitle);
    assert_eq!(result.issues[0].line_number, 0);
    assert_eq!(result.episode, None);
}

#[test]
fn test_validate_withMalformedEpisode_shouldListLineIssuesBeforeCounts() {
    let result = validate(&malformed_episode(), &reference_bounds());

    let line_issues: Vec<(IssueKind, usize)> = result
        .issues
        .iter()
        .filter(|i| !i.is_document_level())
        .map(|i| (i.kind, i.line_number))
        .collect();
    assert_eq!(
        line_issues,
        vec![
            (IssueKind::MalformedSceneHeader, 2),
            (IssueKind::MalformedDialogue, 4),
            (IssueKind::DisallowedTransition, 5),
        ]
    );

    // Count issues follow every line issue
    let last_line_issue = result
        .issues
        .iter()
        .rposition(|i| !i.is_document_level())
        .unwrap();
    let first_count = result
        .issues
        .iter()
        .position(|i| matches!(i.kind, IssueKind::CountOutOfRange(_)))
        .unwrap();
    assert!(last_line_issue < first_count);
    assert_eq!(
        result.issues[first_count].kind,
        IssueKind::CountOutOfRange(CountCategory::TotalLines)
    );
}

#[test]
fn test_validate_withEmptyScript_shouldNotPanic() {
    let result = validate("", &StyleBounds::default());

    assert!(!result.passed);
    assert_eq!(result.stats.total_lines, 0);
    assert_eq!(result.issues[0].kind, IssueKind::MissingEpisodeTitle);
    // Ratios are not computed on an empty body
    assert!(result
        .issues
        .iter()
        .all(|i| !matches!(i.kind, IssueKind::RatioOutOfRange(_))));
}

#[test]
fn test_validate_withUnboundedStyle_shouldOnlyReportFormat() {
    let result = validate(&sample_episode(2), &StyleBounds::unbounded());
    assert!(result.passed);
}

#[test]
fn test_validate_sameInputTwice_shouldGiveEqualResults() {
    let bounds = reference_bounds();
    let script = malformed_episode();

    assert_eq!(validate(&script, &bounds), validate(&script, &bounds));
}

#[test]
fn test_validate_withTooManyVoiceoverLines_shouldReportVoiceoverCount() {
    let extra: String = (0..5).map(|i| format!("\n林晚（VO）：回忆{}。", i)).collect();
    let script = format!("{}{}", sample_episode(1), extra);

    let result = validate(&script, &reference_bounds());

    assert_eq!(
        result
            .issues
            .iter()
            .map(|i| i.kind)
            .collect::<Vec<_>>(),
        vec![IssueKind::CountOutOfRange(CountCategory::VoiceoverLines)]
    );
}

#[test]
fn test_classifyLine_shouldBeExposedForCallers() {
    assert_eq!(classify_line("【闪回】"), Some(LineKind::TransitionMarker));
    assert_eq!(classify_line("  "), None);
}

#[test]
fn test_validateScript_withSeveralEpisodes_shouldValidateEach() {
    let text = format!("{}\n\n{}", sample_episode(1), malformed_episode().replace("第1集", "第2集"));

    let results = validate_script(&text, &reference_bounds());

    assert_eq!(results.len(), 2);
    assert!(results[0].passed);
    assert!(!results[1].passed);
    assert_eq!(results[1].episode, Some(2));

    let report = format_report(&results);
    assert!(report.contains("== Episode 1 PASS =="));
    assert!(report.contains("== Episode 2 FAIL =="));
    assert!(report.contains("some failed"));
}

#[test]
fn test_fromProfileJson_shouldDriveValidation() {
    let profile = r#"{"target": {"scenes_per_ep": {"suggest": 1.0, "range": [1, 1]}}}"#;
    let bounds = StyleBounds::from_profile_json(profile).unwrap();

    let result = validate(&sample_episode(1), &bounds);

    assert_eq!(result.issues.len(), 1);
    assert_eq!(result.issues[0].kind, IssueKind::CountOutOfRange(CountCategory::Scenes));
}
