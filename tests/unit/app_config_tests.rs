/*!
 * Tests for app configuration functionality
 */

use std::time::Duration;

use scriptreview::app_config::{Config, LogLevel};
use scriptreview::session::ScoringPolicy;
use scriptreview::validation::CountRange;

use crate::common::{create_temp_dir, create_test_file};

#[test]
fn test_default_shouldMatchReviewDefaults() {
    let config = Config::default();

    assert_eq!(config.review.max_rounds, 3);
    assert_eq!(config.review.pass_threshold, 75.0);
    assert_eq!(config.review.concurrent_sessions, 2);
    assert_eq!(config.retry.base_delay_ms, 1000);
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

#[test]
fn test_fromFile_withValidJson_shouldLoadConfig() {
    let dir = create_temp_dir().unwrap();
    let path = create_test_file(
        dir.path(),
        "conf.json",
        r#"{
            "review": {"max_rounds": 4, "pass_threshold": 80, "scoring_policy": "skip_when_invalid"},
            "retry": {"max_attempts": 5, "base_delay_ms": 200, "backoff_multiplier": 1.5},
            "style": {"scenes": {"min": 1, "max": 2}},
            "log_level": "warn"
        }"#,
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();

    assert_eq!(config.review.max_rounds, 4);
    assert_eq!(config.review.pass_threshold, 80.0);
    assert_eq!(config.style.scenes, Some(CountRange::new(1, 2)));
    assert_eq!(config.log_filter(), log::LevelFilter::Warn);

    let settings = config.review_settings();
    assert_eq!(settings.max_rounds, 4);
    assert_eq!(settings.scoring_policy, ScoringPolicy::SkipWhenInvalid);

    let policy = config.retry_policy();
    assert_eq!(policy.max_attempts, 5);
    assert_eq!(policy.delay_before(2), Duration::from_millis(200));
    assert_eq!(policy.delay_before(3), Duration::from_millis(300));
}

#[test]
fn test_fromFile_withMissingFile_shouldFailWithPath() {
    let dir = create_temp_dir().unwrap();
    let missing = dir.path().join("absent.json");

    let error = Config::from_file(&missing).unwrap_err();

    assert!(format!("{:#}", error).contains("Failed to open config file"));
}

#[test]
fn test_fromFile_withInvalidValues_shouldFailValidation() {
    let dir = create_temp_dir().unwrap();
    let path = create_test_file(
        dir.path(),
        "conf.json",
        r#"{"style": {"total_lines": {"min": 40, "max": 20}}}"#,
    )
    .unwrap();

    let error = Config::from_file(&path).unwrap_err();

    let message = format!("{:#}", error);
    assert!(message.contains("Configuration validation failed"));
    assert!(message.contains("style.total_lines"));
}

#[test]
fn test_fromFile_withMalformedJson_shouldFailParsing() {
    let dir = create_temp_dir().unwrap();
    let path = create_test_file(dir.path(), "conf.json", "{ review: ").unwrap();

    let error = Config::from_file(&path).unwrap_err();

    assert!(format!("{:#}", error).contains("Failed to parse config file"));
}

#[test]
fn test_serialize_thenDeserialize_shouldKeepScoringPolicyName() {
    let mut config = Config::default();
    config.review.scoring_policy = ScoringPolicy::SkipWhenInvalid;

    let json = serde_json::to_string(&config).unwrap();

    assert!(json.contains("\"skip_when_invalid\""));
    let restored: Config = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.review.scoring_policy, ScoringPolicy::SkipWhenInvalid);
    assert_eq!(restored.style.scenes, config.style.scenes);
}
