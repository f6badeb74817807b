/*!
 * Round archive tests: a full session written to disk
 */

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use scriptreview::providers::mock::{ScriptedJudge, ScriptedRewriter};
use scriptreview::retry::RetryPolicy;
use scriptreview::session::archive::RoundReview;
use scriptreview::session::{ReviewSession, RoundAction, RoundArchive};

use crate::common::{create_temp_dir, reference_bounds, sample_episode, untitled_episode};

#[tokio::test]
async fn test_archive_withTwoRoundSession_shouldWriteEveryRound() {
    let dir = create_temp_dir().unwrap();
    let archive = Arc::new(RoundArchive::new(dir.path()));
    let session = ReviewSession::new(
        Arc::new(ScriptedJudge::with_scores(&[40.0, 85.0])),
        Arc::new(ScriptedRewriter::with_scripts([sample_episode(3)])),
    )
    .with_retry_policy(RetryPolicy::no_retry())
    .with_sink(archive.clone());

    let result = session
        .run("3", &untitled_episode(), None, &reference_bounds(), &CancellationToken::new())
        .await;
    assert!(result.passed());

    let reviews = dir.path().join("reviews");
    assert!(reviews.join("ep3_round0.txt").is_file());
    assert!(reviews.join("ep3_round1.txt").is_file());
    assert_eq!(
        std::fs::read_to_string(reviews.join("ep3_round1.txt")).unwrap(),
        sample_episode(3)
    );

    let review: RoundReview = serde_json::from_str(
        &std::fs::read_to_string(reviews.join("ep3_round0_review.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(review.round, 0);
    assert!(!review.validation.passed);
    assert_eq!(review.quality.map(|q| q.overall), Some(40.0));
    assert_eq!(review.action, RoundAction::Rewrite);

    let log = archive.read_log("3").await.unwrap();
    let actions: Vec<RoundAction> = log.iter().map(|e| e.action).collect();
    assert_eq!(actions, vec![RoundAction::Rewrite, RoundAction::Pass]);
    assert_eq!(log[0].issue_count, 1);
    assert_eq!(log[1].overall, Some(85.0));
    assert!(log[1].validation_passed);
}

#[tokio::test]
async fn test_archive_withSeparateEpisodes_shouldKeepSeparateLogs() {
    let dir = create_temp_dir().unwrap();
    let archive = Arc::new(RoundArchive::new(dir.path()));
    let session = ReviewSession::new(
        Arc::new(ScriptedJudge::with_scores(&[90.0])),
        Arc::new(ScriptedRewriter::with_scripts(["unused"])),
    )
    .with_retry_policy(RetryPolicy::no_retry())
    .with_sink(archive.clone());

    for id in ["1", "2"] {
        session
            .run(id, &sample_episode(1), None, &reference_bounds(), &CancellationToken::new())
            .await;
    }

    assert_eq!(archive.read_log("1").await.unwrap().len(), 1);
    assert_eq!(archive.read_log("2").await.unwrap().len(), 1);
    assert_eq!(archive.log_path("2"), dir.path().join("reviews").join("ep2_log.json"));
}
