/*!
 * On-disk archive of review rounds.
 *
 * Layout under the archive root:
 *
 * ```text
 * reviews/ep<N>_round<M>.txt           round script
 * reviews/ep<N>_round<M>_review.json   validation and quality of the round
 * reviews/ep<N>_log.json               one summary entry per round, appended
 * ```
 */

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Local;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

use crate::providers::QualityScore;
use crate::validation::{LineStats, ValidationResult};

use super::models::{ReviewRound, RoundAction};
use super::sink::RoundSink;

/// Per-round review document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundReview {
    pub round: usize,
    pub rewritten: bool,
    pub validation: ValidationResult,
    pub quality: Option<QualityScore>,
    pub action: RoundAction,
}

/// Entry of the per-episode review log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub round: usize,
    pub timestamp: String,
    pub validation_passed: bool,
    pub issue_count: usize,
    pub stats: LineStats,
    pub overall: Option<f64>,
    pub action: RoundAction,
}

/// `RoundSink` that writes rounds under `<root>/reviews/`
#[derive(Debug)]
pub struct RoundArchive {
    reviews_dir: PathBuf,
    // Serializes read-modify-write of the log files
    log_lock: Mutex<()>,
}

impl RoundArchive {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            reviews_dir: root.as_ref().join("reviews"),
            log_lock: Mutex::new(()),
        }
    }

    pub fn reviews_dir(&self) -> &Path {
        &self.reviews_dir
    }

    pub fn script_path(&self, episode_id: &str, round: usize) -> PathBuf {
        self.reviews_dir
            .join(format!("ep{}_round{}.txt", file_key(episode_id), round))
    }

    pub fn review_path(&self, episode_id: &str, round: usize) -> PathBuf {
        self.reviews_dir
            .join(format!("ep{}_round{}_review.json", file_key(episode_id), round))
    }

    pub fn log_path(&self, episode_id: &str) -> PathBuf {
        self.reviews_dir
            .join(format!("ep{}_log.json", file_key(episode_id)))
    }

    /// Read back the review log of an episode; empty when nothing was logged
    pub async fn read_log(&self, episode_id: &str) -> Result<Vec<LogEntry>> {
        let path = self.log_path(episode_id);
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read review log: {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse review log: {:?}", path))
    }

    async fn write_file(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write to file: {:?}", path))
    }

    async fn append_log(&self, episode_id: &str, entry: LogEntry) -> Result<()> {
        let _guard = self.log_lock.lock().await;

        let mut entries = self.read_log(episode_id).await?;
        entries.push(entry);
        let json = serde_json::to_string_pretty(&entries)
            .context("Failed to serialize review log")?;
        Self::write_file(&self.log_path(episode_id), &json).await
    }
}

/// Episode id as it appears in file names; anything but letters, digits,
/// `-` and `_` becomes `_` so ids cannot leave `reviews/`
fn file_key(episode_id: &str) -> String {
    episode_id
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[async_trait]
impl RoundSink for RoundArchive {
    async fn record(&self, episode_id: &str, round: &ReviewRound, action: RoundAction)
        -> Result<()> {
        Self::write_file(&self.script_path(episode_id, round.index), &round.script).await?;

        let review = RoundReview {
            round: round.index,
            rewritten: round.rewritten,
            validation: round.validation.clone(),
            quality: round.quality.clone(),
            action,
        };
        let json = serde_json::to_string_pretty(&review)
            .context("Failed to serialize round review")?;
        Self::write_file(&self.review_path(episode_id, round.index), &json).await?;

        self.append_log(
            episode_id,
            LogEntry {
                round: round.index,
                timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
                validation_passed: round.validation.passed,
                issue_count: round.validation.issues.len(),
                stats: round.validation.stats,
                overall: round.overall(),
                action,
            },
        )
        .await?;

        debug!("Archived episode {} round {}", episode_id, round.index);
        Ok(())
    }
}
