use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::Path;
use std::time::Duration;

use crate::errors::ConfigError;
use crate::retry::RetryPolicy;
use crate::session::{ReviewSettings, ScoringPolicy};
use crate::validation::StyleBounds;

/// Application configuration module
/// This module handles loading and validating the review configuration:
/// the review loop, the retry policy and the style bounds.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Review loop config
    #[serde(default)]
    pub review: ReviewConfig,

    /// Retry config for judge and rewriter calls
    #[serde(default)]
    pub retry: RetryConfig,

    /// Structural bounds an episode must fall within
    #[serde(default)]
    pub style: StyleBounds,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Review loop configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ReviewConfig {
    // @field: Rounds per episode, including the original script
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,

    // @field: Minimum overall score (0-100) for a round to pass
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: f64,

    // @field: Whether structurally invalid rounds are still scored
    #[serde(default)]
    pub scoring_policy: ScoringPolicy,

    // @field: Append structural issues to the rewrite request
    #[serde(default = "default_true")]
    pub inject_validation_issues: bool,

    // @field: Episodes reviewed at the same time in a batch
    #[serde(default = "default_concurrent_sessions")]
    pub concurrent_sessions: usize,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            pass_threshold: default_pass_threshold(),
            scoring_policy: ScoringPolicy::default(),
            inject_validation_issues: default_true(),
            concurrent_sessions: default_concurrent_sessions(),
        }
    }
}

/// Retry configuration for collaborator calls
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RetryConfig {
    // @field: Invocations per call, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    // @field: Wait before the second attempt, in milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    // @field: Growth factor of the wait between attempts
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_max_rounds() -> usize {
    3
}

fn default_pass_threshold() -> f64 {
    75.0
}

fn default_true() -> bool {
    true
}

fn default_concurrent_sessions() -> usize {
    2
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

impl Config {
    /// Load and validate a JSON configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to open config file: {:?}", path))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        config.validate().context("Configuration validation failed")?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.review.max_rounds == 0 {
            return Err(ConfigError::invalid("review.max_rounds", "must be at least 1"));
        }
        if !(0.0..=100.0).contains(&self.review.pass_threshold) {
            return Err(ConfigError::invalid(
                "review.pass_threshold",
                format!("{} is outside [0, 100]", self.review.pass_threshold),
            ));
        }
        if self.review.concurrent_sessions == 0 {
            return Err(ConfigError::invalid(
                "review.concurrent_sessions",
                "must be at least 1",
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::invalid("retry.max_attempts", "must be at least 1"));
        }
        let multiplier = self.retry.backoff_multiplier;
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(ConfigError::invalid(
                "retry.backoff_multiplier",
                format!("{} is not a finite value >= 1", self.retry.backoff_multiplier),
            ));
        }

        self.style.check()
    }

    /// Retry policy for judge and rewriter calls
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_attempts,
            Duration::from_millis(self.retry.base_delay_ms),
        )
        .with_multiplier(self.retry.backoff_multiplier)
    }

    /// Settings for one review session
    pub fn review_settings(&self) -> ReviewSettings {
        ReviewSettings {
            max_rounds: self.review.max_rounds,
            pass_threshold: self.review.pass_threshold,
            scoring_policy: self.review.scoring_policy,
            inject_validation_issues: self.review.inject_validation_issues,
        }
    }

    /// Log filter for the configured level
    pub fn log_filter(&self) -> log::LevelFilter {
        self.log_level.into()
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            review: ReviewConfig::default(),
            retry: RetryConfig::default(),
            style: StyleBounds::default(),
            log_level: LogLevel::default(),
        }
    }
}
