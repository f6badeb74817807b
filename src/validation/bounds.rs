/*!
 * Style bounds: the count and ratio ranges an episode must fall within.
 *
 * Bounds are read-only configuration. They are built once by the caller
 * (from the crate configuration or a style-profile document) and passed by
 * reference into every validation call.
 */

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Inclusive integer range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    pub min: usize,
    pub max: usize,
}

impl CountRange {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: usize) -> bool {
        value >= self.min && value <= self.max
    }
}

impl std::fmt::Display for CountRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Inclusive fractional range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioRange {
    pub min: f64,
    pub max: f64,
}

impl RatioRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl std::fmt::Display for RatioRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:.0}%, {:.0}%]", self.min * 100.0, self.max * 100.0)
    }
}

/// Per-category bounds for one episode. `None` leaves a category unchecked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleBounds {
    /// Body lines (dialogue, voiceover, action, transitions, unrecognized)
    pub total_lines: Option<CountRange>,
    pub dialogue_lines: Option<CountRange>,
    pub action_lines: Option<CountRange>,
    pub voiceover_lines: Option<CountRange>,
    pub scenes: Option<CountRange>,
    /// Dialogue lines over body lines
    pub dialogue_ratio: Option<RatioRange>,
    /// Action lines over body lines
    pub action_ratio: Option<RatioRange>,
}

impl Default for StyleBounds {
    fn default() -> Self {
        Self {
            total_lines: Some(CountRange::new(22, 38)),
            dialogue_lines: Some(CountRange::new(10, 20)),
            action_lines: Some(CountRange::new(8, 20)),
            voiceover_lines: Some(CountRange::new(0, 6)),
            scenes: Some(CountRange::new(1, 3)),
            dialogue_ratio: Some(RatioRange::new(0.15, 0.70)),
            action_ratio: Some(RatioRange::new(0.15, 0.75)),
        }
    }
}

// Shape of a style-profile document: {"target": {"scenes_per_ep": {"suggest": 1.7, "range": [1, 3]}}}
#[derive(Debug, Deserialize)]
struct ProfileDocument {
    #[serde(default)]
    target: Option<HashMap<String, ProfileTarget>>,
}

#[derive(Debug, Deserialize)]
struct ProfileTarget {
    range: [usize; 2],
}

impl StyleBounds {
    /// Bounds that check nothing
    pub fn unbounded() -> Self {
        Self {
            total_lines: None,
            dialogue_lines: None,
            action_lines: None,
            voiceover_lines: None,
            scenes: None,
            dialogue_ratio: None,
            action_ratio: None,
        }
    }

    /// Build bounds from a style-profile JSON document.
    ///
    /// Count ranges come from the profile's `target` section; a key missing
    /// from `target` leaves that category unchecked. Ratio ranges are not
    /// part of the profile format and keep their defaults. A document with
    /// no `target` section yields the default bounds.
    pub fn from_profile_json(json: &str) -> Result<Self, ConfigError> {
        let document: ProfileDocument = serde_json::from_str(json)?;
        let Some(target) = document.target else {
            return Ok(Self::default());
        };

        let range = |key: &str| {
            target
                .get(key)
                .map(|t| CountRange::new(t.range[0], t.range[1]))
        };

        let defaults = Self::default();
        let bounds = Self {
            total_lines: range("total_lines_per_ep"),
            dialogue_lines: range("dialogue_lines_per_ep"),
            action_lines: range("stage_lines_per_ep"),
            voiceover_lines: range("vo_os_lines_per_ep"),
            scenes: range("scenes_per_ep"),
            dialogue_ratio: defaults.dialogue_ratio,
            action_ratio: defaults.action_ratio,
        };
        bounds.check()?;
        Ok(bounds)
    }

    /// Reject inverted or out-of-domain ranges.
    pub fn check(&self) -> Result<(), ConfigError> {
        let counts = [
            ("style.total_lines", self.total_lines),
            ("style.dialogue_lines", self.dialogue_lines),
            ("style.action_lines", self.action_lines),
            ("style.voiceover_lines", self.voiceover_lines),
            ("style.scenes", self.scenes),
        ];
        for (field, range) in counts {
            if let Some(range) = range {
                if range.min > range.max {
                    return Err(ConfigError::invalid(
                        field,
                        format!("min {} is greater than max {}", range.min, range.max),
                    ));
                }
            }
        }

        let ratios = [
            ("style.dialogue_ratio", self.dialogue_ratio),
            ("style.action_ratio", self.action_ratio),
        ];
        for (field, range) in ratios {
            if let Some(range) = range {
                if !(0.0..=1.0).contains(&range.min)
                    || !(0.0..=1.0).contains(&range.max)
                    || range.min > range.max
                {
                    return Err(ConfigError::invalid(
                        field,
                        format!("{} is not a sub-range of [0, 1]", range),
                    ));
                }
            }
        }

        Ok(())
    }
}
