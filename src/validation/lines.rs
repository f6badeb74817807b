/*!
 * Line classification for episode scripts.
 *
 * Each non-blank line of a script falls into exactly one `LineKind`, decided
 * by its leading tokens and separators:
 *
 * ```text
 * 第1集                          episode title
 * 1-1场  医院走廊  日  内          scene header
 * 人物：林晚、顾沉                 character list
 * ▲林晚推门而入。                  action line
 * 林晚：你终于来了。               dialogue line
 * 林晚（VO）：那一年我十七岁。      voiceover line
 * 【切】                         transition marker
 * ```
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Full-width colon separating speaker and text
pub const FULL_COLON: char = '：';

/// Leading glyph of an action line
pub const ACTION_MARKER: char = '▲';

/// Label that opens a character list
pub const CHARACTER_LIST_LABEL: &str = "人物：";

/// Separator between names in a character list
pub const NAME_SEPARATOR: char = '、';

/// Transition markers a script may use
pub const ALLOWED_TRANSITIONS: [&str; 4] = ["【切】", "【转】", "【闪回】", "【闪出】"];

static EPISODE_TITLE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^第([0-9０-９]+)集$").expect("Invalid episode title regex"));

static SCENE_HEADER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+)-(\d+)场\s+(.+?)\s+(日|夜)\s+(内|外)$")
        .expect("Invalid scene header regex")
});

static SCENE_PREFIX_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+-\d+").expect("Invalid scene prefix regex"));

static TRANSITION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^【[^】]+】$").expect("Invalid transition regex"));

static DIALOGUE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([^▲【\s：][^：]*?)：(.+)$").expect("Invalid dialogue regex")
});

static VOICEOVER_SPEAKER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^A-Za-z])(?:VO|OS)(?:$|[^A-Za-z])").expect("Invalid voiceover regex")
});

static HALF_WIDTH_DIALOGUE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^▲【\s][^:]*:.+").expect("Invalid half-width dialogue regex"));

/// Category of a script line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineKind {
    EpisodeTitle,
    SceneHeader,
    CharacterList,
    ActionLine,
    DialogueLine,
    VoiceoverLine,
    TransitionMarker,
    Unrecognized,
}

impl LineKind {
    /// Whether the line belongs to the episode body (counted in the total)
    /// rather than to its structure.
    pub fn is_body(&self) -> bool {
        !matches!(
            self,
            LineKind::EpisodeTitle | LineKind::SceneHeader | LineKind::CharacterList
        )
    }
}

/// One classified, non-blank line of a script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    /// 1-based line number in the source text
    pub number: usize,
    /// The line with surrounding whitespace removed
    pub text: String,
    /// Its category
    pub kind: LineKind,
}

/// Classify a single line. Blank lines have no category.
pub fn classify_line(line: &str) -> Option<LineKind> {
    let s = line.trim();
    if s.is_empty() {
        return None;
    }

    let kind = if EPISODE_TITLE_REGEX.is_match(s) {
        LineKind::EpisodeTitle
    } else if SCENE_HEADER_REGEX.is_match(s) {
        LineKind::SceneHeader
    } else if s.starts_with(CHARACTER_LIST_LABEL) {
        LineKind::CharacterList
    } else if s.starts_with(ACTION_MARKER) {
        LineKind::ActionLine
    } else if TRANSITION_REGEX.is_match(s) {
        LineKind::TransitionMarker
    } else if let Some(caps) = DIALOGUE_REGEX.captures(s) {
        if VOICEOVER_SPEAKER_REGEX.is_match(&caps[1]) {
            LineKind::VoiceoverLine
        } else {
            LineKind::DialogueLine
        }
    } else {
        LineKind::Unrecognized
    };

    Some(kind)
}

/// Classify every non-blank line of `text`, keeping source line numbers.
pub fn parse_lines(text: &str) -> Vec<ScriptLine> {
    text.lines()
        .enumerate()
        .filter_map(|(idx, raw)| {
            classify_line(raw).map(|kind| ScriptLine {
                number: idx + 1,
                text: raw.trim().to_string(),
                kind,
            })
        })
        .collect()
}

/// Episode number of a title line such as `第12集` or `第１２集`
pub fn episode_number(line: &str) -> Option<u32> {
    let caps = EPISODE_TITLE_REGEX.captures(line.trim())?;
    // Full-width digits map onto ASCII ones
    let digits: String = caps[1]
        .chars()
        .map(|c| match c {
            '０'..='９' => char::from_digit(c as u32 - '０' as u32, 10).unwrap_or(c),
            _ => c,
        })
        .collect();
    digits.parse().ok()
}

/// Whether a line starts like a scene header (`3-2…`), valid or not
pub fn looks_like_scene_header(line: &str) -> bool {
    SCENE_PREFIX_REGEX.is_match(line.trim())
}

/// Whether a transition marker is in the allowed set
pub fn is_allowed_transition(line: &str) -> bool {
    ALLOWED_TRANSITIONS.contains(&line.trim())
}

/// Whether an unrecognized line is a dialogue line written with a half-width colon
pub fn uses_half_width_colon(line: &str) -> bool {
    HALF_WIDTH_DIALOGUE_REGEX.is_match(line.trim())
}

/// Names listed on a character list line
pub fn character_names(line: &str) -> Vec<&str> {
    line.trim()
        .strip_prefix(CHARACTER_LIST_LABEL)
        .map(|names| {
            names
                .split(NAME_SEPARATOR)
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .collect()
        })
        .unwrap_or_default()
}
