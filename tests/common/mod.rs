/*!
 * Common test utilities for the scriptreview test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use scriptreview::validation::{CountRange, StyleBounds};

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Route library logs to the test output
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A well-formed episode: 2 scenes, 12 dialogue, 10 action and 3 voiceover lines
pub fn sample_episode(episode: u32) -> String {
    format!(
        "第{episode}集
{episode}-1场  医院走廊  日  内
人物：林晚、顾沉
▲林晚推门而入，雨水顺着发梢滴落。
林晚：你终于来了。
顾沉：我一直都在。
▲顾沉把伞递过去。
林晚：我不需要你的伞。
林晚（VO）：那一年，我以为他会留下。
顾沉：你还在恨我？
▲林晚攥紧病历单。
林晚：恨？你不配。
▲走廊尽头传来脚步声。
护士：林小姐，检查结果出来了。
▲林晚接过报告，脸色骤变。

{episode}-2场  医院天台  夜  外
人物：林晚、顾沉
▲风很大，林晚站在栏杆边。
顾沉：下来，我们好好谈。
林晚（OS）：如果时间能倒流就好了。
林晚：谈什么？谈你怎么骗我？
▲顾沉一步步靠近。
顾沉：报告是假的。
林晚：你说什么？
▲林晚愣住。
VO：三天前，有人调换了报告。
顾沉：相信我一次。
▲林晚缓缓伸出手。
林晚：最后一次。
▲两人相视一笑。
【切】"
    )
}

/// The sample episode with its title line removed
pub fn untitled_episode() -> String {
    sample_episode(1).replacen("第1集\n", "", 1)
}

/// A draft that breaks several format rules
pub fn malformed_episode() -> String {
    "第1集
1-1场 医院走廊
▲林晚推门而入。
林晚:你终于来了。
【黑屏】"
        .to_string()
}

/// Bounds matching the reference style profile
pub fn reference_bounds() -> StyleBounds {
    StyleBounds {
        total_lines: Some(CountRange::new(22, 38)),
        dialogue_lines: Some(CountRange::new(10, 20)),
        action_lines: Some(CountRange::new(8, 20)),
        voiceover_lines: Some(CountRange::new(0, 6)),
        scenes: Some(CountRange::new(1, 3)),
        ..StyleBounds::default()
    }
}
