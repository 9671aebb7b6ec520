//! 批量脚本解析
//!
//! 脚本是普通文本，用单独成行的 `[MARKER]` 分隔各段：
//!
//! ```text
//! [INTRO]
//! Welcome to the show.
//!
//! [OUTRO]
//! See you next time.
//! ```
//!
//! 每个非空段落对应一个输出音频文件。

use std::collections::{HashMap, HashSet};

use serde::Serialize;

/// 脚本片段
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptSegment {
    /// 段落标记（方括号内的文本）
    pub marker: String,
    /// 段落文本（已去除首尾空白，非空）
    pub text: String,
    /// 输出文件名
    pub output_filename: String,
}

impl ScriptSegment {
    pub fn new(marker: impl Into<String>, text: impl Into<String>) -> Self {
        let marker = marker.into();
        let output_filename = output_filename_for(&marker);
        Self {
            marker,
            text: text.into(),
            output_filename,
        }
    }
}

/// 由标记生成输出文件名
///
/// 转小写，非 ASCII 字母/数字/下划线的字符替换为 `_`，追加 `.wav`
///
/// 字符集与 `ProfileId::from_name` 相同
pub fn output_filename_for(marker: &str) -> String {
    let stem: String = marker
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    format!("{}.wav", stem)
}

/// 识别标记行，返回方括号内的标记
fn parse_marker(line: &str) -> Option<&str> {
    let inner = line.trim().strip_prefix('[')?.strip_suffix(']')?;
    if inner.is_empty() || inner.contains(']') {
        return None;
    }
    Some(inner)
}

/// 解析脚本文档
///
/// - 第一个标记之前的文本被丢弃
/// - 标记之后直到下一个标记（或文档结尾）的所有行拼接为该段文本
/// - 文本为空的段落被丢弃
pub fn parse_script(document: &str) -> Vec<ScriptSegment> {
    let mut segments = Vec::new();
    let mut current: Option<(&str, Vec<&str>)> = None;

    for line in document.lines() {
        if let Some(marker) = parse_marker(line) {
            if let Some((marker, lines)) = current.take() {
                push_segment(&mut segments, marker, &lines);
            }
            current = Some((marker, Vec::new()));
        } else if let Some((_, lines)) = current.as_mut() {
            lines.push(line);
        }
    }

    if let Some((marker, lines)) = current.take() {
        push_segment(&mut segments, marker, &lines);
    }

    segments
}

fn push_segment(segments: &mut Vec<ScriptSegment>, marker: &str, lines: &[&str]) {
    let text = lines.join("\n");
    let text = text.trim();
    if text.is_empty() {
        tracing::debug!(marker = %marker, "Dropping empty script segment");
        return;
    }
    segments.push(ScriptSegment::new(marker, text));
}

/// 为重复的输出文件名追加 `_2`、`_3` 后缀
///
/// 第一次出现的文件名保持不变；后缀跳过本批次中已分配的名称，
/// 保证所有输出文件名互不相同
pub fn disambiguate_filenames(segments: &mut [ScriptSegment]) {
    let mut assigned: HashSet<String> = HashSet::new();
    let mut next_suffix: HashMap<String, usize> = HashMap::new();

    for segment in segments.iter_mut() {
        if assigned.insert(segment.output_filename.clone()) {
            continue;
        }

        let stem = segment
            .output_filename
            .strip_suffix(".wav")
            .unwrap_or(&segment.output_filename)
            .to_string();
        let counter = next_suffix.entry(stem.clone()).or_insert(2);
        let mut candidate = format!("{}_{}.wav", stem, counter);
        while assigned.contains(&candidate) {
            *counter += 1;
            candidate = format!("{}_{}.wav", stem, counter);
        }
        *counter += 1;

        assigned.insert(candidate.clone());
        segment.output_filename = candidate;
    }
}
