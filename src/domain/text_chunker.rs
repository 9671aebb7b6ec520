//! 文本分块器
//!
//! 按句末标点把长文本切成不超过 `max_length` 字符的块，保证每次送入模型的
//! 文本都是完整的句子。
//!
//! 已知限制：单个句子本身超过 `max_length` 时不再继续切分，整句作为一个
//! 超长块输出（不做硬截断）。

/// 默认最大块长度（字符数）
pub const DEFAULT_MAX_CHUNK_LENGTH: usize = 200;

/// 检查是否为句末标点
#[inline]
fn is_terminal_punctuation(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?')
}

/// 按句末标点拆分句子
///
/// 只有 `.` `!` `?` 后面紧跟空白时才拆分；标点和其后的整段空白都保留在
/// 前一个句子末尾，拼接所有句子可以还原原文。
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut iter = text.char_indices().peekable();

    while let Some((_, ch)) = iter.next() {
        if !is_terminal_punctuation(ch) {
            continue;
        }
        match iter.peek() {
            Some(&(_, next)) if next.is_whitespace() => {}
            _ => continue,
        }

        // 吞掉标点后的整段空白
        let mut end = text.len();
        while let Some(&(idx, next)) = iter.peek() {
            if next.is_whitespace() {
                iter.next();
            } else {
                end = idx;
                break;
            }
        }

        sentences.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }

    sentences
}

/// 对文本进行分块
///
/// 分块策略：
/// 1. 文本长度不超过 `max_length` 时原样返回
/// 2. 按句末标点拆成句子
/// 3. 贪心累积句子，追加下一句会超过 `max_length` 时先输出当前缓冲
pub fn chunk_text(text: &str, max_length: usize) -> Vec<String> {
    if text.chars().count() <= max_length {
        return vec![text.to_string()];
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut buffer = String::new();
    let mut buffer_len = 0;

    for sentence in split_sentences(text) {
        let sentence_len = sentence.chars().count();

        if buffer_len + sentence_len > max_length && !buffer.is_empty() {
            let trimmed = buffer.trim();
            if !trimmed.is_empty() {
                chunks.push(trimmed.to_string());
            }
            buffer.clear();
            buffer_len = 0;
        }

        buffer.push_str(sentence);
        buffer_len += sentence_len;
    }

    let trimmed = buffer.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }

    chunks
}
