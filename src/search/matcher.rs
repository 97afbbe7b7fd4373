//! Matching primitives - pure string functions used by the index / 匹配原语
//!
//! Nothing here knows about pages; thresholds are passed in by the caller.
//! 本模块只处理字符串，阈值由调用方传入。

use regex::Regex;

/// Zero-width and BOM characters stripped from page text / 零宽字符
const INVISIBLE_CHARS: [char; 4] = ['\u{200B}', '\u{200C}', '\u{200D}', '\u{FEFF}'];

/// Split a query on whitespace runs, lowercased / 按空白拆分查询词
pub fn query_words(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect()
}

/// Build a whole-word, case-insensitive pattern for one query word / 构建整词匹配正则
///
/// Special characters are escaped so queries like `(test)` are matched literally.
pub fn word_pattern(word: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(word)))
}

/// Count how many patterns match somewhere in the text / 统计命中的词数
pub fn count_word_matches(patterns: &[Regex], text: &str) -> usize {
    patterns.iter().filter(|p| p.is_match(text)).count()
}

/// Split on single spaces exactly, keeping empty words / 按单个空格拆分
pub fn split_single_spaces(text: &str) -> Vec<String> {
    text.to_lowercase().split(' ').map(str::to_string).collect()
}

/// Number of positions, counted from the start, where both word lists agree
/// 从开头起逐位比较，统计相同位置上相同的词数
pub fn consecutive_word_score(query_words: &[String], title_words: &[String]) -> usize {
    query_words
        .iter()
        .zip(title_words.iter())
        .filter(|(q, t)| q == t)
        .count()
}

/// Split free page text into cleaned candidate lines / 清洗页面正文行
///
/// - split on `\n` (a trailing `\r` is dropped with the trim) / 按换行拆分
/// - strip zero-width characters, trim / 去除零宽字符并裁剪
/// - drop lines shorter than `min_length` characters / 丢弃过短行
pub fn clean_text_lines(text: &str, min_length: usize) -> Vec<String> {
    text.split('\n')
        .map(|line| {
            line.chars()
                .filter(|c| !INVISIBLE_CHARS.contains(c))
                .collect::<String>()
                .trim()
                .to_string()
        })
        .filter(|line| line.chars().count() >= min_length)
        .collect()
}

/// Approximate similarity of `needle` inside `haystack`, in `[0, 1]` / 近似相似度
///
/// Semi-global Levenshtein: the needle is aligned against any substring of the
/// haystack that starts on a word boundary, the best alignment cost is normalized
/// by the needle length. 1.0 means the needle occurs verbatim (case-insensitive).
/// 半全局编辑距离：needle 与 haystack 中任一以词边界开头的子串对齐。
pub fn similarity(needle: &str, haystack: &str) -> f64 {
    let needle: Vec<char> = needle.trim().to_lowercase().chars().collect();
    if needle.is_empty() {
        return 0.0;
    }
    let hay: Vec<char> = haystack.to_lowercase().chars().collect();

    let distance = best_substring_distance(&needle, &hay);
    let score = 1.0 - distance as f64 / needle.len() as f64;
    score.clamp(0.0, 1.0)
}

/// Minimum edit distance of `needle` against word-boundary substrings of `hay`
fn best_substring_distance(needle: &[char], hay: &[char]) -> usize {
    let unreachable = usize::MAX / 2;
    let n = hay.len();

    // Row 0: alignments may only start at word boundaries
    let mut prev: Vec<usize> = (0..=n)
        .map(|j| if is_word_start(hay, j) { 0 } else { unreachable })
        .collect();
    let mut cur = vec![0usize; n + 1];

    for (i, &nc) in needle.iter().enumerate() {
        cur[0] = i + 1;
        for j in 1..=n {
            let cost = if hay[j - 1] == nc { 0 } else { 1 };
            cur[j] = (prev[j - 1] + cost)
                .min(prev[j] + 1)
                .min(cur[j - 1] + 1);
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    prev.into_iter().min().unwrap_or(needle.len()).min(needle.len())
}

/// Position `j` starts a word if it is the first char or follows a non-alphanumeric
fn is_word_start(hay: &[char], j: usize) -> bool {
    j == 0 || !hay[j - 1].is_alphanumeric()
}
