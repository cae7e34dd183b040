//! Bulk index-list parsing for "delete/complete these numbers" commands

use regex::Regex;
use std::collections::BTreeSet;

/// Upper bound on expanded counts and ranges when no list size is known
const UNBOUNDED_INDEX_CAP: usize = 100;

/// Fold fullwidth digits, letters, and list punctuation to their ASCII
/// forms so one pattern set covers both widths
pub fn normalize_text(text: &str) -> String {
    text.chars().map(fold_char).collect()
}

fn fold_char(c: char) -> char {
    match c {
        '０'..='９' => char::from_u32(c as u32 - '０' as u32 + '0' as u32).unwrap_or(c),
        'ａ'..='ｚ' => char::from_u32(c as u32 - 'ａ' as u32 + 'a' as u32).unwrap_or(c),
        'Ａ'..='Ｚ' => char::from_u32(c as u32 - 'Ａ' as u32 + 'A' as u32).unwrap_or(c),
        '，' | '、' => ',',
        '〜' | '～' | '—' | '–' | '－' => '-',
        '　' => ' ',
        '＃' => '#',
        '＠' => '@',
        '／' => '/',
        '：' => ':',
        '．' => '.',
        _ => c,
    }
}

/// Extracts 1-based index lists from informal phrasing
///
/// Handles comma lists (`1,3,5`), the `と` conjunction (`2と4`), ranges
/// (`1-3`, `1〜3`), all/first/last words, first-N/last-N counts, and
/// `No.`/`id`/`#` markers, in either character width.
pub struct IndexParser {
    marker: Regex,
    digit_conj: Regex,
    all_words: Regex,
    first_word: Regex,
    last_word: Regex,
    first_n: Regex,
    last_n: Regex,
    range: Regex,
    single: Regex,
    segment_tail: Regex,
}

impl IndexParser {
    pub fn new() -> Self {
        let re = |p: &str| Regex::new(p).expect("Invalid index pattern");
        Self {
            marker: re(r"(?i)(?:no\.?|id|#)\s*"),
            digit_conj: re(r"(\d+)\s*と\s*(\d+)"),
            all_words: re(r"(?i)全部|すべて|全て|all"),
            first_word: re(r"(?i)最初|先頭|first"),
            last_word: re(r"(?i)最後|last"),
            first_n: re(r"(?i)(?:上から|最初の|first\s+)(\d+)(?:個|つ|件)?"),
            last_n: re(r"(?i)(?:下から|最後の|last\s+)(\d+)(?:個|つ|件)?"),
            range: re(r"(\d+)\s*[-－〜～]\s*(\d+)"),
            single: re(r"^\d+$"),
            // command words glued onto the last number ("5は消しといて",
            // "4完了") are cut off before the digit check
            segment_tail: re(
                r"(?:は|を)?\s*(?:完了|済み?|チェック|終わ\S*|終了|完成|できた|やった|おわり|消\S*|けし\S*|削除|削\S*|消去|取り消し|キャンセル|いらない|不要|done|finished|delete|remove).*$",
            ),
        }
    }

    /// True when the text asks for every listed task
    pub fn mentions_all(&self, text: &str) -> bool {
        self.all_words.is_match(&normalize_text(text).to_lowercase())
    }

    /// Parse an index list, bounded by the size of the last rendered list
    /// when known; returned sorted and deduplicated
    pub fn parse(&self, text: &str, max_index: Option<usize>) -> Vec<usize> {
        let text = normalize_text(text).to_lowercase();
        let text = self.marker.replace_all(&text, "");
        let text = self.digit_conj.replace_all(&text, "$1,$2");
        let text = text.replace('と', ",");

        let mut indices: BTreeSet<usize> = BTreeSet::new();

        if self.all_words.is_match(&text) {
            return match max_index {
                Some(max) if max > 0 => (1..=max).collect(),
                _ => Vec::new(),
            };
        }

        if self.first_word.is_match(&text) {
            indices.insert(1);
        }
        if self.last_word.is_match(&text) {
            if let Some(max) = max_index {
                indices.insert(max);
            }
        }

        if let Some(cap) = self.first_n.captures(&text) {
            if let Some(n) = cap.get(1).and_then(|m| m.as_str().parse::<usize>().ok()) {
                let upper = max_index.map_or(n.min(UNBOUNDED_INDEX_CAP), |max| n.min(max));
                indices.extend(1..=upper);
            }
        }
        if let (Some(cap), Some(max)) = (self.last_n.captures(&text), max_index) {
            if let Some(n) = cap.get(1).and_then(|m| m.as_str().parse::<usize>().ok()) {
                indices.extend(max.saturating_sub(n.saturating_sub(1)).max(1)..=max);
            }
        }

        for cap in self.range.captures_iter(&text) {
            let bounds = cap
                .get(1)
                .zip(cap.get(2))
                .and_then(|(a, b)| Some((a.as_str().parse().ok()?, b.as_str().parse().ok()?)));
            if let Some((a, b)) = bounds {
                let (start, end): (usize, usize) = if a > b { (b, a) } else { (a, b) };
                for i in start..=end.min(max_index.unwrap_or(UNBOUNDED_INDEX_CAP)) {
                    if max_index.map_or(true, |max| i <= max) {
                        indices.insert(i);
                    }
                }
            }
        }

        // plain comma-separated numbers, with range spans removed first
        let without_ranges = self.range.replace_all(&text, "");
        for segment in without_ranges.split(',') {
            let segment = self.segment_tail.replace(segment.trim(), "");
            let segment = segment.trim();
            if self.single.is_match(segment) {
                if let Ok(n) = segment.parse::<usize>() {
                    if n > 0 && max_index.map_or(true, |max| n <= max) {
                        indices.insert(n);
                    }
                }
            }
        }

        indices.into_iter().filter(|n| *n > 0).collect()
    }
}

impl Default for IndexParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comma_list() {
        let parser = IndexParser::new();
        assert_eq!(parser.parse("1,3,5は消しといて", None), vec![1, 3, 5]);
    }

    #[test]
    fn test_conjunction() {
        let parser = IndexParser::new();
        assert_eq!(parser.parse("2と4完了", None), vec![2, 4]);
    }

    #[test]
    fn test_ranges() {
        let parser = IndexParser::new();
        assert_eq!(parser.parse("1-3削除", None), vec![1, 2, 3]);
        assert_eq!(parser.parse("1〜3", None), vec![1, 2, 3]);
        assert_eq!(parser.parse("3-1", None), vec![1, 2, 3]);
    }

    #[test]
    fn test_fullwidth_digits() {
        let parser = IndexParser::new();
        assert_eq!(parser.parse("１，３ 完了", None), vec![1, 3]);
    }

    #[test]
    fn test_all_requires_known_bound() {
        let parser = IndexParser::new();
        assert_eq!(parser.parse("全部消して", Some(4)), vec![1, 2, 3, 4]);
        assert!(parser.parse("全部消して", None).is_empty());
        assert!(parser.mentions_all("全部消して"));
    }

    #[test]
    fn test_first_n_and_last_n() {
        let parser = IndexParser::new();
        assert_eq!(parser.parse("上から3つ消して", Some(5)), vec![1, 2, 3]);
        assert_eq!(parser.parse("下から2個完了", Some(5)), vec![4, 5]);
        assert_eq!(parser.parse("最初のやつ", None), vec![1]);
    }

    #[test]
    fn test_markers_stripped() {
        let parser = IndexParser::new();
        assert_eq!(parser.parse("No.2とNo.4", None), vec![2, 4]);
    }

    #[test]
    fn test_out_of_range_dropped() {
        let parser = IndexParser::new();
        assert!(parser.parse("5削除", Some(3)).is_empty());
    }
}
