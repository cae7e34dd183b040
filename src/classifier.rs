//! Intent classifier - bag-of-patterns scoring of inbound text

use crate::types::Intent;
use regex::Regex;

/// Stateless pattern-count classifier
///
/// Each intent owns an ordered set of regex phrasings (command tokens and
/// Japanese/English verb constructions). The score of an intent is the
/// total number of non-overlapping matches across its patterns; the
/// highest score wins. All-zero scores and tied maxima fall back to ADD,
/// which downstream confidence weighting relies on.
pub struct IntentClassifier {
    patterns: Vec<(Intent, Vec<Regex>)>,
    delete_keywords: Vec<Regex>,
    complete_keywords: Vec<Regex>,
}

impl IntentClassifier {
    pub fn new() -> Self {
        let table: &[(Intent, &[&str])] = &[
            (
                Intent::Add,
                &[
                    r"(?:todo\s+)?(?:add|追加|作成|登録)",
                    r"(?:〜|を)(?:やる|する|作る|制作)",
                    r"(?:までに|まで).*(?:やる|する|完了)",
                    r"アサインして",
                    r"お願い",
                    r"忘れずに",
                    r"リマインド",
                ],
            ),
            (
                Intent::List,
                &[
                    r"(?:todo\s+)?(?:list|一覧|リスト)",
                    r"(?:show|見せて|表示)",
                    r"何がある",
                    r"タスク.*出して",
                ],
            ),
            (
                Intent::Complete,
                &[
                    r"(?:todo\s+)?(?:done|完了|終了|済)",
                    r"(?:finish|終わった|できた)",
                    r"やった|おわり|完成|終えて",
                    r"チェック",
                ],
            ),
            (
                Intent::Update,
                &[
                    r"(?:todo\s+)?(?:update|更新|修正|変更)",
                    r"優先度.*(?:変更|更新)",
                    r"期日.*(?:変更|更新)",
                    r"タグ.*(?:追加|変更)",
                ],
            ),
            (
                Intent::Delete,
                &[
                    r"(?:todo\s+)?(?:delete|削除|消去)",
                    r"(?:remove|取り消し)",
                    r"消(?:す|して|しといて)|けし(?:て|といて)",
                    r"いらない|不要|キャンセル",
                    r"なくして",
                ],
            ),
            (
                Intent::Find,
                &[
                    r"(?:todo\s+)?(?:find|検索|探して)",
                    r"(?:どこ|何だっけ)",
                    r"見つけて",
                ],
            ),
            (
                Intent::Postpone,
                &[
                    r"postpone|延期",
                    r"(?:後で|あとで)",
                    r"(?:来週|来月|明日).*(?:に|へ).*(?:変更|移動)",
                ],
            ),
        ];

        let patterns = table
            .iter()
            .map(|(intent, pats)| {
                let compiled = pats
                    .iter()
                    .map(|p| Regex::new(p).expect("Invalid intent pattern"))
                    .collect();
                (*intent, compiled)
            })
            .collect();

        // Stronger keyword sets used by the bulk index path
        let delete_keywords = [
            r"削除|消す|けす|消して|消しといて|消去|remove|delete",
            r"削っ?といて|けしといて",
            r"いらない|不要",
            r"取り消し|キャンセル",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("Invalid delete keyword pattern"))
        .collect();

        let complete_keywords = [
            r"完了|done|チェック|済み|済ま|終わり|終わった|終えて|finished",
            r"やった|できた|おわり",
            r"済んだ|すんだ",
            r"終了|完成",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("Invalid complete keyword pattern"))
        .collect();

        Self {
            patterns,
            delete_keywords,
            complete_keywords,
        }
    }

    /// Classify raw text into exactly one intent
    pub fn classify(&self, text: &str) -> Intent {
        self.classify_scored(text).0
    }

    /// Classify and report the winning match count
    ///
    /// A zero count means the ADD result is a default, not a match; the
    /// dispatcher discounts confidence on that path.
    pub fn classify_scored(&self, text: &str) -> (Intent, usize) {
        let text_lower = text.to_lowercase();

        let scores: Vec<(Intent, usize)> = self
            .patterns
            .iter()
            .map(|(intent, pats)| {
                let score = pats
                    .iter()
                    .map(|p| p.find_iter(&text_lower).count())
                    .sum();
                (*intent, score)
            })
            .collect();

        let best = scores.iter().map(|(_, s)| *s).max().unwrap_or(0);
        if best == 0 {
            return (Intent::Add, 0);
        }

        let mut leaders = scores.iter().filter(|(_, s)| *s == best);
        let first = leaders.next().map(|(i, _)| *i).unwrap_or(Intent::Add);
        if leaders.next().is_some() {
            // Tied maximum: ambiguous phrasing, treat as ADD
            return (Intent::Add, best);
        }

        (first, best)
    }

    /// True when the text carries a delete keyword (bulk path)
    pub fn has_delete_keyword(&self, text: &str) -> bool {
        let text_lower = text.to_lowercase();
        self.delete_keywords.iter().any(|p| p.is_match(&text_lower))
    }

    /// True when the text carries a completion keyword (bulk path)
    pub fn has_complete_keyword(&self, text: &str) -> bool {
        let text_lower = text.to_lowercase();
        self.complete_keywords
            .iter()
            .any(|p| p.is_match(&text_lower))
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_tokens() {
        let classifier = IntentClassifier::new();
        assert_eq!(classifier.classify("todo add 資料作成"), Intent::Add);
        assert_eq!(classifier.classify("todo list #CCT"), Intent::List);
        assert_eq!(classifier.classify("todo delete 123"), Intent::Delete);
        assert_eq!(classifier.classify("todo find レポート"), Intent::Find);
        assert_eq!(classifier.classify("優先度をhighに変更"), Intent::Update);
    }

    #[test]
    fn test_japanese_phrasings() {
        let classifier = IntentClassifier::new();
        assert_eq!(classifier.classify("タスク一覧を見せて"), Intent::List);
        assert_eq!(classifier.classify("「ロンT制作」完了"), Intent::Complete);
        assert_eq!(classifier.classify("来週金曜に延期"), Intent::Postpone);
    }

    #[test]
    fn test_no_match_defaults_to_add() {
        let classifier = IntentClassifier::new();
        let (intent, score) = classifier.classify_scored("あ");
        assert_eq!(intent, Intent::Add);
        assert_eq!(score, 0);
    }

    #[test]
    fn test_tie_defaults_to_add() {
        // one LIST match and one COMPLETE match
        let (intent, score) = IntentClassifier::new().classify_scored("list done");
        assert_eq!(intent, Intent::Add);
        assert!(score > 0);
    }

    #[test]
    fn test_casual_delete_and_complete_phrasings() {
        let classifier = IntentClassifier::new();
        assert_eq!(classifier.classify("「ロンT制作」消して"), Intent::Delete);
        assert_eq!(classifier.classify("これいらない"), Intent::Delete);
        assert_eq!(classifier.classify("「ロンT制作」やった"), Intent::Complete);
        assert_eq!(classifier.classify("レポートおわり"), Intent::Complete);
    }

    #[test]
    fn test_bulk_keyword_detectors() {
        let classifier = IntentClassifier::new();
        assert!(classifier.has_delete_keyword("1,3は消しといて"));
        assert!(classifier.has_complete_keyword("2と4完了"));
        assert!(!classifier.has_delete_keyword("資料を作る"));
    }
}
