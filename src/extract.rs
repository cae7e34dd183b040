//! Slot extraction primitives shared by the per-intent routines

use crate::error::NluError;
use crate::types::{ErrorInfo, ListFilters, Priority, Status, TaskRef};
use ahash::AHashSet;
use regex::Regex;

/// Title length bounds after stripping command tokens
const TITLE_MIN_CHARS: usize = 2;
const TITLE_MAX_CHARS: usize = 100;

/// Compiled pattern set for pulling structured slots out of free text
pub struct SlotExtractor {
    quoted: Regex,
    command_prefix: Regex,
    temporal_strip: Regex,
    priority_strip: Regex,
    assign_strip: Regex,
    priority_patterns: Vec<(Priority, Regex)>,
    tag: Regex,
    mention: Regex,
    self_ref: Regex,
    assign_to_me: Regex,
    id_marker: Regex,
    ref_stopword: Regex,
    status_open: Regex,
    status_done: Regex,
    filter_today: Regex,
    filter_this_week: Regex,
    filter_overdue: Regex,
    find_prefix: Regex,
    update_priority_kw: Regex,
    update_due_kw: Regex,
    update_tag_kw: Regex,
}

impl SlotExtractor {
    pub fn new() -> Self {
        let re = |p: &str| Regex::new(p).expect("Invalid slot pattern");
        Self {
            quoted: re(r"[「『]([^」』]+)[」』]"),
            command_prefix: re(r"(?i)^(?:todo\s+)?(?:add\s+)?"),
            temporal_strip: re(
                r"(?:明後日|明日|再来週|来週|今週|再来月|来月|今月|今夜|今日|深夜|夕方|昼|夜|朝|\d{1,2}時半|\d{1,2}時(?:\d{1,2}分)?|\d{1,2}:\d{2}|\d{1,2}/\d{1,2}|\d+日後|day\s+after\s+tomorrow|tomorrow|today|tonight|next\s+week|next\s+month|in\s+\d+\s+days?|までに|まで)",
            ),
            priority_strip: re(
                r"(?:urgent|high|normal|low|緊急|至急|最優先|なるはや|重要|優先|急ぎ|後回し|普通|通常|高|低)",
            ),
            assign_strip: re(r"(?:私|自分|俺)?(?:に|へ)アサイン(?:して)?"),
            priority_patterns: vec![
                (Priority::Urgent, re(r"(?:urgent|緊急|至急|最優先|なるはや)")),
                (Priority::High, re(r"(?:high|高|重要|優先|急ぎ)")),
                (Priority::Normal, re(r"(?:normal|普通|通常)")),
                (Priority::Low, re(r"(?:low|低|後回し)")),
            ],
            tag: re(r"#([0-9A-Za-z_\x{3040}-\x{309F}\x{30A0}-\x{30FF}\x{4E00}-\x{9FAF}]+)"),
            mention: re(r"@([A-Za-z0-9_]+)"),
            self_ref: re(r"(?:私|自分|俺)(?:に|へ)"),
            assign_to_me: re(r"アサインして"),
            id_marker: re(r"(?:id|ID|#)(\d+)"),
            ref_stopword: re(r"^(?:todo|done|完了|削除|delete)"),
            status_open: re(r"未完了|open|進行中"),
            status_done: re(r"完了|done|済"),
            filter_today: re(r"今日|today"),
            filter_this_week: re(r"今週|this\s+week"),
            filter_overdue: re(r"期限.*(?:切れ|過ぎ)|overdue"),
            find_prefix: re(r"(?i)^.*(?:find|検索|探して)\s*"),
            update_priority_kw: re(r"優先度.*(?:to|を|に)|priority"),
            update_due_kw: re(r"(?:期日|締切|due).*(?:to|を|に)"),
            update_tag_kw: re(r"タグ.*追加|add\s+tags?"),
        }
    }

    /// Extract a task title: bracket-quoted text wins, else the remainder
    /// after stripping command, temporal, priority, tag, and mention
    /// tokens; fewer than 2 chars left means no title
    pub fn extract_title(&self, text: &str) -> Option<String> {
        if let Some(cap) = self.quoted.captures(text) {
            return cap.get(1).map(|m| m.as_str().trim().to_string());
        }

        let stripped = self.command_prefix.replace(text, "");
        let stripped = self.temporal_strip.replace_all(&stripped, "");
        let stripped = self.priority_strip.replace_all(&stripped, "");
        let stripped = self.tag.replace_all(&stripped, "");
        let stripped = self.mention.replace_all(&stripped, "");
        let stripped = self.assign_strip.replace_all(&stripped, "");

        let title = stripped.trim();
        if title.chars().count() < TITLE_MIN_CHARS {
            return None;
        }
        Some(title.chars().take(TITLE_MAX_CHARS).collect())
    }

    /// First matching priority keyword, or None when absent
    pub fn extract_priority(&self, text: &str) -> Option<Priority> {
        let text_lower = text.to_lowercase();
        self.priority_patterns
            .iter()
            .find(|(_, pattern)| pattern.is_match(&text_lower))
            .map(|(priority, _)| *priority)
    }

    /// Hash-prefixed tag tokens in order of appearance, deduplicated
    pub fn extract_tags(&self, text: &str) -> Vec<String> {
        let mut seen = AHashSet::new();
        self.tag
            .captures_iter(text)
            .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
            .filter(|tag| seen.insert(tag.clone()))
            .collect()
    }

    /// Mentioned users plus self-references, deduplicated
    pub fn extract_assignees(&self, text: &str, acting_user: &str) -> Vec<String> {
        let mut seen = AHashSet::new();
        let mut assignees: Vec<String> = self
            .mention
            .captures_iter(text)
            .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
            .filter(|user| seen.insert(user.clone()))
            .collect();

        if self.self_ref.is_match(text) && seen.insert(acting_user.to_string()) {
            assignees.push(acting_user.to_string());
        }

        // bare "assign this to me" with nobody else named
        if assignees.is_empty() && self.assign_to_me.is_match(text) {
            assignees.push(acting_user.to_string());
        }

        assignees
    }

    /// Resolve which existing task the text refers to
    ///
    /// Tries an explicit id marker, then a quoted title fragment, then the
    /// remaining significant words; each step has a fixed confidence. An
    /// id literal too large for a task id is an internal fault.
    pub fn extract_task_ref(&self, text: &str) -> Result<(f64, TaskRef, Option<ErrorInfo>), NluError> {
        if let Some(id_literal) = self.id_marker.captures(text).and_then(|cap| cap.get(1)) {
            let id = id_literal
                .as_str()
                .parse()
                .map_err(|_| NluError::BadCapture("task id out of range"))?;
            let reference = TaskRef {
                task_id: Some(id),
                ..TaskRef::default()
            };
            return Ok((0.9, reference, None));
        }

        if let Some(quoted) = self.quoted.captures(text).and_then(|cap| cap.get(1)) {
            let reference = TaskRef {
                title_query: Some(quoted.as_str().to_string()),
                ..TaskRef::default()
            };
            return Ok((0.8, reference, None));
        }

        let keywords: Vec<String> = text
            .split_whitespace()
            .filter(|w| w.chars().count() > 1 && !self.ref_stopword.is_match(&w.to_lowercase()))
            .map(|w| w.to_string())
            .collect();
        if !keywords.is_empty() {
            let reference = TaskRef {
                keywords,
                ..TaskRef::default()
            };
            return Ok((0.6, reference, None));
        }

        let error = ErrorInfo::missing_info(
            "どのタスクか特定できません",
            "タスクID（#123）またはタイトル（「ロンT制作」）を指定してください",
        );
        Ok((0.2, TaskRef::default(), Some(error)))
    }

    /// Filters carried by a LIST command
    pub fn extract_list_filters(&self, text: &str) -> ListFilters {
        let mut filters = ListFilters::default();

        if self.status_open.is_match(text) {
            filters.status = Some(Status::Open);
        } else if self.status_done.is_match(text) {
            filters.status = Some(Status::Done);
        }

        filters.priority = self.extract_priority(text);
        filters.tags = self.extract_tags(text);

        if self.filter_today.is_match(text) {
            filters.today = true;
        } else if self.filter_this_week.is_match(text) {
            filters.this_week = true;
        } else if self.filter_overdue.is_match(text) {
            filters.overdue = true;
        }

        filters
    }

    /// Search text for FIND: quoted fragment, else whatever follows the
    /// search command word
    pub fn extract_search_query(&self, text: &str) -> String {
        if let Some(cap) = self.quoted.captures(text).and_then(|c| c.get(1)) {
            return cap.as_str().to_string();
        }
        self.find_prefix.replace(text, "").trim().to_string()
    }

    pub fn wants_priority_update(&self, text: &str) -> bool {
        self.update_priority_kw.is_match(&text.to_lowercase())
    }

    pub fn wants_due_update(&self, text: &str) -> bool {
        self.update_due_kw.is_match(&text.to_lowercase())
    }

    pub fn wants_tag_update(&self, text: &str) -> bool {
        self.update_tag_kw.is_match(&text.to_lowercase())
    }
}

impl Default for SlotExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_title_wins() {
        let extractor = SlotExtractor::new();
        let title = extractor
            .extract_title("todo add 「ロンT制作」 明日18時 high #CCT")
            .unwrap();
        assert_eq!(title, "ロンT制作");
    }

    #[test]
    fn test_double_bracket_quoted_title() {
        let extractor = SlotExtractor::new();
        let title = extractor
            .extract_title("todo add 『ロンT制作』 明日18時")
            .unwrap();
        assert_eq!(title, "ロンT制作");

        let (confidence, reference, _) = extractor.extract_task_ref("『ロンT制作』完了").unwrap();
        assert_eq!(confidence, 0.8);
        assert_eq!(reference.title_query.as_deref(), Some("ロンT制作"));
    }

    #[test]
    fn test_stripped_title() {
        let extractor = SlotExtractor::new();
        let title = extractor
            .extract_title("todo add ミーティング資料 明日18時 #work @kohei")
            .unwrap();
        assert_eq!(title, "ミーティング資料");
    }

    #[test]
    fn test_short_title_rejected() {
        let extractor = SlotExtractor::new();
        assert!(extractor.extract_title("あ").is_none());
        assert!(extractor.extract_title("todo add 明日18時").is_none());
    }

    #[test]
    fn test_title_capped_at_100_chars() {
        let extractor = SlotExtractor::new();
        let long = "あ".repeat(150);
        let title = extractor.extract_title(&long).unwrap();
        assert_eq!(title.chars().count(), 100);
    }

    #[test]
    fn test_priority_first_match_wins() {
        let extractor = SlotExtractor::new();
        assert_eq!(extractor.extract_priority("これは緊急でhigh"), Some(Priority::Urgent));
        assert_eq!(extractor.extract_priority("high #work"), Some(Priority::High));
        assert_eq!(extractor.extract_priority("後回しでいい"), Some(Priority::Low));
        assert_eq!(extractor.extract_priority("資料作成"), None);
    }

    #[test]
    fn test_casual_priority_synonyms() {
        let extractor = SlotExtractor::new();
        assert_eq!(extractor.extract_priority("なるはやでお願い"), Some(Priority::Urgent));
        assert_eq!(extractor.extract_priority("急ぎの仕事"), Some(Priority::High));
    }

    #[test]
    fn test_tags_bilingual() {
        let extractor = SlotExtractor::new();
        let tags = extractor.extract_tags("#work #仕事 #work");
        assert_eq!(tags, vec!["work", "仕事"]);
    }

    #[test]
    fn test_assignees_mentions_and_self() {
        let extractor = SlotExtractor::new();
        let assignees = extractor.extract_assignees("@kohei @suzune 私にアサインして", "user123");
        assert_eq!(assignees, vec!["kohei", "suzune", "user123"]);
    }

    #[test]
    fn test_casual_self_reference() {
        let extractor = SlotExtractor::new();
        let assignees = extractor.extract_assignees("俺にアサインして", "user123");
        assert_eq!(assignees, vec!["user123"]);
    }

    #[test]
    fn test_assign_to_me_alone_maps_to_self() {
        let extractor = SlotExtractor::new();
        let assignees = extractor.extract_assignees("ポートレート下描き、アサインして", "user123");
        assert_eq!(assignees, vec!["user123"]);
    }

    #[test]
    fn test_assignees_deduplicated() {
        let extractor = SlotExtractor::new();
        let assignees = extractor.extract_assignees("@kohei @kohei", "user123");
        assert_eq!(assignees, vec!["kohei"]);
    }

    #[test]
    fn test_task_ref_by_id() {
        let extractor = SlotExtractor::new();
        let (confidence, reference, error) = extractor.extract_task_ref("todo done #123").unwrap();
        assert_eq!(confidence, 0.9);
        assert_eq!(reference.task_id, Some(123));
        assert!(error.is_none());
    }

    #[test]
    fn test_task_ref_by_quoted_title() {
        let extractor = SlotExtractor::new();
        let (confidence, reference, error) = extractor.extract_task_ref("「ロンT制作」完了").unwrap();
        assert_eq!(confidence, 0.8);
        assert_eq!(reference.title_query.as_deref(), Some("ロンT制作"));
        assert!(error.is_none());
    }

    #[test]
    fn test_task_ref_by_keywords() {
        let extractor = SlotExtractor::new();
        let (confidence, reference, error) = extractor.extract_task_ref("done レポート 下描き").unwrap();
        assert_eq!(confidence, 0.6);
        assert_eq!(reference.keywords, vec!["レポート", "下描き"]);
        assert!(error.is_none());
    }

    #[test]
    fn test_task_ref_overflowing_id_is_a_fault() {
        let extractor = SlotExtractor::new();
        assert!(extractor
            .extract_task_ref("todo done #99999999999999999999999")
            .is_err());
    }

    #[test]
    fn test_task_ref_missing() {
        let extractor = SlotExtractor::new();
        let (confidence, reference, error) = extractor.extract_task_ref("done").unwrap();
        assert_eq!(confidence, 0.2);
        assert!(reference.is_empty());
        assert_eq!(error.unwrap().kind, crate::types::ErrorKind::MissingInfo);
    }

    #[test]
    fn test_list_filters() {
        let extractor = SlotExtractor::new();
        let filters = extractor.extract_list_filters("todo list #CCT 未完了 今日");
        assert_eq!(filters.status, Some(Status::Open));
        assert_eq!(filters.tags, vec!["CCT"]);
        assert!(filters.today);
        assert!(!filters.this_week);
    }

    #[test]
    fn test_search_query() {
        let extractor = SlotExtractor::new();
        assert_eq!(extractor.extract_search_query("「レポート」を探して"), "レポート");
        assert_eq!(extractor.extract_search_query("todo find レポート"), "レポート");
    }
}
