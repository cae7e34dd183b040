//! Parse front door - dispatches classified text to slot extraction

use crate::classifier::IntentClassifier;
use crate::dates::{now_jst, DateResolver};
use crate::error::NluError;
use crate::extract::SlotExtractor;
use crate::indices::IndexParser;
use crate::types::{
    AddTask, Constraints, ErrorInfo, Intent, ParseResult, TaskPayload, TaskUpdates,
};
use chrono::DateTime;
use chrono_tz::Tz;
use tracing::{debug, warn};

/// Confidence below which the caller must ask for confirmation
pub const CONFIRM_THRESHOLD: f64 = 0.7;

/// Discount applied when classification fell through to ADD by default
const FALLBACK_DISCOUNT: f64 = 0.7;

/// Title prefix length used in the dedupe key
const DEDUPE_TITLE_CHARS: usize = 50;

/// Per-call identifiers and optional ambient context
///
/// `now` overrides the captured reference instant (tests, replays);
/// `last_list_count` is the size of the list most recently rendered to
/// this channel, which bounds bulk index commands.
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    pub user_id: &'a str,
    pub channel_id: &'a str,
    pub message_id: &'a str,
    pub last_list_count: Option<usize>,
    pub now: Option<DateTime<Tz>>,
}

impl<'a> ParseContext<'a> {
    pub fn new(user_id: &'a str, channel_id: &'a str, message_id: &'a str) -> Self {
        Self {
            user_id,
            channel_id,
            message_id,
            last_list_count: None,
            now: None,
        }
    }

    pub fn with_now(mut self, now: DateTime<Tz>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn with_last_list_count(mut self, count: usize) -> Self {
        self.last_list_count = Some(count);
        self
    }
}

/// Natural-language task-command parser
///
/// Stateless per call: pattern tables are compiled once here, the
/// reference instant is captured (or injected) per invocation, so one
/// instance serves concurrent callers.
pub struct TodoNlu {
    classifier: IntentClassifier,
    extractor: SlotExtractor,
    resolver: DateResolver,
    indices: IndexParser,
}

impl TodoNlu {
    pub fn new() -> Self {
        Self {
            classifier: IntentClassifier::new(),
            extractor: SlotExtractor::new(),
            resolver: DateResolver::new(),
            indices: IndexParser::new(),
        }
    }

    /// Parse one inbound message into a structured command
    ///
    /// Never fails: internal faults come back as a `parse_error` result
    /// with UNKNOWN intent and zero confidence.
    pub fn parse(&self, text: &str, ctx: ParseContext) -> ParseResult {
        let now = ctx.now.unwrap_or_else(now_jst);
        match self.parse_inner(text, &ctx, now) {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "parse fault recovered");
                ParseResult {
                    intent: Intent::Unknown,
                    task: TaskPayload::Empty {},
                    constraints: Constraints::default(),
                    confidence: 0.0,
                    error: Some(ErrorInfo::parse_error(err)),
                    suggestions: Vec::new(),
                }
            }
        }
    }

    fn parse_inner(
        &self,
        text: &str,
        ctx: &ParseContext,
        now: DateTime<Tz>,
    ) -> Result<ParseResult, NluError> {
        let text = text.trim();

        if let Some(result) = self.parse_bulk(text, ctx) {
            return Ok(result);
        }

        let (classified, score) = self.classifier.classify_scored(text);
        debug!(intent = classified.as_str(), score, "intent classified");

        let mut intent = classified;
        let (confidence, task, error, suggestions) = match classified {
            Intent::Add if score > 0 => self.parse_add(text, ctx, now),
            Intent::List => {
                let filters = self.extractor.extract_list_filters(text);
                (0.9, TaskPayload::List(filters), None, Vec::new())
            }
            Intent::Complete | Intent::Delete => {
                let (confidence, reference, error) = self.extractor.extract_task_ref(text)?;
                (confidence, TaskPayload::Reference { reference }, error, Vec::new())
            }
            Intent::Update => self.parse_update(text, now)?,
            Intent::Find => {
                let query = self.extractor.extract_search_query(text);
                (0.8, TaskPayload::Find { query }, None, Vec::new())
            }
            Intent::Postpone => self.parse_postpone(text, now)?,
            _ => {
                // nothing matched: retry as ADD with reduced certainty
                intent = Intent::Add;
                let (confidence, task, error, suggestions) = self.parse_add(text, ctx, now);
                (confidence * FALLBACK_DISCOUNT, task, error, suggestions)
            }
        };

        let confidence = confidence.clamp(0.0, 1.0);
        let title = match &task {
            TaskPayload::Add(add) => add.title.as_str(),
            _ => "",
        };
        let constraints = Constraints {
            dedupe_key: dedupe_key(title, ctx.user_id, ctx.channel_id),
            confirm_needed: intent == Intent::Delete || confidence < CONFIRM_THRESHOLD,
        };

        Ok(ParseResult {
            intent,
            task,
            constraints,
            confidence,
            error,
            suggestions,
        })
    }

    /// Index-list delete/complete commands bypass the classifier
    fn parse_bulk(&self, text: &str, ctx: &ParseContext) -> Option<ParseResult> {
        let has_delete = self.classifier.has_delete_keyword(text);
        let has_complete = self.classifier.has_complete_keyword(text);
        if !has_delete && !has_complete {
            return None;
        }

        let mentions_indices = !self.indices.parse(text, None).is_empty()
            || (ctx.last_list_count.is_some() && self.indices.mentions_all(text));
        if !mentions_indices {
            return None;
        }

        let indices = self.indices.parse(text, ctx.last_list_count);
        if indices.is_empty() {
            return Some(ParseResult {
                intent: Intent::Unknown,
                task: TaskPayload::Empty {},
                constraints: Constraints::default(),
                confidence: 0.0,
                error: Some(ErrorInfo::invalid_indices(ctx.last_list_count.unwrap_or(0))),
                suggestions: Vec::new(),
            });
        }

        let intent = if has_delete {
            Intent::BulkDelete
        } else {
            Intent::BulkComplete
        };
        let confirm_needed = has_delete
            || indices.len() > 3
            || ctx.last_list_count == Some(indices.len());

        Some(ParseResult {
            intent,
            task: TaskPayload::Bulk {
                target_indices: indices,
            },
            constraints: Constraints {
                dedupe_key: dedupe_key("", ctx.user_id, ctx.channel_id),
                confirm_needed,
            },
            confidence: 0.9,
            error: None,
            suggestions: Vec::new(),
        })
    }

    fn parse_add(
        &self,
        text: &str,
        ctx: &ParseContext,
        now: DateTime<Tz>,
    ) -> (f64, TaskPayload, Option<ErrorInfo>, Vec<String>) {
        let mut task = AddTask::new(ctx.message_id.to_string(), ctx.channel_id.to_string());

        let title = match self.extractor.extract_title(text) {
            Some(title) => title,
            None => {
                let error = ErrorInfo::missing_info(
                    "タスクのタイトルが不足しています",
                    "例: todo 「ロンT制作」 明日18時 #CCT",
                );
                return (0.1, TaskPayload::Add(task), Some(error), Vec::new());
            }
        };
        task.title = title;
        let mut confidence: f64 = 0.5 + 0.3;
        let mut suggestions = Vec::new();

        match self.resolver.resolve(text, now) {
            Some(due) => {
                debug!(due = %due.to_rfc3339(), "due date resolved");
                task.due = Some(due);
                confidence += 0.2;
            }
            None => suggestions = self.resolver.suggest(text, now),
        }

        if let Some(priority) = self.extractor.extract_priority(text) {
            task.priority = priority;
            confidence += 0.1;
        }

        let tags = self.extractor.extract_tags(text);
        if !tags.is_empty() {
            task.tags = tags;
            confidence += 0.1;
        }

        let assignees = self.extractor.extract_assignees(text, ctx.user_id);
        if !assignees.is_empty() {
            task.assignees = assignees;
            confidence += 0.1;
        }

        (confidence.min(1.0), TaskPayload::Add(task), None, suggestions)
    }

    fn parse_update(
        &self,
        text: &str,
        now: DateTime<Tz>,
    ) -> Result<(f64, TaskPayload, Option<ErrorInfo>, Vec<String>), NluError> {
        let (ref_confidence, reference, ref_error) = self.extractor.extract_task_ref(text)?;
        if let Some(error) = ref_error {
            let task = TaskPayload::Update {
                reference,
                updates: TaskUpdates::default(),
            };
            return Ok((0.2, task, Some(error), Vec::new()));
        }

        let mut confidence = 0.5 + ref_confidence * 0.5;
        let mut updates = TaskUpdates::default();

        if self.extractor.wants_priority_update(text) {
            if let Some(priority) = self.extractor.extract_priority(text) {
                updates.priority = Some(priority);
                confidence += 0.2;
            }
        }
        if self.extractor.wants_due_update(text) {
            if let Some(due) = self.resolver.resolve(text, now) {
                updates.due = Some(due);
                confidence += 0.2;
            }
        }
        if self.extractor.wants_tag_update(text) {
            // an id marker like #12 also looks like a tag
            let tags: Vec<String> = self
                .extractor
                .extract_tags(text)
                .into_iter()
                .filter(|tag| reference.task_id.map_or(true, |id| *tag != id.to_string()))
                .collect();
            if !tags.is_empty() {
                updates.add_tags = tags;
                confidence += 0.2;
            }
        }

        if updates.is_empty() {
            let error = ErrorInfo::missing_info(
                "何を更新するか不明です",
                "優先度、期日、タグのいずれかを指定してください",
            );
            let task = TaskPayload::Update { reference, updates };
            return Ok((0.3, task, Some(error), Vec::new()));
        }

        let task = TaskPayload::Update { reference, updates };
        Ok((confidence.min(1.0), task, None, Vec::new()))
    }

    fn parse_postpone(
        &self,
        text: &str,
        now: DateTime<Tz>,
    ) -> Result<(f64, TaskPayload, Option<ErrorInfo>, Vec<String>), NluError> {
        let (ref_confidence, reference, ref_error) = self.extractor.extract_task_ref(text)?;
        if let Some(error) = ref_error {
            let task = TaskPayload::Postpone {
                reference,
                due: None,
            };
            return Ok((0.2, task, Some(error), Vec::new()));
        }

        let mut confidence = ref_confidence;
        let mut suggestions = Vec::new();
        let due = self.resolver.resolve(text, now);
        if due.is_some() {
            confidence += 0.2;
        } else {
            suggestions = self.resolver.suggest(text, now);
        }

        let task = TaskPayload::Postpone { reference, due };
        Ok((confidence.min(1.0), task, None, suggestions))
    }
}

impl Default for TodoNlu {
    fn default() -> Self {
        Self::new()
    }
}

/// Pure function of (title, actor, channel); the task store uses it to
/// reject duplicate creation
fn dedupe_key(title: &str, user_id: &str, channel_id: &str) -> String {
    let prefix: String = title.chars().take(DEDUPE_TITLE_CHARS).collect();
    format!("{prefix}:{user_id}:{channel_id}")
}
