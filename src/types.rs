//! Core data types for parse results

use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Task-management action a message expresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Add,
    Update,
    Complete,
    Delete,
    List,
    Find,
    Assign,
    Postpone,
    SetDue,
    SetTag,
    BulkComplete,
    BulkDelete,
    Unknown,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Add => "add",
            Intent::Update => "update",
            Intent::Complete => "complete",
            Intent::Delete => "delete",
            Intent::List => "list",
            Intent::Find => "find",
            Intent::Assign => "assign",
            Intent::Postpone => "postpone",
            Intent::SetDue => "set_due",
            Intent::SetTag => "set_tag",
            Intent::BulkComplete => "bulk_complete",
            Intent::BulkDelete => "bulk_delete",
            Intent::Unknown => "unknown",
        }
    }
}

/// Task priority levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Urgent,
    High,
    Normal,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Urgent => "urgent",
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Low => "low",
        }
    }
}

/// Task status filter values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Open,
    Done,
}

/// Fields extracted for a new task (ADD intent)
#[derive(Debug, Clone, Serialize)]
pub struct AddTask {
    pub title: String,
    pub description: Option<String>,
    pub assignees: Vec<String>,
    pub due: Option<DateTime<Tz>>,
    pub priority: Priority,
    pub tags: Vec<String>,
    pub source_msg_id: String,
    pub channel_id: String,
}

impl AddTask {
    pub fn new(source_msg_id: String, channel_id: String) -> Self {
        Self {
            title: String::new(),
            description: None,
            assignees: Vec::new(),
            due: None,
            priority: Priority::Normal,
            tags: Vec::new(),
            source_msg_id,
            channel_id,
        }
    }
}

/// Reference to an existing task (COMPLETE/DELETE/UPDATE/POSTPONE)
///
/// Exactly one of the three forms is populated on success: a numeric id,
/// a quoted title fragment, or a significant-word keyword list.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_query: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

impl TaskRef {
    pub fn is_empty(&self) -> bool {
        self.task_id.is_none() && self.title_query.is_none() && self.keywords.is_empty()
    }
}

/// Fields an UPDATE command changes on the referenced task
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskUpdates {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<DateTime<Tz>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub add_tags: Vec<String>,
}

impl TaskUpdates {
    pub fn is_empty(&self) -> bool {
        self.priority.is_none() && self.due.is_none() && self.add_tags.is_empty()
    }
}

/// Filters extracted for a LIST command
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub today: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub this_week: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub overdue: bool,
}

/// Intent-shaped payload of a parse result
///
/// The variant is keyed by the result's intent; serialization is untagged
/// so the wire shape is a plain field mapping.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum TaskPayload {
    Add(AddTask),
    List(ListFilters),
    Reference {
        #[serde(flatten)]
        reference: TaskRef,
    },
    Update {
        #[serde(flatten)]
        reference: TaskRef,
        updates: TaskUpdates,
    },
    Postpone {
        #[serde(flatten)]
        reference: TaskRef,
        #[serde(skip_serializing_if = "Option::is_none")]
        due: Option<DateTime<Tz>>,
    },
    Find {
        query: String,
    },
    Bulk {
        target_indices: Vec<usize>,
    },
    Empty {},
}

/// Error taxonomy surfaced to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingInfo,
    ParseError,
    InvalidIndices,
}

/// Structured extraction error with a remediation hint
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
    pub suggestion: String,
}

impl ErrorInfo {
    pub fn missing_info(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::MissingInfo,
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    pub fn parse_error(cause: impl std::fmt::Display) -> Self {
        Self {
            kind: ErrorKind::ParseError,
            message: format!("解析エラー: {cause}"),
            suggestion: "入力形式を確認してください".to_string(),
        }
    }

    pub fn invalid_indices(max_index: usize) -> Self {
        Self {
            kind: ErrorKind::InvalidIndices,
            message: "無効な番号が指定されました".to_string(),
            suggestion: format!("1から{max_index}までの番号を指定してください"),
        }
    }
}

/// Secondary constraints derived from the extracted fields
#[derive(Debug, Clone, Default, Serialize)]
pub struct Constraints {
    pub dedupe_key: String,
    pub confirm_needed: bool,
}

/// Result of parsing one inbound message
#[derive(Debug, Clone, Serialize)]
pub struct ParseResult {
    pub intent: Intent,
    pub task: TaskPayload,
    pub constraints: Constraints,
    pub confidence: f64,
    pub error: Option<ErrorInfo>,
    pub suggestions: Vec<String>,
}

impl ParseResult {
    /// Plain-mapping form for transport across a process boundary
    pub fn to_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_serializes_snake_case() {
        let json = serde_json::to_string(&Intent::BulkDelete).unwrap();
        assert_eq!(json, "\"bulk_delete\"");
        assert_eq!(Intent::SetDue.as_str(), "set_due");
    }

    #[test]
    fn test_payload_serializes_untagged() {
        let payload = TaskPayload::Find {
            query: "レポート".to_string(),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["query"], "レポート");
        assert!(value.get("type").is_none());
    }

    #[test]
    fn test_reference_skips_empty_fields() {
        let payload = TaskPayload::Reference {
            reference: TaskRef {
                task_id: Some(123),
                ..TaskRef::default()
            },
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["task_id"], 123);
        assert!(value.get("title_query").is_none());
        assert!(value.get("keywords").is_none());
    }

    #[test]
    fn test_empty_payload_is_empty_map() {
        let value = serde_json::to_value(&TaskPayload::Empty {}).unwrap();
        assert_eq!(value, serde_json::json!({}));
    }
}
