//! Append-only comment and activity log attached to each card
//!
//! Activity entries carry their category as an explicit [`ActivityKind`].
//! Older records packed the category into `content` as `"<kind>: <message>"`;
//! those are split apart when deserialized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::generate_id;

/// Separator used by legacy activity records between category and message
pub const LEGACY_SEPARATOR: &str = ": ";

/// Log entry discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    #[default]
    Comment,
    Activity,
}

impl std::str::FromStr for EntryType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "comment" => Ok(EntryType::Comment),
            "activity" => Ok(EntryType::Activity),
            _ => Err(crate::Error::InvalidEntryType(s.to_string())),
        }
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryType::Comment => write!(f, "comment"),
            EntryType::Activity => write!(f, "activity"),
        }
    }
}

/// Category of an activity entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Created,
    Updated,
    Moved,
    FieldChanged,
    Labeled,
    Assigned,
    #[default]
    Other,
}

impl std::str::FromStr for ActivityKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "created" | "create" => Ok(ActivityKind::Created),
            "updated" | "update" => Ok(ActivityKind::Updated),
            "moved" | "move" => Ok(ActivityKind::Moved),
            "field_changed" | "field-changed" | "field" => Ok(ActivityKind::FieldChanged),
            "labeled" | "label" => Ok(ActivityKind::Labeled),
            "assigned" | "member" => Ok(ActivityKind::Assigned),
            "other" => Ok(ActivityKind::Other),
            _ => Err(crate::Error::InvalidActivityKind(s.to_string())),
        }
    }
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivityKind::Created => write!(f, "created"),
            ActivityKind::Updated => write!(f, "updated"),
            ActivityKind::Moved => write!(f, "moved"),
            ActivityKind::FieldChanged => write!(f, "field_changed"),
            ActivityKind::Labeled => write!(f, "labeled"),
            ActivityKind::Assigned => write!(f, "assigned"),
            ActivityKind::Other => write!(f, "other"),
        }
    }
}

/// One comment or activity entry in a card's log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "LogEntryRecord")]
pub struct LogEntry {
    pub id: String,

    /// Card this entry belongs to
    pub card_id: String,

    pub author: String,

    /// Comment text, or the human description for activity entries
    pub content: String,

    pub timestamp: DateTime<Utc>,

    #[serde(rename = "type")]
    pub entry_type: EntryType,

    /// Activity category (activity entries only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<ActivityKind>,
}

impl LogEntry {
    /// Create an entry of the given type.
    ///
    /// Activity content in the legacy `"<kind>: <message>"` form is split
    /// into kind and message.
    pub fn new(card_id: &str, author: &str, content: &str, entry_type: EntryType) -> Self {
        match entry_type {
            EntryType::Comment => Self::comment(card_id, author, content),
            EntryType::Activity => {
                let (kind, message) = split_legacy(content);
                Self::activity(card_id, author, kind, &message)
            }
        }
    }

    pub fn comment(card_id: &str, author: &str, content: &str) -> Self {
        Self {
            id: generate_id("entry"),
            card_id: card_id.to_string(),
            author: author.to_string(),
            content: content.to_string(),
            timestamp: Utc::now(),
            entry_type: EntryType::Comment,
            activity: None,
        }
    }

    pub fn activity(card_id: &str, author: &str, kind: ActivityKind, message: &str) -> Self {
        Self {
            id: generate_id("entry"),
            card_id: card_id.to_string(),
            author: author.to_string(),
            content: message.to_string(),
            timestamp: Utc::now(),
            entry_type: EntryType::Activity,
            activity: Some(kind),
        }
    }

    pub fn is_activity(&self) -> bool {
        self.entry_type == EntryType::Activity
    }
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.activity {
            Some(kind) if self.is_activity() => {
                write!(f, "{} [{}] {}", self.author, kind, self.content)
            }
            _ => write!(f, "{}: {}", self.author, self.content),
        }
    }
}

/// Split a legacy `"<kind>: <message>"` string.
///
/// Unknown or missing categories map to [`ActivityKind::Other`] with the
/// whole string kept as the message.
fn split_legacy(content: &str) -> (ActivityKind, String) {
    if let Some((tag, message)) = content.split_once(LEGACY_SEPARATOR)
        && let Ok(kind) = tag.trim().parse::<ActivityKind>()
    {
        return (kind, message.to_string());
    }
    (ActivityKind::Other, content.to_string())
}

/// Wire form accepted on load, including legacy activity records
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogEntryRecord {
    id: String,
    card_id: String,
    author: String,
    content: String,
    timestamp: DateTime<Utc>,
    #[serde(rename = "type", default)]
    entry_type: EntryType,
    #[serde(default)]
    activity: Option<ActivityKind>,
}

impl From<LogEntryRecord> for LogEntry {
    fn from(record: LogEntryRecord) -> Self {
        let (activity, content) = match (record.entry_type, record.activity) {
            (EntryType::Activity, None) => {
                let (kind, message) = split_legacy(&record.content);
                (Some(kind), message)
            }
            (EntryType::Activity, Some(kind)) => (Some(kind), record.content),
            (EntryType::Comment, _) => (None, record.content),
        };
        Self {
            id: record.id,
            card_id: record.card_id,
            author: record.author,
            content,
            timestamp: record.timestamp,
            entry_type: record.entry_type,
            activity,
        }
    }
}
