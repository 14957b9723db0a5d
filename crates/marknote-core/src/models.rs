//! Data models for marknote
//!
//! Defines the core data structures: Entry and SortOrder.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Offset of Japan Standard Time from UTC, in seconds
const JST_OFFSET_SECS: i32 = 9 * 3600;

/// Display format for entry timestamps
const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// A titled piece of markdown content
///
/// Serialized with camelCase field names so the index stays readable by
/// anything that wrote the full `{id, title, content, createdAt}` shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Unique identifier
    pub id: Uuid,
    /// Entry title
    pub title: String,
    /// Markdown content
    #[serde(default)]
    pub content: String,
    /// When this entry was created (never changes)
    pub created_at: DateTime<Utc>,
}

impl Entry {
    /// Create a new empty entry with the given title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            content: String::new(),
            created_at: Utc::now(),
        }
    }

    /// Create an entry with a specific ID and creation time (for loading from storage)
    pub fn with_id(id: Uuid, title: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: title.into(),
            content: String::new(),
            created_at,
        }
    }

    /// First 8 characters of the ID, for display
    pub fn short_id(&self) -> String {
        self.id.to_string()[..8].to_string()
    }

    /// Creation time formatted in Japan Standard Time
    pub fn created_at_jst(&self) -> String {
        format_jst(&self.created_at)
    }

    /// Copy of this entry as stored in the index: content blanked out
    pub(crate) fn index_record(&self) -> Self {
        Self {
            id: self.id,
            title: self.title.clone(),
            content: String::new(),
            created_at: self.created_at,
        }
    }
}

/// Format a timestamp as `YYYY/MM/DD HH:MM:SS` in Japan Standard Time
pub fn format_jst(at: &DateTime<Utc>) -> String {
    match FixedOffset::east_opt(JST_OFFSET_SECS) {
        Some(jst) => at.with_timezone(&jst).format(TIMESTAMP_FORMAT).to_string(),
        None => at.format(TIMESTAMP_FORMAT).to_string(),
    }
}

/// Ordering of entries by creation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Oldest first
    Asc,
    /// Newest first
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    /// The opposite order
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    /// Compare two entries by creation time in this order
    pub fn compare(self, a: &Entry, b: &Entry) -> Ordering {
        let ordering = a.created_at.cmp(&b.created_at);
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("invalid sort order '{}', expected asc or desc", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_entry_new() {
        let entry = Entry::new("Draft A");
        assert_eq!(entry.title, "Draft A");
        assert!(entry.content.is_empty());
        assert_eq!(entry.short_id().len(), 8);
    }

    #[test]
    fn test_index_record_blanks_content() {
        let mut entry = Entry::new("Draft A");
        entry.content = "# Hello".to_string();
        let record = entry.index_record();
        assert_eq!(record.id, entry.id);
        assert_eq!(record.title, "Draft A");
        assert!(record.content.is_empty());
    }

    #[test]
    fn test_entry_json_shape() {
        let created = Utc.with_ymd_and_hms(2024, 1, 8, 3, 4, 5).unwrap();
        let entry = Entry::with_id(Uuid::nil(), "T", created);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["createdAt"], "2024-01-08T03:04:05Z");
        assert_eq!(json["content"], "");

        // Index records written by a browser carry JS Date strings
        let parsed: Entry = serde_json::from_str(
            r#"{"id":"00000000-0000-0000-0000-000000000000","title":"T","createdAt":"2024-01-08T03:04:05.000Z"}"#,
        )
        .unwrap();
        assert_eq!(parsed.created_at, created);
        assert!(parsed.content.is_empty());
    }

    #[test]
    fn test_format_jst() {
        let at = Utc.with_ymd_and_hms(2024, 12, 31, 20, 0, 0).unwrap();
        assert_eq!(format_jst(&at), "2025/01/01 05:00:00");
    }

    #[test]
    fn test_sort_order_parse_and_toggle() {
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("newest".parse::<SortOrder>().is_err());
        assert_eq!(SortOrder::default(), SortOrder::Desc);
        assert_eq!(SortOrder::Asc.toggled(), SortOrder::Desc);
        assert_eq!(SortOrder::Desc.to_string(), "desc");
    }

    #[test]
    fn test_sort_order_compare() {
        let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let a = Entry::with_id(Uuid::new_v4(), "a", t1);
        let b = Entry::with_id(Uuid::new_v4(), "b", t2);
        assert_eq!(SortOrder::Asc.compare(&a, &b), Ordering::Less);
        assert_eq!(SortOrder::Desc.compare(&a, &b), Ordering::Greater);
    }
}
