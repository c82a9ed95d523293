//! Field extraction for author and work payloads.
//!
//! Optional fields fall back to documented defaults (empty string, empty list,
//! unset date); JSON `null` counts as absent. Required fields and wrongly-typed
//! values fail the whole record with a [`RecordError`].

use crate::config::{AUTHOR_KEY_PREFIX, CREATED_DATE_FORMAT, UNKNOWN_AUTHOR, WORK_KEY_PREFIX};
use crate::error::RecordError;
use crate::models::{Author, Book};
use crate::payload::JsonObject;
use crate::store::AuthorLookup;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde_json::Value;
use tracing::{debug, warn};

/// What to do with a `created` date that is present but cannot be parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DatePolicy {
    /// Discard the whole record
    #[default]
    Strict,
    /// Keep the record with the date unset
    Lenient,
}

/// Removes one leading `prefix`. Keys without it are returned unchanged.
pub fn strip_key_prefix<'a>(key: &'a str, prefix: &str) -> &'a str {
    key.strip_prefix(prefix).unwrap_or(key)
}

pub fn normalize_author(obj: &JsonObject) -> Result<Author, RecordError> {
    let id = strip_key_prefix(required_str(obj.get("key"), "key")?, AUTHOR_KEY_PREFIX);
    let name = required_str(obj.get("name"), "name")?;
    let personal_name = optional_string(obj.get("personal_name"), "personal_name")?;

    Ok(Author {
        id: id.to_string(),
        name: name.to_string(),
        personal_name,
    })
}

/// Builds a [`Book`] from a work payload. Author names are resolved only
/// after the full id list is known, one lookup per id, in order.
pub fn normalize_book<L>(
    obj: &JsonObject,
    authors: &L,
    date_policy: DatePolicy,
) -> Result<Book, RecordError>
where
    L: AuthorLookup + ?Sized,
{
    let id = strip_key_prefix(required_str(obj.get("key"), "key")?, WORK_KEY_PREFIX).to_string();
    let name = optional_string(obj.get("title"), "title")?;
    let description = description(obj.get("description"))?;
    let published_date = created_date(obj.get("created"), &id, date_policy)?;
    let cover_ids = cover_ids(obj.get("covers"))?;
    let author_ids = author_ids(obj.get("authors"))?;
    let author_names = resolve_author_names(&author_ids, authors)?;

    Ok(Book {
        id,
        name,
        description,
        published_date,
        cover_ids,
        author_ids,
        author_names,
    })
}

/// One name per id; ids missing from the store map to [`UNKNOWN_AUTHOR`].
pub fn resolve_author_names<L>(ids: &[String], authors: &L) -> Result<Vec<String>, RecordError>
where
    L: AuthorLookup + ?Sized,
{
    let mut names = Vec::with_capacity(ids.len());
    for id in ids {
        match authors.get(id)? {
            Some(author) => names.push(author.name),
            None => {
                debug!(author_id = %id, "Unresolved author reference");
                names.push(UNKNOWN_AUTHOR.to_string());
            }
        }
    }
    Ok(names)
}

fn required_str<'a>(value: Option<&'a Value>, field: &'static str) -> Result<&'a str, RecordError> {
    match value {
        None | Some(Value::Null) => Err(RecordError::MissingField(field)),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(RecordError::InvalidField {
            field,
            expected: "string",
        }),
    }
}

fn optional_string(value: Option<&Value>, field: &'static str) -> Result<String, RecordError> {
    match value {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(RecordError::InvalidField {
            field,
            expected: "string",
        }),
    }
}

// Usually `{"type": "/type/text", "value": "..."}`, sometimes a bare string.
fn description(value: Option<&Value>) -> Result<String, RecordError> {
    match value {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Object(inner)) => optional_string(inner.get("value"), "description.value"),
        Some(_) => Err(RecordError::InvalidField {
            field: "description",
            expected: "object or string",
        }),
    }
}

fn created_date(
    value: Option<&Value>,
    book_id: &str,
    policy: DatePolicy,
) -> Result<Option<NaiveDate>, RecordError> {
    let created = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(v) => v,
    };

    match parse_created(created) {
        Ok(date) => Ok(Some(date)),
        Err(e) => match policy {
            DatePolicy::Strict => Err(e),
            DatePolicy::Lenient => {
                warn!(book_id, error = %e, "Leaving published date unset");
                Ok(None)
            }
        },
    }
}

fn parse_created(created: &Value) -> Result<NaiveDate, RecordError> {
    let raw = created
        .get("value")
        .ok_or_else(|| invalid_date(created.to_string(), "no 'value' field"))?;
    let text = raw
        .as_str()
        .ok_or_else(|| invalid_date(raw.to_string(), "'value' is not a string"))?;

    // chrono accepts any fraction width for `%.6f`; the dump format has exactly six digits.
    if text.len() != 26 || text.as_bytes()[19] != b'.' {
        return Err(invalid_date(text, "expected yyyy-MM-ddTHH:mm:ss.SSSSSS"));
    }

    let parsed = match clamp_day_of_month(text) {
        Some(clamped) => NaiveDateTime::parse_from_str(&clamped, CREATED_DATE_FORMAT),
        None => NaiveDateTime::parse_from_str(text, CREATED_DATE_FORMAT),
    };

    parsed
        .map(|dt| dt.date())
        .map_err(|e| invalid_date(text, e))
}

/// Days 29-31 past the end of their month resolve to the month's last day
/// (`2009-02-30` -> `2009-02-28`). Returns `None` when no change is needed.
fn clamp_day_of_month(text: &str) -> Option<String> {
    let year: i32 = text.get(0..4)?.parse().ok()?;
    let month: u32 = text.get(5..7)?.parse().ok()?;
    let day: u32 = text.get(8..10)?.parse().ok()?;

    if !(1..=12).contains(&month) || !(29..=31).contains(&day) {
        return None;
    }

    let last = last_day_of_month(year, month)?;
    if day <= last {
        return None;
    }
    Some(format!("{}{:02}{}", &text[..8], last, &text[10..]))
}

fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?
        .pred_opt()
        .map(|d| d.day())
}

fn invalid_date(value: impl Into<String>, reason: impl ToString) -> RecordError {
    RecordError::InvalidDate {
        value: value.into(),
        reason: reason.to_string(),
    }
}

fn cover_ids(value: Option<&Value>) -> Result<Vec<String>, RecordError> {
    let items = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(RecordError::InvalidField {
                field: "covers",
                expected: "array",
            })
        }
    };

    items
        .iter()
        .map(|item| {
            scalar_string(item).ok_or(RecordError::InvalidField {
                field: "covers",
                expected: "array of scalars",
            })
        })
        .collect()
}

/// JSON text of a string, number or boolean; `None` for anything else.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// Each entry looks like `{"type": {...}, "author": {"key": "/authors/OL2A"}}`.
// Entries with no reference object or no key are dropped. Numeric and boolean
// keys are stringified like cover ids; an object or array key fails the record.
fn author_ids(value: Option<&Value>) -> Result<Vec<String>, RecordError> {
    let items = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(RecordError::InvalidField {
                field: "authors",
                expected: "array",
            })
        }
    };

    let mut ids = Vec::with_capacity(items.len());
    for key in items
        .iter()
        .filter_map(|wrapper| wrapper.get("author"))
        .filter_map(|reference| reference.get("key"))
    {
        if key.is_null() {
            continue;
        }
        let key = scalar_string(key).ok_or(RecordError::InvalidField {
            field: "authors.author.key",
            expected: "string or number",
        })?;
        ids.push(strip_key_prefix(&key, AUTHOR_KEY_PREFIX).to_string());
    }
    Ok(ids)
}
