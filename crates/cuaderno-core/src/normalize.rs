//! Record normalization for untrusted documents.
//!
//! Import files and remote payloads arrive as arbitrary JSON. Normalization
//! turns them into fully populated [`Dataset`] values, depth first:
//!
//! - falsy `id` → fresh identifier (also for ids already used in the dataset)
//! - falsy `name` → "Sin nombre", falsy `emoji` → "📁"
//! - missing or non-array `categories`/`items` → empty sequence
//! - missing `key`/`value`/`note` → empty string
//! - missing `createdAt`/`updatedAt` → the time of the normalization pass
//! - missing `version` → 1
//!
//! Falsy means absent, `null`, `false`, `0` or `""`. Fields that are present
//! are kept as they are, so normalizing a normalized document is a no-op.

use std::collections::HashSet;

use serde_json::Value;

use crate::clock::Clock;
use crate::error::{CuadernoError, Result};
use crate::id::{new_id, RecordId};
use crate::model::{Category, Dataset, Item, CURRENT_VERSION, DEFAULT_CATEGORY_NAME, DEFAULT_EMOJI};

/// One normalization pass. Tracks ids seen so far so duplicates can be
/// reassigned.
#[derive(Debug)]
pub struct Normalizer {
    now: String,
    seen_categories: HashSet<RecordId>,
    seen_items: HashSet<RecordId>,
}

impl Normalizer {
    /// Start a pass; `now` fills every missing timestamp.
    pub fn new(now: impl Into<String>) -> Self {
        Self {
            now: now.into(),
            seen_categories: HashSet::new(),
            seen_items: HashSet::new(),
        }
    }

    pub fn dataset(&mut self, raw: &Value) -> Dataset {
        let categories = array_field(raw, "categories")
            .iter()
            .map(|c| self.category(c))
            .collect();

        Dataset {
            version: raw.get("version").and_then(Value::as_i64).unwrap_or(CURRENT_VERSION),
            created_at: text_or(raw.get("createdAt"), &self.now),
            updated_at: text_or(raw.get("updatedAt"), &self.now),
            categories,
        }
    }

    pub fn category(&mut self, raw: &Value) -> Category {
        let id = unique_id(raw.get("id"), &mut self.seen_categories);
        let name = text_or(raw.get("name"), DEFAULT_CATEGORY_NAME);
        let emoji = text_or(raw.get("emoji"), DEFAULT_EMOJI);
        let items = array_field(raw, "items").iter().map(|it| self.item(it)).collect();

        Category {
            id,
            name,
            emoji,
            items,
        }
    }

    pub fn item(&mut self, raw: &Value) -> Item {
        Item {
            id: unique_id(raw.get("id"), &mut self.seen_items),
            key: text_or(raw.get("key"), ""),
            value: text_or(raw.get("value"), ""),
            note: text_or(raw.get("note"), ""),
            created_at: text_or(raw.get("createdAt"), &self.now),
            updated_at: text_or(raw.get("updatedAt"), &self.now),
        }
    }
}

/// Normalize a whole document. Never fails; a document without a
/// `categories` array yields a dataset with no categories.
pub fn normalize(raw: &Value, clock: &dyn Clock) -> Dataset {
    Normalizer::new(clock.now_iso()).dataset(raw)
}

pub fn normalize_category(raw: &Value, clock: &dyn Clock) -> Category {
    Normalizer::new(clock.now_iso()).category(raw)
}

pub fn normalize_item(raw: &Value, clock: &dyn Clock) -> Item {
    Normalizer::new(clock.now_iso()).item(raw)
}

/// Whether a document is structurally acceptable: an object whose
/// `categories` is an array.
pub fn has_valid_shape(raw: &Value) -> bool {
    matches!(raw.get("categories"), Some(Value::Array(_)))
}

/// Shape-check then normalize. Used for imports and remote payloads.
pub fn parse_document(raw: &Value, clock: &dyn Clock) -> Result<Dataset> {
    if !has_valid_shape(raw) {
        return Err(CuadernoError::MalformedDocument(
            "`categories` must be an array".to_string(),
        ));
    }
    Ok(normalize(raw, clock))
}

fn array_field<'a>(raw: &'a Value, field: &str) -> &'a [Value] {
    match raw.get(field) {
        Some(Value::Array(values)) => values.as_slice(),
        _ => &[],
    }
}

/// The field as text, or `default` when it is falsy. Non-zero numbers and
/// `true` are stringified; arrays and objects count as falsy.
fn text_or(value: Option<&Value>, default: &str) -> String {
    match value {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) if n.as_f64() != Some(0.0) => n.to_string(),
        Some(Value::Bool(true)) => "true".to_string(),
        _ => default.to_string(),
    }
}

fn unique_id(value: Option<&Value>, seen: &mut HashSet<RecordId>) -> RecordId {
    let mut id = text_or(value, "");
    if id.is_empty() || seen.contains(&id) {
        id = new_id();
    }
    seen.insert(id.clone());
    id
}
