//! Dataset, category and item records.
//!
//! The serialized form of [`Dataset`] is both the local document and the
//! export/import file format:
//!
//! ```json
//! { "version": 1, "createdAt": "...", "updatedAt": "...",
//!   "categories": [ { "id": "...", "name": "...", "emoji": "...",
//!     "items": [ { "id": "...", "key": "...", "value": "...", "note": "",
//!                  "createdAt": "...", "updatedAt": "..." } ] } ] }
//! ```

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::id::{new_id, RecordId};

/// Schema stamp written into every dataset.
pub const CURRENT_VERSION: i64 = 1;

/// Name given to categories that arrive without one.
pub const DEFAULT_CATEGORY_NAME: &str = "Sin nombre";

/// Glyph given to categories that arrive without one.
pub const DEFAULT_EMOJI: &str = "📁";

/// Categories of a freshly seeded dataset, as `(emoji, name)`.
pub const SEED_CATEGORIES: &[(&str, &str)] = &[
    ("🍜", "Comida"),
    ("🎂", "Cumpleaños"),
    ("🎵", "Música"),
    ("🎬", "Películas/Series"),
    ("🎮", "Juegos"),
    ("🐶", "Mascotas"),
    ("📍", "Lugares"),
    ("🎁", "Ideas de regalo"),
];

/// The root document holding every category and item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
    /// Insertion order is sidebar display order.
    pub categories: Vec<Category>,
}

/// A named, emoji-tagged grouping of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: RecordId,
    pub name: String,
    pub emoji: String,
    pub items: Vec<Item>,
}

/// A key/value/note record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: RecordId,
    pub key: String,
    pub value: String,
    pub note: String,
    pub created_at: String,
    pub updated_at: String,
}

/// An item together with the category that owns it, as produced by the
/// flattening queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatItem {
    #[serde(flatten)]
    pub item: Item,
    pub category_id: RecordId,
    pub category_name: String,
    pub category_emoji: String,
}

impl Dataset {
    /// An empty dataset stamped with the current time.
    pub fn empty(clock: &dyn Clock) -> Self {
        let now = clock.now_iso();
        Self {
            version: CURRENT_VERSION,
            created_at: now.clone(),
            updated_at: now,
            categories: Vec::new(),
        }
    }

    /// The default dataset: the seed categories, no items.
    pub fn seeded(clock: &dyn Clock) -> Self {
        let mut dataset = Self::empty(clock);
        dataset.categories = SEED_CATEGORIES
            .iter()
            .map(|(emoji, name)| Category::new(name, emoji))
            .collect();
        dataset
    }

    pub fn find_category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn find_category_mut(&mut self, id: &str) -> Option<&mut Category> {
        self.categories.iter_mut().find(|c| c.id == id)
    }

    /// Total number of items across all categories.
    pub fn item_count(&self) -> usize {
        self.categories.iter().map(|c| c.items.len()).sum()
    }
}

impl Category {
    /// A new, empty category with a fresh id.
    pub fn new(name: &str, emoji: &str) -> Self {
        Self {
            id: new_id(),
            name: name.to_string(),
            emoji: emoji.to_string(),
            items: Vec::new(),
        }
    }

    pub fn find_item(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|it| it.id == id)
    }

    fn position_of(&self, item_id: &str) -> Option<usize> {
        self.items.iter().position(|it| it.id == item_id)
    }

    /// Remove and return an item.
    pub fn take_item(&mut self, item_id: &str) -> Option<Item> {
        self.position_of(item_id).map(|idx| self.items.remove(idx))
    }
}

impl Item {
    /// A new item whose creation and update stamps are both `now`.
    pub fn new(key: &str, value: &str, note: &str, now: &str) -> Self {
        Self {
            id: new_id(),
            key: key.to_string(),
            value: value.to_string(),
            note: note.to_string(),
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }

    /// The timestamp used for recency ordering: `updatedAt`, or
    /// `createdAt` when the former is empty.
    pub fn effective_timestamp(&self) -> &str {
        if self.updated_at.is_empty() {
            &self.created_at
        } else {
            &self.updated_at
        }
    }
}

impl FlatItem {
    pub fn new(item: &Item, category: &Category) -> Self {
        Self {
            item: item.clone(),
            category_id: category.id.clone(),
            category_name: category.name.clone(),
            category_emoji: category.emoji.clone(),
        }
    }
}
