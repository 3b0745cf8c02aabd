//! Read-side helpers: flattening, recency ordering and search.

use serde::Serialize;

use crate::model::{Category, Dataset, FlatItem};

/// Number of recent items shown on the overview page.
pub const OVERVIEW_LIMIT: usize = 10;

/// Summary for the landing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_items: usize,
    pub total_categories: usize,
    pub latest: Vec<FlatItem>,
}

/// Every item of every category, tagged with its category, newest first.
pub fn all_items(dataset: &Dataset) -> Vec<FlatItem> {
    let mut out: Vec<FlatItem> = dataset.categories.iter().flat_map(flatten_category).collect();
    sort_by_recency(&mut out);
    out
}

/// The items of one category, tagged and ordered like [`all_items`].
pub fn category_items(category: &Category) -> Vec<FlatItem> {
    let mut out: Vec<FlatItem> = flatten_category(category).collect();
    sort_by_recency(&mut out);
    out
}

fn flatten_category(category: &Category) -> impl Iterator<Item = FlatItem> + '_ {
    category.items.iter().map(move |item| FlatItem::new(item, category))
}

/// Sort newest first by effective timestamp.
///
/// Timestamps are compared as strings; ISO-8601 UTC sorts lexically in
/// chronological order. The sort is stable so equal timestamps keep
/// traversal order.
pub fn sort_by_recency(items: &mut [FlatItem]) {
    items.sort_by(|a, b| b.item.effective_timestamp().cmp(a.item.effective_timestamp()));
}

/// Case-insensitive substring match over category name, key, value and
/// note. A blank query returns every item unchanged.
pub fn search_filter(items: &[FlatItem], query: &str) -> Vec<FlatItem> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return items.to_vec();
    }

    items
        .iter()
        .filter(|it| haystack(it).contains(&needle))
        .cloned()
        .collect()
}

fn haystack(it: &FlatItem) -> String {
    format!(
        "{} {} {} {}",
        it.category_name, it.item.key, it.item.value, it.item.note
    )
    .to_lowercase()
}

/// Item and category totals plus the `limit` most recent items.
pub fn overview(dataset: &Dataset, limit: usize) -> Overview {
    let mut latest = all_items(dataset);
    let total_items = latest.len();
    latest.truncate(limit);

    Overview {
        total_items,
        total_categories: dataset.categories.len(),
        latest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Item;

    fn item(key: &str, created: &str, updated: &str) -> Item {
        let mut it = Item::new(key, "v", "", created);
        it.updated_at = updated.to_string();
        it
    }

    fn dataset() -> Dataset {
        let mut food = Category::new("Comida", "🍜");
        food.items.push(item("a", "2024-01-01T00:00:00.000Z", "2024-01-03T00:00:00.000Z"));
        food.items.push(item("b", "2024-01-02T00:00:00.000Z", "2024-01-02T00:00:00.000Z"));

        let mut music = Category::new("Música", "🎵");
        music.items.push(item("c", "2024-01-01T00:00:00.000Z", "2024-01-05T00:00:00.000Z"));
        music.items.push(item("d", "2024-01-04T00:00:00.000Z", ""));

        Dataset {
            version: 1,
            created_at: "2024-01-01T00:00:00.000Z".into(),
            updated_at: "2024-01-05T00:00:00.000Z".into(),
            categories: vec![food, music],
        }
    }

    fn keys(items: &[FlatItem]) -> Vec<&str> {
        items.iter().map(|it| it.item.key.as_str()).collect()
    }

    #[test]
    fn all_items_flattens_and_orders_newest_first() {
        let ds = dataset();
        let items = all_items(&ds);
        assert_eq!(items.len(), ds.item_count());
        assert_eq!(keys(&items), vec!["c", "d", "a", "b"]);
        assert_eq!(items[0].category_name, "Música");
        assert_eq!(items[2].category_emoji, "🍜");
    }

    #[test]
    fn equal_timestamps_keep_traversal_order() {
        let same = "2024-01-01T00:00:00.000Z";
        let mut first = Category::new("Uno", "1️⃣");
        first.items.push(item("x", same, same));
        first.items.push(item("y", same, same));
        let mut second = Category::new("Dos", "2️⃣");
        second.items.push(item("z", same, same));

        let ds = Dataset {
            version: 1,
            created_at: same.into(),
            updated_at: same.into(),
            categories: vec![first, second],
        };
        assert_eq!(keys(&all_items(&ds)), vec!["x", "y", "z"]);
    }

    #[test]
    fn category_items_only_covers_one_category() {
        let ds = dataset();
        let items = category_items(&ds.categories[0]);
        assert_eq!(keys(&items), vec!["a", "b"]);
        assert!(items.iter().all(|it| it.category_id == ds.categories[0].id));
    }

    #[test]
    fn overview_truncates_but_counts_everything() {
        let ds = dataset();
        let ov = overview(&ds, 2);
        assert_eq!(ov.total_items, 4);
        assert_eq!(ov.total_categories, 2);
        assert_eq!(keys(&ov.latest), vec!["c", "d"]);
    }

    #[test]
    fn blank_query_returns_everything_in_order() {
        let items = all_items(&dataset());
        assert_eq!(search_filter(&items, ""), items);
        assert_eq!(search_filter(&items, "   "), items);
    }

    #[test]
    fn search_matches_category_name_case_insensitively() {
        let items = all_items(&dataset());
        let found = search_filter(&items, "  MÚSICA ");
        assert_eq!(keys(&found), vec!["c", "d"]);
    }
}
