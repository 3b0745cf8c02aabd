//! The data service: owner of the authoritative in-memory dataset.
//!
//! Load order is remote mirror, then local store, then the default seed.
//! Saving always writes the local store before returning, then dispatches a
//! detached remote write with no retry. Remote writes carry no ordering
//! guarantee relative to later local reads or writes, and two clients saving
//! concurrently overwrite each other's remote copy (last writer wins).
//!
//! Timestamps come from the local clock, which is monotonic only against its
//! own readings. An item loaded with an `updatedAt` ahead of this machine's
//! wall clock (written by a device running fast) gets an earlier `updatedAt`
//! when edited or moved here, and drops in recency order.
//!
//! Until [`DataService::load`] has run the service holds an empty
//! placeholder; `save` and every mutation return `InvalidInput` instead of
//! writing it over the stored copies.

use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinHandle;

use crate::clock::{Clock, SystemClock};
use crate::config::CuadernoConfig;
use crate::error::{CuadernoError, Result};
use crate::export;
use crate::id::RecordId;
use crate::model::{Category, Dataset, FlatItem, Item, DEFAULT_EMOJI};
use crate::normalize::{has_valid_shape, normalize, parse_document};
use crate::query::{self, Overview};
use crate::remote::RemoteMirror;
use crate::store::{load_local, save_local, DocumentStore};

/// Which branch of [`DataService::load`] produced the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Remote,
    Local,
    Default,
}

/// An item bound for editing, with its current fields as the draft.
///
/// Submitting goes through [`DataService::submit_edit`]; dropping the
/// session cancels the edit without touching the dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub category_id: RecordId,
    pub item_id: RecordId,
    pub key: String,
    pub value: String,
    pub note: String,
}

pub struct DataService {
    store: Arc<dyn DocumentStore>,
    remote: Option<Arc<dyn RemoteMirror>>,
    clock: Arc<dyn Clock>,
    data: Dataset,
    source: Option<LoadSource>,
    remote_writes: Vec<JoinHandle<()>>,
}

impl DataService {
    /// A service over `store` with no remote mirror. Holds an empty dataset
    /// until [`DataService::load`] is called.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
        Self {
            data: Dataset::empty(clock.as_ref()),
            store,
            remote: None,
            clock,
            source: None,
            remote_writes: Vec::new(),
        }
    }

    pub fn with_remote(mut self, remote: Arc<dyn RemoteMirror>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Swap the timestamp source. Resets the placeholder dataset, so call it
    /// before [`DataService::load`].
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.data = Dataset::empty(clock.as_ref());
        self.clock = clock;
        self
    }

    /// File store and optional HTTP mirror as configured.
    pub fn from_config(config: &CuadernoConfig) -> Result<Self> {
        let mut service = Self::new(Arc::new(config.open_store()));
        if let Some(mirror) = config.open_mirror()? {
            tracing::debug!("Remote mirror enabled at {}", mirror.document_url());
            service = service.with_remote(Arc::new(mirror));
        }
        Ok(service)
    }

    // ==================== Load / Save ====================

    /// Replace the in-memory dataset with the first usable source: remote,
    /// local, or a fresh default seed. Never fails.
    pub async fn load(&mut self) -> &Dataset {
        let (dataset, source) = if let Some(remote) = self.load_remote().await {
            (remote, LoadSource::Remote)
        } else if let Some(local) = load_local(self.store.as_ref(), self.clock.as_ref()) {
            (local, LoadSource::Local)
        } else {
            (Dataset::seeded(self.clock.as_ref()), LoadSource::Default)
        };

        tracing::info!(
            "Loaded dataset from {:?}: {} categories, {} items",
            source,
            dataset.categories.len(),
            dataset.item_count()
        );
        self.data = dataset;
        self.source = Some(source);
        &self.data
    }

    async fn load_remote(&self) -> Option<Dataset> {
        let remote = self.remote.as_ref()?;

        match remote.fetch().await {
            Ok(Some(raw)) if has_valid_shape(&raw) => Some(normalize(&raw, self.clock.as_ref())),
            Ok(Some(_)) => {
                tracing::warn!("Remote document has no categories array, ignoring it");
                None
            }
            Ok(None) => {
                tracing::debug!("Remote mirror holds no document");
                None
            }
            Err(e) => {
                tracing::warn!("Remote mirror unavailable: {}", e);
                None
            }
        }
    }

    /// Stamp `updatedAt`, write the local store, then dispatch the remote
    /// write. Local failures are logged; the in-memory dataset stays
    /// authoritative either way. Refused before [`DataService::load`].
    pub fn save(&mut self) -> Result<&Dataset> {
        self.ensure_loaded()?;
        self.data.updated_at = self.clock.now_iso();
        if save_local(self.store.as_ref(), &self.data) {
            tracing::debug!("Saved dataset locally");
        }
        self.dispatch_remote_write();
        Ok(&self.data)
    }

    /// Until a load has run the dataset is a placeholder, and saving it would
    /// overwrite the stored copies.
    fn ensure_loaded(&self) -> Result<()> {
        if self.source.is_none() {
            return Err(CuadernoError::InvalidInput("dataset not loaded".to_string()));
        }
        Ok(())
    }

    fn dispatch_remote_write(&mut self) {
        let Some(remote) = &self.remote else {
            return;
        };

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                tracing::warn!("No async runtime available, skipping remote write");
                return;
            }
        };

        let remote = Arc::clone(remote);
        let snapshot = self.data.clone();
        self.remote_writes.retain(|task| !task.is_finished());
        self.remote_writes.push(runtime.spawn(async move {
            match remote.store(&snapshot).await {
                Ok(()) => tracing::debug!("Remote mirror updated"),
                Err(e) => tracing::warn!("Remote save failed: {}", e),
            }
        }));
    }

    /// Wait for every dispatched remote write. Only needed before shutting
    /// down the runtime; outcomes are still discarded.
    pub async fn flush_remote(&mut self) {
        for task in self.remote_writes.drain(..) {
            if let Err(e) = task.await {
                tracing::warn!("Remote write task failed: {}", e);
            }
        }
    }

    /// Number of remote writes dispatched and not yet finished.
    pub fn pending_remote_writes(&self) -> usize {
        self.remote_writes.iter().filter(|task| !task.is_finished()).count()
    }

    // ==================== Queries ====================

    pub fn dataset(&self) -> &Dataset {
        &self.data
    }

    /// The branch the last [`DataService::load`] took, if any.
    pub fn load_source(&self) -> Option<LoadSource> {
        self.source
    }

    pub fn find_category(&self, id: &str) -> Option<&Category> {
        self.data.find_category(id)
    }

    pub fn all_items(&self) -> Vec<FlatItem> {
        query::all_items(&self.data)
    }

    pub fn category_items(&self, category_id: &str) -> Result<Vec<FlatItem>> {
        self.find_category(category_id)
            .map(query::category_items)
            .ok_or_else(|| category_not_found(category_id))
    }

    pub fn search_filter(&self, items: &[FlatItem], query: &str) -> Vec<FlatItem> {
        query::search_filter(items, query)
    }

    pub fn overview(&self, limit: usize) -> Overview {
        query::overview(&self.data, limit)
    }

    pub fn export_json(&self) -> Result<String> {
        export::export_json(&self.data)
    }

    // ==================== Mutations ====================

    /// Append a new empty category. A blank emoji becomes "📁".
    pub fn create_category(&mut self, name: &str, emoji: &str) -> Result<&Dataset> {
        self.ensure_loaded()?;
        let name = required("name", name)?;
        let emoji = match emoji.trim() {
            "" => DEFAULT_EMOJI,
            emoji => emoji,
        };

        self.data.categories.push(Category::new(&name, emoji));
        self.save()
    }

    /// Append a new item to a category; `createdAt == updatedAt`.
    pub fn create_item(
        &mut self,
        category_id: &str,
        key: &str,
        value: &str,
        note: &str,
    ) -> Result<&Dataset> {
        self.ensure_loaded()?;
        let key = required("key", key)?;
        let value = required("value", value)?;
        let note = note.trim();

        let now = self.clock.now_iso();
        let category = self
            .data
            .find_category_mut(category_id)
            .ok_or_else(|| category_not_found(category_id))?;
        category.items.push(Item::new(&key, &value, note, &now));
        self.save()
    }

    /// Replace an item's key/value/note and move it to the end of
    /// `target_category_id` (its own category when `None`), refreshing
    /// `updatedAt`. Nothing changes unless every id resolves.
    pub fn update_item(
        &mut self,
        category_id: &str,
        item_id: &str,
        key: &str,
        value: &str,
        note: &str,
        target_category_id: Option<&str>,
    ) -> Result<&Dataset> {
        self.ensure_loaded()?;
        let key = required("key", key)?;
        let value = required("value", value)?;
        let note = note.trim().to_string();
        let target_category_id = target_category_id.unwrap_or(category_id);

        let source = self.category_index(category_id)?;
        let target = self.category_index(target_category_id)?;
        let position = self.data.categories[source]
            .items
            .iter()
            .position(|it| it.id == item_id)
            .ok_or_else(|| item_not_found(category_id, item_id))?;

        let mut item = self.data.categories[source].items.remove(position);
        item.key = key;
        item.value = value;
        item.note = note;
        item.updated_at = self.clock.now_iso();
        self.data.categories[target].items.push(item);

        self.save()
    }

    pub fn delete_item(&mut self, category_id: &str, item_id: &str) -> Result<&Dataset> {
        self.ensure_loaded()?;
        let category = self
            .data
            .find_category_mut(category_id)
            .ok_or_else(|| category_not_found(category_id))?;
        category
            .take_item(item_id)
            .ok_or_else(|| item_not_found(category_id, item_id))?;
        self.save()
    }

    /// Bind an item for editing.
    pub fn begin_edit(&self, category_id: &str, item_id: &str) -> Result<EditSession> {
        let category = self
            .find_category(category_id)
            .ok_or_else(|| category_not_found(category_id))?;
        let item = category
            .find_item(item_id)
            .ok_or_else(|| item_not_found(category_id, item_id))?;

        Ok(EditSession {
            category_id: category.id.clone(),
            item_id: item.id.clone(),
            key: item.key.clone(),
            value: item.value.clone(),
            note: item.note.clone(),
        })
    }

    /// Apply an edit session's draft, moving the item to
    /// `target_category_id`.
    pub fn submit_edit(&mut self, session: EditSession, target_category_id: &str) -> Result<&Dataset> {
        self.update_item(
            &session.category_id,
            &session.item_id,
            &session.key,
            &session.value,
            &session.note,
            Some(target_category_id),
        )
    }

    /// Replace the whole dataset with an imported document. A document
    /// whose `categories` is not an array is rejected with no change.
    pub fn replace_dataset(&mut self, document: &Value) -> Result<&Dataset> {
        self.ensure_loaded()?;
        let dataset = parse_document(document, self.clock.as_ref())?;
        tracing::info!(
            "Importing dataset: {} categories, {} items",
            dataset.categories.len(),
            dataset.item_count()
        );
        self.data = dataset;
        self.save()
    }

    /// [`DataService::replace_dataset`] from JSON text.
    pub fn import_json(&mut self, text: &str) -> Result<&Dataset> {
        let document: Value = serde_json::from_str(text)?;
        self.replace_dataset(&document)
    }

    /// Drop the local document and start over from the default seed.
    pub fn reset_dataset(&mut self) -> Result<&Dataset> {
        self.ensure_loaded()?;
        if let Err(e) = self.store.remove() {
            tracing::warn!("Failed to remove local document: {}", e);
        }
        self.data = Dataset::seeded(self.clock.as_ref());
        self.save()
    }

    fn category_index(&self, id: &str) -> Result<usize> {
        self.data
            .categories
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| category_not_found(id))
    }
}

fn required(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CuadernoError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(value.to_string())
}

fn category_not_found(id: &str) -> CuadernoError {
    CuadernoError::NotFound(format!("category {}", id))
}

fn item_not_found(category_id: &str, item_id: &str) -> CuadernoError {
    CuadernoError::NotFound(format!("item {} in category {}", item_id, category_id))
}
