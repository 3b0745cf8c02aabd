//! Cuaderno Core - data layer for a personal key/value notebook
//!
//! Users keep key/value "items" (with optional notes) in named,
//! emoji-tagged categories. This crate owns everything below the
//! presentation layer:
//!
//! - **Model**: `Dataset` → `Category` → `Item`, serialized as the local
//!   document and the export/import format
//! - **Normalize**: turns untrusted JSON (imports, remote payloads) into
//!   fully populated records
//! - **Store**: the local document under a fixed key (file or in-memory)
//! - **Remote**: optional best-effort HTTP mirror of the same document
//! - **Service**: load (remote → local → default seed), save (local, then
//!   detached remote write), queries and mutations
//! - **Query**: flatten, recency ordering, search, overview
//! - **Config**/**Gate**: TOML configuration and the shared-secret gate
//!
//! ```no_run
//! use std::sync::Arc;
//! use cuaderno_core::{DataService, MemoryStore};
//!
//! # async fn demo() -> cuaderno_core::Result<()> {
//! let mut service = DataService::new(Arc::new(MemoryStore::new()));
//! service.load().await;
//! let food = service.dataset().categories[0].id.clone();
//! service.create_item(&food, "Pizza", "Mushroom", "")?;
//! let hits = service.search_filter(&service.all_items(), "pizza");
//! assert_eq!(hits.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod export;
pub mod gate;
pub mod id;
pub mod model;
pub mod normalize;
pub mod query;
pub mod remote;
pub mod service;
pub mod store;

pub use clock::{format_timestamp, Clock, ManualClock, SystemClock};
pub use config::{CuadernoConfig, RemoteConfig};
pub use error::{ConfigError, CuadernoError, PersistenceError, RemoteError, Result};
pub use export::{export_file_name, export_json};
pub use gate::AccessGate;
pub use id::{new_id, RecordId};
pub use model::{Category, Dataset, FlatItem, Item, DEFAULT_CATEGORY_NAME, DEFAULT_EMOJI};
pub use normalize::{normalize, normalize_category, normalize_item, Normalizer};
pub use query::{all_items, search_filter, Overview, OVERVIEW_LIMIT};
pub use remote::{HttpMirror, MemoryMirror, RemoteMirror};
pub use service::{DataService, EditSession, LoadSource};
pub use store::{DocumentStore, FileStore, MemoryStore};
