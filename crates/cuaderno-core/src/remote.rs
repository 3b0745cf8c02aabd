//! Remote mirror: a best-effort network copy of the dataset.
//!
//! The protocol is a document-store read (`GET <url>/data.json`) and full
//! overwrite (`PUT <url>/data.json`). Every failure is reported as a
//! [`RemoteError`]; the data service logs and ignores them.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use tokio::sync::Semaphore;

use crate::error::RemoteError;
use crate::model::Dataset;

/// Logical path of the document under the configured database root.
pub const DOCUMENT_PATH: &str = "data.json";

#[async_trait]
pub trait RemoteMirror: Send + Sync {
    /// Fetch the raw remote document. `Ok(None)` means the remote holds
    /// nothing; errors mean unreachable or unusable.
    async fn fetch(&self) -> Result<Option<Value>, RemoteError>;

    /// Overwrite the remote document.
    async fn store(&self, dataset: &Dataset) -> Result<(), RemoteError>;
}

/// HTTP document-store mirror (Firebase Realtime Database REST style).
#[derive(Debug, Clone)]
pub struct HttpMirror {
    client: Client,
    document_url: Url,
}

impl HttpMirror {
    /// `base_url` is the database root, with or without a trailing slash.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let document_url = format!("{}/{}", base_url.trim_end_matches('/'), DOCUMENT_PATH);
        let document_url =
            Url::parse(&document_url).map_err(|_| RemoteError::InvalidUrl(base_url.to_string()))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            document_url,
        })
    }

    pub fn document_url(&self) -> &Url {
        &self.document_url
    }
}

#[async_trait]
impl RemoteMirror for HttpMirror {
    async fn fetch(&self) -> Result<Option<Value>, RemoteError> {
        let response = self.client.get(self.document_url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| RemoteError::Parse(e.to_string()))?;

        Ok(match body {
            Value::Null => None,
            other => Some(other),
        })
    }

    async fn store(&self, dataset: &Dataset) -> Result<(), RemoteError> {
        let response = self
            .client
            .put(self.document_url.clone())
            .json(dataset)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status(status.as_u16()));
        }
        Ok(())
    }
}

/// In-process mirror for tests.
///
/// Can be switched offline, and can hold writes until released so callers
/// can observe that nothing waits on them.
#[derive(Debug)]
pub struct MemoryMirror {
    document: Mutex<Option<Value>>,
    online: AtomicBool,
    stores: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
}

impl MemoryMirror {
    pub fn new() -> Self {
        Self {
            document: Mutex::new(None),
            online: AtomicBool::new(true),
            stores: AtomicUsize::new(0),
            gate: None,
        }
    }

    pub fn with_document(document: Value) -> Self {
        let mirror = Self::new();
        *mirror.document.lock().unwrap_or_else(|e| e.into_inner()) = Some(document);
        mirror
    }

    /// A mirror whose writes wait until [`MemoryMirror::release`] is called.
    pub fn held() -> Self {
        Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::new()
        }
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn document(&self) -> Option<Value> {
        self.document.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of completed writes.
    pub fn store_count(&self) -> usize {
        self.stores.load(Ordering::SeqCst)
    }

    fn ensure_online(&self) -> Result<(), RemoteError> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RemoteError::RequestFailed("connection refused".to_string()))
        }
    }
}

impl Default for MemoryMirror {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteMirror for MemoryMirror {
    async fn fetch(&self) -> Result<Option<Value>, RemoteError> {
        self.ensure_online()?;
        Ok(self.document())
    }

    async fn store(&self, dataset: &Dataset) -> Result<(), RemoteError> {
        if let Some(gate) = &self.gate {
            let _permit = gate
                .acquire()
                .await
                .map_err(|e| RemoteError::RequestFailed(e.to_string()))?;
        }
        self.ensure_online()?;

        let value = serde_json::to_value(dataset).map_err(|e| RemoteError::Parse(e.to_string()))?;
        *self.document.lock().unwrap_or_else(|e| e.into_inner()) = Some(value);
        self.stores.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
