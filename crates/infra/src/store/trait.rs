use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use stockpile_core::{Backend, Page, PageRequest, RecordId};
use stockpile_inventory::{InventoryRecord, ItemDraft};

/// A list request after normalization: a resolved page and a vendor set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: PageRequest,
    /// Vendors to keep; empty means no filtering.
    pub vendors: Vec<String>,
}

impl ListQuery {
    pub fn new(page: PageRequest, vendors: Vec<String>) -> Self {
        Self { page, vendors }
    }

    pub fn vendor_filter(&self) -> Option<&[String]> {
        if self.vendors.is_empty() {
            None
        } else {
            Some(&self.vendors)
        }
    }

    pub fn matches_vendor(&self, vendor: &str) -> bool {
        self.vendors.is_empty() || self.vendors.iter().any(|v| v == vendor)
    }
}

/// Record store operation error.
///
/// These are what a single store variant can report. The facade folds them
/// into the caller-facing vocabulary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("'{id}' is not a valid {backend} identifier")]
    InvalidIdentifier { backend: Backend, id: String },

    #[error("record not found: {0}")]
    NotFound(RecordId),

    #[error("{operation} failed: {message}")]
    Persistence {
        operation: &'static str,
        message: String,
    },
}

impl StoreError {
    pub fn invalid_identifier(backend: Backend, id: &RecordId) -> Self {
        Self::InvalidIdentifier {
            backend,
            id: id.as_str().to_string(),
        }
    }

    pub fn persistence(operation: &'static str, message: impl core::fmt::Display) -> Self {
        Self::Persistence {
            operation,
            message: message.to_string(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence contract shared by every storage variant.
///
/// ## Semantics every implementation honors
///
/// - `create` assigns the identifier; callers never choose it.
/// - `list` returns the requested page ordered by creation (or a stable key)
///   and `total` counts records matching the vendor filter, not the whole
///   collection.
/// - `update` replaces every mutable field in one conditional write and
///   reports `NotFound` when nothing matched. It never inserts.
/// - `delete` reports `NotFound` when nothing was removed.
/// - Identifiers that cannot be parsed under the store's own encoding fail
///   with `InvalidIdentifier` before any round trip.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Which selector value this store serves.
    fn backend(&self) -> Backend;

    async fn create(&self, draft: ItemDraft) -> StoreResult<InventoryRecord>;

    async fn list(&self, query: &ListQuery) -> StoreResult<Page<InventoryRecord>>;

    async fn get(&self, id: &RecordId) -> StoreResult<InventoryRecord>;

    async fn update(&self, id: &RecordId, draft: ItemDraft) -> StoreResult<InventoryRecord>;

    async fn delete(&self, id: &RecordId) -> StoreResult<()>;
}

#[async_trait]
impl<S> InventoryStore for Arc<S>
where
    S: InventoryStore + ?Sized,
{
    fn backend(&self) -> Backend {
        (**self).backend()
    }

    async fn create(&self, draft: ItemDraft) -> StoreResult<InventoryRecord> {
        (**self).create(draft).await
    }

    async fn list(&self, query: &ListQuery) -> StoreResult<Page<InventoryRecord>> {
        (**self).list(query).await
    }

    async fn get(&self, id: &RecordId) -> StoreResult<InventoryRecord> {
        (**self).get(id).await
    }

    async fn update(&self, id: &RecordId, draft: ItemDraft) -> StoreResult<InventoryRecord> {
        (**self).update(id, draft).await
    }

    async fn delete(&self, id: &RecordId) -> StoreResult<()> {
        (**self).delete(id).await
    }
}
