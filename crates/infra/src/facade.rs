//! Backend selector over the record stores.
//!
//! `InventoryFacade` holds at most one store per [`Backend`] and routes each
//! call to the store the caller selected. It owns no record state itself; it
//! normalizes inputs, runs the store call under the caller's
//! [`OperationContext`], and folds store errors into [`InventoryError`].

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, instrument, warn};

use stockpile_core::{Backend, DomainError, Page, PageRequest, RecordId};
use stockpile_inventory::{InventoryRecord, ItemDraft};

use crate::context::{Interrupted, OperationContext};
use crate::store::{InMemoryStore, InventoryStore, ListQuery, StoreError, StoreResult};

/// Caller-facing error vocabulary of the facade.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InventoryError {
    #[error("invalid backend: {0}")]
    InvalidBackend(String),

    #[error("invalid page size {0}: expected a positive size or -1")]
    InvalidPagination(i64),

    #[error("'{id}' is not a valid {backend} identifier")]
    InvalidIdentifier { backend: Backend, id: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("inventory item not found: {0}")]
    NotFound(RecordId),

    #[error("page {page} is beyond the last page")]
    PageOutOfRange { page: u64 },

    #[error("{0} store is not available")]
    StoreUnavailable(Backend),

    #[error("{operation} failed: {message}")]
    Persistence {
        operation: &'static str,
        message: String,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error("operation timed out")]
    Timeout,
}

impl InventoryError {
    /// True when the failure lies with the caller's input rather than a store.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidBackend(_)
                | Self::InvalidPagination(_)
                | Self::InvalidIdentifier { .. }
                | Self::Validation(_)
                | Self::NotFound(_)
                | Self::PageOutOfRange { .. }
        )
    }
}

impl From<DomainError> for InventoryError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => Self::Validation(msg),
            DomainError::InvalidBackend(raw) => Self::InvalidBackend(raw),
            DomainError::InvalidPagination(size) => Self::InvalidPagination(size),
        }
    }
}

impl From<StoreError> for InventoryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidIdentifier { backend, id } => {
                Self::InvalidIdentifier { backend, id }
            }
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::Persistence { operation, message } => {
                Self::Persistence { operation, message }
            }
        }
    }
}

impl From<Interrupted> for InventoryError {
    fn from(err: Interrupted) -> Self {
        match err {
            Interrupted::Cancelled => Self::Cancelled,
            Interrupted::DeadlineExceeded => Self::Timeout,
        }
    }
}

pub type InventoryResult<T> = Result<T, InventoryError>;

type SharedStore = Arc<dyn InventoryStore>;

/// Routes inventory operations to the selected store.
#[derive(Clone, Default)]
pub struct InventoryFacade {
    document: Option<SharedStore>,
    relational: Option<SharedStore>,
}

impl std::fmt::Debug for InventoryFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryFacade")
            .field("available", &self.available_backends())
            .finish()
    }
}

impl InventoryFacade {
    /// Facade over the given stores; `None` leaves that backend unavailable.
    pub fn new(document: Option<SharedStore>, relational: Option<SharedStore>) -> Self {
        Self {
            document,
            relational,
        }
    }

    /// Both backends served by fresh in-memory stores.
    pub fn in_memory() -> Self {
        Self::default()
            .with_store(InMemoryStore::arc(Backend::Document))
            .with_store(InMemoryStore::arc(Backend::Relational))
    }

    /// Install `store` under the backend it reports, replacing any previous one.
    pub fn with_store(mut self, store: SharedStore) -> Self {
        match store.backend() {
            Backend::Document => self.document = Some(store),
            Backend::Relational => self.relational = Some(store),
        }
        self
    }

    pub fn is_available(&self, backend: Backend) -> bool {
        self.slot(backend).is_some()
    }

    pub fn available_backends(&self) -> Vec<Backend> {
        Backend::ALL
            .into_iter()
            .filter(|b| self.is_available(*b))
            .collect()
    }

    fn slot(&self, backend: Backend) -> Option<&SharedStore> {
        match backend {
            Backend::Document => self.document.as_ref(),
            Backend::Relational => self.relational.as_ref(),
        }
    }

    fn store(&self, backend: Backend) -> InventoryResult<&SharedStore> {
        self.slot(backend)
            .ok_or(InventoryError::StoreUnavailable(backend))
    }

    /// Run one store call under `ctx`, flattening interruption and store errors.
    async fn call<T, F>(ctx: &OperationContext, fut: F) -> InventoryResult<T>
    where
        F: std::future::Future<Output = StoreResult<T>>,
    {
        Ok(ctx.run(fut).await??)
    }

    #[instrument(skip(self, ctx, draft), fields(backend = %backend, id))]
    pub async fn create_item(
        &self,
        ctx: &OperationContext,
        backend: Backend,
        draft: ItemDraft,
    ) -> InventoryResult<InventoryRecord> {
        let result = async {
            draft.validate()?;
            let store = self.store(backend)?;
            Self::call(ctx, store.create(draft)).await
        }
        .await;

        if let Ok(record) = &result {
            tracing::Span::current().record("id", record.id.as_str());
        }
        log_outcome("create_item", result)
    }

    #[instrument(
        skip(self, ctx, vendors),
        fields(backend = %backend, vendors = vendors.len())
    )]
    pub async fn get_items(
        &self,
        ctx: &OperationContext,
        backend: Backend,
        page: i64,
        page_size: i64,
        vendors: Vec<String>,
    ) -> InventoryResult<Page<InventoryRecord>> {
        let result = async {
            let request = PageRequest::new(page, page_size)?;
            let query = ListQuery::new(request, normalize_vendors(vendors));
            let store = self.store(backend)?;

            let listing = Self::call(ctx, store.list(&query)).await?;
            if listing.items.is_empty() && !request.is_first() {
                return Err(InventoryError::PageOutOfRange {
                    page: request.page(),
                });
            }
            Ok(listing)
        }
        .await;

        log_outcome("get_items", result)
    }

    #[instrument(skip(self, ctx), fields(backend = %backend, id = %id))]
    pub async fn get_item_by_id(
        &self,
        ctx: &OperationContext,
        backend: Backend,
        id: &RecordId,
    ) -> InventoryResult<InventoryRecord> {
        let result = async {
            let store = self.store(backend)?;
            Self::call(ctx, store.get(id)).await
        }
        .await;

        log_outcome("get_item_by_id", result)
    }

    #[instrument(skip(self, ctx, draft), fields(backend = %backend, id = %id))]
    pub async fn update_item(
        &self,
        ctx: &OperationContext,
        backend: Backend,
        id: &RecordId,
        draft: ItemDraft,
    ) -> InventoryResult<InventoryRecord> {
        let result = async {
            draft.validate()?;
            let store = self.store(backend)?;
            Self::call(ctx, store.update(id, draft)).await
        }
        .await;

        log_outcome("update_item", result)
    }

    #[instrument(skip(self, ctx), fields(backend = %backend, id = %id))]
    pub async fn delete_item(
        &self,
        ctx: &OperationContext,
        backend: Backend,
        id: &RecordId,
    ) -> InventoryResult<()> {
        let result = async {
            let store = self.store(backend)?;
            Self::call(ctx, store.delete(id)).await
        }
        .await;

        log_outcome("delete_item", result)
    }
}

/// Trim vendor names and drop blanks and duplicates, keeping first-seen order.
fn normalize_vendors(vendors: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(vendors.len());
    for vendor in vendors {
        let vendor = vendor.trim();
        if !vendor.is_empty() && !out.iter().any(|v| v == vendor) {
            out.push(vendor.to_string());
        }
    }
    out
}

fn log_outcome<T>(operation: &'static str, result: InventoryResult<T>) -> InventoryResult<T> {
    if let Err(err) = &result {
        if err.is_caller_error() {
            warn!(operation, error = %err, "inventory operation rejected");
        } else {
            error!(operation, error = %err, "inventory operation failed");
        }
    }
    result
}
