use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use uuid::Uuid;

use stockpile_core::{Backend, Page, RecordId};
use stockpile_inventory::{InventoryRecord, ItemDraft};

use super::r#trait::{InventoryStore, ListQuery, StoreError, StoreResult};

/// Identifier encoding an in-memory store reproduces.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IdScheme {
    /// 12-byte object id rendered as 24 lowercase hex characters.
    ObjectId,
    /// Hyphenated lowercase UUID.
    Uuid,
}

impl IdScheme {
    pub fn for_backend(backend: Backend) -> Self {
        match backend {
            Backend::Document => IdScheme::ObjectId,
            Backend::Relational => IdScheme::Uuid,
        }
    }

    fn generate(self) -> RecordId {
        match self {
            IdScheme::ObjectId => RecordId::new(ObjectId::new().to_hex()),
            IdScheme::Uuid => RecordId::new(Uuid::new_v4().to_string()),
        }
    }

    /// Parse `id` and return its canonical rendering, the form records are keyed by.
    fn canonical(self, id: &RecordId) -> Option<String> {
        match self {
            IdScheme::ObjectId => ObjectId::parse_str(id.as_str()).ok().map(|oid| oid.to_hex()),
            IdScheme::Uuid => Uuid::parse_str(id.as_str()).ok().map(|uuid| uuid.to_string()),
        }
    }
}

/// In-memory record store.
///
/// Intended for tests/dev. Keeps insertion order, which doubles as list order.
/// All reads and writes go through one lock, so count and page always agree
/// and update/delete are atomic.
#[derive(Debug)]
pub struct InMemoryStore {
    backend: Backend,
    scheme: IdScheme,
    records: RwLock<Vec<InventoryRecord>>,
}

impl InMemoryStore {
    /// Store serving `backend`, with that backend's identifier encoding.
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            scheme: IdScheme::for_backend(backend),
            records: RwLock::new(Vec::new()),
        }
    }

    pub fn arc(backend: Backend) -> Arc<Self> {
        Arc::new(Self::new(backend))
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn key(&self, id: &RecordId) -> StoreResult<String> {
        self.scheme
            .canonical(id)
            .ok_or_else(|| StoreError::invalid_identifier(self.backend, id))
    }
}

fn poisoned() -> StoreError {
    StoreError::persistence("lock", "lock poisoned")
}

#[async_trait]
impl InventoryStore for InMemoryStore {
    fn backend(&self) -> Backend {
        self.backend
    }

    async fn create(&self, draft: ItemDraft) -> StoreResult<InventoryRecord> {
        let record = draft.into_record(self.scheme.generate());
        let mut records = self.records.write().map_err(|_| poisoned())?;
        records.push(record.clone());
        Ok(record)
    }

    async fn list(&self, query: &ListQuery) -> StoreResult<Page<InventoryRecord>> {
        let records = self.records.read().map_err(|_| poisoned())?;

        let matching: Vec<&InventoryRecord> = records
            .iter()
            .filter(|r| query.matches_vendor(&r.vendor))
            .collect();

        let offset = usize::try_from(query.page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.page.limit()).unwrap_or(usize::MAX);
        let items = matching
            .iter()
            .skip(offset)
            .take(limit)
            .map(|r| (*r).clone())
            .collect();

        Ok(Page::new(items, matching.len() as u64, query.page))
    }

    async fn get(&self, id: &RecordId) -> StoreResult<InventoryRecord> {
        let key = self.key(id)?;
        let records = self.records.read().map_err(|_| poisoned())?;
        records
            .iter()
            .find(|r| r.id.as_str() == key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn update(&self, id: &RecordId, draft: ItemDraft) -> StoreResult<InventoryRecord> {
        let key = self.key(id)?;
        let mut records = self.records.write().map_err(|_| poisoned())?;
        let record = records
            .iter_mut()
            .find(|r| r.id.as_str() == key)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        record.replace_fields(draft);
        Ok(record.clone())
    }

    async fn delete(&self, id: &RecordId) -> StoreResult<()> {
        let key = self.key(id)?;
        let mut records = self.records.write().map_err(|_| poisoned())?;
        let before = records.len();
        records.retain(|r| r.id.as_str() != key);

        if records.len() == before {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(())
    }
}
