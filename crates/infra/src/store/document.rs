//! MongoDB-backed record store.
//!
//! Records live in one collection keyed by a client-generated `ObjectId`.
//!
//! ## Error Mapping
//!
//! | Condition | StoreError |
//! |-----------|------------|
//! | id is not 24 hex characters | `InvalidIdentifier` |
//! | no document matched get/update/delete | `NotFound` |
//! | any driver error | `Persistence` |
//!
//! ## Consistency
//!
//! `list` issues a count and a find as two separate reads. Concurrent writes
//! between them can make `total` disagree with the page by the number of
//! records written in between.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use mongodb::options::{FindOneAndReplaceOptions, FindOptions, ReturnDocument};
use mongodb::{Collection, Database};
use serde::{Deserialize, Serialize};
use tracing::{instrument, Span};

use stockpile_core::{Backend, Page, RecordId};
use stockpile_inventory::{InventoryRecord, ItemDraft};

use super::r#trait::{InventoryStore, ListQuery, StoreError, StoreResult};

/// Stored shape of one inventory document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct InventoryDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    product_name: String,
    price: i64,
    currency: String,
    discount: i64,
    vendor: String,
    // Older documents may carry an explicit null here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    accessories: Option<Vec<String>>,
}

impl InventoryDocument {
    fn from_draft(id: ObjectId, draft: ItemDraft) -> Self {
        Self {
            id,
            product_name: draft.name,
            price: draft.price,
            currency: draft.currency,
            discount: draft.discount,
            vendor: draft.vendor,
            accessories: if draft.accessories.is_empty() {
                None
            } else {
                Some(draft.accessories)
            },
        }
    }
}

impl From<InventoryDocument> for InventoryRecord {
    fn from(doc: InventoryDocument) -> Self {
        InventoryRecord {
            id: RecordId::new(doc.id.to_hex()),
            name: doc.product_name,
            price: doc.price,
            currency: doc.currency,
            discount: doc.discount,
            vendor: doc.vendor,
            accessories: doc.accessories.unwrap_or_default(),
        }
    }
}

/// Document-store variant of [`InventoryStore`].
#[derive(Debug, Clone)]
pub struct DocumentStore {
    collection: Collection<InventoryDocument>,
}

impl DocumentStore {
    pub fn new(database: &Database, collection: &str) -> Self {
        Self {
            collection: database.collection(collection),
        }
    }
}

fn parse_id(id: &RecordId) -> StoreResult<ObjectId> {
    ObjectId::parse_str(id.as_str())
        .map_err(|_| StoreError::invalid_identifier(Backend::Document, id))
}

fn vendor_filter(query: &ListQuery) -> Document {
    match query.vendor_filter() {
        None => doc! {},
        Some(vendors) => {
            let vendors: Vec<Bson> = vendors.iter().cloned().map(Bson::String).collect();
            doc! { "vendor": { "$in": vendors } }
        }
    }
}

/// Insertion order, one page; the driver sends `skip` as an `i64`.
fn find_options(query: &ListQuery) -> FindOptions {
    FindOptions::builder()
        .sort(doc! { "_id": 1 })
        .skip(query.page.offset())
        .limit(i64::try_from(query.page.limit()).unwrap_or(i64::MAX))
        .build()
}

#[async_trait]
impl InventoryStore for DocumentStore {
    fn backend(&self) -> Backend {
        Backend::Document
    }

    #[instrument(skip(self, draft), fields(collection = %self.collection.name(), id), err)]
    async fn create(&self, draft: ItemDraft) -> StoreResult<InventoryRecord> {
        let document = InventoryDocument::from_draft(ObjectId::new(), draft);
        Span::current().record("id", tracing::field::display(&document.id));

        self.collection
            .insert_one(&document, None)
            .await
            .map_err(|e| map_mongo_error("create", e))?;

        Ok(document.into())
    }

    #[instrument(
        skip(self, query),
        fields(
            collection = %self.collection.name(),
            page = query.page.page(),
            page_size = query.page.page_size(),
            total
        ),
        err
    )]
    async fn list(&self, query: &ListQuery) -> StoreResult<Page<InventoryRecord>> {
        let filter = vendor_filter(query);

        let total = self
            .collection
            .count_documents(filter.clone(), None)
            .await
            .map_err(|e| map_mongo_error("list", e))?;
        Span::current().record("total", total);

        let documents: Vec<InventoryDocument> = self
            .collection
            .find(filter, find_options(query))
            .await
            .map_err(|e| map_mongo_error("list", e))?
            .try_collect()
            .await
            .map_err(|e| map_mongo_error("list", e))?;

        let items = documents.into_iter().map(InventoryRecord::from).collect();
        Ok(Page::new(items, total, query.page))
    }

    #[instrument(skip(self), fields(collection = %self.collection.name()), err)]
    async fn get(&self, id: &RecordId) -> StoreResult<InventoryRecord> {
        let oid = parse_id(id)?;

        self.collection
            .find_one(doc! { "_id": oid }, None)
            .await
            .map_err(|e| map_mongo_error("get", e))?
            .map(InventoryRecord::from)
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    #[instrument(skip(self, draft), fields(collection = %self.collection.name()), err)]
    async fn update(&self, id: &RecordId, draft: ItemDraft) -> StoreResult<InventoryRecord> {
        let oid = parse_id(id)?;
        let replacement = InventoryDocument::from_draft(oid, draft);

        let options = FindOneAndReplaceOptions::builder()
            .return_document(ReturnDocument::After)
            .upsert(false)
            .build();

        self.collection
            .find_one_and_replace(doc! { "_id": oid }, &replacement, options)
            .await
            .map_err(|e| map_mongo_error("update", e))?
            .map(InventoryRecord::from)
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    #[instrument(skip(self), fields(collection = %self.collection.name()), err)]
    async fn delete(&self, id: &RecordId) -> StoreResult<()> {
        let oid = parse_id(id)?;

        let result = self
            .collection
            .delete_one(doc! { "_id": oid }, None)
            .await
            .map_err(|e| map_mongo_error("delete", e))?;

        if result.deleted_count == 0 {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(())
    }
}

/// Map a driver error to `StoreError`.
///
/// Server selection failures mean the deployment is unreachable; they keep
/// their own wording so logs tell them apart from command failures.
fn map_mongo_error(operation: &'static str, err: mongodb::error::Error) -> StoreError {
    use mongodb::error::ErrorKind;

    match err.kind.as_ref() {
        ErrorKind::ServerSelection { message, .. } => {
            StoreError::persistence(operation, format!("server unreachable: {message}"))
        }
        ErrorKind::Command(command) => StoreError::persistence(
            operation,
            format!("command error {}: {}", command.code, command.message),
        ),
        _ => StoreError::persistence(operation, err),
    }
}
