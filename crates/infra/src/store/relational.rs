//! Postgres-backed record store.
//!
//! Records live in the `inventories` table; the database assigns UUID keys.
//!
//! ## Error Mapping
//!
//! SQLx errors are mapped to `StoreError::Persistence` with a message naming
//! the failing constraint class:
//!
//! | SQLx Error | PostgreSQL Error Code | Message prefix |
//! |------------|----------------------|----------------|
//! | Database (unique violation) | `23505` | `unique violation` |
//! | Database (not-null violation) | `23502` | `not-null violation` |
//! | Database (check constraint violation) | `23514` | `check violation` |
//! | Database (value too long) | `22001` | `value too long` |
//! | Database (other) | Any other | `database error` |
//! | PoolClosed | N/A | `connection pool closed` |
//! | PoolTimedOut | N/A | `connection pool timed out` |
//! | Other | N/A | `sqlx error` |
//!
//! ## Consistency
//!
//! `list` runs its count and page fetch in one `REPEATABLE READ` read-only
//! transaction, so `total` and the page come from the same snapshot.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Row};
use tracing::{instrument, Span};
use uuid::Uuid;

use stockpile_core::{Backend, Page, RecordId};
use stockpile_inventory::{InventoryRecord, ItemDraft};

use super::r#trait::{InventoryStore, ListQuery, StoreError, StoreResult};

/// Table definition applied by [`RelationalStore::ensure_schema`].
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS inventories (
    id uuid DEFAULT gen_random_uuid() PRIMARY KEY,
    product_name varchar(255),
    price bigint,
    currency varchar(10),
    discount bigint,
    vendor varchar(255),
    accessories jsonb
)
"#;

const VENDOR_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS inventories_vendor_idx ON inventories (vendor)";

const COLUMNS: &str = "id, product_name, price, currency, discount, vendor, accessories";

/// Relational-store variant of [`InventoryStore`].
#[derive(Debug, Clone)]
pub struct RelationalStore {
    pool: Arc<PgPool>,
}

impl RelationalStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Create the table and its vendor index when missing.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        // One statement per call: prepared statements cannot batch.
        for statement in [SCHEMA, VENDOR_INDEX] {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }
}

fn parse_id(id: &RecordId) -> StoreResult<Uuid> {
    Uuid::parse_str(id.as_str())
        .map_err(|_| StoreError::invalid_identifier(Backend::Relational, id))
}

#[async_trait]
impl InventoryStore for RelationalStore {
    fn backend(&self) -> Backend {
        Backend::Relational
    }

    #[instrument(skip(self, draft), fields(id), err)]
    async fn create(&self, draft: ItemDraft) -> StoreResult<InventoryRecord> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO inventories (product_name, price, currency, discount, vendor, accessories)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&draft.name)
        .bind(draft.price)
        .bind(&draft.currency)
        .bind(draft.discount)
        .bind(&draft.vendor)
        .bind(Json(&draft.accessories))
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create", e))?;

        let record = decode_row("create", &row)?;
        Span::current().record("id", record.id.as_str());
        Ok(record)
    }

    #[instrument(
        skip(self, query),
        fields(page = query.page.page(), page_size = query.page.page_size(), total),
        err
    )]
    async fn list(&self, query: &ListQuery) -> StoreResult<Page<InventoryRecord>> {
        let vendors: Option<Vec<String>> = query.vendor_filter().map(<[String]>::to_vec);
        let offset = i64::try_from(query.page.offset()).unwrap_or(i64::MAX);
        let limit = i64::try_from(query.page.limit()).unwrap_or(i64::MAX);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("list", e))?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("list", e))?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM inventories
            WHERE ($1::text[] IS NULL OR vendor = ANY($1))
            "#,
        )
        .bind(&vendors)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("list", e))?;
        Span::current().record("total", total);

        let rows = sqlx::query(&format!(
            r#"
            SELECT {COLUMNS}
            FROM inventories
            WHERE ($1::text[] IS NULL OR vendor = ANY($1))
            ORDER BY id
            OFFSET $2
            LIMIT $3
            "#
        ))
        .bind(&vendors)
        .bind(offset)
        .bind(limit)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("list", e))?;

        tx.commit().await.map_err(|e| map_sqlx_error("list", e))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            items.push(decode_row("list", row)?);
        }

        Ok(Page::new(items, total.max(0) as u64, query.page))
    }

    #[instrument(skip(self), err)]
    async fn get(&self, id: &RecordId) -> StoreResult<InventoryRecord> {
        let uuid = parse_id(id)?;

        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM inventories WHERE id = $1"))
            .bind(uuid)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get", e))?;

        match row {
            Some(row) => decode_row("get", &row),
            None => Err(StoreError::NotFound(id.clone())),
        }
    }

    #[instrument(skip(self, draft), err)]
    async fn update(&self, id: &RecordId, draft: ItemDraft) -> StoreResult<InventoryRecord> {
        let uuid = parse_id(id)?;

        let row = sqlx::query(&format!(
            r#"
            UPDATE inventories
            SET product_name = $2,
                price = $3,
                currency = $4,
                discount = $5,
                vendor = $6,
                accessories = $7
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(uuid)
        .bind(&draft.name)
        .bind(draft.price)
        .bind(&draft.currency)
        .bind(draft.discount)
        .bind(&draft.vendor)
        .bind(Json(&draft.accessories))
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update", e))?;

        match row {
            Some(row) => decode_row("update", &row),
            None => Err(StoreError::NotFound(id.clone())),
        }
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, id: &RecordId) -> StoreResult<()> {
        let uuid = parse_id(id)?;

        let result = sqlx::query("DELETE FROM inventories WHERE id = $1")
            .bind(uuid)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(())
    }
}

fn decode_row(operation: &'static str, row: &sqlx::postgres::PgRow) -> StoreResult<InventoryRecord> {
    InventoryRow::from_row(row)
        .map(InventoryRecord::from)
        .map_err(|e| StoreError::persistence(operation, format!("failed to decode row: {e}")))
}

/// Map SQLx errors to `StoreError`.
fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let kind = match db_err.code().as_deref() {
                Some("23505") => "unique violation",
                Some("23502") => "not-null violation",
                Some("23514") => "check violation",
                Some("22001") => "value too long",
                _ => "database error",
            };
            StoreError::persistence(operation, format!("{kind}: {}", db_err.message()))
        }
        sqlx::Error::PoolClosed => StoreError::persistence(operation, "connection pool closed"),
        sqlx::Error::PoolTimedOut => {
            StoreError::persistence(operation, "connection pool timed out")
        }
        _ => StoreError::persistence(operation, format!("sqlx error: {err}")),
    }
}

// SQLx row types

#[derive(Debug)]
struct InventoryRow {
    id: Uuid,
    product_name: Option<String>,
    price: Option<i64>,
    currency: Option<String>,
    discount: Option<i64>,
    vendor: Option<String>,
    accessories: Option<Json<Vec<String>>>,
}

impl<'r> FromRow<'r, sqlx::postgres::PgRow> for InventoryRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(InventoryRow {
            id: row.try_get("id")?,
            product_name: row.try_get("product_name")?,
            price: row.try_get("price")?,
            currency: row.try_get("currency")?,
            discount: row.try_get("discount")?,
            vendor: row.try_get("vendor")?,
            accessories: row.try_get("accessories")?,
        })
    }
}

impl From<InventoryRow> for InventoryRecord {
    fn from(row: InventoryRow) -> Self {
        InventoryRecord {
            id: RecordId::new(row.id.to_string()),
            name: row.product_name.unwrap_or_default(),
            price: row.price.unwrap_or_default(),
            currency: row.currency.unwrap_or_default(),
            discount: row.discount.unwrap_or_default(),
            vendor: row.vendor.unwrap_or_default(),
            accessories: row.accessories.map(|Json(a)| a).unwrap_or_default(),
        }
    }
}
