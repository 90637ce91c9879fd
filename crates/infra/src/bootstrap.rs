//! Store construction at startup.
//!
//! Each backend connects independently. A backend that fails to connect is
//! logged and left out of the facade, so requests for it report
//! `StoreUnavailable` while the other backend keeps serving.

use std::sync::Arc;
use std::time::Duration;

use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::Client;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tracing::{error, info, instrument};

use stockpile_core::Backend;

use crate::config::{AppConfig, DocumentConfig, RelationalConfig};
use crate::facade::InventoryFacade;
use crate::store::{DocumentStore, InventoryStore, RelationalStore, StoreError};

const APP_NAME: &str = "stockpile";

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("mongodb: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("postgres: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("no relational database configured (set DATABASE_URL or POSTGRES_*)")]
    MissingDatabaseUrl,

    #[error("{backend} store did not connect within {timeout_ms}ms")]
    ConnectTimeout { backend: Backend, timeout_ms: u128 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Build the facade the service runs with.
///
/// In-memory stores back both selectors unless persistent stores are enabled.
pub async fn build_facade(config: &AppConfig) -> InventoryFacade {
    if !config.use_persistent_stores {
        info!("using in-memory stores for both backends");
        return InventoryFacade::in_memory();
    }

    let mut facade = InventoryFacade::default();

    match connect_with_timeout(
        config,
        Backend::Document,
        connect_document_store(&config.document, config.connect_timeout),
    )
    .await
    {
        Ok(store) => facade = facade.with_store(Arc::new(store)),
        Err(err) => error!(backend = %Backend::Document, error = %err, "store unavailable"),
    }

    match connect_with_timeout(
        config,
        Backend::Relational,
        connect_relational_store(&config.relational, config.auto_migrate),
    )
    .await
    {
        Ok(store) => facade = facade.with_store(Arc::new(store)),
        Err(err) => error!(backend = %Backend::Relational, error = %err, "store unavailable"),
    }

    facade
}

async fn connect_with_timeout<S, F>(
    config: &AppConfig,
    backend: Backend,
    connect: F,
) -> Result<S, BootstrapError>
where
    S: InventoryStore,
    F: std::future::Future<Output = Result<S, BootstrapError>>,
{
    tokio::time::timeout(config.connect_timeout, connect)
        .await
        .map_err(|_| BootstrapError::ConnectTimeout {
            backend,
            timeout_ms: config.connect_timeout.as_millis(),
        })?
}

/// Connect to MongoDB and confirm the deployment answers a ping.
#[instrument(skip_all, fields(database = %document.database, collection = %document.collection))]
pub async fn connect_document_store(
    document: &DocumentConfig,
    connect_timeout: Duration,
) -> Result<DocumentStore, BootstrapError> {
    let mut options = ClientOptions::parse(&document.uri).await?;
    options.app_name = Some(APP_NAME.to_string());
    options.connect_timeout = Some(connect_timeout);
    options.server_selection_timeout = Some(connect_timeout);

    let client = Client::with_options(options)?;
    let database = client.database(&document.database);
    database.run_command(doc! { "ping": 1 }, None).await?;

    info!("document store connected");
    Ok(DocumentStore::new(&database, &document.collection))
}

/// Open the Postgres pool and, when asked, create the table.
#[instrument(skip_all, fields(max_connections = relational.max_connections))]
pub async fn connect_relational_store(
    relational: &RelationalConfig,
    auto_migrate: bool,
) -> Result<RelationalStore, BootstrapError> {
    let url = relational
        .database_url
        .as_deref()
        .ok_or(BootstrapError::MissingDatabaseUrl)?;

    let pool = PgPoolOptions::new()
        .max_connections(relational.max_connections)
        .connect(url)
        .await?;

    let store = RelationalStore::new(pool);
    if auto_migrate {
        store.ensure_schema().await?;
    }

    info!(auto_migrate, "relational store connected");
    Ok(store)
}
