//! Integration tests for the store contract.
//!
//! Tests: Facade → InventoryStore (both id schemes) → normalized results
//!
//! Verifies:
//! - Every store honors the same create/list/get/update/delete semantics
//! - Concurrent writers never lose records or break count/page agreement
//! - Updates never insert
//!
//! The in-memory stores always run. Live stores join the same suite when
//! their connection is configured:
//! - `MONGODB_URI` adds a `DocumentStore` on a fresh collection per test
//! - `DATABASE_URL` (or the full `POSTGRES_*` set) adds a `RelationalStore`
//!
//! Live tables are shared between runs, so every test writes under its own
//! vendor and only reads through that vendor filter.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use stockpile_core::{Backend, PageRequest, RecordId};
    use stockpile_inventory::ItemDraft;
    use uuid::Uuid;

    use crate::bootstrap::{connect_document_store, connect_relational_store};
    use crate::config::AppConfig;
    use crate::context::OperationContext;
    use crate::facade::{InventoryError, InventoryFacade};
    use crate::store::{InMemoryStore, InventoryStore, ListQuery, StoreError};

    fn ctx() -> OperationContext {
        OperationContext::background()
    }

    fn draft(name: &str, vendor: &str, accessories: &[&str]) -> ItemDraft {
        ItemDraft {
            name: name.to_string(),
            price: 1_250,
            currency: "USD".to_string(),
            discount: 50,
            vendor: vendor.to_string(),
            accessories: accessories.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Vendor unique to one test run.
    fn run_vendor(label: &str) -> String {
        format!("{label}-{}", Uuid::new_v4().simple())
    }

    fn by_vendors(page: i64, page_size: i64, vendors: &[&str]) -> ListQuery {
        ListQuery::new(
            PageRequest::new(page, page_size).unwrap(),
            vendors.iter().map(|v| v.to_string()).collect(),
        )
    }

    /// Ids that are well-formed for `backend` but never issued.
    fn unknown_id(backend: Backend) -> RecordId {
        match backend {
            Backend::Document => RecordId::new("000000000000000000000000"),
            Backend::Relational => RecordId::new(Uuid::new_v4().to_string()),
        }
    }

    /// A well-formed id for the other backend's scheme.
    fn foreign_id(backend: Backend) -> RecordId {
        match backend {
            Backend::Document => RecordId::new(Uuid::new_v4().to_string()),
            Backend::Relational => RecordId::new("65f0c0ffee00000000000001"),
        }
    }

    async fn stores() -> Vec<Arc<dyn InventoryStore>> {
        let mut stores: Vec<Arc<dyn InventoryStore>> = vec![
            InMemoryStore::arc(Backend::Document),
            InMemoryStore::arc(Backend::Relational),
        ];

        let config = AppConfig::from_env().unwrap();

        if std::env::var("MONGODB_URI").is_ok_and(|uri| !uri.trim().is_empty()) {
            let mut document = config.document.clone();
            document.collection = format!("contract_{}", Uuid::new_v4().simple());
            let store = connect_document_store(&document, config.connect_timeout)
                .await
                .expect("MONGODB_URI is set but the document store did not connect");
            stores.push(Arc::new(store));
        }

        if config.relational.database_url.is_some() {
            let store = connect_relational_store(&config.relational, true)
                .await
                .expect("DATABASE_URL is set but the relational store did not connect");
            stores.push(Arc::new(store));
        }

        stores
    }

    #[tokio::test]
    async fn contract_create_get_update_delete() {
        for store in stores().await {
            let backend = store.backend();
            let vendor = run_vendor("lifecycle");

            let created = store
                .create(draft("Widget", &vendor, &["cable"]))
                .await
                .unwrap();
            assert_eq!(created.to_draft(), draft("Widget", &vendor, &["cable"]));

            assert_eq!(store.get(&created.id).await.unwrap(), created);

            let updated = store
                .update(&created.id, draft("Widget-2", &vendor, &[]))
                .await
                .unwrap();
            assert_eq!(updated.id, created.id);
            assert_eq!(updated.name, "Widget-2", "{backend}: fields replaced");
            assert!(updated.accessories.is_empty(), "{backend}: accessories replaced");
            assert_eq!(store.get(&created.id).await.unwrap(), updated);

            store.delete(&created.id).await.unwrap();
            assert_eq!(
                store.get(&created.id).await,
                Err(StoreError::NotFound(created.id.clone()))
            );
            assert_eq!(
                store.delete(&created.id).await,
                Err(StoreError::NotFound(created.id.clone())),
                "{backend}: second delete finds nothing"
            );
        }
    }

    #[tokio::test]
    async fn contract_update_never_inserts() {
        for store in stores().await {
            let missing = unknown_id(store.backend());
            let vendor = run_vendor("ghost");

            assert_eq!(
                store.update(&missing, draft("Ghost", &vendor, &[])).await,
                Err(StoreError::NotFound(missing.clone()))
            );
            assert_eq!(
                store.delete(&missing).await,
                Err(StoreError::NotFound(missing.clone()))
            );

            let listing = store.list(&by_vendors(1, 10, &[&vendor])).await.unwrap();
            assert_eq!(listing.total, 0, "{}: nothing upserted", store.backend());
            assert!(listing.items.is_empty());
        }
    }

    #[tokio::test]
    async fn contract_vendor_filter_scopes_items_and_total() {
        for store in stores().await {
            let backend = store.backend();
            let acme = run_vendor("acme");
            let globex = run_vendor("globex");

            let mut acme_ids = HashSet::new();
            for name in ["a", "b", "c"] {
                let record = store.create(draft(name, &acme, &[])).await.unwrap();
                acme_ids.insert(record.id);
            }
            store.create(draft("d", &globex, &[])).await.unwrap();

            let listing = store.list(&by_vendors(1, 10, &[&acme])).await.unwrap();
            assert_eq!(listing.total, 3, "{backend}: filtered count");
            assert!(listing.items.iter().all(|r| r.vendor == acme));

            let both = store
                .list(&by_vendors(1, 10, &[&acme, &globex]))
                .await
                .unwrap();
            assert_eq!(both.total, 4, "{backend}: any listed vendor matches");
            assert_eq!(both.items.len(), 4);

            // Pages of two tile the filtered set without overlap.
            let first = store.list(&by_vendors(1, 2, &[&acme])).await.unwrap();
            let second = store.list(&by_vendors(2, 2, &[&acme])).await.unwrap();
            assert_eq!(first.items.len(), 2);
            assert_eq!(second.items.len(), 1);
            assert_eq!(second.total, 3);

            let paged: HashSet<_> = first
                .items
                .into_iter()
                .chain(second.items)
                .map(|r| r.id)
                .collect();
            assert_eq!(paged, acme_ids, "{backend}: pages cover the filter once");

            let beyond = store.list(&by_vendors(3, 2, &[&acme])).await.unwrap();
            assert!(beyond.items.is_empty());
            assert_eq!(beyond.total, 3);
        }
    }

    #[tokio::test]
    async fn contract_huge_page_is_empty_not_an_error() {
        for store in stores().await {
            let vendor = run_vendor("huge");
            store.create(draft("Widget", &vendor, &[])).await.unwrap();

            let listing = store
                .list(&by_vendors(4_611_686_018_427_387_904, 4, &[&vendor]))
                .await
                .unwrap();
            assert!(listing.items.is_empty(), "{}", store.backend());
            assert_eq!(listing.total, 1);
        }
    }

    #[tokio::test]
    async fn contract_foreign_ids_are_invalid_before_any_lookup() {
        for store in stores().await {
            let backend = store.backend();
            let id = foreign_id(backend);

            for result in [
                store.get(&id).await.map(|_| ()),
                store.update(&id, draft("x", "y", &[])).await.map(|_| ()),
                store.delete(&id).await,
            ] {
                match result {
                    Err(StoreError::InvalidIdentifier { backend: got, .. }) => {
                        assert_eq!(got, backend)
                    }
                    other => panic!("Expected InvalidIdentifier from {backend}, got {other:?}"),
                }
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn relational_list_counts_and_pages_one_snapshot() {
        for store in stores().await {
            if store.backend() != Backend::Relational {
                continue;
            }
            let vendor = run_vendor("snapshot");

            let writer = {
                let store = store.clone();
                let vendor = vendor.clone();
                tokio::spawn(async move {
                    for n in 0..30 {
                        store
                            .create(draft(&format!("item-{n}"), &vendor, &[]))
                            .await
                            .unwrap();
                    }
                })
            };

            let query = by_vendors(1, -1, &[&vendor]);
            while !writer.is_finished() {
                let listing = store.list(&query).await.unwrap();
                assert_eq!(
                    listing.items.len() as u64,
                    listing.total,
                    "count and page disagree"
                );
                tokio::task::yield_now().await;
            }
            writer.await.unwrap();

            let listing = store.list(&query).await.unwrap();
            assert_eq!(listing.total, 30);
            assert_eq!(listing.items.len(), 30);
        }
    }

    #[tokio::test]
    async fn concrete_widget_scenario_through_the_facade() {
        let facade = InventoryFacade::in_memory();

        for backend in Backend::ALL {
            let created = facade
                .create_item(&ctx(), backend, draft("Widget", "Acme", &[]))
                .await
                .unwrap();
            facade
                .update_item(&ctx(), backend, &created.id, draft("Widget-2", "Acme", &[]))
                .await
                .unwrap();

            let fetched = facade.get_item_by_id(&ctx(), backend, &created.id).await.unwrap();
            assert_eq!(fetched.name, "Widget-2");

            facade.delete_item(&ctx(), backend, &created.id).await.unwrap();
            assert!(matches!(
                facade.get_item_by_id(&ctx(), backend, &created.id).await,
                Err(InventoryError::NotFound(_))
            ));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_are_all_listed_once() {
        let facade = Arc::new(InventoryFacade::in_memory());

        let mut handles = Vec::new();
        for n in 0..40 {
            let facade = facade.clone();
            handles.push(tokio::spawn(async move {
                let vendor = if n % 2 == 0 { "Acme" } else { "Globex" };
                facade
                    .create_item(
                        &OperationContext::background(),
                        Backend::Relational,
                        draft(&format!("item-{n}"), vendor, &[]),
                    )
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let listing = facade
            .get_items(&ctx(), Backend::Relational, 1, -1, Vec::new())
            .await
            .unwrap();
        assert_eq!(listing.total, 40);

        let ids: HashSet<_> = listing.items.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids.len(), 40);

        let acme = facade
            .get_items(&ctx(), Backend::Relational, 1, 5, vec!["Acme".to_string()])
            .await
            .unwrap();
        assert_eq!(acme.total, 20);
        assert_eq!(acme.items.len(), 5);
        assert!(acme.has_more());
    }
}
