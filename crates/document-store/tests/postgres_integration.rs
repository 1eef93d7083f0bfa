//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p document-store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use document_store::{
    Document, DocumentQuery, DocumentStore, DocumentStoreExt, PostgresDocumentStore, SessionMode,
    StoreError, TransactionSupport,
};
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_documents_table.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresDocumentStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE documents")
        .execute(&pool)
        .await
        .unwrap();

    PostgresDocumentStore::new(pool)
        .probe_transaction_support()
        .await
        .unwrap()
}

fn product(key: &str, stock: u32) -> Document {
    Document::new(
        "products",
        key,
        serde_json::json!({ "name": key, "stock": stock, "status": "available" }),
    )
}

#[tokio::test]
async fn probe_reports_supported() {
    let store = get_test_store().await;
    assert_eq!(store.transaction_support(), TransactionSupport::Supported);
}

#[tokio::test]
async fn insert_and_lookup_by_id_and_key() {
    let store = get_test_store().await;
    let doc = product("P1", 10);
    let id = doc.id;
    store.insert(doc).await.unwrap();

    let by_id = store.get("products", id).await.unwrap().unwrap();
    assert_eq!(by_id.key, "P1");
    assert_eq!(by_id.body["stock"], 10);

    let by_key = store.find_by_key("products", "P1").await.unwrap().unwrap();
    assert_eq!(by_key.id, id);

    let by_ref = store
        .find_by_ref("products", &id.to_string())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_ref.id, id);
}

#[tokio::test]
async fn duplicate_key_maps_to_typed_error() {
    let store = get_test_store().await;
    store.insert(product("P1", 1)).await.unwrap();

    let result = store.insert(product("P1", 2)).await;
    assert!(matches!(result, Err(StoreError::DuplicateKey { ref key, .. }) if key == "P1"));
}

#[tokio::test]
async fn query_by_refs_matches_either_identifier() {
    let store = get_test_store().await;
    let p1 = product("P1", 1);
    let p1_id = p1.id.to_string();
    store.insert(p1).await.unwrap();
    store.insert(product("P2", 2)).await.unwrap();
    store.insert(product("P3", 3)).await.unwrap();

    let docs = store
        .query(DocumentQuery::by_refs("products", &[p1_id, "P2".to_string()]))
        .await
        .unwrap();
    let mut keys: Vec<_> = docs.iter().map(|d| d.key.clone()).collect();
    keys.sort();
    assert_eq!(keys, vec!["P1", "P2"]);
}

#[tokio::test]
async fn oversized_limit_and_offset_are_clamped() {
    let store = get_test_store().await;
    store.insert(product("P1", 1)).await.unwrap();
    store.insert(product("P2", 2)).await.unwrap();

    let docs = store
        .query(DocumentQuery::collection("products").limit(usize::MAX))
        .await
        .unwrap();
    assert_eq!(docs.len(), 2);

    let docs = store
        .query(DocumentQuery::collection("products").offset(usize::MAX))
        .await
        .unwrap();
    assert!(docs.is_empty());
}

#[tokio::test]
async fn query_by_field_value() {
    let store = get_test_store().await;
    store.insert(product("P1", 1)).await.unwrap();
    store
        .insert(Document::new(
            "products",
            "P2",
            serde_json::json!({ "status": "unavailable" }),
        ))
        .await
        .unwrap();

    let docs = store
        .query(
            DocumentQuery::collection("products")
                .field_equals("status", serde_json::json!("available")),
        )
        .await
        .unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].key, "P1");
}

#[tokio::test]
async fn transaction_rollback_leaves_no_trace() {
    let store = get_test_store().await;
    let doc = product("P1", 5);
    store.insert(doc.clone()).await.unwrap();

    let mut session = store
        .start_session(SessionMode::Transactional)
        .await
        .unwrap();
    let mut updated = doc.clone();
    updated.set_body(&serde_json::json!({ "stock": 0 })).unwrap();
    session.replace(updated).await.unwrap();
    session
        .insert(Document::new("orders", "OD-1", serde_json::json!({})))
        .await
        .unwrap();
    assert!(session.key_exists("orders", "OD-1").await.unwrap());
    session.abort().await.unwrap();

    let loaded = store.get("products", doc.id).await.unwrap().unwrap();
    assert_eq!(loaded.body["stock"], 5);
    assert_eq!(store.count("orders").await.unwrap(), 0);
}

#[tokio::test]
async fn transaction_commit_persists_all_writes() {
    let store = get_test_store().await;
    let doc = product("P1", 5);
    store.insert(doc.clone()).await.unwrap();

    let mut session = store
        .start_session(SessionMode::Transactional)
        .await
        .unwrap();
    let found = session
        .find(DocumentQuery::by_refs("products", &["P1"]))
        .await
        .unwrap();
    let mut updated = found[0].clone();
    updated.set_body(&serde_json::json!({ "stock": 3 })).unwrap();
    session.replace(updated).await.unwrap();
    session
        .insert(Document::new("orders", "OD-1", serde_json::json!({})))
        .await
        .unwrap();
    session.commit().await.unwrap();

    let loaded = store.get("products", doc.id).await.unwrap().unwrap();
    assert_eq!(loaded.body["stock"], 3);
    assert_eq!(store.count("orders").await.unwrap(), 1);
}

#[tokio::test]
async fn autocommit_session_writes_immediately() {
    let store = get_test_store().await;
    let mut session = store.start_session(SessionMode::Autocommit).await.unwrap();
    session.insert(product("P1", 1)).await.unwrap();
    session.abort().await.unwrap();

    assert_eq!(store.count("products").await.unwrap(), 1);
}

#[tokio::test]
async fn replace_missing_document_is_not_found() {
    let store = get_test_store().await;
    let result = store.replace(product("P1", 1)).await;
    assert!(matches!(result, Err(StoreError::NotFound { .. })));
}
