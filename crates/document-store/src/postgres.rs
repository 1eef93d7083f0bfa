use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::{
    Document, DocumentId, DocumentQuery, Result, StoreError,
    store::{DocumentStore, Session, SessionMode, TransactionSupport, validate_document},
};

/// Name of the unique constraint on `(collection, key)`.
const UNIQUE_KEY_CONSTRAINT: &str = "unique_collection_key";

/// SQLSTATE `feature_not_supported`, reported by poolers and proxies that
/// cannot hold a transaction open.
const FEATURE_NOT_SUPPORTED: &str = "0A000";

const SELECT_COLUMNS: &str = "SELECT id, collection, key, body, created_at, updated_at FROM documents";

/// PostgreSQL-backed document store implementation.
///
/// Documents live in a single `documents` table with a JSONB body.
/// Transactional sessions lock the rows they read with `FOR UPDATE`.
#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
    support: TransactionSupport,
}

impl PostgresDocumentStore {
    /// Creates a new PostgreSQL document store.
    ///
    /// Transactions are assumed to work; call
    /// [`probe_transaction_support`](Self::probe_transaction_support) to
    /// check the actual deployment.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            support: TransactionSupport::Supported,
        }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    /// Opens and rolls back a transaction to find out whether the deployment
    /// lets us hold one, and records the result.
    pub async fn probe_transaction_support(mut self) -> Result<Self> {
        let probe = async {
            let mut tx = self.pool.begin().await?;
            sqlx::query("SELECT 1").execute(&mut *tx).await?;
            tx.rollback().await
        };

        self.support = match probe.await {
            Ok(()) => TransactionSupport::Supported,
            Err(e) if is_feature_not_supported(&e) => TransactionSupport::Unsupported,
            Err(e) => return Err(StoreError::Database(e)),
        };
        tracing::info!(support = %self.support, "probed transaction support");
        Ok(self)
    }

    fn row_to_document(row: PgRow) -> Result<Document> {
        Ok(Document {
            id: DocumentId::from_uuid(row.try_get::<Uuid, _>("id")?),
            collection: row.try_get("collection")?,
            key: row.try_get("key")?,
            body: row.try_get("body")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        })
    }
}

fn is_feature_not_supported(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(FEATURE_NOT_SUPPORTED))
}

/// Maps a driver error to a store error, recognising key collisions and
/// missing transaction support.
fn classify(e: sqlx::Error, document: Option<&Document>) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.constraint() == Some(UNIQUE_KEY_CONSTRAINT)
        && let Some(doc) = document
    {
        return StoreError::DuplicateKey {
            collection: doc.collection.clone(),
            key: doc.key.clone(),
        };
    }
    if is_feature_not_supported(&e) {
        return StoreError::TransactionUnsupported(e.to_string());
    }
    StoreError::Database(e)
}

/// Builds the SQL for a query. Parameters are bound by [`bind_find`] in the
/// same order.
fn find_sql(query: &DocumentQuery, for_update: bool) -> String {
    let mut sql = format!("{SELECT_COLUMNS} WHERE collection = $1");
    let mut param_count = 1;

    match (&query.ids, &query.keys) {
        (Some(_), Some(_)) => {
            sql.push_str(&format!(
                " AND (id = ANY(${}) OR key = ANY(${}))",
                param_count + 1,
                param_count + 2
            ));
            param_count += 2;
        }
        (Some(_), None) => {
            param_count += 1;
            sql.push_str(&format!(" AND id = ANY(${param_count})"));
        }
        (None, Some(_)) => {
            param_count += 1;
            sql.push_str(&format!(" AND key = ANY(${param_count})"));
        }
        (None, None) => {}
    }

    if query.field_equals.is_some() {
        sql.push_str(&format!(
            " AND body -> ${} = ${}",
            param_count + 1,
            param_count + 2
        ));
        param_count += 2;
    }

    if query.newest_first {
        sql.push_str(" ORDER BY created_at DESC, id DESC");
    } else {
        sql.push_str(" ORDER BY created_at ASC, id ASC");
    }

    if query.limit.is_some() {
        param_count += 1;
        sql.push_str(&format!(" LIMIT ${param_count}"));
    }
    if query.offset.is_some() {
        param_count += 1;
        sql.push_str(&format!(" OFFSET ${param_count}"));
    }

    if for_update {
        sql.push_str(" FOR UPDATE");
    }

    sql
}

fn bind_find<'q>(
    sql: &'q str,
    query: &'q DocumentQuery,
) -> Query<'q, Postgres, PgArguments> {
    let mut q = sqlx::query(sql).bind(&query.collection);

    if let Some(ids) = &query.ids {
        q = q.bind(ids.iter().map(DocumentId::as_uuid).collect::<Vec<_>>());
    }
    if let Some(keys) = &query.keys {
        q = q.bind(keys);
    }
    if let Some((field, value)) = &query.field_equals {
        q = q.bind(field).bind(value);
    }
    if let Some(limit) = query.limit {
        q = q.bind(i64::try_from(limit).unwrap_or(i64::MAX));
    }
    if let Some(offset) = query.offset {
        q = q.bind(i64::try_from(offset).unwrap_or(i64::MAX));
    }
    q
}

const INSERT_SQL: &str = r#"
    INSERT INTO documents (id, collection, key, body, created_at, updated_at)
    VALUES ($1, $2, $3, $4, $5, $6)
"#;

const REPLACE_SQL: &str = r#"
    UPDATE documents
    SET key = $1, body = $2, updated_at = $3
    WHERE id = $4 AND collection = $5
"#;

const KEY_EXISTS_SQL: &str =
    "SELECT EXISTS (SELECT 1 FROM documents WHERE collection = $1 AND key = $2)";

fn bind_insert(document: &Document) -> Query<'_, Postgres, PgArguments> {
    sqlx::query(INSERT_SQL)
        .bind(document.id.as_uuid())
        .bind(&document.collection)
        .bind(&document.key)
        .bind(&document.body)
        .bind(document.created_at)
        .bind(document.updated_at)
}

fn bind_replace(document: &Document) -> Query<'_, Postgres, PgArguments> {
    sqlx::query(REPLACE_SQL)
        .bind(&document.key)
        .bind(&document.body)
        .bind(document.updated_at)
        .bind(document.id.as_uuid())
        .bind(&document.collection)
}

fn not_found(document: &Document) -> StoreError {
    StoreError::NotFound {
        collection: document.collection.clone(),
        id: document.id,
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    fn transaction_support(&self) -> TransactionSupport {
        self.support
    }

    async fn start_session(&self, mode: SessionMode) -> Result<Box<dyn Session>> {
        let conn = match mode {
            SessionMode::Transactional => {
                if !self.support.is_supported() {
                    return Err(StoreError::TransactionUnsupported(
                        "probe found no transaction support".to_string(),
                    ));
                }
                let tx = self.pool.begin().await.map_err(|e| classify(e, None))?;
                Connection::Transaction(tx)
            }
            SessionMode::Autocommit => Connection::Pool(self.pool.clone()),
        };
        Ok(Box::new(PostgresSession { conn }))
    }

    async fn get(&self, collection: &str, id: DocumentId) -> Result<Option<Document>> {
        let row: Option<PgRow> =
            sqlx::query(&format!("{SELECT_COLUMNS} WHERE collection = $1 AND id = $2"))
                .bind(collection)
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        row.map(Self::row_to_document).transpose()
    }

    async fn find_by_key(&self, collection: &str, key: &str) -> Result<Option<Document>> {
        let row: Option<PgRow> =
            sqlx::query(&format!("{SELECT_COLUMNS} WHERE collection = $1 AND key = $2"))
                .bind(collection)
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Self::row_to_document).transpose()
    }

    async fn query(&self, query: DocumentQuery) -> Result<Vec<Document>> {
        let sql = find_sql(&query, false);
        let rows = bind_find(&sql, &query).fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_document).collect()
    }

    async fn insert(&self, document: Document) -> Result<()> {
        validate_document(&document).map_err(|e| StoreError::InvalidDocument(e.message))?;
        bind_insert(&document)
            .execute(&self.pool)
            .await
            .map_err(|e| classify(e, Some(&document)))?;
        Ok(())
    }

    async fn replace(&self, document: Document) -> Result<()> {
        validate_document(&document).map_err(|e| StoreError::InvalidDocument(e.message))?;
        let result = bind_replace(&document)
            .execute(&self.pool)
            .await
            .map_err(|e| classify(e, Some(&document)))?;
        if result.rows_affected() == 0 {
            return Err(not_found(&document));
        }
        Ok(())
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = $1")
            .bind(collection)
            .fetch_one(&self.pool)
            .await?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

enum Connection {
    Transaction(Transaction<'static, Postgres>),
    Pool(PgPool),
}

/// A session over either an open transaction or the pool.
struct PostgresSession {
    conn: Connection,
}

impl PostgresSession {
    async fn fetch_all(
        &mut self,
        q: Query<'_, Postgres, PgArguments>,
    ) -> std::result::Result<Vec<PgRow>, sqlx::Error> {
        match &mut self.conn {
            Connection::Transaction(tx) => q.fetch_all(&mut **tx).await,
            Connection::Pool(pool) => q.fetch_all(&*pool).await,
        }
    }

    async fn execute(
        &mut self,
        q: Query<'_, Postgres, PgArguments>,
    ) -> std::result::Result<u64, sqlx::Error> {
        let result = match &mut self.conn {
            Connection::Transaction(tx) => q.execute(&mut **tx).await?,
            Connection::Pool(pool) => q.execute(&*pool).await?,
        };
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl Session for PostgresSession {
    fn mode(&self) -> SessionMode {
        match self.conn {
            Connection::Transaction(_) => SessionMode::Transactional,
            Connection::Pool(_) => SessionMode::Autocommit,
        }
    }

    async fn find(&mut self, query: DocumentQuery) -> Result<Vec<Document>> {
        let for_update = self.mode() == SessionMode::Transactional;
        let sql = find_sql(&query, for_update);
        let rows = self
            .fetch_all(bind_find(&sql, &query))
            .await
            .map_err(|e| classify(e, None))?;
        rows.into_iter()
            .map(PostgresDocumentStore::row_to_document)
            .collect()
    }

    async fn key_exists(&mut self, collection: &str, key: &str) -> Result<bool> {
        let q = sqlx::query_scalar::<_, bool>(KEY_EXISTS_SQL)
            .bind(collection)
            .bind(key);
        let exists = match &mut self.conn {
            Connection::Transaction(tx) => q.fetch_one(&mut **tx).await,
            Connection::Pool(pool) => q.fetch_one(&*pool).await,
        }
        .map_err(|e| classify(e, None))?;
        Ok(exists)
    }

    async fn insert(&mut self, document: Document) -> Result<()> {
        validate_document(&document).map_err(|e| StoreError::InvalidDocument(e.message))?;
        self.execute(bind_insert(&document))
            .await
            .map_err(|e| classify(e, Some(&document)))?;
        Ok(())
    }

    async fn replace(&mut self, document: Document) -> Result<()> {
        validate_document(&document).map_err(|e| StoreError::InvalidDocument(e.message))?;
        let affected = self
            .execute(bind_replace(&document))
            .await
            .map_err(|e| classify(e, Some(&document)))?;
        if affected == 0 {
            return Err(not_found(&document));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        if let Connection::Transaction(tx) = self.conn {
            tx.commit().await.map_err(|e| classify(e, None))?;
        }
        Ok(())
    }

    async fn abort(self: Box<Self>) -> Result<()> {
        if let Connection::Transaction(tx) = self.conn {
            tx.rollback().await?;
        }
        Ok(())
    }
}
