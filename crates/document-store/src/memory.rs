use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use crate::{
    Document, DocumentId, DocumentQuery, Result, StoreError,
    store::{DocumentStore, Session, SessionMode, TransactionSupport, validate_document},
};

/// Message reported when transactions are rejected at runtime, in the shape a
/// standalone document database reports it.
const REJECTED_TRANSACTION_MESSAGE: &str =
    "Transaction numbers are only allowed on a replica set member or mongos";

#[derive(Debug, Clone, Default)]
struct Tables {
    collections: HashMap<String, BTreeMap<DocumentId, Document>>,
}

impl Tables {
    fn find(&self, query: &DocumentQuery) -> Vec<Document> {
        let Some(collection) = self.collections.get(&query.collection) else {
            return Vec::new();
        };

        let mut docs: Vec<Document> = collection
            .values()
            .filter(|doc| query.matches(doc))
            .cloned()
            .collect();

        docs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        if query.newest_first {
            docs.reverse();
        }

        let offset = query.offset.unwrap_or(0);
        let docs = docs.into_iter().skip(offset);
        match query.limit {
            Some(limit) => docs.take(limit).collect(),
            None => docs.collect(),
        }
    }

    fn get(&self, collection: &str, id: DocumentId) -> Option<Document> {
        self.collections.get(collection)?.get(&id).cloned()
    }

    fn find_by_key(&self, collection: &str, key: &str) -> Option<Document> {
        self.collections
            .get(collection)?
            .values()
            .find(|doc| doc.key == key)
            .cloned()
    }

    fn key_taken_by_other(&self, document: &Document) -> bool {
        self.collections
            .get(&document.collection)
            .is_some_and(|c| c.values().any(|d| d.key == document.key && d.id != document.id))
    }

    fn insert(&mut self, document: Document) -> Result<()> {
        validate_document(&document).map_err(|e| StoreError::InvalidDocument(e.message))?;

        if self.key_taken_by_other(&document) {
            return Err(StoreError::DuplicateKey {
                collection: document.collection,
                key: document.key,
            });
        }

        let collection = self
            .collections
            .entry(document.collection.clone())
            .or_default();
        if collection.contains_key(&document.id) {
            return Err(StoreError::Backend(format!(
                "document id {} already present in {}",
                document.id, document.collection
            )));
        }
        collection.insert(document.id, document);
        Ok(())
    }

    fn replace(&mut self, mut document: Document) -> Result<()> {
        validate_document(&document).map_err(|e| StoreError::InvalidDocument(e.message))?;

        if self.key_taken_by_other(&document) {
            return Err(StoreError::DuplicateKey {
                collection: document.collection,
                key: document.key,
            });
        }

        let existing = self
            .collections
            .get_mut(&document.collection)
            .and_then(|c| c.get_mut(&document.id))
            .ok_or_else(|| StoreError::NotFound {
                collection: document.collection.clone(),
                id: document.id,
            })?;

        document.created_at = existing.created_at;
        *existing = document;
        Ok(())
    }

    fn count(&self, collection: &str) -> usize {
        self.collections.get(collection).map_or(0, BTreeMap::len)
    }
}

/// Failure switches used by tests to reproduce deployment problems.
#[derive(Debug, Default)]
struct FaultSwitches {
    reject_transactions: AtomicBool,
    fail_inserts: std::sync::RwLock<Option<String>>,
    reject_transactional_writes: std::sync::RwLock<Option<String>>,
}

fn switch_matches(switch: &std::sync::RwLock<Option<String>>, collection: &str) -> bool {
    switch
        .read()
        .map(|guard| guard.as_deref() == Some(collection))
        .unwrap_or(false)
}

impl FaultSwitches {
    fn check_insert(&self, collection: &str) -> Result<()> {
        if switch_matches(&self.fail_inserts, collection) {
            return Err(StoreError::Backend(format!(
                "insert into {collection} rejected"
            )));
        }
        Ok(())
    }

    fn check_transactional_write(&self, collection: &str) -> Result<()> {
        if switch_matches(&self.reject_transactional_writes, collection) {
            return Err(StoreError::TransactionUnsupported(
                REJECTED_TRANSACTION_MESSAGE.to_string(),
            ));
        }
        Ok(())
    }
}

/// In-memory document store implementation.
///
/// Transactional sessions hold the store's write lock from start to commit,
/// so transactions are fully serialized. Autocommit sessions lock per
/// operation and give no isolation between a read and a later write.
#[derive(Clone)]
pub struct InMemoryDocumentStore {
    tables: Arc<RwLock<Tables>>,
    support: TransactionSupport,
    faults: Arc<FaultSwitches>,
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDocumentStore {
    /// Creates a new empty store that supports transactions.
    pub fn new() -> Self {
        Self::with_transaction_support(TransactionSupport::Supported)
    }

    /// Creates a new empty store with the given transaction capability.
    pub fn with_transaction_support(support: TransactionSupport) -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            support,
            faults: Arc::new(FaultSwitches::default()),
        }
    }

    /// Makes transactional sessions fail to start even though the store
    /// advertises support, as happens when a deployment's topology changes
    /// under a running process.
    pub fn set_reject_transactions(&self, reject: bool) {
        self.faults
            .reject_transactions
            .store(reject, Ordering::SeqCst);
    }

    /// Makes every insert into `collection` fail. `None` clears the switch.
    pub fn set_fail_inserts(&self, collection: Option<&str>) {
        if let Ok(mut guard) = self.faults.fail_inserts.write() {
            *guard = collection.map(str::to_string);
        }
    }

    /// Makes transactional writes to `collection` fail as unsupported after
    /// the session has started, as a server does when it only learns about
    /// the transaction on the first write. `None` clears the switch.
    pub fn set_reject_transactional_writes(&self, collection: Option<&str>) {
        if let Ok(mut guard) = self.faults.reject_transactional_writes.write() {
            *guard = collection.map(str::to_string);
        }
    }

    /// Removes every document.
    pub async fn clear(&self) {
        self.tables.write().await.collections.clear();
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    fn transaction_support(&self) -> TransactionSupport {
        self.support
    }

    async fn start_session(&self, mode: SessionMode) -> Result<Box<dyn Session>> {
        match mode {
            SessionMode::Transactional => {
                if !self.support.is_supported() {
                    return Err(StoreError::TransactionUnsupported(
                        "store was configured without transaction support".to_string(),
                    ));
                }
                if self.faults.reject_transactions.load(Ordering::SeqCst) {
                    return Err(StoreError::TransactionUnsupported(
                        REJECTED_TRANSACTION_MESSAGE.to_string(),
                    ));
                }

                let guard = self.tables.clone().write_owned().await;
                let staged = guard.clone();
                tracing::debug!("in-memory transaction started");
                Ok(Box::new(MemoryTransaction {
                    guard,
                    staged,
                    faults: self.faults.clone(),
                }))
            }
            SessionMode::Autocommit => Ok(Box::new(MemoryAutocommit {
                tables: self.tables.clone(),
                faults: self.faults.clone(),
            })),
        }
    }

    async fn get(&self, collection: &str, id: DocumentId) -> Result<Option<Document>> {
        Ok(self.tables.read().await.get(collection, id))
    }

    async fn find_by_key(&self, collection: &str, key: &str) -> Result<Option<Document>> {
        Ok(self.tables.read().await.find_by_key(collection, key))
    }

    async fn query(&self, query: DocumentQuery) -> Result<Vec<Document>> {
        Ok(self.tables.read().await.find(&query))
    }

    async fn insert(&self, document: Document) -> Result<()> {
        self.faults.check_insert(&document.collection)?;
        self.tables.write().await.insert(document)
    }

    async fn replace(&self, document: Document) -> Result<()> {
        self.tables.write().await.replace(document)
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        Ok(self.tables.read().await.count(collection))
    }
}

/// Transactional session: works on a private copy while holding the lock.
struct MemoryTransaction {
    guard: OwnedRwLockWriteGuard<Tables>,
    staged: Tables,
    faults: Arc<FaultSwitches>,
}

#[async_trait]
impl Session for MemoryTransaction {
    fn mode(&self) -> SessionMode {
        SessionMode::Transactional
    }

    async fn find(&mut self, query: DocumentQuery) -> Result<Vec<Document>> {
        Ok(self.staged.find(&query))
    }

    async fn key_exists(&mut self, collection: &str, key: &str) -> Result<bool> {
        Ok(self.staged.find_by_key(collection, key).is_some())
    }

    async fn insert(&mut self, document: Document) -> Result<()> {
        self.faults.check_transactional_write(&document.collection)?;
        self.faults.check_insert(&document.collection)?;
        self.staged.insert(document)
    }

    async fn replace(&mut self, document: Document) -> Result<()> {
        self.faults.check_transactional_write(&document.collection)?;
        self.staged.replace(document)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryTransaction {
            mut guard, staged, ..
        } = *self;
        *guard = staged;
        tracing::debug!("in-memory transaction committed");
        Ok(())
    }

    async fn abort(self: Box<Self>) -> Result<()> {
        tracing::debug!("in-memory transaction aborted");
        Ok(())
    }
}

/// Autocommit session: every call goes straight to the shared tables.
struct MemoryAutocommit {
    tables: Arc<RwLock<Tables>>,
    faults: Arc<FaultSwitches>,
}

#[async_trait]
impl Session for MemoryAutocommit {
    fn mode(&self) -> SessionMode {
        SessionMode::Autocommit
    }

    async fn find(&mut self, query: DocumentQuery) -> Result<Vec<Document>> {
        Ok(self.tables.read().await.find(&query))
    }

    async fn key_exists(&mut self, collection: &str, key: &str) -> Result<bool> {
        Ok(self.tables.read().await.find_by_key(collection, key).is_some())
    }

    async fn insert(&mut self, document: Document) -> Result<()> {
        self.faults.check_insert(&document.collection)?;
        self.tables.write().await.insert(document)
    }

    async fn replace(&mut self, document: Document) -> Result<()> {
        self.tables.write().await.replace(document)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        Ok(())
    }

    async fn abort(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
