//! Document storage: one collection per form, JSON documents in SQLite.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{Connection, params};
use serde::Serialize;
use serde_json::Value;

use libreforms_common::Document;

/// A document as read back from a collection.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub collection: String,
    pub created_at: String,
    pub body: Document,
}

impl StoredDocument {
    /// The document with its `_id` as the leading key.
    pub fn into_record(self) -> Document {
        let mut record = Document::new();
        record.insert("_id".to_string(), Value::String(self.id));
        for (key, value) in self.body {
            if key != "_id" {
                record.insert(key, value);
            }
        }
        record
    }
}

/// Persistence seam used by the HTTP layer.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn write_document_to_collection(
        &self,
        document: Document,
        collection: &str,
    ) -> Result<StoredDocument>;

    /// Write all documents or none.
    async fn write_documents_to_collection(
        &self,
        documents: Vec<Document>,
        collection: &str,
    ) -> Result<usize>;

    async fn read_documents_from_collection(&self, collection: &str) -> Result<Vec<StoredDocument>>;
}

pub struct DocumentDb {
    conn: Connection,
}

impl DocumentDb {
    /// Open (or create) a SQLite database at the given path and create the schema.
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).context("Failed to open SQLite database")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Create an in-memory SQLite database (for testing).
    pub fn new_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS documents (
                    seq INTEGER PRIMARY KEY AUTOINCREMENT,
                    id TEXT NOT NULL UNIQUE,
                    collection TEXT NOT NULL,
                    body TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection, seq);
                ",
            )
            .context("Failed to create tables")?;
        Ok(())
    }

    fn insert(&self, collection: &str, document: &Document) -> Result<StoredDocument> {
        let id = uuid::Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now().to_rfc3339();
        let body = serde_json::to_string(document).context("Failed to serialize document")?;
        self.conn
            .execute(
                "INSERT INTO documents (id, collection, body, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![id, collection, body, created_at],
            )
            .context("Failed to insert document")?;
        Ok(StoredDocument {
            id,
            collection: collection.to_string(),
            created_at,
            body: document.clone(),
        })
    }

    pub fn insert_document(&self, collection: &str, document: &Document) -> Result<StoredDocument> {
        self.insert(collection, document)
    }

    /// Insert every document inside one transaction.
    pub fn insert_documents(&self, collection: &str, documents: &[Document]) -> Result<usize> {
        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin transaction")?;
        for document in documents {
            self.insert(collection, document)?;
        }
        tx.commit().context("Failed to commit documents")?;
        Ok(documents.len())
    }

    pub fn list_documents(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, collection, body, created_at FROM documents
                 WHERE collection = ?1 ORDER BY seq",
            )
            .context("Failed to prepare list_documents")?;
        let rows = stmt
            .query_map(params![collection], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .context("Failed to query documents")?;

        let mut documents = Vec::new();
        for row in rows {
            let (id, collection, body, created_at) = row.context("Failed to read document row")?;
            let body: Document = serde_json::from_str(&body)
                .with_context(|| format!("Document {} has a malformed body", id))?;
            documents.push(StoredDocument {
                id,
                collection,
                created_at,
                body,
            });
        }
        Ok(documents)
    }

    pub fn count_documents(&self, collection: &str) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM documents WHERE collection = ?1",
                params![collection],
                |row| row.get(0),
            )
            .context("Failed to count documents")?;
        Ok(count as usize)
    }
}

/// Async-safe handle to the document database.
///
/// All access runs on tokio's blocking pool so SQLite I/O never stalls the
/// async workers.
#[derive(Clone)]
pub struct StoreHandle {
    inner: Arc<std::sync::Mutex<DocumentDb>>,
}

impl StoreHandle {
    pub fn new(db: DocumentDb) -> Self {
        Self {
            inner: Arc::new(std::sync::Mutex::new(db)),
        }
    }

    /// Run a closure with access to the database on a blocking thread.
    pub async fn call<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&DocumentDb) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let db = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = db
                .lock()
                .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
            f(&guard)
        })
        .await
        .context("DB task panicked")?
    }
}

#[async_trait]
impl DocumentStore for StoreHandle {
    async fn write_document_to_collection(
        &self,
        document: Document,
        collection: &str,
    ) -> Result<StoredDocument> {
        let collection = collection.to_string();
        self.call(move |db| db.insert_document(&collection, &document))
            .await
    }

    async fn write_documents_to_collection(
        &self,
        documents: Vec<Document>,
        collection: &str,
    ) -> Result<usize> {
        let collection = collection.to_string();
        self.call(move |db| db.insert_documents(&collection, &documents))
            .await
    }

    async fn read_documents_from_collection(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        let collection = collection.to_string();
        self.call(move |db| db.list_documents(&collection)).await
    }
}
