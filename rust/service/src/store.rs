//! Document persistence.
//!
//! Games, action rows and statistics rows are schemaless JSON objects kept in
//! named collections. Every backend orders a collection by insertion and
//! supports equality filters, so callers never depend on the backend in use.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, RwLock};
use thiserror::Error;
use uuid::Uuid;

pub type DocumentId = String;

pub const GAMES: &str = "games";
pub const PLAYER_ACTIONS: &str = "playerActions";
pub const GAME_STATS: &str = "gameStats";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document {0} not found")]
    NotFound(DocumentId),
    #[error("Documents must be JSON objects")]
    NotAnObject,
    #[error("Store storage poisoned")]
    StoragePoisoned,
    #[error("Failed to encode document: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Failed to prepare database directory: {0}")]
    Io(#[from] std::io::Error),
}

/// A document as read back from a store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: DocumentId,
    pub collection: String,
    /// Insertion sequence, global to the store
    pub seq: i64,
    pub body: Value,
}

impl StoredDocument {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.body.get(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    Neq(String, Value),
}

impl Filter {
    fn matches(&self, body: &Value) -> bool {
        match self {
            Filter::Eq(field, value) => body.get(field) == Some(value),
            Filter::Neq(field, value) => body.get(field) != Some(value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

/// Collection scan with filters, insertion ordering and an optional limit.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub order: Order,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
            order: Order::Asc,
            limit: None,
        }
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(field.into(), value.into()));
        self
    }

    pub fn neq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Neq(field.into(), value.into()));
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    pub fn take(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    fn matches(&self, body: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(body))
    }

    /// Applies filters, order and limit to documents already restricted to
    /// the collection and sorted by ascending sequence.
    fn select(&self, mut docs: Vec<StoredDocument>) -> Vec<StoredDocument> {
        if self.order == Order::Desc {
            docs.reverse();
        }
        let limit = self.limit.unwrap_or(usize::MAX);
        docs.into_iter()
            .filter(|d| self.matches(&d.body))
            .take(limit)
            .collect()
    }
}

/// One write inside an atomic batch.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Insert { collection: String, document: Value },
    Patch { id: DocumentId, fields: Value },
}

/// Repository interface every backend implements.
pub trait DocumentStore: Send + Sync {
    /// Inserts a new document and returns its generated id.
    fn insert(&self, collection: &str, document: Value) -> Result<DocumentId, StoreError> {
        let ids = self.apply(vec![WriteOp::Insert {
            collection: collection.to_string(),
            document,
        }])?;
        ids.into_iter().next().ok_or(StoreError::NotAnObject)
    }

    /// Merges the top-level fields of `fields` into an existing document.
    fn patch(&self, id: &str, fields: Value) -> Result<(), StoreError> {
        self.apply(vec![WriteOp::Patch {
            id: id.to_string(),
            fields,
        }])?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<StoredDocument>, StoreError>;

    fn query(&self, query: &Query) -> Result<Vec<StoredDocument>, StoreError>;

    /// Applies every write or none of them. Returns the ids of inserted
    /// documents in batch order.
    fn apply(&self, ops: Vec<WriteOp>) -> Result<Vec<DocumentId>, StoreError>;
}

fn as_object(value: Value) -> Result<Map<String, Value>, StoreError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::NotAnObject),
    }
}

fn merge(target: &mut Value, fields: Map<String, Value>) -> Result<(), StoreError> {
    let obj = target.as_object_mut().ok_or(StoreError::NotAnObject)?;
    for (k, v) in fields {
        obj.insert(k, v);
    }
    Ok(())
}

#[derive(Debug, Default)]
struct MemoryInner {
    docs: HashMap<DocumentId, StoredDocument>,
    next_seq: i64,
}

/// `RwLock<HashMap>` backend for tests and the simulator.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|g| g.docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, id: &str) -> Result<Option<StoredDocument>, StoreError> {
        let guard = self.inner.read().map_err(|_| StoreError::StoragePoisoned)?;
        Ok(guard.docs.get(id).cloned())
    }

    fn query(&self, query: &Query) -> Result<Vec<StoredDocument>, StoreError> {
        let guard = self.inner.read().map_err(|_| StoreError::StoragePoisoned)?;
        let mut docs: Vec<StoredDocument> = guard
            .docs
            .values()
            .filter(|d| d.collection == query.collection)
            .cloned()
            .collect();
        docs.sort_by_key(|d| d.seq);
        Ok(query.select(docs))
    }

    fn apply(&self, ops: Vec<WriteOp>) -> Result<Vec<DocumentId>, StoreError> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| StoreError::StoragePoisoned)?;

        // stage on copies so a failing op leaves the store untouched
        let mut staged: HashMap<DocumentId, StoredDocument> = HashMap::new();
        let mut next_seq = guard.next_seq;
        let mut ids = Vec::new();
        for op in ops {
            match op {
                WriteOp::Insert {
                    collection,
                    document,
                } => {
                    let body = Value::Object(as_object(document)?);
                    let id = Uuid::new_v4().to_string();
                    next_seq += 1;
                    staged.insert(
                        id.clone(),
                        StoredDocument {
                            id: id.clone(),
                            collection,
                            seq: next_seq,
                            body,
                        },
                    );
                    ids.push(id);
                }
                WriteOp::Patch { id, fields } => {
                    let fields = as_object(fields)?;
                    let mut doc = match staged.remove(&id) {
                        Some(doc) => doc,
                        None => guard
                            .docs
                            .get(&id)
                            .cloned()
                            .ok_or_else(|| StoreError::NotFound(id.clone()))?,
                    };
                    merge(&mut doc.body, fields)?;
                    staged.insert(id, doc);
                }
            }
        }

        guard.docs.extend(staged);
        guard.next_seq = next_seq;
        Ok(ids)
    }
}

/// Durable backend: one `documents` table holding JSON text.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<rusqlite::Connection>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::init(rusqlite::Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(rusqlite::Connection::open_in_memory()?)
    }

    fn init(conn: rusqlite::Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS documents (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                collection TEXT NOT NULL,
                body TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS documents_collection ON documents (collection, seq);",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn row_to_doc(row: &rusqlite::Row<'_>) -> rusqlite::Result<(i64, String, String, String)> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
    }

    fn decode(raw: (i64, String, String, String)) -> Result<StoredDocument, StoreError> {
        let (seq, id, collection, body) = raw;
        Ok(StoredDocument {
            id,
            collection,
            seq,
            body: serde_json::from_str(&body)?,
        })
    }
}

impl DocumentStore for SqliteStore {
    fn get(&self, id: &str) -> Result<Option<StoredDocument>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::StoragePoisoned)?;
        let mut stmt =
            conn.prepare("SELECT seq, id, collection, body FROM documents WHERE id = ?1")?;
        let mut rows = stmt.query_map(rusqlite::params![id], Self::row_to_doc)?;
        let found = match rows.next() {
            Some(raw) => Some(Self::decode(raw?)?),
            None => None,
        };
        Ok(found)
    }

    fn query(&self, query: &Query) -> Result<Vec<StoredDocument>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::StoragePoisoned)?;
        let mut stmt = conn.prepare(
            "SELECT seq, id, collection, body FROM documents WHERE collection = ?1 ORDER BY seq ASC",
        )?;
        let docs = stmt
            .query_map(rusqlite::params![&query.collection], Self::row_to_doc)?
            .map(|raw| Self::decode(raw?))
            .collect::<Result<Vec<_>, StoreError>>()?;
        Ok(query.select(docs))
    }

    fn apply(&self, ops: Vec<WriteOp>) -> Result<Vec<DocumentId>, StoreError> {
        let mut conn = self.conn.lock().map_err(|_| StoreError::StoragePoisoned)?;
        let tx = conn.transaction()?;
        let mut ids = Vec::new();
        for op in ops {
            match op {
                WriteOp::Insert {
                    collection,
                    document,
                } => {
                    let body = Value::Object(as_object(document)?);
                    let id = Uuid::new_v4().to_string();
                    tx.execute(
                        "INSERT INTO documents (id, collection, body) VALUES (?1, ?2, ?3)",
                        rusqlite::params![&id, &collection, serde_json::to_string(&body)?],
                    )?;
                    ids.push(id);
                }
                WriteOp::Patch { id, fields } => {
                    let fields = as_object(fields)?;
                    let current: Option<String> = {
                        let mut stmt = tx.prepare("SELECT body FROM documents WHERE id = ?1")?;
                        let mut rows = stmt.query_map(rusqlite::params![&id], |r| r.get(0))?;
                        let body = rows.next().transpose()?;
                        body
                    };
                    let mut body: Value = match current {
                        Some(text) => serde_json::from_str(&text)?,
                        None => return Err(StoreError::NotFound(id)),
                    };
                    merge(&mut body, fields)?;
                    tx.execute(
                        "UPDATE documents SET body = ?1 WHERE id = ?2",
                        rusqlite::params![serde_json::to_string(&body)?, &id],
                    )?;
                }
            }
        }
        tx.commit()?;
        Ok(ids)
    }
}
