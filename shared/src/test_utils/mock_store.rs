use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::store::{
    from_json_object, to_json_object, Document, DocumentStore, Filter, Result, StoreError, Update,
};

/// In-memory document store with the same semantics as the DynamoDB one.
///
/// Failures can be switched on per operation kind to exercise compensation
/// paths in callers.
pub struct MockDocumentStore<D> {
    docs: Mutex<Vec<Map<String, Value>>>,
    fail_inserts: AtomicBool,
    fail_updates: AtomicBool,
    fail_deletes: AtomicBool,
    _marker: std::marker::PhantomData<fn() -> D>,
}

impl<D: Document> Default for MockDocumentStore<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Document> MockDocumentStore<D> {
    pub fn new() -> Self {
        Self {
            docs: Mutex::new(Vec::new()),
            fail_inserts: AtomicBool::new(false),
            fail_updates: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
            _marker: std::marker::PhantomData,
        }
    }

    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.docs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.docs.lock().await.is_empty()
    }

    fn injected(&self, flag: &AtomicBool, op: &str) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::DatabaseError(format!(
                "Injected {} failure on {}",
                op,
                D::COLLECTION
            )));
        }
        Ok(())
    }
}

fn id_of(doc: &Map<String, Value>) -> Option<&str> {
    doc.get("id").and_then(Value::as_str)
}

#[async_trait]
impl<D: Document> DocumentStore<D> for MockDocumentStore<D> {
    async fn insert(&self, doc: D) -> Result<D> {
        self.injected(&self.fail_inserts, "insert")?;
        let map = to_json_object(&doc)?;
        let mut docs = self.docs.lock().await;
        if docs.iter().any(|d| id_of(d) == Some(doc.id())) {
            return Err(StoreError::ValidationError(format!(
                "{} {} already exists",
                D::COLLECTION,
                doc.id()
            )));
        }
        docs.push(map);
        Ok(doc)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<D>> {
        let docs = self.docs.lock().await;
        docs.iter()
            .find(|d| id_of(d) == Some(id))
            .map(|d| from_json_object(d.clone()))
            .transpose()
    }

    async fn find_by_id_and_update(&self, id: &str, update: Update) -> Result<Option<D>> {
        self.injected(&self.fail_updates, "update")?;
        let mut docs = self.docs.lock().await;
        let Some(stored) = docs.iter_mut().find(|d| id_of(d) == Some(id)) else {
            return Ok(None);
        };

        let mut updated = stored.clone();
        update.apply(&mut updated)?;
        // Reject updates that would leave an unreadable document behind
        let doc: D = from_json_object(updated.clone())?;
        *stored = updated;
        Ok(Some(doc))
    }

    async fn find_by_id_and_delete(&self, id: &str) -> Result<Option<D>> {
        self.injected(&self.fail_deletes, "delete")?;
        let mut docs = self.docs.lock().await;
        match docs.iter().position(|d| id_of(d) == Some(id)) {
            Some(index) => from_json_object(docs.remove(index)).map(Some),
            None => Ok(None),
        }
    }

    async fn find(&self, filter: Filter) -> Result<Vec<D>> {
        let docs = self.docs.lock().await;
        docs.iter()
            .filter(|d| filter.matches(&Value::Object((*d).clone())))
            .map(|d| from_json_object(d.clone()))
            .collect()
    }
}
