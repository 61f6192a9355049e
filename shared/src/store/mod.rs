use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub mod dynamo;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// A record living in its own collection, addressable by id.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: &'static str;

    fn id(&self) -> &str;
}

/// One field-level change inside an [`Update`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOp {
    Set(String, Value),
    Unset(String),
    /// Appends an id to a list field, creating the list if needed.
    Push(String, String),
    /// Removes every occurrence of an id from a list field.
    Pull(String, String),
    /// Appends the values not already present in a list field.
    AddToSet(String, Vec<String>),
}

/// A set of field operations applied atomically to a single document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    ops: Vec<FieldOp>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: &str, value: Value) -> Self {
        self.ops.push(FieldOp::Set(field.to_string(), value));
        self
    }

    pub fn unset(mut self, field: &str) -> Self {
        self.ops.push(FieldOp::Unset(field.to_string()));
        self
    }

    pub fn push(mut self, field: &str, id: &str) -> Self {
        self.ops.push(FieldOp::Push(field.to_string(), id.to_string()));
        self
    }

    pub fn pull(mut self, field: &str, id: &str) -> Self {
        self.ops.push(FieldOp::Pull(field.to_string(), id.to_string()));
        self
    }

    pub fn add_to_set(mut self, field: &str, values: Vec<String>) -> Self {
        self.ops.push(FieldOp::AddToSet(field.to_string(), values));
        self
    }

    pub fn ops(&self) -> &[FieldOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Whether applying this update depends on the current list contents.
    pub fn needs_current(&self) -> bool {
        self.ops
            .iter()
            .any(|op| matches!(op, FieldOp::Pull(..) | FieldOp::AddToSet(..)))
    }

    /// Applies the operations, in order, to a document's JSON form.
    pub fn apply(&self, doc: &mut Map<String, Value>) -> Result<()> {
        for op in &self.ops {
            match op {
                FieldOp::Set(field, value) => {
                    doc.insert(field.clone(), value.clone());
                }
                FieldOp::Unset(field) => {
                    doc.remove(field);
                }
                FieldOp::Push(field, id) => {
                    list_field(doc, field)?.push(Value::String(id.clone()));
                }
                FieldOp::Pull(field, id) => {
                    if doc.contains_key(field) {
                        list_field(doc, field)?.retain(|v| v.as_str() != Some(id.as_str()));
                    }
                }
                FieldOp::AddToSet(field, values) => {
                    let list = list_field(doc, field)?;
                    for value in values {
                        if !list.iter().any(|v| v.as_str() == Some(value.as_str())) {
                            list.push(Value::String(value.clone()));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn list_field<'a>(doc: &'a mut Map<String, Value>, field: &str) -> Result<&'a mut Vec<Value>> {
    let entry = doc
        .entry(field.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if entry.is_null() {
        *entry = Value::Array(Vec::new());
    }
    entry
        .as_array_mut()
        .ok_or_else(|| StoreError::ValidationError(format!("Field '{}' is not a list", field)))
}

/// Selection criteria for [`DocumentStore::find`].
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    /// The list field contains the given id.
    Contains(String, String),
}

impl Filter {
    pub fn contains(field: &str, value: &str) -> Self {
        Filter::Contains(field.to_string(), value.to_string())
    }

    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Filter::All => true,
            Filter::Contains(field, value) => doc
                .get(field)
                .and_then(Value::as_array)
                .map(|list| list.iter().any(|v| v.as_str() == Some(value.as_str())))
                .unwrap_or(false),
        }
    }
}

/// Generic persistence for one collection of documents.
///
/// Every call touches a single document (or scans one collection); nothing
/// here spans several documents atomically.
#[async_trait]
pub trait DocumentStore<D: Document>: Send + Sync {
    async fn insert(&self, doc: D) -> Result<D>;

    async fn find_by_id(&self, id: &str) -> Result<Option<D>>;

    /// Applies `update` and returns the document as it is afterwards, or
    /// `None` when no document has this id.
    async fn find_by_id_and_update(&self, id: &str, update: Update) -> Result<Option<D>>;

    /// Deletes the document and returns it, or `None` when it did not exist.
    async fn find_by_id_and_delete(&self, id: &str) -> Result<Option<D>>;

    async fn find(&self, filter: Filter) -> Result<Vec<D>>;
}

pub fn to_json_object<D: Document>(doc: &D) -> Result<Map<String, Value>> {
    match serde_json::to_value(doc) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(StoreError::SerializationError(format!(
            "{} document did not serialize to an object",
            D::COLLECTION
        ))),
        Err(e) => Err(StoreError::SerializationError(e.to_string())),
    }
}

pub fn from_json_object<D: Document>(map: Map<String, Value>) -> Result<D> {
    serde_json::from_value(Value::Object(map))
        .map_err(|e| StoreError::SerializationError(e.to_string()))
}
