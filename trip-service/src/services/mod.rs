use bmg_shared::store::{Document, DocumentStore, StoreError};
use log::{info, warn};
use thiserror::Error;
use uuid::Uuid;

pub mod days;
pub mod plannings;
pub mod populate;
pub mod steps;
pub mod trips;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Rejects anything that is not a well-formed document id.
pub fn validate_id(id: &str, what: &str) -> Result<()> {
    Uuid::parse_str(id)
        .map(|_| ())
        .map_err(|_| ServiceError::Validation(format!("Incorrect {} id format", what)))
}

pub fn not_found<D: Document>(id: &str) -> ServiceError {
    ServiceError::NotFound(format!("{} {}", D::COLLECTION, id))
}

/// Best-effort removal of a document created earlier in a failed operation.
/// A failure here is logged and leaves the document orphaned.
pub async fn compensate<D: Document>(store: &dyn DocumentStore<D>, id: &str) {
    match store.find_by_id_and_delete(id).await {
        Ok(_) => info!("Compensating delete of {} {}", D::COLLECTION, id),
        Err(e) => warn!(
            "Compensating delete of {} {} failed, document is orphaned: {}",
            D::COLLECTION,
            id,
            e
        ),
    }
}

/// Deletes a child document during a cascade. A child that is already gone
/// counts as deleted.
pub async fn delete_child<D: Document>(store: &dyn DocumentStore<D>, id: &str) -> Result<()> {
    if store.find_by_id_and_delete(id).await?.is_none() {
        info!("{} {} already deleted, continuing cascade", D::COLLECTION, id);
    }
    Ok(())
}
