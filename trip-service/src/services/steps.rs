use std::sync::Arc;

use bmg_shared::models::{TripDay, TripStep};
use bmg_shared::store::{DocumentStore, Filter, Update};
use log::{info, warn};
use serde_json::json;

use super::{new_id, not_found, validate_id, Result, ServiceError};
use crate::models::{StepRequest, StepUpdateRequest};
use crate::state::Stores;

#[derive(Clone)]
pub struct StepService {
    steps: Arc<dyn DocumentStore<TripStep>>,
    days: Arc<dyn DocumentStore<TripDay>>,
}

fn require_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(ServiceError::Validation("Step title is required".into()));
    }
    Ok(())
}

impl StepService {
    pub fn new(stores: &Stores) -> Self {
        Self {
            steps: stores.steps.clone(),
            days: stores.days.clone(),
        }
    }

    pub async fn create(&self, request: StepRequest) -> Result<TripStep> {
        require_title(&request.title)?;
        let step = TripStep {
            id: new_id(),
            title: request.title,
            description: request.description,
            location: request.location,
            datetime: request.datetime,
        };
        Ok(self.steps.insert(step).await?)
    }

    pub async fn update(&self, id: &str, request: StepUpdateRequest) -> Result<TripStep> {
        validate_id(id, "step")?;

        let mut update = Update::new();
        if let Some(title) = request.title {
            require_title(&title)?;
            update = update.set("title", json!(title));
        }
        if let Some(description) = request.description {
            update = update.set("description", json!(description));
        }
        if let Some(location) = request.location {
            update = update.set("location", json!(location));
        }
        if let Some(datetime) = request.datetime {
            update = update.set("datetime", json!(datetime));
        }

        let step = if update.is_empty() {
            self.steps.find_by_id(id).await?
        } else {
            self.steps.find_by_id_and_update(id, update).await?
        };
        step.ok_or_else(|| not_found::<TripStep>(id))
    }

    /// Deletes a step and detaches it from the day listing it.
    pub async fn delete(&self, id: &str) -> Result<TripStep> {
        validate_id(id, "step")?;
        let step = self
            .steps
            .find_by_id_and_delete(id)
            .await?
            .ok_or_else(|| not_found::<TripStep>(id))?;

        match self.days.find(Filter::contains("steps", id)).await {
            Ok(days) => {
                for day in days {
                    if let Err(e) = self
                        .days
                        .find_by_id_and_update(&day.id, Update::new().pull("steps", id))
                        .await
                    {
                        warn!("Failed to detach step {} from day {}: {}", id, day.id, e);
                    }
                }
            }
            Err(e) => warn!("Failed to look up days holding step {}: {}", id, e),
        }

        info!("Deleted step {}", id);
        Ok(step)
    }
}
