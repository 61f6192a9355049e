use std::sync::Arc;

use bmg_shared::models::{TripDay, TripPlanning, TripStep};
use bmg_shared::store::{DocumentStore, Filter, Update};
use futures::future::try_join_all;
use log::{info, warn};
use serde_json::json;

use super::populate::Populator;
use super::steps::StepService;
use super::{compensate, delete_child, new_id, not_found, validate_id, Result};
use crate::models::{DayRequest, DayUpdateRequest, StepRequest};
use crate::state::Stores;

#[derive(Clone)]
pub struct DayService {
    days: Arc<dyn DocumentStore<TripDay>>,
    steps: Arc<dyn DocumentStore<TripStep>>,
    plannings: Arc<dyn DocumentStore<TripPlanning>>,
    step_service: StepService,
    populator: Populator,
}

impl DayService {
    pub fn new(stores: &Stores, populator: Populator) -> Self {
        Self {
            days: stores.days.clone(),
            steps: stores.steps.clone(),
            plannings: stores.plannings.clone(),
            step_service: StepService::new(stores),
            populator,
        }
    }

    pub fn steps(&self) -> &StepService {
        &self.step_service
    }

    pub async fn create(&self, request: DayRequest) -> Result<TripDay> {
        let day = TripDay {
            id: new_id(),
            title: request.title,
            day: request.day,
            steps: vec![],
        };
        Ok(self.days.insert(day).await?)
    }

    pub async fn update(&self, id: &str, request: DayUpdateRequest) -> Result<TripDay> {
        validate_id(id, "day")?;

        let mut update = Update::new();
        match request.title {
            // A blank title clears it
            Some(title) if title.trim().is_empty() => update = update.unset("title"),
            Some(title) => update = update.set("title", json!(title)),
            None => {}
        }
        if let Some(day) = request.day {
            update = update.set("day", json!(day));
        }

        let day = if update.is_empty() {
            self.days.find_by_id(id).await?
        } else {
            self.days.find_by_id_and_update(id, update).await?
        };
        day.ok_or_else(|| not_found::<TripDay>(id))
    }

    async fn delete_steps(&self, day: &TripDay) -> Result<()> {
        let steps = self.steps.as_ref();
        try_join_all(day.steps.iter().map(|s| delete_child(steps, s.id()))).await?;
        Ok(())
    }

    /// Deletes a day with all of its steps and detaches it from the planning
    /// listing it.
    pub async fn delete(&self, id: &str) -> Result<TripDay> {
        validate_id(id, "day")?;
        let day = self
            .days
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found::<TripDay>(id))?;

        self.delete_steps(&day).await?;
        delete_child(self.days.as_ref(), id).await?;

        match self.plannings.find(Filter::contains("days", id)).await {
            Ok(plannings) => {
                for planning in plannings {
                    if let Err(e) = self
                        .plannings
                        .find_by_id_and_update(&planning.id, Update::new().pull("days", id))
                        .await
                    {
                        warn!("Failed to detach day {} from planning {}: {}", id, planning.id, e);
                    }
                }
            }
            Err(e) => warn!("Failed to look up plannings holding day {}: {}", id, e),
        }

        info!("Deleted day {} and {} steps", id, day.steps.len());
        Ok(day)
    }

    /// Cascade variant of [`DayService::delete`]: a day that is already gone
    /// is not an error, and parents are left to the caller.
    pub async fn delete_cascade(&self, id: &str) -> Result<()> {
        match self.days.find_by_id(id).await? {
            Some(day) => {
                self.delete_steps(&day).await?;
                delete_child(self.days.as_ref(), id).await
            }
            None => {
                info!("Day {} already deleted, continuing cascade", id);
                Ok(())
            }
        }
    }

    /// Creates a step and appends it to the day. The step is removed again
    /// when the day cannot take it.
    pub async fn add_step(&self, day_id: &str, request: StepRequest) -> Result<TripDay> {
        validate_id(day_id, "day")?;
        let step = self.step_service.create(request).await?;

        match self
            .days
            .find_by_id_and_update(day_id, Update::new().push("steps", &step.id))
            .await
        {
            Ok(Some(day)) => {
                info!("Added step {} to day {}", step.id, day_id);
                self.populator.day(day).await
            }
            Ok(None) => {
                compensate(self.steps.as_ref(), &step.id).await;
                Err(not_found::<TripDay>(day_id))
            }
            Err(e) => {
                compensate(self.steps.as_ref(), &step.id).await;
                Err(e.into())
            }
        }
    }

    pub async fn read_with_steps(&self, id: &str) -> Result<TripDay> {
        validate_id(id, "day")?;
        let day = self
            .days
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found::<TripDay>(id))?;
        self.populator.day(day).await
    }
}
