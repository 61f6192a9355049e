use std::sync::Arc;

use bmg_shared::models::{Ref, TripDay, TripPlanning};
use bmg_shared::store::{DocumentStore, Update};
use chrono::Utc;
use futures::future::try_join_all;
use log::info;
use serde_json::json;

use super::days::DayService;
use super::populate::{Depth, Populator};
use super::{compensate, delete_child, new_id, not_found, validate_id, Result};
use crate::models::DayRequest;
use crate::state::Stores;

#[derive(Clone)]
pub struct PlanningService {
    plannings: Arc<dyn DocumentStore<TripPlanning>>,
    days: Arc<dyn DocumentStore<TripDay>>,
    day_service: DayService,
    populator: Populator,
}

impl PlanningService {
    pub fn new(stores: &Stores, day_service: DayService, populator: Populator) -> Self {
        Self {
            plannings: stores.plannings.clone(),
            days: stores.days.clone(),
            day_service,
            populator,
        }
    }

    pub async fn create(&self, day_ids: Vec<String>, updated_by: Option<String>) -> Result<TripPlanning> {
        if let Some(user_id) = &updated_by {
            validate_id(user_id, "user")?;
        }
        let now = Utc::now();
        let planning = TripPlanning {
            id: new_id(),
            days: day_ids.into_iter().map(Ref::Id).collect(),
            created_at: now,
            updated_at: now,
            updated_by,
        };
        Ok(self.plannings.insert(planning).await?)
    }

    /// Creates a day and appends it to the planning. The day is removed again
    /// when the planning cannot take it.
    pub async fn add_day(&self, planning_id: &str, request: DayRequest) -> Result<TripPlanning> {
        validate_id(planning_id, "planning")?;
        let day = self.day_service.create(request).await?;

        let update = Update::new()
            .push("days", &day.id)
            .set("updatedAt", json!(Utc::now()));

        match self.plannings.find_by_id_and_update(planning_id, update).await {
            Ok(Some(planning)) => {
                info!("Added day {} to planning {}", day.id, planning_id);
                self.populator.planning(planning, Depth::Steps).await
            }
            Ok(None) => {
                compensate(self.days.as_ref(), &day.id).await;
                Err(not_found::<TripPlanning>(planning_id))
            }
            Err(e) => {
                compensate(self.days.as_ref(), &day.id).await;
                Err(e.into())
            }
        }
    }

    pub async fn read_with_days(&self, id: &str, depth: Depth) -> Result<TripPlanning> {
        validate_id(id, "planning")?;
        let planning = self
            .plannings
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found::<TripPlanning>(id))?;
        self.populator.planning(planning, depth).await
    }

    /// Deletes a planning, its days and their steps. Anything already gone
    /// is skipped.
    pub async fn delete_cascade(&self, id: &str) -> Result<()> {
        let Some(planning) = self.plannings.find_by_id(id).await? else {
            info!("Planning {} already deleted, continuing cascade", id);
            return Ok(());
        };

        let day_service = &self.day_service;
        try_join_all(planning.days.iter().map(|d| day_service.delete_cascade(d.id()))).await?;
        delete_child(self.plannings.as_ref(), id).await?;

        info!("Deleted planning {} with {} days", id, planning.days.len());
        Ok(())
    }
}
