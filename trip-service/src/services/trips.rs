//! The trip aggregate: a trip, its members and pending invitations, and the
//! planning subtree it owns.

use std::sync::Arc;

use bmg_shared::models::{Ref, Trip, TripDay, TripPlanning, TripStep, User};
use bmg_shared::store::{DocumentStore, Filter, Update};
use futures::future::join_all;
use log::{error, info, warn};
use serde_json::json;

use super::days::DayService;
use super::plannings::PlanningService;
use super::populate::{Depth, Populator, TripPopulation};
use super::{compensate, delete_child, new_id, not_found, validate_id, Result, ServiceError};
use crate::models::{
    AddPlanningRequest, CreateTripRequest, DayRequest, DayUpdateRequest, InvitationRequest,
    StepRequest, StepUpdateRequest, UpdateTripRequest, UpdateTripUsersRequest,
};
use crate::notifier::InvitationNotifier;
use crate::state::Stores;

#[derive(Clone)]
pub struct TripService {
    trips: Arc<dyn DocumentStore<Trip>>,
    users: Arc<dyn DocumentStore<User>>,
    days: Arc<dyn DocumentStore<TripDay>>,
    plannings: Arc<dyn DocumentStore<TripPlanning>>,
    planning_service: PlanningService,
    day_service: DayService,
    populator: Populator,
    notifier: Arc<dyn InvitationNotifier>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl TripService {
    pub fn new(stores: Stores, notifier: Arc<dyn InvitationNotifier>) -> Self {
        let populator = Populator::new(stores.clone());
        let day_service = DayService::new(&stores, populator.clone());
        let planning_service = PlanningService::new(&stores, day_service.clone(), populator.clone());

        Self {
            trips: stores.trips.clone(),
            users: stores.users.clone(),
            days: stores.days.clone(),
            plannings: stores.plannings.clone(),
            planning_service,
            day_service,
            populator,
            notifier,
        }
    }

    async fn load(&self, id: &str) -> Result<Trip> {
        validate_id(id, "trip")?;
        self.trips
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found::<Trip>(id))
    }

    async fn read_with(&self, id: &str, population: TripPopulation) -> Result<Trip> {
        let trip = self.load(id).await?;
        self.populator.trip(trip, population).await
    }

    /// The first member is the trip's creator and must be present.
    pub async fn create(&self, request: CreateTripRequest) -> Result<Trip> {
        if request.users.first().and_then(non_blank).is_none() {
            return Err(ServiceError::Validation("User is required".into()));
        }
        if request.destination.trim().is_empty() {
            return Err(ServiceError::Validation("Destination is required".into()));
        }

        let users: Vec<String> = request.users.iter().filter_map(non_blank).collect();
        for user_id in &users {
            validate_id(user_id, "user")?;
        }
        validate_id(&request.destination, "destination")?;

        let trip = Trip {
            id: new_id(),
            users: users.into_iter().map(Ref::Id).collect(),
            destination: Ref::Id(request.destination),
            planning: None,
            invited_users: request.invited_users,
        };
        let trip = self.trips.insert(trip).await?;
        info!("Created trip {} with {} members", trip.id, trip.users.len());
        Ok(trip)
    }

    pub async fn read_all(&self) -> Result<Vec<Trip>> {
        Ok(self.trips.find(Filter::All).await?)
    }

    /// Destination and planning days, without steps.
    pub async fn read_by_id(&self, id: &str) -> Result<Trip> {
        self.read_with(id, TripPopulation::SUMMARY).await
    }

    pub async fn read_by_id_with_users(&self, id: &str) -> Result<Trip> {
        self.read_with(id, TripPopulation::MEMBERS).await
    }

    pub async fn read_by_id_with_minimum_information(&self, id: &str) -> Result<Trip> {
        self.load(id).await
    }

    /// The full itinerary: days sorted by date, each with its steps sorted by
    /// time.
    pub async fn read_steps_by_id(&self, id: &str) -> Result<Trip> {
        self.read_with(id, TripPopulation::ITINERARY).await
    }

    pub async fn read_by_user_id(&self, user_id: &str) -> Result<Vec<Trip>> {
        validate_id(user_id, "user")?;
        let trips = self.trips.find(Filter::contains("users", user_id)).await?;
        self.populator.trips(trips, TripPopulation::DESTINATION).await
    }

    pub async fn update(&self, id: &str, request: UpdateTripRequest) -> Result<Trip> {
        validate_id(id, "trip")?;

        let mut update = Update::new();
        if let Some(users) = request.users {
            for user_id in &users {
                validate_id(user_id, "user")?;
            }
            update = update.set("users", json!(users));
        }
        if let Some(destination) = request.destination {
            validate_id(&destination, "destination")?;
            update = update.set("destination", json!(destination));
        }

        if update.is_empty() {
            return self.load(id).await;
        }
        self.trips
            .find_by_id_and_update(id, update)
            .await?
            .ok_or_else(|| not_found::<Trip>(id))
    }

    /// Deletes the trip with its planning, days and steps. Children that are
    /// already gone are skipped.
    pub async fn delete(&self, id: &str) -> Result<Trip> {
        let trip = self.load(id).await?;

        if let Some(planning) = &trip.planning {
            self.planning_service.delete_cascade(planning.id()).await?;
        }
        delete_child(self.trips.as_ref(), id).await?;

        info!("Deleted trip {}", id);
        Ok(trip)
    }

    /// Replaces the member list with the entries carrying an id and invites
    /// the entries carrying only an email. Emails already pending are not
    /// mailed again.
    pub async fn update_users(&self, id: &str, request: UpdateTripUsersRequest) -> Result<Trip> {
        validate_id(id, "trip")?;

        let mut members = Vec::new();
        let mut emails: Vec<String> = Vec::new();
        for entry in &request.users {
            match (non_blank(&entry.id), non_blank(&entry.email)) {
                (Some(user_id), _) => {
                    validate_id(&user_id, "user")?;
                    members.push(user_id);
                }
                (None, Some(email)) => {
                    if !emails.contains(&email) {
                        emails.push(email);
                    }
                }
                (None, None) => {
                    return Err(ServiceError::Validation(
                        "Each user needs an id or an email".into(),
                    ))
                }
            }
        }

        let trip = self.load(id).await?;
        let to_invite: Vec<String> = emails
            .iter()
            .filter(|email| !trip.invited_users.contains(email))
            .cloned()
            .collect();

        let mut update = Update::new().set("users", json!(members));
        if !emails.is_empty() {
            update = update.add_to_set("invitedUsers", emails);
        }
        let trip = self
            .trips
            .find_by_id_and_update(id, update)
            .await?
            .ok_or_else(|| not_found::<Trip>(id))?;

        self.dispatch_invitations(&request.invite_from, &to_invite, id)
            .await;

        self.populator.trip(trip, TripPopulation::MEMBERS).await
    }

    /// Sends all invitations concurrently. Failures are logged only.
    async fn dispatch_invitations(&self, inviter_name: &str, emails: &[String], trip_id: &str) {
        if emails.is_empty() {
            return;
        }
        info!("Inviting {} people to trip {}", emails.len(), trip_id);

        let results = join_all(
            emails
                .iter()
                .map(|email| self.notifier.send_trip_invitation(inviter_name, email, trip_id)),
        )
        .await;

        for (email, result) in emails.iter().zip(results) {
            if let Err(e) = result {
                error!("Failed to invite {} to trip {}: {}", email, trip_id, e);
            }
        }
    }

    /// Removing a user who is not a member is a no-op.
    pub async fn remove_companion(&self, id: &str, user_id: &str) -> Result<Trip> {
        validate_id(id, "trip")?;
        validate_id(user_id, "user")?;

        let trip = self
            .trips
            .find_by_id_and_update(id, Update::new().pull("users", user_id))
            .await?
            .ok_or_else(|| not_found::<Trip>(id))?;

        info!("Removed user {} from trip {}", user_id, id);
        self.populator.trip(trip, TripPopulation::MEMBERS).await
    }

    /// Resolves a pending invitation. The invitee's email leaves
    /// `invitedUsers` either way; on acceptance the user is appended to the
    /// members even when already one (logged, not rejected).
    pub async fn handle_invitation(&self, id: &str, request: InvitationRequest) -> Result<Trip> {
        validate_id(&request.user_id, "user")?;
        let trip = self.load(id).await?;
        let user = self
            .users
            .find_by_id(&request.user_id)
            .await?
            .ok_or_else(|| not_found::<User>(&request.user_id))?;

        let mut update = Update::new().pull("invitedUsers", &user.email);
        if request.accepted {
            if trip.has_member(&user.id) {
                warn!("User {} is already a member of trip {}, adding again", user.id, id);
            }
            update = update.push("users", &user.id);
        }

        let trip = self
            .trips
            .find_by_id_and_update(id, update)
            .await?
            .ok_or_else(|| not_found::<Trip>(id))?;

        info!(
            "User {} {} invitation to trip {}",
            user.id,
            if request.accepted { "accepted" } else { "declined" },
            id
        );
        self.populator.trip(trip, TripPopulation::MEMBERS).await
    }

    /// Creates the planning with its first day and attaches it to the trip.
    /// Attaching a second planning leaves the first one orphaned.
    pub async fn add_planning(&self, id: &str, request: AddPlanningRequest) -> Result<Trip> {
        let trip = self.load(id).await?;
        if let Some(previous) = &trip.planning {
            warn!(
                "Trip {} already has planning {}, it will be orphaned",
                id,
                previous.id()
            );
        }

        let day = self.day_service.create(request.days).await?;

        let planning = match self
            .planning_service
            .create(vec![day.id.clone()], request.updated_by)
            .await
        {
            Ok(planning) => planning,
            Err(e) => {
                compensate(self.days.as_ref(), &day.id).await;
                return Err(e);
            }
        };

        let attached = self
            .trips
            .find_by_id_and_update(id, Update::new().set("planning", json!(planning.id)))
            .await;

        match attached {
            Ok(Some(trip)) => {
                info!("Attached planning {} to trip {}", planning.id, id);
                self.populator.trip(trip, TripPopulation::ITINERARY).await
            }
            Ok(None) => {
                compensate(self.plannings.as_ref(), &planning.id).await;
                compensate(self.days.as_ref(), &day.id).await;
                Err(not_found::<Trip>(id))
            }
            Err(e) => {
                compensate(self.plannings.as_ref(), &planning.id).await;
                compensate(self.days.as_ref(), &day.id).await;
                Err(e.into())
            }
        }
    }

    pub async fn add_day_to_planning(&self, planning_id: &str, request: DayRequest) -> Result<TripPlanning> {
        self.planning_service.add_day(planning_id, request).await
    }

    pub async fn read_with_days(&self, planning_id: &str) -> Result<TripPlanning> {
        self.planning_service
            .read_with_days(planning_id, Depth::Days)
            .await
    }

    pub async fn update_day(&self, day_id: &str, request: DayUpdateRequest) -> Result<TripDay> {
        self.day_service.update(day_id, request).await
    }

    pub async fn delete_day(&self, day_id: &str) -> Result<TripDay> {
        self.day_service.delete(day_id).await
    }

    pub async fn read_with_steps(&self, day_id: &str) -> Result<TripDay> {
        self.day_service.read_with_steps(day_id).await
    }

    pub async fn add_step_to_day(&self, day_id: &str, request: StepRequest) -> Result<TripDay> {
        self.day_service.add_step(day_id, request).await
    }

    pub async fn update_step(&self, step_id: &str, request: StepUpdateRequest) -> Result<TripStep> {
        self.day_service.steps().update(step_id, request).await
    }

    pub async fn delete_step(&self, step_id: &str) -> Result<TripStep> {
        self.day_service.steps().delete(step_id).await
    }
}
