//! Resolution of stored references into the documents they point to.
//!
//! Relationships are fixed: a trip references its destination, members and
//! planning, a planning its days, a day its steps. Callers pick how much of
//! that graph to resolve with a [`TripPopulation`]. References whose target
//! no longer exists are dropped from lists and left as bare ids otherwise.

use bmg_shared::models::{Ref, Trip, TripDay, TripPlanning, TripStep};
use bmg_shared::store::{Document, DocumentStore};
use futures::future::try_join_all;

use super::Result;
use crate::state::Stores;

/// How far below a planning to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    Days,
    Steps,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TripPopulation {
    pub destination: bool,
    pub users: bool,
    pub planning: Option<Depth>,
}

impl TripPopulation {
    pub const NONE: Self = Self {
        destination: false,
        users: false,
        planning: None,
    };

    pub const DESTINATION: Self = Self {
        destination: true,
        users: false,
        planning: None,
    };

    pub const MEMBERS: Self = Self {
        destination: false,
        users: true,
        planning: None,
    };

    /// Destination plus planning days, without steps.
    pub const SUMMARY: Self = Self {
        destination: true,
        users: false,
        planning: Some(Depth::Days),
    };

    /// Everything down to the steps of each day.
    pub const ITINERARY: Self = Self {
        destination: true,
        users: false,
        planning: Some(Depth::Steps),
    };
}

fn populated<T>(docs: Vec<T>) -> Vec<Ref<T>> {
    docs.into_iter().map(|d| Ref::Populated(Box::new(d))).collect()
}

/// Days in calendar order; insertion order breaks ties.
pub fn sort_days(days: &mut [TripDay]) {
    days.sort_by_key(|d| d.day);
}

/// Steps in chronological order; insertion order breaks ties.
pub fn sort_steps(steps: &mut [TripStep]) {
    steps.sort_by_key(|s| s.datetime);
}

async fn resolve_many<T: Document>(store: &dyn DocumentStore<T>, refs: &[Ref<T>]) -> Result<Vec<T>> {
    let found = try_join_all(refs.iter().map(|r| store.find_by_id(r.id()))).await?;
    Ok(found.into_iter().flatten().collect())
}

async fn resolve_one<T: Document>(store: &dyn DocumentStore<T>, reference: Ref<T>) -> Result<Ref<T>> {
    Ok(match store.find_by_id(reference.id()).await? {
        Some(doc) => Ref::Populated(Box::new(doc)),
        None => reference,
    })
}

#[derive(Clone)]
pub struct Populator {
    stores: Stores,
}

impl Populator {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    pub async fn day(&self, mut day: TripDay) -> Result<TripDay> {
        let mut steps = resolve_many(self.stores.steps.as_ref(), &day.steps).await?;
        sort_steps(&mut steps);
        day.steps = populated(steps);
        Ok(day)
    }

    pub async fn planning(&self, mut planning: TripPlanning, depth: Depth) -> Result<TripPlanning> {
        let mut days = resolve_many(self.stores.days.as_ref(), &planning.days).await?;
        if depth == Depth::Steps {
            days = try_join_all(days.into_iter().map(|d| self.day(d))).await?;
        }
        sort_days(&mut days);
        planning.days = populated(days);
        Ok(planning)
    }

    pub async fn trip(&self, mut trip: Trip, population: TripPopulation) -> Result<Trip> {
        if population.destination {
            trip.destination =
                resolve_one(self.stores.destinations.as_ref(), trip.destination).await?;
        }

        if population.users {
            let users = resolve_many(self.stores.users.as_ref(), &trip.users).await?;
            trip.users = populated(users);
        }

        if let Some(depth) = population.planning {
            if let Some(reference) = trip.planning.take() {
                trip.planning = Some(match self.stores.plannings.find_by_id(reference.id()).await? {
                    Some(planning) => {
                        Ref::Populated(Box::new(self.planning(planning, depth).await?))
                    }
                    None => reference,
                });
            }
        }

        Ok(trip)
    }

    pub async fn trips(&self, trips: Vec<Trip>, population: TripPopulation) -> Result<Vec<Trip>> {
        try_join_all(trips.into_iter().map(|t| self.trip(t, population))).await
    }
}
