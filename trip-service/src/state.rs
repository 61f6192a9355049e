use std::sync::Arc;

use aws_sdk_dynamodb::Client;
use bmg_shared::models::{Destination, Trip, TripDay, TripPlanning, TripStep, User};
use bmg_shared::store::dynamo::DynamoDocumentStore;
use bmg_shared::store::DocumentStore;

use crate::config::TableNames;

/// Handles to every collection the trip service reads or writes.
#[derive(Clone)]
pub struct Stores {
    pub trips: Arc<dyn DocumentStore<Trip>>,
    pub plannings: Arc<dyn DocumentStore<TripPlanning>>,
    pub days: Arc<dyn DocumentStore<TripDay>>,
    pub steps: Arc<dyn DocumentStore<TripStep>>,
    pub users: Arc<dyn DocumentStore<User>>,
    pub destinations: Arc<dyn DocumentStore<Destination>>,
}

impl Stores {
    pub fn dynamo(client: &Client, tables: &TableNames) -> Self {
        fn store<D: bmg_shared::store::Document>(
            client: &Client,
            table: &str,
        ) -> Arc<DynamoDocumentStore<D>> {
            Arc::new(DynamoDocumentStore::with_client_and_table(
                client.clone(),
                table.to_string(),
            ))
        }

        Self {
            trips: store::<Trip>(client, &tables.trips),
            plannings: store::<TripPlanning>(client, &tables.plannings),
            days: store::<TripDay>(client, &tables.days),
            steps: store::<TripStep>(client, &tables.steps),
            users: store::<User>(client, &tables.users),
            destinations: store::<Destination>(client, &tables.destinations),
        }
    }
}
