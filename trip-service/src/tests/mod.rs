use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use bmg_shared::auth::{AuthConfig, TEST_JWT_SECRET};
use bmg_shared::models::{Destination, Trip, TripDay, TripPlanning, TripStep, User};
use bmg_shared::store::DocumentStore;
use bmg_shared::test_utils::mock_store::MockDocumentStore;
use bmg_shared::test_utils::test_logging::init_test_logging;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::CreateTripRequest;
use crate::notifier::{InvitationNotifier, NotifierError};
use crate::routes::create_router_with_service;
use crate::services::trips::TripService;
use crate::state::Stores;

mod trip_handlers_test;

/// Typed handles on the in-memory collections behind a test service.
#[derive(Clone)]
pub struct TestStores {
    pub trips: Arc<MockDocumentStore<Trip>>,
    pub plannings: Arc<MockDocumentStore<TripPlanning>>,
    pub days: Arc<MockDocumentStore<TripDay>>,
    pub steps: Arc<MockDocumentStore<TripStep>>,
    pub users: Arc<MockDocumentStore<User>>,
    pub destinations: Arc<MockDocumentStore<Destination>>,
}

impl TestStores {
    pub fn new() -> Self {
        Self {
            trips: Arc::new(MockDocumentStore::new()),
            plannings: Arc::new(MockDocumentStore::new()),
            days: Arc::new(MockDocumentStore::new()),
            steps: Arc::new(MockDocumentStore::new()),
            users: Arc::new(MockDocumentStore::new()),
            destinations: Arc::new(MockDocumentStore::new()),
        }
    }

    pub fn stores(&self) -> Stores {
        Stores {
            trips: self.trips.clone(),
            plannings: self.plannings.clone(),
            days: self.days.clone(),
            steps: self.steps.clone(),
            users: self.users.clone(),
            destinations: self.destinations.clone(),
        }
    }
}

/// Records every invitation instead of sending it.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String, String)>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub async fn recipients(&self) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .map(|(_, email, _)| email.clone())
            .collect()
    }
}

#[async_trait]
impl InvitationNotifier for RecordingNotifier {
    async fn send_trip_invitation(
        &self,
        inviter_name: &str,
        recipient_email: &str,
        trip_id: &str,
    ) -> Result<(), NotifierError> {
        self.sent.lock().await.push((
            inviter_name.to_string(),
            recipient_email.to_string(),
            trip_id.to_string(),
        ));
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifierError::Publish("mail collaborator down".into()));
        }
        Ok(())
    }
}

pub struct TestContext {
    pub service: Arc<TripService>,
    pub stores: TestStores,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn create_test_service() -> TestContext {
    init_test_logging();
    let stores = TestStores::new();
    let notifier = Arc::new(RecordingNotifier::default());
    let service = Arc::new(TripService::new(stores.stores(), notifier.clone()));
    TestContext {
        service,
        stores,
        notifier,
    }
}

/// Router without a path prefix, accepting tokens signed with the test secret.
pub fn create_test_app() -> (Router, TestContext) {
    let context = create_test_service();
    let auth = Arc::new(AuthConfig::new(TEST_JWT_SECRET));
    let app = create_router_with_service(context.service.clone(), auth, "");
    (app, context)
}

pub async fn seed_user(stores: &TestStores, username: &str) -> User {
    let user = User {
        id: Uuid::new_v4().to_string(),
        username: username.to_string(),
        firstname: username.to_string(),
        lastname: "Tester".to_string(),
        email: format!("{}@x.com", username),
    };
    stores.users.insert(user).await.unwrap()
}

pub async fn seed_destination(stores: &TestStores, name: &str) -> Destination {
    let destination = Destination {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        description: None,
        coordinates: None,
    };
    stores.destinations.insert(destination).await.unwrap()
}

/// A trip with `owner` as its only member.
pub async fn seed_trip(context: &TestContext, owner: &User) -> Trip {
    let destination = seed_destination(&context.stores, "Lisbon").await;
    context
        .service
        .create(CreateTripRequest {
            users: vec![Some(owner.id.clone())],
            destination: destination.id,
            invited_users: vec![],
        })
        .await
        .unwrap()
}
