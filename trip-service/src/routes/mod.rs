use axum::{
    extract::Request,
    middleware,
    routing::{get, post, put},
    Router,
};
use bmg_shared::auth::{auth_middleware, AuthConfig};
use bmg_shared::store::dynamo::create_client;
use log::{info, warn};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::handlers::{
    planning_handlers::{
        add_day, add_planning, add_step, delete_day, delete_step, get_day, get_planning,
        update_day, update_step,
    },
    trip_handlers::{
        create_trip, delete_trip, get_trip, get_trip_information, get_trip_steps,
        get_trip_with_users, get_trips, get_trips_by_user, remove_companion,
        respond_to_invitation, update_trip, update_trip_users,
    },
};
use crate::notifier::{InvitationNotifier, LogOnlyNotifier, SnsInvitationNotifier};
use crate::services::trips::TripService;
use crate::state::Stores;

/// Creates a router backed by DynamoDB and, when a topic is configured, SNS
pub async fn create_router(config: &Config) -> Router {
    info!("Creating router with DynamoDB stores");

    let client = create_client(config.dynamodb_endpoint.as_deref()).await;
    let stores = Stores::dynamo(&client, &config.tables);

    let notifier: Arc<dyn InvitationNotifier> = match &config.sns_topic_arn {
        Some(topic_arn) => {
            info!("Publishing invitations to {}", topic_arn);
            let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
                .load()
                .await;
            Arc::new(SnsInvitationNotifier::new(
                aws_sdk_sns::Client::new(&aws_config),
                topic_arn.clone(),
            ))
        }
        None => {
            warn!("SNS_TOPIC_ARN not set, invitations will only be logged");
            Arc::new(LogOnlyNotifier)
        }
    };

    let service = Arc::new(TripService::new(stores, notifier));
    let auth = Arc::new(AuthConfig::new(&config.jwt_secret));

    info!("Using API route prefix: {}", config.route_prefix);
    create_router_with_service(service, auth, &config.route_prefix)
}

/// Creates a router around a given service
pub fn create_router_with_service(
    service: Arc<TripService>,
    auth: Arc<AuthConfig>,
    prefix: &str,
) -> Router {
    info!("Setting up API routes with prefix: '{}'", prefix);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    async fn logging_middleware(
        req: Request,
        next: axum::middleware::Next,
    ) -> impl axum::response::IntoResponse {
        info!(
            "Router received request: method={}, uri={}",
            req.method(),
            req.uri()
        );
        next.run(req).await
    }

    // Path ids name a trip unless the handler says otherwise
    let trip_routes = Router::new()
        .route("/trip", get(get_trips).post(create_trip))
        .route("/trip/user/:id", get(get_trips_by_user))
        .route("/trip/steps/:id", get(get_trip_steps))
        .route("/trip/day/:id", get(get_day))
        .route("/trip/planning/:id", get(get_planning))
        .route(
            "/trip/:id",
            get(get_trip).put(update_trip).delete(delete_trip),
        )
        .route(
            "/trip/:id/users",
            get(get_trip_with_users).put(update_trip_users),
        )
        .route(
            "/trip/:id/users/:user_id",
            axum::routing::delete(remove_companion),
        )
        .route("/trip/:id/information", get(get_trip_information))
        .route("/trip/:id/invitation", put(respond_to_invitation))
        .route("/trip/:id/planning", post(add_planning))
        .route(
            "/trip/:id/planning/day",
            post(add_day).put(update_day).delete(delete_day),
        )
        .route(
            "/trip/:id/day/step",
            post(add_step).put(update_step).delete(delete_step),
        )
        .layer(middleware::from_fn_with_state(auth, auth_middleware))
        .with_state(service);

    let router = if prefix.is_empty() {
        trip_routes
            .layer(cors)
            .layer(middleware::from_fn(logging_middleware))
    } else {
        Router::new()
            .nest(prefix, trip_routes)
            .layer(cors)
            .layer(middleware::from_fn(logging_middleware))
    };

    info!(
        "Router configured with all routes and middleware under prefix: '{}'",
        prefix
    );

    router.fallback(|req: Request| async move {
        warn!("No route matched for: {} {}", req.method(), req.uri());
        (
            axum::http::StatusCode::NOT_FOUND,
            "The requested resource was not found".to_string(),
        )
    })
}
