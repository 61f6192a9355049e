use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_sns::types::MessageAttributeValue;
use aws_sdk_sns::Client as SnsClient;
use bmg_shared::models::events::{TripInvitationEvent, TRIP_INVITATION_EVENT};
use bmg_shared::models::now_str;
use log::{debug, info};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifierError {
    #[error("Failed to serialize event payload: {0}")]
    Serialization(String),

    #[error("Failed to publish invitation: {0}")]
    Publish(String),
}

/// Dispatches the "you have been invited to a trip" message.
#[async_trait]
pub trait InvitationNotifier: Send + Sync {
    async fn send_trip_invitation(
        &self,
        inviter_name: &str,
        recipient_email: &str,
        trip_id: &str,
    ) -> Result<(), NotifierError>;
}

/// Publishes a `trip_invitation` event for the notification service to mail.
pub struct SnsInvitationNotifier {
    client: SnsClient,
    topic_arn: String,
}

impl SnsInvitationNotifier {
    pub fn new(client: SnsClient, topic_arn: String) -> Self {
        Self { client, topic_arn }
    }
}

#[async_trait]
impl InvitationNotifier for SnsInvitationNotifier {
    async fn send_trip_invitation(
        &self,
        inviter_name: &str,
        recipient_email: &str,
        trip_id: &str,
    ) -> Result<(), NotifierError> {
        debug!(
            "Publishing trip_invitation event for trip_id={}, recipient={}",
            trip_id, recipient_email
        );

        let event = TripInvitationEvent {
            event_type: TRIP_INVITATION_EVENT.to_string(),
            trip_id: trip_id.to_string(),
            inviter_name: inviter_name.to_string(),
            recipient_email: recipient_email.to_string(),
            timestamp: now_str(),
        };
        let message = serde_json::to_string(&event)
            .map_err(|e| NotifierError::Serialization(e.to_string()))?;

        // Subscribers filter on this attribute
        let event_type_attr = MessageAttributeValue::builder()
            .data_type("String")
            .string_value(TRIP_INVITATION_EVENT)
            .build()
            .map_err(|e| NotifierError::Publish(format!("Failed to build message attribute: {}", e)))?;

        let mut message_attributes = HashMap::new();
        message_attributes.insert("eventType".to_string(), event_type_attr);

        self.client
            .publish()
            .topic_arn(&self.topic_arn)
            .message(message)
            .subject("Trip Invitation")
            .set_message_attributes(Some(message_attributes))
            .send()
            .await
            .map_err(|e| NotifierError::Publish(e.to_string()))?;

        info!(
            "Successfully published trip_invitation event for trip_id={}",
            trip_id
        );
        Ok(())
    }
}

/// Used when no topic is configured: invitations are only logged.
pub struct LogOnlyNotifier;

#[async_trait]
impl InvitationNotifier for LogOnlyNotifier {
    async fn send_trip_invitation(
        &self,
        inviter_name: &str,
        recipient_email: &str,
        trip_id: &str,
    ) -> Result<(), NotifierError> {
        info!(
            "No invitation topic configured, skipping invitation of {} to trip {} from {}",
            recipient_email, trip_id, inviter_name
        );
        Ok(())
    }
}
