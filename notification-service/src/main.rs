use std::sync::Arc;

use anyhow::Context;
use aws_lambda_events::event::sns::SnsEvent;
use bmg_shared::mail::MailClient;
use bmg_shared::models::events::{TripInvitationEvent, TRIP_INVITATION_EVENT};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use log::{error, info, warn};

mod errors;

use errors::NotificationError;

/// Everything needed to turn an event into a mail.
struct Mailer {
    client: MailClient,
    app_base_url: String,
}

impl Mailer {
    fn from_env() -> anyhow::Result<Self> {
        let var = |name: &str| std::env::var(name).with_context(|| format!("{} must be set", name));

        Ok(Self {
            client: MailClient::new(var("MAIL_API_URL")?, var("MAIL_API_KEY")?, var("MAIL_FROM")?),
            app_base_url: var("APP_BASE_URL")?,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Logging initialized with env_logger");
    info!("Starting Notification Service Lambda");

    let mailer = Arc::new(Mailer::from_env()?);
    info!("Sending mail as {}", mailer.client.from_address());

    lambda_runtime::run(service_fn(|event| handler(event, mailer.clone()))).await?;
    Ok(())
}

/// Lambda handler function
async fn handler(event: LambdaEvent<SnsEvent>, mailer: Arc<Mailer>) -> Result<(), Error> {
    for record in event.payload.records {
        let message = record.sns;
        info!("Processing SNS message: {:?}", message.message_id);

        // A bad record must not block the rest of the batch
        match handle_message(&mailer, &message.message).await {
            Ok(()) => {}
            Err(NotificationError::UnexpectedEvent(event_type)) => {
                warn!("Unexpected event type: {}", event_type);
            }
            Err(e) => error!("Failed to process SNS message {:?}: {}", message.message_id, e),
        }
    }

    Ok(())
}

async fn handle_message(mailer: &Mailer, message: &str) -> Result<(), NotificationError> {
    let event: TripInvitationEvent = serde_json::from_str(message)
        .map_err(|e| NotificationError::InvalidMessage(e.to_string()))?;

    if event.event_type != TRIP_INVITATION_EVENT {
        return Err(NotificationError::UnexpectedEvent(event.event_type));
    }

    info!(
        "Processing trip_invitation event for trip_id={}, recipient={}",
        event.trip_id, event.recipient_email
    );

    mailer
        .client
        .send_trip_invitation(
            &event.inviter_name,
            &event.recipient_email,
            &event.trip_id,
            &mailer.app_base_url,
        )
        .await?;

    info!(
        "Successfully sent invitation for trip_id={} to {}",
        event.trip_id, event.recipient_email
    );
    Ok(())
}
