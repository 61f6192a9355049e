use log::{error, info};
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("Failed to reach mail API: {0}")]
    Request(String),

    #[error("Mail API error: {status} - {body}")]
    Api { status: u16, body: String },
}

#[derive(Debug, Serialize, PartialEq)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// Client for the transactional mail HTTP API.
#[derive(Clone)]
pub struct MailClient {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl MailClient {
    pub fn new(api_url: String, api_key: String, from: String) -> Self {
        Self {
            client: Client::new(),
            api_url,
            api_key,
            from,
        }
    }

    pub fn from_address(&self) -> &str {
        &self.from
    }

    pub async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        info!("Sending mail '{}' to {}", message.subject, message.to);

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
            .json(message)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send mail: {}", e);
                MailError::Request(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Mail API returned error status {}: {}", status, body);
            return Err(MailError::Api {
                status: status.as_u16(),
                body,
            });
        }

        info!("Mail delivered to {}", message.to);
        Ok(())
    }

    /// Sends the "you have been invited to a trip" mail.
    pub async fn send_trip_invitation(
        &self,
        inviter_name: &str,
        recipient_email: &str,
        trip_id: &str,
        app_base_url: &str,
    ) -> Result<(), MailError> {
        let message =
            trip_invitation_message(&self.from, inviter_name, recipient_email, trip_id, app_base_url);
        self.send(&message).await
    }
}

pub fn trip_invitation_message(
    from: &str,
    inviter_name: &str,
    recipient_email: &str,
    trip_id: &str,
    app_base_url: &str,
) -> MailMessage {
    let base = app_base_url.trim_end_matches('/');
    let url = format!("{}/trip/invitation?id={}", base, trip_id);
    let registered_url = format!("{}/register", base);

    MailMessage {
        from: from.to_string(),
        to: recipient_email.to_string(),
        subject: "BMG - You have been invited to a trip".to_string(),
        text: format!(
            "{} invited you to join their trip.\n\n\
             Open the invitation: {}\n\n\
             No account yet? Register first: {}\n",
            inviter_name, url, registered_url
        ),
    }
}
