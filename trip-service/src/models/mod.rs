use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

// Request DTOs
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateTripRequest {
    /// Member ids; the first one is the trip's creator.
    #[serde(default)]
    pub users: Vec<Option<String>>,
    pub destination: String,
    #[serde(default)]
    pub invited_users: Vec<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTripRequest {
    pub users: Option<Vec<String>>,
    pub destination: Option<String>,
}

/// An entry of the companion list: registered users carry their id, people
/// who still have to be invited only an email.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct UserIdAndEmail {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTripUsersRequest {
    pub users: Vec<UserIdAndEmail>,
    pub invite_from: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct InvitationRequest {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub accepted: bool,
}

#[derive(Deserialize, Debug, Clone)]
pub struct DayRequest {
    #[serde(default)]
    pub title: Option<String>,
    pub day: NaiveDate,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct DayUpdateRequest {
    pub title: Option<String>,
    pub day: Option<NaiveDate>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AddPlanningRequest {
    /// The planning's first day.
    pub days: DayRequest,
    #[serde(default)]
    pub updated_by: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct StepRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub datetime: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct StepUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub datetime: Option<DateTime<Utc>>,
}
