use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::store::Document;

pub mod events;

/// Current time as an RFC 3339 string, used for event timestamps.
pub fn now_str() -> String {
    Utc::now().to_rfc3339()
}

/// A reference held by one document to another.
///
/// Stored documents only ever hold the referenced id. Read paths may swap the
/// id for the referenced document itself, in which case the field serializes
/// as the full nested object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ref<T> {
    Id(String),
    Populated(Box<T>),
}

impl<T: Document> Ref<T> {
    pub fn id(&self) -> &str {
        match self {
            Ref::Id(id) => id,
            Ref::Populated(doc) => doc.id(),
        }
    }

    pub fn populated(&self) -> Option<&T> {
        match self {
            Ref::Id(_) => None,
            Ref::Populated(doc) => Some(doc),
        }
    }
}

impl<T> From<String> for Ref<T> {
    fn from(id: String) -> Self {
        Ref::Id(id)
    }
}

impl<T> From<&str> for Ref<T> {
    fn from(id: &str) -> Self {
        Ref::Id(id.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: String,
    pub users: Vec<Ref<User>>,
    pub destination: Ref<Destination>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planning: Option<Ref<TripPlanning>>,
    #[serde(default)]
    pub invited_users: Vec<String>,
}

impl Trip {
    pub fn has_member(&self, user_id: &str) -> bool {
        self.users.iter().any(|u| u.id() == user_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripPlanning {
    pub id: String,
    #[serde(default)]
    pub days: Vec<Ref<TripDay>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripDay {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub day: NaiveDate,
    #[serde(default)]
    pub steps: Vec<Ref<TripStep>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripStep {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub datetime: DateTime<Utc>,
}

/// Public profile of a registered user. Credentials live with the user
/// service and never pass through here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub long: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

impl Document for Trip {
    const COLLECTION: &'static str = "trips";
    fn id(&self) -> &str {
        &self.id
    }
}

impl Document for TripPlanning {
    const COLLECTION: &'static str = "trip_plannings";
    fn id(&self) -> &str {
        &self.id
    }
}

impl Document for TripDay {
    const COLLECTION: &'static str = "trip_days";
    fn id(&self) -> &str {
        &self.id
    }
}

impl Document for TripStep {
    const COLLECTION: &'static str = "trip_steps";
    fn id(&self) -> &str {
        &self.id
    }
}

impl Document for User {
    const COLLECTION: &'static str = "users";
    fn id(&self) -> &str {
        &self.id
    }
}

impl Document for Destination {
    const COLLECTION: &'static str = "destinations";
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MessageResponse {
    pub message: String,
}
