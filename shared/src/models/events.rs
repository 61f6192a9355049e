use serde::{Deserialize, Serialize};

pub const TRIP_INVITATION_EVENT: &str = "trip_invitation";

/// Event for trip invitations, published once per newly invited email.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct TripInvitationEvent {
    pub event_type: String,
    pub trip_id: String,
    pub inviter_name: String,
    pub recipient_email: String,
    pub timestamp: String,
}
