use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::booking::{TravelUser, UserId};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

/// Workflow stage of a booking's review session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionStatus {
    NewRequest,
    InUserSelection,
    UserUpdateRequest,
    UserRejected,
    InManagerReview,
    ManagerApproved,
    ManagerRejected,
    ManagerUpdateRequest,
    Completed,
}

impl SessionStatus {
    pub const ALL: [SessionStatus; 9] = [
        Self::NewRequest,
        Self::InUserSelection,
        Self::UserUpdateRequest,
        Self::UserRejected,
        Self::InManagerReview,
        Self::ManagerApproved,
        Self::ManagerRejected,
        Self::ManagerUpdateRequest,
        Self::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewRequest => "NewRequest",
            Self::InUserSelection => "InUserSelection",
            Self::UserUpdateRequest => "UserUpdateRequest",
            Self::UserRejected => "UserRejected",
            Self::InManagerReview => "InManagerReview",
            Self::ManagerApproved => "ManagerApproved",
            Self::ManagerRejected => "ManagerRejected",
            Self::ManagerUpdateRequest => "ManagerUpdateRequest",
            Self::Completed => "Completed",
        }
    }

    /// A booking in any status but `Completed` may still be abandoned.
    pub fn is_abandonable(&self) -> bool {
        !matches!(self, Self::Completed)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse backend processing state, independent of the workflow stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Processing,
    Failed,
    Success,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub state: SessionState,
    pub status: SessionStatus,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<TravelUser>,
}

#[cfg(test)]
mod tests {
    use super::SessionStatus;

    #[test]
    fn status_round_trips_through_wire_names() {
        for status in SessionStatus::ALL {
            let encoded = serde_json::to_string(&status).expect("encode status");
            assert_eq!(encoded, format!("\"{}\"", status.as_str()));
            let decoded: SessionStatus = serde_json::from_str(&encoded).expect("decode status");
            assert_eq!(decoded, status);
        }
    }

    #[test]
    fn only_completed_sessions_are_not_abandonable() {
        let closed: Vec<_> =
            SessionStatus::ALL.into_iter().filter(|status| !status.is_abandonable()).collect();
        assert_eq!(closed, vec![SessionStatus::Completed]);
    }
}
