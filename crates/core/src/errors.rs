use thiserror::Error;

use crate::domain::booking::BookingId;
use crate::domain::option::Leg;
use crate::domain::session::SessionStatus;
use crate::flows::FlowTransitionError;
use crate::gateway::GatewayError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error(transparent)]
    FlowTransition(#[from] FlowTransitionError),
    #[error("booking `{booking_id}` is inactive and accepts no further changes")]
    BookingInactive { booking_id: BookingId },
    #[error("booking has no review session yet")]
    MissingSession,
    #[error("{operation} is not available while the session is {status}")]
    WrongStage { operation: &'static str, status: SessionStatus },
    #[error("selected {leg} index {index} is out of range for a catalog of {len}")]
    SelectionIndexOutOfRange { leg: Leg, index: usize, len: usize },
    #[error("the chosen {leg} option is not part of this booking's catalog")]
    OptionNotInCatalog { leg: Leg },
    #[error("review action must be ManagerApproved or ManagerRejected, got {action}")]
    InvalidReviewAction { action: SessionStatus },
    #[error("review feedback must be 1-200 characters, got {length}")]
    InvalidFeedback { length: usize },
    #[error("a deactivation reason is required")]
    InvalidDeactivationReason,
    #[error("a booking whose session is {status} cannot be deactivated")]
    NotAbandonable { status: SessionStatus },
    #[error("only a rejected booking can be revised")]
    RevisionNotAllowed,
    #[error("Please upload all 3 files (Onward, Return, and Hotel) before submitting.")]
    MissingTicketFiles { missing: Vec<Leg> },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("another operation on booking `{booking_id}` is still in flight")]
    OperationInFlight { booking_id: BookingId },
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("unauthorized: {message}")]
    Unauthorized { message: String, correlation_id: String },
    #[error("conflict: {message}")]
    Conflict { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::Unauthorized { .. } => "Your session has expired. Please sign in again.",
            Self::Conflict { .. } => {
                "The booking changed or is busy. Reload it to see its current state."
            }
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest { message, .. }
            | Self::Unauthorized { message, .. }
            | Self::Conflict { message, .. }
            | Self::ServiceUnavailable { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::Unauthorized { correlation_id: id, .. }
            | InterfaceError::Conflict { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let correlation_id = "unassigned".to_owned();
        match value {
            ApplicationError::Domain(error) => {
                Self::BadRequest { message: error.to_string(), correlation_id }
            }
            ApplicationError::Gateway(GatewayError::Unauthorized { message }) => {
                Self::Unauthorized { message, correlation_id }
            }
            ApplicationError::Gateway(GatewayError::Rejected { message }) => {
                Self::Conflict { message, correlation_id }
            }
            ApplicationError::Gateway(GatewayError::Http { status: 409, message }) => {
                Self::Conflict { message, correlation_id }
            }
            ApplicationError::Gateway(error @ GatewayError::Http { .. })
            | ApplicationError::Gateway(error @ GatewayError::Transport(_))
            | ApplicationError::Gateway(error @ GatewayError::Decode(_)) => {
                Self::ServiceUnavailable { message: error.to_string(), correlation_id }
            }
            error @ ApplicationError::OperationInFlight { .. } => {
                Self::Conflict { message: error.to_string(), correlation_id }
            }
            ApplicationError::Configuration(message) => Self::Internal { message, correlation_id },
        }
    }
}
