use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::booking::{BookingId, SelectionIndices, TravelRequest, UserId};
use crate::domain::invoice::{BookingPage, TicketSubmissionReceipt};
use crate::review::{ManagerReview, ReviewOutcome};
use crate::tickets::TicketSubmission;

/// Failure talking to the booking backend.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The backend answered with `success = false`.
    #[error("{message}")]
    Rejected { message: String },
    #[error("{message}")]
    Http { status: u16, message: String },
    /// Credentials were refused and the single refresh attempt did not help.
    #[error("authorization failed: {message}")]
    Unauthorized { message: String },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("could not decode backend response: {0}")]
    Decode(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovedBookingsQuery {
    pub user_id: Option<UserId>,
    pub page: u32,
    pub size: u32,
}

impl Default for ApprovedBookingsQuery {
    fn default() -> Self {
        Self { user_id: None, page: 1, size: 10 }
    }
}

/// The backend operations the booking lifecycle depends on.
///
/// The backend is authoritative for state legality and versioning; adapters
/// only translate transport concerns into [`GatewayError`].
#[async_trait]
pub trait BookingGateway: Send + Sync {
    async fn fetch_booking(&self, id: &BookingId) -> Result<TravelRequest, GatewayError>;

    async fn submit_selections(
        &self,
        id: &BookingId,
        indices: SelectionIndices,
    ) -> Result<TravelRequest, GatewayError>;

    async fn manager_review(&self, review: &ManagerReview) -> Result<ReviewOutcome, GatewayError>;

    async fn deactivate_booking(
        &self,
        id: &BookingId,
        reason: &str,
    ) -> Result<TravelRequest, GatewayError>;

    async fn list_manager_approved(
        &self,
        query: &ApprovedBookingsQuery,
    ) -> Result<BookingPage, GatewayError>;

    async fn submit_ticket_invoices(
        &self,
        id: &BookingId,
        submission: &TicketSubmission,
    ) -> Result<TicketSubmissionReceipt, GatewayError>;
}

#[async_trait]
impl<G> BookingGateway for Arc<G>
where
    G: BookingGateway + ?Sized,
{
    async fn fetch_booking(&self, id: &BookingId) -> Result<TravelRequest, GatewayError> {
        (**self).fetch_booking(id).await
    }

    async fn submit_selections(
        &self,
        id: &BookingId,
        indices: SelectionIndices,
    ) -> Result<TravelRequest, GatewayError> {
        (**self).submit_selections(id, indices).await
    }

    async fn manager_review(&self, review: &ManagerReview) -> Result<ReviewOutcome, GatewayError> {
        (**self).manager_review(review).await
    }

    async fn deactivate_booking(
        &self,
        id: &BookingId,
        reason: &str,
    ) -> Result<TravelRequest, GatewayError> {
        (**self).deactivate_booking(id, reason).await
    }

    async fn list_manager_approved(
        &self,
        query: &ApprovedBookingsQuery,
    ) -> Result<BookingPage, GatewayError> {
        (**self).list_manager_approved(query).await
    }

    async fn submit_ticket_invoices(
        &self,
        id: &BookingId,
        submission: &TicketSubmission,
    ) -> Result<TicketSubmissionReceipt, GatewayError> {
        (**self).submit_ticket_invoices(id, submission).await
    }
}
