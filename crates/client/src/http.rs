use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use tripdesk_core::config::AppConfig;
use tripdesk_core::{
    ApprovedBookingsQuery, BookingGateway, BookingId, BookingPage, GatewayError, Leg,
    ManagerReview, ReviewOutcome, SelectionIndices, TicketSubmission, TicketSubmissionReceipt,
    TravelRequest,
};

use crate::auth::{CredentialProvider, RefreshingCredentials, StaticCredentials};
use crate::transport::AuthenticatedTransport;

const FETCH_FAILED: &str = "Failed to fetch booking";
const SELECTIONS_FAILED: &str = "Failed to update booking selections";
const REVIEW_FAILED: &str = "Failed to process manager review";
const DEACTIVATE_FAILED: &str = "Failed to deactivate booking";
const APPROVED_LIST_FAILED: &str = "Failed to fetch manager approved bookings";
const TICKETS_FAILED: &str = "Failed to submit ticket invoices";

/// [`BookingGateway`] over the travel-request REST API.
pub struct HttpBookingGateway {
    base_url: String,
    transport: AuthenticatedTransport,
}

impl HttpBookingGateway {
    pub fn new(base_url: impl Into<String>, transport: AuthenticatedTransport) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { base_url, transport }
    }

    /// Builds the client, credentials and transport from application config.
    pub fn from_config(config: &AppConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.api.timeout_secs))
            .build()
            .map_err(|error| GatewayError::Transport(error.to_string()))?;

        let credentials: Arc<dyn CredentialProvider> = match &config.auth.refresh_token {
            Some(refresh_token) => Arc::new(RefreshingCredentials::new(
                client.clone(),
                config.api_base_url(),
                config.auth.access_token.clone(),
                refresh_token.clone(),
            )),
            None => Arc::new(StaticCredentials::new(config.auth.access_token.clone())),
        };

        Ok(Self::new(config.api_base_url(), AuthenticatedTransport::new(client, credentials)))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/travel-requests/bookings/{id}[/{action}]` with the id as one encoded segment.
    fn booking_url(&self, id: &BookingId, action: Option<&str>) -> Result<Url, GatewayError> {
        let invalid = || GatewayError::Transport(format!("invalid API base url `{}`", self.base_url));
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| invalid())?;
            segments.pop_if_empty().extend(["travel-requests", "bookings"]).push(&id.0);
            if let Some(action) = action {
                segments.push(action);
            }
        }
        Ok(url)
    }

    async fn call<T, F>(
        &self,
        operation: &'static str,
        fallback: &'static str,
        build: F,
    ) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
        F: Fn(&Client) -> Result<RequestBuilder, GatewayError> + Send + Sync,
    {
        let response = self.transport.send(operation, build).await?;
        let status = response.status().as_u16();
        let body =
            response.bytes().await.map_err(|error| GatewayError::Transport(error.to_string()))?;

        let result = crate::envelope::decode_response(status, &body, fallback);
        match &result {
            Ok(_) => debug!(event_name = "gateway.call.ok", operation, status, "backend call succeeded"),
            Err(error) => warn!(
                event_name = "gateway.call.failed",
                operation,
                status,
                error = %error,
                "backend call failed"
            ),
        }
        result
    }
}

fn ticket_form(submission: &TicketSubmission) -> Result<Form, GatewayError> {
    let mut form = Form::new();
    for (leg, document) in &submission.files {
        let part = Part::bytes(document.bytes.clone())
            .file_name(document.file_name.clone())
            .mime_str(&document.content_type)
            .map_err(|error| {
                GatewayError::Transport(format!(
                    "invalid content type `{}` for {leg} ticket: {error}",
                    document.content_type
                ))
            })?;
        form = form.part(format!("{}_file", leg.field_prefix()), part);
    }
    for leg in Leg::ALL {
        form = form.text(format!("{}_amount", leg.field_prefix()), submission.amounts.get(leg).to_string());
    }
    Ok(form)
}

#[async_trait]
impl BookingGateway for HttpBookingGateway {
    async fn fetch_booking(&self, id: &BookingId) -> Result<TravelRequest, GatewayError> {
        let url = self.booking_url(id, None)?;
        self.call("fetch_booking", FETCH_FAILED, |client| Ok(client.get(url.clone()))).await
    }

    async fn submit_selections(
        &self,
        id: &BookingId,
        indices: SelectionIndices,
    ) -> Result<TravelRequest, GatewayError> {
        let url = self.booking_url(id, Some("selections"))?;
        self.call("submit_selections", SELECTIONS_FAILED, |client| {
            Ok(client.put(url.clone()).json(&indices))
        })
        .await
    }

    async fn manager_review(&self, review: &ManagerReview) -> Result<ReviewOutcome, GatewayError> {
        let url = self.booking_url(&review.booking_id, Some("manager-review"))?;
        self.call("manager_review", REVIEW_FAILED, |client| Ok(client.post(url.clone()).json(review)))
            .await
    }

    async fn deactivate_booking(
        &self,
        id: &BookingId,
        reason: &str,
    ) -> Result<TravelRequest, GatewayError> {
        let url = self.booking_url(id, Some("deactivate"))?;
        self.call("deactivate_booking", DEACTIVATE_FAILED, |client| {
            Ok(client.put(url.clone()).query(&[("reason", reason)]))
        })
        .await
    }

    async fn list_manager_approved(
        &self,
        query: &ApprovedBookingsQuery,
    ) -> Result<BookingPage, GatewayError> {
        let url = format!("{}/travel-requests/ticket-issuer/manager-approved", self.base_url);
        let mut params = vec![("page", query.page.to_string()), ("size", query.size.to_string())];
        if let Some(user_id) = &query.user_id {
            params.push(("user_id", user_id.0.clone()));
        }

        let mut page: BookingPage = self
            .call("list_manager_approved", APPROVED_LIST_FAILED, |client| {
                Ok(client.get(&url).query(&params))
            })
            .await?;
        page.page = query.page;
        page.size = query.size;
        Ok(page)
    }

    async fn submit_ticket_invoices(
        &self,
        id: &BookingId,
        submission: &TicketSubmission,
    ) -> Result<TicketSubmissionReceipt, GatewayError> {
        let url = self.booking_url(id, Some("submit-tickets"))?;
        self.call("submit_ticket_invoices", TICKETS_FAILED, |client| {
            Ok(client.post(url.clone()).multipart(ticket_form(submission)?))
        })
        .await
    }
}
