use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use tracing::{info, warn};
use uuid::Uuid;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink, NoopAuditSink};
use crate::deactivation::DeactivationRequest;
use crate::domain::booking::{BookingId, TravelRequest};
use crate::domain::invoice::{BookingPage, TicketSubmissionReceipt};
use crate::domain::option::Leg;
use crate::errors::{ApplicationError, DomainError};
use crate::flows::{BookingFlow, BookingPhase, FlowContext, FlowEngine, FlowEvent, ProgressStep};
use crate::gateway::{ApprovedBookingsQuery, BookingGateway, GatewayError};
use crate::review::{ManagerReview, ReviewDecision};
use crate::selection::{SelectionManager, SelectionPolicy};
use crate::tickets::{TicketDocument, TicketStaging};

/// Who is acting and under which correlation id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestContext {
    pub correlation_id: String,
    pub actor: String,
}

impl RequestContext {
    pub fn new(actor: impl Into<String>) -> Self {
        Self { correlation_id: Uuid::new_v4().to_string(), actor: actor.into() }
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = correlation_id.into();
        self
    }

    fn audit(&self, booking: &TravelRequest) -> AuditContext {
        AuditContext::new(
            Some(booking.id.clone()),
            Some(booking.session_id.clone()),
            self.correlation_id.clone(),
            self.actor.clone(),
        )
    }
}

/// A loaded booking plus the traveler's local working state.
#[derive(Clone, Debug)]
pub struct BookingView {
    booking: TravelRequest,
    selection: SelectionManager,
    revising: bool,
}

impl BookingView {
    pub fn new(booking: TravelRequest, policy: SelectionPolicy) -> Self {
        let selection = SelectionManager::for_booking(&booking, policy);
        Self { booking, selection, revising: false }
    }

    pub fn booking(&self) -> &TravelRequest {
        &self.booking
    }

    pub fn selection(&self) -> &SelectionManager {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionManager {
        &mut self.selection
    }

    pub fn is_revising(&self) -> bool {
        self.revising
    }

    pub fn phase(&self) -> BookingPhase {
        if self.revising {
            return BookingPhase::Selecting;
        }
        BookingPhase::from_status(self.booking.session_status())
    }

    pub fn steps(&self) -> [ProgressStep; 3] {
        self.phase().steps()
    }

    /// Re-enters selection locally after a rejection. Nothing is sent to the backend.
    pub fn revise(&mut self) -> Result<(), DomainError> {
        ensure_active(&self.booking)?;
        if !BookingPhase::from_status(self.booking.session_status()).is_rejected() {
            return Err(DomainError::RevisionNotAllowed);
        }
        self.revising = true;
        Ok(())
    }

    fn replace(&mut self, booking: TravelRequest) {
        self.selection = SelectionManager::for_booking(&booking, self.selection.policy());
        self.booking = booking;
        self.revising = false;
    }
}

fn ensure_active(booking: &TravelRequest) -> Result<(), DomainError> {
    if booking.is_inactive() {
        return Err(DomainError::BookingInactive { booking_id: booking.id.clone() });
    }
    Ok(())
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Marks a booking busy until dropped.
struct InFlight<'a> {
    bookings: &'a Mutex<HashSet<BookingId>>,
    booking_id: BookingId,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        lock(self.bookings).remove(&self.booking_id);
    }
}

/// Drives the booking protocols against a backend.
///
/// Every mutation is checked locally first (terminal state, stage, local
/// completeness) so refused operations never reach the backend. At most one
/// mutation per booking runs at a time.
pub struct BookingWorkflow<G, S = NoopAuditSink> {
    gateway: G,
    audit: S,
    policy: SelectionPolicy,
    engine: FlowEngine<BookingFlow>,
    in_flight: Mutex<HashSet<BookingId>>,
    staging: Mutex<TicketStaging>,
}

impl<G> BookingWorkflow<G, NoopAuditSink>
where
    G: BookingGateway,
{
    pub fn new(gateway: G, policy: SelectionPolicy) -> Self {
        Self {
            gateway,
            audit: NoopAuditSink,
            policy,
            engine: FlowEngine::default(),
            in_flight: Mutex::new(HashSet::new()),
            staging: Mutex::new(TicketStaging::default()),
        }
    }
}

impl<G, S> BookingWorkflow<G, S>
where
    G: BookingGateway,
    S: AuditSink,
{
    pub fn with_audit_sink<T: AuditSink>(self, audit: T) -> BookingWorkflow<G, T> {
        BookingWorkflow {
            gateway: self.gateway,
            audit,
            policy: self.policy,
            engine: self.engine,
            in_flight: self.in_flight,
            staging: self.staging,
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    pub async fn load(
        &self,
        id: &BookingId,
        ctx: &RequestContext,
    ) -> Result<BookingView, ApplicationError> {
        let booking = self.gateway.fetch_booking(id).await.map_err(|error| {
            warn!(
                event_name = "booking.load.failed",
                correlation_id = %ctx.correlation_id,
                booking_id = %id,
                error = %error,
                "booking could not be fetched"
            );
            error
        })?;
        booking.validate_selection_indices()?;
        let view = BookingView::new(booking, self.policy);
        info!(
            event_name = "booking.load.completed",
            correlation_id = %ctx.correlation_id,
            booking_id = %id,
            step = view.phase().step(),
            "booking loaded"
        );
        Ok(view)
    }

    pub async fn submit_selections(
        &self,
        view: &mut BookingView,
        ctx: &RequestContext,
    ) -> Result<(), ApplicationError> {
        let _busy = self.begin(&view.booking.id)?;
        let booking = &view.booking;
        ensure_active(booking)?;
        let status = booking.session_status().ok_or(DomainError::MissingSession)?;
        if view.phase() != BookingPhase::Selecting {
            return Err(DomainError::WrongStage { operation: "selection submission", status }.into());
        }
        let audit = ctx.audit(booking);
        let context = FlowContext { missing_legs: view.selection.missing_legs() };
        self.engine
            .apply_with_audit(&status, &FlowEvent::SelectionsSubmitted, &context, &self.audit, &audit)
            .map_err(DomainError::from)?;

        let indices = view.selection.to_persisted_indices();
        let updated = self
            .gateway
            .submit_selections(&booking.id, indices)
            .await
            .map_err(|error| self.failed(&audit, "selection.submit_failed", AuditCategory::Selection, error))?;

        self.audit.emit(
            AuditEvent::from_context(&audit, "selection.submitted", AuditCategory::Selection, AuditOutcome::Success)
                .with_metadata("indices", format!("{indices:?}")),
        );
        info!(
            event_name = "selection.submitted",
            correlation_id = %ctx.correlation_id,
            booking_id = %updated.id,
            version = updated.version,
            "selections persisted"
        );
        view.replace(updated);
        Ok(())
    }

    pub async fn manager_review(
        &self,
        view: &mut BookingView,
        decision: ReviewDecision,
        feedback: &str,
        ctx: &RequestContext,
    ) -> Result<(), ApplicationError> {
        let _busy = self.begin(&view.booking.id)?;
        let booking = &view.booking;
        ensure_active(booking)?;
        let status = booking.session_status().ok_or(DomainError::MissingSession)?;
        let review = ManagerReview::new(booking, decision, feedback)?;
        let audit = ctx.audit(booking);
        self.engine
            .apply_with_audit(&status, &decision.flow_event(), &FlowContext::default(), &self.audit, &audit)
            .map_err(DomainError::from)?;

        let outcome = self
            .gateway
            .manager_review(&review)
            .await
            .map_err(|error| self.failed(&audit, "review.failed", AuditCategory::Review, error))?;

        self.audit.emit(
            AuditEvent::from_context(&audit, "review.recorded", AuditCategory::Review, AuditOutcome::Success)
                .with_metadata("action", review.action.as_str()),
        );
        info!(
            event_name = "review.recorded",
            correlation_id = %ctx.correlation_id,
            booking_id = %review.booking_id,
            action = review.action.as_str(),
            "manager decision recorded"
        );
        view.replace(outcome.into_booking());
        Ok(())
    }

    pub async fn deactivate(
        &self,
        view: &mut BookingView,
        reason: &str,
        ctx: &RequestContext,
    ) -> Result<(), ApplicationError> {
        let _busy = self.begin(&view.booking.id)?;
        let request = DeactivationRequest::new(&view.booking, reason)?;
        let audit = ctx.audit(&view.booking);

        let updated = self
            .gateway
            .deactivate_booking(&request.booking_id, &request.reason)
            .await
            .map_err(|error| self.failed(&audit, "booking.deactivate_failed", AuditCategory::Deactivation, error))?;

        lock(&self.staging).clear(&request.booking_id);
        self.audit.emit(
            AuditEvent::from_context(&audit, "booking.deactivated", AuditCategory::Deactivation, AuditOutcome::Success)
                .with_metadata("reason", request.reason.clone()),
        );
        info!(
            event_name = "booking.deactivated",
            correlation_id = %ctx.correlation_id,
            booking_id = %request.booking_id,
            "booking deactivated"
        );
        view.replace(updated);
        Ok(())
    }

    /// Stages or, with `None`, unstages the ticket file for one leg.
    pub fn stage_ticket(&self, booking_id: &BookingId, leg: Leg, document: Option<TicketDocument>) {
        lock(&self.staging).stage(booking_id, leg, document);
    }

    pub fn staged_legs(&self, booking_id: &BookingId) -> Vec<Leg> {
        lock(&self.staging)
            .staged(booking_id)
            .map(|files| files.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Uploads the three staged ticket files with the computed leg amounts.
    ///
    /// Staged files survive a failed upload so the issuer can retry as is.
    pub async fn submit_tickets(
        &self,
        view: &mut BookingView,
        ctx: &RequestContext,
    ) -> Result<TicketSubmissionReceipt, ApplicationError> {
        let _busy = self.begin(&view.booking.id)?;
        let booking = &view.booking;
        ensure_active(booking)?;
        let status = booking.session_status().ok_or(DomainError::MissingSession)?;
        let submission = lock(&self.staging).prepare(booking)?;
        let audit = ctx.audit(booking);
        self.engine
            .apply_with_audit(&status, &FlowEvent::TicketsIssued, &FlowContext::default(), &self.audit, &audit)
            .map_err(DomainError::from)?;

        let receipt = self
            .gateway
            .submit_ticket_invoices(&booking.id, &submission)
            .await
            .map_err(|error| self.failed(&audit, "tickets.submit_failed", AuditCategory::Ticketing, error))?;

        let booking_id = booking.id.clone();
        lock(&self.staging).clear(&booking_id);
        self.audit.emit(
            AuditEvent::from_context(&audit, "tickets.submitted", AuditCategory::Ticketing, AuditOutcome::Success)
                .with_metadata("uploaded_count", receipt.uploaded_count.to_string())
                .with_metadata("total", submission.amounts.total().to_string()),
        );
        info!(
            event_name = "tickets.submitted",
            correlation_id = %ctx.correlation_id,
            booking_id = %booking_id,
            uploaded_count = receipt.uploaded_count,
            "ticket invoices created"
        );

        match self.gateway.fetch_booking(&booking_id).await {
            Ok(refreshed) => view.replace(refreshed),
            Err(error) => warn!(
                event_name = "booking.refresh.failed",
                correlation_id = %ctx.correlation_id,
                booking_id = %booking_id,
                error = %error,
                "booking could not be refreshed after ticket submission"
            ),
        }
        Ok(receipt)
    }

    pub async fn list_manager_approved(
        &self,
        query: &ApprovedBookingsQuery,
        ctx: &RequestContext,
    ) -> Result<BookingPage, ApplicationError> {
        let page = self.gateway.list_manager_approved(query).await?;
        info!(
            event_name = "tickets.queue.listed",
            correlation_id = %ctx.correlation_id,
            page = page.page,
            total = page.total,
            "manager approved bookings listed"
        );
        Ok(page)
    }

    fn begin(&self, booking_id: &BookingId) -> Result<InFlight<'_>, ApplicationError> {
        if !lock(&self.in_flight).insert(booking_id.clone()) {
            return Err(ApplicationError::OperationInFlight { booking_id: booking_id.clone() });
        }
        Ok(InFlight { bookings: &self.in_flight, booking_id: booking_id.clone() })
    }

    fn failed(
        &self,
        audit: &AuditContext,
        event_type: &str,
        category: AuditCategory,
        error: GatewayError,
    ) -> ApplicationError {
        warn!(
            event_name = event_type,
            correlation_id = %audit.correlation_id,
            booking_id = ?audit.booking_id,
            error = %error,
            "backend refused or failed the operation"
        );
        self.audit.emit(
            AuditEvent::from_context(audit, event_type, category, AuditOutcome::Failed)
                .with_metadata("error", error.to_string()),
        );
        error.into()
    }
}
