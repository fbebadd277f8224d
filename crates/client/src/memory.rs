use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use tripdesk_core::fixtures::seed_bookings;
use tripdesk_core::flows::{BookingFlow, FlowContext, FlowEngine, FlowEvent, FlowState};
use tripdesk_core::{
    ApprovedBookingsQuery, BookingGateway, BookingId, BookingPage, GatewayError, Invoice,
    InvoiceCategory, InvoiceId, Leg, ManagerReview, ReviewOutcome, SelectionIndices,
    SessionState, SessionStatus, TicketSubmission, TicketSubmissionReceipt, TravelRequest,
};

/// Reference backend held in memory.
///
/// Enforces what the real service enforces: legal session transitions, a
/// version bump per mutation, Inactive as a terminal status and one invoice
/// per uploaded ticket.
#[derive(Default)]
pub struct InMemoryBookingGateway {
    bookings: RwLock<HashMap<String, TravelRequest>>,
    invoices: RwLock<Vec<Invoice>>,
    engine: FlowEngine<BookingFlow>,
}

impl InMemoryBookingGateway {
    pub fn new(bookings: impl IntoIterator<Item = TravelRequest>) -> Self {
        let bookings = bookings.into_iter().map(|booking| (booking.id.0.clone(), booking)).collect();
        Self { bookings: RwLock::new(bookings), ..Self::default() }
    }

    /// Backend preloaded with the demo dataset.
    pub fn seeded() -> Self {
        Self::new(seed_bookings())
    }

    pub async fn insert(&self, booking: TravelRequest) {
        self.bookings.write().await.insert(booking.id.0.clone(), booking);
    }

    pub async fn invoices(&self) -> Vec<Invoice> {
        self.invoices.read().await.clone()
    }

    fn advance(
        &self,
        booking: &TravelRequest,
        event: FlowEvent,
        context: &FlowContext,
    ) -> Result<FlowState, GatewayError> {
        let current = booking
            .session_status()
            .ok_or_else(|| rejected(format!("Booking {} has no session", booking.id)))?;
        self.engine
            .apply(&current, &event, context)
            .map(|outcome| outcome.to)
            .map_err(|error| rejected(error.to_string()))
    }
}

fn rejected(message: impl Into<String>) -> GatewayError {
    GatewayError::Rejected { message: message.into() }
}

fn not_found(id: &BookingId) -> GatewayError {
    GatewayError::Http { status: 404, message: format!("Travel request {id} not found") }
}

fn ensure_active(booking: &TravelRequest) -> Result<(), GatewayError> {
    if booking.is_inactive() {
        return Err(rejected(format!("Booking {} is inactive", booking.id)));
    }
    Ok(())
}

fn set_session_status(booking: &mut TravelRequest, status: SessionStatus) {
    let now = Utc::now();
    if let Some(session) = booking.session.as_mut() {
        session.status = status;
        session.updated_at = now;
        if status == SessionStatus::Completed {
            session.state = SessionState::Success;
            session.completed_at = Some(now);
        }
    }
    booking.touch();
}

#[async_trait]
impl BookingGateway for InMemoryBookingGateway {
    async fn fetch_booking(&self, id: &BookingId) -> Result<TravelRequest, GatewayError> {
        let bookings = self.bookings.read().await;
        bookings.get(&id.0).cloned().ok_or_else(|| not_found(id))
    }

    async fn submit_selections(
        &self,
        id: &BookingId,
        indices: SelectionIndices,
    ) -> Result<TravelRequest, GatewayError> {
        let mut bookings = self.bookings.write().await;
        let booking = bookings.get_mut(&id.0).ok_or_else(|| not_found(id))?;
        ensure_active(booking)?;

        let mut candidate = booking.clone();
        candidate.apply_selection_indices(indices);
        candidate.validate_selection_indices().map_err(|error| rejected(error.to_string()))?;
        // Only legs with something to choose from are mandatory here.
        let missing_legs = Leg::ALL
            .into_iter()
            .filter(|leg| !candidate.catalog(*leg).is_empty() && indices.get(*leg).is_none())
            .collect();
        let next =
            self.advance(&candidate, FlowEvent::SelectionsSubmitted, &FlowContext { missing_legs })?;

        set_session_status(&mut candidate, next);
        *booking = candidate;
        info!(
            event_name = "backend.selections.saved",
            booking_id = %id,
            version = booking.version,
            "selections saved"
        );
        Ok(booking.clone())
    }

    async fn manager_review(&self, review: &ManagerReview) -> Result<ReviewOutcome, GatewayError> {
        review.validate().map_err(|error| rejected(error.to_string()))?;
        let decision = review.decision().map_err(|error| rejected(error.to_string()))?;

        let mut bookings = self.bookings.write().await;
        let booking =
            bookings.get_mut(&review.booking_id.0).ok_or_else(|| not_found(&review.booking_id))?;
        ensure_active(booking)?;
        if booking.session_id != review.session_id {
            return Err(rejected("Session does not belong to this booking"));
        }

        let next = self.advance(booking, decision.flow_event(), &FlowContext::default())?;
        booking.manager_feedback = Some(review.feedback.clone());
        set_session_status(booking, next);

        let session = booking
            .session
            .clone()
            .ok_or_else(|| rejected(format!("Booking {} has no session", booking.id)))?;
        Ok(ReviewOutcome { session, booking: booking.clone() })
    }

    async fn deactivate_booking(
        &self,
        id: &BookingId,
        reason: &str,
    ) -> Result<TravelRequest, GatewayError> {
        let mut bookings = self.bookings.write().await;
        let booking = bookings.get_mut(&id.0).ok_or_else(|| not_found(id))?;
        booking.deactivate(reason).map_err(|error| rejected(error.to_string()))?;
        Ok(booking.clone())
    }

    async fn list_manager_approved(
        &self,
        query: &ApprovedBookingsQuery,
    ) -> Result<BookingPage, GatewayError> {
        let bookings = self.bookings.read().await;
        let mut approved: Vec<TravelRequest> = bookings
            .values()
            .filter(|booking| !booking.is_inactive())
            .filter(|booking| booking.session_status() == Some(SessionStatus::ManagerApproved))
            .filter(|booking| query.user_id.as_ref().map_or(true, |user| &booking.user_id == user))
            .cloned()
            .collect();
        approved.sort_by(|left, right| left.id.cmp(&right.id));

        let total = approved.len() as u64;
        let size = query.size as usize;
        let skip = (query.page.max(1) as usize - 1).saturating_mul(size);
        let travel_requests = approved.into_iter().skip(skip).take(size).collect();
        Ok(BookingPage { travel_requests, total, page: query.page, size: query.size })
    }

    async fn submit_ticket_invoices(
        &self,
        id: &BookingId,
        submission: &TicketSubmission,
    ) -> Result<TicketSubmissionReceipt, GatewayError> {
        let mut bookings = self.bookings.write().await;
        let booking = bookings.get_mut(&id.0).ok_or_else(|| not_found(id))?;
        ensure_active(booking)?;
        if submission.files.is_empty() {
            return Err(rejected("No ticket files uploaded"));
        }
        let next = self.advance(booking, FlowEvent::TicketsIssued, &FlowContext::default())?;

        let now = Utc::now();
        let created: Vec<Invoice> = submission
            .files
            .iter()
            .map(|(leg, document)| Invoice {
                id: InvoiceId(Uuid::new_v4().to_string()),
                user_id: booking.user_id.clone(),
                booking_id: booking.id.clone(),
                session_id: booking.session_id.clone(),
                category: InvoiceCategory::for_leg(
                    *leg,
                    booking.selected_option(*leg).map(|option| option.mode),
                ),
                amount: submission.amounts.get(*leg),
                file_path: format!(
                    "uploads/invoices/{}/{}_{}",
                    booking.id,
                    leg.field_prefix(),
                    document.file_name
                ),
                created_at: now,
                updated_at: now,
            })
            .collect();

        set_session_status(booking, next);
        self.invoices.write().await.extend(created.iter().cloned());
        info!(
            event_name = "backend.tickets.invoiced",
            booking_id = %id,
            invoice_count = created.len(),
            "ticket invoices created"
        );
        Ok(TicketSubmissionReceipt { uploaded_count: created.len(), invoices: created })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rust_decimal::Decimal;

    use tripdesk_core::fixtures::{booking_fixture, flight, hotel, train, with_status};
    use tripdesk_core::{
        ApprovedBookingsQuery, BookingGateway, BookingId, BookingStatus, GatewayError,
        InvoiceCategory, Leg, LegAmounts, ManagerReview, ReviewDecision, SelectionIndices,
        SessionState, SessionStatus, TicketDocument, TicketSubmission, UserId,
    };

    use super::InMemoryBookingGateway;

    fn id(raw: &str) -> BookingId {
        BookingId(raw.to_owned())
    }

    fn all_files() -> BTreeMap<Leg, TicketDocument> {
        Leg::ALL
            .into_iter()
            .map(|leg| (leg, TicketDocument::new(format!("{leg}.pdf"), vec![1, 2, 3])))
            .collect()
    }

    #[tokio::test]
    async fn selections_advance_session_and_bump_version() {
        let gateway = InMemoryBookingGateway::new([booking_fixture(
            vec![flight("AI-101", 300)],
            vec![],
            vec![hotel("Harbour View", 300, 900)],
        )]);
        let indices = SelectionIndices {
            selected_onward_index: Some(0),
            selected_return_index: None,
            selected_hotel_index: Some(0),
        };

        let updated = gateway.submit_selections(&id("bk-fixture"), indices).await.expect("submit");
        assert_eq!(updated.session_status(), Some(SessionStatus::InManagerReview));
        assert_eq!(updated.version, 2);
        assert_eq!(updated.selection_indices(), indices);

        let again = gateway.submit_selections(&id("bk-fixture"), indices).await.expect_err("stage");
        assert!(matches!(again, GatewayError::Rejected { .. }));
    }

    #[tokio::test]
    async fn out_of_range_selection_is_refused_without_changes() {
        let gateway = InMemoryBookingGateway::new([booking_fixture(vec![flight("AI-101", 300)], vec![], vec![])]);
        let indices = SelectionIndices { selected_onward_index: Some(4), ..SelectionIndices::default() };

        let error = gateway.submit_selections(&id("bk-fixture"), indices).await.expect_err("range");
        assert!(matches!(error, GatewayError::Rejected { .. }));
        let stored = gateway.fetch_booking(&id("bk-fixture")).await.expect("fetch");
        assert_eq!(stored.version, 1);
        assert_eq!(stored.session_status(), Some(SessionStatus::InUserSelection));
    }

    #[tokio::test]
    async fn review_records_feedback_and_returns_both_records() {
        let booking = with_status(booking_fixture(vec![], vec![], vec![]), SessionStatus::InManagerReview);
        let review = ManagerReview::new(&booking, ReviewDecision::Rejected, "over budget").expect("review");
        let gateway = InMemoryBookingGateway::new([booking]);

        let outcome = gateway.manager_review(&review).await.expect("review");
        assert_eq!(outcome.session.status, SessionStatus::ManagerRejected);
        assert_eq!(outcome.booking.manager_feedback.as_deref(), Some("over budget"));
    }

    #[tokio::test]
    async fn inactive_bookings_refuse_every_mutation() {
        let gateway = InMemoryBookingGateway::new([booking_fixture(vec![], vec![], vec![])]);
        let inactive = gateway.deactivate_booking(&id("bk-fixture"), "trip cancelled").await.expect("deactivate");
        assert_eq!(inactive.status, BookingStatus::Inactive);

        let selections = gateway.submit_selections(&id("bk-fixture"), SelectionIndices::default()).await;
        let deactivate = gateway.deactivate_booking(&id("bk-fixture"), "again").await;
        let tickets = gateway
            .submit_ticket_invoices(
                &id("bk-fixture"),
                &TicketSubmission { files: all_files(), amounts: LegAmounts::default() },
            )
            .await;
        let review = gateway
            .manager_review(&ManagerReview::new(&inactive, ReviewDecision::Approved, "ok").expect("review"))
            .await;

        assert!(selections.is_err());
        assert!(deactivate.is_err());
        assert!(tickets.is_err());
        assert!(review.is_err());
    }

    #[tokio::test]
    async fn tickets_create_one_invoice_per_file_and_complete_the_session() {
        let mut booking = with_status(
            booking_fixture(
                vec![train("12951", 1_890)],
                vec![flight("6E-202", 4_600)],
                vec![hotel("Harbour View", 3_000, 9_000)],
            ),
            SessionStatus::ManagerApproved,
        );
        booking.selected_onward_index = Some(0);
        booking.selected_return_index = Some(0);
        booking.selected_hotel_index = Some(0);
        let amounts = LegAmounts::for_booking(&booking);
        let gateway = InMemoryBookingGateway::new([booking]);

        let receipt = gateway
            .submit_ticket_invoices(&id("bk-fixture"), &TicketSubmission { files: all_files(), amounts })
            .await
            .expect("submit");

        assert_eq!(receipt.uploaded_count, 3);
        let categories: Vec<_> = receipt.invoices.iter().map(|invoice| invoice.category).collect();
        assert_eq!(categories, vec![InvoiceCategory::Train, InvoiceCategory::Flight, InvoiceCategory::Hotel]);
        assert_eq!(receipt.invoices[2].amount, Decimal::new(9_000, 0));
        assert_eq!(gateway.invoices().await.len(), 3);

        let stored = gateway.fetch_booking(&id("bk-fixture")).await.expect("fetch");
        let session = stored.session.expect("session");
        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.state, SessionState::Success);
        assert!(session.completed_at.is_some());
    }

    #[tokio::test]
    async fn approved_listing_filters_and_pages() {
        let gateway = InMemoryBookingGateway::seeded();
        for n in 2..=4 {
            let mut extra = with_status(booking_fixture(vec![], vec![], vec![]), SessionStatus::ManagerApproved);
            extra.id = id(&format!("bk-approved-00{n}"));
            gateway.insert(extra).await;
        }

        let first = gateway
            .list_manager_approved(&ApprovedBookingsQuery { user_id: None, page: 1, size: 3 })
            .await
            .expect("page 1");
        assert_eq!(first.total, 4);
        assert_eq!(first.travel_requests.len(), 3);
        assert_eq!(first.page_count(), 2);
        assert_eq!(first.travel_requests[0].id, id("bk-approved-001"));

        let second = gateway
            .list_manager_approved(&ApprovedBookingsQuery { user_id: None, page: 2, size: 3 })
            .await
            .expect("page 2");
        assert_eq!(second.travel_requests.len(), 1);

        let filtered = gateway
            .list_manager_approved(&ApprovedBookingsQuery {
                user_id: Some(UserId("usr-nobody".to_owned())),
                page: 1,
                size: 10,
            })
            .await
            .expect("filtered");
        assert_eq!(filtered.total, 0);
    }

    #[tokio::test]
    async fn unknown_booking_is_a_not_found_http_error() {
        let gateway = InMemoryBookingGateway::default();
        let error = gateway.fetch_booking(&id("missing")).await.expect_err("missing");
        assert!(matches!(error, GatewayError::Http { status: 404, .. }));
    }
}
