use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::domain::option::Leg;
use crate::domain::session::SessionStatus;
use crate::flows::states::{
    FlowAction, FlowContext, FlowEvent, FlowState, FlowType, TransitionOutcome,
};

pub trait FlowDefinition {
    fn flow_type(&self) -> FlowType;
    fn initial_state(&self) -> FlowState;
    fn transition(
        &self,
        current: &FlowState,
        event: &FlowEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError>;
}

#[derive(Clone, Debug, Default)]
pub struct BookingFlow;

impl FlowDefinition for BookingFlow {
    fn flow_type(&self) -> FlowType {
        FlowType::TravelBooking
    }

    fn initial_state(&self) -> FlowState {
        SessionStatus::NewRequest
    }

    fn transition(
        &self,
        current: &FlowState,
        event: &FlowEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        transition_booking(current, event, context)
    }
}

pub struct FlowEngine<F> {
    flow: F,
}

impl<F> FlowEngine<F>
where
    F: FlowDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn flow_type(&self) -> FlowType {
        self.flow.flow_type()
    }

    pub fn initial_state(&self) -> FlowState {
        self.flow.initial_state()
    }

    pub fn apply(
        &self,
        current: &FlowState,
        event: &FlowEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        self.flow.transition(current, event, context)
    }

    pub fn apply_with_audit<S>(
        &self,
        current: &FlowState,
        event: &FlowEvent,
        context: &FlowContext,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<TransitionOutcome, FlowTransitionError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.apply(current, event, context);
        let (event_type, outcome) = match &result {
            Ok(_) => ("flow.transition_allowed", AuditOutcome::Success),
            Err(_) => ("flow.transition_rejected", AuditOutcome::Rejected),
        };
        let mut record = AuditEvent::from_context(audit, event_type, AuditCategory::Flow, outcome)
            .with_metadata("from", current.as_str())
            .with_metadata("event", format!("{event:?}"));
        match &result {
            Ok(transition) => record = record.with_metadata("to", transition.to.as_str()),
            Err(error) => record = record.with_metadata("error", error.to_string()),
        }
        sink.emit(record);
        result
    }
}

impl Default for FlowEngine<BookingFlow> {
    fn default() -> Self {
        Self::new(BookingFlow)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("selection is incomplete in {state}: missing {missing_legs:?}")]
    MissingRequiredFields { state: FlowState, missing_legs: Vec<Leg> },
    #[error("invalid transition from {state} using event {event:?}")]
    InvalidTransition { state: FlowState, event: FlowEvent },
}

fn transition_booking(
    current: &FlowState,
    event: &FlowEvent,
    context: &FlowContext,
) -> Result<TransitionOutcome, FlowTransitionError> {
    use FlowAction::{
        ClearStagedTickets, CompleteSession, CreateInvoices, OfferRevisionOrCancel,
        PersistSelections, PromptForSelections, RecordManagerFeedback, ReleaseForTicketing,
        RouteToManager,
    };
    use FlowEvent::{
        ManagerApproved as Approve, ManagerRejected as Reject, SelectionOpened,
        SelectionsSubmitted, TicketsIssued,
    };
    use SessionStatus::{
        Completed, InManagerReview, InUserSelection, ManagerApproved, ManagerRejected,
        ManagerUpdateRequest, NewRequest, UserUpdateRequest,
    };

    let (to, actions) = match (current, event) {
        (NewRequest, SelectionOpened)
        | (UserUpdateRequest, SelectionOpened)
        | (ManagerUpdateRequest, SelectionOpened) => (InUserSelection, vec![PromptForSelections]),
        (InUserSelection, SelectionsSubmitted) | (ManagerRejected, SelectionsSubmitted) => {
            if !context.missing_legs.is_empty() {
                return Err(FlowTransitionError::MissingRequiredFields {
                    state: *current,
                    missing_legs: context.missing_legs.clone(),
                });
            }
            (InManagerReview, vec![PersistSelections, RouteToManager])
        }
        (InManagerReview, Approve) => {
            (ManagerApproved, vec![RecordManagerFeedback, ReleaseForTicketing])
        }
        (InManagerReview, Reject) => {
            (ManagerRejected, vec![RecordManagerFeedback, OfferRevisionOrCancel])
        }
        (ManagerApproved, TicketsIssued) => {
            (Completed, vec![CreateInvoices, ClearStagedTickets, CompleteSession])
        }
        _ => {
            return Err(FlowTransitionError::InvalidTransition {
                state: *current,
                event: event.clone(),
            });
        }
    };

    Ok(TransitionOutcome { from: *current, to, event: event.clone(), actions })
}
