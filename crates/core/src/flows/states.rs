use serde::{Deserialize, Serialize};

use crate::domain::option::Leg;
use crate::domain::session::SessionStatus;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowType {
    TravelBooking,
}

/// Session workflow stage; the flow engine moves between these.
pub type FlowState = SessionStatus;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowEvent {
    SelectionOpened,
    SelectionsSubmitted,
    ManagerApproved,
    ManagerRejected,
    TicketsIssued,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FlowContext {
    pub missing_legs: Vec<Leg>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowAction {
    PromptForSelections,
    PersistSelections,
    RouteToManager,
    RecordManagerFeedback,
    ReleaseForTicketing,
    OfferRevisionOrCancel,
    CreateInvoices,
    ClearStagedTickets,
    CompleteSession,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: FlowState,
    pub to: FlowState,
    pub event: FlowEvent,
    pub actions: Vec<FlowAction>,
}
