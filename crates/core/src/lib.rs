pub mod audit;
pub mod config;
pub mod deactivation;
pub mod domain;
pub mod errors;
pub mod fixtures;
pub mod flows;
pub mod gateway;
pub mod review;
pub mod selection;
pub mod tickets;
pub mod workflow;

pub use audit::{AuditContext, AuditEvent, AuditSink, InMemoryAuditSink, NoopAuditSink};
pub use deactivation::{DeactivationRequest, DEFAULT_DEACTIVATION_REASON};
pub use domain::booking::{BookingId, BookingStatus, SelectionIndices, TravelRequest, TravelUser, UserId};
pub use domain::catalog::OptionCatalog;
pub use domain::invoice::{BookingPage, Invoice, InvoiceCategory, InvoiceId, TicketSubmissionReceipt};
pub use domain::option::{Leg, TransportMode, TravelOption};
pub use domain::session::{Session, SessionId, SessionState, SessionStatus};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use flows::{BookingPhase, FlowEngine, StepStatus};
pub use gateway::{ApprovedBookingsQuery, BookingGateway, GatewayError};
pub use review::{ManagerReview, ReviewDecision, ReviewOutcome};
pub use selection::{SelectionManager, SelectionPolicy};
pub use tickets::{LegAmounts, TicketDocument, TicketStaging, TicketSubmission};
pub use workflow::{BookingView, BookingWorkflow, RequestContext};
