pub mod engine;
pub mod phase;
pub mod states;

pub use engine::{BookingFlow, FlowDefinition, FlowEngine, FlowTransitionError};
pub use phase::{BookingPhase, ProgressStep, StepStatus};
pub use states::{FlowAction, FlowContext, FlowEvent, FlowState, FlowType, TransitionOutcome};
