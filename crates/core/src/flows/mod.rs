pub mod engine;
pub mod states;

pub use engine::{FlowEngine, CANCEL_COMMAND, START_COMMAND};
pub use states::{
    EventKind, FlowAction, FlowContext, FlowEvent, FlowState, Menu, MenuChange, OrderSummary,
    Reply, TransitionOutcome, Turn,
};
