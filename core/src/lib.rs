//! Cadence: an embeddable execution engine for multi-turn, stateful
//! interaction flows such as scripted dialogs and IVR decision trees.
//!
//! See [`interpreter`] for the execution model.

pub mod config;
pub mod errors;
pub mod interpreter;
pub mod observe;

// Re-export main types
pub use crate::config::FlowConfig;
pub use errors::{ConfigError, FlowError, Result};
pub use interpreter::{
    Action, Context, Flow, FlowBuilder, Frame, Hook, Input, Next, Scope, State, Status,
};
pub use observe::{Observer, Observers, TracingObserver};
