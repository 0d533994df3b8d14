//! Type definitions for the interpreter
//!
//! - Actions and their return values (Action, Next)
//! - Frame stack entries and session status (Frame, Status)
//! - Session state (State, Scope)

pub mod action;
pub mod control;
pub mod state;

pub use action::{Action, ActionFn, Actions, Next};
pub use control::{Frame, Status};
pub use state::{merge_fields, Scope, State};
