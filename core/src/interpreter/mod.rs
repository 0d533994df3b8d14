//! # Interpreter - Continuation-Stack Flow Engine
//!
//! Runs flows written as plain actions. Each action returns a [`Next`]: a
//! state patch, a tail-continuation, a fork of further steps, or nothing.
//! State is threaded across calls driven by external events arriving one at
//! a time through [`Flow::step`].
//!
//! ## Core Principles
//!
//! 1. **Stack-driven execution**: pending work lives in `frames: Vec<Frame>`, no recursion
//! 2. **Scoped state**: every named action owns a scope record that persists for the session
//! 3. **Single suspension point**: an anonymous continuation invoked with frames
//!    pending parks the flow until the next event
//! 4. **Pure engine**: no I/O; tracing and presentation belong to [`Observer`](crate::observe::Observer)s
//!
//! ## Session lifecycle
//!
//! `Idle` -> `Running` -> (`Suspended` -> `Running`)* -> `Done`.
//! Only `Suspended` and `Done` are visible between calls to `step`.

pub mod builder;
pub mod context;
pub mod exec_loop;
pub(crate) mod handlers;
pub mod hooks;
pub mod types;
pub mod vm;

#[cfg(test)]
mod tests;

// Re-export commonly used items
pub use builder::FlowBuilder;
pub use context::Context;
pub use exec_loop::Input;
pub use hooks::{mutate, Hook, Hooks};
pub use types::{merge_fields, Action, Actions, Frame, Next, Scope, State, Status};
pub use vm::Flow;
