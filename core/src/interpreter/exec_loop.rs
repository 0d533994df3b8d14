//! Dispatcher and core execution loop
//!
//! ## Function Organization
//! 1. Flow::step() - the only public entry point (accepts an action or an event)
//! 2. run_until_settled() - drives handlers until the flow suspends or empties
//!
//! The loop is crate-internal, so every input goes through `step`'s checks:
//!
//! ```compile_fail
//! use cadence_core::interpreter::exec_loop::run_until_settled;
//! ```

use super::handlers::{execute_invoke, execute_resolve, execute_resume, execute_shift};
use super::types::{Action, State, Status};
use super::vm::{Flow, Step};
use crate::errors::{FlowError, Result};
use serde_json::{Map, Value as JsonValue};

/* ===================== Input ===================== */

/// What can be fed to [`Flow::step`]
#[derive(Debug, Clone)]
pub enum Input {
    /// Start a new flow, or re-feed the suspended continuation
    Start(Action),
    /// External event; must be a JSON object
    Event(JsonValue),
}

impl From<Action> for Input {
    fn from(action: Action) -> Self {
        Input::Start(action)
    }
}

impl From<JsonValue> for Input {
    fn from(value: JsonValue) -> Self {
        Input::Event(value)
    }
}

impl From<Map<String, JsonValue>> for Input {
    fn from(fields: Map<String, JsonValue>) -> Self {
        Input::Event(JsonValue::Object(fields))
    }
}

/* ===================== Public API ===================== */

impl Flow {
    /// Feed one input and run until the flow suspends or its stack empties.
    ///
    /// - An action starts a new flow. It is rejected with
    ///   [`FlowError::InvalidStart`] while frames are pending, unless it is
    ///   exactly the suspended continuation, which then runs.
    /// - An event object is merged into the active scope, then the suspended
    ///   continuation (if any) resumes; otherwise the next frame is popped.
    /// - Any other JSON value fails with [`FlowError::InvalidOperation`].
    ///
    /// On error the session is left unchanged. On success a snapshot of the
    /// settled state is returned.
    pub fn step(&mut self, input: impl Into<Input>) -> Result<State> {
        let first = match input.into() {
            Input::Start(action) => self.accept_start(action)?,
            Input::Event(event) => self.accept_event(event)?,
        };
        run_until_settled(self, first);
        Ok(self.state.clone())
    }

    fn accept_start(&mut self, action: Action) -> Result<Step> {
        if let Some(pending) = self.state.pending() {
            if pending.ptr_eq(&action) {
                return Ok(Step::Resume(action));
            }
        }
        if !self.frames.is_empty() {
            return Err(FlowError::InvalidStart {
                pending: self.frames.len(),
            });
        }
        self.state.status = Status::Running;
        Ok(Step::Invoke(action))
    }

    fn accept_event(&mut self, event: JsonValue) -> Result<Step> {
        let patch = match event {
            JsonValue::Object(patch) => patch,
            other => {
                return Err(FlowError::InvalidOperation {
                    kind: kind_of(&other),
                })
            }
        };

        self.observers.mutating(&patch, None);
        self.state.merge_active(patch);

        match std::mem::replace(&mut self.state.status, Status::Running) {
            Status::Suspended(pending) => Ok(Step::Resume(pending)),
            _ => Ok(Step::Shift),
        }
    }
}

fn kind_of(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

/* ===================== Loop ===================== */

/// Drive the handlers until the flow suspends or the frame stack empties
pub(crate) fn run_until_settled(flow: &mut Flow, first: Step) {
    let mut step = first;
    loop {
        step = match step {
            Step::Invoke(action) => execute_invoke(flow, action),
            Step::Resume(action) => execute_resume(flow, action),
            Step::Shift => execute_shift(flow),
            Step::Resolve(next) => execute_resolve(flow, next),
            Step::Suspend | Step::Done => break,
        };
    }

    tracing::debug!(
        status = flow.state.status.label(),
        scope = %flow.state.active,
        depth = flow.frames.len(),
        level = flow.state.level,
        "settled"
    );
}
