//! Flow session state
//!
//! The `Flow` holds everything a session needs between events:
//! - frames: the LIFO stack of pending returns and next-steps
//! - state: global fields, scope records and status
//! - the action, hook and observer tables fixed at construction

use super::builder::FlowBuilder;
use super::hooks::Hooks;
use super::types::{Action, Actions, Frame, Next, State};
use crate::observe::Observers;
use serde_json::{Map, Value as JsonValue};
use std::fmt;

/* ===================== Flow ===================== */

/// One flow session.
///
/// Created through [`Flow::builder`]; driven by [`Flow::step`](Flow::step).
/// Discarding the value abandons the session.
pub struct Flow {
    pub(crate) state: State,
    pub(crate) frames: Vec<Frame>,
    pub(crate) actions: Actions,
    pub(crate) hooks: Hooks,
    pub(crate) observers: Observers,
    pub(crate) root: String,
}

impl Flow {
    pub fn builder() -> FlowBuilder {
        FlowBuilder::new()
    }

    pub(crate) fn new(
        root: String,
        params: Map<String, JsonValue>,
        actions: Actions,
        hooks: Hooks,
        observers: Observers,
    ) -> Self {
        Flow {
            state: State::new(root.clone(), params),
            frames: Vec::new(),
            actions,
            hooks,
            observers,
            root,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Pending frames, bottom first
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Scope name given to an anonymous root action
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn actions(&self) -> &Actions {
        &self.actions
    }

    pub fn action(&self, name: &str) -> Option<Action> {
        self.actions.get(name).cloned()
    }

    pub fn is_done(&self) -> bool {
        self.state.is_done()
    }

    pub fn is_suspended(&self) -> bool {
        self.state.is_suspended()
    }

    /* ===================== Frame Management ===================== */

    pub(crate) fn push_frame(&mut self, frame: Frame) {
        self.frames.push(frame);
        self.state.depth = self.frames.len();
    }

    pub(crate) fn pop_frame(&mut self) -> Option<Frame> {
        let frame = self.frames.pop();
        self.state.depth = self.frames.len();
        frame
    }

    /// Push a next-step owned by the active scope
    pub(crate) fn push_value(&mut self, next: Next) {
        let scope = self.state.active.clone();
        self.push_frame(Frame::Value { scope, next });
    }

    /// Push fork steps so the first one is popped first
    pub(crate) fn push_fork(&mut self, steps: Vec<Next>) {
        for next in steps.into_iter().rev() {
            self.push_value(next);
        }
    }
}

impl fmt::Debug for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flow")
            .field("root", &self.root)
            .field("status", &self.state.status.label())
            .field("active", &self.state.active)
            .field("frames", &self.frames.len())
            .field("actions", &self.actions)
            .field("hooks", &self.hooks)
            .field("observers", &self.observers)
            .finish()
    }
}

/* ===================== Step Result ===================== */

/// Result of executing one unit of work; tells the loop what to do next.
#[derive(Debug, Clone)]
pub(crate) enum Step {
    /// Invoke an action, suspending if it is an anonymous continuation
    Invoke(Action),
    /// Run the suspended continuation
    Resume(Action),
    /// Pop the next frame
    Shift,
    /// Resolve a value carried by a popped frame
    Resolve(Next),
    /// Parked on a continuation, waiting for an event
    Suspend,
    /// Frame stack is empty
    Done,
}
