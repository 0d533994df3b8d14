//! Execution observers
//!
//! Observers are told about every invocation, frame pop, audited merge and
//! suspension. They only ever see shared references, so they cannot steer
//! control flow or alter a merge.

use crate::interpreter::{Frame, Next, State};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use std::sync::Arc;

/// Target used by [`TracingObserver`]
pub const TRACE_TARGET: &str = "cadence::trace";

/// Execution observer extension point.
pub trait Observer: Send + Sync {
    /// After an action ran. `scope` is `None` for anonymous continuations.
    fn invoked(&self, _scope: Option<&str>, _next: &Next, _state: &State) {}

    /// After a frame was popped and its scope restored
    fn shifted(&self, _frame: &Frame, _state: &State) {}

    /// Before an event or hook patch is merged. `source` is the hook name,
    /// or `None` for external events.
    fn mutating(&self, _patch: &Map<String, JsonValue>, _source: Option<&str>) {}

    /// When the flow parks on an anonymous continuation
    fn suspended(&self, _state: &State) {}
}

/// Registry fanning notifications out to every observer, in registration order.
#[derive(Clone, Default)]
pub struct Observers {
    observers: Vec<Arc<dyn Observer>>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, observer: Arc<dyn Observer>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn invoked(&self, scope: Option<&str>, next: &Next, state: &State) {
        for observer in &self.observers {
            observer.invoked(scope, next, state);
        }
    }

    pub fn shifted(&self, frame: &Frame, state: &State) {
        for observer in &self.observers {
            observer.shifted(frame, state);
        }
    }

    pub fn mutating(&self, patch: &Map<String, JsonValue>, source: Option<&str>) {
        for observer in &self.observers {
            observer.mutating(patch, source);
        }
    }

    pub fn suspended(&self, state: &State) {
        for observer in &self.observers {
            observer.suspended(state);
        }
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("count", &self.observers.len())
            .finish()
    }
}

/* ===================== Tracing Observer ===================== */

/// Renders the execution as an indented trace through `tracing`.
///
/// ```text
/// [ 1]    authenticate() { // [{"ask":"Am I speaking with John Doe?"}, <anonymous>()]
/// [ 4]       < {"ask":"Am I speaking with John Doe?"}
/// [ 3]       ... (
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl TracingObserver {
    fn indent(state: &State) -> String {
        format!("[{:>2}] {}", state.depth, " ".repeat(state.level * 3))
    }
}

impl Observer for TracingObserver {
    fn invoked(&self, scope: Option<&str>, next: &Next, state: &State) {
        let indent = Self::indent(state);
        let header = match scope {
            Some(name) => match state.scope(name).map_or(0, |s| s.recur) {
                0 => format!("{}{}() {{", indent, name),
                recur => format!("{}{}:{}() {{", indent, name, recur),
            },
            None => ") {".to_string(),
        };

        if let Next::Fork(_) = next {
            tracing::info!(target: TRACE_TARGET, "{} // {}", header, next);
            return;
        }

        tracing::info!(target: TRACE_TARGET, "{}", header);
        tracing::info!(target: TRACE_TARGET, "{}   \u{23ce} {}", indent, next);
        match scope {
            Some(name) => tracing::info!(target: TRACE_TARGET, "{}}} // {}", indent, name),
            None => tracing::info!(target: TRACE_TARGET, "{}}}", indent),
        }
    }

    fn shifted(&self, frame: &Frame, state: &State) {
        let indent = Self::indent(state);
        match frame {
            Frame::Value { next, .. } => {
                tracing::info!(target: TRACE_TARGET, "{}< {}", indent, next)
            }
            Frame::Return { scope, .. } => {
                tracing::info!(target: TRACE_TARGET, "{}}} // {}", indent, scope)
            }
        }
    }

    fn mutating(&self, patch: &Map<String, JsonValue>, source: Option<&str>) {
        tracing::info!(
            target: TRACE_TARGET,
            "{} {}",
            source.unwrap_or("event"),
            JsonValue::Object(patch.clone())
        );
    }

    fn suspended(&self, state: &State) {
        tracing::info!(target: TRACE_TARGET, "{}... (", Self::indent(state));
    }
}
