//! Actions and the values they return

use super::super::context::Context;
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/* ===================== Action ===================== */

/// Signature of the callable behind an [`Action`]
pub type ActionFn = dyn Fn(&mut Context<'_>) -> Next + Send + Sync;

/// One named or anonymous step of a flow.
///
/// A named action owns a scope: every invocation under that name accumulates
/// state into the same scope record. Anonymous actions run inside whatever
/// scope is active and, when invoked with frames pending, suspend the flow
/// until the next event arrives.
///
/// Cloning an action is cheap and preserves its identity (see [`Action::ptr_eq`]).
#[derive(Clone)]
pub struct Action {
    name: Option<String>,
    func: Arc<ActionFn>,
}

impl Action {
    /// Create a named action. The name is its scope key.
    pub fn named<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> Next + Send + Sync + 'static,
    {
        Self {
            name: Some(name.into()),
            func: Arc::new(func),
        }
    }

    /// Create an anonymous action (a continuation).
    pub fn anonymous<F>(func: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> Next + Send + Sync + 'static,
    {
        Self {
            name: None,
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_anonymous(&self) -> bool {
        self.name.is_none()
    }

    /// True when both handles point at the same callable
    pub fn ptr_eq(&self, other: &Action) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.func), Arc::as_ptr(&other.func))
    }

    pub(crate) fn run(&self, ctx: &mut Context<'_>) -> Next {
        (self.func)(ctx)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "Action({})", name),
            None => f.write_str("Action(<anonymous>)"),
        }
    }
}

/* ===================== Action Table ===================== */

/// Read-only table of named actions, exposed to flow code through [`Context::action`]
#[derive(Clone, Default)]
pub struct Actions {
    table: HashMap<String, Action>,
}

impl Actions {
    pub fn get(&self, name: &str) -> Option<&Action> {
        self.table.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.table.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns false if the name was already taken
    pub(crate) fn insert(&mut self, name: String, action: Action) -> bool {
        if self.table.contains_key(&name) {
            return false;
        }
        self.table.insert(name, action);
        true
    }
}

impl fmt::Debug for Actions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

/* ===================== Next ===================== */

/// What an action asks the interpreter to do after it returns.
#[derive(Debug, Clone, Default)]
pub enum Next {
    /// Tail-invoke another action
    Continue(Action),
    /// Merge into the active scope
    Patch(Map<String, JsonValue>),
    /// Merge into the named scope, creating it if needed
    PatchScope(String, Map<String, JsonValue>),
    /// Run each step in order before control returns to the caller
    Fork(Vec<Next>),
    /// End of this branch
    #[default]
    Fallthrough,
}

impl Next {
    /// Build a patch from a JSON object. Anything else falls through.
    pub fn patch(value: JsonValue) -> Self {
        match value {
            JsonValue::Object(fields) => Next::Patch(fields),
            _ => Next::Fallthrough,
        }
    }

    /// Build a patch aimed at a specific scope
    pub fn patch_scope(scope: impl Into<String>, value: JsonValue) -> Self {
        match value {
            JsonValue::Object(fields) => Next::PatchScope(scope.into(), fields),
            _ => Next::Fallthrough,
        }
    }

    pub fn fork<I, N>(steps: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Next>,
    {
        Next::Fork(steps.into_iter().map(Into::into).collect())
    }

    pub fn is_fallthrough(&self) -> bool {
        matches!(self, Next::Fallthrough)
    }
}

impl From<Action> for Next {
    fn from(action: Action) -> Self {
        Next::Continue(action)
    }
}

impl From<Option<Action>> for Next {
    fn from(action: Option<Action>) -> Self {
        action.map_or(Next::Fallthrough, Next::Continue)
    }
}

impl From<Map<String, JsonValue>> for Next {
    fn from(fields: Map<String, JsonValue>) -> Self {
        Next::Patch(fields)
    }
}

impl From<Vec<Next>> for Next {
    fn from(steps: Vec<Next>) -> Self {
        Next::Fork(steps)
    }
}

/* ===================== Rendering ===================== */

const OBJECT_LIMIT: usize = 200;
const ELEMENT_LIMIT: usize = 20;
const FORK_LIMIT: usize = 100;
const FORK_EDGE: usize = 50;

impl fmt::Display for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(self, OBJECT_LIMIT))
    }
}

fn render(next: &Next, max: usize) -> String {
    match next {
        Next::Fallthrough => String::new(),
        Next::Continue(action) => format!("{}()", action.name().unwrap_or("<anonymous>")),
        Next::Patch(fields) => render_object(fields, max),
        Next::PatchScope(scope, fields) => format!("{}: {}", scope, render_object(fields, max)),
        Next::Fork(steps) => {
            let inner: Vec<String> = steps.iter().map(|s| render(s, ELEMENT_LIMIT)).collect();
            let list = format!("[{}]", inner.join(", "));
            let len = list.chars().count();
            if len > FORK_LIMIT {
                let head: String = list.chars().take(FORK_EDGE).collect();
                let tail: String = list.chars().skip(len - FORK_EDGE).collect();
                format!("{} ... {}", head, tail)
            } else {
                list
            }
        }
    }
}

fn render_object(fields: &Map<String, JsonValue>, max: usize) -> String {
    let json = JsonValue::Object(fields.clone()).to_string();
    if json.chars().count() > max {
        let cut: String = json.chars().take(max).collect();
        format!("{}...}}", cut)
    } else {
        json
    }
}
