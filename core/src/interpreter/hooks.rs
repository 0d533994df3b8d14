//! Hooks and the audited mutation path
//!
//! A hook is a domain-supplied side-effect bound into the session. Action
//! code calls it through [`Context::hook`](super::context::Context::hook);
//! whatever state it produces is merged through [`mutate`], the same path
//! that external events take, so every change is announced to observers first.

use super::context::Context;
use super::types::{merge_fields, Action, Next, State};
use crate::observe::Observers;
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Signature of a hook: current state view plus caller-supplied arguments
pub type HookFn = dyn Fn(&Context<'_>, &[JsonValue]) -> Next + Send + Sync;

#[derive(Clone)]
pub struct Hook {
    name: String,
    func: Arc<HookFn>,
}

impl Hook {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Context<'_>, &[JsonValue]) -> Next + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn call(&self, ctx: &Context<'_>, args: &[JsonValue]) -> Next {
        (self.func)(ctx, args)
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hook({})", self.name)
    }
}

/// Hook table keyed by name
#[derive(Clone, Default)]
pub struct Hooks {
    table: HashMap<String, Hook>,
}

impl Hooks {
    pub fn get(&self, name: &str) -> Option<&Hook> {
        self.table.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns false if the name was already taken
    pub(crate) fn insert(&mut self, hook: Hook) -> bool {
        if self.table.contains_key(hook.name()) {
            return false;
        }
        self.table.insert(hook.name.clone(), hook);
        true
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.table.keys().collect();
        names.sort_unstable();
        f.debug_set().entries(names).finish()
    }
}

/* ===================== Mutation ===================== */

/// Merge a patch into global state after announcing it to observers.
///
/// A top-level key naming an existing scope record merges into that record's
/// fields when the value is an object; everything else deep-merges into the
/// global fields.
pub fn mutate(
    state: &mut State,
    observers: &Observers,
    patch: Map<String, JsonValue>,
    source: Option<&str>,
) {
    observers.mutating(&patch, source);

    for (key, value) in patch {
        match (state.scopes.get_mut(&key), value) {
            (Some(scope), JsonValue::Object(fields)) => merge_fields(&mut scope.fields, fields),
            (_, value) => {
                let mut single = Map::new();
                single.insert(key, value);
                merge_fields(&mut state.globals, single);
            }
        }
    }
}

/// Apply what a hook returned. A continuation is handed back to the caller.
pub(crate) fn apply_hook_result(
    state: &mut State,
    observers: &Observers,
    source: &str,
    next: Next,
) -> Option<Action> {
    match next {
        Next::Continue(action) => Some(action),
        Next::Patch(patch) => {
            mutate(state, observers, patch, Some(source));
            None
        }
        Next::PatchScope(scope, patch) => {
            observers.mutating(&patch, Some(source));
            state.merge_into(&scope, patch);
            None
        }
        Next::Fork(steps) => {
            tracing::warn!(hook = source, steps = steps.len(), "hook returned a fork; ignoring it");
            None
        }
        Next::Fallthrough => None,
    }
}
