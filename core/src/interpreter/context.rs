//! The view action code runs against
//!
//! A `Context` borrows the live session state, so reads always reflect the
//! latest merges, including patches made by hooks earlier in the same action.

use super::hooks::{apply_hook_result, Hooks};
use super::types::{Action, Actions, Scope, State};
use crate::errors::{FlowError, Result};
use crate::observe::Observers;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

pub struct Context<'a> {
    state: &'a mut State,
    actions: &'a Actions,
    hooks: &'a Hooks,
    observers: &'a Observers,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        state: &'a mut State,
        actions: &'a Actions,
        hooks: &'a Hooks,
        observers: &'a Observers,
    ) -> Self {
        Self {
            state,
            actions,
            hooks,
            observers,
        }
    }

    pub fn state(&self) -> &State {
        &*self.state
    }

    /// Active scope fields, then global fields, then initial params
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.state.get(key)
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(JsonValue::as_str)
    }

    /// Deserialize a field, `None` if absent or of the wrong shape
    pub fn field<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub fn param(&self, key: &str) -> Option<&JsonValue> {
        self.state.params.get(key)
    }

    /// Another scope's accumulated record
    pub fn scope(&self, name: &str) -> Option<&Scope> {
        self.state.scope(name)
    }

    /// Name of the active scope
    pub fn scope_name(&self) -> &str {
        &self.state.active
    }

    /// Recursion counter of the active scope
    pub fn recur(&self) -> u32 {
        self.state.active_scope().map_or(0, |scope| scope.recur)
    }

    /// Look up a named action from the session's action table
    pub fn action(&self, name: &str) -> Option<Action> {
        self.actions.get(name).cloned()
    }

    /// Call a hook with the current state and `args`.
    ///
    /// A patch result is merged into global state (audited under the hook's
    /// name) before this returns; a continuation result is handed back for
    /// the calling action to return.
    pub fn hook(&mut self, name: &str, args: &[JsonValue]) -> Result<Option<Action>> {
        let hooks = self.hooks;
        let hook = hooks
            .get(name)
            .ok_or_else(|| FlowError::UnknownHook(name.to_string()))?;

        let next = hook.call(self, args);
        tracing::debug!(hook = name, result = %next, "hook called");
        Ok(apply_hook_result(self.state, self.observers, hook.name(), next))
    }
}
