//! Session state: global fields plus one record per named scope

use super::action::Action;
use super::control::Status;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};
use std::collections::BTreeMap;

/* ===================== Merging ===================== */

/// Deep-merge `patch` into `target`.
///
/// Objects merge key by key; every other value replaces what was there.
pub fn merge_fields(target: &mut Map<String, JsonValue>, patch: Map<String, JsonValue>) {
    for (key, incoming) in patch {
        match target.get_mut(&key) {
            Some(JsonValue::Object(existing)) if incoming.is_object() => {
                if let JsonValue::Object(incoming) = incoming {
                    merge_fields(existing, incoming);
                }
            }
            _ => {
                target.insert(key, incoming);
            }
        }
    }
}

/* ===================== Scope ===================== */

/// Accumulated state of one named action.
///
/// Created the first time the name is invoked and kept for the life of the
/// session; re-entering the action never clears `fields`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    pub name: String,
    /// Consecutive self-invocations while this scope was already active
    pub recur: u32,
    pub parent: Option<String>,
    pub level: usize,
    pub depth: usize,
    pub fields: Map<String, JsonValue>,
}

impl Scope {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.fields.get(key)
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(JsonValue::as_str)
    }

    /// Fields plus `$`-prefixed bookkeeping
    pub fn to_value(&self) -> JsonValue {
        let mut out = self.fields.clone();
        out.insert("$name".to_string(), json!(self.name));
        out.insert("$recur".to_string(), json!(self.recur));
        out.insert("$parent".to_string(), json!(self.parent));
        out.insert("$level".to_string(), json!(self.level));
        out.insert("$depth".to_string(), json!(self.depth));
        JsonValue::Object(out)
    }
}

/* ===================== State ===================== */

/// Global state of a flow session.
///
/// A clone of this is returned from every `step`.
#[derive(Debug, Clone, Default)]
pub struct State {
    /// Initial parameters; never modified after construction
    pub params: Map<String, JsonValue>,
    /// Global fields written by hooks
    pub globals: Map<String, JsonValue>,
    pub scopes: BTreeMap<String, Scope>,
    /// Name of the active scope
    pub active: String,
    /// Nesting level of named actions
    pub level: usize,
    /// Frame stack depth
    pub depth: usize,
    pub status: Status,
}

impl State {
    pub fn new(root: impl Into<String>, params: Map<String, JsonValue>) -> Self {
        Self {
            params,
            active: root.into(),
            ..Default::default()
        }
    }

    pub fn scope(&self, name: &str) -> Option<&Scope> {
        self.scopes.get(name)
    }

    pub fn active_scope(&self) -> Option<&Scope> {
        self.scopes.get(&self.active)
    }

    /// Look up a field: active scope first, then globals, then params
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.active_scope()
            .and_then(|scope| scope.get(key))
            .or_else(|| self.globals.get(key))
            .or_else(|| self.params.get(key))
    }

    pub fn is_done(&self) -> bool {
        matches!(self.status, Status::Done)
    }

    pub fn is_suspended(&self) -> bool {
        matches!(self.status, Status::Suspended(_))
    }

    /// The continuation waiting for the next event, if any
    pub fn pending(&self) -> Option<&Action> {
        match &self.status {
            Status::Suspended(action) => Some(action),
            _ => None,
        }
    }

    /// The named record, created on first use. A new record adopts an
    /// object already stored under its name in the global fields.
    pub(crate) fn scope_mut(&mut self, name: &str) -> &mut Scope {
        let globals = &mut self.globals;
        self.scopes.entry(name.to_string()).or_insert_with(|| {
            let mut scope = Scope::new(name);
            let adopted = match globals.get(name) {
                Some(JsonValue::Object(_)) => globals.remove(name),
                _ => None,
            };
            if let Some(JsonValue::Object(fields)) = adopted {
                tracing::trace!(scope = name, keys = fields.len(), "adopt global fields");
                scope.fields = fields;
            }
            scope
        })
    }

    pub(crate) fn merge_active(&mut self, patch: Map<String, JsonValue>) {
        let active = self.active.clone();
        self.merge_into(&active, patch);
    }

    pub(crate) fn merge_into(&mut self, scope: &str, patch: Map<String, JsonValue>) {
        tracing::trace!(scope, keys = patch.len(), "merge");
        merge_fields(&mut self.scope_mut(scope).fields, patch);
    }

    /// Flat JSON view: params, globals, every scope under its name, then the
    /// active scope's fields on top.
    pub fn to_value(&self) -> JsonValue {
        let mut out = self.params.clone();
        merge_fields(&mut out, self.globals.clone());
        for (name, scope) in &self.scopes {
            let merged = match (out.remove(name), scope.to_value()) {
                (Some(JsonValue::Object(mut shadowed)), JsonValue::Object(record)) => {
                    merge_fields(&mut shadowed, record);
                    JsonValue::Object(shadowed)
                }
                (Some(shadowed), record) => {
                    tracing::warn!(scope = %name, value = %shadowed, "scope record replaces a global value");
                    record
                }
                (None, record) => record,
            };
            out.insert(name.clone(), merged);
        }
        if let Some(scope) = self.active_scope() {
            for (key, value) in &scope.fields {
                out.insert(key.clone(), value.clone());
            }
        }
        out.insert("$name".to_string(), json!(self.active));
        out.insert("$level".to_string(), json!(self.level));
        out.insert("$depth".to_string(), json!(self.depth));
        out.insert("$done".to_string(), json!(self.is_done()));
        JsonValue::Object(out)
    }
}
