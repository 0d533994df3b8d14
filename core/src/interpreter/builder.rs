//! Flow construction

use super::hooks::{Hook, Hooks};
use super::types::{Action, Actions};
use super::vm::Flow;
use crate::config::FlowConfig;
use crate::errors::ConfigError;
use crate::observe::{Observer, Observers};
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;

/// Builder for a [`Flow`] session.
///
/// ```
/// use cadence_core::{Action, Flow, Next};
/// use serde_json::json;
///
/// let greet = Action::named("greet", |ctx| {
///     let name = ctx.str("name").unwrap_or("stranger").to_string();
///     Next::patch(json!({ "say": format!("Hello {}", name) }))
/// });
///
/// let mut flow = Flow::builder()
///     .param("name", "Ada")
///     .action(greet.clone())
///     .build()
///     .unwrap();
///
/// let state = flow.step(greet).unwrap();
/// assert!(state.is_done());
/// assert_eq!(state.scope("greet").unwrap().str("say"), Some("Hello Ada"));
/// ```
#[derive(Default)]
pub struct FlowBuilder {
    config: FlowConfig,
    actions: Option<Vec<Action>>,
    hooks: Vec<Hook>,
    observers: Observers,
}

impl FlowBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the configuration. Call before `root`/`param`, which edit it.
    pub fn config(mut self, config: FlowConfig) -> Self {
        self.config = config;
        self
    }

    /// Scope name given to an anonymous root action
    pub fn root(mut self, name: impl Into<String>) -> Self {
        self.config.root = name.into();
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.config.params.insert(key.into(), value.into());
        self
    }

    /// Add several params; later keys win
    pub fn params(mut self, params: Map<String, JsonValue>) -> Self {
        self.config.params.extend(params);
        self
    }

    /// Register one action. Supplying at least one (or an empty table via
    /// [`actions`](Self::actions)) is required.
    pub fn action(mut self, action: Action) -> Self {
        self.actions.get_or_insert_with(Vec::new).push(action);
        self
    }

    pub fn actions<I>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = Action>,
    {
        self.actions.get_or_insert_with(Vec::new).extend(actions);
        self
    }

    pub fn hook(mut self, hook: Hook) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observers.register(observer);
        self
    }

    /// Validate the tables and create the session
    pub fn build(self) -> Result<Flow, ConfigError> {
        let list = self.actions.ok_or(ConfigError::MissingActions)?;

        let mut actions = Actions::default();
        for (index, action) in list.into_iter().enumerate() {
            let name = action
                .name()
                .ok_or(ConfigError::UnnamedAction { index })?
                .to_string();
            if !actions.insert(name.clone(), action) {
                return Err(ConfigError::DuplicateAction(name));
            }
        }

        let mut hooks = Hooks::default();
        for hook in self.hooks {
            let name = hook.name().to_string();
            if !hooks.insert(hook) {
                return Err(ConfigError::DuplicateHook(name));
            }
        }

        if let Some(missing) = self.config.hooks.iter().find(|name| !hooks.contains(name)) {
            return Err(ConfigError::HookNotRegistered(missing.clone()));
        }

        tracing::debug!(
            root = %self.config.root,
            actions = actions.len(),
            hooks = hooks.len(),
            observers = self.observers.len(),
            "flow constructed"
        );

        Ok(Flow::new(
            self.config.root,
            self.config.params,
            actions,
            hooks,
            self.observers,
        ))
    }
}
