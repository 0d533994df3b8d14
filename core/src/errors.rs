//! Error types for flow construction and stepping

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T, E = FlowError> = std::result::Result<T, E>;

/// Construction-time failures. A flow cannot be created when any of these occur.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("an action table is required")]
    MissingActions,

    #[error("action #{index} in the action table has no name")]
    UnnamedAction { index: usize },

    #[error("action `{0}` is registered more than once")]
    DuplicateAction(String),

    #[error("hook `{0}` is registered more than once")]
    DuplicateHook(String),

    #[error("hook `{0}` is declared in configuration but no callable was registered")]
    HookNotRegistered(String),

    #[error("failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Failures surfaced by a running flow.
///
/// `step` leaves the session untouched when it returns one of these.
#[derive(Error, Debug)]
pub enum FlowError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error("invalid operation: expected an action or an event object, got {kind}")]
    InvalidOperation { kind: &'static str },

    #[error("invalid start: a flow is already running with {pending} pending frame(s)")]
    InvalidStart { pending: usize },

    #[error("unknown hook `{0}`")]
    UnknownHook(String),
}
