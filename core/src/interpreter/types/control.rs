//! Frame stack entries and session status

use super::action::{Action, Next};

/* ===================== Frames ===================== */

/// A pending unit of work on the interpreter's stack.
///
/// The stack is strict LIFO. Fork steps are pushed in reverse so the first
/// element returned by an action is the first one popped.
#[derive(Debug, Clone)]
pub enum Frame {
    /// Marks the return of a named action. Pushed when the action is invoked.
    Return {
        scope: String,
        parent: Option<String>,
        /// Nesting level before the action was entered
        level: usize,
        /// Stack depth before this frame was pushed
        depth: usize,
    },

    /// A next-step waiting to be resolved, owned by the scope that produced it
    Value { scope: String, next: Next },
}

impl Frame {
    /// Scope this frame belongs to
    pub fn scope(&self) -> &str {
        match self {
            Frame::Return { scope, .. } | Frame::Value { scope, .. } => scope,
        }
    }

    pub fn is_return(&self) -> bool {
        matches!(self, Frame::Return { .. })
    }
}

/* ===================== Status ===================== */

/// Where a session stands between (and during) calls to `step`.
///
/// Only `Suspended` and `Done` are observable after a step settles; `Idle`
/// precedes the first root action.
#[derive(Debug, Clone, Default)]
pub enum Status {
    #[default]
    Idle,
    Running,
    /// Waiting for the next event; resuming runs the held continuation
    Suspended(Action),
    Done,
}

impl Status {
    pub fn label(&self) -> &'static str {
        match self {
            Status::Idle => "idle",
            Status::Running => "running",
            Status::Suspended(_) => "suspended",
            Status::Done => "done",
        }
    }
}
