//! Step handlers
//!
//! Each kind of work has its own handler: invoking an action, resuming a
//! suspended continuation, popping a frame, and resolving a popped value.
//! Handlers never recurse; they return the next [`Step`] to the loop.

use super::context::Context;
use super::types::{Action, Frame, Next, Status};
use super::vm::{Flow, Step};

/* ===================== Invoke ===================== */

/// Invoke an action in its scope.
///
/// Named actions (and an anonymous root) enter a scope and run immediately.
/// An anonymous action with frames pending is a continuation: it is parked
/// and the flow suspends until the next event.
pub(crate) fn execute_invoke(flow: &mut Flow, action: Action) -> Step {
    let scope = match action.name() {
        Some(name) => name.to_string(),
        None if flow.frames.is_empty() => flow.root.clone(),
        None => {
            tracing::debug!(depth = flow.frames.len(), scope = %flow.state.active, "suspend");
            flow.state.status = Status::Suspended(action);
            flow.observers.suspended(&flow.state);
            return Step::Suspend;
        }
    };

    enter_scope(flow, &scope);
    run_action(flow, Some(&scope), &action)
}

/// Run the continuation that was parked by [`execute_invoke`]
pub(crate) fn execute_resume(flow: &mut Flow, action: Action) -> Step {
    tracing::debug!(depth = flow.frames.len(), scope = %flow.state.active, "resume");
    flow.state.status = Status::Running;
    run_action(flow, None, &action)
}

/// Push the scope's return frame and update its bookkeeping
fn enter_scope(flow: &mut Flow, name: &str) {
    let parent = if flow.frames.is_empty() {
        None
    } else {
        Some(flow.state.active.clone())
    };
    let recur = match flow.state.scope(name) {
        Some(existing) if flow.state.active == name => existing.recur + 1,
        _ => 0,
    };
    let level = flow.state.level;
    let depth = flow.frames.len();

    flow.push_frame(Frame::Return {
        scope: name.to_string(),
        parent: parent.clone(),
        level,
        depth,
    });
    flow.state.level += 1;
    flow.state.active = name.to_string();

    let record = flow.state.scope_mut(name);
    record.recur = recur;
    record.parent = parent;
    record.level = level;
    record.depth = depth;

    tracing::debug!(scope = name, recur, level, depth, "invoke");
}

/// Execute the callable against the live state and queue what it returned
fn run_action(flow: &mut Flow, scope: Option<&str>, action: &Action) -> Step {
    let next = {
        let mut ctx = Context::new(
            &mut flow.state,
            &flow.actions,
            &flow.hooks,
            &flow.observers,
        );
        action.run(&mut ctx)
    };

    flow.observers.invoked(scope, &next, &flow.state);

    match next {
        Next::Fork(steps) => flow.push_fork(steps),
        next => flow.push_value(next),
    }

    Step::Shift
}

/* ===================== Shift ===================== */

/// Pop exactly one frame and restore its scope.
///
/// A return frame re-enters the completing scope one last time, so anything
/// resolved before the next value frame is attributed to it.
pub(crate) fn execute_shift(flow: &mut Flow) -> Step {
    let Some(frame) = flow.pop_frame() else {
        flow.state.status = Status::Done;
        return Step::Done;
    };

    match &frame {
        Frame::Return {
            scope,
            parent,
            level,
            depth,
        } => {
            flow.state.level = flow.state.level.saturating_sub(1);
            flow.state.active = scope.clone();

            let record = flow.state.scope_mut(scope);
            record.parent = parent.clone();
            record.level = *level;
            record.depth = *depth;

            tracing::trace!(scope = %scope, level = flow.state.level, "return");
        }
        Frame::Value { scope, .. } => {
            flow.state.active = scope.clone();
            tracing::trace!(scope = %scope, "shift");
        }
    }

    flow.observers.shifted(&frame, &flow.state);

    match frame {
        Frame::Value { next, .. } => Step::Resolve(next),
        Frame::Return { .. } => Step::Resolve(Next::Fallthrough),
    }
}

/* ===================== Resolve ===================== */

/// Dispatch on a popped value.
///
/// Patches resolved here are internal fall-through merges and are not
/// announced to `mutating` observers.
pub(crate) fn execute_resolve(flow: &mut Flow, next: Next) -> Step {
    match next {
        Next::Continue(action) => Step::Invoke(action),
        Next::Patch(patch) => {
            flow.state.merge_active(patch);
            Step::Shift
        }
        Next::PatchScope(scope, patch) => {
            flow.state.merge_into(&scope, patch);
            Step::Shift
        }
        Next::Fork(steps) => {
            flow.push_fork(steps);
            Step::Shift
        }
        Next::Fallthrough => Step::Shift,
    }
}
