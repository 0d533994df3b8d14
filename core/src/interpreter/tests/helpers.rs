//! Test helpers for interpreter tests
//!
//! Tracing setup, a recording observer, and the phone-dialog flow used by
//! the scenario tests.

use crate::interpreter::{Action, Flow, FlowBuilder, Frame, Next, State};
use crate::observe::{Observer, TracingObserver};
use serde_json::{json, Map, Value as JsonValue};
use std::sync::{Arc, Mutex, Once};

static TRACING: Once = Once::new();

/// Install a test subscriber once; honours `RUST_LOG`
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/* ===================== Recording Observer ===================== */

/// Observer that remembers everything it was told
#[derive(Default)]
pub struct Recorder {
    /// Scope names of named invocations, in order
    pub invoked: Mutex<Vec<String>>,
    /// (frame scope, active scope after pop) for every return frame
    pub returns: Mutex<Vec<(String, String)>>,
    /// (source, patch) for every audited merge
    pub mutations: Mutex<Vec<(Option<String>, JsonValue)>>,
    pub suspensions: Mutex<usize>,
}

impl Recorder {
    pub fn invoked_names(&self) -> Vec<String> {
        self.invoked.lock().unwrap().clone()
    }

    pub fn return_pairs(&self) -> Vec<(String, String)> {
        self.returns.lock().unwrap().clone()
    }

    pub fn audit_log(&self) -> Vec<(Option<String>, JsonValue)> {
        self.mutations.lock().unwrap().clone()
    }

    pub fn suspend_count(&self) -> usize {
        *self.suspensions.lock().unwrap()
    }
}

impl Observer for Recorder {
    fn invoked(&self, scope: Option<&str>, _next: &Next, _state: &State) {
        if let Some(name) = scope {
            self.invoked.lock().unwrap().push(name.to_string());
        }
    }

    fn shifted(&self, frame: &Frame, state: &State) {
        if frame.is_return() {
            self.returns
                .lock()
                .unwrap()
                .push((frame.scope().to_string(), state.active.clone()));
        }
    }

    fn mutating(&self, patch: &Map<String, JsonValue>, source: Option<&str>) {
        self.mutations
            .lock()
            .unwrap()
            .push((source.map(str::to_string), JsonValue::Object(patch.clone())));
    }

    fn suspended(&self, _state: &State) {
        *self.suspensions.lock().unwrap() += 1;
    }
}

/// Named action that does nothing
pub fn noop(name: &str) -> Action {
    Action::named(name, |_| Next::Fallthrough)
}

/// Named action that forks into the named actions, in order
pub fn fork_of(name: &str, children: &[&'static str]) -> Action {
    let children: Vec<&'static str> = children.to_vec();
    Action::named(name, move |ctx| {
        Next::fork(children.iter().map(|child| Next::from(ctx.action(child))))
    })
}

/* ===================== Phone Dialog ===================== */

/// Ask `question`, then wait for an answer. `route` decides what follows;
/// unrecognised answers re-ask up to two more times.
fn dialog_step(
    name: &'static str,
    question: fn(&str) -> String,
    route: fn(&str) -> Option<Option<&'static str>>,
) -> Action {
    Action::named(name, move |ctx| {
        let who = ctx.str("name").unwrap_or_default().to_string();
        let wait = Action::anonymous(move |ctx| {
            let routed = ctx.str("answer").and_then(route);
            match routed {
                Some(Some(next)) => ctx.action(next).into(),
                Some(None) => Next::Fallthrough,
                None if ctx.recur() < 2 => ctx.action(name).into(),
                None => Next::Fallthrough,
            }
        });
        Next::fork(vec![Next::patch(json!({ "ask": question(&who) })), wait.into()])
    })
}

pub fn authenticate() -> Action {
    dialog_step(
        "authenticate",
        |who| format!("Am I speaking with {}?", who),
        |answer| match answer {
            "yes" => Some(None),
            "no" => Some(Some("verifyPhone")),
            _ => None,
        },
    )
}

pub fn verify_phone() -> Action {
    dialog_step(
        "verifyPhone",
        |who| format!("Is this the correct number for {}?", who),
        |answer| match answer {
            "yes" => Some(Some("canComeToThePhone")),
            "no" => Some(None),
            _ => None,
        },
    )
}

pub fn can_come_to_the_phone() -> Action {
    dialog_step(
        "canComeToThePhone",
        |who| format!("Ok, can {} come to the phone?", who),
        |answer| match answer {
            "yes" => Some(Some("gotToThePhone")),
            "no" => Some(None),
            _ => None,
        },
    )
}

/// Waits (up to ten empty events) for anyone to speak, then re-authenticates
pub fn got_to_the_phone() -> Action {
    Action::named("gotToThePhone", |ctx| {
        let who = ctx.str("name").unwrap_or_default().to_string();
        let wait = Action::anonymous(|ctx| {
            if ctx.get("answer").is_some() {
                ctx.action("authenticate").into()
            } else if ctx.recur() < 10 {
                ctx.action("gotToThePhone").into()
            } else {
                Next::Fallthrough
            }
        });
        Next::fork(vec![
            Next::patch(json!({ "say": format!("Please say something when {} gets to the phone.", who) })),
            wait.into(),
        ])
    })
}

fn answer(state: &State, scope: &str) -> Option<String> {
    state
        .scope(scope)
        .and_then(|s| s.str("answer"))
        .map(str::to_string)
}

/// Closing step: greet, leave a message, or apologise
pub fn the_end() -> Action {
    Action::named("theEnd", |ctx| {
        let who = ctx.str("name").unwrap_or_default().to_string();
        let greet = json!({
            "say": format!("Hello {}. How are you today?", who),
            "authenticated": true,
        });

        let state = ctx.state();
        if answer(state, "authenticate").as_deref() == Some("yes") {
            return Next::patch(greet);
        }
        if answer(state, "verifyPhone").as_deref() == Some("yes") {
            return match answer(state, "canComeToThePhone").as_deref() {
                Some(reply) if reply != "no" => Next::patch(greet),
                _ => Next::patch(json!({
                    "say": format!("Hi. Please tell {} we will be calling back soon.", who)
                })),
            };
        }
        Next::patch(json!({ "say": "I'm sorry for the inconvenience." }))
    })
}

/// Anonymous root: authenticate, then close
pub fn dialog_root() -> Action {
    Action::anonymous(|ctx| {
        Next::fork(vec![Next::from(ctx.action("authenticate")), the_end().into()])
    })
}

pub fn dialog_builder() -> FlowBuilder {
    Flow::builder()
        .param("name", "John Doe")
        .actions([
            authenticate(),
            verify_phone(),
            can_come_to_the_phone(),
            got_to_the_phone(),
        ])
        .observer(Arc::new(TracingObserver))
}

/// Start the dialog and feed it `events`, returning the final snapshot
pub fn play(events: &[JsonValue]) -> State {
    init_tracing();
    let mut flow = dialog_builder().build().expect("dialog flow should build");
    let mut state = flow.step(dialog_root()).expect("dialog should start");
    for event in events {
        state = flow.step(event.clone()).expect("event should be accepted");
    }
    state
}
