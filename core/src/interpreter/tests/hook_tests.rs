//! Hooks and the audited mutation path

use super::helpers::{init_tracing, Recorder};
use crate::errors::FlowError;
use crate::interpreter::{Action, Flow, FlowBuilder, Hook, Next};
use serde_json::{json, Map, Value as JsonValue};
use std::sync::Arc;

/// Adds `args[0]` to the global `tags` object
fn tag_hook() -> Hook {
    Hook::new("tag", |_ctx, args| {
        let tag = args.first().and_then(JsonValue::as_str).unwrap_or("none");
        let mut tags = Map::new();
        tags.insert(tag.to_string(), json!(true));
        Next::patch(json!({ "tags": tags }))
    })
}

fn builder_with(main: &Action) -> FlowBuilder {
    Flow::builder().action(main.clone()).hook(tag_hook())
}

#[test]
fn test_hook_patch_merges_into_globals() {
    init_tracing();
    let main = Action::named("main", |ctx| {
        ctx.hook("tag", &[json!("a")]).unwrap();
        ctx.hook("tag", &[json!("b")]).unwrap();
        Next::Fallthrough
    });
    let mut flow = builder_with(&main).build().unwrap();

    let state = flow.step(main).unwrap();

    assert_eq!(state.globals["tags"], json!({ "a": true, "b": true }));
    assert!(state.scope("main").unwrap().fields.is_empty());
}

#[test]
fn test_action_sees_hook_patch_immediately() {
    init_tracing();
    let main = Action::named("main", |ctx| {
        ctx.hook("tag", &[json!("a")]).unwrap();
        let seen = ctx.get("tags").cloned();
        Next::patch(json!({ "seen": seen }))
    });
    let mut flow = builder_with(&main).build().unwrap();

    let state = flow.step(main).unwrap();

    assert_eq!(state.scope("main").unwrap().get("seen"), Some(&json!({ "a": true })));
}

#[test]
fn test_hook_continuation_is_returned_to_the_caller() {
    init_tracing();
    let recorder = Arc::new(Recorder::default());
    let main = Action::named("main", |ctx| Next::from(ctx.hook("route", &[]).unwrap()));
    let after = Action::named("after", |_| Next::patch(json!({ "ran": true })));
    let mut flow = Flow::builder()
        .actions([main.clone(), after])
        .hook(Hook::new("route", |ctx, _args| Next::from(ctx.action("after"))))
        .observer(recorder.clone())
        .build()
        .unwrap();

    let state = flow.step(main).unwrap();

    assert_eq!(recorder.invoked_names(), vec!["main", "after"]);
    assert_eq!(state.scope("after").unwrap().get("ran"), Some(&json!(true)));
    assert_eq!(state.scope("after").unwrap().parent.as_deref(), Some("main"));
}

#[test]
fn test_hook_patch_keyed_by_scope_merges_into_that_scope() {
    init_tracing();
    let main = Action::named("main", |ctx| {
        ctx.hook("note", &[]).unwrap();
        Next::Fallthrough
    });
    let mut flow = Flow::builder()
        .action(main.clone())
        .hook(Hook::new("note", |_ctx, _args| {
            Next::patch(json!({ "main": { "noted": true }, "other": 1 }))
        }))
        .build()
        .unwrap();

    let state = flow.step(main).unwrap();

    assert_eq!(state.scope("main").unwrap().get("noted"), Some(&json!(true)));
    assert_eq!(state.globals.get("other"), Some(&json!(1)));
    assert!(state.globals.get("main").is_none());
}

#[test]
fn test_hook_patch_for_a_future_scope_is_adopted_by_it() {
    init_tracing();
    let main = Action::named("main", |ctx| {
        ctx.hook("prepare", &[]).unwrap();
        Next::from(ctx.action("later"))
    });
    let later = Action::named("later", |ctx| {
        let pre = ctx.get("pre").cloned();
        Next::patch(json!({ "seen_pre": pre }))
    });
    let mut flow = Flow::builder()
        .actions([main.clone(), later])
        .hook(Hook::new("prepare", |_ctx, _args| {
            Next::patch(json!({ "later": { "pre": 1 } }))
        }))
        .build()
        .unwrap();

    let state = flow.step(main).unwrap();

    let later = state.scope("later").unwrap();
    assert_eq!(later.get("pre"), Some(&json!(1)));
    assert_eq!(later.get("seen_pre"), Some(&json!(1)));
    assert!(state.globals.get("later").is_none());

    let value = state.to_value();
    assert_eq!(value["later"]["pre"], json!(1));
    assert_eq!(value["later"]["seen_pre"], json!(1));
}

#[test]
fn test_hook_can_target_a_scope_explicitly() {
    init_tracing();
    let main = Action::named("main", |ctx| {
        ctx.hook("remember", &[json!(42)]).unwrap();
        Next::Fallthrough
    });
    let mut flow = Flow::builder()
        .action(main.clone())
        .hook(Hook::new("remember", |_ctx, args| {
            Next::patch_scope("memory", json!({ "value": args[0] }))
        }))
        .build()
        .unwrap();

    let state = flow.step(main).unwrap();

    assert_eq!(state.scope("memory").unwrap().get("value"), Some(&json!(42)));
    assert!(state.globals.is_empty());
}

#[test]
fn test_unknown_hook() {
    init_tracing();
    let main = Action::named("main", |ctx| {
        let unknown = matches!(
            ctx.hook("missing", &[]),
            Err(FlowError::UnknownHook(ref name)) if name == "missing"
        );
        Next::patch(json!({ "unknown": unknown }))
    });
    let mut flow = builder_with(&main).build().unwrap();

    let state = flow.step(main).unwrap();

    assert_eq!(state.scope("main").unwrap().get("unknown"), Some(&json!(true)));
}

#[test]
fn test_mutations_are_audited_with_their_source() {
    init_tracing();
    let recorder = Arc::new(Recorder::default());
    let wait = Action::anonymous(|_| Next::Fallthrough);
    let main = Action::named("main", move |ctx| {
        ctx.hook("tag", &[json!("a")]).unwrap();
        Next::fork(vec![Next::patch(json!({ "local": 1 })), wait.clone().into()])
    });
    let mut flow = builder_with(&main)
        .observer(recorder.clone())
        .build()
        .unwrap();

    flow.step(main).unwrap();
    flow.step(json!({ "answer": 1 })).unwrap();

    assert_eq!(
        recorder.audit_log(),
        vec![
            (Some("tag".to_string()), json!({ "tags": { "a": true } })),
            (None, json!({ "answer": 1 })),
        ]
    );
}
