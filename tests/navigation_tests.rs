//! Integration tests for imperative navigation, persistence and the global router

mod common;

use common::{app_configuration, init_logging, page};
use futures::channel::oneshot;
use gpui::TestAppContext;
use gpui_shell_router::*;
use parking_lot::Mutex;
use std::sync::Arc;

fn parse(parser: &RouteInformationParser, cx: &mut TestAppContext, info: RouteInformation) -> MatchList {
    cx.update(|cx| parser.parse(cx, info))
        .ready()
        .expect("resolution should settle")
}

// ============================================================================
// Stack operations
// ============================================================================

#[test]
fn test_push_creates_fresh_page_key() {
    let config = app_configuration();
    let base = config.find_match("/a", None);

    let first = base.push(config.find_match("/a/1", None), None);
    let second = first.push(config.find_match("/a/1", None), None);

    let first_key = first.last().unwrap().page_key();
    let second_key = second.last().unwrap().page_key();
    assert_ne!(first_key, second_key);
    assert_eq!(first_key.as_str().len(), 32);
    assert!(!base.page_keys().contains(first_key));
    assert!(second.page_keys().contains(first_key));
    assert_eq!(base.frames().len(), 1);
}

#[test]
fn test_pop_rebuilds_location() {
    let config = app_configuration();
    let list = config.find_match("/family/f1/person/p2?tab=info", None);

    let popped = list.pop(None);
    assert_eq!(popped.location(), "/family/f1?tab=info");
    assert_eq!(popped.path_params().get("fid"), Some("f1"));
    assert!(popped.path_params().get("pid").is_none());
}

#[test]
fn test_restore_is_idempotent() {
    let config = app_configuration();
    let list = config
        .find_match("/a", None)
        .push(config.find_match("/login", None), None);

    let again = list.restore(config.find_match("/a", None));
    assert_eq!(again.page_keys(), list.page_keys());
    let twice = again.restore(config.find_match("/a", None));
    assert_eq!(twice.page_keys(), list.page_keys());
}

#[tokio::test]
async fn test_pop_completes_pushed_page() {
    let config = app_configuration();
    let (completer, result) = Completer::new();
    let list = config
        .find_match("/", None)
        .push(config.find_match("/login", None), Some(completer));

    let popped = list.pop(Some(Extra::new(true)));
    assert_eq!(popped.frames().len(), 1);
    let value = result.await;
    assert_eq!(value.and_then(|v| v.downcast_ref::<bool>().copied()), Some(true));
}

// ============================================================================
// Persistence
// ============================================================================

#[gpui::test]
fn test_history_state_round_trip(cx: &mut TestAppContext) {
    let parser = RouteInformationParser::new(app_configuration());
    let base = parse(&parser, cx, RouteInformation::new("/family/f1"));
    let pushed = parse(
        &parser,
        cx,
        RouteInformation::navigation(
            "/family/f1/person/p2",
            NavigatingType::Push,
            base,
            Some(Extra::new(serde_json::json!({ "from": "list" }))),
            None,
        ),
    );

    let stored = parser.restore_route_information(&pushed);
    let wire = stored.persisted_state().unwrap().to_json().unwrap();
    let encoded = EncodedMatchList::from_json(&wire).unwrap();

    let restored = parse(&parser, cx, RouteInformation::persisted(stored.location, encoded));
    assert_eq!(restored, pushed);
    assert_eq!(restored.page_keys(), pushed.page_keys());
    let frame = restored.imperative_frames().next().unwrap();
    assert!(frame.completer.is_none());
    assert_eq!(
        frame.matches.extra().and_then(|e| e.downcast_ref::<serde_json::Value>()),
        Some(&serde_json::json!({ "from": "list" }))
    );
}

// ============================================================================
// Global router
// ============================================================================

#[gpui::test]
fn test_navigator_flow(cx: &mut TestAppContext) {
    init_logging();
    cx.update(|cx| {
        init_router(cx, |router| {
            router
                .route(page("/"))
                .route(page("/a").child(page(":id")))
                .route(page("/login"))
        });
    });

    cx.update(|cx| Navigator::go(cx, "/a/42"));
    assert_eq!(cx.read(Navigator::current_location), "/a/42");

    let result = cx.update(|cx| Navigator::push(cx, "/login"));
    assert!(cx.read(Navigator::can_pop));
    cx.update(|cx| Navigator::pop_with_result(cx, Extra::new(1u8)));
    assert_eq!(
        pollster::block_on(result).and_then(|v| v.downcast_ref::<u8>().copied()),
        Some(1)
    );

    cx.update(|cx| Navigator::back(cx));
    assert_eq!(cx.read(Navigator::current_location), "/a/42");
    cx.update(|cx| Navigator::back(cx));
    assert_eq!(cx.read(Navigator::current_location), "/");
    assert!(!cx.read(Navigator::can_go_back));
}

#[gpui::test]
fn test_async_redirect_through_navigator(cx: &mut TestAppContext) {
    init_logging();
    let (sender, receiver) = oneshot::channel::<Option<String>>();
    let receiver = Arc::new(Mutex::new(Some(receiver)));

    cx.update(|cx| {
        init_router(cx, |router| {
            router
                .route(page("/"))
                .route(page("/login"))
                .route(page("/account").redirect(redirect_fn(move |_, _| {
                    match receiver.lock().take() {
                        Some(receiver) => {
                            Redirect::pending(async move { receiver.await.ok().flatten() })
                        }
                        None => Redirect::none(),
                    }
                })))
        });
    });

    cx.update(|cx| Navigator::go(cx, "/account"));
    cx.run_until_parked();
    assert_eq!(cx.read(Navigator::current_location), "/");

    sender.send(Some("/login".to_string())).unwrap();
    cx.run_until_parked();
    assert_eq!(cx.read(Navigator::current_location), "/login");
    assert_eq!(cx.read(|cx| cx.router().history().len()), 2);
}
