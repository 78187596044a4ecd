#![allow(clippy::unwrap_used, clippy::expect_used)]

use http::Method;
use segrouter::dispatcher::{
    handler, DispatchOutcome, DispatchRequest, Dispatcher, HandlerError, HandlerRequest,
    HandlerResponse, RequestInfo,
};
use segrouter::middleware::Middleware;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

mod common;
use common::handlers::{echo, not_found};

fn blog_dispatcher() -> Dispatcher {
    let dispatcher = Dispatcher::new();
    dispatcher
        .register(Method::GET, "/post/{slug}", echo("post_by_slug"))
        .unwrap();
    dispatcher
        .register(Method::GET, "/post/popular", echo("popular_posts"))
        .unwrap();
    dispatcher
        .register(Method::GET, "/post/{id<int>}/comments", echo("comments"))
        .unwrap();
    dispatcher
}

#[test]
fn test_dispatch_to_matching_handler() {
    let dispatcher = blog_dispatcher();
    let resp = dispatcher
        .dispatch(Method::GET, "/post/hello%20world", None)
        .into_response()
        .unwrap();
    assert_eq!(resp.status, 200);
    assert_eq!(
        resp.body,
        json!({"handler": "post_by_slug", "params": {"slug": "hello world"}})
    );
    assert_eq!(resp.get_header("Content-Type"), Some("application/json"));
}

#[test]
fn test_static_route_wins_over_earlier_param_route() {
    let dispatcher = blog_dispatcher();
    let resp = dispatcher
        .dispatch(Method::GET, "/post/popular", None)
        .into_response()
        .unwrap();
    assert_eq!(resp.body["handler"], "popular_posts");
}

#[test]
fn test_no_route_without_fallback_is_sentinel() {
    let dispatcher = blog_dispatcher();
    let outcome = dispatcher.dispatch(Method::GET, "/nothing/here", None);
    assert!(matches!(outcome, DispatchOutcome::NoRoute));
    // Wrong method is also "no route"
    assert!(!dispatcher
        .dispatch(Method::POST, "/post/popular", None)
        .is_handled());
    // Type mismatch with nothing to fall through to
    assert!(!dispatcher
        .dispatch(Method::GET, "/post/abc/comments", None)
        .is_handled());
}

#[test]
fn test_call_fallback_overrides_default() {
    let mut dispatcher = blog_dispatcher();
    let fallback = not_found();
    let resp = dispatcher
        .dispatch(Method::GET, "/missing", Some(&fallback))
        .into_response()
        .unwrap();
    assert_eq!(resp.status, 404);
    assert_eq!(resp.body, json!({"error": "no route for /missing"}));

    dispatcher.set_not_found(handler(|_| HandlerResponse::error(410, "gone")));
    let resp = dispatcher
        .dispatch(Method::GET, "/missing", None)
        .into_response()
        .unwrap();
    assert_eq!(resp.status, 410);

    let resp = dispatcher
        .dispatch(Method::GET, "/missing", Some(&fallback))
        .into_response()
        .unwrap();
    assert_eq!(resp.status, 404);
}

#[test]
fn test_exactly_one_handler_invoked() {
    let calls = Arc::new(AtomicUsize::new(0));
    let dispatcher = Dispatcher::new();
    for pattern in ["/a/{x}", "/a/b", "/{y}/b", "/{rest<path>}"] {
        let calls = Arc::clone(&calls);
        dispatcher
            .register(
                Method::GET,
                pattern,
                handler(move |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    HandlerResponse::json(200, json!(null))
                }),
            )
            .unwrap();
    }
    assert!(dispatcher.dispatch(Method::GET, "/a/b", None).is_handled());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_request_carries_route_query_headers_and_body() {
    let seen: Arc<Mutex<Option<HandlerRequest>>> = Arc::new(Mutex::new(None));
    let seen_clone = Arc::clone(&seen);
    let dispatcher = Dispatcher::new();
    dispatcher
        .register_named(
            Some(Method::POST),
            "/user/{id<int>}/posts",
            "create_post",
            handler(move |req| {
                *seen_clone.lock().unwrap() = Some(req);
                HandlerResponse::json(201, json!({"ok": true}))
            }),
        )
        .unwrap();

    let request_id = "01ARZ3NDEKTSV4RRFFQ69G5FAV";
    let req = DispatchRequest::new(Method::POST, "/user/42/posts?draft=true&tag=a&tag=b+c")
        .with_header("X-Request-Id", request_id)
        .with_header("Authorization", "Bearer t")
        .with_body(json!({"title": "hi"}));
    let resp = dispatcher.dispatch_request(req, None).into_response().unwrap();
    assert_eq!(resp.status, 201);

    let req = seen.lock().unwrap().take().unwrap();
    assert_eq!(req.request_id.to_string(), request_id);
    assert_eq!(req.method, Method::POST);
    assert_eq!(req.route_name.as_deref(), Some("create_post"));
    assert_eq!(req.route_pattern.as_deref(), Some("/user/{id<int>}/posts"));
    assert_eq!(req.params.get_int("id"), Some(42));
    assert_eq!(req.get_query_param("draft"), Some("true"));
    assert_eq!(req.get_query_param("tag"), Some("b c"));
    assert_eq!(req.get_header("authorization"), Some("Bearer t"));
    assert_eq!(req.body, Some(json!({"title": "hi"})));
}

#[test]
fn test_fallback_request_has_no_route() {
    let seen = Arc::new(Mutex::new(None));
    let seen_clone = Arc::clone(&seen);
    let fallback = handler(move |req: HandlerRequest| {
        *seen_clone.lock().unwrap() = Some((req.route_name.clone(), req.params.len()));
        HandlerResponse::error(404, "nope")
    });
    let dispatcher = blog_dispatcher();
    assert!(dispatcher
        .dispatch(Method::GET, "/x", Some(&fallback))
        .is_handled());
    assert_eq!(*seen.lock().unwrap(), Some((None, 0)));
}

#[test]
fn test_handler_panic_becomes_500() {
    let dispatcher = Dispatcher::new();
    dispatcher
        .register(Method::GET, "/boom", handler(|_| panic!("kaboom")))
        .unwrap();
    dispatcher
        .register(Method::GET, "/fine", echo("fine"))
        .unwrap();

    let resp = dispatcher
        .dispatch(Method::GET, "/boom", None)
        .into_response()
        .unwrap();
    assert_eq!(resp.status, 500);
    assert!(resp.body["error"].as_str().unwrap().contains("kaboom"));

    // The dispatcher keeps serving
    let resp = dispatcher
        .dispatch(Method::GET, "/fine", None)
        .into_response()
        .unwrap();
    assert_eq!(resp.status, 200);
}

#[test]
fn test_register_rejects_bad_template() {
    let dispatcher = Dispatcher::new();
    assert!(dispatcher
        .register(Method::GET, "/files/{p<path>}/meta", echo("x"))
        .is_err());
    assert!(dispatcher
        .register(Method::GET, "/user/{id<integer>}", echo("x"))
        .is_err());
    assert!(dispatcher.routes().is_empty());
}

#[test]
fn test_runtime_registration_visible_to_clones() {
    let dispatcher = Dispatcher::new();
    let clone = dispatcher.clone();
    let before = dispatcher.routes();

    dispatcher.register_any("/health", echo("health")).unwrap();

    assert!(clone.dispatch(Method::HEAD, "/health", None).is_handled());
    // Snapshots taken earlier are immutable
    assert!(before.is_empty());
}

#[test]
fn test_concurrent_dispatch_during_registration() {
    let dispatcher = Arc::new(Dispatcher::new());
    dispatcher.register(Method::GET, "/base", echo("base")).unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let dispatcher = Arc::clone(&dispatcher);
            std::thread::spawn(move || {
                for _ in 0..500 {
                    assert!(dispatcher.dispatch(Method::GET, "/base", None).is_handled());
                }
            })
        })
        .collect();

    for i in 0..50 {
        dispatcher
            .register(Method::GET, &format!("/dyn/{i}/{{id<int>}}"), echo("dyn"))
            .unwrap();
    }
    for r in readers {
        r.join().unwrap();
    }
    assert_eq!(dispatcher.routes().len(), 51);
    assert!(dispatcher.dispatch(Method::GET, "/dyn/49/1", None).is_handled());
}

struct Recorder {
    name: &'static str,
    log: Arc<Mutex<Vec<String>>>,
    block: bool,
}

impl Middleware for Recorder {
    fn before(&self, _req: &HandlerRequest) -> Option<HandlerResponse> {
        self.log.lock().unwrap().push(format!("before:{}", self.name));
        self.block
            .then(|| HandlerResponse::error(401, "blocked"))
    }

    fn after(&self, _req: &RequestInfo, res: &mut HandlerResponse, _latency: Duration) {
        self.log.lock().unwrap().push(format!("after:{}", self.name));
        res.set_header("x-seen-by", self.name.to_string());
    }
}

#[test]
fn test_middleware_order_and_after_hooks() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut dispatcher = blog_dispatcher();
    for name in ["a", "b"] {
        dispatcher.add_middleware(Arc::new(Recorder {
            name,
            log: Arc::clone(&log),
            block: false,
        }));
    }

    let resp = dispatcher
        .dispatch(Method::GET, "/post/x", None)
        .into_response()
        .unwrap();
    assert_eq!(resp.status, 200);
    assert_eq!(resp.get_header("x-seen-by"), Some("b"));
    assert_eq!(
        *log.lock().unwrap(),
        vec!["before:a", "before:b", "after:a", "after:b"]
    );
}

#[test]
fn test_middleware_short_circuit_skips_handler() {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = Arc::clone(&calls);
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut dispatcher = Dispatcher::new();
    dispatcher
        .register(
            Method::GET,
            "/secret",
            handler(move |_| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
                HandlerResponse::json(200, json!("secret"))
            }),
        )
        .unwrap();
    dispatcher.add_middleware(Arc::new(Recorder {
        name: "guard",
        log: Arc::clone(&log),
        block: true,
    }));
    dispatcher.add_middleware(Arc::new(Recorder {
        name: "late",
        log: Arc::clone(&log),
        block: false,
    }));

    let resp = dispatcher
        .dispatch(Method::GET, "/secret", None)
        .into_response()
        .unwrap();
    assert_eq!(resp.status, 401);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        *log.lock().unwrap(),
        vec!["before:guard", "after:guard", "after:late"]
    );
}

#[test]
fn test_middleware_wraps_fallback_but_not_no_route() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut dispatcher = Dispatcher::new();
    dispatcher.add_middleware(Arc::new(Recorder {
        name: "m",
        log: Arc::clone(&log),
        block: false,
    }));

    assert!(!dispatcher.dispatch(Method::GET, "/x", None).is_handled());
    assert!(log.lock().unwrap().is_empty());

    let fallback = not_found();
    assert!(dispatcher
        .dispatch(Method::GET, "/x", Some(&fallback))
        .is_handled());
    assert_eq!(*log.lock().unwrap(), vec!["before:m", "after:m"]);
}

/// Records what the `after` hook sees
struct RouteSpy {
    seen: Arc<Mutex<Vec<(Option<String>, String)>>>,
}

impl Middleware for RouteSpy {
    fn after(&self, req: &RequestInfo, _res: &mut HandlerResponse, _latency: Duration) {
        self.seen
            .lock()
            .unwrap()
            .push((req.route_name.as_deref().map(str::to_string), req.path.clone()));
    }
}

#[test]
fn test_after_hook_sees_request_info() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut dispatcher = blog_dispatcher();
    dispatcher.add_middleware(Arc::new(RouteSpy {
        seen: Arc::clone(&seen),
    }));

    let req = DispatchRequest::new(Method::GET, "/post/7/comments?page=2")
        .with_header("x-trace", "t")
        .with_body(json!({"large": "body"}));
    assert!(dispatcher.dispatch_request(req, None).is_handled());
    let fallback = not_found();
    assert!(dispatcher
        .dispatch(Method::GET, "/nope", Some(&fallback))
        .is_handled());

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            (
                Some("/post/{id<int>}/comments".to_string()),
                "/post/7/comments?page=2".to_string()
            ),
            (None, "/nope".to_string()),
        ]
    );
}

/// Error handler that echoes the cause it was invoked for
fn describe_error() -> segrouter::Handler {
    handler(|req| {
        let HandlerError { status, message } = req.error.clone().unwrap();
        HandlerResponse::json(
            status,
            json!({
                "message": message,
                "route": req.route_name.as_deref(),
                "params": req.params,
            }),
        )
    })
}

#[test]
fn test_error_handler_answers_unmatched_requests() {
    let mut dispatcher = blog_dispatcher();
    dispatcher.set_error_handler(404, describe_error());

    let resp = dispatcher
        .dispatch(Method::GET, "/missing?x=1", None)
        .into_response()
        .unwrap();
    assert_eq!(resp.status, 404);
    assert_eq!(resp.body["message"], "no route for GET /missing");
    assert_eq!(resp.body["route"], json!(null));

    // A fallback still takes precedence over the error handler
    let fallback = not_found();
    let resp = dispatcher
        .dispatch(Method::GET, "/missing", Some(&fallback))
        .into_response()
        .unwrap();
    assert!(resp.body.get("message").is_none());
}

#[test]
fn test_error_handler_runs_inside_middleware() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut dispatcher = Dispatcher::new();
    dispatcher.set_error_handler(404, describe_error());
    dispatcher.add_middleware(Arc::new(Recorder {
        name: "m",
        log: Arc::clone(&log),
        block: false,
    }));

    let resp = dispatcher
        .dispatch(Method::GET, "/x", None)
        .into_response()
        .unwrap();
    assert_eq!(resp.status, 404);
    assert_eq!(resp.get_header("x-seen-by"), Some("m"));
    assert_eq!(*log.lock().unwrap(), vec!["before:m", "after:m"]);
}

#[test]
fn test_panic_goes_to_500_error_handler() {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .register(Method::GET, "/boom/{id<int>}", handler(|_| panic!("kaboom")))
        .unwrap();
    dispatcher.set_error_handler(500, describe_error());

    let resp = dispatcher
        .dispatch(Method::GET, "/boom/3", None)
        .into_response()
        .unwrap();
    assert_eq!(resp.status, 500);
    assert_eq!(resp.body["message"], "kaboom");
    assert_eq!(resp.body["route"], "/boom/{id<int>}");
    assert_eq!(resp.body["params"], json!({"id": 3}));
}

#[test]
fn test_specific_error_handler_wins_over_generic() {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .register(Method::GET, "/boom", handler(|_| panic!("kaboom")))
        .unwrap();
    dispatcher.set_error_handler(0, handler(|req| {
        HandlerResponse::json(req.error.unwrap().status, json!("generic"))
    }));
    dispatcher.set_error_handler(404, handler(|_| HandlerResponse::json(404, json!("specific"))));

    let missing = dispatcher
        .dispatch(Method::GET, "/missing", None)
        .into_response()
        .unwrap();
    assert_eq!(missing.body, json!("specific"));

    let panicked = dispatcher
        .dispatch(Method::GET, "/boom", None)
        .into_response()
        .unwrap();
    assert_eq!(panicked.status, 500);
    assert_eq!(panicked.body, json!("generic"));
}

#[test]
fn test_panicking_error_handler_falls_back_to_default_500() {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .register(Method::GET, "/boom", handler(|_| panic!("kaboom")))
        .unwrap();
    dispatcher.set_error_handler(500, handler(|_| panic!("error handler broke")));

    let resp = dispatcher
        .dispatch(Method::GET, "/boom", None)
        .into_response()
        .unwrap();
    assert_eq!(resp.status, 500);
    assert_eq!(resp.body["error"], "Handler panicked: kaboom");
}

#[test]
fn test_redirect_answers_before_routing() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut dispatcher = blog_dispatcher();
    dispatcher.add_redirect("/post/popular", "/post/trending", 301);
    dispatcher.add_middleware(Arc::new(Recorder {
        name: "m",
        log: Arc::clone(&log),
        block: false,
    }));

    let resp = dispatcher
        .dispatch(Method::GET, "/post/popular?ref=home", None)
        .into_response()
        .unwrap();
    assert_eq!(resp.status, 301);
    assert_eq!(resp.get_header("Location"), Some("/post/trending"));
    assert!(log.lock().unwrap().is_empty());

    // Only the exact path redirects
    let resp = dispatcher
        .dispatch(Method::GET, "/post/popular/x", None)
        .into_response();
    assert!(resp.is_none());
}

#[test]
fn test_redirect_with_invalid_status_uses_302() {
    let mut dispatcher = Dispatcher::new();
    dispatcher.add_redirect("/old", "https://example.com/new", 200);

    let resp = dispatcher
        .dispatch(Method::POST, "/old", None)
        .into_response()
        .unwrap();
    assert_eq!(resp.status, 302);
    assert_eq!(resp.get_header("location"), Some("https://example.com/new"));
}
