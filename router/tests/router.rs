use futures::channel::oneshot;
use sprig_dom::{
    memory::{MemoryDocument, MemoryWindow},
    AnchorClick, DocumentLike, NavigationEventKind, WindowLike,
};
use sprig_router::{
    params_map, BoxError, GuardDecision, RouteOptions, Router, RouterError,
    RouterEvent,
};
use std::{cell::RefCell, rc::Rc};

type Page = &'static str;

fn attached(url: &str) -> (Router<Page>, Rc<MemoryWindow>, Rc<MemoryDocument>) {
    let window = Rc::new(MemoryWindow::new(url));
    let document = Rc::new(MemoryDocument::new());
    let router = Router::new();
    router.attach(
        Rc::clone(&window) as Rc<dyn WindowLike>,
        Rc::clone(&document) as Rc<dyn DocumentLike>,
    );
    (router, window, document)
}

fn urls(window: &MemoryWindow) -> Vec<String> {
    window.history().into_iter().map(|e| e.url).collect()
}

fn kinds(window: &MemoryWindow) -> Vec<NavigationEventKind> {
    window.events().into_iter().map(|(kind, _)| kind).collect()
}

#[tokio::test]
async fn first_match_in_insertion_order_wins() {
    let (router, window, _) = attached("/");
    router
        .map("/user/:id", "user", RouteOptions::new())
        .unwrap()
        .map("/user/me", "me", RouteOptions::new())
        .unwrap();

    router.navigate("/user/me", false).await.unwrap();

    let (kind, detail) = window.events().pop().unwrap();
    assert_eq!(kind, NavigationEventKind::Navigate);
    assert_eq!(detail.handler.as_deref(), Some("user"));
    assert_eq!(detail.params.get("id").map(String::as_str), Some("me"));
    assert_eq!(router.current_route().as_deref(), Some("/user/:id"));
}

#[tokio::test]
async fn remapping_replaces_in_place() {
    let (router, window, _) = attached("/");
    router.map("/a", "first", RouteOptions::new()).unwrap();
    router.map("/:any", "catch_all", RouteOptions::new()).unwrap();
    router.map("/a", "second", RouteOptions::new()).unwrap();

    router.navigate("/a", false).await.unwrap();

    let (_, detail) = window.events().pop().unwrap();
    assert_eq!(detail.handler.as_deref(), Some("second"));
}

#[tokio::test]
async fn navigation_emits_before_then_navigate_and_pushes_history() {
    let (router, window, _) = attached("/");
    router
        .map("/user/:id", "user", RouteOptions::new().meta("title", "User"))
        .unwrap();

    router.navigate("/user/5", false).await.unwrap();

    assert_eq!(
        kinds(&window),
        [NavigationEventKind::Before, NavigationEventKind::Navigate]
    );
    assert_eq!(urls(&window), ["/", "/user/5"]);
    assert_eq!(window.history()[1].state.path, "/user/5");
    assert_eq!(router.current_path(), "/user/5");
    assert_eq!(router.current_params(), params_map!("id" => "5"));
    assert_eq!(
        router.current_meta().get("title"),
        Some(&serde_json::json!("User"))
    );
}

#[tokio::test]
async fn replace_does_not_grow_history() {
    let (router, window, _) = attached("/");
    router.map("/a", "a", RouteOptions::new()).unwrap();

    router.navigate("/a", true).await.unwrap();

    assert_eq!(urls(&window), ["/a"]);
    assert_eq!(window.history_writes(), 1);
}

#[tokio::test]
async fn denying_guard_leaves_history_and_state_alone() {
    let (router, window, _) = attached("/");
    router
        .map("/", "home", RouteOptions::new())
        .unwrap()
        .map("/admin", "admin", RouteOptions::new().guard(|_| async { false }))
        .unwrap();
    router.navigate("/", true).await.unwrap();
    window.take_events();

    router.navigate("/admin", false).await.unwrap();

    assert_eq!(window.history_writes(), 1);
    assert_eq!(urls(&window), ["/"]);
    assert_eq!(router.current_path(), "/");
    assert_eq!(router.current_route().as_deref(), Some("/"));
    assert_eq!(kinds(&window), [NavigationEventKind::Before]);
}

#[tokio::test]
async fn redirect_ends_where_direct_navigation_does() {
    let options = || {
        RouteOptions::new().guard(|params: sprig_router::ParamsMap| async move {
            let id = params.get_str("id").unwrap_or("0");
            GuardDecision::Redirect(format!("/user/{id}"))
        })
    };

    let (redirected, redirected_window, _) = attached("/");
    redirected
        .map("/profile/:id", "profile", options())
        .unwrap()
        .map("/user/:id", "user", RouteOptions::new())
        .unwrap();
    redirected.navigate("/profile/7", false).await.unwrap();

    let (direct, direct_window, _) = attached("/");
    direct
        .map("/profile/:id", "profile", options())
        .unwrap()
        .map("/user/:id", "user", RouteOptions::new())
        .unwrap();
    direct.navigate("/user/7", false).await.unwrap();

    assert_eq!(redirected_window.history(), direct_window.history());
    assert_eq!(
        redirected_window.events().pop(),
        direct_window.events().pop()
    );
    assert_eq!(redirected.current(), direct.current());
}

#[tokio::test]
async fn redirect_loops_are_bounded() {
    let (router, window, _) = attached("/");
    router
        .set_max_redirects(3)
        .map("/a", "a", RouteOptions::new().guard(|_| async { "/b" }))
        .unwrap()
        .map("/b", "b", RouteOptions::new().guard(|_| async { "/a" }))
        .unwrap();

    let err = router.navigate("/a", false).await.unwrap_err();

    assert!(matches!(err, RouterError::RedirectLoop { limit: 3, .. }));
    assert_eq!(window.history_writes(), 0);
}

#[tokio::test]
async fn guard_errors_propagate() {
    let (router, window, _) = attached("/");
    router
        .map(
            "/a",
            "a",
            RouteOptions::new().guard(|_| async { Err::<bool, _>("no session") }),
        )
        .unwrap();

    let err = router.navigate("/a", false).await.unwrap_err();

    match err {
        RouterError::Guard { path, source } => {
            assert_eq!(path, "/a");
            assert_eq!(source.to_string(), "no session");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(window.history_writes(), 0);
}

#[tokio::test]
async fn base_path_is_added_to_history_and_stripped_on_start() {
    let (router, window, _) = attached("/");
    router.set_base_path("/app/");
    router.map("/user/:id", "user", RouteOptions::new()).unwrap();

    router.navigate("/user/5", false).await.unwrap();
    assert_eq!(window.location().pathname, "/app/user/5");
    assert_eq!(window.history()[1].state.path, "/user/5");

    let (router, window, _) = attached("https://example.com/app/user/5");
    router.set_base_path("/app");
    router.map("/user/:id", "user", RouteOptions::new()).unwrap();
    router.start().await.unwrap();

    assert_eq!(router.current_route().as_deref(), Some("/user/:id"));
    assert_eq!(router.current_params(), params_map!("id" => "5"));
    assert_eq!(urls(&window), ["/app/user/5"]);
}

#[tokio::test]
async fn start_seeds_base_from_base_href() {
    let (router, window, document) = attached("/shop/item/9");
    document.set_base_href(Some("/shop/"));
    router.map("/item/:id", "item", RouteOptions::new()).unwrap();

    router.start().await.unwrap();

    assert_eq!(router.base_path(), "/shop");
    assert_eq!(router.current_params(), params_map!("id" => "9"));
    assert_eq!(urls(&window), ["/shop/item/9"]);
}

#[tokio::test]
async fn explicit_base_wins_over_base_href() {
    let (router, _, document) = attached("/");
    document.set_base_href(Some("/shop/"));
    router.set_base_path("/");
    router.map("/", "home", RouteOptions::new()).unwrap();

    router.start().await.unwrap();

    assert_eq!(router.base_path(), "");
}

#[tokio::test]
async fn start_is_idempotent() {
    let (router, window, _) = attached("/");
    router.map("/", "home", RouteOptions::new()).unwrap();

    router.start().await.unwrap();
    router.start().await.unwrap();

    assert!(router.is_started());
    assert_eq!(window.history_writes(), 1);
}

#[tokio::test]
async fn start_requires_attach() {
    let router = Router::<Page>::new();
    assert!(matches!(router.start().await, Err(RouterError::Detached)));
    assert!(!router.is_started());
}

#[tokio::test]
async fn home_user_and_not_found_scenario() {
    let (router, window, _) = attached("/");
    router
        .map("/", "Home", RouteOptions::new())
        .unwrap()
        .map("/user/:id", "User", RouteOptions::new())
        .unwrap()
        .not_found("Err");

    router.navigate("/user/42", false).await.unwrap();
    let (kind, detail) = window.events().pop().unwrap();
    assert_eq!(kind, NavigationEventKind::Navigate);
    assert_eq!(detail.path, "/user/42");
    assert_eq!(detail.params.get("id").map(String::as_str), Some("42"));
    assert_eq!(detail.handler.as_deref(), Some("User"));

    router.navigate("/nope", false).await.unwrap();
    let (kind, detail) = window.events().pop().unwrap();
    assert_eq!(kind, NavigationEventKind::NotFound);
    assert_eq!(detail.path, "/nope");
    assert_eq!(detail.handler.as_deref(), Some("Err"));
    assert_eq!(router.current_path(), "/nope");
    assert_eq!(router.current_route(), None);
    assert_eq!(urls(&window), ["/", "/user/42"]);
}

#[tokio::test]
async fn not_found_without_handler_keeps_state() {
    let (router, window, _) = attached("/");
    router.map("/a", "a", RouteOptions::new()).unwrap();
    router.navigate("/a", false).await.unwrap();

    router.navigate("/missing", false).await.unwrap();

    let (kind, detail) = window.events().pop().unwrap();
    assert_eq!(kind, NavigationEventKind::NotFound);
    assert_eq!(detail.handler, None);
    assert_eq!(router.current_path(), "/a");
}

#[tokio::test]
async fn listeners_run_in_order_with_the_event() {
    let (router, _, _) = attached("/");
    router.map("/user/:id", "user", RouteOptions::new()).unwrap();
    let log = Rc::new(RefCell::new(Vec::new()));
    for name in ["first", "second"] {
        let log = Rc::clone(&log);
        router.on(NavigationEventKind::Navigate, move |event: RouterEvent<Page>| {
            let log = Rc::clone(&log);
            async move {
                log.borrow_mut().push(format!("{name} {} {:?}", event.path, event.handler));
                Ok::<_, BoxError>(())
            }
        });
    }

    router.navigate("/user/1", false).await.unwrap();

    assert_eq!(
        *log.borrow(),
        [
            r#"first /user/1 Some("user")"#,
            r#"second /user/1 Some("user")"#
        ]
    );
}

#[tokio::test]
async fn listener_errors_propagate_and_off_removes() {
    let (router, _, _) = attached("/");
    router.map("/", "home", RouteOptions::new()).unwrap();
    let id = router.on(NavigationEventKind::Navigate, |_| async {
        Err::<(), _>("listener broke")
    });

    let err = router.navigate("/", false).await.unwrap_err();
    assert!(matches!(err, RouterError::Listener(_)));

    router.off(id);
    router.navigate("/", false).await.unwrap();
}

#[tokio::test]
async fn generate_url_uses_exact_keys_and_base() {
    let router = Router::<Page>::new();
    router.set_base_path("app");
    router.map("/user/:id", "user", RouteOptions::new()).unwrap();

    assert_eq!(
        router
            .generate_url("/user/:id", &params_map!("id" => "a b"))
            .unwrap()
            .as_deref(),
        Some("/app/user/a%20b")
    );
    assert_eq!(
        router.generate_url("/user/5", &params_map!()).unwrap(),
        None
    );
    assert!(matches!(
        router.generate_url("/user/:id", &params_map!()),
        Err(RouterError::MissingParam(name)) if name == "id"
    ));
}

#[tokio::test]
async fn popstate_re_resolves_without_pushing() {
    let (router, window, _) = attached("/");
    router
        .map("/a", "a", RouteOptions::new())
        .unwrap()
        .map("/b", "b", RouteOptions::new())
        .unwrap();
    router.navigate("/a", false).await.unwrap();
    router.navigate("/b", false).await.unwrap();

    assert!(window.back());
    window.run_until_stalled();

    assert_eq!(router.current_path(), "/a");
    assert_eq!(urls(&window), ["/", "/a", "/b"]);
    assert_eq!(window.history_index(), 1);
}

#[tokio::test]
async fn same_origin_anchor_clicks_are_intercepted() {
    let (router, window, _) = attached("/");
    router.map("/user/:id", "user", RouteOptions::new()).unwrap();

    assert!(window.click(&AnchorClick::new("/user/7")));
    window.run_until_stalled();
    assert_eq!(router.current_path(), "/user/7");
    assert_eq!(urls(&window), ["/", "/user/7"]);

    assert!(!window.click(&AnchorClick::new("https://example.org/user/8")));
    let mut new_tab = AnchorClick::new("/user/9");
    new_tab.target = Some("_blank".into());
    assert!(!window.click(&new_tab));
    window.run_until_stalled();
    assert_eq!(router.current_path(), "/user/7");
}

#[tokio::test]
async fn detach_removes_window_listeners() {
    let (router, window, _) = attached("/");
    assert_eq!(window.listener_count(), 2);
    assert!(router.is_attached());

    router.detach();

    assert_eq!(window.listener_count(), 0);
    assert!(!window.click(&AnchorClick::new("/anything")));
}

#[tokio::test]
async fn superseded_navigation_stops_quietly() {
    let (router, window, _) = attached("/");
    let (release, wait) = oneshot::channel::<()>();
    let wait = Rc::new(RefCell::new(Some(wait)));
    router
        .map(
            "/slow",
            "slow",
            RouteOptions::new().guard(move |_| {
                let wait = wait.borrow_mut().take();
                async move {
                    if let Some(wait) = wait {
                        _ = wait.await;
                    }
                    true
                }
            }),
        )
        .unwrap()
        .map("/fast", "fast", RouteOptions::new())
        .unwrap();

    window.spawn_local(Box::pin({
        let router = router.clone();
        async move { router.navigate("/slow", false).await.unwrap() }
    }));
    window.run_until_stalled();

    router.navigate("/fast", false).await.unwrap();
    release.send(()).unwrap();
    window.run_until_stalled();

    assert_eq!(router.current_path(), "/fast");
    assert_eq!(urls(&window), ["/", "/fast"]);
    let navigated = window
        .events()
        .into_iter()
        .filter(|(kind, _)| *kind == NavigationEventKind::Navigate)
        .map(|(_, detail)| detail.path)
        .collect::<Vec<_>>();
    assert_eq!(navigated, ["/fast"]);
}

#[tokio::test]
async fn navigations_that_never_commit_do_not_supersede() {
    let (router, window, _) = attached("/");
    let (release, wait) = oneshot::channel::<()>();
    let wait = Rc::new(RefCell::new(Some(wait)));
    router
        .map(
            "/slow",
            "slow",
            RouteOptions::new().guard(move |_| {
                let wait = wait.borrow_mut().take();
                async move {
                    if let Some(wait) = wait {
                        _ = wait.await;
                    }
                    true
                }
            }),
        )
        .unwrap()
        .map("/admin", "admin", RouteOptions::new().guard(|_| async { false }))
        .unwrap();

    window.spawn_local(Box::pin({
        let router = router.clone();
        async move { router.navigate("/slow", false).await.unwrap() }
    }));
    window.run_until_stalled();

    router.navigate("/admin", false).await.unwrap();
    router.navigate("/nowhere", false).await.unwrap();
    assert_eq!(router.current_path(), "");
    release.send(()).unwrap();
    window.run_until_stalled();

    assert_eq!(router.current_path(), "/slow");
    assert_eq!(urls(&window), ["/", "/slow"]);
    assert_eq!(
        kinds(&window).last(),
        Some(&NavigationEventKind::Navigate)
    );
}
