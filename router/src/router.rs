use crate::{
    event::{Listener, RouterEvent},
    location::{base_from_href, intercept, join_base, normalize_base, strip_base},
    matching::{GuardDecision, Route, RouteMeta, RouteOptions},
    params::ParamsMap,
    BoxError, RouterError,
};
use futures::future::LocalBoxFuture;
use indexmap::IndexMap;
use sprig_dom::{
    DocumentLike, HistoryState, ListenerId, NavigationEventKind, WindowLike,
};
use std::{
    cell::{Cell, RefCell},
    fmt::{self, Display},
    future::Future,
    rc::{Rc, Weak},
};

/// Redirects followed by a single navigation before giving up.
pub const DEFAULT_MAX_REDIRECTS: usize = 16;

/// The last successfully resolved location.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentRoute {
    pub path: String,
    pub params: ParamsMap,
    pub meta: RouteMeta,
    /// The matched pattern. `None` after a not-found fallback.
    pub route: Option<String>,
}

struct Attachment {
    window: Rc<dyn WindowLike>,
    document: Rc<dyn DocumentLike>,
    listeners: Vec<ListenerId>,
}

struct RouterInner<H> {
    routes: RefCell<IndexMap<String, (Rc<Route>, H)>>,
    not_found: RefCell<Option<H>>,
    started: Cell<bool>,
    base: RefCell<String>,
    base_explicit: Cell<bool>,
    current: RefCell<CurrentRoute>,
    listeners: RefCell<Vec<(ListenerId, NavigationEventKind, Listener<H>)>>,
    next_listener: Cell<u64>,
    attachment: RefCell<Option<Attachment>>,
    issued: Cell<u64>,
    committed: Cell<u64>,
    max_redirects: Cell<usize>,
}

/// Maps path patterns to handlers of type `H` and drives navigation.
///
/// Routes are tried in the order they were mapped and the first match wins.
/// Cloning a router yields another handle to the same state.
pub struct Router<H> {
    inner: Rc<RouterInner<H>>,
}

impl<H> Clone for Router<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<H> fmt::Debug for Router<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.inner.routes.borrow().keys().collect::<Vec<_>>())
            .field("base", &self.inner.base.borrow())
            .field("started", &self.inner.started.get())
            .field("attached", &self.inner.attachment.borrow().is_some())
            .field("current", &self.inner.current.borrow())
            .finish_non_exhaustive()
    }
}

impl<H> Default for Router<H>
where
    H: Clone + Display + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<H> Router<H>
where
    H: Clone + Display + 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RouterInner {
                routes: Default::default(),
                not_found: Default::default(),
                started: Cell::new(false),
                base: Default::default(),
                base_explicit: Cell::new(false),
                current: Default::default(),
                listeners: Default::default(),
                next_listener: Cell::new(0),
                attachment: Default::default(),
                issued: Cell::new(0),
                committed: Cell::new(0),
                max_redirects: Cell::new(DEFAULT_MAX_REDIRECTS),
            }),
        }
    }

    /// Maps `path` to `handler`.
    ///
    /// Mapping the same literal pattern again replaces the earlier route but
    /// keeps its position in the match order.
    pub fn map(
        &self,
        path: &str,
        handler: H,
        options: RouteOptions,
    ) -> Result<&Self, RouterError> {
        let route = Rc::new(Route::new(path, options)?);
        self.inner
            .routes
            .borrow_mut()
            .insert(path.to_string(), (route, handler));
        Ok(self)
    }

    /// Sets the handler reported when no route matches.
    pub fn not_found(&self, handler: H) -> &Self {
        *self.inner.not_found.borrow_mut() = Some(handler);
        self
    }

    /// Sets the prefix stripped from browser paths and added back when
    /// writing history. `""` and `"/"` clear it.
    pub fn set_base_path(&self, base: &str) -> &Self {
        *self.inner.base.borrow_mut() = normalize_base(base);
        self.inner.base_explicit.set(true);
        self
    }

    pub fn base_path(&self) -> String {
        self.inner.base.borrow().clone()
    }

    /// Bounds the number of guard redirects one navigation may follow.
    pub fn set_max_redirects(&self, limit: usize) -> &Self {
        self.inner.max_redirects.set(limit);
        self
    }

    /// Subscribes to back/forward navigation and anchor clicks in `window`.
    ///
    /// Attaching again first detaches from the previous context.
    pub fn attach(
        &self,
        window: Rc<dyn WindowLike>,
        document: Rc<dyn DocumentLike>,
    ) {
        self.detach();

        let popstate = {
            let router = Rc::downgrade(&self.inner);
            let window = Rc::downgrade(&window);
            Rc::new(move || {
                let (Some(router), Some(window)) =
                    (Router::upgrade(&router), window.upgrade())
                else {
                    return;
                };
                let path = window.location().pathname;
                window.spawn_local(Box::pin(async move {
                    if let Err(e) = router.navigate(&path, true).await {
                        tracing::error!("navigation to {path} failed: {e:?}");
                    }
                }));
            })
        };

        let click = {
            let router = Rc::downgrade(&self.inner);
            let window = Rc::downgrade(&window);
            Rc::new(move |click: &sprig_dom::AnchorClick| -> bool {
                let (Some(router), Some(window)) =
                    (Router::upgrade(&router), window.upgrade())
                else {
                    return false;
                };
                let origin = window.location().origin;
                let Some(path) = intercept(click, &origin, &router.base_path())
                else {
                    return false;
                };
                window.spawn_local(Box::pin(async move {
                    if let Err(e) = router.navigate(&path, false).await {
                        tracing::error!("navigation to {path} failed: {e:?}");
                    }
                }));
                true
            })
        };

        let listeners = vec![window.on_popstate(popstate), window.on_anchor_click(click)];
        *self.inner.attachment.borrow_mut() = Some(Attachment {
            window,
            document,
            listeners,
        });
    }

    /// Removes the listeners installed by [`attach`](Self::attach).
    pub fn detach(&self) {
        if let Some(attachment) = self.inner.attachment.borrow_mut().take() {
            for id in attachment.listeners {
                attachment.window.remove_listener(id);
            }
        }
    }

    pub fn is_attached(&self) -> bool {
        self.inner.attachment.borrow().is_some()
    }

    fn upgrade(inner: &Weak<RouterInner<H>>) -> Option<Self> {
        inner.upgrade().map(|inner| Self { inner })
    }

    fn window(&self) -> Option<Rc<dyn WindowLike>> {
        self.inner
            .attachment
            .borrow()
            .as_ref()
            .map(|a| Rc::clone(&a.window))
    }

    /// Resolves the current browser location.
    ///
    /// Seeds the base path from `<base href>` unless one was set explicitly,
    /// then navigates without adding a history entry. Calling it again only
    /// logs a warning.
    pub async fn start(&self) -> Result<(), RouterError> {
        if self.inner.started.get() {
            tracing::warn!("router already started");
            return Ok(());
        }
        let (window, document) = {
            let attachment = self.inner.attachment.borrow();
            let attachment = attachment.as_ref().ok_or(RouterError::Detached)?;
            (Rc::clone(&attachment.window), Rc::clone(&attachment.document))
        };
        self.inner.started.set(true);

        let location = window.location();
        if !self.inner.base_explicit.get() {
            if let Some(base) = document
                .base_href()
                .and_then(|href| base_from_href(&href, &location.origin))
            {
                tracing::debug!("using base path {base:?} from <base href>");
                *self.inner.base.borrow_mut() = base;
            }
        }
        self.navigate(&location.pathname, true).await
    }

    pub fn is_started(&self) -> bool {
        self.inner.started.get()
    }

    /// Whether no navigation issued after `seq` has committed yet.
    ///
    /// Navigations that are denied, or that end in a not-found without a
    /// handler, never commit and so never supersede an earlier one.
    pub fn is_current(&self, seq: u64) -> bool {
        self.inner.committed.get() <= seq
    }

    fn first_match(&self, path: &str) -> Option<(Rc<Route>, H, ParamsMap)> {
        self.inner
            .routes
            .borrow()
            .values()
            .find_map(|(route, handler)| {
                route
                    .matches(path)
                    .map(|params| (Rc::clone(route), handler.clone(), params))
            })
    }

    /// The pattern of the first route matching the router path `path`.
    pub fn resolve(&self, path: &str) -> Option<String> {
        self.first_match(path)
            .map(|(route, _, _)| route.path().to_string())
    }

    /// Navigates to `path`, which may carry the base path.
    ///
    /// Guard redirects are followed up to the configured limit. When a newer
    /// navigation commits while this one awaits a guard or listener, this one
    /// stops without touching history or state.
    pub async fn navigate(&self, path: &str, replace: bool) -> Result<(), RouterError> {
        let seq = self.inner.issued.get() + 1;
        self.inner.issued.set(seq);

        let limit = self.inner.max_redirects.get();
        let mut redirects = 0;
        let mut path = strip_base(&self.base_path(), path);

        loop {
            let Some((route, handler, params)) = self.first_match(&path) else {
                return self.fall_back(path, seq).await;
            };

            let event = RouterEvent {
                kind: NavigationEventKind::Before,
                path: path.clone(),
                params: params.clone(),
                handler: Some(handler),
                meta: route.meta().clone(),
                route: Some(route.path().to_string()),
                seq,
            };
            self.emit(event.clone()).await?;
            if !self.still_current(seq, &path) {
                return Ok(());
            }

            let decision = route
                .can_enter(&params)
                .await
                .map_err(|source| RouterError::Guard {
                    path: path.clone(),
                    source,
                })?;
            if !self.still_current(seq, &path) {
                return Ok(());
            }

            match decision {
                GuardDecision::Deny => {
                    tracing::warn!("navigation to {path} denied by guard");
                    return Ok(());
                }
                GuardDecision::Redirect(to) => {
                    redirects += 1;
                    if redirects > limit {
                        return Err(RouterError::RedirectLoop { path: to, limit });
                    }
                    tracing::debug!("guard redirected {path} to {to}");
                    path = strip_base(&self.base_path(), &to);
                }
                GuardDecision::Allow => {
                    self.commit(&event, replace);
                    return self
                        .emit(RouterEvent {
                            kind: NavigationEventKind::Navigate,
                            ..event
                        })
                        .await;
                }
            }
        }
    }

    fn still_current(&self, seq: u64, path: &str) -> bool {
        let current = self.is_current(seq);
        if !current {
            tracing::debug!("navigation to {path} superseded");
        }
        current
    }

    fn commit(&self, event: &RouterEvent<H>, replace: bool) {
        if let Some(window) = self.window() {
            let state = HistoryState {
                path: event.path.clone(),
            };
            let url = join_base(&self.base_path(), &event.path);
            if replace {
                window.replace_state(&state, &url);
            } else {
                window.push_state(&state, &url);
            }
        }
        self.inner.committed.set(event.seq);
        *self.inner.current.borrow_mut() = CurrentRoute {
            path: event.path.clone(),
            params: event.params.clone(),
            meta: event.meta.clone(),
            route: event.route.clone(),
        };
    }

    async fn fall_back(&self, path: String, seq: u64) -> Result<(), RouterError> {
        let handler = self.inner.not_found.borrow().clone();
        if handler.is_some() {
            self.inner.committed.set(seq);
            *self.inner.current.borrow_mut() = CurrentRoute {
                path: path.clone(),
                ..Default::default()
            };
        } else {
            tracing::error!("no route matches {path} and no not-found handler is set");
        }
        self.emit(RouterEvent {
            kind: NavigationEventKind::NotFound,
            path,
            params: ParamsMap::new(),
            handler,
            meta: RouteMeta::new(),
            route: None,
            seq,
        })
        .await
    }

    async fn emit(&self, event: RouterEvent<H>) -> Result<(), RouterError> {
        if let Some(window) = self.window() {
            window.dispatch(event.kind, &event.detail());
        }
        let listeners = self
            .inner
            .listeners
            .borrow()
            .iter()
            .filter(|(_, kind, _)| *kind == event.kind)
            .map(|(_, _, listener)| Rc::clone(listener))
            .collect::<Vec<_>>();
        for listener in listeners {
            listener(event.clone()).await.map_err(RouterError::Listener)?;
        }
        Ok(())
    }

    /// Registers an async listener for `kind`. Listeners run in registration
    /// order and the navigation awaits each one; an `Err` is returned from
    /// [`navigate`](Self::navigate).
    pub fn on<F, Fut, E>(&self, kind: NavigationEventKind, listener: F) -> ListenerId
    where
        F: Fn(RouterEvent<H>) -> Fut + 'static,
        Fut: Future<Output = Result<(), E>> + 'static,
        E: Into<BoxError>,
    {
        let id = ListenerId(self.inner.next_listener.get());
        self.inner.next_listener.set(id.0 + 1);
        let listener: Listener<H> = Rc::new(
            move |event| -> LocalBoxFuture<'static, Result<(), BoxError>> {
                let fut = listener(event);
                Box::pin(async move { fut.await.map_err(Into::into) })
            },
        );
        self.inner.listeners.borrow_mut().push((id, kind, listener));
        id
    }

    pub fn off(&self, id: ListenerId) {
        self.inner
            .listeners
            .borrow_mut()
            .retain(|(other, _, _)| *other != id);
    }

    /// Builds the browser URL for the route mapped under the literal
    /// pattern `path`. Returns `Ok(None)` if no such route exists.
    pub fn generate_url(
        &self,
        path: &str,
        params: &ParamsMap,
    ) -> Result<Option<String>, RouterError> {
        let route = match self.inner.routes.borrow().get(path) {
            Some((route, _)) => Rc::clone(route),
            None => return Ok(None),
        };
        let generated = route.generate(params)?;
        Ok(Some(join_base(&self.base_path(), &generated)))
    }

    pub fn current(&self) -> CurrentRoute {
        self.inner.current.borrow().clone()
    }

    pub fn current_path(&self) -> String {
        self.inner.current.borrow().path.clone()
    }

    pub fn current_params(&self) -> ParamsMap {
        self.inner.current.borrow().params.clone()
    }

    pub fn current_meta(&self) -> RouteMeta {
        self.inner.current.borrow().meta.clone()
    }

    pub fn current_route(&self) -> Option<String> {
        self.inner.current.borrow().route.clone()
    }
}
