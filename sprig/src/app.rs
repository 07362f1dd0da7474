use crate::{
    binder::{BinderFactory, InertBinder},
    error::AppError,
    handler::Handler,
    registry,
    stack::{BasicStacks, StackFactory, ViewStack, VIEW_STACK_TAG},
    view::{HostContext, ViewClass, ViewHost},
};
use indexmap::IndexMap;
use sprig_config::SprigOptions;
use sprig_dom::{DocumentLike, Node, NodeId, WindowLike};
use sprig_router::{
    LayoutMeta, NavigationEventKind, ParamsMap, RouteOptions, Router,
    RouterEvent,
};
use std::{cell::RefCell, fmt, rc::Rc};

pub(crate) struct AppInner {
    window: Rc<dyn WindowLike>,
    document: Rc<dyn DocumentLike>,
    options: RefCell<Rc<SprigOptions>>,
    binders: RefCell<Rc<dyn BinderFactory>>,
    stacks: RefCell<Rc<dyn StackFactory>>,
    router: Router<Handler>,
    views: RefCell<IndexMap<String, ViewClass>>,
    layouts: RefCell<IndexMap<String, ViewClass>>,
    default_layout: RefCell<Option<Handler>>,
    root: RefCell<Option<Node>>,
    top: RefCell<Option<Rc<dyn ViewStack>>>,
    // the stack the active view lives in
    view_stack: RefCell<Option<Rc<dyn ViewStack>>>,
    layout_stack: RefCell<Option<Rc<dyn ViewStack>>>,
    active_view: RefCell<Option<Rc<ViewHost>>>,
    active_layout: RefCell<Option<Rc<ViewHost>>>,
    current_route: RefCell<Option<String>>,
}

impl Drop for AppInner {
    fn drop(&mut self) {
        if let Some(root) = self.root.get_mut() {
            registry::unregister(root.id());
        }
        self.router.detach();
    }
}

/// Connects a [`Router`] to views and layouts rendered through view stacks.
///
/// Cloning an app yields another handle to the same app.
#[derive(Clone)]
pub struct App {
    inner: Rc<AppInner>,
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("router", &self.inner.router)
            .field("views", &self.inner.views.borrow().keys().collect::<Vec<_>>())
            .field(
                "layouts",
                &self.inner.layouts.borrow().keys().collect::<Vec<_>>(),
            )
            .field("active_view", &self.inner.active_view.borrow())
            .field("active_layout", &self.inner.active_layout.borrow())
            .finish_non_exhaustive()
    }
}

impl App {
    pub fn new(window: Rc<dyn WindowLike>, document: Rc<dyn DocumentLike>) -> Self {
        let app = Self {
            inner: Rc::new(AppInner {
                window,
                document,
                options: RefCell::new(Rc::new(SprigOptions::default())),
                binders: RefCell::new(Rc::new(InertBinder)),
                stacks: RefCell::new(Rc::new(BasicStacks)),
                router: Router::new(),
                views: Default::default(),
                layouts: Default::default(),
                default_layout: Default::default(),
                root: Default::default(),
                top: Default::default(),
                view_stack: Default::default(),
                layout_stack: Default::default(),
                active_view: Default::default(),
                active_layout: Default::default(),
                current_route: Default::default(),
            }),
        };
        app.listen();
        app
    }

    fn listen(&self) {
        let router = &self.inner.router;

        let app = Rc::downgrade(&self.inner);
        router.on(NavigationEventKind::Navigate, move |event| {
            let app = app.upgrade().map(|inner| App { inner });
            async move {
                match app {
                    Some(app) => app.show(event).await,
                    None => Ok(()),
                }
            }
        });

        let app = Rc::downgrade(&self.inner);
        router.on(NavigationEventKind::NotFound, move |event| {
            let app = app.upgrade().map(|inner| App { inner });
            async move {
                match app {
                    Some(app) => app.show_not_found(event).await,
                    None => Ok(()),
                }
            }
        });
    }

    /// Replaces the options. Base path, redirect limit and default layout
    /// are applied right away.
    pub fn with_options(self, options: SprigOptions) -> Self {
        if let Some(base) = &options.base_path {
            self.inner.router.set_base_path(base);
        }
        self.inner.router.set_max_redirects(options.max_redirects);
        *self.inner.default_layout.borrow_mut() =
            options.default_layout.clone().map(Handler::from);
        *self.inner.options.borrow_mut() = Rc::new(options);
        self
    }

    pub fn with_binders(self, binders: impl BinderFactory + 'static) -> Self {
        *self.inner.binders.borrow_mut() = Rc::new(binders);
        self
    }

    pub fn with_stacks(self, stacks: impl StackFactory + 'static) -> Self {
        *self.inner.stacks.borrow_mut() = Rc::new(stacks);
        self
    }

    /// The app whose root element is `root`.
    pub fn for_node(root: NodeId) -> Option<App> {
        registry::lookup(root).map(|inner| App { inner })
    }

    pub fn options(&self) -> Rc<SprigOptions> {
        Rc::clone(&self.inner.options.borrow())
    }

    pub fn router(&self) -> &Router<Handler> {
        &self.inner.router
    }

    fn define(&self, class: &ViewClass) {
        if self.inner.document.define_element(class.tag()) {
            tracing::debug!("defined <{}> for {}", class.tag(), class.name());
        }
    }

    pub fn register_view(&self, name: impl Into<String>, class: ViewClass) -> &Self {
        self.define(&class);
        self.inner.views.borrow_mut().insert(name.into(), class);
        self
    }

    pub fn register_views<I, N>(&self, views: I) -> &Self
    where
        I: IntoIterator<Item = (N, ViewClass)>,
        N: Into<String>,
    {
        for (name, class) in views {
            self.register_view(name, class);
        }
        self
    }

    pub fn register_layout(&self, name: impl Into<String>, class: ViewClass) -> &Self {
        self.define(&class);
        self.inner.layouts.borrow_mut().insert(name.into(), class);
        self
    }

    pub fn register_layouts<I, N>(&self, layouts: I) -> &Self
    where
        I: IntoIterator<Item = (N, ViewClass)>,
        N: Into<String>,
    {
        for (name, class) in layouts {
            self.register_layout(name, class);
        }
        self
    }

    /// Sets the layout used by routes whose metadata does not choose one.
    pub fn set_default_layout(&self, layout: Option<Handler>) -> &Self {
        *self.inner.default_layout.borrow_mut() = layout;
        self
    }

    pub fn map(
        &self,
        path: &str,
        handler: impl Into<Handler>,
        options: RouteOptions,
    ) -> Result<&Self, AppError> {
        self.inner.router.map(path, handler.into(), options)?;
        Ok(self)
    }

    pub fn not_found(&self, handler: impl Into<Handler>) -> &Self {
        self.inner.router.not_found(handler.into());
        self
    }

    /// Renders into the element matching `root_selector` (or the configured
    /// one) and resolves the current location.
    pub async fn start(&self, root_selector: Option<&str>) -> Result<(), AppError> {
        if self.inner.router.is_started() {
            tracing::warn!("app already started");
            return Ok(());
        }

        let selector = match root_selector {
            Some(selector) => selector.to_string(),
            None => self.options().root_selector.clone(),
        };
        let document = Rc::clone(&self.inner.document);
        let root = document
            .query_selector(&selector)
            .ok_or(AppError::RootNotFound(selector))?;

        let existing = root
            .children()
            .into_iter()
            .find(|child| child.tag_name() == VIEW_STACK_TAG);
        let element = match existing {
            Some(element) => element,
            None => {
                let element = document.create_element(VIEW_STACK_TAG);
                root.append_child(&element);
                element
            }
        };
        let top = self.attach_stack(element);

        registry::register(root.id(), Rc::downgrade(&self.inner));
        *self.inner.root.borrow_mut() = Some(root);
        *self.inner.top.borrow_mut() = Some(top);

        self.inner
            .router
            .attach(Rc::clone(&self.inner.window), document);
        self.inner.router.start().await?;
        Ok(())
    }

    pub async fn navigate(&self, path: &str) -> Result<(), AppError> {
        self.inner.router.navigate(path, false).await?;
        Ok(())
    }

    /// Returns to the previous view of the stack the active view lives in.
    /// Resolves to `false` when there is nothing to go back to.
    pub async fn go_back(&self) -> Result<bool, AppError> {
        let stack = self.inner.view_stack.borrow().clone();
        let Some(stack) = stack.filter(|stack| stack.can_go_back()) else {
            return Ok(false);
        };
        let Some(revealed) = stack.complete().await.map_err(AppError::Stack)?
        else {
            return Ok(false);
        };
        revealed.mount().await?;
        let popped = self.inner.active_view.replace(Some(revealed));
        if let Some(popped) = popped {
            popped.unmount().await?;
        }
        Ok(true)
    }

    pub fn root(&self) -> Option<Node> {
        self.inner.root.borrow().clone()
    }

    pub fn active_view(&self) -> Option<Rc<ViewHost>> {
        self.inner.active_view.borrow().clone()
    }

    pub fn active_layout(&self) -> Option<Rc<ViewHost>> {
        self.inner.active_layout.borrow().clone()
    }

    /// The pattern of the route last navigated to; `None` after not-found.
    pub fn current_route(&self) -> Option<String> {
        self.inner.current_route.borrow().clone()
    }

    fn attach_stack(&self, element: Node) -> Rc<dyn ViewStack> {
        let stacks = Rc::clone(&self.inner.stacks.borrow());
        stacks.attach(element, self.options().max_stack_depth)
    }

    fn top(&self) -> Result<Rc<dyn ViewStack>, AppError> {
        self.inner.top.borrow().clone().ok_or(AppError::NotStarted)
    }

    fn superseded(&self, seq: u64) -> bool {
        let superseded = !self.inner.router.is_current(seq);
        if superseded {
            tracing::debug!("navigation {seq} superseded while rendering");
        }
        superseded
    }

    fn create_host(&self, class: &ViewClass) -> Rc<ViewHost> {
        let element = self.inner.document.create_element(class.tag());
        let cx = HostContext {
            binders: Rc::clone(&self.inner.binders.borrow()),
            options: self.options(),
            app_root: self.inner.root.borrow().as_ref().map(|root| root.id()),
        };
        ViewHost::new(class, element, cx)
    }

    fn resolve_view(&self, handler: &Handler) -> Option<ViewClass> {
        match handler {
            Handler::View(class) => {
                self.define(class);
                Some(class.clone())
            }
            Handler::Named(name) => self.inner.views.borrow().get(&**name).cloned(),
        }
    }

    fn resolve_layout(&self, handler: &Handler) -> Option<ViewClass> {
        match handler {
            Handler::View(class) => {
                self.define(class);
                Some(class.clone())
            }
            Handler::Named(name) => {
                self.inner.layouts.borrow().get(&**name).cloned()
            }
        }
    }

    /// Hands new params to the active view if it is a `class`.
    async fn reuse(
        &self,
        class: &ViewClass,
        params: &ParamsMap,
        route: Option<String>,
    ) -> Result<bool, AppError> {
        let active = self.inner.active_view.borrow().clone();
        match active {
            Some(active) if active.class() == class => {
                active.set_route(route);
                active.update_params(params.clone()).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn show(&self, event: RouterEvent<Handler>) -> Result<(), AppError> {
        let RouterEvent {
            path,
            params,
            handler,
            meta,
            route,
            seq,
            ..
        } = event;
        let route = route.or_else(|| self.inner.router.resolve(&path));
        *self.inner.current_route.borrow_mut() = route.clone();

        let Some(handler) = handler else {
            return Ok(());
        };
        let Some(class) = self.resolve_view(&handler) else {
            tracing::error!("no view registered as {handler:?} (navigating to {path})");
            return Ok(());
        };
        if self.reuse(&class, &params, route.clone()).await? {
            return Ok(());
        }

        let layout = match meta.layout() {
            LayoutMeta::Named(name) => Some(Handler::from(name.to_string())),
            LayoutMeta::None => None,
            LayoutMeta::Inherit => self.inner.default_layout.borrow().clone(),
        };
        let layout = match layout {
            Some(handler) => match self.resolve_layout(&handler) {
                Some(class) => Some(class),
                None => {
                    tracing::error!(
                        "no layout registered as {handler:?} (navigating to {path})"
                    );
                    return Ok(());
                }
            },
            None => None,
        };
        let effect = meta
            .effect()
            .map(str::to_string)
            .or_else(|| self.options().default_effect.clone());

        let view = self.create_host(&class);
        view.assign_route(params, route);
        match layout {
            Some(layout) => {
                self.show_in_layout(&layout, view, effect.as_deref(), seq)
                    .await
            }
            None => self.show_at_top(view, effect.as_deref(), seq).await,
        }
    }

    async fn show_not_found(
        &self,
        event: RouterEvent<Handler>,
    ) -> Result<(), AppError> {
        let Some(handler) = event.handler else {
            return Ok(());
        };
        *self.inner.current_route.borrow_mut() = None;
        let Some(class) = self.resolve_view(&handler) else {
            tracing::error!(
                "no view registered as {handler:?} (not found: {})",
                event.path
            );
            return Ok(());
        };
        if self.reuse(&class, &event.params, None).await? {
            return Ok(());
        }

        let view = self.create_host(&class);
        view.assign_route(event.params, None);
        let effect = self.options().default_effect.clone();
        self.show_at_top(view, effect.as_deref(), event.seq).await
    }

    async fn show_at_top(
        &self,
        view: Rc<ViewHost>,
        effect: Option<&str>,
        seq: u64,
    ) -> Result<(), AppError> {
        let top = self.top()?;
        if !self.transition(&top, view, effect, seq).await? {
            return Ok(());
        }
        self.inner.layout_stack.borrow_mut().take();
        let layout = self.inner.active_layout.borrow_mut().take();
        if let Some(layout) = layout {
            layout.unmount().await?;
        }
        Ok(())
    }

    async fn show_in_layout(
        &self,
        class: &ViewClass,
        view: Rc<ViewHost>,
        effect: Option<&str>,
        seq: u64,
    ) -> Result<(), AppError> {
        let same_layout = self
            .inner
            .active_layout
            .borrow()
            .as_ref()
            .is_some_and(|layout| layout.class() == class);
        let existing = self.inner.layout_stack.borrow().clone();

        let stack = match existing {
            Some(stack) if same_layout => stack,
            _ => {
                let top = self.top()?;
                let layout = self.create_host(class);
                top.begin(Rc::clone(&layout), effect)
                    .await
                    .map_err(AppError::Stack)?;
                let outlet = match layout.mount().await {
                    Ok(()) => self.outlet_stack(&layout),
                    Err(err) => Err(err.into()),
                };
                let outlet = match outlet {
                    Ok(outlet) => outlet,
                    Err(err) => {
                        roll_back(&top, &layout).await?;
                        return Err(err);
                    }
                };
                if self.superseded(seq) {
                    return roll_back(&top, &layout).await;
                }
                let stack = self.attach_stack(outlet);

                // the active view belonged to the previous layout
                let previous = self.inner.active_view.borrow_mut().take();
                if let Some(previous) = previous {
                    previous.unmount().await?;
                }
                let previous = self.inner.active_layout.replace(Some(layout));
                *self.inner.layout_stack.borrow_mut() = Some(Rc::clone(&stack));
                if let Some(previous) = previous {
                    previous.unmount().await?;
                }
                stack
            }
        };
        self.transition(&stack, view, effect, seq).await?;
        Ok(())
    }

    /// Finds the stack element inside a layout's outlet, creating it if the
    /// outlet is not one itself.
    fn outlet_stack(&self, layout: &ViewHost) -> Result<Node, AppError> {
        let content = layout
            .content_root()
            .unwrap_or_else(|| Rc::clone(layout.element()));
        let selector = layout.outlet_selector();
        let outlet = content.query_selector(selector).ok_or_else(|| {
            AppError::MissingOutlet {
                layout: layout.class().tag().to_string(),
                selector: selector.to_string(),
            }
        })?;
        if outlet.tag_name() == VIEW_STACK_TAG {
            return Ok(outlet);
        }
        if let Some(stack) = outlet
            .children()
            .into_iter()
            .find(|child| child.tag_name() == VIEW_STACK_TAG)
        {
            return Ok(stack);
        }
        let stack = self.inner.document.create_element(VIEW_STACK_TAG);
        outlet.append_child(&stack);
        Ok(stack)
    }

    /// Shows `view` in `stack` and makes it the active view. Returns `false`
    /// if a newer navigation took over while the view was mounting.
    async fn transition(
        &self,
        stack: &Rc<dyn ViewStack>,
        view: Rc<ViewHost>,
        effect: Option<&str>,
        seq: u64,
    ) -> Result<bool, AppError> {
        stack
            .begin(Rc::clone(&view), effect)
            .await
            .map_err(AppError::Stack)?;
        if let Err(err) = view.mount().await {
            roll_back(stack, &view).await?;
            return Err(err.into());
        }
        if self.superseded(seq) {
            roll_back(stack, &view).await?;
            return Ok(false);
        }
        let previous = self.inner.active_view.replace(Some(view));
        *self.inner.view_stack.borrow_mut() = Some(Rc::clone(stack));
        if let Some(previous) = previous {
            previous.unmount().await?;
        }
        Ok(true)
    }
}

/// Takes a host that never became active back out of `stack`, showing
/// whatever it covered again.
async fn roll_back(
    stack: &Rc<dyn ViewStack>,
    host: &Rc<ViewHost>,
) -> Result<(), AppError> {
    stack.discard(host);
    host.unmount().await?;
    Ok(())
}
