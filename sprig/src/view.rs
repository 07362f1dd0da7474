//! Views: units of UI with a template, a state map and lifecycle hooks.
//!
//! A [`View`] only describes itself. The [`ViewHost`] wrapping it owns the
//! element, the state and the binder, and runs the hooks at the right time:
//!
//! 1. the template is injected into the content root (light DOM or a shadow
//!    root),
//! 2. state is initialized from [`View::initial_state`],
//! 3. a binder is created over (content root, state, transition class),
//! 4. [`View::before_mount`] runs, the binder is bound, [`View::mounted`]
//!    runs.
//!
//! Unmounting runs [`View::before_unmount`], destroys the binder and runs
//! [`View::unmounted`]. A host can be mounted again afterwards.

use crate::{
    app::App,
    binder::{Binder, BinderFactory, InertBinder},
    error::ViewError,
};
use async_trait::async_trait;
use convert_case::{Case, Casing};
use indexmap::IndexMap;
use serde_json::Value;
use sprig_config::SprigOptions;
use sprig_dom::{Node, NodeId};
use sprig_router::{BoxError, ParamsMap};
use std::{
    any::{type_name, Any, TypeId},
    borrow::Cow,
    cell::{Cell, RefCell},
    fmt,
    future::Future,
    rc::Rc,
};
use typed_builder::TypedBuilder;

/// A view's state: string keys to JSON values, in insertion order.
pub type State = IndexMap<String, Value>;

/// Per-view overrides of the app-wide rendering options.
///
/// Unset fields fall back to [`SprigOptions`].
#[derive(TypedBuilder, Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewOptions {
    /// Render into a shadow root instead of the element itself.
    #[builder(default, setter(strip_option))]
    pub shadow: Option<bool>,
    /// Re-render through the binder on every state or params change.
    #[builder(default, setter(strip_option))]
    pub auto_update: Option<bool>,
    #[builder(default, setter(strip_option, into))]
    pub transition_class: Option<String>,
    /// Require the template to produce exactly one root element.
    #[builder(default)]
    pub single_root: bool,
    /// For layouts: selector of the element nested views render into.
    #[builder(default, setter(strip_option, into))]
    pub outlet: Option<String>,
}

/// A unit of UI.
///
/// Every hook is optional and may be asynchronous. Hooks of one host run one
/// after another, never concurrently. An `Err` from a hook aborts the
/// operation that triggered it and is returned to its caller.
#[async_trait(?Send)]
pub trait View: Any {
    /// The markup injected into the content root on mount.
    fn template(&self) -> Cow<'static, str>;

    fn initial_state(&self) -> State {
        State::new()
    }

    fn options(&self) -> ViewOptions {
        ViewOptions::default()
    }

    async fn before_mount(&self, _host: &ViewHost) -> Result<(), BoxError> {
        Ok(())
    }

    async fn mounted(&self, _host: &ViewHost) -> Result<(), BoxError> {
        Ok(())
    }

    async fn before_unmount(&self, _host: &ViewHost) -> Result<(), BoxError> {
        Ok(())
    }

    async fn unmounted(&self, _host: &ViewHost) -> Result<(), BoxError> {
        Ok(())
    }

    /// Called once per key whose value actually changed.
    async fn state_changed(
        &self,
        _host: &ViewHost,
        _key: &str,
        _value: &Value,
        _old: Option<&Value>,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    /// Called instead of a remount when a navigation reuses this view with
    /// new route parameters.
    async fn params_changed(
        &self,
        _host: &ViewHost,
        _params: &ParamsMap,
        _old: &ParamsMap,
    ) -> Result<(), BoxError> {
        Ok(())
    }
}

type ViewFactory = Rc<dyn Fn() -> Box<dyn View>>;

/// A view type, as registered with an app or named in a handler.
///
/// Two classes are equal when they construct the same Rust type.
#[derive(Clone)]
pub struct ViewClass {
    type_id: TypeId,
    name: &'static str,
    tag: Cow<'static, str>,
    factory: ViewFactory,
}

impl fmt::Debug for ViewClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewClass")
            .field("name", &self.name)
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}

impl PartialEq for ViewClass {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ViewClass {}

fn short_type_name<V>() -> &'static str {
    let full = type_name::<V>();
    let path = full.split('<').next().unwrap_or(full);
    path.rsplit("::").next().unwrap_or(path)
}

/// Custom element names need a hyphen.
fn tag_for(name: &str) -> String {
    let tag = name.to_case(Case::Kebab);
    if tag.contains('-') {
        tag
    } else {
        format!("{tag}-view")
    }
}

impl ViewClass {
    /// The class of `V`, constructed with `V::default()`.
    pub fn of<V: View + Default>() -> Self {
        Self::new(V::default)
    }

    /// The class of `V`, constructed with `factory`.
    pub fn new<V: View>(factory: impl Fn() -> V + 'static) -> Self {
        let name = short_type_name::<V>();
        Self {
            type_id: TypeId::of::<V>(),
            name,
            tag: Cow::Owned(tag_for(name)),
            factory: Rc::new(move || Box::new(factory()) as Box<dyn View>),
        }
    }

    /// Overrides the derived custom-element tag.
    pub fn with_tag(mut self, tag: impl Into<Cow<'static, str>>) -> Self {
        self.tag = tag.into();
        self
    }

    /// The unqualified Rust type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The custom-element tag: the kebab-cased type name, with a `-view`
    /// suffix when that alone contains no hyphen.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    fn instantiate(&self) -> Box<dyn View> {
        (self.factory)()
    }
}

/// What a [`ViewHost`] needs from its surroundings.
#[derive(Clone)]
pub struct HostContext {
    pub binders: Rc<dyn BinderFactory>,
    pub options: Rc<SprigOptions>,
    /// Root element of the owning app, if any.
    pub app_root: Option<NodeId>,
}

impl Default for HostContext {
    fn default() -> Self {
        Self {
            binders: Rc::new(InertBinder),
            options: Rc::new(SprigOptions::default()),
            app_root: None,
        }
    }
}

impl fmt::Debug for HostContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostContext")
            .field("options", &self.options)
            .field("app_root", &self.app_root)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
struct Resolved {
    shadow: bool,
    transition_class: String,
    single_root: bool,
    outlet: String,
}

/// A live instance of a [`ViewClass`].
pub struct ViewHost {
    class: ViewClass,
    view: Box<dyn View>,
    element: Node,
    content: RefCell<Option<Node>>,
    options: Resolved,
    binders: Rc<dyn BinderFactory>,
    binder: RefCell<Option<Box<dyn Binder>>>,
    state: RefCell<State>,
    initialized: Cell<bool>,
    auto_update: Cell<bool>,
    params: RefCell<ParamsMap>,
    old_params: RefCell<ParamsMap>,
    route: RefCell<Option<String>>,
    app_root: Option<NodeId>,
}

impl fmt::Debug for ViewHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewHost")
            .field("class", &self.class)
            .field("element", &self.element.id())
            .field("initialized", &self.initialized.get())
            .field("state", &self.state.borrow())
            .field("params", &self.params.borrow())
            .finish_non_exhaustive()
    }
}

impl ViewHost {
    /// Instantiates `class` on `element`. Nothing is rendered until
    /// [`mount`](Self::mount).
    pub fn new(class: &ViewClass, element: Node, cx: HostContext) -> Rc<Self> {
        let view = class.instantiate();
        let own = view.options();
        let defaults = &cx.options;
        let options = Resolved {
            shadow: own.shadow.unwrap_or(defaults.shadow_dom),
            transition_class: own
                .transition_class
                .unwrap_or_else(|| defaults.transition_class.clone()),
            single_root: own.single_root,
            outlet: own
                .outlet
                .unwrap_or_else(|| defaults.outlet_selector.clone()),
        };
        Rc::new(Self {
            class: class.clone(),
            view,
            element,
            content: Default::default(),
            options,
            binders: cx.binders,
            binder: Default::default(),
            state: Default::default(),
            initialized: Cell::new(false),
            auto_update: Cell::new(own.auto_update.unwrap_or(defaults.auto_update)),
            params: Default::default(),
            old_params: Default::default(),
            route: Default::default(),
            app_root: cx.app_root,
        })
    }

    async fn hook(
        &self,
        hook: &'static str,
        fut: impl Future<Output = Result<(), BoxError>>,
    ) -> Result<(), ViewError> {
        tracing::trace!("<{}> {hook}", self.class.tag());
        fut.await.map_err(|source| ViewError::Hook {
            tag: self.class.tag().to_string(),
            hook,
            source,
        })
    }

    /// Renders the template, initializes state and binds it. Does nothing if
    /// already mounted.
    pub async fn mount(&self) -> Result<(), ViewError> {
        if self.initialized.get() {
            return Ok(());
        }

        let root = if self.options.shadow {
            self.element.attach_shadow()
        } else {
            Rc::clone(&self.element)
        };
        root.set_inner_html(&self.view.template());
        if self.options.single_root {
            let roots = root.children().len();
            if roots != 1 {
                return Err(ViewError::MalformedTemplate {
                    tag: self.class.tag().to_string(),
                    roots,
                });
            }
        }

        *self.state.borrow_mut() = self.view.initial_state();
        let mut binder = self.binders.create(
            &root,
            &self.state.borrow(),
            &self.options.transition_class,
        );
        binder.set_auto_update(self.auto_update.get());
        *self.binder.borrow_mut() = Some(binder);
        *self.content.borrow_mut() = Some(root);
        self.initialized.set(true);

        self.hook("before_mount", self.view.before_mount(self)).await?;
        let bound = match self.binder.borrow_mut().as_mut() {
            Some(binder) => binder.bind(),
            None => Ok(()),
        };
        bound.map_err(|source| ViewError::Binder {
            tag: self.class.tag().to_string(),
            source,
        })?;
        self.hook("mounted", self.view.mounted(self)).await
    }

    /// Tears the view down. Does nothing if not mounted.
    pub async fn unmount(&self) -> Result<(), ViewError> {
        if !self.initialized.get() {
            return Ok(());
        }
        self.hook("before_unmount", self.view.before_unmount(self))
            .await?;
        let binder = self.binder.borrow_mut().take();
        if let Some(mut binder) = binder {
            binder.destroy();
        }
        self.initialized.set(false);
        self.hook("unmounted", self.view.unmounted(self)).await
    }

    pub fn is_mounted(&self) -> bool {
        self.initialized.get()
    }

    pub async fn set_state(
        &self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<(), ViewError> {
        let mut update = State::new();
        update.insert(key.into(), value.into());
        self.set_states(update).await
    }

    /// Applies `update`, calling [`View::state_changed`] for each key whose
    /// value changed, then re-renders once if auto-update is on.
    pub async fn set_states(&self, update: State) -> Result<(), ViewError> {
        let mut changed = false;
        for (key, value) in update {
            let old = self.state.borrow_mut().insert(key.clone(), value.clone());
            if old.as_ref() == Some(&value) {
                continue;
            }
            changed = true;
            self.hook(
                "state_changed",
                self.view.state_changed(self, &key, &value, old.as_ref()),
            )
            .await?;
        }
        if changed && self.auto_update.get() {
            self.update(true);
        }
        Ok(())
    }

    /// Re-renders through the binder.
    pub fn update(&self, animate: bool) {
        if let Some(binder) = self.binder.borrow_mut().as_mut() {
            binder.update(&self.state.borrow(), animate);
        }
    }

    /// Replaces the route parameters of a reused view.
    pub async fn update_params(&self, params: ParamsMap) -> Result<(), ViewError> {
        let old = self.params.replace(params.clone());
        *self.old_params.borrow_mut() = old.clone();
        self.hook(
            "params_changed",
            self.view.params_changed(self, &params, &old),
        )
        .await?;
        if self.auto_update.get() {
            self.update(true);
        }
        Ok(())
    }

    pub(crate) fn assign_route(&self, params: ParamsMap, route: Option<String>) {
        *self.params.borrow_mut() = params;
        self.set_route(route);
    }

    pub(crate) fn set_route(&self, route: Option<String>) {
        *self.route.borrow_mut() = route;
    }

    pub fn state(&self) -> State {
        self.state.borrow().clone()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.state.borrow().get(key).cloned()
    }

    pub fn params(&self) -> ParamsMap {
        self.params.borrow().clone()
    }

    /// The parameters before the last [`update_params`](Self::update_params).
    pub fn old_params(&self) -> ParamsMap {
        self.old_params.borrow().clone()
    }

    /// The route pattern this view was navigated to with.
    pub fn route(&self) -> Option<String> {
        self.route.borrow().clone()
    }

    /// The app this view was rendered by.
    pub fn app(&self) -> Option<App> {
        self.app_root.and_then(App::for_node)
    }

    pub fn set_auto_update(&self, on: bool) {
        self.auto_update.set(on);
        if let Some(binder) = self.binder.borrow_mut().as_mut() {
            binder.set_auto_update(on);
        }
    }

    pub fn auto_update(&self) -> bool {
        self.auto_update.get()
    }

    pub fn class(&self) -> &ViewClass {
        &self.class
    }

    /// The custom element hosting the view.
    pub fn element(&self) -> &Node {
        &self.element
    }

    /// Where the template was rendered: the element or its shadow root.
    pub fn content_root(&self) -> Option<Node> {
        self.content.borrow().clone()
    }

    /// The outlet selector, for layouts.
    pub fn outlet_selector(&self) -> &str {
        &self.options.outlet
    }

    /// The wrapped view, if it is a `V`.
    pub fn view_as<V: View>(&self) -> Option<&V> {
        let view: &dyn Any = &*self.view;
        view.downcast_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct UserView;

    impl View for UserView {
        fn template(&self) -> Cow<'static, str> {
            "<div></div>".into()
        }
    }

    #[derive(Default)]
    struct Home;

    impl View for Home {
        fn template(&self) -> Cow<'static, str> {
            "<main></main>".into()
        }
    }

    #[test]
    fn tags_are_kebab_cased_with_hyphen() {
        assert_eq!(ViewClass::of::<UserView>().tag(), "user-view");
        assert_eq!(ViewClass::of::<Home>().tag(), "home-view");
        assert_eq!(ViewClass::of::<Home>().name(), "Home");
        assert_eq!(
            ViewClass::of::<Home>().with_tag("app-home").tag(),
            "app-home"
        );
    }

    #[test]
    fn class_identity_is_the_type() {
        assert_eq!(ViewClass::of::<Home>(), ViewClass::new(|| Home));
        assert_ne!(ViewClass::of::<Home>(), ViewClass::of::<UserView>());
    }
}
