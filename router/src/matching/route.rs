use super::Matcher;
use crate::{params::ParamsMap, BoxError, RouterError};
use futures::future::LocalBoxFuture;
use serde::Serialize;
use serde_json::{Map, Value};
use std::{fmt, future::Future, rc::Rc};

/// What a guard decided about entering a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Proceed with the navigation.
    Allow,
    /// Abort the navigation, leaving history and router state untouched.
    Deny,
    /// Navigate to this path instead.
    Redirect(String),
}

impl From<bool> for GuardDecision {
    fn from(allow: bool) -> Self {
        if allow {
            GuardDecision::Allow
        } else {
            GuardDecision::Deny
        }
    }
}

impl From<String> for GuardDecision {
    fn from(path: String) -> Self {
        GuardDecision::Redirect(path)
    }
}

impl From<&str> for GuardDecision {
    fn from(path: &str) -> Self {
        GuardDecision::Redirect(path.to_string())
    }
}

/// Anything a guard closure may resolve to.
pub trait IntoGuardResult {
    fn into_guard_result(self) -> Result<GuardDecision, BoxError>;
}

impl IntoGuardResult for GuardDecision {
    fn into_guard_result(self) -> Result<GuardDecision, BoxError> {
        Ok(self)
    }
}

impl IntoGuardResult for bool {
    fn into_guard_result(self) -> Result<GuardDecision, BoxError> {
        Ok(self.into())
    }
}

impl IntoGuardResult for String {
    fn into_guard_result(self) -> Result<GuardDecision, BoxError> {
        Ok(self.into())
    }
}

impl IntoGuardResult for &str {
    fn into_guard_result(self) -> Result<GuardDecision, BoxError> {
        Ok(self.into())
    }
}

impl<T, E> IntoGuardResult for Result<T, E>
where
    T: Into<GuardDecision>,
    E: Into<BoxError>,
{
    fn into_guard_result(self) -> Result<GuardDecision, BoxError> {
        self.map(Into::into).map_err(Into::into)
    }
}

type GuardFn =
    Rc<dyn Fn(ParamsMap) -> LocalBoxFuture<'static, Result<GuardDecision, BoxError>>>;

/// How a route's metadata selects a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMeta<'a> {
    /// No `layout` key: use the app-wide default.
    Inherit,
    /// `layout` is `null` or `false`: render without a layout.
    None,
    /// `layout` names a registered layout.
    Named(&'a str),
}

/// Arbitrary key-value metadata attached to a route.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RouteMeta(Map<String, Value>);

impl RouteMeta {
    pub const LAYOUT: &'static str = "layout";
    pub const EFFECT: &'static str = "effect";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn layout(&self) -> LayoutMeta<'_> {
        match self.0.get(Self::LAYOUT) {
            None => LayoutMeta::Inherit,
            Some(Value::Null) | Some(Value::Bool(false)) => LayoutMeta::None,
            Some(Value::String(name)) => LayoutMeta::Named(name),
            Some(other) => {
                tracing::warn!(
                    "ignoring route layout {other}: expected a name, null or false"
                );
                LayoutMeta::Inherit
            }
        }
    }

    /// The transition-effect hint, if any.
    pub fn effect(&self) -> Option<&str> {
        self.0.get(Self::EFFECT).and_then(Value::as_str)
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

impl From<Map<String, Value>> for RouteMeta {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Optional settings passed along with [`Router::map`](crate::Router::map).
#[derive(Clone, Default)]
pub struct RouteOptions {
    guard: Option<GuardFn>,
    meta: RouteMeta,
}

impl fmt::Debug for RouteOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteOptions")
            .field("guard", &self.guard.is_some())
            .field("meta", &self.meta)
            .finish()
    }
}

impl RouteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the guard consulted before the route is entered.
    ///
    /// The closure resolves to `true`/`false`, a redirect path, a
    /// [`GuardDecision`], or a `Result` of any of these. An `Err` aborts the
    /// navigation and is returned from `navigate`.
    pub fn guard<F, Fut>(mut self, guard: F) -> Self
    where
        F: Fn(ParamsMap) -> Fut + 'static,
        Fut: Future + 'static,
        Fut::Output: IntoGuardResult,
    {
        let guard: GuardFn = Rc::new(
            move |params| -> LocalBoxFuture<'static, Result<GuardDecision, BoxError>> {
                let fut = guard(params);
                Box::pin(async move { fut.await.into_guard_result() })
            },
        );
        self.guard = Some(guard);
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key, value);
        self
    }

    /// Renders the route inside the named layout.
    pub fn layout(self, name: impl Into<String>) -> Self {
        self.meta(RouteMeta::LAYOUT, name.into())
    }

    /// Renders the route without a layout, even if the app has a default.
    pub fn no_layout(self) -> Self {
        self.meta(RouteMeta::LAYOUT, Value::Null)
    }

    /// Sets the transition-effect hint handed to the view stack.
    pub fn effect(self, name: impl Into<String>) -> Self {
        self.meta(RouteMeta::EFFECT, name.into())
    }
}

/// A mapped path pattern together with its guard and metadata.
#[derive(Clone)]
pub struct Route {
    matcher: Matcher,
    guard: Option<GuardFn>,
    meta: RouteMeta,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.matcher.pattern())
            .field("guard", &self.guard.is_some())
            .field("meta", &self.meta)
            .finish()
    }
}

impl Route {
    pub fn new(path: &str, options: RouteOptions) -> Result<Self, RouterError> {
        Ok(Self {
            matcher: Matcher::new(path)?,
            guard: options.guard,
            meta: options.meta,
        })
    }

    /// The raw pattern.
    pub fn path(&self) -> &str {
        self.matcher.pattern()
    }

    pub fn param_names(&self) -> &[String] {
        self.matcher.param_names()
    }

    pub fn meta(&self) -> &RouteMeta {
        &self.meta
    }

    pub fn matches(&self, path: &str) -> Option<ParamsMap> {
        self.matcher.test(path)
    }

    pub fn generate(&self, params: &ParamsMap) -> Result<String, RouterError> {
        self.matcher.generate(params)
    }

    /// Runs the guard. Routes without one always allow entry.
    pub async fn can_enter(
        &self,
        params: &ParamsMap,
    ) -> Result<GuardDecision, BoxError> {
        match &self.guard {
            Some(guard) => guard(params.clone()).await,
            None => Ok(GuardDecision::Allow),
        }
    }
}
