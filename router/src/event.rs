use crate::{matching::RouteMeta, params::ParamsMap, BoxError};
use futures::future::LocalBoxFuture;
use sprig_dom::{NavigationDetail, NavigationEventKind};
use std::{fmt::Display, rc::Rc};

/// A navigation event as seen by router listeners.
#[derive(Debug, Clone)]
pub struct RouterEvent<H> {
    pub kind: NavigationEventKind,
    /// The router path, without base.
    pub path: String,
    pub params: ParamsMap,
    /// The mapped handler, or the not-found handler for
    /// [`NavigationEventKind::NotFound`].
    pub handler: Option<H>,
    pub meta: RouteMeta,
    /// The pattern of the matched route.
    pub route: Option<String>,
    /// Sequence token of the navigation that produced this event. See
    /// [`Router::is_current`](crate::Router::is_current).
    pub seq: u64,
}

impl<H: Display> RouterEvent<H> {
    /// The payload dispatched on the window.
    pub fn detail(&self) -> NavigationDetail {
        NavigationDetail {
            path: self.path.clone(),
            params: self.params.to_index_map(),
            handler: self.handler.as_ref().map(ToString::to_string),
            meta: self.meta.to_value(),
        }
    }
}

pub(crate) type Listener<H> =
    Rc<dyn Fn(RouterEvent<H>) -> LocalBoxFuture<'static, Result<(), BoxError>>>;
