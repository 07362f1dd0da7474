#![forbid(unsafe_code)]

//! # sprig
//!
//! A small client-side application shell: a path [`Router`](sprig_router::Router)
//! whose navigations are rendered as [`View`]s, optionally nested inside
//! layouts, through swappable view stacks and binders.
//!
//! ```no_run
//! use sprig::prelude::*;
//! use std::{borrow::Cow, rc::Rc};
//!
//! #[derive(Default)]
//! struct UserView;
//!
//! #[async_trait(?Send)]
//! impl View for UserView {
//!     fn template(&self) -> Cow<'static, str> {
//!         r#"<section class="user"></section>"#.into()
//!     }
//!
//!     async fn params_changed(
//!         &self,
//!         host: &ViewHost,
//!         params: &ParamsMap,
//!         _old: &ParamsMap,
//!     ) -> Result<(), BoxError> {
//!         host.set_state("id", params.get("id")).await?;
//!         Ok(())
//!     }
//! }
//!
//! # async fn run(
//! #     window: Rc<dyn WindowLike>,
//! #     document: Rc<dyn DocumentLike>,
//! # ) -> Result<(), AppError> {
//! let app = App::new(window, document);
//! app.register_view("user", ViewClass::of::<UserView>());
//! app.map("/user/:id", "user", RouteOptions::new())?;
//! app.start(None).await?;
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod binder;
mod error;
pub mod handler;
mod registry;
pub mod stack;
pub mod view;

pub use app::App;
pub use async_trait::async_trait;
pub use error::*;
pub use handler::Handler;
pub use sprig_config as config;
pub use sprig_dom as dom;
pub use sprig_router as router;
pub use view::{HostContext, State, View, ViewClass, ViewHost, ViewOptions};

pub mod prelude {
    pub use crate::{
        app::App,
        async_trait,
        binder::{Binder, BinderFactory, InertBinder},
        error::{AppError, ViewError},
        handler::Handler,
        stack::{BasicStacks, BasicViewStack, StackFactory, ViewStack},
        view::{HostContext, State, View, ViewClass, ViewHost, ViewOptions},
    };
    pub use sprig_config::SprigOptions;
    pub use sprig_dom::{DocumentLike, Node, NodeId, WindowLike};
    pub use sprig_router::{
        params_map, BoxError, GuardDecision, NavigationEventKind, ParamsMap,
        RouteOptions, RouterError,
    };
    pub use serde_json::{json, Value};
}
