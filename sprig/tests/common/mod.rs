#![allow(dead_code)]

use sprig::prelude::*;
use sprig::dom::memory::{MemoryDocument, MemoryWindow};
use std::{borrow::Cow, cell::RefCell, rc::Rc};

thread_local! {
    static LOG: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

pub fn log(entry: impl Into<String>) {
    LOG.with_borrow_mut(|log| log.push(entry.into()));
}

pub fn take_log() -> Vec<String> {
    LOG.take()
}

/// A view that records construction and every lifecycle hook.
macro_rules! logged_view {
    ($name:ident, $template:expr) => {
        pub struct $name;

        impl Default for $name {
            fn default() -> Self {
                log(concat!(stringify!($name), " new"));
                $name
            }
        }

        #[async_trait(?Send)]
        impl View for $name {
            fn template(&self) -> Cow<'static, str> {
                $template.into()
            }

            async fn before_mount(&self, _host: &ViewHost) -> Result<(), BoxError> {
                log(concat!(stringify!($name), " before_mount"));
                Ok(())
            }

            async fn mounted(&self, _host: &ViewHost) -> Result<(), BoxError> {
                log(concat!(stringify!($name), " mounted"));
                Ok(())
            }

            async fn before_unmount(&self, _host: &ViewHost) -> Result<(), BoxError> {
                log(concat!(stringify!($name), " before_unmount"));
                Ok(())
            }

            async fn unmounted(&self, _host: &ViewHost) -> Result<(), BoxError> {
                log(concat!(stringify!($name), " unmounted"));
                Ok(())
            }

            async fn params_changed(
                &self,
                _host: &ViewHost,
                params: &ParamsMap,
                old: &ParamsMap,
            ) -> Result<(), BoxError> {
                log(format!(
                    "{} params_changed {:?} (was {:?})",
                    stringify!($name),
                    params.get_str("id"),
                    old.get_str("id"),
                ));
                Ok(())
            }
        }
    };
}

logged_view!(Home, "<main><h1></h1></main>");
logged_view!(UserView, r#"<section class="user"><img src="avatar.png"></section>"#);
logged_view!(SettingsView, "<form></form>");
logged_view!(Missing, "<p></p>");
logged_view!(
    MainLayout,
    r#"<div class="shell"><nav></nav><div data-outlet></div></div>"#
);
logged_view!(
    SideLayout,
    r#"<aside></aside><sprig-stack data-outlet></sprig-stack>"#
);
logged_view!(NoOutletLayout, "<div></div>");

#[derive(Default)]
pub struct Broken;

impl View for Broken {
    fn template(&self) -> Cow<'static, str> {
        "<p></p><p></p>".into()
    }

    fn options(&self) -> ViewOptions {
        ViewOptions::builder().single_root(true).build()
    }
}

pub struct Context {
    pub window: Rc<MemoryWindow>,
    pub document: Rc<MemoryDocument>,
}

impl Context {
    pub fn new(url: &str) -> Self {
        Self {
            window: Rc::new(MemoryWindow::new(url)),
            document: Rc::new(MemoryDocument::with_body(r#"<div id="app"></div>"#)),
        }
    }

    pub fn app(&self) -> App {
        App::new(
            Rc::clone(&self.window) as Rc<dyn WindowLike>,
            Rc::clone(&self.document) as Rc<dyn DocumentLike>,
        )
    }

    /// The top-level stack element inside `#app`.
    pub fn top_stack(&self) -> Node {
        let root = self.document.query_selector("#app").expect("#app exists");
        root.children()
            .into_iter()
            .find(|child| child.tag_name() == "sprig-stack")
            .expect("app has a stack element")
    }
}

/// Tag names of `node`'s children.
pub fn child_tags(node: &Node) -> Vec<String> {
    node.children().iter().map(|c| c.tag_name()).collect()
}

/// The stack element inside a layout's outlet.
pub fn outlet_stack(layout: &ViewHost) -> Node {
    let outlet = layout
        .element()
        .query_selector("[data-outlet]")
        .expect("layout has an outlet");
    if outlet.tag_name() == "sprig-stack" {
        return outlet;
    }
    outlet
        .children()
        .into_iter()
        .find(|child| child.tag_name() == "sprig-stack")
        .expect("outlet holds a stack")
}

/// The error a navigation listener failed with.
pub fn listener_error(err: AppError) -> AppError {
    match err {
        AppError::Router(RouterError::Listener(source)) => match source.downcast::<AppError>() {
            Ok(err) => *err,
            Err(other) => panic!("unexpected listener error: {other}"),
        },
        other => panic!("expected a listener error, got {other:?}"),
    }
}

#[derive(Default)]
pub struct Failing;

#[async_trait(?Send)]
impl View for Failing {
    fn template(&self) -> Cow<'static, str> {
        "<div></div>".into()
    }

    async fn mounted(&self, _host: &ViewHost) -> Result<(), BoxError> {
        Err("boom".into())
    }
}
