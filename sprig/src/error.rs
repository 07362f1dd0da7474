use sprig_router::{BoxError, RouterError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ViewError {
    #[error("template of <{tag}> must have exactly one root element, found {roots}")]
    MalformedTemplate { tag: String, roots: usize },
    #[error("{hook} hook of <{tag}> failed")]
    Hook {
        tag: String,
        hook: &'static str,
        #[source]
        source: BoxError,
    },
    #[error("binder for <{tag}> failed")]
    Binder {
        tag: String,
        #[source]
        source: BoxError,
    },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("no element matches root selector {0:?}")]
    RootNotFound(String),
    #[error("the app has not been started")]
    NotStarted,
    #[error("layout <{layout}> has no element matching outlet selector {selector:?}")]
    MissingOutlet { layout: String, selector: String },
    #[error(transparent)]
    Router(#[from] RouterError),
    #[error(transparent)]
    View(#[from] ViewError),
    #[error("view stack transition failed")]
    Stack(#[source] BoxError),
}
