use thiserror::Error;

/// Errors returned by guards and navigation listeners.
pub type BoxError = Box<dyn std::error::Error + 'static>;

#[derive(Error, Debug)]
pub enum RouterError {
    #[error("invalid route pattern {pattern:?}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("could not find parameter {0}")]
    MissingParam(String),
    #[error("guard for {path} failed")]
    Guard {
        path: String,
        #[source]
        source: BoxError,
    },
    #[error("gave up on {path} after {limit} redirects")]
    RedirectLoop { path: String, limit: usize },
    #[error("navigation listener failed")]
    Listener(#[source] BoxError),
    #[error("router is not attached to a window")]
    Detached,
}
