use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// The custom events the router emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationEventKind {
    /// A route matched and its guard is about to run.
    Before,
    /// Navigation completed.
    Navigate,
    /// No route matched.
    NotFound,
}

impl NavigationEventKind {
    /// The DOM event name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            NavigationEventKind::Before => "navigation:before",
            NavigationEventKind::Navigate => "navigation:navigate",
            NavigationEventKind::NotFound => "navigation:notfound",
        }
    }
}

impl fmt::Display for NavigationEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `detail` payload of a navigation event dispatched on the window.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct NavigationDetail {
    /// The router path, without base.
    pub path: String,
    /// Decoded route parameters.
    pub params: IndexMap<String, String>,
    /// A printable name of the handler the route maps to.
    pub handler: Option<String>,
    /// Route metadata.
    pub meta: serde_json::Value,
}
