#![deny(missing_docs)]
#![forbid(unsafe_code)]

//! The browsing context as seen by sprig.
//!
//! The router and app never touch `window` or `document` directly. They are
//! handed a [`WindowLike`] and a [`DocumentLike`] at attach time, which lets
//! the same code run against the real browser (the `web` feature) or against
//! the in-memory doubles in [`memory`].

mod events;
pub mod memory;
mod node;
#[cfg(feature = "web")]
pub mod web;

pub use events::*;
pub use node::*;

use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// The parts of `window.location` the router reads.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BrowserLocation {
    /// Scheme, host and port, e.g. `https://example.com`.
    pub origin: String,
    /// The path, without query string or fragment.
    pub pathname: String,
    /// The raw query string, without the leading `?`.
    pub search: String,
    /// The fragment, including the leading `#` when present.
    pub hash: String,
}

/// The state object written with every history entry.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryState {
    /// The router path (without base) the entry was created for.
    pub path: String,
}

/// Identifies a listener registered on a [`WindowLike`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// A click on an `<a>` element, reduced to what navigation interception needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorClick {
    /// The resolved `href` of the anchor.
    pub href: String,
    /// The `target` attribute, if any.
    pub target: Option<String>,
    /// Whether the anchor carries a `download` attribute.
    pub download: bool,
    /// The `rel` attribute, if any.
    pub rel: Option<String>,
    /// The mouse button that was pressed.
    pub button: i16,
    /// Whether any of meta, alt, ctrl or shift was held.
    pub modifier: bool,
    /// Whether some other handler already prevented the default action.
    pub default_prevented: bool,
}

impl AnchorClick {
    /// A plain primary-button click on a link to `href`.
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            target: None,
            download: false,
            rel: None,
            button: 0,
            modifier: false,
            default_prevented: false,
        }
    }
}

/// Listener for forward/back navigation.
pub type PopStateListener = Rc<dyn Fn()>;

/// Listener for anchor clicks. Returns `true` when it took over the click, in
/// which case the default navigation must be prevented.
pub type ClickListener = Rc<dyn Fn(&AnchorClick) -> bool>;

/// The `window` half of the browsing context.
pub trait WindowLike {
    /// The current location.
    fn location(&self) -> BrowserLocation;

    /// Adds a history entry (`history.pushState`).
    fn push_state(&self, state: &HistoryState, url: &str);

    /// Replaces the current history entry (`history.replaceState`).
    fn replace_state(&self, state: &HistoryState, url: &str);

    /// Dispatches a navigation event on the global scope.
    fn dispatch(&self, kind: NavigationEventKind, detail: &NavigationDetail);

    /// Registers a `popstate` listener.
    fn on_popstate(&self, listener: PopStateListener) -> ListenerId;

    /// Registers a global click listener for anchors.
    fn on_anchor_click(&self, listener: ClickListener) -> ListenerId;

    /// Removes a listener registered by either `on_*` method.
    fn remove_listener(&self, id: ListenerId);

    /// Runs a future on the local event loop.
    fn spawn_local(&self, fut: LocalBoxFuture<'static, ()>);
}

/// The `document` half of the browsing context.
pub trait DocumentLike {
    /// The `href` of the page's `<base>` element, if any.
    fn base_href(&self) -> Option<String>;

    /// Finds the first element matching `selector` in the document.
    fn query_selector(&self, selector: &str) -> Option<Node>;

    /// Creates a detached element.
    fn create_element(&self, tag: &str) -> Node;

    /// Whether `tag` is already registered as a custom element.
    fn is_defined(&self, tag: &str) -> bool;

    /// Registers `tag` as a custom element. Returns `false` without doing
    /// anything if it was already defined.
    fn define_element(&self, tag: &str) -> bool;
}
