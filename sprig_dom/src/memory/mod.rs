//! An in-memory browsing context.
//!
//! [`MemoryWindow`] keeps a history stack and records every navigation event
//! it is asked to dispatch; [`MemoryDocument`] holds a tree of
//! [`MemoryNode`]s. Together they stand in for the browser wherever the real
//! one is unavailable, most notably in tests.

mod node;

pub use node::MemoryNode;

use crate::{
    AnchorClick, BrowserLocation, ClickListener, DocumentLike, DomNode,
    HistoryState, ListenerId, NavigationDetail, NavigationEventKind, Node,
    PopStateListener, WindowLike,
};
use futures::{
    executor::{LocalPool, LocalSpawner},
    future::LocalBoxFuture,
    task::LocalSpawnExt,
};
use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};
use url::Url;

const DEFAULT_ORIGIN: &str = "http://localhost";

/// Splits a URL or path into a [`BrowserLocation`]. Paths are resolved
/// against `origin`.
fn split_url(url: &str, origin: &str) -> BrowserLocation {
    let parsed = Url::parse(url)
        .or_else(|_| Url::parse(origin).and_then(|base| base.join(url)));
    match parsed {
        Ok(parsed) => BrowserLocation {
            origin: parsed.origin().ascii_serialization(),
            pathname: parsed.path().to_string(),
            search: parsed.query().unwrap_or_default().to_string(),
            hash: parsed
                .fragment()
                .map(|fragment| format!("#{fragment}"))
                .unwrap_or_default(),
        },
        Err(err) => {
            tracing::warn!("cannot resolve {url:?} against {origin}: {err}");
            BrowserLocation {
                origin: origin.to_string(),
                pathname: "/".to_string(),
                ..Default::default()
            }
        }
    }
}

/// A recorded history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// The state object passed with the entry.
    pub state: HistoryState,
    /// The URL the entry points at.
    pub url: String,
}

/// A [`WindowLike`] with an in-memory history stack.
pub struct MemoryWindow {
    location: RefCell<BrowserLocation>,
    entries: RefCell<Vec<HistoryEntry>>,
    index: Cell<usize>,
    writes: Cell<usize>,
    events: RefCell<Vec<(NavigationEventKind, NavigationDetail)>>,
    popstate: RefCell<Vec<(ListenerId, PopStateListener)>>,
    clicks: RefCell<Vec<(ListenerId, ClickListener)>>,
    next_listener: Cell<u64>,
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
}

impl fmt::Debug for MemoryWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryWindow")
            .field("location", &self.location.borrow())
            .field("entries", &self.entries.borrow())
            .field("index", &self.index.get())
            .finish_non_exhaustive()
    }
}

impl Default for MemoryWindow {
    fn default() -> Self {
        Self::new("/")
    }
}

impl MemoryWindow {
    /// Creates a window whose single history entry is `url`.
    ///
    /// `url` may be absolute (`https://example.com/a`) or a path, in which
    /// case the origin is `http://localhost`.
    pub fn new(url: &str) -> Self {
        let location = split_url(url, DEFAULT_ORIGIN);
        let entry = HistoryEntry {
            state: HistoryState {
                path: location.pathname.clone(),
            },
            url: location.pathname.clone(),
        };
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            location: RefCell::new(location),
            entries: RefCell::new(vec![entry]),
            index: Cell::new(0),
            writes: Cell::new(0),
            events: Default::default(),
            popstate: Default::default(),
            clicks: Default::default(),
            next_listener: Cell::new(1),
            pool: RefCell::new(pool),
            spawner,
        }
    }

    /// Moves the location without touching history, like typing into the
    /// address bar before the app starts.
    pub fn set_location(&self, url: &str) {
        let origin = self.location.borrow().origin.clone();
        *self.location.borrow_mut() = split_url(url, &origin);
    }

    /// The history stack, oldest first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.entries.borrow().clone()
    }

    /// The position of the current entry in [`history`](Self::history).
    pub fn history_index(&self) -> usize {
        self.index.get()
    }

    /// How many `pushState`/`replaceState` calls have been made.
    pub fn history_writes(&self) -> usize {
        self.writes.get()
    }

    /// Every event dispatched so far.
    pub fn events(&self) -> Vec<(NavigationEventKind, NavigationDetail)> {
        self.events.borrow().clone()
    }

    /// Drains the recorded events.
    pub fn take_events(&self) -> Vec<(NavigationEventKind, NavigationDetail)> {
        self.events.take()
    }

    /// How many popstate and click listeners are registered.
    pub fn listener_count(&self) -> usize {
        self.popstate.borrow().len() + self.clicks.borrow().len()
    }

    /// Simulates the browser's back button.
    pub fn back(&self) -> bool {
        let index = self.index.get();
        if index == 0 {
            return false;
        }
        self.go_to(index - 1);
        true
    }

    /// Simulates the browser's forward button.
    pub fn forward(&self) -> bool {
        let index = self.index.get();
        if index + 1 >= self.entries.borrow().len() {
            return false;
        }
        self.go_to(index + 1);
        true
    }

    fn go_to(&self, index: usize) {
        self.index.set(index);
        let url = self.entries.borrow()[index].url.clone();
        self.set_location(&url);
        let listeners = self
            .popstate
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect::<Vec<_>>();
        for listener in listeners {
            listener();
        }
    }

    /// Simulates a click on an anchor. Returns `true` if a listener took over
    /// the navigation, i.e. the default action was prevented.
    pub fn click(&self, click: &AnchorClick) -> bool {
        let listeners = self
            .clicks
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect::<Vec<_>>();
        let mut prevented = false;
        for listener in listeners {
            if listener(click) {
                prevented = true;
            }
        }
        prevented
    }

    /// Runs spawned futures until none of them can make progress.
    pub fn run_until_stalled(&self) {
        self.pool.borrow_mut().run_until_stalled();
    }

    fn next_id(&self) -> ListenerId {
        let id = self.next_listener.get();
        self.next_listener.set(id + 1);
        ListenerId(id)
    }

    fn write_entry(&self, state: &HistoryState, url: &str, replace: bool) {
        self.writes.set(self.writes.get() + 1);
        let entry = HistoryEntry {
            state: state.clone(),
            url: url.to_string(),
        };
        {
            let mut entries = self.entries.borrow_mut();
            let index = self.index.get();
            if replace {
                entries[index] = entry;
            } else {
                entries.truncate(index + 1);
                entries.push(entry);
                self.index.set(index + 1);
            }
        }
        self.set_location(url);
    }
}

impl WindowLike for MemoryWindow {
    fn location(&self) -> BrowserLocation {
        self.location.borrow().clone()
    }

    fn push_state(&self, state: &HistoryState, url: &str) {
        self.write_entry(state, url, false);
    }

    fn replace_state(&self, state: &HistoryState, url: &str) {
        self.write_entry(state, url, true);
    }

    fn dispatch(&self, kind: NavigationEventKind, detail: &NavigationDetail) {
        self.events.borrow_mut().push((kind, detail.clone()));
    }

    fn on_popstate(&self, listener: PopStateListener) -> ListenerId {
        let id = self.next_id();
        self.popstate.borrow_mut().push((id, listener));
        id
    }

    fn on_anchor_click(&self, listener: ClickListener) -> ListenerId {
        let id = self.next_id();
        self.clicks.borrow_mut().push((id, listener));
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        self.popstate.borrow_mut().retain(|(l, _)| *l != id);
        self.clicks.borrow_mut().retain(|(l, _)| *l != id);
    }

    fn spawn_local(&self, fut: LocalBoxFuture<'static, ()>) {
        if let Err(e) = self.spawner.spawn_local(fut) {
            tracing::error!("could not spawn task on memory window: {e}");
        }
    }
}

/// A [`DocumentLike`] over a tree of [`MemoryNode`]s.
#[derive(Debug)]
pub struct MemoryDocument {
    body: Rc<MemoryNode>,
    base_href: RefCell<Option<String>>,
    defined: RefCell<Vec<String>>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// An empty document.
    pub fn new() -> Self {
        Self {
            body: MemoryNode::new("body"),
            base_href: Default::default(),
            defined: Default::default(),
        }
    }

    /// A document whose body holds `html`.
    pub fn with_body(html: &str) -> Self {
        let doc = Self::new();
        doc.body.set_inner_html(html);
        doc
    }

    /// The `<body>` element.
    pub fn body(&self) -> Node {
        self.body.handle()
    }

    /// Sets or clears the `<base href>` value.
    pub fn set_base_href(&self, href: Option<&str>) {
        *self.base_href.borrow_mut() = href.map(String::from);
    }

    /// Every tag registered as a custom element, in registration order.
    pub fn defined_elements(&self) -> Vec<String> {
        self.defined.borrow().clone()
    }
}

impl DocumentLike for MemoryDocument {
    fn base_href(&self) -> Option<String> {
        self.base_href.borrow().clone()
    }

    fn query_selector(&self, selector: &str) -> Option<Node> {
        self.body.query_selector(selector)
    }

    fn create_element(&self, tag: &str) -> Node {
        MemoryNode::new(tag)
    }

    fn is_defined(&self, tag: &str) -> bool {
        self.defined.borrow().iter().any(|t| t == tag)
    }

    fn define_element(&self, tag: &str) -> bool {
        if self.is_defined(tag) {
            return false;
        }
        self.defined.borrow_mut().push(tag.to_string());
        true
    }
}
