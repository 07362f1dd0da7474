//! The real browser, through `web-sys`.

use crate::{
    AnchorClick, BrowserLocation, ClickListener, DocumentLike, DomNode,
    HistoryState, ListenerId, NavigationDetail, NavigationEventKind, Node,
    NodeId, PopStateListener, WindowLike,
};
use futures::future::LocalBoxFuture;
use js_sys::{Function, JSON};
use std::{any::Any, cell::RefCell, fmt, rc::Rc};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{
    CustomEvent, CustomEventInit, Element, Event, HtmlAnchorElement,
    MouseEvent, ShadowRoot, ShadowRootInit, ShadowRootMode,
};

const NODE_ID_ATTR: &str = "data-sprig-node";
const SHADOW_BIT: u64 = 1 << 63;

fn report(e: &JsValue) {
    tracing::error!("{e:?}");
    web_sys::console::error_1(e);
}

/// Bindings to `window`.
pub struct WebWindow {
    window: web_sys::Window,
    listeners: RefCell<Vec<(ListenerId, &'static str, Closure<dyn FnMut(Event)>)>>,
    next_listener: RefCell<u64>,
}

impl fmt::Debug for WebWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebWindow").finish_non_exhaustive()
    }
}

impl WebWindow {
    /// Binds to the global `window`, if there is one.
    pub fn new() -> Option<Self> {
        Some(Self {
            window: web_sys::window()?,
            listeners: Default::default(),
            next_listener: RefCell::new(1),
        })
    }

    fn listen(
        &self,
        event: &'static str,
        cb: impl FnMut(Event) + 'static,
    ) -> ListenerId {
        let id = {
            let mut next = self.next_listener.borrow_mut();
            let id = ListenerId(*next);
            *next += 1;
            id
        };
        let closure = Closure::wrap(Box::new(cb) as Box<dyn FnMut(Event)>);
        if let Err(e) = self.window.add_event_listener_with_callback(
            event,
            closure.as_ref().unchecked_ref(),
        ) {
            report(&e);
        }
        self.listeners.borrow_mut().push((id, event, closure));
        id
    }

    fn write_history(&self, state: &HistoryState, url: &str, replace: bool) {
        let result = self.window.history().and_then(|history| {
            let state = serde_json::to_string(state)
                .ok()
                .and_then(|s| JSON::parse(&s).ok())
                .unwrap_or(JsValue::NULL);
            if replace {
                history.replace_state_with_url(&state, "", Some(url))
            } else {
                history.push_state_with_url(&state, "", Some(url))
            }
        });
        if let Err(e) = result {
            report(&e);
        }
    }
}

fn anchor_click(ev: &MouseEvent) -> Option<AnchorClick> {
    let composed_path = ev.composed_path();
    let mut anchor: Option<HtmlAnchorElement> = None;
    for i in 0..composed_path.length() {
        if let Ok(el) = composed_path.get(i).dyn_into::<HtmlAnchorElement>() {
            anchor = Some(el);
            break;
        }
    }
    let a = anchor?;
    let target = a.target();
    Some(AnchorClick {
        href: a.href(),
        target: (!target.is_empty()).then_some(target),
        download: a.has_attribute("download"),
        rel: a.get_attribute("rel"),
        button: ev.button(),
        modifier: ev.meta_key() || ev.alt_key() || ev.ctrl_key() || ev.shift_key(),
        default_prevented: ev.default_prevented(),
    })
}

impl WindowLike for WebWindow {
    fn location(&self) -> BrowserLocation {
        let location = self.window.location();
        BrowserLocation {
            origin: location.origin().unwrap_or_default(),
            pathname: location.pathname().unwrap_or_else(|_| "/".into()),
            search: location
                .search()
                .ok()
                .and_then(|s| s.strip_prefix('?').map(String::from))
                .unwrap_or_default(),
            hash: location.hash().unwrap_or_default(),
        }
    }

    fn push_state(&self, state: &HistoryState, url: &str) {
        self.write_history(state, url, false);
    }

    fn replace_state(&self, state: &HistoryState, url: &str) {
        self.write_history(state, url, true);
    }

    fn dispatch(&self, kind: NavigationEventKind, detail: &NavigationDetail) {
        let detail = match serde_json::to_string(detail)
            .map_err(|e| JsValue::from_str(&e.to_string()))
            .and_then(|s| JSON::parse(&s))
        {
            Ok(detail) => detail,
            Err(e) => {
                report(&e);
                return;
            }
        };
        let init = CustomEventInit::new();
        init.set_detail(&detail);
        match CustomEvent::new_with_event_init_dict(kind.as_str(), &init) {
            Ok(event) => {
                if let Err(e) = self.window.dispatch_event(&event) {
                    report(&e);
                }
            }
            Err(e) => report(&e),
        }
    }

    fn on_popstate(&self, listener: PopStateListener) -> ListenerId {
        self.listen("popstate", move |_| listener())
    }

    fn on_anchor_click(&self, listener: ClickListener) -> ListenerId {
        self.listen("click", move |ev: Event| {
            let Some(ev) = ev.dyn_ref::<MouseEvent>() else {
                return;
            };
            if let Some(click) = anchor_click(ev) {
                if listener(&click) {
                    ev.prevent_default();
                }
            }
        })
    }

    fn remove_listener(&self, id: ListenerId) {
        let mut listeners = self.listeners.borrow_mut();
        if let Some(pos) = listeners.iter().position(|(l, _, _)| *l == id) {
            let (_, event, closure) = listeners.remove(pos);
            if let Err(e) = self.window.remove_event_listener_with_callback(
                event,
                closure.as_ref().unchecked_ref(),
            ) {
                report(&e);
            }
        }
    }

    fn spawn_local(&self, fut: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(fut);
    }
}

/// Bindings to `document`.
#[derive(Debug, Clone)]
pub struct WebDocument {
    window: web_sys::Window,
    document: web_sys::Document,
}

impl WebDocument {
    /// Binds to the global `document`, if there is one.
    pub fn new() -> Option<Self> {
        let window = web_sys::window()?;
        let document = window.document()?;
        Some(Self { window, document })
    }
}

impl DocumentLike for WebDocument {
    fn base_href(&self) -> Option<String> {
        self.document
            .query_selector("base[href]")
            .ok()
            .flatten()
            .and_then(|base| base.get_attribute("href"))
    }

    fn query_selector(&self, selector: &str) -> Option<Node> {
        match self.document.query_selector(selector) {
            Ok(el) => el.map(WebNode::element),
            Err(e) => {
                report(&e);
                None
            }
        }
    }

    fn create_element(&self, tag: &str) -> Node {
        match self.document.create_element(tag) {
            Ok(el) => WebNode::element(el),
            Err(e) => {
                report(&e);
                // invalid tag names fall back to a plain container
                WebNode::element(
                    self.document
                        .create_element("div")
                        .expect("`div` is a valid tag name"),
                )
            }
        }
    }

    fn is_defined(&self, tag: &str) -> bool {
        !self.window.custom_elements().get(tag).is_undefined()
    }

    fn define_element(&self, tag: &str) -> bool {
        if self.is_defined(tag) {
            return false;
        }
        let class = Function::new_no_args("return class extends HTMLElement {}")
            .call0(&JsValue::NULL)
            .and_then(|class| class.dyn_into::<Function>());
        match class {
            Ok(class) => match self.window.custom_elements().define(tag, &class) {
                Ok(()) => true,
                Err(e) => {
                    report(&e);
                    false
                }
            },
            Err(e) => {
                report(&e);
                false
            }
        }
    }
}

#[derive(Clone)]
enum Inner {
    Element(Element),
    Shadow(ShadowRoot),
}

/// A DOM element or shadow root.
#[derive(Clone)]
pub struct WebNode {
    inner: Inner,
}

impl fmt::Debug for WebNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebNode")
            .field("id", &self.id())
            .field("tag", &self.tag_name())
            .finish()
    }
}

impl WebNode {
    /// Wraps an element.
    pub fn element(el: Element) -> Node {
        Rc::new(WebNode {
            inner: Inner::Element(el),
        })
    }

    /// The wrapped element, unless this is a shadow root.
    pub fn as_element(&self) -> Option<&Element> {
        match &self.inner {
            Inner::Element(el) => Some(el),
            Inner::Shadow(_) => None,
        }
    }

    fn as_node(&self) -> &web_sys::Node {
        match &self.inner {
            Inner::Element(el) => el.as_ref(),
            Inner::Shadow(root) => root.as_ref(),
        }
    }

    fn element_id(el: &Element) -> NodeId {
        if let Some(id) = el
            .get_attribute(NODE_ID_ATTR)
            .and_then(|id| id.parse::<u64>().ok())
        {
            return NodeId(id);
        }
        let id = NodeId::next();
        if let Err(e) = el.set_attribute(NODE_ID_ATTR, &id.0.to_string()) {
            report(&e);
        }
        id
    }

    fn downcast(node: &Node) -> Option<&WebNode> {
        node.as_any().downcast_ref::<WebNode>()
    }
}

impl DomNode for WebNode {
    fn id(&self) -> NodeId {
        match &self.inner {
            Inner::Element(el) => Self::element_id(el),
            Inner::Shadow(root) => {
                NodeId(Self::element_id(&root.host()).0 | SHADOW_BIT)
            }
        }
    }

    fn tag_name(&self) -> String {
        match &self.inner {
            Inner::Element(el) => el.tag_name().to_ascii_lowercase(),
            Inner::Shadow(_) => String::new(),
        }
    }

    fn inner_html(&self) -> String {
        match &self.inner {
            Inner::Element(el) => el.inner_html(),
            Inner::Shadow(root) => root.inner_html(),
        }
    }

    fn set_inner_html(&self, html: &str) {
        match &self.inner {
            Inner::Element(el) => el.set_inner_html(html),
            Inner::Shadow(root) => root.set_inner_html(html),
        }
    }

    fn get_attribute(&self, name: &str) -> Option<String> {
        self.as_element()?.get_attribute(name)
    }

    fn set_attribute(&self, name: &str, value: &str) {
        if let Some(el) = self.as_element() {
            if let Err(e) = el.set_attribute(name, value) {
                report(&e);
            }
        }
    }

    fn remove_attribute(&self, name: &str) {
        if let Some(el) = self.as_element() {
            if let Err(e) = el.remove_attribute(name) {
                report(&e);
            }
        }
    }

    fn attach_shadow(&self) -> Node {
        let Inner::Element(el) = &self.inner else {
            return Rc::new(self.clone());
        };
        if let Some(root) = el.shadow_root() {
            return Rc::new(WebNode {
                inner: Inner::Shadow(root),
            });
        }
        match el.attach_shadow(&ShadowRootInit::new(ShadowRootMode::Open)) {
            Ok(root) => Rc::new(WebNode {
                inner: Inner::Shadow(root),
            }),
            Err(e) => {
                // elements that cannot host a shadow root render in light DOM
                report(&e);
                Rc::new(self.clone())
            }
        }
    }

    fn query_selector(&self, selector: &str) -> Option<Node> {
        let found = match &self.inner {
            Inner::Element(el) => el.query_selector(selector),
            Inner::Shadow(root) => root.query_selector(selector),
        };
        match found {
            Ok(el) => el.map(WebNode::element),
            Err(e) => {
                report(&e);
                None
            }
        }
    }

    fn append_child(&self, child: &Node) {
        let Some(child) = Self::downcast(child) else {
            tracing::warn!("cannot append {child:?} to a DOM node: foreign node type");
            return;
        };
        if let Err(e) = self.as_node().append_child(child.as_node()) {
            report(&e);
        }
    }

    fn remove_child(&self, child: &Node) {
        let Some(child) = Self::downcast(child) else {
            return;
        };
        if child.as_node().parent_node().as_ref() == Some(self.as_node()) {
            if let Err(e) = self.as_node().remove_child(child.as_node()) {
                report(&e);
            }
        }
    }

    fn children(&self) -> Vec<Node> {
        let collection = match &self.inner {
            Inner::Element(el) => el.children(),
            Inner::Shadow(root) => root.children(),
        };
        (0..collection.length())
            .filter_map(|i| collection.item(i))
            .map(WebNode::element)
            .collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
