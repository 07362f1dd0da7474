use crate::{DomNode, Node, NodeId};
use indexmap::IndexMap;
use scraper::{ElementRef, Html, Selector};
use std::{
    any::Any,
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta",
    "source", "track", "wbr",
];

/// Attribute tying serialized elements back to their node while a selector
/// is matched.
const NODE_MARKER: &str = "data-sprig-node";

/// An element in the in-memory DOM.
///
/// Only elements and their attributes are kept; text content is dropped
/// when markup is parsed.
pub struct MemoryNode {
    id: NodeId,
    tag: String,
    shadow_root: bool,
    attributes: RefCell<IndexMap<String, String>>,
    children: RefCell<Vec<Rc<MemoryNode>>>,
    shadow: RefCell<Option<Rc<MemoryNode>>>,
    parent: RefCell<Weak<MemoryNode>>,
    this: Weak<MemoryNode>,
}

impl fmt::Debug for MemoryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryNode")
            .field("id", &self.id)
            .field("tag", &self.tag)
            .field("attributes", &self.attributes.borrow())
            .field("children", &self.children.borrow().len())
            .finish_non_exhaustive()
    }
}

impl MemoryNode {
    /// Creates a detached element.
    pub fn new(tag: &str) -> Rc<Self> {
        Self::build(tag.to_ascii_lowercase(), false)
    }

    fn build(tag: String, shadow_root: bool) -> Rc<Self> {
        Rc::new_cyclic(|this| MemoryNode {
            id: NodeId::next(),
            tag,
            shadow_root,
            attributes: Default::default(),
            children: Default::default(),
            shadow: Default::default(),
            parent: Default::default(),
            this: this.clone(),
        })
    }

    /// This node as a shared [`Node`] handle.
    pub fn handle(&self) -> Node {
        self.rc()
    }

    fn rc(&self) -> Rc<MemoryNode> {
        // `this` is set by `Rc::new_cyclic` and only dangles during drop
        self.this.upgrade().expect("MemoryNode used during drop")
    }

    /// The parent element, if attached.
    pub fn parent(&self) -> Option<Rc<MemoryNode>> {
        self.parent.borrow().upgrade()
    }

    /// The attached shadow root, if any.
    pub fn shadow(&self) -> Option<Rc<MemoryNode>> {
        self.shadow.borrow().clone()
    }

    fn detach(&self) {
        if let Some(parent) = self.parent() {
            parent.children.borrow_mut().retain(|c| c.id != self.id);
        }
        *self.parent.borrow_mut() = Weak::new();
    }

    fn push_child(&self, child: Rc<MemoryNode>) {
        child.detach();
        *child.parent.borrow_mut() = self.this.clone();
        self.children.borrow_mut().push(child);
    }

    fn serialize(&self, buf: &mut String, marked: bool) {
        buf.push('<');
        buf.push_str(&self.tag);
        if marked {
            buf.push_str(&format!(" {NODE_MARKER}=\"{}\"", self.id.0));
        }
        for (name, value) in self.attributes.borrow().iter() {
            buf.push(' ');
            buf.push_str(name);
            if !value.is_empty() {
                buf.push_str("=\"");
                buf.push_str(&value.replace('&', "&amp;").replace('"', "&quot;"));
                buf.push('"');
            }
        }
        buf.push('>');
        if VOID_ELEMENTS.contains(&self.tag.as_str()) {
            return;
        }
        for child in self.children.borrow().iter() {
            child.serialize(buf, marked);
        }
        buf.push_str("</");
        buf.push_str(&self.tag);
        buf.push('>');
    }

    fn descendant(&self, id: u64) -> Option<Rc<MemoryNode>> {
        self.children.borrow().iter().find_map(|child| {
            if child.id.0 == id {
                Some(Rc::clone(child))
            } else {
                child.descendant(id)
            }
        })
    }

    /// Builds the element tree below `parent` in a parsed fragment.
    fn from_parsed(parent: ElementRef<'_>) -> Vec<Rc<MemoryNode>> {
        parent
            .children()
            .filter_map(ElementRef::wrap)
            .map(|element| {
                let node = MemoryNode::new(element.value().name());
                for (name, value) in element.value().attrs() {
                    node.set_attribute(name, value);
                }
                for child in Self::from_parsed(element) {
                    node.push_child(child);
                }
                node
            })
            .collect()
    }
}

impl DomNode for MemoryNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn tag_name(&self) -> String {
        self.tag.clone()
    }

    fn inner_html(&self) -> String {
        let mut buf = String::new();
        for child in self.children.borrow().iter() {
            child.serialize(&mut buf, false);
        }
        buf
    }

    fn set_inner_html(&self, html: &str) {
        for child in self.children.take() {
            *child.parent.borrow_mut() = Weak::new();
        }
        let fragment = Html::parse_fragment(html);
        for child in Self::from_parsed(fragment.root_element()) {
            self.push_child(child);
        }
    }

    fn get_attribute(&self, name: &str) -> Option<String> {
        self.attributes.borrow().get(name).cloned()
    }

    fn set_attribute(&self, name: &str, value: &str) {
        if self.shadow_root {
            return;
        }
        self.attributes
            .borrow_mut()
            .insert(name.to_ascii_lowercase(), value.to_string());
    }

    fn remove_attribute(&self, name: &str) {
        self.attributes.borrow_mut().shift_remove(name);
    }

    fn attach_shadow(&self) -> Node {
        let mut shadow = self.shadow.borrow_mut();
        let root = shadow
            .get_or_insert_with(|| MemoryNode::build(String::new(), true));
        root.handle()
    }

    fn query_selector(&self, selector: &str) -> Option<Node> {
        let parsed = match Selector::parse(selector) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!("invalid selector {selector:?}: {err:?}");
                return None;
            }
        };
        // the node itself is serialized too so that combinators can match
        // against it, but only descendants are returned
        let mut markup = String::new();
        if self.shadow_root {
            for child in self.children.borrow().iter() {
                child.serialize(&mut markup, true);
            }
        } else {
            self.serialize(&mut markup, true);
        }
        let fragment = Html::parse_fragment(&markup);
        let found = fragment
            .select(&parsed)
            .filter_map(|element| element.value().attr(NODE_MARKER))
            .filter_map(|id| id.parse::<u64>().ok())
            .find(|id| *id != self.id.0)?;
        self.descendant(found).map(|node| node as Node)
    }

    fn append_child(&self, child: &Node) {
        match child.as_any().downcast_ref::<MemoryNode>() {
            Some(child) => self.push_child(child.rc()),
            None => tracing::warn!(
                "cannot append {child:?} to an in-memory node: foreign node type"
            ),
        }
    }

    fn remove_child(&self, child: &Node) {
        let id = child.id();
        let mut children = self.children.borrow_mut();
        if let Some(pos) = children.iter().position(|c| c.id == id) {
            let removed = children.remove(pos);
            *removed.parent.borrow_mut() = Weak::new();
        }
    }

    fn children(&self) -> Vec<Node> {
        self.children
            .borrow()
            .iter()
            .map(|c| Rc::clone(c) as Node)
            .collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
