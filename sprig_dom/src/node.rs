use std::{
    any::Any,
    fmt,
    rc::Rc,
    sync::atomic::{AtomicU64, Ordering},
};

/// A stable identity for a DOM node, used as a registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Allocates a fresh, process-unique id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        NodeId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// A shared handle to a node.
pub type Node = Rc<dyn DomNode>;

/// The element operations the view layer performs.
///
/// Shadow roots are nodes too: they have no tag or attributes of their own,
/// but can hold content and be queried.
pub trait DomNode: fmt::Debug {
    /// This node's identity.
    fn id(&self) -> NodeId;

    /// The lowercase tag name. Empty for shadow roots.
    fn tag_name(&self) -> String;

    /// The node's markup content.
    fn inner_html(&self) -> String;

    /// Replaces the node's content with parsed `html`.
    fn set_inner_html(&self, html: &str);

    /// Reads an attribute.
    fn get_attribute(&self, name: &str) -> Option<String>;

    /// Writes an attribute.
    fn set_attribute(&self, name: &str, value: &str);

    /// Removes an attribute.
    fn remove_attribute(&self, name: &str);

    /// Attaches an open shadow root, or returns the one already attached.
    fn attach_shadow(&self) -> Node;

    /// Finds the first descendant matching `selector`.
    fn query_selector(&self, selector: &str) -> Option<Node>;

    /// Appends `child` as the last child, moving it if already attached.
    fn append_child(&self, child: &Node);

    /// Detaches `child` if it is a child of this node.
    fn remove_child(&self, child: &Node);

    /// The element children, in document order.
    fn children(&self) -> Vec<Node>;

    /// Lets a backend recover its concrete node type from a [`Node`].
    fn as_any(&self) -> &dyn Any;
}

/// Whether two handles refer to the same node.
pub fn same_node(a: &Node, b: &Node) -> bool {
    a.id() == b.id()
}
