//! The seam to a view-transition engine.

use crate::view::ViewHost;
use async_trait::async_trait;
use sprig_dom::Node;
use sprig_router::BoxError;
use std::{cell::RefCell, fmt, rc::Rc};

/// Tag of the element a view stack renders into.
pub const VIEW_STACK_TAG: &str = "sprig-stack";

/// Attribute carrying the transition-effect hint of the last transition.
pub const EFFECT_ATTRIBUTE: &str = "data-effect";

/// A stack of views shown one at a time inside an element.
#[async_trait(?Send)]
pub trait ViewStack {
    /// The element the stack renders into.
    fn element(&self) -> Node;

    /// Transitions to `view`, pushing it on top of the stack.
    async fn begin(
        &self,
        view: Rc<ViewHost>,
        effect: Option<&str>,
    ) -> Result<(), BoxError>;

    /// Pops the top view and returns the one revealed underneath, or `None`
    /// when there is nothing to go back to.
    async fn complete(&self) -> Result<Option<Rc<ViewHost>>, BoxError>;

    /// Takes `view` out of the stack without a transition. When it was on
    /// top, the view underneath is shown again and returned.
    fn discard(&self, view: &Rc<ViewHost>) -> Option<Rc<ViewHost>>;

    fn can_go_back(&self) -> bool;
}

/// Creates a [`ViewStack`] over an existing stack element.
pub trait StackFactory {
    /// `max_depth` bounds how many views the stack keeps for going back,
    /// the shown one included.
    fn attach(&self, element: Node, max_depth: usize) -> Rc<dyn ViewStack>;
}

/// Shows the top view's element and nothing else. The effect hint is written
/// to [`EFFECT_ATTRIBUTE`] for stylesheets to pick up.
///
/// Once more than `max_depth` views were pushed, the oldest are dropped.
/// The depth never goes below 2 so that a view can always be discarded
/// back to the one it covered.
pub struct BasicViewStack {
    element: Node,
    views: RefCell<Vec<Rc<ViewHost>>>,
    max_depth: usize,
}

impl fmt::Debug for BasicViewStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicViewStack")
            .field("element", &self.element.id())
            .field("depth", &self.views.borrow().len())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

impl BasicViewStack {
    pub fn new(element: Node, max_depth: usize) -> Self {
        Self {
            element,
            views: Default::default(),
            max_depth: max_depth.max(2),
        }
    }

    pub fn depth(&self) -> usize {
        self.views.borrow().len()
    }
}

#[async_trait(?Send)]
impl ViewStack for BasicViewStack {
    fn element(&self) -> Node {
        Rc::clone(&self.element)
    }

    async fn begin(
        &self,
        view: Rc<ViewHost>,
        effect: Option<&str>,
    ) -> Result<(), BoxError> {
        let mut views = self.views.borrow_mut();
        if let Some(top) = views.last() {
            self.element.remove_child(top.element());
        }
        match effect {
            Some(effect) => self.element.set_attribute(EFFECT_ATTRIBUTE, effect),
            None => self.element.remove_attribute(EFFECT_ATTRIBUTE),
        }
        self.element.append_child(view.element());
        views.push(view);
        let excess = views.len().saturating_sub(self.max_depth);
        if excess > 0 {
            tracing::trace!("dropping {excess} view(s) off the stack bottom");
            views.drain(..excess);
        }
        Ok(())
    }

    async fn complete(&self) -> Result<Option<Rc<ViewHost>>, BoxError> {
        let mut views = self.views.borrow_mut();
        if views.len() < 2 {
            return Ok(None);
        }
        if let Some(top) = views.pop() {
            self.element.remove_child(top.element());
        }
        let revealed = views.last().cloned();
        if let Some(revealed) = &revealed {
            self.element.append_child(revealed.element());
        }
        Ok(revealed)
    }

    fn discard(&self, view: &Rc<ViewHost>) -> Option<Rc<ViewHost>> {
        let mut views = self.views.borrow_mut();
        let index = views.iter().rposition(|v| Rc::ptr_eq(v, view))?;
        let on_top = index + 1 == views.len();
        views.remove(index);
        if !on_top {
            return None;
        }
        self.element.remove_child(view.element());
        let revealed = views.last().cloned();
        if let Some(revealed) = &revealed {
            self.element.append_child(revealed.element());
        }
        revealed
    }

    fn can_go_back(&self) -> bool {
        self.views.borrow().len() > 1
    }
}

/// The default [`StackFactory`].
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicStacks;

impl StackFactory for BasicStacks {
    fn attach(&self, element: Node, max_depth: usize) -> Rc<dyn ViewStack> {
        Rc::new(BasicViewStack::new(element, max_depth))
    }
}
