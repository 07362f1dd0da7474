//! The seam to a template-binding engine.

use crate::view::State;
use sprig_dom::Node;
use sprig_router::BoxError;

/// Links a view's state to its rendered content.
pub trait Binder {
    /// Attaches reactivity to the content root.
    fn bind(&mut self) -> Result<(), BoxError>;

    /// Re-renders from `state`, animating the change if asked to.
    fn update(&mut self, state: &State, animate: bool);

    fn destroy(&mut self);

    fn set_auto_update(&mut self, on: bool);
}

/// Creates one [`Binder`] per mounted view.
pub trait BinderFactory {
    fn create(
        &self,
        root: &Node,
        state: &State,
        transition_class: &str,
    ) -> Box<dyn Binder>;
}

/// A binder that leaves the rendered template as it is.
#[derive(Debug, Default, Clone, Copy)]
pub struct InertBinder;

impl Binder for InertBinder {
    fn bind(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    fn update(&mut self, _state: &State, _animate: bool) {}

    fn destroy(&mut self) {}

    fn set_auto_update(&mut self, _on: bool) {}
}

impl BinderFactory for InertBinder {
    fn create(&self, _root: &Node, _state: &State, _transition_class: &str) -> Box<dyn Binder> {
        Box::new(InertBinder)
    }
}
