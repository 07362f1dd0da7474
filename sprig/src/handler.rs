use crate::view::{View, ViewClass};
use std::{borrow::Cow, fmt};

/// What a route renders: a view class given directly, or the identifier of
/// one registered with the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handler {
    View(ViewClass),
    Named(Cow<'static, str>),
}

impl Handler {
    /// A direct handler for `V`.
    pub fn view<V: View + Default>() -> Self {
        Handler::View(ViewClass::of::<V>())
    }
}

impl fmt::Display for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::View(class) => f.write_str(class.name()),
            Handler::Named(name) => f.write_str(name),
        }
    }
}

impl From<ViewClass> for Handler {
    fn from(class: ViewClass) -> Self {
        Handler::View(class)
    }
}

impl From<&'static str> for Handler {
    fn from(name: &'static str) -> Self {
        Handler::Named(Cow::Borrowed(name))
    }
}

impl From<String> for Handler {
    fn from(name: String) -> Self {
        Handler::Named(Cow::Owned(name))
    }
}
