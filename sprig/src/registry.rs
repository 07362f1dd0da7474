//! Root element to app lookup.

use crate::app::AppInner;
use sprig_dom::NodeId;
use std::{
    cell::RefCell,
    collections::HashMap,
    rc::{Rc, Weak},
};

thread_local! {
    static APPS: RefCell<HashMap<NodeId, Weak<AppInner>>> =
        RefCell::new(HashMap::new());
}

pub(crate) fn register(root: NodeId, app: Weak<AppInner>) {
    APPS.with_borrow_mut(|apps| {
        apps.insert(root, app);
    });
}

pub(crate) fn unregister(root: NodeId) {
    // may run from a destructor during thread teardown
    _ = APPS.try_with(|apps| {
        apps.borrow_mut().remove(&root);
    });
}

pub(crate) fn lookup(root: NodeId) -> Option<Rc<AppInner>> {
    APPS.with_borrow(|apps| apps.get(&root).and_then(Weak::upgrade))
}
