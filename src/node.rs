// SPDX-License-Identifier: GPL-2.0-only

//! Scene-node descriptors (4.J).
//!
//! Every scene node may carry one descriptor tagging its logical role.
//! Descriptor destruction is driven by the node's destroy signal, which is
//! the core invariant guaranteeing no dangling descriptor pointer ever
//! reaches a hit-test (spec.md §3, "node descriptor"). `smithay`'s scene
//! graph already exposes a user-data map plus a destruction callback on
//! each node; this module is the closed tag enum and the small registry
//! that ties a descriptor's lifetime to its node the way the teacher ties
//! `ClientState`/`CompositorClientState` lifetime to its client (see
//! `wayland/handlers.rs`).

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::view::ViewId;

/// Closed set of logical roles a scene node can have.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    View(ViewId),
    XdgPopup,
    XdgUnmanaged,
    LayerSurface,
    LayerPopup,
    MenuItem,
    SsdButton,
    Tree,
    SsdRounded,
    ImePopup,
    SessionLockSurface,
    CycleOsdItem,
    ScaledSceneBuffer,
}

/// A descriptor attached to exactly one scene node.
///
/// `data` is a small opaque payload (e.g. the button index within an SSD)
/// kept out of the tag itself so `NodeKind` stays a closed, matchable enum
/// per the REDESIGN FLAGS note on string-keyed dispatch.
#[derive(Debug, Clone)]
pub struct NodeDescriptor {
    pub kind: NodeKind,
    pub data: u32,
}

impl NodeDescriptor {
    pub fn new(kind: NodeKind) -> Self {
        Self { kind, data: 0 }
    }

    pub fn with_data(kind: NodeKind, data: u32) -> Self {
        Self { kind, data }
    }
}

/// Owns a node's descriptor and frees it when the node is destroyed.
///
/// Modeled as an `Rc`/`Weak` pair rather than a raw destroy-listener
/// callback: the node holds the `Rc<RefCell<Option<NodeDescriptor>>>`
/// strongly, everything else (hit-testing, button lookups) holds a `Weak`.
/// When the node drops, the `Rc` drops, and any `Weak::upgrade()` from a
/// stale hit-test fails cleanly instead of dereferencing freed memory —
/// the same guarantee the C destroy-signal gives, expressed without
/// lifetimes tied to a listener registration.
#[derive(Debug, Clone)]
pub struct NodeHandle(Rc<RefCell<Option<NodeDescriptor>>>);

impl NodeHandle {
    pub fn new(descriptor: NodeDescriptor) -> Self {
        Self(Rc::new(RefCell::new(Some(descriptor))))
    }

    pub fn downgrade(&self) -> WeakNodeHandle {
        WeakNodeHandle(Rc::downgrade(&self.0))
    }

    pub fn kind(&self) -> Option<NodeKind> {
        self.0.borrow().as_ref().map(|d| d.kind.clone())
    }

    pub fn data(&self) -> Option<u32> {
        self.0.borrow().as_ref().map(|d| d.data)
    }

    /// Explicit destroy, mirroring the node's destroy-signal callback.
    pub fn destroy(&self) {
        *self.0.borrow_mut() = None;
    }
}

#[derive(Debug, Clone)]
pub struct WeakNodeHandle(Weak<RefCell<Option<NodeDescriptor>>>);

impl WeakNodeHandle {
    pub fn upgrade(&self) -> Option<NodeHandle> {
        self.0.upgrade().map(NodeHandle)
    }

    /// True once the owning node has been destroyed or dropped.
    pub fn is_dangling(&self) -> bool {
        match self.0.upgrade() {
            None => true,
            Some(rc) => rc.borrow().is_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weak_handle_dangles_after_destroy() {
        let handle = NodeHandle::new(NodeDescriptor::new(NodeKind::SsdButton));
        let weak = handle.downgrade();
        assert!(!weak.is_dangling());
        handle.destroy();
        assert!(weak.is_dangling());
    }

    #[test]
    fn weak_handle_dangles_after_drop() {
        let handle = NodeHandle::new(NodeDescriptor::new(NodeKind::Tree));
        let weak = handle.downgrade();
        drop(handle);
        assert!(weak.upgrade().is_none());
        assert!(weak.is_dangling());
    }

    #[test]
    fn descriptor_carries_opaque_data() {
        let handle = NodeHandle::new(NodeDescriptor::with_data(NodeKind::SsdButton, 3));
        assert_eq!(handle.data(), Some(3));
    }
}
