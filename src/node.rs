//! Node handle stored on the ring.

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// A physical node on the ring: a caller-assigned string id plus an
/// arbitrary payload (address, connection handle, whatever resolves the
/// node on the caller's side).
///
/// `Node` is a cheap handle; cloning it clones an [Arc], never the payload.
/// The ring stores and returns these handles, it does not construct or
/// destroy payloads on its own.
///
/// Equality and ordering are by id only. Ring positions are an internal
/// detail and never part of a node's identity.
pub struct Node<T>(Arc<NodeInner<T>>);

struct NodeInner<T> {
    id: Arc<str>,
    payload: T,
}

impl<T> Node<T> {
    /// Create a node handle owning `payload` under the given id.
    pub fn new(id: impl Into<String>, payload: T) -> Self {
        Node(Arc::new(NodeInner {
            id: id.into().into(),
            payload,
        }))
    }

    // === Getters ===

    /// The caller-assigned identity this node is compared and placed by.
    pub fn id(&self) -> &str {
        &self.0.id
    }

    /// The caller-supplied payload.
    pub fn payload(&self) -> &T {
        &self.0.payload
    }

    /// Shared id string, used as the owner tag of this node's virtual points.
    pub(crate) fn id_handle(&self) -> Arc<str> {
        self.0.id.clone()
    }
}

impl<T> Clone for Node<T> {
    fn clone(&self) -> Self {
        Node(self.0.clone())
    }
}

impl<T> PartialEq for Node<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl<T> Eq for Node<T> {}

impl<T> Debug for Node<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.id())
    }
}
