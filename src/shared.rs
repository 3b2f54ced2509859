//! Thread-safe snapshot handle around a [HashRing].

use std::sync::{Arc, Mutex, RwLock};

use crate::config::Config;
use crate::hashring::HashRing;
use crate::node::Node;
use crate::Result;

/// Cloneable, thread-safe handle around a [HashRing], tuned for workloads
/// where lookups vastly outnumber membership changes.
///
/// Readers never contend with writers: every lookup runs against an
/// immutable snapshot of the ring, and a mutation builds its replacement
/// off to the side, swapping the shared pointer only once it succeeded. An
/// in-flight lookup therefore observes the pre- or post-mutation ring in
/// its entirety, never a torn middle state, and a failed mutation is
/// invisible. Mutations serialize on an internal writer lock.
pub struct SharedHashRing<T> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    /// Current immutable snapshot; the write lock is held only for the swap.
    snapshot: RwLock<Arc<HashRing<T>>>,
    /// Serializes mutations so concurrent add/remove cannot lose updates.
    writer: Mutex<()>,
}

impl<T> SharedHashRing<T> {
    /// Create an empty shared ring with the default [Config].
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create an empty shared ring with the given [Config].
    ///
    /// # Panics
    ///
    /// Panics if `config.replicas` is zero.
    pub fn with_config(config: Config) -> Self {
        SharedHashRing {
            inner: Arc::new(Inner {
                snapshot: RwLock::new(Arc::new(HashRing::with_config(config))),
                writer: Mutex::new(()),
            }),
        }
    }

    // === Getters ===

    /// The current immutable snapshot of the ring.
    ///
    /// Batch many lookups against one snapshot to pay the pointer load once
    /// and to see a single consistent membership throughout.
    pub fn snapshot(&self) -> Arc<HashRing<T>> {
        self.inner
            .snapshot
            .read()
            .expect("ring snapshot lock")
            .clone()
    }

    /// Number of distinct nodes currently on the ring.
    pub fn count(&self) -> usize {
        self.snapshot().count()
    }

    /// Returns `true` if no node has any virtual point on the ring.
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Returns `true` if a node with this id is on the ring.
    pub fn contains(&self, id: &str) -> bool {
        self.snapshot().contains(id)
    }

    // === Public Methods ===

    /// See [HashRing::get_node].
    pub fn get_node(&self, key: &str) -> Result<Node<T>> {
        self.snapshot().get_node(key)
    }

    /// See [HashRing::get_nodes].
    pub fn get_nodes(&self, key: &str, n: usize) -> Result<Vec<Node<T>>> {
        self.snapshot().get_nodes(key, n)
    }

    /// See [HashRing::init].
    pub fn init(&self, nodes: impl IntoIterator<Item = Node<T>>) -> Result<()> {
        self.mutate(|ring| ring.init(nodes))
    }

    /// See [HashRing::add].
    pub fn add(&self, node: Node<T>) -> Result<()> {
        self.mutate(|ring| ring.add(node))
    }

    /// See [HashRing::remove].
    pub fn remove(&self, id: &str) -> Result<()> {
        self.mutate(|ring| ring.remove(id))
    }

    // === Private Methods ===

    /// Clone the current snapshot, apply `op`, and publish the result.
    ///
    /// The swap happens only when `op` succeeds, after which new lookups see
    /// the updated ring and in-flight ones finish against the old snapshot.
    fn mutate(&self, op: impl FnOnce(&mut HashRing<T>) -> Result<()>) -> Result<()> {
        let _writer = self.inner.writer.lock().expect("ring writer lock");

        let mut next = (*self.snapshot()).clone();
        op(&mut next)?;

        *self.inner.snapshot.write().expect("ring snapshot lock") = Arc::new(next);

        Ok(())
    }
}

impl<T> Clone for SharedHashRing<T> {
    fn clone(&self) -> Self {
        SharedHashRing {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Default for SharedHashRing<T> {
    fn default() -> Self {
        Self::new()
    }
}
