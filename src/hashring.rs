//! Consistent hash ring over a named set of nodes.

use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::Config;
use crate::node::Node;
use crate::ring::Ring;
use crate::vnode;
use crate::{Error, Result};

/// Consistent hash ring: maps string keys onto a dynamic set of [Node]s so
/// that a membership change remaps only ~1/N of the key space, instead of
/// nearly all of it as modulo hashing would.
///
/// Lookups take `&self` and mutations take `&mut self`, so a single owner
/// can never observe a torn ring. Wrap the ring in a
/// [SharedHashRing](crate::SharedHashRing) when many threads look up
/// against a slowly changing membership.
pub struct HashRing<T> {
    config: Config,
    ring: Ring,
    nodes: HashMap<Arc<str>, Node<T>>,
}

impl<T> HashRing<T> {
    /// Create an empty ring with the default [Config].
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create an empty ring with a replication factor and hasher of your
    /// choosing.
    ///
    /// # Panics
    ///
    /// Panics if `config.replicas` is zero; a node with no virtual points
    /// could never own a key.
    pub fn with_config(config: Config) -> Self {
        assert!(config.replicas > 0, "Config::replicas must be at least 1");

        HashRing {
            config,
            ring: Ring::new(),
            nodes: HashMap::new(),
        }
    }

    // === Getters ===

    /// Number of distinct nodes currently on the ring.
    pub fn count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if no node has any virtual point on the ring.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of virtual points on the ring (`count() * replicas()`).
    pub fn vnodes(&self) -> usize {
        self.ring.len()
    }

    /// The replication factor this ring was built with.
    pub fn replicas(&self) -> u32 {
        self.config.replicas
    }

    /// Returns `true` if a node with this id is on the ring.
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Iterate over the nodes currently on the ring, in no particular order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node<T>> + '_ {
        self.nodes.values()
    }

    // === Public Methods ===

    /// Reset the ring and rebuild it from `nodes`.
    ///
    /// Nodes are placed in ascending id order regardless of input order, so
    /// the same membership always produces the same ring, collision
    /// rehashes included. Duplicate ids are rejected with
    /// [Error::DuplicateNode], and the ring is left empty whenever any
    /// placement fails.
    pub fn init(&mut self, nodes: impl IntoIterator<Item = Node<T>>) -> Result<()> {
        self.ring = Ring::new();
        self.nodes.clear();

        let mut nodes: Vec<Node<T>> = nodes.into_iter().collect();
        nodes.sort_by(|a, b| a.id().cmp(b.id()));

        for node in nodes {
            if let Err(error) = self.add(node) {
                self.ring = Ring::new();
                self.nodes.clear();

                return Err(error);
            }
        }

        debug!(nodes = self.count(), vnodes = self.vnodes(), "Initialized ring");

        Ok(())
    }

    /// Place a node on the ring.
    ///
    /// Only keys whose hash falls within the new node's arcs move to it;
    /// every other key keeps its owner.
    pub fn add(&mut self, node: Node<T>) -> Result<()> {
        if self.nodes.contains_key(node.id()) {
            return Err(Error::DuplicateNode(node.id().to_string()));
        }

        // The whole batch is computed and vetted before the first insert,
        // so a rehash exhaustion cannot leave a half-placed node behind.
        let positions = vnode::positions_for(
            self.config.hasher.as_ref(),
            self.config.replicas,
            node.id(),
            &self.ring,
        )?;

        trace!(id = node.id(), points = positions.len(), "Adding node");

        let id = node.id_handle();
        for position in positions {
            self.ring.insert(position, id.clone());
        }
        self.nodes.insert(id, node);

        Ok(())
    }

    /// Take a node off the ring.
    ///
    /// Keys owned by its virtual points fall through to their successors;
    /// all other keys are untouched.
    pub fn remove(&mut self, id: &str) -> Result<()> {
        if self.nodes.remove(id).is_none() {
            return Err(Error::NodeNotFound(id.to_string()));
        }

        let removed = self.ring.remove_node(id).unwrap_or_default();

        trace!(id, points = removed.len(), "Removed node");

        Ok(())
    }

    /// The node that owns `key`.
    ///
    /// The owner is the node whose virtual point is the successor of the
    /// key's hash position, wrapping past the ring's maximum.
    pub fn get_node(&self, key: &str) -> Result<Node<T>> {
        let position = self.config.hasher.hash(key.as_bytes());

        let owner = self.ring.successor(position).ok_or(Error::EmptyRing)?;

        Ok(self.resolve(owner))
    }

    /// The first `n` distinct nodes clockwise from `key`'s position, for
    /// callers that replicate each key across several nodes.
    ///
    /// Returns fewer than `n` nodes when the ring holds fewer than `n`.
    pub fn get_nodes(&self, key: &str, n: usize) -> Result<Vec<Node<T>>> {
        if self.is_empty() {
            return Err(Error::EmptyRing);
        }

        let position = self.config.hasher.hash(key.as_bytes());

        let mut owners: Vec<Node<T>> = Vec::with_capacity(n.min(self.count()));
        for owner in self.ring.successors(position) {
            if owners.len() == n {
                break;
            }

            if owners.iter().all(|node| node.id() != owner) {
                owners.push(self.resolve(owner));
            }
        }

        Ok(owners)
    }

    // === Private Methods ===

    /// Resolve a virtual point's owner to the registered node handle.
    ///
    /// The registry is updated in lockstep with the ring, so every stored
    /// owner id resolves.
    fn resolve(&self, owner: &str) -> Node<T> {
        self.nodes
            .get(owner)
            .cloned()
            .expect("ring owner is registered")
    }
}

impl<T> Default for HashRing<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for HashRing<T> {
    fn clone(&self) -> Self {
        HashRing {
            config: self.config.clone(),
            ring: self.ring.clone(),
            nodes: self.nodes.clone(),
        }
    }
}

impl<T> Debug for HashRing<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HashRing {{ nodes: {}, vnodes: {} }}",
            self.count(),
            self.vnodes()
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn ring_of(count: usize) -> HashRing<usize> {
        let mut ring = HashRing::new();
        ring.init((0..count).map(|i| Node::new(i.to_string(), i)))
            .unwrap();

        ring
    }

    fn owners(ring: &HashRing<usize>, keys: usize) -> Vec<String> {
        (0..keys)
            .map(|key| ring.get_node(&key.to_string()).unwrap().id().to_string())
            .collect()
    }

    #[test]
    fn empty_ring_rejects_every_lookup() {
        let ring: HashRing<usize> = HashRing::new();

        assert_eq!(ring.count(), 0);
        assert!(ring.is_empty());

        for key in ["", "0", "anything"] {
            assert_eq!(ring.get_node(key), Err(Error::EmptyRing));
            assert_eq!(ring.get_nodes(key, 3), Err(Error::EmptyRing));
        }
    }

    #[test]
    fn init_builds_replicas_per_node() {
        let ring = ring_of(10);

        assert_eq!(ring.count(), 10);
        assert_eq!(ring.vnodes(), 10 * ring.replicas() as usize);
        assert!(ring.contains("3"));
        assert!(!ring.contains("10"));
    }

    #[test]
    fn init_is_order_independent() {
        let mut forward = HashRing::new();
        forward
            .init((0..32).map(|i| Node::new(format!("svr_{}", i), i)))
            .unwrap();

        let mut backward = HashRing::new();
        backward
            .init((0..32).rev().map(|i| Node::new(format!("svr_{}", i), i)))
            .unwrap();

        for key in 0..2000 {
            let key = key.to_string();
            assert_eq!(
                forward.get_node(&key).unwrap(),
                backward.get_node(&key).unwrap()
            );
        }
    }

    #[test]
    fn init_resets_previous_membership() {
        let mut ring = ring_of(10);

        ring.init((0..3).map(|i| Node::new(format!("new_{}", i), i)))
            .unwrap();

        assert_eq!(ring.count(), 3);
        assert!(!ring.contains("0"));
        assert_eq!(ring.vnodes(), 3 * ring.replicas() as usize);
    }

    #[test]
    fn init_rejects_duplicate_ids() {
        let mut ring: HashRing<usize> = HashRing::new();

        let result = ring.init(vec![
            Node::new("a", 0),
            Node::new("b", 1),
            Node::new("a", 2),
        ]);

        assert_eq!(result, Err(Error::DuplicateNode("a".to_string())));
        assert!(ring.is_empty());
        assert_eq!(ring.vnodes(), 0);
    }

    #[test]
    fn add_rejects_present_id() {
        let mut ring = ring_of(5);

        assert_eq!(
            ring.add(Node::new("2", 99)),
            Err(Error::DuplicateNode("2".to_string()))
        );
        assert_eq!(ring.count(), 5);
    }

    #[test]
    fn remove_rejects_missing_id() {
        let mut ring = ring_of(5);

        assert_eq!(
            ring.remove("17"),
            Err(Error::NodeNotFound("17".to_string()))
        );
        assert_eq!(ring.count(), 5);
    }

    #[test]
    fn removing_every_node_empties_the_ring() {
        let mut ring = ring_of(3);

        for id in ["0", "1", "2"] {
            ring.remove(id).unwrap();
        }

        assert!(ring.is_empty());
        assert_eq!(ring.vnodes(), 0);
        assert_eq!(ring.get_node("key"), Err(Error::EmptyRing));
    }

    #[test]
    fn lookups_are_deterministic() {
        let first = ring_of(20);
        let second = ring_of(20);

        assert_eq!(owners(&first, 2000), owners(&second, 2000));
    }

    #[test]
    fn add_then_remove_is_an_inverse() {
        let mut ring = ring_of(10);
        let before = owners(&ring, 2000);

        ring.add(Node::new("extra", 999)).unwrap();
        ring.remove("extra").unwrap();

        assert_eq!(owners(&ring, 2000), before);
        assert_eq!(ring.vnodes(), 10 * ring.replicas() as usize);
    }

    #[test]
    fn adding_a_node_moves_a_small_fraction_of_keys() {
        let mut ring = ring_of(50);
        let before = owners(&ring, 10_000);

        ring.add(Node::new("50", 50)).unwrap();
        let after = owners(&ring, 10_000);

        let moved: Vec<usize> = (0..10_000).filter(|i| before[*i] != after[*i]).collect();

        // Expected fraction is 1/51 of 10_000 keys; allow a ±50% band.
        let expected = 10_000 / 51;
        assert!(moved.len() > expected / 2, "moved {}", moved.len());
        assert!(moved.len() < expected * 3 / 2, "moved {}", moved.len());

        // A key may only move onto the node that joined.
        for i in moved {
            assert_eq!(after[i], "50");
        }
    }

    #[test]
    fn thousand_nodes_lose_one() {
        let mut ring = ring_of(1000);
        let before = owners(&ring, 100_000);

        ring.remove("1").unwrap();
        let after = owners(&ring, 100_000);

        let moved: Vec<usize> = (0..100_000).filter(|i| before[*i] != after[*i]).collect();

        // ~100_000/1000 keys belonged to the removed node; ±50% band.
        assert!(!moved.is_empty());
        assert!(moved.len() < 100_000);
        assert!(moved.len() >= 50, "moved {}", moved.len());
        assert!(moved.len() <= 150, "moved {}", moved.len());

        for i in 0..100_000 {
            // Nothing maps to the removed node, and only its keys moved.
            assert_ne!(after[i], "1");
            if before[i] != "1" {
                assert_eq!(before[i], after[i]);
            }
        }
    }

    #[test]
    fn get_nodes_returns_distinct_nodes_clockwise() {
        let ring = ring_of(10);

        let replicas = ring.get_nodes("some-key", 3).unwrap();

        assert_eq!(replicas.len(), 3);
        assert_eq!(replicas[0], ring.get_node("some-key").unwrap());

        let mut ids: Vec<&str> = replicas.iter().map(|node| node.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn get_nodes_caps_at_membership() {
        let ring = ring_of(3);

        assert_eq!(ring.get_nodes("k", 10).unwrap().len(), 3);
        assert_eq!(ring.get_nodes("k", 0).unwrap().len(), 0);
    }

    #[test]
    fn payloads_resolve_through_lookups() {
        let mut ring = HashRing::new();
        ring.init(vec![
            Node::new("a", "10.0.0.1:9000"),
            Node::new("b", "10.0.0.2:9000"),
        ])
        .unwrap();

        let node = ring.get_node("user:42").unwrap();

        assert!(node.payload().starts_with("10.0.0."));
    }

    #[test]
    #[should_panic(expected = "Config::replicas must be at least 1")]
    fn zero_replicas_is_a_programmer_error() {
        let config = Config {
            replicas: 0,
            ..Config::default()
        };

        let _ring: HashRing<()> = HashRing::with_config(config);
    }
}
