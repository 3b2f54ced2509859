//! Ring configurations.

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use crate::hasher::{KeyHasher, Sha1Hasher};

/// Default number of virtual points per node.
///
/// 100..200 keeps per-node load within a few percent of even for realistic
/// cluster sizes; raising it smooths the spread further at the cost of
/// memory and mutation time.
pub const DEFAULT_REPLICAS: u32 = 150;

/// Hash ring configurations.
#[derive(Clone)]
pub struct Config {
    /// Number of virtual points each node is expanded into.
    ///
    /// Fixed for the lifetime of the ring; must be at least 1.
    ///
    /// Defaults to [DEFAULT_REPLICAS].
    pub replicas: u32,
    /// Hash primitive used for both keys and virtual points.
    ///
    /// Swapping it changes every assignment, so pick one per ring and keep
    /// it.
    ///
    /// Defaults to [Sha1Hasher].
    pub hasher: Arc<dyn KeyHasher>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            replicas: DEFAULT_REPLICAS,
            hasher: Arc::new(Sha1Hasher),
        }
    }
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Config {{ replicas: {} }}", self.replicas)
    }
}
