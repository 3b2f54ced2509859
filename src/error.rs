//! Main crate error enum.

/// Errors returned by ring membership and lookup operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A lookup ran while no node had any virtual point on the ring.
    ///
    /// Recoverable; check membership, add a node and retry.
    #[error("Ring is empty")]
    EmptyRing,

    /// [add](crate::HashRing::add) was called with an id that is already
    /// present on the ring.
    #[error("Node ({0}) is already on the ring")]
    DuplicateNode(String),

    /// [remove](crate::HashRing::remove) was called with an id that has no
    /// virtual points on the ring.
    #[error("Node ({0}) is not on the ring")]
    NodeNotFound(String),

    /// The collision rehash policy ran out of attempts while placing a
    /// virtual point.
    ///
    /// Practically unreachable with 64 bit positions; seeing it means the
    /// replication factor is absurdly large relative to the hash width.
    #[error("No free position for node ({id}) after {attempts} rehash attempts")]
    PositionsExhausted {
        /// Id of the node being placed.
        id: String,
        /// How many salted rehashes were tried for the colliding point.
        attempts: u32,
    },
}

/// Alias for `Result<T, shardring::Error>`.
pub type Result<T> = std::result::Result<T, Error>;
