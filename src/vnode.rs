//! Virtual point placement.

use crate::hasher::KeyHasher;
use crate::ring::Ring;
use crate::{Error, Result};

/// Upper bound on salted rehashes per virtual point before giving up with
/// [Error::PositionsExhausted].
const MAX_REHASH_ATTEMPTS: u32 = 32;

/// Expand a node id into its `replicas` ring positions.
///
/// Position `i` is the hash of `"{id}#{i}"`. A position already taken, by
/// the ring or earlier in this batch, is rehashed with an attempt salt
/// (`"{id}#{i}#{attempt}"`) until a free one turns up. The salting is pure,
/// so the same node set placed in the same order always produces the same
/// ring.
///
/// Nothing is inserted here; callers get the full vetted batch back, which
/// keeps membership changes all-or-nothing.
pub(crate) fn positions_for(
    hasher: &dyn KeyHasher,
    replicas: u32,
    id: &str,
    ring: &Ring,
) -> Result<Vec<u64>> {
    let mut positions = Vec::with_capacity(replicas as usize);

    for replica in 0..replicas {
        let position = place(hasher, id, replica, ring, &positions)?;

        positions.push(position);
    }

    Ok(positions)
}

fn place(
    hasher: &dyn KeyHasher,
    id: &str,
    replica: u32,
    ring: &Ring,
    batch: &[u64],
) -> Result<u64> {
    for attempt in 0..MAX_REHASH_ATTEMPTS {
        let position = hasher.hash(point_label(id, replica, attempt).as_bytes());

        if !ring.contains(position) && !batch.contains(&position) {
            return Ok(position);
        }
    }

    Err(Error::PositionsExhausted {
        id: id.to_string(),
        attempts: MAX_REHASH_ATTEMPTS,
    })
}

fn point_label(id: &str, replica: u32, attempt: u32) -> String {
    if attempt == 0 {
        format!("{}#{}", id, replica)
    } else {
        format!("{}#{}#{}", id, replica, attempt)
    }
}
