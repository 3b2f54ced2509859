//! Pluggable key hashing.

use crc::{Crc, CRC_32_ISCSI};
use sha1_smol::Sha1;

const CASTAGNOLI: Crc<u32> = Crc::<u32>::new(&CRC_32_ISCSI);

/// Deterministic `bytes -> u64` hash used to place both keys and virtual
/// points on the ring.
///
/// Implementations must be pure: the same input yields the same output
/// across calls and across processes. Runtime identity hashes (pointer
/// addresses, randomly seeded SipHash state) violate that and must not be
/// used here.
pub trait KeyHasher: Send + Sync {
    /// Hash `key` to a position on the 64 bit ring.
    fn hash(&self, key: &[u8]) -> u64;
}

/// Default hasher: SHA-1 digest truncated to its first 8 bytes (big-endian).
///
/// The cryptographic avalanche keeps virtual points well spread even when
/// node ids differ in a single character.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha1Hasher;

impl KeyHasher for Sha1Hasher {
    fn hash(&self, key: &[u8]) -> u64 {
        let mut hasher = Sha1::new();
        hasher.update(key);

        let digest = hasher.digest().bytes();

        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);

        u64::from_be_bytes(head)
    }
}

/// Faster, non-cryptographic alternative based on CRC-32C (Castagnoli).
///
/// Two checksums are folded into 64 bits: the plain one in the high half and
/// a length-prefixed one in the low half. Spread is noticeably worse than
/// [Sha1Hasher]; reach for this only when hashing dominates your profiles.
#[derive(Debug, Clone, Copy, Default)]
pub struct Crc32Hasher;

impl KeyHasher for Crc32Hasher {
    fn hash(&self, key: &[u8]) -> u64 {
        let high = CASTAGNOLI.checksum(key);

        let mut digest = CASTAGNOLI.digest();
        digest.update(&(key.len() as u64).to_be_bytes());
        digest.update(key);
        let low = digest.finalize();

        ((high as u64) << 32) | low as u64
    }
}
