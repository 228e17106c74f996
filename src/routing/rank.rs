//! Rank selection by modulus hashing.
//!
//! `rank = big_endian(sha256(key)) mod N`
//!
//! The digest is treated as one 256-bit unsigned integer. The modulus is
//! folded byte by byte, so no bignum type is needed and no bits are dropped.
//! SHA-256 carries no per-process seed: a key maps to the same rank across
//! restarts and hosts for as long as N stays the same.

use std::fmt;
use std::num::NonZeroU64;

use sha2::{Digest, Sha256};

/// Number of backend partitions. Always greater than zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionCount(NonZeroU64);

impl PartitionCount {
    /// Returns `None` for zero.
    pub fn new(count: u64) -> Option<Self> {
        NonZeroU64::new(count).map(Self)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for PartitionCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Map a routing key to a rank in `[0, partitions)`.
pub fn select_rank(key: &[u8], partitions: PartitionCount) -> u64 {
    let digest = Sha256::digest(key);
    big_endian_mod(&digest, partitions.get())
}

/// `bytes` read as a big-endian unsigned integer, modulo `modulus`.
fn big_endian_mod(bytes: &[u8], modulus: u64) -> u64 {
    let modulus = u128::from(modulus);
    let rem = bytes
        .iter()
        .fold(0u128, |rem, &byte| ((rem << 8) | u128::from(byte)) % modulus);
    // rem < modulus <= u64::MAX
    rem as u64
}
