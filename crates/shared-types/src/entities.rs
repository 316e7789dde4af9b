//! # Core Domain Entities
//!
//! Transaction identity shared by every crate that touches raw transactions.
//! Transactions themselves are opaque byte strings; the concurrency layer
//! never decodes them.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A 32-byte hash (SHA-256).
pub type Hash = [u8; 32];

/// An opaque, encoded transaction.
pub type Tx = Vec<u8>;

/// SHA-256 digest of a raw transaction, used to correlate log lines.
///
/// Displays as uppercase hex, the format block explorers and the consensus
/// engine's logs use for transaction hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct TxHash(pub Hash);

impl TxHash {
    /// Hash a raw transaction.
    #[must_use]
    pub fn of(tx: &[u8]) -> Self {
        let digest = Sha256::digest(tx);
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        Self(out)
    }

    /// Raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &Hash {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(self.0))
    }
}
