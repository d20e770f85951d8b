//! # Artifact Digests
//!
//! SHA-256 content digests for rendered pack artifacts. The external
//! renderer reports a file reference plus its digest; storing the digest
//! alongside the reference lets auditors verify that the file a regulator
//! received is the file the engine finalized.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors constructing an [`ArtifactDigest`] from untrusted input.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DigestError {
    /// Input was not 64 characters long.
    #[error("digest must be 64 hex characters, got {0}")]
    BadLength(usize),

    /// Input contained a non-lowercase-hex character.
    #[error("digest must be lowercase hex, found {0:?}")]
    BadCharacter(char),
}

/// A hex-encoded SHA-256 digest of a rendered pack artifact.
///
/// Always exactly 64 lowercase hex characters; enforced at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactDigest(String);

impl ArtifactDigest {
    /// Compute the digest of raw artifact bytes.
    pub fn compute(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(hex_encode(&hasher.finalize()))
    }

    /// Accept a digest reported by an external renderer.
    pub fn from_hex(s: &str) -> Result<Self, DigestError> {
        if s.len() != 64 {
            return Err(DigestError::BadLength(s.len()));
        }
        if let Some(c) = s.chars().find(|c| !matches!(c, '0'..='9' | 'a'..='f')) {
            return Err(DigestError::BadCharacter(c));
        }
        Ok(Self(s.to_string()))
    }

    /// The hex representation.
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ArtifactDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(String::with_capacity(64), |mut out, b| {
        // Writing to a String cannot fail.
        let _ = write!(out, "{b:02x}");
        out
    })
}
