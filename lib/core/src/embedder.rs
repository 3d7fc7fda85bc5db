//! Embedder boundary.
//!
//! The embedding model is external: anything that turns a batch of
//! normalized strings into unit-length vectors of one fixed dimension can
//! sit behind [`Embedder`]. [`HashEmbedder`] is the deterministic, offline
//! implementation used by the CLI and the tests.

use crate::error::{Error, Result};
use crate::vector::Vector;
use ahash::AHashSet;
use sha2::{Digest, Sha256};

/// Maps text to fixed-dimension, L2-normalized vectors.
///
/// `encode` is synchronous and whole-batch: it returns one vector per input,
/// in input order, or fails for the entire batch.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;

    fn encode(&self, batch: &[String]) -> Result<Vec<Vector>>;
}

/// Run an embedder and check its output shape: one finite vector of
/// `embedder.dim()` components per input.
pub fn encode_checked<E: Embedder + ?Sized>(embedder: &E, batch: &[String]) -> Result<Vec<Vector>> {
    let vectors = embedder.encode(batch)?;
    if vectors.len() != batch.len() {
        return Err(Error::LengthMismatch {
            context: "embedder output",
            expected: batch.len(),
            actual: vectors.len(),
        });
    }
    for v in &vectors {
        if v.dim() != embedder.dim() {
            return Err(Error::InvalidDimension {
                expected: embedder.dim(),
                actual: v.dim(),
            });
        }
        if !v.is_finite() {
            return Err(Error::Embedding("non-finite component in output".to_string()));
        }
    }
    Ok(vectors)
}

/// Character-trigram and word hashing into a fixed number of buckets.
///
/// Identical strings embed identically and strings sharing most trigrams
/// land close together, which is enough to exercise the matching pipeline
/// without a model.
#[derive(Debug, Clone, Copy)]
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidDimension {
                expected: 1,
                actual: 0,
            });
        }
        Ok(Self { dim })
    }

    #[must_use]
    pub fn embed_one(&self, text: &str) -> Vector {
        let mut data = vec![0.0f32; self.dim];
        let lowered = text.to_lowercase();

        for trigram in trigrams(&lowered) {
            data[bucket(TRIGRAM_TAG, &trigram, self.dim)] += 1.0;
        }

        // words weigh double
        for word in lowered.split_whitespace() {
            data[bucket(WORD_TAG, word, self.dim)] += 2.0;
        }

        let mut v = Vector::new(data);
        v.normalize();
        v
    }
}

impl Embedder for HashEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn encode(&self, batch: &[String]) -> Result<Vec<Vector>> {
        Ok(batch.iter().map(|t| self.embed_one(t)).collect())
    }
}

fn trigrams(s: &str) -> AHashSet<String> {
    let padded = format!("  {}  ", s);
    let chars: Vec<char> = padded.chars().collect();
    chars.windows(3).map(|w| w.iter().collect()).collect()
}

const TRIGRAM_TAG: u8 = b't';
const WORD_TAG: u8 = b'w';

/// First 8 bytes (little-endian) of SHA-256 over `tag ‖ item`, modulo `dim`.
/// Stored taxonomy vectors depend on this staying fixed.
#[inline]
fn bucket(tag: u8, item: &str, dim: usize) -> usize {
    let mut hasher = Sha256::new();
    hasher.update([tag]);
    hasher.update(item.as_bytes());
    let digest = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    (u64::from_le_bytes(head) % dim as u64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_embedder_is_unit_length() {
        let e = HashEmbedder::new(64).unwrap();
        let out = e.encode(&["crab".to_string(), String::new()]).unwrap();
        assert_eq!(out.len(), 2);
        for v in &out {
            assert_eq!(v.dim(), 64);
            assert!((v.norm() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_hash_embedder_deterministic() {
        let e = HashEmbedder::new(128).unwrap();
        assert_eq!(e.embed_one("crab"), e.embed_one("crab"));
        let sim = e.embed_one("crab").cosine_similarity(&e.embed_one("crab"));
        assert!((sim - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_bucket_is_pinned() {
        assert_eq!(bucket(TRIGRAM_TAG, "cra", 1024), 597);
        assert_eq!(bucket(WORD_TAG, "crab", 768), 78);
    }

    #[test]
    fn test_zero_dim_rejected() {
        assert!(HashEmbedder::new(0).is_err());
    }

    struct ShortEmbedder;

    impl Embedder for ShortEmbedder {
        fn dim(&self) -> usize {
            4
        }

        fn encode(&self, batch: &[String]) -> Result<Vec<Vector>> {
            Ok(batch.iter().skip(1).map(|_| Vector::new(vec![1.0, 0.0, 0.0, 0.0])).collect())
        }
    }

    #[test]
    fn test_encode_checked_rejects_short_output() {
        let batch = vec!["a".to_string(), "b".to_string()];
        assert!(matches!(
            encode_checked(&ShortEmbedder, &batch),
            Err(Error::LengthMismatch { expected: 2, actual: 1, .. })
        ));
    }
}
