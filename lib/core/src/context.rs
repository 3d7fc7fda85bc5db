//! Read-only reference data shared by every matching call.
//!
//! The taxonomy matrix and stopword set are loaded once through a
//! [`ReferenceLoader`] and then only read. A matching batch holds the read
//! guard from start to finish; [`ReferenceContext::reload`] builds the new
//! data off-lock and swaps it in under the write guard, so a reload never
//! overlaps an in-flight batch.

use crate::embedder::{encode_checked, Embedder};
use crate::error::{Error, Result};
use crate::matcher::{MatchResult, SimilarityMatcher};
use crate::taxonomy::{TaxonomyIndex, TaxonomyRow};
use crate::text::{StopwordSet, TextNormalizer};
use parking_lot::{RwLock, RwLockReadGuard};
use std::sync::Arc;
use tracing::{debug, info};

/// Source of the taxonomy vector rows and stopword rows.
pub trait ReferenceLoader: Send + Sync {
    fn load_taxonomy(&self) -> Result<Vec<TaxonomyRow>>;

    fn load_stopwords(&self) -> Result<Vec<String>>;
}

/// One consistent generation of reference data.
#[derive(Debug)]
pub struct ReferenceData {
    pub index: TaxonomyIndex,
    pub normalizer: TextNormalizer,
}

impl ReferenceData {
    pub fn new(index: TaxonomyIndex, stopwords: StopwordSet) -> Self {
        Self {
            index,
            normalizer: TextNormalizer::new(stopwords),
        }
    }
}

pub struct ReferenceContext {
    loader: Box<dyn ReferenceLoader>,
    expected_dim: Option<usize>,
    data: RwLock<Arc<ReferenceData>>,
}

impl ReferenceContext {
    /// Load reference data. `expected_dim`, when given, must equal the
    /// dimension of every taxonomy vector.
    pub fn load(loader: Box<dyn ReferenceLoader>, expected_dim: Option<usize>) -> Result<Self> {
        let data = build(loader.as_ref(), expected_dim)?;
        Ok(Self {
            loader,
            expected_dim,
            data: RwLock::new(Arc::new(data)),
        })
    }

    /// Reload from the same source. On failure the current data is kept.
    pub fn reload(&self) -> Result<()> {
        let fresh = build(self.loader.as_ref(), self.expected_dim)?;
        *self.data.write() = Arc::new(fresh);
        info!("Reference data reloaded");
        Ok(())
    }

    /// Read guard over the current generation.
    pub fn read(&self) -> RwLockReadGuard<'_, Arc<ReferenceData>> {
        self.data.read()
    }

    /// Normalize, embed and match a batch of raw ingredient strings.
    pub fn match_texts<S, E>(&self, embedder: &E, texts: &[S]) -> Result<Vec<MatchResult>>
    where
        S: AsRef<str>,
        E: Embedder + ?Sized,
    {
        let data = self.read();
        if embedder.dim() != data.index.dim() {
            return Err(Error::InvalidDimension {
                expected: data.index.dim(),
                actual: embedder.dim(),
            });
        }

        let normalized = data.normalizer.normalize(texts);
        let vectors = encode_checked(embedder, &normalized)?;
        let results = SimilarityMatcher::new().match_vectors(&vectors, &data.index)?;

        debug!(batch = texts.len(), "Matched ingredient texts");
        Ok(results)
    }
}

fn build(loader: &dyn ReferenceLoader, expected_dim: Option<usize>) -> Result<ReferenceData> {
    let rows = loader.load_taxonomy()?;
    let index = TaxonomyIndex::from_rows(rows, expected_dim)?;
    let stopwords = StopwordSet::from_phrases(loader.load_stopwords()?);

    info!(
        taxonomy = index.len(),
        dim = index.dim(),
        stopwords = stopwords.len(),
        "Reference data loaded"
    );
    Ok(ReferenceData::new(index, stopwords))
}
