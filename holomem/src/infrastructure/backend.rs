// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Bulk vector math backends.
//!
//! [`VectorMath`] dispatches batch operations to an optional accelerated
//! backend and falls back to the scalar algebra whenever the backend is absent
//! or fails. Backend failures are logged and counted, never propagated.
//! Dimension checks happen before dispatch so a mismatch is still fatal.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::error::{HolomemError, HolomemResult};
use crate::domain::hypervector::Hypervector;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Backend computation failed: {0}")]
    Failed(String),
}

impl From<HolomemError> for BackendError {
    fn from(err: HolomemError) -> Self {
        BackendError::Failed(err.to_string())
    }
}

/// Batch implementation of bind, bundle and similarity.
///
/// Implementations must be numerically equivalent to the scalar algebra.
pub trait VectorBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn bind_batch(
        &self,
        pairs: &[(&Hypervector, &Hypervector)],
    ) -> Result<Vec<Hypervector>, BackendError>;

    fn bundle(
        &self,
        dimensions: usize,
        vectors: &[&Hypervector],
    ) -> Result<Hypervector, BackendError>;

    fn similarity_batch(
        &self,
        query: &Hypervector,
        candidates: &[&Hypervector],
    ) -> Result<Vec<f64>, BackendError>;
}

/// Reference backend: the plain per-vector algebra.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarBackend;

impl VectorBackend for ScalarBackend {
    fn name(&self) -> &'static str {
        "scalar"
    }

    fn bind_batch(
        &self,
        pairs: &[(&Hypervector, &Hypervector)],
    ) -> Result<Vec<Hypervector>, BackendError> {
        pairs
            .iter()
            .map(|(a, b)| a.bind(b).map_err(BackendError::from))
            .collect()
    }

    fn bundle(
        &self,
        dimensions: usize,
        vectors: &[&Hypervector],
    ) -> Result<Hypervector, BackendError> {
        Ok(Hypervector::bundle(dimensions, vectors)?)
    }

    fn similarity_batch(
        &self,
        query: &Hypervector,
        candidates: &[&Hypervector],
    ) -> Result<Vec<f64>, BackendError> {
        candidates
            .iter()
            .map(|c| query.similarity(c).map_err(BackendError::from))
            .collect()
    }
}

/// Data-parallel backend over the rayon thread pool.
#[cfg(feature = "parallel")]
#[derive(Debug, Clone, Copy, Default)]
pub struct RayonBackend;

#[cfg(feature = "parallel")]
impl VectorBackend for RayonBackend {
    fn name(&self) -> &'static str {
        "rayon"
    }

    fn bind_batch(
        &self,
        pairs: &[(&Hypervector, &Hypervector)],
    ) -> Result<Vec<Hypervector>, BackendError> {
        use rayon::prelude::*;
        pairs
            .par_iter()
            .map(|(a, b)| a.bind(b).map_err(BackendError::from))
            .collect()
    }

    fn bundle(
        &self,
        dimensions: usize,
        vectors: &[&Hypervector],
    ) -> Result<Hypervector, BackendError> {
        use rayon::prelude::*;
        let components: Vec<i8> = (0..dimensions)
            .into_par_iter()
            .map(|i| {
                vectors
                    .iter()
                    .map(|v| v.components()[i] as i32)
                    .sum::<i32>()
                    .signum() as i8
            })
            .collect();
        Ok(Hypervector::from_components(components)?)
    }

    fn similarity_batch(
        &self,
        query: &Hypervector,
        candidates: &[&Hypervector],
    ) -> Result<Vec<f64>, BackendError> {
        use rayon::prelude::*;
        candidates
            .par_iter()
            .map(|c| query.similarity(c).map_err(BackendError::from))
            .collect()
    }
}

/// Front door for batch math with transparent scalar fallback.
#[derive(Clone)]
pub struct VectorMath {
    accelerated: Option<Arc<dyn VectorBackend>>,
    scalar: ScalarBackend,
}

impl std::fmt::Debug for VectorMath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorMath")
            .field("backend", &self.backend_name())
            .finish()
    }
}

impl Default for VectorMath {
    fn default() -> Self {
        Self::scalar()
    }
}

impl VectorMath {
    pub fn scalar() -> Self {
        Self {
            accelerated: None,
            scalar: ScalarBackend,
        }
    }

    pub fn with_backend(backend: Arc<dyn VectorBackend>) -> Self {
        Self {
            accelerated: Some(backend),
            scalar: ScalarBackend,
        }
    }

    /// Pick the best backend compiled into this build.
    pub fn from_config(accelerated: bool) -> Self {
        if !accelerated {
            return Self::scalar();
        }
        #[cfg(feature = "parallel")]
        {
            debug!("Using rayon vector backend");
            Self::with_backend(Arc::new(RayonBackend))
        }
        #[cfg(not(feature = "parallel"))]
        {
            debug!("Accelerated backend requested but not compiled in; using scalar algebra");
            Self::scalar()
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match &self.accelerated {
            Some(backend) => backend.name(),
            None => self.scalar.name(),
        }
    }

    fn fallback(backend: &dyn VectorBackend, operation: &str, err: &BackendError) {
        warn!(
            backend = backend.name(),
            operation,
            error = %err,
            "Accelerated backend failed, falling back to scalar algebra"
        );
        metrics::counter!("holomem_backend_fallbacks_total").increment(1);
    }

    pub fn similarity_batch(
        &self,
        query: &Hypervector,
        candidates: &[&Hypervector],
    ) -> HolomemResult<Vec<f64>> {
        for candidate in candidates {
            HolomemError::check_dimensions(query.dimensions(), candidate.dimensions())?;
        }
        if let Some(backend) = &self.accelerated {
            match backend.similarity_batch(query, candidates) {
                Ok(scores) if scores.len() == candidates.len() => return Ok(scores),
                Ok(scores) => Self::fallback(
                    backend.as_ref(),
                    "similarity_batch",
                    &BackendError::Failed(format!(
                        "returned {} scores for {} candidates",
                        scores.len(),
                        candidates.len()
                    )),
                ),
                Err(err) => Self::fallback(backend.as_ref(), "similarity_batch", &err),
            }
        }
        candidates.iter().map(|c| query.similarity(c)).collect()
    }

    pub fn bundle(&self, dimensions: usize, vectors: &[&Hypervector]) -> HolomemResult<Hypervector> {
        for vector in vectors {
            HolomemError::check_dimensions(dimensions, vector.dimensions())?;
        }
        if let Some(backend) = &self.accelerated {
            match backend.bundle(dimensions, vectors) {
                Ok(bundled) if bundled.dimensions() == dimensions => return Ok(bundled),
                Ok(bundled) => Self::fallback(
                    backend.as_ref(),
                    "bundle",
                    &BackendError::Failed(format!(
                        "returned width {} instead of {}",
                        bundled.dimensions(),
                        dimensions
                    )),
                ),
                Err(err) => Self::fallback(backend.as_ref(), "bundle", &err),
            }
        }
        Hypervector::bundle(dimensions, vectors)
    }

    pub fn bind_batch(
        &self,
        pairs: &[(&Hypervector, &Hypervector)],
    ) -> HolomemResult<Vec<Hypervector>> {
        for (a, b) in pairs {
            HolomemError::check_dimensions(a.dimensions(), b.dimensions())?;
        }
        if let Some(backend) = &self.accelerated {
            match backend.bind_batch(pairs) {
                Ok(bound) if bound.len() == pairs.len() => return Ok(bound),
                Ok(_) => Self::fallback(
                    backend.as_ref(),
                    "bind_batch",
                    &BackendError::Failed("result count mismatch".to_string()),
                ),
                Err(err) => Self::fallback(backend.as_ref(), "bind_batch", &err),
            }
        }
        pairs.iter().map(|(a, b)| a.bind(b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenBackend;

    impl VectorBackend for BrokenBackend {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn bind_batch(
            &self,
            _pairs: &[(&Hypervector, &Hypervector)],
        ) -> Result<Vec<Hypervector>, BackendError> {
            Err(BackendError::Unavailable("device lost".to_string()))
        }

        fn bundle(
            &self,
            _dimensions: usize,
            _vectors: &[&Hypervector],
        ) -> Result<Hypervector, BackendError> {
            Err(BackendError::Unavailable("device lost".to_string()))
        }

        fn similarity_batch(
            &self,
            _query: &Hypervector,
            _candidates: &[&Hypervector],
        ) -> Result<Vec<f64>, BackendError> {
            Ok(vec![])
        }
    }

    fn sample() -> (Hypervector, Vec<Hypervector>) {
        let query = Hypervector::seeded(2_000, 1);
        let candidates = (2..6).map(|s| Hypervector::seeded(2_000, s)).collect();
        (query, candidates)
    }

    #[test]
    fn test_broken_backend_falls_back() {
        let (query, candidates) = sample();
        let refs: Vec<&Hypervector> = candidates.iter().collect();
        let math = VectorMath::with_backend(Arc::new(BrokenBackend));

        let scores = math.similarity_batch(&query, &refs).unwrap();
        let expected = VectorMath::scalar().similarity_batch(&query, &refs).unwrap();
        assert_eq!(scores, expected);

        let bundled = math.bundle(2_000, &refs).unwrap();
        assert_eq!(bundled, Hypervector::bundle(2_000, &refs).unwrap());

        let bound = math.bind_batch(&[(&query, refs[0])]).unwrap();
        assert_eq!(bound[0], query.bind(refs[0]).unwrap());
    }

    #[test]
    fn test_dimension_mismatch_is_not_swallowed() {
        let math = VectorMath::with_backend(Arc::new(BrokenBackend));
        let query = Hypervector::random(100);
        let other = Hypervector::random(101);
        assert!(matches!(
            math.similarity_batch(&query, &[&other]),
            Err(HolomemError::DimensionMismatch { .. })
        ));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_rayon_matches_scalar() {
        let (query, candidates) = sample();
        let refs: Vec<&Hypervector> = candidates.iter().collect();
        let rayon = VectorMath::from_config(true);
        assert_eq!(rayon.backend_name(), "rayon");

        assert_eq!(
            rayon.similarity_batch(&query, &refs).unwrap(),
            VectorMath::scalar().similarity_batch(&query, &refs).unwrap()
        );
        assert_eq!(
            rayon.bundle(2_000, &refs).unwrap(),
            Hypervector::bundle(2_000, &refs).unwrap()
        );
    }

    #[test]
    fn test_disabled_backend_is_scalar() {
        assert_eq!(VectorMath::from_config(false).backend_name(), "scalar");
    }
}
