// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Ternary hypervector algebra.
//!
//! A [`Hypervector`] is a fixed-width vector over {-1, 0, +1}. Freshly
//! generated vectors are bipolar; zeros only appear through bundling ties,
//! noise injection and decay (partial erasure).
//!
//! - **bind**: element-wise product, self-inverse for bipolar operands
//! - **bundle**: element-wise sum, sign-thresholded (ties become 0)
//! - **permute**: cyclic rotation, inverted by the opposite shift
//! - **similarity**: cosine over the ternary components
//!
//! Every operation is O(D) and returns a new vector; the component buffer is
//! shared behind an `Arc` and never mutated after construction.

use std::fmt;
use std::sync::Arc;

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::{HolomemError, HolomemResult};

/// Default hypervector width.
pub const DEFAULT_DIMENSIONS: usize = 10_000;

/// Cut-off applied after a weighted blend: anything weaker becomes 0.
const BLEND_THRESHOLD: f64 = 0.3;

/// Derive a stable 64-bit seed from a symbolic label.
pub fn seed_from_label(label: &str) -> u64 {
    let digest = Sha256::digest(label.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

/// An immutable ternary hypervector.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<i8>", into = "Vec<i8>")]
pub struct Hypervector {
    components: Arc<[i8]>,
}

impl Hypervector {
    fn from_vec_unchecked(components: Vec<i8>) -> Self {
        Self {
            components: components.into(),
        }
    }

    /// The neutral vector (bundle of nothing).
    pub fn zeros(dimensions: usize) -> Self {
        Self::from_vec_unchecked(vec![0; dimensions])
    }

    /// Uniform bipolar vector from the thread-local generator.
    pub fn random(dimensions: usize) -> Self {
        Self::random_with(dimensions, &mut rand::rng())
    }

    /// Uniform bipolar vector drawn from the supplied generator.
    pub fn random_with<R: Rng + ?Sized>(dimensions: usize, rng: &mut R) -> Self {
        let components = (0..dimensions)
            .map(|_| if rng.random::<bool>() { 1 } else { -1 })
            .collect();
        Self::from_vec_unchecked(components)
    }

    /// Deterministic bipolar vector: the same seed always yields the same vector.
    pub fn seeded(dimensions: usize, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Self::random_with(dimensions, &mut rng)
    }

    /// Deterministic bipolar vector for a symbolic label.
    pub fn from_label(dimensions: usize, label: &str) -> Self {
        Self::seeded(dimensions, seed_from_label(label))
    }

    /// Build from raw components, rejecting anything outside {-1, 0, +1}.
    pub fn from_components(components: Vec<i8>) -> HolomemResult<Self> {
        if let Some(bad) = components.iter().find(|c| !(-1..=1).contains(*c)) {
            return Err(HolomemError::InvalidComponent(*bad));
        }
        Ok(Self::from_vec_unchecked(components))
    }

    pub fn dimensions(&self) -> usize {
        self.components.len()
    }

    pub fn components(&self) -> &[i8] {
        &self.components
    }

    /// Bind two vectors (element-wise product).
    ///
    /// The result is dissimilar to both operands; binding it again with
    /// either bipolar operand recovers the other.
    pub fn bind(&self, other: &Hypervector) -> HolomemResult<Hypervector> {
        HolomemError::check_dimensions(self.dimensions(), other.dimensions())?;
        let components = self
            .components
            .iter()
            .zip(other.components.iter())
            .map(|(&a, &b)| a * b)
            .collect();
        Ok(Self::from_vec_unchecked(components))
    }

    /// Inverse of [`bind`](Self::bind). Binding is its own inverse.
    pub fn unbind(&self, other: &Hypervector) -> HolomemResult<Hypervector> {
        self.bind(other)
    }

    /// Superpose any number of vectors: element-wise sum, then sign.
    ///
    /// An empty input yields the zero vector of the requested width.
    pub fn bundle(dimensions: usize, vectors: &[&Hypervector]) -> HolomemResult<Hypervector> {
        let mut sums = vec![0i32; dimensions];
        for vector in vectors {
            HolomemError::check_dimensions(dimensions, vector.dimensions())?;
            for (sum, &c) in sums.iter_mut().zip(vector.components.iter()) {
                *sum += c as i32;
            }
        }
        Ok(Self::from_vec_unchecked(
            sums.into_iter().map(|s| s.signum() as i8).collect(),
        ))
    }

    /// Cyclic rotation by `shift` positions (negative shifts rotate left).
    pub fn permute(&self, shift: isize) -> Hypervector {
        let dim = self.dimensions();
        if dim == 0 {
            return self.clone();
        }
        let amount = shift.rem_euclid(dim as isize) as usize;
        let mut components = self.components.to_vec();
        components.rotate_right(amount);
        Self::from_vec_unchecked(components)
    }

    /// Cosine similarity in [-1, 1]. A zero vector is similar to nothing (0.0).
    pub fn similarity(&self, other: &Hypervector) -> HolomemResult<f64> {
        HolomemError::check_dimensions(self.dimensions(), other.dimensions())?;
        let mut dot = 0i64;
        let mut norm_a = 0i64;
        let mut norm_b = 0i64;
        for (&a, &b) in self.components.iter().zip(other.components.iter()) {
            dot += (a * b) as i64;
            norm_a += (a * a) as i64;
            norm_b += (b * b) as i64;
        }
        if norm_a == 0 || norm_b == 0 {
            return Ok(0.0);
        }
        Ok(dot as f64 / ((norm_a as f64) * (norm_b as f64)).sqrt())
    }

    /// Component-wise negation.
    pub fn negate(&self) -> Hypervector {
        Self::from_vec_unchecked(self.components.iter().map(|&c| -c).collect())
    }

    /// Move a `ratio` fraction of randomly chosen components to a different
    /// value (the other sign, or 0).
    pub fn add_noise<R: Rng + ?Sized>(&self, ratio: f64, rng: &mut R) -> Hypervector {
        let dim = self.dimensions();
        let count = ((ratio.clamp(0.0, 1.0) * dim as f64).round() as usize).min(dim);
        if count == 0 {
            return self.clone();
        }
        let mut components = self.components.to_vec();
        for index in rand::seq::index::sample(rng, dim, count).iter() {
            let alternatives: [i8; 2] = match components[index] {
                1 => [-1, 0],
                -1 => [1, 0],
                _ => [1, -1],
            };
            components[index] = alternatives[rng.random_range(0..2)];
        }
        Self::from_vec_unchecked(components)
    }

    /// Weighted blend then threshold: `weight·self + (1−weight)·other`, with
    /// weak components (|x| ≤ 0.3) erased to 0.
    pub fn blend(&self, other: &Hypervector, weight: f64) -> HolomemResult<Hypervector> {
        HolomemError::check_dimensions(self.dimensions(), other.dimensions())?;
        let weight = weight.clamp(0.0, 1.0);
        let components = self
            .components
            .iter()
            .zip(other.components.iter())
            .map(|(&a, &b)| {
                let mixed = weight * a as f64 + (1.0 - weight) * b as f64;
                if mixed > BLEND_THRESHOLD {
                    1
                } else if mixed < -BLEND_THRESHOLD {
                    -1
                } else {
                    0
                }
            })
            .collect();
        Ok(Self::from_vec_unchecked(components))
    }

    /// Take each component from `other` with probability `ratio`.
    pub fn blend_random<R: Rng + ?Sized>(
        &self,
        other: &Hypervector,
        ratio: f64,
        rng: &mut R,
    ) -> HolomemResult<Hypervector> {
        HolomemError::check_dimensions(self.dimensions(), other.dimensions())?;
        let ratio = ratio.clamp(0.0, 1.0);
        let components = self
            .components
            .iter()
            .zip(other.components.iter())
            .map(|(&a, &b)| if rng.random_bool(ratio) { b } else { a })
            .collect();
        Ok(Self::from_vec_unchecked(components))
    }

    /// Number of +1 and −1 components.
    pub fn balance(&self) -> (usize, usize) {
        self.components.iter().fold((0, 0), |(pos, neg), &c| match c {
            1 => (pos + 1, neg),
            -1 => (pos, neg + 1),
            _ => (pos, neg),
        })
    }

    pub fn nonzero_count(&self) -> usize {
        self.components.iter().filter(|&&c| c != 0).count()
    }

    /// Fraction of erased (zero) components.
    pub fn zero_fraction(&self) -> f64 {
        if self.dimensions() == 0 {
            return 1.0;
        }
        1.0 - self.nonzero_count() as f64 / self.dimensions() as f64
    }

    pub fn is_zero(&self) -> bool {
        self.components.iter().all(|&c| c == 0)
    }

    pub fn is_bipolar(&self) -> bool {
        self.components.iter().all(|&c| c != 0)
    }
}

impl TryFrom<Vec<i8>> for Hypervector {
    type Error = HolomemError;

    fn try_from(components: Vec<i8>) -> Result<Self, Self::Error> {
        Self::from_components(components)
    }
}

impl From<Hypervector> for Vec<i8> {
    fn from(vector: Hypervector) -> Self {
        vector.components.to_vec()
    }
}

impl fmt::Debug for Hypervector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (pos, neg) = self.balance();
        write!(
            f,
            "Hypervector(dim={}, +1={}, -1={}, zero={:.3})",
            self.dimensions(),
            pos,
            neg,
            self.zero_fraction()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const D: usize = DEFAULT_DIMENSIONS;

    #[test]
    fn test_random_is_bipolar_and_balanced() {
        let v = Hypervector::seeded(D, 7);
        assert!(v.is_bipolar());
        let (pos, neg) = v.balance();
        assert_eq!(pos + neg, D);
        let skew = (pos as f64 - neg as f64).abs() / D as f64;
        assert!(skew < 0.05, "skew = {}", skew);
    }

    #[test]
    fn test_seeded_is_deterministic() {
        assert_eq!(Hypervector::seeded(D, 42), Hypervector::seeded(D, 42));
        assert_ne!(Hypervector::seeded(D, 42), Hypervector::seeded(D, 43));
        assert_eq!(
            Hypervector::from_label(D, "causes"),
            Hypervector::from_label(D, "causes")
        );
    }

    #[test]
    fn test_self_similarity_is_one() {
        let v = Hypervector::random(D);
        assert!((v.similarity(&v).unwrap() - 1.0).abs() < 1e-12);
        let noisy = v.add_noise(0.3, &mut rand::rng());
        assert!((noisy.similarity(&noisy).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_similarity_is_symmetric() {
        let a = Hypervector::seeded(D, 1);
        let b = Hypervector::seeded(D, 2).add_noise(0.2, &mut ChaCha8Rng::seed_from_u64(9));
        assert_eq!(a.similarity(&b).unwrap(), b.similarity(&a).unwrap());
    }

    #[test]
    fn test_random_vectors_are_near_orthogonal() {
        let a = Hypervector::random(D);
        let b = Hypervector::random(D);
        let sim = a.similarity(&b).unwrap();
        assert!(sim.abs() < 0.05, "sim = {}", sim);
    }

    #[test]
    fn test_bind_is_dissimilar_and_self_inverse() {
        let a = Hypervector::seeded(D, 11);
        let b = Hypervector::seeded(D, 12);
        let bound = a.bind(&b).unwrap();

        assert!(bound.similarity(&a).unwrap().abs() < 0.05);
        assert!(bound.similarity(&b).unwrap().abs() < 0.05);

        let recovered = bound.unbind(&b).unwrap();
        assert_eq!(recovered, a);
        assert!((recovered.similarity(&a).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_bundle_is_similar_to_members() {
        let a = Hypervector::seeded(D, 21);
        let b = Hypervector::seeded(D, 22);
        let c = Hypervector::seeded(D, 23);
        let bundled = Hypervector::bundle(D, &[&a, &b, &c]).unwrap();
        for member in [&a, &b, &c] {
            let sim = bundled.similarity(member).unwrap();
            assert!(sim > 0.3, "sim = {}", sim);
        }
        let outsider = Hypervector::seeded(D, 24);
        assert!(bundled.similarity(&outsider).unwrap().abs() < 0.05);
    }

    #[test]
    fn test_bundle_ties_become_zero() {
        let a = Hypervector::from_components(vec![1, 1, -1, 0]).unwrap();
        let b = Hypervector::from_components(vec![1, -1, -1, 0]).unwrap();
        let bundled = Hypervector::bundle(4, &[&a, &b]).unwrap();
        assert_eq!(bundled.components(), &[1, 0, -1, 0]);
    }

    #[test]
    fn test_empty_bundle_is_zero_vector() {
        let empty = Hypervector::bundle(D, &[]).unwrap();
        assert!(empty.is_zero());
        assert_eq!(empty.dimensions(), D);
        assert_eq!(empty.similarity(&Hypervector::random(D)).unwrap(), 0.0);
    }

    #[test]
    fn test_permute_round_trip() {
        let v = Hypervector::random(D);
        for shift in [0isize, 1, 7, 100, -3, 12_345, -(D as isize) - 1] {
            assert_eq!(v.permute(shift).permute(-shift), v);
        }
        assert!(v.permute(1).similarity(&v).unwrap().abs() < 0.05);
    }

    #[test]
    fn test_permute_rotates_right() {
        let v = Hypervector::from_components(vec![1, 0, -1, 0]).unwrap();
        assert_eq!(v.permute(1).components(), &[0, 1, 0, -1]);
        assert_eq!(v.permute(-1).components(), &[0, -1, 0, 1]);
    }

    #[test]
    fn test_dimension_mismatch_is_rejected() {
        let a = Hypervector::random(100);
        let b = Hypervector::random(200);
        assert!(matches!(
            a.bind(&b),
            Err(HolomemError::DimensionMismatch { expected: 100, actual: 200 })
        ));
        assert!(a.similarity(&b).is_err());
        assert!(Hypervector::bundle(100, &[&a, &b]).is_err());
    }

    #[test]
    fn test_add_noise_changes_expected_fraction() {
        let v = Hypervector::seeded(D, 5);
        let noisy = v.add_noise(0.1, &mut ChaCha8Rng::seed_from_u64(1));
        let changed = v
            .components()
            .iter()
            .zip(noisy.components())
            .filter(|(a, b)| a != b)
            .count();
        assert_eq!(changed, D / 10);
        assert!(noisy.similarity(&v).unwrap() > 0.7);
    }

    #[test]
    fn test_blend_erases_disagreements() {
        let a = Hypervector::from_components(vec![1, 1, -1, -1]).unwrap();
        let b = Hypervector::from_components(vec![1, -1, -1, 1]).unwrap();
        let blended = a.blend(&b, 0.6).unwrap();
        assert_eq!(blended.components(), &[1, 0, -1, 0]);
    }

    #[test]
    fn test_invalid_component_rejected() {
        assert_eq!(
            Hypervector::from_components(vec![1, 2]).unwrap_err(),
            HolomemError::InvalidComponent(2)
        );
        let json = "[1, -1, 3]";
        assert!(serde_json::from_str::<Hypervector>(json).is_err());
    }

    #[test]
    fn test_negate() {
        let v = Hypervector::random(D);
        assert!((v.negate().similarity(&v).unwrap() + 1.0).abs() < 1e-12);
    }
}
