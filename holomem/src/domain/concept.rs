// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Concept candidates produced by memory evolution, and their scoring.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::entry::MemoryId;
use super::error::HolomemResult;
use super::hypervector::Hypervector;

const NOVELTY_WEIGHT: f64 = 0.4;
const COHERENCE_WEIGHT: f64 = 0.3;
const UTILITY_WEIGHT: f64 = 0.3;

/// How a candidate was synthesised from its two parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisOperation {
    Bind,
    Bundle,
    /// Parent transform applied to a fresh random cue.
    Analogy,
    /// Weighted blend then threshold.
    Blend,
}

impl SynthesisOperation {
    pub const ALL: [SynthesisOperation; 4] = [
        SynthesisOperation::Bind,
        SynthesisOperation::Bundle,
        SynthesisOperation::Analogy,
        SynthesisOperation::Blend,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SynthesisOperation::Bind => "bind",
            SynthesisOperation::Bundle => "bundle",
            SynthesisOperation::Analogy => "analogy",
            SynthesisOperation::Blend => "blend",
        }
    }
}

impl fmt::Display for SynthesisOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Acceptance thresholds for generated concepts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CreativityThresholds {
    pub creativity: f64,
    pub min_novelty: f64,
    pub min_coherence: f64,
}

impl CreativityThresholds {
    /// Relaxed thresholds used while dreaming.
    pub fn halved(&self) -> Self {
        Self {
            creativity: self.creativity / 2.0,
            min_novelty: self.min_novelty / 2.0,
            min_coherence: self.min_coherence / 2.0,
        }
    }
}

/// Balance of the ±1 split: 1.0 for an even split, 0.0 when one sign dominates.
pub fn novelty_score(vector: &Hypervector) -> f64 {
    let (pos, neg) = vector.balance();
    let total = pos + neg;
    if total == 0 {
        return 0.0;
    }
    1.0 - (pos as f64 - neg as f64).abs() / total as f64
}

/// Mean similarity to the parents, floored at 0.
pub fn coherence_score(vector: &Hypervector, parents: &[&Hypervector]) -> HolomemResult<f64> {
    if parents.is_empty() {
        return Ok(0.0);
    }
    let mut total = 0.0;
    for parent in parents {
        total += vector.similarity(parent)?;
    }
    Ok((total / parents.len() as f64).max(0.0))
}

/// Closeness of the zero fraction to `target_sparsity`, in [0, 1].
pub fn utility_score(vector: &Hypervector, target_sparsity: f64) -> f64 {
    let target = target_sparsity.clamp(0.0, 1.0);
    let span = target.max(1.0 - target);
    if span == 0.0 {
        return 0.0;
    }
    (1.0 - (vector.zero_fraction() - target).abs() / span).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptCandidate {
    #[serde(skip)]
    pub vector: Option<Hypervector>,
    pub name: String,
    pub components: [MemoryId; 2],
    pub operation: SynthesisOperation,
    pub novelty: f64,
    pub coherence: f64,
    pub utility: f64,
    pub score: f64,
}

impl ConceptCandidate {
    /// Score a freshly synthesised vector against its two parents.
    pub fn evaluate(
        vector: Hypervector,
        operation: SynthesisOperation,
        parents: [(&MemoryId, &Hypervector); 2],
        target_sparsity: f64,
    ) -> HolomemResult<Self> {
        let novelty = novelty_score(&vector);
        let coherence = coherence_score(&vector, &[parents[0].1, parents[1].1])?;
        let utility = utility_score(&vector, target_sparsity);
        let score = NOVELTY_WEIGHT * novelty + COHERENCE_WEIGHT * coherence + UTILITY_WEIGHT * utility;
        let name = format!(
            "{}({},{})",
            operation,
            short_id(parents[0].0),
            short_id(parents[1].0)
        );
        Ok(Self {
            vector: Some(vector),
            name,
            components: [parents[0].0.clone(), parents[1].0.clone()],
            operation,
            novelty,
            coherence,
            utility,
            score,
        })
    }

    pub fn passes(&self, thresholds: &CreativityThresholds) -> bool {
        self.score >= thresholds.creativity
            && self.novelty >= thresholds.min_novelty
            && self.coherence >= thresholds.min_coherence
    }

    /// Ranking key used when selecting dream results to keep.
    pub fn rank(&self) -> f64 {
        self.novelty * self.coherence
    }
}

fn short_id(id: &MemoryId) -> &str {
    let s = id.as_str();
    match s.char_indices().nth(8) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const D: usize = 10_000;

    #[test]
    fn test_novelty_balanced_vs_skewed() {
        assert!(novelty_score(&Hypervector::seeded(D, 3)) > 0.95);
        let skewed = Hypervector::from_components(vec![1, 1, 1, -1]).unwrap();
        assert!((novelty_score(&skewed) - 0.5).abs() < 1e-12);
        assert_eq!(novelty_score(&Hypervector::zeros(8)), 0.0);
    }

    #[test]
    fn test_utility_peaks_at_target() {
        let dense = Hypervector::seeded(10, 1);
        assert!((utility_score(&dense, 0.2) - 0.75).abs() < 1e-12);

        let at_target = Hypervector::from_components(vec![1, -1, 1, -1, 0]).unwrap();
        assert!((utility_score(&at_target, 0.2) - 1.0).abs() < 1e-12);

        assert_eq!(utility_score(&Hypervector::zeros(10), 0.2), 0.0);
    }

    #[test]
    fn test_bundle_candidate_clears_default_threshold() {
        let a = Hypervector::seeded(D, 1);
        let b = a.blend_random(&Hypervector::seeded(D, 2), 0.4, &mut rand::rng()).unwrap();
        let id_a = MemoryId::from("aaaaaaaa-1111");
        let id_b = MemoryId::from("bbbbbbbb-2222");
        let bundled = Hypervector::bundle(D, &[&a, &b]).unwrap();
        let candidate = ConceptCandidate::evaluate(
            bundled,
            SynthesisOperation::Bundle,
            [(&id_a, &a), (&id_b, &b)],
            0.2,
        )
        .unwrap();

        assert_eq!(candidate.name, "bundle(aaaaaaaa,bbbbbbbb)");
        assert!(candidate.coherence > 0.7, "coherence = {}", candidate.coherence);
        let thresholds = CreativityThresholds {
            creativity: 0.7,
            min_novelty: 0.3,
            min_coherence: 0.2,
        };
        assert!(candidate.passes(&thresholds), "score = {}", candidate.score);
    }

    #[test]
    fn test_bind_candidate_lacks_coherence() {
        let a = Hypervector::seeded(D, 10);
        let b = Hypervector::seeded(D, 11);
        let id_a = MemoryId::from("a");
        let id_b = MemoryId::from("b");
        let candidate = ConceptCandidate::evaluate(
            a.bind(&b).unwrap(),
            SynthesisOperation::Bind,
            [(&id_a, &a), (&id_b, &b)],
            0.2,
        )
        .unwrap();
        assert!(candidate.coherence < 0.05);
        let strict = CreativityThresholds {
            creativity: 0.7,
            min_novelty: 0.3,
            min_coherence: 0.2,
        };
        assert!(!candidate.passes(&strict));
        assert!(!candidate.passes(&strict.halved()));
    }

    #[test]
    fn test_halved_thresholds() {
        let t = CreativityThresholds {
            creativity: 0.7,
            min_novelty: 0.3,
            min_coherence: 0.2,
        }
        .halved();
        assert!((t.creativity - 0.35).abs() < 1e-12);
        assert!((t.min_novelty - 0.15).abs() < 1e-12);
        assert!((t.min_coherence - 0.1).abs() < 1e-12);
    }
}
