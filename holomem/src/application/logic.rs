// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Logical Operations - relations, consistency and analogy
//!
//! Relations are role/filler bindings. The registered relation kinds share a
//! fixed layout:
//!
//! ```text
//! bundle[ bind(subjectRole, s), bind(objectRole, o), relationVector, bind(s, o) ]
//! ```
//!
//! `before` and `after` share one temporal role pair, with `after` swapping its
//! operands, so `A before B` and `B after A` encode identically. Unregistered
//! verbs fall back to `bind(bind(s, role(verb)), o)`.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Relational and analogical queries over stored vectors

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::config::{AnalogyConfig, ConsistencyConfig};
use crate::domain::entry::MemoryId;
use crate::domain::error::HolomemResult;
use crate::domain::hypervector::Hypervector;
use crate::domain::semantic::semantic_vector;
use crate::infrastructure::backend::VectorMath;
use crate::infrastructure::repository::{MemorySubstrate, RetrievedEntry};

/// Extra candidates fetched so exclusions still leave `k` answers
const ANALOGY_OVERFETCH: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Causes,
    Before,
    After,
    At,
    Has,
    Is,
    Like,
    Custom(String),
}

impl RelationKind {
    pub fn parse(verb: &str) -> Self {
        match verb.trim().to_lowercase().as_str() {
            "causes" => RelationKind::Causes,
            "before" => RelationKind::Before,
            "after" => RelationKind::After,
            "at" => RelationKind::At,
            "has" => RelationKind::Has,
            "is" => RelationKind::Is,
            "like" => RelationKind::Like,
            other => RelationKind::Custom(other.to_string()),
        }
    }

    pub fn is_registered(&self) -> bool {
        !matches!(self, RelationKind::Custom(_))
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name: &str = match self {
            RelationKind::Causes => "causes",
            RelationKind::Before => "before",
            RelationKind::After => "after",
            RelationKind::At => "at",
            RelationKind::Has => "has",
            RelationKind::Is => "is",
            RelationKind::Like => "like",
            RelationKind::Custom(verb) => verb.as_str(),
        };
        f.write_str(name)
    }
}

/// Role layout of a registered relation.
struct RelationRoles {
    subject: Hypervector,
    object: Hypervector,
    relation: Hypervector,
    swap: bool,
}

fn registered_roles(dimensions: usize, kind: &RelationKind) -> Option<RelationRoles> {
    let role = |name: &str| semantic_vector(dimensions, &format!("role:{}", name));
    let relation = |name: &str| semantic_vector(dimensions, &format!("relation:{}", name));
    let temporal = || {
        let base = role("temporal");
        (base.permute(1), base)
    };

    let roles = match kind {
        RelationKind::Causes => RelationRoles {
            subject: role("cause"),
            object: role("effect"),
            relation: relation("causes"),
            swap: false,
        },
        RelationKind::Before | RelationKind::After => {
            let (subject, object) = temporal();
            RelationRoles {
                subject,
                object,
                relation: relation("temporal"),
                swap: matches!(kind, RelationKind::After),
            }
        }
        RelationKind::At => RelationRoles {
            subject: role("located"),
            object: role("location"),
            relation: relation("at"),
            swap: false,
        },
        RelationKind::Has => RelationRoles {
            subject: role("owner"),
            object: role("possession"),
            relation: relation("has"),
            swap: false,
        },
        RelationKind::Is => RelationRoles {
            subject: role("instance"),
            object: role("category"),
            relation: relation("is"),
            swap: false,
        },
        RelationKind::Like => {
            let similar = role("similar");
            RelationRoles {
                subject: similar.clone(),
                object: similar,
                relation: relation("like"),
                swap: false,
            }
        }
        RelationKind::Custom(_) => return None,
    };
    Some(roles)
}

#[derive(Debug, Clone)]
pub struct RelationEncoding {
    pub vector: Hypervector,
    pub kind: RelationKind,
    /// Lower when subject and object were already alike
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub first: MemoryId,
    pub second: MemoryId,
    pub similarity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub consistent: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<Conflict>,
}

#[derive(Debug, Clone)]
pub struct AnalogyResult {
    pub predicted: Hypervector,
    pub confidence: f64,
    pub candidates: Vec<RetrievedEntry>,
}

/// `A:B::C:?` by vector arithmetic.
///
/// Returns the predicted vector and a confidence of `1 − |sim(A, B)|`: a
/// transform between near-identical vectors carries no information.
pub fn analogy_vector(
    dimensions: usize,
    math: &VectorMath,
    a: &Hypervector,
    b: &Hypervector,
    c: &Hypervector,
) -> HolomemResult<(Hypervector, f64)> {
    let transform = a.bind(b)?;
    let mapped = c.bind(&transform)?;
    let negated = a.negate();
    let predicted = math.bundle(dimensions, &[&mapped, c, b, &negated])?;
    let confidence = 1.0 - a.similarity(b)?.abs();
    Ok((predicted, confidence))
}

pub struct LogicalOperations {
    dimensions: usize,
    substrate: Arc<dyn MemorySubstrate>,
    math: VectorMath,
    consistency: ConsistencyConfig,
    analogy: AnalogyConfig,
}

impl LogicalOperations {
    pub fn new(
        substrate: Arc<dyn MemorySubstrate>,
        math: VectorMath,
        consistency: ConsistencyConfig,
        analogy: AnalogyConfig,
    ) -> Self {
        Self {
            dimensions: substrate.dimensions(),
            substrate,
            math,
            consistency,
            analogy,
        }
    }

    pub fn encode_relation(
        &self,
        subject: &Hypervector,
        kind: &RelationKind,
        object: &Hypervector,
    ) -> HolomemResult<RelationEncoding> {
        let confidence = 1.0 - subject.similarity(object)?.max(0.0);

        let vector = match registered_roles(self.dimensions, kind) {
            Some(roles) => {
                let (s, o) = if roles.swap {
                    (object, subject)
                } else {
                    (subject, object)
                };
                let bound = self.math.bind_batch(&[
                    (&roles.subject, s),
                    (&roles.object, o),
                    (s, o),
                ])?;
                self.math.bundle(
                    self.dimensions,
                    &[&bound[0], &bound[1], &roles.relation, &bound[2]],
                )?
            }
            None => {
                let role = semantic_vector(self.dimensions, &format!("role:{}", kind));
                subject.bind(&role)?.bind(object)?
            }
        };

        Ok(RelationEncoding {
            vector,
            kind: kind.clone(),
            confidence,
        })
    }

    /// Flag stored pairs whose similarity falls in the suspicious middle band.
    ///
    /// Unknown ids are skipped.
    pub fn check_consistency(&self, ids: &[MemoryId]) -> HolomemResult<ConsistencyReport> {
        let entries: Vec<_> = ids.iter().filter_map(|id| self.substrate.get(id)).collect();
        let mut conflicts = Vec::new();

        for (i, first) in entries.iter().enumerate() {
            for second in &entries[i + 1..] {
                let similarity = first.vector.similarity(&second.vector)?;
                if similarity >= self.consistency.conflict_min
                    && similarity < self.consistency.conflict_max
                {
                    conflicts.push(Conflict {
                        first: first.id.clone(),
                        second: second.id.clone(),
                        similarity,
                    });
                }
            }
        }

        debug!(
            checked = entries.len(),
            conflicts = conflicts.len(),
            "Consistency check completed"
        );
        Ok(ConsistencyReport {
            consistent: conflicts.is_empty(),
            conflicts,
        })
    }

    /// Predict D for `A:B::C:D` and retrieve the nearest stored answers.
    pub fn find_analogy(
        &self,
        a: &Hypervector,
        b: &Hypervector,
        c: &Hypervector,
        k: usize,
    ) -> HolomemResult<AnalogyResult> {
        let (predicted, confidence) = analogy_vector(self.dimensions, &self.math, a, b, c)?;

        let mut candidates = Vec::new();
        for hit in self.substrate.scan(
            &predicted,
            k + ANALOGY_OVERFETCH,
            Some(self.analogy.min_similarity),
        )? {
            if self.is_operand(&hit.entry.vector, [a, b, c])? {
                continue;
            }
            candidates.push(hit);
        }
        candidates.truncate(k);

        // Only the answers count as accesses, never the excluded operands
        let ids: Vec<MemoryId> = candidates.iter().map(|hit| hit.entry.id.clone()).collect();
        for touched in self.substrate.touch(&ids) {
            if let Some(hit) = candidates.iter_mut().find(|hit| hit.entry.id == touched.id) {
                hit.entry = touched;
            }
        }

        Ok(AnalogyResult {
            predicted,
            confidence,
            candidates,
        })
    }

    fn is_operand(&self, vector: &Hypervector, operands: [&Hypervector; 3]) -> HolomemResult<bool> {
        for operand in operands {
            if vector.similarity(operand)? >= self.analogy.exclude_similarity {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entry::{EntryMetadata, Modality, ModalityContext};
    use crate::infrastructure::substrate::InMemorySubstrate;

    const D: usize = 10_000;

    fn logic() -> (Arc<InMemorySubstrate>, LogicalOperations) {
        let substrate = Arc::new(InMemorySubstrate::with_capacity(D, 100));
        let ops = LogicalOperations::new(
            substrate.clone(),
            VectorMath::scalar(),
            ConsistencyConfig::default(),
            AnalogyConfig::default(),
        );
        (substrate, ops)
    }

    fn concept(name: &str) -> Hypervector {
        semantic_vector(D, &format!("concept:{}", name))
    }

    fn store(substrate: &InMemorySubstrate, id: &str, vector: Hypervector) {
        let metadata =
            EntryMetadata::new(Modality::Relation, ModalityContext::Vector { label: None });
        substrate.store(id.into(), vector, metadata).unwrap();
    }

    #[test]
    fn test_relation_kind_parse() {
        assert_eq!(RelationKind::parse("Causes"), RelationKind::Causes);
        assert_eq!(
            RelationKind::parse("admires"),
            RelationKind::Custom("admires".to_string())
        );
        assert!(!RelationKind::parse("admires").is_registered());
        assert_eq!(RelationKind::After.to_string(), "after");
    }

    #[test]
    fn test_before_after_are_mirror_images() {
        let (_, ops) = logic();
        let (breakfast, lunch) = (concept("breakfast"), concept("lunch"));
        let before = ops
            .encode_relation(&breakfast, &RelationKind::Before, &lunch)
            .unwrap();
        let after = ops
            .encode_relation(&lunch, &RelationKind::After, &breakfast)
            .unwrap();
        assert_eq!(before.vector, after.vector);

        let reversed = ops
            .encode_relation(&lunch, &RelationKind::Before, &breakfast)
            .unwrap();
        assert!(before.vector.similarity(&reversed.vector).unwrap() < 0.9);
    }

    #[test]
    fn test_like_is_symmetric() {
        let (_, ops) = logic();
        let (cat, tiger) = (concept("cat"), concept("tiger"));
        let a = ops.encode_relation(&cat, &RelationKind::Like, &tiger).unwrap();
        let b = ops.encode_relation(&tiger, &RelationKind::Like, &cat).unwrap();
        assert_eq!(a.vector, b.vector);
    }

    #[test]
    fn test_custom_relation_fallback() {
        let (_, ops) = logic();
        let (alice, bob) = (concept("alice"), concept("bob"));
        let kind = RelationKind::Custom("admires".to_string());
        let encoded = ops.encode_relation(&alice, &kind, &bob).unwrap();
        let role = semantic_vector(D, "role:admires");
        assert_eq!(encoded.vector, alice.bind(&role).unwrap().bind(&bob).unwrap());
    }

    #[test]
    fn test_confidence_drops_for_identical_operands() {
        let (_, ops) = logic();
        let rain = concept("rain");
        let degenerate = ops.encode_relation(&rain, &RelationKind::Is, &rain).unwrap();
        assert!(degenerate.confidence.abs() < 1e-9);
        let informative = ops
            .encode_relation(&rain, &RelationKind::Is, &concept("weather"))
            .unwrap();
        assert!(informative.confidence > 0.95);
    }

    #[test]
    fn test_reversed_causal_pair_conflicts() {
        let (substrate, ops) = logic();
        let (rain, flood, sun) = (concept("rain"), concept("flood"), concept("sun"));
        let forward = ops.encode_relation(&rain, &RelationKind::Causes, &flood).unwrap();
        let backward = ops.encode_relation(&flood, &RelationKind::Causes, &rain).unwrap();
        let unrelated = ops
            .encode_relation(&sun, &RelationKind::Causes, &concept("drought"))
            .unwrap();
        store(&substrate, "forward", forward.vector);
        store(&substrate, "backward", backward.vector);
        store(&substrate, "unrelated", unrelated.vector);

        let report = ops
            .check_consistency(&["forward".into(), "backward".into(), "missing".into()])
            .unwrap();
        assert!(!report.consistent);
        assert_eq!(report.conflicts.len(), 1);
        let sim = report.conflicts[0].similarity;
        assert!(sim > 0.35 && sim < 0.85, "sim = {}", sim);

        let clean = ops
            .check_consistency(&["forward".into(), "unrelated".into()])
            .unwrap();
        assert!(clean.consistent);
        assert!(clean.conflicts.is_empty());
    }

    #[test]
    fn test_analogy_confidence_and_exclusion() {
        let (substrate, ops) = logic();
        let (a, b, c) = (concept("king"), concept("queen"), concept("man"));
        store(&substrate, "man", c.clone());

        let result = ops.find_analogy(&a, &b, &c, 5).unwrap();
        assert!(result.confidence > 0.95);
        assert!(result.candidates.iter().all(|hit| hit.entry.id.as_str() != "man"));

        let (_, degenerate) = analogy_vector(D, &VectorMath::scalar(), &a, &a, &c).unwrap();
        assert!(degenerate < 1e-9);
    }

    #[test]
    fn test_analogy_touches_answers_but_not_operands() {
        let (substrate, ops) = logic();
        let (a, b, c) = (concept("paris"), concept("france"), concept("rome"));
        let (predicted, _) = analogy_vector(D, &VectorMath::scalar(), &a, &b, &c).unwrap();
        store(&substrate, "rome", c.clone());
        store(&substrate, "italy", predicted);

        let result = ops.find_analogy(&a, &b, &c, 5).unwrap();
        let answer = result
            .candidates
            .iter()
            .find(|hit| hit.entry.id.as_str() == "italy")
            .unwrap();
        assert_eq!(answer.entry.metadata.access_count, 1);
        assert_eq!(substrate.get(&"italy".into()).unwrap().metadata.access_count, 1);
        assert_eq!(substrate.get(&"rome".into()).unwrap().metadata.access_count, 0);
    }
}
