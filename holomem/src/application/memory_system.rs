// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Holographic Memory System - public facade
//!
//! Wires the encoder, substrate, logical operations and evolution engine
//! together behind one owned instance. The evolution scheduler belongs to the
//! instance: it starts with it (when `auto_evolve` is set and a tokio runtime
//! is active) and stops when the instance is destroyed or dropped.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Memorize, query, reason over and evolve memories

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::application::encoder::{
    tokenize, ConceptInput, DocumentRecord, ModalInput, MultiModalEncoder, SequenceItem,
};
use crate::application::evolution::{EvolutionStatus, MemoryEvolution};
use crate::application::logic::{ConsistencyReport, LogicalOperations, RelationKind};
use crate::application::segmenter::TextSegmenter;
use crate::domain::concept::ConceptCandidate;
use crate::domain::config::HolomemConfig;
use crate::domain::entry::{
    EntryMetadata, EntrySummary, MemoryEntry, MemoryId, Modality, ModalityContext,
};
use crate::domain::error::{HolomemError, HolomemResult};
use crate::domain::events::{EvolutionOperation, HolomemEvent};
use crate::domain::hypervector::Hypervector;
use crate::domain::semantic::semantic_table_len;
use crate::infrastructure::backend::VectorMath;
use crate::infrastructure::event_bus::{EventBus, EventReceiver};
use crate::infrastructure::repository::{MemorySubstrate, RetrievedEntry, SubstrateStats};
use crate::infrastructure::substrate::InMemorySubstrate;

/// Characters of source text kept as an entry preview
const PREVIEW_CHARS: usize = 80;

/// Tag carried by every stored passage segment
pub const SEGMENT_TAG: &str = "segment";

/// Result of a memorize call
#[derive(Debug, Clone)]
pub struct MemorizeResult {
    pub id: MemoryId,
    pub vector: Hypervector,
    pub modalities: Vec<Modality>,
    pub metadata: EntryMetadata,
}

/// A document stored whole plus one entry per passage segment
#[derive(Debug, Clone)]
pub struct PassageResult {
    pub parent: MemorizeResult,
    pub segments: Vec<MemorizeResult>,
}

/// One ranked query hit
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub entry: MemoryEntry,
    pub similarity: f64,
    pub reconstructed: Option<String>,
    pub explanation: String,
}

impl From<RetrievedEntry> for QueryResult {
    fn from(hit: RetrievedEntry) -> Self {
        let reconstructed = hit.entry.metadata.context.reconstruct();
        let explanation = explain(&hit.entry, hit.similarity);
        Self {
            entry: hit.entry,
            similarity: hit.similarity,
            reconstructed,
            explanation,
        }
    }
}

fn explain(entry: &MemoryEntry, similarity: f64) -> String {
    let mut explanation = format!(
        "{} memory at similarity {:.3} (strength {:.2}, accessed {} times)",
        entry.metadata.modality, similarity, entry.metadata.strength, entry.metadata.access_count
    );
    if !entry.metadata.parents.is_empty() {
        let parents: Vec<&str> = entry.metadata.parents.iter().map(MemoryId::as_str).collect();
        let relation = if entry.metadata.has_tag(SEGMENT_TAG) {
            "segment of"
        } else {
            "synthesised from"
        };
        explanation.push_str(&format!(", {} {}", relation, parents.join(" + ")));
    }
    explanation
}

/// Ranked answers to `A:B::C:?`
#[derive(Debug, Clone)]
pub struct AnalogyAnswer {
    pub confidence: f64,
    pub candidates: Vec<QueryResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemStats {
    #[serde(flatten)]
    pub substrate: SubstrateStats,
    pub backend: String,
    pub cached_words: usize,
    pub semantic_vectors: usize,
    pub evolution: EvolutionStatus,
}

/// Serializable diagnostic dump; entries are summarised without raw vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub taken_at: DateTime<Utc>,
    pub config: HolomemConfig,
    pub stats: SystemStats,
    pub entries: Vec<EntrySummary>,
}

pub struct HolographicMemorySystem {
    config: HolomemConfig,
    math: VectorMath,
    substrate: Arc<dyn MemorySubstrate>,
    encoder: MultiModalEncoder,
    segmenter: TextSegmenter,
    logic: LogicalOperations,
    evolution: Arc<MemoryEvolution>,
    event_bus: EventBus,
}

impl HolographicMemorySystem {
    /// Build a system on the in-memory substrate.
    pub fn new(config: HolomemConfig) -> HolomemResult<Self> {
        config.validate()?;
        let math = VectorMath::from_config(config.accelerated_backend);
        let substrate: Arc<dyn MemorySubstrate> =
            Arc::new(InMemorySubstrate::new(&config, math.clone()));
        Self::assemble(config, math, substrate)
    }

    /// Build a system on a caller-provided substrate.
    pub fn with_substrate(
        config: HolomemConfig,
        substrate: Arc<dyn MemorySubstrate>,
    ) -> HolomemResult<Self> {
        config.validate()?;
        HolomemError::check_dimensions(config.dimensions, substrate.dimensions())?;
        let math = VectorMath::from_config(config.accelerated_backend);
        Self::assemble(config, math, substrate)
    }

    fn assemble(
        config: HolomemConfig,
        math: VectorMath,
        substrate: Arc<dyn MemorySubstrate>,
    ) -> HolomemResult<Self> {
        let event_bus = EventBus::with_default_capacity();
        let encoder = MultiModalEncoder::new(config.dimensions, math.clone());
        let segmenter = TextSegmenter::new(config.segmentation.clone());
        let logic = LogicalOperations::new(
            substrate.clone(),
            math.clone(),
            config.consistency.clone(),
            config.analogy.clone(),
        );
        let evolution = Arc::new(MemoryEvolution::new(
            substrate.clone(),
            math.clone(),
            event_bus.clone(),
            config.evolution.clone(),
            config.substrate.initial_strength,
            config.rng_seed,
        ));

        let system = Self {
            config,
            math,
            substrate,
            encoder,
            segmenter,
            logic,
            evolution,
            event_bus,
        };

        if system.config.auto_evolve {
            if let Err(e) = system.evolution.start() {
                warn!("Auto-evolve requested but the scheduler could not start: {}", e);
            }
        }

        info!(
            dimensions = system.config.dimensions,
            max_memories = system.config.max_memories,
            backend = system.math.backend_name(),
            evolving = system.evolution.is_running(),
            "Holographic memory system initialized"
        );
        Ok(system)
    }

    pub fn config(&self) -> &HolomemConfig {
        &self.config
    }

    pub fn encoder(&self) -> &MultiModalEncoder {
        &self.encoder
    }

    pub fn segmenter(&self) -> &TextSegmenter {
        &self.segmenter
    }

    pub fn logic(&self) -> &LogicalOperations {
        &self.logic
    }

    pub fn evolution(&self) -> &Arc<MemoryEvolution> {
        &self.evolution
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.event_bus.subscribe()
    }

    fn store(
        &self,
        id: MemoryId,
        vector: Hypervector,
        modalities: Vec<Modality>,
        metadata: EntryMetadata,
    ) -> HolomemResult<MemorizeResult> {
        let metadata = metadata.with_strength(self.config.substrate.initial_strength);
        let outcome = self
            .substrate
            .store(id.clone(), vector.clone(), metadata.clone())?;

        let now = Utc::now();
        if let Some(evicted) = outcome.evicted {
            self.event_bus.publish(HolomemEvent::MemoryEvicted {
                memory_id: evicted.id,
                strength: evicted.metadata.strength,
                timestamp: now,
            });
        }
        self.event_bus.publish(HolomemEvent::MemoryStored {
            memory_id: id.clone(),
            modality: metadata.modality,
            replaced: outcome.replaced,
            timestamp: now,
        });
        debug!(memory_id = %id, modality = %metadata.modality, "Memorized entry");

        Ok(MemorizeResult {
            id,
            vector,
            modalities,
            metadata,
        })
    }

    pub fn memorize_text(&self, text: &str) -> HolomemResult<MemorizeResult> {
        let vector = self.encoder.encode_text(text)?;
        let context = ModalityContext::Text {
            preview: text.chars().take(PREVIEW_CHARS).collect(),
            word_count: tokenize(text).len(),
        };
        self.store(
            MemoryId::new(),
            vector,
            vec![Modality::Text],
            EntryMetadata::new(Modality::Text, context),
        )
    }

    /// Stored under the record's own id when it has one, so re-ingesting a
    /// record overwrites its previous entry.
    pub fn memorize_document(&self, record: &DocumentRecord) -> HolomemResult<MemorizeResult> {
        let vector = self.encoder.encode_document(record)?;
        let id = record
            .id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .map(MemoryId::from)
            .unwrap_or_default();
        let context = ModalityContext::Document {
            source_id: record.id.clone(),
            title: record.title.clone(),
            doc_type: record.doc_type.clone(),
        };
        self.store(
            id,
            vector,
            vec![Modality::Document],
            EntryMetadata::new(Modality::Document, context),
        )
    }

    /// Store a long document at two scales: the whole record, and one text
    /// entry per passage segment naming the record as its parent. Segments
    /// left over from an earlier version of the record are dropped first.
    pub fn memorize_passage(&self, record: &DocumentRecord) -> HolomemResult<PassageResult> {
        let parent = self.memorize_document(record)?;
        let stale = self.forget_segments(&parent.id);

        let text = record.content.as_deref().unwrap_or_default();
        let mut segments = Vec::new();
        for segment in self.segmenter.segment(text) {
            let vector = self.encoder.encode_passage(&segment.sentences)?;
            let segment_text = segment.text();
            let context = ModalityContext::Text {
                preview: segment_text.chars().take(PREVIEW_CHARS).collect(),
                word_count: tokenize(&segment_text).len(),
            };
            let metadata = EntryMetadata::new(Modality::Text, context)
                .with_tags([SEGMENT_TAG, segment.kind.as_str()])
                .with_parents(vec![parent.id.clone()])
                .with_extension(
                    SEGMENT_TAG,
                    serde_json::json!({
                        "index": segment.index,
                        "scene": segment.scene,
                        "start": segment.start,
                        "end": segment.end,
                    }),
                );
            segments.push(self.store(
                MemoryId::from(format!("{}#{}", parent.id, segment.index)),
                vector,
                vec![Modality::Text],
                metadata,
            )?);
        }

        info!(
            memory_id = %parent.id,
            segments = segments.len(),
            replaced_segments = stale,
            "Memorized passage"
        );
        Ok(PassageResult { parent, segments })
    }

    fn forget_segments(&self, parent: &MemoryId) -> usize {
        let stale: Vec<MemoryId> = self
            .substrate
            .entries()
            .into_iter()
            .filter(|entry| {
                entry.metadata.has_tag(SEGMENT_TAG) && entry.metadata.parents.contains(parent)
            })
            .map(|entry| entry.id)
            .collect();
        for id in &stale {
            self.substrate.delete(id);
        }
        stale.len()
    }

    pub fn memorize_concept(&self, concept: &ConceptInput) -> HolomemResult<MemorizeResult> {
        let vector = self.encoder.encode_concept(concept)?;
        let context = ModalityContext::Concept {
            name: concept.name.clone(),
            attributes: concept.attributes.clone(),
        };
        self.store(
            MemoryId::new(),
            vector,
            vec![Modality::Concept],
            EntryMetadata::new(Modality::Concept, context),
        )
    }

    pub fn memorize_composite(&self, inputs: &[ModalInput]) -> HolomemResult<MemorizeResult> {
        let vector = self.encoder.encode_composite(inputs)?;

        let mut modalities = Vec::new();
        for input in inputs {
            let modality: Modality = input.modality.parse()?;
            if !modalities.contains(&modality) {
                modalities.push(modality);
            }
        }
        let context = ModalityContext::Composite {
            modalities: modalities.iter().map(|m| m.to_string()).collect(),
        };
        self.store(
            MemoryId::new(),
            vector,
            modalities,
            EntryMetadata::new(Modality::Composite, context),
        )
    }

    pub fn memorize_sequence(&self, items: &[SequenceItem]) -> HolomemResult<MemorizeResult> {
        let vector = self.encoder.encode_sequence(items)?;
        let context = ModalityContext::Sequence {
            length: items.len(),
            first: items.iter().map(|item| item.timestamp).min(),
            last: items.iter().map(|item| item.timestamp).max(),
        };
        self.store(
            MemoryId::new(),
            vector,
            vec![Modality::Sequence],
            EntryMetadata::new(Modality::Sequence, context),
        )
    }

    /// Subject and object are encoded as concepts.
    pub fn memorize_relationship(
        &self,
        subject: &str,
        verb: &str,
        object: &str,
    ) -> HolomemResult<MemorizeResult> {
        let kind = RelationKind::parse(verb);
        let encoding = self.logic.encode_relation(
            &self.encoder.concept_base(subject),
            &kind,
            &self.encoder.concept_base(object),
        )?;
        let context = ModalityContext::Relation {
            subject: subject.to_string(),
            verb: kind.to_string(),
            object: object.to_string(),
            confidence: encoding.confidence,
        };
        self.store(
            MemoryId::new(),
            encoding.vector,
            vec![Modality::Relation, Modality::Concept],
            EntryMetadata::new(Modality::Relation, context),
        )
    }

    pub fn query_text(&self, text: &str, k: usize) -> HolomemResult<Vec<QueryResult>> {
        let query = self.encoder.encode_text(text)?;
        self.query_vector(&query, k)
    }

    pub fn query_vector(&self, query: &Hypervector, k: usize) -> HolomemResult<Vec<QueryResult>> {
        let hits = self.substrate.retrieve(query, k, None)?;
        Ok(hits.into_iter().map(QueryResult::from).collect())
    }

    /// `a:b::c:?` over text inputs.
    pub fn find_analogy(
        &self,
        a: &str,
        b: &str,
        c: &str,
        k: usize,
    ) -> HolomemResult<AnalogyAnswer> {
        let result = self.logic.find_analogy(
            &self.encoder.encode_text(a)?,
            &self.encoder.encode_text(b)?,
            &self.encoder.encode_text(c)?,
            k,
        )?;
        Ok(AnalogyAnswer {
            confidence: result.confidence,
            candidates: result.candidates.into_iter().map(QueryResult::from).collect(),
        })
    }

    pub fn check_consistency(&self, ids: &[MemoryId]) -> HolomemResult<ConsistencyReport> {
        self.logic.check_consistency(ids)
    }

    /// One generation pass at the configured thresholds. Nothing is stored.
    pub fn generate_concepts(&self) -> HolomemResult<Vec<ConceptCandidate>> {
        self.evolution
            .generate_novel_concepts(&self.config.evolution.thresholds())
    }

    pub async fn dream(&self, duration: Duration) -> Vec<ConceptCandidate> {
        self.evolution.dream(duration).await
    }

    /// Store the `top_n` candidates ranked by `novelty × coherence`.
    pub fn persist_concepts(
        &self,
        candidates: &[ConceptCandidate],
        top_n: usize,
    ) -> HolomemResult<Vec<MemoryId>> {
        let mut ranked: Vec<&ConceptCandidate> = candidates.iter().collect();
        ranked.sort_by(|a, b| {
            b.rank()
                .partial_cmp(&a.rank())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut persisted = Vec::new();
        for candidate in ranked.into_iter().take(top_n) {
            persisted.push(self.evolution.persist_concept(candidate)?);
        }
        Ok(persisted)
    }

    pub fn evolve_memory(
        &self,
        id: &MemoryId,
        operation: EvolutionOperation,
    ) -> HolomemResult<Option<MemoryEntry>> {
        self.evolution.evolve_memory(id, operation)
    }

    pub fn get(&self, id: &MemoryId) -> Option<MemoryEntry> {
        self.substrate.get(id)
    }

    pub fn delete(&self, id: &MemoryId) -> Option<MemoryEntry> {
        self.substrate.delete(id)
    }

    pub fn len(&self) -> usize {
        self.substrate.len()
    }

    pub fn is_empty(&self) -> bool {
        self.substrate.is_empty()
    }

    pub fn start_evolution(&self) -> HolomemResult<()> {
        self.evolution.start()
    }

    pub fn stop_evolution(&self) -> bool {
        self.evolution.stop()
    }

    pub fn get_stats(&self) -> SystemStats {
        SystemStats {
            substrate: self.substrate.stats(),
            backend: self.math.backend_name().to_string(),
            cached_words: self.encoder.cached_words(),
            semantic_vectors: semantic_table_len(),
            evolution: self.evolution.status(),
        }
    }

    pub fn export_snapshot(&self) -> SystemSnapshot {
        let mut entries: Vec<EntrySummary> = self
            .substrate
            .entries()
            .iter()
            .map(MemoryEntry::summary)
            .collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));

        SystemSnapshot {
            taken_at: Utc::now(),
            config: self.config.clone(),
            stats: self.get_stats(),
            entries,
        }
    }

    /// Wait for both evolution tasks to exit, then drop every memory.
    /// Idempotent.
    pub async fn destroy(&self) {
        self.evolution.shutdown().await;
        self.substrate.clear();
        self.encoder.clear_word_cache();
        info!("Holographic memory system destroyed");
    }
}

impl Drop for HolographicMemorySystem {
    fn drop(&mut self) {
        self.evolution.stop();
    }
}
