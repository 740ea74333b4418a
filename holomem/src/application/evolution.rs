// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Memory Evolution - background consolidation, decay and concept synthesis
//!
//! Two periodic tasks run while the scheduler is started:
//!
//! - **Consolidation** (default every 60s): reinforce frequently accessed
//!   entries, then synthesise novel concepts from moderately related pairs
//! - **Decay** (default every 300s): weaken entries and forget the weakest
//!
//! Both tasks stop at their next tick boundary when the scheduler is stopped;
//! a cycle already in progress always completes. Cycle failures are logged
//! and never end the scheduler.
//!
//! Dream mode runs generation repeatedly for a caller-chosen duration with
//! every acceptance threshold halved, yielding between iterations.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Self-maintenance of the substrate without caller involvement

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::logic::analogy_vector;
use crate::domain::concept::{ConceptCandidate, CreativityThresholds, SynthesisOperation};
use crate::domain::config::EvolutionConfig;
use crate::domain::entry::{EntryMetadata, MemoryEntry, MemoryId, Modality, ModalityContext};
use crate::domain::error::{HolomemError, HolomemResult};
use crate::domain::events::{EvolutionOperation, HolomemEvent};
use crate::domain::hypervector::Hypervector;
use crate::infrastructure::backend::VectorMath;
use crate::infrastructure::event_bus::EventBus;
use crate::infrastructure::repository::MemorySubstrate;

/// Weight of the first parent in a blend synthesis
const BLEND_WEIGHT: f64 = 0.6;

pub const GENERATED_TAGS: [&str; 3] = ["generated", "novel", "creative"];
pub const MUTATED_TAG: &str = "mutated";

#[derive(Debug, Clone, Copy)]
enum Cycle {
    Consolidation,
    Decay,
}

struct SchedulerState {
    token: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

/// Result of one consolidation cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsolidationOutcome {
    pub reinforced: usize,
    pub candidates: usize,
    pub persisted: Vec<MemoryId>,
}

/// Result of one decay cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecayOutcome {
    pub decayed: usize,
    pub forgotten: Vec<MemoryId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionStatus {
    pub running: bool,
    pub consolidation_cycles: u64,
    pub decay_cycles: u64,
    #[serde(with = "humantime_serde")]
    pub consolidation_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub decay_interval: Duration,
}

pub struct MemoryEvolution {
    substrate: Arc<dyn MemorySubstrate>,
    math: VectorMath,
    event_bus: EventBus,
    config: EvolutionConfig,
    initial_strength: f64,
    rng: Mutex<ChaCha8Rng>,
    state: Mutex<Option<SchedulerState>>,
    /// Tasks signalled by `stop` that may still be finishing a cycle
    draining: Mutex<Vec<JoinHandle<()>>>,
    consolidation_cycles: AtomicU64,
    decay_cycles: AtomicU64,
}

impl MemoryEvolution {
    pub fn new(
        substrate: Arc<dyn MemorySubstrate>,
        math: VectorMath,
        event_bus: EventBus,
        config: EvolutionConfig,
        initial_strength: f64,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };
        Self {
            substrate,
            math,
            event_bus,
            config,
            initial_strength,
            rng: Mutex::new(rng),
            state: Mutex::new(None),
            draining: Mutex::new(Vec::new()),
            consolidation_cycles: AtomicU64::new(0),
            decay_cycles: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().is_some()
    }

    pub fn status(&self) -> EvolutionStatus {
        EvolutionStatus {
            running: self.is_running(),
            consolidation_cycles: self.consolidation_cycles.load(Ordering::Relaxed),
            decay_cycles: self.decay_cycles.load(Ordering::Relaxed),
            consolidation_interval: self.config.consolidation_interval,
            decay_interval: self.config.decay_interval,
        }
    }

    /// Start both periodic tasks on the current tokio runtime. Idempotent.
    pub fn start(self: &Arc<Self>) -> HolomemResult<()> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            HolomemError::EvolutionUnavailable("no tokio runtime is active".to_string())
        })?;

        let mut state = self.state.lock();
        if state.is_some() {
            debug!("Evolution scheduler already running");
            return Ok(());
        }

        let token = CancellationToken::new();
        let handles = [Cycle::Consolidation, Cycle::Decay]
            .into_iter()
            .map(|cycle| runtime.spawn(self.clone().run(cycle, token.clone())))
            .collect();

        info!(
            consolidation_interval = ?self.config.consolidation_interval,
            decay_interval = ?self.config.decay_interval,
            "Started memory evolution scheduler"
        );
        *state = Some(SchedulerState { token, handles });
        Ok(())
    }

    /// Signal both tasks to stop at their next tick boundary.
    /// Returns false when the scheduler was not running.
    pub fn stop(&self) -> bool {
        match self.state.lock().take() {
            Some(state) => {
                state.token.cancel();
                let mut draining = self.draining.lock();
                draining.retain(|handle| !handle.is_finished());
                draining.extend(state.handles);
                info!("Stopping memory evolution scheduler");
                true
            }
            None => false,
        }
    }

    /// Stop and wait for every task to exit, including tasks signalled by an
    /// earlier `stop` that are still inside a cycle.
    pub async fn shutdown(&self) {
        let mut handles = std::mem::take(&mut *self.draining.lock());
        let state = self.state.lock().take();
        if let Some(state) = state {
            state.token.cancel();
            handles.extend(state.handles);
        }
        if handles.is_empty() {
            return;
        }
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Evolution task ended abnormally: {}", e);
            }
        }
        info!("Memory evolution scheduler stopped");
    }

    async fn run(self: Arc<Self>, cycle: Cycle, token: CancellationToken) {
        let period = match cycle {
            Cycle::Consolidation => self.config.consolidation_interval,
            Cycle::Decay => self.config.decay_interval,
        };
        // First tick after one full period
        let mut tick = interval_at(Instant::now() + period, period);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    match cycle {
                        Cycle::Consolidation => {
                            let outcome = self.consolidation_cycle();
                            debug!(
                                reinforced = outcome.reinforced,
                                candidates = outcome.candidates,
                                persisted = outcome.persisted.len(),
                                "Consolidation cycle completed"
                            );
                        }
                        Cycle::Decay => {
                            let outcome = self.decay_cycle();
                            debug!(
                                decayed = outcome.decayed,
                                forgotten = outcome.forgotten.len(),
                                "Decay cycle completed"
                            );
                        }
                    }
                }
                _ = token.cancelled() => {
                    debug!(?cycle, "Shutdown signal received, stopping evolution task");
                    break;
                }
            }
        }
    }

    /// Reinforce frequently used entries, then synthesise and persist concepts.
    pub fn consolidation_cycle(&self) -> ConsolidationOutcome {
        let started = std::time::Instant::now();
        let report = self.substrate.consolidate(self.config.consolidation_threshold);

        let candidates = match self.generate_novel_concepts(&self.config.thresholds()) {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!("Novel concept generation failed: {}", e);
                Vec::new()
            }
        };

        let mut persisted = Vec::new();
        if self.config.persist_generated {
            for candidate in candidates.iter().take(self.config.max_concepts_per_cycle) {
                match self.persist_concept(candidate) {
                    Ok(id) => persisted.push(id),
                    Err(e) => warn!(concept = %candidate.name, "Failed to persist concept: {}", e),
                }
            }
        }

        self.consolidation_cycles.fetch_add(1, Ordering::Relaxed);
        self.event_bus.publish(HolomemEvent::ConsolidationCompleted {
            reinforced: report.reinforced.len(),
            candidates: candidates.len(),
            persisted: persisted.len(),
            duration_ms: started.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        });

        ConsolidationOutcome {
            reinforced: report.reinforced.len(),
            candidates: candidates.len(),
            persisted,
        }
    }

    pub fn decay_cycle(&self) -> DecayOutcome {
        let started = std::time::Instant::now();
        let report = self.substrate.decay(self.config.decay_rate);

        let now = Utc::now();
        for entry in &report.forgotten {
            self.event_bus.publish(HolomemEvent::MemoryForgotten {
                memory_id: entry.id.clone(),
                final_strength: entry.metadata.strength,
                timestamp: now,
            });
        }

        self.decay_cycles.fetch_add(1, Ordering::Relaxed);
        self.event_bus.publish(HolomemEvent::DecayCompleted {
            decayed: report.decayed,
            forgotten: report.forgotten.len(),
            duration_ms: started.elapsed().as_millis() as u64,
            timestamp: now,
        });

        DecayOutcome {
            decayed: report.decayed,
            forgotten: report.forgotten.into_iter().map(|e| e.id).collect(),
        }
    }

    /// Sample memories with a random cue and synthesise candidates from
    /// every pair inside the creative similarity band. Candidates that clear
    /// `thresholds` are returned best first.
    pub fn generate_novel_concepts(
        &self,
        thresholds: &CreativityThresholds,
    ) -> HolomemResult<Vec<ConceptCandidate>> {
        let dimensions = self.substrate.dimensions();
        let mut rng = self.rng.lock();

        let cue = Hypervector::random_with(dimensions, &mut *rng);
        let sample = self.substrate.scan(
            &cue,
            self.config.sample_size,
            Some(self.config.sample_min_similarity),
        )?;

        let mut candidates = Vec::new();
        for (i, first) in sample.iter().enumerate() {
            for second in &sample[i + 1..] {
                let (a, b) = (&first.entry, &second.entry);
                let similarity = a.vector.similarity(&b.vector)?;
                if similarity <= self.config.pair_min_similarity
                    || similarity >= self.config.pair_max_similarity
                {
                    continue;
                }

                let operation =
                    SynthesisOperation::ALL[rng.random_range(0..SynthesisOperation::ALL.len())];
                let vector = self.synthesize(operation, &a.vector, &b.vector, &mut *rng)?;
                let candidate = ConceptCandidate::evaluate(
                    vector,
                    operation,
                    [(&a.id, &a.vector), (&b.id, &b.vector)],
                    self.config.target_sparsity,
                )?;
                if candidate.passes(thresholds) {
                    candidates.push(candidate);
                }
            }
        }

        candidates.sort_by(|x, y| {
            y.score
                .partial_cmp(&x.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        if !candidates.is_empty() {
            metrics::counter!("holomem_concepts_generated_total")
                .increment(candidates.len() as u64);
        }
        debug!(
            sampled = sample.len(),
            accepted = candidates.len(),
            "Novel concept generation pass"
        );
        Ok(candidates)
    }

    fn synthesize(
        &self,
        operation: SynthesisOperation,
        a: &Hypervector,
        b: &Hypervector,
        rng: &mut ChaCha8Rng,
    ) -> HolomemResult<Hypervector> {
        let dimensions = a.dimensions();
        match operation {
            SynthesisOperation::Bind => a.bind(b),
            SynthesisOperation::Bundle => self.math.bundle(dimensions, &[a, b]),
            SynthesisOperation::Analogy => {
                let cue = Hypervector::random_with(dimensions, rng);
                Ok(analogy_vector(dimensions, &self.math, a, b, &cue)?.0)
            }
            SynthesisOperation::Blend => a.blend(b, BLEND_WEIGHT),
        }
    }

    /// Store a candidate as a generated entry with its lineage.
    pub fn persist_concept(&self, candidate: &ConceptCandidate) -> HolomemResult<MemoryId> {
        let vector = candidate.vector.clone().ok_or_else(|| {
            HolomemError::InvalidInput(format!("concept '{}' carries no vector", candidate.name))
        })?;

        let id = MemoryId::new();
        let metadata = EntryMetadata::new(
            Modality::Generated,
            ModalityContext::Generated {
                name: candidate.name.clone(),
                operation: candidate.operation,
                novelty: candidate.novelty,
                coherence: candidate.coherence,
                utility: candidate.utility,
            },
        )
        .with_strength(self.initial_strength)
        .with_tags(GENERATED_TAGS)
        .with_parents(candidate.components.to_vec());

        let outcome = self.substrate.store(id.clone(), vector, metadata)?;
        let now = Utc::now();
        if let Some(evicted) = outcome.evicted {
            self.event_bus.publish(HolomemEvent::MemoryEvicted {
                memory_id: evicted.id,
                strength: evicted.metadata.strength,
                timestamp: now,
            });
        }
        self.event_bus.publish(HolomemEvent::ConceptPersisted {
            memory_id: id.clone(),
            name: candidate.name.clone(),
            operation: candidate.operation,
            parents: candidate.components.to_vec(),
            score: candidate.score,
            timestamp: now,
        });
        info!(memory_id = %id, concept = %candidate.name, score = candidate.score, "Persisted generated concept");
        Ok(id)
    }

    /// Exploratory generation with halved thresholds until `duration` elapses.
    ///
    /// The deadline is checked once per iteration. Duplicate candidates (same
    /// parents and operation) are reported once.
    pub async fn dream(&self, duration: Duration) -> Vec<ConceptCandidate> {
        let started = Instant::now();
        let deadline = started + duration;
        let thresholds = self.config.thresholds().halved();

        let mut seen = HashSet::new();
        let mut dreamt = Vec::new();
        let mut iterations = 0usize;

        info!(duration = ?duration, "Entering dream mode");
        while Instant::now() < deadline {
            match self.generate_novel_concepts(&thresholds) {
                Ok(candidates) => {
                    for candidate in candidates {
                        let [a, b] = &candidate.components;
                        let key = if a <= b {
                            (a.clone(), b.clone(), candidate.operation)
                        } else {
                            (b.clone(), a.clone(), candidate.operation)
                        };
                        if seen.insert(key) {
                            dreamt.push(candidate);
                        }
                    }
                }
                Err(e) => warn!("Dream iteration failed: {}", e),
            }
            iterations += 1;
            tokio::time::sleep(self.config.dream_pause).await;
        }

        let elapsed = started.elapsed();
        self.event_bus.publish(HolomemEvent::DreamingCompleted {
            iterations,
            candidates: dreamt.len(),
            duration_ms: elapsed.as_millis() as u64,
            timestamp: Utc::now(),
        });
        info!(iterations, candidates = dreamt.len(), "Dream mode completed");
        dreamt
    }

    /// Apply a targeted evolution to one entry. `None` when the id is unknown.
    pub fn evolve_memory(
        &self,
        id: &MemoryId,
        operation: EvolutionOperation,
    ) -> HolomemResult<Option<MemoryEntry>> {
        let Some(entry) = self.substrate.get(id) else {
            return Ok(None);
        };
        let dimensions = entry.vector.dimensions();
        let old_strength = entry.metadata.strength;
        let mut next = entry.clone();

        {
            let mut rng = self.rng.lock();
            match operation {
                EvolutionOperation::Strengthen => {
                    // Doubling the original outvotes the reinforcement wherever
                    // the original is non-zero; only cancelled slots change
                    let reinforcement = Hypervector::random_with(dimensions, &mut *rng);
                    next.vector = self.math.bundle(
                        dimensions,
                        &[&entry.vector, &entry.vector, &reinforcement],
                    )?;
                    next.metadata.strength *= self.config.strengthen_factor;
                }
                EvolutionOperation::Weaken => {
                    next.vector = entry.vector.add_noise(self.config.weaken_noise, &mut *rng);
                    next.metadata.strength *= self.config.weaken_factor;
                }
                EvolutionOperation::Mutate => {
                    let fresh = Hypervector::random_with(dimensions, &mut *rng);
                    next.vector =
                        entry
                            .vector
                            .blend_random(&fresh, self.config.mutation_rate, &mut *rng)?;
                    next.metadata.add_tag(MUTATED_TAG);
                }
            }
        }

        if !self.substrate.replace(next.clone())? {
            return Ok(None);
        }

        self.event_bus.publish(HolomemEvent::MemoryEvolved {
            memory_id: id.clone(),
            operation,
            old_strength,
            new_strength: next.metadata.strength,
            timestamp: Utc::now(),
        });
        Ok(Some(next))
    }
}

impl Drop for MemoryEvolution {
    fn drop(&mut self) {
        if let Some(state) = self.state.get_mut().take() {
            state.token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::substrate::InMemorySubstrate;

    const D: usize = 10_000;

    fn evolution(config: EvolutionConfig) -> (Arc<InMemorySubstrate>, Arc<MemoryEvolution>) {
        let substrate = Arc::new(InMemorySubstrate::with_capacity(D, 200));
        let evolution = Arc::new(MemoryEvolution::new(
            substrate.clone(),
            VectorMath::scalar(),
            EventBus::new(256),
            config,
            1.0,
            Some(42),
        ));
        (substrate, evolution)
    }

    /// Variations on one theme: pairwise similarity ≈ 0.36.
    fn seed_related(substrate: &InMemorySubstrate, count: u64) {
        let theme = Hypervector::seeded(D, 1_000);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for i in 0..count {
            let variation = theme
                .blend_random(&Hypervector::seeded(D, i), 0.4, &mut rng)
                .unwrap();
            let metadata =
                EntryMetadata::new(Modality::Vector, ModalityContext::Vector { label: None });
            substrate
                .store(format!("m{}", i).into(), variation, metadata)
                .unwrap();
        }
    }

    #[test]
    fn test_generation_on_empty_substrate() {
        let (_, evolution) = evolution(EvolutionConfig::default());
        let candidates = evolution
            .generate_novel_concepts(&EvolutionConfig::default().thresholds())
            .unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_consolidation_cycle_persists_generated_concepts() {
        let (substrate, evolution) = evolution(EvolutionConfig::default());
        seed_related(&substrate, 8);

        let outcome = evolution.consolidation_cycle();
        assert!(outcome.candidates > 0);
        assert!(!outcome.persisted.is_empty());
        assert!(outcome.persisted.len() <= 10);

        let generated = substrate.get(&outcome.persisted[0]).unwrap();
        assert_eq!(generated.metadata.modality, Modality::Generated);
        for tag in GENERATED_TAGS {
            assert!(generated.metadata.has_tag(tag));
        }
        assert_eq!(generated.metadata.parents.len(), 2);
        assert_eq!(evolution.status().consolidation_cycles, 1);
    }

    #[test]
    fn test_candidates_respect_thresholds() {
        let (substrate, evolution) = evolution(EvolutionConfig::default());
        seed_related(&substrate, 8);
        let thresholds = EvolutionConfig::default().thresholds();
        let candidates = evolution.generate_novel_concepts(&thresholds).unwrap();
        assert!(candidates.iter().all(|c| c.passes(&thresholds)));
        assert!(candidates.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_seeded_generation_is_deterministic() {
        let run = || {
            let (substrate, evolution) = evolution(EvolutionConfig::default());
            seed_related(&substrate, 6);
            evolution
                .generate_novel_concepts(&EvolutionConfig::default().thresholds())
                .unwrap()
                .into_iter()
                .map(|c| (c.components, c.operation))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_decay_cycle_forgets() {
        let (substrate, evolution) = evolution(EvolutionConfig::default());
        let metadata = EntryMetadata::new(Modality::Vector, ModalityContext::Vector { label: None })
            .with_strength(0.101);
        substrate
            .store("fragile".into(), Hypervector::seeded(D, 1), metadata)
            .unwrap();

        let outcome = evolution.decay_cycle();
        assert_eq!(outcome.forgotten, vec![MemoryId::from("fragile")]);
        assert!(substrate.is_empty());
    }

    #[test]
    fn test_start_requires_runtime() {
        let (_, evolution) = evolution(EvolutionConfig::default());
        assert!(matches!(
            evolution.start(),
            Err(HolomemError::EvolutionUnavailable(_))
        ));
        assert!(!evolution.is_running());
    }

    #[tokio::test]
    async fn test_scheduler_runs_and_stops() {
        let config = EvolutionConfig {
            consolidation_interval: Duration::from_millis(20),
            decay_interval: Duration::from_millis(30),
            ..Default::default()
        };
        let (_, evolution) = evolution(config);
        let mut events = evolution.event_bus.subscribe();

        evolution.start().unwrap();
        evolution.start().unwrap();
        assert!(evolution.is_running());

        let mut saw_consolidation = false;
        let mut saw_decay = false;
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while !(saw_consolidation && saw_decay) && tokio::time::Instant::now() < deadline {
            match tokio::time::timeout(Duration::from_secs(1), events.recv()).await {
                Ok(Ok(HolomemEvent::ConsolidationCompleted { .. })) => saw_consolidation = true,
                Ok(Ok(HolomemEvent::DecayCompleted { .. })) => saw_decay = true,
                _ => {}
            }
        }
        assert!(saw_consolidation && saw_decay);

        evolution.shutdown().await;
        assert!(!evolution.is_running());
        assert!(!evolution.stop());
    }

    #[tokio::test]
    async fn test_dream_on_empty_substrate_returns_on_time() {
        let (_, evolution) = evolution(EvolutionConfig::default());
        let started = std::time::Instant::now();
        let dreamt = evolution.dream(Duration::from_millis(200)).await;
        assert!(dreamt.is_empty());
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_dream_relaxes_thresholds() {
        let (substrate, evolution) = evolution(EvolutionConfig::default());
        seed_related(&substrate, 6);
        let dreamt = evolution.dream(Duration::from_millis(100)).await;
        let relaxed = EvolutionConfig::default().thresholds().halved();
        assert!(!dreamt.is_empty());
        assert!(dreamt.iter().all(|c| c.passes(&relaxed)));
        // Dreaming never persists
        assert_eq!(substrate.len(), 6);
    }

    #[test]
    fn test_evolve_memory_operations() {
        let (substrate, evolution) = evolution(EvolutionConfig::default());
        let original = Hypervector::seeded(D, 3);
        let metadata = EntryMetadata::new(Modality::Vector, ModalityContext::Vector { label: None });
        substrate.store("m".into(), original.clone(), metadata).unwrap();
        let id = MemoryId::from("m");

        let strengthened = evolution
            .evolve_memory(&id, EvolutionOperation::Strengthen)
            .unwrap()
            .unwrap();
        assert!((strengthened.metadata.strength - 1.5).abs() < 1e-12);
        assert_eq!(strengthened.vector, original);

        let weakened = evolution
            .evolve_memory(&id, EvolutionOperation::Weaken)
            .unwrap()
            .unwrap();
        assert!((weakened.metadata.strength - 0.75).abs() < 1e-12);
        assert_ne!(weakened.vector, original);

        let mutated = evolution
            .evolve_memory(&id, EvolutionOperation::Mutate)
            .unwrap()
            .unwrap();
        assert!(mutated.metadata.has_tag(MUTATED_TAG));
        let sim = mutated.vector.similarity(&weakened.vector).unwrap();
        assert!(sim > 0.7 && sim < 1.0, "sim = {}", sim);

        assert_eq!(substrate.get(&id).unwrap(), mutated);
        assert!(evolution
            .evolve_memory(&"missing".into(), EvolutionOperation::Weaken)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_strengthen_refills_only_cancelled_components() {
        let (substrate, evolution) = evolution(EvolutionConfig::default());
        let sparse: Vec<i8> = Hypervector::seeded(D, 11)
            .components()
            .iter()
            .enumerate()
            .map(|(i, &c)| if i % 2 == 0 { 0 } else { c })
            .collect();
        let original = Hypervector::from_components(sparse).unwrap();
        let metadata = EntryMetadata::new(Modality::Vector, ModalityContext::Vector { label: None });
        substrate.store("sparse".into(), original.clone(), metadata).unwrap();

        let strengthened = evolution
            .evolve_memory(&"sparse".into(), EvolutionOperation::Strengthen)
            .unwrap()
            .unwrap();
        for (i, (&before, &after)) in original
            .components()
            .iter()
            .zip(strengthened.vector.components())
            .enumerate()
        {
            if before == 0 {
                assert_ne!(after, 0, "component {} stayed empty", i);
            } else {
                assert_eq!(after, before, "component {} was overwritten", i);
            }
        }
    }
}
