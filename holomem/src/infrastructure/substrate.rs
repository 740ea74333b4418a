// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-memory substrate.
//!
//! Entries live behind `Arc`s in a `parking_lot::RwLock<HashMap>`. Every
//! mutation builds a new entry and swaps the `Arc` under the write lock, so a
//! concurrent reader sees either the old or the new entry, never a mix.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::domain::config::{HolomemConfig, SubstrateConfig};
use crate::domain::entry::{EntryMetadata, MemoryEntry, MemoryId};
use crate::domain::error::{HolomemError, HolomemResult};
use crate::domain::hypervector::Hypervector;
use crate::infrastructure::backend::VectorMath;
use crate::infrastructure::repository::{
    ConsolidationReport, DecayReport, MemorySubstrate, RetrievedEntry, StoreOutcome,
    SubstrateStats,
};

pub struct InMemorySubstrate {
    entries: RwLock<HashMap<MemoryId, Arc<MemoryEntry>>>,
    dimensions: usize,
    capacity: usize,
    default_min_similarity: f64,
    config: SubstrateConfig,
    math: VectorMath,
}

impl InMemorySubstrate {
    pub fn new(config: &HolomemConfig, math: VectorMath) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            dimensions: config.dimensions,
            capacity: config.max_memories,
            default_min_similarity: config.similarity_threshold,
            config: config.substrate.clone(),
            math,
        }
    }

    /// Substrate with default dynamics and the scalar backend.
    pub fn with_capacity(dimensions: usize, capacity: usize) -> Self {
        let config = HolomemConfig {
            dimensions,
            max_memories: capacity,
            ..HolomemConfig::default()
        };
        Self::new(&config, VectorMath::scalar())
    }

    fn rank(
        &self,
        query: &Hypervector,
        k: usize,
        min_similarity: Option<f64>,
    ) -> HolomemResult<Vec<(Arc<MemoryEntry>, f64)>> {
        HolomemError::check_dimensions(self.dimensions, query.dimensions())?;
        if k == 0 {
            return Ok(Vec::new());
        }
        let threshold = min_similarity.unwrap_or(self.default_min_similarity);

        let snapshot: Vec<Arc<MemoryEntry>> = self.entries.read().values().cloned().collect();
        let vectors: Vec<&Hypervector> = snapshot.iter().map(|e| &e.vector).collect();
        let scores = self.math.similarity_batch(query, &vectors)?;

        let mut ranked: Vec<(Arc<MemoryEntry>, f64)> = snapshot
            .into_iter()
            .zip(scores)
            .filter(|(_, similarity)| *similarity >= threshold)
            .collect();

        // Sort by similarity descending, id for a stable order
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.id.cmp(&b.0.id))
        });
        ranked.truncate(k);
        Ok(ranked)
    }

    fn publish_size(len: usize) {
        metrics::gauge!("holomem_entries").set(len as f64);
    }

    fn touch_slot(
        entries: &mut HashMap<MemoryId, Arc<MemoryEntry>>,
        id: &MemoryId,
        now: DateTime<Utc>,
    ) -> Option<MemoryEntry> {
        let slot = entries.get_mut(id)?;
        let touched = slot.touched(now);
        *slot = Arc::new(touched.clone());
        Some(touched)
    }

    /// Weakest entry: lowest strength, then least recently used.
    fn weakest(entries: &HashMap<MemoryId, Arc<MemoryEntry>>) -> Option<MemoryId> {
        entries
            .values()
            .min_by(|a, b| {
                a.metadata
                    .strength
                    .partial_cmp(&b.metadata.strength)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.metadata.timestamp.cmp(&b.metadata.timestamp))
            })
            .map(|e| e.id.clone())
    }
}

impl MemorySubstrate for InMemorySubstrate {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn store(
        &self,
        id: MemoryId,
        vector: Hypervector,
        metadata: EntryMetadata,
    ) -> HolomemResult<StoreOutcome> {
        HolomemError::check_dimensions(self.dimensions, vector.dimensions())?;

        let mut entries = self.entries.write();
        let mut outcome = StoreOutcome {
            replaced: entries.contains_key(&id),
            evicted: None,
        };

        if !outcome.replaced && entries.len() >= self.capacity {
            if let Some(victim) = Self::weakest(&entries) {
                if let Some(evicted) = entries.remove(&victim) {
                    debug!(
                        memory_id = %evicted.id,
                        strength = evicted.metadata.strength,
                        "Evicted weakest memory at capacity"
                    );
                    metrics::counter!("holomem_entries_evicted_total").increment(1);
                    outcome.evicted = Some((*evicted).clone());
                }
            }
        }

        entries.insert(id.clone(), Arc::new(MemoryEntry::new(id, vector, metadata)));
        metrics::counter!("holomem_entries_stored_total").increment(1);
        Self::publish_size(entries.len());
        Ok(outcome)
    }

    fn retrieve(
        &self,
        query: &Hypervector,
        k: usize,
        min_similarity: Option<f64>,
    ) -> HolomemResult<Vec<RetrievedEntry>> {
        let started = Instant::now();
        let ranked = self.rank(query, k, min_similarity)?;

        let now = Utc::now();
        let mut results = Vec::with_capacity(ranked.len());
        {
            let mut entries = self.entries.write();
            for (found, similarity) in ranked {
                // The entry may have been replaced or removed since ranking
                let entry = Self::touch_slot(&mut entries, &found.id, now)
                    .unwrap_or_else(|| (*found).clone());
                results.push(RetrievedEntry { entry, similarity });
            }
        }

        metrics::histogram!("holomem_retrieve_seconds").record(started.elapsed().as_secs_f64());
        Ok(results)
    }

    fn scan(
        &self,
        query: &Hypervector,
        k: usize,
        min_similarity: Option<f64>,
    ) -> HolomemResult<Vec<RetrievedEntry>> {
        Ok(self
            .rank(query, k, min_similarity)?
            .into_iter()
            .map(|(entry, similarity)| RetrievedEntry {
                entry: (*entry).clone(),
                similarity,
            })
            .collect())
    }

    fn touch(&self, ids: &[MemoryId]) -> Vec<MemoryEntry> {
        let now = Utc::now();
        let mut entries = self.entries.write();
        ids.iter()
            .filter_map(|id| Self::touch_slot(&mut entries, id, now))
            .collect()
    }

    fn get(&self, id: &MemoryId) -> Option<MemoryEntry> {
        self.entries.read().get(id).map(|e| (**e).clone())
    }

    fn delete(&self, id: &MemoryId) -> Option<MemoryEntry> {
        let mut entries = self.entries.write();
        let removed = entries.remove(id).map(|e| (*e).clone());
        Self::publish_size(entries.len());
        removed
    }

    fn replace(&self, entry: MemoryEntry) -> HolomemResult<bool> {
        HolomemError::check_dimensions(self.dimensions, entry.vector.dimensions())?;
        let mut entries = self.entries.write();
        match entries.get_mut(&entry.id) {
            Some(slot) => {
                *slot = Arc::new(entry);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn consolidate(&self, access_threshold: u64) -> ConsolidationReport {
        let factor = self.config.consolidation_factor;
        let mut report = ConsolidationReport::default();
        let mut entries = self.entries.write();
        for slot in entries.values_mut() {
            if slot.metadata.access_count >= access_threshold {
                let mut next = (**slot).clone();
                next.metadata.strength *= factor;
                next.metadata.access_count = 0;
                report.reinforced.push(next.id.clone());
                *slot = Arc::new(next);
            }
        }
        debug!(
            reinforced = report.reinforced.len(),
            threshold = access_threshold,
            "Consolidated frequently accessed memories"
        );
        report
    }

    fn decay(&self, rate: f64) -> DecayReport {
        let rate = rate.clamp(0.0, 1.0);
        let now = Utc::now();
        let mut rng = rand::rng();
        let mut report = DecayReport::default();

        let mut entries = self.entries.write();
        let mut forgotten_ids = Vec::new();
        for slot in entries.values_mut() {
            let mut next = (**slot).clone();
            next.metadata.strength *= 1.0 - rate;

            let noise = (slot.idle_hours(now) * self.config.decay_noise_per_hour)
                .min(self.config.max_decay_noise);
            if noise > 0.0 {
                next.vector = next.vector.add_noise(noise, &mut rng);
            }

            if next.metadata.strength < self.config.min_strength {
                forgotten_ids.push(next.id.clone());
            }
            *slot = Arc::new(next);
            report.decayed += 1;
        }

        for id in forgotten_ids {
            if let Some(entry) = entries.remove(&id) {
                report.forgotten.push((*entry).clone());
            }
        }

        if !report.forgotten.is_empty() {
            info!(
                forgotten = report.forgotten.len(),
                remaining = entries.len(),
                "Forgot memories below strength floor"
            );
            metrics::counter!("holomem_entries_forgotten_total")
                .increment(report.forgotten.len() as u64);
        }
        Self::publish_size(entries.len());
        report
    }

    fn stats(&self) -> SubstrateStats {
        let entries = self.entries.read();
        let total = entries.len();
        let mut by_modality = BTreeMap::new();
        let mut strength = 0.0;
        let mut access = 0u64;
        for entry in entries.values() {
            *by_modality.entry(entry.metadata.modality).or_insert(0) += 1;
            strength += entry.metadata.strength;
            access += entry.metadata.access_count;
        }
        let (average_strength, average_access_count) = if total == 0 {
            (0.0, 0.0)
        } else {
            (strength / total as f64, access as f64 / total as f64)
        };
        SubstrateStats {
            total_entries: total,
            capacity: self.capacity,
            dimensions: self.dimensions,
            average_strength,
            average_access_count,
            by_modality,
        }
    }

    fn entries(&self) -> Vec<MemoryEntry> {
        self.entries.read().values().map(|e| (**e).clone()).collect()
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }

    fn clear(&self) {
        self.entries.write().clear();
        Self::publish_size(0);
    }
}
