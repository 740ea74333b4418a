// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository interface for the memory substrate.
//! Defines the contract for similarity-keyed entry storage.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::entry::{EntryMetadata, MemoryEntry, MemoryId, Modality};
use crate::domain::error::HolomemResult;
use crate::domain::hypervector::Hypervector;

/// An entry together with its similarity to the query that found it.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedEntry {
    pub entry: MemoryEntry,
    pub similarity: f64,
}

#[derive(Debug, Clone, Default)]
pub struct StoreOutcome {
    /// An entry with the same id was overwritten
    pub replaced: bool,
    /// Entry removed to stay within capacity
    pub evicted: Option<MemoryEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsolidationReport {
    pub reinforced: Vec<MemoryId>,
}

#[derive(Debug, Clone, Default)]
pub struct DecayReport {
    pub decayed: usize,
    pub forgotten: Vec<MemoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstrateStats {
    pub total_entries: usize,
    pub capacity: usize,
    pub dimensions: usize,
    pub average_strength: f64,
    pub average_access_count: f64,
    pub by_modality: BTreeMap<Modality, usize>,
}

/// Storage engine keyed by id and searched by vector similarity.
///
/// Implementations must replace entries atomically as whole values: readers
/// may observe an entry before or after a mutation, never in between.
pub trait MemorySubstrate: Send + Sync {
    fn dimensions(&self) -> usize;

    fn capacity(&self) -> usize;

    /// Insert or overwrite; evicts the weakest entry first when at capacity.
    fn store(
        &self,
        id: MemoryId,
        vector: Hypervector,
        metadata: EntryMetadata,
    ) -> HolomemResult<StoreOutcome>;

    /// Top-k by similarity at or above `min_similarity` (instance default when
    /// `None`). Every hit records an access.
    fn retrieve(
        &self,
        query: &Hypervector,
        k: usize,
        min_similarity: Option<f64>,
    ) -> HolomemResult<Vec<RetrievedEntry>>;

    /// Same ranking as [`retrieve`](Self::retrieve) without recording access.
    fn scan(
        &self,
        query: &Hypervector,
        k: usize,
        min_similarity: Option<f64>,
    ) -> HolomemResult<Vec<RetrievedEntry>>;

    /// Record one access on each listed entry that still exists, as a
    /// retrieval hit would. Returns the touched entries in input order.
    fn touch(&self, ids: &[MemoryId]) -> Vec<MemoryEntry>;

    fn get(&self, id: &MemoryId) -> Option<MemoryEntry>;

    fn delete(&self, id: &MemoryId) -> Option<MemoryEntry>;

    /// Swap a whole entry in place. Returns false when the id is unknown.
    fn replace(&self, entry: MemoryEntry) -> HolomemResult<bool>;

    /// Reinforce entries accessed at least `access_threshold` times since
    /// their last reinforcement. Reinforcement resets the access count.
    fn consolidate(&self, access_threshold: u64) -> ConsolidationReport;

    /// Weaken every entry by `rate`, age idle vectors, forget the weakest.
    fn decay(&self, rate: f64) -> DecayReport;

    fn stats(&self) -> SubstrateStats;

    fn entries(&self) -> Vec<MemoryEntry>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry. Idempotent.
    fn clear(&self);
}
