// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Memory entries: the unit stored in the substrate.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Entry identity, per-modality context and promotion metadata
//!
//! Entries are immutable values. Retrieval, consolidation and decay produce a
//! new entry which the substrate swaps in whole.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::concept::SynthesisOperation;
use super::error::HolomemError;
use super::hypervector::Hypervector;

pub const DEFAULT_INITIAL_STRENGTH: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryId(pub String);

impl MemoryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MemoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MemoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemoryId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for MemoryId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Kind of input an entry was encoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Text,
    Document,
    Concept,
    Composite,
    Sequence,
    Relation,
    Generated,
    Vector,
}

impl Modality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Text => "text",
            Modality::Document => "document",
            Modality::Concept => "concept",
            Modality::Composite => "composite",
            Modality::Sequence => "sequence",
            Modality::Relation => "relation",
            Modality::Generated => "generated",
            Modality::Vector => "vector",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Modality {
    type Err = HolomemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Modality::Text),
            "document" => Ok(Modality::Document),
            "concept" => Ok(Modality::Concept),
            "composite" => Ok(Modality::Composite),
            "sequence" => Ok(Modality::Sequence),
            "relation" => Ok(Modality::Relation),
            "generated" => Ok(Modality::Generated),
            "vector" => Ok(Modality::Vector),
            _ => Err(HolomemError::NoEncoderRegistered(s.to_string())),
        }
    }
}

/// Per-modality context carried with an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModalityContext {
    Text {
        preview: String,
        word_count: usize,
    },
    Document {
        source_id: Option<String>,
        title: Option<String>,
        doc_type: String,
    },
    Concept {
        name: String,
        attributes: BTreeMap<String, String>,
    },
    Composite {
        modalities: Vec<String>,
    },
    Sequence {
        length: usize,
        first: Option<DateTime<Utc>>,
        last: Option<DateTime<Utc>>,
    },
    Relation {
        subject: String,
        verb: String,
        object: String,
        confidence: f64,
    },
    Generated {
        name: String,
        operation: SynthesisOperation,
        novelty: f64,
        coherence: f64,
        utility: f64,
    },
    Vector {
        label: Option<String>,
    },
}

impl ModalityContext {
    /// Human-readable reconstruction of what the entry encodes, when one exists.
    pub fn reconstruct(&self) -> Option<String> {
        match self {
            ModalityContext::Text { preview, .. } => Some(preview.clone()),
            ModalityContext::Document { title, doc_type, .. } => {
                Some(title.clone().unwrap_or_else(|| format!("untitled {}", doc_type)))
            }
            ModalityContext::Concept { name, .. } => Some(name.clone()),
            ModalityContext::Relation {
                subject,
                verb,
                object,
                ..
            } => Some(format!("{} {} {}", subject, verb, object)),
            ModalityContext::Generated { name, .. } => Some(name.clone()),
            ModalityContext::Vector { label } => label.clone(),
            ModalityContext::Composite { .. } | ModalityContext::Sequence { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub modality: Modality,
    pub context: ModalityContext,
    pub created_at: DateTime<Utc>,
    /// Recency: refreshed on every retrieval hit.
    pub timestamp: DateTime<Utc>,
    pub strength: f64,
    pub access_count: u64,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Lineage for generated entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<MemoryId>,
    /// Caller-defined open extension map.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extensions: HashMap<String, serde_json::Value>,
}

impl EntryMetadata {
    pub fn new(modality: Modality, context: ModalityContext) -> Self {
        let now = Utc::now();
        Self {
            modality,
            context,
            created_at: now,
            timestamp: now,
            strength: DEFAULT_INITIAL_STRENGTH,
            access_count: 0,
            tags: Vec::new(),
            parents: Vec::new(),
            extensions: HashMap::new(),
        }
    }

    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = strength;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tag in tags {
            self.add_tag(tag);
        }
        self
    }

    pub fn with_parents(mut self, parents: Vec<MemoryId>) -> Self {
        self.parents = parents;
        self
    }

    pub fn with_extension(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }

    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub id: MemoryId,
    pub vector: Hypervector,
    pub metadata: EntryMetadata,
}

impl MemoryEntry {
    pub fn new(id: MemoryId, vector: Hypervector, metadata: EntryMetadata) -> Self {
        Self {
            id,
            vector,
            metadata,
        }
    }

    /// Copy of this entry with one more access recorded at `now`.
    pub fn touched(&self, now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        next.metadata.access_count += 1;
        next.metadata.timestamp = now;
        next
    }

    /// Hours elapsed since the entry was last accessed.
    pub fn idle_hours(&self, now: DateTime<Utc>) -> f64 {
        let elapsed = now - self.metadata.timestamp;
        (elapsed.num_milliseconds().max(0) as f64) / 3_600_000.0
    }

    pub fn summary(&self) -> EntrySummary {
        EntrySummary {
            id: self.id.clone(),
            modality: self.metadata.modality,
            description: self.metadata.context.reconstruct(),
            strength: self.metadata.strength,
            access_count: self.metadata.access_count,
            tags: self.metadata.tags.clone(),
            parents: self.metadata.parents.clone(),
            created_at: self.metadata.created_at,
            last_access: self.metadata.timestamp,
            zero_fraction: self.vector.zero_fraction(),
        }
    }
}

/// Diagnostic view of an entry without its raw vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrySummary {
    pub id: MemoryId,
    pub modality: Modality,
    pub description: Option<String>,
    pub strength: f64,
    pub access_count: u64,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<MemoryId>,
    pub created_at: DateTime<Utc>,
    pub last_access: DateTime<Utc>,
    pub zero_fraction: f64,
}
