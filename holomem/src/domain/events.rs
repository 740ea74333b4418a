// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Domain events for the holographic memory bounded context.
//! Published to the event bus for observability and integration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::concept::SynthesisOperation;
use super::entry::{MemoryId, Modality};

/// Holographic memory domain events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HolomemEvent {
    /// An entry was inserted or overwritten
    MemoryStored {
        memory_id: MemoryId,
        modality: Modality,
        replaced: bool,
        timestamp: DateTime<Utc>,
    },

    /// An entry was evicted to make room at capacity
    MemoryEvicted {
        memory_id: MemoryId,
        strength: f64,
        timestamp: DateTime<Utc>,
    },

    /// An entry decayed below the strength floor
    MemoryForgotten {
        memory_id: MemoryId,
        final_strength: f64,
        timestamp: DateTime<Utc>,
    },

    /// Targeted evolution was applied to one entry
    MemoryEvolved {
        memory_id: MemoryId,
        operation: EvolutionOperation,
        old_strength: f64,
        new_strength: f64,
        timestamp: DateTime<Utc>,
    },

    /// A generated concept was promoted to a memory entry
    ConceptPersisted {
        memory_id: MemoryId,
        name: String,
        operation: SynthesisOperation,
        parents: Vec<MemoryId>,
        score: f64,
        timestamp: DateTime<Utc>,
    },

    // Background cycles

    ConsolidationCompleted {
        reinforced: usize,
        candidates: usize,
        persisted: usize,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    DecayCompleted {
        decayed: usize,
        forgotten: usize,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    DreamingCompleted {
        iterations: usize,
        candidates: usize,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
}

/// Targeted evolution applied to a single memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvolutionOperation {
    /// Amplify strength and refill zeroed components from a reinforcement
    /// vector. The majority of `[v, v, r]` keeps every non-zero component of
    /// `v`, so a fully bipolar vector comes back unchanged.
    Strengthen,
    /// Inject noise and attenuate strength
    Weaken,
    /// Blend with a fresh random vector
    Mutate,
}

impl std::str::FromStr for EvolutionOperation {
    type Err = super::error::HolomemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strengthen" => Ok(EvolutionOperation::Strengthen),
            "weaken" => Ok(EvolutionOperation::Weaken),
            "mutate" => Ok(EvolutionOperation::Mutate),
            other => Err(super::error::HolomemError::InvalidInput(format!(
                "unknown evolution operation '{}'",
                other
            ))),
        }
    }
}

impl HolomemEvent {
    /// Get the timestamp of the event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            HolomemEvent::MemoryStored { timestamp, .. } => *timestamp,
            HolomemEvent::MemoryEvicted { timestamp, .. } => *timestamp,
            HolomemEvent::MemoryForgotten { timestamp, .. } => *timestamp,
            HolomemEvent::MemoryEvolved { timestamp, .. } => *timestamp,
            HolomemEvent::ConceptPersisted { timestamp, .. } => *timestamp,
            HolomemEvent::ConsolidationCompleted { timestamp, .. } => *timestamp,
            HolomemEvent::DecayCompleted { timestamp, .. } => *timestamp,
            HolomemEvent::DreamingCompleted { timestamp, .. } => *timestamp,
        }
    }

    /// The memory this event concerns, for per-entry events
    pub fn memory_id(&self) -> Option<&MemoryId> {
        match self {
            HolomemEvent::MemoryStored { memory_id, .. }
            | HolomemEvent::MemoryEvicted { memory_id, .. }
            | HolomemEvent::MemoryForgotten { memory_id, .. }
            | HolomemEvent::MemoryEvolved { memory_id, .. }
            | HolomemEvent::ConceptPersisted { memory_id, .. } => Some(memory_id),
            HolomemEvent::ConsolidationCompleted { .. }
            | HolomemEvent::DecayCompleted { .. }
            | HolomemEvent::DreamingCompleted { .. } => None,
        }
    }

    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            HolomemEvent::MemoryStored { .. } => "memory_stored",
            HolomemEvent::MemoryEvicted { .. } => "memory_evicted",
            HolomemEvent::MemoryForgotten { .. } => "memory_forgotten",
            HolomemEvent::MemoryEvolved { .. } => "memory_evolved",
            HolomemEvent::ConceptPersisted { .. } => "concept_persisted",
            HolomemEvent::ConsolidationCompleted { .. } => "consolidation_completed",
            HolomemEvent::DecayCompleted { .. } => "decay_completed",
            HolomemEvent::DreamingCompleted { .. } => "dreaming_completed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = HolomemEvent::ConceptPersisted {
            memory_id: MemoryId::from("generated-1"),
            name: "bundle(a,b)".to_string(),
            operation: SynthesisOperation::Bundle,
            parents: vec![MemoryId::from("a"), MemoryId::from("b")],
            score: 0.91,
            timestamp: Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "concept_persisted");
        assert_eq!(json["operation"], "bundle");

        let deserialized: HolomemEvent = serde_json::from_value(json).unwrap();
        assert_eq!(event.event_type(), deserialized.event_type());
        assert_eq!(event.timestamp(), deserialized.timestamp());
    }

    #[test]
    fn test_evolution_operation_parse() {
        assert_eq!(
            "mutate".parse::<EvolutionOperation>().unwrap(),
            EvolutionOperation::Mutate
        );
        assert!("explode".parse::<EvolutionOperation>().is_err());
    }
}
