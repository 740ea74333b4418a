// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Application layer: encoding, segmentation, reasoning, evolution and the
//! public facade

pub mod encoder;
pub mod evolution;
pub mod logic;
pub mod memory_system;
pub mod segmenter;

pub use encoder::{
    tokenize, ConceptInput, DocumentRecord, ModalInput, MultiModalEncoder, SequenceItem,
    SEQUENCE_STRIDE,
};
pub use evolution::{ConsolidationOutcome, DecayOutcome, EvolutionStatus, MemoryEvolution};
pub use logic::{
    analogy_vector, AnalogyResult, Conflict, ConsistencyReport, LogicalOperations,
    RelationEncoding, RelationKind,
};
pub use memory_system::{
    AnalogyAnswer, HolographicMemorySystem, MemorizeResult, PassageResult, QueryResult,
    SystemSnapshot, SystemStats, SEGMENT_TAG,
};
pub use segmenter::{SceneKind, Segment, TextSegmenter};
