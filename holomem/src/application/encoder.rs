// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Multi-Modal Encoder - maps typed inputs onto hypervectors
//!
//! Similar inputs must land on similar vectors, and the same input must always
//! land on the same vector:
//!
//! - **Text:** boundary-padded character trigrams per word, words permuted by
//!   position and bundled
//! - **Passage:** sentences encoded as text independently, then bundled
//! - **Document:** text fields plus a seeded structural-type vector, title
//!   counted twice
//! - **Concept:** seeded base vector shifted by `bind(key, value)` attributes
//! - **Composite / Sequence:** bundles of heterogeneous inputs, sequences
//!   permuted by `index × 100` after sorting by timestamp
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Deterministic structural encoding, no semantic parsing

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::entry::Modality;
use crate::domain::error::{HolomemError, HolomemResult};
use crate::domain::hypervector::Hypervector;
use crate::domain::semantic::semantic_vector;
use crate::infrastructure::backend::VectorMath;

/// Permutation stride between sequence positions
pub const SEQUENCE_STRIDE: isize = 100;

const NGRAM: usize = 3;

static TOKEN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\w+").expect("token pattern is a valid regex"));

/// Lower-cased word tokens in order of appearance.
pub fn tokenize(text: &str) -> Vec<String> {
    TOKEN_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// A structured record supplied by a document source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(rename = "type", default = "default_doc_type")]
    pub doc_type: String,
}

fn default_doc_type() -> String {
    "document".to_string()
}

/// A named concept with optional attributes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConceptInput {
    pub name: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl ConceptInput {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }
}

/// Collaborator-supplied `{data, modality}` pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalInput {
    pub modality: String,
    pub data: serde_json::Value,
}

impl ModalInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            modality: Modality::Text.to_string(),
            data: serde_json::Value::String(text.into()),
        }
    }

    pub fn concept(name: impl Into<String>) -> Self {
        Self {
            modality: Modality::Concept.to_string(),
            data: serde_json::Value::String(name.into()),
        }
    }

    pub fn document(record: &DocumentRecord) -> Self {
        Self {
            modality: Modality::Document.to_string(),
            data: serde_json::to_value(record).unwrap_or(serde_json::Value::Null),
        }
    }
}

/// One element of a temporal chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceItem {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub input: ModalInput,
}

fn invalid(modality: &str, err: impl std::fmt::Display) -> HolomemError {
    HolomemError::InvalidInput(format!("{} payload: {}", modality, err))
}

pub struct MultiModalEncoder {
    dimensions: usize,
    math: VectorMath,
    word_cache: DashMap<String, Hypervector>,
}

impl MultiModalEncoder {
    pub fn new(dimensions: usize, math: VectorMath) -> Self {
        Self {
            dimensions,
            math,
            word_cache: DashMap::new(),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn cached_words(&self) -> usize {
        self.word_cache.len()
    }

    pub fn clear_word_cache(&self) {
        self.word_cache.clear();
    }

    /// Bundle of the word's boundary-padded character trigrams. Memoized.
    pub fn encode_word(&self, word: &str) -> HolomemResult<Hypervector> {
        if let Some(cached) = self.word_cache.get(word) {
            return Ok(cached.clone());
        }

        let padded: Vec<char> = format!("#{}#", word).chars().collect();
        let grams: Vec<Hypervector> = padded
            .windows(NGRAM)
            .map(|w| {
                let gram: String = w.iter().collect();
                semantic_vector(self.dimensions, &format!("ngram:{}", gram))
            })
            .collect();
        let refs: Vec<&Hypervector> = grams.iter().collect();
        let vector = self.math.bundle(self.dimensions, &refs)?;

        // Two racing encoders compute the same vector; first insert wins
        Ok(self
            .word_cache
            .entry(word.to_string())
            .or_insert(vector)
            .clone())
    }

    /// Word vectors permuted by position, then bundled.
    pub fn encode_text(&self, text: &str) -> HolomemResult<Hypervector> {
        let tokens = tokenize(text);
        let mut positioned = Vec::with_capacity(tokens.len());
        for (index, token) in tokens.iter().enumerate() {
            positioned.push(self.encode_word(token)?.permute(index as isize));
        }
        let refs: Vec<&Hypervector> = positioned.iter().collect();
        self.math.bundle(self.dimensions, &refs)
    }

    /// Bundle of independently encoded sentences. Word positions restart at
    /// every sentence, so a sentence matches the passage wherever it sits.
    pub fn encode_passage<S: AsRef<str>>(&self, sentences: &[S]) -> HolomemResult<Hypervector> {
        let mut encoded = Vec::with_capacity(sentences.len());
        for sentence in sentences {
            encoded.push(self.encode_text(sentence.as_ref())?);
        }
        let refs: Vec<&Hypervector> = encoded.iter().collect();
        self.math.bundle(self.dimensions, &refs)
    }

    pub fn encode_document(&self, record: &DocumentRecord) -> HolomemResult<Hypervector> {
        let mut parts = Vec::new();
        if let Some(title) = non_empty(&record.title) {
            let title = self.encode_text(title)?;
            parts.push(title.clone());
            parts.push(title);
        }
        for field in [&record.synopsis, &record.content, &record.notes] {
            if let Some(text) = non_empty(field) {
                parts.push(self.encode_text(text)?);
            }
        }
        if parts.is_empty() {
            return Ok(Hypervector::zeros(self.dimensions));
        }
        parts.push(semantic_vector(
            self.dimensions,
            &format!("doctype:{}", record.doc_type.to_lowercase()),
        ));
        let refs: Vec<&Hypervector> = parts.iter().collect();
        self.math.bundle(self.dimensions, &refs)
    }

    /// Seeded base vector for a bare concept name.
    pub fn concept_base(&self, name: &str) -> Hypervector {
        semantic_vector(
            self.dimensions,
            &format!("concept:{}", name.trim().to_lowercase()),
        )
    }

    pub fn encode_concept(&self, concept: &ConceptInput) -> HolomemResult<Hypervector> {
        if concept.name.trim().is_empty() && concept.attributes.is_empty() {
            return Ok(Hypervector::zeros(self.dimensions));
        }
        let base = self.concept_base(&concept.name);
        if concept.attributes.is_empty() {
            return Ok(base);
        }

        let pairs: Vec<(Hypervector, Hypervector)> = concept
            .attributes
            .iter()
            .map(|(key, value)| {
                (
                    semantic_vector(self.dimensions, &format!("attr:{}", key.to_lowercase())),
                    semantic_vector(self.dimensions, &format!("value:{}", value.to_lowercase())),
                )
            })
            .collect();
        let pair_refs: Vec<(&Hypervector, &Hypervector)> =
            pairs.iter().map(|(k, v)| (k, v)).collect();
        let bindings = self.math.bind_batch(&pair_refs)?;

        // Base weighted by the attribute count keeps the result near the bare concept
        let mut parts: Vec<&Hypervector> = vec![&base; bindings.len().max(1)];
        parts.extend(bindings.iter());
        self.math.bundle(self.dimensions, &parts)
    }

    pub fn encode_composite(&self, inputs: &[ModalInput]) -> HolomemResult<Hypervector> {
        let mut encoded = Vec::with_capacity(inputs.len());
        for input in inputs {
            encoded.push(self.encode(input)?);
        }
        let refs: Vec<&Hypervector> = encoded.iter().collect();
        self.math.bundle(self.dimensions, &refs)
    }

    pub fn encode_sequence(&self, items: &[SequenceItem]) -> HolomemResult<Hypervector> {
        let mut ordered: Vec<&SequenceItem> = items.iter().collect();
        ordered.sort_by_key(|item| item.timestamp);

        let mut encoded = Vec::with_capacity(ordered.len());
        for (index, item) in ordered.iter().enumerate() {
            encoded.push(self.encode(&item.input)?.permute(index as isize * SEQUENCE_STRIDE));
        }
        let refs: Vec<&Hypervector> = encoded.iter().collect();
        self.math.bundle(self.dimensions, &refs)
    }

    /// Dispatch a `{data, modality}` pair to the matching encoder.
    pub fn encode(&self, input: &ModalInput) -> HolomemResult<Hypervector> {
        let modality = input.modality.to_ascii_lowercase();
        debug!(modality = %modality, "Encoding modal input");
        match modality.as_str() {
            "text" => match &input.data {
                serde_json::Value::String(text) => self.encode_text(text),
                serde_json::Value::Null => Ok(Hypervector::zeros(self.dimensions)),
                other => Err(invalid("text", format!("expected a string, got {}", other))),
            },
            "document" => {
                let record: DocumentRecord = serde_json::from_value(input.data.clone())
                    .map_err(|e| invalid("document", e))?;
                self.encode_document(&record)
            }
            "concept" => {
                let concept = match &input.data {
                    serde_json::Value::String(name) => ConceptInput::named(name.clone()),
                    other => serde_json::from_value(other.clone())
                        .map_err(|e| invalid("concept", e))?,
                };
                self.encode_concept(&concept)
            }
            "vector" => {
                let components: Vec<i8> = serde_json::from_value(input.data.clone())
                    .map_err(|e| invalid("vector", e))?;
                let vector = Hypervector::from_components(components)?;
                HolomemError::check_dimensions(self.dimensions, vector.dimensions())?;
                Ok(vector)
            }
            "composite" => {
                let inputs: Vec<ModalInput> = serde_json::from_value(input.data.clone())
                    .map_err(|e| invalid("composite", e))?;
                self.encode_composite(&inputs)
            }
            "sequence" => {
                let items: Vec<SequenceItem> = serde_json::from_value(input.data.clone())
                    .map_err(|e| invalid("sequence", e))?;
                self.encode_sequence(&items)
            }
            _ => Err(HolomemError::NoEncoderRegistered(input.modality.clone())),
        }
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const D: usize = 10_000;

    fn encoder() -> MultiModalEncoder {
        MultiModalEncoder::new(D, VectorMath::scalar())
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("The cat, sat on THE mat!"),
            vec!["the", "cat", "sat", "on", "the", "mat"]
        );
        assert!(tokenize("  ...  ").is_empty());
        assert_eq!(
            tokenize("snake_case Über-café 42"),
            vec!["snake_case", "über", "café", "42"]
        );
    }

    #[test]
    fn test_text_encoding_is_deterministic() {
        let enc = encoder();
        let a = enc.encode_text("the quick brown fox").unwrap();
        let b = enc.encode_text("the quick brown fox").unwrap();
        assert_eq!(a, b);
        assert_eq!(enc.cached_words(), 4);

        enc.clear_word_cache();
        assert_eq!(enc.cached_words(), 0);
        assert_eq!(enc.encode_text("the quick brown fox").unwrap(), a);
    }

    #[test]
    fn test_shared_ngrams_raise_similarity() {
        let enc = encoder();
        let man = enc.encode_word("man").unwrap();
        let woman = enc.encode_word("woman").unwrap();
        let car = enc.encode_word("car").unwrap();
        assert!(man.similarity(&woman).unwrap() > 0.2);
        assert!(man.similarity(&car).unwrap().abs() < 0.05);
    }

    #[test]
    fn test_word_order_matters() {
        let enc = encoder();
        let a = enc.encode_text("dog bites man").unwrap();
        let b = enc.encode_text("man bites dog").unwrap();
        let sim = a.similarity(&b).unwrap();
        assert!(sim < 0.9, "sim = {}", sim);
        assert!(sim > 0.1, "sim = {}", sim);
    }

    #[test]
    fn test_empty_inputs_are_neutral() {
        let enc = encoder();
        assert!(enc.encode_text("").unwrap().is_zero());
        assert!(enc.encode_document(&DocumentRecord::default()).unwrap().is_zero());
        assert!(enc.encode_composite(&[]).unwrap().is_zero());
        assert!(enc.encode_sequence(&[]).unwrap().is_zero());
    }

    #[test]
    fn test_passage_sentence_matches_at_any_position() {
        let encoder = encoder();
        let sentences = [
            "the tide came in before dawn",
            "gulls circled the harbor wall",
            "the lighthouse keeper found a letter",
            "rain hammered the lantern glass",
        ];
        let passage = encoder.encode_passage(&sentences).unwrap();
        let inside = encoder.encode_text(sentences[2]).unwrap();
        let outside = encoder.encode_text("revenue figures were revised upward").unwrap();

        let hit = inside.similarity(&passage).unwrap();
        assert!(hit > 0.3, "embedded sentence similarity {}", hit);
        assert!(outside.similarity(&passage).unwrap() < 0.15);

        // Flattening the sentences into one text loses the mid-passage match
        let flat = encoder.encode_text(&sentences.join(" ")).unwrap();
        assert!(inside.similarity(&flat).unwrap() < hit);
        assert!(encoder.encode_passage::<&str>(&[]).unwrap().is_zero());
    }

    #[test]
    fn test_document_title_dominates() {
        let enc = encoder();
        let doc = DocumentRecord {
            title: Some("harbour lights".to_string()),
            content: Some("a quiet evening by the water".to_string()),
            doc_type: "chapter".to_string(),
            ..Default::default()
        };
        let v = enc.encode_document(&doc).unwrap();
        let title = enc.encode_text("harbour lights").unwrap();
        let content = enc.encode_text("a quiet evening by the water").unwrap();
        assert!(v.similarity(&title).unwrap() > v.similarity(&content).unwrap());
    }

    #[test]
    fn test_concept_attributes_shift_but_stay_close() {
        let enc = encoder();
        let bare = enc.encode_concept(&ConceptInput::named("apple")).unwrap();
        let mut attributes = BTreeMap::new();
        attributes.insert("color".to_string(), "red".to_string());
        let red = enc
            .encode_concept(&ConceptInput {
                name: "apple".to_string(),
                attributes,
            })
            .unwrap();
        let sim = red.similarity(&bare).unwrap();
        assert!(sim > 0.4 && sim < 1.0, "sim = {}", sim);
    }

    #[test]
    fn test_sequence_order_is_by_timestamp() {
        let enc = encoder();
        let t = |s| Utc.timestamp_opt(s, 0).unwrap();
        let first = SequenceItem {
            timestamp: t(10),
            input: ModalInput::text("wake up"),
        };
        let second = SequenceItem {
            timestamp: t(20),
            input: ModalInput::text("make coffee"),
        };
        let forward = enc.encode_sequence(&[first.clone(), second.clone()]).unwrap();
        let shuffled = enc.encode_sequence(&[second, first]).unwrap();
        assert_eq!(forward, shuffled);
    }

    #[test]
    fn test_dispatch() {
        let enc = encoder();
        let text = enc.encode(&ModalInput::text("hello world")).unwrap();
        assert_eq!(text, enc.encode_text("hello world").unwrap());

        let composite = ModalInput {
            modality: "composite".to_string(),
            data: serde_json::json!([
                {"modality": "text", "data": "hello world"},
                {"modality": "concept", "data": {"name": "greeting"}}
            ]),
        };
        let v = enc.encode(&composite).unwrap();
        assert!(v.similarity(&text).unwrap() > 0.3);

        let unknown = ModalInput {
            modality: "audio".to_string(),
            data: serde_json::Value::Null,
        };
        assert_eq!(
            enc.encode(&unknown).unwrap_err(),
            HolomemError::NoEncoderRegistered("audio".to_string())
        );

        let bad = ModalInput {
            modality: "document".to_string(),
            data: serde_json::json!(42),
        };
        assert!(matches!(enc.encode(&bad), Err(HolomemError::InvalidInput(_))));
    }

    #[test]
    fn test_vector_modality_checks_width() {
        let enc = MultiModalEncoder::new(4, VectorMath::scalar());
        let ok = ModalInput {
            modality: "vector".to_string(),
            data: serde_json::json!([1, -1, 0, 1]),
        };
        assert_eq!(enc.encode(&ok).unwrap().components(), &[1, -1, 0, 1]);

        let wide = ModalInput {
            modality: "vector".to_string(),
            data: serde_json::json!([1, -1, 0, 1, 1]),
        };
        assert!(matches!(
            enc.encode(&wide),
            Err(HolomemError::DimensionMismatch { .. })
        ));
    }
}
