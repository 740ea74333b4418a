// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Process-wide semantic vector table.
//!
//! Maps symbolic names (relation roles, document types, attribute keys) to
//! deterministic hypervectors. Vectors are derived from a hash of the name, so
//! nothing needs persisting: the table is only a memo. It is populated lazily
//! and cleared whenever a caller asks for a different dimensionality.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use super::hypervector::Hypervector;

static SEMANTIC_TABLE: Lazy<RwLock<SemanticTable>> =
    Lazy::new(|| RwLock::new(SemanticTable::default()));

#[derive(Debug, Default)]
struct SemanticTable {
    dimensions: usize,
    vectors: HashMap<String, Hypervector>,
}

/// Look up (or create) the vector for `name` at the given width.
pub fn semantic_vector(dimensions: usize, name: &str) -> Hypervector {
    {
        let table = SEMANTIC_TABLE.read();
        if table.dimensions == dimensions {
            if let Some(vector) = table.vectors.get(name) {
                return vector.clone();
            }
        }
    }

    let mut table = SEMANTIC_TABLE.write();
    if table.dimensions != dimensions {
        tracing::debug!(
            old_dimensions = table.dimensions,
            new_dimensions = dimensions,
            "Resetting semantic vector table"
        );
        table.vectors.clear();
        table.dimensions = dimensions;
    }
    table
        .vectors
        .entry(name.to_string())
        .or_insert_with(|| Hypervector::from_label(dimensions, name))
        .clone()
}

/// Number of memoized symbols.
pub fn semantic_table_len() -> usize {
    SEMANTIC_TABLE.read().vectors.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_name_same_vector() {
        let a = semantic_vector(2_048, "causes");
        let b = semantic_vector(2_048, "causes");
        assert_eq!(a, b);
        assert_eq!(a, Hypervector::from_label(2_048, "causes"));
    }

    #[test]
    fn test_distinct_names_near_orthogonal() {
        let a = semantic_vector(10_000, "before");
        let b = semantic_vector(10_000, "after");
        assert!(a.similarity(&b).unwrap().abs() < 0.05);
    }

    #[test]
    fn test_dimension_change_yields_matching_width() {
        assert_eq!(semantic_vector(512, "has").dimensions(), 512);
        assert_eq!(semantic_vector(1_024, "has").dimensions(), 1_024);
        assert!(semantic_table_len() >= 1);
    }
}
