// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Error taxonomy for the holographic memory bounded context.
//!
//! Configuration errors (dimension mismatch, unregistered modality) are fatal
//! to the offending call. Not-found conditions are modelled as `Option`/empty
//! results and never appear here. Capacity pressure is resolved by eviction
//! and is not an error either.

use thiserror::Error;

/// Errors surfaced by the algebra, the encoder and the substrate.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HolomemError {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("No encoder registered for modality: {0}")]
    NoEncoderRegistered(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid hypervector component {0}: components must be -1, 0 or +1")]
    InvalidComponent(i8),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Evolution scheduler unavailable: {0}")]
    EvolutionUnavailable(String),
}

pub type HolomemResult<T> = Result<T, HolomemError>;

impl HolomemError {
    /// Guard used by every binary operation of the algebra.
    pub fn check_dimensions(expected: usize, actual: usize) -> HolomemResult<()> {
        if expected != actual {
            return Err(HolomemError::DimensionMismatch { expected, actual });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_dimensions() {
        assert!(HolomemError::check_dimensions(10, 10).is_ok());
        let err = HolomemError::check_dimensions(10, 12).unwrap_err();
        assert_eq!(
            err,
            HolomemError::DimensionMismatch {
                expected: 10,
                actual: 12
            }
        );
        assert_eq!(err.to_string(), "Dimension mismatch: expected 10, got 12");
    }
}
