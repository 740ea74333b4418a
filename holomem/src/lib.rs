// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Holographic Hyperdimensional Memory
//!
//! Content-addressable associative memory over fixed-dimension ternary
//! hypervectors. Heterogeneous inputs are encoded onto one vector space,
//! stored in a capacity-bounded substrate and retrieved by similarity.
//! A background evolution engine consolidates, decays and synthesises
//! new concepts from what is stored.
//!
//! # Architecture
//!
//! - **Layer:** Learning & Memory Layer
//! - **Purpose:** Associative memory for the AEGIS cortex
//!
//! ```no_run
//! use aegis_holomem::{HolographicMemorySystem, HolomemConfig};
//!
//! let system = HolographicMemorySystem::new(HolomemConfig {
//!     auto_evolve: false,
//!     ..HolomemConfig::default()
//! })?;
//! system.memorize_text("the cat sat on the mat")?;
//! let _hits = system.query_text("a cat on a mat", 5)?;
//! # Ok::<(), aegis_holomem::HolomemError>(())
//! ```

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::*;
pub use domain::*;
pub use infrastructure::*;
