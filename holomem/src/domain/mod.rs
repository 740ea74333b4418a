// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain layer of the holographic memory bounded context.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Hypervector algebra, entries, concepts, events and configuration

pub mod concept;
pub mod config;
pub mod entry;
pub mod error;
pub mod events;
pub mod hypervector;
pub mod semantic;

pub use concept::*;
pub use config::*;
pub use entry::*;
pub use error::*;
pub use events::*;
pub use hypervector::*;
pub use semantic::*;
