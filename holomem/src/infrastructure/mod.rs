// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Infrastructure layer for the holographic memory bounded context

pub mod backend;
pub mod event_bus;
pub mod repository;
pub mod substrate;

pub use backend::{BackendError, ScalarBackend, VectorBackend, VectorMath};
#[cfg(feature = "parallel")]
pub use backend::RayonBackend;
pub use event_bus::{EventBus, EventBusError, EventReceiver, MemoryEventReceiver};
pub use repository::{
    ConsolidationReport, DecayReport, MemorySubstrate, RetrievedEntry, StoreOutcome,
    SubstrateStats,
};
pub use substrate::InMemorySubstrate;
