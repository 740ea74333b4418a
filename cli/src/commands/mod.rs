// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the holomem CLI

pub mod analogy;
pub mod config;
pub mod dream;
pub mod ingest;

pub use self::analogy::AnalogyArgs;
pub use self::config::ConfigCommand;
pub use self::dream::DreamArgs;
pub use self::ingest::IngestArgs;
