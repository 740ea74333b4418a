// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Dream command: ingest documents, dream, report the strongest concepts

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::time::Duration;

use aegis_holomem::ConceptCandidate;

use crate::embedded::EmbeddedMemory;

#[derive(Args)]
pub struct DreamArgs {
    /// Text or JSON document files
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// How long to dream
    #[arg(long, default_value = "2000")]
    pub duration_ms: u64,

    /// Number of concepts to report
    #[arg(long, default_value = "5")]
    pub top: usize,

    /// Store the reported concepts as generated memories
    #[arg(long)]
    pub persist: bool,
}

pub async fn execute(args: DreamArgs, config_path: Option<PathBuf>) -> Result<()> {
    let memory = EmbeddedMemory::new(config_path)?;
    let report = memory.ingest(&args.files)?;
    println!(
        "Memorized {} record(s) in {} segment(s); dreaming for {} ms...",
        report.records, report.segments, args.duration_ms
    );

    let dreamt = memory
        .system
        .dream(Duration::from_millis(args.duration_ms))
        .await;
    let best = top_ranked(&dreamt, args.top);

    println!();
    println!(
        "{}",
        format!("Dreamt {} candidate concept(s)", dreamt.len()).bold()
    );
    for (rank, candidate) in best.iter().enumerate() {
        println!(
            "  {}. {} {} novelty {:.2} coherence {:.2} utility {:.2}",
            rank + 1,
            candidate.name.bold(),
            format!("score {:.3}", candidate.score).cyan(),
            candidate.novelty,
            candidate.coherence,
            candidate.utility
        );
        let parents: Vec<String> = candidate
            .components
            .iter()
            .map(|id| {
                memory
                    .system
                    .get(id)
                    .and_then(|entry| entry.metadata.context.reconstruct())
                    .unwrap_or_else(|| id.to_string())
            })
            .collect();
        println!("     {}", format!("from {}", parents.join(" + ")).dimmed());
    }

    if args.persist && !best.is_empty() {
        let owned: Vec<ConceptCandidate> = best.into_iter().cloned().collect();
        let persisted = memory
            .system
            .persist_concepts(&owned, owned.len())
            .context("Failed to persist dreamt concepts")?;
        println!();
        println!(
            "{}",
            format!("✓ Persisted {} concept(s)", persisted.len()).green()
        );
    }

    Ok(())
}

/// Best candidates by `novelty × coherence`.
pub fn top_ranked(candidates: &[ConceptCandidate], n: usize) -> Vec<&ConceptCandidate> {
    let mut ranked: Vec<&ConceptCandidate> = candidates.iter().collect();
    ranked.sort_by(|a, b| {
        b.rank()
            .partial_cmp(&a.rank())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(n);
    ranked
}
