// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Ingest command: memorize documents, query them, export a snapshot

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use aegis_holomem::QueryResult;

use crate::embedded::EmbeddedMemory;

#[derive(Args)]
pub struct IngestArgs {
    /// Text or JSON document files
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Query the ingested memories with this text
    #[arg(short, long)]
    pub query: Option<String>,

    /// Number of query results
    #[arg(short = 'k', long, default_value = "5")]
    pub top: usize,

    /// Write a JSON snapshot of the memory system
    #[arg(long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,
}

pub async fn execute(args: IngestArgs, config_path: Option<PathBuf>) -> Result<()> {
    let memory = EmbeddedMemory::new(config_path)?;
    let report = memory.ingest(&args.files)?;
    println!(
        "{}",
        format!(
            "✓ Memorized {} record(s) from {} file(s), {} passage segment(s)",
            report.records,
            args.files.len(),
            report.segments
        )
        .green()
    );

    if let Some(query) = &args.query {
        let results = memory
            .system
            .query_text(query, args.top)
            .context("Query failed")?;
        print_results(query, &results);
    }

    if let Some(path) = &args.snapshot {
        let snapshot = memory.system.export_snapshot();
        let json =
            serde_json::to_string_pretty(&snapshot).context("Failed to serialize snapshot")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write snapshot to {:?}", path))?;
        println!(
            "{}",
            format!("✓ Snapshot written: {}", path.display()).green()
        );
    }

    Ok(())
}

pub fn print_results(query: &str, results: &[QueryResult]) {
    println!();
    println!("{} {}", "Query:".bold(), query);
    if results.is_empty() {
        println!("  {}", "No memories above the similarity threshold".dimmed());
        return;
    }
    for (rank, result) in results.iter().enumerate() {
        println!(
            "  {}. {} {}",
            rank + 1,
            format!("{:.3}", result.similarity).cyan(),
            result
                .reconstructed
                .as_deref()
                .unwrap_or(result.entry.id.as_str())
                .bold()
        );
        println!("     {}", result.explanation.dimmed());
    }
}
