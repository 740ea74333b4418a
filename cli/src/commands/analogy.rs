// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Analogy command: solve `a:b::c:?` over a word corpus

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use crate::commands::ingest::print_results;
use crate::embedded::EmbeddedMemory;

#[derive(Args)]
pub struct AnalogyArgs {
    pub a: String,
    pub b: String,
    pub c: String,

    /// Candidate answers (comma separated or repeated); the terms are added too
    #[arg(long, value_delimiter = ',', required = true)]
    pub corpus: Vec<String>,

    /// Number of answers
    #[arg(short = 'k', long, default_value = "3")]
    pub top: usize,
}

pub async fn execute(args: AnalogyArgs, config_path: Option<PathBuf>) -> Result<()> {
    let memory = EmbeddedMemory::new(config_path)?;

    for word in corpus_words(&args) {
        memory
            .system
            .memorize_text(&word)
            .with_context(|| format!("Failed to memorize '{}'", word))?;
    }

    let answer = memory
        .system
        .find_analogy(&args.a, &args.b, &args.c, args.top)
        .context("Analogy failed")?;

    let question = format!("{} : {} :: {} : ?", args.a, args.b, args.c);
    print_results(&question, &answer.candidates);
    println!();
    let confidence = format!("{:.3}", answer.confidence);
    println!(
        "  Transform confidence: {}",
        if answer.confidence < 0.1 {
            confidence.yellow()
        } else {
            confidence.green()
        }
    );

    Ok(())
}

/// Corpus plus the three terms, trimmed and deduplicated in order.
fn corpus_words(args: &AnalogyArgs) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    for word in [&args.a, &args.b, &args.c].into_iter().chain(args.corpus.iter()) {
        let word = word.trim().to_lowercase();
        if !word.is_empty() && !words.contains(&word) {
            words.push(word);
        }
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corpus_words_dedupes_terms() {
        let args = AnalogyArgs {
            a: "King".to_string(),
            b: "queen".to_string(),
            c: "man".to_string(),
            corpus: vec!["woman".to_string(), " car ".to_string(), "king".to_string()],
            top: 3,
        };
        assert_eq!(
            corpus_words(&args),
            vec!["king", "queen", "man", "woman", "car"]
        );
    }
}
