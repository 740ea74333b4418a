// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use aegis_holomem::HolomemConfigManifest;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,

        /// Print the effective manifest as YAML
        #[arg(long)]
        yaml: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./holomem-config.yaml)
        #[arg(short, long, default_value = "./holomem-config.yaml")]
        output: PathBuf,

        /// Include every field with comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths, yaml } => show(config_override, paths, yaml).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool, as_yaml: bool) -> Result<()> {
    let manifest = HolomemConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        match &config_override {
            Some(path) => println!("  --config flag: {}", path.display()),
            None => println!("  --config flag: {}", "(not set)".dimmed()),
        }
        for (rank, path) in HolomemConfigManifest::search_paths().iter().enumerate() {
            let found = if path.is_file() { "found".green() } else { "missing".dimmed() };
            println!("  {}. {} ({})", rank + 1, path.display(), found);
        }
        println!();
    }

    if as_yaml {
        let yaml = serde_yaml::to_string(&manifest).context("Failed to render configuration")?;
        print!("{}", yaml);
        return Ok(());
    }

    let spec = &manifest.spec;
    println!("{}", "Current configuration:".bold());
    println!("  Name: {}", manifest.metadata.name);
    println!();

    println!("{}", "Vector Space:".bold());
    println!("  Dimensions: {}", spec.dimensions);
    println!("  Max memories: {}", spec.max_memories);
    println!("  Similarity threshold: {}", spec.similarity_threshold);
    println!(
        "  Accelerated backend: {}",
        if spec.accelerated_backend { "enabled" } else { "disabled" }
    );
    println!();

    println!("{}", "Substrate:".bold());
    println!("  Min strength: {}", spec.substrate.min_strength);
    println!("  Consolidation factor: {}", spec.substrate.consolidation_factor);
    println!(
        "  Decay noise: {}/h (max {})",
        spec.substrate.decay_noise_per_hour, spec.substrate.max_decay_noise
    );
    println!();

    println!("{}", "Reasoning:".bold());
    println!(
        "  Conflict band: [{}, {})",
        spec.consistency.conflict_min, spec.consistency.conflict_max
    );
    println!("  Analogy floor: {}", spec.analogy.min_similarity);
    println!();

    let evolution = &spec.evolution;
    println!("{}", "Evolution:".bold());
    println!(
        "  Auto-evolve: {}",
        if spec.auto_evolve { "on".green() } else { "off".dimmed() }
    );
    println!(
        "  Consolidation every {:?} (access threshold {})",
        evolution.consolidation_interval, evolution.consolidation_threshold
    );
    println!(
        "  Decay every {:?} (rate {})",
        evolution.decay_interval, evolution.decay_rate
    );
    println!(
        "  Creativity {} / novelty {} / coherence {}",
        evolution.creativity_threshold, evolution.min_novelty, evolution.min_coherence
    );
    if let Some(seed) = spec.rng_seed {
        println!("  RNG seed: {}", seed);
    }
    println!();

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let manifest = HolomemConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    manifest
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    };

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_are_valid_manifests() {
        for template in [
            include_str!("../../templates/config-minimal.yaml"),
            include_str!("../../templates/config-with-examples.yaml"),
        ] {
            let manifest = HolomemConfigManifest::from_yaml_str(template).unwrap();
            manifest.validate().unwrap();
        }
    }

    #[test]
    fn test_full_template_matches_defaults() {
        let manifest = HolomemConfigManifest::from_yaml_str(include_str!(
            "../../templates/config-with-examples.yaml"
        ))
        .unwrap();
        assert_eq!(manifest.spec, HolomemConfigManifest::default().spec);
    }

    #[tokio::test]
    async fn test_generate_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("holomem.yaml");
        generate(output.clone(), false).await.unwrap();

        let manifest = HolomemConfigManifest::from_yaml_file(&output).unwrap();
        assert_eq!(manifest.kind, "HolographicMemory");
    }
}
