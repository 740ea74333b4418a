// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Holographic Memory Configuration Types
//
// Defines the configuration schema for a holographic memory instance:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Vector width, capacity and retrieval threshold
// - Substrate consolidation/decay dynamics
// - Consistency band and analogy filters
// - Evolution scheduler intervals and creativity thresholds
// - Passage segmentation windows

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::concept::CreativityThresholds;
use super::error::{HolomemError, HolomemResult};
use super::hypervector::DEFAULT_DIMENSIONS;

pub const API_VERSION: &str = "100monkeys.ai/v1";
pub const MANIFEST_KIND: &str = "HolographicMemory";
pub const CONFIG_PATH_ENV: &str = "HOLOMEM_CONFIG_PATH";
pub const LOCAL_CONFIG_FILE: &str = "./holomem-config.yaml";

/// Top-level Kubernetes-style holographic memory manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HolomemConfigManifest {
    /// API version (must be "100monkeys.ai/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "HolographicMemory")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: HolomemConfig,
}

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

/// Memory system configuration (content under spec:)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolomemConfig {
    /// Hypervector width shared by every vector in the instance
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// Hard cap on stored entries (enforced by eviction)
    #[serde(default = "default_max_memories")]
    pub max_memories: usize,

    /// Default retrieval floor
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Start the evolution scheduler on construction
    #[serde(default = "default_true")]
    pub auto_evolve: bool,

    /// Use the parallel vector backend when compiled in
    #[serde(default = "default_true")]
    pub accelerated_backend: bool,

    /// Seed for evolution randomness (OS entropy when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rng_seed: Option<u64>,

    #[serde(default)]
    pub substrate: SubstrateConfig,

    #[serde(default)]
    pub consistency: ConsistencyConfig,

    #[serde(default)]
    pub analogy: AnalogyConfig,

    #[serde(default)]
    pub evolution: EvolutionConfig,

    #[serde(default)]
    pub segmentation: SegmentationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstrateConfig {
    /// Entries weaker than this after decay are forgotten
    #[serde(default = "default_min_strength")]
    pub min_strength: f64,

    /// Multiplier applied to frequently accessed entries
    #[serde(default = "default_consolidation_factor")]
    pub consolidation_factor: f64,

    /// Noise ratio injected per idle hour during decay
    #[serde(default = "default_decay_noise_per_hour")]
    pub decay_noise_per_hour: f64,

    #[serde(default = "default_max_decay_noise")]
    pub max_decay_noise: f64,

    #[serde(default = "default_initial_strength")]
    pub initial_strength: f64,
}

/// Suspicious similarity band for contradiction detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyConfig {
    #[serde(default = "default_conflict_min")]
    pub conflict_min: f64,

    #[serde(default = "default_conflict_max")]
    pub conflict_max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalogyConfig {
    /// Retrieval floor for analogy answers
    #[serde(default = "default_analogy_min_similarity")]
    pub min_similarity: f64,

    /// Candidates at least this similar to A, B or C are not answers
    #[serde(default = "default_exclude_similarity")]
    pub exclude_similarity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionConfig {
    #[serde(with = "humantime_serde", default = "default_consolidation_interval")]
    pub consolidation_interval: Duration,

    #[serde(with = "humantime_serde", default = "default_decay_interval")]
    pub decay_interval: Duration,

    /// Access count at which an entry is reinforced
    #[serde(default = "default_consolidation_threshold")]
    pub consolidation_threshold: u64,

    /// Fractional strength loss per decay cycle
    #[serde(default = "default_decay_rate")]
    pub decay_rate: f64,

    #[serde(default = "default_creativity_threshold")]
    pub creativity_threshold: f64,

    #[serde(default = "default_min_novelty")]
    pub min_novelty: f64,

    #[serde(default = "default_min_coherence")]
    pub min_coherence: f64,

    /// Memories sampled per generation pass
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,

    #[serde(default = "default_sample_min_similarity")]
    pub sample_min_similarity: f64,

    /// Creative band for parent pairs
    #[serde(default = "default_pair_min_similarity")]
    pub pair_min_similarity: f64,

    #[serde(default = "default_pair_max_similarity")]
    pub pair_max_similarity: f64,

    #[serde(default = "default_target_sparsity")]
    pub target_sparsity: f64,

    /// Store accepted candidates from the consolidation cycle
    #[serde(default = "default_true")]
    pub persist_generated: bool,

    #[serde(default = "default_max_concepts_per_cycle")]
    pub max_concepts_per_cycle: usize,

    #[serde(with = "humantime_serde", default = "default_dream_pause")]
    pub dream_pause: Duration,

    #[serde(default = "default_strengthen_factor")]
    pub strengthen_factor: f64,

    #[serde(default = "default_weaken_factor")]
    pub weaken_factor: f64,

    #[serde(default = "default_weaken_noise")]
    pub weaken_noise: f64,

    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
}

/// Splitting of long text into overlapping passage segments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationConfig {
    /// Scenes shorter than this merge into the following scene
    #[serde(default = "default_segment_min_chars")]
    pub min_chars: usize,

    #[serde(default = "default_segment_max_chars")]
    pub max_chars: usize,

    /// Trailing sentences up to this length repeat at the start of the next segment
    #[serde(default = "default_segment_overlap_chars")]
    pub overlap_chars: usize,

    /// Sentences bundled per segment. One sentence of a segment stays clear
    /// of the default retrieval floor up to about eight.
    #[serde(default = "default_segment_max_sentences")]
    pub max_sentences: usize,
}

impl EvolutionConfig {
    pub fn thresholds(&self) -> CreativityThresholds {
        CreativityThresholds {
            creativity: self.creativity_threshold,
            min_novelty: self.min_novelty,
            min_coherence: self.min_coherence,
        }
    }
}

fn default_segment_min_chars() -> usize {
    200
}

fn default_segment_max_chars() -> usize {
    800
}

fn default_segment_overlap_chars() -> usize {
    50
}

fn default_segment_max_sentences() -> usize {
    6
}

fn default_true() -> bool {
    true
}

fn default_dimensions() -> usize {
    DEFAULT_DIMENSIONS
}

fn default_max_memories() -> usize {
    10_000
}

fn default_similarity_threshold() -> f64 {
    0.2
}

fn default_min_strength() -> f64 {
    0.1
}

fn default_consolidation_factor() -> f64 {
    1.1
}

fn default_decay_noise_per_hour() -> f64 {
    0.001
}

fn default_max_decay_noise() -> f64 {
    0.05
}

fn default_initial_strength() -> f64 {
    1.0
}

fn default_conflict_min() -> f64 {
    0.35
}

fn default_conflict_max() -> f64 {
    0.85
}

fn default_analogy_min_similarity() -> f64 {
    0.05
}

fn default_exclude_similarity() -> f64 {
    0.95
}

fn default_consolidation_interval() -> Duration {
    Duration::from_secs(60)
}

fn default_decay_interval() -> Duration {
    Duration::from_secs(300)
}

fn default_consolidation_threshold() -> u64 {
    3
}

fn default_decay_rate() -> f64 {
    0.05
}

fn default_creativity_threshold() -> f64 {
    0.7
}

fn default_min_novelty() -> f64 {
    0.3
}

fn default_min_coherence() -> f64 {
    0.2
}

fn default_sample_size() -> usize {
    50
}

fn default_sample_min_similarity() -> f64 {
    -1.0
}

fn default_pair_min_similarity() -> f64 {
    0.2
}

fn default_pair_max_similarity() -> f64 {
    0.7
}

fn default_target_sparsity() -> f64 {
    0.2
}

fn default_max_concepts_per_cycle() -> usize {
    10
}

fn default_dream_pause() -> Duration {
    Duration::from_millis(10)
}

fn default_strengthen_factor() -> f64 {
    1.5
}

fn default_weaken_factor() -> f64 {
    0.5
}

fn default_weaken_noise() -> f64 {
    0.1
}

fn default_mutation_rate() -> f64 {
    0.2
}

impl Default for HolomemConfig {
    fn default() -> Self {
        Self {
            dimensions: default_dimensions(),
            max_memories: default_max_memories(),
            similarity_threshold: default_similarity_threshold(),
            auto_evolve: true,
            accelerated_backend: true,
            rng_seed: None,
            substrate: SubstrateConfig::default(),
            consistency: ConsistencyConfig::default(),
            analogy: AnalogyConfig::default(),
            evolution: EvolutionConfig::default(),
            segmentation: SegmentationConfig::default(),
        }
    }
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            min_chars: default_segment_min_chars(),
            max_chars: default_segment_max_chars(),
            overlap_chars: default_segment_overlap_chars(),
            max_sentences: default_segment_max_sentences(),
        }
    }
}

impl Default for SubstrateConfig {
    fn default() -> Self {
        Self {
            min_strength: default_min_strength(),
            consolidation_factor: default_consolidation_factor(),
            decay_noise_per_hour: default_decay_noise_per_hour(),
            max_decay_noise: default_max_decay_noise(),
            initial_strength: default_initial_strength(),
        }
    }
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            conflict_min: default_conflict_min(),
            conflict_max: default_conflict_max(),
        }
    }
}

impl Default for AnalogyConfig {
    fn default() -> Self {
        Self {
            min_similarity: default_analogy_min_similarity(),
            exclude_similarity: default_exclude_similarity(),
        }
    }
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            consolidation_interval: default_consolidation_interval(),
            decay_interval: default_decay_interval(),
            consolidation_threshold: default_consolidation_threshold(),
            decay_rate: default_decay_rate(),
            creativity_threshold: default_creativity_threshold(),
            min_novelty: default_min_novelty(),
            min_coherence: default_min_coherence(),
            sample_size: default_sample_size(),
            sample_min_similarity: default_sample_min_similarity(),
            pair_min_similarity: default_pair_min_similarity(),
            pair_max_similarity: default_pair_max_similarity(),
            target_sparsity: default_target_sparsity(),
            persist_generated: true,
            max_concepts_per_cycle: default_max_concepts_per_cycle(),
            dream_pause: default_dream_pause(),
            strengthen_factor: default_strengthen_factor(),
            weaken_factor: default_weaken_factor(),
            weaken_noise: default_weaken_noise(),
            mutation_rate: default_mutation_rate(),
        }
    }
}

impl HolomemConfig {
    /// Check ranges and bands. Called by the memory system on construction.
    pub fn validate(&self) -> HolomemResult<()> {
        fn invalid(message: String) -> HolomemResult<()> {
            Err(HolomemError::InvalidConfig(message))
        }
        fn in_unit(name: &str, value: f64) -> HolomemResult<()> {
            if !(0.0..=1.0).contains(&value) {
                return invalid(format!("{} must be within [0, 1], got {}", name, value));
            }
            Ok(())
        }
        fn similarity(name: &str, value: f64) -> HolomemResult<()> {
            if !(-1.0..=1.0).contains(&value) {
                return invalid(format!("{} must be within [-1, 1], got {}", name, value));
            }
            Ok(())
        }

        if self.dimensions == 0 {
            return invalid("dimensions must be greater than zero".to_string());
        }
        if self.max_memories == 0 {
            return invalid("max_memories must be greater than zero".to_string());
        }
        similarity("similarity_threshold", self.similarity_threshold)?;

        let substrate = &self.substrate;
        if substrate.min_strength < 0.0 {
            return invalid("substrate.min_strength cannot be negative".to_string());
        }
        if substrate.consolidation_factor < 1.0 {
            return invalid(format!(
                "substrate.consolidation_factor must be at least 1.0, got {}",
                substrate.consolidation_factor
            ));
        }
        in_unit("substrate.decay_noise_per_hour", substrate.decay_noise_per_hour)?;
        in_unit("substrate.max_decay_noise", substrate.max_decay_noise)?;
        if substrate.initial_strength <= substrate.min_strength {
            return invalid("substrate.initial_strength must exceed min_strength".to_string());
        }

        similarity("consistency.conflict_min", self.consistency.conflict_min)?;
        similarity("consistency.conflict_max", self.consistency.conflict_max)?;
        if self.consistency.conflict_min >= self.consistency.conflict_max {
            return invalid("consistency band is empty: conflict_min >= conflict_max".to_string());
        }

        similarity("analogy.min_similarity", self.analogy.min_similarity)?;
        similarity("analogy.exclude_similarity", self.analogy.exclude_similarity)?;

        let evolution = &self.evolution;
        if evolution.consolidation_interval.is_zero() || evolution.decay_interval.is_zero() {
            return invalid("evolution intervals must be non-zero".to_string());
        }
        in_unit("evolution.decay_rate", evolution.decay_rate)?;
        in_unit("evolution.creativity_threshold", evolution.creativity_threshold)?;
        in_unit("evolution.min_novelty", evolution.min_novelty)?;
        in_unit("evolution.min_coherence", evolution.min_coherence)?;
        in_unit("evolution.target_sparsity", evolution.target_sparsity)?;
        in_unit("evolution.weaken_factor", evolution.weaken_factor)?;
        in_unit("evolution.weaken_noise", evolution.weaken_noise)?;
        in_unit("evolution.mutation_rate", evolution.mutation_rate)?;
        similarity("evolution.sample_min_similarity", evolution.sample_min_similarity)?;
        similarity("evolution.pair_min_similarity", evolution.pair_min_similarity)?;
        similarity("evolution.pair_max_similarity", evolution.pair_max_similarity)?;
        if evolution.pair_min_similarity >= evolution.pair_max_similarity {
            return invalid("evolution pair band is empty: pair_min >= pair_max".to_string());
        }
        if evolution.strengthen_factor < 1.0 {
            return invalid("evolution.strengthen_factor must be at least 1.0".to_string());
        }

        let segmentation = &self.segmentation;
        if segmentation.max_chars == 0 || segmentation.max_sentences == 0 {
            return invalid("segmentation limits must be greater than zero".to_string());
        }
        if segmentation.min_chars > segmentation.max_chars {
            return invalid("segmentation.min_chars cannot exceed max_chars".to_string());
        }
        if segmentation.overlap_chars >= segmentation.max_chars {
            return invalid("segmentation.overlap_chars must be below max_chars".to_string());
        }

        Ok(())
    }
}

impl Default for HolomemConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: MANIFEST_KIND.to_string(),
            metadata: ManifestMetadata {
                name: "holomem".to_string(),
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: HolomemConfig::default(),
        }
    }
}

impl HolomemConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Candidate config files in precedence order: `HOLOMEM_CONFIG_PATH`,
    /// the working directory, the user's `~/.aegis`, then `/etc/aegis` on Unix.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .into_iter()
            .collect();
        paths.push(PathBuf::from(LOCAL_CONFIG_FILE));
        paths.extend(dirs::home_dir().map(|home| home.join(".aegis").join("holomem.yaml")));
        if cfg!(unix) {
            paths.push(PathBuf::from("/etc/aegis/holomem.yaml"));
        }
        paths
    }

    pub fn discover_config() -> Option<PathBuf> {
        Self::search_paths().into_iter().find(|path| path.is_file())
    }

    /// An explicit path must load; otherwise the first discovered file wins and
    /// defaults apply when none exists. Environment overrides apply last.
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let mut manifest = match cli_path.or_else(Self::discover_config) {
            Some(path) => {
                tracing::info!(path = %path.display(), "Loading holographic memory manifest");
                Self::from_yaml_file(&path)
                    .with_context(|| format!("Failed to load config at {:?}", path))?
            }
            None => {
                tracing::debug!("No holographic memory manifest found, using defaults");
                Self::default()
            }
        };
        manifest.apply_env_overrides();
        Ok(manifest)
    }

    /// `HOLOMEM_DIMENSIONS`, `HOLOMEM_MAX_MEMORIES`, `HOLOMEM_SIMILARITY_THRESHOLD`,
    /// `HOLOMEM_AUTO_EVOLVE` and `HOLOMEM_RNG_SEED`. Unparseable values are
    /// logged and ignored.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let spec = &mut self.spec;
        if let Some(dimensions) =
            parse_override(&lookup, "HOLOMEM_DIMENSIONS", str::parse::<usize>)
        {
            spec.dimensions = dimensions;
        }
        if let Some(max) = parse_override(&lookup, "HOLOMEM_MAX_MEMORIES", str::parse::<usize>)
        {
            spec.max_memories = max;
        }
        if let Some(threshold) =
            parse_override(&lookup, "HOLOMEM_SIMILARITY_THRESHOLD", str::parse::<f64>)
        {
            spec.similarity_threshold = threshold;
        }
        if let Some(auto_evolve) = parse_override(&lookup, "HOLOMEM_AUTO_EVOLVE", parse_switch) {
            spec.auto_evolve = auto_evolve;
        }
        if let Some(seed) = parse_override(&lookup, "HOLOMEM_RNG_SEED", str::parse::<u64>) {
            spec.rng_seed = Some(seed);
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != MANIFEST_KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, MANIFEST_KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        self.spec.validate()?;
        Ok(())
    }
}

fn parse_override<T, E>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    parse: impl Fn(&str) -> Result<T, E>,
) -> Option<T>
where
    T: std::fmt::Debug,
    E: std::fmt::Display,
{
    let raw = lookup(key)?;
    match parse(raw.trim()) {
        Ok(value) => {
            tracing::info!("Environment override: {}={:?}", key, value);
            Some(value)
        }
        Err(e) => {
            tracing::warn!("Ignoring {}='{}': {}", key, raw, e);
            None
        }
    }
}

fn parse_switch(raw: &str) -> Result<bool, String> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err("expected true or false".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_manifest() {
        let manifest = HolomemConfigManifest::default();
        assert_eq!(manifest.api_version, "100monkeys.ai/v1");
        assert_eq!(manifest.kind, "HolographicMemory");
        assert_eq!(manifest.spec.dimensions, 10_000);
        assert_eq!(manifest.spec.max_memories, 10_000);
        assert!(manifest.spec.auto_evolve);
        assert_eq!(
            manifest.spec.evolution.consolidation_interval,
            Duration::from_secs(60)
        );
        assert_eq!(manifest.spec.evolution.decay_interval, Duration::from_secs(300));
    }

    #[test]
    fn test_yaml_roundtrip() {
        let mut manifest = HolomemConfigManifest::default();
        manifest.metadata.name = "test-memory".to_string();
        manifest.metadata.labels = Some(HashMap::from([(
            "environment".to_string(),
            "test".to_string(),
        )]));
        manifest.spec.dimensions = 4_096;
        manifest.spec.rng_seed = Some(7);
        manifest.spec.evolution.dream_pause = Duration::from_millis(25);

        let yaml = serde_yaml::to_string(&manifest).unwrap();
        assert!(yaml.contains("dream_pause: 25ms"));

        let parsed = HolomemConfigManifest::from_yaml_str(&yaml).unwrap();
        assert_eq!(parsed.metadata.name, "test-memory");
        assert_eq!(parsed.spec, manifest.spec);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
apiVersion: 100monkeys.ai/v1
kind: HolographicMemory
metadata:
  name: sparse
spec:
  max_memories: 500
  evolution:
    decay_interval: 10m
"#;
        let manifest = HolomemConfigManifest::from_yaml_str(yaml).unwrap();
        assert_eq!(manifest.spec.max_memories, 500);
        assert_eq!(manifest.spec.dimensions, 10_000);
        assert_eq!(manifest.spec.evolution.decay_interval, Duration::from_secs(600));
        assert_eq!(manifest.spec.evolution.consolidation_threshold, 3);
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("holomem.yaml");
        let manifest = HolomemConfigManifest::default();
        manifest.to_yaml_file(&path).unwrap();

        let loaded = HolomemConfigManifest::load_or_default(Some(path)).unwrap();
        assert_eq!(loaded.kind, MANIFEST_KIND);

        let missing = dir.path().join("missing.yaml");
        assert!(HolomemConfigManifest::load_or_default(Some(missing)).is_err());
    }

    #[test]
    fn test_validation() {
        let mut manifest = HolomemConfigManifest::default();
        assert!(manifest.validate().is_ok());

        manifest.api_version = "wrong/v1".to_string();
        assert!(manifest.validate().is_err());
        manifest.api_version = API_VERSION.to_string();

        manifest.kind = "NodeConfig".to_string();
        assert!(manifest.validate().is_err());
        manifest.kind = MANIFEST_KIND.to_string();

        manifest.spec.dimensions = 0;
        assert!(manifest.validate().is_err());
        manifest.spec.dimensions = 1_000;

        manifest.spec.consistency.conflict_min = 0.9;
        assert!(matches!(
            manifest.spec.validate(),
            Err(HolomemError::InvalidConfig(_))
        ));
        manifest.spec.consistency.conflict_min = 0.35;

        manifest.spec.evolution.decay_rate = 1.5;
        assert!(manifest.validate().is_err());
        manifest.spec.evolution.decay_rate = 0.05;

        manifest.spec.evolution.decay_interval = Duration::ZERO;
        assert!(manifest.validate().is_err());
        manifest.spec.evolution.decay_interval = Duration::from_secs(300);

        manifest.spec.segmentation.overlap_chars = 800;
        assert!(manifest.validate().is_err());
        manifest.spec.segmentation.overlap_chars = 50;
        manifest.spec.segmentation.min_chars = 900;
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let mut manifest = HolomemConfigManifest::default();
        manifest.apply_overrides(|key| match key {
            "HOLOMEM_DIMENSIONS" => Some("2048".to_string()),
            "HOLOMEM_MAX_MEMORIES" => Some("not-a-number".to_string()),
            "HOLOMEM_AUTO_EVOLVE" => Some("off".to_string()),
            "HOLOMEM_SIMILARITY_THRESHOLD" => Some(" 0.35 ".to_string()),
            "HOLOMEM_RNG_SEED" => Some("42".to_string()),
            _ => None,
        });
        assert_eq!(manifest.spec.dimensions, 2_048);
        assert_eq!(manifest.spec.max_memories, 10_000);
        assert!(!manifest.spec.auto_evolve);
        assert_eq!(manifest.spec.similarity_threshold, 0.35);
        assert_eq!(manifest.spec.rng_seed, Some(42));
    }

    #[test]
    fn test_search_paths_end_with_local_and_system_files() {
        let paths = HolomemConfigManifest::search_paths();
        assert!(paths.contains(&PathBuf::from(LOCAL_CONFIG_FILE)));
        if cfg!(unix) {
            assert_eq!(paths.last(), Some(&PathBuf::from("/etc/aegis/holomem.yaml")));
        }
    }
}
