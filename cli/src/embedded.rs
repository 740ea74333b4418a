// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-process memory instance for one CLI invocation.
//!
//! Loads the manifest, builds the memory system with the background scheduler
//! disabled, and ingests input files.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use aegis_holomem::{DocumentRecord, HolographicMemorySystem, HolomemConfigManifest};

pub struct EmbeddedMemory {
    pub system: HolographicMemorySystem,
}

/// Records read from input files and entries created for them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub records: usize,
    pub segments: usize,
}

impl EmbeddedMemory {
    pub fn new(config_path: Option<PathBuf>) -> Result<Self> {
        let manifest = HolomemConfigManifest::load_or_default(config_path)
            .context("Failed to load configuration")?;
        manifest
            .validate()
            .context("Configuration validation failed")?;

        // Runs are one-shot; cycles are driven explicitly by the commands
        let mut config = manifest.spec;
        config.auto_evolve = false;

        let system =
            HolographicMemorySystem::new(config).context("Failed to build memory system")?;
        Ok(Self { system })
    }

    /// Memorize every record found in `files`. Records whose content is
    /// longer than one segment window are also stored segment by segment.
    pub fn ingest(&self, files: &[PathBuf]) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        for file in files {
            let records = load_records(file)?;
            debug!(file = %file.display(), records = records.len(), "Ingesting file");
            for record in &records {
                let long = record
                    .content
                    .as_deref()
                    .is_some_and(|content| self.system.segmenter().needs_segmenting(content));
                let segments = if long {
                    self.system
                        .memorize_passage(record)
                        .map(|passage| passage.segments.len())
                } else {
                    self.system.memorize_document(record).map(|_| 0)
                }
                .with_context(|| format!("Failed to memorize a record from {:?}", file))?;
                report.records += 1;
                report.segments += segments;
            }
        }
        info!(
            records = report.records,
            segments = report.segments,
            files = files.len(),
            "Ingestion complete"
        );
        Ok(report)
    }
}

/// JSON files hold one record or an array of records; any other file is
/// one plain-text document titled by its file stem.
pub fn load_records(path: &Path) -> Result<Vec<DocumentRecord>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        let value: serde_json::Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON in {:?}", path))?;
        let records: Vec<DocumentRecord> = match value {
            serde_json::Value::Array(_) => serde_json::from_value(value),
            other => serde_json::from_value(other).map(|record| vec![record]),
        }
        .with_context(|| format!("{:?} does not contain document records", path))?;
        return Ok(records);
    }

    Ok(vec![DocumentRecord {
        id: Some(path.display().to_string()),
        title: path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(|stem| stem.replace(['_', '-'], " ")),
        content: Some(content),
        doc_type: "text".to_string(),
        ..Default::default()
    }])
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_holomem::SEGMENT_TAG;
    use std::io::Write;

    #[test]
    fn test_plain_text_file_becomes_one_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("river_notes.txt");
        std::fs::write(&path, "the river rose overnight").unwrap();

        let records = load_records(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title.as_deref(), Some("river notes"));
        assert_eq!(records[0].doc_type, "text");
    }

    #[test]
    fn test_json_array_and_single_record() {
        let dir = tempfile::tempdir().unwrap();
        let many = dir.path().join("many.json");
        let mut file = std::fs::File::create(&many).unwrap();
        write!(
            file,
            r#"[{{"id": "a", "title": "Alpha"}}, {{"id": "b", "content": "beta", "type": "note"}}]"#
        )
        .unwrap();
        let records = load_records(&many).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].doc_type, "note");

        let single = dir.path().join("single.json");
        std::fs::write(&single, r#"{"id": "c", "synopsis": "gamma"}"#).unwrap();
        assert_eq!(load_records(&single).unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_json_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "[not json").unwrap();
        assert!(load_records(&path).is_err());
    }

    #[test]
    fn test_ingest_stores_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        std::fs::write(&path, "memories of the sea").unwrap();

        let missing_config = None;
        let memory = EmbeddedMemory::new(missing_config).unwrap();
        let report = memory.ingest(&[path]).unwrap();
        assert_eq!(report, IngestReport { records: 1, segments: 0 });
        assert_eq!(memory.system.len(), 1);
    }

    #[test]
    fn test_long_text_file_is_segmented_and_searchable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keeper_diary.txt");
        let path_id = path.display().to_string();
        let mut text: String = (0..300)
            .map(|i| format!("On day {} the fog rolled over the rocks and stayed. ", i))
            .collect();
        text.push_str("The lighthouse keeper found a letter.");
        std::fs::write(&path, &text).unwrap();

        let memory = EmbeddedMemory::new(None).unwrap();
        let report = memory.ingest(&[path]).unwrap();
        assert_eq!(report.records, 1);
        assert!(report.segments > 10);
        assert_eq!(memory.system.len(), report.segments + 1);

        let hits = memory
            .system
            .query_text("The lighthouse keeper found a letter.", 1)
            .unwrap();
        assert_eq!(hits.len(), 1);
        let metadata = &hits[0].entry.metadata;
        assert!(metadata.has_tag(SEGMENT_TAG));
        assert_eq!(metadata.extensions["segment"]["end"], text.len());
        assert_eq!(metadata.parents[0].as_str(), path_id);
    }
}
