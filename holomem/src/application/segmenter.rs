// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Passage Segmenter - long text into overlapping sentence windows
//!
//! A single text vector holds a few dozen words before unrelated content
//! drowns it out, so long documents are stored as segments:
//!
//! 1. Scene breaks split the text: `***` or `---` rules, runs of blank lines,
//!    `Chapter N` headings and bare numbered sections. Scenes shorter than
//!    `min_chars` merge into the scene that follows.
//! 2. Each scene is cut into sentences. A sentence longer than `max_chars`
//!    is cut again at word boundaries.
//! 3. Sentences are grouped into windows of at most `max_chars` and
//!    `max_sentences`. Trailing sentences of a window, up to
//!    `overlap_chars`, open the next one.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Retrieval granularity for documents longer than a sentence window

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::config::SegmentationConfig;

struct SceneBreak {
    pattern: Regex,
    /// Headings belong to the scene they open; rules and blank runs are dropped
    keeps_marker: bool,
}

static SCENE_BREAKS: Lazy<Vec<SceneBreak>> = Lazy::new(|| {
    [
        (r"\n[ \t]*\*\*\*[ \t]*\n", false),
        (r"\n[ \t]*---+[ \t]*\n", false),
        (r"\n[ \t]*\n(?:[ \t]*\n)+", false),
        (r"(?m)^[ \t]*Chapter \d+\b", true),
        (r"(?m)^[ \t]*\d+\.[ \t]*$", true),
    ]
    .into_iter()
    .filter_map(|(pattern, keeps_marker)| {
        Regex::new(pattern).ok().map(|pattern| SceneBreak {
            pattern,
            keeps_marker,
        })
    })
    .collect()
});

static SENTENCE_END: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[.!?]+["'”’)\]]*\s+|\n[ \t]*\n"#).expect("sentence pattern is a valid regex")
});

static WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\S+").expect("word pattern is a valid regex"));

static QUOTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"["“”]"#).expect("quote pattern is a valid regex"));

static ACTION_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(ran|jumped|fought|grabbed|threw|moved|walked)\b")
        .expect("action pattern is a valid regex")
});

/// Dialogue share (quote marks per character) above which a scene is dialogue
const DIALOGUE_RATIO: f64 = 0.05;
const ACTION_WORDS: usize = 5;
const TRANSITION_CHARS: usize = 500;

/// Coarse scene classification carried as a tag on stored segments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneKind {
    Dialogue,
    Action,
    Transition,
    Description,
}

impl SceneKind {
    pub fn classify(text: &str) -> Self {
        let chars = text.chars().count().max(1);
        let quotes = QUOTE.find_iter(text).count();
        if quotes as f64 / chars as f64 > DIALOGUE_RATIO {
            SceneKind::Dialogue
        } else if ACTION_WORD.find_iter(text).count() > ACTION_WORDS {
            SceneKind::Action
        } else if chars < TRANSITION_CHARS {
            SceneKind::Transition
        } else {
            SceneKind::Description
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SceneKind::Dialogue => "dialogue",
            SceneKind::Action => "action",
            SceneKind::Transition => "transition",
            SceneKind::Description => "description",
        }
    }
}

impl fmt::Display for SceneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stored window of a passage. Offsets are byte offsets into the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub index: usize,
    pub scene: usize,
    pub start: usize,
    pub end: usize,
    pub kind: SceneKind,
    pub sentences: Vec<String>,
}

impl Segment {
    pub fn text(&self) -> String {
        self.sentences.join(" ")
    }
}

#[derive(Debug, Clone, Copy)]
struct Span {
    start: usize,
    end: usize,
}

impl Span {
    fn len(&self) -> usize {
        self.end - self.start
    }

    /// Span narrowed to the non-whitespace content of `text[start..end]`.
    fn trimmed(text: &str, start: usize, end: usize) -> Option<Span> {
        let raw = &text[start..end];
        let content = raw.trim();
        if !content.chars().any(char::is_alphanumeric) {
            return None;
        }
        let start = start + (raw.len() - raw.trim_start().len());
        Some(Span {
            start,
            end: start + content.len(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct TextSegmenter {
    config: SegmentationConfig,
}

impl TextSegmenter {
    pub fn new(config: SegmentationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SegmentationConfig {
        &self.config
    }

    /// Whether `text` is long enough to be stored as more than one segment.
    pub fn needs_segmenting(&self, text: &str) -> bool {
        text.len() > self.config.max_chars
    }

    pub fn segment(&self, text: &str) -> Vec<Segment> {
        let mut segments = Vec::new();
        for (scene, span) in self.scenes(text).into_iter().enumerate() {
            let kind = SceneKind::classify(&text[span.start..span.end]);
            let sentences = self.sentences(text, span);
            for window in self.windows(&sentences) {
                let first = sentences[window.start];
                let last = sentences[window.end - 1];
                segments.push(Segment {
                    index: segments.len(),
                    scene,
                    start: first.start,
                    end: last.end,
                    kind,
                    sentences: sentences[window]
                        .iter()
                        .map(|s| text[s.start..s.end].to_string())
                        .collect(),
                });
            }
        }
        segments
    }

    fn scenes(&self, text: &str) -> Vec<Span> {
        let mut breaks: Vec<(usize, usize)> = SCENE_BREAKS
            .iter()
            .flat_map(|scene_break| {
                scene_break.pattern.find_iter(text).map(move |m| {
                    let resume = if scene_break.keeps_marker {
                        m.start()
                    } else {
                        m.end()
                    };
                    (m.start(), resume)
                })
            })
            .collect();
        breaks.sort_unstable();

        let mut raw = Vec::new();
        let mut cursor = 0;
        for (start, resume) in breaks {
            if start < cursor {
                cursor = cursor.max(resume);
                continue;
            }
            raw.push((cursor, start));
            cursor = resume;
        }
        raw.push((cursor, text.len()));

        let spans: Vec<Span> = raw
            .into_iter()
            .filter_map(|(start, end)| Span::trimmed(text, start, end))
            .collect();

        // Short scenes merge forward; the last scene stands as it is
        let mut scenes = Vec::with_capacity(spans.len());
        let mut pending: Option<Span> = None;
        for span in spans {
            let merged = match pending.take() {
                Some(open) => Span {
                    start: open.start,
                    end: span.end,
                },
                None => span,
            };
            if merged.len() < self.config.min_chars {
                pending = Some(merged);
            } else {
                scenes.push(merged);
            }
        }
        scenes.extend(pending);
        scenes
    }

    fn sentences(&self, text: &str, scene: Span) -> Vec<Span> {
        let body = &text[scene.start..scene.end];
        let mut ends: Vec<usize> = SENTENCE_END
            .find_iter(body)
            .map(|m| scene.start + m.end())
            .collect();
        ends.push(scene.end);

        let mut sentences = Vec::new();
        let mut cursor = scene.start;
        for end in ends {
            if let Some(sentence) = Span::trimmed(text, cursor, end) {
                if sentence.len() > self.config.max_chars {
                    sentences.extend(self.split_words(text, sentence));
                } else {
                    sentences.push(sentence);
                }
            }
            cursor = end;
        }
        sentences
    }

    /// Cut an over-long sentence at word boundaries. A single word longer
    /// than `max_chars` becomes its own piece.
    fn split_words(&self, text: &str, sentence: Span) -> Vec<Span> {
        let mut pieces = Vec::new();
        let mut current: Option<Span> = None;
        for word in WORD.find_iter(&text[sentence.start..sentence.end]) {
            let word = Span {
                start: sentence.start + word.start(),
                end: sentence.start + word.end(),
            };
            current = match current {
                Some(open) if word.end - open.start <= self.config.max_chars => Some(Span {
                    start: open.start,
                    end: word.end,
                }),
                Some(open) => {
                    pieces.push(open);
                    Some(word)
                }
                None => Some(word),
            };
        }
        pieces.extend(current);
        pieces
    }

    fn windows(&self, sentences: &[Span]) -> Vec<std::ops::Range<usize>> {
        let mut windows = Vec::new();
        let mut first = 0;
        while first < sentences.len() {
            let mut end = first + 1;
            while end < sentences.len()
                && end - first < self.config.max_sentences
                && sentences[end].end - sentences[first].start <= self.config.max_chars
            {
                end += 1;
            }
            windows.push(first..end);
            if end == sentences.len() {
                break;
            }

            // Reopen with the trailing sentences that fit the overlap, always advancing
            let mut next = end;
            while next > first + 1
                && sentences[end - 1].end - sentences[next - 1].start <= self.config.overlap_chars
            {
                next -= 1;
            }
            first = next;
        }
        windows
    }
}
