//! # Document Snapshot
//!
//! Read-only view of the host buffer for one pass: the full text plus the
//! byte span of every line.

use crate::EditorError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Byte range `[start, end)` in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub start: usize,
    pub end: usize,
}

impl Region {
    /// Build a region; the endpoints may come in either order
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Equal regions always intersect; otherwise they must share an offset,
    /// so an empty region only intersects itself.
    pub fn intersects(&self, other: &Region) -> bool {
        self == other || self.start.max(other.start) < self.end.min(other.end)
    }
}

/// Text and line spans of the host buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    text: String,
    lines: Vec<Region>,
}

impl Document {
    /// Split `text` into lines on `\n`; a trailing `\r` is not part of the line
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut lines = Vec::new();
        let mut start = 0;

        for line in text.split('\n') {
            let end = start + line.len();
            let content_end = if line.ends_with('\r') { end - 1 } else { end };
            lines.push(Region::new(start, content_end));
            start = end + 1;
        }

        Self { text, lines }
    }

    /// Use line spans reported by the host instead of computing them.
    /// Spans that fall outside the text or off a char boundary are dropped.
    pub fn with_lines(text: impl Into<String>, lines: Vec<Region>) -> Self {
        let text = text.into();
        let lines = lines
            .into_iter()
            .filter(|region| text.get(region.start..region.end).is_some())
            .collect();
        Self { text, lines }
    }

    pub fn load(path: &Path) -> Result<Self, EditorError> {
        Ok(Self::new(std::fs::read_to_string(path)?))
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn lines(&self) -> &[Region] {
        &self.lines
    }

    /// Text covered by `region`, or `""` when it does not fit the document
    pub fn slice(&self, region: Region) -> &str {
        self.text.get(region.start..region.end).unwrap_or_default()
    }

    /// Lines in document order with their text
    pub fn iter_lines(&self) -> impl Iterator<Item = (Region, &str)> + '_ {
        self.lines.iter().map(move |region| (*region, self.slice(*region)))
    }
}
