//! Snapshot assembly: the instruction payload sent to the assistant.
//!
//! The rendered layout is a compatibility contract with the assistant's
//! `instructions` field and must not change: preamble, blank line, schema
//! dump (when present) followed by a blank line, then one block per file —
//! a `//<absolute path>` marker line followed by the raw content — with
//! blocks separated by a blank line. No reordering, no deduplication:
//! blocks appear exactly as the aggregator produced them.

use std::path::PathBuf;

/// One fully assembled instruction payload. Rebuilt from scratch on every
/// sync cycle; there is no identity beyond "most recent".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub preamble: String,
    pub schema_dump: Option<String>,
    pub file_blocks: Vec<(PathBuf, String)>,
}

impl Snapshot {
    pub fn new(
        preamble: impl Into<String>,
        schema_dump: Option<String>,
        file_blocks: Vec<(PathBuf, String)>,
    ) -> Self {
        Self {
            preamble: preamble.into(),
            schema_dump,
            file_blocks,
        }
    }

    /// Render the payload text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.preamble);
        out.push_str("\n\n");

        if let Some(dump) = &self.schema_dump {
            out.push_str(dump);
            out.push_str("\n\n");
        }

        let blocks: Vec<String> = self
            .file_blocks
            .iter()
            .map(|(path, content)| format!("//{}\n{}", path.display(), content))
            .collect();
        out.push_str(&blocks.join("\n\n"));

        out
    }

    /// Number of file blocks in the payload, for cycle logging.
    pub fn file_count(&self) -> usize {
        self.file_blocks.len()
    }
}
