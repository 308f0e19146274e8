//! Command batching and demultiplexing
//!
//! A [`CommandBatch`] merges several independent queries into one shell
//! command so a poll costs a single round trip. Each query's output is
//! preceded by an echoed `____<id>____` line; [`CommandBatch::demux`] cuts the
//! combined response back into a [`SectionMap`].

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{BatchError, BatchResult};

/// Wraps section ids on both sides in the marker line
pub const SECTION_SENTINEL: &str = "____";

/// Matches a section marker line: `____<id>____`
static SECTION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^____(.+?)____$").expect("SECTION_MARKER is a valid regex pattern")
});

/// Returns the marker line announcing section `id`
#[must_use]
pub fn section_marker(id: &str) -> String {
    format!("{SECTION_SENTINEL}{id}{SECTION_SENTINEL}")
}

/// One query inside a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryCommand {
    /// Unique id within the batch, used as the section name
    pub id: String,
    /// Shell command text
    pub text: String,
}

/// A named, ordered set of queries rendered into one combined command
///
/// Batches are stateless and reused across polls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandBatch {
    name: String,
    commands: Vec<QueryCommand>,
}

impl CommandBatch {
    /// Creates an empty batch
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: Vec::new(),
        }
    }

    /// Appends a query, consuming and returning the batch
    ///
    /// # Errors
    ///
    /// See [`CommandBatch::push`].
    pub fn with_command(mut self, id: &str, text: &str) -> BatchResult<Self> {
        self.push(id, text)?;
        Ok(self)
    }

    /// Appends a query.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError`] if `id` is empty, spans lines, contains the
    /// section sentinel, or is already used in this batch.
    pub fn push(&mut self, id: &str, text: &str) -> BatchResult<()> {
        if id.is_empty() || id.contains('\n') || id.contains('\r') {
            return Err(BatchError::InvalidId(id.to_string()));
        }
        if id.contains(SECTION_SENTINEL) || id.starts_with('_') || id.ends_with('_') {
            return Err(BatchError::SentinelInId(id.to_string()));
        }
        if self.commands.iter().any(|c| c.id == id) {
            return Err(BatchError::DuplicateId(id.to_string()));
        }
        self.commands.push(QueryCommand {
            id: id.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    /// Batch name, for log output
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queries in render order
    #[must_use]
    pub fn commands(&self) -> &[QueryCommand] {
        &self.commands
    }

    /// Number of queries
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the batch has no queries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Renders `echo <marker>; <text>` for every query, joined with `; `
    #[must_use]
    pub fn render(&self) -> String {
        self.commands
            .iter()
            .map(|c| format!("echo {}; {}", section_marker(&c.id), c.text))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Splits a combined response into sections. Equivalent to [`demux`].
    #[must_use]
    pub fn demux(&self, output: &str) -> SectionMap {
        let sections = demux(output);
        for command in &self.commands {
            if !sections.contains(&command.id) {
                tracing::debug!(
                    batch = %self.name,
                    section = %command.id,
                    "Section marker missing from response"
                );
            }
        }
        sections
    }
}

/// Splits `output` into sections keyed by the id in each marker line.
///
/// Lines before the first marker are dropped. Every other line is appended
/// with its newline to the current section. A marker seen twice appends to
/// the same section.
#[must_use]
pub fn demux(output: &str) -> SectionMap {
    let mut sections = SectionMap::default();
    let mut current: Option<(String, String)> = None;

    for line in output.lines() {
        if let Some(caps) = SECTION_MARKER.captures(line.trim_end_matches('\r')) {
            if let Some((id, text)) = current.take() {
                sections.append(id, &text);
            }
            current = Some((caps[1].to_string(), String::new()));
            continue;
        }
        if let Some((_, text)) = current.as_mut() {
            text.push_str(line);
            text.push('\n');
        }
    }
    if let Some((id, text)) = current {
        sections.append(id, &text);
    }
    sections
}

/// Raw text of each section recovered from one combined response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionMap {
    sections: HashMap<String, String>,
}

impl SectionMap {
    fn append(&mut self, id: String, text: &str) {
        self.sections.entry(id).or_default().push_str(text);
    }

    /// Returns the section text, or `None` if its marker never appeared
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&str> {
        self.sections.get(id).map(String::as_str)
    }

    /// Returns the section text, or `""` if its marker never appeared
    #[must_use]
    pub fn text(&self, id: &str) -> &str {
        self.get(id).unwrap_or("")
    }

    /// Whether the marker for `id` appeared
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.sections.contains_key(id)
    }

    /// Parses a section, falling back to `T::default()` when it is missing
    pub fn parse_or_default<T, F>(&self, id: &str, parse: F) -> T
    where
        T: Default,
        F: FnOnce(&str) -> T,
    {
        self.get(id).map(parse).unwrap_or_default()
    }

    /// Number of recovered sections
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether no section was recovered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Iterates over `(id, text)` pairs in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sections.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
