//! Rich text values stored in `String` and `MultiString` fields.
//!
//! A `TsString` is plain text split into runs, each tagged with the writing
//! system it is written in. Character formatting beyond that belongs to
//! the rendering layer.

use crate::Ws;
use std::fmt;

/// One run of a rich string: the text up to byte offset `lim`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRun {
    /// End byte offset (exclusive) of this run.
    pub lim: usize,
    /// Writing system of the run.
    pub ws: Ws,
}

/// Text with per-run writing systems.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TsString {
    text: String,
    runs: Vec<TextRun>,
}

impl TsString {
    /// Build a single-run string.
    pub fn new(text: impl Into<String>, ws: Ws) -> Self {
        let text = text.into();
        let runs = vec![TextRun { lim: text.len(), ws }];
        Self { text, runs }
    }

    /// Build an empty string with no runs.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Append a run. Adjacent runs in the same writing system merge.
    pub fn push_run(&mut self, text: &str, ws: Ws) {
        if text.is_empty() {
            return;
        }
        self.text.push_str(text);
        let lim = self.text.len();
        match self.runs.last_mut() {
            Some(last) if last.ws == ws => last.lim = lim,
            _ => self.runs.push(TextRun { lim, ws }),
        }
    }

    /// Builder form of `push_run`.
    pub fn with_run(mut self, text: &str, ws: Ws) -> Self {
        self.push_run(text, ws);
        self
    }

    /// The plain text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length of the text in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Number of runs.
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// All runs.
    pub fn runs(&self) -> &[TextRun] {
        &self.runs
    }

    /// Text of the run at `index`.
    pub fn run_text(&self, index: usize) -> Option<&str> {
        let run = self.runs.get(index)?;
        let min = if index == 0 { 0 } else { self.runs[index - 1].lim };
        self.text.get(min..run.lim)
    }

    /// Writing system of the run at `index`.
    pub fn run_ws(&self, index: usize) -> Option<Ws> {
        self.runs.get(index).map(|r| r.ws)
    }

    /// Writing system at byte offset `ich`.
    pub fn ws_at(&self, ich: usize) -> Option<Ws> {
        self.runs.iter().find(|r| ich < r.lim).map(|r| r.ws)
    }
}

impl fmt::Display for TsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
