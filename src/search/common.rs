use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Default heap size for index writer (50MB)
pub const DEFAULT_WRITER_HEAP_SIZE: usize = 50_000_000;

/// Minimum heap size for tantivy 0.24 (15MB)
pub const MIN_WRITER_HEAP_SIZE: usize = 15_000_000;

/// Documents per committed batch during load
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Largest edit distance the Levenshtein automata support
pub const MAX_FUZZY_DISTANCE: u8 = 2;

/// Terms longer than this many bytes are not indexed
pub const MAX_TERM_BYTES: usize = 255;

/// One indexed line of the corpus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDocument {
    pub id: String,
    pub line_number: u64,
    pub text: String,
}

impl LineDocument {
    pub fn new(line_number: u64, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: document_id(line_number, &text),
            line_number,
            text,
        }
    }
}

/// Identifier under which a line is indexed and reported
pub fn document_id(line_number: u64, text: &str) -> String {
    format!("line: {line_number}. {text}")
}

/// A term's occurrence in one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub term: String,
    pub document_id: String,
    pub line_number: u64,
    pub frequency: u32,
}

/// How query terms are matched against indexed terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    Exact,
    Fuzzy,
}

/// Per-request search parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOptions {
    pub mode: MatchMode,
    /// 0-based offset into the ranked list
    pub from: usize,
    /// Maximum hits to return (None = all)
    pub size: Option<usize>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            mode: MatchMode::Exact,
            from: 0,
            size: None,
        }
    }
}

impl SearchOptions {
    pub fn new(mode: MatchMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn with_from(mut self, from: usize) -> Self {
        self.from = from;
        self
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// 1-based position in the full ranked list
    pub rank: usize,
    pub document_id: String,
    pub line_number: u64,
    pub score: f32,
}

/// Ranked, paginated outcome of one query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub total_matches: usize,
    /// 1-based rank of the first returned hit
    pub range_start: usize,
    /// 1-based rank of the last returned hit (range_start - 1 when empty)
    pub range_end: usize,
    pub elapsed: Duration,
    pub hits: Vec<SearchHit>,
}

impl SearchResult {
    pub fn empty(from: usize, elapsed: Duration) -> Self {
        Self {
            total_matches: 0,
            range_start: from + 1,
            range_end: from,
            elapsed,
            hits: Vec::new(),
        }
    }

    pub fn summary_line(&self) -> String {
        format!(
            "{} matches, showing {} through {}, took {:?}",
            self.total_matches, self.range_start, self.range_end, self.elapsed
        )
    }

    /// Summary line followed by one line per hit
    pub fn to_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.hits.len() + 1);
        lines.push(self.summary_line());
        for hit in &self.hits {
            lines.push(format!(
                "{:>5}. {} ({:.6})",
                hit.rank, hit.document_id, hit.score
            ));
        }
        lines
    }
}
