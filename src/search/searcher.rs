use std::path::{Path, PathBuf};
use std::time::Instant;
use tantivy::collector::{Count, TopDocs};
use tantivy::postings::Postings;
use tantivy::query::{BooleanQuery, FuzzyTermQuery, Occur, Query, TermQuery};
use tantivy::schema::IndexRecordOption;
use tantivy::{
    DocAddress, DocSet, Index, IndexReader, ReloadPolicy, Score, TERMINATED, TantivyDocument,
    Term,
};
use tracing::{debug, info};

use super::common::{
    LineDocument, MAX_FUZZY_DISTANCE, MatchMode, Posting, SearchHit, SearchOptions, SearchResult,
};
use super::indexer::{corrupt, open_directory};
use super::schema::{LINE_NUMBER_FIELD, LineSchema};
use super::tokenizer::{register_line_tokenizer, tokenize};
use crate::error::IndexError;

/// Read side of the line index: term lookup, document store and ranked search.
///
/// Holds one reader for the lifetime of the handle. Safe to share between
/// threads; nothing here mutates the index.
pub struct LineSearcher {
    schema: LineSchema,
    reader: IndexReader,
    path: PathBuf,
    fuzzy_distance: u8,
}

impl std::fmt::Debug for LineSearcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineSearcher")
            .field("path", &self.path)
            .field("fuzzy_distance", &self.fuzzy_distance)
            .finish()
    }
}

impl LineSearcher {
    /// Open an existing index.
    ///
    /// Fails with [`IndexError::Missing`] when nothing has been indexed at
    /// `path`, and with [`IndexError::Corrupt`] when something is there but
    /// cannot be read as a line index.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, IndexError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(IndexError::Missing(path.to_path_buf()));
        }
        if !path.is_dir() {
            return Err(corrupt(path, "not a directory"));
        }

        let directory = open_directory(path)?;
        if !Index::exists(&directory).map_err(|e| corrupt(path, e))? {
            return Err(IndexError::Missing(path.to_path_buf()));
        }

        let index = Index::open(directory).map_err(|e| corrupt(path, e))?;
        let schema = LineSchema::from_schema(index.schema()).map_err(|e| corrupt(path, e))?;
        register_line_tokenizer(&index);

        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e: tantivy::TantivyError| corrupt(path, e))?;

        let searcher = Self {
            schema,
            reader,
            path: path.to_path_buf(),
            fuzzy_distance: 1,
        };
        info!(
            "Opened index at {:?} with {} documents",
            path,
            searcher.num_documents()
        );
        Ok(searcher)
    }

    /// Set the edit distance used in fuzzy mode (clamped to what the
    /// Levenshtein automata support)
    pub fn with_fuzzy_distance(mut self, distance: u8) -> Self {
        self.fuzzy_distance = distance.min(MAX_FUZZY_DISTANCE);
        self
    }

    pub fn num_documents(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    /// Posting list of a normalized term, in line order.
    ///
    /// An absent term yields an empty list.
    pub fn lookup(&self, term: &str) -> Result<Vec<Posting>, IndexError> {
        let searcher = self.reader.searcher();
        let index_term = Term::from_field_text(self.schema.terms, term);
        let mut postings = Vec::new();

        for (segment_ord, segment_reader) in searcher.segment_readers().iter().enumerate() {
            let inverted_index = segment_reader.inverted_index(self.schema.terms)?;
            let Some(mut segment_postings) =
                inverted_index.read_postings(&index_term, IndexRecordOption::WithFreqs)?
            else {
                continue;
            };

            let mut doc = segment_postings.doc();
            while doc != TERMINATED {
                if !segment_reader.is_deleted(doc) {
                    let stored: TantivyDocument =
                        searcher.doc(DocAddress::new(segment_ord as u32, doc))?;
                    let document = self.schema.to_line_document(&stored)?;
                    postings.push(Posting {
                        term: term.to_string(),
                        document_id: document.id,
                        line_number: document.line_number,
                        frequency: segment_postings.term_freq(),
                    });
                }
                doc = segment_postings.advance();
            }
        }

        postings.sort_by_key(|posting| posting.line_number);
        Ok(postings)
    }

    /// Fetch a document by its identifier
    pub fn document(&self, id: &str) -> Result<Option<LineDocument>, IndexError> {
        let term = Term::from_field_text(self.schema.id, id);
        self.first_match(&TermQuery::new(term, IndexRecordOption::Basic))
    }

    /// Fetch a document by its source line number
    pub fn document_by_line(&self, line_number: u64) -> Result<Option<LineDocument>, IndexError> {
        let term = Term::from_field_u64(self.schema.line_number, line_number);
        self.first_match(&TermQuery::new(term, IndexRecordOption::Basic))
    }

    fn first_match(&self, query: &dyn Query) -> Result<Option<LineDocument>, IndexError> {
        let searcher = self.reader.searcher();
        let top_docs = searcher.search(query, &TopDocs::with_limit(1))?;

        match top_docs.into_iter().next() {
            Some((_score, doc_address)) => {
                let doc: TantivyDocument = searcher.doc(doc_address)?;
                Ok(Some(self.schema.to_line_document(&doc)?))
            }
            None => Ok(None),
        }
    }

    /// Rank every document matching any query term and return one window of it
    pub fn search(&self, query: &str, options: &SearchOptions) -> Result<SearchResult, IndexError> {
        let started = Instant::now();

        let mut terms = tokenize(query);
        terms.sort();
        terms.dedup();
        if terms.is_empty() {
            debug!("Query {:?} has no searchable terms", query);
            return Ok(SearchResult::empty(0, started.elapsed()));
        }

        let query = self.build_query(&terms, options.mode);
        let searcher = self.reader.searcher();

        let total = searcher.search(&query, &Count)?;
        if total == 0 {
            return Ok(SearchResult::empty(0, started.elapsed()));
        }

        let top_docs: Vec<(Score, DocAddress)> =
            searcher.search(&query, &TopDocs::with_limit(total))?;

        // Line numbers for tie-breaking, one column per segment
        let line_columns = searcher
            .segment_readers()
            .iter()
            .map(|segment_reader| segment_reader.fast_fields().u64(LINE_NUMBER_FIELD))
            .collect::<Result<Vec<_>, _>>()?;

        let mut ranked: Vec<(Score, u64, DocAddress)> = top_docs
            .into_iter()
            .map(|(score, address)| {
                let line_number = line_columns[address.segment_ord as usize]
                    .first(address.doc_id)
                    .unwrap_or(u64::MAX);
                (score, line_number, address)
            })
            .collect();
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));

        let from = options.from.min(ranked.len());
        let end = match options.size {
            Some(size) => from.saturating_add(size).min(ranked.len()),
            None => ranked.len(),
        };

        let mut hits = Vec::with_capacity(end - from);
        for (offset, (score, line_number, address)) in ranked[from..end].iter().enumerate() {
            let doc: TantivyDocument = searcher.doc(*address)?;
            let document = self.schema.to_line_document(&doc)?;
            hits.push(SearchHit {
                rank: from + offset + 1,
                document_id: document.id,
                line_number: *line_number,
                score: *score,
            });
        }

        let elapsed = started.elapsed();
        debug!(
            "Query {:?} ({:?}) matched {} documents in {:?}",
            terms, options.mode, total, elapsed
        );

        Ok(SearchResult {
            total_matches: total,
            range_start: from + 1,
            range_end: from + hits.len(),
            elapsed,
            hits,
        })
    }

    /// Union of one scored clause per term, plus a fuzzy clause in fuzzy mode
    fn build_query(&self, terms: &[String], mode: MatchMode) -> BooleanQuery {
        let fuzzy = mode == MatchMode::Fuzzy && self.fuzzy_distance > 0;
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();

        for text in terms {
            let term = Term::from_field_text(self.schema.terms, text);
            clauses.push((
                Occur::Should,
                Box::new(TermQuery::new(term.clone(), IndexRecordOption::WithFreqs)),
            ));
            if fuzzy {
                clauses.push((
                    Occur::Should,
                    Box::new(FuzzyTermQuery::new(term, self.fuzzy_distance, true)),
                ));
            }
        }

        BooleanQuery::new(clauses)
    }
}
