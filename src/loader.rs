use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::batch::{Batch, LoadReport};
use crate::config::Config;
use crate::error::{IndexError, LoadError};
use crate::search::common::LineDocument;
use crate::search::indexer::LineIndexer;
use crate::search::searcher::LineSearcher;

/// Builds the persisted index from a line-delimited corpus.
///
/// A load is skipped when a readable index already exists at the target
/// location; rebuilding after a corpus change means deleting the index
/// directory first.
#[derive(Debug, Clone)]
pub struct LineLoader {
    index_path: PathBuf,
    batch_size: usize,
    writer_heap_size: usize,
}

impl LineLoader {
    pub fn new(config: &Config) -> Self {
        Self {
            index_path: config.index_path.clone(),
            batch_size: config.batch_size,
            writer_heap_size: config.writer_heap_size,
        }
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// Index every line of `source`, one document per line, 0-based line numbers
    pub fn load(&self, source: &Path) -> Result<LoadReport, LoadError> {
        info!("Loading corpus {:?} into {:?}", source, self.index_path);

        let file = File::open(source).map_err(|e| LoadError::SourceUnavailable {
            path: source.to_path_buf(),
            source: e,
        })?;

        match LineSearcher::open(&self.index_path) {
            Ok(existing) => {
                info!(
                    "Index already exists with {} documents, skipping load",
                    existing.num_documents()
                );
                return Ok(LoadReport::skipped());
            }
            Err(e) if e.is_missing() => {
                debug!("No index at {:?}, building one", self.index_path);
            }
            Err(e) => {
                warn!("Existing index cannot be opened: {}", e);
                return Err(LoadError::IndexUnreadable(e));
            }
        }

        let started = Instant::now();
        let mut indexer = LineIndexer::create(&self.index_path, self.writer_heap_size)
            .map_err(LoadError::IndexWriteFailed)?;

        let mut reader = BufReader::new(file);
        let mut batch = Batch::new(self.batch_size);
        let mut buf = Vec::new();
        let mut line_number: u64 = 0;
        let mut batches_flushed = 0;

        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .map_err(|e| LoadError::SourceUnavailable {
                    path: source.to_path_buf(),
                    source: e,
                })?;
            if read == 0 {
                break;
            }

            batch.push(LineDocument::new(line_number, decode_line(&buf)));
            line_number += 1;

            if batch.is_full() {
                flush(&mut indexer, &mut batch)?;
                batches_flushed += 1;
            }
        }

        if !batch.is_empty() {
            flush(&mut indexer, &mut batch)?;
            batches_flushed += 1;
        }

        indexer.close().map_err(LoadError::IndexWriteFailed)?;

        let report = LoadReport {
            skipped: false,
            lines_indexed: line_number,
            batches_flushed,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            "Indexed {} lines in {} batches ({}ms)",
            report.lines_indexed, report.batches_flushed, report.duration_ms
        );
        Ok(report)
    }
}

fn flush(indexer: &mut LineIndexer, batch: &mut Batch) -> Result<(), LoadError> {
    let pending = batch.len();
    let elapsed = batch.elapsed();
    indexer.apply_batch(batch).map_err(|e: IndexError| {
        warn!("Flushing {} documents failed: {}", pending, e);
        LoadError::IndexWriteFailed(e)
    })?;
    debug!(
        "Flushed {} documents (batch open for {:?})",
        pending, elapsed
    );
    Ok(())
}

/// Strip the line terminator (`\n` or `\r\n`) and decode, replacing invalid UTF-8
fn decode_line(raw: &[u8]) -> String {
    let mut line = raw;
    if let Some(stripped) = line.strip_suffix(b"\n") {
        line = stripped;
    }
    if let Some(stripped) = line.strip_suffix(b"\r") {
        line = stripped;
    }
    String::from_utf8_lossy(line).into_owned()
}
