use std::fmt::Display;
use std::path::{Path, PathBuf};
use tantivy::directory::MmapDirectory;
use tantivy::{Index, IndexWriter};
use tracing::{debug, info, warn};

use super::common::MIN_WRITER_HEAP_SIZE;
use super::schema::LineSchema;
use super::tokenizer::register_line_tokenizer;
use crate::batch::Batch;
use crate::error::IndexError;

/// Write side of the line index.
///
/// Owns the single index writer for the duration of a load. Every applied
/// batch is committed, so it survives a crash of a later batch.
pub struct LineIndexer {
    schema: LineSchema,
    writer: Option<IndexWriter>,
    path: PathBuf,
    committed: u64,
}

impl std::fmt::Debug for LineIndexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineIndexer")
            .field("path", &self.path)
            .field("has_writer", &self.writer.is_some())
            .field("committed", &self.committed)
            .finish()
    }
}

impl LineIndexer {
    /// Initialize an empty index at a fresh location
    pub fn create(path: &Path, heap_size: usize) -> Result<Self, IndexError> {
        std::fs::create_dir_all(path)?;

        let directory = open_directory(path)?;
        if Index::exists(&directory).map_err(|e| corrupt(path, e))? {
            return Err(IndexError::AlreadyExists(path.to_path_buf()));
        }

        info!("Creating new index: {:?}", path);

        let schema = LineSchema::new();
        let index = Index::create(directory, schema.schema.clone(), Default::default())?;
        register_line_tokenizer(&index);

        // Ensure minimum heap size for tantivy 0.24
        let writer = index.writer(heap_size.max(MIN_WRITER_HEAP_SIZE))?;

        Ok(Self {
            schema,
            writer: Some(writer),
            path: path.to_path_buf(),
            committed: 0,
        })
    }

    /// Add every document of the batch and commit them together.
    ///
    /// The batch is drained either way. On failure the uncommitted part is
    /// rolled back, so a batch is never half-visible.
    pub fn apply_batch(&mut self, batch: &mut Batch) -> Result<usize, IndexError> {
        let writer = self.writer.as_mut().ok_or(IndexError::Closed)?;
        let documents = batch.drain();
        if documents.is_empty() {
            return Ok(0);
        }

        let result = documents
            .iter()
            .try_for_each(|document| {
                writer
                    .add_document(self.schema.to_tantivy(document))
                    .map(|_| ())
            })
            .and_then(|_| writer.commit().map(|_| ()));

        if let Err(e) = result {
            warn!("Batch of {} documents failed: {}", documents.len(), e);
            if let Err(rollback_err) = writer.rollback() {
                warn!("Rollback after failed batch also failed: {}", rollback_err);
            }
            return Err(e.into());
        }

        self.committed += documents.len() as u64;
        debug!(
            "Committed batch of {} documents ({} total)",
            documents.len(),
            self.committed
        );

        Ok(documents.len())
    }

    /// Commit outstanding state, wait for merges and release the writer.
    ///
    /// Calling it again after a successful close does nothing.
    pub fn close(&mut self) -> Result<(), IndexError> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };

        writer.commit()?;
        writer.wait_merging_threads()?;
        info!(
            "Closed index writer at {:?} ({} documents)",
            self.path, self.committed
        );
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.writer.is_none()
    }

    /// Documents committed through this handle
    pub fn committed(&self) -> u64 {
        self.committed
    }

}

pub(crate) fn open_directory(path: &Path) -> Result<MmapDirectory, IndexError> {
    MmapDirectory::open(path).map_err(|e| corrupt(path, e))
}

pub(crate) fn corrupt(path: &Path, reason: impl Display) -> IndexError {
    IndexError::Corrupt {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::common::{DEFAULT_WRITER_HEAP_SIZE, LineDocument};
    use tempfile::TempDir;

    fn batch_of(lines: &[&str]) -> Batch {
        let mut batch = Batch::new(lines.len());
        for (i, line) in lines.iter().enumerate() {
            batch.push(LineDocument::new(i as u64, *line));
        }
        batch
    }

    #[test]
    fn test_create_and_apply_batch() {
        let temp_dir = TempDir::new().unwrap();
        let mut indexer =
            LineIndexer::create(&temp_dir.path().join("idx"), DEFAULT_WRITER_HEAP_SIZE).unwrap();

        let mut batch = batch_of(&["to be or not to be", "that is the question"]);
        assert_eq!(indexer.apply_batch(&mut batch).unwrap(), 2);
        assert!(batch.is_empty());
        assert_eq!(indexer.committed(), 2);

        indexer.close().unwrap();
        assert!(indexer.is_closed());
    }

    #[test]
    fn test_create_refuses_existing_index() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("idx");

        let mut indexer = LineIndexer::create(&path, DEFAULT_WRITER_HEAP_SIZE).unwrap();
        indexer.close().unwrap();

        let result = LineIndexer::create(&path, DEFAULT_WRITER_HEAP_SIZE);
        assert!(matches!(result, Err(IndexError::AlreadyExists(_))));
    }

    #[test]
    fn test_close_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let mut indexer =
            LineIndexer::create(&temp_dir.path().join("idx"), DEFAULT_WRITER_HEAP_SIZE).unwrap();

        indexer.close().unwrap();
        indexer.close().unwrap();
    }

    #[test]
    fn test_apply_after_close_fails() {
        let temp_dir = TempDir::new().unwrap();
        let mut indexer =
            LineIndexer::create(&temp_dir.path().join("idx"), DEFAULT_WRITER_HEAP_SIZE).unwrap();
        indexer.close().unwrap();

        let mut batch = batch_of(&["whether tis nobler"]);
        assert!(matches!(
            indexer.apply_batch(&mut batch),
            Err(IndexError::Closed)
        ));
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let mut indexer =
            LineIndexer::create(&temp_dir.path().join("idx"), DEFAULT_WRITER_HEAP_SIZE).unwrap();

        let mut batch = Batch::new(10);
        assert_eq!(indexer.apply_batch(&mut batch).unwrap(), 0);
        assert_eq!(indexer.committed(), 0);
    }
}
