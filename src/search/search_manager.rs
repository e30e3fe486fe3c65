use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

use super::common::{SearchOptions, SearchResult};
use super::searcher::LineSearcher;
use crate::config::Config;
use crate::error::QueryError;

/// Serves queries against the persisted index.
///
/// The index is opened on first use and shared read-only afterwards. A
/// failed open is reported as [`QueryError::IndexUnavailable`] and retried
/// on the next request, so a server started before the index exists
/// recovers once it appears.
pub struct QueryEngine {
    index_path: PathBuf,
    fuzzy_distance: u8,
    page_size: Option<usize>,
    searcher: RwLock<Option<Arc<LineSearcher>>>,
}

impl std::fmt::Debug for QueryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEngine")
            .field("index_path", &self.index_path)
            .field("fuzzy_distance", &self.fuzzy_distance)
            .field("page_size", &self.page_size)
            .finish()
    }
}

impl QueryEngine {
    pub fn new(config: &Config) -> Self {
        Self {
            index_path: config.index_path.clone(),
            fuzzy_distance: config.fuzzy_distance,
            page_size: config.page_size,
            searcher: RwLock::new(None),
        }
    }

    /// Run a query. Requests without an explicit size get the configured page size.
    pub fn search(&self, query: &str, options: &SearchOptions) -> Result<SearchResult, QueryError> {
        let searcher = self.searcher()?;

        let mut options = options.clone();
        if options.size.is_none() {
            options.size = self.page_size;
        }

        let result = searcher.search(query, &options).map_err(|e| {
            warn!("Search for {:?} failed: {}", query, e);
            QueryError::SearchFailed(e)
        })?;

        debug!(
            "Search {:?} returned {} of {} matches",
            query,
            result.hits.len(),
            result.total_matches
        );
        Ok(result)
    }

    /// Whether the index has been opened successfully
    pub fn is_ready(&self) -> bool {
        self.searcher
            .read()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    /// Shared searcher, opening the index if this is the first successful use
    pub fn searcher(&self) -> Result<Arc<LineSearcher>, QueryError> {
        if let Ok(guard) = self.searcher.read() {
            if let Some(searcher) = guard.as_ref() {
                return Ok(Arc::clone(searcher));
            }
        }

        let mut guard = self
            .searcher
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(searcher) = guard.as_ref() {
            return Ok(Arc::clone(searcher));
        }

        let searcher = LineSearcher::open(&self.index_path)
            .map_err(|e| {
                warn!("Index at {:?} is unavailable: {}", self.index_path, e);
                QueryError::IndexUnavailable(e)
            })?
            .with_fuzzy_distance(self.fuzzy_distance);

        info!("Query engine ready on {:?}", self.index_path);
        let searcher = Arc::new(searcher);
        *guard = Some(Arc::clone(&searcher));
        Ok(searcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::LineLoader;
    use crate::search::common::MatchMode;
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir) -> Config {
        Config {
            index_path: temp_dir.path().join("idx"),
            corpus_path: temp_dir.path().join("corpus.txt"),
            ..Default::default()
        }
    }

    #[test]
    fn test_unavailable_before_load() {
        let temp_dir = TempDir::new().unwrap();
        let engine = QueryEngine::new(&test_config(&temp_dir));

        let result = engine.search("be", &SearchOptions::default());
        assert!(matches!(result, Err(QueryError::IndexUnavailable(_))));
        assert!(!engine.is_ready());
    }

    #[test]
    fn test_recovers_once_index_exists() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        let engine = QueryEngine::new(&config);
        assert!(engine.search("be", &SearchOptions::default()).is_err());

        std::fs::write(&config.corpus_path, "to be or not to be\n").unwrap();
        LineLoader::new(&config).load(&config.corpus_path).unwrap();

        let result = engine.search("be", &SearchOptions::default()).unwrap();
        assert_eq!(result.total_matches, 1);
        assert!(engine.is_ready());
    }

    #[test]
    fn test_zero_matches_is_not_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        std::fs::write(&config.corpus_path, "to be or not to be\n").unwrap();
        LineLoader::new(&config).load(&config.corpus_path).unwrap();

        let engine = QueryEngine::new(&config);
        let result = engine
            .search("elsinore", &SearchOptions::new(MatchMode::Exact))
            .unwrap();
        assert_eq!(result.total_matches, 0);
        assert!(result.hits.is_empty());
    }

    #[test]
    fn test_page_size_applies_without_explicit_size() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            page_size: Some(2),
            ..test_config(&temp_dir)
        };
        std::fs::write(&config.corpus_path, "word a\nword b\nword c\nword d\n").unwrap();
        LineLoader::new(&config).load(&config.corpus_path).unwrap();

        let engine = QueryEngine::new(&config);
        let result = engine
            .search("word", &SearchOptions::new(MatchMode::Exact))
            .unwrap();
        assert_eq!(result.total_matches, 4);
        assert_eq!(result.hits.len(), 2);

        let result = engine
            .search("word", &SearchOptions::new(MatchMode::Exact).with_size(3))
            .unwrap();
        assert_eq!(result.hits.len(), 3);
    }
}
