// Module declarations
pub mod common;
pub mod indexer;
pub mod schema;
pub mod search_manager;
pub mod searcher;
pub mod tokenizer;

// Re-export public APIs
pub use common::{LineDocument, MatchMode, Posting, SearchHit, SearchOptions, SearchResult};
pub use indexer::LineIndexer;
pub use search_manager::QueryEngine;
pub use searcher::LineSearcher;
pub use tokenizer::tokenize;
