//! Fuzzy and exact search over a line-delimited corpus.
//!
//! The corpus is loaded once into a persisted tantivy index ([`loader`]),
//! then served read-only over HTTP ([`server`]) by a [`search::QueryEngine`].

pub mod batch;
pub mod config;
pub mod error;
pub mod loader;
pub mod search;
pub mod server;
