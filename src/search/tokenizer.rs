use tantivy::Index;
use tantivy::tokenizer::{RemoveLongFilter, TextAnalyzer, WhitespaceTokenizer};
use tracing::debug;

use super::common::MAX_TERM_BYTES;

/// Tokenizer name for the pre-normalized terms field
pub const LINE_TOKENIZER_NAME: &str = "line_terms";

/// Split a line into normalized search terms.
///
/// Whitespace and punctuation both separate words, so `marry--to` yields two
/// terms. Apostrophes are dropped without splitting (`don't` becomes `dont`).
/// Terms are lowercased; empty ones and those longer than [`MAX_TERM_BYTES`]
/// are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && !is_apostrophe(c))
        .map(|word| {
            word.chars()
                .filter(|c| !is_apostrophe(*c))
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|term| !term.is_empty() && term.len() <= MAX_TERM_BYTES)
        .collect()
}

fn is_apostrophe(c: char) -> bool {
    matches!(c, '\'' | '\u{2019}')
}

/// Text fed to the index for a line: its terms joined by single spaces
pub fn normalized_text(text: &str) -> String {
    tokenize(text).join(" ")
}

/// Register the analyzer used by the terms field.
///
/// Input is already normalized by [`tokenize`], so the analyzer only splits
/// on whitespace. This keeps indexed terms identical to query terms.
pub fn register_line_tokenizer(index: &Index) {
    debug!("Registering {} tokenizer", LINE_TOKENIZER_NAME);

    let analyzer = TextAnalyzer::builder(WhitespaceTokenizer::default())
        .filter(RemoveLongFilter::limit(MAX_TERM_BYTES + 1))
        .build();

    index.tokenizers().register(LINE_TOKENIZER_NAME, analyzer);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_basic() {
        assert_eq!(
            tokenize("To be, or not to be: that is the question."),
            vec!["to", "be", "or", "not", "to", "be", "that", "is", "the", "question"]
        );
    }

    #[test]
    fn test_tokenize_drops_apostrophes() {
        assert_eq!(tokenize("'Tis nobler; don't"), vec!["tis", "nobler", "dont"]);
        assert_eq!(tokenize("o\u{2019}er"), vec!["oer"]);
    }

    #[test]
    fn test_punctuation_separates_words() {
        assert_eq!(tokenize("marry--to be"), vec!["marry", "to", "be"]);
        assert_eq!(
            tokenize("HAMLET.--To be, or not to-morrow"),
            vec!["hamlet", "to", "be", "or", "not", "to", "morrow"]
        );
        assert_eq!(tokenize("Ay,marry"), vec!["ay", "marry"]);
    }

    #[test]
    fn test_blank_and_punctuation_lines() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \t ").is_empty());
        assert!(tokenize("-- ... !!").is_empty());
    }

    #[test]
    fn test_tokenize_is_deterministic() {
        let line = "HAMLET. Whether 'tis NOBLER in the mind";
        assert_eq!(tokenize(line), tokenize(line));
        assert_eq!(normalized_text(line), "hamlet whether tis nobler in the mind");
    }

    #[test]
    fn test_long_terms_dropped() {
        let long = "a".repeat(MAX_TERM_BYTES + 1);
        let line = format!("short {long}");
        assert_eq!(tokenize(&line), vec!["short"]);
    }

    #[test]
    fn test_unicode_lowercase() {
        assert_eq!(tokenize("ÉTUDE Straße"), vec!["étude", "straße"]);
    }
}
