use tantivy::TantivyDocument;
use tantivy::schema::{
    FAST, Field, INDEXED, IndexRecordOption, STORED, STRING, Schema, TextFieldIndexing,
    TextOptions, Value,
};

use super::common::LineDocument;
use super::tokenizer::{LINE_TOKENIZER_NAME, normalized_text};
use crate::error::IndexError;

pub const ID_FIELD: &str = "id";
pub const LINE_NUMBER_FIELD: &str = "line_number";
pub const TEXT_FIELD: &str = "text";
pub const TERMS_FIELD: &str = "terms";

/// Line index schema definition
#[derive(Clone, Debug)]
pub struct LineSchema {
    pub schema: Schema,
    pub id: Field,
    pub line_number: Field,
    pub text: Field,
    pub terms: Field,
}

impl LineSchema {
    /// Create a new line schema
    pub fn new() -> Self {
        let mut builder = Schema::builder();

        // Document identifier (exact lookup, stored for hydration)
        let id = builder.add_text_field(ID_FIELD, STRING | STORED);

        // Source line number (fast field for tie-breaking)
        let line_number = builder.add_u64_field(LINE_NUMBER_FIELD, INDEXED | STORED | FAST);

        // Original line, stored verbatim but not indexed
        let text = builder.add_text_field(TEXT_FIELD, STORED);

        // Normalized terms with frequencies and positions
        let terms_indexing = TextFieldIndexing::default()
            .set_tokenizer(LINE_TOKENIZER_NAME)
            .set_index_option(IndexRecordOption::WithFreqsAndPositions);
        let terms = builder.add_text_field(
            TERMS_FIELD,
            TextOptions::default().set_indexing_options(terms_indexing),
        );

        let schema = builder.build();

        Self {
            schema,
            id,
            line_number,
            text,
            terms,
        }
    }

    /// Resolve field handles from the schema of an opened index
    pub fn from_schema(schema: Schema) -> Result<Self, IndexError> {
        let field = |name: &'static str| {
            schema
                .get_field(name)
                .map_err(|_| IndexError::Schema(name))
        };

        Ok(Self {
            id: field(ID_FIELD)?,
            line_number: field(LINE_NUMBER_FIELD)?,
            text: field(TEXT_FIELD)?,
            terms: field(TERMS_FIELD)?,
            schema,
        })
    }

    /// Build the tantivy document for a line
    pub fn to_tantivy(&self, document: &LineDocument) -> TantivyDocument {
        let mut doc = TantivyDocument::new();
        doc.add_text(self.id, &document.id);
        doc.add_u64(self.line_number, document.line_number);
        doc.add_text(self.text, &document.text);
        doc.add_text(self.terms, normalized_text(&document.text));
        doc
    }

    /// Hydrate a stored document back into a line
    pub fn to_line_document(&self, doc: &TantivyDocument) -> Result<LineDocument, IndexError> {
        let id = doc
            .get_first(self.id)
            .and_then(|v| v.as_str())
            .ok_or(IndexError::Schema(ID_FIELD))?;
        let line_number = doc
            .get_first(self.line_number)
            .and_then(|v| v.as_u64())
            .ok_or(IndexError::Schema(LINE_NUMBER_FIELD))?;
        let text = doc
            .get_first(self.text)
            .and_then(|v| v.as_str())
            .ok_or(IndexError::Schema(TEXT_FIELD))?;

        Ok(LineDocument {
            id: id.to_string(),
            line_number,
            text: text.to_string(),
        })
    }
}

impl Default for LineSchema {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_creation() {
        let schema = LineSchema::new();

        assert!(schema.schema.get_field(ID_FIELD).is_ok());
        assert!(schema.schema.get_field(LINE_NUMBER_FIELD).is_ok());
        assert!(schema.schema.get_field(TEXT_FIELD).is_ok());
        assert!(schema.schema.get_field(TERMS_FIELD).is_ok());
    }

    #[test]
    fn test_from_schema_round_trip() {
        let schema = LineSchema::new();
        let resolved = LineSchema::from_schema(schema.schema.clone()).unwrap();
        assert_eq!(resolved.terms, schema.terms);
        assert_eq!(resolved.id, schema.id);
    }

    #[test]
    fn test_from_schema_rejects_foreign_schema() {
        let mut builder = Schema::builder();
        builder.add_text_field("title", STRING | STORED);
        let result = LineSchema::from_schema(builder.build());
        assert!(matches!(result, Err(IndexError::Schema(ID_FIELD))));
    }

    #[test]
    fn test_document_hydration() {
        let schema = LineSchema::new();
        let line = LineDocument::new(3, "Whether 'tis nobler");
        let doc = schema.to_tantivy(&line);

        assert_eq!(schema.to_line_document(&doc).unwrap(), line);
    }
}
