//! The page document envelope and its codec.
//!
//! Pages are stored as JSON files: textual content plus a small metadata
//! block. The schema is fixed - explicit fields, not an untyped map - so a
//! document either round-trips losslessly through the codec or decoding
//! fails outright; there is no partially-populated in-between.

use serde::{Deserialize, Serialize};

use crate::store::error::{StoreError, StoreResult};

/// metadata block stored alongside page content
///
/// opaque to the store layer: nothing here is interpreted, only carried
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// the structured envelope stored for a single page
///
/// `content` is mandatory; a file without a metadata block decodes with
/// default metadata, keeping plain `{"content": ...}` files readable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    #[serde(default)]
    pub meta: DocumentMeta,
}

impl Document {
    /// create a document with content and empty metadata
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            meta: DocumentMeta::default(),
        }
    }

    /// set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.meta.title = Some(title.into());
        self
    }

    /// set the tags
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.meta.tags = tags;
        self
    }
}

/// serialize a document to JSON bytes
///
/// deterministic for a given document; a failure here is an
/// encoder-internal fault, not expected in normal operation
pub fn encode_document(document: &Document) -> StoreResult<Vec<u8>> {
    serde_json::to_vec_pretty(document).map_err(StoreError::Encode)
}

/// deserialize a document from JSON bytes
///
/// fails with `Decode` on anything that is not a well-formed encoded
/// document; never returns a partial result
pub fn decode_document(bytes: &[u8]) -> StoreResult<Document> {
    serde_json::from_slice(bytes).map_err(StoreError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let doc = Document::new("# Welcome\n\nHello world")
            .with_title("Welcome")
            .with_tags(vec!["intro".into(), "help".into()]);

        let bytes = encode_document(&doc).unwrap();
        let restored = decode_document(&bytes).unwrap();

        assert_eq!(doc, restored);
    }

    #[test]
    fn test_roundtrip_without_metadata() {
        let doc = Document::new("plain");
        let bytes = encode_document(&doc).unwrap();
        assert_eq!(decode_document(&bytes).unwrap(), doc);
    }

    #[test]
    fn test_decode_bare_content() {
        // files written before metadata existed only carry content
        let doc = decode_document(br#"{"content": "old page"}"#).unwrap();
        assert_eq!(doc.content, "old page");
        assert_eq!(doc.meta, DocumentMeta::default());
    }

    #[test]
    fn test_decode_malformed_fails() {
        assert!(matches!(
            decode_document(b"not json at all"),
            Err(StoreError::Decode(_))
        ));
        assert!(matches!(
            decode_document(br#"{"content": 42}"#),
            Err(StoreError::Decode(_))
        ));
        // content is mandatory
        assert!(matches!(
            decode_document(br#"{"meta": {}}"#),
            Err(StoreError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_truncated_fails() {
        let bytes = encode_document(&Document::new("hello")).unwrap();
        let truncated = &bytes[..bytes.len() / 2];
        assert!(matches!(
            decode_document(truncated),
            Err(StoreError::Decode(_))
        ));
    }

    #[test]
    fn test_encoding_is_stable() {
        let doc = Document::new("same").with_title("Same");
        assert_eq!(encode_document(&doc).unwrap(), encode_document(&doc).unwrap());
    }
}
