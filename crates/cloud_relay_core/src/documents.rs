use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const JSON_CONTENT_TYPE: &str = "application/json";
/// Object metadata naming the bucket a processed upload should land in.
pub const DESTINATION_BUCKET_METADATA: &str = "destination-bucket";

pub type DocumentDecodeError = base64::DecodeError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    pub bucket: String,
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: String,
    pub metadata: BTreeMap<String, String>,
}

impl DocumentUpload {
    pub fn from_base64(
        bucket: &str,
        key: &str,
        encoded: &str,
        content_type: Option<&str>,
        destination_bucket: Option<&str>,
    ) -> Result<Self, DocumentDecodeError> {
        let body = STANDARD.decode(encoded)?;

        let mut metadata = BTreeMap::new();
        if let Some(destination) = destination_bucket.filter(|value| !value.is_empty()) {
            metadata.insert(
                DESTINATION_BUCKET_METADATA.to_string(),
                destination.to_string(),
            );
        }

        Ok(Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
            body,
            content_type: content_type
                .filter(|value| !value.is_empty())
                .unwrap_or(DEFAULT_CONTENT_TYPE)
                .to_string(),
            metadata,
        })
    }

    pub fn pdf_from_base64(
        bucket: &str,
        key: &str,
        encoded: &str,
        destination_bucket: Option<&str>,
    ) -> Result<Self, DocumentDecodeError> {
        Self::from_base64(
            bucket,
            key,
            encoded,
            Some(PDF_CONTENT_TYPE),
            destination_bucket,
        )
    }
}

/// Copy source for a server-side copy: `/<bucket>/<key>` with each path
/// segment percent-encoded and the separators kept.
pub fn copy_source(bucket: &str, key: &str) -> String {
    let mut source = String::with_capacity(bucket.len() + key.len() + 2);
    for segment in std::iter::once(bucket).chain(key.split('/')) {
        source.push('/');
        source.push_str(&urlencoding::encode(segment));
    }
    source
}
