//! Conversion port and suggested-filename extraction.
//!
//! The service returns the transcoded bytes and, usually, a
//! `Content-Disposition: attachment; filename="photo.webp"` header. Only the
//! quoted `filename="..."` form is recognised; anything else falls back to
//! `converted.<format>`.

use crate::error::ConvertError;
use crate::model::{ConversionResult, SelectedFile};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

/// Transcodes a submitted file to a requested target format.
#[async_trait]
pub trait ConversionService: Send + Sync {
    /// Submit `file` for conversion to `format`.
    ///
    /// `format` is passed through untouched; membership in the catalog is
    /// the caller's concern.
    async fn convert(
        &self,
        file: &SelectedFile,
        format: &str,
    ) -> Result<ConversionResult, ConvertError>;
}

static RE_FILENAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)filename="(.+?)""#).expect("static regex"));

/// Name to save a conversion result under.
///
/// Takes the first `filename="..."` in `disposition`, or synthesises
/// `converted.<format>` when the header is missing or has no quoted name.
pub fn suggested_filename(disposition: Option<&str>, format: &str) -> String {
    disposition
        .and_then(|h| RE_FILENAME.captures(h))
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| fallback_filename(format))
}

/// `converted.<format>`.
pub fn fallback_filename(format: &str) -> String {
    format!("converted.{format}")
}
