//! Discovery port: which output formats are reachable from an extension.
//!
//! The workflow only ever talks to the registry through [`FormatRegistry`],
//! so tests substitute a fake and the production build plugs in
//! [`crate::pipeline::http::ApiClient`].

use crate::error::ConvertError;
use crate::model::FormatCatalog;
use async_trait::async_trait;

/// Maps an input extension to the conversion targets the backend supports.
#[async_trait]
pub trait FormatRegistry: Send + Sync {
    /// Look up `extension` (lowercase, possibly empty).
    ///
    /// Unknown extensions are an error (the backend answers 404), never an
    /// empty catalog.
    async fn available_formats(&self, extension: &str) -> Result<FormatCatalog, ConvertError>;
}
