//! Data carried between workflow stages and returned by the backend.

use crate::pipeline::input::extension_of;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// The file the user picked: an opaque blob plus its name.
///
/// The extension is derived on demand from the name (see
/// [`extension_of`]); no validation of type or size happens at selection.
/// Cloning is cheap: the content is reference-counted.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    name: String,
    content: Bytes,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Lowercased suffix after the final `.` of the name, or `""`.
    pub fn extension(&self) -> String {
        extension_of(&self.name)
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("len", &self.content.len())
            .finish()
    }
}

/// The registry's answer for one input extension. Immutable once received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatCatalog {
    pub input_format: String,
    #[serde(default)]
    pub available_converters: Vec<String>,
    #[serde(default)]
    pub output_formats: Vec<String>,
}

impl FormatCatalog {
    pub fn offers(&self, format: &str) -> bool {
        self.output_formats.iter().any(|f| f == format)
    }
}

/// Binary result of a conversion plus the name to save it under.
///
/// Never persisted by the workflow: handed to the
/// [`crate::pipeline::delivery::Downloader`] and dropped.
#[derive(Clone, PartialEq, Eq)]
pub struct ConversionResult {
    pub payload: Bytes,
    pub suggested_name: String,
}

impl fmt::Debug for ConversionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionResult")
            .field("suggested_name", &self.suggested_name)
            .field("len", &self.payload.len())
            .finish()
    }
}

/// What a [`crate::pipeline::delivery::Downloader`] did with a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveredArtifact {
    /// Name the artifact was offered/saved under.
    pub name: String,
    /// Where it landed, for downloaders that write to disk.
    pub location: Option<PathBuf>,
    pub bytes: usize,
}

/// All input formats the registry knows about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedFormats {
    pub supported_input_formats: Vec<String>,
}

/// Backend services that expose a health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    /// Format registry (`/api/format`).
    Format,
    /// Image conversion (`/api/image`).
    Image,
    /// Conversion statistics (`/api/stats`).
    Stats,
}

impl Service {
    pub const ALL: [Service; 3] = [Service::Format, Service::Image, Service::Stats];

    /// Path prefix under the API base.
    pub fn prefix(self) -> &'static str {
        match self {
            Service::Format => "format",
            Service::Image => "image",
            Service::Stats => "stats",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Body of a `/health` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub status: String,
}

impl ServiceHealth {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

/// Aggregate counters kept by the statistics service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    #[serde(default)]
    pub total_conversions: u64,
    #[serde(default)]
    pub errors: u64,
    #[serde(default)]
    pub by_format: BTreeMap<String, u64>,
    #[serde(default)]
    pub last_event_ts: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_deserialises_registry_body() {
        let body = r#"{
            "input_format": "jpg",
            "available_converters": ["image-service"],
            "output_formats": ["jpeg", "jpg", "png", "webp"]
        }"#;
        let c: FormatCatalog = serde_json::from_str(body).unwrap();
        assert_eq!(c.input_format, "jpg");
        assert_eq!(c.available_converters, vec!["image-service"]);
        assert!(c.offers("webp"));
        assert!(!c.offers("gif"));
    }

    #[test]
    fn stats_tolerate_missing_fields() {
        let s: ConversionStats =
            serde_json::from_str(r#"{"total_conversions": 3, "by_format": {"png": 2}}"#).unwrap();
        assert_eq!(s.total_conversions, 3);
        assert_eq!(s.errors, 0);
        assert_eq!(s.by_format.get("png"), Some(&2));
        assert_eq!(s.last_event_ts, None);
    }

    #[test]
    fn selected_file_debug_hides_content() {
        let f = SelectedFile::new("photo.JPG", vec![1u8, 2, 3]);
        let dbg = format!("{f:?}");
        assert!(dbg.contains("photo.JPG"));
        assert!(dbg.contains("len: 3"));
        assert_eq!(f.extension(), "jpg");
    }

    #[test]
    fn health_status_is_case_insensitive() {
        assert!(ServiceHealth { status: "OK".into() }.is_ok());
        assert!(!ServiceHealth { status: "degraded".into() }.is_ok());
    }
}
