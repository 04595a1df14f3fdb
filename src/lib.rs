//! # fileconv
//!
//! Client-side workflow for a file-conversion backend: pick a file, learn
//! which formats it can become, convert it, save the result.
//!
//! ## Why this crate?
//!
//! The backend is a set of small HTTP services (a format registry, an image
//! converter, a statistics collector). The interesting part is not the HTTP
//! calls but the *ordering*: a new selection must wipe the previous catalog
//! before discovery starts, only one conversion may be in flight, and a
//! response that arrives after the user moved on must not clobber the
//! current state. [`Workflow`] owns that state machine; the network and the
//! filesystem sit behind traits so it can be tested without either.
//!
//! ## Pipeline Overview
//!
//! ```text
//! file
//!  │
//!  ├─ 1. Select    first file of the list; extension from the name
//!  ├─ 2. Discover  GET /api/format/available-formats/{ext}
//!  ├─ 3. Convert   POST /api/image/convert (multipart: file, format)
//!  └─ 4. Deliver   save bytes under the Content-Disposition name
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fileconv::{
//!     load_file, ApiClient, ClientConfig, ConversionOutcome, DirectoryDownloader, Workflow,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder()
//!         .base_url("http://localhost:8080")
//!         .build()?;
//!     let workflow = Workflow::from_client(
//!         ApiClient::new(config)?,
//!         Arc::new(DirectoryDownloader::new("out")),
//!     );
//!
//!     workflow.select_file(load_file("photo.jpg").await?).await;
//!     println!("targets: {:?}", workflow.available_targets());
//!
//!     if let ConversionOutcome::Delivered(artifact) = workflow.convert_file("webp").await? {
//!         println!("saved {}", artifact.name);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `fileconv` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! fileconv = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod messages;
pub mod model;
pub mod observer;
pub mod pipeline;
pub mod workflow;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ClientConfig, ClientConfigBuilder, Locale, ENV_API_BASE, ENV_LOCALE};
pub use error::{ConvertError, WorkflowError};
pub use messages::Messages;
pub use model::{
    ConversionResult, ConversionStats, DeliveredArtifact, FormatCatalog, SelectedFile, Service,
    ServiceHealth, SupportedFormats,
};
pub use observer::{NoopObserver, Observer, WorkflowObserver};
pub use pipeline::conversion::{suggested_filename, ConversionService};
pub use pipeline::delivery::{DirectoryDownloader, Downloader};
pub use pipeline::discovery::FormatRegistry;
pub use pipeline::http::ApiClient;
pub use pipeline::input::{extension_of, load_file};
pub use workflow::{
    ConversionOutcome, DiscoveryOutcome, SkipReason, Stage, Workflow, WorkflowSnapshot,
};
