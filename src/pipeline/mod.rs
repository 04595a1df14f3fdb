//! Pipeline stages for client-side file conversion.
//!
//! Each submodule owns exactly one step. The three network-facing steps are
//! traits (ports) so the [`crate::workflow::Workflow`] can be driven by the
//! real HTTP client, by in-process fakes, or by a future WASM build without
//! changing the state machine.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ discovery ──▶ conversion ──▶ delivery
//! (file)    (GET catalog)  (POST multipart) (save bytes)
//! ```
//!
//! 1. [`input`]: pick the first file of a list, derive its extension
//! 2. [`discovery`]: ask the format registry which targets exist for it
//! 3. [`conversion`]: upload the file with the chosen target, read the
//!    suggested name from `Content-Disposition`
//! 4. [`delivery`]: hand the payload to the platform (a directory natively)
//!
//! [`http`] implements ports 2 and 3 against the backend with `reqwest`.

pub mod conversion;
pub mod delivery;
pub mod discovery;
pub mod http;
pub mod input;
