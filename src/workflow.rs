//! The conversion workflow: select → discover → convert → deliver.
//!
//! ```text
//!            select_file                 registry ok
//!  Empty ───────────────▶ Selected ─────────────────▶ Ready ◀──────────┐
//!    ▲                       │                          │  convert_file │ ok
//!    │                       │ registry failed          ▼               │
//!    │                       ▼                      Converting ─────────┤
//!    │                 SelectionError                   │ failed        │
//!    │                                                  ▼               │
//!    └──────── reset_file (from any stage) ─────── ConversionError ─────┘
//! ```
//!
//! One [`Workflow`] owns all of its state; collaborators (registry,
//! converter, downloader) are injected as trait objects so independent
//! instances never share anything and tests can swap in fakes.
//!
//! ## Concurrency
//!
//! State lives behind a `std::sync::Mutex` that is never held across an
//! `.await`. Two suspension points exist: the registry lookup and the
//! conversion request. For both, the synchronous state change (clearing the
//! old catalog, setting the busy flag) completes before the request is
//! issued, so nothing can interleave between "file chosen" and "discovery
//! requested".
//!
//! At most one conversion is in flight per workflow. The busy flag is taken
//! under the lock before the request starts and released by an RAII guard,
//! so it is cleared on success, on failure, and when the caller drops the
//! future half-way.
//!
//! ## Stale responses
//!
//! Every selection and reset bumps a generation counter. A registry or
//! conversion response that comes back for an older generation is logged
//! and dropped: it neither overwrites the catalog or error nor reaches the
//! downloader. In-flight requests are not cancelled; the busy flag stays
//! with the request that set it.

use crate::error::{ConvertError, WorkflowError};
use crate::messages::Messages;
use crate::model::{ConversionResult, DeliveredArtifact, FormatCatalog, SelectedFile};
use crate::observer::{NoopObserver, Observer};
use crate::pipeline::conversion::ConversionService;
use crate::pipeline::delivery::Downloader;
use crate::pipeline::discovery::FormatRegistry;
use crate::pipeline::http::ApiClient;
use crate::pipeline::input;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Observable workflow stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// No file selected.
    Empty,
    /// File selected, no catalog stored: discovery is pending, or a
    /// conversion ran after discovery had failed.
    Selected,
    /// Catalog loaded; conversion can be triggered.
    Ready,
    /// Discovery failed for the selected file.
    SelectionError,
    /// A conversion for the selected file is in flight.
    Converting,
    /// The last conversion failed; the catalog is still usable.
    ConversionError,
}

/// Result of a discovery run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryOutcome {
    /// The catalog was stored.
    Loaded(FormatCatalog),
    /// The lookup failed; the message is now the workflow error.
    Failed(WorkflowError),
    /// There was no file to discover formats for.
    NoFile,
    /// The selection changed while the lookup was in flight; result dropped.
    Stale,
}

/// Why a conversion trigger did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No file is selected.
    NoFile,
    /// Another conversion is still in flight.
    Busy,
}

/// Result of a conversion trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    /// Converted and handed to the downloader.
    Delivered(DeliveredArtifact),
    /// The request failed; the message is now the workflow error.
    Failed(WorkflowError),
    /// Nothing was sent.
    Skipped(SkipReason),
    /// The selection changed while the request was in flight; result dropped.
    Stale,
}

/// Point-in-time view of the workflow, for rendering or `--json` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowSnapshot {
    pub stage: Stage,
    pub file_name: Option<String>,
    pub extension: Option<String>,
    pub file_size: Option<usize>,
    pub catalog: Option<FormatCatalog>,
    pub error: Option<WorkflowError>,
    pub busy: bool,
}

#[derive(Debug)]
struct State {
    file: Option<SelectedFile>,
    catalog: Option<FormatCatalog>,
    error: Option<WorkflowError>,
    /// Stage ignoring any in-flight conversion; see [`Workflow::observed`].
    stage: Stage,
    generation: u64,
    /// Generation of the conversion in flight. `Some` is the busy flag.
    in_flight: Option<u64>,
}

impl State {
    fn idle_stage(&self) -> Stage {
        if self.catalog.is_some() {
            Stage::Ready
        } else {
            Stage::Selected
        }
    }
}

/// Client-side conversion workflow. See the module docs for the state machine.
pub struct Workflow {
    registry: Arc<dyn FormatRegistry>,
    converter: Arc<dyn ConversionService>,
    downloader: Arc<dyn Downloader>,
    messages: Messages,
    observer: Observer,
    state: Mutex<State>,
}

impl Workflow {
    pub fn new(
        registry: Arc<dyn FormatRegistry>,
        converter: Arc<dyn ConversionService>,
        downloader: Arc<dyn Downloader>,
    ) -> Self {
        Self {
            registry,
            converter,
            downloader,
            messages: Messages::default(),
            observer: Arc::new(NoopObserver),
            state: Mutex::new(State {
                file: None,
                catalog: None,
                error: None,
                stage: Stage::Empty,
                generation: 0,
                in_flight: None,
            }),
        }
    }

    /// Wire a workflow to one [`ApiClient`] serving both network ports,
    /// with messages in the client's configured locale.
    pub fn from_client(client: ApiClient, downloader: Arc<dyn Downloader>) -> Self {
        let messages = Messages::new(client.config().locale);
        let client = Arc::new(client);
        Self::new(client.clone(), client, downloader).with_messages(messages)
    }

    pub fn with_messages(mut self, messages: Messages) -> Self {
        self.messages = messages;
        self
    }

    pub fn with_observer(mut self, observer: Observer) -> Self {
        self.observer = observer;
        self
    }

    // ── Selection ────────────────────────────────────────────────────────

    /// Replace the selected file and discover its output formats.
    ///
    /// The previous catalog and error are cleared before the registry is
    /// queried; the returned future completes when discovery does.
    pub async fn select_file(&self, file: SelectedFile) -> DiscoveryOutcome {
        info!("Selected '{}' ({} bytes)", file.name(), file.len());
        self.update(|st| {
            st.file = Some(file);
            st.catalog = None;
            st.error = None;
            st.stage = Stage::Selected;
            st.generation += 1;
        });
        self.fetch_available_formats().await
    }

    /// Select the first handle of a dropped or picked list.
    ///
    /// Returns `None` without touching state when the list is empty.
    pub async fn select_first<I>(&self, files: I) -> Option<DiscoveryOutcome>
    where
        I: IntoIterator<Item = SelectedFile>,
    {
        match input::first_of(files) {
            Some(file) => Some(self.select_file(file).await),
            None => {
                debug!("Empty file list, selection unchanged");
                None
            }
        }
    }

    /// Clear file, catalog and error, returning to [`Stage::Empty`].
    ///
    /// The same file can be selected again afterwards.
    pub fn reset_file(&self) {
        info!("Reset");
        self.update(|st| {
            st.file = None;
            st.catalog = None;
            st.error = None;
            st.stage = Stage::Empty;
            st.generation += 1;
        });
    }

    // ── Discovery ────────────────────────────────────────────────────────

    /// Query the registry for the selected file's extension.
    ///
    /// Runs automatically from [`Self::select_file`]; calling it again
    /// re-runs discovery for the current selection. Never retries.
    pub async fn fetch_available_formats(&self) -> DiscoveryOutcome {
        let current = {
            let st = self.lock();
            st.file.clone().map(|f| (f, st.generation))
        };
        let Some((file, generation)) = current else {
            return DiscoveryOutcome::NoFile;
        };

        let extension = file.extension();
        self.observer.on_discovery_start(file.name(), &extension);

        match self.registry.available_formats(&extension).await {
            Ok(catalog) => {
                let applied = self.update(|st| {
                    if st.generation != generation {
                        return false;
                    }
                    st.catalog = Some(catalog.clone());
                    st.error = None;
                    st.stage = Stage::Ready;
                    true
                });
                if !applied {
                    warn!("Dropping stale format catalog for '{}'", file.name());
                    return DiscoveryOutcome::Stale;
                }
                info!(
                    "'{}' converts to: {}",
                    extension,
                    catalog.output_formats.join(", ")
                );
                self.observer.on_formats_loaded(&catalog);
                DiscoveryOutcome::Loaded(catalog)
            }
            Err(e) => {
                warn!("Format discovery for '{}' failed: {}", extension, e);
                let message = WorkflowError::new(self.messages.unsupported_format(&extension));
                let applied = self.update(|st| {
                    if st.generation != generation {
                        return false;
                    }
                    st.catalog = None;
                    st.error = Some(message.clone());
                    st.stage = Stage::SelectionError;
                    true
                });
                if !applied {
                    warn!("Dropping stale discovery failure for '{}'", file.name());
                    return DiscoveryOutcome::Stale;
                }
                self.observer.on_error(message.message());
                DiscoveryOutcome::Failed(message)
            }
        }
    }

    // ── Conversion ───────────────────────────────────────────────────────

    /// Convert the selected file to `format` and deliver the result.
    ///
    /// `format` is not checked against the catalog; only offer what
    /// [`Self::available_targets`] returns. A trigger while another
    /// conversion is in flight is ignored, not queued.
    ///
    /// # Errors
    /// Request failures become the workflow error and an
    /// `Ok(ConversionOutcome::Failed)`. Only a failing [`Downloader`] is
    /// returned as `Err`; it is not a workflow state.
    pub async fn convert_file(&self, format: &str) -> Result<ConversionOutcome, ConvertError> {
        let acquired = self.update(|st| {
            let Some(file) = st.file.clone() else {
                return Err(SkipReason::NoFile);
            };
            if st.in_flight.is_some() {
                return Err(SkipReason::Busy);
            }
            st.in_flight = Some(st.generation);
            st.error = None;
            st.stage = st.idle_stage();
            Ok((file, st.generation))
        });
        let (file, generation) = match acquired {
            Ok(v) => v,
            Err(reason) => {
                debug!("Conversion to '{}' skipped: {:?}", format, reason);
                return Ok(ConversionOutcome::Skipped(reason));
            }
        };
        let _busy = BusyGuard { workflow: self };

        self.observer.on_conversion_start(file.name(), format);
        match self.converter.convert(&file, format).await {
            Ok(result) => {
                if !self.is_current(generation) {
                    warn!("Dropping stale conversion of '{}'", file.name());
                    return Ok(ConversionOutcome::Stale);
                }
                let artifact = self.deliver(result).await?;
                Ok(ConversionOutcome::Delivered(artifact))
            }
            Err(e) => {
                warn!("Conversion of '{}' to '{}' failed: {}", file.name(), format, e);
                let message = self.conversion_message(&e);
                let applied = self.update(|st| {
                    if st.generation != generation {
                        return false;
                    }
                    st.error = Some(message.clone());
                    st.stage = Stage::ConversionError;
                    true
                });
                if !applied {
                    warn!("Dropping stale conversion failure for '{}'", file.name());
                    return Ok(ConversionOutcome::Stale);
                }
                self.observer.on_error(message.message());
                Ok(ConversionOutcome::Failed(message))
            }
        }
    }

    /// Hand a converted payload to the downloader. Keeps nothing.
    pub async fn deliver(&self, result: ConversionResult) -> Result<DeliveredArtifact, ConvertError> {
        let ConversionResult {
            payload,
            suggested_name,
        } = result;
        let artifact = self.downloader.save(payload, &suggested_name).await?;
        self.observer.on_delivered(&artifact);
        Ok(artifact)
    }

    /// The error's own message, or the localized generic one when it has none.
    fn conversion_message(&self, e: &ConvertError) -> WorkflowError {
        let message = WorkflowError::from(e);
        if message.message().trim().is_empty() {
            WorkflowError::new(self.messages.conversion_failed())
        } else {
            message
        }
    }

    // ── Read side ────────────────────────────────────────────────────────

    pub fn stage(&self) -> Stage {
        Self::observed(&self.lock())
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        let st = self.lock();
        WorkflowSnapshot {
            stage: Self::observed(&st),
            file_name: st.file.as_ref().map(|f| f.name().to_string()),
            extension: st.file.as_ref().map(SelectedFile::extension),
            file_size: st.file.as_ref().map(SelectedFile::len),
            catalog: st.catalog.clone(),
            error: st.error.clone(),
            busy: st.in_flight.is_some(),
        }
    }

    pub fn selected_file(&self) -> Option<SelectedFile> {
        self.lock().file.clone()
    }

    pub fn catalog(&self) -> Option<FormatCatalog> {
        self.lock().catalog.clone()
    }

    pub fn error(&self) -> Option<WorkflowError> {
        self.lock().error.clone()
    }

    /// Whether a conversion request is in flight.
    pub fn is_busy(&self) -> bool {
        self.lock().in_flight.is_some()
    }

    /// Formats that may be offered as conversion targets: exactly the
    /// catalog's output formats, or nothing without a catalog.
    pub fn available_targets(&self) -> Vec<String> {
        self.lock()
            .catalog
            .as_ref()
            .map(|c| c.output_formats.clone())
            .unwrap_or_default()
    }

    /// Whether a trigger for `format` would be accepted right now.
    pub fn can_convert(&self, format: &str) -> bool {
        let st = self.lock();
        st.file.is_some()
            && st.in_flight.is_none()
            && st.catalog.as_ref().is_some_and(|c| c.offers(format))
    }

    // ── Internals ────────────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn observed(st: &State) -> Stage {
        if st.file.is_some() && st.in_flight == Some(st.generation) {
            Stage::Converting
        } else {
            st.stage
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.lock().generation == generation
    }

    /// Mutate state under the lock, then report any stage change after
    /// the lock is released.
    fn update<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        let (from, to, r) = {
            let mut st = self.lock();
            let from = Self::observed(&st);
            let r = f(&mut st);
            (from, Self::observed(&st), r)
        };
        self.notify_stage(from, to);
        r
    }

    fn notify_stage(&self, from: Stage, to: Stage) {
        if from != to {
            debug!("Stage {:?} → {:?}", from, to);
            self.observer.on_stage_change(from, to);
        }
    }
}

/// Releases the busy flag when the conversion ends, however it ends.
struct BusyGuard<'a> {
    workflow: &'a Workflow,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.workflow.update(|st| st.in_flight = None);
    }
}
