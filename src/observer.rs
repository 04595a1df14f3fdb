//! Observer trait for workflow events.
//!
//! Inject an [`Arc<dyn WorkflowObserver>`] via
//! [`crate::workflow::Workflow::with_observer`] to hear about stage changes
//! as they happen: a terminal spinner, a GUI status line, or a test probe.
//!
//! # Example
//!
//! ```rust
//! use fileconv::{Stage, WorkflowObserver};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct History(Mutex<Vec<Stage>>);
//!
//! impl WorkflowObserver for History {
//!     fn on_stage_change(&self, _from: Stage, to: Stage) {
//!         self.0.lock().unwrap().push(to);
//!     }
//! }
//!
//! let observer: Arc<dyn WorkflowObserver> = Arc::new(History::default());
//! # let _ = observer;
//! ```

use crate::model::{DeliveredArtifact, FormatCatalog};
use crate::workflow::Stage;
use std::sync::Arc;

/// Called by the workflow as it moves between stages.
///
/// Events are emitted after the workflow's state lock is released, so an
/// implementation may call back into the workflow's read side. All methods
/// default to no-ops.
pub trait WorkflowObserver: Send + Sync {
    /// The observable stage changed.
    fn on_stage_change(&self, from: Stage, to: Stage) {
        let _ = (from, to);
    }

    /// A registry lookup is about to be issued for `extension`.
    fn on_discovery_start(&self, file_name: &str, extension: &str) {
        let _ = (file_name, extension);
    }

    /// The registry answered; `catalog` is now stored.
    fn on_formats_loaded(&self, catalog: &FormatCatalog) {
        let _ = catalog;
    }

    /// A conversion request to `format` is about to be issued.
    fn on_conversion_start(&self, file_name: &str, format: &str) {
        let _ = (file_name, format);
    }

    /// The converted artifact was handed to the downloader.
    fn on_delivered(&self, artifact: &DeliveredArtifact) {
        let _ = artifact;
    }

    /// A stage failed and `message` is now the workflow error.
    fn on_error(&self, message: &str) {
        let _ = message;
    }
}

/// A no-op implementation; the default when no observer is set.
pub struct NoopObserver;

impl WorkflowObserver for NoopObserver {}

/// Convenience alias matching the type stored in the workflow.
pub type Observer = Arc<dyn WorkflowObserver>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        changes: AtomicUsize,
        errors: AtomicUsize,
    }

    impl WorkflowObserver for Counting {
        fn on_stage_change(&self, _from: Stage, _to: Stage) {
            self.changes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_error(&self, _message: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_observer_does_not_panic() {
        let o = NoopObserver;
        o.on_stage_change(Stage::Empty, Stage::Selected);
        o.on_discovery_start("a.png", "png");
        o.on_conversion_start("a.png", "webp");
        o.on_error("boom");
    }

    #[test]
    fn overridden_methods_receive_events() {
        let o = Counting::default();
        o.on_stage_change(Stage::Empty, Stage::Selected);
        o.on_stage_change(Stage::Selected, Stage::Ready);
        o.on_error("boom");
        o.on_discovery_start("a.png", "png");
        assert_eq!(o.changes.load(Ordering::SeqCst), 2);
        assert_eq!(o.errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_observer_works() {
        let o: Observer = Arc::new(NoopObserver);
        o.on_stage_change(Stage::Ready, Stage::Converting);
    }
}
