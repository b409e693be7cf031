//! Progress-callback trait for report-generation stage events.
//!
//! Inject an [`Arc<dyn ReportProgressCallback>`] via
//! [`crate::config::ReportConfigBuilder::progress_callback`] to receive
//! events as the pipeline moves from loading content to compiling the PDF.
//! Callers can forward events to a terminal spinner, a log file or a UI
//! without the library knowing how the host application reports progress.
//!
//! # Example
//!
//! ```rust
//! use edgequake_texgen::{ReportConfig, ReportProgressCallback, Stage};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     finished: AtomicUsize,
//! }
//!
//! impl ReportProgressCallback for CountingCallback {
//!     fn on_stage_complete(&self, stage: Stage, detail: &str) {
//!         self.finished.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{stage} done: {detail}");
//!     }
//! }
//!
//! let cb = Arc::new(CountingCallback { finished: AtomicUsize::new(0) });
//! let config = ReportConfig::builder()
//!     .progress_callback(cb as Arc<dyn ReportProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::sync::Arc;

/// Pipeline stages reported to a [`ReportProgressCallback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    LoadContent,
    Generate,
    Validate,
    Write,
    Compile,
    Correct,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::LoadContent => "Loading content",
            Stage::Generate => "Generating LaTeX",
            Stage::Validate => "Validating",
            Stage::Write => "Writing",
            Stage::Compile => "Compiling",
            Stage::Correct => "Self-correcting",
        };
        f.write_str(name)
    }
}

/// Called by the orchestrator as it moves through the pipeline.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. The trait is `Send + Sync` so a callback can be
/// shared with a background spinner thread.
pub trait ReportProgressCallback: Send + Sync {
    /// Called when a stage begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage finishes. `detail` is a short human-readable
    /// summary ("6 sections, 2 tables, 3 figures").
    fn on_stage_complete(&self, stage: Stage, detail: &str) {
        let _ = (stage, detail);
    }

    /// Called when a stage fails. The run may still continue (a failed
    /// compile can be followed by a correction round).
    fn on_stage_error(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }

    /// Called before each LLM attempt inside a correction round.
    fn on_attempt(&self, attempt: u32, max_attempts: u32) {
        let _ = (attempt, max_attempts);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ReportProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ReportConfig`].
pub type ProgressCallback = Arc<dyn ReportProgressCallback>;
