//! # edgequake-texgen
//!
//! Generate LaTeX research reports with a large language model.
//!
//! ## Why this crate?
//!
//! Writing a report template by hand means escaping every `%` and `_` in the
//! source material, choosing packages that exist on the build machine and
//! keeping table formatting consistent. Instead this crate hands the raw
//! material (markdown sections, CSV tables, figure files) to an LLM, asks for
//! a complete document, runs a validation pass, and compiles the result. When
//! the engine rejects the document, the compiler's own error text drives a
//! bounded correction loop.
//!
//! ## Pipeline Overview
//!
//! ```text
//! content dir
//!  │
//!  ├─ 1. Load      markdown sections, data/*.csv, images/*
//!  ├─ 2. Prompt    one generation prompt with every section verbatim
//!  ├─ 3. LLM       draft (t=0.2), then validation pass (t=0.1)
//!  ├─ 4. Extract   fenced LaTeX + {"issues": [...]} from free text
//!  ├─ 5. Write     <output_dir>/research_report.tex (atomic, as generated)
//!  └─ 6. Compile   pdflatex, optional compile → correct → recompile
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_texgen::{generate_report, ReportConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Key read from ANTHROPIC_API_KEY
//!     let config = ReportConfig::builder()
//!         .content_dir("artifacts/sample_content")
//!         .output_dir("artifacts/output")
//!         .build()?;
//!     let outcome = generate_report(&config).await?;
//!     println!("success: {} ({:?})", outcome.success, outcome.tex_path);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `texgen` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-texgen = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generator;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod report;
pub mod request;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ReportConfig, ReportConfigBuilder, DEFAULT_MODEL, DEFAULT_REQUIREMENTS};
pub use error::{ReportError, ServiceError};
pub use generator::LatexGenerator;
pub use output::{
    CompileOutcome, CorrectionOutcome, GenerationResult, ReportOutcome, ValidationOutcome,
};
pub use pipeline::acceptance::{Acceptance, Rejection};
pub use pipeline::compile::{DocumentCompiler, LatexCompiler};
pub use pipeline::content::{ContentLoader, LoadedContent};
pub use pipeline::extract::{extract_document, scan_issues, IssueScan};
pub use pipeline::llm::{provider_with_key, GenerationParams, ProviderGenerator, TextGenerator};
pub use progress::{NoopProgressCallback, ProgressCallback, ReportProgressCallback, Stage};
pub use report::{
    compile_with_self_correction, generate_report, generate_report_sync, generate_report_with,
    write_document,
};
pub use request::{Figure, GenerationRequest, Section, SectionKind, Table, TableFormat};
