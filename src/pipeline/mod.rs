//! Pipeline stages for LaTeX report generation.
//!
//! Each submodule implements exactly one concern, so each is independently
//! testable and the LLM backend or the LaTeX engine can be swapped without
//! touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! content ──▶ prompts ──▶ llm ──▶ extract ──▶ acceptance ──▶ compile
//! (md/csv/img)  (text)    (LLM)   (fences)    (sanity)       (pdflatex)
//! ```
//!
//! 1. [`content`]     — read sections, tables and figures from the content dir
//! 2. [`llm`]         — the `TextGenerator` boundary and provider resolution
//! 3. [`extract`]     — pull the document and issue list out of a free-text reply
//! 4. [`acceptance`]  — structural checks a correction must pass
//! 5. [`compile`]     — run the LaTeX engine; the only stage spawning processes

pub mod acceptance;
pub mod compile;
pub mod content;
pub mod extract;
pub mod llm;
