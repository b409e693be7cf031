//! Result types returned by the generator, the compiler and the orchestrator.
//!
//! Every type here is produced once and never mutated afterwards. All of them
//! derive `Serialize` so the CLI can emit a run as JSON (`texgen generate
//! --json`).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of [`crate::generator::LatexGenerator::generate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub success: bool,
    /// The generated LaTeX document. Empty on failure.
    pub document: String,
    pub warnings: Vec<String>,
    pub improvements: Vec<String>,
    pub error_message: Option<String>,
}

impl GenerationResult {
    pub(crate) fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(message.into()),
            ..Default::default()
        }
    }
}

/// Outcome of [`crate::generator::LatexGenerator::validate_and_fix`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub document: String,
    pub warnings: Vec<String>,
    pub improvements: Vec<String>,
}

/// Outcome of the two correction entry points,
/// [`crate::generator::LatexGenerator::apply_external_feedback`] and
/// [`crate::generator::LatexGenerator::self_correct`].
///
/// When `success` is false `document` is the caller's original, unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionOutcome {
    pub document: String,
    pub success: bool,
    pub fixes: Vec<String>,
}

/// What the compilation collaborator reported for one `.tex` file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileOutcome {
    pub success: bool,
    /// Diagnostic text: a short confirmation on success, the engine's error
    /// lines on failure.
    pub message: String,
    /// Path of the rendered artifact. Set only on success.
    pub pdf_path: Option<PathBuf>,
}

/// Summary of one orchestrated report run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportOutcome {
    pub success: bool,
    /// Where the LaTeX was written. `None` when generation failed.
    pub tex_path: Option<PathBuf>,
    pub pdf_path: Option<PathBuf>,
    pub generation: GenerationResult,
    /// `None` when compilation was skipped or never reached.
    pub compilation: Option<CompileOutcome>,
    /// First failure message of the run, if any.
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_result_has_message_and_no_document() {
        let r = GenerationResult::failed("boom");
        assert!(!r.success);
        assert!(r.document.is_empty());
        assert_eq!(r.error_message.as_deref(), Some("boom"));
    }

    #[test]
    fn report_outcome_is_json_serialisable() {
        let outcome = ReportOutcome {
            success: true,
            tex_path: Some(PathBuf::from("out/research_report.tex")),
            pdf_path: Some(PathBuf::from("out/research_report.pdf")),
            generation: GenerationResult {
                success: true,
                document: "\\begin{document}\\end{document}".into(),
                ..Default::default()
            },
            compilation: Some(CompileOutcome {
                success: true,
                message: "ok".into(),
                pdf_path: Some(PathBuf::from("out/research_report.pdf")),
            }),
            error: None,
        };
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("research_report.pdf"));
        let back: ReportOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(back, outcome);
    }
}
