//! LLM-backed LaTeX generation and the bounded correction loops.
//!
//! [`LatexGenerator`] owns one [`TextGenerator`] and the sampling parameters.
//! Every operation here converts service failures into structured outcomes:
//! nothing returns `Err`. Fatal problems (no credential) surface earlier,
//! from [`LatexGenerator::from_config`].

use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::output::{CorrectionOutcome, GenerationResult, ValidationOutcome};
use crate::pipeline::acceptance::Acceptance;
use crate::pipeline::extract::{extract_document, scan_issues, IssueScan};
use crate::pipeline::llm::{resolve_generator, GenerationParams, TextGenerator};
use crate::progress::{ProgressCallback, Stage};
use crate::prompts;
use crate::request::GenerationRequest;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Warning recorded when a validation reply has an unreadable issue list.
pub const UNPARSEABLE_ISSUES_WARNING: &str = "Unable to parse validation issues";

/// Error message when the first draft comes back empty.
pub const EMPTY_DRAFT_ERROR: &str = "Failed to generate initial LaTeX";

/// Issues quoted in the fix summary of an external-feedback pass.
const FEEDBACK_SUMMARY_ISSUES: usize = 3;

/// Where the self-correction loop stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CorrectionState {
    Attempting(u32),
    Corrected,
    Exhausted,
}

/// Generation client plus corrector loop.
#[derive(Clone)]
pub struct LatexGenerator {
    generator: Arc<dyn TextGenerator>,
    max_tokens: usize,
    temperature: f32,
    correction_temperature: f32,
    progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for LatexGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LatexGenerator")
            .field("model", &self.generator.model_name())
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("correction_temperature", &self.correction_temperature)
            .finish()
    }
}

impl LatexGenerator {
    /// Wrap a text generator with the default parameters
    /// (8000 tokens, 0.2 for drafts, 0.1 for fix-ups).
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            max_tokens: 8000,
            temperature: 0.2,
            correction_temperature: 0.1,
            progress: None,
        }
    }

    /// Resolve the text generator from `config` and copy its parameters.
    ///
    /// # Errors
    /// [`ReportError::MissingCredential`] when no key is available, or
    /// [`ReportError::ProviderNotConfigured`] when the provider cannot be built.
    pub fn from_config(config: &ReportConfig) -> Result<Self, ReportError> {
        let generator = resolve_generator(config)?;
        Ok(Self {
            generator,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            correction_temperature: config.correction_temperature,
            progress: config.progress_callback.clone(),
        })
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperatures(mut self, draft: f32, correction: f32) -> Self {
        self.temperature = draft;
        self.correction_temperature = correction;
        self
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn model_name(&self) -> &str {
        self.generator.model_name()
    }

    fn draft_params(&self) -> GenerationParams {
        GenerationParams {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    fn correction_params(&self) -> GenerationParams {
        GenerationParams {
            max_tokens: self.max_tokens,
            temperature: self.correction_temperature,
        }
    }

    /// Produce a document for `request`, optionally followed by one
    /// validation pass. Always returns a result.
    pub async fn generate(&self, request: &GenerationRequest, validate: bool) -> GenerationResult {
        let prompt = prompts::build_generation_prompt(request);
        info!(
            "Generating LaTeX with {} ({} sections, {} tables, {} figures)",
            self.model_name(),
            request.sections.len(),
            request.tables.len(),
            request.figures.len()
        );
        debug!("Generation prompt is {} bytes", prompt.len());

        let reply = match self.generator.generate_text(&prompt, &self.draft_params()).await {
            Ok(r) => r,
            Err(e) => {
                warn!("Generation failed: {}", e);
                return GenerationResult::failed(e.to_string());
            }
        };

        let document = extract_document(&reply);
        if document.is_empty() {
            warn!("{}", EMPTY_DRAFT_ERROR);
            return GenerationResult::failed(EMPTY_DRAFT_ERROR);
        }
        info!("Draft is {} characters", document.chars().count());

        if !validate {
            return GenerationResult {
                success: true,
                document,
                ..Default::default()
            };
        }

        if let Some(ref cb) = self.progress {
            cb.on_stage_start(Stage::Validate);
        }
        let checked = self.validate_and_fix(&document, request).await;
        if let Some(ref cb) = self.progress {
            cb.on_stage_complete(
                Stage::Validate,
                &format!("{} warnings", checked.warnings.len()),
            );
        }

        GenerationResult {
            success: true,
            document: checked.document,
            warnings: checked.warnings,
            improvements: checked.improvements,
            error_message: None,
        }
    }

    /// Ask the service to review `document` and return a corrected version
    /// with the issues it found.
    ///
    /// The candidate must survive [`Acceptance::length_only`]; otherwise the
    /// original is returned with whatever warnings were parsed.
    pub async fn validate_and_fix(
        &self,
        document: &str,
        request: &GenerationRequest,
    ) -> ValidationOutcome {
        debug!("Validating '{}'", request.title);
        let prompt = prompts::build_validation_prompt(document);

        let reply = match self
            .generator
            .generate_text(&prompt, &self.correction_params())
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!("Validation call failed: {}", e);
                return ValidationOutcome {
                    document: document.to_string(),
                    warnings: vec![format!("Validation failed: {e}")],
                    improvements: Vec::new(),
                };
            }
        };

        let warnings = match scan_issues(&reply) {
            IssueScan::NotReported => Vec::new(),
            IssueScan::Parsed(issues) => issues,
            IssueScan::Unparseable => vec![UNPARSEABLE_ISSUES_WARNING.to_string()],
        };

        let candidate = extract_document(&reply);
        if let Err(reason) = Acceptance::length_only().check(document, &candidate) {
            warn!("Validation candidate rejected: {}", reason);
            return ValidationOutcome {
                document: document.to_string(),
                warnings,
                improvements: Vec::new(),
            };
        }

        let improvements = if warnings.is_empty() {
            Vec::new()
        } else {
            vec![format!("Fixed {} LaTeX issues", warnings.len())]
        };
        info!("Validation reported {} issues", warnings.len());

        ValidationOutcome {
            document: candidate,
            warnings,
            improvements,
        }
    }

    /// Apply fixes for issues found outside the pipeline (for example by a
    /// visual review of the rendered PDF). One call; the reply must pass
    /// [`Acceptance::strict`].
    pub async fn apply_external_feedback(
        &self,
        document: &str,
        issues: &[String],
    ) -> CorrectionOutcome {
        let unchanged = || CorrectionOutcome {
            document: document.to_string(),
            success: false,
            fixes: Vec::new(),
        };

        info!("Applying fixes for {} reported issues", issues.len());

        let prompt = prompts::build_feedback_prompt(document, issues);
        let reply = match self
            .generator
            .generate_text(&prompt, &self.correction_params())
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!("Feedback call failed: {}", e);
                return unchanged();
            }
        };

        let candidate = extract_document(&reply);
        if let Err(reason) = Acceptance::strict().check(document, &candidate) {
            warn!("Feedback candidate rejected: {}", reason);
            return unchanged();
        }

        let quoted = issues
            .iter()
            .take(FEEDBACK_SUMMARY_ISSUES)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        CorrectionOutcome {
            document: candidate,
            success: true,
            fixes: vec![format!("Applied fixes for: {quoted}")],
        }
    }

    /// Resubmit `document` with the compiler's error text until a reply
    /// passes [`Acceptance::structural`] or `max_attempts` calls are spent.
    ///
    /// Stops at the first acceptable reply; the fix is not confirmed by
    /// recompiling (see [`crate::report::compile_with_self_correction`]).
    pub async fn self_correct(
        &self,
        document: &str,
        compiler_error: &str,
        max_attempts: u32,
    ) -> CorrectionOutcome {
        let acceptance = Acceptance::structural();
        let mut log: Vec<String> = Vec::new();
        let mut state = if max_attempts == 0 {
            CorrectionState::Exhausted
        } else {
            CorrectionState::Attempting(1)
        };
        let mut corrected = String::new();

        while let CorrectionState::Attempting(n) = state {
            if let Some(ref cb) = self.progress {
                cb.on_attempt(n, max_attempts);
            }
            info!("Self-correction attempt {}/{}", n, max_attempts);

            let prompt = prompts::build_correction_prompt(document, compiler_error);
            let next = |n: u32| {
                if n >= max_attempts {
                    CorrectionState::Exhausted
                } else {
                    CorrectionState::Attempting(n + 1)
                }
            };

            match self
                .generator
                .generate_text(&prompt, &self.correction_params())
                .await
            {
                Ok(reply) => {
                    let candidate = extract_document(&reply);
                    match acceptance.check(document, &candidate) {
                        Ok(()) => {
                            log.push(format!("Attempt {n}: Fixed compilation error"));
                            corrected = candidate;
                            state = CorrectionState::Corrected;
                        }
                        Err(reason) => {
                            warn!("Attempt {} rejected: {}", n, reason);
                            state = next(n);
                        }
                    }
                }
                Err(e) => {
                    warn!("Attempt {} failed: {}", n, e);
                    state = next(n);
                }
            }
        }

        match state {
            CorrectionState::Corrected => CorrectionOutcome {
                document: corrected,
                success: true,
                fixes: log,
            },
            _ => {
                warn!("Self-correction exhausted after {} attempts", max_attempts);
                CorrectionOutcome {
                    document: document.to_string(),
                    success: false,
                    fixes: log,
                }
            }
        }
    }
}
