//! Configuration types for report generation.
//!
//! All run behaviour is controlled through [`ReportConfig`], built via its
//! [`ReportConfigBuilder`]. One struct holds every knob so a run can be
//! logged, diffed against another run, or shared with the CLI unchanged.

use crate::error::ReportError;
use crate::pipeline::llm::TextGenerator;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Provider used when none is configured.
pub const DEFAULT_PROVIDER: &str = "anthropic";

/// Requirements sent with every generation request unless overridden.
pub const DEFAULT_REQUIREMENTS: &[&str] = &[
    "Use professional typography packages (lmodern)",
    "Format tables with booktabs package",
    "Include proper hyperref setup for navigation",
    "Use appropriate section hierarchy",
    "Add proper spacing and layout",
];

/// Configuration for one report run.
///
/// Built via [`ReportConfig::builder()`] or using [`ReportConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_texgen::ReportConfig;
///
/// let config = ReportConfig::builder()
///     .content_dir("artifacts/sample_content")
///     .output_dir("build")
///     .title("Transformers in Practice")
///     .build()
///     .unwrap();
/// assert_eq!(config.output_filename, "research_report.tex");
/// ```
#[derive(Clone)]
pub struct ReportConfig {
    /// Directory holding the markdown sections plus `data/` and `images/`.
    /// Default: `artifacts/sample_content`.
    pub content_dir: PathBuf,

    /// Directory the `.tex` (and compiled `.pdf`) are written to.
    /// Created if missing. Default: `artifacts/output`.
    pub output_dir: PathBuf,

    /// File name of the generated document. Default: `research_report.tex`.
    pub output_filename: String,

    pub title: String,
    pub author: String,

    /// Free-text requirements passed to the LLM. Default: [`DEFAULT_REQUIREMENTS`].
    pub requirements: Vec<String>,

    /// Learned formatting patterns from earlier runs, appended to the
    /// requirements as one extra entry when present.
    pub pattern_context: Option<String>,

    /// Model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Provider name understood by `edgequake_llm::ProviderFactory`
    /// (`anthropic`, `openai`, `gemini`, `ollama`, …). Default: `anthropic`.
    pub provider_name: String,

    /// Explicit API key (anthropic, openai, gemini). When `None` the
    /// provider's environment variable must be set.
    pub api_key: Option<String>,

    /// Pre-constructed text generator. Takes precedence over `api_key` and
    /// `provider_name`; this is how tests substitute a deterministic stand-in.
    pub generator: Option<Arc<dyn TextGenerator>>,

    /// Sampling temperature for the initial generation. Default: 0.2.
    pub temperature: f32,

    /// Sampling temperature for validation and correction calls. Default: 0.1.
    ///
    /// Fix-up passes should change as little as possible, so they run
    /// colder than the first draft.
    pub correction_temperature: f32,

    /// Maximum tokens the LLM may generate per call. Default: 8000.
    ///
    /// A full report with tables is several thousand tokens of LaTeX; a
    /// lower cap truncates the document before `\end{document}` and every
    /// acceptance check downstream will then reject it.
    pub max_tokens: usize,

    /// Run the validation pass after the first draft. Default: true.
    pub validate: bool,

    /// Invoke the LaTeX engine after writing the document. Default: true.
    pub compile: bool,

    /// LaTeX engine executable. Default: `pdflatex`.
    pub latex_engine: String,

    /// Engine passes per compilation. Default: 2 (resolves the table of contents).
    pub compile_passes: u32,

    /// Compile → self-correct → recompile rounds after a failed compilation.
    /// Default: 0, the orchestrator reports the first failure as-is.
    pub self_correct_rounds: u32,

    /// LLM attempts per self-correction round. Default: 3.
    pub max_correction_attempts: u32,

    /// Optional progress callback for stage events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("artifacts/sample_content"),
            output_dir: PathBuf::from("artifacts/output"),
            output_filename: "research_report.tex".to_string(),
            title: "Advanced AI Research: Transformers and Beyond".to_string(),
            author: "Dr. Research Smith".to_string(),
            requirements: DEFAULT_REQUIREMENTS.iter().map(|s| s.to_string()).collect(),
            pattern_context: None,
            model: DEFAULT_MODEL.to_string(),
            provider_name: DEFAULT_PROVIDER.to_string(),
            api_key: None,
            generator: None,
            temperature: 0.2,
            correction_temperature: 0.1,
            max_tokens: 8000,
            validate: true,
            compile: true,
            latex_engine: "pdflatex".to_string(),
            compile_passes: 2,
            self_correct_rounds: 0,
            max_correction_attempts: 3,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ReportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportConfig")
            .field("content_dir", &self.content_dir)
            .field("output_dir", &self.output_dir)
            .field("output_filename", &self.output_filename)
            .field("title", &self.title)
            .field("author", &self.author)
            .field("requirements", &self.requirements.len())
            .field("pattern_context", &self.pattern_context.is_some())
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("generator", &self.generator.as_ref().map(|_| "<dyn TextGenerator>"))
            .field("temperature", &self.temperature)
            .field("correction_temperature", &self.correction_temperature)
            .field("max_tokens", &self.max_tokens)
            .field("validate", &self.validate)
            .field("compile", &self.compile)
            .field("latex_engine", &self.latex_engine)
            .field("compile_passes", &self.compile_passes)
            .field("self_correct_rounds", &self.self_correct_rounds)
            .field("max_correction_attempts", &self.max_correction_attempts)
            .finish()
    }
}

impl ReportConfig {
    /// Create a new builder for `ReportConfig`.
    pub fn builder() -> ReportConfigBuilder {
        ReportConfigBuilder {
            config: Self::default(),
        }
    }

    /// Path the generated LaTeX is written to.
    pub fn tex_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_filename)
    }

    /// Path the compiled artifact is expected at: same stem, `.pdf` suffix.
    pub fn pdf_path(&self) -> PathBuf {
        self.tex_path().with_extension("pdf")
    }

    /// Requirements as sent to the LLM, with the pattern context appended.
    pub fn effective_requirements(&self) -> Vec<String> {
        let mut reqs = self.requirements.clone();
        if let Some(ref patterns) = self.pattern_context {
            if !patterns.trim().is_empty() {
                reqs.push(format!(
                    "IMPORTANT: Apply the following learned patterns from historical documents:\n{}",
                    patterns.trim()
                ));
            }
        }
        reqs
    }
}

/// Builder for [`ReportConfig`].
pub struct ReportConfigBuilder {
    config: ReportConfig,
}

impl fmt::Debug for ReportConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ReportConfigBuilder {
    pub fn content_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.content_dir = dir.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn output_filename(mut self, name: impl Into<String>) -> Self {
        self.config.output_filename = name.into();
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = title.into();
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.config.author = author.into();
        self
    }

    pub fn requirements(mut self, reqs: Vec<String>) -> Self {
        self.config.requirements = reqs;
        self
    }

    pub fn pattern_context(mut self, patterns: impl Into<String>) -> Self {
        self.config.pattern_context = Some(patterns.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = name.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.config.generator = Some(generator);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 1.0);
        self
    }

    pub fn correction_temperature(mut self, t: f32) -> Self {
        self.config.correction_temperature = t.clamp(0.0, 1.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn validate(mut self, v: bool) -> Self {
        self.config.validate = v;
        self
    }

    pub fn compile(mut self, v: bool) -> Self {
        self.config.compile = v;
        self
    }

    pub fn latex_engine(mut self, engine: impl Into<String>) -> Self {
        self.config.latex_engine = engine.into();
        self
    }

    pub fn compile_passes(mut self, n: u32) -> Self {
        self.config.compile_passes = n;
        self
    }

    pub fn self_correct_rounds(mut self, n: u32) -> Self {
        self.config.self_correct_rounds = n;
        self
    }

    pub fn max_correction_attempts(mut self, n: u32) -> Self {
        self.config.max_correction_attempts = n;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReportConfig, ReportError> {
        let c = &self.config;
        if !c.output_filename.ends_with(".tex") || c.output_filename.len() <= 4 {
            return Err(ReportError::InvalidConfig(format!(
                "output file name must end in .tex, got '{}'",
                c.output_filename
            )));
        }
        if c.max_tokens == 0 {
            return Err(ReportError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.compile_passes == 0 {
            return Err(ReportError::InvalidConfig(
                "compile_passes must be ≥ 1".into(),
            ));
        }
        if c.model.trim().is_empty() {
            return Err(ReportError::InvalidConfig("model must not be empty".into()));
        }
        Ok(self.config)
    }
}
