//! Integration tests for edgequake-texgen.
//!
//! The LLM and the LaTeX engine are replaced by scripted stand-ins, so these
//! run offline. One live test at the bottom calls the real service; it is
//! gated behind `E2E_ENABLED`.
//!
//! Run with:
//!   cargo test --test pipeline -- --nocapture

use async_trait::async_trait;
use edgequake_texgen::{
    compile_with_self_correction, generate_report, generate_report_with, CompileOutcome,
    ContentLoader, DocumentCompiler, GenerationParams, LatexGenerator, ReportConfig,
    ReportProgressCallback, ServiceError, Stage, TextGenerator,
};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

const DOC: &str = "\\documentclass{article}\n\\usepackage{booktabs}\n\\begin{document}\n\\section{Introduction}\nHello from the report body.\n\\end{document}";

/// Replays canned replies in order and records every prompt.
struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, ServiceError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    fn new(replies: Vec<Result<String, ServiceError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    fn prompt(&self, i: usize) -> String {
        self.prompts.lock().unwrap()[i].clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate_text(
        &self,
        prompt: &str,
        _params: &GenerationParams,
    ) -> Result<String, ServiceError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ServiceError::Api {
                message: "script exhausted".into(),
            }))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Returns canned outcomes in order; the last one repeats.
struct FakeCompiler {
    outcomes: Mutex<VecDeque<CompileOutcome>>,
    compiled: Mutex<Vec<String>>,
}

impl FakeCompiler {
    fn new(outcomes: Vec<CompileOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            compiled: Mutex::new(Vec::new()),
        }
    }

    fn runs(&self) -> usize {
        self.compiled.lock().unwrap().len()
    }
}

#[async_trait]
impl DocumentCompiler for FakeCompiler {
    async fn compile(&self, tex_path: &Path) -> CompileOutcome {
        let text = std::fs::read_to_string(tex_path).unwrap_or_default();
        self.compiled.lock().unwrap().push(text);
        let mut q = self.outcomes.lock().unwrap();
        if q.len() > 1 {
            q.pop_front().unwrap()
        } else {
            q.front().cloned().unwrap_or_default()
        }
    }
}

/// Route library logs to the test harness; `RUST_LOG=debug` shows them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn compiled_ok(tex: &Path) -> CompileOutcome {
    CompileOutcome {
        success: true,
        message: "PDF generated".into(),
        pdf_path: Some(tex.with_extension("pdf")),
    }
}

fn compile_failed(msg: &str) -> CompileOutcome {
    CompileOutcome {
        success: false,
        message: msg.into(),
        pdf_path: None,
    }
}

fn write(dir: &Path, rel: &str, content: &str) {
    let p = dir.join(rel);
    std::fs::create_dir_all(p.parent().unwrap()).unwrap();
    std::fs::write(p, content).unwrap();
}

/// A content directory with two sections, one table and one figure.
fn sample_content() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "introduction.md", "Transformers changed NLP.");
    write(tmp.path(), "conclusion.md", "Attention is enough.");
    write(
        tmp.path(),
        "data/model_performance.csv",
        "model,accuracy\nbert,0.91\ngpt,0.93\n",
    );
    write(tmp.path(), "images/attention_map.png", "png");
    tmp
}

fn config_for(content: &Path, out: &Path, generator: Arc<ScriptedGenerator>) -> ReportConfig {
    ReportConfig::builder()
        .content_dir(content)
        .output_dir(out)
        .generator(generator)
        .build()
        .unwrap()
}

// ── Content loading ──────────────────────────────────────────────────────────

#[test]
fn test_only_introduction_yields_one_markdown_section() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "introduction.md", "Hello");

    let content = ContentLoader::new(tmp.path()).load();
    assert_eq!(content.sections.len(), 1);
    assert_eq!(
        serde_json::to_value(&content.sections[0]).unwrap(),
        serde_json::json!({"title": "Introduction", "content": "Hello", "type": "markdown"})
    );
    assert!(content.tables.is_empty());
    assert!(content.figures.is_empty());
}

#[test]
fn test_training_metrics_limited_to_header_plus_five() {
    let tmp = TempDir::new().unwrap();
    let csv: String = std::iter::once("epoch,loss\n".to_string())
        .chain((1..=9).map(|i| format!("{i},0.{i}\n")))
        .collect();
    write(tmp.path(), "data/training_metrics.csv", &csv);

    let tables = ContentLoader::new(tmp.path()).load_tables();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].caption, "Training Progression (First 5 Epochs)");
    assert_eq!(tables[0].rows.len(), 6);
    assert_eq!(tables[0].rows[5], vec!["5", "0.5"]);
}

// ── Orchestrator ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_report_writes_validated_document_and_compiles() {
    init_tracing();
    let content = sample_content();
    let out = TempDir::new().unwrap();
    let fixed = DOC.replace("Hello", "Hello, validated,");
    let gen = ScriptedGenerator::new(vec![
        Ok(format!("Here is the document:\n```latex\n{DOC}\n```")),
        Ok(format!("{{\"issues\": [\"unescaped &\"]}}\n```latex\n{fixed}\n```")),
    ]);
    let config = config_for(content.path(), out.path(), gen.clone());
    let tex = config.tex_path();
    let compiler = FakeCompiler::new(vec![compiled_ok(&tex)]);

    let generator = LatexGenerator::from_config(&config).unwrap();
    let outcome = generate_report_with(&config, &generator, &compiler).await;

    assert!(outcome.success, "{:?}", outcome.error);
    assert_eq!(outcome.tex_path.as_deref(), Some(tex.as_path()));
    assert_eq!(outcome.pdf_path, Some(out.path().join("research_report.pdf")));
    assert_eq!(outcome.generation.warnings, vec!["unescaped &"]);
    assert_eq!(outcome.generation.improvements, vec!["Fixed 1 LaTeX issues"]);

    let written = std::fs::read_to_string(&tex).unwrap();
    assert_eq!(written, fixed);
    assert_eq!(compiler.runs(), 1);

    // The generation prompt carries every section verbatim, the table and the figure.
    let prompt = gen.prompt(0);
    assert!(prompt.contains("--- Section 1: Introduction ---\nTransformers changed NLP."));
    assert!(prompt.contains("--- Section 2: Conclusion ---\nAttention is enough."));
    assert!(prompt.contains("Table: Model Performance Comparison"));
    assert!(prompt.contains("Figure: Attention Map"));
}

#[tokio::test]
async fn test_report_service_error_writes_nothing() {
    let content = sample_content();
    let out = TempDir::new().unwrap();
    let gen = ScriptedGenerator::new(vec![Err(ServiceError::Api {
        message: "rate limited".into(),
    })]);
    let config = config_for(content.path(), out.path(), gen.clone());
    let compiler = FakeCompiler::new(vec![]);

    let generator = LatexGenerator::from_config(&config).unwrap();
    let outcome = generate_report_with(&config, &generator, &compiler).await;

    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("LLM API error: rate limited"));
    assert!(outcome.tex_path.is_none());
    assert!(!config.tex_path().exists());
    assert_eq!(compiler.runs(), 0);
    assert_eq!(gen.calls(), 1);
}

#[tokio::test]
async fn test_report_without_compilation_succeeds_after_write() {
    let content = sample_content();
    let out = TempDir::new().unwrap();
    let gen = ScriptedGenerator::new(vec![Ok(DOC.to_string())]);
    let config = ReportConfig::builder()
        .content_dir(content.path())
        .output_dir(out.path().join("nested"))
        .generator(gen)
        .validate(false)
        .compile(false)
        .build()
        .unwrap();

    let outcome = generate_report(&config).await.unwrap();
    assert!(outcome.success);
    assert!(outcome.compilation.is_none());
    assert!(outcome.pdf_path.is_none());
    assert!(config.tex_path().exists());
}

#[tokio::test]
async fn test_report_writes_generated_document_verbatim() {
    let content = sample_content();
    let out = TempDir::new().unwrap();
    let doc = "\\documentclass{article}\n\\usepackage{verbatim}\n\\begin{document}\n\\begin{verbatim}\nkeep   \n\n\n\ncode\u{200B}here\t\n\\end{verbatim}\n\\end{document}";
    let gen = ScriptedGenerator::new(vec![Ok(format!("```latex\n{doc}\n```"))]);
    let config = ReportConfig::builder()
        .content_dir(content.path())
        .output_dir(out.path())
        .generator(gen)
        .validate(false)
        .compile(false)
        .build()
        .unwrap();

    let outcome = generate_report(&config).await.unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.generation.document, doc);
    assert_eq!(std::fs::read_to_string(config.tex_path()).unwrap(), doc);
}

#[tokio::test]
async fn test_report_compile_failure_is_reported_not_corrected() {
    let content = sample_content();
    let out = TempDir::new().unwrap();
    let gen = ScriptedGenerator::new(vec![Ok(DOC.to_string())]);
    let config = ReportConfig::builder()
        .content_dir(content.path())
        .output_dir(out.path())
        .generator(gen.clone())
        .validate(false)
        .build()
        .unwrap();
    let compiler = FakeCompiler::new(vec![compile_failed("! Undefined control sequence.")]);

    let generator = LatexGenerator::from_config(&config).unwrap();
    let outcome = generate_report_with(&config, &generator, &compiler).await;

    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("! Undefined control sequence."));
    assert!(outcome.tex_path.is_some());
    // Default configuration never calls self-correction.
    assert_eq!(gen.calls(), 1);
    assert_eq!(compiler.runs(), 1);
}

#[tokio::test]
async fn test_report_progress_events_in_order() {
    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }
    impl ReportProgressCallback for Recorder {
        fn on_stage_start(&self, stage: Stage) {
            self.events.lock().unwrap().push(format!("start {stage}"));
        }
        fn on_stage_complete(&self, stage: Stage, _detail: &str) {
            self.events.lock().unwrap().push(format!("done {stage}"));
        }
    }

    let content = sample_content();
    let out = TempDir::new().unwrap();
    let recorder = Arc::new(Recorder::default());
    let gen = ScriptedGenerator::new(vec![Ok(DOC.to_string())]);
    let config = ReportConfig::builder()
        .content_dir(content.path())
        .output_dir(out.path())
        .generator(gen)
        .validate(false)
        .compile(false)
        .progress_callback(recorder.clone())
        .build()
        .unwrap();

    generate_report(&config).await.unwrap();
    assert_eq!(
        *recorder.events.lock().unwrap(),
        vec![
            "start Loading content",
            "done Loading content",
            "start Generating LaTeX",
            "done Generating LaTeX",
            "start Writing",
            "done Writing",
        ]
    );
}

#[tokio::test]
async fn test_missing_credential_is_fatal() {
    if std::env::var("GEMINI_API_KEY").is_ok() {
        return;
    }
    let config = ReportConfig::builder()
        .provider_name("gemini")
        .build()
        .unwrap();
    let err = generate_report(&config).await.unwrap_err();
    assert!(err.to_string().contains("GEMINI_API_KEY"), "got: {err}");
}

// ── Correction loops ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_self_correct_bounded_by_max_attempts() {
    init_tracing();
    let gen = ScriptedGenerator::new(vec![
        Ok("I could not fix it.".into()),
        Ok("\\section{x}".into()),
        Err(ServiceError::EmptyReply),
        Ok(DOC.to_string()),
    ]);
    let outcome = LatexGenerator::new(gen.clone())
        .self_correct(DOC, "! LaTeX Error", 3)
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.document, DOC);
    assert!(outcome.fixes.is_empty());
    assert_eq!(gen.calls(), 3);
    assert!(gen.prompt(0).contains("! LaTeX Error"));
}

#[tokio::test]
async fn test_self_correct_stops_at_first_valid_reply() {
    let fixed = DOC.replace("\\usepackage{booktabs}\n", "");
    let gen = ScriptedGenerator::new(vec![Ok(format!("```latex\n{fixed}\n```"))]);
    let outcome = LatexGenerator::new(gen.clone())
        .self_correct(DOC, "! LaTeX Error: File `microtype.sty' not found.", 3)
        .await;

    assert!(outcome.success);
    assert_eq!(outcome.document, fixed);
    assert_eq!(outcome.fixes, vec!["Attempt 1: Fixed compilation error"]);
    assert_eq!(gen.calls(), 1);
}

#[tokio::test]
async fn test_feedback_without_end_document_keeps_original() {
    let truncated = DOC.replace("\\end{document}", "");
    let gen = ScriptedGenerator::new(vec![Ok(truncated)]);
    let outcome = LatexGenerator::new(gen)
        .apply_external_feedback(DOC, &["Missing page numbers".to_string()])
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.document, DOC);
    assert!(outcome.fixes.is_empty());
}

#[tokio::test]
async fn test_compile_with_self_correction_recompiles_fixed_document() {
    init_tracing();
    let out = TempDir::new().unwrap();
    let tex: PathBuf = out.path().join("report.tex");
    std::fs::write(&tex, DOC).unwrap();

    let fixed = DOC.replace("Hello", "Repaired");
    let gen = ScriptedGenerator::new(vec![Ok(fixed.clone())]);
    let compiler = FakeCompiler::new(vec![compile_failed("! Emergency stop."), compiled_ok(&tex)]);

    let outcome = compile_with_self_correction(
        &LatexGenerator::new(gen.clone()),
        &compiler,
        &tex,
        DOC,
        2,
        3,
        None,
    )
    .await;

    assert!(outcome.success);
    assert_eq!(compiler.runs(), 2);
    assert_eq!(gen.calls(), 1);
    assert_eq!(std::fs::read_to_string(&tex).unwrap(), fixed);
    assert!(compiler.compiled.lock().unwrap()[1].contains("Repaired"));
}

#[tokio::test]
async fn test_compile_with_self_correction_stops_when_correction_rejected() {
    let out = TempDir::new().unwrap();
    let tex = out.path().join("report.tex");
    std::fs::write(&tex, DOC).unwrap();

    let gen = ScriptedGenerator::new(vec![]);
    let compiler = FakeCompiler::new(vec![compile_failed("! Missing $ inserted.")]);
    let outcome = compile_with_self_correction(
        &LatexGenerator::new(gen.clone()),
        &compiler,
        &tex,
        DOC,
        3,
        2,
        None,
    )
    .await;

    assert!(!outcome.success);
    assert_eq!(outcome.message, "! Missing $ inserted.");
    assert_eq!(compiler.runs(), 1);
    assert_eq!(gen.calls(), 2);
}

#[test]
fn test_callback_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<edgequake_texgen::NoopProgressCallback>();
    assert_send_sync::<LatexGenerator>();
}

// ── Live service ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_live_generate_without_compile() {
    if std::env::var("E2E_ENABLED").is_err() || std::env::var("ANTHROPIC_API_KEY").is_err() {
        println!("SKIP — set E2E_ENABLED=1 and ANTHROPIC_API_KEY to run live tests");
        return;
    }
    let content = sample_content();
    let out = TempDir::new().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    struct Counting(Arc<AtomicUsize>);
    impl ReportProgressCallback for Counting {
        fn on_stage_complete(&self, _stage: Stage, _detail: &str) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let config = ReportConfig::builder()
        .content_dir(content.path())
        .output_dir(out.path())
        .compile(false)
        .progress_callback(Arc::new(Counting(calls.clone())))
        .build()
        .unwrap();

    let outcome = generate_report(&config).await.unwrap();
    assert!(outcome.success, "{:?}", outcome.error);
    let doc = std::fs::read_to_string(config.tex_path()).unwrap();
    assert!(doc.contains("\\begin{document}"));
    assert!(calls.load(Ordering::SeqCst) >= 3);
}
