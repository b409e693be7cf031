//! CLI binary for edgequake-texgen.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ReportConfig` and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_texgen::{
    generate_report, write_document, DocumentCompiler, LatexCompiler, LatexGenerator,
    ProgressCallback, ReportConfig, ReportConfigBuilder, ReportOutcome, ReportProgressCallback,
    Stage, DEFAULT_MODEL,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one spinner for the running stage, one log
/// line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
    started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            started: Mutex::new(None),
        })
    }

    fn stage_elapsed(&self) -> String {
        let secs = self
            .started
            .lock()
            .ok()
            .and_then(|mut s| s.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        format!("{secs:.1}s")
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ReportProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        if let Ok(mut s) = self.started.lock() {
            *s = Some(Instant::now());
        }
        self.bar.set_prefix(stage.to_string());
        self.bar.set_message("…");
    }

    fn on_stage_complete(&self, stage: Stage, detail: &str) {
        let elapsed = self.stage_elapsed();
        self.bar.println(format!(
            "  {} {:<18} {}  {}",
            green("✓"),
            stage.to_string(),
            dim(detail),
            dim(&elapsed),
        ));
    }

    fn on_stage_error(&self, stage: Stage, error: &str) {
        let elapsed = self.stage_elapsed();
        let first = error.lines().next().unwrap_or("");
        // Truncate very long error messages to keep output tidy.
        let msg = if first.chars().count() > 80 {
            format!("{}\u{2026}", first.chars().take(79).collect::<String>())
        } else {
            first.to_string()
        };
        self.bar.println(format!(
            "  {} {:<18} {}  {}",
            red("✗"),
            stage.to_string(),
            red(&msg),
            dim(&elapsed),
        ));
    }

    fn on_attempt(&self, attempt: u32, max_attempts: u32) {
        self.bar.set_message(format!("attempt {attempt}/{max_attempts}"));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Generate from the default content directory
  texgen generate

  # Custom content and output, no compilation
  texgen generate --content-dir notes/ --output-dir build/ --no-compile

  # Compile and let the model repair compiler errors (up to 2 rounds)
  texgen generate --self-correct-rounds 2

  # Apply reviewer feedback to an existing document
  texgen fix build/research_report.tex --issue "Missing page numbers" --issue "Tight margins"

  # Repair a document from a saved compiler log
  texgen correct build/research_report.tex --error-log build/research_report.log

  # Use another provider
  texgen --provider openai --model gpt-4.1 generate

CONTENT DIRECTORY LAYOUT:
  introduction.md, methodology.md, research_areas.md,
  detailed_results.md, results.md, conclusion.md
  data/model_performance.csv, data/training_metrics.csv
  images/*.png|jpg|jpeg|pdf

ENVIRONMENT VARIABLES:
  ANTHROPIC_API_KEY       Anthropic API key (default provider)
  OPENAI_API_KEY          OpenAI API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_PROVIDER      Override provider (anthropic, openai, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  RUST_LOG                Override log filter
"#;

/// Generate LaTeX research reports with an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "texgen",
    version,
    about = "Generate LaTeX research reports from markdown, CSV and figures using LLMs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// LLM model ID.
    #[arg(long, global = true, env = "EDGEQUAKE_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// LLM provider: anthropic, openai, gemini, ollama, …
    #[arg(long, global = true, env = "EDGEQUAKE_PROVIDER", default_value = "anthropic")]
    provider: String,

    /// API key for anthropic, openai or gemini. Prefer the provider's env var.
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Max LLM output tokens per call.
    #[arg(long, global = true, env = "TEXGEN_MAX_TOKENS", default_value_t = 8000)]
    max_tokens: usize,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "TEXGEN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "TEXGEN_QUIET")]
    quiet: bool,

    /// Disable the progress spinner.
    #[arg(long, global = true, env = "TEXGEN_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a report from a content directory.
    Generate(GenerateArgs),
    /// Apply externally reported issues to an existing document.
    Fix(FixArgs),
    /// Repair a document that fails to compile.
    Correct(CorrectArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Directory with the markdown sections, data/ and images/.
    #[arg(long, env = "TEXGEN_CONTENT_DIR", default_value = "artifacts/sample_content")]
    content_dir: PathBuf,

    /// Directory the .tex and .pdf are written to.
    #[arg(short, long, env = "TEXGEN_OUTPUT_DIR", default_value = "artifacts/output")]
    output_dir: PathBuf,

    /// Output file name (must end in .tex).
    #[arg(long, env = "TEXGEN_OUTPUT_FILE", default_value = "research_report.tex")]
    output_file: String,

    #[arg(long, env = "TEXGEN_TITLE")]
    title: Option<String>,

    #[arg(long, env = "TEXGEN_AUTHOR")]
    author: Option<String>,

    /// Replace the default requirements (repeatable).
    #[arg(long = "require", value_name = "TEXT")]
    requirements: Vec<String>,

    /// File with learned formatting patterns, appended to the requirements.
    #[arg(long, env = "TEXGEN_PATTERNS")]
    patterns: Option<PathBuf>,

    /// Skip the validation pass.
    #[arg(long)]
    no_validate: bool,

    /// Write the .tex only; do not run the LaTeX engine.
    #[arg(long)]
    no_compile: bool,

    /// Compile → correct → recompile rounds after a failed compilation.
    #[arg(long, env = "TEXGEN_SELF_CORRECT_ROUNDS", default_value_t = 0)]
    self_correct_rounds: u32,

    /// LLM attempts per correction round.
    #[arg(long, default_value_t = 3)]
    max_attempts: u32,

    /// LaTeX engine executable.
    #[arg(long, env = "TEXGEN_ENGINE", default_value = "pdflatex")]
    engine: String,

    /// Print the run outcome as JSON on stdout.
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct FixArgs {
    /// LaTeX file to fix.
    tex: PathBuf,

    /// Issue to fix (repeatable).
    #[arg(long = "issue", value_name = "TEXT")]
    issues: Vec<String>,

    /// File with one issue per line.
    #[arg(long)]
    issues_file: Option<PathBuf>,

    /// Write the fixed document here instead of overwriting the input.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CorrectArgs {
    /// LaTeX file to repair.
    tex: PathBuf,

    /// Compiler output to repair against. Compiles the file when omitted.
    #[arg(long)]
    error_log: Option<PathBuf>,

    #[arg(long, default_value_t = 3)]
    max_attempts: u32,

    /// LaTeX engine used when no error log is given.
    #[arg(long, env = "TEXGEN_ENGINE", default_value = "pdflatex")]
    engine: String,

    /// Write the corrected document here instead of overwriting the input.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the spinner is active;
    // the spinner provides all the feedback that matters to the user.
    let json = matches!(cli.command, Command::Generate(ref g) if g.json);
    let show_progress = !cli.quiet && !cli.no_progress && !json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let spinner = show_progress.then(CliProgressCallback::new);
    let progress: Option<ProgressCallback> = spinner
        .clone()
        .map(|cb| cb as Arc<dyn ReportProgressCallback>);

    let result = match cli.command {
        Command::Generate(ref args) => run_generate(&cli, args, progress).await,
        Command::Fix(ref args) => run_fix(&cli, args, progress).await,
        Command::Correct(ref args) => run_correct(&cli, args, progress).await,
    };

    if let Some(cb) = spinner {
        cb.finish();
    }
    if !result? {
        std::process::exit(1);
    }
    Ok(())
}

/// Global flags shared by every subcommand.
fn base_config(cli: &Cli, progress: Option<ProgressCallback>) -> ReportConfigBuilder {
    let mut builder = ReportConfig::builder()
        .model(&cli.model)
        .provider_name(&cli.provider)
        .max_tokens(cli.max_tokens);
    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    builder
}

async fn run_generate(
    cli: &Cli,
    args: &GenerateArgs,
    progress: Option<ProgressCallback>,
) -> Result<bool> {
    let mut builder = base_config(cli, progress)
        .content_dir(&args.content_dir)
        .output_dir(&args.output_dir)
        .output_filename(&args.output_file)
        .validate(!args.no_validate)
        .compile(!args.no_compile)
        .latex_engine(&args.engine)
        .self_correct_rounds(args.self_correct_rounds)
        .max_correction_attempts(args.max_attempts);

    if let Some(ref t) = args.title {
        builder = builder.title(t);
    }
    if let Some(ref a) = args.author {
        builder = builder.author(a);
    }
    if !args.requirements.is_empty() {
        builder = builder.requirements(args.requirements.clone());
    }
    if let Some(ref path) = args.patterns {
        let patterns = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read patterns from {:?}", path))?;
        builder = builder.pattern_context(patterns);
    }

    let config = builder.build().context("Invalid configuration")?;
    let start = Instant::now();
    let outcome = generate_report(&config)
        .await
        .context("Report generation failed")?;

    if args.json {
        let json = serde_json::to_string_pretty(&outcome).context("Failed to serialise outcome")?;
        println!("{json}");
    } else if !cli.quiet {
        print_summary(&outcome, start.elapsed());
    }

    Ok(outcome.success)
}

fn print_summary(outcome: &ReportOutcome, elapsed: Duration) {
    let g = &outcome.generation;
    for w in &g.warnings {
        eprintln!("  {} {}", cyan("⚠"), w);
    }
    for i in &g.improvements {
        eprintln!("  {} {}", green("+"), i);
    }

    if outcome.success {
        let target = outcome
            .pdf_path
            .as_ref()
            .or(outcome.tex_path.as_ref())
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        eprintln!(
            "{}  {} chars  {:.1}s  →  {}",
            green("✔"),
            g.document.chars().count(),
            elapsed.as_secs_f64(),
            bold(&target),
        );
    } else {
        eprintln!(
            "{}  {}",
            red("✘"),
            outcome.error.as_deref().unwrap_or("report generation failed")
        );
        if let Some(ref tex) = outcome.tex_path {
            eprintln!("   LaTeX kept at {}", dim(&tex.display().to_string()));
        }
    }
}

async fn run_fix(cli: &Cli, args: &FixArgs, progress: Option<ProgressCallback>) -> Result<bool> {
    let mut issues = args.issues.clone();
    if let Some(ref path) = args.issues_file {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read issues from {:?}", path))?;
        issues.extend(
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
        );
    }
    if issues.is_empty() {
        anyhow::bail!("No issues given: use --issue or --issues-file");
    }

    let document = read_tex(&args.tex).await?;
    let config = base_config(cli, progress.clone())
        .build()
        .context("Invalid configuration")?;
    let generator = LatexGenerator::from_config(&config)?;

    stage(&progress, Stage::Correct, None);
    let outcome = generator.apply_external_feedback(&document, &issues).await;
    if !outcome.success {
        stage(&progress, Stage::Correct, Some(Err("fix rejected, document unchanged")));
        anyhow::bail!("No acceptable fix returned; {} left unchanged", args.tex.display());
    }
    stage(&progress, Stage::Correct, Some(Ok(outcome.fixes.join("; ").as_str())));

    let target = args.output.as_deref().unwrap_or(&args.tex);
    write_document(target, &outcome.document).await?;
    if !cli.quiet {
        eprintln!("{}  {}", green("✔"), bold(&target.display().to_string()));
    }
    Ok(true)
}

async fn run_correct(
    cli: &Cli,
    args: &CorrectArgs,
    progress: Option<ProgressCallback>,
) -> Result<bool> {
    let document = read_tex(&args.tex).await?;

    let error_text = match args.error_log {
        Some(ref path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read error log from {:?}", path))?,
        None => {
            stage(&progress, Stage::Compile, None);
            let compiled = LatexCompiler::new(&args.engine, 1).compile(&args.tex).await;
            if compiled.success {
                stage(&progress, Stage::Compile, Some(Ok(compiled.message.as_str())));
                if !cli.quiet {
                    eprintln!("{}  {} already compiles", green("✔"), args.tex.display());
                }
                return Ok(true);
            }
            stage(&progress, Stage::Compile, Some(Err(compiled.message.as_str())));
            compiled.message
        }
    };

    let config = base_config(cli, progress.clone())
        .build()
        .context("Invalid configuration")?;
    let generator = LatexGenerator::from_config(&config)?;

    stage(&progress, Stage::Correct, None);
    let outcome = generator
        .self_correct(&document, &error_text, args.max_attempts)
        .await;
    if !outcome.success {
        stage(&progress, Stage::Correct, Some(Err("no acceptable correction")));
        anyhow::bail!(
            "Self-correction failed after {} attempts; {} left unchanged",
            args.max_attempts,
            args.tex.display()
        );
    }
    stage(&progress, Stage::Correct, Some(Ok(outcome.fixes.join("; ").as_str())));

    let target = args.output.as_deref().unwrap_or(&args.tex);
    write_document(target, &outcome.document).await?;
    if !cli.quiet {
        eprintln!("{}  {}", green("✔"), bold(&target.display().to_string()));
    }
    Ok(true)
}

async fn read_tex(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {:?}", path))
}

/// Fire a stage event: `None` = start, `Some(Ok)` = complete, `Some(Err)` = error.
fn stage(progress: &Option<ProgressCallback>, stage: Stage, event: Option<Result<&str, &str>>) {
    let Some(cb) = progress else {
        return;
    };
    match event {
        None => cb.on_stage_start(stage),
        Some(Ok(detail)) => cb.on_stage_complete(stage, detail),
        Some(Err(error)) => cb.on_stage_error(stage, error),
    }
}
