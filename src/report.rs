//! Report orchestration: load content, generate, write, compile.
//!
//! ## Why a separate orchestrator?
//!
//! [`LatexGenerator`] only talks to the LLM. This module owns everything with
//! side effects on disk (writing the `.tex`, running the engine) and turns
//! the whole run into one [`ReportOutcome`]. The orchestrator never
//! self-corrects on its own; [`compile_with_self_correction`] is the opt-in
//! loop for callers that want compiler-confirmed fixes.

use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::generator::LatexGenerator;
use crate::output::{CompileOutcome, ReportOutcome};
use crate::pipeline::compile::{DocumentCompiler, LatexCompiler};
use crate::pipeline::content::ContentLoader;
use crate::progress::{ProgressCallback, Stage};
use crate::request::GenerationRequest;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Generate, write and (optionally) compile a report.
///
/// # Errors
/// Returns `Err(ReportError)` only when no generator can be constructed
/// (missing credential, unknown provider). Every later failure is reported
/// through `ReportOutcome { success: false, error: Some(..), .. }`.
pub async fn generate_report(config: &ReportConfig) -> Result<ReportOutcome, ReportError> {
    let generator = LatexGenerator::from_config(config)?;
    let compiler = LatexCompiler::new(&config.latex_engine, config.compile_passes);
    Ok(generate_report_with(config, &generator, &compiler).await)
}

/// Synchronous wrapper around [`generate_report`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_report_sync(config: &ReportConfig) -> Result<ReportOutcome, ReportError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ReportError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate_report(config))
}

/// Run the pipeline with an explicit generator and compiler.
pub async fn generate_report_with(
    config: &ReportConfig,
    generator: &LatexGenerator,
    compiler: &dyn DocumentCompiler,
) -> ReportOutcome {
    let total_start = Instant::now();
    let progress = config.progress_callback.as_ref();
    info!("Starting report: '{}'", config.title);

    // ── Step 1: Load content ─────────────────────────────────────────────
    stage_start(progress, Stage::LoadContent);
    let content = ContentLoader::new(&config.content_dir).load();
    stage_complete(
        progress,
        Stage::LoadContent,
        &format!(
            "{} sections, {} tables, {} figures",
            content.sections.len(),
            content.tables.len(),
            content.figures.len()
        ),
    );

    // ── Step 2: Build request ────────────────────────────────────────────
    let request = GenerationRequest::builder(&config.title, &config.author)
        .sections(content.sections)
        .tables(content.tables)
        .figures(content.figures)
        .requirements(config.effective_requirements())
        .build();

    // ── Step 3: Generate (+ validate) ────────────────────────────────────
    stage_start(progress, Stage::Generate);
    let generation = generator.generate(&request, config.validate).await;
    if !generation.success {
        let message = generation
            .error_message
            .clone()
            .unwrap_or_else(|| "Generation failed".to_string());
        stage_error(progress, Stage::Generate, &message);
        warn!("Generation failed: {}", message);
        return ReportOutcome {
            success: false,
            error: Some(message),
            generation,
            ..Default::default()
        };
    }
    stage_complete(
        progress,
        Stage::Generate,
        &format!("{} characters", generation.document.chars().count()),
    );

    // ── Step 4: Write ────────────────────────────────────────────────────
    let tex_path = config.tex_path();
    stage_start(progress, Stage::Write);
    if let Err(e) = write_document(&tex_path, &generation.document).await {
        let message = e.to_string();
        stage_error(progress, Stage::Write, &message);
        warn!("{}", message);
        return ReportOutcome {
            success: false,
            error: Some(message),
            generation,
            ..Default::default()
        };
    }
    stage_complete(progress, Stage::Write, &tex_path.display().to_string());
    info!("LaTeX written to {}", tex_path.display());

    // ── Step 5: Compile ──────────────────────────────────────────────────
    if !config.compile {
        info!(
            "Compilation disabled; report finished in {}ms",
            total_start.elapsed().as_millis()
        );
        return ReportOutcome {
            success: true,
            tex_path: Some(tex_path),
            generation,
            ..Default::default()
        };
    }

    let compilation = if config.self_correct_rounds > 0 {
        compile_with_self_correction(
            generator,
            compiler,
            &tex_path,
            &generation.document,
            config.self_correct_rounds,
            config.max_correction_attempts,
            progress,
        )
        .await
    } else {
        compile_once(compiler, &tex_path, progress).await
    };

    info!(
        "Report finished in {}ms (compiled: {})",
        total_start.elapsed().as_millis(),
        compilation.success
    );

    ReportOutcome {
        success: compilation.success,
        pdf_path: compilation.pdf_path.clone(),
        error: (!compilation.success).then(|| compilation.message.clone()),
        tex_path: Some(tex_path),
        generation,
        compilation: Some(compilation),
    }
}

/// Compile `tex_path`; on failure ask the generator to repair the document
/// from the compiler output, rewrite the file and compile again.
///
/// At most `rounds` repair rounds of `attempts` LLM calls each. Returns the
/// last compilation outcome. A round whose correction is rejected ends the
/// loop: the next compile would see the same file.
pub async fn compile_with_self_correction(
    generator: &LatexGenerator,
    compiler: &dyn DocumentCompiler,
    tex_path: &Path,
    document: &str,
    rounds: u32,
    attempts: u32,
    progress: Option<&ProgressCallback>,
) -> CompileOutcome {
    let mut current = document.to_string();
    let mut outcome = compile_once(compiler, tex_path, progress).await;

    for round in 1..=rounds {
        if outcome.success {
            break;
        }
        info!("Correction round {}/{}", round, rounds);
        stage_start(progress, Stage::Correct);

        let correction = generator
            .self_correct(&current, &outcome.message, attempts)
            .await;
        if !correction.success {
            stage_error(progress, Stage::Correct, "no acceptable correction");
            break;
        }
        stage_complete(progress, Stage::Correct, &correction.fixes.join("; "));

        current = correction.document;
        if let Err(e) = write_document(tex_path, &current).await {
            warn!("{}", e);
            return CompileOutcome {
                success: false,
                message: e.to_string(),
                pdf_path: None,
            };
        }
        outcome = compile_once(compiler, tex_path, progress).await;
    }
    outcome
}

async fn compile_once(
    compiler: &dyn DocumentCompiler,
    tex_path: &Path,
    progress: Option<&ProgressCallback>,
) -> CompileOutcome {
    stage_start(progress, Stage::Compile);
    let outcome = compiler.compile(tex_path).await;
    if outcome.success {
        stage_complete(progress, Stage::Compile, &outcome.message);
    } else {
        stage_error(progress, Stage::Compile, &outcome.message);
    }
    outcome
}

/// Write `document` to `path`, creating the parent directory.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn write_document(path: &Path, document: &str) -> Result<(), ReportError> {
    let fail = |source| ReportError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(fail)?;
    }

    let tmp_path: PathBuf = path.with_extension("tex.tmp");
    tokio::fs::write(&tmp_path, document).await.map_err(fail)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(fail)?;
    debug!("Wrote {} bytes to {}", document.len(), path.display());
    Ok(())
}

fn stage_start(progress: Option<&ProgressCallback>, stage: Stage) {
    if let Some(cb) = progress {
        cb.on_stage_start(stage);
    }
}

fn stage_complete(progress: Option<&ProgressCallback>, stage: Stage, detail: &str) {
    if let Some(cb) = progress {
        cb.on_stage_complete(stage, detail);
    }
}

fn stage_error(progress: Option<&ProgressCallback>, stage: Stage, error: &str) {
    if let Some(cb) = progress {
        cb.on_stage_error(stage, error);
    }
}
