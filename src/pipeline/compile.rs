//! The compilation collaborator: turn a `.tex` file into a PDF.
//!
//! Compilation is delegated to a LaTeX engine subprocess. The library only
//! needs a yes/no answer plus diagnostic text that can be fed back into
//! [`crate::generator::LatexGenerator::self_correct`], so the boundary is the
//! small [`DocumentCompiler`] trait and tests can substitute a fake.

use crate::output::CompileOutcome;
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Lines of context kept after each `!` error line.
const ERROR_CONTEXT_LINES: usize = 2;

/// Lines of raw output kept when no `!` error line is found.
const TAIL_LINES: usize = 20;

/// Compiles a markup file and reports the result.
#[async_trait]
pub trait DocumentCompiler: Send + Sync {
    /// Compile `tex_path`. Never fails: every problem is a failed outcome.
    async fn compile(&self, tex_path: &Path) -> CompileOutcome;
}

/// Runs `pdflatex` (or another engine with the same CLI).
///
/// The engine runs in the caller's working directory with
/// `-output-directory` set to the file's directory, so relative figure paths
/// in the document resolve the same way they did when content was loaded.
#[derive(Debug, Clone)]
pub struct LatexCompiler {
    engine: String,
    passes: u32,
}

impl Default for LatexCompiler {
    fn default() -> Self {
        Self::new("pdflatex", 2)
    }
}

impl LatexCompiler {
    pub fn new(engine: impl Into<String>, passes: u32) -> Self {
        Self {
            engine: engine.into(),
            passes: passes.max(1),
        }
    }

    async fn run_once(&self, tex_path: &Path, out_dir: &Path) -> Result<(), String> {
        let output = Command::new(&self.engine)
            .arg("-interaction=nonstopmode")
            .arg("-halt-on-error")
            .arg("-output-directory")
            .arg(out_dir)
            .arg(tex_path)
            .output()
            .await
            .map_err(|e| format!("failed to launch {}: {}", self.engine, e))?;

        if output.status.success() {
            return Ok(());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let combined = format!("{stdout}\n{stderr}");
        Err(summarise_log(&combined))
    }
}

#[async_trait]
impl DocumentCompiler for LatexCompiler {
    async fn compile(&self, tex_path: &Path) -> CompileOutcome {
        if !tex_path.exists() {
            return CompileOutcome {
                success: false,
                message: format!("LaTeX file not found: {}", tex_path.display()),
                pdf_path: None,
            };
        }

        let out_dir = match tex_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => std::path::PathBuf::from("."),
        };
        let pdf_path = tex_path.with_extension("pdf");

        for pass in 1..=self.passes {
            debug!("{} pass {}/{} on {}", self.engine, pass, self.passes, tex_path.display());
            if let Err(message) = self.run_once(tex_path, &out_dir).await {
                warn!("Compilation failed on pass {}: {}", pass, first_line(&message));
                return CompileOutcome {
                    success: false,
                    message,
                    pdf_path: None,
                };
            }
        }

        if !pdf_path.exists() {
            return CompileOutcome {
                success: false,
                message: format!(
                    "{} reported success but {} was not produced",
                    self.engine,
                    pdf_path.display()
                ),
                pdf_path: None,
            };
        }

        info!("Compiled {}", pdf_path.display());
        CompileOutcome {
            success: true,
            message: format!("PDF generated: {}", pdf_path.display()),
            pdf_path: Some(pdf_path),
        }
    }
}

/// Reduce an engine log to what a human (or an LLM) needs to fix the error:
/// every `!` line plus a little context, or the tail of the log when no such
/// line exists.
pub fn summarise_log(log: &str) -> String {
    let lines: Vec<&str> = log.lines().collect();
    let mut picked: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if lines[i].starts_with('!') {
            let end = (i + 1 + ERROR_CONTEXT_LINES).min(lines.len());
            picked.extend_from_slice(&lines[i..end]);
            i = end;
        } else {
            i += 1;
        }
    }

    if picked.is_empty() {
        let non_empty: Vec<&str> = lines.into_iter().filter(|l| !l.trim().is_empty()).collect();
        let start = non_empty.len().saturating_sub(TAIL_LINES);
        return non_empty[start..].join("\n");
    }
    picked.join("\n")
}

fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or("")
}
