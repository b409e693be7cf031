//! Content loading: read sections, tables and figures from a fixed layout.
//!
//! ```text
//! <content_dir>/
//!   introduction.md  methodology.md  research_areas.md
//!   detailed_results.md  results.md  conclusion.md
//!   data/model_performance.csv  data/training_metrics.csv
//!   images/*.png *.jpg *.jpeg *.pdf
//! ```
//!
//! Nothing here fails: a missing, empty or unreadable file simply omits that
//! item from the result. The LLM can write a sensible document from whatever
//! subset exists, so a partial content directory is not an error.

use crate::request::{Figure, Section, Table};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Markdown files read as sections, in document order, with their titles.
pub const SECTION_FILES: &[(&str, &str)] = &[
    ("introduction.md", "Introduction"),
    ("methodology.md", "Methodology"),
    ("research_areas.md", "Research Areas"),
    ("detailed_results.md", "Detailed Results"),
    ("results.md", "Results Discussion"),
    ("conclusion.md", "Conclusion"),
];

/// Image extensions discovered in `images/`, scanned in this order.
pub const FIGURE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "pdf"];

/// Data rows kept from the training-metrics table.
pub const TRAINING_METRICS_ROWS: usize = 5;

/// Everything loaded from one content directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedContent {
    pub sections: Vec<Section>,
    pub tables: Vec<Table>,
    pub figures: Vec<Figure>,
}

/// Reads report content from a base directory.
#[derive(Debug, Clone)]
pub struct ContentLoader {
    content_dir: PathBuf,
}

impl ContentLoader {
    pub fn new(content_dir: impl Into<PathBuf>) -> Self {
        Self {
            content_dir: content_dir.into(),
        }
    }

    pub fn content_dir(&self) -> &Path {
        &self.content_dir
    }

    pub fn data_dir(&self) -> PathBuf {
        self.content_dir.join("data")
    }

    pub fn images_dir(&self) -> PathBuf {
        self.content_dir.join("images")
    }

    /// Load sections, tables and figures in one go.
    pub fn load(&self) -> LoadedContent {
        LoadedContent {
            sections: self.load_sections(),
            tables: self.load_tables(),
            figures: self.load_figures(),
        }
    }

    /// Read the fixed list of markdown files, skipping absent or empty ones.
    pub fn load_sections(&self) -> Vec<Section> {
        SECTION_FILES
            .iter()
            .filter_map(|(file, title)| {
                let content = read_optional(&self.content_dir.join(file))?;
                if content.is_empty() {
                    debug!("Skipping empty section file {}", file);
                    return None;
                }
                Some(Section::markdown(*title, content))
            })
            .collect()
    }

    /// Load the model-performance table (all rows) and the training-metrics
    /// table (header + first five data rows).
    pub fn load_tables(&self) -> Vec<Table> {
        let data_dir = self.data_dir();
        let mut tables = Vec::new();

        if let Some(rows) = read_csv(&data_dir.join("model_performance.csv")) {
            if !rows.is_empty() {
                tables.push(Table::booktabs("Model Performance Comparison", rows));
            }
        }

        if let Some(rows) = read_csv(&data_dir.join("training_metrics.csv")) {
            if rows.len() > 1 {
                tables.push(Table::booktabs(
                    "Training Progression (First 5 Epochs)",
                    limit_rows(rows, TRAINING_METRICS_ROWS),
                ));
            }
        }

        tables
    }

    /// Discover image files and derive a caption from each file name.
    pub fn load_figures(&self) -> Vec<Figure> {
        let images_dir = self.images_dir();
        let entries: Vec<PathBuf> = match std::fs::read_dir(&images_dir) {
            Ok(rd) => rd
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.is_file())
                .collect(),
            Err(_) => {
                debug!("No images directory at {}", images_dir.display());
                return Vec::new();
            }
        };

        let mut figures = Vec::new();
        for ext in FIGURE_EXTENSIONS {
            let mut matching: Vec<&PathBuf> = entries
                .iter()
                .filter(|p| p.extension().and_then(|e| e.to_str()) == Some(*ext))
                .collect();
            matching.sort();
            for path in matching {
                let stem = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                figures.push(Figure::new(path.clone(), caption_from_stem(&stem)));
            }
        }
        figures
    }
}

/// Keep the header row plus at most `data_rows` rows after it.
pub fn limit_rows(mut rows: Vec<Vec<String>>, data_rows: usize) -> Vec<Vec<String>> {
    rows.truncate(data_rows + 1);
    rows
}

static RE_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[_\-]+").unwrap());

/// `attention_heat-map` → `Attention Heat Map`.
///
/// Title-casing follows the usual rule: the first letter of every run of
/// letters is upper-cased and the rest lower-cased, so `fig2a` becomes
/// `Fig2A`.
pub fn caption_from_stem(stem: &str) -> String {
    let spaced = RE_SEPARATORS.replace_all(stem, " ");
    let mut out = String::with_capacity(spaced.len());
    let mut prev_is_letter = false;
    for c in spaced.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}

fn read_optional(path: &Path) -> Option<String> {
    if !path.exists() {
        return None;
    }
    match std::fs::read_to_string(path) {
        Ok(s) => Some(s),
        Err(e) => {
            warn!("Could not read {}: {}", path.display(), e);
            None
        }
    }
}

fn read_csv(path: &Path) -> Option<Vec<Vec<String>>> {
    if !path.exists() {
        return None;
    }
    let mut reader = match csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
    {
        Ok(r) => r,
        Err(e) => {
            warn!("Could not open {}: {}", path.display(), e);
            return None;
        }
    };

    let mut rows = Vec::new();
    for record in reader.records() {
        match record {
            Ok(r) => rows.push(r.iter().map(str::to_string).collect()),
            Err(e) => {
                warn!("Skipping malformed CSV {}: {}", path.display(), e);
                return None;
            }
        }
    }
    Some(rows)
}
