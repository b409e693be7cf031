//! The generation request: everything the LLM needs to write one document.
//!
//! Sections, tables and figures are plain data with no identity beyond their
//! position. A [`GenerationRequest`] is assembled once per run through
//! [`GenerationRequestBuilder`] and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default display width for figures, in LaTeX length syntax.
pub const DEFAULT_FIGURE_WIDTH: &str = "0.8\\textwidth";

/// Origin format of a section body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    #[default]
    Markdown,
}

/// One titled block of body text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: SectionKind,
}

impl Section {
    pub fn markdown(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            kind: SectionKind::Markdown,
        }
    }
}

/// Table style the LLM is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    #[default]
    Booktabs,
}

/// A captioned grid of cell text. The first row is the header by convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub caption: String,
    #[serde(rename = "data")]
    pub rows: Vec<Vec<String>>,
    pub format: TableFormat,
}

impl Table {
    pub fn booktabs(caption: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            caption: caption.into(),
            rows,
            format: TableFormat::Booktabs,
        }
    }
}

/// An image file to include, with its caption and display width.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Figure {
    pub path: PathBuf,
    pub caption: String,
    pub width: String,
}

impl Figure {
    pub fn new(path: impl Into<PathBuf>, caption: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            caption: caption.into(),
            width: DEFAULT_FIGURE_WIDTH.to_string(),
        }
    }
}

/// Input to [`crate::generator::LatexGenerator::generate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub title: String,
    pub author: String,
    pub sections: Vec<Section>,
    pub tables: Vec<Table>,
    pub figures: Vec<Figure>,
    pub requirements: Vec<String>,
}

impl GenerationRequest {
    pub fn builder(title: impl Into<String>, author: impl Into<String>) -> GenerationRequestBuilder {
        GenerationRequestBuilder {
            request: GenerationRequest {
                title: title.into(),
                author: author.into(),
                ..Default::default()
            },
        }
    }
}

/// Builder for [`GenerationRequest`].
#[derive(Debug)]
pub struct GenerationRequestBuilder {
    request: GenerationRequest,
}

impl GenerationRequestBuilder {
    pub fn sections(mut self, sections: Vec<Section>) -> Self {
        self.request.sections = sections;
        self
    }

    pub fn section(mut self, section: Section) -> Self {
        self.request.sections.push(section);
        self
    }

    pub fn tables(mut self, tables: Vec<Table>) -> Self {
        self.request.tables = tables;
        self
    }

    pub fn figures(mut self, figures: Vec<Figure>) -> Self {
        self.request.figures = figures;
        self
    }

    pub fn requirements(mut self, requirements: Vec<String>) -> Self {
        self.request.requirements = requirements;
        self
    }

    pub fn requirement(mut self, requirement: impl Into<String>) -> Self {
        self.request.requirements.push(requirement.into());
        self
    }

    pub fn build(self) -> GenerationRequest {
        self.request
    }
}
