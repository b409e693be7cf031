//! Structural sanity checks on LLM-corrected documents.
//!
//! The corrector is a stochastic collaborator: it may return a truncated
//! document, an apology, or LaTeX with an environment left open. Every
//! correction entry point runs its candidate through one [`Acceptance`]
//! predicate and keeps the original when the check fails. The three entry
//! points differ only in which checks they enable.

use std::fmt;

pub const BEGIN_DOCUMENT: &str = "\\begin{document}";
pub const END_DOCUMENT: &str = "\\end{document}";

/// Why a candidate was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Empty,
    /// Lengths are in characters.
    TooShort { candidate: usize, original: usize },
    UnbalancedEnvironments { begins: usize, ends: usize },
    MissingDocumentMarkers,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Empty => write!(f, "reply contained no document"),
            Rejection::TooShort {
                candidate,
                original,
            } => write!(
                f,
                "candidate is {candidate} chars, less than half of the original {original}"
            ),
            Rejection::UnbalancedEnvironments { begins, ends } => {
                write!(f, "unmatched environments ({begins} \\begin vs {ends} \\end)")
            }
            Rejection::MissingDocumentMarkers => {
                write!(f, "missing \\begin{{document}} or \\end{{document}}")
            }
        }
    }
}

/// Acceptance predicate over `(original, candidate)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Acceptance {
    /// Candidate must be at least this fraction of the original's length.
    pub min_length_ratio: f64,
    pub require_balanced_environments: bool,
    pub require_document_markers: bool,
}

impl Acceptance {
    /// Non-empty and not drastically shorter. Used by the validation pass.
    pub const fn length_only() -> Self {
        Self {
            min_length_ratio: 0.5,
            require_balanced_environments: false,
            require_document_markers: false,
        }
    }

    /// Length plus both document markers. Used by compiler self-correction.
    pub const fn structural() -> Self {
        Self {
            require_document_markers: true,
            ..Self::length_only()
        }
    }

    /// Every check. Used for externally requested fixes.
    pub const fn strict() -> Self {
        Self {
            require_balanced_environments: true,
            ..Self::structural()
        }
    }

    /// Check `candidate` against `original`.
    pub fn check(&self, original: &str, candidate: &str) -> Result<(), Rejection> {
        if candidate.trim().is_empty() {
            return Err(Rejection::Empty);
        }

        let original_len = original.chars().count();
        let candidate_len = candidate.chars().count();
        if (candidate_len as f64) < original_len as f64 * self.min_length_ratio {
            return Err(Rejection::TooShort {
                candidate: candidate_len,
                original: original_len,
            });
        }

        if self.require_balanced_environments {
            let begins = candidate.matches("\\begin{").count();
            let ends = candidate.matches("\\end{").count();
            if begins != ends {
                return Err(Rejection::UnbalancedEnvironments { begins, ends });
            }
        }

        if self.require_document_markers && !has_document_markers(candidate) {
            return Err(Rejection::MissingDocumentMarkers);
        }

        Ok(())
    }
}

/// Both `\begin{document}` and `\end{document}` are present.
pub fn has_document_markers(doc: &str) -> bool {
    doc.contains(BEGIN_DOCUMENT) && doc.contains(END_DOCUMENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "\\documentclass{article}\n\\begin{document}\n\\begin{itemize}\\item x\\end{itemize}\n\\end{document}";

    #[test]
    fn identical_document_accepted_by_all() {
        for a in [Acceptance::length_only(), Acceptance::structural(), Acceptance::strict()] {
            assert_eq!(a.check(DOC, DOC), Ok(()));
        }
    }

    #[test]
    fn empty_rejected() {
        assert_eq!(Acceptance::length_only().check(DOC, "  \n"), Err(Rejection::Empty));
    }

    #[test]
    fn half_length_boundary() {
        let original = "a".repeat(100);
        assert!(Acceptance::length_only().check(&original, &"b".repeat(50)).is_ok());
        assert_eq!(
            Acceptance::length_only().check(&original, &"b".repeat(49)),
            Err(Rejection::TooShort {
                candidate: 49,
                original: 100
            })
        );
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let original = "é".repeat(10);
        assert!(Acceptance::length_only().check(&original, "abcde").is_ok());
    }

    #[test]
    fn structural_requires_markers() {
        let candidate = DOC.replace(END_DOCUMENT, "");
        assert_eq!(
            Acceptance::structural().check(DOC, &candidate),
            Err(Rejection::MissingDocumentMarkers)
        );
    }

    #[test]
    fn strict_requires_balance() {
        let candidate = DOC.replace("\\end{itemize}", "");
        assert_eq!(
            Acceptance::strict().check(DOC, &candidate),
            Err(Rejection::UnbalancedEnvironments { begins: 2, ends: 1 })
        );
        assert!(Acceptance::structural().check(DOC, &candidate).is_ok());
    }

    #[test]
    fn rejection_messages_are_readable() {
        assert!(Rejection::MissingDocumentMarkers
            .to_string()
            .contains("\\end{document}"));
        assert!(Rejection::UnbalancedEnvironments { begins: 3, ends: 2 }
            .to_string()
            .contains("3"));
    }
}
