//! Prompts for LLM-based LaTeX generation and repair.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing what the model is told (a new
//!    forbidden package, another known compiler error) means editing one
//!    place.
//!
//! 2. **Testability** — prompts are pure functions of their inputs, so unit
//!    tests can inspect them without calling a real LLM.

use crate::request::GenerationRequest;
use std::fmt::Write as _;

/// Requirements line used when a request carries none.
pub const DEFAULT_REQUIREMENTS_TEXT: &str = "Standard research document formatting";

const GENERATION_PREAMBLE: &str = r#"You are an expert in producing LaTeX documents. Write a complete, professional LaTeX document from the material below.

**CRITICAL REQUIREMENTS:**
1. The output must be COMPLETE, VALID LaTeX that compiles without errors
2. Use ONLY packages shipped with a standard TeX Live installation
3. Escape EVERY special LaTeX character in the text (%, $, &, #, _, {, }, ~, ^)
4. Include the full document structure: preamble, \begin{document}, content, \end{document}
5. Keep spacing and formatting readable
6. Add a table of contents when there is more than one section
7. Add page numbers and a simple header/footer
"#;

const GENERATION_OUTPUT_INSTRUCTIONS: &str = r#"

**Output Instructions:**
Produce ONE complete LaTeX document laid out as follows:

1. Preamble with the required packages (standard packages only)
2. Title, author and date
3. \begin{document}
4. Title block via \maketitle
5. \tableofcontents when there are several sections
6. Every content section, formatted with \section / \subsection
7. Every table, typeset with booktabs rules
8. Every figure, included with \includegraphics
9. \end{document}

**IMPORTANT:**
- Escape special characters: % → \%, $ → \$, & → \&, # → \#, _ → \_, { → \{, } → \}
- Place tables and figures with [H] (package float) so they do not drift
- Load hyperref for clickable links, geometry for margins, fancyhdr for headers/footers

Reply with the raw LaTeX source ONLY: no explanations, no commentary, no markdown code fences."#;

/// Build the prompt for the first draft of a document.
///
/// Layout: role and hard requirements, document specification, summaries of
/// sections / tables / figures / requirements, then the verbatim content of
/// every section, the table data as JSON, the figure metadata, and finally
/// the output-format instructions. Table and figure detail blocks are
/// omitted when the request has none.
pub fn build_generation_prompt(request: &GenerationRequest) -> String {
    let mut p = String::with_capacity(
        4096 + request.sections.iter().map(|s| s.content.len()).sum::<usize>(),
    );
    p.push_str(GENERATION_PREAMBLE);

    let _ = write!(
        p,
        "\n**Document Specification:**\nTitle: {}\nAuthor: {}\n",
        request.title, request.author
    );

    p.push_str("\n**Content Sections:**\n");
    for s in &request.sections {
        let _ = writeln!(p, "- {}: {} characters", s.title, s.content.chars().count());
    }

    p.push_str("\n**Tables:**\n");
    if request.tables.is_empty() {
        p.push_str("No tables\n");
    } else {
        for t in &request.tables {
            let _ = writeln!(p, "- {}", t.caption);
        }
    }

    p.push_str("\n**Figures:**\n");
    if request.figures.is_empty() {
        p.push_str("No figures\n");
    } else {
        for f in &request.figures {
            let _ = writeln!(p, "- {}: {}", f.caption, f.path.display());
        }
    }

    p.push_str("\n**Special Requirements:**\n");
    if request.requirements.is_empty() {
        p.push_str(DEFAULT_REQUIREMENTS_TEXT);
        p.push('\n');
    } else {
        for r in &request.requirements {
            let _ = writeln!(p, "- {}", r);
        }
    }

    p.push_str("\n**Content Details:**\n");
    for (i, s) in request.sections.iter().enumerate() {
        let _ = write!(p, "\n\n--- Section {}: {} ---\n", i + 1, s.title);
        p.push_str(&s.content);
    }

    if !request.tables.is_empty() {
        p.push_str("\n\n**Table Data:**\n");
        for t in &request.tables {
            let data = serde_json::to_string(&t.rows).unwrap_or_else(|_| "[]".to_string());
            let _ = write!(p, "\nTable: {}\nData: {}\n", t.caption, data);
        }
    }

    if !request.figures.is_empty() {
        p.push_str("\n\n**Figure Information:**\n");
        for f in &request.figures {
            let _ = write!(
                p,
                "\nFigure: {}\nPath: {}\nWidth: {}\n",
                f.caption,
                f.path.display(),
                f.width
            );
        }
    }

    p.push_str(GENERATION_OUTPUT_INSTRUCTIONS);
    p
}

/// Build the prompt for the validation pass over a finished draft.
///
/// The reply is expected to open with `{"issues": [...]}` followed by the
/// corrected document.
pub fn build_validation_prompt(document: &str) -> String {
    format!(
        r#"You are a LaTeX syntax validator. Review the document below and repair anything that would stop it compiling or render it incorrectly.

**Document to Validate:**
```latex
{document}
```

**Checklist:**
1. Document structure is complete (\documentclass, \begin{{document}}, \end{{document}})
2. Every special character in running text is escaped
3. Every environment that is opened is closed
4. Every loaded package exists and is used correctly
5. No syntax errors
6. Math mode is used correctly
7. Figure and table references point at existing labels
8. No orphaned braces or brackets

**Your Task:**
1. Find every syntax error or problem
2. Fix them all while keeping the document's content and intent
3. Report what you found

**Output Format:**
First, the problems you found as JSON on a single line:
{{"issues": ["issue1", "issue2"]}}

Then the complete CORRECTED LaTeX document inside a ```latex fence."#
    )
}

/// Build the prompt asking for minimal fixes to externally reported issues
/// (for example from a visual review of the rendered PDF).
pub fn build_feedback_prompt(document: &str, issues: &[String]) -> String {
    let issues_text = issues
        .iter()
        .map(|i| format!("- {i}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a LaTeX document improvement specialist. Fix the specific quality issues listed below in this LaTeX document.

**Current Document:**
```latex
{document}
```

**Issues to Fix:**
{issues_text}

**Your Task:**
1. Read each issue carefully
2. Apply MINIMAL, SURGICAL changes that address each one
3. Do not break existing LaTeX syntax
4. Use ONLY standard packages that compile reliably
5. Make sure every environment is still opened and closed
6. Keep the overall document structure intact

**Typical Fixes:**
- Missing page numbers: set \fancyfoot[C]{{\thepage}}
- Missing table of contents: add \tableofcontents after \maketitle
- Spacing problems: use \setlength or \vspace (NOT the microtype package)
- Typography: adjust sizes with \large, \Large, etc.
- Header/footer problems: configure fancyhdr properly
- Line spacing: use \linespread{{}} or manual spacing

**Hard Rules:**
- Never add \usepackage after \begin{{document}}
- Never use packages that do not exist (such as longtabu)
- Never use the microtype package (it causes font expansion errors)
- Avoid the setspace package if it causes problems
- Keep ALL existing content
- Change formatting and structure only
- Prefer simple, reliable LaTeX commands

**This document is compiled immediately after your reply. It must compile cleanly.**

Reply with the COMPLETE CORRECTED LaTeX document only, without explanations."#
    )
}

/// Known compiler errors and the fix the model should apply.
pub const KNOWN_ERROR_FIXES: &[(&str, &str)] = &[
    (
        "auto expansion is only possible with scalable fonts",
        "REMOVE the microtype package entirely",
    ),
    (
        "File `X.sty' not found",
        "REMOVE that package and achieve the effect another way",
    ),
    ("Missing \\begin{document}", "repair the document structure"),
    ("Too many }'s / Missing }", "repair brace matching"),
    ("Option clash / package conflict", "remove one of the conflicting packages"),
];

/// Build the debugging prompt for one self-correction attempt.
pub fn build_correction_prompt(document: &str, compiler_error: &str) -> String {
    let fixes = KNOWN_ERROR_FIXES
        .iter()
        .map(|(err, fix)| format!("- \"{err}\" → {fix}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a LaTeX debugging expert. The document below failed to compile. Fix it.

**Document (FAILED TO COMPILE):**
```latex
{document}
```

**Compiler Output:**
```
{compiler_error}
```

**Your Task:**
1. Read the error carefully and work out what went wrong
2. Find the root cause: a package, a syntax error, or an incompatibility
3. Produce a corrected version that compiles
4. Use ONLY reliable, standard LaTeX

**Known Errors and Fixes:**
{fixes}

**Hard Rules:**
- If a package causes an error, REMOVE it entirely rather than patching around it
- If microtype fails, remove it and use \linespread{{}} for spacing
- If setspace fails, use \setlength{{\baselineskip}}{{}} instead
- Keep ALL document content
- Aim for a document that COMPILES, not for perfection

**The corrected document MUST compile without errors.**

Reply with the COMPLETE CORRECTED LaTeX document only, without explanations."#
    )
}
