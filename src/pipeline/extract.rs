//! Best-effort extraction of a LaTeX document and an issue list from
//! free-text LLM replies.
//!
//! These are heuristics, not parsers. They never fail: malformed input
//! produces a best guess (possibly truncated or containing stray prose)
//! rather than an error. Callers that need stronger guarantees run the
//! result through [`crate::pipeline::acceptance::Acceptance`].

use serde::Deserialize;

const FENCE: &str = "```";
const LATEX_FENCE: &str = "```latex";

/// Marker that announces the issue report in a validation reply.
pub const ISSUES_MARKER: &str = "\"issues\":";

/// Pull the document out of a reply.
///
/// 1. A ```` ```latex ```` fence anywhere wins: text after it, up to the
///    next fence.
/// 2. Otherwise the first fence of any kind: an optional language tag on
///    the opening line is skipped, text runs to the next fence.
/// 3. Otherwise the whole reply.
///
/// An unclosed fence runs to the end of the reply. The result is always
/// trimmed.
pub fn extract_document(reply: &str) -> String {
    if let Some(pos) = reply.find(LATEX_FENCE) {
        return until_fence(&reply[pos + LATEX_FENCE.len()..]).trim().to_string();
    }
    if let Some(pos) = reply.find(FENCE) {
        let body = skip_language_tag(&reply[pos + FENCE.len()..]);
        return until_fence(body).trim().to_string();
    }
    reply.trim().to_string()
}

fn until_fence(s: &str) -> &str {
    match s.find(FENCE) {
        Some(end) => &s[..end],
        None => s,
    }
}

/// Drop a language identifier (`tex`, `python3`, `c++`) directly after an
/// opening fence. Only applies when the identifier ends the line.
fn skip_language_tag(s: &str) -> &str {
    let tag_len = s
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.')))
        .unwrap_or(s.len());
    if tag_len == 0 {
        return s;
    }
    let rest = &s[tag_len..];
    if rest.starts_with('\n') || rest.starts_with("\r\n") {
        rest
    } else {
        s
    }
}

/// What a validation reply said about issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueScan {
    /// No `"issues":` marker in the reply.
    NotReported,
    /// The issue object parsed; may be empty.
    Parsed(Vec<String>),
    /// The marker was present but no valid JSON object could be read.
    Unparseable,
}

#[derive(Deserialize)]
struct IssueReport {
    #[serde(default)]
    issues: Vec<String>,
}

/// Locate and parse the `{"issues": [...]}` object in a reply.
///
/// The object is the one enclosing the first `"issues":` marker: its opening
/// brace is the last `{` before the marker, its closing brace is found by
/// depth counting that skips braces inside JSON strings.
pub fn scan_issues(reply: &str) -> IssueScan {
    let Some(marker) = reply.find(ISSUES_MARKER) else {
        return IssueScan::NotReported;
    };
    let Some(start) = reply[..marker].rfind('{') else {
        return IssueScan::Unparseable;
    };
    let Some(end) = matching_brace(&reply[start..]) else {
        return IssueScan::Unparseable;
    };
    match serde_json::from_str::<IssueReport>(&reply[start..start + end + 1]) {
        Ok(report) => IssueScan::Parsed(report.issues),
        Err(_) => IssueScan::Unparseable,
    }
}

/// Byte offset of the `}` matching the `{` at offset 0.
fn matching_brace(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
