//! Error types for the edgequake-texgen library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ReportError`] — **Fatal**: the run cannot proceed at all (no API
//!   credential, provider cannot be built, invalid configuration). Returned
//!   as `Err(ReportError)` from constructors and the top-level `generate_*`
//!   functions.
//!
//! * [`ServiceError`] — **Non-fatal**: a single call to the text-generation
//!   service failed. It never escapes the generator; it is converted into a
//!   `success = false` result carrying the error text, so callers always get
//!   a structured outcome back.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-texgen library.
#[derive(Debug, Error)]
pub enum ReportError {
    // ── Config errors ─────────────────────────────────────────────────────
    /// No API credential was passed explicitly or found in the environment.
    #[error("No API credential for provider '{provider}'.\nSet {env_var} or pass --api-key.")]
    MissingCredential { provider: String, env_var: String },

    /// The provider factory could not build the requested provider.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output LaTeX file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal failure of one text-generation call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// Transport, authentication or quota failure reported by the service.
    #[error("LLM API error: {message}")]
    Api { message: String },

    /// The service answered but the reply carried no text.
    #[error("LLM returned an empty reply")]
    EmptyReply,

    /// The reply body could not be decoded.
    #[error("Malformed LLM reply: {detail}")]
    MalformedReply { detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_names_env_var() {
        let e = ReportError::MissingCredential {
            provider: "anthropic".into(),
            env_var: "ANTHROPIC_API_KEY".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("anthropic"), "got: {msg}");
        assert!(msg.contains("ANTHROPIC_API_KEY"), "got: {msg}");
    }

    #[test]
    fn api_error_display() {
        let e = ServiceError::Api {
            message: "quota exceeded".into(),
        };
        assert_eq!(e.to_string(), "LLM API error: quota exceeded");
    }

    #[test]
    fn output_write_failed_keeps_source() {
        use std::error::Error as _;
        let e = ReportError::OutputWriteFailed {
            path: PathBuf::from("/nope/report.tex"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(e.to_string().contains("/nope/report.tex"));
        assert!(e.source().is_some());
    }
}
