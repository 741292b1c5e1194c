//! # Error Handling
//!
//! Error types for the signature pipeline. Every variant carries an
//! [`ErrorContext`] with the operation being performed, free-form context, a
//! recovery suggestion and a severity, so the boundary layer can log or report
//! failures without string matching.
//!
//! ## Taxonomy
//!
//! - [`SignatureError::InvalidImage`]: input bytes do not decode to a usable
//!   raster. Caller fault.
//! - [`SignatureError::Config`]: an invalid tunable or configuration file.
//!   Caller fault.
//! - [`SignatureError::Processing`], [`SignatureError::Encode`],
//!   [`SignatureError::Io`]: unexpected internal failures.
//!
//! An image without ink or without descriptors is **not** an error. The
//! pipeline degrades to passthrough ROIs, zero fingerprints and zero scores.
//!
//! ## Usage
//!
//! ```rust
//! use signature_print::error::{HasRecoverySuggestion, SignatureError};
//!
//! let error = SignatureError::invalid_image("unrecognised format")
//!     .with_context("decoding reference upload")
//!     .with_recovery_suggestion("upload a PNG or JPEG scan of the signature");
//!
//! assert!(error.is_caller_fault());
//! assert_eq!(error.category(), "invalid_image");
//! assert!(error.recovery_suggestion().is_some());
//! ```

use std::{collections::HashMap, time::SystemTime};

use thiserror::Error;

const SUPPORTED_FORMATS_HINT: &str =
    "Provide a PNG, JPEG, BMP, TIFF or WebP image of the signature";

/// Severity levels for errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Warnings that may indicate potential issues
    Warning,
    /// Errors that abort the current request
    Error,
    /// Errors that indicate a defect in the pipeline itself
    Critical,
}

/// Metadata about when and where an error occurred
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// When the error occurred
    pub timestamp: SystemTime,
    /// The operation being performed when the error occurred
    pub operation: Option<String>,
    /// Additional context about the error
    pub context: Option<String>,
    /// Suggested recovery action
    pub recovery_suggestion: Option<String>,
    /// Error severity level
    pub severity: ErrorSeverity,
    /// Additional metadata as key-value pairs
    pub metadata: HashMap<String, String>,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            timestamp: SystemTime::now(),
            operation: None,
            context: None,
            recovery_suggestion: None,
            severity: ErrorSeverity::Error,
            metadata: HashMap::new(),
        }
    }
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_recovery_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.recovery_suggestion = Some(suggestion.into());
        self
    }
}

/// Base error type for the signature pipeline
#[derive(Debug, Error)]
pub enum SignatureError {
    /// Input bytes are not a decodable, non-empty raster image
    #[error("Invalid image: {reason}")]
    InvalidImage {
        reason: String,
        #[source]
        source: Option<image::ImageError>,
        context: ErrorContext,
    },
    /// Configuration validation errors
    #[error("Configuration error in '{field}': {reason} (value: {value})")]
    Config {
        field: String,
        value: String,
        reason: String,
        context: ErrorContext,
    },
    /// Unexpected failures inside a pipeline stage
    #[error("Processing failed during {operation}: {reason}")]
    Processing {
        operation: String,
        reason: String,
        context: ErrorContext,
    },
    /// Auxiliary image encoding failures
    #[error("Failed to encode {format} image: {source}")]
    Encode {
        format: String,
        #[source]
        source: image::ImageError,
        context: ErrorContext,
    },
    /// I/O errors
    #[error("I/O error during {operation}{}: {source}", describe_path(.path))]
    Io {
        operation: String,
        path: Option<String>,
        #[source]
        source: std::io::Error,
        context: ErrorContext,
    },
}

fn describe_path(path: &Option<String>) -> String {
    path.as_deref().map(|p| format!(" on '{p}'")).unwrap_or_default()
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SignatureError>;

impl SignatureError {
    pub fn invalid_image(reason: impl Into<String>) -> Self {
        Self::InvalidImage {
            reason: reason.into(),
            source: None,
            context: ErrorContext::new()
                .with_severity(ErrorSeverity::Warning)
                .with_recovery_suggestion(SUPPORTED_FORMATS_HINT),
        }
    }

    pub fn undecodable(source: image::ImageError) -> Self {
        Self::InvalidImage {
            reason: "could not decode image, ensure a valid format".to_string(),
            source: Some(source),
            context: ErrorContext::new()
                .with_severity(ErrorSeverity::Warning)
                .with_recovery_suggestion(SUPPORTED_FORMATS_HINT),
        }
    }

    pub fn config(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Config {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    pub fn processing(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Processing {
            operation: operation.into(),
            reason: reason.into(),
            context: ErrorContext::new().with_severity(ErrorSeverity::Critical),
        }
    }

    pub fn encode(format: impl Into<String>, source: image::ImageError) -> Self {
        Self::Encode {
            format: format.into(),
            source,
            context: ErrorContext::new().with_severity(ErrorSeverity::Critical),
        }
    }

    pub fn io(operation: impl Into<String>, path: Option<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path,
            source,
            context: ErrorContext::new(),
        }
    }

    /// Add additional context
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context_mut().context = Some(context.into());
        self
    }

    /// Set the operation that was being performed
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context_mut().operation = Some(operation.into());
        self
    }

    /// Set recovery suggestion
    pub fn with_recovery_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context_mut().recovery_suggestion = Some(suggestion.into());
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context_mut().metadata.insert(key.into(), value.into());
        self
    }

    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::InvalidImage { context, .. }
            | Self::Config { context, .. }
            | Self::Processing { context, .. }
            | Self::Encode { context, .. }
            | Self::Io { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::InvalidImage { context, .. }
            | Self::Config { context, .. }
            | Self::Processing { context, .. }
            | Self::Encode { context, .. }
            | Self::Io { context, .. } => context,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidImage { .. } => "invalid_image",
            Self::Config { .. } => "config",
            Self::Processing { .. } => "processing",
            Self::Encode { .. } => "encode",
            Self::Io { .. } => "io",
        }
    }

    /// True when the failure was caused by the caller's input rather than by
    /// the pipeline. A transport layer maps these to a client-error response.
    pub fn is_caller_fault(&self) -> bool {
        matches!(self, Self::InvalidImage { .. } | Self::Config { .. })
    }
}

/// Trait for errors that have severity levels
pub trait HasSeverity {
    fn severity(&self) -> ErrorSeverity;
}

impl HasSeverity for SignatureError {
    fn severity(&self) -> ErrorSeverity {
        self.context().severity
    }
}

/// Trait for errors that provide recovery suggestions
pub trait HasRecoverySuggestion {
    fn recovery_suggestion(&self) -> Option<&str>;
}

impl HasRecoverySuggestion for SignatureError {
    fn recovery_suggestion(&self) -> Option<&str> {
        self.context().recovery_suggestion.as_deref()
    }
}

impl From<sig_scale::cpu::ScaleError> for SignatureError {
    fn from(error: sig_scale::cpu::ScaleError) -> Self {
        Self::processing("resize", error.to_string())
    }
}

impl From<tokio::task::JoinError> for SignatureError {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::processing("join pipeline task", error.to_string())
    }
}

impl From<serde_json::Error> for SignatureError {
    fn from(error: serde_json::Error) -> Self {
        Self::config("config_file", "<json>", error.to_string())
            .with_recovery_suggestion("Check the configuration file against the documented fields")
    }
}
