//! Error types for timeline operations.
//!
//! Every failure the clock engine reports is a local, synchronous validation
//! failure raised at the call that violated a precondition. The clock state is
//! left unchanged when an operation fails validation.

use core::fmt;

/// Boxed error produced by user code (scheduled callbacks, step logic).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The kind of timeline error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A duration, delay, factor or target was negative or not a finite number.
    InvalidArgument,
    /// A sequence was driven from a state that does not allow the operation.
    SequenceState,
    /// The active clock was accessed while it is already borrowed on this thread.
    Reentrant,
    /// A scheduled callback failed.
    Callback,
    /// Configuration could not be loaded or validated.
    Config,
}

impl ErrorKind {
    /// Returns a short human readable description of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid argument",
            Self::SequenceState => "invalid sequence state",
            Self::Reentrant => "re-entrant access to the active clock",
            Self::Callback => "scheduled callback failed",
            Self::Config => "invalid configuration",
        }
    }
}

/// An error from timeline operations.
///
/// # Example
///
/// ```
/// use timewarp::{ErrorKind, Timeline};
///
/// let mut timeline = Timeline::frozen_at(0.0)?;
/// let err = timeline.sleep(-1.0).unwrap_err();
///
/// assert_eq!(err.kind(), ErrorKind::InvalidArgument);
/// assert!(err.to_string().contains("-1"));
/// # Ok::<(), timewarp::Error>(())
/// ```
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    context: Option<String>,
    source: Option<BoxError>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub const fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
            source: None,
        }
    }

    /// Creates an invalid argument error describing the offending value.
    #[must_use]
    pub fn invalid_argument(context: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument).with_context(context)
    }

    /// Wraps a failure raised by a scheduled callback.
    #[must_use]
    pub fn callback(source: impl Into<BoxError>) -> Self {
        Self {
            kind: ErrorKind::Callback,
            context: None,
            source: Some(source.into()),
        }
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns `true` if this error rejected an argument.
    #[must_use]
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidArgument)
    }

    /// Adds context to the error.
    #[must_use]
    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context = Some(ctx.into());
        self
    }

    /// Attaches the underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns the error context, if any.
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.as_str())?;

        if let Some(ctx) = &self.context {
            write!(f, ": {ctx}")?;
        }
        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<crate::config::ConfigError> for Error {
    fn from(e: crate::config::ConfigError) -> Self {
        Self::new(ErrorKind::Config).with_source(e)
    }
}

/// Result type for timeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Rejects negative and non-finite values for a named argument.
pub(crate) fn ensure_non_negative(what: &str, value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(Error::invalid_argument(format!(
            "{what} must be a finite number, got {value}"
        )));
    }
    if value < 0.0 {
        return Err(Error::invalid_argument(format!(
            "{what} cannot be negative, got {value}"
        )));
    }
    Ok(value)
}

/// Rejects non-finite values for a named argument.
pub(crate) fn ensure_finite(what: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::invalid_argument(format!(
            "{what} must be a finite number, got {value}"
        )))
    }
}
