// SPDX-License-Identifier: Apache-2.0 OR MIT
use crate::ast::Span;
use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Unified error type for the template engine.
///
/// Exactly two kinds exist: `Parse` for malformed template source and
/// `Execute` for failures while walking a compiled template (missing fields,
/// failing helpers, unknown templates, write errors). Both carry the message,
/// an optional source error and, when known, the `Span` of the offending
/// action.
#[derive(Debug, Error)]
pub enum Error {
    #[error("parse error: {message}")]
    Parse {
        message: String,
        #[source]
        source: Option<BoxedSource>,
        span: Option<Span>,
    },
    #[error("execution error: {message}")]
    Execute {
        message: String,
        #[source]
        source: Option<BoxedSource>,
        span: Option<Span>,
    },
}

impl Error {
    pub fn parse(message: impl Into<String>, span: Option<Span>) -> Self {
        Error::Parse {
            message: message.into(),
            source: None,
            span,
        }
    }

    pub fn parse_with_span(message: impl Into<String>, span: Span) -> Self {
        Self::parse(message, Some(span))
    }

    pub fn execute(message: impl Into<String>, span: Option<Span>) -> Self {
        Error::Execute {
            message: message.into(),
            source: None,
            span,
        }
    }

    pub fn execute_with_span(message: impl Into<String>, span: Span) -> Self {
        Self::execute(message, Some(span))
    }

    /// Attaches an underlying cause, keeping the error kind.
    pub fn with_source(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        match &mut self {
            Error::Parse { source, .. } | Error::Execute { source, .. } => {
                *source = Some(Box::new(cause));
            }
        }
        self
    }

    /// Prefixes the message with `prefix: `, keeping kind, source and span.
    pub fn context(mut self, prefix: impl AsRef<str>) -> Self {
        match &mut self {
            Error::Parse { message, .. } | Error::Execute { message, .. } => {
                *message = format!("{}: {}", prefix.as_ref(), message);
            }
        }
        self
    }

    /// Records `span` unless a more precise one is already present.
    pub fn or_span(mut self, fallback: Span) -> Self {
        match &mut self {
            Error::Parse { span, .. } | Error::Execute { span, .. } => {
                span.get_or_insert(fallback);
            }
        }
        self
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Error::Parse { .. })
    }

    pub fn is_execute(&self) -> bool {
        matches!(self, Error::Execute { .. })
    }

    /// Message without the kind prefix used by `Display`.
    pub fn message(&self) -> &str {
        match self {
            Error::Parse { message, .. } | Error::Execute { message, .. } => message,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Error::Parse { span, .. } | Error::Execute { span, .. } => *span,
        }
    }
}
