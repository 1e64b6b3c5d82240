//! Error types for loading topology files

use std::path::PathBuf;

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Errors that can occur when loading or validating a topology
#[derive(Error, Debug)]
pub enum TopologyError {
    #[error("failed to read topology file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse topology: {message}")]
    Parse {
        message: String,
        span: Option<Span>,
    },

    #[error("invalid topology: {reason}")]
    Invalid { reason: String },
}

impl TopologyError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
        }
    }

    /// Get the source span if available
    pub fn span(&self) -> Option<&Span> {
        match self {
            Self::Parse { span, .. } => span.as_ref(),
            _ => None,
        }
    }

    /// Format the error with source context using ariadne
    ///
    /// Errors without a span fall back to their plain message.
    pub fn format(&self, source: &str, filename: &str) -> String {
        let (Self::Parse { message, .. }, Some(span)) = (self, self.span()) else {
            return self.to_string();
        };

        let mut buf = Vec::new();
        let written = Report::build(ReportKind::Error, filename, span.start)
            .with_message("failed to parse topology")
            .with_label(
                Label::new((filename, span.clone()))
                    .with_message(message)
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);

        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}

impl From<toml::de::Error> for TopologyError {
    fn from(err: toml::de::Error) -> Self {
        TopologyError::Parse {
            message: err.message().trim_end().to_string(),
            span: err.span(),
        }
    }
}
