//! Error types for template parsing

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::parser::{SLOT_CLOSE, SLOT_OPEN};

/// Byte range in the joined template source
pub type Span = std::ops::Range<usize>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("parse error at {span:?}: {message}")]
    Syntax { span: Span, message: String },

    #[error("unclosed <{tag}> opened at {span:?}")]
    Unclosed { tag: String, span: Span },

    #[error("mismatched closing tag at {span:?}: expected </{expected}>, found </{found}>")]
    MismatchedClose {
        span: Span,
        expected: String,
        found: String,
    },
}

impl ParseError {
    pub(crate) fn syntax(span: Span, message: impl Into<String>) -> Self {
        ParseError::Syntax {
            span,
            message: message.into(),
        }
    }

    pub fn span(&self) -> &Span {
        match self {
            ParseError::Syntax { span, .. }
            | ParseError::Unclosed { span, .. }
            | ParseError::MismatchedClose { span, .. } => span,
        }
    }

    /// Format the error against the joined template source using ariadne
    ///
    /// Interpolation slots are shown as `{N}`.
    pub fn format(&self, source: &str, filename: &str) -> String {
        let to_char = |byte: usize| source[..byte.min(source.len())].chars().count();
        let span = self.span();
        let span = to_char(span.start)..to_char(span.end);
        let display: String = source
            .chars()
            .map(|c| match c {
                SLOT_OPEN => '{',
                SLOT_CLOSE => '}',
                other => other,
            })
            .collect();

        let label = match self {
            ParseError::Syntax { message, .. } => message.clone(),
            ParseError::Unclosed { tag, .. } => format!("<{}> is never closed", tag),
            ParseError::MismatchedClose { expected, .. } => format!("expected </{}>", expected),
        };

        let mut buf = Vec::new();
        let written = Report::build(ReportKind::Error, filename, span.start)
            .with_message(self.to_string())
            .with_label(
                Label::new((filename, span))
                    .with_message(label)
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(display)), &mut buf);

        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::joined_source;

    #[test]
    fn test_format_shows_slots_as_braces() {
        let source = joined_source(&["<div>", "</span>"]);
        let err = ParseError::MismatchedClose {
            span: source.find("</span>").unwrap()..source.len(),
            expected: "div".to_string(),
            found: "span".to_string(),
        };
        let report = err.format(&source, "template");
        assert!(report.contains("<div>{0}"));
        assert!(report.contains("expected </div>"));
    }

    #[test]
    fn test_span_accessor() {
        let err = ParseError::syntax(3..5, "bad");
        assert_eq!(err.span(), &(3..5));
        assert_eq!(err.to_string(), "parse error at 3..5: bad");
    }
}
