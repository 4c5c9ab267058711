//! Template markup parser
//!
//! Literal segments of a template are joined with private-use slot markers
//! and parsed into a placeholder tree ([`TNode`]). The parser is a seam: any
//! [`TemplateParser`] can be plugged into a [`Renderer`](crate::Renderer).

pub mod ast;
mod entities;
mod grammar;
pub mod lexer;

pub use ast::*;
pub use entities::decode_entities;
pub use grammar::parse;

use crate::error::ParseError;
use crate::template::TemplateKey;

/// Opens a slot marker in the joined source
pub(crate) const SLOT_OPEN: char = '\u{E000}';
/// Closes a slot marker in the joined source
pub(crate) const SLOT_CLOSE: char = '\u{E001}';

/// Marker standing in for interpolation `index` in the joined source
pub(crate) fn slot_marker(index: usize) -> String {
    format!("{}{}{}", SLOT_OPEN, index, SLOT_CLOSE)
}

/// Join literal segments with slot markers
pub(crate) fn joined_source<S: AsRef<str>>(strings: &[S]) -> String {
    let mut source = String::new();
    for (i, s) in strings.iter().enumerate() {
        if i > 0 {
            source.push_str(&slot_marker(i - 1));
        }
        source.push_str(s.as_ref());
    }
    source
}

/// Turns the literal shape of a template into a placeholder tree
pub trait TemplateParser: Send + Sync {
    fn parse(&self, key: &TemplateKey) -> Result<TNode, ParseError>;
}

impl<F> TemplateParser for F
where
    F: Fn(&TemplateKey) -> Result<TNode, ParseError> + Send + Sync,
{
    fn parse(&self, key: &TemplateKey) -> Result<TNode, ParseError> {
        self(key)
    }
}

/// The built-in HTML/SVG template parser
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupParser;

impl TemplateParser for MarkupParser {
    fn parse(&self, key: &TemplateKey) -> Result<TNode, ParseError> {
        grammar::parse(key.strings(), key.mode())
    }
}
