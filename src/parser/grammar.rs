//! Placeholder tree builder
//!
//! Text content is scanned directly; tag interiors are tokenized by the logos
//! lexer in [`super::lexer`].

use logos::Logos;

use crate::error::ParseError;
use crate::node::{is_raw_text, is_void, ESCAPABLE_RAW_TEXT_ELEMENTS};
use crate::template::Mode;

use super::ast::{TAttr, TComponent, TElement, TNode, TemplateRef};
use super::entities::decode_entities;
use super::lexer::TagToken;
use super::{joined_source, SLOT_CLOSE, SLOT_OPEN};

/// Parse the literal segments of a template into a placeholder tree
pub fn parse<S: AsRef<str>>(strings: &[S], mode: Mode) -> Result<TNode, ParseError> {
    let mut offset = 0;
    for s in strings {
        let s = s.as_ref();
        if let Some(at) = s.find([SLOT_OPEN, SLOT_CLOSE]) {
            return Err(ParseError::syntax(
                offset + at..offset + at + SLOT_OPEN.len_utf8(),
                "template text contains a reserved private-use character",
            ));
        }
        offset += s.len();
    }
    let source = joined_source(strings);
    TreeBuilder::new(&source, mode).run()
}

enum OpenKind {
    Element { tag: String, attrs: Vec<TAttr> },
    Component { start: usize, attrs: Vec<TAttr> },
}

/// An element or component whose closing tag has not been seen yet
struct Open {
    kind: OpenKind,
    children: Vec<TNode>,
    foreign: bool,
    span: std::ops::Range<usize>,
}

impl Open {
    fn display_name(&self) -> String {
        match &self.kind {
            OpenKind::Element { tag, .. } => tag.clone(),
            OpenKind::Component { start, .. } => format!("{{{}}}", start),
        }
    }
}

enum TagName {
    Element(String),
    Component(usize),
}

struct TreeBuilder<'s> {
    source: &'s str,
    pos: usize,
    mode: Mode,
    stack: Vec<Open>,
    root: Vec<TNode>,
    text: String,
}

impl<'s> TreeBuilder<'s> {
    fn new(source: &'s str, mode: Mode) -> Self {
        Self {
            source,
            pos: 0,
            mode,
            stack: Vec::new(),
            root: Vec::new(),
            text: String::new(),
        }
    }

    fn run(mut self) -> Result<TNode, ParseError> {
        let source = self.source;
        while self.pos < source.len() {
            let rest = &source[self.pos..];
            let Some(lt) = rest.find('<') else {
                self.text.push_str(rest);
                self.pos = source.len();
                break;
            };
            self.text.push_str(&rest[..lt]);
            self.pos += lt;

            let rest = &source[self.pos..];
            if rest.starts_with("<!--") {
                self.comment()?;
            } else if starts_with_ignore_case(rest, "<!doctype") {
                self.doctype()?;
            } else if rest.starts_with("</") && starts_name(&rest[2..]) {
                self.close_tag()?;
            } else if starts_name(&rest[1..]) {
                self.open_tag()?;
            } else {
                // A lone `<` is text
                self.text.push('<');
                self.pos += 1;
            }
        }
        self.flush_text();

        if let Some(open) = self.stack.pop() {
            return Err(ParseError::Unclosed {
                tag: open.display_name(),
                span: open.span,
            });
        }

        let mut root = self.root;
        Ok(if root.len() == 1 {
            root.remove(0)
        } else {
            TNode::Fragment(root)
        })
    }

    fn foreign(&self) -> bool {
        self.stack
            .last()
            .map(|open| open.foreign)
            .unwrap_or(self.mode == Mode::Svg)
    }

    fn flush_text(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.text);
        self.push_node(TNode::Text(decoded(&text)));
    }

    fn push_node(&mut self, node: TNode) {
        match self.stack.last_mut() {
            Some(open) => open.children.push(node),
            None => self.root.push(node),
        }
    }

    fn comment(&mut self) -> Result<(), ParseError> {
        let source = self.source;
        let start = self.pos;
        let body = start + "<!--".len();
        let end = source[body..]
            .find("-->")
            .map(|i| body + i)
            .ok_or_else(|| ParseError::syntax(start..source.len(), "unterminated comment"))?;
        self.flush_text();
        self.push_node(TNode::Comment(TemplateRef::split(&source[body..end])));
        self.pos = end + "-->".len();
        Ok(())
    }

    fn doctype(&mut self) -> Result<(), ParseError> {
        let source = self.source;
        let start = self.pos;
        let end = source[start..]
            .find('>')
            .map(|i| start + i)
            .ok_or_else(|| ParseError::syntax(start..source.len(), "unterminated doctype"))?;
        let text = source[start + "<!doctype".len()..end].trim();
        if text.contains(SLOT_OPEN) {
            return Err(ParseError::syntax(
                start..end + 1,
                "interpolations are not allowed in a doctype",
            ));
        }
        self.flush_text();
        self.push_node(TNode::DocumentType(text.to_string()));
        self.pos = end + 1;
        Ok(())
    }

    fn open_tag(&mut self) -> Result<(), ParseError> {
        let source = self.source;
        let start = self.pos;
        let base = start + 1;
        let mut lexer = TagToken::lexer(&source[base..]);

        let name = match lexer.next() {
            Some(Ok(TagToken::Word(word))) => TagName::Element(word),
            Some(Ok(TagToken::Slot(index))) => TagName::Component(index),
            _ => {
                return Err(ParseError::syntax(
                    start..base + lexer.span().end,
                    "expected a tag name or a component",
                ))
            }
        };

        let parent_foreign = self.foreign();
        let (name, foreign) = match name {
            TagName::Element(word) => {
                let is_svg = word.eq_ignore_ascii_case("svg");
                let foreign = parent_foreign || is_svg;
                let tag = if foreign && !is_svg {
                    word
                } else {
                    word.to_ascii_lowercase()
                };
                (TagName::Element(tag), foreign)
            }
            component => (component, parent_foreign),
        };
        // Component attributes are handed to callables as written
        let keep_case = foreign || matches!(name, TagName::Component(_));

        let mut attrs = Vec::new();
        let self_closing = loop {
            let token = match lexer.next() {
                Some(Ok(token)) => token,
                Some(Err(())) => {
                    let span = lexer.span();
                    return Err(ParseError::syntax(
                        base + span.start..base + span.end,
                        "unexpected character in tag",
                    ));
                }
                None => {
                    return Err(ParseError::syntax(start..source.len(), "unterminated tag"));
                }
            };
            match token {
                TagToken::End => break false,
                TagToken::SelfClose => break true,
                TagToken::Slash => continue,
                TagToken::Word(word) => {
                    let name = if keep_case {
                        word
                    } else {
                        word.to_ascii_lowercase()
                    };
                    attrs.push(attribute(&mut lexer, base, name)?);
                }
                TagToken::Slot(_) => {
                    let span = lexer.span();
                    return Err(ParseError::syntax(
                        base + span.start..base + span.end,
                        "spread attributes are not supported; bind each attribute by name",
                    ));
                }
                TagToken::Equals | TagToken::Quoted(_) => {
                    let span = lexer.span();
                    return Err(ParseError::syntax(
                        base + span.start..base + span.end,
                        "expected an attribute name",
                    ));
                }
            }
        };
        self.pos = base + lexer.span().end;
        let span = start..self.pos;
        self.flush_text();

        match name {
            TagName::Component(index) => {
                if self_closing {
                    self.push_node(TNode::Component(TComponent {
                        start: index,
                        end: None,
                        attrs,
                        children: vec![],
                    }));
                } else {
                    self.stack.push(Open {
                        kind: OpenKind::Component {
                            start: index,
                            attrs,
                        },
                        children: vec![],
                        foreign,
                        span,
                    });
                }
            }
            TagName::Element(tag) => {
                if self_closing || (!foreign && is_void(&tag)) {
                    self.push_node(TNode::Element(TElement {
                        tag,
                        attrs,
                        children: vec![],
                    }));
                } else if !foreign && (is_raw_text(&tag) || ESCAPABLE_RAW_TEXT_ELEMENTS.contains(&tag.as_str())) {
                    let children = self.raw_text_body(&tag, span)?;
                    self.push_node(TNode::Element(TElement {
                        tag,
                        attrs,
                        children,
                    }));
                } else {
                    self.stack.push(Open {
                        kind: OpenKind::Element { tag, attrs },
                        children: vec![],
                        foreign,
                        span,
                    });
                }
            }
        }
        Ok(())
    }

    /// Consume everything up to the matching close tag as one text child
    fn raw_text_body(
        &mut self,
        tag: &str,
        open_span: std::ops::Range<usize>,
    ) -> Result<Vec<TNode>, ParseError> {
        let source = self.source;
        let body = self.pos;
        let needle = format!("</{}", tag);
        let close = source[body..]
            .to_ascii_lowercase()
            .find(&needle)
            .map(|i| body + i)
            .ok_or_else(|| ParseError::Unclosed {
                tag: tag.to_string(),
                span: open_span.clone(),
            })?;
        let end = source[close..]
            .find('>')
            .map(|i| close + i + 1)
            .ok_or_else(|| ParseError::syntax(close..source.len(), "unterminated closing tag"))?;
        self.pos = end;

        let content = &source[body..close];
        Ok(if content.is_empty() {
            vec![]
        } else {
            let text = if is_raw_text(tag) {
                TemplateRef::split(content)
            } else {
                decoded(content)
            };
            vec![TNode::Text(text)]
        })
    }

    fn close_tag(&mut self) -> Result<(), ParseError> {
        let source = self.source;
        let start = self.pos;
        let base = start + 2;
        let mut lexer = TagToken::lexer(&source[base..]);

        let name = match lexer.next() {
            Some(Ok(TagToken::Word(word))) => TagName::Element(word),
            Some(Ok(TagToken::Slot(index))) => TagName::Component(index),
            _ => {
                return Err(ParseError::syntax(
                    start..base + lexer.span().end,
                    "expected a closing tag name",
                ))
            }
        };
        match lexer.next() {
            Some(Ok(TagToken::End)) => {}
            _ => {
                return Err(ParseError::syntax(
                    start..base + lexer.span().end,
                    "expected `>` to end the closing tag",
                ))
            }
        }
        self.pos = base + lexer.span().end;
        let span = start..self.pos;
        let found = match &name {
            TagName::Element(word) => word.clone(),
            TagName::Component(index) => format!("{{{}}}", index),
        };

        let Some(open) = self.stack.last() else {
            return Err(ParseError::syntax(
                span,
                format!("unexpected closing tag </{}>", found),
            ));
        };
        let matches = match (&open.kind, &name) {
            (OpenKind::Element { tag, .. }, TagName::Element(word)) => tag.eq_ignore_ascii_case(word),
            (OpenKind::Component { .. }, TagName::Component(_)) => true,
            _ => false,
        };
        if !matches {
            return Err(ParseError::MismatchedClose {
                span,
                expected: open.display_name(),
                found,
            });
        }

        self.flush_text();
        let Some(open) = self.stack.pop() else {
            return Ok(());
        };
        let node = match (open.kind, name) {
            (OpenKind::Component { start, attrs }, TagName::Component(end)) => {
                TNode::Component(TComponent {
                    start,
                    end: Some(end),
                    attrs,
                    children: open.children,
                })
            }
            (OpenKind::Element { tag, attrs }, _) => TNode::Element(TElement {
                tag,
                attrs,
                children: open.children,
            }),
            (OpenKind::Component { start, attrs }, _) => TNode::Component(TComponent {
                start,
                end: None,
                attrs,
                children: open.children,
            }),
        };
        self.push_node(node);
        Ok(())
    }
}

/// Parse an attribute following its name; the lexer sits right after the name
fn attribute(
    lexer: &mut logos::Lexer<'_, TagToken>,
    base: usize,
    name: String,
) -> Result<TAttr, ParseError> {
    let rest = lexer.remainder();
    let trimmed = rest.trim_start();
    if !trimmed.starts_with('=') {
        return Ok(TAttr::Static { name, value: None });
    }
    lexer.bump(rest.len() - trimmed.len() + 1);

    let rest = lexer.remainder();
    let trimmed = rest.trim_start();
    match trimmed.chars().next() {
        Some('"') | Some('\'') | Some(SLOT_OPEN) => match lexer.next() {
            Some(Ok(TagToken::Quoted(value))) => Ok(value_attr(name, &value)),
            Some(Ok(TagToken::Slot(index))) => Ok(TAttr::Slot { name, index }),
            _ => {
                let span = lexer.span();
                Err(ParseError::syntax(
                    base + span.start..base + span.end,
                    format!("invalid value for attribute `{}`", name),
                ))
            }
        },
        None | Some('>') => {
            let span = lexer.span();
            Err(ParseError::syntax(
                base + span.start..base + span.end,
                format!("missing value for attribute `{}`", name),
            ))
        }
        Some(_) => {
            let len = trimmed
                .find(|c: char| c.is_whitespace() || c == '>')
                .unwrap_or(trimmed.len());
            let value = &trimmed[..len];
            lexer.bump(rest.len() - trimmed.len() + len);
            Ok(value_attr(name, value))
        }
    }
}

fn value_attr(name: String, value: &str) -> TAttr {
    let value = decoded(value);
    if let Some(index) = value.single_slot() {
        TAttr::Slot { name, index }
    } else if value.is_literal() {
        TAttr::Static {
            name,
            value: value.strings.into_iter().next(),
        }
    } else {
        TAttr::Templated { name, value }
    }
}

/// Split literal text into runs and decode character references in each run
fn decoded(text: &str) -> TemplateRef {
    let mut text = TemplateRef::split(text);
    text.strings = text
        .strings
        .iter()
        .map(|run| decode_entities(run).into_owned())
        .collect();
    text
}

fn starts_name(rest: &str) -> bool {
    rest.starts_with(|c: char| c.is_ascii_alphabetic() || c == SLOT_OPEN)
}

fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
    haystack
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}
