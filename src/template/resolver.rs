//! Template resolution: placeholder tree plus interpolations into output nodes
//!
//! The sequential and concurrent walks share everything except how sibling
//! lists are awaited. Attributes, comments and component callees are always
//! resolved synchronously.

use futures::future::{self, BoxFuture, FutureExt};

use super::Interpolation;
use crate::component::{self, Callable, Props};
use crate::engine::Renderer;
use crate::node::{flatten, Attrs, Node};
use crate::parser::{decode_entities, Part, TAttr, TComponent, TNode, TemplateRef};
use crate::value::Value;
use crate::RenderError;

/// Resolves one placeholder tree against one interpolation list
#[derive(Clone, Copy)]
pub(crate) struct Resolver<'a> {
    renderer: &'a Renderer,
    interpolations: &'a [Interpolation],
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(renderer: &'a Renderer, interpolations: &'a [Interpolation]) -> Self {
        Self {
            renderer,
            interpolations,
        }
    }

    fn interpolation(&self, index: usize) -> Result<&'a Interpolation, RenderError> {
        self.interpolations
            .get(index)
            .ok_or(RenderError::InterpolationOutOfRange {
                index,
                len: self.interpolations.len(),
            })
    }

    pub(crate) fn resolve(&self, node: &TNode) -> Result<Node, RenderError> {
        match node {
            TNode::Text(text) => {
                if text.is_literal() {
                    return Ok(Node::text(text.strings.concat()));
                }
                let nodes = text
                    .parts()
                    .map(|part| match part {
                        Part::Literal(s) => Ok(Node::text(s)),
                        Part::Slot(index) => self.renderer.normalize(&self.interpolation(index)?.value),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(collapse(nodes))
            }
            TNode::Comment(content) => self.comment(content),
            TNode::DocumentType(content) => Ok(Node::doctype(content.clone())),
            TNode::Fragment(children) => Ok(Node::fragment(self.children(children)?)),
            TNode::Element(element) => {
                let attrs = self.attributes(&element.attrs)?;
                let children = self.children(&element.children)?;
                Ok(Node::element(element.tag.clone(), attrs, children)?)
            }
            TNode::Component(tc) => {
                let callable = self.callee(tc)?;
                let props = self.props(&tc.attrs)?;
                let children = self.children(&tc.children)?;
                let result = callable.invoke(props, children)?;
                self.renderer.normalize_result(result, &callable)
            }
        }
    }

    fn children(&self, children: &[TNode]) -> Result<Vec<Node>, RenderError> {
        let nodes = children
            .iter()
            .map(|child| self.resolve(child))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(flatten(nodes))
    }

    pub(crate) fn resolve_async(self, node: &'a TNode) -> BoxFuture<'a, Result<Node, RenderError>> {
        async move {
            match node {
                TNode::Text(text) => {
                    if text.is_literal() {
                        return Ok(Node::text(text.strings.concat()));
                    }
                    let mut branches: Vec<BoxFuture<'a, Result<Node, RenderError>>> =
                        Vec::with_capacity(text.strings.len() + text.slots.len());
                    for part in text.parts() {
                        match part {
                            Part::Literal(s) => branches.push(future::ready(Ok(Node::text(s))).boxed()),
                            Part::Slot(index) => {
                                let value = self.interpolation(index)?.value.clone();
                                branches.push(self.renderer.normalize_async(value));
                            }
                        }
                    }
                    Ok(collapse(self.renderer.gather(branches).await?))
                }
                TNode::Comment(content) => self.comment(content),
                TNode::DocumentType(content) => Ok(Node::doctype(content.clone())),
                TNode::Fragment(children) => Ok(Node::fragment(self.children_async(children).await?)),
                TNode::Element(element) => {
                    let attrs = self.attributes(&element.attrs)?;
                    let children = self.children_async(&element.children).await?;
                    Ok(Node::element(element.tag.clone(), attrs, children)?)
                }
                TNode::Component(tc) => {
                    let callable = self.callee(tc)?;
                    let props = self.props(&tc.attrs)?;
                    let children = self.children_async(&tc.children).await?;
                    let result = callable.invoke(props, children)?;
                    self.renderer.normalize_async(result).await
                }
            }
        }
        .boxed()
    }

    async fn children_async(self, children: &'a [TNode]) -> Result<Vec<Node>, RenderError> {
        let branches = children.iter().map(|child| self.resolve_async(child)).collect();
        Ok(flatten(self.renderer.gather(branches).await?))
    }

    fn callee(&self, tc: &TComponent) -> Result<Callable, RenderError> {
        let start = self.interpolation(tc.start)?;
        let end = tc.end.map(|index| self.interpolation(index)).transpose()?;
        let callable = component::callee(
            &start.value,
            &start.expression,
            end.map(|end| (&end.value, end.expression.as_ref())),
        )?;
        Ok(callable)
    }

    fn comment(&self, content: &TemplateRef) -> Result<Node, RenderError> {
        let text = self.text_run(content, "comment", Value::plain_text)?;
        Ok(Node::comment(text))
    }

    /// A repeated attribute takes the later value and moves to the later position
    fn attributes(&self, attrs: &[TAttr]) -> Result<Attrs, RenderError> {
        let mut resolved = Attrs::with_capacity(attrs.len());
        for attr in attrs {
            let value = match attr {
                TAttr::Static { value, .. } => Some(value.clone()),
                TAttr::Slot { name, index } => {
                    attribute_value(name, &self.interpolation(*index)?.value)?
                }
                TAttr::Templated { name, value } => Some(Some(self.text_run(
                    value,
                    &format!("attribute `{}`", name),
                    attribute_text,
                )?)),
            };
            let name = attr.name();
            resolved.shift_remove(name);
            if let Some(value) = value {
                resolved.insert(name.to_string(), value);
            }
        }
        Ok(resolved)
    }

    /// Component attributes keep interpolated values as they are
    fn props(&self, attrs: &[TAttr]) -> Result<Props, RenderError> {
        let mut props = Props::with_capacity(attrs.len());
        for attr in attrs {
            let value = match attr {
                TAttr::Static { value: Some(v), .. } => Value::Str(v.clone()),
                TAttr::Static { value: None, .. } => Value::Bool(true),
                TAttr::Slot { index, .. } => self.interpolation(*index)?.value.clone(),
                TAttr::Templated { name, value } => Value::Str(self.text_run(
                    value,
                    &format!("attribute `{}`", name),
                    attribute_text,
                )?),
            };
            props.insert(attr.name().to_string(), value);
        }
        Ok(props)
    }

    /// Concatenate a templated run as text, rejecting values with no text form
    fn text_run(
        &self,
        text: &TemplateRef,
        context: &str,
        coerce: fn(&Value) -> Option<String>,
    ) -> Result<String, RenderError> {
        let mut out = String::new();
        for part in text.parts() {
            match part {
                Part::Literal(s) => out.push_str(s),
                Part::Slot(index) => {
                    let value = &self.interpolation(index)?.value;
                    let piece = coerce(value).ok_or_else(|| RenderError::NotText {
                        context: context.to_string(),
                        kind: value.kind(),
                    })?;
                    out.push_str(&piece);
                }
            }
        }
        Ok(out)
    }
}

/// A single text node stands alone; anything else becomes a fragment
fn collapse(nodes: Vec<Node>) -> Node {
    let mut nodes = flatten(nodes);
    if nodes.len() == 1 && matches!(nodes[0], Node::Text(_)) {
        if let Some(node) = nodes.pop() {
            return node;
        }
    }
    Node::fragment(nodes)
}

/// Resolve a whole-value attribute interpolation
///
/// `None` drops the attribute; `Some(None)` renders it bare.
fn attribute_value(name: &str, value: &Value) -> Result<Option<Option<String>>, RenderError> {
    match value {
        Value::Bool(true) => Ok(Some(None)),
        Value::Bool(false) | Value::None => Ok(None),
        Value::Seq(items) => {
            let mut words = Vec::with_capacity(items.len());
            for item in items {
                let word = match item {
                    Value::Bool(false) | Value::None => continue,
                    other => attribute_text(other).ok_or_else(|| invalid_attribute(name, other))?,
                };
                if !word.is_empty() {
                    words.push(word);
                }
            }
            Ok(Some(Some(words.join(" "))))
        }
        other => attribute_text(other)
            .map(|text| Some(Some(text)))
            .ok_or_else(|| invalid_attribute(name, other)),
    }
}

/// Attribute text is escaped on output, so safe markup is unescaped here once
fn attribute_text(value: &Value) -> Option<String> {
    match value {
        Value::Markup(markup) => Some(decode_entities(&markup.to_html()).into_owned()),
        other => other.plain_text(),
    }
}

fn invalid_attribute(name: &str, value: &Value) -> RenderError {
    RenderError::InvalidAttribute {
        name: name.to_string(),
        reason: format!("{} values cannot be rendered as attribute text", value.kind()),
    }
}
