//! Markup serialization, eager and chunked

use std::sync::Arc;

use thiserror::Error;

use crate::node::{Element, Node};

use super::escape::{escape_comment, escape_script, escape_style, escape_text};

/// Errors that can occur while serializing a node tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializeError {
    /// A raw-text element (`script`, `style`) holds something other than text
    #[error("cannot serialize {found} content inside <{tag}>; only text is allowed")]
    NonTextInRawText { tag: String, found: &'static str },
}

/// Serialize a node tree to a string
pub fn serialize(node: &Node) -> Result<String, SerializeError> {
    let mut out = String::new();
    write_node(node, &mut out)?;
    Ok(out)
}

/// Lazily serialize a node tree as chunks
pub fn serialize_chunks(node: &Node) -> Chunks {
    Chunks::new(node.clone())
}

fn write_node(node: &Node, out: &mut String) -> Result<(), SerializeError> {
    match node {
        Node::Text(text) => out.push_str(&text_chunk(text)),
        Node::Comment(content) => out.push_str(&comment_chunk(content)),
        Node::DocumentType(content) => out.push_str(&doctype_chunk(content)),
        Node::Fragment(fragment) => {
            for child in fragment.children() {
                write_node(child, out)?;
            }
        }
        Node::Element(element) => {
            out.push_str(&open_tag(element));
            if element.is_void() {
                return Ok(());
            }
            if element.is_raw_text() {
                if !element.children().is_empty() {
                    out.push_str(&raw_text_body(element.tag(), element.children())?);
                }
            } else {
                for child in element.children() {
                    write_node(child, out)?;
                }
            }
            out.push_str(&close_tag(element.tag()));
        }
    }
    Ok(())
}

fn text_chunk(text: &crate::node::Text) -> String {
    if text.is_safe() {
        text.content().to_string()
    } else {
        escape_text(text.content()).into_owned()
    }
}

fn comment_chunk(content: &str) -> String {
    format!("<!--{}-->", escape_comment(content))
}

fn doctype_chunk(content: &str) -> String {
    format!("<!DOCTYPE {}>", content)
}

fn open_tag(element: &Element) -> String {
    let mut tag = format!("<{}", element.tag());
    for (name, value) in element.attrs() {
        match value {
            Some(value) => {
                tag.push_str(&format!(r#" {}="{}""#, name, escape_text(value)));
            }
            None => {
                tag.push(' ');
                tag.push_str(name);
            }
        }
    }
    tag.push_str(if element.is_void() { " />" } else { ">" });
    tag
}

fn close_tag(tag: &str) -> String {
    format!("</{}>", tag)
}

/// Concatenate the text children of a raw-text element and escape them as one block
fn raw_text_body(tag: &str, children: &[Node]) -> Result<String, SerializeError> {
    let mut body = String::new();
    for child in children {
        match child {
            Node::Text(text) => body.push_str(text.content()),
            other => {
                return Err(SerializeError::NonTextInRawText {
                    tag: tag.to_string(),
                    found: kind_name(other),
                })
            }
        }
    }
    Ok(match tag {
        "style" => escape_style(&body).into_owned(),
        _ => escape_script(&body).into_owned(),
    })
}

fn kind_name(node: &Node) -> &'static str {
    match node {
        Node::Text(_) => "text",
        Node::Comment(_) => "comment",
        Node::DocumentType(_) => "doctype",
        Node::Fragment(_) => "fragment",
        Node::Element(_) => "element",
    }
}

enum Frame {
    Children(Arc<[Node]>, usize),
    RawBody(String, Arc<[Node]>),
    Close(String),
}

/// Single-pass chunk producer
///
/// Yields one chunk per open tag, text node, comment, doctype and close tag;
/// a raw-text body is one bulk-escaped chunk. After an error the iterator is
/// exhausted.
pub struct Chunks {
    stack: Vec<Frame>,
}

impl Chunks {
    pub fn new(root: Node) -> Self {
        let root: Arc<[Node]> = Arc::from(vec![root]);
        Self {
            stack: vec![Frame::Children(root, 0)],
        }
    }
}

impl Iterator for Chunks {
    type Item = Result<String, SerializeError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.stack.pop()? {
                Frame::Close(tag) => return Some(Ok(close_tag(&tag))),
                Frame::RawBody(tag, children) => match raw_text_body(&tag, &children) {
                    Ok(body) => return Some(Ok(body)),
                    Err(e) => {
                        self.stack.clear();
                        return Some(Err(e));
                    }
                },
                Frame::Children(children, index) => {
                    if index >= children.len() {
                        continue;
                    }
                    self.stack.push(Frame::Children(Arc::clone(&children), index + 1));
                    match &children[index] {
                        Node::Text(text) => return Some(Ok(text_chunk(text))),
                        Node::Comment(content) => return Some(Ok(comment_chunk(content))),
                        Node::DocumentType(content) => return Some(Ok(doctype_chunk(content))),
                        Node::Fragment(fragment) => {
                            self.stack.push(Frame::Children(fragment.shared_children(), 0));
                        }
                        Node::Element(element) => {
                            let open = open_tag(element);
                            if element.is_void() {
                                return Some(Ok(open));
                            }
                            self.stack.push(Frame::Close(element.tag().to_string()));
                            if element.is_raw_text() {
                                if !element.children().is_empty() {
                                    self.stack.push(Frame::RawBody(
                                        element.tag().to_string(),
                                        element.shared_children(),
                                    ));
                                }
                            } else {
                                self.stack.push(Frame::Children(element.shared_children(), 0));
                            }
                            return Some(Ok(open));
                        }
                    }
                }
            }
        }
    }
}

impl std::iter::FusedIterator for Chunks {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Attrs, Element, VOID_ELEMENTS};
    use pretty_assertions::assert_eq;

    fn el(tag: &str) -> crate::node::ElementBuilder {
        Element::builder(tag)
    }

    fn chunks_of(node: &Node) -> Vec<String> {
        serialize_chunks(node).collect::<Result<_, _>>().unwrap()
    }

    #[test]
    fn test_element_with_attribute() {
        let node: Node = el("div").attr("id", "main").child(Node::text("Hello")).build().unwrap().into();
        assert_eq!(serialize(&node).unwrap(), r#"<div id="main">Hello</div>"#);
    }

    #[test]
    fn test_void_element_self_closes() {
        let node: Node = el("br").attr("class", "break").build().unwrap().into();
        assert_eq!(serialize(&node).unwrap(), r#"<br class="break" />"#);
        assert_eq!(chunks_of(&node), vec![r#"<br class="break" />"#]);
    }

    #[test]
    fn test_all_void_elements_have_no_close_tag() {
        for tag in VOID_ELEMENTS {
            let node = Node::element(*tag, Attrs::new(), vec![]).unwrap();
            let html = serialize(&node).unwrap();
            assert_eq!(html, format!("<{} />", tag));
            assert!(!html.contains("</"));
        }
    }

    #[test]
    fn test_empty_element_keeps_close_tag() {
        let node: Node = el("span").build().unwrap().into();
        assert_eq!(serialize(&node).unwrap(), "<span></span>");
        assert_eq!(chunks_of(&node), vec!["<span>", "</span>"]);
    }

    #[test]
    fn test_bare_attribute() {
        let node: Node = el("input").attr("type", "checkbox").flag("checked").build().unwrap().into();
        assert_eq!(serialize(&node).unwrap(), r#"<input type="checkbox" checked />"#);
    }

    #[test]
    fn test_attribute_values_are_escaped() {
        let node: Node = el("a").attr("title", r#"say "hi" & <bye>"#).build().unwrap().into();
        insta::assert_snapshot!(
            serialize(&node).unwrap(),
            @r#"<a title="say &#34;hi&#34; &amp; &lt;bye&gt;"></a>"#
        );
    }

    #[test]
    fn test_text_is_escaped_but_markup_is_not() {
        let node = Node::fragment(vec![Node::text("<b>"), Node::markup("<i>ok</i>")]);
        assert_eq!(serialize(&node).unwrap(), "&lt;b&gt;<i>ok</i>");
    }

    #[test]
    fn test_comment_and_doctype() {
        let node = Node::fragment(vec![Node::doctype("html"), Node::comment(" a --> b ")]);
        assert_eq!(serialize(&node).unwrap(), "<!DOCTYPE html><!-- a --&gt; b -->");
    }

    #[test]
    fn test_script_body_is_bulk_escaped() {
        let node: Node = el("script")
            .child(Node::text("if (a < b) "))
            .child(Node::text("{ go(); }"))
            .build()
            .unwrap()
            .into();
        assert_eq!(serialize(&node).unwrap(), "<script>if (a < b) { go(); }</script>");
        assert_eq!(
            chunks_of(&node),
            vec!["<script>", "if (a < b) { go(); }", "</script>"]
        );
    }

    #[test]
    fn test_style_body_is_bulk_escaped() {
        let node: Node = el("style").child(Node::text("p > a { x: '</style>' }")).build().unwrap().into();
        assert_eq!(
            serialize(&node).unwrap(),
            "<style>p > a { x: '\\3C /style>' }</style>"
        );
    }

    #[test]
    fn test_non_text_inside_raw_text_fails() {
        for tag in ["script", "style"] {
            let node: Node = el(tag).child(el("b").build().unwrap()).build().unwrap().into();
            let expected = SerializeError::NonTextInRawText {
                tag: tag.to_string(),
                found: "element",
            };
            assert_eq!(serialize(&node), Err(expected.clone()));
            let chunks: Vec<_> = serialize_chunks(&node).collect();
            assert_eq!(chunks.last(), Some(&Err(expected)));
        }
    }

    #[test]
    fn test_chunk_structure() {
        let node: Node = el("ul")
            .child(el("li").child(Node::text("A")).build().unwrap())
            .child(el("li").child(Node::text("B")).build().unwrap())
            .build()
            .unwrap()
            .into();
        assert_eq!(
            chunks_of(&node),
            vec!["<ul>", "<li>", "A", "</li>", "<li>", "B", "</li>", "</ul>"]
        );
    }

    #[test]
    fn test_chunks_concatenate_to_serialization() {
        let tree = Node::fragment(vec![
            Node::doctype("html"),
            el("html")
                .child(
                    el("body")
                        .attr("class", "a&b")
                        .child(Node::comment("c"))
                        .child(Node::fragment(vec![Node::text("x < y"), Node::markup("<hr />")]))
                        .child(el("img").attr("src", "/p.png").build().unwrap())
                        .child(el("script").child(Node::text("1 < 2")).build().unwrap())
                        .build()
                        .unwrap(),
                )
                .build()
                .unwrap()
                .into(),
        ]);
        let joined: String = chunks_of(&tree).concat();
        assert_eq!(joined, serialize(&tree).unwrap());
    }

    #[test]
    fn test_empty_fragment_serializes_to_nothing() {
        assert_eq!(serialize(&Node::empty()).unwrap(), "");
        assert!(chunks_of(&Node::empty()).is_empty());
    }
}
