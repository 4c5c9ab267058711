//! Markup Weave - HTML templates with components, async values and streaming
//!
//! Templates are literal markup interleaved with runtime values. A template is
//! parsed once per literal shape, then resolved into an immutable [`Node`]
//! tree, either sequentially or concurrently, and serialized to a string or
//! to a lazy sequence of chunks.
//!
//! # Example
//!
//! ```rust
//! use markup_weave::{html, render};
//!
//! let items = vec!["one", "two"];
//! let list: Vec<_> = items.iter().map(|item| html!("<li>" {*item} "</li>")).collect();
//! let node = render(&html!("<ul class=" {"menu"} ">" {list} "</ul>")).unwrap();
//! assert_eq!(
//!     node.serialize().unwrap(),
//!     r#"<ul class="menu"><li>one</li><li>two</li></ul>"#
//! );
//! ```

pub mod component;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod node;
pub mod parser;
pub mod renderer;
pub mod template;
pub mod value;

pub use component::{Callable, InvocationError, Param, Props, Signature};
pub use config::{CacheConfig, ConfigError, RenderConfig};
pub use context::{create_context, Context, ContextError};
pub use engine::{default_renderer, Renderer};
pub use error::ParseError;
pub use node::{Attrs, Element, Fragment, Node, NodeError, Text};
pub use parser::{MarkupParser, TemplateParser};
pub use renderer::{serialize, serialize_chunks, Chunks, SerializeError};
pub use template::{
    CacheStats, EvictionPolicy, Interpolation, LeastRecentlyUsed, Mode, Template, TemplateBuilder,
    TemplateCache, TemplateKey, Unbounded,
};
pub use value::{Markup, ToHtml, Value, ValueStream};

use thiserror::Error;

/// Errors that can occur while rendering a template
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("invalid node: {0}")]
    Node(#[from] NodeError),

    #[error(transparent)]
    Invocation(#[from] InvocationError),

    /// A value that needs suspension reached the sequential engine
    #[error("{context} cannot be resolved synchronously; use the async renderer")]
    PendingInSync { context: String },

    #[error("serialization error: {0}")]
    Serialize(#[from] SerializeError),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("invalid value for attribute `{name}`: {reason}")]
    InvalidAttribute { name: String, reason: String },

    #[error("{context} only accepts text, found {kind}")]
    NotText { context: String, kind: &'static str },

    #[error("interpolation {index} out of range ({len} interpolations)")]
    InterpolationOutOfRange { index: usize, len: usize },

    #[error("stream value was already consumed")]
    StreamConsumed,

    #[error("template has {strings} literal segments for {interpolations} interpolations")]
    MalformedTemplate { strings: usize, interpolations: usize },

    /// Failure reported by a component's own code
    #[error("component `{component}` failed: {message}")]
    Component { component: String, message: String },
}

impl RenderError {
    /// Error for a component to return from its own body
    pub fn component(component: impl Into<String>, message: impl Into<String>) -> Self {
        RenderError::Component {
            component: component.into(),
            message: message.into(),
        }
    }
}

/// Render a template with the default renderer, without suspending
pub fn render(template: &Template) -> Result<Node, RenderError> {
    default_renderer().render(template)
}

/// Render a template with the default renderer, resolving siblings concurrently
///
/// ```rust
/// use markup_weave::{html, render_async, Value};
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let late = Value::pending(async { Ok(Value::from("later")) });
/// let node = render_async(&html!("<p>" {late} "</p>")).await.unwrap();
/// assert_eq!(node.serialize().unwrap(), "<p>later</p>");
/// # });
/// ```
pub async fn render_async(template: &Template) -> Result<Node, RenderError> {
    default_renderer().render_async(template).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_simple_element() {
        let node = render(&html!("<div id=\"main\">Hello</div>")).unwrap();
        assert_eq!(node.serialize().unwrap(), r#"<div id="main">Hello</div>"#);
    }

    #[test]
    fn test_render_escapes_values() {
        let node = render(&html!("<p>" {"<script>"} "</p>")).unwrap();
        assert_eq!(serialize(&node).unwrap(), "<p>&lt;script&gt;</p>");
    }

    #[test]
    fn test_render_parse_error() {
        let err = render(&html!("<div></span>")).unwrap_err();
        assert!(matches!(err, RenderError::Parse(ParseError::MismatchedClose { .. })));
    }

    #[test]
    fn test_component_error_message() {
        let err = RenderError::component("Card", "no title");
        assert_eq!(err.to_string(), "component `Card` failed: no title");
    }
}
