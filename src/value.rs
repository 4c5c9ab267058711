//! Runtime values that can be interpolated into a template
//!
//! [`Value`] is the closed set of shapes the normalizer understands. Anything
//! else can still be interpolated through [`Value::display`], which renders
//! its `Display` text.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use futures::stream::{BoxStream, Stream, StreamExt};
use parking_lot::Mutex;

use crate::component::Callable;
use crate::node::{Element, Node};
use crate::template::Template;
use crate::RenderError;

/// A deferred value, awaited by the concurrent engine
pub type Pending = Shared<BoxFuture<'static, Result<Value, RenderError>>>;

/// Objects that produce already-safe markup
///
/// The returned string is emitted verbatim, without escaping.
pub trait ToHtml: Send + Sync {
    fn to_html(&self) -> String;
}

/// A string of trusted markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markup(pub String);

impl Markup {
    pub fn new(markup: impl Into<String>) -> Self {
        Markup(markup.into())
    }
}

impl ToHtml for Markup {
    fn to_html(&self) -> String {
        self.0.clone()
    }
}

/// An asynchronously produced sequence of values, drained once
#[derive(Clone)]
pub struct ValueStream {
    inner: Arc<Mutex<Option<BoxStream<'static, Value>>>>,
}

impl ValueStream {
    pub fn new(stream: impl Stream<Item = Value> + Send + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(stream.boxed()))),
        }
    }

    /// Take the stream for draining; `None` once it has been taken
    pub(crate) fn take(&self) -> Option<BoxStream<'static, Value>> {
        self.inner.lock().take()
    }
}

/// A runtime value interpolated into a template or returned by a component
#[derive(Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Markup(Arc<dyn ToHtml>),
    Node(Node),
    Template(Template),
    Seq(Vec<Value>),
    Stream(ValueStream),
    Callable(Callable),
    Pending(Pending),
    Display(Arc<dyn fmt::Display + Send + Sync>),
}

impl Value {
    /// A value that becomes available later
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<Value, RenderError>> + Send + 'static,
    {
        Value::Pending(future.boxed().shared())
    }

    /// A sequence produced asynchronously
    pub fn stream(stream: impl Stream<Item = Value> + Send + 'static) -> Self {
        Value::Stream(ValueStream::new(stream))
    }

    /// Safe markup, emitted without escaping
    pub fn markup(markup: impl ToHtml + 'static) -> Self {
        Value::Markup(Arc::new(markup))
    }

    /// Any `Display` value, rendered as its text
    pub fn display(value: impl fmt::Display + Send + Sync + 'static) -> Self {
        Value::Display(Arc::new(value))
    }

    /// Short name of the value's shape, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Markup(_) => "markup",
            Value::Node(_) => "node",
            Value::Template(_) => "template",
            Value::Seq(_) => "sequence",
            Value::Stream(_) => "stream",
            Value::Callable(_) => "callable",
            Value::Pending(_) => "pending value",
            Value::Display(_) => "display value",
        }
    }

    /// True for values that need suspension to resolve
    pub fn is_suspending(&self) -> bool {
        matches!(self, Value::Pending(_) | Value::Stream(_))
    }

    /// Borrow the string if this is a `Str`
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Plain-text rendition for text-only contexts (attributes, comments)
    ///
    /// `None` for shapes that have no plain-text form.
    pub fn plain_text(&self) -> Option<String> {
        match self {
            Value::None => Some(String::new()),
            Value::Str(s) => Some(s.clone()),
            Value::Markup(m) => Some(m.to_html()),
            Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Display(_) => {
                Some(self.fallback_text())
            }
            _ => None,
        }
    }

    /// Default text representation, used by the normalizer's last case
    pub(crate) fn fallback_text(&self) -> String {
        match self {
            Value::None => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(x) => format!("{:?}", x),
            Value::Str(s) => s.clone(),
            Value::Display(d) => d.to_string(),
            other => format!("<{}>", other.kind()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Value::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Value::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Value::Markup(m) => f.debug_tuple("Markup").field(&m.to_html()).finish(),
            Value::Node(n) => f.debug_tuple("Node").field(n).finish(),
            Value::Template(t) => f.debug_tuple("Template").field(&t.key().to_string()).finish(),
            Value::Seq(items) => f.debug_tuple("Seq").field(items).finish(),
            Value::Stream(_) => f.write_str("Stream(..)"),
            Value::Callable(c) => f.debug_tuple("Callable").field(&c.name()).finish(),
            Value::Pending(_) => f.write_str("Pending(..)"),
            Value::Display(d) => f.debug_tuple("Display").field(&d.to_string()).finish(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Str(s.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(i: $ty) -> Self {
                    Value::Int(i as i64)
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32, usize);

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::Float(x as f64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<Markup> for Value {
    fn from(m: Markup) -> Self {
        Value::Markup(Arc::new(m))
    }
}

impl From<Node> for Value {
    fn from(n: Node) -> Self {
        Value::Node(n)
    }
}

impl From<Element> for Value {
    fn from(e: Element) -> Self {
        Value::Node(Node::Element(e))
    }
}

impl From<Template> for Value {
    fn from(t: Template) -> Self {
        Value::Template(t)
    }
}

impl From<Callable> for Value {
    fn from(c: Callable) -> Self {
        Value::Callable(c)
    }
}

impl From<ValueStream> for Value {
    fn from(s: ValueStream) -> Self {
        Value::Stream(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Seq(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(option: Option<T>) -> Self {
        option.map(Into::into).unwrap_or(Value::None)
    }
}

impl<T: Into<Value>> FromIterator<T> for Value {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Value::Seq(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert!(matches!(Value::from("x"), Value::Str(ref s) if s == "x"));
        assert!(matches!(Value::from(3u8), Value::Int(3)));
        assert!(matches!(Value::from(false), Value::Bool(false)));
        assert!(matches!(Value::from(None::<String>), Value::None));
        assert!(matches!(Value::from(vec!["a", "b"]), Value::Seq(ref v) if v.len() == 2));
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(Value::from(2.5).plain_text().as_deref(), Some("2.5"));
        assert_eq!(Value::from(1.0).plain_text().as_deref(), Some("1.0"));
        assert_eq!(Value::from(true).plain_text().as_deref(), Some("true"));
        assert_eq!(Value::None.plain_text().as_deref(), Some(""));
        assert_eq!(Value::markup(Markup::new("<b>")).plain_text().as_deref(), Some("<b>"));
        assert_eq!(Value::from(Node::text("x")).plain_text(), None);
    }

    #[test]
    fn test_display_fallback() {
        struct Point(i32, i32);
        impl fmt::Display for Point {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "({}, {})", self.0, self.1)
            }
        }
        assert_eq!(Value::display(Point(1, 2)).fallback_text(), "(1, 2)");
    }

    #[test]
    fn test_stream_taken_once() {
        let value = ValueStream::new(futures::stream::iter(vec![Value::from(1)]));
        let copy = value.clone();
        assert!(value.take().is_some());
        assert!(copy.take().is_none());
    }

    #[test]
    fn test_suspending_kinds() {
        assert!(Value::pending(async { Ok(Value::None) }).is_suspending());
        assert!(!Value::from("x").is_suspending());
    }
}
