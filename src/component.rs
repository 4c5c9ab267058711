//! Component callables and the invocation protocol
//!
//! A component is a [`Callable`] placed in tag position: `<{Card} title="x">`.
//! Its [`Signature`] is fixed when the callable is built, so binding never
//! inspects the function itself.

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use indexmap::IndexMap;
use thiserror::Error;
use tracing::debug;

use crate::node::Node;
use crate::value::Value;
use crate::RenderError;

/// Keyword arguments passed to a component, in binding order
pub type Props = IndexMap<String, Value>;

/// Reserved keyword under which resolved children are forwarded
pub const CHILDREN: &str = "children";

/// Errors raised while binding and invoking a component
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvocationError {
    #[error("component target `{expression}` is not callable (found {kind})")]
    NotCallable { expression: String, kind: &'static str },

    #[error("closing component `{end}` does not match opening component `{start}`")]
    MismatchedComponent { start: String, end: String },

    #[error("component `{component}` requires a positional parameter; markup attributes are keyword-only")]
    PositionalParameter { component: String },

    #[error("component `{component}` is missing required parameters: {}", .names.join(", "))]
    MissingParameters { component: String, names: Vec<String> },
}

/// One named parameter of a component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub required: bool,
}

/// What a callable accepts, as seen by the binder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<Param>,
    /// Accepts keywords it does not declare
    pub accepts_extra: bool,
    /// Declares a required parameter that can only be passed by position
    pub positional_required: bool,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, name: impl Into<String>) -> Self {
        self.params.push(Param {
            name: name.into(),
            required: true,
        });
        self
    }

    pub fn optional(mut self, name: impl Into<String>) -> Self {
        self.params.push(Param {
            name: name.into(),
            required: false,
        });
        self
    }

    pub fn extra_keywords(mut self) -> Self {
        self.accepts_extra = true;
        self
    }

    pub fn positional(mut self) -> Self {
        self.positional_required = true;
        self
    }

    /// Whether a keyword of this name is bound
    pub fn accepts(&self, name: &str) -> bool {
        self.accepts_extra || self.params.iter().any(|p| p.name == name)
    }

    fn required_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().filter(|p| p.required).map(|p| p.name.as_str())
    }
}

type ComponentFn = dyn Fn(Props) -> Result<Value, RenderError> + Send + Sync;

struct Inner {
    name: Cow<'static, str>,
    signature: Signature,
    func: Box<ComponentFn>,
}

/// A shareable function invoked from a template
///
/// Clones share identity: two clones of one callable are [`Callable::same`].
#[derive(Clone)]
pub struct Callable {
    inner: Arc<Inner>,
}

impl Callable {
    pub fn new<F>(name: impl Into<Cow<'static, str>>, signature: Signature, func: F) -> Self
    where
        F: Fn(Props) -> Result<Value, RenderError> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                signature,
                func: Box::new(func),
            }),
        }
    }

    /// A zero-argument callable, invoked when it is normalized
    pub fn thunk<F, V>(name: impl Into<Cow<'static, str>>, func: F) -> Self
    where
        F: Fn() -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        Self::new(name, Signature::new(), move |_| Ok(func().into()))
    }

    /// A callable whose result arrives later
    ///
    /// The returned future only makes progress in the concurrent engine;
    /// the sequential engine reports it as a usage error.
    pub fn from_async<F, Fut>(name: impl Into<Cow<'static, str>>, signature: Signature, func: F) -> Self
    where
        F: Fn(Props) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, RenderError>> + Send + 'static,
    {
        Self::new(name, signature, move |props| Ok(Value::pending(func(props))))
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn signature(&self) -> &Signature {
        &self.inner.signature
    }

    /// Identity comparison
    pub fn same(&self, other: &Callable) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Call with already bound keyword arguments
    pub fn call(&self, props: Props) -> Result<Value, RenderError> {
        (self.inner.func)(props)
    }

    /// Reject signatures that markup cannot satisfy
    pub(crate) fn check_invocable(&self) -> Result<(), InvocationError> {
        if self.inner.signature.positional_required {
            return Err(InvocationError::PositionalParameter {
                component: self.name().to_string(),
            });
        }
        Ok(())
    }

    /// Call with no arguments, as done when a callable is interpolated
    pub(crate) fn call_thunk(&self) -> Result<Value, RenderError> {
        self.check_invocable()?;
        let missing: Vec<String> = self
            .signature()
            .required_names()
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(InvocationError::MissingParameters {
                component: self.name().to_string(),
                names: missing,
            }
            .into());
        }
        self.call(Props::new())
    }

    /// Bind attributes and children to this callable's parameters
    ///
    /// Attribute names are translated from `kebab-case` to `snake_case`;
    /// anything the signature does not accept is dropped.
    pub(crate) fn bind(&self, attrs: Props, children: Vec<Node>) -> Result<Props, InvocationError> {
        let signature = self.signature();
        let mut props = Props::with_capacity(attrs.len() + 1);
        for (name, value) in attrs {
            let name = kebab_to_snake(&name);
            if signature.accepts(&name) {
                props.insert(name, value);
            }
        }
        if signature.accepts(CHILDREN) {
            props.insert(
                CHILDREN.to_string(),
                Value::Seq(children.into_iter().map(Value::Node).collect()),
            );
        }

        let missing: Vec<String> = signature
            .required_names()
            .filter(|name| !props.contains_key(*name))
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(InvocationError::MissingParameters {
                component: self.name().to_string(),
                names: missing,
            });
        }
        Ok(props)
    }

    /// Bind and call, as done for a component node
    pub(crate) fn invoke(&self, attrs: Props, children: Vec<Node>) -> Result<Value, RenderError> {
        self.check_invocable()?;
        let props = self.bind(attrs, children)?;
        debug!(component = self.name(), props = props.len(), "invoking component");
        self.call(props)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("name", &self.inner.name)
            .field("signature", &self.inner.signature)
            .finish_non_exhaustive()
    }
}

/// Resolve the callee of a component node and check the closing tag agrees
pub(crate) fn callee(
    start: &Value,
    start_expression: &str,
    end: Option<(&Value, &str)>,
) -> Result<Callable, InvocationError> {
    let Value::Callable(callable) = start else {
        return Err(InvocationError::NotCallable {
            expression: start_expression.to_string(),
            kind: start.kind(),
        });
    };
    if let Some((end, end_expression)) = end {
        let matches = matches!(end, Value::Callable(other) if other.same(callable));
        if !matches {
            return Err(InvocationError::MismatchedComponent {
                start: start_expression.to_string(),
                end: end_expression.to_string(),
            });
        }
    }
    callable.check_invocable()?;
    Ok(callable.clone())
}

pub(crate) fn kebab_to_snake(name: &str) -> String {
    name.replace('-', "_")
}
