//! Ambient context for nested components
//!
//! A [`Context`] is a named slot that components read without it being passed
//! down explicitly. Bindings form a persistent stack held in a tokio
//! task-local, so a binding made around a future follows that future across
//! suspension while futures polled outside the scope never see it.
//!
//! ```rust
//! use markup_weave::create_context;
//!
//! let theme = create_context::<String>("theme");
//! assert!(theme.get().is_err());
//! let inner = theme.provide("dark".to_string(), || theme.get());
//! assert_eq!(inner.unwrap(), "dark");
//! ```

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("context `{name}` is not provided and has no default")]
    NotFound { name: String },
}

tokio::task_local! {
    static BINDINGS: Bindings;
}

type Bindings = Option<Arc<Frame>>;

struct Frame {
    slot: u64,
    value: Arc<dyn Any + Send + Sync>,
    parent: Bindings,
}

static NEXT_SLOT: AtomicU64 = AtomicU64::new(0);

fn current() -> Bindings {
    BINDINGS.try_with(Clone::clone).ok().flatten()
}

fn lookup(slot: u64) -> Option<Arc<dyn Any + Send + Sync>> {
    let mut frame = current();
    while let Some(f) = frame {
        if f.slot == slot {
            return Some(Arc::clone(&f.value));
        }
        frame = f.parent.clone();
    }
    None
}

/// A named ambient value
pub struct Context<T> {
    slot: u64,
    name: Arc<str>,
    default: Option<T>,
    _marker: PhantomData<fn() -> T>,
}

/// Create a context with no default value
pub fn create_context<T>(name: &str) -> Context<T>
where
    T: Clone + Send + Sync + 'static,
{
    Context::new(name, None)
}

impl<T> Context<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn new(name: &str, default: Option<T>) -> Self {
        Self {
            slot: NEXT_SLOT.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            default,
            _marker: PhantomData,
        }
    }

    /// Create a context that falls back to `default` when nothing is provided
    pub fn with_default(name: &str, default: T) -> Self {
        Self::new(name, Some(default))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The innermost provided value, else the default
    pub fn get(&self) -> Result<T, ContextError> {
        lookup(self.slot)
            .and_then(|value| value.downcast_ref::<T>().cloned())
            .or_else(|| self.default.clone())
            .ok_or_else(|| ContextError::NotFound {
                name: self.name.to_string(),
            })
    }

    fn push(&self, value: T) -> Bindings {
        Some(Arc::new(Frame {
            slot: self.slot,
            value: Arc::new(value),
            parent: current(),
        }))
    }

    /// Run `body` with this context bound to `value`
    ///
    /// The previous binding is back in place when `body` returns or unwinds.
    pub fn provide<R>(&self, value: T, body: impl FnOnce() -> R) -> R {
        BINDINGS.sync_scope(self.push(value), body)
    }

    /// Run `future` with this context bound to `value` whenever it is polled
    pub fn provide_async<F>(&self, value: T, future: F) -> impl Future<Output = F::Output> + Send
    where
        F: Future + Send,
    {
        BINDINGS.scope(self.push(value), future)
    }
}

impl<T> Clone for Context<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        Self {
            slot: self.slot,
            name: Arc::clone(&self.name),
            default: self.default.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Context<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("name", &self.name)
            .field("has_default", &self.default.is_some())
            .finish()
    }
}
