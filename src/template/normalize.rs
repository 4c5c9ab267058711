//! Value normalization: runtime values into output nodes
//!
//! Both forms dispatch in the same fixed order: pending, string, node,
//! template, `false`/absent, sequence, stream, markup, callable, fallback.
//! Only the concurrent form can wait, so pending values and streams are a
//! usage error in the sequential form.

use futures::future::{self, BoxFuture, FutureExt};
use futures::stream::StreamExt;
use tracing::trace;

use crate::component::Callable;
use crate::engine::Renderer;
use crate::node::{flatten, Node};
use crate::value::Value;
use crate::RenderError;

impl Renderer {
    /// Turn a value into a node without suspending
    pub fn normalize(&self, value: &Value) -> Result<Node, RenderError> {
        match value {
            Value::Pending(_) => Err(RenderError::PendingInSync {
                context: "interpolated pending value".to_string(),
            }),
            Value::Str(s) => Ok(Node::text(s.clone())),
            Value::Node(node) => Ok(node.clone()),
            Value::Template(template) => self.render(template),
            Value::None | Value::Bool(false) => Ok(Node::empty()),
            Value::Seq(items) => {
                let nodes = items
                    .iter()
                    .map(|item| self.normalize(item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Node::fragment(flatten(nodes)))
            }
            Value::Stream(_) => Err(RenderError::PendingInSync {
                context: "interpolated stream".to_string(),
            }),
            Value::Markup(markup) => Ok(Node::markup(markup.to_html())),
            Value::Callable(callable) => {
                let result = callable.call_thunk()?;
                self.normalize_result(result, callable)
            }
            other => Ok(Node::text(other.fallback_text())),
        }
    }

    /// Normalize what a callable returned, naming it if the result must be awaited
    pub(crate) fn normalize_result(&self, result: Value, source: &Callable) -> Result<Node, RenderError> {
        if result.is_suspending() {
            return Err(RenderError::PendingInSync {
                context: format!("component `{}`", source.name()),
            });
        }
        self.normalize(&result)
    }

    /// Turn a value into a node, awaiting anything deferred
    ///
    /// Sequence items are normalized concurrently and reassembled in source
    /// order; streams are drained one item at a time.
    pub fn normalize_async(&self, value: Value) -> BoxFuture<'_, Result<Node, RenderError>> {
        async move {
            match value {
                Value::Pending(pending) => {
                    trace!("awaiting pending value");
                    let resolved = pending.await?;
                    self.normalize_async(resolved).await
                }
                Value::Str(s) => Ok(Node::text(s)),
                Value::Node(node) => Ok(node),
                Value::Template(template) => self.render_async(&template).await,
                Value::None | Value::Bool(false) => Ok(Node::empty()),
                Value::Seq(items) => {
                    let branches = items
                        .into_iter()
                        .map(|item| self.normalize_async(item))
                        .collect();
                    let nodes = self.gather(branches).await?;
                    Ok(Node::fragment(flatten(nodes)))
                }
                Value::Stream(stream) => {
                    trace!("draining value stream");
                    let mut stream = stream.take().ok_or(RenderError::StreamConsumed)?;
                    let mut nodes = Vec::new();
                    while let Some(item) = stream.next().await {
                        nodes.push(self.normalize_async(item).await?);
                    }
                    Ok(Node::fragment(flatten(nodes)))
                }
                Value::Markup(markup) => Ok(Node::markup(markup.to_html())),
                Value::Callable(callable) => {
                    let result = callable.call_thunk()?;
                    self.normalize_async(result).await
                }
                other => Ok(Node::text(other.fallback_text())),
            }
        }
        .boxed()
    }

    /// Await sibling branches, keeping source order
    ///
    /// With fan-out enabled all branches make progress together; the first
    /// error in source order wins once every branch has finished.
    pub(crate) async fn gather<'f>(
        &self,
        branches: Vec<BoxFuture<'f, Result<Node, RenderError>>>,
    ) -> Result<Vec<Node>, RenderError> {
        if self.config().fan_out {
            future::join_all(branches).await.into_iter().collect()
        } else {
            let mut nodes = Vec::with_capacity(branches.len());
            for branch in branches {
                nodes.push(branch.await?);
            }
            Ok(nodes)
        }
    }
}
