//! The renderer: cache lookup, resolution and streaming

use std::fmt;
use std::sync::{Arc, LazyLock};

use futures::future::BoxFuture;
use futures::stream::{self, Stream, StreamExt};

use crate::config::RenderConfig;
use crate::node::Node;
use crate::parser::{MarkupParser, TNode, TemplateParser};
use crate::template::{Interpolation, Resolver, Template, TemplateCache};
use crate::RenderError;

/// Renders templates into nodes
///
/// Clones share the same template cache and parser.
#[derive(Clone)]
pub struct Renderer {
    cache: Arc<TemplateCache>,
    parser: Arc<dyn TemplateParser>,
    config: RenderConfig,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("cache", &self.cache)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self::with_config(RenderConfig::default())
    }

    pub fn with_config(config: RenderConfig) -> Self {
        Self {
            cache: Arc::new(TemplateCache::with_capacity(config.cache.capacity)),
            parser: Arc::new(MarkupParser),
            config,
        }
    }

    /// Use a different template parser
    pub fn with_parser(mut self, parser: impl TemplateParser + 'static) -> Self {
        self.parser = Arc::new(parser);
        self
    }

    /// Share an existing template cache
    pub fn with_cache(mut self, cache: Arc<TemplateCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &Arc<TemplateCache> {
        &self.cache
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// The cached placeholder tree for a template's literal shape
    pub fn tree(&self, template: &Template) -> Result<Arc<TNode>, RenderError> {
        Ok(self.cache.get_or_parse(template.key(), self.parser.as_ref())?)
    }

    /// Render without suspending; pending values are an error
    pub fn render(&self, template: &Template) -> Result<Node, RenderError> {
        let tree = self.tree(template)?;
        self.resolve(&tree, template.interpolations())
    }

    /// Render, awaiting deferred values and resolving siblings concurrently
    pub async fn render_async(&self, template: &Template) -> Result<Node, RenderError> {
        let tree = self.tree(template)?;
        self.resolve_async(&tree, template.interpolations()).await
    }

    /// Resolve an already parsed tree against its interpolations
    pub fn resolve(&self, tree: &TNode, interpolations: &[Interpolation]) -> Result<Node, RenderError> {
        Resolver::new(self, interpolations).resolve(tree)
    }

    pub fn resolve_async<'a>(
        &'a self,
        tree: &'a TNode,
        interpolations: &'a [Interpolation],
    ) -> BoxFuture<'a, Result<Node, RenderError>> {
        Resolver::new(self, interpolations).resolve_async(tree)
    }

    /// Render concurrently, then yield the serialized output chunk by chunk
    pub fn stream_async<'a>(
        &'a self,
        template: &'a Template,
    ) -> impl Stream<Item = Result<String, RenderError>> + Send + 'a {
        stream::once(self.render_async(template))
            .map(|rendered| match rendered {
                Ok(node) => stream::iter(node.chunks().map(|chunk| chunk.map_err(RenderError::from)))
                    .left_stream(),
                Err(err) => stream::iter(std::iter::once(Err(err))).right_stream(),
            })
            .flatten()
    }
}

static DEFAULT: LazyLock<Renderer> = LazyLock::new(Renderer::new);

/// The process-wide renderer behind the free functions
pub fn default_renderer() -> &'static Renderer {
    &DEFAULT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html;
    use futures::TryStreamExt;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_uses_cache() {
        let renderer = Renderer::new();
        for name in ["a", "b"] {
            renderer.render(&html!("<p>" {name} "</p>")).unwrap();
        }
        assert_eq!(renderer.cache().len(), 1);
        assert_eq!(renderer.cache().stats().hits, 1);
    }

    #[test]
    fn test_clones_share_cache() {
        let renderer = Renderer::new();
        let clone = renderer.clone();
        clone.render(&html!("<hr>")).unwrap();
        assert!(Arc::ptr_eq(renderer.cache(), clone.cache()));
        assert_eq!(renderer.cache().len(), 1);
    }

    #[test]
    fn test_custom_parser() {
        let renderer = Renderer::new().with_parser(
            |_: &crate::TemplateKey| -> Result<TNode, crate::ParseError> {
                Ok(TNode::DocumentType("html".to_string()))
            },
        );
        let node = renderer.render(&html!("ignored")).unwrap();
        assert_eq!(node.serialize().unwrap(), "<!DOCTYPE html>");
    }

    #[tokio::test]
    async fn test_stream_chunks_concatenate() {
        let renderer = Renderer::new();
        let template = html!("<ul><li>" {"a"} "</li><li>b</li></ul>");
        let chunks: Vec<String> = renderer.stream_async(&template).try_collect().await.unwrap();
        assert!(chunks.len() > 1);
        assert_eq!(chunks.concat(), "<ul><li>a</li><li>b</li></ul>");
    }

    #[tokio::test]
    async fn test_stream_reports_render_error() {
        let renderer = Renderer::new();
        let template = html!("<div>");
        let items: Vec<_> = renderer.stream_async(&template).collect().await;
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(RenderError::Parse(_))));
    }
}
