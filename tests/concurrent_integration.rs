//! Concurrent resolution: deferred values, sibling fan-out and ordering

use std::sync::Arc;
use std::time::Duration;

use futures::TryStreamExt;
use markup_weave::{
    create_context, html, render, render_async, Callable, Context, Props, RenderConfig, RenderError,
    Renderer, Signature, Template, Value,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use tokio::time::{sleep, Instant};

/// A component that waits `delay` milliseconds, records its label, then renders it
fn delayed_item(finished: Arc<Mutex<Vec<String>>>) -> Callable {
    Callable::from_async(
        "DelayedItem",
        Signature::new().required("label").required("delay"),
        move |props: Props| {
            let finished = Arc::clone(&finished);
            let label = props.get("label").and_then(Value::as_str).unwrap_or_default().to_string();
            let delay = props
                .get("delay")
                .and_then(Value::as_str)
                .and_then(|d| d.parse().ok())
                .unwrap_or(0);
            async move {
                sleep(Duration::from_millis(delay)).await;
                finished.lock().push(label.clone());
                Ok(Value::from(html!("<li>" {label} "</li>")))
            }
        },
    )
}

fn three_items(item: &Callable) -> Template {
    html!(
        "<ul>"
        "<" {item.clone()} " label=\"1\" delay=\"30\" />"
        "<" {item.clone()} " label=\"2\" delay=\"10\" />"
        "<" {item.clone()} " label=\"3\" delay=\"20\" />"
        "</ul>"
    )
}

#[tokio::test(start_paused = true)]
async fn test_out_of_order_siblings_keep_source_order() {
    let finished = Arc::new(Mutex::new(Vec::new()));
    let template = three_items(&delayed_item(Arc::clone(&finished)));

    let started = Instant::now();
    let node = render_async(&template).await.unwrap();

    assert_eq!(*finished.lock(), vec!["2", "3", "1"]);
    assert_eq!(
        node.serialize().unwrap(),
        "<ul><li>1</li><li>2</li><li>3</li></ul>"
    );
    // Siblings overlap: total time is the slowest sibling, not the sum
    assert!(started.elapsed() < Duration::from_millis(60));
}

#[tokio::test(start_paused = true)]
async fn test_sequential_fan_in_when_fan_out_disabled() {
    let renderer = Renderer::with_config(RenderConfig::new().with_fan_out(false));
    let finished = Arc::new(Mutex::new(Vec::new()));
    let template = three_items(&delayed_item(Arc::clone(&finished)));

    let node = renderer.render_async(&template).await.unwrap();

    assert_eq!(*finished.lock(), vec!["1", "2", "3"]);
    assert_eq!(
        node.serialize().unwrap(),
        "<ul><li>1</li><li>2</li><li>3</li></ul>"
    );
}

#[tokio::test]
async fn test_sync_and_async_output_match() {
    let badge = Callable::new("Badge", Signature::new().required("kind").optional("children"), |props| {
        let kind = props.get("kind").cloned().unwrap_or(Value::None);
        let children = props.get("children").cloned().unwrap_or(Value::None);
        Ok(Value::from(html!("<span class=\"badge " {kind} "\">" {children} "</span>")))
    });
    let rows: Vec<Template> = (1..=3).map(|i| html!("<tr><td>" {i} "</td></tr>")).collect();
    let template = html!(
        "<!DOCTYPE html><main data-count=" {3} ">"
        "<" {badge.clone()} " kind=\"new\">fresh &amp; hot</" {badge} ">"
        "<table>" {rows} "</table><!-- " {"end"} " --></main>"
    );

    let sequential = render(&template).unwrap().serialize().unwrap();
    let concurrent = render_async(&template).await.unwrap().serialize().unwrap();
    assert_eq!(sequential, concurrent);
    insta::assert_snapshot!(
        concurrent,
        @r#"<!DOCTYPE html><main data-count="3"><span class="badge new">fresh &amp; hot</span><table><tr><td>1</td></tr><tr><td>2</td></tr><tr><td>3</td></tr></table><!-- end --></main>"#
    );
}

#[tokio::test]
async fn test_pending_values_and_thunks() {
    let late = Value::pending(async { Ok(Value::from(html!("<em>late</em>"))) });
    let nested = Value::pending(async { Ok(Value::pending(async { Ok(Value::from("deep")) })) });
    let now = Callable::thunk("now", || Value::pending(async { Ok(Value::from("noon")) }));
    let template = html!("<p>" {late.clone()} " " {nested} " " {now} " " {late} "</p>");

    let node = render_async(&template).await.unwrap();
    assert_eq!(node.serialize().unwrap(), "<p><em>late</em> deep noon <em>late</em></p>");
}

#[tokio::test]
async fn test_streams_are_drained_in_order() {
    let items = futures::stream::iter(vec![Value::from("a"), Value::from(html!("<b>b</b>")), Value::from(3)]);
    let template = html!("<div>" {Value::stream(items)} "</div>");
    let node = render_async(&template).await.unwrap();
    assert_eq!(node.serialize().unwrap(), "<div>a<b>b</b>3</div>");

    // The stream was consumed by the first render
    let err = render_async(&template).await.unwrap_err();
    assert!(matches!(err, RenderError::StreamConsumed));
}

#[tokio::test(start_paused = true)]
async fn test_first_error_wins_without_partial_output() {
    let slow_fail = Value::pending(async {
        sleep(Duration::from_millis(20)).await;
        Err(RenderError::component("SlowFail", "first in source order"))
    });
    let fast_fail = Value::pending(async {
        sleep(Duration::from_millis(5)).await;
        Err(RenderError::component("FastFail", "finished first"))
    });
    let template = html!("<div><p>" {slow_fail} "</p><p>" {fast_fail} "</p></div>");

    let err = render_async(&template).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "component `SlowFail` failed: first in source order"
    );
}

#[tokio::test]
async fn test_stream_async_yields_chunks() {
    let renderer = Renderer::new();
    let late = Value::pending(async { Ok(Value::from("x")) });
    let template = html!("<section><h1>" {late} "</h1><br></section>");
    let chunks: Vec<String> = renderer.stream_async(&template).try_collect().await.unwrap();
    assert_eq!(
        chunks,
        vec!["<section>", "<h1>", "x", "</h1>", "<br />", "</section>"]
    );
}

/// Reads a context after a short suspension
fn context_reader(context: &Context<&'static str>) -> Callable {
    let context = context.clone();
    Callable::from_async("ContextReader", Signature::new(), move |_| {
        let context = context.clone();
        async move {
            sleep(Duration::from_millis(5)).await;
            Ok(Value::from(context.get()?))
        }
    })
}

#[tokio::test(start_paused = true)]
async fn test_context_follows_subtree_but_not_siblings() {
    let theme = Context::with_default("theme", "light");
    let dark = {
        let theme = theme.clone();
        Callable::from_async("Dark", Signature::new(), move |_| {
            let inner = html!("<b>" {context_reader(&theme)} "</b>");
            theme.provide_async("dark", async move { render_async(&inner).await.map(Value::from) })
        })
    };
    let template = html!("<div>" {dark} " " {context_reader(&theme)} "</div>");

    let node = render_async(&template).await.unwrap();
    assert_eq!(node.serialize().unwrap(), "<div><b>dark</b> light</div>");
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_renders_do_not_share_bindings() {
    let user = create_context::<&'static str>("user");
    let template = html!("<p>" {context_reader(&user)} "</p>");

    let ada = user.provide_async("ada", render_async(&template));
    let bob = user.provide_async("bob", render_async(&template));
    let (ada, bob) = futures::join!(ada, bob);

    assert_eq!(ada.unwrap().serialize().unwrap(), "<p>ada</p>");
    assert_eq!(bob.unwrap().serialize().unwrap(), "<p>bob</p>");
}
