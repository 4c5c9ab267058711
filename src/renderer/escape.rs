//! Escaping primitives for the four serialization contexts
//!
//! Each function is total over any input string.

use std::borrow::Cow;

/// Escape text for body-text and attribute-value contexts
pub fn escape_text(input: &str) -> Cow<'_, str> {
    if !input.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(input);
    }
    let mut out = String::with_capacity(input.len() + 16);
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Escape comment content so it cannot close the comment early
pub fn escape_comment(input: &str) -> Cow<'_, str> {
    if !input.contains(['<', '>']) {
        return Cow::Borrowed(input);
    }
    let mut out = input
        .replace("<!--", "&lt;!--")
        .replace("--!>", "--!&gt;")
        .replace("-->", "--&gt;");
    // A comment may not start with `>` or `->`
    if out.starts_with('>') {
        out.replace_range(..1, "&gt;");
    } else if out.starts_with("->") {
        out.replace_range(..2, "-&gt;");
    }
    Cow::Owned(out)
}

/// Escape a `<script>` body without entity-encoding ordinary code
pub fn escape_script(input: &str) -> Cow<'_, str> {
    escape_raw_body(input, &["<!--", "<script", "</script"], "\\x3C")
}

/// Escape a `<style>` body without entity-encoding ordinary CSS
pub fn escape_style(input: &str) -> Cow<'_, str> {
    escape_raw_body(input, &["</style"], "\\3C ")
}

/// Replace the `<` of every case-insensitive occurrence of a breakout pattern
fn escape_raw_body<'a>(input: &'a str, patterns: &[&str], replacement: &str) -> Cow<'a, str> {
    let lower = input.to_ascii_lowercase();
    let mut hits: Vec<usize> = patterns
        .iter()
        .flat_map(|p| lower.match_indices(p).map(|(i, _)| i))
        .collect();
    if hits.is_empty() {
        return Cow::Borrowed(input);
    }
    hits.sort_unstable();
    hits.dedup();

    let mut out = String::with_capacity(input.len() + hits.len() * replacement.len());
    let mut last = 0;
    for at in hits {
        out.push_str(&input[last..at]);
        out.push_str(replacement);
        last = at + 1;
    }
    out.push_str(&input[last..]);
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("plain"), "plain");
        assert_eq!(
            escape_text(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&#34;x&#34;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_escape_comment() {
        assert_eq!(escape_comment(" note "), " note ");
        assert_eq!(escape_comment("a --> b"), "a --&gt; b");
        assert_eq!(escape_comment("<!-- x"), "&lt;!-- x");
        assert_eq!(escape_comment(">start"), "&gt;start");
        assert_eq!(escape_comment("->start"), "-&gt;start");
    }

    #[test]
    fn test_escape_script_leaves_code_alone() {
        assert_eq!(escape_script("if (a < b && c > d) {}"), "if (a < b && c > d) {}");
        assert_eq!(escape_script("console.log('test');"), "console.log('test');");
    }

    #[test]
    fn test_escape_script_breakouts() {
        assert_eq!(
            escape_script("x = '</SCRIPT><script>'"),
            "x = '\\x3C/SCRIPT>\\x3Cscript>'"
        );
        assert_eq!(escape_script("<!-- hi"), "\\x3C!-- hi");
    }

    #[test]
    fn test_escape_style() {
        assert_eq!(escape_style("a > b { color: red }"), "a > b { color: red }");
        assert_eq!(escape_style("x</style>"), "x\\3C /style>");
    }
}
