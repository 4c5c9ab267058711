//! Character reference decoding for literal template text
//!
//! Literal text and attribute values are decoded once at parse time and
//! escaped again at serialization, so `&amp;` in a template round-trips.

use std::borrow::Cow;

use super::{SLOT_CLOSE, SLOT_OPEN};

const NAMED: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{A0}'),
    ("copy", '\u{A9}'),
    ("mdash", '\u{2014}'),
    ("ndash", '\u{2013}'),
    ("hellip", '\u{2026}'),
];

// Longest reference body we look at, e.g. `#x10FFFF`
const MAX_REFERENCE: usize = 10;

/// Decode `&name;`, `&#NN;` and `&#xNN;` references; unknown ones stay as written
pub fn decode_entities(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let decoded = after
            .char_indices()
            .take(MAX_REFERENCE + 1)
            .find(|(_, c)| *c == ';')
            .and_then(|(semi, _)| reference(&after[..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn reference(body: &str) -> Option<char> {
    let c = if let Some(numeric) = body.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse().ok()?,
        };
        char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
    } else {
        NAMED.iter().find(|(name, _)| *name == body).map(|(_, c)| *c)?
    };
    // Slot markers can only come from interpolations
    Some(match c {
        SLOT_OPEN | SLOT_CLOSE | '\0' => char::REPLACEMENT_CHARACTER,
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_and_numeric() {
        assert_eq!(decode_entities("a &amp; b &lt;3 &#65;&#x42;"), "a & b <3 AB");
    }

    #[test]
    fn test_unknown_and_unterminated_stay() {
        assert_eq!(decode_entities("&bogus; & &amp"), "&bogus; & &amp");
    }

    #[test]
    fn test_plain_text_is_borrowed() {
        assert!(matches!(decode_entities("plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn test_markers_cannot_be_forged() {
        assert_eq!(decode_entities("&#xE000;0&#xE001;"), "\u{FFFD}0\u{FFFD}");
    }
}
