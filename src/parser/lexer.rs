//! Lexer for tag interiors using logos
//!
//! Text content is scanned by the grammar; only the inside of `<...>` is
//! tokenized here.

use logos::Logos;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r\x0C]+")]
pub enum TagToken {
    #[token("/>")]
    SelfClose,

    #[token(">")]
    End,

    #[token("=")]
    Equals,

    // Stray slash, as in `<div / >`
    #[token("/")]
    Slash,

    #[regex(r#""[^"]*""#, unquote)]
    #[regex(r#"'[^']*'"#, unquote)]
    Quoted(String),

    #[regex(r"\x{E000}[0-9]+\x{E001}", slot_index)]
    Slot(usize),

    // Tag and attribute names
    #[regex(r#"[^ \t\n\r\x0C"'=<>/\x{E000}\x{E001}]+"#, |lex| lex.slice().to_string())]
    Word(String),
}

fn unquote(lex: &mut logos::Lexer<TagToken>) -> String {
    let s = lex.slice();
    s[1..s.len() - 1].to_string()
}

fn slot_index(lex: &mut logos::Lexer<TagToken>) -> Option<usize> {
    lex.slice()
        .trim_matches(|c: char| c == super::SLOT_OPEN || c == super::SLOT_CLOSE)
        .parse()
        .ok()
}

/// Lex a tag interior into tokens with spans, dropping unrecognized input
pub fn lex(input: &str) -> impl Iterator<Item = (TagToken, Span)> + '_ {
    TagToken::lexer(input)
        .spanned()
        .filter_map(|(tok, span)| tok.ok().map(|t| (t, span)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::slot_marker;

    #[test]
    fn test_simple_tag() {
        let tokens: Vec<_> = lex(r#"div id="main">"#).map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![
                TagToken::Word("div".to_string()),
                TagToken::Word("id".to_string()),
                TagToken::Equals,
                TagToken::Quoted("main".to_string()),
                TagToken::End,
            ]
        );
    }

    #[test]
    fn test_self_closing_and_single_quotes() {
        let tokens: Vec<_> = lex("br class='break' />").map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![
                TagToken::Word("br".to_string()),
                TagToken::Word("class".to_string()),
                TagToken::Equals,
                TagToken::Quoted("break".to_string()),
                TagToken::SelfClose,
            ]
        );
    }

    #[test]
    fn test_slot_tokens() {
        let input = format!("{} name={} disabled/>", slot_marker(0), slot_marker(7));
        let tokens: Vec<_> = lex(&input).map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![
                TagToken::Slot(0),
                TagToken::Word("name".to_string()),
                TagToken::Equals,
                TagToken::Slot(7),
                TagToken::Word("disabled".to_string()),
                TagToken::SelfClose,
            ]
        );
    }

    #[test]
    fn test_quoted_value_keeps_markers() {
        let input = format!(r#"a href="/u/{}">"#, slot_marker(1));
        let tokens: Vec<_> = lex(&input).map(|(t, _)| t).collect();
        assert_eq!(tokens[3], TagToken::Quoted(format!("/u/{}", slot_marker(1))));
    }

    #[test]
    fn test_dashed_and_cased_names() {
        let tokens: Vec<_> = lex("svg viewBox data-user-id>").map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![
                TagToken::Word("svg".to_string()),
                TagToken::Word("viewBox".to_string()),
                TagToken::Word("data-user-id".to_string()),
                TagToken::End,
            ]
        );
    }
}
