//! Placeholder tree: literal markup structure plus interpolation slot positions

/// A run of literal text interleaved with interpolation slots
///
/// `strings` always holds one more entry than `slots`; slot `i` sits between
/// `strings[i]` and `strings[i + 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRef {
    pub strings: Vec<String>,
    pub slots: Vec<usize>,
}

/// One piece of a [`TemplateRef`], in source order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Part<'a> {
    Literal(&'a str),
    Slot(usize),
}

impl TemplateRef {
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            strings: vec![text.into()],
            slots: vec![],
        }
    }

    /// Split text containing slot markers into literal runs and slot indices
    pub fn split(text: &str) -> Self {
        let mut strings = Vec::new();
        let mut slots = Vec::new();
        let mut current = String::new();
        let mut rest = text;
        while let Some(open) = rest.find(super::SLOT_OPEN) {
            let after = &rest[open + super::SLOT_OPEN.len_utf8()..];
            let Some(close) = after.find(super::SLOT_CLOSE) else {
                break;
            };
            let Ok(index) = after[..close].parse::<usize>() else {
                break;
            };
            current.push_str(&rest[..open]);
            strings.push(std::mem::take(&mut current));
            slots.push(index);
            rest = &after[close + super::SLOT_CLOSE.len_utf8()..];
        }
        current.push_str(rest);
        strings.push(current);
        Self { strings, slots }
    }

    /// True when no interpolation takes part in this run
    pub fn is_literal(&self) -> bool {
        self.slots.is_empty()
    }

    /// A lone slot with no surrounding literal text
    pub fn single_slot(&self) -> Option<usize> {
        match (self.slots.as_slice(), self.strings.as_slice()) {
            ([index], [before, after]) if before.is_empty() && after.is_empty() => Some(*index),
            _ => None,
        }
    }

    /// Iterate parts in source order, skipping empty literals
    pub fn parts(&self) -> impl Iterator<Item = Part<'_>> {
        let literals = self.strings.iter().map(|s| Part::Literal(s.as_str()));
        let slots = self.slots.iter().map(|i| Part::Slot(*i));
        interleave(literals, slots).filter(|part| !matches!(part, Part::Literal("")))
    }
}

fn interleave<'a>(
    mut literals: impl Iterator<Item = Part<'a>>,
    mut slots: impl Iterator<Item = Part<'a>>,
) -> impl Iterator<Item = Part<'a>> {
    let mut take_literal = true;
    std::iter::from_fn(move || {
        let next = if take_literal {
            literals.next()
        } else {
            slots.next()
        };
        take_literal = !take_literal;
        next
    })
}

/// An attribute as written in the template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TAttr {
    /// `name="value"` or bare `name`
    Static { name: String, value: Option<String> },
    /// `name={x}`: the whole value comes from one interpolation
    Slot { name: String, index: usize },
    /// `name="a {x} b"`: literal text mixed with interpolations
    Templated { name: String, value: TemplateRef },
}

impl TAttr {
    pub fn name(&self) -> &str {
        match self {
            TAttr::Static { name, .. } | TAttr::Slot { name, .. } | TAttr::Templated { name, .. } => {
                name
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TElement {
    pub tag: String,
    pub attrs: Vec<TAttr>,
    pub children: Vec<TNode>,
}

/// `<{callee} ...>...</{callee}>` or `<{callee} ... />`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TComponent {
    pub start: usize,
    pub end: Option<usize>,
    pub attrs: Vec<TAttr>,
    pub children: Vec<TNode>,
}

/// A node of the placeholder tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TNode {
    Text(TemplateRef),
    Comment(TemplateRef),
    DocumentType(String),
    Fragment(Vec<TNode>),
    Element(TElement),
    Component(TComponent),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::slot_marker;

    #[test]
    fn test_split_literal() {
        let r = TemplateRef::split("hello");
        assert!(r.is_literal());
        assert_eq!(r.parts().collect::<Vec<_>>(), vec![Part::Literal("hello")]);
    }

    #[test]
    fn test_split_slots() {
        let text = format!("a {} b{}", slot_marker(0), slot_marker(12));
        let r = TemplateRef::split(&text);
        assert_eq!(r.strings, vec!["a ", " b", ""]);
        assert_eq!(r.slots, vec![0, 12]);
        assert_eq!(
            r.parts().collect::<Vec<_>>(),
            vec![
                Part::Literal("a "),
                Part::Slot(0),
                Part::Literal(" b"),
                Part::Slot(12)
            ]
        );
    }

    #[test]
    fn test_single_slot() {
        assert_eq!(TemplateRef::split(&slot_marker(3)).single_slot(), Some(3));
        assert_eq!(TemplateRef::split(&format!("x{}", slot_marker(3))).single_slot(), None);
    }
}
