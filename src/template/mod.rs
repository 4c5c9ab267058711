//! Templates: literal segments interleaved with runtime values
//!
//! A [`Template`] is what a caller renders. Its literal shape (segments plus
//! [`Mode`]) forms the [`TemplateKey`] under which the parsed placeholder
//! tree is cached; interpolated values never take part in the key.
//!
//! # Example
//!
//! ```rust
//! use markup_weave::{html, render};
//!
//! let name = "World";
//! let node = render(&html!("<p>Hello, " {name} "!</p>")).unwrap();
//! assert_eq!(node.serialize().unwrap(), "<p>Hello, World!</p>");
//! ```

mod cache;
mod normalize;
mod resolver;

pub use cache::{CacheStats, EvictionPolicy, LeastRecentlyUsed, TemplateCache, Unbounded};
pub(crate) use resolver::Resolver;

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::value::Value;

/// Parsing mode; SVG mode preserves tag and attribute casing throughout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    Html,
    Svg,
}

/// One runtime value at a fixed template position
#[derive(Debug, Clone)]
pub struct Interpolation {
    pub value: Value,
    /// Source text of the interpolated expression
    pub expression: Cow<'static, str>,
}

impl Interpolation {
    pub fn new(value: impl Into<Value>, expression: impl Into<Cow<'static, str>>) -> Self {
        Self {
            value: value.into(),
            expression: expression.into(),
        }
    }
}

/// Cache key: literal segments plus mode, never interpolated values
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateKey {
    strings: Arc<[Cow<'static, str>]>,
    mode: Mode,
}

impl TemplateKey {
    pub fn new(strings: impl Into<Arc<[Cow<'static, str>]>>, mode: Mode) -> Self {
        Self {
            strings: strings.into(),
            mode,
        }
    }

    pub fn strings(&self) -> &[Cow<'static, str>] {
        &self.strings
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, s) in self.strings.iter().enumerate() {
            if i > 0 {
                write!(f, "{{{}}}", i - 1)?;
            }
            f.write_str(s)?;
        }
        Ok(())
    }
}

/// A template ready to render
#[derive(Debug, Clone)]
pub struct Template {
    key: TemplateKey,
    interpolations: Arc<[Interpolation]>,
}

impl Template {
    /// Build a template from literal segments and interpolations
    ///
    /// There must be exactly one more segment than interpolations.
    pub fn new(
        strings: Vec<Cow<'static, str>>,
        interpolations: Vec<Interpolation>,
        mode: Mode,
    ) -> Result<Self, crate::RenderError> {
        if strings.len() != interpolations.len() + 1 {
            return Err(crate::RenderError::MalformedTemplate {
                strings: strings.len(),
                interpolations: interpolations.len(),
            });
        }
        Ok(Self {
            key: TemplateKey::new(strings, mode),
            interpolations: interpolations.into(),
        })
    }

    pub fn builder(mode: Mode) -> TemplateBuilder {
        TemplateBuilder::new(mode)
    }

    pub fn key(&self) -> &TemplateKey {
        &self.key
    }

    pub fn strings(&self) -> &[Cow<'static, str>] {
        self.key.strings()
    }

    pub fn interpolations(&self) -> &[Interpolation] {
        &self.interpolations
    }

    pub fn mode(&self) -> Mode {
        self.key.mode
    }
}

/// Incremental template construction; adjacent literals are merged and
/// adjacent values get an empty literal between them
#[derive(Debug)]
pub struct TemplateBuilder {
    mode: Mode,
    strings: Vec<Cow<'static, str>>,
    current: Option<Cow<'static, str>>,
    interpolations: Vec<Interpolation>,
}

impl TemplateBuilder {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            strings: Vec::new(),
            current: None,
            interpolations: Vec::new(),
        }
    }

    pub fn literal(mut self, text: impl Into<Cow<'static, str>>) -> Self {
        let text = text.into();
        self.current = Some(match self.current.take() {
            None => text,
            Some(prev) => Cow::Owned(format!("{}{}", prev, text)),
        });
        self
    }

    pub fn value(mut self, value: impl Into<Value>, expression: impl Into<Cow<'static, str>>) -> Self {
        self.strings.push(self.current.take().unwrap_or(Cow::Borrowed("")));
        self.interpolations.push(Interpolation::new(value, expression));
        self
    }

    pub fn build(mut self) -> Template {
        self.strings.push(self.current.take().unwrap_or(Cow::Borrowed("")));
        Template {
            key: TemplateKey::new(self.strings, self.mode),
            interpolations: self.interpolations.into(),
        }
    }
}

/// Build an HTML [`Template`] from string literals and `{expr}` values
///
/// ```rust
/// use markup_weave::html;
///
/// let href = "/home";
/// let template = html!("<a href=" {href} ">Home</a>");
/// assert_eq!(template.interpolations()[0].expression, "href");
/// ```
#[macro_export]
macro_rules! html {
    ($($parts:tt)*) => {
        $crate::__template!(@build $crate::TemplateBuilder::new($crate::Mode::Html); $($parts)*)
    };
}

/// Build an SVG [`Template`]; tag and attribute casing is preserved
#[macro_export]
macro_rules! svg {
    ($($parts:tt)*) => {
        $crate::__template!(@build $crate::TemplateBuilder::new($crate::Mode::Svg); $($parts)*)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __template {
    (@build $builder:expr;) => {
        $builder.build()
    };
    (@build $builder:expr; $lit:literal $($rest:tt)*) => {
        $crate::__template!(@build $builder.literal($lit); $($rest)*)
    };
    (@build $builder:expr; {$value:expr} $($rest:tt)*) => {
        $crate::__template!(@build $builder.value($value, stringify!($value)); $($rest)*)
    };
}
