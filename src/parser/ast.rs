//! Syntax tree for brace templates

pub use crate::error::Span;

/// Node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// A parsed brace template
#[derive(Debug, Clone, PartialEq)]
pub struct BraceTemplate {
    pub segments: Vec<Spanned<Segment>>,
}

impl BraceTemplate {
    /// Root variable names in first-occurrence order, without duplicates
    pub fn variable_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for segment in &self.segments {
            if let Segment::Field(field) = &segment.node {
                if let FieldRoot::Named(name) = &field.path.root {
                    if !names.contains(name) {
                        names.push(name.clone());
                    }
                }
            }
        }
        names
    }

    /// Iterate over the replacement fields
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.segments.iter().filter_map(|s| match &s.node {
            Segment::Field(field) => Some(field),
            Segment::Literal(_) => None,
        })
    }
}

/// Piece of a template: literal text or a replacement field
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Text copied verbatim (escaped braces already folded in)
    Literal(String),
    /// `{field_name!conversion:format_spec}`
    Field(Field),
}

/// A replacement field
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Text between the braces, used in error messages
    pub source: String,
    pub path: FieldPath,
    pub conversion: Option<Conversion>,
    pub spec: FormatSpec,
}

/// `root.attr[key]...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    pub root: FieldRoot,
    pub accessors: Vec<Accessor>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRoot {
    Named(String),
    /// `{0}` or `{}`; there are never positional arguments to bind
    Positional(Option<usize>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accessor {
    /// `.name`
    Attr(String),
    /// `[0]`
    Index(usize),
    /// `[name]`
    Key(String),
}

/// `!s`, `!r`, `!a`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    Str,
    Repr,
    Ascii,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
    Center,
    /// Padding goes between the sign and the digits
    AfterSign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Plus,
    Minus,
    Space,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatType {
    Str,
    Decimal,
    HexLower,
    HexUpper,
    Octal,
    Binary,
    Fixed,
    FixedUpper,
    Percent,
}

/// Format specification after the `:` of a field
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormatSpec {
    pub fill: Option<char>,
    pub align: Option<Align>,
    pub sign: Option<Sign>,
    pub alternate: bool,
    pub zero: bool,
    pub width: Option<usize>,
    pub precision: Option<usize>,
    pub format_type: Option<FormatType>,
}

impl FormatSpec {
    pub fn is_empty(&self) -> bool {
        *self == FormatSpec::default()
    }
}

impl std::fmt::Display for FieldRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldRoot::Named(name) => write!(f, "{}", name),
            FieldRoot::Positional(Some(index)) => write!(f, "{}", index),
            FieldRoot::Positional(None) => Ok(()),
        }
    }
}
