//! Directive tree types produced by the template front end

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// AST node with source location
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

/// Directives that enclose child content and need a closing tag
const PAIRED_DIRECTIVES: &[&str] = &["block", "define", "snippet", "ifset"];

/// A post-processing modifier attached to a directive: `|truncate:20`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modifier {
    pub name: String,
    pub args: Vec<String>,
}

impl Modifier {
    fn parse(raw: &str) -> Self {
        let mut parts = split_outside_quotes(raw, ':').into_iter();
        let name = parts.next().unwrap_or_default().trim().to_string();
        let args = parts.map(|a| unquote(a.trim()).to_string()).collect();
        Self { name, args }
    }
}

/// Name, raw argument text and modifiers of an opening tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveHead {
    pub name: String,
    pub args: String,
    pub modifiers: Vec<Modifier>,
}

impl DirectiveHead {
    /// Name given to print directives (`{$var}`, `{=expr}`)
    pub const PRINT: &'static str = "=";

    /// Build a head from a complete tag slice such as `{block content|upper}`
    pub fn from_source(tag: &str) -> Self {
        let inner = tag
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .unwrap_or(tag)
            .trim();

        let (name, rest) = if let Some(expr) = inner.strip_prefix('=') {
            (Self::PRINT.to_string(), expr)
        } else if inner.starts_with('$') {
            (Self::PRINT.to_string(), inner)
        } else {
            let end = inner
                .char_indices()
                .find(|(i, c)| !(c.is_ascii_alphanumeric() || *c == '_' || (*i == 0 && *c == '@')))
                .map(|(i, _)| i)
                .unwrap_or(inner.len());
            (inner[..end].to_string(), &inner[end..])
        };

        let mut segments = split_outside_quotes(rest, '|').into_iter();
        let args = segments.next().unwrap_or_default().trim().to_string();
        let modifiers = segments
            .filter(|m| !m.trim().is_empty())
            .map(Modifier::parse)
            .collect();

        Self {
            name,
            args,
            modifiers,
        }
    }

    /// Whether this directive encloses content up to a closing tag
    pub fn is_paired(&self) -> bool {
        PAIRED_DIRECTIVES.contains(&self.name.as_str())
    }
}

/// A directive together with its enclosed content
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub head: DirectiveHead,
    pub children: Vec<Spanned<Node>>,
    /// Paired directive (has a body)
    pub paired: bool,
    /// False when a paired directive ran into the end of input
    pub closed: bool,
}

/// One node of the directive tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal template text
    Text(String),
    /// A directive, possibly with children
    Directive(Directive),
}

/// Root of a parsed template: the ordered top-level nodes
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub nodes: Vec<Spanned<Node>>,
}

fn split_outside_quotes(input: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, c) if c == separator => {
                parts.push(&input[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

fn unquote(s: &str) -> &str {
    for q in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(q) && s.ends_with(q) {
            return &s[1..s.len() - 1];
        }
    }
    s
}
