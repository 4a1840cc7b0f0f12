//! Lexer for template sources using logos

use logos::Logos;

use super::ast::DirectiveHead;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token {
    /// Closing tag: `{/block}` or the short form `{/}`
    #[regex(r"\{/[A-Za-z]*\}", |lex| {
        let s = lex.slice();
        s[2..s.len() - 1].to_string()
    })]
    Close(String),

    /// Opening or standalone tag: `{name args|modifiers}`, `{$var}`, `{=expr}`
    #[regex(r"\{[A-Za-z$=][^}]*\}", |lex| DirectiveHead::from_source(lex.slice()))]
    Open(DirectiveHead),

    // Comments (skip)
    #[regex(r"\{\*[^*]*\*+([^*}][^*]*\*+)*\}", logos::skip)]
    Comment,

    /// Literal text; a brace that does not start a tag is text too
    #[token("{", |lex| lex.slice().to_string())]
    #[regex(r"[^{]+", |lex| lex.slice().to_string())]
    Text(String),
}

/// Lex input string into tokens with spans
pub fn lex(input: &str) -> impl Iterator<Item = (Token, Span)> + '_ {
    Token::lexer(input)
        .spanned()
        .filter_map(|(tok, span)| tok.ok().map(|t| (t, span)))
}
