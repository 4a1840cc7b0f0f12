//! Directive tree parser using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::parser::ast::*;
use crate::parser::lexer::Token;

/// Parse template source into a directive tree
pub fn parse(input: &str) -> Result<Document, Vec<crate::ParseError>> {
    let len = input.len();

    // Create a logos lexer and convert to token stream
    let token_iter = crate::parser::lexer::lex(input).map(|(tok, span)| (tok, span.into()));

    // Turn the token iterator into a stream that chumsky can use
    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    document_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn document_parser<'a, I>() -> impl Parser<'a, I, Document, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let node = recursive(|node| {
        let text = select! { Token::Text(s) => Node::Text(s) };

        let standalone = select! { Token::Open(head) if !head.is_paired() => head }.map(|head| {
            Node::Directive(Directive {
                head,
                children: Vec::new(),
                paired: false,
                closed: true,
            })
        });

        // End of input stands in for a missing closing tag; the compiler decides
        // whether that is acceptable
        let close = choice((
            select! { Token::Close(name) => Some(name) },
            end().to(None),
        ));

        let paired = select! { Token::Open(head) if head.is_paired() => head }
            .then(node.clone().repeated().collect::<Vec<_>>())
            .then(close)
            .try_map(|((head, children), close), span: SimpleSpan| match close {
                Some(name) if !name.is_empty() && name != head.name => Err(Rich::custom(
                    span,
                    format!("Unexpected {{/{}}}, expected {{/{}}}", name, head.name),
                )),
                close => Ok(Node::Directive(Directive {
                    head,
                    children,
                    paired: true,
                    closed: close.is_some(),
                })),
            });

        choice((text, paired, standalone))
            .map_with(|n, e| Spanned::new(n, span_range(&e.span())))
            .boxed()
    });

    node.repeated()
        .collect()
        .then_ignore(end())
        .map(|nodes| Document { nodes })
}
