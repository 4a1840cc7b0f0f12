//! Runtime expressions: literals, variables and interpolated strings

use std::collections::BTreeMap;
use std::fmt;

use logos::{Lexer, Logos};

use crate::runtime::RenderError;

/// Template variables and block parameters
pub type Params = BTreeMap<String, String>;

/// Piece of an interpolated string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Variable(String),
}

/// Pieces of a double-quoted string
#[derive(Logos, Debug, Clone, PartialEq)]
enum Piece {
    #[regex(r"\$[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice()[1..].to_string())]
    Variable(String),
    #[regex(r"\\.", unescape)]
    Escape(char),
    #[token("$")]
    Dollar,
    #[regex(r"[^\\$]+", |lex| lex.slice().to_string())]
    Text(String),
}

fn unescape(lex: &mut Lexer<Piece>) -> Option<char> {
    lex.slice().chars().nth(1).map(|c| match c {
        'n' => '\n',
        't' => '\t',
        other => other,
    })
}

/// An expression evaluated against the active variable scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Bare word or single-quoted string
    Literal(String),
    /// `$name`
    Variable(String),
    /// Double-quoted string with `$name` references
    Interpolated(Vec<Segment>),
}

impl Expr {
    /// Build an expression from the contents of a double-quoted string
    pub fn interpolated(text: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();

        let mut lexer = Piece::lexer(text);
        while let Some(piece) = lexer.next() {
            match piece {
                Ok(Piece::Text(t)) => literal.push_str(&t),
                Ok(Piece::Escape(c)) => literal.push(c),
                Ok(Piece::Variable(name)) => {
                    if !literal.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Variable(name));
                }
                // a lone `$` or `\` stays as written
                Ok(Piece::Dollar) | Err(()) => literal.push_str(lexer.slice()),
            }
        }

        if segments.is_empty() {
            return Expr::Literal(literal);
        }
        if !literal.is_empty() {
            segments.push(Segment::Text(literal));
        }
        Expr::Interpolated(segments)
    }

    /// Evaluate against `vars`
    pub fn eval(&self, vars: &Params) -> Result<String, RenderError> {
        match self {
            Expr::Literal(s) => Ok(s.clone()),
            Expr::Variable(name) => lookup(vars, name).map(str::to_string),
            Expr::Interpolated(segments) => {
                let mut out = String::new();
                for segment in segments {
                    match segment {
                        Segment::Text(t) => out.push_str(t),
                        Segment::Variable(name) => out.push_str(lookup(vars, name)?),
                    }
                }
                Ok(out)
            }
        }
    }
}

fn lookup<'v>(vars: &'v Params, name: &str) -> Result<&'v str, RenderError> {
    vars.get(name)
        .map(String::as_str)
        .ok_or_else(|| RenderError::UndefinedVariable {
            name: name.to_string(),
        })
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(s) => write!(f, "{}", s),
            Expr::Variable(name) => write!(f, "${}", name),
            Expr::Interpolated(segments) => {
                write!(f, "\"")?;
                for segment in segments {
                    match segment {
                        Segment::Text(t) => write!(f, "{}", t)?,
                        Segment::Variable(name) => write!(f, "${}", name)?,
                    }
                }
                write!(f, "\"")
            }
        }
    }
}

/// One entry of a directive's argument list: `value` or `key => value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arg {
    pub key: Option<String>,
    pub value: Expr,
}

/// Evaluate an argument list into parameters; positional entries are keyed by index
pub fn eval_args(args: &[Arg], vars: &Params) -> Result<Params, RenderError> {
    let mut params = Params::new();
    let mut position = 0usize;
    for arg in args {
        let key = match &arg.key {
            Some(key) => key.clone(),
            None => {
                let key = position.to_string();
                position += 1;
                key
            }
        };
        params.insert(key, arg.value.eval(vars)?);
    }
    Ok(params)
}

/// Explicit arguments win over inherited parameters
pub fn merge_params(explicit: Params, inherited: &Params) -> Params {
    let mut merged = explicit;
    for (key, value) in inherited {
        merged.entry(key.clone()).or_insert_with(|| value.clone());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> Params {
        Params::from([
            ("name".to_string(), "world".to_string()),
            ("i".to_string(), "3".to_string()),
        ])
    }

    #[test]
    fn test_interpolation() {
        let expr = Expr::interpolated("hello $name #$i!");
        assert_eq!(expr.eval(&vars()).unwrap(), "hello world #3!");
    }

    #[test]
    fn test_plain_string_stays_literal() {
        assert_eq!(Expr::interpolated("a $ b"), Expr::Literal("a $ b".to_string()));
    }

    #[test]
    fn test_escapes() {
        assert_eq!(
            Expr::interpolated(r"\$name\tx\\"),
            Expr::Literal("$name\tx\\".to_string())
        );
        assert_eq!(Expr::interpolated(r"trailing\"), Expr::Literal(r"trailing\".to_string()));
        assert_eq!(
            Expr::interpolated("$i-$name"),
            Expr::Interpolated(vec![
                Segment::Variable("i".to_string()),
                Segment::Text("-".to_string()),
                Segment::Variable("name".to_string()),
            ])
        );
    }

    #[test]
    fn test_undefined_variable() {
        let err = Expr::Variable("missing".to_string())
            .eval(&vars())
            .unwrap_err();
        assert!(matches!(err, RenderError::UndefinedVariable { name } if name == "missing"));
    }

    #[test]
    fn test_eval_args_positional_and_named() {
        let args = vec![
            Arg {
                key: None,
                value: Expr::Literal("a".to_string()),
            },
            Arg {
                key: Some("who".to_string()),
                value: Expr::Variable("name".to_string()),
            },
        ];
        let params = eval_args(&args, &vars()).unwrap();
        assert_eq!(params.get("0").map(String::as_str), Some("a"));
        assert_eq!(params.get("who").map(String::as_str), Some("world"));
    }

    #[test]
    fn test_merge_prefers_explicit() {
        let explicit = Params::from([("name".to_string(), "you".to_string())]);
        let merged = merge_params(explicit, &vars());
        assert_eq!(merged.get("name").map(String::as_str), Some("you"));
        assert_eq!(merged.get("i").map(String::as_str), Some("3"));
    }
}
