//! Tokenizer for directive arguments using logos

use logos::Logos;

use super::expr::{Arg, Expr};

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
enum ArgToken {
    #[token("=>")]
    Arrow,
    #[token(",")]
    Comma,
    #[regex(r"\$[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice()[1..].to_string())]
    Variable(String),
    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let s = lex.slice();
        s[1..s.len() - 1].to_string()
    })]
    DoubleQuoted(String),
    #[regex(r"'([^'\\]|\\.)*'", |lex| {
        let s = lex.slice();
        s[1..s.len() - 1].to_string()
    })]
    SingleQuoted(String),
    #[regex(r#"[^\s,'"=$][^\s,'"=]*"#, |lex| lex.slice().to_string())]
    Bare(String),
}

/// How a word was written in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordKind {
    Bare,
    Variable,
    DoubleQuoted,
    SingleQuoted,
}

/// A single argument word, e.g. a block name or link destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub text: String,
    pub kind: WordKind,
}

impl Word {
    /// Source form of the word, with its sigil or quotes
    pub fn raw(&self) -> String {
        match self.kind {
            WordKind::Bare => self.text.clone(),
            WordKind::Variable => format!("${}", self.text),
            WordKind::DoubleQuoted => format!("\"{}\"", self.text),
            WordKind::SingleQuoted => format!("'{}'", self.text),
        }
    }

    pub fn to_expr(&self) -> Expr {
        match self.kind {
            WordKind::Bare | WordKind::SingleQuoted => Expr::Literal(self.text.clone()),
            WordKind::Variable => Expr::Variable(self.text.clone()),
            WordKind::DoubleQuoted => Expr::interpolated(&self.text),
        }
    }
}

/// Cursor over the tokens of one directive's raw arguments
#[derive(Debug)]
pub struct ArgTokenizer {
    tokens: Vec<ArgToken>,
    pos: usize,
}

impl ArgTokenizer {
    pub fn new(source: &str) -> Self {
        let tokens = ArgToken::lexer(source).filter_map(Result::ok).collect();
        Self { tokens, pos: 0 }
    }

    /// True when all tokens were consumed
    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Fetch the next word, consuming one trailing comma
    pub fn fetch_word(&mut self) -> Option<Word> {
        let word = match self.tokens.get(self.pos)? {
            ArgToken::Bare(s) => Word {
                text: s.clone(),
                kind: WordKind::Bare,
            },
            ArgToken::Variable(s) => Word {
                text: s.clone(),
                kind: WordKind::Variable,
            },
            ArgToken::DoubleQuoted(s) => Word {
                text: s.clone(),
                kind: WordKind::DoubleQuoted,
            },
            ArgToken::SingleQuoted(s) => Word {
                text: s.clone(),
                kind: WordKind::SingleQuoted,
            },
            ArgToken::Arrow | ArgToken::Comma => return None,
        };
        self.pos += 1;
        if self.tokens.get(self.pos) == Some(&ArgToken::Comma) {
            self.pos += 1;
        }
        Some(word)
    }

    /// Fetch the remaining `value` / `key => value` entries
    pub fn fetch_args(&mut self) -> Vec<Arg> {
        let mut args = Vec::new();
        while !self.is_exhausted() {
            if self.tokens[self.pos] == ArgToken::Comma {
                self.pos += 1;
                continue;
            }
            let Some(first) = self.fetch_word_no_comma() else {
                self.pos += 1;
                continue;
            };
            if self.tokens.get(self.pos) == Some(&ArgToken::Arrow) {
                self.pos += 1;
                if let Some(value) = self.fetch_word_no_comma() {
                    args.push(Arg {
                        key: Some(first.text),
                        value: value.to_expr(),
                    });
                }
            } else {
                args.push(Arg {
                    key: None,
                    value: first.to_expr(),
                });
            }
        }
        args
    }

    fn fetch_word_no_comma(&mut self) -> Option<Word> {
        let before = self.pos;
        let word = self.fetch_word()?;
        // fetch_word may have stepped over a comma; put it back for the caller
        if self.pos == before + 2 {
            self.pos -= 1;
        }
        Some(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_word_kinds() {
        let mut t = ArgTokenizer::new(r#"#content, $name "x $y" 'lit'"#);
        assert_eq!(t.fetch_word().unwrap().raw(), "#content");
        let var = t.fetch_word().unwrap();
        assert_eq!(var.kind, WordKind::Variable);
        assert_eq!(var.text, "name");
        assert_eq!(t.fetch_word().unwrap().kind, WordKind::DoubleQuoted);
        assert_eq!(t.fetch_word().unwrap().to_expr(), Expr::Literal("lit".to_string()));
        assert!(t.fetch_word().is_none());
        assert!(t.is_exhausted());
    }

    #[test]
    fn test_fetch_args_after_word() {
        let mut t = ArgTokenizer::new("#item, id => $id, 'x', title => \"T\"");
        assert_eq!(t.fetch_word().unwrap().text, "#item");
        let args = t.fetch_args();
        assert_eq!(args.len(), 3);
        assert_eq!(args[0].key.as_deref(), Some("id"));
        assert_eq!(args[0].value, Expr::Variable("id".to_string()));
        assert_eq!(args[1].key, None);
        assert_eq!(args[2].key.as_deref(), Some("title"));
    }

    #[test]
    fn test_hash_variable_is_one_word() {
        let mut t = ArgTokenizer::new("#$name");
        let word = t.fetch_word().unwrap();
        assert_eq!(word.kind, WordKind::Bare);
        assert_eq!(word.text, "#$name");
    }

    #[test]
    fn test_empty_arguments() {
        let mut t = ArgTokenizer::new("   ");
        assert!(t.fetch_word().is_none());
        assert!(t.fetch_args().is_empty());
    }
}
