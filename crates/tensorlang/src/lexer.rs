//! The lexer.
//!
//! The lexer walks the source one token at a time.
//! It keeps only the current token, so the parser looks ahead by taking a
//! [Mark], lexing forward and resetting back to the mark.

use crate::error::{Error, ErrorKind};
use crate::token::{self, Kind};

/// Position of a token that the lexer can be reset to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark(usize);

#[derive(Debug, Default)]
pub struct Lexer {
    source: String,
    // byte offset just after the current token
    index: usize,
    // byte offset of the current token
    start: usize,
    token: Option<Kind>,
}

impl Lexer {
    pub fn new(source: &str) -> Lexer {
        let mut lexer = Lexer::default();
        lexer.initialize(source, 0);
        lexer
    }

    /// Replaces the source and moves to `offset`. No token is current until
    /// the next call to [Lexer::lex].
    pub fn initialize(&mut self, source: &str, offset: usize) {
        self.source = source.to_string();
        self.index = offset;
        self.start = offset;
        self.token = None;
    }

    /// Advances to the next token, skipping whitespace and sizing commands.
    ///
    /// Returns [None] at the end of the source.
    pub fn lex(&mut self) -> Result<Option<Kind>, Error> {
        loop {
            self.start = self.index;
            let rest = &self.source[self.index..];
            if rest.is_empty() {
                self.token = None;
                return Ok(None);
            }
            let Some((kind, len)) = token::match_token(rest) else {
                let c = rest.chars().next().unwrap_or_default();
                self.token = None;
                return Err(Error::new(
                    ErrorKind::UnexpectedCharacter(c),
                    &self.source,
                    self.index,
                ));
            };
            self.index += len;
            if !kind.is_skipped() {
                self.token = Some(kind);
                return Ok(self.token);
            }
        }
    }

    pub fn token(&self) -> Option<Kind> {
        self.token
    }

    /// Text of the current token; empty at the end of the source.
    pub fn lexeme(&self) -> &str {
        match self.token {
            Some(_) => &self.source[self.start..self.index],
            None => "",
        }
    }

    /// Byte offset of the current token.
    pub fn offset(&self) -> usize {
        self.start
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn mark(&self) -> Mark {
        Mark(self.start)
    }

    /// Moves back to a marked token and lexes it again.
    pub fn reset(&mut self, mark: Mark) -> Result<Option<Kind>, Error> {
        self.index = mark.0;
        self.lex()
    }

    /// Drops the first `len` bytes of the current token and lexes from there.
    ///
    /// `_d` is a derivative type but also an underscore followed by the index
    /// `d`; splitting recovers the second reading.
    pub fn split(&mut self, len: usize) -> Result<Option<Kind>, Error> {
        self.index = self.start + len;
        self.lex()
    }

    /// Overrides the kind of the current token.
    ///
    /// Used where the grammar accepts a keyword-like token as a letter, e.g.
    /// `e` in a symbol name.
    pub fn retag(&mut self, kind: Kind) {
        if self.token.is_some() {
            self.token = Some(kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<(Kind, String)> {
        let mut lexer = Lexer::new(source);
        let mut result = vec![];
        while let Some(kind) = lexer.lex().unwrap() {
            result.push((kind, lexer.lexeme().to_string()));
        }
        result
    }

    #[test]
    fn tensor_assignment() {
        let got = tokens(r"v^a = g^{ab} w_b");
        let kinds: Vec<Kind> = got.iter().map(|(kind, _)| *kind).collect();
        assert_eq!(
            kinds,
            vec![
                Kind::Letter,
                Kind::Caret,
                Kind::Letter,
                Kind::Equal,
                Kind::Letter,
                Kind::Caret,
                Kind::LeftBrace,
                Kind::Letter,
                Kind::Letter,
                Kind::RightBrace,
                Kind::Letter,
                Kind::Underscore,
                Kind::Letter,
            ]
        );
    }

    #[test]
    fn sizing_commands_are_skipped() {
        let got = tokens(r"\left( x \bigr)");
        assert_eq!(
            got,
            vec![
                (Kind::LeftParen, "(".to_string()),
                (Kind::Letter, "x".to_string()),
                (Kind::RightParen, ")".to_string()),
            ]
        );
    }

    #[test]
    fn mark_and_reset() {
        let mut lexer = Lexer::new(r"\bar{\nabla}");
        lexer.lex().unwrap();
        let mark = lexer.mark();
        lexer.lex().unwrap();
        lexer.lex().unwrap();
        assert_eq!(lexer.token(), Some(Kind::Nabla));
        assert_eq!(lexer.reset(mark).unwrap(), Some(Kind::Diacritic));
        assert_eq!(lexer.lexeme(), r"\bar");
    }

    #[test]
    fn split_derivative_type() {
        let mut lexer = Lexer::new("w_d");
        lexer.lex().unwrap();
        assert_eq!(lexer.lex().unwrap(), Some(Kind::DerivType));
        assert_eq!(lexer.split(1).unwrap(), Some(Kind::Letter));
        assert_eq!(lexer.lexeme(), "d");
    }

    #[test]
    fn unexpected_character() {
        let mut lexer = Lexer::new("x $");
        lexer.lex().unwrap();
        let err = lexer.lex().unwrap_err();
        assert_eq!(err.offset(), 2);
        assert_eq!(err.message(), "unexpected '$' at position 2");
    }

    #[test]
    fn end_of_input() {
        let mut lexer = Lexer::new("  ");
        assert_eq!(lexer.lex().unwrap(), None);
        assert_eq!(lexer.lexeme(), "");
    }
}
