// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

use crate::ast::Span;
use crate::error::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Identifier(String),
    Keyword(Keyword),
    /// `$` or `$name`, including the sigil.
    Variable(String),
    /// `.name`, without the leading dot.
    Field(String),
    Dot,
    StringLiteral(String),
    /// A rune constant such as `'a'`; it evaluates to its code point.
    CharLiteral(char),
    NumberLiteral(String),
    Pipe,
    Declare,
    Assign,
    Comma,
    LeftParen,
    RightParen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    If,
    Else,
    End,
    Range,
    With,
    Define,
    Template,
    Block,
    Nil,
    True,
    False,
}

impl Keyword {
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::End => "end",
            Keyword::Range => "range",
            Keyword::With => "with",
            Keyword::Define => "define",
            Keyword::Template => "template",
            Keyword::Block => "block",
            Keyword::Nil => "nil",
            Keyword::True => "true",
            Keyword::False => "false",
        }
    }

    fn lookup(word: &str) -> Option<Self> {
        Some(match word {
            "if" => Keyword::If,
            "else" => Keyword::Else,
            "end" => Keyword::End,
            "range" => Keyword::Range,
            "with" => Keyword::With,
            "define" => Keyword::Define,
            "template" => Keyword::Template,
            "block" => Keyword::Block,
            "nil" => Keyword::Nil,
            "true" => Keyword::True,
            "false" => Keyword::False,
            _ => return None,
        })
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Identifier(name) | TokenKind::Variable(name) => f.write_str(name),
            TokenKind::Keyword(keyword) => f.write_str(keyword.as_str()),
            TokenKind::Field(name) => write!(f, ".{name}"),
            TokenKind::Dot => f.write_str("."),
            TokenKind::StringLiteral(value) => write!(f, "{value:?}"),
            TokenKind::CharLiteral(ch) => write!(f, "{ch:?}"),
            TokenKind::NumberLiteral(text) => f.write_str(text),
            TokenKind::Pipe => f.write_str("\"|\""),
            TokenKind::Declare => f.write_str("\":=\""),
            TokenKind::Assign => f.write_str("\"=\""),
            TokenKind::Comma => f.write_str("\",\""),
            TokenKind::LeftParen => f.write_str("\"(\""),
            TokenKind::RightParen => f.write_str("\")\""),
        }
    }
}

/// Splits the body of one action into tokens. `offset` is the byte position
/// of `input` inside the full template source, so spans stay absolute.
pub fn lex_action(input: &str, offset: usize) -> Result<Vec<Token>, Error> {
    let mut lexer = Lexer {
        input,
        chars: input.char_indices().peekable(),
        offset,
    };
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    offset: usize,
}

impl<'a> Lexer<'a> {
    fn next_token(&mut self) -> Result<Option<Token>, Error> {
        while self.chars.next_if(|(_, ch)| ch.is_whitespace()).is_some() {}

        let Some((start, ch)) = self.chars.next() else {
            return Ok(None);
        };

        let kind = match ch {
            '|' => TokenKind::Pipe,
            ',' => TokenKind::Comma,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '=' => TokenKind::Assign,
            ':' => {
                if self.chars.next_if(|(_, next)| *next == '=').is_none() {
                    return Err(self.error("expected :=", start));
                }
                TokenKind::Declare
            }
            '"' => TokenKind::StringLiteral(self.quoted(start)?),
            '`' => TokenKind::StringLiteral(self.raw(start)?),
            '\'' => TokenKind::CharLiteral(self.char_constant(start)?),
            '$' => {
                let name = self.word_from(start);
                TokenKind::Variable(name.to_string())
            }
            '.' => match self.peek() {
                Some(next) if is_word_start(next) => {
                    let (name_start, _) = self.chars.next().unwrap_or((start + 1, next));
                    TokenKind::Field(self.word_from(name_start).to_string())
                }
                Some(next) if next.is_ascii_digit() => self.number(start)?,
                _ => TokenKind::Dot,
            },
            '+' | '-' if self.peek().is_some_and(|next| next.is_ascii_digit()) => {
                self.number(start)?
            }
            c if c.is_ascii_digit() => self.number(start)?,
            c if is_word_start(c) => {
                let word = self.word_from(start);
                match Keyword::lookup(word) {
                    Some(keyword) => TokenKind::Keyword(keyword),
                    None => TokenKind::Identifier(word.to_string()),
                }
            }
            other => {
                return Err(self.error(format!("unexpected character {other:?} in action"), start));
            }
        };

        Ok(Some(Token {
            kind,
            span: self.span_from(start),
        }))
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    fn position(&mut self) -> usize {
        self.chars
            .peek()
            .map_or(self.input.len(), |(idx, _)| *idx)
    }

    fn span_from(&mut self, start: usize) -> Span {
        let end = self.position();
        Span::new(self.offset + start, self.offset + end)
    }

    fn error(&mut self, message: impl Into<String>, start: usize) -> Error {
        let span = self.span_from(start);
        Error::parse_with_span(message, span)
    }

    /// Consumes identifier characters and returns the word beginning at `start`.
    fn word_from(&mut self, start: usize) -> &'a str {
        while self.chars.next_if(|(_, ch)| is_word_part(*ch)).is_some() {}
        let end = self.position();
        &self.input[start..end]
    }

    fn number(&mut self, start: usize) -> Result<TokenKind, Error> {
        while self
            .chars
            .next_if(|(_, ch)| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_'))
            .is_some()
        {
            // exponent signs belong to the literal
            let end = self.position();
            if self.input[..end].ends_with(['e', 'E']) && !self.input[start..end].contains("0x") {
                self.chars.next_if(|(_, ch)| matches!(ch, '+' | '-'));
            }
        }
        let end = self.position();
        Ok(TokenKind::NumberLiteral(self.input[start..end].to_string()))
    }

    fn quoted(&mut self, start: usize) -> Result<String, Error> {
        let mut literal = String::new();
        while let Some((_, ch)) = self.chars.next() {
            match ch {
                '"' => return Ok(literal),
                '\n' => break,
                '\\' => {
                    let Some((_, escaped)) = self.chars.next() else {
                        break;
                    };
                    literal.push(self.unescape(escaped, start)?);
                }
                other => literal.push(other),
            }
        }
        Err(self.error("unterminated quoted string", start))
    }

    fn unescape(&mut self, escaped: char, start: usize) -> Result<char, Error> {
        Ok(match escaped {
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'a' => '\u{7}',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'v' => '\u{b}',
            '0' => '\0',
            '\\' | '"' | '\'' => escaped,
            other => {
                return Err(self.error(format!("unknown escape sequence \\{other}"), start));
            }
        })
    }

    /// Body of a `'x'` constant after the opening quote.
    fn char_constant(&mut self, start: usize) -> Result<char, Error> {
        let value = match self.chars.next() {
            Some((_, '\\')) => match self.chars.next() {
                Some((_, escaped)) => self.unescape(escaped, start)?,
                None => return Err(self.error("unterminated character constant", start)),
            },
            Some((_, '\'')) => return Err(self.error("empty character constant", start)),
            Some((_, '\n')) | None => {
                return Err(self.error("unterminated character constant", start));
            }
            Some((_, ch)) => ch,
        };
        if self.chars.next_if(|(_, ch)| *ch == '\'').is_none() {
            return Err(self.error("unterminated character constant", start));
        }
        Ok(value)
    }

    fn raw(&mut self, start: usize) -> Result<String, Error> {
        let mut literal = String::new();
        for (_, ch) in self.chars.by_ref() {
            if ch == '`' {
                return Ok(literal);
            }
            literal.push(ch);
        }
        Err(self.error("unterminated raw quoted string", start))
    }
}

fn is_word_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

fn is_word_part(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex_action(source, 0)
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn lexes_include_call() {
        assert_eq!(
            kinds(r#"include "labels.helper" . | nindent 4"#),
            vec![
                TokenKind::Identifier("include".into()),
                TokenKind::StringLiteral("labels.helper".into()),
                TokenKind::Dot,
                TokenKind::Pipe,
                TokenKind::Identifier("nindent".into()),
                TokenKind::NumberLiteral("4".into()),
            ]
        );
    }

    #[test]
    fn lexes_range_declarations_and_fields() {
        assert_eq!(
            kinds("range $k, $v := .Env"),
            vec![
                TokenKind::Keyword(Keyword::Range),
                TokenKind::Variable("$k".into()),
                TokenKind::Comma,
                TokenKind::Variable("$v".into()),
                TokenKind::Declare,
                TokenKind::Field("Env".into()),
            ]
        );
        assert_eq!(
            kinds("$v.value"),
            vec![
                TokenKind::Variable("$v".into()),
                TokenKind::Field("value".into()),
            ]
        );
        assert_eq!(kinds("$"), vec![TokenKind::Variable("$".into())]);
    }

    #[test]
    fn field_chain_spans_are_adjacent() {
        let tokens = lex_action(".a.b", 10).unwrap();
        assert_eq!(tokens[0].span, Span::new(10, 12));
        assert_eq!(tokens[1].span, Span::new(12, 14));
    }

    #[test]
    fn lexes_numbers() {
        assert_eq!(
            kinds("-3 1.5e+3 0x1F .5"),
            vec![
                TokenKind::NumberLiteral("-3".into()),
                TokenKind::NumberLiteral("1.5e+3".into()),
                TokenKind::NumberLiteral("0x1F".into()),
                TokenKind::NumberLiteral(".5".into()),
            ]
        );
    }

    #[test]
    fn decodes_escapes_and_raw_strings() {
        assert_eq!(
            kinds(r#""a\tb\"c" `raw\n`"#),
            vec![
                TokenKind::StringLiteral("a\tb\"c".into()),
                TokenKind::StringLiteral("raw\\n".into()),
            ]
        );
    }

    #[test]
    fn lexes_rune_constants() {
        assert_eq!(
            kinds(r"'a' '\n' '\''"),
            vec![
                TokenKind::CharLiteral('a'),
                TokenKind::CharLiteral('\n'),
                TokenKind::CharLiteral('\''),
            ]
        );
        assert!(lex_action("''", 0)
            .unwrap_err()
            .to_string()
            .contains("empty character constant"));
        assert!(lex_action("'ab'", 0)
            .unwrap_err()
            .to_string()
            .contains("unterminated character constant"));
    }

    #[test]
    fn errors_on_unterminated_string() {
        let err = lex_action("\"unterminated", 0).unwrap_err();
        assert!(err.is_parse());
        assert!(err.to_string().contains("unterminated quoted string"));
    }

    #[test]
    fn errors_on_stray_colon() {
        let err = lex_action("$x : 1", 0).unwrap_err();
        assert!(err.to_string().contains("expected :="));
    }
}
