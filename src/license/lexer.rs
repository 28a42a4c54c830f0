use std::fmt;

use crate::error::{SyntaxError, SyntaxErrorKind};

/// Token kinds produced by [`tokenize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident(String),
    Plus,
    LParen,
    RParen,
    And,
    Or,
    With,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(s) => write!(f, "identifier '{}'", s),
            TokenKind::Plus => write!(f, "'+'"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::And => write!(f, "AND"),
            TokenKind::Or => write!(f, "OR"),
            TokenKind::With => write!(f, "WITH"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

/// A token and the byte offset where it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.' || c == '-'
}

/// Tokenize an SPDX license expression.
///
/// The returned stream always ends with a single [`TokenKind::Eof`] positioned
/// at `text.len()`. Keywords are only recognised in upper case; `and` is an
/// identifier. A `+` must follow an identifier with no whitespace in between.
pub fn tokenize(text: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();
    let mut ident_end: Option<usize> = None;

    while let Some(&(pos, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            ident_end = None;
            continue;
        }

        let kind = match c {
            '(' => {
                chars.next();
                TokenKind::LParen
            }
            ')' => {
                chars.next();
                TokenKind::RParen
            }
            '+' if ident_end == Some(pos) => {
                chars.next();
                TokenKind::Plus
            }
            c if is_ident_char(c) => {
                let mut end = pos;
                while let Some(&(i, c)) = chars.peek() {
                    if !is_ident_char(c) {
                        break;
                    }
                    end = i + c.len_utf8();
                    chars.next();
                }
                let word = &text[pos..end];
                let kind = match word {
                    "AND" => TokenKind::And,
                    "OR" => TokenKind::Or,
                    "WITH" => TokenKind::With,
                    _ => TokenKind::Ident(word.to_string()),
                };
                if matches!(kind, TokenKind::Ident(_)) {
                    tokens.push(Token { kind, position: pos });
                    ident_end = Some(end);
                    continue;
                }
                kind
            }
            other => {
                return Err(SyntaxError::new(
                    pos,
                    SyntaxErrorKind::UnexpectedCharacter(other),
                ))
            }
        };

        tokens.push(Token {
            kind,
            position: pos,
        });
        ident_end = None;
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        position: text.len(),
    });
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(text).unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn ident(s: &str) -> TokenKind {
        TokenKind::Ident(s.to_string())
    }

    #[test]
    fn test_simple_expression() {
        assert_eq!(
            kinds("MIT OR Apache-2.0"),
            vec![ident("MIT"), TokenKind::Or, ident("Apache-2.0"), TokenKind::Eof]
        );
    }

    #[test]
    fn test_parentheses_without_spaces() {
        assert_eq!(
            kinds("(MIT)AND(ISC)"),
            vec![
                TokenKind::LParen,
                ident("MIT"),
                TokenKind::RParen,
                TokenKind::And,
                TokenKind::LParen,
                ident("ISC"),
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_plus_is_separate_token() {
        assert_eq!(
            kinds("GPL-2.0+ WITH Classpath-exception-2.0"),
            vec![
                ident("GPL-2.0"),
                TokenKind::Plus,
                TokenKind::With,
                ident("Classpath-exception-2.0"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_plus_after_whitespace_is_rejected() {
        let err = tokenize("GPL-2.0 +").unwrap_err();
        assert_eq!(err.position, 8);
        assert_eq!(err.kind, SyntaxErrorKind::UnexpectedCharacter('+'));
    }

    #[test]
    fn test_keywords_are_case_sensitive() {
        assert_eq!(
            kinds("MIT and ISC"),
            vec![ident("MIT"), ident("and"), ident("ISC"), TokenKind::Eof]
        );
        assert_eq!(kinds("ANDROID"), vec![ident("ANDROID"), TokenKind::Eof]);
    }

    #[test]
    fn test_positions() {
        let tokens = tokenize("MIT OR  ISC").unwrap();
        let positions: Vec<usize> = tokens.iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![0, 4, 8, 11]);
    }

    #[test]
    fn test_unrecognized_character() {
        let err = tokenize("MIT/Apache-2.0").unwrap_err();
        assert_eq!(err.position, 3);
        assert_eq!(err.kind, SyntaxErrorKind::UnexpectedCharacter('/'));
    }

    #[test]
    fn test_empty_input_yields_only_eof() {
        let tokens = tokenize("   ").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
        assert_eq!(tokens[0].position, 3);
    }
}
