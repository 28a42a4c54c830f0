use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{SyntaxError, SyntaxErrorKind};
use crate::license::catalog::Catalog;
use crate::license::expression::{
    ExceptionId, Expression, LicenseId, LicenseKind, Operator, SimpleLicense,
};
use crate::license::lexer::{tokenize, Token, TokenKind};

/// How strictly `LicenseRef-` ids are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LicenseRefPolicy {
    /// `LicenseRef-` must be followed by a non-empty idstring.
    #[default]
    RequireSuffix,
    /// Anything starting with `LicenseRef-` is accepted.
    AcceptAny,
}

/// Parser behaviour, also the `[parser]` section of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Reject license ids that are neither listed nor `LicenseRef-*`.
    pub strict: bool,
    pub allow_unknown_exceptions: bool,
    pub license_ref: LicenseRefPolicy,
    /// Maximum parenthesis nesting.
    pub max_depth: usize,
}

pub const DEFAULT_MAX_DEPTH: usize = 64;

impl Default for ParseOptions {
    fn default() -> Self {
        Self::strict()
    }
}

impl ParseOptions {
    pub fn strict() -> Self {
        Self {
            strict: true,
            allow_unknown_exceptions: false,
            license_ref: LicenseRefPolicy::RequireSuffix,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn lenient() -> Self {
        Self {
            strict: false,
            ..Self::strict()
        }
    }
}

/// Parse `text` against the built-in catalog.
pub fn parse(text: &str, strict: bool) -> Result<Expression, SyntaxError> {
    let options = if strict {
        ParseOptions::strict()
    } else {
        ParseOptions::lenient()
    };
    parse_with(text, Catalog::builtin(), &options)
}

/// Parse `text` against an explicit catalog and options.
///
/// Grammar, highest precedence last:
/// ```text
/// expr      := or_expr
/// or_expr   := and_expr ( "OR" and_expr )*
/// and_expr  := with_expr ( "AND" with_expr )*
/// with_expr := atom ( "WITH" exception_id )?
/// atom      := license_id [ "+" ] | "(" expr ")"
/// ```
pub fn parse_with(
    text: &str,
    catalog: &Catalog,
    options: &ParseOptions,
) -> Result<Expression, SyntaxError> {
    let tokens = tokenize(text)?;
    let mut parser = ExprParser::new(tokens, catalog, options);

    if parser.peek().kind == TokenKind::Eof {
        return Err(SyntaxError::new(0, SyntaxErrorKind::EmptyExpression));
    }

    let expr = parser.parse_or()?;

    let next = parser.peek().clone();
    match &next.kind {
        TokenKind::Eof => {}
        TokenKind::RParen => {
            return Err(SyntaxError::new(
                next.position,
                SyntaxErrorKind::UnbalancedParenthesis,
            ))
        }
        other => {
            return Err(SyntaxError::new(
                next.position,
                SyntaxErrorKind::TrailingInput(other.to_string()),
            ))
        }
    }

    tracing::debug!(input = text, canonical = %expr, "parsed license expression");
    Ok(expr)
}

impl FromStr for Expression {
    type Err = SyntaxError;

    /// Strict parse against the built-in catalog.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s, true)
    }
}

/// Precedence-climbing parser over a token stream ending in `Eof`.
struct ExprParser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    eof: Token,
    depth: usize,
    catalog: &'a Catalog,
    options: &'a ParseOptions,
}

impl<'a> ExprParser<'a> {
    fn new(tokens: Vec<Token>, catalog: &'a Catalog, options: &'a ParseOptions) -> Self {
        let eof = tokens.last().cloned().unwrap_or(Token {
            kind: TokenKind::Eof,
            position: 0,
        });
        Self {
            tokens,
            pos: 0,
            eof,
            depth: 0,
            catalog,
            options,
        }
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn unexpected(&self, expected: &str) -> SyntaxError {
        let token = self.peek();
        let kind = match &token.kind {
            TokenKind::Eof => SyntaxErrorKind::UnexpectedEnd(expected.to_string()),
            found => SyntaxErrorKind::UnexpectedToken {
                expected: expected.to_string(),
                found: found.to_string(),
            },
        };
        SyntaxError::new(token.position, kind)
    }

    /// Lowest precedence level.
    fn parse_or(&mut self) -> Result<Expression, SyntaxError> {
        let first = self.parse_and()?;
        let mut rest = Vec::new();
        while self.peek().kind == TokenKind::Or {
            self.advance();
            rest.push(self.parse_and()?);
        }
        Ok(Expression::combine_nonempty(Operator::Or, first, rest))
    }

    fn parse_and(&mut self) -> Result<Expression, SyntaxError> {
        let first = self.parse_with()?;
        let mut rest = Vec::new();
        while self.peek().kind == TokenKind::And {
            self.advance();
            rest.push(self.parse_with()?);
        }
        Ok(Expression::combine_nonempty(Operator::And, first, rest))
    }

    fn parse_with(&mut self) -> Result<Expression, SyntaxError> {
        let atom = self.parse_atom()?;
        if self.peek().kind != TokenKind::With {
            return Ok(atom);
        }

        let with = self.advance();
        let license = match atom {
            Expression::License(simple) => simple,
            _ => {
                return Err(SyntaxError::new(
                    with.position,
                    SyntaxErrorKind::UnexpectedToken {
                        expected: "AND, OR, ')' or end of input".to_string(),
                        found: "WITH after a compound expression".to_string(),
                    },
                ))
            }
        };

        let token = self.peek().clone();
        let exception = match &token.kind {
            TokenKind::Ident(text) => {
                self.advance();
                self.resolve_exception(text, token.position)?
            }
            _ => return Err(self.unexpected("exception identifier")),
        };

        Ok(Expression::with_exception(license, exception))
    }

    fn parse_atom(&mut self) -> Result<Expression, SyntaxError> {
        let token = self.peek().clone();
        match &token.kind {
            TokenKind::LParen => {
                if self.depth >= self.options.max_depth {
                    return Err(SyntaxError::new(
                        token.position,
                        SyntaxErrorKind::NestingTooDeep(self.options.max_depth),
                    ));
                }
                self.advance();
                self.depth += 1;
                let inner = self.parse_or()?;
                self.depth -= 1;

                let close = self.peek().clone();
                match close.kind {
                    TokenKind::RParen => {
                        self.advance();
                        Ok(inner)
                    }
                    TokenKind::Eof => Err(SyntaxError::new(
                        close.position,
                        SyntaxErrorKind::UnbalancedParenthesis,
                    )),
                    _ => Err(self.unexpected("')'")),
                }
            }
            TokenKind::Ident(text) => {
                self.advance();
                let or_later = if self.peek().kind == TokenKind::Plus {
                    self.advance();
                    true
                } else {
                    false
                };
                let simple = self.resolve_license(text, token.position, or_later)?;
                Ok(Expression::License(simple))
            }
            _ => Err(self.unexpected("license identifier or '('")),
        }
    }

    fn resolve_license(
        &self,
        text: &str,
        position: usize,
        or_later: bool,
    ) -> Result<SimpleLicense, SyntaxError> {
        if let Some(entry) = self.catalog.lookup_license(text) {
            if or_later && !entry.supports_or_later {
                return Err(SyntaxError::new(
                    position,
                    SyntaxErrorKind::OrLaterNotSupported(entry.id.clone()),
                ));
            }
            if entry.deprecated {
                tracing::debug!(license = %entry.id, "deprecated license identifier");
            }
            return Ok(SimpleLicense::new(LicenseId::from_catalog(entry), or_later));
        }

        if text.to_ascii_lowercase().starts_with("licenseref-") {
            let id = match self.options.license_ref {
                LicenseRefPolicy::RequireSuffix => LicenseId::license_ref(text).map_err(|_| {
                    SyntaxError::new(
                        position,
                        SyntaxErrorKind::MalformedLicenseRef(text.to_string()),
                    )
                })?,
                LicenseRefPolicy::AcceptAny => {
                    LicenseId::new_unchecked(text, LicenseKind::Reference)
                }
            };
            return Ok(SimpleLicense::new(id, or_later));
        }

        // `Foo-1.0-or-later` is spelled-out `Foo-1.0+` unless the catalog lists it.
        const OR_LATER_SUFFIX: &str = "-or-later";
        if !or_later && text.to_ascii_lowercase().ends_with(OR_LATER_SUFFIX) {
            let base = &text[..text.len() - OR_LATER_SUFFIX.len()];
            if let Some(entry) = self.catalog.lookup_license(base) {
                if !entry.supports_or_later {
                    return Err(SyntaxError::new(
                        position,
                        SyntaxErrorKind::OrLaterNotSupported(entry.id.clone()),
                    ));
                }
                return Ok(SimpleLicense::new(LicenseId::from_catalog(entry), true));
            }
        }

        if self.options.strict {
            return Err(SyntaxError::new(
                position,
                SyntaxErrorKind::UnknownLicense(text.to_string()),
            ));
        }

        tracing::warn!(license = text, "accepting unrecognized license identifier");
        let id = LicenseId::unrecognized(text).map_err(|_| {
            SyntaxError::new(position, SyntaxErrorKind::UnknownLicense(text.to_string()))
        })?;
        Ok(SimpleLicense::new(id, or_later))
    }

    fn resolve_exception(&self, text: &str, position: usize) -> Result<ExceptionId, SyntaxError> {
        if let Some(entry) = self.catalog.lookup_exception(text) {
            return Ok(ExceptionId::from_catalog(entry));
        }
        if self.options.allow_unknown_exceptions {
            tracing::warn!(exception = text, "accepting unrecognized license exception");
            return ExceptionId::unrecognized(text).map_err(|_| {
                SyntaxError::new(position, SyntaxErrorKind::UnknownException(text.to_string()))
            });
        }
        Err(SyntaxError::new(
            position,
            SyntaxErrorKind::UnknownException(text.to_string()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strict(text: &str) -> Expression {
        parse(text, true).unwrap()
    }

    fn err(text: &str) -> SyntaxError {
        parse(text, true).unwrap_err()
    }

    fn leaf(expr: &Expression) -> &SimpleLicense {
        match expr {
            Expression::License(simple) => simple,
            other => panic!("expected a license leaf, got {:?}", other),
        }
    }

    #[test]
    fn test_single_license() {
        let expr = strict("MIT");
        assert_eq!(leaf(&expr).license.as_str(), "MIT");
        assert!(!leaf(&expr).or_later);
    }

    #[test]
    fn test_case_is_canonicalized() {
        assert_eq!(strict("apache-2.0").to_string(), "Apache-2.0");
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let expr = strict("MIT OR ISC AND Zlib");
        let Expression::Or(ops) = &expr else {
            panic!("expected OR at the root, got {:?}", expr);
        };
        assert_eq!(ops.len(), 2);
        assert_eq!(leaf(&ops.as_slice()[0]).license.as_str(), "MIT");
        assert!(matches!(ops.as_slice()[1], Expression::And(_)));
    }

    #[test]
    fn test_with_binds_tighter_than_and() {
        let expr = strict("GPL-2.0-only WITH Classpath-exception-2.0 AND MIT");
        let Expression::And(ops) = &expr else {
            panic!("expected AND at the root, got {:?}", expr);
        };
        let Expression::With(with) = &ops.as_slice()[0] else {
            panic!("expected WITH as first operand");
        };
        assert_eq!(with.license.license.as_str(), "GPL-2.0-only");
        assert_eq!(with.exception.as_str(), "Classpath-exception-2.0");
    }

    #[test]
    fn test_parentheses_override_precedence() {
        let expr = strict("(MIT OR ISC) AND Zlib");
        assert!(matches!(expr, Expression::And(_)));
        assert_eq!(expr.to_string(), "(MIT OR ISC) AND Zlib");
    }

    #[test]
    fn test_left_associative_chain_flattens() {
        let expr = strict("MIT AND ISC AND Zlib");
        assert_eq!(expr.operands().len(), 3);
        assert_eq!(expr, strict("(MIT AND ISC) AND Zlib"));
    }

    #[test]
    fn test_or_later_marker() {
        let expr = strict("GPL-2.0+");
        assert!(leaf(&expr).or_later);
        assert_eq!(expr.to_string(), "GPL-2.0+");
    }

    #[test]
    fn test_or_later_rejected_when_unsupported() {
        let e = err("MIT+");
        assert_eq!(e.position, 0);
        assert_eq!(e.kind, SyntaxErrorKind::OrLaterNotSupported("MIT".to_string()));
    }

    #[test]
    fn test_or_later_suffix_spelled_out() {
        assert!(!leaf(&strict("GPL-2.0-or-later")).or_later);
        let expr = strict("Apache-2.0-or-later");
        assert!(leaf(&expr).or_later);
        assert_eq!(expr.to_string(), "Apache-2.0+");
        assert_eq!(
            err("MIT-or-later").kind,
            SyntaxErrorKind::OrLaterNotSupported("MIT".to_string())
        );
    }

    #[test]
    fn test_unknown_license_strictness() {
        assert_eq!(
            err("Foo-1.0").kind,
            SyntaxErrorKind::UnknownLicense("Foo-1.0".to_string())
        );
        let expr = parse("Foo-1.0", false).unwrap();
        assert_eq!(leaf(&expr).license.kind(), LicenseKind::Unrecognized);
    }

    #[test]
    fn test_license_ref_always_accepted() {
        let expr = strict("LicenseRef-custom");
        assert_eq!(leaf(&expr).license.kind(), LicenseKind::Reference);
    }

    #[test]
    fn test_license_ref_policy() {
        assert_eq!(
            err("LicenseRef-").kind,
            SyntaxErrorKind::MalformedLicenseRef("LicenseRef-".to_string())
        );
        let options = ParseOptions {
            license_ref: LicenseRefPolicy::AcceptAny,
            ..ParseOptions::strict()
        };
        let expr = parse_with("LicenseRef-", Catalog::builtin(), &options).unwrap();
        assert_eq!(leaf(&expr).license.kind(), LicenseKind::Reference);
    }

    #[test]
    fn test_unknown_exception_rejected_even_when_lenient() {
        let e = parse("MIT WITH Foo-exception", false).unwrap_err();
        assert_eq!(e.position, 9);
        assert_eq!(
            e.kind,
            SyntaxErrorKind::UnknownException("Foo-exception".to_string())
        );
    }

    #[test]
    fn test_unknown_exception_allowed_by_option() {
        let options = ParseOptions {
            allow_unknown_exceptions: true,
            ..ParseOptions::strict()
        };
        let expr = parse_with("MIT WITH Foo-exception", Catalog::builtin(), &options).unwrap();
        let Expression::With(with) = expr else {
            panic!("expected WITH");
        };
        assert!(!with.exception.is_listed());
    }

    #[test]
    fn test_with_after_group_is_rejected() {
        let e = err("(MIT OR ISC) WITH LLVM-exception");
        assert_eq!(e.position, 13);
    }

    #[test]
    fn test_parenthesized_single_license_takes_exception() {
        let expr = strict("(Apache-2.0) WITH LLVM-exception");
        assert_eq!(expr.to_string(), "Apache-2.0 WITH LLVM-exception");
    }

    #[test]
    fn test_missing_operand_points_at_end() {
        let e = err("(MIT AND");
        assert_eq!(e.position, 8);
        assert!(matches!(e.kind, SyntaxErrorKind::UnexpectedEnd(_)));
    }

    #[test]
    fn test_duplicated_operator_position() {
        let e = err("MIT OR OR Apache-2.0");
        assert_eq!(e.position, 7);
        assert_eq!(
            e.kind,
            SyntaxErrorKind::UnexpectedToken {
                expected: "license identifier or '('".to_string(),
                found: "OR".to_string(),
            }
        );
    }

    #[test]
    fn test_unbalanced_parentheses() {
        assert_eq!(err("(MIT").kind, SyntaxErrorKind::UnbalancedParenthesis);
        assert_eq!(err("(MIT").position, 4);
        let e = err("MIT)");
        assert_eq!(e.kind, SyntaxErrorKind::UnbalancedParenthesis);
        assert_eq!(e.position, 3);
    }

    #[test]
    fn test_trailing_input() {
        let e = err("MIT ISC");
        assert_eq!(e.position, 4);
        assert_eq!(
            e.kind,
            SyntaxErrorKind::TrailingInput("identifier 'ISC'".to_string())
        );
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(err("").kind, SyntaxErrorKind::EmptyExpression);
        assert_eq!(err("   ").kind, SyntaxErrorKind::EmptyExpression);
        assert!(matches!(err("()").kind, SyntaxErrorKind::UnexpectedToken { .. }));
    }

    #[test]
    fn test_exception_missing() {
        let e = err("MIT WITH");
        assert_eq!(e.position, 8);
        assert_eq!(
            e.kind,
            SyntaxErrorKind::UnexpectedEnd("exception identifier".to_string())
        );
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("{}MIT{}", "(".repeat(80), ")".repeat(80));
        let e = err(&deep);
        assert_eq!(e.kind, SyntaxErrorKind::NestingTooDeep(DEFAULT_MAX_DEPTH));
        assert_eq!(e.position, DEFAULT_MAX_DEPTH);

        let shallow = format!("{}MIT{}", "(".repeat(10), ")".repeat(10));
        assert_eq!(strict(&shallow).to_string(), "MIT");
    }

    #[test]
    fn test_parsing_is_deterministic() {
        for text in ["MIT OR OR ISC", "(MIT AND ISC) OR Zlib"] {
            assert_eq!(parse(text, true), parse(text, true));
        }
    }

    #[test]
    fn test_from_str() {
        let expr: Expression = "MIT OR Apache-2.0".parse().unwrap();
        assert_eq!(expr.to_string(), "MIT OR Apache-2.0");
        assert!("MIT OR".parse::<Expression>().is_err());
    }
}
