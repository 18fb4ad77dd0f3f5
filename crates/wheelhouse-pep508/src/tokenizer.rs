//! The shared regex-backed tokenizer behind the requirement and marker
//! grammars.
//!
//! Each grammar assembles a rule table mapping token kinds to patterns; the
//! patterns are compiled once per table and anchored at the current cursor.
//! `check`/`consume`/`read` are kind-driven, so the same input byte can lex
//! differently depending on what the grammar asks for (a `1.0` is a version
//! operand after an operator, but would be an identifier elsewhere).

use std::sync::LazyLock;

use regex::Regex;

use crate::Pep508Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    LeftParenthesis,
    RightParenthesis,
    LeftBracket,
    RightBracket,
    Semicolon,
    Comma,
    QuotedString,
    Op,
    BoolOp,
    In,
    Not,
    Variable,
    Version,
    AtUrl,
    Identifier,
    End,
}

/// A single lexed token: its kind, the trimmed matched text, and the byte
/// position of the text inside the source.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Token<'a> {
    pub(crate) text: &'a str,
    pub(crate) position: usize,
}

/// Lexical fragments shared between the rule tables.
const QUOTED_STRING_PATTERN: &str = r#"\s*(?:'[^']*'|"[^"]*")"#;
const OP_PATTERN: &str = r"\s*(?:===|==|~=|!=|<=|>=|<|>)";
const BOOL_OP_PATTERN: &str = r"\s*(?:or|and)\b";
const IN_PATTERN: &str = r"\s*in\b";
const NOT_PATTERN: &str = r"\s*not\b";
const VARIABLE_PATTERN: &str = r"\s*(?:python_version|python_full_version|os[._]name|sys[._]platform|platform_(?:release|system)|platform[._](?:version|machine|python_implementation)|python_implementation|implementation_(?:name|version)|extras?|dependency_groups)\b";
/// A version operand as a lexeme: validation is the version parser's job.
const VERSION_PATTERN: &str = r"\s*v?[0-9][a-zA-Z0-9_.!+*-]*";
const AT_URL_PATTERN: &str = r"\s*@ *[^ ]+";
const IDENTIFIER_PATTERN: &str = r"\s*[a-zA-Z0-9][a-zA-Z0-9._-]*";

struct RuleSet {
    rules: Vec<(TokenKind, Regex)>,
}

impl RuleSet {
    fn compile(table: &[(TokenKind, &str)]) -> Self {
        Self {
            rules: table
                .iter()
                .map(|(kind, pattern)| {
                    let regex = Regex::new(&format!(r"\A(?:{pattern})"))
                        .expect("token patterns are valid");
                    (*kind, regex)
                })
                .collect(),
        }
    }

    fn regex(&self, kind: TokenKind) -> &Regex {
        &self
            .rules
            .iter()
            .find(|(rule, _)| *rule == kind)
            .expect("token kind is part of this grammar's rule table")
            .1
    }
}

/// The dependency-specifier grammar: everything.
static REQUIREMENT_RULES: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::compile(&[
        (TokenKind::LeftParenthesis, r"\s*\("),
        (TokenKind::RightParenthesis, r"\s*\)"),
        (TokenKind::LeftBracket, r"\s*\["),
        (TokenKind::RightBracket, r"\s*\]"),
        (TokenKind::Semicolon, r"\s*;"),
        (TokenKind::Comma, r"\s*,"),
        (TokenKind::QuotedString, QUOTED_STRING_PATTERN),
        (TokenKind::Op, OP_PATTERN),
        (TokenKind::BoolOp, BOOL_OP_PATTERN),
        (TokenKind::In, IN_PATTERN),
        (TokenKind::Not, NOT_PATTERN),
        (TokenKind::Variable, VARIABLE_PATTERN),
        (TokenKind::Version, VERSION_PATTERN),
        (TokenKind::AtUrl, AT_URL_PATTERN),
        (TokenKind::Identifier, IDENTIFIER_PATTERN),
    ])
});

/// The marker grammar: the subset reachable from a marker expression.
static MARKER_RULES: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::compile(&[
        (TokenKind::LeftParenthesis, r"\s*\("),
        (TokenKind::RightParenthesis, r"\s*\)"),
        (TokenKind::QuotedString, QUOTED_STRING_PATTERN),
        (TokenKind::Op, OP_PATTERN),
        (TokenKind::BoolOp, BOOL_OP_PATTERN),
        (TokenKind::In, IN_PATTERN),
        (TokenKind::Not, NOT_PATTERN),
        (TokenKind::Variable, VARIABLE_PATTERN),
    ])
});

pub(crate) struct Tokenizer<'a> {
    source: &'a str,
    rules: &'static RuleSet,
    position: usize,
}

impl<'a> Tokenizer<'a> {
    /// A tokenizer over the full requirement grammar.
    pub(crate) fn requirement(source: &'a str) -> Self {
        Self {
            source,
            rules: &REQUIREMENT_RULES,
            position: 0,
        }
    }

    /// A tokenizer over the marker grammar only.
    pub(crate) fn marker(source: &'a str) -> Self {
        Self {
            source,
            rules: &MARKER_RULES,
            position: 0,
        }
    }

    /// Match the given kind at the cursor without advancing.
    fn match_at(&self, kind: TokenKind) -> Option<(Token<'a>, usize)> {
        if kind == TokenKind::End {
            return self.source[self.position..]
                .trim_start()
                .is_empty()
                .then_some((
                    Token {
                        text: "",
                        position: self.source.len(),
                    },
                    self.source.len(),
                ));
        }
        let matched = self.rules.regex(kind).find(&self.source[self.position..])?;
        let raw = matched.as_str();
        let text = raw.trim();
        let offset = raw.len() - raw.trim_start().len();
        Some((
            Token {
                text,
                position: self.position + offset,
            },
            self.position + raw.len(),
        ))
    }

    /// Whether the next token is of the given kind.
    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.match_at(kind).is_some()
    }

    /// Peek the next token of the given kind without consuming it.
    pub(crate) fn peek(&self, kind: TokenKind) -> Option<Token<'a>> {
        self.match_at(kind).map(|(token, _)| token)
    }

    /// Consume the next token if it is of the given kind.
    pub(crate) fn consume(&mut self, kind: TokenKind) -> Option<Token<'a>> {
        let (token, next) = self.match_at(kind)?;
        self.position = next;
        Some(token)
    }

    /// Consume the next token of the given kind, or fail with the given
    /// message anchored at the cursor.
    pub(crate) fn read(
        &mut self,
        kind: TokenKind,
        expected: &str,
    ) -> Result<Token<'a>, Pep508Error> {
        match self.consume(kind) {
            Some(token) => Ok(token),
            None => Err(self.syntax_error(expected.to_string())),
        }
    }

    /// A syntax error spanning the next pending character.
    pub(crate) fn syntax_error(&self, message: String) -> Pep508Error {
        let rest = &self.source[self.position..];
        let skipped = rest.len() - rest.trim_start().len();
        let start = self.position + skipped;
        let len = self.source[start..]
            .chars()
            .next()
            .map(char::len_utf8)
            .unwrap_or(1);
        Pep508Error {
            message,
            start,
            len,
            input: self.source.to_string(),
        }
    }

    /// A syntax error over an explicit span.
    pub(crate) fn syntax_error_at(&self, message: String, start: usize, len: usize) -> Pep508Error {
        Pep508Error {
            message,
            start,
            len,
            input: self.source.to_string(),
        }
    }
}
