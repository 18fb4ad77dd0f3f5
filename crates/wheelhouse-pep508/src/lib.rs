//! A library for [dependency specifiers](https://packaging.python.org/en/latest/specifications/dependency-specifiers/),
//! previously known as [PEP 508](https://peps.python.org/pep-0508/).
//!
//! ## Usage
//!
//! ```
//! use std::str::FromStr;
//! use wheelhouse_pep508::Requirement;
//!
//! let line = r#"requests [security,tests] >= 2.8.1, == 2.8.* ; python_version > "3.8""#;
//! let requirement = Requirement::from_str(line).unwrap();
//! assert_eq!(requirement.name, "requests");
//! assert_eq!(requirement.extras.len(), 2);
//! ```

#![warn(missing_docs)]

use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

use wheelhouse_normalize::{ExtraName, PackageName};
use wheelhouse_pep440::{VersionSpecifier, VersionSpecifiers};

pub use crate::environment::{MarkerEnvironment, MarkerEnvironmentBuilder};
pub use crate::marker::{
    MarkerContext, MarkerEvaluationError, MarkerExpression, MarkerOperator, MarkerTree,
    MarkerValue, MarkerVariable,
};
/// The version and specifier types requirements are built from (re-export).
pub use wheelhouse_pep440;

use crate::tokenizer::{TokenKind, Tokenizer};

mod environment;
mod marker;
mod tokenizer;

/// A parse error with a span attached, rendered with the offending part of
/// the input underlined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pep508Error {
    /// A short explanatory message.
    pub message: String,
    /// The byte offset of the span start inside the input.
    pub start: usize,
    /// The span length in bytes.
    pub len: usize,
    /// The input that failed to parse.
    pub input: String,
}

impl std::fmt::Display for Pep508Error {
    /// Pretty formatting with an underline.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use unicode_width::UnicodeWidthStr;

        let indent = self.input[..self.start].width();
        let underline = if self.start >= self.input.len() {
            1
        } else {
            self.input[self.start..(self.start + self.len).min(self.input.len())]
                .width()
                .max(1)
        };
        write!(
            f,
            "{}\n{}\n{}{}",
            self.message,
            self.input,
            " ".repeat(indent),
            "^".repeat(underline)
        )
    }
}

impl std::error::Error for Pep508Error {}

/// The version constraint or direct URL of a requirement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VersionOrUrl {
    /// A PEP 440 version specifier set, e.g. `>= 2.8.1, == 2.8.*`.
    VersionSpecifier(VersionSpecifiers),
    /// A direct reference, e.g. `@ https://example.org/pip-1.3.1.zip`.
    Url(Url),
}

impl std::fmt::Display for VersionOrUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VersionSpecifier(specifiers) => specifiers.fmt(f),
            Self::Url(url) => url.fmt(f),
        }
    }
}

/// A PEP 508 dependency specifier: name, extras, version constraint or URL,
/// and marker.
///
/// Equality and hashing are canonical: the name is compared in normalized
/// form and the specifier set and marker by their canonical texts, so
/// `Name[b,a] >= 1.0` equals `name[a,b](>=1.0)`.
#[derive(Debug, Clone)]
pub struct Requirement {
    /// The distribution name exactly as written, e.g. `Requests`.
    pub name: String,
    /// The requested extras, stored canonicalized, deduplicated, and
    /// sorted.
    pub extras: Vec<ExtraName>,
    /// The version constraint or direct URL, if any. A URL excludes a
    /// version constraint by grammar.
    pub version_or_url: Option<VersionOrUrl>,
    /// The environment marker after `;`, if any.
    pub marker: Option<MarkerTree>,
}

impl Requirement {
    /// The PEP 503 normalized form of the name.
    pub fn canonical_name(&self) -> PackageName {
        PackageName::from_str(&self.name).expect("parsing validated the name")
    }

    /// The version specifier set, if the requirement carries one.
    pub fn specifier(&self) -> Option<&VersionSpecifiers> {
        match &self.version_or_url {
            Some(VersionOrUrl::VersionSpecifier(specifiers)) => Some(specifiers),
            _ => None,
        }
    }

    /// The direct-reference URL, if the requirement carries one.
    pub fn url(&self) -> Option<&Url> {
        match &self.version_or_url {
            Some(VersionOrUrl::Url(url)) => Some(url),
            _ => None,
        }
    }

    /// Whether the marker applies in the given environment; a requirement
    /// without a marker applies everywhere.
    pub fn evaluate_markers(
        &self,
        env: &MarkerEnvironment,
        context: MarkerContext,
    ) -> Result<bool, MarkerEvaluationError> {
        match &self.marker {
            Some(marker) => marker.evaluate(env, context),
            None => Ok(true),
        }
    }

    fn specifier_text(&self) -> String {
        self.specifier().map(ToString::to_string).unwrap_or_default()
    }

    fn marker_text(&self) -> Option<String> {
        self.marker.as_ref().map(ToString::to_string)
    }
}

impl PartialEq for Requirement {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_name() == other.canonical_name()
            && self.extras == other.extras
            && self.url().map(Url::as_str) == other.url().map(Url::as_str)
            && self.specifier_text() == other.specifier_text()
            && self.marker_text() == other.marker_text()
    }
}

impl Eq for Requirement {}

impl Hash for Requirement {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical_name().hash(state);
        self.extras.hash(state);
        self.url().map(Url::as_str).hash(state);
        self.specifier_text().hash(state);
        self.marker_text().hash(state);
    }
}

impl std::fmt::Display for Requirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.extras.is_empty() {
            write!(f, "[")?;
            for (idx, extra) in self.extras.iter().enumerate() {
                if idx > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{extra}")?;
            }
            write!(f, "]")?;
        }
        match &self.version_or_url {
            Some(VersionOrUrl::VersionSpecifier(specifiers)) => write!(f, "{specifiers}")?,
            Some(VersionOrUrl::Url(url)) => {
                write!(f, " @ {url}")?;
                if self.marker.is_some() {
                    write!(f, " ")?;
                }
            }
            None => {}
        }
        if let Some(marker) = &self.marker {
            write!(f, "; {marker}")?;
        }
        Ok(())
    }
}

impl FromStr for Requirement {
    type Err = Pep508Error;

    /// Parse a dependency specifier, e.g.
    /// `requests[security] >= 2.8.1, == 2.8.* ; python_version > "3.8"`.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        parse_requirement(&mut Tokenizer::requirement(input))
    }
}

impl<'de> Deserialize<'de> for Requirement {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let requirement = String::deserialize(deserializer)?;
        Self::from_str(&requirement).map_err(de::Error::custom)
    }
}

impl Serialize for Requirement {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// ```text
/// requirement = IDENTIFIER extras? (AT_URL | specifier)? (SEMICOLON marker)? END
/// ```
fn parse_requirement(tokenizer: &mut Tokenizer) -> Result<Requirement, Pep508Error> {
    let name_token = tokenizer.read(
        TokenKind::Identifier,
        "Expected package name at the start of dependency specifier",
    )?;
    // The name rule is narrower than the identifier lexeme (no trailing
    // separators); validate it here for a spanned error.
    PackageName::from_str(name_token.text).map_err(|err| {
        tokenizer.syntax_error_at(err.to_string(), name_token.position, name_token.text.len())
    })?;
    let name = name_token.text.to_string();

    let extras = parse_extras(tokenizer)?;
    let version_or_url = parse_version_or_url(tokenizer)?;

    let marker = if tokenizer.consume(TokenKind::Semicolon).is_some() {
        Some(marker::parse::parse_marker_or(tokenizer)?)
    } else {
        None
    };

    if marker.is_none() && !tokenizer.check(TokenKind::End) {
        let message = match &version_or_url {
            None => "Expected end or semicolon (after name and no valid version specifier)",
            Some(VersionOrUrl::VersionSpecifier(_)) => {
                "Expected end or semicolon (after version specifier)"
            }
            Some(VersionOrUrl::Url(_)) => "Expected end or semicolon (after URL and whitespace)",
        };
        return Err(tokenizer.syntax_error(message.to_string()));
    }
    if marker.is_some() {
        tokenizer.read(TokenKind::End, "Expected the end of the dependency specifier")?;
    }

    Ok(Requirement {
        name,
        extras,
        version_or_url,
        marker,
    })
}

/// ```text
/// extras = LEFT_BRACKET (IDENTIFIER (COMMA IDENTIFIER)*)? RIGHT_BRACKET
/// ```
fn parse_extras(tokenizer: &mut Tokenizer) -> Result<Vec<ExtraName>, Pep508Error> {
    if tokenizer.consume(TokenKind::LeftBracket).is_none() {
        return Ok(Vec::new());
    }
    let mut extras = Vec::new();
    // Empty extras are allowed.
    if tokenizer.consume(TokenKind::RightBracket).is_some() {
        return Ok(extras);
    }
    loop {
        let token = tokenizer.read(TokenKind::Identifier, "Expected an extra name")?;
        let extra = ExtraName::from_str(token.text).map_err(|err| {
            tokenizer.syntax_error_at(err.to_string(), token.position, token.text.len())
        })?;
        extras.push(extra);
        if tokenizer.consume(TokenKind::Comma).is_some() {
            continue;
        }
        tokenizer.read(
            TokenKind::RightBracket,
            "Expected a comma or closing bracket after the extra name",
        )?;
        break;
    }
    extras.sort();
    extras.dedup();
    Ok(extras)
}

/// ```text
/// version_or_url = AT_URL | specifier_set
/// ```
fn parse_version_or_url(tokenizer: &mut Tokenizer) -> Result<Option<VersionOrUrl>, Pep508Error> {
    if let Some(token) = tokenizer.consume(TokenKind::AtUrl) {
        let url_text = token.text.trim_start_matches('@').trim_start();
        if url_text.ends_with(';') {
            return Err(tokenizer.syntax_error_at(
                "Expected space before semicolon (followed by markers) or end of string"
                    .to_string(),
                token.position + token.text.len() - 1,
                1,
            ));
        }
        let url = Url::parse(url_text).map_err(|err| {
            tokenizer.syntax_error_at(
                format!("Invalid URL `{url_text}`: {err}"),
                token.position,
                token.text.len(),
            )
        })?;
        return Ok(Some(VersionOrUrl::Url(url)));
    }
    if tokenizer.check(TokenKind::LeftParenthesis) || tokenizer.check(TokenKind::Op) {
        return Ok(Some(VersionOrUrl::VersionSpecifier(parse_specifier_set(
            tokenizer,
        )?)));
    }
    Ok(None)
}

/// ```text
/// specifier_set = LEFT_PARENTHESIS version_many? RIGHT_PARENTHESIS | version_many
/// version_many  = OP VERSION (COMMA OP VERSION)*
/// ```
fn parse_specifier_set(tokenizer: &mut Tokenizer) -> Result<VersionSpecifiers, Pep508Error> {
    let parenthesized = tokenizer.consume(TokenKind::LeftParenthesis).is_some();
    if parenthesized && tokenizer.consume(TokenKind::RightParenthesis).is_some() {
        return Ok(VersionSpecifiers::empty());
    }
    let mut clauses = Vec::new();
    loop {
        let op = tokenizer.read(TokenKind::Op, "Expected a version operator")?;
        // An arbitrary-equality operand may be any identifier-shaped text,
        // not just a version.
        let operand = tokenizer
            .consume(TokenKind::Version)
            .or_else(|| tokenizer.consume(TokenKind::Identifier))
            .ok_or_else(|| {
                tokenizer.syntax_error("Expected a version after the operator".to_string())
            })?;
        let clause = format!("{}{}", op.text, operand.text);
        let specifier = VersionSpecifier::from_str(&clause).map_err(|err| {
            tokenizer.syntax_error_at(
                err.to_string(),
                op.position,
                operand.position + operand.text.len() - op.position,
            )
        })?;
        clauses.push(specifier);
        if tokenizer.consume(TokenKind::Comma).is_some() {
            continue;
        }
        break;
    }
    if parenthesized {
        tokenizer.read(
            TokenKind::RightParenthesis,
            "Expected a closing parenthesis after version specifiers",
        )?;
    }
    Ok(clauses.into_iter().collect())
}
