//! PEP 508 environment markers: grammar, AST, and evaluation.
//!
//! Markers gate a dependency on the target environment, e.g.
//! `importlib-metadata ; python_version < "3.8"` or
//! `itsdangerous >= 1.1.0 ; extra == "security"`. The AST is a tree of
//! `and`/`or` nodes over comparison leaves and is immutable after parsing.

use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

use wheelhouse_normalize::canonicalize_name;
use wheelhouse_pep440::{Operator, Version, VersionPattern, VersionSpecifier};

use crate::tokenizer::{TokenKind, Tokenizer};
use crate::{MarkerEnvironment, Pep508Error};

/// The closed set of environment marker variables, including the PEP 751
/// list-valued additions. The deprecated PEP 345 spellings (`os.name`,
/// `sys.platform`, `platform.version`, `platform.machine`,
/// `platform.python_implementation`, `python_implementation`) parse onto
/// their canonical variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerVariable {
    /// `implementation_name`
    ImplementationName,
    /// `implementation_version`
    ImplementationVersion,
    /// `os_name`
    OsName,
    /// `platform_machine`
    PlatformMachine,
    /// `platform_python_implementation`
    PlatformPythonImplementation,
    /// `platform_release`
    PlatformRelease,
    /// `platform_system`
    PlatformSystem,
    /// `platform_version`
    PlatformVersion,
    /// `python_full_version`
    PythonFullVersion,
    /// `python_version`
    PythonVersion,
    /// `sys_platform`
    SysPlatform,
    /// `extra`
    Extra,
    /// `extras` (list-valued, lock files only)
    Extras,
    /// `dependency_groups` (list-valued, lock files only)
    DependencyGroups,
}

impl MarkerVariable {
    /// Map a spelled variable name, canonical or deprecated, onto its
    /// variant.
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "implementation_name" => Self::ImplementationName,
            "implementation_version" => Self::ImplementationVersion,
            "os_name" | "os.name" => Self::OsName,
            "platform_machine" | "platform.machine" => Self::PlatformMachine,
            "platform_python_implementation"
            | "platform.python_implementation"
            | "python_implementation" => Self::PlatformPythonImplementation,
            "platform_release" => Self::PlatformRelease,
            "platform_system" => Self::PlatformSystem,
            "platform_version" | "platform.version" => Self::PlatformVersion,
            "python_full_version" => Self::PythonFullVersion,
            "python_version" => Self::PythonVersion,
            "sys_platform" | "sys.platform" => Self::SysPlatform,
            "extra" => Self::Extra,
            "extras" => Self::Extras,
            "dependency_groups" => Self::DependencyGroups,
            _ => return None,
        })
    }

    /// The canonical replacement for a deprecated PEP 345 spelling.
    fn deprecated_alias(name: &str) -> Option<&'static str> {
        Some(match name {
            "os.name" => "os_name",
            "sys.platform" => "sys_platform",
            "platform.version" => "platform_version",
            "platform.machine" => "platform_machine",
            "platform.python_implementation" | "python_implementation" => {
                "platform_python_implementation"
            }
            _ => return None,
        })
    }

    /// Whether comparisons against this key use PEP 440 version semantics
    /// when both sides parse as versions.
    pub fn is_version_key(self) -> bool {
        matches!(
            self,
            Self::PythonVersion
                | Self::PythonFullVersion
                | Self::ImplementationVersion
                | Self::PlatformRelease
                | Self::PlatformVersion
        )
    }

    /// Whether this key resolves to a list of names rather than a string.
    pub fn is_list_key(self) -> bool {
        matches!(self, Self::Extras | Self::DependencyGroups)
    }
}

impl std::fmt::Display for MarkerVariable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::ImplementationName => "implementation_name",
            Self::ImplementationVersion => "implementation_version",
            Self::OsName => "os_name",
            Self::PlatformMachine => "platform_machine",
            Self::PlatformPythonImplementation => "platform_python_implementation",
            Self::PlatformRelease => "platform_release",
            Self::PlatformSystem => "platform_system",
            Self::PlatformVersion => "platform_version",
            Self::PythonFullVersion => "python_full_version",
            Self::PythonVersion => "python_version",
            Self::SysPlatform => "sys_platform",
            Self::Extra => "extra",
            Self::Extras => "extras",
            Self::DependencyGroups => "dependency_groups",
        })
    }
}

/// How to compare the two sides of a marker expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerOperator {
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterEqual,
    /// `<`
    LessThan,
    /// `<=`
    LessEqual,
    /// `~=`
    TildeEqual,
    /// `===`
    ExactEqual,
    /// `in`
    In,
    /// `not in`
    NotIn,
}

impl MarkerOperator {
    /// The PEP 440 counterpart used when both sides have version semantics.
    /// `in` and `not in` have none.
    fn to_pep440_operator(self) -> Option<Operator> {
        match self {
            Self::Equal => Some(Operator::Equal),
            Self::NotEqual => Some(Operator::NotEqual),
            Self::GreaterThan => Some(Operator::GreaterThan),
            Self::GreaterEqual => Some(Operator::GreaterThanEqual),
            Self::LessThan => Some(Operator::LessThan),
            Self::LessEqual => Some(Operator::LessThanEqual),
            Self::TildeEqual => Some(Operator::TildeEqual),
            Self::ExactEqual => Some(Operator::ExactEqual),
            Self::In | Self::NotIn => None,
        }
    }
}

impl FromStr for MarkerOperator {
    type Err = String;

    fn from_str(operator: &str) -> Result<Self, Self::Err> {
        Ok(match operator {
            "==" => Self::Equal,
            "!=" => Self::NotEqual,
            ">" => Self::GreaterThan,
            ">=" => Self::GreaterEqual,
            "<" => Self::LessThan,
            "<=" => Self::LessEqual,
            "~=" => Self::TildeEqual,
            "===" => Self::ExactEqual,
            "in" => Self::In,
            "not in" => Self::NotIn,
            other => return Err(format!("Invalid marker operator: {other}")),
        })
    }
}

impl std::fmt::Display for MarkerOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::GreaterThan => ">",
            Self::GreaterEqual => ">=",
            Self::LessThan => "<",
            Self::LessEqual => "<=",
            Self::TildeEqual => "~=",
            Self::ExactEqual => "===",
            Self::In => "in",
            Self::NotIn => "not in",
        })
    }
}

/// One side of a marker comparison: a variable from the closed set, or a
/// quoted string literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MarkerValue {
    /// A reference to an environment key, such as `python_version`.
    Variable(MarkerVariable),
    /// A quoted string, such as `'3.8'`.
    String(String),
}

impl std::fmt::Display for MarkerValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Variable(variable) => variable.fmt(f),
            Self::String(value) => write!(f, "\"{value}\""),
        }
    }
}

/// A single comparison such as `python_version > "3.8"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MarkerExpression {
    /// The left-hand side.
    pub lhs: MarkerValue,
    /// The comparison operator.
    pub operator: MarkerOperator,
    /// The right-hand side.
    pub rhs: MarkerValue,
}

impl std::fmt::Display for MarkerExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.lhs, self.operator, self.rhs)
    }
}

/// The context a marker is evaluated under, which decides how much leeway
/// undefined comparisons get and whether the lock-file list keys exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerContext {
    /// Core-metadata evaluation: undefined comparisons are errors.
    Metadata,
    /// Lock-file evaluation: `extras` and `dependency_groups` default to
    /// empty lists, and undefined comparisons evaluate to `false`.
    LockFile,
    /// Requirement evaluation: undefined comparisons evaluate to `false`.
    Requirement,
}

/// An error raised during marker evaluation (never during parsing).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarkerEvaluationError {
    /// An ordered comparison over values without version semantics, under
    /// the metadata context.
    #[error("Undefined comparison in marker expression `{expression}`")]
    UndefinedComparison {
        /// The offending expression, in canonical form.
        expression: String,
    },
    /// The marker referenced a key the environment does not define in this
    /// context.
    #[error("Undefined environment name `{name}` in this evaluation context")]
    UndefinedEnvironmentName {
        /// The missing key.
        name: String,
    },
}

/// A marker value resolved against an environment.
enum Resolved<'a> {
    String {
        value: &'a str,
        key: Option<MarkerVariable>,
    },
    List {
        values: &'a [String],
    },
}

fn resolve<'a>(
    value: &'a MarkerValue,
    env: &'a MarkerEnvironment,
    context: MarkerContext,
) -> Result<Resolved<'a>, MarkerEvaluationError> {
    match value {
        MarkerValue::String(literal) => Ok(Resolved::String {
            value: literal,
            key: None,
        }),
        MarkerValue::Variable(variable) => match variable {
            MarkerVariable::Extras | MarkerVariable::DependencyGroups => {
                let values = if *variable == MarkerVariable::Extras {
                    env.extras()
                } else {
                    env.dependency_groups()
                };
                match (values, context) {
                    (Some(values), _) => Ok(Resolved::List { values }),
                    (None, MarkerContext::LockFile) => Ok(Resolved::List { values: &[] }),
                    (None, _) => Err(MarkerEvaluationError::UndefinedEnvironmentName {
                        name: variable.to_string(),
                    }),
                }
            }
            _ => Ok(Resolved::String {
                value: env
                    .get_string(*variable)
                    .expect("every non-list key is string-valued"),
                key: Some(*variable),
            }),
        },
    }
}

impl MarkerExpression {
    fn evaluate(
        &self,
        env: &MarkerEnvironment,
        context: MarkerContext,
    ) -> Result<bool, MarkerEvaluationError> {
        let lhs = resolve(&self.lhs, env, context)?;
        let rhs = resolve(&self.rhs, env, context)?;

        match (lhs, rhs) {
            // Membership in a list-valued key, with both sides normalized
            // the way extra and group names are.
            (Resolved::String { value: needle, .. }, Resolved::List { values }) => {
                let needle = canonicalize_name(needle);
                let found = values
                    .iter()
                    .any(|member| canonicalize_name(member) == needle);
                match self.operator {
                    MarkerOperator::In => Ok(found),
                    MarkerOperator::NotIn => Ok(!found),
                    _ => self.undefined(context),
                }
            }
            // A list on the left-hand side has no defined comparison.
            (Resolved::List { .. }, _) => self.undefined(context),
            (
                Resolved::String {
                    value: lhs_value,
                    key: lhs_key,
                },
                Resolved::String {
                    value: rhs_value,
                    key: rhs_key,
                },
            ) => self.compare_strings(lhs_value, lhs_key, rhs_value, rhs_key, context),
        }
    }

    fn compare_strings(
        &self,
        lhs: &str,
        lhs_key: Option<MarkerVariable>,
        rhs: &str,
        rhs_key: Option<MarkerVariable>,
        context: MarkerContext,
    ) -> Result<bool, MarkerEvaluationError> {
        match self.operator {
            // Substring containment.
            MarkerOperator::In => return Ok(rhs.contains(lhs)),
            MarkerOperator::NotIn => return Ok(!rhs.contains(lhs)),
            // Arbitrary equality is always a verbatim string comparison.
            MarkerOperator::ExactEqual => return Ok(lhs == rhs),
            _ => {}
        }

        // Keys like `python_version` compare as versions when both sides
        // actually parse as such; otherwise they fall back to the string
        // rules below.
        if lhs_key.is_some_and(MarkerVariable::is_version_key)
            || rhs_key.is_some_and(MarkerVariable::is_version_key)
        {
            if let Some(result) = Self::compare_versions(lhs, self.operator, rhs) {
                return Ok(result);
            }
        }

        // Comparisons against `extra` normalize both sides (PEP 685).
        let extra = lhs_key == Some(MarkerVariable::Extra) || rhs_key == Some(MarkerVariable::Extra);
        match self.operator {
            MarkerOperator::Equal => Ok(if extra {
                canonicalize_name(lhs) == canonicalize_name(rhs)
            } else {
                lhs == rhs
            }),
            MarkerOperator::NotEqual => Ok(if extra {
                canonicalize_name(lhs) != canonicalize_name(rhs)
            } else {
                lhs != rhs
            }),
            // Ordering strings has no defined meaning.
            _ => self.undefined(context),
        }
    }

    /// Compare with specifier semantics: the right-hand side is the operand
    /// (it may carry a `.*` wildcard), the left-hand side the candidate.
    /// `None` when either side has no version reading.
    fn compare_versions(lhs: &str, operator: MarkerOperator, rhs: &str) -> Option<bool> {
        let operator = operator.to_pep440_operator()?;
        let candidate = Version::from_str(lhs.trim()).ok()?;
        let pattern = VersionPattern::from_str(rhs.trim()).ok()?;
        let specifier = VersionSpecifier::from_pattern(operator, pattern).ok()?;
        Some(specifier.contains_with(&candidate, Some(true)))
    }

    fn undefined(&self, context: MarkerContext) -> Result<bool, MarkerEvaluationError> {
        match context {
            MarkerContext::Metadata => Err(MarkerEvaluationError::UndefinedComparison {
                expression: self.to_string(),
            }),
            MarkerContext::LockFile | MarkerContext::Requirement => {
                warn!("Undefined comparison `{self}`, evaluating to false");
                Ok(false)
            }
        }
    }
}

/// A parsed marker: a tree of `and`/`or` nodes over comparison leaves.
///
/// ```
/// use std::str::FromStr;
/// use wheelhouse_pep508::MarkerTree;
///
/// let marker = MarkerTree::from_str(r#"python_version > "3.8""#).unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MarkerTree {
    /// A single comparison, such as `python_version > "3.8"`.
    Expression(MarkerExpression),
    /// A conjunction, such as `os_name == "posix" and extra == "tests"`.
    And(Vec<MarkerTree>),
    /// A disjunction, such as `os_name == "posix" or os_name == "nt"`.
    Or(Vec<MarkerTree>),
}

impl MarkerTree {
    /// Whether this marker applies in the given environment, under the
    /// given evaluation context.
    ///
    /// Evaluation is pure: identical inputs always produce the same answer.
    pub fn evaluate(
        &self,
        env: &MarkerEnvironment,
        context: MarkerContext,
    ) -> Result<bool, MarkerEvaluationError> {
        match self {
            Self::Expression(expression) => expression.evaluate(env, context),
            Self::And(children) => {
                for child in children {
                    if !child.evaluate(env, context)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::Or(children) => {
                for child in children {
                    if child.evaluate(env, context)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}

impl FromStr for MarkerTree {
    type Err = Pep508Error;

    fn from_str(markers: &str) -> Result<Self, Self::Err> {
        let mut tokenizer = Tokenizer::marker(markers);
        let marker = parse::parse_marker_or(&mut tokenizer)?;
        tokenizer.read(
            TokenKind::End,
            "Expected `and`, `or`, or the end of the marker expression",
        )?;
        Ok(marker)
    }
}

impl std::fmt::Display for MarkerTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn render(marker: &MarkerTree, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            if let MarkerTree::Expression(expression) = marker {
                write!(f, "{expression}")
            } else {
                write!(f, "({marker})")
            }
        }
        match self {
            Self::Expression(expression) => write!(f, "{expression}"),
            Self::And(children) => {
                for (idx, child) in children.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(" and ")?;
                    }
                    render(child, f)?;
                }
                Ok(())
            }
            Self::Or(children) => {
                for (idx, child) in children.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(" or ")?;
                    }
                    render(child, f)?;
                }
                Ok(())
            }
        }
    }
}

/// <https://github.com/serde-rs/serde/issues/1316#issue-332908452>
impl<'de> Deserialize<'de> for MarkerTree {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let markers = String::deserialize(deserializer)?;
        Self::from_str(&markers).map_err(de::Error::custom)
    }
}

impl Serialize for MarkerTree {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

pub(crate) mod parse {
    use super::*;

    /// ```text
    /// marker     = marker_or
    /// marker_or  = marker_and (WS* "or" marker_and)*
    /// ```
    pub(crate) fn parse_marker_or(tokenizer: &mut Tokenizer) -> Result<MarkerTree, Pep508Error> {
        parse_marker_chain(tokenizer, "or", MarkerTree::Or, parse_marker_and)
    }

    /// ```text
    /// marker_and = marker_atom (WS* "and" marker_atom)*
    /// ```
    fn parse_marker_and(tokenizer: &mut Tokenizer) -> Result<MarkerTree, Pep508Error> {
        parse_marker_chain(tokenizer, "and", MarkerTree::And, parse_marker_atom)
    }

    fn parse_marker_chain(
        tokenizer: &mut Tokenizer,
        word: &str,
        constructor: fn(Vec<MarkerTree>) -> MarkerTree,
        parse_inner: fn(&mut Tokenizer) -> Result<MarkerTree, Pep508Error>,
    ) -> Result<MarkerTree, Pep508Error> {
        let first = parse_inner(tokenizer)?;
        let mut children = vec![first];
        while let Some(token) = tokenizer.peek(TokenKind::BoolOp) {
            if token.text != word {
                break;
            }
            tokenizer.consume(TokenKind::BoolOp);
            children.push(parse_inner(tokenizer)?);
        }
        if children.len() == 1 {
            Ok(children.pop().expect("chain has exactly one child"))
        } else {
            Ok(constructor(children))
        }
    }

    /// ```text
    /// marker_atom = "(" marker_or ")" | marker_item
    /// ```
    fn parse_marker_atom(tokenizer: &mut Tokenizer) -> Result<MarkerTree, Pep508Error> {
        if tokenizer.consume(TokenKind::LeftParenthesis).is_some() {
            let marker = parse_marker_or(tokenizer)?;
            tokenizer.read(
                TokenKind::RightParenthesis,
                "Expected a closing parenthesis after the marker group",
            )?;
            return Ok(marker);
        }
        Ok(MarkerTree::Expression(parse_marker_item(tokenizer)?))
    }

    /// ```text
    /// marker_item = marker_value marker_op marker_value
    /// ```
    fn parse_marker_item(tokenizer: &mut Tokenizer) -> Result<MarkerExpression, Pep508Error> {
        let lhs = parse_marker_value(tokenizer)?;
        let operator = parse_marker_op(tokenizer)?;
        let rhs = parse_marker_value(tokenizer)?;
        Ok(MarkerExpression { lhs, operator, rhs })
    }

    /// ```text
    /// marker_value = VARIABLE | QUOTED_STRING
    /// ```
    fn parse_marker_value(tokenizer: &mut Tokenizer) -> Result<MarkerValue, Pep508Error> {
        if let Some(token) = tokenizer.consume(TokenKind::Variable) {
            if let Some(canonical) = MarkerVariable::deprecated_alias(token.text) {
                warn!("`{}` is deprecated in favor of `{canonical}`", token.text);
            }
            let variable = MarkerVariable::from_name(token.text)
                .expect("the variable rule only lexes known names");
            return Ok(MarkerValue::Variable(variable));
        }
        if let Some(token) = tokenizer.consume(TokenKind::QuotedString) {
            let value = token.text[1..token.text.len() - 1].to_string();
            return Ok(MarkerValue::String(value));
        }
        Err(tokenizer
            .syntax_error("Expected a marker variable or quoted string".to_string()))
    }

    /// ```text
    /// marker_op = OP | "in" | "not" WS+ "in"
    /// ```
    fn parse_marker_op(tokenizer: &mut Tokenizer) -> Result<MarkerOperator, Pep508Error> {
        if tokenizer.consume(TokenKind::In).is_some() {
            return Ok(MarkerOperator::In);
        }
        if tokenizer.consume(TokenKind::Not).is_some() {
            tokenizer.read(TokenKind::In, "Expected `in` after `not`")?;
            return Ok(MarkerOperator::NotIn);
        }
        if let Some(token) = tokenizer.consume(TokenKind::Op) {
            return MarkerOperator::from_str(token.text).map_err(|message| {
                tokenizer.syntax_error_at(message, token.position, token.text.len())
            });
        }
        Err(tokenizer.syntax_error(
            "Expected a marker operator, such as `==`, `>=`, or `in`".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use crate::environment::tests::linux_environment;
    use crate::MarkerEnvironmentBuilder;

    use super::*;

    fn marker(string: &str) -> MarkerTree {
        MarkerTree::from_str(string).unwrap()
    }

    fn evaluates(string: &str, env: &MarkerEnvironment) -> bool {
        marker(string)
            .evaluate(env, MarkerContext::Requirement)
            .unwrap()
    }

    fn python_env(python_version: &str, full_version: &str) -> MarkerEnvironment {
        MarkerEnvironment::from(MarkerEnvironmentBuilder {
            implementation_name: "cpython",
            implementation_version: full_version,
            os_name: "posix",
            platform_machine: "x86_64",
            platform_python_implementation: "CPython",
            platform_release: "6.5.0-1025-azure",
            platform_system: "Linux",
            platform_version: "#1 SMP",
            python_full_version: full_version,
            python_version,
            sys_platform: "linux",
        })
    }

    /// Quoting style and redundant parentheses do not change the tree.
    #[test]
    fn parse_equivalences() {
        for (left, right) in [
            (r#"python_version == '2.7'"#, r#"python_version == "2.7""#),
            (r#"(python_version == "2.7")"#, r#"python_version == "2.7""#),
            (
                r#"(python_version == "2.7" and sys_platform == "win32")"#,
                r#"python_version == "2.7" and sys_platform == "win32""#,
            ),
        ] {
            assert_eq!(marker(left), marker(right), "{left} vs {right}");
        }
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let tree = marker(
            r#"os_name == "linux" or python_version == "3.7" and sys_platform == "win32""#,
        );
        let MarkerTree::Or(children) = tree else {
            panic!("expected an or node");
        };
        assert_eq!(children.len(), 2);
        assert!(matches!(children[0], MarkerTree::Expression(_)));
        assert!(matches!(&children[1], MarkerTree::And(items) if items.len() == 2));
    }

    #[test]
    fn display_is_canonical() {
        assert_eq!(
            marker(r#"python_version == '2.7' and (sys_platform == 'win32' or sys_platform == 'linux')"#)
                .to_string(),
            r#"python_version == "2.7" and (sys_platform == "win32" or sys_platform == "linux")"#
        );
        // Deprecated spellings normalize.
        assert_eq!(
            marker("os.name == 'posix'").to_string(),
            r#"os_name == "posix""#
        );
        assert_eq!(
            marker("python_implementation == 'CPython'").to_string(),
            r#"platform_python_implementation == "CPython""#
        );
    }

    #[test]
    fn version_comparisons() {
        let env38 = python_env("3.8", "3.8.10");
        let env15 = python_env("1.5", "1.5.2");
        assert!(evaluates(r#"python_version > '2'"#, &env38));
        assert!(!evaluates(r#"python_version > '2'"#, &env15));
        assert!(evaluates(r#"python_version == '3.8'"#, &env38));
        // Zero padding applies: 3.8 == 3.8.0.
        assert!(evaluates(r#"python_version == '3.8.0'"#, &env38));
        assert!(evaluates(r#"python_version == '3.*'"#, &env38));
        assert!(evaluates(r#"python_version ~= '3.7'"#, &env38));
        assert!(evaluates(r#"'3.7' < python_version"#, &env38));
        assert!(evaluates(r#"python_full_version <= '3.9'"#, &env38));
        // Pre-release interpreter versions still compare.
        let pre = python_env("3.13", "3.13.0a2");
        assert!(evaluates(r#"python_full_version >= '3.13.0a1'"#, &pre));
    }

    #[test]
    fn string_comparisons() {
        let env = linux_environment();
        assert!(evaluates(r#"sys_platform == 'linux'"#, &env));
        assert!(evaluates(r#"'linux' in sys_platform"#, &env));
        assert!(evaluates(r#"'win' not in sys_platform"#, &env));
        assert!(!evaluates(r#"'posix' not in os_name"#, &env));
        assert!(evaluates(r#"platform_system != 'Windows'"#, &env));
    }

    #[test]
    fn exact_equality_is_verbatim() {
        let env = python_env("3.12", "3.12.1");
        assert!(evaluates(r#"python_version === '3.12'"#, &env));
        // No version semantics: trailing zeros are significant.
        assert!(!evaluates(r#"python_version === '3.12.0'"#, &env));
    }

    #[test]
    fn extra_comparisons_normalize() {
        let env = linux_environment().with_extra("Dev_Lint");
        assert!(evaluates(r#"extra == 'dev-lint'"#, &env));
        assert!(evaluates(r#"'dev-lint' == extra"#, &env));
        assert!(!evaluates(r#"extra == 'docs'"#, &env));
        // Without a requested extra, `extra` is the empty string.
        assert!(!evaluates(r#"extra == 'dev-lint'"#, &linux_environment()));
        assert!(evaluates(r#"extra != 'dev-lint'"#, &linux_environment()));
    }

    #[test]
    fn list_keys_only_exist_in_lock_files() {
        let marker = marker(r#"'tests' in extras"#);
        // Defined and populated.
        let env = linux_environment().with_extras(["Tests", "docs"]);
        assert!(marker.evaluate(&env, MarkerContext::LockFile).unwrap());
        // Defined by default (empty) under the lock-file context.
        assert!(!marker
            .evaluate(&linux_environment(), MarkerContext::LockFile)
            .unwrap());
        // Undefined elsewhere.
        assert_eq!(
            marker.evaluate(&linux_environment(), MarkerContext::Requirement),
            Err(MarkerEvaluationError::UndefinedEnvironmentName {
                name: "extras".to_string()
            })
        );
    }

    #[test]
    fn dependency_groups_membership() {
        let env = linux_environment().with_dependency_groups(["dev", "ci"]);
        let marker = marker(r#"'dev' in dependency_groups"#);
        assert!(marker.evaluate(&env, MarkerContext::LockFile).unwrap());
        let marker = MarkerTree::from_str(r#"'docs' not in dependency_groups"#).unwrap();
        assert!(marker.evaluate(&env, MarkerContext::LockFile).unwrap());
    }

    #[test]
    fn undefined_comparisons_depend_on_context() {
        let env = linux_environment();
        let ordered = marker(r#"os_name > 'a'"#);
        assert_eq!(
            ordered.evaluate(&env, MarkerContext::Metadata),
            Err(MarkerEvaluationError::UndefinedComparison {
                expression: r#"os_name > "a""#.to_string()
            })
        );
        assert_eq!(ordered.evaluate(&env, MarkerContext::Requirement), Ok(false));
        assert_eq!(ordered.evaluate(&env, MarkerContext::LockFile), Ok(false));

        // A version-like key whose value does not parse falls back to the
        // same rule: `platform_release` here is `6.5.0-1025-azure`.
        let release = marker(r#"platform_release >= '6'"#);
        assert!(release
            .evaluate(&env, MarkerContext::Metadata)
            .is_err());
        assert_eq!(release.evaluate(&env, MarkerContext::Requirement), Ok(false));
    }

    #[test]
    fn evaluation_is_pure() {
        let env = python_env("3.8", "3.8.10");
        let tree = marker(r#"python_version >= '3.8' and sys_platform == 'linux'"#);
        let first = tree.evaluate(&env, MarkerContext::Requirement).unwrap();
        let second = tree.evaluate(&env, MarkerContext::Requirement).unwrap();
        assert_eq!(first, second);
        assert!(first);
    }

    #[test]
    fn parse_errors_underline_the_cursor() {
        let err = MarkerTree::from_str(r#"python_version == "3.8".*"#).unwrap_err();
        assert_eq!(
            err.to_string(),
            indoc! {r#"
                Expected `and`, `or`, or the end of the marker expression
                python_version == "3.8".*
                                       ^"#
            }
        );
        let err = MarkerTree::from_str("'a' ==").unwrap_err();
        insta::assert_snapshot!(err.to_string(), @r###"
        Expected a marker variable or quoted string
        'a' ==
              ^
        "###);
    }

    #[test]
    fn not_requires_in() {
        assert!(MarkerTree::from_str("'posix' not os_name").is_err());
        marker("'posix' not in os_name");
        marker("'posix' not  in os_name");
    }

    #[test]
    fn serde_roundtrip() {
        let tree: MarkerTree = serde_json::from_str(r#""python_version > '2'""#).unwrap();
        assert_eq!(
            serde_json::to_string(&tree).unwrap(),
            r#""python_version > \"2\"""#
        );
    }
}
