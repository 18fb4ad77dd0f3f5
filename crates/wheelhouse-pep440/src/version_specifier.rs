use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

use crate::version::compare_release;
use crate::{Version, VersionPattern, VersionPatternParseError};

/// One of `~=` `==` `!=` `<=` `>=` `<` `>` `===`, with the trailing-`.*`
/// forms of `==` and `!=` folded in as distinct variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operator {
    /// `== 1.2.3`
    Equal,
    /// `== 1.2.*`
    EqualStar,
    /// `=== <anything>` (arbitrary equality; discouraged)
    ///
    /// <https://packaging.python.org/en/latest/specifications/version-specifiers/#arbitrary-equality>
    ExactEqual,
    /// `!= 1.2.3`
    NotEqual,
    /// `!= 1.2.*`
    NotEqualStar,
    /// `~= 1.2`
    TildeEqual,
    /// `< 1.2.3`
    LessThan,
    /// `<= 1.2.3`
    LessThanEqual,
    /// `> 1.2.3`
    GreaterThan,
    /// `>= 1.2.3`
    GreaterThanEqual,
}

impl Operator {
    /// Whether a version with a non-empty local segment is permitted behind
    /// this operator.
    ///
    /// From the version-specifiers specification: "Local version
    /// identifiers are NOT permitted in this version specifier", for
    /// everything except `==` and `!=` without a wildcard, and the ordered
    /// `<=`/`>=` comparisons which ignore it.
    pub(crate) fn is_local_compatible(self) -> bool {
        !matches!(
            self,
            Self::GreaterThan
                | Self::LessThan
                | Self::TildeEqual
                | Self::EqualStar
                | Self::NotEqualStar
        )
    }

    /// Returns the wildcard version of this operator, if it has one.
    pub(crate) fn to_star(self) -> Option<Self> {
        match self {
            Self::Equal => Some(Self::EqualStar),
            Self::NotEqual => Some(Self::NotEqualStar),
            _ => None,
        }
    }

    /// Returns `true` for the `== V.*` and `!= V.*` forms.
    pub fn is_star(self) -> bool {
        matches!(self, Self::EqualStar | Self::NotEqualStar)
    }
}

impl FromStr for Operator {
    type Err = OperatorParseError;

    /// Parse the base operator token. Wildcards are not recognized here;
    /// they belong to the operand.
    fn from_str(operator: &str) -> Result<Self, Self::Err> {
        let operator = match operator {
            "==" => Self::Equal,
            "===" => {
                warn!("Using arbitrary equality (`===`) is discouraged");
                Self::ExactEqual
            }
            "!=" => Self::NotEqual,
            "~=" => Self::TildeEqual,
            "<" => Self::LessThan,
            "<=" => Self::LessThanEqual,
            ">" => Self::GreaterThan,
            ">=" => Self::GreaterThanEqual,
            other => {
                return Err(OperatorParseError {
                    got: other.to_string(),
                })
            }
        };
        Ok(operator)
    }
}

impl std::fmt::Display for Operator {
    /// Note that `EqualStar` and `NotEqualStar` print without the star; the
    /// star belongs to the operand.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let operator = match self {
            Self::Equal | Self::EqualStar => "==",
            Self::ExactEqual => "===",
            Self::NotEqual | Self::NotEqualStar => "!=",
            Self::TildeEqual => "~=",
            Self::LessThan => "<",
            Self::LessThanEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanEqual => ">=",
        };
        f.write_str(operator)
    }
}

/// An error that occurs when parsing an invalid version specifier operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorParseError {
    pub(crate) got: String,
}

impl std::error::Error for OperatorParseError {}

impl std::fmt::Display for OperatorParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "no such comparison operator {:?}, must be one of ~= == != <= >= < > ===",
            self.got
        )
    }
}

/// Whether a specifier (or specifier set) admits pre-release versions.
///
/// This is a genuine three-way switch, not a nullable boolean: `Auto`
/// derives the answer from the operand shape (a pre-release operand admits
/// pre-releases), while `Allow` and `Forbid` override it in either
/// direction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrereleasePolicy {
    /// Derive from the operand: a pre-release operand admits pre-releases.
    #[default]
    Auto,
    /// Always admit pre-releases.
    Allow,
    /// Never admit pre-releases.
    Forbid,
}

/// The operand of a specifier: a parsed version for every operator except
/// arbitrary equality, which keeps its text opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Operand {
    Version(Version),
    Arbitrary(String),
}

/// A single version clause such as `>1.2.3`, `== 1.1.*` or `~=1.0+abc.5`.
/// Parse with [`VersionSpecifier::from_str`]:
///
/// ```
/// use std::str::FromStr;
/// use wheelhouse_pep440::{Version, VersionSpecifier};
///
/// let version = Version::from_str("1.19").unwrap();
/// let specifier = VersionSpecifier::from_str("== 1.*").unwrap();
/// assert!(specifier.contains(&version));
/// ```
#[derive(Debug, Clone)]
pub struct VersionSpecifier {
    operator: Operator,
    operand: Operand,
    prereleases: PrereleasePolicy,
}

/// Equality ignores the prerelease policy: two specifiers are the same
/// clause if their canonical texts agree.
impl PartialEq for VersionSpecifier {
    fn eq(&self, other: &Self) -> bool {
        (self.operator, &self.operand) == (other.operator, &other.operand)
    }
}

impl Eq for VersionSpecifier {}

impl std::hash::Hash for VersionSpecifier {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.operator.hash(state);
        self.operand.hash(state);
    }
}

impl VersionSpecifier {
    /// Build from operator and operand pattern, validating that the operator
    /// is allowed with that operand shape. The pattern distinguishes `1.1.*`
    /// from `1.1`.
    pub fn from_pattern(
        operator: Operator,
        pattern: VersionPattern,
    ) -> Result<Self, VersionSpecifierBuildError> {
        let star = pattern.is_wildcard();
        let version = pattern.into_version();

        let operator = if star {
            match operator.to_star() {
                Some(star_operator) => star_operator,
                None => return Err(BuildErrorKind::OperatorWithStar { operator }.into()),
            }
        } else {
            operator
        };

        Self::from_version(operator, version)
    }

    /// Build from operator and version, validating the operand shape.
    pub fn from_version(
        operator: Operator,
        version: Version,
    ) -> Result<Self, VersionSpecifierBuildError> {
        if let Operator::ExactEqual = operator {
            // Arbitrary equality is opaque; keep the canonical text.
            return Ok(Self::arbitrary_equality(version.to_string()));
        }

        // "Local version identifiers are NOT permitted in this version
        // specifier."
        if version.is_local() && !operator.is_local_compatible() {
            return Err(BuildErrorKind::OperatorLocalCombo { operator, version }.into());
        }

        if operator == Operator::TildeEqual && version.release().len() < 2 {
            return Err(BuildErrorKind::CompatibleRelease.into());
        }

        Ok(Self {
            operator,
            operand: Operand::Version(version),
            prereleases: PrereleasePolicy::Auto,
        })
    }

    /// An arbitrary-equality (`===`) specifier over verbatim text.
    pub fn arbitrary_equality(text: impl Into<String>) -> Self {
        Self {
            operator: Operator::ExactEqual,
            operand: Operand::Arbitrary(text.into()),
            prereleases: PrereleasePolicy::Auto,
        }
    }

    /// `==<version>`
    pub fn equals_version(version: Version) -> Self {
        Self {
            operator: Operator::Equal,
            operand: Operand::Version(version),
            prereleases: PrereleasePolicy::Auto,
        }
    }

    /// `!=<version>`
    pub fn not_equals_version(version: Version) -> Self {
        Self {
            operator: Operator::NotEqual,
            operand: Operand::Version(version),
            prereleases: PrereleasePolicy::Auto,
        }
    }

    /// `>=<version>`
    pub fn greater_than_equal_version(version: Version) -> Self {
        Self {
            operator: Operator::GreaterThanEqual,
            operand: Operand::Version(version),
            prereleases: PrereleasePolicy::Auto,
        }
    }

    /// `<<version>`
    pub fn less_than_version(version: Version) -> Self {
        Self {
            operator: Operator::LessThan,
            operand: Operand::Version(version),
            prereleases: PrereleasePolicy::Auto,
        }
    }

    /// Get the operator, e.g. `>=` in `>= 2.0.0`.
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// Get the operand version, or `None` for an arbitrary-equality operand.
    pub fn version(&self) -> Option<&Version> {
        match &self.operand {
            Operand::Version(version) => Some(version),
            Operand::Arbitrary(_) => None,
        }
    }

    /// The prerelease policy of this specifier.
    pub fn prereleases(&self) -> PrereleasePolicy {
        self.prereleases
    }

    /// Return a copy with the given prerelease policy.
    #[must_use]
    pub fn with_prereleases(mut self, prereleases: PrereleasePolicy) -> Self {
        self.prereleases = prereleases;
        self
    }

    /// Whether this specifier admits pre-release versions, either via an
    /// explicit policy or derived from the operand shape.
    pub fn prereleases_allowed(&self) -> bool {
        match self.prereleases {
            PrereleasePolicy::Allow => true,
            PrereleasePolicy::Forbid => false,
            PrereleasePolicy::Auto => match (self.operator, &self.operand) {
                // An exclusion clause never opts a set into pre-releases.
                (Operator::NotEqual | Operator::NotEqualStar, _) => false,
                (_, Operand::Version(version)) => version.is_prerelease(),
                (_, Operand::Arbitrary(text)) => Version::from_str(text)
                    .map(|version| version.is_prerelease())
                    .unwrap_or(false),
            },
        }
    }

    /// Whether the given version satisfies this specifier, honoring the
    /// prerelease policy: a pre-release candidate only matches when the
    /// specifier admits pre-releases.
    pub fn contains(&self, version: &Version) -> bool {
        self.contains_with(version, None)
    }

    /// [`VersionSpecifier::contains`] with the prerelease admission decided
    /// by the caller instead of this specifier's own policy.
    pub fn contains_with(&self, version: &Version, prereleases: Option<bool>) -> bool {
        let allowed = prereleases.unwrap_or_else(|| self.prereleases_allowed());
        if version.is_prerelease() && !allowed {
            return false;
        }
        self.matches(version)
    }

    /// Whether the given version string satisfies this specifier. Input that
    /// does not parse as a PEP 440 version never matches (except under
    /// arbitrary equality, which compares the raw text).
    pub fn contains_str(&self, version: &str) -> bool {
        if let Operand::Arbitrary(text) = &self.operand {
            return version.trim().eq_ignore_ascii_case(text);
        }
        match Version::from_str(version) {
            Ok(version) => self.contains(&version),
            Err(_) => false,
        }
    }

    /// The operator semantics, without the prerelease gate.
    ///
    /// See: <https://packaging.python.org/en/latest/specifications/version-specifiers/#version-specifiers>
    fn matches(&self, version: &Version) -> bool {
        let spec = match &self.operand {
            Operand::Arbitrary(text) => {
                // Arbitrary equality compares the candidate's canonical text,
                // case-insensitively, without any version semantics.
                return version.to_string().eq_ignore_ascii_case(text);
            }
            Operand::Version(spec) => spec,
        };

        // "Local version labels MUST be ignored entirely when checking if
        // candidate versions match a given version specifier", unless the
        // specifier itself pins a local label.
        let candidate = if spec.is_local() {
            version.clone()
        } else {
            version.without_local()
        };

        match self.operator {
            Operator::Equal => candidate == *spec,
            Operator::NotEqual => candidate != *spec,
            Operator::EqualStar => Self::matches_prefix(spec, &candidate),
            Operator::NotEqualStar => !Self::matches_prefix(spec, &candidate),
            Operator::ExactEqual => version.to_string() == spec.to_string(),
            Operator::TildeEqual => {
                // "~= V.N" is ">= V.N, == V.*" with the last release segment
                // dropped from the prefix. The constructor guarantees at
                // least two segments.
                if candidate.epoch() != spec.epoch() {
                    return false;
                }
                let prefix = &spec.release()[..spec.release().len() - 1];
                if !Self::release_starts_with(prefix, candidate.release()) {
                    return false;
                }
                candidate >= *spec
            }
            Operator::LessThan => {
                if !(candidate < *spec) {
                    return false;
                }
                // Exclusive ordering: < V does not match pre-releases of the
                // same release series unless V is itself one.
                !(!spec.is_prerelease()
                    && candidate.is_prerelease()
                    && Self::same_release_series(&candidate, spec))
            }
            Operator::LessThanEqual => candidate <= *spec,
            Operator::GreaterThan => {
                if !(candidate > *spec) {
                    return false;
                }
                if Self::same_release_series(&candidate, spec) {
                    // > V does not match post-releases of V unless V is one,
                    // nor any local version of the same series.
                    if !spec.is_postrelease() && candidate.is_postrelease() {
                        return false;
                    }
                    if version.is_local() {
                        return false;
                    }
                }
                true
            }
            Operator::GreaterThanEqual => candidate >= *spec,
        }
    }

    /// The `== V.*` prefix match: same epoch, the release segments of the
    /// pattern are a (zero-padded) prefix of the candidate's, and any pre or
    /// post segment spelled in the pattern matches exactly.
    fn matches_prefix(spec: &Version, candidate: &Version) -> bool {
        if spec.epoch() != candidate.epoch() {
            return false;
        }
        if !Self::release_starts_with(spec.release(), candidate.release()) {
            return false;
        }
        if spec.pre().is_some() && candidate.pre() != spec.pre() {
            return false;
        }
        if spec.post().is_some() && candidate.post() != spec.post() {
            return false;
        }
        true
    }

    /// Whether `release` starts with `prefix`, padding the shorter side
    /// with zeros, so that `1.2` is a prefix of `1.2.3` and `1.2.0` one of
    /// `1.2`.
    fn release_starts_with(prefix: &[u64], release: &[u64]) -> bool {
        prefix
            .iter()
            .enumerate()
            .all(|(i, segment)| release.get(i).copied().unwrap_or(0) == *segment)
    }

    /// Whether the two versions are in the same release series: equal epoch
    /// and equal (zero-padded) release segments.
    fn same_release_series(candidate: &Version, spec: &Version) -> bool {
        candidate.epoch() == spec.epoch()
            && compare_release(candidate.release(), spec.release()) == std::cmp::Ordering::Equal
    }

    /// Filter versions by this specifier, with the original's prerelease
    /// fallback: when nothing matches outright and no policy forbids it,
    /// matching pre-releases are returned rather than nothing.
    pub fn filter<T: VersionCandidate>(
        &self,
        items: impl IntoIterator<Item = T>,
        prereleases: Option<bool>,
    ) -> Vec<T> {
        let admit = prereleases.unwrap_or(true);
        let accept_outright = prereleases.unwrap_or(false) || self.prereleases_allowed();
        let mut kept = Vec::new();
        let mut fallback = Vec::new();
        for item in items {
            // Items that cannot be read as versions are dropped, never an
            // error.
            let Some(version) = item.candidate_version() else {
                continue;
            };
            if !self.contains_with(&version, Some(admit)) {
                continue;
            }
            if version.is_prerelease() && !accept_outright {
                fallback.push(item);
            } else {
                kept.push(item);
            }
        }
        if kept.is_empty() {
            fallback
        } else {
            kept
        }
    }
}

impl FromStr for VersionSpecifier {
    type Err = VersionSpecifierParseError;

    /// Parses a specifier such as `>= 1.19`, `== 1.1.*`, `~=1.0+abc.5` or
    /// `<=1!2012.2`.
    fn from_str(specifier: &str) -> Result<Self, Self::Err> {
        let mut s = unscanny::Scanner::new(specifier);
        s.eat_while(|c: char| c.is_whitespace());
        let operator = s.eat_while(['=', '!', '~', '<', '>']);
        if operator.is_empty() {
            return Err(ParseErrorKind::MissingOperator.into());
        }
        let operator = Operator::from_str(operator).map_err(ParseErrorKind::InvalidOperator)?;
        s.eat_while(|c: char| c.is_whitespace());
        let version = s.eat_while(|c: char| !c.is_whitespace());
        if version.is_empty() {
            return Err(ParseErrorKind::MissingVersion.into());
        }
        let specifier = if operator == Operator::ExactEqual {
            Self::arbitrary_equality(version)
        } else {
            let pattern: VersionPattern =
                version.parse().map_err(ParseErrorKind::InvalidVersion)?;
            Self::from_pattern(operator, pattern).map_err(ParseErrorKind::InvalidSpecifier)?
        };
        s.eat_while(|c: char| c.is_whitespace());
        if !s.done() {
            return Err(ParseErrorKind::InvalidTrailing(s.after().to_string()).into());
        }
        Ok(specifier)
    }
}

impl std::fmt::Display for VersionSpecifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.operand {
            Operand::Version(version) if self.operator.is_star() => {
                write!(f, "{}{}.*", self.operator, version)
            }
            Operand::Version(version) => write!(f, "{}{}", self.operator, version),
            Operand::Arbitrary(text) => write!(f, "{}{}", self.operator, text),
        }
    }
}

/// <https://github.com/serde-rs/serde/issues/1316#issue-332908452>
impl<'de> Deserialize<'de> for VersionSpecifier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let specifier = String::deserialize(deserializer)?;
        Self::from_str(&specifier).map_err(de::Error::custom)
    }
}

impl Serialize for VersionSpecifier {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// A set of version clauses joined by commas, such as `>=2.1,<3`. A version
/// is contained in the set when every clause admits it.
///
/// ```
/// # use std::str::FromStr;
/// # use wheelhouse_pep440::{Version, VersionSpecifiers};
/// let specifiers = VersionSpecifiers::from_str(">=1.16, <2.0").unwrap();
/// assert!(specifiers.contains(&Version::from_str("1.19").unwrap()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionSpecifiers {
    /// Sorted by canonical text and deduplicated.
    specifiers: Vec<VersionSpecifier>,
    prereleases: PrereleasePolicy,
}

impl std::ops::Deref for VersionSpecifiers {
    type Target = [VersionSpecifier];

    fn deref(&self) -> &Self::Target {
        &self.specifiers
    }
}

impl VersionSpecifiers {
    /// The empty set, which matches every (non-pre-release) version.
    pub fn empty() -> Self {
        Self {
            specifiers: Vec::new(),
            prereleases: PrereleasePolicy::Auto,
        }
    }

    /// Returns `true` if the set has no clauses.
    pub fn is_empty(&self) -> bool {
        self.specifiers.is_empty()
    }

    /// The prerelease policy of this set.
    pub fn prereleases(&self) -> PrereleasePolicy {
        self.prereleases
    }

    /// Return a copy with the given prerelease policy.
    #[must_use]
    pub fn with_prereleases(mut self, prereleases: PrereleasePolicy) -> Self {
        self.prereleases = prereleases;
        self
    }

    /// Deduplicate by canonical text and store in canonical order.
    fn from_unsorted(mut specifiers: Vec<VersionSpecifier>) -> Self {
        specifiers.sort_by_cached_key(ToString::to_string);
        specifiers.dedup_by_key(|specifier| specifier.to_string());
        Self {
            specifiers,
            prereleases: PrereleasePolicy::Auto,
        }
    }

    /// Whether this set admits pre-release versions: an explicit policy
    /// wins; otherwise any member with a pre-release operand opts the whole
    /// set in.
    pub fn prereleases_allowed(&self) -> bool {
        self.resolved_prereleases().unwrap_or(false)
    }

    /// `Some(allowed)` when a decision exists (explicit policy or a member
    /// opting in), `None` when the default applies.
    fn resolved_prereleases(&self) -> Option<bool> {
        match self.prereleases {
            PrereleasePolicy::Allow => Some(true),
            PrereleasePolicy::Forbid => Some(false),
            PrereleasePolicy::Auto => {
                if self
                    .specifiers
                    .iter()
                    .any(VersionSpecifier::prereleases_allowed)
                {
                    Some(true)
                } else {
                    None
                }
            }
        }
    }

    /// Whether all clauses match the given version. Pre-releases are
    /// rejected outright unless the set admits them; note that this makes
    /// the empty set reject pre-releases.
    pub fn contains(&self, version: &Version) -> bool {
        let allowed = self.prereleases_allowed();
        if version.is_prerelease() && !allowed {
            return false;
        }
        self.specifiers
            .iter()
            .all(|specifier| specifier.contains_with(version, Some(allowed)))
    }

    /// [`VersionSpecifiers::contains`] over a version string. Input that
    /// does not parse matches only a set made up entirely of arbitrary
    /// equality clauses whose text it equals.
    pub fn contains_str(&self, version: &str) -> bool {
        match Version::from_str(version) {
            Ok(version) => self.contains(&version),
            Err(_) => {
                !self.specifiers.is_empty()
                    && self
                        .specifiers
                        .iter()
                        .all(|specifier| specifier.contains_str(version))
            }
        }
    }

    /// Filter versions by this set.
    ///
    /// Unlike [`VersionSpecifiers::contains`] applied item by item: when no
    /// item passes under the default prerelease policy and the set does not
    /// explicitly forbid pre-releases, the matching pre-release items pass
    /// through. Items that cannot be read as versions are dropped silently.
    pub fn filter<T: VersionCandidate>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        let prereleases = self.resolved_prereleases();
        if self.specifiers.is_empty() {
            let admit = prereleases.unwrap_or(false);
            let mut kept = Vec::new();
            let mut fallback = Vec::new();
            for item in items {
                let Some(version) = item.candidate_version() else {
                    continue;
                };
                if version.is_prerelease() && !admit {
                    if kept.is_empty() {
                        fallback.push(item);
                    }
                } else {
                    kept.push(item);
                }
            }
            if kept.is_empty() && !fallback.is_empty() && prereleases.is_none() {
                fallback
            } else {
                kept
            }
        } else {
            let mut items: Vec<T> = items.into_iter().collect();
            for specifier in &self.specifiers {
                items = specifier.filter(items, prereleases);
            }
            items
        }
    }

    /// Union the clauses of two sets. Fails when one set explicitly allows
    /// pre-releases and the other explicitly forbids them.
    pub fn combine(&self, other: &Self) -> Result<Self, VersionSpecifiersCombineError> {
        let prereleases = match (self.prereleases, other.prereleases) {
            (policy, PrereleasePolicy::Auto) => policy,
            (PrereleasePolicy::Auto, policy) => policy,
            (left, right) if left == right => left,
            _ => return Err(VersionSpecifiersCombineError(())),
        };
        let mut specifiers = self.specifiers.clone();
        specifiers.extend(other.specifiers.iter().cloned());
        let mut combined = Self::from_unsorted(specifiers);
        combined.prereleases = prereleases;
        Ok(combined)
    }
}

impl FromIterator<VersionSpecifier> for VersionSpecifiers {
    fn from_iter<T: IntoIterator<Item = VersionSpecifier>>(iter: T) -> Self {
        Self::from_unsorted(iter.into_iter().collect())
    }
}

impl From<VersionSpecifier> for VersionSpecifiers {
    fn from(specifier: VersionSpecifier) -> Self {
        Self::from_unsorted(vec![specifier])
    }
}

impl FromStr for VersionSpecifiers {
    type Err = VersionSpecifiersParseError;

    fn from_str(specifiers: &str) -> Result<Self, Self::Err> {
        parse_version_specifiers(specifiers).map(Self::from_unsorted)
    }
}

impl Default for VersionSpecifiers {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Display for VersionSpecifiers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (idx, specifier) in self.specifiers.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            write!(f, "{specifier}")?;
        }
        Ok(())
    }
}

impl<'de> Deserialize<'de> for VersionSpecifiers {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let specifiers = String::deserialize(deserializer)?;
        Self::from_str(&specifiers).map_err(de::Error::custom)
    }
}

impl Serialize for VersionSpecifiers {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Something that can stand in for a PEP 440 version in a
/// [`VersionSpecifiers::filter`] call: a parsed version, or a raw string
/// which passes through unchanged when it matches.
pub trait VersionCandidate {
    /// The version this item stands for, or `None` when it cannot be read
    /// as one.
    fn candidate_version(&self) -> Option<Version>;
}

impl VersionCandidate for Version {
    fn candidate_version(&self) -> Option<Version> {
        Some(self.clone())
    }
}

impl VersionCandidate for &Version {
    fn candidate_version(&self) -> Option<Version> {
        Some((*self).clone())
    }
}

impl VersionCandidate for &str {
    fn candidate_version(&self) -> Option<Version> {
        Version::from_str(self).ok()
    }
}

impl VersionCandidate for String {
    fn candidate_version(&self) -> Option<Version> {
        Version::from_str(self).ok()
    }
}

/// Parse a comma-separated list of specifiers such as `>= 1.0, != 1.3.*`.
fn parse_version_specifiers(
    specifiers: &str,
) -> Result<Vec<VersionSpecifier>, VersionSpecifiersParseError> {
    let mut parsed = Vec::new();
    if specifiers.trim().is_empty() {
        return Ok(parsed);
    }
    let mut start: usize = 0;
    let separator = ",";
    for clause in specifiers.split(separator) {
        match VersionSpecifier::from_str(clause) {
            Ok(specifier) => parsed.push(specifier),
            Err(err) => {
                return Err(VersionSpecifiersParseError {
                    inner: Box::new(VersionSpecifiersParseErrorInner {
                        err,
                        line: specifiers.to_string(),
                        start,
                        end: start + clause.len(),
                    }),
                });
            }
        }
        start += clause.len();
        start += separator.len();
    }
    Ok(parsed)
}

/// An error that occurs when constructing a specifier from an operator and
/// operand that do not go together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSpecifierBuildError {
    kind: Box<BuildErrorKind>,
}

impl std::error::Error for VersionSpecifierBuildError {}

impl std::fmt::Display for VersionSpecifierBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self.kind {
            BuildErrorKind::OperatorLocalCombo {
                operator,
                ref version,
            } => {
                write!(
                    f,
                    "Operator {operator} is incompatible with versions containing \
                     non-empty local segments (`{version}`)"
                )
            }
            BuildErrorKind::OperatorWithStar { operator } => {
                write!(
                    f,
                    "Operator {operator} cannot be used with a wildcard version specifier"
                )
            }
            BuildErrorKind::CompatibleRelease => f.write_str(
                "The ~= operator requires at least two segments in the release version",
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BuildErrorKind {
    /// A local segment behind an operator that forbids one.
    OperatorLocalCombo { operator: Operator, version: Version },
    /// A wildcard behind an operator without a wildcard form.
    OperatorWithStar { operator: Operator },
    /// `~=` with a single-segment release.
    CompatibleRelease,
}

impl From<BuildErrorKind> for VersionSpecifierBuildError {
    fn from(kind: BuildErrorKind) -> Self {
        Self { kind: Box::new(kind) }
    }
}

/// An error that occurs when parsing a single version specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSpecifierParseError {
    kind: Box<ParseErrorKind>,
}

impl std::error::Error for VersionSpecifierParseError {}

impl std::fmt::Display for VersionSpecifierParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self.kind {
            ParseErrorKind::InvalidOperator(ref err) => err.fmt(f),
            ParseErrorKind::InvalidVersion(ref err) => err.fmt(f),
            ParseErrorKind::InvalidSpecifier(ref err) => err.fmt(f),
            ParseErrorKind::MissingOperator => {
                f.write_str("Unexpected end of version specifier, expected operator")
            }
            ParseErrorKind::MissingVersion => {
                f.write_str("Unexpected end of version specifier, expected version")
            }
            ParseErrorKind::InvalidTrailing(ref trail) => {
                write!(f, "Trailing `{trail}` is not allowed")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ParseErrorKind {
    InvalidOperator(OperatorParseError),
    InvalidVersion(VersionPatternParseError),
    InvalidSpecifier(VersionSpecifierBuildError),
    MissingOperator,
    MissingVersion,
    InvalidTrailing(String),
}

impl From<ParseErrorKind> for VersionSpecifierParseError {
    fn from(kind: ParseErrorKind) -> Self {
        Self { kind: Box::new(kind) }
    }
}

/// A specifier-set parse error, with the span of the offending clause inside
/// the parsed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSpecifiersParseError {
    inner: Box<VersionSpecifiersParseErrorInner>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct VersionSpecifiersParseErrorInner {
    err: VersionSpecifierParseError,
    line: String,
    start: usize,
    end: usize,
}

impl VersionSpecifiersParseError {
    /// The string that failed to parse.
    pub fn line(&self) -> &str {
        &self.inner.line
    }
}

impl std::error::Error for VersionSpecifiersParseError {}

impl std::fmt::Display for VersionSpecifiersParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use unicode_width::UnicodeWidthStr;

        let VersionSpecifiersParseErrorInner {
            ref err,
            ref line,
            start,
            end,
        } = *self.inner;
        writeln!(f, "Failed to parse version specifiers: {err}:")?;
        writeln!(f, "{line}")?;
        let indent = line[..start].width();
        let marker = line[start..end].width().max(1);
        write!(f, "{}{}", " ".repeat(indent), "^".repeat(marker))?;
        Ok(())
    }
}

/// An attempt to combine a set that explicitly allows pre-releases with one
/// that explicitly forbids them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSpecifiersCombineError(());

impl std::error::Error for VersionSpecifiersCombineError {}

impl std::fmt::Display for VersionSpecifiersCombineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(
            "Cannot combine specifier sets with conflicting explicit prerelease policies",
        )
    }
}

#[cfg(test)]
mod tests;
