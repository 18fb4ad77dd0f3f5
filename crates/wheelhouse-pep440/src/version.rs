use std::borrow::Borrow;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::{Arc, LazyLock, OnceLock};

use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// The PEP 440 version grammar as a verbose regular expression.
///
/// Exposed verbatim so that downstream tooling can embed it into larger
/// grammars. The pattern is unanchored and must be compiled with the
/// case-insensitive and verbose flags, e.g.
/// `(?xi)^\s*<VERSION_PATTERN>\s*$` for a full-string match.
///
/// See: <https://packaging.python.org/en/latest/specifications/version-specifiers/#appendix-parsing-version-strings-with-regular-expressions>
pub const VERSION_PATTERN: &str = r"
    v?
    (?:
        (?:(?P<epoch>[0-9]+)!)?                           # epoch
        (?P<release>[0-9]+(?:\.[0-9]+)*)                  # release segment
        (?P<pre>                                          # pre-release
            [-_\.]?
            (?P<pre_l>alpha|a|beta|b|preview|pre|c|rc)
            [-_\.]?
            (?P<pre_n>[0-9]+)?
        )?
        (?P<post>                                         # post release
            (?:-(?P<post_n1>[0-9]+))
            |
            (?:
                [-_\.]?
                (?P<post_l>post|rev|r)
                [-_\.]?
                (?P<post_n2>[0-9]+)?
            )
        )?
        (?P<dev>                                          # dev release
            [-_\.]?
            (?P<dev_l>dev)
            [-_\.]?
            (?P<dev_n>[0-9]+)?
        )?
    )
    (?:\+(?P<local>[a-z0-9]+(?:[-_\.][a-z0-9]+)*))?       # local version
";

static VERSION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?xi)^\s*{VERSION_PATTERN}\s*$")).expect("VERSION_PATTERN is valid")
});

/// A version number such as `1.2.3` or `4!5.6.7a8.post9.dev0+local.1`.
///
/// Versions are immutable after construction. Equality, hashing, and the
/// total order all use the canonical comparison key, so trailing zeros in
/// the release segment are insignificant: `1 == 1.0 == 1.0.0`.
///
/// Parse with [`Version::from_str`]:
///
/// ```
/// use std::str::FromStr;
/// use wheelhouse_pep440::Version;
///
/// let version = Version::from_str("1.19").unwrap();
/// ```
#[derive(Clone)]
pub struct Version {
    inner: Arc<VersionInner>,
}

#[derive(Debug)]
struct VersionInner {
    epoch: u64,
    release: Vec<u64>,
    pre: Option<Prerelease>,
    post: Option<u64>,
    dev: Option<u64>,
    local: Vec<LocalSegment>,
    /// Comparison key, computed on first use. `OnceLock` publication means
    /// concurrent readers may compute it twice but can never observe a torn
    /// value.
    key: OnceLock<OrderingKey>,
}

impl Version {
    /// Create a new version from an iterator of release segments.
    ///
    /// # Panics
    ///
    /// When the iterator yields no elements.
    pub fn new<I, R>(release: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Borrow<u64>,
    {
        let release: Vec<u64> = release.into_iter().map(|n| *n.borrow()).collect();
        assert!(!release.is_empty(), "release must have at least one segment");
        Self::from_parts(0, release, None, None, None, Vec::new())
    }

    fn from_parts(
        epoch: u64,
        release: Vec<u64>,
        pre: Option<Prerelease>,
        post: Option<u64>,
        dev: Option<u64>,
        local: Vec<LocalSegment>,
    ) -> Self {
        Self {
            inner: Arc::new(VersionInner {
                epoch,
                release,
                pre,
                post,
                dev,
                local,
                key: OnceLock::new(),
            }),
        }
    }

    /// Returns the epoch of the version (`0` unless an `N!` prefix was given).
    pub fn epoch(&self) -> u64 {
        self.inner.epoch
    }

    /// Returns the release segments, e.g. `[1, 2, 3]` for `1.2.3`.
    pub fn release(&self) -> &[u64] {
        &self.inner.release
    }

    /// Returns the pre-release component, if any.
    pub fn pre(&self) -> Option<Prerelease> {
        self.inner.pre
    }

    /// Returns the post-release counter, if any.
    pub fn post(&self) -> Option<u64> {
        self.inner.post
    }

    /// Returns the dev-release counter, if any.
    pub fn dev(&self) -> Option<u64> {
        self.inner.dev
    }

    /// Returns the local version segments, empty if there are none.
    pub fn local(&self) -> &[LocalSegment] {
        &self.inner.local
    }

    /// The first release segment, e.g. `1` for `1.2.3`.
    pub fn major(&self) -> u64 {
        self.release().first().copied().unwrap_or(0)
    }

    /// The second release segment, or `0` if there is none.
    pub fn minor(&self) -> u64 {
        self.release().get(1).copied().unwrap_or(0)
    }

    /// The third release segment, or `0` if there is none.
    pub fn micro(&self) -> u64 {
        self.release().get(2).copied().unwrap_or(0)
    }

    /// Whether this is a pre-release in the PEP 440 sense, i.e. it carries a
    /// pre-release or a dev-release segment.
    pub fn is_prerelease(&self) -> bool {
        self.inner.pre.is_some() || self.inner.dev.is_some()
    }

    /// Whether this is a post-release.
    pub fn is_postrelease(&self) -> bool {
        self.inner.post.is_some()
    }

    /// Whether this is a dev-release.
    pub fn is_devrelease(&self) -> bool {
        self.inner.dev.is_some()
    }

    /// Whether this version carries a local segment, e.g. `1.2.3+ubuntu.1`.
    pub fn is_local(&self) -> bool {
        !self.inner.local.is_empty()
    }

    /// Whether this is a stable version, i.e. neither a pre- nor dev-release.
    pub fn is_stable(&self) -> bool {
        !self.is_prerelease()
    }

    /// The public part of the version: everything except the local segment.
    ///
    /// "Local version labels MUST be ignored entirely when checking if
    /// candidate versions match a given version specifier."
    #[must_use]
    pub fn without_local(&self) -> Self {
        if self.is_local() {
            self.map(|inner| inner.local.clear())
        } else {
            self.clone()
        }
    }

    /// The base version: epoch and release only, with every qualifier
    /// stripped.
    #[must_use]
    pub fn base_version(&self) -> Self {
        Self::from_parts(self.epoch(), self.release().to_vec(), None, None, None, Vec::new())
    }

    /// Return a copy with the given epoch.
    #[must_use]
    pub fn with_epoch(&self, epoch: u64) -> Self {
        self.map(|inner| inner.epoch = epoch)
    }

    /// Return a copy with the given pre-release component.
    #[must_use]
    pub fn with_pre(&self, pre: Option<Prerelease>) -> Self {
        self.map(|inner| inner.pre = pre)
    }

    /// Return a copy with the given post-release counter.
    #[must_use]
    pub fn with_post(&self, post: Option<u64>) -> Self {
        self.map(|inner| inner.post = post)
    }

    /// Return a copy with the given dev-release counter.
    #[must_use]
    pub fn with_dev(&self, dev: Option<u64>) -> Self {
        self.map(|inner| inner.dev = dev)
    }

    /// Return a copy with the given local segments.
    #[must_use]
    pub fn with_local(&self, local: Vec<LocalSegment>) -> Self {
        self.map(|inner| inner.local = local)
    }

    /// Copy every component except the cached comparison key, apply `f`, and
    /// rewrap. The key cache must never survive a component change.
    fn map(&self, f: impl FnOnce(&mut VersionInner)) -> Self {
        let mut inner = VersionInner {
            epoch: self.inner.epoch,
            release: self.inner.release.clone(),
            pre: self.inner.pre,
            post: self.inner.post,
            dev: self.inner.dev,
            local: self.inner.local.clone(),
            key: OnceLock::new(),
        };
        f(&mut inner);
        Self {
            inner: Arc::new(inner),
        }
    }

    fn key(&self) -> &OrderingKey {
        self.inner.key.get_or_init(|| {
            let mut release = self.inner.release.clone();
            // Trailing zeros are insignificant for comparison purposes only.
            while release.last() == Some(&0) {
                release.pop();
            }
            let pre = match (self.inner.pre, self.inner.post, self.inner.dev) {
                (Some(pre), _, _) => PreKey::Pre(pre.kind, pre.number),
                // A dev release with no pre and no post sorts below any
                // pre-release of the same release segment.
                (None, None, Some(_)) => PreKey::BelowAll,
                _ => PreKey::AboveAll,
            };
            let post = match self.inner.post {
                Some(post) => PostKey::Post(post),
                None => PostKey::Absent,
            };
            let dev = match self.inner.dev {
                Some(dev) => DevKey::Dev(dev),
                None => DevKey::Absent,
            };
            OrderingKey {
                epoch: self.inner.epoch,
                release,
                pre,
                post,
                dev,
                local: self.inner.local.clone(),
            }
        })
    }
}

/// The cached total-order key. Field order matches comparison precedence so
/// the derived lexicographic `Ord` is exactly the PEP 440 order.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct OrderingKey {
    epoch: u64,
    release: Vec<u64>,
    pre: PreKey,
    post: PostKey,
    dev: DevKey,
    local: Vec<LocalSegment>,
}

/// Pre-release slot: a bare dev release sorts below any pre-release, and the
/// absence of both sorts above any pre-release.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum PreKey {
    BelowAll,
    Pre(PrereleaseKind, u64),
    AboveAll,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum PostKey {
    Absent,
    Post(u64),
}

/// Dev releases sort before the corresponding non-dev release.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum DevKey {
    Dev(u64),
    Absent,
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    /// 1.0.dev456 < 1.0a1 < 1.0a2.dev456 < 1.0a12 < 1.0b1.dev456 < 1.0b2
    /// < 1.0b2.post345.dev456 < 1.0b2.post345 < 1.0rc1 < 1.0
    /// < 1.0+abc.5 < 1.0.post456.dev34 < 1.0.post456 < 1.1.dev1
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(other.key())
    }
}

impl FromStr for Version {
    type Err = VersionParseError;

    /// Parses a version such as `1.19`, `1.0a1`, `1.0+abc.5` or `1!2012.2`.
    ///
    /// Leading `v`, surrounding whitespace, and the alternate spellings of
    /// the pre-, post-, and dev-release separators are accepted and
    /// normalized away. Wildcard suffixes (`1.0.*`) are not versions; parse
    /// those as a [`VersionPattern`].
    fn from_str(version: &str) -> Result<Self, Self::Err> {
        let Some(groups) = VERSION_REGEX.captures(version) else {
            return Err(ErrorKind::NoMatch {
                version: version.to_string(),
            }
            .into());
        };

        let epoch = groups
            .name("epoch")
            .map(|epoch| parse_u64(epoch.as_str(), version))
            .transpose()?
            .unwrap_or(0);
        let release = groups
            .name("release")
            .expect("release group always participates in a match")
            .as_str()
            .split('.')
            .map(|segment| parse_u64(segment, version))
            .collect::<Result<Vec<u64>, _>>()?;
        let pre = match groups.name("pre_l") {
            Some(label) => {
                let kind = match label.as_str().to_ascii_lowercase().as_str() {
                    "a" | "alpha" => PrereleaseKind::Alpha,
                    "b" | "beta" => PrereleaseKind::Beta,
                    // `rc` is the canonical spelling of the release-candidate
                    // label; `c`, `pre` and `preview` are accepted aliases.
                    "rc" | "c" | "pre" | "preview" => PrereleaseKind::Rc,
                    other => unreachable!("pre-release label {other} not in the grammar"),
                };
                let number = groups
                    .name("pre_n")
                    .map(|number| parse_u64(number.as_str(), version))
                    .transpose()?
                    .unwrap_or(0);
                Some(Prerelease { kind, number })
            }
            None => None,
        };
        let post = if let Some(number) = groups.name("post_n1") {
            Some(parse_u64(number.as_str(), version)?)
        } else if groups.name("post_l").is_some() {
            Some(
                groups
                    .name("post_n2")
                    .map(|number| parse_u64(number.as_str(), version))
                    .transpose()?
                    .unwrap_or(0),
            )
        } else {
            None
        };
        let dev = match groups.name("dev_l") {
            Some(_) => Some(
                groups
                    .name("dev_n")
                    .map(|number| parse_u64(number.as_str(), version))
                    .transpose()?
                    .unwrap_or(0),
            ),
            None => None,
        };
        let local = match groups.name("local") {
            Some(local) => local
                .as_str()
                .split(['-', '_', '.'])
                .map(|segment| {
                    if segment.bytes().all(|byte| byte.is_ascii_digit()) {
                        parse_u64(segment, version).map(LocalSegment::Number)
                    } else {
                        Ok(LocalSegment::String(segment.to_ascii_lowercase()))
                    }
                })
                .collect::<Result<Vec<LocalSegment>, _>>()?,
            None => Vec::new(),
        };

        Ok(Self::from_parts(epoch, release, pre, post, dev, local))
    }
}

/// Shows the canonical form: `[N!]N(.N)*[{a|b|rc}N][.postN][.devN][+local]`.
impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.epoch() != 0 {
            write!(f, "{}!", self.epoch())?;
        }
        let mut release = self.release().iter();
        if let Some(first) = release.next() {
            write!(f, "{first}")?;
        }
        for segment in release {
            write!(f, ".{segment}")?;
        }
        if let Some(Prerelease { kind, number }) = self.pre() {
            write!(f, "{kind}{number}")?;
        }
        if let Some(post) = self.post() {
            write!(f, ".post{post}")?;
        }
        if let Some(dev) = self.dev() {
            write!(f, ".dev{dev}")?;
        }
        let mut local = self.local().iter();
        if let Some(first) = local.next() {
            write!(f, "+{first}")?;
            for segment in local {
                write!(f, ".{segment}")?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{self}\"")
    }
}

/// <https://github.com/serde-rs/serde/issues/1316#issue-332908452>
impl<'de> Deserialize<'de> for Version {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let version = String::deserialize(deserializer)?;
        Self::from_str(&version).map_err(de::Error::custom)
    }
}

impl Serialize for Version {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Render the canonical form of a version, optionally with insignificant
/// trailing zeros removed from the release segment, so that `1.0.0` becomes
/// `1`. The zero-stripped form is the one filename and metadata comparisons
/// use.
pub fn canonicalize_version(version: &Version, strip_trailing_zero: bool) -> String {
    if !strip_trailing_zero {
        return version.to_string();
    }
    let mut release = version.release();
    while release.len() > 1 && release.last() == Some(&0) {
        release = &release[..release.len() - 1];
    }
    let stripped = Version::from_parts(
        version.epoch(),
        release.to_vec(),
        version.pre(),
        version.post(),
        version.dev(),
        version.local().to_vec(),
    );
    stripped.to_string()
}

/// An optional pre-release component: one of `a` (alpha), `b` (beta) or `rc`
/// (release candidate), with a counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Prerelease {
    /// The pre-release label.
    pub kind: PrereleaseKind,
    /// The pre-release counter, `0` when the label carried no number.
    pub number: u64,
}

/// The canonical pre-release labels, in sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PrereleaseKind {
    /// `a`
    Alpha,
    /// `b`
    Beta,
    /// `rc`
    Rc,
}

impl std::fmt::Display for PrereleaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Alpha => f.write_str("a"),
            Self::Beta => f.write_str("b"),
            Self::Rc => f.write_str("rc"),
        }
    }
}

impl std::fmt::Display for Prerelease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.kind, self.number)
    }
}

/// One segment of a local version, e.g. `ubuntu` and `1` in `1.0+ubuntu.1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LocalSegment {
    /// A lowercase alphanumeric segment.
    String(String),
    /// A numeric segment.
    Number(u64),
}

impl std::fmt::Display for LocalSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(string) => write!(f, "{string}"),
            Self::Number(number) => write!(f, "{number}"),
        }
    }
}

impl PartialOrd for LocalSegment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LocalSegment {
    fn cmp(&self, other: &Self) -> Ordering {
        // Numeric segments sort above alphanumeric ones.
        match (self, other) {
            (Self::String(one), Self::String(two)) => one.cmp(two),
            (Self::Number(one), Self::Number(two)) => one.cmp(two),
            (Self::String(_), Self::Number(_)) => Ordering::Less,
            (Self::Number(_), Self::String(_)) => Ordering::Greater,
        }
    }
}

/// A version operand that may carry a trailing `.*` wildcard, such as
/// `1.0.*`, as allowed for the `==` and `!=` operators.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionPattern {
    version: Version,
    wildcard: bool,
}

impl VersionPattern {
    /// A pattern matching exactly the given version.
    pub fn verbatim(version: Version) -> Self {
        Self {
            version,
            wildcard: false,
        }
    }

    /// A `version.*` prefix pattern.
    pub fn wildcard(version: Version) -> Self {
        Self {
            version,
            wildcard: true,
        }
    }

    /// The version part of the pattern, without any wildcard.
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Whether the pattern ends in `.*`.
    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    /// Consume the pattern, returning its version.
    pub fn into_version(self) -> Version {
        self.version
    }
}

impl FromStr for VersionPattern {
    type Err = VersionPatternParseError;

    fn from_str(pattern: &str) -> Result<Self, Self::Err> {
        match pattern.trim_end().strip_suffix(".*") {
            Some(prefix) => {
                let version = Version::from_str(prefix).map_err(PatternErrorKind::Version)?;
                // The grammar forbids combining a wildcard with the
                // segments that would make the prefix ambiguous.
                if version.is_devrelease() {
                    return Err(PatternErrorKind::WildcardDev.into());
                }
                if version.is_local() {
                    return Err(PatternErrorKind::WildcardLocal.into());
                }
                Ok(Self::wildcard(version))
            }
            None => Ok(Self::verbatim(
                Version::from_str(pattern).map_err(PatternErrorKind::Version)?,
            )),
        }
    }
}

impl std::fmt::Display for VersionPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.wildcard {
            write!(f, "{}.*", self.version)
        } else {
            self.version.fmt(f)
        }
    }
}

/// An error when parsing a [`Version`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionParseError {
    kind: Box<ErrorKind>,
}

impl std::error::Error for VersionParseError {}

impl std::fmt::Display for VersionParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self.kind {
            ErrorKind::NoMatch { ref version } => {
                write!(f, "Invalid version: `{version}` does not match the PEP 440 grammar")
            }
            ErrorKind::NumberTooLarge { ref version } => {
                write!(f, "Invalid version: a numeric segment of `{version}` exceeds a 64-bit integer")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ErrorKind {
    /// The string does not match the PEP 440 grammar at all.
    NoMatch { version: String },
    /// A numeric component does not fit into a `u64`.
    NumberTooLarge { version: String },
}

impl From<ErrorKind> for VersionParseError {
    fn from(kind: ErrorKind) -> Self {
        Self { kind: Box::new(kind) }
    }
}

/// An error when parsing a [`VersionPattern`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionPatternParseError {
    kind: Box<PatternErrorKind>,
}

impl std::error::Error for VersionPatternParseError {}

impl std::fmt::Display for VersionPatternParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self.kind {
            PatternErrorKind::Version(ref err) => err.fmt(f),
            PatternErrorKind::WildcardDev => {
                f.write_str("A wildcard `.*` cannot follow a dev release segment")
            }
            PatternErrorKind::WildcardLocal => {
                f.write_str("A wildcard `.*` cannot follow a local version segment")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PatternErrorKind {
    Version(VersionParseError),
    WildcardDev,
    WildcardLocal,
}

impl From<PatternErrorKind> for VersionPatternParseError {
    fn from(kind: PatternErrorKind) -> Self {
        Self { kind: Box::new(kind) }
    }
}

impl From<VersionParseError> for VersionPatternParseError {
    fn from(err: VersionParseError) -> Self {
        PatternErrorKind::Version(err).into()
    }
}

fn parse_u64(segment: &str, version: &str) -> Result<u64, VersionParseError> {
    segment.parse::<u64>().map_err(|_| {
        ErrorKind::NumberTooLarge {
            version: version.to_string(),
        }
        .into()
    })
}

/// Compare two release segments, padding the shorter one with zeros.
pub(crate) fn compare_release(this: &[u64], other: &[u64]) -> Ordering {
    let longest = this.len().max(other.len());
    for i in 0..longest {
        let left = this.get(i).copied().unwrap_or(0);
        let right = other.get(i).copied().unwrap_or(0);
        match left.cmp(&right) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests;
