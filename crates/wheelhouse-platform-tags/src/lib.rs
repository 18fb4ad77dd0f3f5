//! Wheel compatibility tags: the `interpreter-abi-platform` triple, the
//! compressed tag-set syntax, and the enumeration of tags a given
//! interpreter and platform accept, in priority order.
//!
//! The enumeration functions are pure over explicit inputs. Probing the
//! running system (sysconfig, the dynamic loader, SDK versions) is a
//! collaborator's job; its results arrive here as a [`Platform`] and an
//! [`Interpreter`].

pub use platform::{
    android_platforms, ios_platforms, mac_platforms, manylinux_platforms, musllinux_platforms,
    windows_platforms, AlwaysCompatible, Arch, ManylinuxPolicy, Os, Platform,
};

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

mod platform;

/// A `(major, minor)` Python version, e.g. `(3, 12)`.
pub type PythonVersion = (u8, u8);

/// A wheel compatibility tag triple, e.g. `cp312-cp312-manylinux_2_28_x86_64`.
///
/// All three fields are lowercased at construction; a tag is fully
/// determined by them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag {
    interpreter: String,
    abi: String,
    platform: String,
}

impl Tag {
    /// Create a tag, lowercasing each field.
    pub fn new(
        interpreter: impl AsRef<str>,
        abi: impl AsRef<str>,
        platform: impl AsRef<str>,
    ) -> Self {
        Self {
            interpreter: interpreter.as_ref().to_lowercase(),
            abi: abi.as_ref().to_lowercase(),
            platform: platform.as_ref().to_lowercase(),
        }
    }

    /// The interpreter field, e.g. `cp312` or `py3`.
    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }

    /// The ABI field, e.g. `cp312`, `abi3`, or `none`.
    pub fn abi(&self) -> &str {
        &self.abi
    }

    /// The platform field, e.g. `manylinux_2_28_x86_64` or `any`.
    pub fn platform(&self) -> &str {
        &self.platform
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{}", self.interpreter, self.abi, self.platform)
    }
}

impl FromStr for Tag {
    type Err = ParseTagError;

    /// Parse a single (non-compressed) tag triple.
    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let mut parts = tag.split('-');
        let (Some(interpreter), Some(abi), Some(platform), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(ParseTagError::new(tag));
        };
        if interpreter.is_empty() || abi.is_empty() || platform.is_empty() {
            return Err(ParseTagError::new(tag));
        }
        Ok(Self::new(interpreter, abi, platform))
    }
}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let tag = String::deserialize(deserializer)?;
        Self::from_str(&tag).map_err(de::Error::custom)
    }
}

impl Serialize for Tag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// A string was not a (compressed) tag triple.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid tag: `{tag}`; expected an `interpreter-abi-platform` triple")]
pub struct ParseTagError {
    tag: String,
}

impl ParseTagError {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
        }
    }
}

/// Expand a compressed tag set such as `py2.py3-none-any` into the
/// cartesian product of its `.`-separated fields.
///
/// ```
/// use wheelhouse_platform_tags::{parse_tag, Tag};
///
/// let tags = parse_tag("py2.py3-none-any").unwrap();
/// assert_eq!(tags.len(), 2);
/// assert!(tags.contains(&Tag::new("py2", "none", "any")));
/// assert!(tags.contains(&Tag::new("py3", "none", "any")));
/// ```
pub fn parse_tag(tag: &str) -> Result<BTreeSet<Tag>, ParseTagError> {
    let mut parts = tag.split('-');
    let (Some(interpreters), Some(abis), Some(platforms), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(ParseTagError::new(tag));
    };
    let mut tags = BTreeSet::new();
    for interpreter in interpreters.split('.') {
        for abi in abis.split('.') {
            for platform in platforms.split('.') {
                if interpreter.is_empty() || abi.is_empty() || platform.is_empty() {
                    return Err(ParseTagError::new(tag));
                }
                tags.insert(Tag::new(interpreter, abi, platform));
            }
        }
    }
    Ok(tags)
}

/// The tags for a CPython interpreter: the given ABIs first, then `abi3`
/// and `none`, then an `abi3` countdown through the older minors (the
/// stable ABI exists since CPython 3.2).
pub fn cpython_tags<A, P>(python_version: PythonVersion, abis: A, platforms: P) -> Vec<Tag>
where
    A: IntoIterator,
    A::Item: AsRef<str>,
    P: IntoIterator,
    P::Item: AsRef<str>,
{
    let (major, minor) = python_version;
    let interpreter = format!("cp{major}{minor}");
    // `abi3` and `none` are appended at their fixed positions below.
    let abis: Vec<String> = abis
        .into_iter()
        .map(|abi| abi.as_ref().to_string())
        .filter(|abi| abi != "abi3" && abi != "none")
        .collect();
    let platforms: Vec<String> = platforms
        .into_iter()
        .map(|platform| platform.as_ref().to_string())
        .collect();

    let mut tags = Vec::new();
    for abi in &abis {
        for platform in &platforms {
            tags.push(Tag::new(&interpreter, abi, platform));
        }
    }
    for platform in &platforms {
        tags.push(Tag::new(&interpreter, "abi3", platform));
    }
    for platform in &platforms {
        tags.push(Tag::new(&interpreter, "none", platform));
    }
    for older in (2..minor).rev() {
        for platform in &platforms {
            tags.push(Tag::new(format!("cp{major}{older}"), "abi3", platform));
        }
    }
    tags
}

/// The tags for a non-CPython interpreter: `<interp>-<abi>-<platform>`,
/// with `none` appended to the ABIs when absent.
pub fn generic_tags<A, P>(interpreter: &str, abis: A, platforms: P) -> Vec<Tag>
where
    A: IntoIterator,
    A::Item: AsRef<str>,
    P: IntoIterator,
    P::Item: AsRef<str>,
{
    let mut abis: Vec<String> = abis.into_iter().map(|abi| abi.as_ref().to_string()).collect();
    if !abis.iter().any(|abi| abi == "none") {
        abis.push("none".to_string());
    }
    let platforms: Vec<String> = platforms
        .into_iter()
        .map(|platform| platform.as_ref().to_string())
        .collect();
    let mut tags = Vec::new();
    for abi in &abis {
        for platform in &platforms {
            tags.push(Tag::new(interpreter, abi, platform));
        }
    }
    tags
}

/// The `py` versions compatible with the given interpreter version, in
/// priority order: exact, major-only, then older minors descending.
fn py_interpreter_range(python_version: PythonVersion) -> Vec<String> {
    let (major, minor) = python_version;
    let mut versions = vec![format!("py{major}{minor}"), format!("py{major}")];
    for older in (0..minor).rev() {
        versions.push(format!("py{major}{older}"));
    }
    versions
}

/// The tags every interpreter of the given version accepts: `py*-none-<platform>`
/// for each platform, `<interpreter>-none-any` when an interpreter is
/// given, and finally `py*-none-any`.
pub fn compatible_tags<P>(
    python_version: PythonVersion,
    interpreter: Option<&str>,
    platforms: P,
) -> Vec<Tag>
where
    P: IntoIterator,
    P::Item: AsRef<str>,
{
    let platforms: Vec<String> = platforms
        .into_iter()
        .map(|platform| platform.as_ref().to_string())
        .collect();
    let mut tags = Vec::new();
    for version in py_interpreter_range(python_version) {
        for platform in &platforms {
            tags.push(Tag::new(&version, "none", platform));
        }
    }
    if let Some(interpreter) = interpreter {
        tags.push(Tag::new(interpreter, "none", "any"));
    }
    for version in py_interpreter_range(python_version) {
        tags.push(Tag::new(&version, "none", "any"));
    }
    tags
}

/// A probed interpreter, as the platform-probe collaborator reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreter {
    /// The short implementation name, e.g. `cp` for CPython or `pp` for
    /// PyPy.
    pub name: String,
    /// The interpreter's `(major, minor)` version.
    pub python_version: PythonVersion,
    /// The supported ABIs, most specific first (e.g. `["cp312"]`).
    pub abis: Vec<String>,
}

impl Interpreter {
    /// The interpreter tag, e.g. `cp312`.
    fn tag(&self) -> String {
        let (major, minor) = self.python_version;
        format!("{}{major}{minor}", self.name)
    }
}

/// The full sequence of tags accepted by an interpreter on a set of
/// platform tags, from most specific to least specific. This is the
/// system-tags computation, minus the probing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tags(Vec<Tag>);

impl Tags {
    /// Compose the tag sequence for the given interpreter and platform
    /// tags (themselves ordered most specific first).
    pub fn from_interpreter<P>(interpreter: &Interpreter, platforms: P) -> Self
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        let platforms: Vec<String> = platforms
            .into_iter()
            .map(|platform| platform.as_ref().to_string())
            .collect();
        let mut tags = if interpreter.name == "cp" {
            cpython_tags(interpreter.python_version, &interpreter.abis, &platforms)
        } else {
            generic_tags(&interpreter.tag(), &interpreter.abis, &platforms)
        };
        let compat_interpreter = match interpreter.name.as_str() {
            "cp" => Some(interpreter.tag()),
            // PyPy advertises the major-only form.
            "pp" => Some(format!("pp{}", interpreter.python_version.0)),
            _ => None,
        };
        tags.extend(compatible_tags(
            interpreter.python_version,
            compat_interpreter.as_deref(),
            &platforms,
        ));
        Self(tags)
    }

    /// Iterate the tags in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.0.iter()
    }

    /// The number of tags in the sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The rank of a tag in this sequence; lower ranks are more specific.
    /// `None` when the tag is not accepted at all.
    pub fn precedence(&self, tag: &Tag) -> Option<usize> {
        self.0.iter().position(|candidate| candidate == tag)
    }

    /// The best (lowest) rank among the given tags, e.g. the tag set of a
    /// wheel filename. `None` when none is accepted.
    pub fn compatibility<'a>(&self, tags: impl IntoIterator<Item = &'a Tag>) -> Option<usize> {
        tags.into_iter()
            .filter_map(|tag| self.precedence(tag))
            .min()
    }
}

impl<'a> IntoIterator for &'a Tags {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(text: &str) -> Tag {
        Tag::from_str(text).unwrap()
    }

    #[test]
    fn tag_fields_are_lowercased() {
        let tag = Tag::new("CP311", "None", "ANY");
        assert_eq!(tag.to_string(), "cp311-none-any");
    }

    #[test]
    fn parse_tag_expands_compressed_sets() {
        let tags = parse_tag("py2.py3-none-any").unwrap();
        assert_eq!(
            tags,
            BTreeSet::from([Tag::new("py2", "none", "any"), Tag::new("py3", "none", "any")])
        );
        let tags = parse_tag("cp311-cp311-manylinux_2_17_x86_64.manylinux2014_x86_64").unwrap();
        assert_eq!(tags.len(), 2);
        assert!(tags.contains(&tag("cp311-cp311-manylinux2014_x86_64")));
    }

    #[test]
    fn parse_tag_roundtrips_single_tags() {
        for text in ["py3-none-any", "cp312-cp312-musllinux_1_2_x86_64"] {
            let single = tag(text);
            assert_eq!(
                parse_tag(&single.to_string()).unwrap(),
                BTreeSet::from([single])
            );
        }
    }

    #[test]
    fn parse_tag_rejects_malformed_input() {
        for invalid in ["py3-none", "py3-none-any-extra", "", "py3--any", "-none-any"] {
            assert!(parse_tag(invalid).is_err(), "{invalid}");
        }
        assert!(Tag::from_str("py3-none").is_err());
    }

    #[test]
    fn cpython_tag_order() {
        let tags = cpython_tags((3, 8), ["cp38d", "cp38"], ["plat1", "plat2"]);
        let expected_head = [
            "cp38-cp38d-plat1",
            "cp38-cp38d-plat2",
            "cp38-cp38-plat1",
            "cp38-cp38-plat2",
            "cp38-abi3-plat1",
            "cp38-abi3-plat2",
            "cp38-none-plat1",
            "cp38-none-plat2",
            "cp37-abi3-plat1",
            "cp37-abi3-plat2",
        ];
        for (position, expected) in expected_head.iter().enumerate() {
            assert_eq!(tags[position], tag(expected));
        }
        assert_eq!(*tags.last().unwrap(), tag("cp32-abi3-plat2"));
        // `abi3` and `none` in the provided ABIs keep their fixed positions.
        let tags = cpython_tags((3, 8), ["cp38", "abi3", "none"], ["plat"]);
        assert_eq!(tags[0], tag("cp38-cp38-plat"));
        assert_eq!(tags[1], tag("cp38-abi3-plat"));
        assert_eq!(tags[2], tag("cp38-none-plat"));
    }

    #[test]
    fn generic_tags_append_none() {
        assert_eq!(
            generic_tags("sometag", ["abi1"], ["plat"]),
            vec![tag("sometag-abi1-plat"), tag("sometag-none-plat")]
        );
        // An explicit `none` is not duplicated.
        assert_eq!(
            generic_tags("sometag", ["none"], ["plat"]),
            vec![tag("sometag-none-plat")]
        );
    }

    #[test]
    fn compatible_tag_order() {
        let tags = compatible_tags((3, 3), Some("cp33"), ["plat1", "plat2"]);
        let expected = [
            "py33-none-plat1",
            "py33-none-plat2",
            "py3-none-plat1",
            "py3-none-plat2",
            "py32-none-plat1",
            "py32-none-plat2",
            "py31-none-plat1",
            "py31-none-plat2",
            "py30-none-plat1",
            "py30-none-plat2",
            "cp33-none-any",
            "py33-none-any",
            "py3-none-any",
            "py32-none-any",
            "py31-none-any",
            "py30-none-any",
        ];
        assert_eq!(tags, expected.map(tag).to_vec());
    }

    #[test]
    fn interpreter_tag_sequence() {
        let interpreter = Interpreter {
            name: "cp".to_string(),
            python_version: (3, 12),
            abis: vec!["cp312".to_string()],
        };
        let tags = Tags::from_interpreter(&interpreter, ["plat"]);
        assert_eq!(*tags.iter().next().unwrap(), tag("cp312-cp312-plat"));
        // The stable-ABI countdown is present.
        assert!(tags.precedence(&tag("cp32-abi3-plat")).is_some());
        // The least-specific tail.
        assert_eq!(
            tags.precedence(&tag("py30-none-any")).unwrap(),
            tags.len() - 1
        );
        // Rank ordering: a specific binary tag beats a pure-Python one.
        assert!(
            tags.precedence(&tag("cp312-cp312-plat")).unwrap()
                < tags.precedence(&tag("py3-none-any")).unwrap()
        );
        // Wheel-level compatibility picks the best rank.
        let wheel_tags = [tag("py3-none-any"), tag("cp312-cp312-plat")];
        assert_eq!(
            tags.compatibility(wheel_tags.iter()),
            tags.precedence(&tag("cp312-cp312-plat"))
        );
        assert_eq!(tags.compatibility([tag("cp39-cp39-other")].iter()), None);
    }

    #[test]
    fn pypy_uses_generic_tags() {
        let interpreter = Interpreter {
            name: "pp".to_string(),
            python_version: (3, 10),
            abis: vec!["pypy310_pp73".to_string()],
        };
        let tags = Tags::from_interpreter(&interpreter, ["plat"]);
        assert_eq!(*tags.iter().next().unwrap(), tag("pp310-pypy310_pp73-plat"));
        assert!(tags.precedence(&tag("pp3-none-any")).is_some());
    }

    #[test]
    fn serde_roundtrip() {
        let parsed: Tag = serde_json::from_str(r#""cp312-cp312-linux_x86_64""#).unwrap();
        assert_eq!(
            serde_json::to_string(&parsed).unwrap(),
            r#""cp312-cp312-linux_x86_64""#
        );
    }
}
