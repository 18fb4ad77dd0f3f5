use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use wheelhouse_normalize::{InvalidNameError, PackageName};
use wheelhouse_pep440::{Version, VersionParseError};
use wheelhouse_platform_tags::{parse_tag, ParseTagError, Tag, Tags};

use crate::{BuildTag, BuildTagError};

/// A parsed wheel filename:
/// `<name>-<version>[-<build>]-<interp>-<abi>-<plat>.whl`.
///
/// The name is stored canonicalized and the tag set expanded, so the
/// `Display` form is the canonical spelling rather than a byte-for-byte
/// copy of the input.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WheelFilename {
    /// The canonicalized project name.
    pub name: PackageName,
    /// The wheel's version.
    pub version: Version,
    /// The optional build tag.
    pub build: Option<BuildTag>,
    /// The expanded compatibility tag set.
    pub tags: BTreeSet<Tag>,
}

impl WheelFilename {
    /// Create a wheel filename from its components.
    pub fn new(
        name: PackageName,
        version: Version,
        build: Option<BuildTag>,
        tags: BTreeSet<Tag>,
    ) -> Self {
        Self {
            name,
            version,
            build,
            tags,
        }
    }

    /// The best rank of this wheel's tags in the given tag sequence, or
    /// `None` if the wheel is not installable there.
    pub fn compatibility(&self, tags: &Tags) -> Option<usize> {
        tags.compatibility(self.tags.iter())
    }

    /// Whether any of this wheel's tags is accepted by the given sequence.
    pub fn is_compatible(&self, tags: &Tags) -> bool {
        self.compatibility(tags).is_some()
    }

    /// The filename without its `.whl` extension.
    pub fn stem(&self) -> String {
        let mut stem = format!("{}-{}", self.name.as_dist_info_name(), self.version);
        if let Some(build) = &self.build {
            stem.push('-');
            stem.push_str(&build.to_string());
        }
        stem.push('-');
        stem.push_str(&self.compressed_tags());
        stem
    }

    /// The compressed tag-set spelling: per-field sorted, deduplicated,
    /// `.`-joined values, the fields joined with `-`.
    fn compressed_tags(&self) -> String {
        let interpreters: BTreeSet<&str> =
            self.tags.iter().map(Tag::interpreter).collect();
        let abis: BTreeSet<&str> = self.tags.iter().map(Tag::abi).collect();
        let platforms: BTreeSet<&str> = self.tags.iter().map(Tag::platform).collect();
        let join = |set: BTreeSet<&str>| set.into_iter().collect::<Vec<_>>().join(".");
        format!("{}-{}-{}", join(interpreters), join(abis), join(platforms))
    }
}

impl FromStr for WheelFilename {
    type Err = WheelFilenameError;

    fn from_str(filename: &str) -> Result<Self, Self::Err> {
        let stem = filename.strip_suffix(".whl").ok_or_else(|| {
            WheelFilenameError::InvalidWheelFilename(
                filename.to_string(),
                "extension must be `.whl`".to_string(),
            )
        })?;

        // Four dashes without a build tag, five with one. The name part
        // must not contain a dash at all (it is underscore-escaped), so a
        // left split is unambiguous.
        let dashes = stem.matches('-').count();
        let (name, version, build, compressed) = match dashes {
            4 => {
                let mut parts = stem.splitn(3, '-');
                (
                    parts.next().expect("split yields at least one part"),
                    parts.next().expect("four dashes imply three parts"),
                    None,
                    parts.next().expect("four dashes imply three parts"),
                )
            }
            5 => {
                let mut parts = stem.splitn(4, '-');
                (
                    parts.next().expect("split yields at least one part"),
                    parts.next().expect("five dashes imply four parts"),
                    parts.next(),
                    parts.next().expect("five dashes imply four parts"),
                )
            }
            _ => {
                return Err(WheelFilenameError::InvalidWheelFilename(
                    filename.to_string(),
                    "wrong number of parts".to_string(),
                ))
            }
        };

        // PEP 427 escaping: the name part may only contain word characters
        // and dots, and never a double underscore.
        if name.contains("__")
            || !name
                .bytes()
                .all(|byte| byte.is_ascii_alphanumeric() || byte == b'.' || byte == b'_')
        {
            return Err(WheelFilenameError::InvalidWheelFilename(
                filename.to_string(),
                format!("invalid project name `{name}`"),
            ));
        }
        let name = PackageName::from_str(name)
            .map_err(|err| WheelFilenameError::InvalidPackageName(filename.to_string(), err))?;
        let version = Version::from_str(version)
            .map_err(|err| WheelFilenameError::InvalidVersion(filename.to_string(), err))?;
        let build = build
            .map(|build| {
                BuildTag::from_str(build)
                    .map_err(|err| WheelFilenameError::InvalidBuildTag(filename.to_string(), err))
            })
            .transpose()?;
        let tags = parse_tag(compressed)
            .map_err(|err| WheelFilenameError::InvalidTag(filename.to_string(), err))?;

        Ok(Self {
            name,
            version,
            build,
            tags,
        })
    }
}

impl std::fmt::Display for WheelFilename {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.whl", self.stem())
    }
}

impl<'de> Deserialize<'de> for WheelFilename {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let filename = String::deserialize(deserializer)?;
        Self::from_str(&filename).map_err(de::Error::custom)
    }
}

impl Serialize for WheelFilename {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// An error when parsing a [`WheelFilename`].
#[derive(Debug, Error)]
pub enum WheelFilenameError {
    /// The filename shape is wrong: extension, part count, or name charset.
    #[error("The wheel filename \"{0}\" is invalid: {1}")]
    InvalidWheelFilename(String, String),
    /// The version part failed to parse.
    #[error("The wheel filename \"{0}\" has an invalid version: {1}")]
    InvalidVersion(String, #[source] VersionParseError),
    /// The name part failed validation.
    #[error("The wheel filename \"{0}\" has an invalid package name: {1}")]
    InvalidPackageName(String, #[source] InvalidNameError),
    /// The build part failed to parse.
    #[error("The wheel filename \"{0}\" has an invalid build tag: {1}")]
    InvalidBuildTag(String, #[source] BuildTagError),
    /// The compressed tag set failed to parse.
    #[error("The wheel filename \"{0}\" has an invalid tag set: {1}")]
    InvalidTag(String, #[source] ParseTagError),
}
