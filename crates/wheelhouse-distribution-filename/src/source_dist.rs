use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use wheelhouse_normalize::{InvalidNameError, PackageName};
use wheelhouse_pep440::{Version, VersionParseError};

/// The recognized source distribution extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceDistExtension {
    /// `.tar.gz`, the PEP 625 extension.
    TarGz,
    /// `.zip`, the legacy extension.
    Zip,
}

impl SourceDistExtension {
    /// Split a filename into its stem and extension, or `None` when it is
    /// not a source distribution.
    pub fn from_filename(filename: &str) -> Option<(&str, Self)> {
        if let Some(stem) = filename.strip_suffix(".tar.gz") {
            return Some((stem, Self::TarGz));
        }
        if let Some(stem) = filename.strip_suffix(".zip") {
            return Some((stem, Self::Zip));
        }
        None
    }
}

impl std::fmt::Display for SourceDistExtension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TarGz => f.write_str("tar.gz"),
            Self::Zip => f.write_str("zip"),
        }
    }
}

/// A parsed source distribution filename: `<name>-<version>.{tar.gz,zip}`.
///
/// The name part is split off at the last `-` before the extension, since
/// a PEP 440 version cannot contain a dash. The stored name is
/// canonicalized; the `Display` form escapes it with underscores per
/// PEP 625.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceDistFilename {
    /// The canonicalized project name.
    pub name: PackageName,
    /// The distribution's version.
    pub version: Version,
    /// The filename extension.
    pub extension: SourceDistExtension,
}

impl SourceDistFilename {
    /// Create a source distribution filename from its components.
    pub fn new(name: PackageName, version: Version, extension: SourceDistExtension) -> Self {
        Self {
            name,
            version,
            extension,
        }
    }
}

impl FromStr for SourceDistFilename {
    type Err = SourceDistFilenameError;

    fn from_str(filename: &str) -> Result<Self, Self::Err> {
        let Some((stem, extension)) = SourceDistExtension::from_filename(filename) else {
            return Err(SourceDistFilenameError::InvalidSourceDistFilename(
                filename.to_string(),
                "extension must be `.tar.gz` or `.zip`".to_string(),
            ));
        };

        let Some((name, version)) = stem.rsplit_once('-') else {
            return Err(SourceDistFilenameError::InvalidSourceDistFilename(
                filename.to_string(),
                "a hyphen must separate the name and version parts".to_string(),
            ));
        };

        let name = PackageName::from_str(name).map_err(|err| {
            SourceDistFilenameError::InvalidPackageName(filename.to_string(), err)
        })?;
        let version = Version::from_str(version)
            .map_err(|err| SourceDistFilenameError::InvalidVersion(filename.to_string(), err))?;

        Ok(Self {
            name,
            version,
            extension,
        })
    }
}

impl std::fmt::Display for SourceDistFilename {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}.{}",
            self.name.as_dist_info_name(),
            self.version,
            self.extension
        )
    }
}

impl<'de> Deserialize<'de> for SourceDistFilename {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let filename = String::deserialize(deserializer)?;
        Self::from_str(&filename).map_err(de::Error::custom)
    }
}

impl Serialize for SourceDistFilename {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// An error when parsing a [`SourceDistFilename`].
#[derive(Debug, Error)]
pub enum SourceDistFilenameError {
    /// The filename shape is wrong: extension or missing separator.
    #[error("The source distribution filename \"{0}\" is invalid: {1}")]
    InvalidSourceDistFilename(String, String),
    /// The name part failed validation.
    #[error("The source distribution filename \"{0}\" has an invalid package name: {1}")]
    InvalidPackageName(String, #[source] InvalidNameError),
    /// The version part failed to parse.
    #[error("The source distribution filename \"{0}\" has an invalid version: {1}")]
    InvalidVersion(String, #[source] VersionParseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse() {
        let parsed = SourceDistFilename::from_str("foo_lib-1.2.3a3.tar.gz").unwrap();
        assert_eq!(parsed.name.as_str(), "foo-lib");
        assert_eq!(parsed.version, Version::from_str("1.2.3a3").unwrap());
        assert_eq!(parsed.extension, SourceDistExtension::TarGz);
        assert_eq!(
            SourceDistFilename::from_str("foo-1.0.zip").unwrap().extension,
            SourceDistExtension::Zip
        );
    }

    #[test]
    fn splits_at_the_last_hyphen() {
        // Legacy sdists may carry unescaped dashes in the name part.
        let parsed = SourceDistFilename::from_str("foo-lib-1.2.3.tar.gz").unwrap();
        assert_eq!(parsed.name.as_str(), "foo-lib");
        assert_eq!(parsed.version, Version::from_str("1.2.3").unwrap());
    }

    #[test]
    fn roundtrip() {
        for filename in ["foo_lib-1.2.3.tar.gz", "foo_lib-1.2.3a3.zip"] {
            assert_eq!(
                SourceDistFilename::from_str(filename).unwrap().to_string(),
                filename,
                "{filename}"
            );
        }
    }

    #[test]
    fn errors() {
        insta::assert_snapshot!(
            SourceDistFilename::from_str("foo-1.2.3.tar.zstd").unwrap_err(),
            @r###"The source distribution filename "foo-1.2.3.tar.zstd" is invalid: extension must be `.tar.gz` or `.zip`"###
        );
        insta::assert_snapshot!(
            SourceDistFilename::from_str("foo.tar.gz").unwrap_err(),
            @r###"The source distribution filename "foo.tar.gz" is invalid: a hyphen must separate the name and version parts"###
        );
        assert!(SourceDistFilename::from_str("foo-1.2.3-gamma.3.zip").is_err());
        assert!(SourceDistFilename::from_str("-1.0.tar.gz").is_err());
    }
}
