//! Core metadata primitives of the Python package ecosystem.
//!
//! This crate re-exports the whole workspace and offers free-function entry
//! points for each parser:
//!
//! ```
//! let version = wheelhouse::parse_version("1.0a5").unwrap();
//! let stable = wheelhouse::parse_version("1.0").unwrap();
//! assert!(version < stable);
//! assert!(version.is_prerelease());
//! ```
//!
//! The library operates on strings and byte buffers only: it does not
//! install, download, resolve, or execute anything, and never touches the
//! network or filesystem.

#![warn(missing_docs)]

use std::collections::BTreeSet;
use std::str::FromStr;

pub use wheelhouse_distribution_filename::{
    BuildTag, BuildTagError, DistFilename, DistFilenameError, SourceDistExtension,
    SourceDistFilename, SourceDistFilenameError, WheelFilename, WheelFilenameError,
};
pub use wheelhouse_normalize::{
    canonicalize_name, is_normalized, ExtraName, GroupName, InvalidNameError, PackageName,
};
pub use wheelhouse_pep440::{
    canonicalize_version, LocalSegment, Operator, OperatorParseError, Prerelease, PrereleaseKind,
    PrereleasePolicy, Version, VersionCandidate, VersionParseError, VersionPattern,
    VersionPatternParseError, VersionSpecifier, VersionSpecifierBuildError,
    VersionSpecifierParseError, VersionSpecifiers, VersionSpecifiersCombineError,
    VersionSpecifiersParseError, VERSION_PATTERN,
};
pub use wheelhouse_pep508::{
    MarkerContext, MarkerEnvironment, MarkerEnvironmentBuilder, MarkerEvaluationError,
    MarkerExpression, MarkerOperator, MarkerTree, MarkerValue, MarkerVariable, Pep508Error,
    Requirement, VersionOrUrl,
};
pub use wheelhouse_platform_tags::{
    android_platforms, compatible_tags, cpython_tags, generic_tags, ios_platforms, mac_platforms,
    manylinux_platforms, musllinux_platforms, parse_tag, windows_platforms, AlwaysCompatible,
    Arch, Interpreter, ManylinuxPolicy, Os, ParseTagError, Platform, PythonVersion, Tag, Tags,
};

/// Parse a PEP 440 version, e.g. `1.0a5`.
pub fn parse_version(version: &str) -> Result<Version, VersionParseError> {
    Version::from_str(version)
}

/// Parse a single PEP 440 version specifier, e.g. `>= 1.19`.
pub fn parse_specifier(specifier: &str) -> Result<VersionSpecifier, VersionSpecifierParseError> {
    VersionSpecifier::from_str(specifier)
}

/// Parse a comma-separated PEP 440 specifier set, e.g. `>=1.16, <2.0`.
pub fn parse_specifier_set(
    specifiers: &str,
) -> Result<VersionSpecifiers, VersionSpecifiersParseError> {
    VersionSpecifiers::from_str(specifiers)
}

/// Parse a PEP 508 environment marker, e.g. `python_version > "3.8"`.
pub fn parse_marker(marker: &str) -> Result<MarkerTree, Pep508Error> {
    MarkerTree::from_str(marker)
}

/// Parse a PEP 508 dependency specifier, e.g.
/// `requests[security] >= 2.8.1 ; python_version > "3.8"`.
pub fn parse_requirement(requirement: &str) -> Result<Requirement, Pep508Error> {
    Requirement::from_str(requirement)
}

/// Parse a wheel filename into its name, version, build tag, and tag set.
pub fn parse_wheel_filename(filename: &str) -> Result<WheelFilename, WheelFilenameError> {
    WheelFilename::from_str(filename)
}

/// Parse a source distribution filename into its name and version.
pub fn parse_sdist_filename(filename: &str) -> Result<SourceDistFilename, SourceDistFilenameError> {
    SourceDistFilename::from_str(filename)
}

/// Construct the canonical wheel filename for the given components.
pub fn create_wheel_filename(
    name: &PackageName,
    version: &Version,
    build: Option<BuildTag>,
    tags: &BTreeSet<Tag>,
) -> String {
    WheelFilename::new(name.clone(), version.clone(), build, tags.clone()).to_string()
}

/// Construct the canonical source distribution filename for the given
/// components.
pub fn create_sdist_filename(name: &PackageName, version: &Version) -> String {
    SourceDistFilename::new(name.clone(), version.clone(), SourceDistExtension::TarGz).to_string()
}
