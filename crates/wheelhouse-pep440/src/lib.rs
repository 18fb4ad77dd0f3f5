//! A library for [version identifiers](https://packaging.python.org/en/latest/specifications/version-specifiers/)
//! previously known as [PEP 440](https://peps.python.org/pep-0440/).
//!
//! ## Usage
//!
//! ```
//! use std::str::FromStr;
//! use wheelhouse_pep440::{Version, VersionSpecifiers};
//!
//! let version = Version::from_str("1.19").unwrap();
//! let specifiers = VersionSpecifiers::from_str(">=1.16, <2.0").unwrap();
//! assert!(specifiers.contains(&version));
//! ```
//!
//! Versions are totally ordered per PEP 440:
//!
//! ```
//! # use std::str::FromStr;
//! # use wheelhouse_pep440::Version;
//! assert!(Version::from_str("1.0.dev1").unwrap() < Version::from_str("1.0a1").unwrap());
//! assert!(Version::from_str("1.0a1").unwrap() < Version::from_str("1.0").unwrap());
//! assert!(Version::from_str("1.0").unwrap() < Version::from_str("1.0+local").unwrap());
//! assert!(Version::from_str("1.0+local").unwrap() < Version::from_str("1.0.post1").unwrap());
//! ```

pub use version::{
    canonicalize_version, LocalSegment, Prerelease, PrereleaseKind, Version, VersionParseError,
    VersionPattern, VersionPatternParseError, VERSION_PATTERN,
};
pub use version_specifier::{
    Operator, OperatorParseError, PrereleasePolicy, VersionCandidate, VersionSpecifier,
    VersionSpecifierBuildError, VersionSpecifierParseError, VersionSpecifiers,
    VersionSpecifiersCombineError, VersionSpecifiersParseError,
};

mod version;
mod version_specifier;
