//! Parse and construct the filenames of built and source distributions:
//! `<name>-<version>[-<build>]-<interp>-<abi>-<plat>.whl` and
//! `<name>-<version>.{tar.gz,zip}`.

pub use build_tag::{BuildTag, BuildTagError};
pub use source_dist::{SourceDistExtension, SourceDistFilename, SourceDistFilenameError};
pub use wheel::{WheelFilename, WheelFilenameError};

mod build_tag;
mod source_dist;
mod wheel;

use std::str::FromStr;

/// Either kind of distribution filename, dispatched on the extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DistFilename {
    /// A `.whl` filename.
    Wheel(WheelFilename),
    /// A `.tar.gz` or `.zip` filename.
    SourceDist(SourceDistFilename),
}

impl DistFilename {
    /// Parse a distribution filename of either kind.
    pub fn from_filename(filename: &str) -> Result<Self, DistFilenameError> {
        if filename.ends_with(".whl") {
            Ok(Self::Wheel(WheelFilename::from_str(filename)?))
        } else if filename.ends_with(".tar.gz") || filename.ends_with(".zip") {
            Ok(Self::SourceDist(SourceDistFilename::from_str(filename)?))
        } else {
            Err(DistFilenameError::UnknownExtension(filename.to_string()))
        }
    }
}

impl std::fmt::Display for DistFilename {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Wheel(wheel) => wheel.fmt(f),
            Self::SourceDist(source_dist) => source_dist.fmt(f),
        }
    }
}

/// An error from [`DistFilename::from_filename`].
#[derive(Debug, thiserror::Error)]
pub enum DistFilenameError {
    /// Not a wheel or sdist extension.
    #[error("The filename \"{0}\" is neither a wheel nor a source distribution")]
    UnknownExtension(String),
    /// The wheel filename failed to parse.
    #[error(transparent)]
    Wheel(#[from] WheelFilenameError),
    /// The sdist filename failed to parse.
    #[error(transparent)]
    SourceDist(#[from] SourceDistFilenameError),
}
