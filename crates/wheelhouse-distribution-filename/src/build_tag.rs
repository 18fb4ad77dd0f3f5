use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// An error when parsing a [`BuildTag`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildTagError {
    /// The build tag was empty.
    #[error("must not be empty")]
    Empty,
    /// The build tag did not start with a digit.
    #[error("must start with a digit")]
    NoLeadingDigit,
    /// The leading digits overflow a 64-bit integer.
    #[error("leading digits are too large")]
    NumberTooLarge,
}

/// The optional build tag of a wheel.
///
/// > Must start with a digit. Acts as a tie-breaker if two wheel file names
/// > are the same in all other respects. Sort as an empty tuple if
/// > unspecified, else sort as a two-item tuple with the first item being
/// > the initial digits as an int, and the second item being the remainder
/// > of the tag as a str.
///
/// See: <https://packaging.python.org/en/latest/specifications/binary-distribution-format/#file-name-convention>
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BuildTag(u64, Option<String>);

impl BuildTag {
    /// Create a build tag from its parts.
    pub fn new(number: u64, suffix: Option<String>) -> Self {
        Self(number, suffix)
    }

    /// The leading digits.
    pub fn number(&self) -> u64 {
        self.0
    }

    /// The remainder after the leading digits, if any.
    pub fn suffix(&self) -> Option<&str> {
        self.1.as_deref()
    }
}

impl FromStr for BuildTag {
    type Err = BuildTagError;

    fn from_str(build_tag: &str) -> Result<Self, Self::Err> {
        if build_tag.is_empty() {
            return Err(BuildTagError::Empty);
        }
        let (number, suffix) = match build_tag.find(|c: char| !c.is_ascii_digit()) {
            Some(0) => return Err(BuildTagError::NoLeadingDigit),
            Some(split) => {
                let (number, suffix) = build_tag.split_at(split);
                (number, Some(suffix.to_string()))
            }
            None => (build_tag, None),
        };
        let number = number.parse::<u64>().map_err(|_| BuildTagError::NumberTooLarge)?;
        Ok(BuildTag(number, suffix))
    }
}

impl std::fmt::Display for BuildTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)?;
        if let Some(suffix) = &self.1 {
            write!(f, "{suffix}")?;
        }
        Ok(())
    }
}

impl<'de> Deserialize<'de> for BuildTag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let build_tag = String::deserialize(deserializer)?;
        Self::from_str(&build_tag).map_err(de::Error::custom)
    }
}

impl Serialize for BuildTag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let plain = BuildTag::from_str("123").unwrap();
        assert_eq!((plain.number(), plain.suffix()), (123, None));
        let suffixed = BuildTag::from_str("202206090410b2").unwrap();
        assert_eq!(suffixed.number(), 202206090410);
        assert_eq!(suffixed.suffix(), Some("b2"));
        assert_eq!(suffixed.to_string(), "202206090410b2");
    }

    #[test]
    fn sort_order() {
        assert!(BuildTag::from_str("2").unwrap() > BuildTag::from_str("1z").unwrap());
        assert!(BuildTag::from_str("1b").unwrap() > BuildTag::from_str("1a").unwrap());
    }

    #[test]
    fn rejects_malformed() {
        assert_eq!(BuildTag::from_str(""), Err(BuildTagError::Empty));
        assert_eq!(BuildTag::from_str("abc"), Err(BuildTagError::NoLeadingDigit));
    }
}
