//! Normalized identifiers for the Python package ecosystem: package names,
//! extra names, and dependency-group names.
//!
//! See: <https://packaging.python.org/en/latest/specifications/name-normalization/>

pub use extra_name::ExtraName;
pub use group_name::GroupName;
pub use package_name::PackageName;

mod extra_name;
mod group_name;
mod package_name;

/// Normalize a name per PEP 503 without validating it.
///
/// Lowercases the name and collapses every run of `-`, `_`, and `.` down to
/// a single `-`, so `Friendly-Bard`, `friendly.bard`, and `FRIENDLY__BARD`
/// all normalize to `friendly-bard`. The transformation is idempotent.
pub fn canonicalize_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut in_run = false;
    for char in name.chars() {
        if matches!(char, '-' | '_' | '.') {
            in_run = true;
        } else {
            if in_run {
                normalized.push('-');
                in_run = false;
            }
            normalized.extend(char.to_lowercase());
        }
    }
    if in_run {
        normalized.push('-');
    }
    normalized
}

/// Whether the name is already in its normalized form, i.e., lowercase
/// alphanumeric characters joined by single dashes.
pub fn is_normalized(name: &str) -> bool {
    let mut last = None;
    for byte in name.bytes() {
        match byte {
            b'a'..=b'z' | b'0'..=b'9' => {}
            b'-' => {
                // A dash may neither lead, nor follow another dash.
                if !matches!(last, Some(b'a'..=b'z' | b'0'..=b'9')) {
                    return false;
                }
            }
            _ => return false,
        }
        last = Some(byte);
    }
    matches!(last, Some(b'a'..=b'z' | b'0'..=b'9'))
}

/// Validate a name against the PEP 508 identifier rule
/// (`^([A-Z0-9]|[A-Z0-9][A-Z0-9._-]*[A-Z0-9])$`, case-insensitive) and
/// return its PEP 503 normalized form.
pub(crate) fn validate_and_normalize(name: &str) -> Result<String, InvalidNameError> {
    let mut normalized = String::with_capacity(name.len());
    let mut last = None;
    for byte in name.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' => {
                normalized.push(byte.to_ascii_lowercase() as char);
            }
            b'-' | b'_' | b'.' => match last {
                // Names must start with a letter or digit.
                None => return Err(InvalidNameError::new(name)),
                // Collapse the run down to a single dash.
                Some(b'-' | b'_' | b'.') => {}
                Some(_) => normalized.push('-'),
            },
            _ => return Err(InvalidNameError::new(name)),
        }
        last = Some(byte);
    }
    // Names must end with a letter or digit.
    if !matches!(last, Some(b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9')) {
        return Err(InvalidNameError::new(name));
    }
    Ok(normalized)
}

/// A name failed the PEP 508 identifier rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "Not a valid name: `{name}`. Names must start and end with a letter or \
     digit and may only contain `-`, `_`, `.`, and alphanumeric characters"
)]
pub struct InvalidNameError {
    name: String,
}

impl InvalidNameError {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }

    /// The name that failed validation.
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize() {
        for raw in [
            "friendly-bard",
            "Friendly-Bard",
            "FRIENDLY-BARD",
            "friendly.bard",
            "friendly_bard",
            "friendly--bard",
            "FrIeNdLy-._.-bArD",
        ] {
            assert_eq!(canonicalize_name(raw), "friendly-bard", "{raw}");
        }
    }

    #[test]
    fn canonicalize_is_idempotent() {
        for raw in ["Friendly-Bard", "a._-_.b", "..leading", "trailing.."] {
            let once = canonicalize_name(raw);
            assert_eq!(canonicalize_name(&once), once, "{raw}");
        }
    }

    #[test]
    fn canonicalize_keeps_boundary_runs() {
        // The lenient form mirrors the PEP 503 regex substitution, which
        // also rewrites leading and trailing separator runs.
        assert_eq!(canonicalize_name("..foo__"), "-foo-");
    }

    #[test]
    fn normalized_check() {
        assert!(is_normalized("friendly-bard"));
        assert!(is_normalized("a"));
        assert!(!is_normalized("Friendly-Bard"));
        assert!(!is_normalized("friendly--bard"));
        assert!(!is_normalized("friendly-bard-"));
        assert!(!is_normalized("-friendly-bard"));
        assert!(!is_normalized("friendly_bard"));
        assert!(!is_normalized(""));
    }

    #[test]
    fn strict_validation() {
        assert_eq!(validate_and_normalize("Flask").unwrap(), "flask");
        assert_eq!(validate_and_normalize("zope.interface").unwrap(), "zope-interface");
        assert_eq!(validate_and_normalize("A__-.-__B").unwrap(), "a-b");
        for invalid in ["", "-flask", "flask-", ".flask", "fla sk", "fla$k", "flaß"] {
            assert!(validate_and_normalize(invalid).is_err(), "{invalid}");
        }
    }
}
