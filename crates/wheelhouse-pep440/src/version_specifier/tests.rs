use indoc::indoc;

use super::*;

fn version(string: &str) -> Version {
    Version::from_str(string).unwrap()
}

fn specifier(string: &str) -> VersionSpecifier {
    VersionSpecifier::from_str(string).unwrap()
}

/// Operator semantics with pre-releases admitted, so the admission policy
/// does not get in the way.
#[test]
fn operator_semantics() {
    let matching = [
        ("2.0", "==2"),
        ("2.0", "==2.0"),
        ("2.0", "==2.0.0"),
        ("2.0+deadbeef", "==2"),
        ("2.0+deadbeef", "==2.0+deadbeef"),
        ("2.0", "==2.*"),
        ("2.1", "==2.1.*"),
        ("2.1.3", "==2.1.*"),
        ("2.0a1", "==2.*"),
        ("1!2.0", "==1!2.*"),
        ("2.0a1", "==2.0a1"),
        ("2.0", "!=3"),
        ("2.1", "!=2.0"),
        ("2.0.post1", "!=2.0"),
        ("2.1", "!=2.0.*"),
        ("2.0", ">=2"),
        ("3.0", ">=2"),
        ("2.0.post1", ">=2"),
        ("2.0", "<=2"),
        ("2.0", "<=3"),
        ("3.0", ">2"),
        ("2.1", ">2.0"),
        ("2.1.post1", ">2"),
        ("2.0.post2", ">2.0.post1"),
        ("1.0.dev2", ">1.0.dev1"),
        ("2.0", "<3"),
        ("2.0", "<2.0.post1"),
        ("3.0.dev0", "<3.1"),
        ("2.2", "~=2.2"),
        ("2.7", "~=2.2"),
        ("2.2.3", "~=2.2.1"),
        ("2.0.1", "~=2.0.0"),
        ("2.0", "===2.0"),
        ("2.0", "===2.0"),
    ];
    for (version_str, specifier_str) in matching {
        assert!(
            specifier(specifier_str).contains_with(&version(version_str), Some(true)),
            "{version_str} should match {specifier_str}"
        );
    }

    let failing = [
        ("2.1", "==2"),
        ("2.1", "==2.0"),
        ("2.1", "==2.0.0"),
        ("2.0", "==2.0+deadbeef"),
        ("2.7", "==2.8.*"),
        ("2.1.1", "==2.1.0.*"),
        ("2.0", "==1!2.0"),
        ("2.0", "!=2"),
        ("2.0", "!=2.*"),
        ("2.0.post1", "!=2.*"),
        ("1.0", ">=2"),
        ("2.1", "<=2"),
        ("2.0", ">2"),
        ("2.0.post1", ">2"),
        ("2.0+deadbeef", ">2"),
        ("2.0", "<2"),
        ("3.1.dev0", "<3.1"),
        ("2.1", "~=2.2"),
        ("3.0", "~=2.2"),
        ("1.4.5a5", "~=1.4.5"),
        ("2.0.0", "===2.0"),
        ("2.0+local", "===2.0"),
    ];
    for (version_str, specifier_str) in failing {
        assert!(
            !specifier(specifier_str).contains_with(&version(version_str), Some(true)),
            "{version_str} should not match {specifier_str}"
        );
    }
}

#[test]
fn prefix_match_pads_with_zeros() {
    // `1.2` is not in `== 1.2.3.*`: the candidate is zero-padded before the
    // prefix comparison.
    assert!(!specifier("==1.2.3.*").contains(&version("1.2")));
    assert!(specifier("==1.2.0.*").contains(&version("1.2")));
}

#[test]
fn prerelease_admission() {
    // A stable operand rejects pre-release candidates by default.
    assert!(!specifier(">=2.0").contains(&version("2.1a1")));
    // An explicit override admits them.
    assert!(specifier(">=2.0")
        .with_prereleases(PrereleasePolicy::Allow)
        .contains(&version("2.1a1")));
    // A pre-release operand admits them automatically.
    assert!(specifier(">=2.0a1").contains(&version("2.1a1")));
    assert!(specifier("==2.0a1").contains(&version("2.0a1")));
    // Exclusion clauses never opt in.
    assert!(!specifier("!=2.0a1").prereleases_allowed());
    assert!(!specifier("!=2.0a1").contains(&version("2.1a1")));
    // `Forbid` beats a pre-release operand.
    assert!(!specifier(">=2.0a1")
        .with_prereleases(PrereleasePolicy::Forbid)
        .contains(&version("2.1a1")));
}

#[test]
fn contains_str_recovers() {
    assert!(specifier(">=1.0").contains_str("1.2"));
    assert!(!specifier(">=1.0").contains_str("french toast"));
    assert!(specifier("===foobar").contains_str("foobar"));
    assert!(specifier("===foobar").contains_str("FooBar"));
    assert!(!specifier("===foobar").contains_str("foobaz"));
}

#[test]
fn operand_shape_validation() {
    // Local segments are only allowed behind `==`, `!=`, `<=`, and `>=`.
    assert!(VersionSpecifier::from_str("==1.0+abc").is_ok());
    assert!(VersionSpecifier::from_str("!=1.0+abc").is_ok());
    assert!(VersionSpecifier::from_str(">=1.0+abc").is_ok());
    assert!(VersionSpecifier::from_str("<=1.0+abc").is_ok());
    assert!(VersionSpecifier::from_str(">1.0+abc").is_err());
    assert!(VersionSpecifier::from_str("<1.0+abc").is_err());
    assert!(VersionSpecifier::from_str("~=1.0+abc").is_err());
    // Wildcards only exist for `==` and `!=`.
    assert!(VersionSpecifier::from_str("==1.0.*").is_ok());
    assert!(VersionSpecifier::from_str("!=1.0.*").is_ok());
    assert!(VersionSpecifier::from_str(">=1.0.*").is_err());
    assert!(VersionSpecifier::from_str("~=1.0.*").is_err());
    // `~=` needs at least two release segments.
    assert!(VersionSpecifier::from_str("~=1").is_err());
    assert!(VersionSpecifier::from_str("~=1.0").is_ok());
}

#[test]
fn parse_tolerates_whitespace() {
    assert_eq!(specifier("  >= 1.19  "), specifier(">=1.19"));
    assert_eq!(specifier("== 1.1.*").to_string(), "==1.1.*");
}

#[test]
fn parse_errors() {
    insta::assert_snapshot!(
        VersionSpecifier::from_str("1.0").unwrap_err(),
        @"Unexpected end of version specifier, expected operator"
    );
    insta::assert_snapshot!(
        VersionSpecifier::from_str(">=").unwrap_err(),
        @"Unexpected end of version specifier, expected version"
    );
    insta::assert_snapshot!(
        VersionSpecifier::from_str("=>3.0").unwrap_err(),
        @r###"no such comparison operator "=>", must be one of ~= == != <= >= < > ==="###
    );
    insta::assert_snapshot!(
        VersionSpecifier::from_str(">=1.0 trailing").unwrap_err(),
        @"Trailing `trailing` is not allowed"
    );
}

#[test]
fn display_roundtrip() {
    for canonical in ["==1.2.3", "==1.2.*", "!=1.2.*", "~=1.4.5", ">=2", "<1!3.0", "===foobar"] {
        assert_eq!(specifier(canonical).to_string(), canonical);
    }
}

#[test]
fn set_parse_and_display() {
    let specifiers = VersionSpecifiers::from_str(">=1.16, <2.0").unwrap();
    assert_eq!(specifiers.len(), 2);
    // Canonical form: sorted by text, comma-joined.
    assert_eq!(specifiers.to_string(), "<2.0,>=1.16");

    assert!(VersionSpecifiers::from_str("").unwrap().is_empty());
    assert!(VersionSpecifiers::from_str("   ").unwrap().is_empty());
}

#[test]
fn set_deduplicates_textually() {
    let specifiers = VersionSpecifiers::from_str("==1.0, ==1.0").unwrap();
    assert_eq!(specifiers.len(), 1);
    // `1.0` and `1.0.0` are the same version but different clause texts;
    // both survive.
    let specifiers = VersionSpecifiers::from_str("==1.0, ==1.0.0").unwrap();
    assert_eq!(specifiers.len(), 2);
}

#[test]
fn set_contains() {
    let specifiers = VersionSpecifiers::from_str(">=1.16, <2.0").unwrap();
    assert!(specifiers.contains(&version("1.19")));
    assert!(!specifiers.contains(&version("2.0")));
    assert!(!specifiers.contains(&version("1.15")));
    // The empty set matches any stable version but no pre-release.
    let empty = VersionSpecifiers::empty();
    assert!(empty.contains(&version("1.0")));
    assert!(!empty.contains(&version("1.0a1")));
}

#[test]
fn set_contains_str() {
    let specifiers = VersionSpecifiers::from_str(">=1.16").unwrap();
    assert!(specifiers.contains_str("1.19"));
    assert!(!specifiers.contains_str("not a version"));
    // Unparseable input can only satisfy an all-arbitrary set.
    let arbitrary = VersionSpecifiers::from_str("===french-toast").unwrap();
    assert!(arbitrary.contains_str("french-toast"));
    assert!(!VersionSpecifiers::empty().contains_str("french-toast"));
}

#[test]
fn set_combine() {
    let combined = VersionSpecifiers::from_str("~=1.0")
        .unwrap()
        .combine(&VersionSpecifiers::from_str(">=1.0").unwrap())
        .unwrap()
        .combine(&VersionSpecifiers::from_str("!=1.1").unwrap())
        .unwrap();
    assert_eq!(combined.len(), 3);
    assert!(combined.contains(&version("1.2")));
    assert!(!combined.contains(&version("1.1")));
    assert!(!combined.contains(&version("2.0")));
    assert!(!combined.contains(&version("1.0a5")));

    let filtered = combined.filter(vec!["1.0a5", "1.0", "1.4"]);
    assert_eq!(filtered, vec!["1.0", "1.4"]);
}

#[test]
fn set_combine_conflicting_policies() {
    let allow = VersionSpecifiers::from_str(">=1.0")
        .unwrap()
        .with_prereleases(PrereleasePolicy::Allow);
    let forbid = VersionSpecifiers::from_str("<2.0")
        .unwrap()
        .with_prereleases(PrereleasePolicy::Forbid);
    assert!(allow.combine(&forbid).is_err());
    // An explicit policy combines fine with a derived one.
    let auto = VersionSpecifiers::from_str("!=1.5").unwrap();
    let combined = allow.combine(&auto).unwrap();
    assert_eq!(combined.prereleases(), PrereleasePolicy::Allow);
}

#[test]
fn filter_prerelease_fallback() {
    let specifiers = VersionSpecifiers::from_str(">=1.0").unwrap();
    // Nothing stable matches, so the matching pre-release passes through.
    assert_eq!(specifiers.filter(vec!["1.1a1"]), vec!["1.1a1"]);
    // A stable match suppresses the fallback.
    assert_eq!(specifiers.filter(vec!["1.1a1", "1.2"]), vec!["1.2"]);
    // An explicit `Forbid` disables the fallback.
    let forbidding = specifiers.clone().with_prereleases(PrereleasePolicy::Forbid);
    assert!(forbidding.filter(vec!["1.1a1"]).is_empty());
    // A non-matching pre-release is not let through either.
    assert!(specifiers.filter(vec!["0.9a1"]).is_empty());
}

#[test]
fn filter_empty_set() {
    let empty = VersionSpecifiers::empty();
    assert_eq!(empty.filter(vec!["1.3", "1.5a1"]), vec!["1.3"]);
    assert_eq!(empty.filter(vec!["1.5a1"]), vec!["1.5a1"]);
}

#[test]
fn filter_drops_unparseable_strings() {
    let specifiers = VersionSpecifiers::from_str(">=1.0").unwrap();
    assert_eq!(
        specifiers.filter(vec!["french toast", "1.2"]),
        vec!["1.2"]
    );
}

#[test]
fn filter_accepts_versions() {
    let specifiers = VersionSpecifiers::from_str(">=1.0").unwrap();
    assert_eq!(
        specifiers.filter(vec![version("0.9"), version("1.2")]),
        vec![version("1.2")]
    );
}

#[test]
fn set_error_underlines_offending_clause() {
    let err = VersionSpecifiers::from_str(">=1.0,~=2").unwrap_err();
    assert_eq!(
        err.to_string(),
        indoc! {"
            Failed to parse version specifiers: The ~= operator requires at least two segments in the release version:
            >=1.0,~=2
                  ^^^"
        }
    );
    assert_eq!(err.line(), ">=1.0,~=2");
}

#[test]
fn serde_roundtrip() {
    let specifiers: VersionSpecifiers = serde_json::from_str(r#"">=1.16, <2.0""#).unwrap();
    assert_eq!(serde_json::to_string(&specifiers).unwrap(), r#""<2.0,>=1.16""#);
    let single: VersionSpecifier = serde_json::from_str(r#""== 1.1.*""#).unwrap();
    assert_eq!(serde_json::to_string(&single).unwrap(), r#""==1.1.*""#);
}
