use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use super::*;

fn version(string: &str) -> Version {
    Version::from_str(string).unwrap()
}

/// The ordering example from the version-specifiers spec, plus locals.
#[test]
fn ordering_chain() {
    let chain = [
        "1.0.dev456",
        "1.0a1",
        "1.0a2.dev456",
        "1.0a12.dev456",
        "1.0a12",
        "1.0b1.dev456",
        "1.0b2",
        "1.0b2.post345.dev456",
        "1.0b2.post345",
        "1.0b2-346",
        "1.0c1.dev456",
        "1.0c1",
        "1.0rc2",
        "1.0c3",
        "1.0",
        "1.0+abc.5",
        "1.0+abc.7",
        "1.0+5",
        "1.0.post456.dev34",
        "1.0.post456",
        "1.1.dev1",
        "1!1.0",
    ];
    for window in chain.windows(2) {
        let (smaller, larger) = (version(window[0]), version(window[1]));
        assert!(smaller < larger, "{} < {}", window[0], window[1]);
        assert!(larger > smaller, "{} > {}", window[1], window[0]);
    }
}

#[test]
fn ordering_is_total() {
    let versions: Vec<Version> = ["1.0.dev1", "1.0a1", "1.0a1.dev1", "1.0", "1.0.post1", "2.0"]
        .iter()
        .map(|string| version(string))
        .collect();
    for a in &versions {
        for b in &versions {
            let forwards = a.cmp(b);
            let backwards = b.cmp(a);
            assert_eq!(forwards, backwards.reverse());
            assert_eq!(forwards == Ordering::Equal, a == b);
        }
    }
}

#[test]
fn dev_sorts_below_pre_of_same_release() {
    assert!(version("1.0.dev1") < version("1.0a1"));
    assert!(version("1.0a1.dev1") < version("1.0a1"));
    assert!(version("1.0a1") < version("1.0"));
}

#[test]
fn trailing_zeros_are_insignificant() {
    assert_eq!(version("1"), version("1.0"));
    assert_eq!(version("1"), version("1.0.0"));
    assert_eq!(version("1.0"), version("1.0.0.0"));
    assert_ne!(version("1"), version("1.0.1"));
    // Equal versions must hash equally.
    let mut one = DefaultHasher::new();
    version("1").hash(&mut one);
    let mut one_zero = DefaultHasher::new();
    version("1.0.0").hash(&mut one_zero);
    assert_eq!(one.finish(), one_zero.finish());
}

#[test]
fn local_sorts_above_bare_version() {
    assert!(version("1.0+abc") > version("1.0"));
    assert!(version("1.0+abc") < version("1.0.post1"));
    // Numeric local segments sort above alphanumeric ones.
    assert!(version("1.0+5") > version("1.0+abc"));
    // Shorter locals sort before longer ones with the same prefix.
    assert!(version("1.0+abc") < version("1.0+abc.1"));
}

#[test]
fn parse_normalizes_spellings() {
    for (raw, canonical) in [
        ("1.0ALPHA1", "1.0a1"),
        ("1.0alpha", "1.0a0"),
        ("1.0-beta.2", "1.0b2"),
        ("1.0_preview1", "1.0rc1"),
        ("1.0pre1", "1.0rc1"),
        ("1.0c1", "1.0rc1"),
        ("1.0-rev2", "1.0.post2"),
        ("1.0.r2", "1.0.post2"),
        ("1.0post2", "1.0.post2"),
        ("1.0-3", "1.0.post3"),
        ("1.0post", "1.0.post0"),
        ("1.0-dev", "1.0.dev0"),
        ("1.0DEV5", "1.0.dev5"),
        ("v1.0", "1.0"),
        ("  1.0  ", "1.0"),
        ("1.0+Ubuntu-1", "1.0+ubuntu.1"),
        ("1.0+ubuntu_1", "1.0+ubuntu.1"),
        ("0!1.0", "1.0"),
        ("2!1.0", "2!1.0"),
        ("1.0.0", "1.0.0"),
    ] {
        assert_eq!(version(raw).to_string(), canonical, "{raw}");
    }
}

#[test]
fn parse_rejects_invalid() {
    for invalid in [
        "",
        "not a version",
        "1.",
        ".1",
        "1.0.",
        "1.0.x",
        "1.0a1.*",
        "1.0+",
        "1.0+abc!",
        "french toast",
        "1.0 2.0",
    ] {
        assert!(Version::from_str(invalid).is_err(), "{invalid}");
    }
}

#[test]
fn parse_error_message() {
    let err = Version::from_str("1.0.x").unwrap_err();
    insta::assert_snapshot!(
        err,
        @"Invalid version: `1.0.x` does not match the PEP 440 grammar"
    );
}

#[test]
fn roundtrip() {
    for string in [
        "1!2.3.4a5.post6.dev7+local.8",
        "1.0",
        "2012.4",
        "1.0rc1",
        "1.0.dev0",
        "0.0.0",
        "1.0+abc.5.def",
    ] {
        let parsed = version(string);
        let reparsed = version(&parsed.to_string());
        assert_eq!(parsed, reparsed, "{string}");
        assert_eq!(parsed.to_string(), reparsed.to_string(), "{string}");
    }
}

#[test]
fn accessors() {
    let parsed = version("1!2.3.4a5.post6.dev7+local.8");
    assert_eq!(parsed.epoch(), 1);
    assert_eq!(parsed.release(), &[2, 3, 4]);
    assert_eq!(
        parsed.pre(),
        Some(Prerelease {
            kind: PrereleaseKind::Alpha,
            number: 5
        })
    );
    assert_eq!(parsed.post(), Some(6));
    assert_eq!(parsed.dev(), Some(7));
    assert_eq!(
        parsed.local(),
        &[
            LocalSegment::String("local".to_string()),
            LocalSegment::Number(8)
        ]
    );
    assert_eq!((parsed.major(), parsed.minor(), parsed.micro()), (2, 3, 4));
}

#[test]
fn release_classification() {
    assert!(version("1.0a5").is_prerelease());
    assert!(version("1.0.dev5").is_prerelease());
    assert!(!version("1.0").is_prerelease());
    assert!(!version("1.0.post5").is_prerelease());
    assert!(version("1.0.post5").is_postrelease());
    assert!(version("1.0.dev5").is_devrelease());
    assert!(version("1.0").is_stable());
    assert!(version("1.0+abc").is_local());
}

#[test]
fn public_and_base() {
    let parsed = version("1!1.2.3a1.post2.dev3+abc");
    assert_eq!(parsed.without_local().to_string(), "1!1.2.3a1.post2.dev3");
    assert_eq!(parsed.base_version().to_string(), "1!1.2.3");
}

#[test]
fn canonicalize_strips_release_zeros() {
    assert_eq!(canonicalize_version(&version("1.0.0"), true), "1");
    assert_eq!(canonicalize_version(&version("1.0.0"), false), "1.0.0");
    assert_eq!(canonicalize_version(&version("0.0"), true), "0");
    assert_eq!(canonicalize_version(&version("1.0.1"), true), "1.0.1");
    assert_eq!(
        canonicalize_version(&version("1.2.0a1.post0+abc"), true),
        "1.2a1.post0+abc"
    );
}

#[test]
fn version_pattern() {
    let wildcard = VersionPattern::from_str("1.2.*").unwrap();
    assert!(wildcard.is_wildcard());
    assert_eq!(wildcard.version(), &version("1.2"));
    assert_eq!(wildcard.to_string(), "1.2.*");

    let plain = VersionPattern::from_str("1.2").unwrap();
    assert!(!plain.is_wildcard());

    assert!(VersionPattern::from_str("1.0.dev1.*").is_err());
    assert!(VersionPattern::from_str("1.0+abc.*").is_err());
    assert!(VersionPattern::from_str("*").is_err());
}

#[test]
fn builders() {
    let base = Version::new([1, 2]);
    assert_eq!(base.to_string(), "1.2");
    let full = base
        .with_epoch(1)
        .with_pre(Some(Prerelease {
            kind: PrereleaseKind::Rc,
            number: 1,
        }))
        .with_post(Some(2))
        .with_dev(Some(3))
        .with_local(vec![LocalSegment::String("abc".to_string())]);
    assert_eq!(full.to_string(), "1!1.2rc1.post2.dev3+abc");
    // The comparison key is rebuilt after a component change.
    assert!(full.without_local() < full);
}

#[test]
fn compare_release_pads_with_zeros() {
    assert_eq!(compare_release(&[1, 2], &[1, 2, 0]), Ordering::Equal);
    assert_eq!(compare_release(&[1, 2], &[1, 2, 1]), Ordering::Less);
    assert_eq!(compare_release(&[1, 3], &[1, 2, 9]), Ordering::Greater);
}

#[test]
fn serde_roundtrip() {
    let parsed: Version = serde_json::from_str(r#""1.0a1""#).unwrap();
    assert_eq!(parsed, version("1.0a1"));
    assert_eq!(serde_json::to_string(&parsed).unwrap(), r#""1.0a1""#);
}
