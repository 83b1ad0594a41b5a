use std::cmp::Ordering;

use modsel_core::version::{compare, join, Version};

#[test]
fn join_picks_later_version() {
    let a = Version::from("v1.2.0");
    let b = Version::from("v1.10.0");
    assert_eq!(join(&a, &b), b);
    assert_eq!(join(&b, &a), b);
}

#[test]
fn join_prefers_release_over_prerelease() {
    let pre = Version::from("v2.0.0-rc.1");
    let rel = Version::from("v2.0.0");
    assert_eq!(join(&pre, &rel), rel);
}

#[test]
fn join_is_associative() {
    let vs = ["v0.1.0", "v1.0.0-alpha", "v1.0.0", "v1.0.1"].map(Version::from);
    for a in &vs {
        for b in &vs {
            for c in &vs {
                assert_eq!(join(&join(a, b), c), join(a, &join(b, c)));
            }
        }
    }
}

#[test]
fn none_is_below_every_version() {
    assert_eq!(join(&Version::None, &Version::from("v0.0.0")), Version::from("v0.0.0"));
    assert!(Version::None < Version::from("v0.0.0-0"));
}

#[test]
fn build_metadata_ignored_for_precedence() {
    assert_eq!(compare("v1.0.0+20240101", "v1.0.0"), Ordering::Equal);
}

#[test]
fn serde_uses_plain_strings() {
    #[derive(serde::Serialize, serde::Deserialize)]
    struct Doc {
        a: Version,
        b: Version,
    }
    let doc: Doc = toml::from_str("a = \"none\"\nb = \"v1.2.3\"").unwrap();
    assert_eq!(doc.a, Version::None);
    assert_eq!(doc.b, Version::from("v1.2.3"));
    let out = toml::to_string(&doc).unwrap();
    assert!(out.contains("a = \"none\""));
}
