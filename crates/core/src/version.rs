//! Package version helpers.
//!
//! Package feeds carry versions that are usually, but not always, valid
//! semver ("1.0" and four-part legacy versions both occur in the wild).
//! Parsing is therefore lenient: short versions are padded to three
//! segments before handing them to the `semver` crate, and anything that
//! still fails to parse falls back to string-level heuristics.

use semver::Version;

/// Parse a version string leniently.
///
/// Two-part ("1.0") and one-part ("2") versions are padded with zero
/// segments. Versions with more than three numeric segments are not
/// representable as semver and return `None`.
pub fn parse_lenient(version: &str) -> Option<Version> {
    let version = version.trim();
    if version.is_empty() {
        return None;
    }

    if let Ok(v) = Version::parse(version) {
        return Some(v);
    }

    // Split off any prerelease/build suffix before padding the core.
    let split_at = version.find(['-', '+']).unwrap_or(version.len());
    let (core, suffix) = version.split_at(split_at);

    let segments: Vec<&str> = core.split('.').collect();
    if segments.len() >= 4 || segments.iter().any(|s| s.is_empty()) {
        return None;
    }

    let mut padded: Vec<String> = segments.iter().map(|s| s.to_string()).collect();
    while padded.len() < 3 {
        padded.push("0".to_string());
    }

    Version::parse(&format!("{}{}", padded.join("."), suffix)).ok()
}

/// Whether a version string denotes a prerelease.
///
/// Falls back to checking for a `-` label when the version does not parse.
pub fn is_prerelease(version: &str) -> bool {
    match parse_lenient(version) {
        Some(v) => !v.pre.is_empty(),
        None => version.contains('-'),
    }
}

/// Compare two version strings for equality.
///
/// Parsed versions compare structurally (so "1.0" equals "1.0.0");
/// unparseable versions compare as case-insensitive strings.
pub fn versions_equal(a: &str, b: &str) -> bool {
    match (parse_lenient(a), parse_lenient(b)) {
        (Some(va), Some(vb)) => va == vb,
        _ => a.trim().eq_ignore_ascii_case(b.trim()),
    }
}
