//! Semantic version parsing and precedence.
//!
//! Only strict `MAJOR.MINOR.PATCH[-PRERELEASE][+BUILD]` strings are accepted.
//! Precedence follows semver 2.0: numeric comparison of the three cores, a
//! pre-release ranks below the matching release, and build metadata is
//! ignored. Two versions that differ only in build metadata are equal.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A version string that is not strict semver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid version '{input}': {reason}")]
pub struct VersionError {
    pub input: String,
    pub reason: String,
}

impl VersionError {
    fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// A parsed semantic version.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    major: u64,
    minor: u64,
    patch: u64,
    pre: Vec<PreRelease>,
    build: Option<String>,
}

/// One dot-separated pre-release identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum PreRelease {
    // Declared first: numeric identifiers rank below alphanumeric ones.
    Numeric(u64),
    Alpha(String),
}

impl Version {
    /// Create a release version with no pre-release or build metadata.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre: Vec::new(),
            build: None,
        }
    }

    /// Parse a strict semantic version string.
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        if input.is_empty() {
            return Err(VersionError::new(input, "version is empty"));
        }

        let (rest, build) = match input.split_once('+') {
            Some((rest, build)) => {
                validate_identifiers(input, build, "build metadata", false)?;
                (rest, Some(build.to_string()))
            }
            None => (input, None),
        };

        let (core, pre) = match rest.split_once('-') {
            Some((core, pre)) => {
                validate_identifiers(input, pre, "pre-release", true)?;
                (core, parse_pre_release(pre))
            }
            None => (rest, Vec::new()),
        };

        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() != 3 {
            return Err(VersionError::new(
                input,
                "expected exactly three components, MAJOR.MINOR.PATCH",
            ));
        }

        Ok(Self {
            major: parse_numeric(input, parts[0])?,
            minor: parse_numeric(input, parts[1])?,
            patch: parse_numeric(input, parts[2])?,
            pre,
            build,
        })
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    pub fn minor(&self) -> u64 {
        self.minor
    }

    pub fn patch(&self) -> u64 {
        self.patch
    }

    /// Whether this version carries a pre-release tag.
    pub fn is_prerelease(&self) -> bool {
        !self.pre.is_empty()
    }
}

fn parse_numeric(input: &str, part: &str) -> Result<u64, VersionError> {
    if part.is_empty() {
        return Err(VersionError::new(input, "empty numeric component"));
    }
    if !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VersionError::new(
            input,
            format!("component '{}' is not a number", part),
        ));
    }
    if part.len() > 1 && part.starts_with('0') {
        return Err(VersionError::new(
            input,
            format!("component '{}' has a leading zero", part),
        ));
    }
    part.parse::<u64>()
        .map_err(|e| VersionError::new(input, format!("component '{}': {}", part, e)))
}

/// `numeric_rules` applies the pre-release rules to all-digit identifiers:
/// no leading zero, and the value must fit in a `u64`.
fn validate_identifiers(
    input: &str,
    section: &str,
    label: &str,
    numeric_rules: bool,
) -> Result<(), VersionError> {
    for ident in section.split('.') {
        if ident.is_empty() {
            return Err(VersionError::new(input, format!("empty {} identifier", label)));
        }
        if !ident.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
            return Err(VersionError::new(
                input,
                format!("{} identifier '{}' has invalid characters", label, ident),
            ));
        }
        let numeric = ident.bytes().all(|b| b.is_ascii_digit());
        if !(numeric_rules && numeric) {
            continue;
        }
        if ident.len() > 1 && ident.starts_with('0') {
            return Err(VersionError::new(
                input,
                format!("{} identifier '{}' has a leading zero", label, ident),
            ));
        }
        if let Err(e) = ident.parse::<u64>() {
            return Err(VersionError::new(
                input,
                format!("{} identifier '{}': {}", label, ident, e),
            ));
        }
    }
    Ok(())
}

fn parse_pre_release(section: &str) -> Vec<PreRelease> {
    section
        .split('.')
        .map(|ident| match ident.parse::<u64>() {
            // Overflowing numeric identifiers were rejected during validation
            Ok(n) if ident.bytes().all(|b| b.is_ascii_digit()) => PreRelease::Numeric(n),
            _ => PreRelease::Alpha(ident.to_string()),
        })
        .collect()
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
            .then_with(|| match (self.pre.is_empty(), other.pre.is_empty()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => self.pre.cmp(&other.pre),
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.pre.is_empty() {
            let idents: Vec<String> = self
                .pre
                .iter()
                .map(|p| match p {
                    PreRelease::Numeric(n) => n.to_string(),
                    PreRelease::Alpha(s) => s.clone(),
                })
                .collect();
            write!(f, "-{}", idents.join("."))?;
        }
        if let Some(ref build) = self.build {
            write!(f, "+{}", build)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_parse_release() {
        let version = v("2.10.3");
        assert_eq!(version.major(), 2);
        assert_eq!(version.minor(), 10);
        assert_eq!(version.patch(), 3);
        assert!(!version.is_prerelease());
        assert_eq!(version.to_string(), "2.10.3");
    }

    #[test]
    fn test_semantic_not_lexical_ordering() {
        assert!(v("10.0.0") > v("2.0.0"));
        assert!(v("1.10.0") > v("1.9.0"));
        assert!(v("1.0.10") > v("1.0.2"));
    }

    #[test]
    fn test_prerelease_precedence() {
        let ordered = [
            "1.0.0-alpha",
            "1.0.0-alpha.1",
            "1.0.0-alpha.beta",
            "1.0.0-beta",
            "1.0.0-beta.2",
            "1.0.0-beta.11",
            "1.0.0-rc.1",
            "1.0.0",
        ];
        for pair in ordered.windows(2) {
            assert!(v(pair[0]) < v(pair[1]), "{} < {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_build_metadata_ignored_for_precedence() {
        assert_eq!(v("2.0.0+build.1"), v("2.0.0+build.2"));
        assert_eq!(v("2.0.0+build.1"), v("2.0.0"));
        assert_eq!(v("2.0.0+build.1").to_string(), "2.0.0+build.1");
    }

    #[test]
    fn test_rejects_non_strict_versions() {
        for bad in ["", "2.0", "2", "2.0.0.0", "v2.0.0", "01.0.0", "1.0.0-", "1.0.0-01", "1.0.0+", "1..0", "a.b.c", "1.0.0-al$pha"] {
            assert!(Version::parse(bad).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_oversized_numeric_prerelease_rejected() {
        assert!(Version::parse("1.0.0-99999999999999999999").is_err());
        assert!(Version::parse("1.0.0-rc.100000000000000000000").is_err());
        assert!(Version::parse("1.0.0-rc.18446744073709551615").is_ok());
        // Alphanumeric identifiers have no size limit
        assert!(Version::parse("1.0.0-x100000000000000000000").is_ok());
        // Build metadata is never compared numerically
        assert!(Version::parse("1.0.0+100000000000000000000").is_ok());
    }

    #[test]
    fn test_large_numeric_prerelease_compares_numerically() {
        assert!(v("1.0.0-rc.9999999999") < v("1.0.0-rc.10000000000"));
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&v("1.2.3-rc.1")).unwrap();
        assert_eq!(json, "\"1.2.3-rc.1\"");

        let back: Version = serde_json::from_str("\"4.5.6\"").unwrap();
        assert_eq!(back, Version::new(4, 5, 6));

        assert!(serde_json::from_str::<Version>("\"4.5\"").is_err());
    }
}
