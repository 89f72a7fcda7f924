//! Semantic-version parsing and ordering for repository tags
//!
//! Tags in the wild are only loosely SemVer: `v1.2`, `V3`, `1.0.0-rc.1+build.7`
//! and `release-final` all show up. [`parse`] accepts the lenient forms
//! (optional `v` prefix, missing minor/patch) and [`sort_descending`] orders a
//! tag list newest first, keeping every tag that fails to parse at the end in
//! the order the hosting API returned it.

use semver::{BuildMetadata, Prerelease};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// A parsed version
///
/// Equality and ordering follow SemVer precedence, so build metadata is
/// carried for display but never compared.
#[derive(Debug, Clone)]
pub struct SemVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre: Prerelease,
    pub build: BuildMetadata,
}

impl SemVersion {
    pub fn is_prerelease(&self) -> bool {
        !self.pre.is_empty()
    }
}

impl PartialEq for SemVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SemVersion {}

impl PartialOrd for SemVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SemVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
            // Prerelease orders the empty prerelease above any non-empty one
            .then_with(|| self.pre.cmp(&other.pre))
    }
}

impl fmt::Display for SemVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.pre.is_empty() {
            write!(f, "-{}", self.pre)?;
        }
        if !self.build.is_empty() {
            write!(f, "+{}", self.build)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{raw}' is not a semantic version: {reason}")]
pub struct SemVerParseError {
    pub raw: String,
    pub reason: String,
}

/// Parses a raw tag into a [`SemVersion`]
///
/// # Examples
///
/// ```
/// use gitremote_mcp::gitremote::semver::parse;
///
/// assert!(parse("v1.10.0").unwrap() > parse("v1.9.0").unwrap());
/// assert!(parse("1.0.0-alpha").unwrap() < parse("1.0.0").unwrap());
/// assert_eq!(parse("1.0.0+build5").unwrap(), parse("1.0.0+build9").unwrap());
/// assert!(parse("release-final").is_err());
/// ```
pub fn parse(raw: &str) -> Result<SemVersion, SemVerParseError> {
    let fail = |reason: &str| SemVerParseError {
        raw: raw.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);

    let (rest, build) = match body.split_once('+') {
        Some((rest, build)) => (rest, Some(build)),
        None => (body, None),
    };
    let (core, pre) = match rest.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (rest, None),
    };

    let numbers: Vec<&str> = core.split('.').collect();
    if numbers.len() > 3 {
        return Err(fail("more than three version components"));
    }

    let mut parsed = [0u64; 3];
    for (slot, component) in parsed.iter_mut().zip(&numbers) {
        if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
            return Err(fail("version components must be non-negative integers"));
        }
        *slot = component
            .parse()
            .map_err(|_| fail("version component out of range"))?;
    }

    let pre = match pre {
        Some("") => return Err(fail("empty pre-release")),
        Some(pre) => Prerelease::new(pre).map_err(|e| fail(&e.to_string()))?,
        None => Prerelease::EMPTY,
    };
    let build = match build {
        Some("") => return Err(fail("empty build metadata")),
        Some(build) => BuildMetadata::new(build).map_err(|e| fail(&e.to_string()))?,
        None => BuildMetadata::EMPTY,
    };

    Ok(SemVersion {
        major: parsed[0],
        minor: parsed[1],
        patch: parsed[2],
        pre,
        build,
    })
}

/// A raw tag together with its parse outcome
#[derive(Debug, Clone, Serialize)]
pub struct ParsedTag {
    pub raw: String,
    #[serde(skip)]
    pub version: Option<SemVersion>,
}

impl ParsedTag {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let version = match parse(&raw) {
            Ok(version) => Some(version),
            Err(err) => {
                tracing::debug!("Keeping unordered tag: {}", err);
                None
            }
        };
        Self { raw, version }
    }

    pub fn is_semver(&self) -> bool {
        self.version.is_some()
    }
}

/// Newest-first precedence between two tags
///
/// Parseable tags come before unparseable ones. Equal versions spelled
/// differently (`v1.0.0` and `1.0.0`) are ordered by their raw strings so the
/// order is total. Unparseable tags compare equal to each other; a stable sort
/// therefore keeps their original relative order.
pub fn compare_descending(a: &ParsedTag, b: &ParsedTag) -> Ordering {
    match (&a.version, &b.version) {
        (Some(va), Some(vb)) => vb.cmp(va).then_with(|| b.raw.cmp(&a.raw)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Sorts tags newest SemVer first, unparseable tags trailing in input order
///
/// `limit` truncates the result when it is present and positive; `None` or a
/// non-positive value returns every tag.
pub fn sort_descending<S: AsRef<str>>(tags: &[S], limit: Option<i64>) -> Vec<String> {
    sort_parsed_descending(tags.iter().map(|t| ParsedTag::new(t.as_ref())).collect(), limit)
        .into_iter()
        .map(|tag| tag.raw)
        .collect()
}

/// Same as [`sort_descending`] but keeps the parse results
pub fn sort_parsed_descending(mut tags: Vec<ParsedTag>, limit: Option<i64>) -> Vec<ParsedTag> {
    // slice::sort_by is stable
    tags.sort_by(compare_descending);
    if let Some(limit) = limit.filter(|l| *l > 0) {
        tags.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
    }
    tags
}

/// Highest version without pre-release identifiers, if any
pub fn latest_stable(tags: &[ParsedTag]) -> Option<&ParsedTag> {
    tags.iter()
        .filter(|tag| tag.version.as_ref().is_some_and(|v| !v.is_prerelease()))
        .min_by(|a, b| compare_descending(a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lenient_forms() {
        let v = parse("v1.2").unwrap();
        assert_eq!((v.major, v.minor, v.patch), (1, 2, 0));

        let v = parse("V3").unwrap();
        assert_eq!((v.major, v.minor, v.patch), (3, 0, 0));

        let v = parse("2.0.0-rc.1+sha.abc").unwrap();
        assert_eq!(v.pre.as_str(), "rc.1");
        assert_eq!(v.build.as_str(), "sha.abc");
        assert_eq!(v.to_string(), "2.0.0-rc.1+sha.abc");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for raw in ["release-final", "", "v", "1..2", "1.2.3.4", "1.x", "-1.0.0", "1.0.0-", "1.0.0+"] {
            assert!(parse(raw).is_err(), "{:?} should not parse", raw);
        }
    }

    #[test]
    fn test_precedence_rules() {
        assert!(parse("v1.10.0").unwrap() > parse("v1.9.0").unwrap());
        assert!(parse("1.0.0-alpha").unwrap() < parse("1.0.0").unwrap());
        assert!(parse("1.0.0-alpha.1").unwrap() < parse("1.0.0-alpha.beta").unwrap());
        assert!(parse("1.0.0-alpha.2").unwrap() < parse("1.0.0-alpha.10").unwrap());
        assert!(parse("1.0.0-beta.11").unwrap() < parse("1.0.0-rc.1").unwrap());
        assert_eq!(parse("1.0.0+build5").unwrap(), parse("1.0.0+build9").unwrap());
    }

    #[test]
    fn test_sort_descending_trails_unparseable_in_input_order() {
        let tags = ["zeta", "v1.0.0", "nightly", "v2.0.0-beta", "v2.0.0", "alpha"];
        let sorted = sort_descending(&tags, None);
        assert_eq!(
            sorted,
            vec!["v2.0.0", "v2.0.0-beta", "v1.0.0", "zeta", "nightly", "alpha"]
        );
    }

    #[test]
    fn test_equal_versions_tie_break_on_raw_string() {
        let sorted = sort_descending(&["1.0.0", "v1.0.0", "1.0.0+b"], None);
        assert_eq!(sorted, vec!["v1.0.0", "1.0.0+b", "1.0.0"]);
    }

    #[test]
    fn test_limit_handling() {
        let tags = ["v0.1.0", "v0.3.0", "v0.2.0"];
        assert_eq!(sort_descending(&tags, Some(2)), vec!["v0.3.0", "v0.2.0"]);
        assert_eq!(sort_descending(&tags, Some(0)).len(), 3);
        assert_eq!(sort_descending(&tags, Some(-4)).len(), 3);
        assert_eq!(sort_descending(&tags, Some(10)).len(), 3);
    }

    #[test]
    fn test_latest_stable_skips_prereleases() {
        let tags = sort_parsed_descending(
            ["v2.0.0-rc.1", "v1.4.2", "v1.4.1", "nightly"]
                .into_iter()
                .map(ParsedTag::new)
                .collect(),
            None,
        );
        assert_eq!(latest_stable(&tags).map(|t| t.raw.as_str()), Some("v1.4.2"));
    }
}
