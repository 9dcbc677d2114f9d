//! Version identifiers and release-version ordering
//!
//! A version is a dotted sequence of numeric components followed by an
//! optional qualifier (`2024.1`, `241.15989.150`, `2024.2-EAP`, `1.0rc1`).
//! Components compare numerically, missing trailing components count as
//! zero, and any qualifier sorts before the plain release it qualifies.
//! Malformed input is an error, never a best-effort truncation.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, UpdateError};

/// Characters that may separate the release part from a qualifier
const QUALIFIER_SEPARATORS: &[char] = &['-', '.', '_', '+'];

/// Parsed, comparable version identifier
#[derive(Debug, Clone)]
pub struct VersionId {
    raw: String,
    release: Vec<u64>,
    qualifier: Option<Vec<QualifierPart>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum QualifierPart {
    Numeric(u64),
    Alpha(String),
}

impl VersionId {
    /// Parse a version string
    pub fn parse(input: &str) -> Result<Self> {
        let text = input.trim();
        let text = text
            .strip_prefix('v')
            .or_else(|| text.strip_prefix('V'))
            .unwrap_or(text);

        if text.is_empty() {
            return Err(UpdateError::invalid_version(input, "empty version"));
        }

        let mut release = Vec::new();
        let mut rest = text;
        loop {
            let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
            if digits == 0 {
                return Err(UpdateError::invalid_version(
                    input,
                    "expected a numeric component",
                ));
            }

            let component = rest[..digits].parse::<u64>().map_err(|_| {
                UpdateError::invalid_version(input, "numeric component out of range")
            })?;
            release.push(component);
            rest = &rest[digits..];

            match rest.strip_prefix('.') {
                Some("") => {
                    return Err(UpdateError::invalid_version(input, "trailing '.'"));
                }
                Some(after) if after.starts_with('.') => {
                    return Err(UpdateError::invalid_version(input, "empty component"));
                }
                Some(after) if after.starts_with(|c: char| c.is_ascii_digit()) => rest = after,
                _ => break,
            }
        }

        let qualifier = if rest.is_empty() {
            None
        } else {
            Some(parse_qualifier(input, rest)?)
        };

        Ok(Self {
            raw: text.to_string(),
            release,
            qualifier,
        })
    }

    /// Numeric release components
    pub fn release(&self) -> &[u64] {
        &self.release
    }

    /// Whether a qualifier (pre-release or suffix) is present
    pub fn is_qualified(&self) -> bool {
        self.qualifier.is_some()
    }

    /// The version text as parsed (without a leading `v`)
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// `<major>.<minor>`, or just `<major>` for single-component versions
    pub fn major_minor(&self) -> String {
        self.release
            .iter()
            .take(2)
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }

    /// True iff `self` is strictly greater than `other`
    pub fn is_newer_than(&self, other: &VersionId) -> bool {
        self > other
    }
}

/// True iff `remote` is strictly newer than `installed`. Equal versions are not an update.
pub fn is_newer(remote: &VersionId, installed: &VersionId) -> bool {
    remote.is_newer_than(installed)
}

fn parse_qualifier(input: &str, rest: &str) -> Result<Vec<QualifierPart>> {
    let body = rest.strip_prefix(QUALIFIER_SEPARATORS).unwrap_or(rest);

    if body.is_empty() {
        return Err(UpdateError::invalid_version(input, "dangling separator"));
    }

    if let Some(bad) = body
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || QUALIFIER_SEPARATORS.contains(c)))
    {
        return Err(UpdateError::invalid_version(
            input,
            format!("unexpected character '{}' in qualifier", bad),
        ));
    }

    let mut parts = Vec::new();
    for segment in body.split(QUALIFIER_SEPARATORS) {
        if segment.is_empty() {
            return Err(UpdateError::invalid_version(input, "empty qualifier segment"));
        }
        split_alnum_runs(input, segment, &mut parts)?;
    }
    Ok(parts)
}

/// Split `rc12b` into `rc`, `12`, `b`
fn split_alnum_runs(input: &str, segment: &str, parts: &mut Vec<QualifierPart>) -> Result<()> {
    let mut start = 0;
    let bytes = segment.as_bytes();
    while start < bytes.len() {
        let numeric = bytes[start].is_ascii_digit();
        let len = bytes[start..]
            .iter()
            .take_while(|b| b.is_ascii_digit() == numeric)
            .count();
        let run = &segment[start..start + len];
        let part = if numeric {
            QualifierPart::Numeric(run.parse().map_err(|_| {
                UpdateError::invalid_version(input, "qualifier number out of range")
            })?)
        } else {
            QualifierPart::Alpha(run.to_ascii_lowercase())
        };
        parts.push(part);
        start += len;
    }
    Ok(())
}

impl Ord for QualifierPart {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (QualifierPart::Numeric(a), QualifierPart::Numeric(b)) => a.cmp(b),
            (QualifierPart::Alpha(a), QualifierPart::Alpha(b)) => a.cmp(b),
            (QualifierPart::Numeric(_), QualifierPart::Alpha(_)) => Ordering::Less,
            (QualifierPart::Alpha(_), QualifierPart::Numeric(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for QualifierPart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionId {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.release.len().max(other.release.len());
        for i in 0..len {
            let a = self.release.get(i).copied().unwrap_or(0);
            let b = other.release.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                non_eq => return non_eq,
            }
        }

        match (&self.qualifier, &other.qualifier) {
            (None, None) => Ordering::Equal,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(a), Some(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for VersionId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for VersionId {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VersionId {}

impl FromStr for VersionId {
    type Err = UpdateError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
