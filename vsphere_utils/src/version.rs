/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::{fmt, str::FromStr};

#[derive(Debug, thiserror::Error)]
#[error("invalid api version {0:?}: {1}")]
pub struct VersionError(String, #[source] std::num::ParseIntError);

/// The first three components of a dotted version string. Missing
/// components count as zero, components beyond the third are ignored.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct ApiVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ApiVersion {
    /// Whether the api session can reuse the vim25 session (8.0.3 and
    /// later).
    pub fn supports_unified_session(&self) -> bool {
        self.major > 8
            || (self.major == 8
                && (self.minor >= 1 || (self.minor == 0 && self.patch >= 3)))
    }
}

impl FromStr for ApiVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('.');
        let mut next = || {
            parts
                .next()
                .unwrap_or("0")
                .parse::<u32>()
                .map_err(|e| VersionError(s.to_string(), e))
        };
        Ok(Self {
            major: next()?,
            minor: next()?,
            patch: next()?,
        })
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

pub fn is_803_or_later(version: &str) -> Result<bool, VersionError> {
    Ok(version.parse::<ApiVersion>()?.supports_unified_session())
}

#[cfg(test)]
mod tests {
    use super::{is_803_or_later, ApiVersion};

    #[test]
    fn version_gate() {
        for (version, expected) in [
            ("6.7.0", false),
            ("7.0.3", false),
            ("7.0.3.0", false),
            ("8.0.2", false),
            ("8.0.2.0", false),
            ("8.0.3", true),
            ("8.0.3.0", true),
            ("8.1", true),
            ("8.0", false),
            ("8", false),
            ("9.0.0", true),
            ("9", true),
        ] {
            assert_eq!(
                is_803_or_later(version).unwrap(),
                expected,
                "{}",
                version
            );
        }
    }

    #[test]
    fn padding() {
        assert_eq!(
            "8.1".parse::<ApiVersion>().unwrap(),
            ApiVersion {
                major: 8,
                minor: 1,
                patch: 0
            }
        );
    }

    #[test]
    fn malformed_versions() {
        assert!(is_803_or_later("eight.0.3").is_err());
        assert!(is_803_or_later("8.0.x").is_err());
        assert!(is_803_or_later("").is_err());
    }
}
