//! Design file format versions.
//!
//! Versions are written as dotted numbers (`3.2.7`, `3.2.23`) on the root tag
//! of a design. They are compared as a single integer in which every
//! component occupies a fixed number of decimal digits:
//!
//! ```rust
//! use rptdesign::DesignVersion;
//!
//! let v: DesignVersion = "3.2.7".parse().unwrap();
//! assert_eq!(v.value(), 3_020_700);
//! assert!(v.enforces_unique_ids());
//! assert!(!"3.2.6".parse::<DesignVersion>().unwrap().enforces_unique_ids());
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid design version '{0}'")]
pub struct VersionParseError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DesignVersion(u32);

impl DesignVersion {
    /// First format version in which element ids must be unique.
    /// Older files are known to contain benign duplicates.
    pub const STRICT_ELEMENT_ID: DesignVersion = DesignVersion::new(3, 2, 7);

    /// The format version written by current tools.
    pub const CURRENT: DesignVersion = DesignVersion::new(3, 2, 23);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        DesignVersion(major * 1_000_000 + minor * 10_000 + patch * 100)
    }

    pub fn value(self) -> u32 {
        self.0
    }

    pub fn enforces_unique_ids(self) -> bool {
        self >= Self::STRICT_ELEMENT_ID
    }
}

impl Default for DesignVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl FromStr for DesignVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || VersionParseError(s.to_string());
        let parts = s
            .trim()
            .split('.')
            .map(|part| part.parse::<u32>().map_err(|_| err()))
            .collect::<Result<Vec<_>, _>>()?;

        // major, minor, patch, build; minor/patch/build are two digits each.
        if parts.is_empty() || parts.len() > 4 || parts[1..].iter().any(|p| *p > 99) {
            return Err(err());
        }
        let weights = [1_000_000u32, 10_000, 100, 1];
        let value = parts
            .iter()
            .zip(weights)
            .try_fold(0u32, |acc, (part, weight)| {
                part.checked_mul(weight).and_then(|v| acc.checked_add(v))
            })
            .ok_or_else(err)?;
        Ok(DesignVersion(value))
    }
}

impl fmt::Display for DesignVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let major = self.0 / 1_000_000;
        let minor = self.0 / 10_000 % 100;
        let patch = self.0 / 100 % 100;
        let build = self.0 % 100;
        if build == 0 {
            write!(f, "{}.{}.{}", major, minor, patch)
        } else {
            write!(f, "{}.{}.{}.{}", major, minor, patch, build)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_short_forms() {
        assert_eq!("3".parse::<DesignVersion>().unwrap().value(), 3_000_000);
        assert_eq!("3.1".parse::<DesignVersion>().unwrap().value(), 3_010_000);
        assert_eq!(
            "3.2.7.1".parse::<DesignVersion>().unwrap().value(),
            3_020_701
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<DesignVersion>().is_err());
        assert!("3.x".parse::<DesignVersion>().is_err());
        assert!("3.2.7.1.0".parse::<DesignVersion>().is_err());
        assert!("3.200".parse::<DesignVersion>().is_err());
    }

    #[test]
    fn test_strict_threshold() {
        assert!(DesignVersion::CURRENT.enforces_unique_ids());
        assert!(DesignVersion::new(3, 2, 7).enforces_unique_ids());
        assert!(!DesignVersion::new(3, 2, 6).enforces_unique_ids());
        assert!(!DesignVersion::new(2, 9, 99).enforces_unique_ids());
    }

    #[test]
    fn test_display() {
        assert_eq!(DesignVersion::new(3, 2, 23).to_string(), "3.2.23");
        assert_eq!(
            "3.2.7.4".parse::<DesignVersion>().unwrap().to_string(),
            "3.2.7.4"
        );
    }

    proptest! {
        #[test]
        fn prop_ordering_follows_components(
            a in (0u32..50, 0u32..100, 0u32..100),
            b in (0u32..50, 0u32..100, 0u32..100),
        ) {
            let va = DesignVersion::new(a.0, a.1, a.2);
            let vb = DesignVersion::new(b.0, b.1, b.2);
            prop_assert_eq!(va.cmp(&vb), a.cmp(&b));
        }
    }
}
