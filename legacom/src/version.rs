//! Index-created versions and the version gates applied to legacy mapping keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Version of the engine that created an index.
///
/// Versions are encoded as a single ordered id: `major * 1_000_000 + minor * 10_000
/// + revision * 100 + build`, where `build` is `1..=25` for alphas, `26..=50` for betas,
/// `51..=98` for release candidates and `99` for a GA release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexVersion {
    id: u32,
}

const GA_BUILD: u32 = 99;
const BETA_OFFSET: u32 = 25;
const RC_OFFSET: u32 = 50;

impl IndexVersion {
    pub const V_1_7_0: IndexVersion = IndexVersion::ga(1, 7, 0);
    pub const V_2_0_0_BETA1: IndexVersion = IndexVersion::from_id(2_000_000 + BETA_OFFSET + 1);
    pub const V_2_0_0: IndexVersion = IndexVersion::ga(2, 0, 0);
    pub const V_5_0_0: IndexVersion = IndexVersion::ga(5, 0, 0);
    pub const V_5_6_0: IndexVersion = IndexVersion::ga(5, 6, 0);
    pub const CURRENT: IndexVersion = IndexVersion::V_5_6_0;

    pub const fn from_id(id: u32) -> Self {
        Self { id }
    }

    pub const fn ga(major: u32, minor: u32, revision: u32) -> Self {
        Self::from_id(major * 1_000_000 + minor * 10_000 + revision * 100 + GA_BUILD)
    }

    pub const fn id(self) -> u32 {
        self.id
    }

    pub const fn major(self) -> u32 {
        self.id / 1_000_000
    }

    pub const fn minor(self) -> u32 {
        (self.id / 10_000) % 100
    }

    pub const fn revision(self) -> u32 {
        (self.id / 100) % 100
    }

    pub const fn build(self) -> u32 {
        self.id % 100
    }

    pub fn before(self, other: IndexVersion) -> bool {
        self < other
    }

    pub fn on_or_after(self, other: IndexVersion) -> bool {
        self >= other
    }
}

impl Default for IndexVersion {
    fn default() -> Self {
        IndexVersion::CURRENT
    }
}

impl fmt::Display for IndexVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major(), self.minor(), self.revision())?;
        match self.build() {
            GA_BUILD => Ok(()),
            build if build > RC_OFFSET => write!(f, "-rc{}", build - RC_OFFSET),
            build if build > BETA_OFFSET => write!(f, "-beta{}", build - BETA_OFFSET),
            build => write!(f, "-alpha{build}"),
        }
    }
}

/// Error returned when a version string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("illegal version format [{0}]")]
pub struct ParseVersionError(String);

impl FromStr for IndexVersion {
    type Err = ParseVersionError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseVersionError(input.to_string());
        let (numbers, qualifier) = match input.split_once('-') {
            Some((numbers, qualifier)) => (numbers, Some(qualifier)),
            None => (input, None),
        };

        let parts = numbers
            .split('.')
            .map(|part| part.parse::<u32>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;
        let &[major, minor, revision] = parts.as_slice() else {
            return Err(invalid());
        };
        if minor > 99 || revision > 99 || major > 4_000 {
            return Err(invalid());
        }

        let build = match qualifier {
            None => GA_BUILD,
            Some(qualifier) => {
                let (offset, max, number) = if let Some(n) = qualifier.strip_prefix("alpha") {
                    (0, BETA_OFFSET, n)
                } else if let Some(n) = qualifier.strip_prefix("beta") {
                    (BETA_OFFSET, RC_OFFSET - BETA_OFFSET, n)
                } else if let Some(n) = qualifier.strip_prefix("rc") {
                    (RC_OFFSET, GA_BUILD - RC_OFFSET - 1, n)
                } else {
                    return Err(invalid());
                };
                let number: u32 = number.parse().map_err(|_| invalid())?;
                if number == 0 || number > max {
                    return Err(invalid());
                }
                offset + number
            }
        };

        Ok(IndexVersion::from_id(major * 1_000_000 + minor * 10_000 + revision * 100 + build))
    }
}

impl Serialize for IndexVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for IndexVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Window of index-created versions in which a mapping key spelling is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyGate {
    /// Accepted for every index.
    Always,
    /// Accepted only for indices created strictly before the given version.
    Before(IndexVersion),
}

impl KeyGate {
    pub fn admits(self, version: IndexVersion) -> bool {
        match self {
            KeyGate::Always => true,
            KeyGate::Before(limit) => version.before(limit),
        }
    }
}

/// One accepted spelling of a recognized mapping key.
#[derive(Debug, Clone, Copy)]
pub struct KeySpelling {
    pub key: &'static str,
    pub gate: KeyGate,
    /// Deprecated spellings are accepted but reported through the debug log.
    pub deprecated: bool,
}

/// Returns whether `key` is one of `spellings` and is accepted for an index created at `version`.
pub fn accepts(spellings: &[KeySpelling], key: &str, version: IndexVersion) -> bool {
    spellings.iter().any(|spelling| {
        if spelling.key != key || !spelling.gate.admits(version) {
            return false;
        }
        if spelling.deprecated {
            log::debug!("mapping key [{key}] is deprecated and will be removed in a future version");
        }
        true
    })
}
