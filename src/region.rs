//! CloudGuard regions.
//!
//! Each region exposes its own API endpoint. The set of regions is fixed;
//! callers select one by reference (e.g. [`IRELAND`]) or by name or code
//! (e.g. `"IRELAND"` or `"eu1"`).

use std::fmt;
use std::str::FromStr;

use crate::error::{CloudGuardError, Result};

/// Location of CloudGuard resources for a given region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    name: &'static str,
    code: &'static str,
    api: &'static str,
}

impl Region {
    const fn new(name: &'static str, code: &'static str, api: &'static str) -> Self {
        Self { name, code, api }
    }

    /// Friendly name of the region.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Short code assigned to the region.
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Base URL of the region's API.
    pub fn api(&self) -> &'static str {
        self.api
    }

    /// Look up a region by constant name or code.
    ///
    /// Matching is case-sensitive: `"IRELAND"` and `"eu1"` both resolve to
    /// [`IRELAND`], `"EU1"` does not.
    ///
    /// # Errors
    ///
    /// Returns [`CloudGuardError::UnknownRegion`] if nothing matches.
    pub fn lookup(value: &str) -> Result<&'static Region> {
        REGISTRY
            .iter()
            .find(|(alias, _)| *alias == value)
            .map(|(_, region)| *region)
            .ok_or_else(|| CloudGuardError::UnknownRegion(value.to_string()))
    }

    /// All known regions, in registry order.
    pub fn all() -> [&'static Region; 6] {
        [
            &AUSTRALIA,
            &CANADA,
            &INDIA,
            &IRELAND,
            &SINGAPORE,
            &UNITED_STATES,
        ]
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}

impl FromStr for Region {
    type Err = CloudGuardError;

    fn from_str(s: &str) -> Result<Self> {
        Region::lookup(s).copied()
    }
}

pub static AUSTRALIA: Region = Region::new("Australia", "ap2", "https://api.ap2.dome9.com/");
pub static CANADA: Region = Region::new("Canada", "cace1", "https://api.cace1.dome9.com/");
pub static INDIA: Region = Region::new("India", "ap3", "https://api.ap3.dome9.com/");
pub static IRELAND: Region = Region::new("Ireland", "eu1", "https://api.eu1.dome9.com/");
pub static SINGAPORE: Region = Region::new("Singapore", "ap1", "https://api.ap1.dome9.com/");
pub static UNITED_STATES: Region = Region::new("United States", "us", "https://api.dome9.com/");

static REGISTRY: [(&str, &Region); 12] = [
    ("AUSTRALIA", &AUSTRALIA),
    ("CANADA", &CANADA),
    ("INDIA", &INDIA),
    ("IRELAND", &IRELAND),
    ("SINGAPORE", &SINGAPORE),
    ("UNITED_STATES", &UNITED_STATES),
    ("ap2", &AUSTRALIA),
    ("cace1", &CANADA),
    ("ap3", &INDIA),
    ("eu1", &IRELAND),
    ("ap1", &SINGAPORE),
    ("us", &UNITED_STATES),
];
