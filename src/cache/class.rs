//! Cache classes: named TTL buckets for portal resources.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Resource family a cached response belongs to; selects its TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheClass {
    #[default]
    Dashboard,
    Leads,
    Commissions,
    Messages,
    Admin,
}

impl CacheClass {
    pub const ALL: [CacheClass; 5] = [
        CacheClass::Dashboard,
        CacheClass::Leads,
        CacheClass::Commissions,
        CacheClass::Messages,
        CacheClass::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheClass::Dashboard => "dashboard",
            CacheClass::Leads => "leads",
            CacheClass::Commissions => "commissions",
            CacheClass::Messages => "messages",
            CacheClass::Admin => "admin",
        }
    }
}

impl fmt::Display for CacheClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheClass {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CacheClass::ALL
            .into_iter()
            .find(|class| class.as_str() == s)
            .ok_or_else(|| CacheError::InvalidRequest(format!("Unknown cache class: {}", s)))
    }
}
