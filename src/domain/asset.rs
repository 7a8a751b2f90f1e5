// ============================================================================
// Asset Domain Model
// Instrument reference data supplied by the asset collaborator
// ============================================================================

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for AssetId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

/// A tradable instrument
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Asset {
    pub id: AssetId,
    pub name: String,
    /// Total shares outstanding, informational only
    pub market_volume: u64,
}

impl Asset {
    pub fn new(id: impl Into<String>, name: impl Into<String>, market_volume: u64) -> Self {
        Self {
            id: AssetId::new(id),
            name: name.into(),
            market_volume,
        }
    }
}
