// ============================================================================
// Investor Domain Model
// Account owned by the investor collaborator; positions mutated by settlement
// ============================================================================

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

use super::{AssetId, PositionOverflow};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InvestorId(Uuid);

impl InvestorId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for InvestorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InvestorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Net holding of one asset
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AssetPosition {
    pub asset: AssetId,
    pub shares: i64,
}

/// Investor account shared between the submitting collaborator and the engine.
///
/// Positions are signed: a seller without a prior holding goes short.
#[derive(Debug)]
pub struct Investor {
    pub id: InvestorId,
    pub name: String,
    positions: RwLock<HashMap<AssetId, i64>>,
}

impl Investor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: InvestorId::new(),
            name: name.into(),
            positions: RwLock::new(HashMap::new()),
        }
    }

    /// Create an investor with opening holdings.
    /// Repeated assets are summed.
    pub fn with_positions(
        name: impl Into<String>,
        positions: impl IntoIterator<Item = AssetPosition>,
    ) -> Result<Self, PositionOverflow> {
        let investor = Self::new(name);
        for position in positions {
            investor.update_asset_position(&position.asset, position.shares)?;
        }
        Ok(investor)
    }

    /// Position in `asset` after applying `delta`, without applying it
    pub fn checked_asset_position(
        &self,
        asset: &AssetId,
        delta: i64,
    ) -> Result<i64, PositionOverflow> {
        shifted(asset, self.asset_position(asset), delta)
    }

    /// Apply a signed share delta to the position in `asset`.
    /// Returns the new position; on overflow the position is left unchanged.
    pub fn update_asset_position(
        &self,
        asset: &AssetId,
        delta: i64,
    ) -> Result<i64, PositionOverflow> {
        let mut positions = self.positions.write();
        let current = positions.get(asset).copied().unwrap_or(0);
        let updated = shifted(asset, current, delta)?;
        positions.insert(asset.clone(), updated);
        Ok(updated)
    }

    pub fn asset_position(&self, asset: &AssetId) -> i64 {
        self.positions.read().get(asset).copied().unwrap_or(0)
    }

    /// Snapshot of all positions, ordered by asset id
    pub fn positions(&self) -> Vec<AssetPosition> {
        let mut positions: Vec<AssetPosition> = self
            .positions
            .read()
            .iter()
            .map(|(asset, shares)| AssetPosition {
                asset: asset.clone(),
                shares: *shares,
            })
            .collect();
        positions.sort_by(|a, b| a.asset.cmp(&b.asset));
        positions
    }
}

fn shifted(asset: &AssetId, position: i64, delta: i64) -> Result<i64, PositionOverflow> {
    position.checked_add(delta).ok_or_else(|| PositionOverflow {
        asset: asset.clone(),
        position,
        delta,
    })
}
