// ============================================================================
// Domain Models Module
// Contains all core domain entities and value objects
// ============================================================================

pub mod asset;
pub mod config;
pub mod errors;
pub mod investor;
pub mod order;
pub mod transaction;

pub use asset::{Asset, AssetId};
pub use config::BookConfig;
pub use errors::{PositionOverflow, TradeError};
pub use investor::{AssetPosition, Investor, InvestorId};
pub use order::{Order, OrderId, OrderStatus, Side};
pub use transaction::{Transaction, TransactionId};
