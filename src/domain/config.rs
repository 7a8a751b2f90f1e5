// ============================================================================
// Order Book Configuration
// Instrument and channel settings for a single book
// ============================================================================

use super::AssetId;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const DEFAULT_THREAD_NAME: &str = "order-book";

/// Configuration for one single-instrument order book
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BookConfig {
    /// The traded asset; orders for anything else never cross
    pub asset: AssetId,

    /// Inbound order channel capacity. None means unbounded.
    pub inbound_capacity: Option<usize>,

    /// Outbound fill channel capacity. None means unbounded.
    /// When bounded, a slow subscriber blocks the matching loop.
    pub outbound_capacity: Option<usize>,

    /// Name of the engine thread
    pub thread_name: String,
}

impl BookConfig {
    /// Create a new configuration with unbounded channels
    pub fn new(asset: impl Into<AssetId>) -> Self {
        Self {
            asset: asset.into(),
            inbound_capacity: None,
            outbound_capacity: None,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }

    /// Builder method: Bound the inbound order channel
    pub fn with_inbound_capacity(mut self, capacity: usize) -> Self {
        self.inbound_capacity = Some(capacity);
        self
    }

    /// Builder method: Bound the outbound fill channel
    pub fn with_outbound_capacity(mut self, capacity: usize) -> Self {
        self.outbound_capacity = Some(capacity);
        self
    }

    /// Builder method: Set the engine thread name
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.asset.is_empty() {
            return Err("Asset cannot be empty".to_string());
        }

        if self.thread_name.is_empty() {
            return Err("Thread name cannot be empty".to_string());
        }

        if self.inbound_capacity == Some(0) {
            return Err("Inbound capacity must be positive".to_string());
        }

        if self.outbound_capacity == Some(0) {
            return Err("Outbound capacity must be positive".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = BookConfig::new("ACME");

        assert_eq!(config.asset.as_str(), "ACME");
        assert_eq!(config.inbound_capacity, None);
        assert_eq!(config.thread_name, DEFAULT_THREAD_NAME);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = BookConfig::new("ACME")
            .with_inbound_capacity(1024)
            .with_outbound_capacity(64)
            .with_thread_name("acme-book");

        assert_eq!(config.inbound_capacity, Some(1024));
        assert_eq!(config.outbound_capacity, Some(64));
        assert_eq!(config.thread_name, "acme-book");
    }

    #[test]
    fn test_validation() {
        assert!(BookConfig::new("").validate().is_err());
        assert!(BookConfig::new("ACME")
            .with_outbound_capacity(0)
            .validate()
            .is_err());
        assert!(BookConfig::new("ACME")
            .with_thread_name("")
            .validate()
            .is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_from_json() {
        let json = r#"{"asset":"ACME","inbound_capacity":null,"outbound_capacity":16,"thread_name":"acme"}"#;
        let config: BookConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.outbound_capacity, Some(16));
        assert!(config.validate().is_ok());
    }
}
