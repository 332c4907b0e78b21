//! Network configuration, read once at startup and shared read-only.

use serde::{Deserialize, Serialize};

use crate::canonical::Currency;
use crate::sharding::ShardFilter;

/// Decimals of the native currency when the deployment does not override them.
pub const NATIVE_CURRENCY_DECIMALS: u32 = 18;

/// Everything the pipeline needs to know about the network it serves.
///
/// Gas parameters feed the move-balance fee computation; shard parameters
/// feed observed-address filtering; custom currencies whitelist the tokens
/// whose events become operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub num_shards: u32,
    pub observed_actual_shard: u32,
    #[serde(default)]
    pub observed_projected_shard: Option<u8>,
    /// Human-readable part of bech32 addresses on this network.
    pub address_hrp: String,
    pub native_currency_symbol: String,
    #[serde(default = "default_native_currency_decimals")]
    pub native_currency_decimals: u32,
    #[serde(default)]
    pub custom_currencies: Vec<Currency>,
    pub genesis_block_hash: String,
    pub genesis_timestamp: u64,
    pub min_gas_price: u64,
    pub min_gas_limit: u64,
    pub gas_per_data_byte: u64,
    pub gas_price_modifier: f64,
    #[serde(default)]
    pub extra_gas_limit_guarded_tx: u64,
}

fn default_native_currency_decimals() -> u32 {
    NATIVE_CURRENCY_DECIMALS
}

impl NetworkConfig {
    pub fn native_currency(&self) -> Currency {
        Currency {
            symbol: self.native_currency_symbol.clone(),
            decimals: self.native_currency_decimals,
        }
    }

    /// Look up a configured custom currency by token symbol.
    pub fn custom_currency(&self, symbol: &str) -> Option<&Currency> {
        self.custom_currencies
            .iter()
            .find(|currency| currency.symbol == symbol)
    }

    pub fn has_custom_currency(&self, symbol: &str) -> bool {
        self.custom_currency(symbol).is_some()
    }

    pub fn shard_filter(&self) -> ShardFilter {
        ShardFilter::new(
            self.num_shards,
            self.observed_actual_shard,
            self.observed_projected_shard,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_currency_lookup() {
        let config = NetworkConfig {
            custom_currencies: vec![Currency {
                symbol: "TOK-abcdef".to_string(),
                decimals: 6,
            }],
            ..crate::testkit::test_network_config()
        };

        assert!(config.has_custom_currency("TOK-abcdef"));
        assert_eq!(config.custom_currency("TOK-abcdef").unwrap().decimals, 6);
        assert!(!config.has_custom_currency("OTHER-123456"));
    }

    #[test]
    fn decimals_default_applies_on_deserialization() {
        let json = r#"{
            "num_shards": 3,
            "observed_actual_shard": 0,
            "address_hrp": "erd",
            "native_currency_symbol": "XeGLD",
            "genesis_block_hash": "00",
            "genesis_timestamp": 1596117600,
            "min_gas_price": 1000000000,
            "min_gas_limit": 50000,
            "gas_per_data_byte": 1500,
            "gas_price_modifier": 0.01
        }"#;

        let config: NetworkConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.native_currency_decimals, NATIVE_CURRENCY_DECIMALS);
        assert!(config.custom_currencies.is_empty());
        assert!(config.observed_projected_shard.is_none());
    }
}
