//! Build-time configuration: which contract to talk to and how.
//!
//! The defaults live in `config/app.json` and are compiled into the binary. The shipped file
//! has no contract address: set one there, or set `COUNTER_CONTRACT_ADDRESS` while building.

use serde::Deserialize;

use crate::{
    abi::ContractAbi,
    error::ConfigError,
    types::{AddressError, ContractAddress},
};

const DEFAULT_CONFIG: &str = include_str!("../config/app.json");

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct EventsConfig {
    /// How many blocks back "Fetch Events" looks.
    pub window: u64,
    pub page_size: u32,
    /// Upper bound on the pages fetched for one window.
    pub max_pages: u32,
}

#[derive(Deserialize)]
struct RawConfig {
    contract_address: String,
    fee_token_address: String,
    explorer_host: String,
    events: EventsConfig,
    abi: ContractAbi,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub contract_address: ContractAddress,
    /// The ERC-20 contract whose balance is shown.
    pub fee_token_address: ContractAddress,
    pub explorer_host: String,
    pub events: EventsConfig,
    pub abi: ContractAbi,
}

impl AppConfig {
    /// Loads the embedded configuration, applying the build-time address override.
    pub fn load() -> Result<Self, ConfigError> {
        Self::parse(DEFAULT_CONFIG, option_env!("COUNTER_CONTRACT_ADDRESS"))
    }

    pub fn parse(json: &str, contract_override: Option<&str>) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(json)?;
        let contract_address = contract_override.unwrap_or(raw.contract_address.as_str());

        let config = AppConfig {
            contract_address: parse_address("contract_address", contract_address)?,
            fee_token_address: parse_address("fee_token_address", &raw.fee_token_address)?,
            explorer_host: raw.explorer_host,
            events: raw.events,
            abi: raw.abi,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let host = &self.explorer_host;
        if host.is_empty() || host.contains("://") || host.contains('/') {
            return Err(ConfigError::ExplorerHost(host.clone()));
        }
        if self.events.page_size == 0 {
            return Err(ConfigError::EventPageSize);
        }
        if self.events.max_pages == 0 {
            return Err(ConfigError::EventPageLimit);
        }
        for (name, kind) in ContractAbi::required() {
            self.abi
                .ensure(name, kind)
                .map_err(|error| ConfigError::Abi(name, error))?;
        }
        Ok(())
    }
}

fn parse_address(field: &'static str, value: &str) -> Result<ContractAddress, ConfigError> {
    let address: ContractAddress = value
        .parse()
        .map_err(|source| ConfigError::Address { field, source })?;
    if address.as_str().trim_start_matches("0x").trim_start_matches('0').is_empty() {
        return Err(ConfigError::Address {
            field,
            source: AddressError(value.to_owned()),
        });
    }
    Ok(address)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const TEST_CONFIG: &str = r#"{
        "contract_address": "0x0123abcd",
        "fee_token_address": "0x049d36570d4e46f48e99674bd3fcc84644ddd6b96f7c741b1562b82f9e004dc7",
        "explorer_host": "testnet.starkscan.co",
        "events": { "window": 1000, "page_size": 50, "max_pages": 20 },
        "abi": {
            "get_counter": { "kind": "view", "outputs": ["felt"] },
            "increase_counter": { "kind": "external" },
            "reset_counter": { "kind": "external" }
        }
    }"#;

    #[test]
    fn parses_a_complete_config() {
        let config = AppConfig::parse(TEST_CONFIG, None).unwrap();
        assert_eq!(config.contract_address.as_str(), "0x0123abcd");
        assert_eq!(config.explorer_host, "testnet.starkscan.co");
        assert_eq!(
            config.events,
            EventsConfig {
                window: 1000,
                page_size: 50,
                max_pages: 20
            }
        );
    }

    #[test]
    fn shipped_config_needs_a_contract_address() {
        assert_matches!(
            AppConfig::parse(DEFAULT_CONFIG, None),
            Err(ConfigError::Address { field: "contract_address", .. })
        );
        let config = AppConfig::parse(DEFAULT_CONFIG, Some("0xabc")).unwrap();
        assert_eq!(config.contract_address.as_str(), "0xabc");
    }

    #[test]
    fn override_replaces_contract_address() {
        let config = AppConfig::parse(TEST_CONFIG, Some("0xABC")).unwrap();
        assert_eq!(config.contract_address.as_str(), "0xabc");
    }

    #[test]
    fn rejects_placeholder_and_zero_addresses() {
        assert_matches!(
            AppConfig::parse(TEST_CONFIG, Some("<YOUR_CONTRACT_ADDRESS>")),
            Err(ConfigError::Address { field: "contract_address", .. })
        );
        assert_matches!(
            AppConfig::parse(TEST_CONFIG, Some("0x000")),
            Err(ConfigError::Address { .. })
        );
    }

    #[test]
    fn rejects_incomplete_abi() {
        let json = TEST_CONFIG.replace("\"reset_counter\"", "\"reset\"");
        assert_matches!(
            AppConfig::parse(&json, None),
            Err(ConfigError::Abi("reset_counter", _))
        );
    }

    #[test]
    fn rejects_explorer_urls() {
        let json = TEST_CONFIG.replace(
            "\"testnet.starkscan.co\"",
            "\"https://testnet.starkscan.co\"",
        );
        assert_matches!(AppConfig::parse(&json, None), Err(ConfigError::ExplorerHost(_)));
    }

    #[test]
    fn rejects_zero_page_limit() {
        let json = TEST_CONFIG.replace("\"max_pages\": 20", "\"max_pages\": 0");
        assert_matches!(AppConfig::parse(&json, None), Err(ConfigError::EventPageLimit));
    }
}
