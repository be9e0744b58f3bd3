//! Plain data exchanged between the controller and its collaborators.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A Starknet field element, kept in the textual form the wallet hands back.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Felt(String);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeltError {
    #[error("empty field element")]
    Empty,

    #[error("invalid field element {0:?}")]
    Invalid(String),

    #[error("field element {0} does not fit into {1} bits")]
    Overflow(String, u32),
}

impl Felt {
    pub fn new(value: impl Into<String>) -> Self {
        Felt(value.into())
    }

    pub fn from_u64(value: u64) -> Self {
        Felt(format!("{value:#x}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the element as an unsigned integer. Accepts `0x`-prefixed hex and decimal.
    pub fn to_u128(&self) -> Result<u128, FeltError> {
        let raw = self.0.trim();
        if raw.is_empty() {
            return Err(FeltError::Empty);
        }
        let (digits, radix) = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
            Some(hex) => (hex.trim_start_matches('0'), 16),
            None => (raw, 10),
        };
        if digits.is_empty() {
            return Ok(0);
        }
        if !digits.chars().all(|c| c.is_digit(radix)) {
            return Err(FeltError::Invalid(self.0.clone()));
        }
        u128::from_str_radix(digits, radix).map_err(|_| FeltError::Overflow(self.0.clone(), 128))
    }

    pub fn to_u64(&self) -> Result<u64, FeltError> {
        let value = self.to_u128()?;
        u64::try_from(value).map_err(|_| FeltError::Overflow(self.0.clone(), 64))
    }
}

impl fmt::Display for Felt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid address {0:?}: expected 0x followed by 1 to 64 hex digits")]
pub struct AddressError(pub String);

fn validate_hex_address(value: &str) -> Result<(), AddressError> {
    let digits = value
        .strip_prefix("0x")
        .ok_or_else(|| AddressError(value.to_owned()))?;
    if digits.is_empty() || digits.len() > 64 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AddressError(value.to_owned()));
    }
    Ok(())
}

macro_rules! hex_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = AddressError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let value = value.trim().to_ascii_lowercase();
                validate_hex_address(&value)?;
                Ok($name(value))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

hex_identifier!(
    /// The address of a wallet account.
    AccountAddress
);
hex_identifier!(
    /// The address of a deployed contract.
    ContractAddress
);
hex_identifier!(
    /// The hash identifying a submitted transaction.
    TransactionHash
);

/// A connected wallet account, as seen by the controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub account: AccountAddress,
    pub chain_id: Option<String>,
}

impl Session {
    pub fn new(account: AccountAddress) -> Self {
        Session {
            account,
            chain_id: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub hash: TransactionHash,
    pub confirmed: bool,
}

/// An event emitted by a contract, as returned by the provider.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ContractEvent {
    pub from_address: ContractAddress,
    #[serde(default)]
    pub keys: Vec<Felt>,
    #[serde(default)]
    pub data: Vec<Felt>,
    pub block_number: Option<u64>,
    pub transaction_hash: Option<TransactionHash>,
}

/// A bounded, paginated query over a contract's event history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventQuery {
    pub from_block: u64,
    pub to_block: u64,
    pub page_size: u32,
    pub continuation_token: Option<String>,
}

impl EventQuery {
    pub fn range(from_block: u64, to_block: u64, page_size: u32) -> Self {
        EventQuery {
            from_block,
            to_block,
            page_size,
            continuation_token: None,
        }
    }

    /// The last `window` blocks up to and including `latest`.
    pub fn recent(latest: u64, window: u64, page_size: u32) -> Self {
        Self::range(latest.saturating_sub(window), latest, page_size)
    }

    pub fn next_page(&self, continuation_token: String) -> Self {
        EventQuery {
            continuation_token: Some(continuation_token),
            ..self.clone()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct EventPage {
    #[serde(default)]
    pub events: Vec<ContractEvent>,
    pub continuation_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn felt_parses_hex_and_decimal() {
        assert_eq!(Felt::new("0x4").to_u64(), Ok(4));
        assert_eq!(Felt::new("0x0").to_u64(), Ok(0));
        assert_eq!(Felt::new("0x00ff").to_u64(), Ok(255));
        assert_eq!(Felt::new("42").to_u64(), Ok(42));
        assert_eq!(Felt::from_u64(10).as_str(), "0xa");
    }

    #[test]
    fn felt_rejects_garbage_and_overflow() {
        assert_eq!(Felt::new("").to_u64(), Err(FeltError::Empty));
        assert_eq!(
            Felt::new("0xzz").to_u64(),
            Err(FeltError::Invalid("0xzz".into()))
        );
        let big = Felt::new("0x10000000000000000");
        assert_eq!(big.to_u128(), Ok(1 << 64));
        assert_eq!(big.to_u64(), Err(FeltError::Overflow(big.to_string(), 64)));
    }

    #[test]
    fn addresses_are_normalized_and_validated() {
        let address: ContractAddress = " 0xABCdef ".parse().unwrap();
        assert_eq!(address.as_str(), "0xabcdef");
        assert!("abcdef".parse::<AccountAddress>().is_err());
        assert!("0x".parse::<AccountAddress>().is_err());
        assert!("<YOUR_CONTRACT_ADDRESS>".parse::<ContractAddress>().is_err());
        assert!(format!("0x{}", "1".repeat(65)).parse::<TransactionHash>().is_err());
    }

    #[test]
    fn recent_query_never_starts_below_genesis() {
        assert_eq!(EventQuery::recent(50, 1_000, 20), EventQuery::range(0, 50, 20));
        assert_eq!(
            EventQuery::recent(5_000, 1_000, 20),
            EventQuery::range(4_000, 5_000, 20)
        );
    }
}
