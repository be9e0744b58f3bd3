use thiserror::Error;

use crate::{
    abi::FunctionKind,
    controller::WriteAction,
    types::{AddressError, FeltError, TransactionHash},
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid {field}: {source}")]
    Address {
        field: &'static str,
        #[source]
        source: AddressError,
    },

    #[error("contract ABI cannot serve {0}: {1}")]
    Abi(&'static str, #[source] GatewayError),

    #[error("explorer host must be a bare host name, got {0:?}")]
    ExplorerHost(String),

    #[error("event page size must be positive")]
    EventPageSize,

    #[error("event page limit must be positive")]
    EventPageLimit,
}

/// Failures of the wallet / RPC provider. The caller treats these as "value unavailable".
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no Starknet wallet was injected into this page")]
    WalletNotFound,

    #[error("the wallet is not connected")]
    NotConnected,

    #[error("the provider rejected the request: {0}")]
    Rejected(String),

    #[error("unexpected provider response: {0}")]
    Malformed(String),

    #[error(transparent)]
    Felt(#[from] FeltError),
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("function {0} is not part of the contract ABI")]
    UnknownFunction(String),

    #[error("function {name} is {found:?}, expected {expected:?}")]
    WrongFunctionKind {
        name: String,
        expected: FunctionKind,
        found: FunctionKind,
    },

    #[error("{0} returned no value")]
    EmptyResult(String),

    #[error("transaction {hash} was reverted: {reason}")]
    Reverted { hash: TransactionHash, reason: String },

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("no wallet session")]
    SessionUnavailable,

    #[error("contract gateway not resolved")]
    GatewayUnavailable,

    #[error("{0} is already in flight")]
    ActionPending(WriteAction),

    #[error("invalid event query: {0}")]
    InvalidQuery(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("contract read failed: {0}")]
    Read(#[source] GatewayError),

    #[error("counter value is not an integer: {0}")]
    Counter(#[from] FeltError),

    #[error("failed to submit {action}: {source}")]
    Submit {
        action: WriteAction,
        #[source]
        source: GatewayError,
    },

    #[error("transaction {hash} failed: {source}")]
    Confirmation {
        hash: TransactionHash,
        #[source]
        source: GatewayError,
    },

    #[error("transaction {0} was not confirmed")]
    NotConfirmed(TransactionHash),
}

impl ControllerError {
    /// Guard failures are silent no-ops and never reach the user.
    pub fn is_guard(&self) -> bool {
        matches!(
            self,
            ControllerError::SessionUnavailable
                | ControllerError::GatewayUnavailable
                | ControllerError::ActionPending(_)
        )
    }
}
