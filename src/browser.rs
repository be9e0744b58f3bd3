//! Collaborators backed by the Starknet wallet injected into the page at `window.starknet`
//! (Argent X, Braavos and other get-starknet compatible extensions).

use std::rc::Rc;

use gloo_utils::format::JsValueSerdeExt;
use serde::{Deserialize, Serialize};
use wasm_bindgen::{prelude::*, JsCast};

use crate::{
    abi::{ContractAbi, FunctionKind},
    config::AppConfig,
    error::{GatewayError, ProviderError},
    gateway::{ContractGateway, PendingTransaction},
    provider::ConnectionProvider,
    types::{
        AccountAddress, ContractAddress, EventPage, EventQuery, Felt, Session, TransactionHash,
        TransactionReceipt,
    },
    utils::format_units,
};

/// Decimals of the fee token.
const FEE_TOKEN_DECIMALS: u32 = 18;

pub const ACCOUNTS_CHANGED: &str = "accountsChanged";

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(typescript_type = "StarknetWindowObject")]
    #[derive(Clone)]
    pub type StarknetWindowObject;

    #[wasm_bindgen(catch, method)]
    async fn enable(this: &StarknetWindowObject) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, getter, js_name = selectedAddress)]
    fn selected_address(this: &StarknetWindowObject) -> Option<String>;

    #[wasm_bindgen(method, getter, js_name = chainId)]
    fn chain_id(this: &StarknetWindowObject) -> Option<String>;

    #[wasm_bindgen(method, getter)]
    fn provider(this: &StarknetWindowObject) -> StarknetProvider;

    #[wasm_bindgen(method, getter)]
    fn account(this: &StarknetWindowObject) -> StarknetAccount;

    #[wasm_bindgen(method)]
    fn on(this: &StarknetWindowObject, event: &str, handler: &js_sys::Function);

    #[wasm_bindgen(method)]
    fn off(this: &StarknetWindowObject, event: &str, handler: &js_sys::Function);

    pub type StarknetProvider;

    #[wasm_bindgen(catch, method, js_name = getBlockNumber)]
    async fn get_block_number(this: &StarknetProvider) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, method, js_name = callContract)]
    async fn call_contract(this: &StarknetProvider, call: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, method, js_name = getEvents)]
    async fn get_events(this: &StarknetProvider, filter: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, method, js_name = waitForTransaction)]
    async fn wait_for_transaction(this: &StarknetProvider, hash: &str)
        -> Result<JsValue, JsValue>;

    pub type StarknetAccount;

    #[wasm_bindgen(catch, method)]
    async fn execute(this: &StarknetAccount, calls: JsValue) -> Result<JsValue, JsValue>;
}

impl From<JsValue> for ProviderError {
    fn from(value: JsValue) -> Self {
        let message = value
            .dyn_ref::<js_sys::Error>()
            .map(|error| String::from(error.message()))
            .or_else(|| value.as_string())
            .unwrap_or_else(|| format!("{value:?}"));
        ProviderError::Rejected(message)
    }
}

fn malformed(error: impl ToString) -> ProviderError {
    ProviderError::Malformed(error.to_string())
}

fn string_field(value: &JsValue, key: &str) -> Option<String> {
    js_sys::Reflect::get(value, &JsValue::from_str(key))
        .ok()
        .and_then(|field| field.as_string())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Call<'a> {
    contract_address: &'a str,
    entrypoint: &'a str,
    calldata: Vec<String>,
}

/// starknet.js returns a bare array since v5 and `{ result }` before that.
#[derive(Deserialize)]
#[serde(untagged)]
enum CallResponse {
    Outputs(Vec<Felt>),
    Wrapped { result: Vec<Felt> },
}

impl CallResponse {
    fn into_outputs(self) -> Vec<Felt> {
        match self {
            CallResponse::Outputs(outputs) | CallResponse::Wrapped { result: outputs } => outputs,
        }
    }
}

#[derive(Serialize)]
struct BlockId {
    block_number: u64,
}

#[derive(Serialize)]
struct EventFilter<'a> {
    address: &'a str,
    from_block: BlockId,
    to_block: BlockId,
    chunk_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    continuation_token: Option<&'a str>,
}

async fn call_contract(
    provider: &StarknetProvider,
    contract: &ContractAddress,
    entrypoint: &str,
    calldata: Vec<String>,
) -> Result<Vec<Felt>, ProviderError> {
    let call = JsValue::from_serde(&Call {
        contract_address: contract.as_str(),
        entrypoint,
        calldata,
    })
    .map_err(malformed)?;
    let response: CallResponse = provider
        .call_contract(call)
        .await?
        .into_serde()
        .map_err(malformed)?;
    Ok(response.into_outputs())
}

/// The injected wallet object.
#[derive(Clone)]
pub struct BrowserWallet {
    starknet: StarknetWindowObject,
}

impl BrowserWallet {
    pub fn detect() -> Result<Self, ProviderError> {
        let window: web_sys::Window = gloo_utils::window();
        let starknet = js_sys::Reflect::get(&window, &JsValue::from_str("starknet"))?;
        if starknet.is_undefined() || starknet.is_null() {
            return Err(ProviderError::WalletNotFound);
        }
        Ok(BrowserWallet {
            starknet: starknet.unchecked_into(),
        })
    }

    /// Asks the user to connect and returns the selected account.
    pub async fn connect(&self) -> Result<Session, ProviderError> {
        self.starknet.enable().await?;
        self.session().ok_or(ProviderError::NotConnected)
    }

    pub fn session(&self) -> Option<Session> {
        let address = self.starknet.selected_address()?;
        let account = match address.parse::<AccountAddress>() {
            Ok(account) => account,
            Err(error) => {
                log::warn!("Ignoring wallet account: {error}");
                return None;
            }
        };
        Some(Session {
            account,
            chain_id: self.starknet.chain_id(),
        })
    }

    pub fn on_accounts_changed(&self, handler: &js_sys::Function) {
        self.starknet.on(ACCOUNTS_CHANGED, handler);
    }

    pub fn off_accounts_changed(&self, handler: &js_sys::Function) {
        self.starknet.off(ACCOUNTS_CHANGED, handler);
    }
}

pub struct BrowserProvider {
    wallet: BrowserWallet,
    fee_token: ContractAddress,
}

impl BrowserProvider {
    pub fn new(wallet: BrowserWallet, config: &AppConfig) -> Self {
        BrowserProvider {
            wallet,
            fee_token: config.fee_token_address.clone(),
        }
    }
}

impl ConnectionProvider for BrowserProvider {
    fn session(&self) -> Option<Session> {
        self.wallet.session()
    }

    async fn block_number(&self) -> Result<u64, ProviderError> {
        let value = self.wallet.starknet.provider().get_block_number().await?;
        value
            .as_f64()
            .filter(|number| *number >= 0.0 && number.fract() == 0.0)
            .map(|number| number as u64)
            .ok_or_else(|| malformed(format!("block number {value:?}")))
    }

    async fn balance(&self, account: &AccountAddress) -> Result<String, ProviderError> {
        let outputs = call_contract(
            &self.wallet.starknet.provider(),
            &self.fee_token,
            "balanceOf",
            vec![account.to_string()],
        )
        .await?;
        // Uint256 as (low, high).
        let low = outputs
            .first()
            .ok_or_else(|| malformed("empty balanceOf result"))?
            .to_u128()?;
        let high = outputs.get(1).map(Felt::to_u128).transpose()?.unwrap_or(0);
        if high != 0 {
            return Err(malformed(format!("balance high word {high} is not supported")));
        }
        Ok(format_units(low, FEE_TOKEN_DECIMALS))
    }

    async fn past_events(
        &self,
        contract: &ContractAddress,
        query: &EventQuery,
    ) -> Result<EventPage, ProviderError> {
        let filter = JsValue::from_serde(&EventFilter {
            address: contract.as_str(),
            from_block: BlockId {
                block_number: query.from_block,
            },
            to_block: BlockId {
                block_number: query.to_block,
            },
            chunk_size: query.page_size,
            continuation_token: query.continuation_token.as_deref(),
        })
        .map_err(malformed)?;
        self.wallet
            .starknet
            .provider()
            .get_events(filter)
            .await?
            .into_serde()
            .map_err(malformed)
    }
}

pub struct BrowserGateway {
    wallet: BrowserWallet,
    address: ContractAddress,
    abi: Rc<ContractAbi>,
}

impl BrowserGateway {
    pub fn new(wallet: BrowserWallet, config: &AppConfig) -> Self {
        BrowserGateway {
            wallet,
            address: config.contract_address.clone(),
            abi: Rc::new(config.abi.clone()),
        }
    }
}

impl ContractGateway for BrowserGateway {
    type Transaction = BrowserTransaction;

    fn address(&self) -> &ContractAddress {
        &self.address
    }

    async fn call(&self, function: &str) -> Result<Vec<Felt>, GatewayError> {
        self.abi.ensure(function, FunctionKind::View)?;
        let provider = self.wallet.starknet.provider();
        Ok(call_contract(&provider, &self.address, function, Vec::new()).await?)
    }

    async fn invoke(
        &self,
        function: &str,
        from: &AccountAddress,
    ) -> Result<BrowserTransaction, GatewayError> {
        self.abi.ensure(function, FunctionKind::External)?;
        let session = self.wallet.session().ok_or(ProviderError::NotConnected)?;
        if &session.account != from {
            return Err(ProviderError::Rejected(format!(
                "wallet account {} is not the sender {from}",
                session.account
            ))
            .into());
        }

        let calls = JsValue::from_serde(&[Call {
            contract_address: self.address.as_str(),
            entrypoint: function,
            calldata: Vec::new(),
        }])
        .map_err(malformed)?;
        let response = self
            .wallet
            .starknet
            .account()
            .execute(calls)
            .await
            .map_err(ProviderError::from)?;
        let hash = string_field(&response, "transaction_hash")
            .ok_or_else(|| malformed("execute returned no transaction hash"))?
            .parse::<TransactionHash>()
            .map_err(malformed)?;

        Ok(BrowserTransaction {
            hash,
            provider: self.wallet.starknet.provider(),
        })
    }
}

pub struct BrowserTransaction {
    hash: TransactionHash,
    provider: StarknetProvider,
}

impl PendingTransaction for BrowserTransaction {
    fn hash(&self) -> &TransactionHash {
        &self.hash
    }

    async fn wait(self) -> Result<TransactionReceipt, GatewayError> {
        let receipt = self
            .provider
            .wait_for_transaction(self.hash.as_str())
            .await
            .map_err(ProviderError::from)?;

        if string_field(&receipt, "execution_status").as_deref() == Some("REVERTED") {
            let reason = string_field(&receipt, "revert_reason")
                .unwrap_or_else(|| "no reason given".to_owned());
            return Err(GatewayError::Reverted {
                hash: self.hash,
                reason,
            });
        }
        let confirmed = !matches!(
            string_field(&receipt, "finality_status").as_deref(),
            Some("RECEIVED" | "REJECTED")
        );
        Ok(TransactionReceipt {
            hash: self.hash,
            confirmed,
        })
    }
}
