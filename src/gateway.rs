use crate::{
    error::GatewayError,
    types::{AccountAddress, ContractAddress, Felt, TransactionHash, TransactionReceipt},
};

/// Reads from and writes to one contract.
#[allow(async_fn_in_trait)]
pub trait ContractGateway {
    type Transaction: PendingTransaction;

    fn address(&self) -> &ContractAddress;

    /// Calls a view function and returns its raw outputs.
    async fn call(&self, function: &str) -> Result<Vec<Felt>, GatewayError>;

    /// Submits a transaction invoking an external function from `from`.
    async fn invoke(
        &self,
        function: &str,
        from: &AccountAddress,
    ) -> Result<Self::Transaction, GatewayError>;
}

/// A submitted transaction. The hash is known up front; confirmation is awaited.
#[allow(async_fn_in_trait)]
pub trait PendingTransaction {
    fn hash(&self) -> &TransactionHash;

    async fn wait(self) -> Result<TransactionReceipt, GatewayError>;
}
