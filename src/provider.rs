use crate::{
    error::ProviderError,
    types::{AccountAddress, ContractAddress, EventPage, EventQuery, Session},
};

/// Wallet, account and network access. Owns the [`Session`]; callers only read it.
#[allow(async_fn_in_trait)]
pub trait ConnectionProvider {
    /// The connected account, if any.
    fn session(&self) -> Option<Session>;

    async fn block_number(&self) -> Result<u64, ProviderError>;

    /// The account's balance as a decimal string.
    async fn balance(&self, account: &AccountAddress) -> Result<String, ProviderError>;

    /// One page of events emitted by `contract` within the query's block range.
    async fn past_events(
        &self,
        contract: &ContractAddress,
        query: &EventQuery,
    ) -> Result<EventPage, ProviderError>;
}
