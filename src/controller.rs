//! The view-model behind the counter page.
//!
//! [`CounterController`] owns the page's [`ViewState`] and runs the user actions against a
//! [`ConnectionProvider`] and a [`ContractGateway`]. It is cheap to clone: clones share the
//! same state, so an action can be moved into a spawned future while the component keeps
//! rendering from its own handle.

use std::{
    cell::RefCell,
    collections::{BTreeSet, HashSet},
    fmt,
    rc::Rc,
};

use crate::{
    abi::{GET_COUNTER, INCREASE_COUNTER, RESET_COUNTER},
    error::{ControllerError, GatewayError},
    gateway::{ContractGateway, PendingTransaction},
    provider::ConnectionProvider,
    types::{ContractEvent, EventPage, EventQuery, TransactionHash, TransactionReceipt},
    utils::transaction_url,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WriteAction {
    Increase,
    Reset,
}

impl WriteAction {
    pub fn entrypoint(self) -> &'static str {
        match self {
            WriteAction::Increase => INCREASE_COUNTER,
            WriteAction::Reset => RESET_COUNTER,
        }
    }
}

impl fmt::Display for WriteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.entrypoint())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionStatus {
    Pending,
    Confirmed,
    Failed(String),
}

/// The explorer link for the most recently submitted transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionLink {
    pub hash: TransactionHash,
    pub url: String,
    pub status: TransactionStatus,
}

/// A failure shown on the page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageError {
    pub message: String,
    /// Whether re-running the page's reads can clear it.
    pub retryable: bool,
}

/// Everything the page renders. Read values only ever go from `None` to `Some`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewState {
    pub block_number: Option<u64>,
    pub balance: Option<String>,
    pub counter: Option<u64>,
    pub last_transaction: Option<TransactionLink>,
    pub pending: BTreeSet<WriteAction>,
    pub error: Option<PageError>,
}

impl ViewState {
    pub fn is_pending(&self, action: WriteAction) -> bool {
        self.pending.contains(&action)
    }
}

/// Called after every state change.
pub type Listener = Rc<dyn Fn()>;

pub struct CounterController<P, G> {
    provider: Rc<P>,
    gateway: Option<Rc<G>>,
    explorer_host: Rc<str>,
    state: Rc<RefCell<ViewState>>,
    listener: Option<Listener>,
}

impl<P, G> Clone for CounterController<P, G> {
    fn clone(&self) -> Self {
        CounterController {
            provider: Rc::clone(&self.provider),
            gateway: self.gateway.clone(),
            explorer_host: Rc::clone(&self.explorer_host),
            state: Rc::clone(&self.state),
            listener: self.listener.clone(),
        }
    }
}

impl<P, G> CounterController<P, G>
where
    P: ConnectionProvider,
    G: ContractGateway,
{
    pub fn new(provider: Rc<P>, gateway: Option<Rc<G>>, explorer_host: impl Into<Rc<str>>) -> Self {
        CounterController {
            provider,
            gateway,
            explorer_host: explorer_host.into(),
            state: Rc::default(),
            listener: None,
        }
    }

    pub fn with_listener(mut self, listener: Listener) -> Self {
        self.listener = Some(listener);
        self
    }

    /// A snapshot of the current state.
    pub fn state(&self) -> ViewState {
        self.state.borrow().clone()
    }

    pub fn dismiss_error(&self) {
        self.update(|state| state.error = None);
    }

    /// Reads the block number and, once an account is connected, its balance.
    ///
    /// Each value is stored as soon as it arrives; a failed read leaves its field as it was
    /// and is reported. Returns the first failure, if any.
    pub async fn initialize_reads(&self) -> Result<(), ControllerError> {
        let block = match self.provider.block_number().await {
            Ok(number) => {
                self.update(|state| state.block_number = Some(number));
                Ok(())
            }
            Err(error) => Err(self.fail_read("Could not read the block number", error.into())),
        };

        let Some(session) = self.provider.session() else {
            return block;
        };
        let balance = match self.provider.balance(&session.account).await {
            Ok(balance) => {
                self.update(|state| state.balance = Some(balance));
                Ok(())
            }
            Err(error) => Err(self.fail_read("Could not read the balance", error.into())),
        };

        block.and(balance)
    }

    /// Reads `get_counter` and stores the first returned value.
    pub async fn fetch_counter(&self) -> Result<u64, ControllerError> {
        let gateway = self
            .gateway
            .as_ref()
            .ok_or(ControllerError::GatewayUnavailable)?;

        let result: Result<u64, ControllerError> = async {
            let values = gateway
                .call(GET_COUNTER)
                .await
                .map_err(ControllerError::Read)?;
            let value = values.first().ok_or_else(|| {
                ControllerError::Read(GatewayError::EmptyResult(GET_COUNTER.to_owned()))
            })?;
            Ok(value.to_u64()?)
        }
        .await;

        match result {
            Ok(counter) => {
                log::debug!("Counter is {counter}");
                self.update(|state| state.counter = Some(counter));
                Ok(counter)
            }
            Err(error) => Err(self.fail_read("Could not read the counter", error)),
        }
    }

    pub async fn increase_counter(&self) -> Result<TransactionReceipt, ControllerError> {
        self.submit(WriteAction::Increase).await
    }

    pub async fn reset_counter(&self) -> Result<TransactionReceipt, ControllerError> {
        self.submit(WriteAction::Reset).await
    }

    /// Submits `action`, publishes its explorer link, waits for confirmation and then
    /// refreshes the counter once.
    async fn submit(&self, action: WriteAction) -> Result<TransactionReceipt, ControllerError> {
        let session = self
            .provider
            .session()
            .ok_or(ControllerError::SessionUnavailable)?;
        let gateway = self
            .gateway
            .as_ref()
            .ok_or(ControllerError::GatewayUnavailable)?;
        let _pending = PendingGuard::acquire(self, action)?;

        let transaction = match gateway.invoke(action.entrypoint(), &session.account).await {
            Ok(transaction) => transaction,
            Err(source) => {
                return Err(self.fail(
                    "Transaction was not submitted",
                    ControllerError::Submit { action, source },
                ))
            }
        };

        let hash = transaction.hash().clone();
        log::info!("Submitted {action} as {hash}");
        let url = transaction_url(&self.explorer_host, &hash);
        self.update(|state| {
            state.last_transaction = Some(TransactionLink {
                hash: hash.clone(),
                url,
                status: TransactionStatus::Pending,
            })
        });

        match transaction.wait().await {
            Ok(receipt) if receipt.confirmed => {
                log::info!("Transaction {hash} confirmed");
                self.set_status(&hash, TransactionStatus::Confirmed);
                // A failed refresh is already reported and leaves the old value.
                self.fetch_counter().await.ok();
                Ok(receipt)
            }
            Ok(receipt) => {
                self.set_status(&hash, TransactionStatus::Failed("not confirmed".to_owned()));
                Err(self.fail(
                    "Transaction failed",
                    ControllerError::NotConfirmed(receipt.hash),
                ))
            }
            Err(source) => {
                self.set_status(&hash, TransactionStatus::Failed(source.to_string()));
                Err(self.fail(
                    "Transaction failed",
                    ControllerError::Confirmation { hash, source },
                ))
            }
        }
    }

    /// Fetches one page of the contract's events. The events only go to the log.
    pub async fn fetch_events(&self, query: &EventQuery) -> Result<EventPage, ControllerError> {
        let gateway = self.event_context()?;
        if query.page_size == 0 {
            return Err(ControllerError::InvalidQuery(
                "page size must be positive".to_owned(),
            ));
        }
        if query.from_block > query.to_block {
            return Err(ControllerError::InvalidQuery(format!(
                "block {} is after block {}",
                query.from_block, query.to_block
            )));
        }

        let page = self
            .provider
            .past_events(gateway.address(), query)
            .await
            .map_err(|error| self.fail("Could not fetch contract events", error.into()))?;
        log::info!(
            "Contract events in blocks {}..={}: {:?}",
            query.from_block,
            query.to_block,
            page.events
        );
        Ok(page)
    }

    /// Fetches the events of the last `window` blocks, following continuation tokens for at
    /// most `max_pages` pages. Stops early on a token the provider already handed out.
    pub async fn fetch_recent_events(
        &self,
        window: u64,
        page_size: u32,
        max_pages: u32,
    ) -> Result<Vec<ContractEvent>, ControllerError> {
        self.event_context()?;
        if max_pages == 0 {
            return Err(ControllerError::InvalidQuery(
                "page limit must be positive".to_owned(),
            ));
        }
        let latest = self
            .provider
            .block_number()
            .await
            .map_err(|error| self.fail("Could not read the block number", error.into()))?;
        self.update(|state| state.block_number = Some(latest));

        let mut query = EventQuery::recent(latest, window, page_size);
        let mut seen_tokens = HashSet::new();
        let mut events = Vec::new();
        for page_number in 1..=max_pages {
            let page = self.fetch_events(&query).await?;
            events.extend(page.events);
            let Some(token) = page.continuation_token else {
                break;
            };
            if !seen_tokens.insert(token.clone()) {
                log::warn!("Provider repeated continuation token {token}; stopping");
                break;
            }
            if page_number == max_pages {
                log::warn!("More events remain after {max_pages} pages; stopping");
                break;
            }
            query = query.next_page(token);
        }
        log::info!(
            "Fetched {} contract events from blocks {}..={latest}",
            events.len(),
            query.from_block
        );
        Ok(events)
    }

    fn event_context(&self) -> Result<&Rc<G>, ControllerError> {
        self.provider
            .session()
            .ok_or(ControllerError::SessionUnavailable)?;
        self.gateway
            .as_ref()
            .ok_or(ControllerError::GatewayUnavailable)
    }

    fn set_status(&self, hash: &TransactionHash, status: TransactionStatus) {
        self.update(|state| {
            if let Some(link) = state.last_transaction.as_mut().filter(|link| &link.hash == hash) {
                link.status = status;
            }
        });
    }

    /// Like [`Self::fail`], for failures that re-running the page's reads can clear.
    fn fail_read(&self, context: &str, error: ControllerError) -> ControllerError {
        self.report(context, error, true)
    }

    fn fail(&self, context: &str, error: ControllerError) -> ControllerError {
        self.report(context, error, false)
    }

    /// Logs `error` and, unless it is a guard, shows it on the page.
    fn report(&self, context: &str, error: ControllerError, retryable: bool) -> ControllerError {
        if error.is_guard() {
            log::debug!("{context}: {error}");
        } else {
            log::warn!("{context}: {error}");
            let message = format!("{context}: {error}");
            self.update(|state| state.error = Some(PageError { message, retryable }));
        }
        error
    }

    fn update(&self, change: impl FnOnce(&mut ViewState)) {
        change(&mut self.state.borrow_mut());
        self.notify();
    }

    fn notify(&self) {
        if let Some(listener) = &self.listener {
            listener();
        }
    }
}

/// Marks a write action as in flight until dropped, so a pending action cannot be
/// started twice. Dropping also covers futures abandoned mid-flight.
struct PendingGuard {
    action: WriteAction,
    state: Rc<RefCell<ViewState>>,
    listener: Option<Listener>,
}

impl PendingGuard {
    fn acquire<P, G>(
        controller: &CounterController<P, G>,
        action: WriteAction,
    ) -> Result<Self, ControllerError> {
        if !controller.state.borrow_mut().pending.insert(action) {
            return Err(ControllerError::ActionPending(action));
        }
        if let Some(listener) = &controller.listener {
            listener();
        }
        Ok(PendingGuard {
            action,
            state: Rc::clone(&controller.state),
            listener: controller.listener.clone(),
        })
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.state.borrow_mut().pending.remove(&self.action);
        if let Some(listener) = &self.listener {
            listener();
        }
    }
}
