use std::{fmt::Display, future::Future, rc::Rc};

use yew::prelude::*;

use crate::{
    browser::{BrowserGateway, BrowserProvider, BrowserWallet},
    components::{action_form::ActionForm, panel::Panel, wallet::WalletConnect},
    config::AppConfig,
    controller::{CounterController, TransactionLink, TransactionStatus, ViewState, WriteAction},
    error::ControllerError,
};

type Controller = CounterController<BrowserProvider, BrowserGateway>;

#[derive(Properties, PartialEq)]
pub struct Props {
    pub config: Rc<AppConfig>,
}

pub struct App {
    controller: Option<Controller>,
    state: ViewState,
}

pub enum Msg {
    WalletConnected(BrowserWallet),
    StateChanged,
    RetryReads,
    DismissError,
    RefreshCounter,
    IncreaseCounter,
    ResetCounter,
    FetchEvents,
}

impl App {
    /// Runs an action in the background. Failures are already logged and shown by the
    /// controller; guard failures are silent.
    fn run<F, Fut, T>(&self, action: F)
    where
        F: FnOnce(Controller) -> Fut,
        Fut: Future<Output = Result<T, ControllerError>> + 'static,
    {
        let Some(controller) = self.controller.clone() else {
            log::debug!("Ignoring action: no wallet connected");
            return;
        };
        let task = action(controller);
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(error) = task.await {
                log::debug!("Action ended early: {error}");
            }
        });
    }

    fn controller_for(&mut self, ctx: &Context<Self>, wallet: BrowserWallet) -> Controller {
        self.controller
            .get_or_insert_with(|| build_controller(ctx, wallet))
            .clone()
    }

    fn view_transaction(link: &TransactionLink) -> Html {
        let status = match &link.status {
            TransactionStatus::Pending => "pending".to_owned(),
            TransactionStatus::Confirmed => "confirmed".to_owned(),
            TransactionStatus::Failed(reason) => format!("failed: {reason}"),
        };
        html! {
            <p class="transaction">
                <a href={link.url.clone()} target="_blank" rel="noreferrer">
                    {"View Transaction"}
                </a>
                <span class="transaction-status">{format!(" ({status})")}</span>
            </p>
        }
    }
}

fn build_controller(ctx: &Context<App>, wallet: BrowserWallet) -> Controller {
    let config = &ctx.props().config;
    let link = ctx.link().clone();
    CounterController::new(
        Rc::new(BrowserProvider::new(wallet.clone(), config)),
        Some(Rc::new(BrowserGateway::new(wallet, config))),
        config.explorer_host.as_str(),
    )
    .with_listener(Rc::new(move || link.send_message(Msg::StateChanged)))
}

fn or_loading<T: Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map_or_else(|| "Loading...".to_owned(), ToString::to_string)
}

impl Component for App {
    type Message = Msg;
    type Properties = Props;

    fn create(ctx: &Context<Self>) -> Self {
        // The block number can be read as soon as a wallet is injected, before it connects.
        let controller = match BrowserWallet::detect() {
            Ok(wallet) => {
                let controller = build_controller(ctx, wallet);
                let reads = controller.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    reads.initialize_reads().await.ok();
                });
                Some(controller)
            }
            Err(error) => {
                log::info!("{error}; waiting for the user to connect");
                None
            }
        };
        Self {
            controller,
            state: ViewState::default(),
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::WalletConnected(wallet) => {
                let controller = self.controller_for(ctx, wallet);
                wasm_bindgen_futures::spawn_local(async move {
                    controller.initialize_reads().await.ok();
                });
                false
            }
            Msg::StateChanged => {
                let Some(controller) = &self.controller else {
                    return false;
                };
                let state = controller.state();
                let changed = state != self.state;
                self.state = state;
                changed
            }
            Msg::RetryReads => {
                if let Some(controller) = &self.controller {
                    controller.dismiss_error();
                }
                self.run(|controller| async move { controller.initialize_reads().await });
                self.run(|controller| async move { controller.fetch_counter().await });
                false
            }
            Msg::DismissError => {
                if let Some(controller) = &self.controller {
                    controller.dismiss_error();
                }
                false
            }
            Msg::RefreshCounter => {
                self.run(|controller| async move { controller.fetch_counter().await });
                false
            }
            Msg::IncreaseCounter => {
                self.run(|controller| async move { controller.increase_counter().await });
                false
            }
            Msg::ResetCounter => {
                self.run(|controller| async move { controller.reset_counter().await });
                false
            }
            Msg::FetchEvents => {
                let events = ctx.props().config.events.clone();
                self.run(move |controller| async move {
                    controller
                        .fetch_recent_events(events.window, events.page_size, events.max_pages)
                        .await
                });
                false
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let link = ctx.link();
        let state = &self.state;

        html! {
            <div class="container">
                <h1>{"Starknet Frontend Workshop"}</h1>
                if let Some(error) = &state.error {
                    <div class="error-banner">
                        <span>{error.message.clone()}</span>
                        if error.retryable {
                            <button onclick={link.callback(|_| Msg::RetryReads)}>{"Retry"}</button>
                        }
                        <button onclick={link.callback(|_| Msg::DismissError)}>{"Dismiss"}</button>
                    </div>
                }
                <div class="columns">
                    <div class="column">
                        <Panel title="Wallet Connection">
                            <WalletConnect on_connect={link.callback(Msg::WalletConnected)} />
                        </Panel>
                        <Panel title="Read the Blockchain">
                            <p>{format!("Current Block: {}", or_loading(&state.block_number))}</p>
                        </Panel>
                        <Panel title="Your Balance">
                            <p>{format!("Balance: {}", or_loading(&state.balance))}</p>
                        </Panel>
                        <ActionForm
                            title="Reset Counter"
                            label="Reset Counter"
                            pending={state.is_pending(WriteAction::Reset)}
                            on_submit={link.callback(|()| Msg::ResetCounter)}
                        >
                            if let Some(transaction) = &state.last_transaction {
                                {Self::view_transaction(transaction)}
                            }
                        </ActionForm>
                    </div>
                    <div class="column">
                        <ActionForm
                            title="Contract Counter"
                            label="Refresh"
                            on_submit={link.callback(|()| Msg::RefreshCounter)}
                        >
                            <p>{format!("Counter: {}", or_loading(&state.counter))}</p>
                        </ActionForm>
                        <ActionForm
                            title="Increase Counter"
                            label="Increase"
                            pending={state.is_pending(WriteAction::Increase)}
                            on_submit={link.callback(|()| Msg::IncreaseCounter)}
                        />
                        <ActionForm
                            title="Fetch Contract Events"
                            label="Fetch Events"
                            on_submit={link.callback(|()| Msg::FetchEvents)}
                        />
                    </div>
                </div>
            </div>
        }
    }
}
