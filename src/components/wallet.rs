use wasm_bindgen::{prelude::*, JsCast};
use yew::prelude::*;

use crate::{
    browser::BrowserWallet,
    types::Session,
    utils::shorten_address,
};

pub struct WalletConnect {
    wallet: Option<BrowserWallet>,
    session: Option<Session>,
    connecting: bool,
    error: Option<String>,
    accounts_changed: Option<Closure<dyn FnMut(JsValue)>>,
}

pub enum Msg {
    Connect,
    Connected(BrowserWallet, Session),
    AccountsChanged,
    Error(String),
}

#[derive(Properties, PartialEq)]
pub struct Props {
    /// Fired on connection and whenever the wallet switches to another account.
    pub on_connect: Callback<BrowserWallet>,
}

impl WalletConnect {
    fn subscribe(&mut self, ctx: &Context<Self>, wallet: &BrowserWallet) {
        let link = ctx.link().clone();
        let closure = Closure::<dyn FnMut(JsValue)>::new(move |_accounts: JsValue| {
            link.send_message(Msg::AccountsChanged)
        });
        wallet.on_accounts_changed(closure.as_ref().unchecked_ref());
        self.accounts_changed = Some(closure);
    }

    fn unsubscribe(&mut self) {
        if let (Some(wallet), Some(closure)) = (&self.wallet, self.accounts_changed.take()) {
            wallet.off_accounts_changed(closure.as_ref().unchecked_ref());
        }
    }
}

impl Component for WalletConnect {
    type Message = Msg;
    type Properties = Props;

    fn create(_ctx: &Context<Self>) -> Self {
        Self {
            wallet: None,
            session: None,
            connecting: false,
            error: None,
            accounts_changed: None,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::Connect => {
                let wallet = match BrowserWallet::detect() {
                    Ok(wallet) => wallet,
                    Err(error) => {
                        log::warn!("{error}");
                        self.error = Some(error.to_string());
                        return true;
                    }
                };
                self.connecting = true;
                let link = ctx.link().clone();
                wasm_bindgen_futures::spawn_local(async move {
                    match wallet.connect().await {
                        Ok(session) => link.send_message(Msg::Connected(wallet, session)),
                        Err(error) => link.send_message(Msg::Error(error.to_string())),
                    }
                });
                true
            }
            Msg::Connected(wallet, session) => {
                log::info!("Wallet connected as {}", session.account);
                self.unsubscribe();
                self.subscribe(ctx, &wallet);
                self.connecting = false;
                self.error = None;
                self.session = Some(session);
                self.wallet = Some(wallet.clone());
                ctx.props().on_connect.emit(wallet);
                true
            }
            Msg::AccountsChanged => {
                let Some(wallet) = &self.wallet else {
                    return false;
                };
                self.session = wallet.session();
                match &self.session {
                    Some(session) => {
                        log::info!("Wallet switched to {}", session.account);
                        ctx.props().on_connect.emit(wallet.clone());
                    }
                    None => log::info!("Wallet disconnected"),
                }
                true
            }
            Msg::Error(error) => {
                log::warn!("Wallet connection failed: {error}");
                self.connecting = false;
                self.error = Some(error);
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let onclick = ctx.link().callback(|_| Msg::Connect);

        html! {
            <div class="wallet-section">
                if let Some(session) = &self.session {
                    <div class="connected-status">
                        {"Wallet Connected"}
                        <div class="wallet-address">
                            {format!("Address: {}", shorten_address(session.account.as_str()))}
                        </div>
                        if let Some(chain_id) = &session.chain_id {
                            <div class="wallet-chain">{format!("Network: {chain_id}")}</div>
                        }
                    </div>
                } else {
                    <button class="connect-button" {onclick} disabled={self.connecting}>
                        if self.connecting {
                            {"Connecting..."}
                        } else {
                            {"Connect Wallet"}
                        }
                    </button>
                }
                if let Some(error) = &self.error {
                    <div class="status-message">{error}</div>
                }
            </div>
        }
    }

    fn destroy(&mut self, _ctx: &Context<Self>) {
        self.unsubscribe();
    }
}
