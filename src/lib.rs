use std::rc::Rc;

use wasm_bindgen::prelude::*;

pub mod abi;
mod app;
pub mod browser;
mod components;
pub mod config;
pub mod controller;
pub mod error;
pub mod gateway;
pub mod provider;
pub mod types;
pub mod utils;

#[wasm_bindgen(start)]
pub fn run_app() -> Result<(), JsValue> {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    wasm_logger::init(wasm_logger::Config::default());

    match config::AppConfig::load() {
        Ok(config) => {
            log::info!("Using counter contract {}", config.contract_address);
            yew::Renderer::<app::App>::with_props(app::Props {
                config: Rc::new(config),
            })
            .render();
        }
        Err(error) => {
            log::error!("Invalid configuration: {error}");
            yew::Renderer::<components::config_error::ConfigErrorPage>::with_props(
                components::config_error::ConfigErrorProps {
                    message: error.to_string().into(),
                },
            )
            .render();
        }
    }
    Ok(())
}
