use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct ConfigErrorProps {
    pub message: AttrValue,
}

/// Rendered instead of the app when the build carries no usable configuration.
#[function_component(ConfigErrorPage)]
pub fn config_error_page(props: &ConfigErrorProps) -> Html {
    html! {
        <div class="container">
            <h1>{"Starknet Frontend Workshop"}</h1>
            <div class="error-banner">
                <span>{format!("Invalid configuration: {}", props.message)}</span>
            </div>
            <p class="hint">
                {"Set contract_address in config/app.json or build with COUNTER_CONTRACT_ADDRESS."}
            </p>
        </div>
    }
}
