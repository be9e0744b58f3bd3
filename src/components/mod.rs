pub mod action_form;
pub mod config_error;
pub mod panel;
pub mod wallet;
