use wasm_bindgen::prelude::*;

use crate::types::TransactionHash;

/// Shortens a long hex string to `0x1234...abcd`. Short inputs are returned unchanged.
#[wasm_bindgen]
pub fn shorten_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 14 {
        return address.to_owned();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// The block explorer page of a transaction.
pub fn transaction_url(explorer_host: &str, hash: &TransactionHash) -> String {
    format!("https://{explorer_host}/tx/{hash}")
}

/// Renders a fixed-point integer amount as a decimal string, trimming trailing zeros.
pub fn format_units(amount: u128, decimals: u32) -> String {
    let Some(scale) = 10u128.checked_pow(decimals) else {
        return format!("0.{amount:0>width$}", width = decimals as usize)
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_owned();
    };
    let whole = amount / scale;
    let fraction = amount % scale;
    if fraction == 0 {
        return whole.to_string();
    }
    let fraction = format!("{fraction:0>width$}", width = decimals as usize);
    format!("{whole}.{}", fraction.trim_end_matches('0'))
}
