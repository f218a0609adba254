#![no_std]

#[cfg(target_arch = "wasm32")]
pub use vara_money_market_app::wasm::*;
