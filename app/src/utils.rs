use primitive_types::U256;
use sails_rs::gstd::exec;
use sails_rs::prelude::{ActorId, H256, Vec};

use crate::errors::Error;

/// Current block time in seconds (Gear block timestamps are milliseconds)
#[inline]
pub fn now() -> u64 {
    exec::block_timestamp() / 1_000
}

/// Canonical key for (account, asset) maps (keccak)
pub fn account_asset_key(account: ActorId, asset: &str) -> H256 {
    use sp_core::hashing::keccak_256;
    let mut data = Vec::new();
    data.extend_from_slice(account.as_ref());
    data.extend_from_slice(asset.as_bytes());
    H256::from(keccak_256(&data))
}

/// `a * b / denom` with a 256-bit intermediate, rounded down
pub fn mul_div(a: u128, b: u128, denom: u128) -> Result<u128, Error> {
    if denom == 0 {
        return Err(Error::MathOverflow);
    }
    let wide = U256::from(a) * U256::from(b) / U256::from(denom);
    if wide > U256::from(u128::MAX) {
        return Err(Error::MathOverflow);
    }
    Ok(wide.as_u128())
}

/// `a * b / denom` with a 256-bit intermediate, rounded up
pub fn mul_div_ceil(a: u128, b: u128, denom: u128) -> Result<u128, Error> {
    if denom == 0 {
        return Err(Error::MathOverflow);
    }
    let denom = U256::from(denom);
    let wide = (U256::from(a) * U256::from(b) + (denom - U256::from(1u8))) / denom;
    if wide > U256::from(u128::MAX) {
        return Err(Error::MathOverflow);
    }
    Ok(wide.as_u128())
}

/// Value of `amount` underlying units at `price` micro-USD per whole token
#[inline]
pub fn usd_value(amount: u128, price: u128) -> Result<u128, Error> {
    mul_div(amount, price, crate::types::USD_SCALE)
}
