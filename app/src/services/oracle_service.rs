use sails_rs::{gstd::msg, prelude::*};

use crate::{
    errors::Error, events::OracleEvent, modules::oracle::OracleModule, utils, MoneyMarketState,
};

/// Price feed surface: admin and keepers post, anyone reads
#[derive(Default)]
pub struct OracleService;

impl OracleService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[service(events = OracleEvent)]
impl OracleService {
    #[export]
    pub fn post_price(&mut self, underlying: String, price: u128) -> Result<(), Error> {
        let now = utils::now();
        OracleModule::post_price(
            MoneyMarketState::get_mut(),
            msg::source(),
            underlying.clone(),
            price,
            now,
        )?;
        self.emit_event(OracleEvent::PricePosted {
            underlying,
            price,
            timestamp: now,
        })
        .expect("event emission failed");
        Ok(())
    }

    /// Current usable price; stale or missing prices are errors, not zeros
    #[export]
    pub fn get_price(&self, underlying: String) -> Result<u128, Error> {
        OracleModule::price_of(MoneyMarketState::get(), &underlying, utils::now())
    }

    #[export]
    pub fn last_update(&self, underlying: String) -> Option<u64> {
        OracleModule::last_update(MoneyMarketState::get(), &underlying)
    }
}
