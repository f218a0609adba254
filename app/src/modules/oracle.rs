use sails_rs::{collections::BTreeMap, prelude::*};

use crate::{errors::Error, types::*, MoneyMarketState};

impl OracleState {
    pub fn new() -> Self {
        Self {
            prices: BTreeMap::new(),
            timestamps: BTreeMap::new(),
            config: OracleConfig {
                max_age_seconds: 3_600,
            },
        }
    }
}

pub struct OracleModule;

impl OracleModule {
    /// Post a price for an underlying (admin or keeper). Prices are
    /// micro-USD per whole token; zero is not a price.
    pub fn post_price(
        st: &mut MoneyMarketState,
        caller: ActorId,
        underlying: String,
        price: u128,
        now: u64,
    ) -> Result<(), Error> {
        if !st.is_admin(caller) && !st.is_keeper(caller) {
            return Err(Error::NotKeeper);
        }
        if price == 0 {
            return Err(Error::InvalidParameter);
        }
        st.oracle.prices.insert(underlying.clone(), price);
        st.oracle.timestamps.insert(underlying, now);
        Ok(())
    }

    /// Current price of an underlying. Missing or zero prices and prices
    /// older than the configured max age fail closed: every liquidity
    /// decision depending on this lookup aborts rather than treating the
    /// asset as worthless.
    pub fn price_of(st: &MoneyMarketState, underlying: &str, now: u64) -> Result<u128, Error> {
        let price = st
            .oracle
            .prices
            .get(underlying)
            .copied()
            .ok_or(Error::PriceNotAvailable)?;
        if price == 0 {
            return Err(Error::PriceNotAvailable);
        }
        let posted = st
            .oracle
            .timestamps
            .get(underlying)
            .copied()
            .ok_or(Error::PriceNotAvailable)?;
        if now.saturating_sub(posted) > st.oracle.config.max_age_seconds {
            return Err(Error::PriceStale);
        }
        Ok(price)
    }

    pub fn last_update(st: &MoneyMarketState, underlying: &str) -> Option<u64> {
        st.oracle.timestamps.get(underlying).copied()
    }

    pub fn set_config(
        st: &mut MoneyMarketState,
        caller: ActorId,
        config: OracleConfig,
    ) -> Result<(), Error> {
        if !st.is_admin(caller) {
            return Err(Error::Unauthorized);
        }
        st.oracle.config = config;
        Ok(())
    }
}
