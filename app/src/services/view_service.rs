use sails_rs::{gstd::msg, prelude::*};

use crate::{
    errors::Error,
    modules::{interest::InterestModule, market::MarketModule, risk::RiskModule},
    types::*,
    utils, MoneyMarketState,
};

/// Read-only surface over stored state. Liquidity views run on stored
/// indexes; state-changing operations always re-accrue before deciding.
#[derive(Default)]
pub struct ViewService;

impl ViewService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[service]
impl ViewService {
    #[export]
    pub fn market(&self, market_id: String) -> Result<Market, Error> {
        MoneyMarketState::get()
            .markets
            .get(&market_id)
            .cloned()
            .ok_or(Error::MarketNotFound)
    }

    #[export]
    pub fn exchange_rate(&self, market_id: String) -> Result<u128, Error> {
        let st = MoneyMarketState::get();
        let market = st.markets.get(&market_id).ok_or(Error::MarketNotFound)?;
        MarketModule::exchange_rate(market)
    }

    #[export]
    pub fn account_snapshot(
        &self,
        market_id: String,
        account: ActorId,
    ) -> Result<AccountPosition, Error> {
        let st = MoneyMarketState::get();
        let market = st.markets.get(&market_id).ok_or(Error::MarketNotFound)?;
        Ok(AccountPosition {
            shares: MarketModule::shares_of(st, account, &market_id),
            owed: MarketModule::borrow_balance_stored(st, account, &market_id)?,
            exchange_rate: MarketModule::exchange_rate(market)?,
        })
    }

    #[export]
    pub fn borrow_balance(&self, market_id: String, account: ActorId) -> Result<u128, Error> {
        MarketModule::borrow_balance_stored(MoneyMarketState::get(), account, &market_id)
    }

    #[export]
    pub fn supply_shares(&self, market_id: String, account: ActorId) -> u128 {
        MarketModule::shares_of(MoneyMarketState::get(), account, &market_id)
    }

    #[export]
    pub fn account_liquidity(&self, account: ActorId) -> Result<(Usd, Usd), Error> {
        RiskModule::hypothetical_liquidity_stored(
            MoneyMarketState::get(),
            account,
            None,
            0,
            0,
            utils::now(),
        )
    }

    /// Liquidity as it would stand after removing `redeem_shares` and
    /// borrowing `borrow_amount` in `market_id`
    #[export]
    pub fn hypothetical_liquidity(
        &self,
        account: ActorId,
        market_id: String,
        redeem_shares: u128,
        borrow_amount: u128,
    ) -> Result<(Usd, Usd), Error> {
        RiskModule::hypothetical_liquidity_stored(
            MoneyMarketState::get(),
            account,
            Some(&market_id),
            redeem_shares,
            borrow_amount,
            utils::now(),
        )
    }

    #[export]
    pub fn borrow_rate_per_second(&self, market_id: String) -> Result<u128, Error> {
        let st = MoneyMarketState::get();
        let market = st.markets.get(&market_id).ok_or(Error::MarketNotFound)?;
        InterestModule::borrow_rate_per_second(
            &market.rate_model,
            market.total_cash,
            market.total_borrows,
            market.total_reserves,
        )
    }

    #[export]
    pub fn supply_rate_per_second(&self, market_id: String) -> Result<u128, Error> {
        let st = MoneyMarketState::get();
        let market = st.markets.get(&market_id).ok_or(Error::MarketNotFound)?;
        InterestModule::supply_rate_per_second(
            &market.rate_model,
            market.total_cash,
            market.total_borrows,
            market.total_reserves,
            market.reserve_factor_bps,
        )
    }

    #[export]
    pub fn collateral_factor(&self, market_id: String) -> Result<u16, Error> {
        MoneyMarketState::get()
            .policies
            .get(&market_id)
            .map(|policy| policy.collateral_factor_bps)
            .ok_or(Error::MarketNotListed)
    }

    #[export]
    pub fn close_factor(&self) -> u16 {
        MoneyMarketState::get().close_factor_bps
    }

    #[export]
    pub fn liquidation_incentive(&self) -> u16 {
        MoneyMarketState::get().liquidation_incentive_bps
    }

    #[export]
    pub fn entered_markets(&self, account: ActorId) -> Vec<String> {
        MoneyMarketState::get()
            .memberships
            .get(&account)
            .cloned()
            .unwrap_or_default()
    }

    #[export]
    pub fn my_entered_markets(&self) -> Vec<String> {
        self.entered_markets(msg::source())
    }
}
