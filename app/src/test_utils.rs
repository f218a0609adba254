//! Shared fixture for module tests: two listed markets mirroring the
//! canonical lending scenario (a $1 asset with no collateral power and a
//! $100 asset counting 50%).

use sails_rs::prelude::*;

use crate::modules::{
    ledger::LedgerModule, market::MarketModule, oracle::OracleModule, risk::RiskModule,
};
use crate::types::*;
use crate::MoneyMarketState;

pub const T0: u64 = 1_700_000_000;
/// 1 whole token = 1e6 base units
pub const UNIT: u128 = USD_SCALE;
pub const MKT_A: &str = "mTKA";
pub const MKT_B: &str = "mTKB";

pub fn actor(n: u64) -> ActorId {
    ActorId::from(n)
}

pub fn admin() -> ActorId {
    actor(1)
}

pub fn user1() -> ActorId {
    actor(2)
}

pub fn user2() -> ActorId {
    actor(3)
}

pub fn zero_rate_model() -> InterestRateModel {
    InterestRateModel::default()
}

pub fn fresh_state() -> MoneyMarketState {
    MoneyMarketState::new(admin())
}

pub fn create_market(st: &mut MoneyMarketState, market_id: &str, underlying: &str) {
    MarketModule::create_market(
        st,
        admin(),
        market_id.into(),
        underlying.into(),
        RATE_SCALE,
        0,
        zero_rate_model(),
        T0,
    )
    .unwrap();
}

/// TKA at $1 with no collateral power, TKB at $100 counting 50%; close
/// factor 50%, liquidation incentive 1.08, 1:1 genesis exchange rates.
pub fn two_market_state() -> MoneyMarketState {
    let mut st = fresh_state();
    create_market(&mut st, MKT_A, "TKA");
    create_market(&mut st, MKT_B, "TKB");
    OracleModule::post_price(&mut st, admin(), "TKA".into(), USD_SCALE, T0).unwrap();
    OracleModule::post_price(&mut st, admin(), "TKB".into(), 100 * USD_SCALE, T0).unwrap();
    RiskModule::support_market(&mut st, admin(), MKT_A).unwrap();
    RiskModule::support_market(&mut st, admin(), MKT_B).unwrap();
    RiskModule::set_collateral_factor(&mut st, admin(), MKT_B, 5_000, T0).unwrap();
    RiskModule::set_close_factor(&mut st, admin(), 5_000).unwrap();
    RiskModule::set_liquidation_incentive(&mut st, admin(), 10_800).unwrap();
    st
}

pub fn fund(st: &mut MoneyMarketState, account: ActorId, asset: &str, amount: u128) {
    LedgerModule::deposit(st, account, asset, amount).unwrap();
}

/// Fund the wallet and mint in one step
pub fn supply(st: &mut MoneyMarketState, account: ActorId, market_id: &str, amount: u128) {
    let underlying = st.markets.get(market_id).unwrap().underlying.clone();
    fund(st, account, &underlying, amount);
    MarketModule::mint(st, account, market_id, amount, T0).unwrap();
}

pub fn enter(st: &mut MoneyMarketState, account: ActorId, market_id: &str) {
    RiskModule::enter_markets(st, account, Vec::from([String::from(market_id)])).unwrap();
}

pub fn borrow(st: &mut MoneyMarketState, account: ActorId, market_id: &str, amount: u128) {
    MarketModule::borrow(st, account, market_id, amount, T0).unwrap();
}

pub fn shares_of(st: &MoneyMarketState, account: ActorId, market_id: &str) -> u128 {
    MarketModule::shares_of(st, account, market_id)
}

pub fn wallet(st: &MoneyMarketState, account: ActorId, asset: &str) -> u128 {
    LedgerModule::balance_of(st, asset, account)
}
