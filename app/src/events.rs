use sails_rs::prelude::*;

#[event]
#[derive(Encode, Decode, TypeInfo, Clone, Debug)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub enum MarketEvent {
    Mint { account: ActorId, market: String, underlying_in: u128, shares_out: u128 },
    Redeem { account: ActorId, market: String, shares_in: u128, underlying_out: u128 },
    Borrow { account: ActorId, market: String, amount: u128, account_borrows: u128, total_borrows: u128 },
    RepayBorrow { payer: ActorId, borrower: ActorId, market: String, amount: u128, account_borrows: u128, total_borrows: u128 },
    LiquidateBorrow { liquidator: ActorId, borrower: ActorId, market: String, repay_amount: u128, collateral_market: String, seized_shares: u128 },
    SharesTransferred { market: String, from: ActorId, to: ActorId, shares: u128 },
    InterestAccrued { market: String, interest_accumulated: u128, borrow_index: u128, total_borrows: u128 },
    MarketEntered { account: ActorId, market: String },
    MarketExited { account: ActorId, market: String },
    ReservesAdded { market: String, payer: ActorId, amount: u128, total_reserves: u128 },
}

#[event]
#[derive(Encode, Decode, TypeInfo, Clone, Debug)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub enum AdminEvent {
    MarketCreated { market_id: String, underlying: String },
    MarketListed { market_id: String },
    CollateralFactorUpdated { market_id: String, old_bps: u16, new_bps: u16 },
    CloseFactorUpdated { old_bps: u16, new_bps: u16 },
    LiquidationIncentiveUpdated { old_bps: u16, new_bps: u16 },
    RateModelUpdated { market_id: String },
    ReserveFactorUpdated { market_id: String, old_bps: u16, new_bps: u16 },
    ReservesReduced { market_id: String, amount: u128, total_reserves: u128 },
    OracleConfigUpdated { max_age_seconds: u64 },
    KeeperAdded { keeper: ActorId },
    KeeperRemoved { keeper: ActorId },
}

#[event]
#[derive(Encode, Decode, TypeInfo, Clone, Debug)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub enum OracleEvent {
    PricePosted { underlying: String, price: u128, timestamp: u64 },
}
