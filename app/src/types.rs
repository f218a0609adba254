use sails_rs::{collections::BTreeMap, prelude::*};

/// Fixed-point USD type (micro-USD, 1e6)
pub type Usd = u128;
/// 1 USD = 1_000_000 micro-USD
pub const USD_SCALE: u128 = 1_000_000;

/// Fixed-point scale for borrow indexes, exchange rates and per-second
/// interest rates (1e18). A borrow index of `RATE_SCALE` is 1.0.
pub const RATE_SCALE: u128 = 1_000_000_000_000_000_000;

/// Sentinel repay amount meaning "repay the full outstanding balance"
pub const REPAY_MAX: u128 = u128::MAX;

/// Hard cap on any market's collateral factor (90%)
pub const MAX_COLLATERAL_FACTOR_BPS: u16 = 9_000;

/// One lending market's ledger: share supply, cash, borrows, reserves and
/// accrual state for a single underlying asset.
#[derive(Encode, Decode, TypeInfo, Clone, Debug)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct Market {
    /// Symbol of the wrapped underlying asset (oracle and wallet key)
    pub underlying: String,
    /// Outstanding share-token supply
    pub total_shares: u128,
    /// Underlying held by the market
    pub total_cash: u128,
    /// Sum of all borrow balances at the current borrow index
    pub total_borrows: u128,
    /// Protocol-retained interest, in underlying units
    pub total_reserves: u128,
    /// Cumulative interest per unit borrowed (RATE_SCALE, 1.0 at genesis)
    pub borrow_index: u128,
    /// Timestamp (seconds) of the last interest accrual
    pub accrual_timestamp: u64,
    /// Shares:underlying ratio used while total_shares == 0 (RATE_SCALE)
    pub initial_exchange_rate: u128,
    /// Share of accrued interest routed to reserves, in bps
    pub reserve_factor_bps: u16,
    pub rate_model: InterestRateModel,
}

/// A borrower's principal snapshot. Current owed amount is
/// `principal * market.borrow_index / interest_index`.
#[derive(Encode, Decode, TypeInfo, Clone, Debug)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct BorrowSnapshot {
    pub principal: u128,
    /// Market borrow index at the time of the last borrow/repay
    pub interest_index: u128,
}

/// Risk-policy entry for a listed market
#[derive(Encode, Decode, TypeInfo, Clone, Debug)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct MarketPolicy {
    pub listed: bool,
    /// Fraction of supplied value counted as borrowing capacity, in bps
    pub collateral_factor_bps: u16,
}

/// Per-market interest rate curve: annual rates in bps, linear up to the
/// utilization kink, steeper (jump) slope above it.
#[derive(Encode, Decode, TypeInfo, Clone, Debug, Default)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct InterestRateModel {
    pub base_rate_bps: u128,
    pub multiplier_bps: u128,
    pub jump_multiplier_bps: u128,
    pub kink_bps: u128,
}

#[derive(Encode, Decode, TypeInfo, Clone, Debug)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct OracleConfig {
    pub max_age_seconds: u64,
}

/// Posted underlying prices in micro-USD per whole token (1e6 base units),
/// keyed by underlying symbol.
#[derive(Encode, Decode, TypeInfo, Clone, Debug)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct OracleState {
    pub prices: BTreeMap<String, u128>,
    pub timestamps: BTreeMap<String, u64>,
    pub config: OracleConfig,
}

/// One account's position in one market, as seen by views
#[derive(Encode, Decode, TypeInfo, Clone, Debug)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct AccountPosition {
    pub shares: u128,
    /// Borrow balance at the stored borrow index
    pub owed: u128,
    pub exchange_rate: u128,
}
