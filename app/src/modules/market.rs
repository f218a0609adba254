use sails_rs::prelude::*;

use crate::{
    errors::Error,
    modules::{interest::InterestModule, ledger::LedgerModule, risk::RiskModule},
    types::*,
    utils, MoneyMarketState,
};

/// Outcome of one interest accrual, for event reporting
#[derive(Clone, Debug, Default)]
pub struct Accrual {
    pub interest_accumulated: u128,
    pub borrow_index: u128,
    pub total_borrows: u128,
}

/// Per-market ledger operations. Every balance-changing entry point runs
/// accrual first, asks the RiskModule for approval, and computes every
/// derived amount before its first mutation so a rejected operation leaves
/// the ledger untouched.
pub struct MarketModule;

impl MarketModule {
    /// Create a market ledger (admin only). Listing it for use is a
    /// separate RiskModule step.
    pub fn create_market(
        st: &mut MoneyMarketState,
        caller: ActorId,
        market_id: String,
        underlying: String,
        initial_exchange_rate: u128,
        reserve_factor_bps: u16,
        rate_model: InterestRateModel,
        now: u64,
    ) -> Result<(), Error> {
        if !st.is_admin(caller) {
            return Err(Error::Unauthorized);
        }
        if st.markets.contains_key(&market_id) {
            return Err(Error::MarketAlreadyExists);
        }
        if initial_exchange_rate == 0 || reserve_factor_bps > 10_000 {
            return Err(Error::InvalidParameter);
        }
        st.markets.insert(
            market_id,
            Market {
                underlying,
                total_shares: 0,
                total_cash: 0,
                total_borrows: 0,
                total_reserves: 0,
                borrow_index: RATE_SCALE,
                accrual_timestamp: now,
                initial_exchange_rate,
                reserve_factor_bps,
                rate_model,
            },
        );
        Ok(())
    }

    /// Underlying per share, RATE_SCALE-scaled
    pub fn exchange_rate(market: &Market) -> Result<u128, Error> {
        if market.total_shares == 0 {
            return Ok(market.initial_exchange_rate);
        }
        let pool = market
            .total_cash
            .saturating_add(market.total_borrows)
            .saturating_sub(market.total_reserves);
        utils::mul_div(pool, RATE_SCALE, market.total_shares)
    }

    pub fn shares_of(st: &MoneyMarketState, account: ActorId, market_id: &str) -> u128 {
        st.supplies
            .get(&utils::account_asset_key(account, market_id))
            .copied()
            .unwrap_or(0)
    }

    /// Borrow balance at the stored borrow index; owed amounts round
    /// against the borrower.
    pub fn borrow_balance_stored(
        st: &MoneyMarketState,
        account: ActorId,
        market_id: &str,
    ) -> Result<u128, Error> {
        let market = st.markets.get(market_id).ok_or(Error::MarketNotFound)?;
        match st.borrows.get(&utils::account_asset_key(account, market_id)) {
            Some(snapshot) => utils::mul_div_ceil(
                snapshot.principal,
                market.borrow_index,
                snapshot.interest_index,
            ),
            None => Ok(0),
        }
    }

    /// Accrue interest since the last accrual. Idempotent per timestamp;
    /// returns `None` when nothing elapsed. A rate-model rejection leaves
    /// the market untouched.
    pub fn accrue_interest(
        st: &mut MoneyMarketState,
        market_id: &str,
        now: u64,
    ) -> Result<Option<Accrual>, Error> {
        let market = st.markets.get_mut(market_id).ok_or(Error::MarketNotFound)?;
        if now <= market.accrual_timestamp {
            return Ok(None);
        }
        let elapsed = (now - market.accrual_timestamp) as u128;

        let rate = InterestModule::borrow_rate_per_second(
            &market.rate_model,
            market.total_cash,
            market.total_borrows,
            market.total_reserves,
        )?;
        let simple_factor = rate.checked_mul(elapsed).ok_or(Error::MathOverflow)?;
        let interest = utils::mul_div(market.total_borrows, simple_factor, RATE_SCALE)?;
        let reserve_cut = utils::mul_div(interest, market.reserve_factor_bps as u128, 10_000)?;
        let index_delta = utils::mul_div(market.borrow_index, simple_factor, RATE_SCALE)?;

        market.total_borrows = market.total_borrows.saturating_add(interest);
        market.total_reserves = market.total_reserves.saturating_add(reserve_cut);
        market.borrow_index = market.borrow_index.saturating_add(index_delta);
        market.accrual_timestamp = now;

        Ok(Some(Accrual {
            interest_accumulated: interest,
            borrow_index: market.borrow_index,
            total_borrows: market.total_borrows,
        }))
    }

    /// Deposit underlying for freshly minted shares, rounded down: shares
    /// never overrepresent the deposited value.
    pub fn mint(
        st: &mut MoneyMarketState,
        account: ActorId,
        market_id: &str,
        amount: u128,
        now: u64,
    ) -> Result<u128, Error> {
        if amount == 0 {
            return Err(Error::InvalidParameter);
        }
        Self::accrue_interest(st, market_id, now)?;
        RiskModule::mint_allowed(st, market_id)?;

        let market = st.markets.get(market_id).ok_or(Error::MarketNotFound)?;
        let exchange_rate = Self::exchange_rate(market)?;
        let underlying = market.underlying.clone();
        let shares = utils::mul_div(amount, RATE_SCALE, exchange_rate)?;
        if shares == 0 {
            // a deposit too small for one share would be absorbed by the pool
            return Err(Error::InvalidParameter);
        }

        LedgerModule::pull(st, &underlying, account, amount)?;

        let market = st.markets.get_mut(market_id).ok_or(Error::MarketNotFound)?;
        market.total_cash = market.total_cash.saturating_add(amount);
        market.total_shares = market.total_shares.saturating_add(shares);
        let held = st
            .supplies
            .entry(utils::account_asset_key(account, market_id))
            .or_insert(0);
        *held = held.saturating_add(shares);
        Ok(shares)
    }

    /// Burn an exact number of shares for underlying (rounded down)
    pub fn redeem(
        st: &mut MoneyMarketState,
        account: ActorId,
        market_id: &str,
        shares: u128,
        now: u64,
    ) -> Result<u128, Error> {
        if shares == 0 {
            return Err(Error::InvalidParameter);
        }
        Self::accrue_interest(st, market_id, now)?;
        let market = st.markets.get(market_id).ok_or(Error::MarketNotFound)?;
        let exchange_rate = Self::exchange_rate(market)?;
        let underlying_out = utils::mul_div(shares, exchange_rate, RATE_SCALE)?;
        Self::redeem_internal(st, account, market_id, shares, underlying_out, now)?;
        Ok(underlying_out)
    }

    /// Withdraw an exact underlying amount; the shares burned for it round
    /// up so a payout never burns fewer shares than it is worth.
    pub fn redeem_underlying(
        st: &mut MoneyMarketState,
        account: ActorId,
        market_id: &str,
        amount: u128,
        now: u64,
    ) -> Result<u128, Error> {
        if amount == 0 {
            return Err(Error::InvalidParameter);
        }
        Self::accrue_interest(st, market_id, now)?;
        let market = st.markets.get(market_id).ok_or(Error::MarketNotFound)?;
        let exchange_rate = Self::exchange_rate(market)?;
        let shares = utils::mul_div_ceil(amount, RATE_SCALE, exchange_rate)?;
        Self::redeem_internal(st, account, market_id, shares, amount, now)?;
        Ok(shares)
    }

    fn redeem_internal(
        st: &mut MoneyMarketState,
        account: ActorId,
        market_id: &str,
        shares: u128,
        underlying_out: u128,
        now: u64,
    ) -> Result<(), Error> {
        let key = utils::account_asset_key(account, market_id);
        let held = st.supplies.get(&key).copied().unwrap_or(0);
        if shares > held {
            return Err(Error::InsufficientShares);
        }
        RiskModule::redeem_allowed(st, account, market_id, shares, now)?;

        let market = st.markets.get(market_id).ok_or(Error::MarketNotFound)?;
        if market.total_cash < underlying_out {
            // the pool's cash is lent out; policy had no objection but the
            // transfer itself cannot be honored
            return Err(Error::TransferFailed);
        }
        let underlying = market.underlying.clone();

        let market = st.markets.get_mut(market_id).ok_or(Error::MarketNotFound)?;
        market.total_cash -= underlying_out;
        market.total_shares = market.total_shares.saturating_sub(shares);
        if held == shares {
            st.supplies.remove(&key);
        } else {
            st.supplies.insert(key, held - shares);
        }
        LedgerModule::push(st, &underlying, account, underlying_out)
    }

    pub fn borrow(
        st: &mut MoneyMarketState,
        account: ActorId,
        market_id: &str,
        amount: u128,
        now: u64,
    ) -> Result<(u128, u128), Error> {
        if amount == 0 {
            return Err(Error::InvalidParameter);
        }
        Self::accrue_interest(st, market_id, now)?;
        RiskModule::borrow_allowed(st, account, market_id, amount, now)?;

        let market = st.markets.get(market_id).ok_or(Error::MarketNotFound)?;
        if market.total_cash < amount {
            return Err(Error::InsufficientCash);
        }
        let underlying = market.underlying.clone();
        let borrow_index = market.borrow_index;

        // owed-interest catch-up folds into the new principal
        let owed = Self::borrow_balance_stored(st, account, market_id)?;
        let account_borrows = owed.checked_add(amount).ok_or(Error::MathOverflow)?;

        st.borrows.insert(
            utils::account_asset_key(account, market_id),
            BorrowSnapshot {
                principal: account_borrows,
                interest_index: borrow_index,
            },
        );
        let market = st.markets.get_mut(market_id).ok_or(Error::MarketNotFound)?;
        market.total_borrows = market.total_borrows.saturating_add(amount);
        market.total_cash -= amount;
        let total_borrows = market.total_borrows;

        LedgerModule::push(st, &underlying, account, amount)?;
        Ok((account_borrows, total_borrows))
    }

    /// Repay `borrower`'s debt from `payer`'s wallet. `REPAY_MAX` repays
    /// the full owed amount; anything above owed without the sentinel is
    /// rejected.
    pub fn repay_borrow(
        st: &mut MoneyMarketState,
        payer: ActorId,
        borrower: ActorId,
        market_id: &str,
        amount: u128,
        now: u64,
    ) -> Result<(u128, u128, u128), Error> {
        Self::accrue_interest(st, market_id, now)?;
        RiskModule::repay_allowed(st, market_id)?;

        let owed = Self::borrow_balance_stored(st, borrower, market_id)?;
        let actual = if amount == REPAY_MAX { owed } else { amount };
        if actual > owed {
            return Err(Error::RepayTooMuch);
        }
        if actual == 0 {
            return Err(Error::InvalidParameter);
        }

        let underlying = st
            .markets
            .get(market_id)
            .ok_or(Error::MarketNotFound)?
            .underlying
            .clone();
        LedgerModule::pull(st, &underlying, payer, actual)?;
        let remaining = Self::apply_repay(st, borrower, market_id, owed, actual)?;
        let total_borrows = st
            .markets
            .get(market_id)
            .ok_or(Error::MarketNotFound)?
            .total_borrows;
        Ok((actual, remaining, total_borrows))
    }

    /// Repay an under-collateralized borrower's debt and seize a bonus-
    /// weighted slice of their collateral shares. Both markets are accrued
    /// and every amount is validated before the first mutation.
    pub fn liquidate_borrow(
        st: &mut MoneyMarketState,
        liquidator: ActorId,
        borrower: ActorId,
        borrow_market: &str,
        repay_amount: u128,
        collateral_market: &str,
        now: u64,
    ) -> Result<(u128, u128), Error> {
        if liquidator == borrower {
            return Err(Error::InvalidParameter);
        }
        if repay_amount == 0 || repay_amount == REPAY_MAX {
            return Err(Error::InvalidParameter);
        }
        Self::accrue_interest(st, borrow_market, now)?;
        Self::accrue_interest(st, collateral_market, now)?;

        RiskModule::liquidate_allowed(
            st,
            borrow_market,
            collateral_market,
            borrower,
            repay_amount,
            now,
        )?;
        let seize_shares = RiskModule::liquidate_calculate_seize(
            st,
            borrow_market,
            collateral_market,
            repay_amount,
            now,
        )?;
        if seize_shares > Self::shares_of(st, borrower, collateral_market) {
            return Err(Error::SeizeTooMuch);
        }

        // repay leg, funded by the liquidator. The close-factor cap keeps
        // repay_amount within the owed balance.
        let owed = Self::borrow_balance_stored(st, borrower, borrow_market)?;
        let underlying = st
            .markets
            .get(borrow_market)
            .ok_or(Error::MarketNotFound)?
            .underlying
            .clone();
        LedgerModule::pull(st, &underlying, liquidator, repay_amount)?;
        Self::apply_repay(st, borrower, borrow_market, owed, repay_amount)?;

        // collateral leg
        Self::seize(
            st,
            collateral_market,
            borrow_market,
            liquidator,
            borrower,
            seize_shares,
        )?;
        Ok((repay_amount, seize_shares))
    }

    /// Move seized collateral shares borrower -> liquidator. Total share
    /// supply is unchanged.
    pub fn seize(
        st: &mut MoneyMarketState,
        collateral_market: &str,
        borrow_market: &str,
        liquidator: ActorId,
        borrower: ActorId,
        shares: u128,
    ) -> Result<(), Error> {
        RiskModule::seize_allowed(st, collateral_market, borrow_market)?;

        let borrower_key = utils::account_asset_key(borrower, collateral_market);
        let held = st.supplies.get(&borrower_key).copied().unwrap_or(0);
        if shares > held {
            return Err(Error::SeizeTooMuch);
        }
        if held == shares {
            st.supplies.remove(&borrower_key);
        } else {
            st.supplies.insert(borrower_key, held - shares);
        }
        let to = st
            .supplies
            .entry(utils::account_asset_key(liquidator, collateral_market))
            .or_insert(0);
        *to = to.saturating_add(shares);
        Ok(())
    }

    /// Move shares between accounts, guarded like a redemption on the
    /// sender's side. Receiving shares does not enter the receiver into
    /// the market.
    pub fn transfer_shares(
        st: &mut MoneyMarketState,
        from: ActorId,
        to: ActorId,
        market_id: &str,
        shares: u128,
        now: u64,
    ) -> Result<(), Error> {
        if shares == 0 || from == to {
            return Err(Error::InvalidParameter);
        }
        RiskModule::transfer_allowed(st, from, market_id, shares, now)?;

        let from_key = utils::account_asset_key(from, market_id);
        let held = st.supplies.get(&from_key).copied().unwrap_or(0);
        if shares > held {
            return Err(Error::InsufficientShares);
        }
        if held == shares {
            st.supplies.remove(&from_key);
        } else {
            st.supplies.insert(from_key, held - shares);
        }
        let receiver = st
            .supplies
            .entry(utils::account_asset_key(to, market_id))
            .or_insert(0);
        *receiver = receiver.saturating_add(shares);
        Ok(())
    }

    /// Donate underlying into the reserve pot (open to anyone)
    pub fn add_reserves(
        st: &mut MoneyMarketState,
        payer: ActorId,
        market_id: &str,
        amount: u128,
        now: u64,
    ) -> Result<u128, Error> {
        if amount == 0 {
            return Err(Error::InvalidParameter);
        }
        Self::accrue_interest(st, market_id, now)?;
        let underlying = st
            .markets
            .get(market_id)
            .ok_or(Error::MarketNotFound)?
            .underlying
            .clone();
        LedgerModule::pull(st, &underlying, payer, amount)?;
        let market = st.markets.get_mut(market_id).ok_or(Error::MarketNotFound)?;
        market.total_cash = market.total_cash.saturating_add(amount);
        market.total_reserves = market.total_reserves.saturating_add(amount);
        Ok(market.total_reserves)
    }

    /// Withdraw accumulated reserves to the admin, bounded by both the
    /// reserve pot and available cash.
    pub fn reduce_reserves(
        st: &mut MoneyMarketState,
        caller: ActorId,
        market_id: &str,
        amount: u128,
        now: u64,
    ) -> Result<u128, Error> {
        if !st.is_admin(caller) {
            return Err(Error::Unauthorized);
        }
        if amount == 0 {
            return Err(Error::InvalidParameter);
        }
        Self::accrue_interest(st, market_id, now)?;
        let market = st.markets.get(market_id).ok_or(Error::MarketNotFound)?;
        if amount > market.total_reserves {
            return Err(Error::InvalidParameter);
        }
        if amount > market.total_cash {
            return Err(Error::InsufficientCash);
        }
        let underlying = market.underlying.clone();

        let market = st.markets.get_mut(market_id).ok_or(Error::MarketNotFound)?;
        market.total_reserves -= amount;
        market.total_cash -= amount;
        let remaining = market.total_reserves;
        LedgerModule::push(st, &underlying, caller, amount)?;
        Ok(remaining)
    }

    /// Swap the market's rate curve (admin only); accrues at the old curve
    /// first so no elapsed time is repriced.
    pub fn set_rate_model(
        st: &mut MoneyMarketState,
        caller: ActorId,
        market_id: &str,
        rate_model: InterestRateModel,
        now: u64,
    ) -> Result<(), Error> {
        if !st.is_admin(caller) {
            return Err(Error::Unauthorized);
        }
        Self::accrue_interest(st, market_id, now)?;
        let market = st.markets.get_mut(market_id).ok_or(Error::MarketNotFound)?;
        market.rate_model = rate_model;
        Ok(())
    }

    /// Returns the previous factor
    pub fn set_reserve_factor(
        st: &mut MoneyMarketState,
        caller: ActorId,
        market_id: &str,
        new_bps: u16,
        now: u64,
    ) -> Result<u16, Error> {
        if !st.is_admin(caller) {
            return Err(Error::Unauthorized);
        }
        if new_bps > 10_000 {
            return Err(Error::InvalidParameter);
        }
        Self::accrue_interest(st, market_id, now)?;
        let market = st.markets.get_mut(market_id).ok_or(Error::MarketNotFound)?;
        let old_bps = market.reserve_factor_bps;
        market.reserve_factor_bps = new_bps;
        Ok(old_bps)
    }

    fn apply_repay(
        st: &mut MoneyMarketState,
        borrower: ActorId,
        market_id: &str,
        owed: u128,
        amount: u128,
    ) -> Result<u128, Error> {
        let remaining = owed.checked_sub(amount).ok_or(Error::MathOverflow)?;
        let borrow_index = st
            .markets
            .get(market_id)
            .ok_or(Error::MarketNotFound)?
            .borrow_index;

        let key = utils::account_asset_key(borrower, market_id);
        if remaining == 0 {
            st.borrows.remove(&key);
        } else {
            st.borrows.insert(
                key,
                BorrowSnapshot {
                    principal: remaining,
                    interest_index: borrow_index,
                },
            );
        }
        let market = st.markets.get_mut(market_id).ok_or(Error::MarketNotFound)?;
        market.total_borrows = market.total_borrows.saturating_sub(amount);
        market.total_cash = market.total_cash.saturating_add(amount);
        Ok(remaining)
    }
}
