use sails_rs::prelude::*;

use crate::{
    errors::Error,
    modules::{market::MarketModule, oracle::OracleModule},
    types::*,
    utils, MoneyMarketState,
};

/// Global risk policy: market listing, collateral factors, the close
/// factor and liquidation incentive, account memberships, and the
/// account-wide liquidity computation every allow/reject decision is
/// built on. Markets never mutate policy state; policy never touches a
/// market's ledger except through accrual.
pub struct RiskModule;

impl RiskModule {
    // ---- account liquidity ----

    /// `(liquidity, shortfall)` in micro-USD; exactly one side is nonzero
    /// unless both are zero.
    pub fn account_liquidity(
        st: &mut MoneyMarketState,
        account: ActorId,
        now: u64,
    ) -> Result<(Usd, Usd), Error> {
        Self::hypothetical_liquidity(st, account, None, 0, 0, now)
    }

    /// Account liquidity with one simulated delta applied to `target`:
    /// `redeem_shares` removed from its collateral and/or `borrow_amount`
    /// added to its debt. Accrues every entered market first so the fold
    /// runs on current indexes.
    pub fn hypothetical_liquidity(
        st: &mut MoneyMarketState,
        account: ActorId,
        target: Option<&str>,
        redeem_shares: u128,
        borrow_amount: u128,
        now: u64,
    ) -> Result<(Usd, Usd), Error> {
        let entered = st.memberships.get(&account).cloned().unwrap_or_default();
        for market_id in &entered {
            MarketModule::accrue_interest(st, market_id, now)?;
        }
        Self::hypothetical_liquidity_stored(st, account, target, redeem_shares, borrow_amount, now)
    }

    /// The liquidity fold over stored indexes. Any entered market with an
    /// unusable price aborts the whole computation: an account holding an
    /// unpriceable asset cannot pass a check that depends on its value.
    pub fn hypothetical_liquidity_stored(
        st: &MoneyMarketState,
        account: ActorId,
        target: Option<&str>,
        redeem_shares: u128,
        borrow_amount: u128,
        now: u64,
    ) -> Result<(Usd, Usd), Error> {
        let mut collateral: Usd = 0;
        let mut debt: Usd = 0;

        let entered = match st.memberships.get(&account) {
            Some(entered) => entered,
            None => return Ok((0, 0)),
        };

        for market_id in entered {
            let market = st.markets.get(market_id).ok_or(Error::MarketNotFound)?;
            let policy = st.policies.get(market_id).ok_or(Error::MarketNotListed)?;
            let price = OracleModule::price_of(st, &market.underlying, now)?;
            let exchange_rate = MarketModule::exchange_rate(market)?;

            let discounted_share_value = |shares: u128| -> Result<Usd, Error> {
                let underlying_units = utils::mul_div(shares, exchange_rate, RATE_SCALE)?;
                let value = utils::usd_value(underlying_units, price)?;
                utils::mul_div(value, policy.collateral_factor_bps as u128, 10_000)
            };

            let shares = st
                .supplies
                .get(&utils::account_asset_key(account, market_id))
                .copied()
                .unwrap_or(0);
            let owed = MarketModule::borrow_balance_stored(st, account, market_id)?;

            collateral = collateral.saturating_add(discounted_share_value(shares)?);
            debt = debt.saturating_add(utils::usd_value(owed, price)?);

            if target == Some(market_id.as_str()) {
                // simulated share removal counts against the account the
                // same way new debt does
                debt = debt.saturating_add(discounted_share_value(redeem_shares)?);
                debt = debt.saturating_add(utils::usd_value(borrow_amount, price)?);
            }
        }

        if collateral >= debt {
            Ok((collateral - debt, 0))
        } else {
            Ok((0, debt - collateral))
        }
    }

    // ---- permission hooks ----

    pub fn mint_allowed(st: &MoneyMarketState, market_id: &str) -> Result<(), Error> {
        Self::require_listed(st, market_id)
    }

    pub fn repay_allowed(st: &MoneyMarketState, market_id: &str) -> Result<(), Error> {
        Self::require_listed(st, market_id)
    }

    /// A redemption is blocked outright, not merely discouraged, whenever
    /// the account would come out of it with a shortfall.
    pub fn redeem_allowed(
        st: &mut MoneyMarketState,
        account: ActorId,
        market_id: &str,
        shares: u128,
        now: u64,
    ) -> Result<(), Error> {
        Self::require_listed(st, market_id)?;
        // supply in a market the account never entered backs no borrow
        if !Self::is_member(st, account, market_id) {
            return Ok(());
        }
        let (_, shortfall) =
            Self::hypothetical_liquidity(st, account, Some(market_id), shares, 0, now)?;
        if shortfall > 0 {
            return Err(Error::InsufficientLiquidity);
        }
        Ok(())
    }

    /// Share transfers move collateral out just like a redemption
    pub fn transfer_allowed(
        st: &mut MoneyMarketState,
        from: ActorId,
        market_id: &str,
        shares: u128,
        now: u64,
    ) -> Result<(), Error> {
        Self::redeem_allowed(st, from, market_id, shares, now)
    }

    pub fn borrow_allowed(
        st: &mut MoneyMarketState,
        account: ActorId,
        market_id: &str,
        amount: u128,
        now: u64,
    ) -> Result<(), Error> {
        Self::require_listed(st, market_id)?;
        // borrowing implies membership: the debt must be visible to every
        // future liquidity check on this account
        let entered = st.memberships.entry(account).or_insert_with(Vec::new);
        if !entered.iter().any(|m| m == market_id) {
            entered.push(market_id.into());
        }
        let (_, shortfall) =
            Self::hypothetical_liquidity(st, account, Some(market_id), 0, amount, now)?;
        if shortfall > 0 {
            return Err(Error::InsufficientLiquidity);
        }
        Ok(())
    }

    /// Liquidation requires a current, not hypothetical, shortfall, and a
    /// repayment within the close-factor cap.
    pub fn liquidate_allowed(
        st: &mut MoneyMarketState,
        borrow_market: &str,
        collateral_market: &str,
        borrower: ActorId,
        repay_amount: u128,
        now: u64,
    ) -> Result<(), Error> {
        Self::require_listed(st, borrow_market)?;
        Self::require_listed(st, collateral_market)?;

        let (_, shortfall) = Self::account_liquidity(st, borrower, now)?;
        if shortfall == 0 {
            return Err(Error::NoShortfall);
        }

        let owed = MarketModule::borrow_balance_stored(st, borrower, borrow_market)?;
        let max_close = utils::mul_div(owed, st.close_factor_bps as u128, 10_000)?;
        if repay_amount > max_close {
            return Err(Error::TooMuchRepay);
        }
        Ok(())
    }

    pub fn seize_allowed(
        st: &MoneyMarketState,
        collateral_market: &str,
        borrow_market: &str,
    ) -> Result<(), Error> {
        Self::require_listed(st, collateral_market)?;
        Self::require_listed(st, borrow_market)
    }

    /// Shares seized for repaying `repay_amount` of the borrowed asset:
    /// `repay * price_borrowed * incentive / (price_collateral *
    /// exchange_rate_collateral)`, rounded down at each step.
    pub fn liquidate_calculate_seize(
        st: &MoneyMarketState,
        borrow_market: &str,
        collateral_market: &str,
        repay_amount: u128,
        now: u64,
    ) -> Result<u128, Error> {
        let borrowed = st.markets.get(borrow_market).ok_or(Error::MarketNotFound)?;
        let collateral = st
            .markets
            .get(collateral_market)
            .ok_or(Error::MarketNotFound)?;
        let price_borrowed = OracleModule::price_of(st, &borrowed.underlying, now)?;
        let price_collateral = OracleModule::price_of(st, &collateral.underlying, now)?;
        let exchange_rate = MarketModule::exchange_rate(collateral)?;

        let repaid_usd = utils::usd_value(repay_amount, price_borrowed)?;
        let seize_usd =
            utils::mul_div(repaid_usd, st.liquidation_incentive_bps as u128, 10_000)?;
        let seize_underlying = utils::mul_div(seize_usd, USD_SCALE, price_collateral)?;
        utils::mul_div(seize_underlying, RATE_SCALE, exchange_rate)
    }

    // ---- membership ----

    pub fn enter_markets(
        st: &mut MoneyMarketState,
        account: ActorId,
        market_ids: Vec<String>,
    ) -> Result<Vec<String>, Error> {
        for market_id in &market_ids {
            Self::require_listed(st, market_id)?;
        }
        let entered = st.memberships.entry(account).or_insert_with(Vec::new);
        let mut added = Vec::new();
        for market_id in market_ids {
            if !entered.iter().any(|m| *m == market_id) {
                entered.push(market_id.clone());
                added.push(market_id);
            }
        }
        Ok(added)
    }

    /// Leaving a market stops its supply counting as collateral. Blocked
    /// while the account still owes in it, or while the account's other
    /// positions cannot carry the debt alone.
    pub fn exit_market(
        st: &mut MoneyMarketState,
        account: ActorId,
        market_id: &str,
        now: u64,
    ) -> Result<(), Error> {
        MarketModule::accrue_interest(st, market_id, now)?;
        let owed = MarketModule::borrow_balance_stored(st, account, market_id)?;
        if owed > 0 {
            return Err(Error::NonzeroBorrowBalance);
        }
        if !Self::is_member(st, account, market_id) {
            return Ok(());
        }

        let shares = st
            .supplies
            .get(&utils::account_asset_key(account, market_id))
            .copied()
            .unwrap_or(0);
        let (_, shortfall) =
            Self::hypothetical_liquidity(st, account, Some(market_id), shares, 0, now)?;
        if shortfall > 0 {
            return Err(Error::InsufficientLiquidity);
        }

        if let Some(entered) = st.memberships.get_mut(&account) {
            entered.retain(|m| m != market_id);
        }
        Ok(())
    }

    pub fn is_member(st: &MoneyMarketState, account: ActorId, market_id: &str) -> bool {
        st.memberships
            .get(&account)
            .map(|entered| entered.iter().any(|m| m == market_id))
            .unwrap_or(false)
    }

    // ---- policy administration ----

    /// List a market for use. The registry is append-only: nothing delists.
    pub fn support_market(
        st: &mut MoneyMarketState,
        caller: ActorId,
        market_id: &str,
    ) -> Result<(), Error> {
        if !st.is_admin(caller) {
            return Err(Error::Unauthorized);
        }
        if !st.markets.contains_key(market_id) {
            return Err(Error::MarketNotFound);
        }
        if st.policies.contains_key(market_id) {
            return Err(Error::MarketAlreadyListed);
        }
        st.policies.insert(
            market_id.into(),
            MarketPolicy {
                listed: true,
                collateral_factor_bps: 0,
            },
        );
        Ok(())
    }

    /// Returns the previous factor. A nonzero factor requires a usable
    /// price: collateral that cannot be valued must not unlock borrowing.
    pub fn set_collateral_factor(
        st: &mut MoneyMarketState,
        caller: ActorId,
        market_id: &str,
        new_bps: u16,
        now: u64,
    ) -> Result<u16, Error> {
        if !st.is_admin(caller) {
            return Err(Error::Unauthorized);
        }
        if new_bps > MAX_COLLATERAL_FACTOR_BPS {
            return Err(Error::InvalidParameter);
        }
        let underlying = st
            .markets
            .get(market_id)
            .ok_or(Error::MarketNotFound)?
            .underlying
            .clone();
        if new_bps > 0 {
            OracleModule::price_of(st, &underlying, now)?;
        }
        let policy = st
            .policies
            .get_mut(market_id)
            .ok_or(Error::MarketNotListed)?;
        let old_bps = policy.collateral_factor_bps;
        policy.collateral_factor_bps = new_bps;
        Ok(old_bps)
    }

    pub fn set_close_factor(
        st: &mut MoneyMarketState,
        caller: ActorId,
        new_bps: u16,
    ) -> Result<u16, Error> {
        if !st.is_admin(caller) {
            return Err(Error::Unauthorized);
        }
        if new_bps == 0 || new_bps > 10_000 {
            return Err(Error::InvalidParameter);
        }
        let old_bps = st.close_factor_bps;
        st.close_factor_bps = new_bps;
        Ok(old_bps)
    }

    pub fn set_liquidation_incentive(
        st: &mut MoneyMarketState,
        caller: ActorId,
        new_bps: u16,
    ) -> Result<u16, Error> {
        if !st.is_admin(caller) {
            return Err(Error::Unauthorized);
        }
        if new_bps < 10_000 {
            return Err(Error::InvalidParameter);
        }
        let old_bps = st.liquidation_incentive_bps;
        st.liquidation_incentive_bps = new_bps;
        Ok(old_bps)
    }

    fn require_listed(st: &MoneyMarketState, market_id: &str) -> Result<(), Error> {
        match st.policies.get(market_id) {
            Some(policy) if policy.listed => Ok(()),
            _ => Err(Error::MarketNotListed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::market::MarketModule;
    use crate::test_utils::*;

    #[test]
    fn empty_account_has_zero_liquidity_and_zero_shortfall() {
        let mut st = two_market_state();
        assert_eq!(
            RiskModule::account_liquidity(&mut st, actor(9), T0),
            Ok((0, 0))
        );
    }

    #[test]
    fn liquidity_and_shortfall_are_mutually_exclusive() {
        let mut st = two_market_state();
        supply(&mut st, user2(), MKT_A, 100 * UNIT);
        let user = user1();
        supply(&mut st, user, MKT_B, UNIT);
        enter(&mut st, user, MKT_B);

        // solvent: 1 TKB at $100 with a 50% factor -> $50 capacity
        let (liquidity, shortfall) = RiskModule::account_liquidity(&mut st, user, T0).unwrap();
        assert_eq!((liquidity, shortfall), (50 * USD_SCALE, 0));

        borrow(&mut st, user, MKT_A, 50 * UNIT);
        let (liquidity, shortfall) = RiskModule::account_liquidity(&mut st, user, T0).unwrap();
        assert_eq!((liquidity, shortfall), (0, 0));

        // price collapse flips the sign; only one side may be nonzero
        OracleModule::post_price(&mut st, admin(), "TKB".into(), 50 * USD_SCALE, T0).unwrap();
        let (liquidity, shortfall) = RiskModule::account_liquidity(&mut st, user, T0).unwrap();
        assert_eq!(liquidity, 0);
        assert_eq!(shortfall, 25 * USD_SCALE);
    }

    #[test]
    fn liquidity_fails_closed_on_stale_price() {
        let mut st = two_market_state();
        let user = user1();
        supply(&mut st, user, MKT_B, UNIT);
        enter(&mut st, user, MKT_B);

        let later = T0 + st.oracle.config.max_age_seconds + 1;
        assert_eq!(
            RiskModule::account_liquidity(&mut st, user, later),
            Err(Error::PriceStale)
        );
    }

    #[test]
    fn borrow_allowed_enters_the_borrow_market() {
        let mut st = two_market_state();
        let user = user1();
        supply(&mut st, user, MKT_B, UNIT);
        enter(&mut st, user, MKT_B);

        assert!(!RiskModule::is_member(&st, user, MKT_A));
        RiskModule::borrow_allowed(&mut st, user, MKT_A, UNIT, T0).unwrap();
        assert!(RiskModule::is_member(&st, user, MKT_A));
    }

    #[test]
    fn unentered_supply_backs_no_borrow() {
        let mut st = two_market_state();
        let user = user1();
        // supplied but never entered: no borrowing capacity
        supply(&mut st, user, MKT_B, UNIT);

        assert_eq!(
            RiskModule::borrow_allowed(&mut st, user, MKT_A, UNIT, T0),
            Err(Error::InsufficientLiquidity)
        );
    }

    #[test]
    fn enter_markets_requires_listing() {
        let mut st = two_market_state();
        assert_eq!(
            RiskModule::enter_markets(&mut st, user1(), Vec::from(["nope".into()])),
            Err(Error::MarketNotListed)
        );
    }

    #[test]
    fn enter_markets_is_idempotent() {
        let mut st = two_market_state();
        let user = user1();
        let added =
            RiskModule::enter_markets(&mut st, user, Vec::from([MKT_B.into()])).unwrap();
        assert_eq!(added.len(), 1);
        let added =
            RiskModule::enter_markets(&mut st, user, Vec::from([MKT_B.into()])).unwrap();
        assert!(added.is_empty());
        assert_eq!(st.memberships.get(&user).unwrap().len(), 1);
    }

    #[test]
    fn exit_market_with_outstanding_borrow_fails() {
        let mut st = two_market_state();
        supply(&mut st, user2(), MKT_A, 100 * UNIT);
        let user = user1();
        supply(&mut st, user, MKT_B, UNIT);
        enter(&mut st, user, MKT_B);
        borrow(&mut st, user, MKT_A, 10 * UNIT);

        assert_eq!(
            RiskModule::exit_market(&mut st, user, MKT_A, T0),
            Err(Error::NonzeroBorrowBalance)
        );
    }

    #[test]
    fn exit_market_that_carries_the_debt_fails() {
        let mut st = two_market_state();
        supply(&mut st, user2(), MKT_A, 100 * UNIT);
        let user = user1();
        supply(&mut st, user, MKT_B, UNIT);
        enter(&mut st, user, MKT_B);
        borrow(&mut st, user, MKT_A, 10 * UNIT);

        assert_eq!(
            RiskModule::exit_market(&mut st, user, MKT_B, T0),
            Err(Error::InsufficientLiquidity)
        );
    }

    #[test]
    fn exit_market_without_debt_removes_membership() {
        let mut st = two_market_state();
        let user = user1();
        supply(&mut st, user, MKT_B, UNIT);
        enter(&mut st, user, MKT_B);

        RiskModule::exit_market(&mut st, user, MKT_B, T0).unwrap();
        assert!(!RiskModule::is_member(&st, user, MKT_B));
    }

    #[test]
    fn support_market_is_append_only() {
        let mut st = two_market_state();
        assert_eq!(
            RiskModule::support_market(&mut st, admin(), MKT_A),
            Err(Error::MarketAlreadyListed)
        );
        assert_eq!(
            RiskModule::support_market(&mut st, admin(), "nope"),
            Err(Error::MarketNotFound)
        );
    }

    #[test]
    fn collateral_factor_bounds_and_price_guard() {
        let mut st = two_market_state();
        assert_eq!(
            RiskModule::set_collateral_factor(&mut st, admin(), MKT_B, 9_001, T0),
            Err(Error::InvalidParameter)
        );

        // a market without a posted price cannot get a nonzero factor
        create_market(&mut st, "mNEW", "NEW");
        RiskModule::support_market(&mut st, admin(), "mNEW").unwrap();
        assert_eq!(
            RiskModule::set_collateral_factor(&mut st, admin(), "mNEW", 1_000, T0),
            Err(Error::PriceNotAvailable)
        );
        assert_eq!(
            RiskModule::set_collateral_factor(&mut st, admin(), "mNEW", 0, T0),
            Ok(0)
        );
    }

    #[test]
    fn close_factor_and_incentive_bounds() {
        let mut st = two_market_state();
        assert_eq!(
            RiskModule::set_close_factor(&mut st, admin(), 0),
            Err(Error::InvalidParameter)
        );
        assert_eq!(
            RiskModule::set_close_factor(&mut st, admin(), 10_001),
            Err(Error::InvalidParameter)
        );
        assert_eq!(RiskModule::set_close_factor(&mut st, admin(), 10_000), Ok(5_000));

        assert_eq!(
            RiskModule::set_liquidation_incentive(&mut st, admin(), 9_999),
            Err(Error::InvalidParameter)
        );
        assert_eq!(
            RiskModule::set_liquidation_incentive(&mut st, admin(), 10_000),
            Ok(10_800)
        );
    }

    #[test]
    fn policy_mutations_require_admin() {
        let mut st = two_market_state();
        let rando = actor(9);
        assert_eq!(
            RiskModule::set_close_factor(&mut st, rando, 5_000),
            Err(Error::Unauthorized)
        );
        assert_eq!(
            RiskModule::set_collateral_factor(&mut st, rando, MKT_B, 4_000, T0),
            Err(Error::Unauthorized)
        );
        assert_eq!(
            RiskModule::support_market(&mut st, rando, MKT_A),
            Err(Error::Unauthorized)
        );
    }

    #[test]
    fn redeem_allowed_blocks_a_shortfall_creating_redemption() {
        let mut st = two_market_state();
        supply(&mut st, user2(), MKT_A, 100 * UNIT);
        let user = user1();
        supply(&mut st, user, MKT_B, UNIT);
        enter(&mut st, user, MKT_B);
        borrow(&mut st, user, MKT_A, 50 * UNIT);

        assert_eq!(
            RiskModule::redeem_allowed(&mut st, user, MKT_B, 1, T0),
            Err(Error::InsufficientLiquidity)
        );
        // once the debt is gone the same redemption passes
        MarketModule::repay_borrow(&mut st, user, user, MKT_A, REPAY_MAX, T0).unwrap();
        let shares = shares_of(&st, user, MKT_B);
        assert_eq!(
            RiskModule::redeem_allowed(&mut st, user, MKT_B, shares, T0),
            Ok(())
        );
    }
}
