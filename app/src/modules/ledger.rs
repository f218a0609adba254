use sails_rs::prelude::*;

use crate::{errors::Error, utils, MoneyMarketState};

/// Internal fungible balance book, one balance per (account, underlying).
/// This is a temporary in-program ledger; in production it would be backed
/// by real FT transfers to and from the asset programs.
pub struct LedgerModule;

impl LedgerModule {
    /// Credit an account from outside the markets (faucet-style deposit)
    pub fn deposit(
        st: &mut MoneyMarketState,
        account: ActorId,
        asset: &str,
        amount: u128,
    ) -> Result<u128, Error> {
        if amount == 0 {
            return Err(Error::InvalidParameter);
        }
        let bal = st
            .balances
            .entry(utils::account_asset_key(account, asset))
            .or_insert(0);
        *bal = bal.saturating_add(amount);
        Ok(*bal)
    }

    /// Withdraw an account's free balance back out of the program
    pub fn withdraw(
        st: &mut MoneyMarketState,
        account: ActorId,
        asset: &str,
        amount: u128,
    ) -> Result<u128, Error> {
        if amount == 0 {
            return Err(Error::InvalidParameter);
        }
        let bal = st
            .balances
            .get_mut(&utils::account_asset_key(account, asset))
            .ok_or(Error::InsufficientBalance)?;
        if *bal < amount {
            return Err(Error::InsufficientBalance);
        }
        *bal -= amount;
        Ok(*bal)
    }

    /// Move `amount` of `asset` from `from` into market custody. A short
    /// balance surfaces as `TransferFailed`, never as a silent no-op.
    pub fn pull(
        st: &mut MoneyMarketState,
        asset: &str,
        from: ActorId,
        amount: u128,
    ) -> Result<(), Error> {
        if amount == 0 {
            return Ok(());
        }
        let bal = st
            .balances
            .get_mut(&utils::account_asset_key(from, asset))
            .ok_or(Error::TransferFailed)?;
        if *bal < amount {
            return Err(Error::TransferFailed);
        }
        *bal -= amount;
        Ok(())
    }

    /// Move `amount` of `asset` out of market custody to `to`
    pub fn push(
        st: &mut MoneyMarketState,
        asset: &str,
        to: ActorId,
        amount: u128,
    ) -> Result<(), Error> {
        if amount == 0 {
            return Ok(());
        }
        let bal = st
            .balances
            .entry(utils::account_asset_key(to, asset))
            .or_insert(0);
        *bal = bal.checked_add(amount).ok_or(Error::TransferFailed)?;
        Ok(())
    }

    pub fn balance_of(st: &MoneyMarketState, asset: &str, account: ActorId) -> u128 {
        st.balances
            .get(&utils::account_asset_key(account, asset))
            .copied()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn deposit_and_withdraw_round_trip() {
        let mut st = fresh_state();
        let user = actor(7);

        LedgerModule::deposit(&mut st, user, "TKA", 500).unwrap();
        assert_eq!(LedgerModule::balance_of(&st, "TKA", user), 500);

        let left = LedgerModule::withdraw(&mut st, user, "TKA", 200).unwrap();
        assert_eq!(left, 300);
        assert_eq!(LedgerModule::balance_of(&st, "TKA", user), 300);
    }

    #[test]
    fn withdraw_more_than_held_fails() {
        let mut st = fresh_state();
        let user = actor(7);

        LedgerModule::deposit(&mut st, user, "TKA", 100).unwrap();
        assert_eq!(
            LedgerModule::withdraw(&mut st, user, "TKA", 101),
            Err(Error::InsufficientBalance)
        );
        assert_eq!(LedgerModule::balance_of(&st, "TKA", user), 100);
    }

    #[test]
    fn pull_from_unfunded_account_is_transfer_failed() {
        let mut st = fresh_state();
        let user = actor(7);

        assert_eq!(
            LedgerModule::pull(&mut st, "TKA", user, 1),
            Err(Error::TransferFailed)
        );

        LedgerModule::deposit(&mut st, user, "TKA", 10).unwrap();
        assert_eq!(
            LedgerModule::pull(&mut st, "TKA", user, 11),
            Err(Error::TransferFailed)
        );
        assert_eq!(LedgerModule::pull(&mut st, "TKA", user, 10), Ok(()));
        assert_eq!(LedgerModule::balance_of(&st, "TKA", user), 0);
    }

    #[test]
    fn balances_are_isolated_per_asset() {
        let mut st = fresh_state();
        let user = actor(7);

        LedgerModule::deposit(&mut st, user, "TKA", 100).unwrap();
        assert_eq!(LedgerModule::balance_of(&st, "TKB", user), 0);
        assert_eq!(
            LedgerModule::pull(&mut st, "TKB", user, 1),
            Err(Error::TransferFailed)
        );
    }
}
