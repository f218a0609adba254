use sails_rs::{gstd::msg, prelude::*};

use crate::{errors::Error, modules::ledger::LedgerModule, MoneyMarketState};

/// Internal per-asset wallet backing the markets' transfers. This is a
/// temporary in-program balance book; in production it would be backed by
/// real FT transfers.
#[derive(Default)]
pub struct WalletService;

impl WalletService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[service]
impl WalletService {
    #[export]
    pub fn deposit(&mut self, asset: String, amount: u128) -> Result<u128, Error> {
        let caller = msg::source();
        LedgerModule::deposit(MoneyMarketState::get_mut(), caller, &asset, amount)
    }

    #[export]
    pub fn withdraw(&mut self, asset: String, amount: u128) -> Result<u128, Error> {
        let caller = msg::source();
        LedgerModule::withdraw(MoneyMarketState::get_mut(), caller, &asset, amount)
    }

    #[export]
    pub fn balance_of(&self, asset: String, account: ActorId) -> u128 {
        LedgerModule::balance_of(MoneyMarketState::get(), &asset, account)
    }

    #[export]
    pub fn my_balance(&self, asset: String) -> u128 {
        let caller = msg::source();
        self.balance_of(asset, caller)
    }
}
