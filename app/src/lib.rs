#![no_std]
#![warn(clippy::new_without_default)]
#![allow(static_mut_refs)]

pub mod utils;
pub mod types;
pub mod events;
pub mod errors;
mod services;
mod modules;
#[cfg(test)]
mod test_utils;

use sails_rs::collections::HashMap;
use sails_rs::gstd::msg;
use sails_rs::prelude::*;

use types::*;

static mut STATE: Option<MoneyMarketState> = None;

/// Whole-program state. Markets own their ledgers; the policy maps, close
/// factor, liquidation incentive and memberships belong to the risk side;
/// `balances` is the internal underlying wallet.
#[derive(Debug, Clone)]
pub struct MoneyMarketState {
    pub markets: HashMap<String, Market>,
    pub policies: HashMap<String, MarketPolicy>,
    /// keccak(account, market) -> share balance
    pub supplies: HashMap<H256, u128>,
    /// keccak(account, market) -> borrow snapshot
    pub borrows: HashMap<H256, BorrowSnapshot>,
    /// Markets whose supply counts as the account's collateral
    pub memberships: HashMap<ActorId, Vec<String>>,
    /// keccak(account, underlying) -> wallet balance
    pub balances: HashMap<H256, u128>,
    pub oracle: OracleState,
    pub close_factor_bps: u16,
    pub liquidation_incentive_bps: u16,
    pub admin: ActorId,
    pub keepers: Vec<ActorId>,
}

impl MoneyMarketState {
    pub fn new(admin: ActorId) -> Self {
        Self {
            markets: HashMap::new(),
            policies: HashMap::new(),
            supplies: HashMap::new(),
            borrows: HashMap::new(),
            memberships: HashMap::new(),
            balances: HashMap::new(),
            oracle: OracleState::new(),
            close_factor_bps: 5_000,
            liquidation_incentive_bps: 10_000,
            admin,
            keepers: Vec::new(),
        }
    }

    pub fn get() -> &'static Self {
        unsafe { STATE.as_ref().expect("State not initialized") }
    }

    pub fn get_mut() -> &'static mut Self {
        unsafe { STATE.as_mut().expect("State not initialized") }
    }

    pub fn init(admin: ActorId) {
        unsafe {
            STATE = Some(Self::new(admin));
        }
    }

    pub fn is_admin(&self, actor: ActorId) -> bool {
        self.admin == actor
    }

    pub fn is_keeper(&self, actor: ActorId) -> bool {
        self.keepers.contains(&actor)
    }
}

use services::{AdminService, MarketService, OracleService, ViewService, WalletService};

pub struct MoneyMarketProgram(());

#[program]
impl MoneyMarketProgram {
    /// Admin is taken from msg::source()
    pub fn new() -> Self {
        let creator = msg::source();
        MoneyMarketState::init(creator);
        Self(())
    }

    pub fn market(&self) -> MarketService {
        MarketService::new()
    }

    pub fn wallet(&self) -> WalletService {
        WalletService::new()
    }

    pub fn oracle(&self) -> OracleService {
        OracleService::new()
    }

    pub fn admin(&self) -> AdminService {
        AdminService::new()
    }

    pub fn view(&self) -> ViewService {
        ViewService::new()
    }
}
