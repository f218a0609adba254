use sails_rs::{gstd::msg, prelude::*};

use crate::{
    errors::Error,
    events::MarketEvent,
    modules::{market::MarketModule, risk::RiskModule},
    utils, MoneyMarketState,
};

/// User-facing market operations. Amount resolution and all checks live in
/// the modules; this layer only reads the caller and clock and reports
/// resolved amounts as events.
#[derive(Default)]
pub struct MarketService;

impl MarketService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[service(events = MarketEvent)]
impl MarketService {
    /// Deposit underlying, receive shares. Returns the shares minted.
    #[export]
    pub fn mint(&mut self, market_id: String, amount: u128) -> Result<u128, Error> {
        let caller = msg::source();
        let shares =
            MarketModule::mint(MoneyMarketState::get_mut(), caller, &market_id, amount, utils::now())?;
        self.emit_event(MarketEvent::Mint {
            account: caller,
            market: market_id,
            underlying_in: amount,
            shares_out: shares,
        })
        .expect("event emission failed");
        Ok(shares)
    }

    /// Burn an exact number of shares. Returns the underlying paid out.
    #[export]
    pub fn redeem(&mut self, market_id: String, shares: u128) -> Result<u128, Error> {
        let caller = msg::source();
        let out =
            MarketModule::redeem(MoneyMarketState::get_mut(), caller, &market_id, shares, utils::now())?;
        self.emit_event(MarketEvent::Redeem {
            account: caller,
            market: market_id,
            shares_in: shares,
            underlying_out: out,
        })
        .expect("event emission failed");
        Ok(out)
    }

    /// Withdraw an exact underlying amount. Returns the shares burned.
    #[export]
    pub fn redeem_underlying(&mut self, market_id: String, amount: u128) -> Result<u128, Error> {
        let caller = msg::source();
        let shares = MarketModule::redeem_underlying(
            MoneyMarketState::get_mut(),
            caller,
            &market_id,
            amount,
            utils::now(),
        )?;
        self.emit_event(MarketEvent::Redeem {
            account: caller,
            market: market_id,
            shares_in: shares,
            underlying_out: amount,
        })
        .expect("event emission failed");
        Ok(shares)
    }

    /// Borrow underlying against the caller's entered collateral. Returns
    /// the caller's new borrow balance.
    #[export]
    pub fn borrow(&mut self, market_id: String, amount: u128) -> Result<u128, Error> {
        let caller = msg::source();
        let (account_borrows, total_borrows) =
            MarketModule::borrow(MoneyMarketState::get_mut(), caller, &market_id, amount, utils::now())?;
        self.emit_event(MarketEvent::Borrow {
            account: caller,
            market: market_id,
            amount,
            account_borrows,
            total_borrows,
        })
        .expect("event emission failed");
        Ok(account_borrows)
    }

    /// Repay the caller's own borrow; `REPAY_MAX` clears it. Returns the
    /// amount actually repaid.
    #[export]
    pub fn repay_borrow(&mut self, market_id: String, amount: u128) -> Result<u128, Error> {
        let caller = msg::source();
        self.repay_internal(caller, caller, market_id, amount)
    }

    /// Repay someone else's borrow from the caller's wallet
    #[export]
    pub fn repay_on_behalf(
        &mut self,
        market_id: String,
        borrower: ActorId,
        amount: u128,
    ) -> Result<u128, Error> {
        let payer = msg::source();
        self.repay_internal(payer, borrower, market_id, amount)
    }

    /// Repay part of an under-collateralized borrower's debt and seize
    /// collateral shares. Returns the shares seized.
    #[export]
    pub fn liquidate_borrow(
        &mut self,
        borrow_market: String,
        borrower: ActorId,
        repay_amount: u128,
        collateral_market: String,
    ) -> Result<u128, Error> {
        let liquidator = msg::source();
        let (repaid, seized) = MarketModule::liquidate_borrow(
            MoneyMarketState::get_mut(),
            liquidator,
            borrower,
            &borrow_market,
            repay_amount,
            &collateral_market,
            utils::now(),
        )?;
        self.emit_event(MarketEvent::LiquidateBorrow {
            liquidator,
            borrower,
            market: borrow_market,
            repay_amount: repaid,
            collateral_market,
            seized_shares: seized,
        })
        .expect("event emission failed");
        Ok(seized)
    }

    /// Transfer shares to another account
    #[export]
    pub fn transfer(&mut self, market_id: String, to: ActorId, shares: u128) -> Result<(), Error> {
        let caller = msg::source();
        MarketModule::transfer_shares(
            MoneyMarketState::get_mut(),
            caller,
            to,
            &market_id,
            shares,
            utils::now(),
        )?;
        self.emit_event(MarketEvent::SharesTransferred {
            market: market_id,
            from: caller,
            to,
            shares,
        })
        .expect("event emission failed");
        Ok(())
    }

    /// Opt markets in as collateral for the caller
    #[export]
    pub fn enter_markets(&mut self, market_ids: Vec<String>) -> Result<(), Error> {
        let caller = msg::source();
        let added = RiskModule::enter_markets(MoneyMarketState::get_mut(), caller, market_ids)?;
        for market in added {
            self.emit_event(MarketEvent::MarketEntered {
                account: caller,
                market,
            })
            .expect("event emission failed");
        }
        Ok(())
    }

    #[export]
    pub fn exit_market(&mut self, market_id: String) -> Result<(), Error> {
        let caller = msg::source();
        RiskModule::exit_market(MoneyMarketState::get_mut(), caller, &market_id, utils::now())?;
        self.emit_event(MarketEvent::MarketExited {
            account: caller,
            market: market_id,
        })
        .expect("event emission failed");
        Ok(())
    }

    /// Refresh a market's accrual so externally observed values are current
    #[export]
    pub fn accrue_interest(&mut self, market_id: String) -> Result<(), Error> {
        let accrual =
            MarketModule::accrue_interest(MoneyMarketState::get_mut(), &market_id, utils::now())?;
        if let Some(accrual) = accrual {
            self.emit_event(MarketEvent::InterestAccrued {
                market: market_id,
                interest_accumulated: accrual.interest_accumulated,
                borrow_index: accrual.borrow_index,
                total_borrows: accrual.total_borrows,
            })
            .expect("event emission failed");
        }
        Ok(())
    }

    /// Donate underlying to the market's reserves. Returns the new total.
    #[export]
    pub fn add_reserves(&mut self, market_id: String, amount: u128) -> Result<u128, Error> {
        let caller = msg::source();
        let total = MarketModule::add_reserves(
            MoneyMarketState::get_mut(),
            caller,
            &market_id,
            amount,
            utils::now(),
        )?;
        self.emit_event(MarketEvent::ReservesAdded {
            market: market_id,
            payer: caller,
            amount,
            total_reserves: total,
        })
        .expect("event emission failed");
        Ok(total)
    }

    fn repay_internal(
        &mut self,
        payer: ActorId,
        borrower: ActorId,
        market_id: String,
        amount: u128,
    ) -> Result<u128, Error> {
        let (paid, account_borrows, total_borrows) = MarketModule::repay_borrow(
            MoneyMarketState::get_mut(),
            payer,
            borrower,
            &market_id,
            amount,
            utils::now(),
        )?;
        self.emit_event(MarketEvent::RepayBorrow {
            payer,
            borrower,
            market: market_id,
            amount: paid,
            account_borrows,
            total_borrows,
        })
        .expect("event emission failed");
        Ok(paid)
    }
}
