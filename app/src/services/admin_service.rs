use sails_rs::{gstd::msg, prelude::*};

use crate::{
    errors::Error,
    events::AdminEvent,
    modules::{market::MarketModule, oracle::OracleModule, risk::RiskModule},
    types::*,
    utils, MoneyMarketState,
};

/// Privileged surface: market creation and listing, risk parameters,
/// keepers, oracle config, reserve withdrawal.
#[derive(Default)]
pub struct AdminService;

impl AdminService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[service(events = AdminEvent)]
impl AdminService {
    #[export]
    pub fn create_market(
        &mut self,
        market_id: String,
        underlying: String,
        initial_exchange_rate: u128,
        reserve_factor_bps: u16,
        rate_model: InterestRateModel,
    ) -> Result<(), Error> {
        MarketModule::create_market(
            MoneyMarketState::get_mut(),
            msg::source(),
            market_id.clone(),
            underlying.clone(),
            initial_exchange_rate,
            reserve_factor_bps,
            rate_model,
            utils::now(),
        )?;
        self.emit_event(AdminEvent::MarketCreated {
            market_id,
            underlying,
        })
        .expect("event emission failed");
        Ok(())
    }

    #[export]
    pub fn support_market(&mut self, market_id: String) -> Result<(), Error> {
        RiskModule::support_market(MoneyMarketState::get_mut(), msg::source(), &market_id)?;
        self.emit_event(AdminEvent::MarketListed { market_id })
            .expect("event emission failed");
        Ok(())
    }

    #[export]
    pub fn set_collateral_factor(&mut self, market_id: String, new_bps: u16) -> Result<(), Error> {
        let old_bps = RiskModule::set_collateral_factor(
            MoneyMarketState::get_mut(),
            msg::source(),
            &market_id,
            new_bps,
            utils::now(),
        )?;
        self.emit_event(AdminEvent::CollateralFactorUpdated {
            market_id,
            old_bps,
            new_bps,
        })
        .expect("event emission failed");
        Ok(())
    }

    #[export]
    pub fn set_close_factor(&mut self, new_bps: u16) -> Result<(), Error> {
        let old_bps =
            RiskModule::set_close_factor(MoneyMarketState::get_mut(), msg::source(), new_bps)?;
        self.emit_event(AdminEvent::CloseFactorUpdated { old_bps, new_bps })
            .expect("event emission failed");
        Ok(())
    }

    #[export]
    pub fn set_liquidation_incentive(&mut self, new_bps: u16) -> Result<(), Error> {
        let old_bps = RiskModule::set_liquidation_incentive(
            MoneyMarketState::get_mut(),
            msg::source(),
            new_bps,
        )?;
        self.emit_event(AdminEvent::LiquidationIncentiveUpdated { old_bps, new_bps })
            .expect("event emission failed");
        Ok(())
    }

    #[export]
    pub fn set_rate_model(
        &mut self,
        market_id: String,
        rate_model: InterestRateModel,
    ) -> Result<(), Error> {
        MarketModule::set_rate_model(
            MoneyMarketState::get_mut(),
            msg::source(),
            &market_id,
            rate_model,
            utils::now(),
        )?;
        self.emit_event(AdminEvent::RateModelUpdated { market_id })
            .expect("event emission failed");
        Ok(())
    }

    #[export]
    pub fn set_reserve_factor(&mut self, market_id: String, new_bps: u16) -> Result<(), Error> {
        let old_bps = MarketModule::set_reserve_factor(
            MoneyMarketState::get_mut(),
            msg::source(),
            &market_id,
            new_bps,
            utils::now(),
        )?;
        self.emit_event(AdminEvent::ReserveFactorUpdated {
            market_id,
            old_bps,
            new_bps,
        })
        .expect("event emission failed");
        Ok(())
    }

    /// Withdraw accumulated reserves to the admin wallet
    #[export]
    pub fn reduce_reserves(&mut self, market_id: String, amount: u128) -> Result<u128, Error> {
        let total_reserves = MarketModule::reduce_reserves(
            MoneyMarketState::get_mut(),
            msg::source(),
            &market_id,
            amount,
            utils::now(),
        )?;
        self.emit_event(AdminEvent::ReservesReduced {
            market_id,
            amount,
            total_reserves,
        })
        .expect("event emission failed");
        Ok(total_reserves)
    }

    #[export]
    pub fn set_oracle_config(&mut self, config: OracleConfig) -> Result<(), Error> {
        let max_age_seconds = config.max_age_seconds;
        OracleModule::set_config(MoneyMarketState::get_mut(), msg::source(), config)?;
        self.emit_event(AdminEvent::OracleConfigUpdated { max_age_seconds })
            .expect("event emission failed");
        Ok(())
    }

    #[export]
    pub fn add_keeper(&mut self, keeper: ActorId) -> Result<(), Error> {
        let st = MoneyMarketState::get_mut();
        if !st.is_admin(msg::source()) {
            return Err(Error::Unauthorized);
        }
        if !st.keepers.contains(&keeper) {
            st.keepers.push(keeper);
        }
        self.emit_event(AdminEvent::KeeperAdded { keeper })
            .expect("event emission failed");
        Ok(())
    }

    #[export]
    pub fn remove_keeper(&mut self, keeper: ActorId) -> Result<(), Error> {
        let st = MoneyMarketState::get_mut();
        if !st.is_admin(msg::source()) {
            return Err(Error::Unauthorized);
        }
        st.keepers.retain(|k| *k != keeper);
        self.emit_event(AdminEvent::KeeperRemoved { keeper })
            .expect("event emission failed");
        Ok(())
    }
}
