use crate::{errors::Error, types::*, utils};

/// Loose sanity cap on the per-second borrow rate (0.001% per second).
/// A curve that evaluates above this is considered broken.
pub const MAX_BORROW_RATE_PER_SECOND: u128 = 10_000_000_000_000;

const SECONDS_PER_YEAR: u128 = 365 * 24 * 60 * 60;

/// Evaluates a market's jump-rate curve. Pure: state in, rate out.
pub struct InterestModule;

impl InterestModule {
    /// Pool utilization in bps: borrows / (cash + borrows - reserves).
    /// A pool whose reserves exceed its backing has no meaningful
    /// utilization and is rejected.
    pub fn utilization_bps(cash: u128, borrows: u128, reserves: u128) -> Result<u128, Error> {
        if borrows == 0 {
            return Ok(0);
        }
        let pool = cash
            .checked_add(borrows)
            .ok_or(Error::MathOverflow)?
            .checked_sub(reserves)
            .ok_or(Error::RateModelError)?;
        if pool == 0 {
            return Err(Error::RateModelError);
        }
        let util = utils::mul_div(borrows, 10_000, pool)?;
        if util > 10_000 {
            return Err(Error::RateModelError);
        }
        Ok(util)
    }

    /// Borrow rate per second, RATE_SCALE-scaled
    pub fn borrow_rate_per_second(
        model: &InterestRateModel,
        cash: u128,
        borrows: u128,
        reserves: u128,
    ) -> Result<u128, Error> {
        let util = Self::utilization_bps(cash, borrows, reserves)?;

        let annual_bps = if util <= model.kink_bps {
            model
                .base_rate_bps
                .saturating_add(util.saturating_mul(model.multiplier_bps) / 10_000)
        } else {
            let at_kink = model
                .base_rate_bps
                .saturating_add(model.kink_bps.saturating_mul(model.multiplier_bps) / 10_000);
            let excess = util - model.kink_bps;
            at_kink.saturating_add(excess.saturating_mul(model.jump_multiplier_bps) / 10_000)
        };

        let rate = utils::mul_div(annual_bps, RATE_SCALE, 10_000)? / SECONDS_PER_YEAR;
        if rate > MAX_BORROW_RATE_PER_SECOND {
            return Err(Error::RateModelError);
        }
        Ok(rate)
    }

    /// Supply rate per second: borrow rate earned on the utilized share of
    /// the pool, net of the reserve cut. RATE_SCALE-scaled.
    pub fn supply_rate_per_second(
        model: &InterestRateModel,
        cash: u128,
        borrows: u128,
        reserves: u128,
        reserve_factor_bps: u16,
    ) -> Result<u128, Error> {
        let borrow_rate = Self::borrow_rate_per_second(model, cash, borrows, reserves)?;
        let util = Self::utilization_bps(cash, borrows, reserves)?;
        let gross = utils::mul_div(borrow_rate, util, 10_000)?;
        utils::mul_div(gross, 10_000 - reserve_factor_bps as u128, 10_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> InterestRateModel {
        InterestRateModel {
            base_rate_bps: 200,        // 2% APR floor
            multiplier_bps: 1_000,     // +10% APR at full utilization below kink
            jump_multiplier_bps: 30_000,
            kink_bps: 8_000,
        }
    }

    #[test]
    fn empty_pool_has_zero_utilization() {
        assert_eq!(InterestModule::utilization_bps(0, 0, 0), Ok(0));
        assert_eq!(InterestModule::utilization_bps(1_000, 0, 0), Ok(0));
    }

    #[test]
    fn utilization_counts_borrows_against_backing() {
        // 50 borrowed out of 100 backing
        assert_eq!(InterestModule::utilization_bps(50, 50, 0), Ok(5_000));
        // reserves shrink the backing: 50 / (60 + 50 - 10)
        assert_eq!(InterestModule::utilization_bps(60, 50, 10), Ok(5_000));
    }

    #[test]
    fn reserves_exceeding_backing_is_a_model_error() {
        assert_eq!(
            InterestModule::utilization_bps(10, 5, 20),
            Err(Error::RateModelError)
        );
        assert_eq!(
            InterestModule::borrow_rate_per_second(&model(), 10, 5, 20),
            Err(Error::RateModelError)
        );
    }

    #[test]
    fn rate_is_linear_below_the_kink() {
        // zero utilization -> base rate only
        let base = InterestModule::borrow_rate_per_second(&model(), 100, 0, 0).unwrap();
        let expected_base = 200 * RATE_SCALE / 10_000 / (365 * 24 * 60 * 60);
        assert_eq!(base, expected_base);

        // 50% utilization -> base + half the multiplier (2% + 5% = 7% APR)
        let mid = InterestModule::borrow_rate_per_second(&model(), 50, 50, 0).unwrap();
        let expected_mid = 700 * RATE_SCALE / 10_000 / (365 * 24 * 60 * 60);
        assert_eq!(mid, expected_mid);
    }

    #[test]
    fn jump_slope_applies_above_the_kink() {
        // 90% utilization: 2% + 8% + 10% * 300% = 40% APR
        let high = InterestModule::borrow_rate_per_second(&model(), 10, 90, 0).unwrap();
        let expected = 4_000 * RATE_SCALE / 10_000 / (365 * 24 * 60 * 60);
        assert_eq!(high, expected);
    }

    #[test]
    fn absurd_curve_is_rejected() {
        let broken = InterestRateModel {
            base_rate_bps: 50_000_000,
            multiplier_bps: 0,
            jump_multiplier_bps: 0,
            kink_bps: 8_000,
        };
        assert_eq!(
            InterestModule::borrow_rate_per_second(&broken, 100, 0, 0),
            Err(Error::RateModelError)
        );
    }

    #[test]
    fn supply_rate_is_net_of_reserve_cut() {
        // 50% utilization, 7% APR borrow side, 20% reserve factor:
        // supply = 7% * 0.5 * 0.8 = 2.8% APR
        let borrow = InterestModule::borrow_rate_per_second(&model(), 50, 50, 0).unwrap();
        let supply =
            InterestModule::supply_rate_per_second(&model(), 50, 50, 0, 2_000).unwrap();
        assert_eq!(supply, borrow * 5_000 / 10_000 * 8_000 / 10_000);
    }
}
