use sails_rs::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, TypeInfo)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub enum Error {
    // Access
    Unauthorized,
    NotKeeper,

    // Market registry
    MarketNotFound,
    MarketAlreadyExists,
    MarketNotListed,
    MarketAlreadyListed,

    // Risk policy
    InsufficientLiquidity,
    NoShortfall,
    TooMuchRepay,
    SeizeTooMuch,
    NonzeroBorrowBalance,

    // Market ledger
    TransferFailed,
    InsufficientCash,
    InsufficientShares,
    RepayTooMuch,

    // Wallet
    InsufficientBalance,

    // Collaborators
    PriceNotAvailable,
    PriceStale,
    RateModelError,

    // Other
    InvalidParameter,
    MathOverflow,
}
