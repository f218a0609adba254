mod admin_service;
mod market_service;
mod oracle_service;
mod view_service;
mod wallet_service;

pub use admin_service::AdminService;
pub use market_service::MarketService;
pub use oracle_service::OracleService;
pub use view_service::ViewService;
pub use wallet_service::WalletService;
