//! Business logic services for the CoffeeStudio calculator service

pub mod fx;
pub mod logistics;
pub mod margin;
pub mod region;
pub mod sourcing;

pub use fx::FxService;
pub use logistics::LogisticsService;
pub use margin::MarginService;
pub use region::RegionService;
pub use sourcing::SourcingService;
