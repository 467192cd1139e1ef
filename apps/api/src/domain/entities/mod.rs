pub mod model;
pub mod subscription;
pub mod user;

pub use fanledger_analytics::PlanTier;
