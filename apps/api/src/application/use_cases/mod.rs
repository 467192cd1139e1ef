pub mod admin;
pub mod analytics;
pub mod billing;
pub mod models;
pub mod monitoring;
pub mod monthly_data;
pub mod usage;
pub mod user;
