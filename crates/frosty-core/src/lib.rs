pub mod audit;
pub mod config;
pub mod controls;
pub mod error;
pub mod query;
pub mod report;
pub mod result;
pub mod warehouse;
pub mod window;
