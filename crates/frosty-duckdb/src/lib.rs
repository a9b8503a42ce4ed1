pub mod backend;
pub mod schema;
pub mod warehouse_impl;

pub use backend::DuckDbWarehouse;
