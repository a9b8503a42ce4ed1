pub mod app;
pub mod config;
pub mod error;
pub mod mirror;
pub mod render;
pub mod routes;
pub mod state;
