pub mod dashboard;
pub mod health;
pub mod logo;
pub mod reports;
