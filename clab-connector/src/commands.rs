pub mod check_sync;
pub mod export_lab;
pub mod generate_crs;
pub mod health;
pub mod integrate;
pub mod remove;
