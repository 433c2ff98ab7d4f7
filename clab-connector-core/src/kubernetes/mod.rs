pub mod kubectl;
pub mod operations;
