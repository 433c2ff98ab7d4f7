//! Custom resources owned by EDA that the connector creates or reads.
//!
//! Only the fields the connector fills in (or reads back during export)
//! are modelled, everything else is left to EDA defaults.

pub mod aaa;
pub mod artifacts;
pub mod bootstrap;
pub mod core;
pub mod interfaces;
