//! Core types and constants for the direction-finding system

pub mod types;
pub mod constants;

pub use types::*;
pub use constants::*;
