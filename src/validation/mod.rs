//! Input validation and error types

pub mod data;
pub mod error;

pub use data::{SampleValidator, ValidationError};
pub use error::{RdfError, RdfResult};
