//! Shared policy, constants, errors and logging setup.

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;

pub use config::*;
pub use error::{InsuranceError, Result};
