//! Common types for the Apps Script runner workspace

mod secret;
mod error;

pub use secret::Secret;
pub use error::{Error, Result};
