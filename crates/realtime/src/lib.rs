//! # Realtime Core
//!
//! Core modules shared by the NextBus crates: the error taxonomy and the
//! provider traits implemented by the host application.

mod error;
mod provider;

pub use crate::error::*;
pub use crate::provider::*;
