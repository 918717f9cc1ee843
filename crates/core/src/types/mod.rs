//! Core types for the gift shop client.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod status;
pub(crate) mod wire;

pub use id::*;
pub use price::format_lkr;
pub use status::*;
