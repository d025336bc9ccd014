//! Core types for Resona.
//!
//! Type-safe wrappers and enums for the rental domain.

pub mod email;
pub mod id;
pub mod money;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{percent_of, round_money};
pub use status::*;
