//! Operations that combine repository reads and writes with the core rules.
//!
//! Handlers stay thin: they parse the request, call one function here and
//! serialize the result.

pub mod inventory;
pub mod orders;
pub mod packs;
