//! Resona Core - rental business rules.
//!
//! This crate holds the rules every other Resona component relies on:
//! - `api` - JSON API serving products, packs, orders and quotes
//! - `cli` - Operator tool for migrations, data checks and repair passes
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Callers load rows, hand them to these functions and
//! persist whatever comes back.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, emails, money helpers and status enums
//! - [`pricing`] - Deposit, shipping, pack, rental period and order total rules
//! - [`stock`] - Stock levels, reservations and availability
//! - [`order`] - Order lifecycle, cancellation policy and document numbering
//! - [`integrity`] - Checks for the conventions the database does not enforce
//! - [`alerts`] - Stock deficits of open orders

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod alerts;
pub mod integrity;
pub mod order;
pub mod pricing;
pub mod stock;
pub mod types;

pub use types::*;
