//! Core value types for Aurum.
//!
//! This module provides type-safe wrappers for identifiers, money, customer
//! emails and order/charge statuses.

pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, Price, round2};
pub use status::*;
