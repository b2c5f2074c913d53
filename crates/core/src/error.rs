//! Error taxonomy for pricing, catalog and cart operations.
//!
//! Every variant here is local and recoverable: the customer (or admin)
//! fixes the selection and the computation is simply run again.

use thiserror::Error;

use crate::catalog::RingSize;
use crate::types::LineId;

/// Errors raised while pricing a selection or aggregating a cart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    /// The selected ring size is not offered, or is currently unavailable.
    #[error("ring size {size} is not available for this product")]
    InvalidSizeSelection { size: RingSize },

    /// The shipping method ID is not one of the fixed tiers.
    #[error("unknown shipping method: {0}")]
    UnknownShippingMethod(String),

    /// One or more sized lines are missing a ring size.
    #[error("{} cart line(s) need a ring size before checkout", line_ids.len())]
    IncompleteCartLine { line_ids: Vec<LineId> },
}

/// Errors raised by catalog validation and the admin list helpers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("metal option {karat} {color} is listed more than once")]
    DuplicateMetalOption { karat: String, color: String },

    #[error("ring size {0} is listed more than once")]
    DuplicateSize(RingSize),

    #[error("exactly one metal option must be the default (found {0})")]
    DefaultMetalCount(usize),

    #[error("index {index} is out of range for a list of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("{0} cannot be negative")]
    NegativePrice(&'static str),

    #[error("discount percentage must be between 0 and 100")]
    InvalidDiscount,
}

/// Errors raised by session cart mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("cart line {0} not found")]
    LineNotFound(LineId),
}
