//! Types the storefront keeps outside the core domain.

pub mod session;

pub use session::keys as session_keys;
