//! Service layer
//!
//! Contains business logic separated from HTTP handlers.

mod accounts;

pub use accounts::AccountService;
