//! # pinledger-types
//!
//! Shared types, errors, and configuration for the **pinledger** value-object
//! ledger.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`IdentityId`], [`ServiceId`], [`WalletId`], [`ObjectId`]
//! - **Entities**: [`Identity`], [`Service`], [`Wallet`], [`Object`]
//! - **Access state**: [`AccessState`], [`OpenMethod`], [`OpenRequest`]
//! - **Pins**: [`Pin`] with Luhn checksum generation and validation
//! - **Currency table**: ISO currency code → numeric call code
//! - **Call context**: [`CallContext`] carrying the authorizing principals
//! - **Configuration**: [`LedgerConfig`]
//! - **Errors**: [`LedgerError`] with `PL_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod access;
pub mod config;
pub mod constants;
pub mod context;
pub mod currency;
pub mod error;
pub mod identity;
pub mod ids;
pub mod object;
pub mod pin;
pub mod service;
pub mod wallet;

// Re-export all primary types at crate root for ergonomic imports:
//   use pinledger_types::{Object, ObjectKind, Pin, LedgerError, ...};

pub use access::*;
pub use config::*;
pub use context::*;
pub use error::*;
pub use identity::*;
pub use ids::*;
pub use object::*;
pub use pin::*;
pub use service::*;
pub use wallet::*;

// Constants and the currency table are accessed via their modules
// (`pinledger_types::constants::FOO`, `pinledger_types::currency::call_code`).
