//! # pinledger-engine
//!
//! The ledger engines of **pinledger**. Each engine is a set of free
//! functions over an open [`LedgerTx`](pinledger_store::LedgerTx), taking the
//! [`LedgerConfig`](pinledger_types::LedgerConfig) and the caller's
//! [`CallContext`](pinledger_types::CallContext) explicitly:
//!
//! | Module          | Operations                                              |
//! |-----------------|---------------------------------------------------------|
//! | [`issuance`]    | mint objects against an issuer's soul balance           |
//! | [`combination`] | merge N objects into one, divide one into N             |
//! | [`adjustment`]  | subtract an exact amount into a new object              |
//! | [`access`]      | open (default / timed / pin) and lock                   |
//! | [`charge`]      | consume open objects to settle a payment                |
//! | [`registry`]    | identities, services, wallets, soul renewal, wallet lock |
//! | [`inspect`]     | lookups, wallet statistics, filtered listing            |
//!
//! [`Ledger`] wraps a store and scopes each call to one transaction.

pub mod access;
pub mod adjustment;
pub mod charge;
pub mod combination;
pub mod inspect;
pub mod issuance;
pub mod ledger;
pub mod mint;
pub mod registry;
pub mod validation;

pub use adjustment::{SubtractObject, Subtraction};
pub use charge::{ChargeObjects, ChargeReceipt};
pub use combination::{DivideObject, MergeObjects};
pub use inspect::{ObjectFilter, ObjectPage, Page, SortOrder, WalletNumbers};
pub use issuance::{IssueObjects, Issuance};
pub use ledger::Ledger;
