//! Core rule lifecycle engine
//!
//! - [`scanner`]: Recursive discovery of files matching extension globs
//! - [`exclusion`]: Exact-name and keyword exclusion of scanned files
//! - [`naming`]: Rule display-name convention and its inverse
//! - [`store`]: Rule store trait, rule types, and an in-memory store
//! - [`netsh`]: Windows Defender Firewall store via `netsh advfirewall`
//! - [`manager`]: Idempotent creation of block rule pairs
//! - [`grouper`]: Listing, grouping and bulk removal of owned rules
//! - [`error`]: Error types for the engine

pub mod application;
pub mod error;
pub mod exclusion;
pub mod glob;
pub mod grouper;
pub mod manager;
pub mod naming;
pub mod netsh;
pub mod scanner;
pub mod store;

#[cfg(test)]
pub mod test_helpers;
