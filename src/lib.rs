//! appblock - per-application firewall blocking
//!
//! Creates inbound and outbound Windows Defender Firewall block rules for
//! every executable under an application's directory, and finds, groups and
//! removes those rules again later using only their display names.
//!
//! # Architecture
//!
//! - [`core`] - Rule lifecycle engine: scanning, exclusion, naming, creation, removal
//! - [`audit`] - Audit log of every rule-changing operation
//! - [`validators`] - Input validation and normalization
//! - [`config`] - Configuration persistence
//! - [`elevation`] - netsh command construction and elevation helpers
//! - [`utils`] - Utility functions (platform directories)

// Allow pedantic clippy warnings that are not worth fixing for this codebase
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::missing_errors_doc)]

pub mod audit;
pub mod config;
pub mod core;
pub mod elevation;
pub mod utils;
pub mod validators;

// Re-export commonly used types
pub use core::application::Application;
pub use core::error::{Error, Result};
pub use core::grouper::{RuleGrouper, UNKNOWN_APPLICATION};
pub use core::manager::{ApplyReport, RuleManager};
pub use core::naming::{RULE_PREFIX, RuleNamer};
pub use core::store::{Direction, MemoryRuleStore, RuleRecord, RuleStore};
