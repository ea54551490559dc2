//! Rule store abstraction
//!
//! The firewall is treated as an opaque store of named, directional,
//! program-scoped rules. [`RuleStore`] is the only seam between the rule
//! engine and the backend; [`NetshRuleStore`](crate::core::netsh::NetshRuleStore)
//! drives Windows Defender Firewall and [`MemoryRuleStore`] keeps rules in
//! process for previews and tests.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;

/// Traffic direction of a rule
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
pub enum Direction {
    #[strum(serialize = "Inbound")]
    Inbound,
    #[strum(serialize = "Outbound")]
    Outbound,
}

impl Direction {
    /// Returns the value netsh expects for `dir=`
    pub const fn netsh_value(self) -> &'static str {
        match self {
            Direction::Inbound => "in",
            Direction::Outbound => "out",
        }
    }
}

/// Rule action. Only blocking rules are created.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, strum::Display)]
pub enum RuleAction {
    #[default]
    #[strum(serialize = "block")]
    Block,
}

/// Firewall profile a rule applies to.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, strum::Display)]
pub enum RuleProfile {
    #[default]
    #[strum(serialize = "any")]
    Any,
}

/// A rule to be created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSpec {
    pub display_name: String,
    pub direction: Direction,
    pub program_path: PathBuf,
    pub action: RuleAction,
    pub profile: RuleProfile,
}

impl RuleSpec {
    pub fn block(display_name: String, direction: Direction, program_path: PathBuf) -> Self {
        Self {
            display_name,
            direction,
            program_path,
            action: RuleAction::Block,
            profile: RuleProfile::Any,
        }
    }
}

/// Read-only view of a rule already present in the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRecord {
    pub display_name: String,
    pub program_path: Option<PathBuf>,
    pub direction: Direction,
}

/// Name filter for [`RuleStore::query_rules`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamePattern {
    /// Exact display name
    Exact(String),
    /// Every rule whose display name starts with the given text
    Prefix(String),
}

impl NamePattern {
    pub fn matches(&self, display_name: &str) -> bool {
        match self {
            NamePattern::Exact(name) => display_name == name,
            NamePattern::Prefix(prefix) => display_name.starts_with(prefix.as_str()),
        }
    }
}

/// Result of a successful create call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
}

/// Rule store errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Backend command ran and reported failure
    #[error("{message}")]
    CommandFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    /// Backend could not be started
    #[error("failed to start firewall command: {0}")]
    Spawn(String),

    /// Backend output could not be understood
    #[error("unexpected firewall output: {0}")]
    Parse(String),

    /// Some records of a batch could not be deleted
    #[error("{} of the requested rules could not be removed", failed.len())]
    Partial { failed: Vec<(String, String)> },
}

/// Backend holding the firewall rules.
///
/// Calls are sent optimistically: no locking against other processes editing
/// the firewall concurrently, and no retries.
#[allow(async_fn_in_trait)]
pub trait RuleStore {
    /// Creates one rule. A rule with the same display name and direction
    /// already present may be reported as [`CreateOutcome::AlreadyExists`].
    async fn create_rule(&self, spec: &RuleSpec) -> Result<CreateOutcome, StoreError>;

    /// Returns all rules whose display name matches `pattern`.
    async fn query_rules(&self, pattern: &NamePattern) -> Result<Vec<RuleRecord>, StoreError>;

    /// Deletes every record in one batch.
    async fn delete_rules(&self, records: &[RuleRecord]) -> Result<(), StoreError>;
}

/// In-process rule store
///
/// Keeps rules in insertion order and counts mutations so callers can tell
/// whether an operation changed anything.
#[derive(Debug, Default)]
pub struct MemoryRuleStore {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    rules: Vec<RuleRecord>,
    mutations: usize,
}

impl MemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `records`.
    pub fn with_records(records: Vec<RuleRecord>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                rules: records,
                mutations: 0,
            }),
        }
    }

    /// Snapshot of all rules currently held.
    pub fn records(&self) -> Vec<RuleRecord> {
        self.lock().rules.clone()
    }

    /// Number of successful creates and deletes so far.
    pub fn mutation_count(&self) -> usize {
        self.lock().mutations
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // A poisoned lock only means another test thread panicked mid-call;
        // the rule list itself is always left consistent.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl RuleStore for MemoryRuleStore {
    async fn create_rule(&self, spec: &RuleSpec) -> Result<CreateOutcome, StoreError> {
        let mut state = self.lock();
        let exists = state
            .rules
            .iter()
            .any(|r| r.display_name == spec.display_name && r.direction == spec.direction);
        if exists {
            return Ok(CreateOutcome::AlreadyExists);
        }

        state.rules.push(RuleRecord {
            display_name: spec.display_name.clone(),
            program_path: Some(spec.program_path.clone()),
            direction: spec.direction,
        });
        state.mutations += 1;
        Ok(CreateOutcome::Created)
    }

    async fn query_rules(&self, pattern: &NamePattern) -> Result<Vec<RuleRecord>, StoreError> {
        Ok(self
            .lock()
            .rules
            .iter()
            .filter(|r| pattern.matches(&r.display_name))
            .cloned()
            .collect())
    }

    async fn delete_rules(&self, records: &[RuleRecord]) -> Result<(), StoreError> {
        let mut state = self.lock();
        let before = state.rules.len();
        state.rules.retain(|r| {
            !records
                .iter()
                .any(|d| d.display_name == r.display_name && d.direction == r.direction)
        });
        let removed = before - state.rules.len();
        state.mutations += removed;
        Ok(())
    }
}
