//! Rule creation path
//!
//! [`RuleManager::apply`] scans an application's directory, drops excluded
//! files, and makes sure an Inbound and an Outbound block rule exist for
//! every remaining file. Creation is idempotent by display name: a rule that
//! is already present counts as success without touching the store.
//!
//! The two rules of a file are the unit of success for reporting, though the
//! underlying store calls are not transactional. A file whose second rule
//! fails is reported as failed while its first rule stays in place; the next
//! run picks it up through the idempotency check.

use crate::core::application::Application;
use crate::core::error::Result;
use crate::core::exclusion::{SkippedFile, partition};
use crate::core::naming::RuleNamer;
use crate::core::scanner::{FileCandidate, scan, validate_root};
use crate::core::store::{CreateOutcome, Direction, NamePattern, RuleSpec, RuleStore, StoreError};
use strum::IntoEnumIterator;
use tracing::{debug, error, info, warn};

/// What happened to a single rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    /// The store created a new rule
    Created,
    /// A rule with the same name was already there
    AlreadyPresent,
}

/// One direction of a file that could not be ensured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectionFailure {
    pub direction: Direction,
    pub display_name: String,
    pub error: StoreError,
}

/// A file whose rule pair was not fully ensured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub candidate: FileCandidate,
    pub errors: Vec<DirectionFailure>,
}

/// Aggregate result of [`RuleManager::apply`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Files with both rules present after the run
    pub created_pairs: usize,
    /// Files with at least one rule missing after the run
    pub failed_files: usize,
    /// Files left alone because of exclusions
    pub skipped_files: usize,
    /// Rules actually added to the store during this run
    pub new_rules: usize,
    pub skipped: Vec<SkippedFile>,
    pub failures: Vec<FileFailure>,
}

impl ApplyReport {
    pub fn is_complete(&self) -> bool {
        self.failed_files == 0
    }
}

/// Rules that would be ensured for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    pub candidate: FileCandidate,
    pub specs: Vec<RuleSpec>,
}

/// Result of scanning and filtering without touching the store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub files: Vec<PlannedFile>,
    pub skipped: Vec<SkippedFile>,
}

/// Orchestrates scanning, naming and idempotent creation
pub struct RuleManager<'a, S> {
    store: &'a S,
    namer: &'a RuleNamer,
}

impl<'a, S: RuleStore> RuleManager<'a, S> {
    pub fn new(store: &'a S, namer: &'a RuleNamer) -> Self {
        Self { store, namer }
    }

    /// Builds the Inbound and Outbound specs for one file.
    pub fn specs_for(&self, application: &str, candidate: &FileCandidate) -> Vec<RuleSpec> {
        Direction::iter()
            .map(|direction| {
                RuleSpec::block(
                    self.namer.name(application, &candidate.file_name, direction),
                    direction,
                    candidate.full_path.clone(),
                )
            })
            .collect()
    }

    /// Scans and filters, returning the rules `apply` would ensure.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPath` or `Error::Scan` if the root cannot be
    /// used, and `Error::Validation` for malformed globs.
    pub fn plan(&self, application: &Application) -> Result<Plan> {
        validate_root(&application.root_path)?;

        let candidates = scan(&application.root_path, &application.extensions)?;
        let found = candidates.len();
        let partitioned = partition(
            candidates,
            &application.excluded_files,
            &application.excluded_keywords,
        );

        for skipped in &partitioned.to_skip {
            info!(
                "Skipping {} ({})",
                skipped.candidate.full_path.display(),
                skipped.reason
            );
        }

        debug!(
            "{}: {found} file(s) found, {} to block, {} skipped",
            application.name,
            partitioned.to_block.len(),
            partitioned.to_skip.len()
        );

        let files = partitioned
            .to_block
            .into_iter()
            .map(|candidate| PlannedFile {
                specs: self.specs_for(&application.name, &candidate),
                candidate,
            })
            .collect();

        Ok(Plan {
            files,
            skipped: partitioned.to_skip,
        })
    }

    /// Ensures a block rule pair exists for every retained file.
    ///
    /// Store failures are recorded per file and never abort the run.
    ///
    /// # Errors
    ///
    /// Only fails before any store call: invalid root, unreadable root, or a
    /// malformed glob.
    pub async fn apply(&self, application: &Application) -> Result<ApplyReport> {
        let plan = self.plan(application)?;

        let mut report = ApplyReport {
            skipped_files: plan.skipped.len(),
            skipped: plan.skipped,
            ..ApplyReport::default()
        };

        if plan.files.is_empty() {
            info!("{}: no files to block", application.name);
            return Ok(report);
        }

        info!(
            "{}: ensuring block rules for {} file(s)",
            application.name,
            plan.files.len()
        );

        for file in plan.files {
            let mut errors = Vec::new();

            for spec in &file.specs {
                match self.ensure_rule(spec).await {
                    Ok(RuleOutcome::Created) => report.new_rules += 1,
                    Ok(RuleOutcome::AlreadyPresent) => {}
                    Err(e) => {
                        error!("Failed to create rule '{}': {e}", spec.display_name);
                        errors.push(DirectionFailure {
                            direction: spec.direction,
                            display_name: spec.display_name.clone(),
                            error: e,
                        });
                    }
                }
            }

            if errors.is_empty() {
                report.created_pairs += 1;
            } else {
                warn!(
                    "{}: {} of {} rules failed",
                    file.candidate.full_path.display(),
                    errors.len(),
                    file.specs.len()
                );
                report.failed_files += 1;
                report.failures.push(FileFailure {
                    candidate: file.candidate,
                    errors,
                });
            }
        }

        info!(
            "{}: {} pair(s) in place, {} failed, {} skipped, {} new rule(s)",
            application.name,
            report.created_pairs,
            report.failed_files,
            report.skipped_files,
            report.new_rules
        );

        Ok(report)
    }

    /// Check-then-create for a single rule.
    async fn ensure_rule(&self, spec: &RuleSpec) -> std::result::Result<RuleOutcome, StoreError> {
        let existing = self
            .store
            .query_rules(&NamePattern::Exact(spec.display_name.clone()))
            .await?;

        if !existing.is_empty() {
            debug!("Rule already exists: {}", spec.display_name);
            return Ok(RuleOutcome::AlreadyPresent);
        }

        match self.store.create_rule(spec).await? {
            CreateOutcome::Created => {
                debug!("Created rule: {}", spec.display_name);
                Ok(RuleOutcome::Created)
            }
            CreateOutcome::AlreadyExists => Ok(RuleOutcome::AlreadyPresent),
        }
    }
}
