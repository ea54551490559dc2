//! Discovery, grouping and removal of rules created by appblock
//!
//! The firewall has no notion of which application a rule belongs to, so
//! ownership is recovered from display names via [`RuleNamer::application_of`].
//! Rules that carry the prefix but do not parse are kept under
//! [`UNKNOWN_APPLICATION`] so removal always accounts for every owned rule.

use crate::core::error::{Error, Result};
use crate::core::naming::RuleNamer;
use crate::core::store::{NamePattern, RuleRecord, RuleStore, StoreError};
use crate::validators::validate_rule_prefix;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Group name for owned rules whose names do not follow the convention
pub const UNKNOWN_APPLICATION: &str = "Unknown Application";

/// Lists and removes owned rules
pub struct RuleGrouper<'a, S> {
    store: &'a S,
    namer: &'a RuleNamer,
}

impl<'a, S: RuleStore> RuleGrouper<'a, S> {
    pub fn new(store: &'a S, namer: &'a RuleNamer) -> Self {
        Self { store, namer }
    }

    /// All rules whose display name starts with the rule prefix.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` without querying the store if the prefix
    /// is blank or too long, and `Error::Store` if the store cannot be
    /// queried.
    pub async fn list_owned_rules(&self) -> Result<Vec<RuleRecord>> {
        // A blank prefix would claim every rule in the firewall
        validate_rule_prefix(self.namer.prefix())?;

        let records = self
            .store
            .query_rules(&NamePattern::Prefix(self.namer.prefix().to_string()))
            .await?;
        info!("Found {} owned rule(s)", records.len());
        Ok(records)
    }

    /// Application group a record belongs to.
    pub fn group_of<'r>(&self, record: &'r RuleRecord) -> &'r str {
        self.namer
            .application_of(&record.display_name)
            .unwrap_or(UNKNOWN_APPLICATION)
    }

    /// Groups records by recovered application name.
    ///
    /// Every record appears in exactly one group.
    pub fn group_by_application(&self, records: &[RuleRecord]) -> BTreeMap<String, Vec<RuleRecord>> {
        let mut groups: BTreeMap<String, Vec<RuleRecord>> = BTreeMap::new();
        for record in records {
            groups
                .entry(self.group_of(record).to_string())
                .or_default()
                .push(record.clone());
        }
        groups
    }

    /// Records belonging to `application`, using the grouping predicate.
    pub fn records_for(&self, records: &[RuleRecord], application: &str) -> Vec<RuleRecord> {
        records
            .iter()
            .filter(|r| self.group_of(r) == application)
            .cloned()
            .collect()
    }

    /// Deletes every record in one batch.
    ///
    /// # Errors
    ///
    /// Returns `Error::Store` if the store reports any failure; deletions are
    /// not retried.
    pub async fn remove_all(&self, records: &[RuleRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        info!("Removing {} rule(s)", records.len());
        self.store.delete_rules(records).await.map_err(|e| {
            warn!("Bulk removal failed: {e}");
            e
        })?;
        Ok(())
    }

    /// Deletes the records belonging to `application` and returns how many
    /// were removed. Pass [`UNKNOWN_APPLICATION`] to remove unparseable rules.
    ///
    /// # Errors
    ///
    /// Returns `Error::Store` if the store reports any failure.
    pub async fn remove_for_application(
        &self,
        records: &[RuleRecord],
        application: &str,
    ) -> Result<usize> {
        let selected = self.records_for(records, application);

        if selected.is_empty() {
            info!("No rules found for '{application}'");
            return Ok(0);
        }

        info!("Removing {} rule(s) for '{application}'", selected.len());
        self.remove_all(&selected).await?;
        Ok(selected.len())
    }
}

/// How many of `requested` deletions took effect, given the outcome of
/// [`RuleGrouper::remove_all`] or [`RuleGrouper::remove_for_application`].
pub fn removed_count<T>(requested: usize, result: &Result<T>) -> usize {
    match result {
        Ok(_) => requested,
        Err(Error::Store(StoreError::Partial { failed })) => {
            requested.saturating_sub(failed.len())
        }
        Err(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::{Direction, MemoryRuleStore};
    use crate::core::test_helpers::{FailingStore, record};

    #[test]
    fn test_group_by_application() {
        let store = MemoryRuleStore::new();
        let namer = RuleNamer::default();
        let grouper = RuleGrouper::new(&store, &namer);

        let records = vec![
            record(&namer.name("MyApp", "tool.exe", Direction::Inbound), Direction::Inbound),
            record(&namer.name("MyApp", "tool.exe", Direction::Outbound), Direction::Outbound),
            record(&namer.name("Other", "o.exe", Direction::Inbound), Direction::Inbound),
            record("AppBlocker Rule -garbled", Direction::Inbound),
        ];

        let groups = grouper.group_by_application(&records);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups["MyApp"].len(), 2);
        assert_eq!(groups["Other"].len(), 1);
        assert_eq!(groups[UNKNOWN_APPLICATION].len(), 1);

        let total: usize = groups.values().map(Vec::len).sum();
        assert_eq!(total, records.len());
    }

    #[tokio::test]
    async fn test_list_only_owned_rules() {
        let namer = RuleNamer::default();
        let store = MemoryRuleStore::with_records(vec![
            record(&namer.name("A", "a.exe", Direction::Inbound), Direction::Inbound),
            record("Core Networking - DNS (UDP-Out)", Direction::Outbound),
        ]);

        let owned = RuleGrouper::new(&store, &namer).list_owned_rules().await.unwrap();
        assert_eq!(owned.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_for_application() {
        let namer = RuleNamer::default();
        let store = MemoryRuleStore::with_records(vec![
            record(&namer.name("A", "a.exe", Direction::Inbound), Direction::Inbound),
            record(&namer.name("A", "a.exe", Direction::Outbound), Direction::Outbound),
            record(&namer.name("B", "b.exe", Direction::Inbound), Direction::Inbound),
        ]);
        let grouper = RuleGrouper::new(&store, &namer);

        let owned = grouper.list_owned_rules().await.unwrap();
        assert_eq!(grouper.remove_for_application(&owned, "A").await.unwrap(), 2);

        let left = grouper.list_owned_rules().await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(grouper.group_of(&left[0]), "B");

        // Unknown group name is a no-op
        assert_eq!(grouper.remove_for_application(&left, "Nope").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_remove_unknown_group() {
        let namer = RuleNamer::default();
        let store = MemoryRuleStore::with_records(vec![
            record("AppBlocker Rule -odd", Direction::Inbound),
            record(&namer.name("A", "a.exe", Direction::Inbound), Direction::Inbound),
        ]);
        let grouper = RuleGrouper::new(&store, &namer);

        let owned = grouper.list_owned_rules().await.unwrap();
        let removed = grouper
            .remove_for_application(&owned, UNKNOWN_APPLICATION)
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.records().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_all_empties_owned_rules() {
        let namer = RuleNamer::default();
        let store = MemoryRuleStore::with_records(vec![
            record(&namer.name("A", "a.exe", Direction::Inbound), Direction::Inbound),
            record(&namer.name("B", "b.exe", Direction::Outbound), Direction::Outbound),
            record("Core Networking - DNS (UDP-Out)", Direction::Outbound),
        ]);
        let grouper = RuleGrouper::new(&store, &namer);

        let owned = grouper.list_owned_rules().await.unwrap();
        grouper.remove_all(&owned).await.unwrap();

        assert!(grouper.list_owned_rules().await.unwrap().is_empty());
        // Foreign rules are untouched
        assert_eq!(store.records().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_prefix_claims_nothing() {
        let foreign = vec![
            record("Core Networking - DNS (UDP-Out)", Direction::Outbound),
            record("Remote Desktop - User Mode (TCP-In)", Direction::Inbound),
        ];
        let store = MemoryRuleStore::with_records(foreign.clone());
        let namer = RuleNamer::new("");

        let err = RuleGrouper::new(&store, &namer)
            .list_owned_rules()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "rule_prefix"));
        assert_eq!(store.records(), foreign);
    }

    #[tokio::test]
    async fn test_overlong_prefix_is_rejected_before_query() {
        let store = FailingStore::new(|_| false);
        let namer = RuleNamer::new("X".repeat(30));

        let result = RuleGrouper::new(&store, &namer).list_owned_rules().await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        assert_eq!(store.calls(), 0);
    }

    #[test]
    fn test_longest_name_under_valid_prefix_still_groups() {
        let store = MemoryRuleStore::new();
        let namer = RuleNamer::new("P".repeat(17));
        let app = "a".repeat(crate::validators::MAX_APPLICATION_NAME_LEN);
        let name = namer.name(&app, &"f".repeat(100), Direction::Inbound);

        let grouper = RuleGrouper::new(&store, &namer);
        assert_eq!(grouper.group_of(&record(&name, Direction::Inbound)), app);
    }

    #[test]
    fn test_removed_count() {
        assert_eq!(removed_count(5, &Ok(())), 5);
        assert_eq!(removed_count(4, &Ok::<usize, Error>(4)), 4);

        let partial: Result<()> = Err(Error::Store(StoreError::Partial {
            failed: vec![("a".into(), "denied".into())],
        }));
        assert_eq!(removed_count(3, &partial), 2);

        let spawn: Result<()> = Err(Error::Store(StoreError::Spawn("no netsh".into())));
        assert_eq!(removed_count(3, &spawn), 0);
    }

    #[tokio::test]
    async fn test_remove_all_empty_makes_no_call() {
        let store = FailingStore::new(|_| true);
        let namer = RuleNamer::default();
        RuleGrouper::new(&store, &namer).remove_all(&[]).await.unwrap();
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_remove_surfaces_store_error() {
        let namer = RuleNamer::default();
        let store = FailingStore::new(|_| false).fail_deletes();
        let records = vec![record(
            &namer.name("A", "a.exe", Direction::Inbound),
            Direction::Inbound,
        )];

        let err = RuleGrouper::new(&store, &namer)
            .remove_all(&records)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Store(StoreError::Partial { .. })));
    }
}
