//! Shared test utilities for core module tests
//!
//! This module is only compiled in test mode.

use crate::core::application::Application;
use crate::core::store::{
    CreateOutcome, Direction, MemoryRuleStore, NamePattern, RuleRecord, RuleSpec, RuleStore,
    StoreError,
};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mutex for tests that need exclusive access to environment variables.
///
/// ```ignore
/// let _guard = ENV_VAR_MUTEX.lock().unwrap();
/// unsafe {
///     std::env::set_var("APPBLOCK_ELEVATION_METHOD", "gsudo");
/// }
/// // ... test with custom env state ...
/// unsafe {
///     std::env::remove_var("APPBLOCK_ELEVATION_METHOD");
/// }
/// ```
pub static ENV_VAR_MUTEX: Mutex<()> = Mutex::new(());

/// Creates an empty file at `root/relative`, including parent directories.
pub fn touch(root: &Path, relative: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, b"").unwrap();
    path
}

/// `MyApp` blocking `*.exe` under `root`, excluding the given keywords.
pub fn application(root: &Path, keywords: &[&str]) -> Application {
    Application {
        name: "MyApp".to_string(),
        root_path: root.to_path_buf(),
        extensions: vec!["*.exe".to_string()],
        excluded_keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        excluded_files: Vec::new(),
    }
}

pub fn record(display_name: &str, direction: Direction) -> RuleRecord {
    RuleRecord {
        display_name: display_name.to_string(),
        program_path: Some(PathBuf::from("C:\\Program Files\\App\\app.exe")),
        direction,
    }
}

type CreatePredicate = Box<dyn Fn(&RuleSpec) -> bool + Send + Sync>;

/// Memory store that rejects selected creates and, optionally, every delete.
///
/// Counts every store call so tests can assert that nothing was attempted.
pub struct FailingStore {
    inner: MemoryRuleStore,
    fail_create: CreatePredicate,
    fail_deletes: bool,
    calls: AtomicUsize,
}

impl FailingStore {
    pub fn new(fail_create: impl Fn(&RuleSpec) -> bool + Send + Sync + 'static) -> Self {
        Self {
            inner: MemoryRuleStore::new(),
            fail_create: Box::new(fail_create),
            fail_deletes: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn fail_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    pub fn inner(&self) -> &MemoryRuleStore {
        &self.inner
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RuleStore for FailingStore {
    async fn create_rule(&self, spec: &RuleSpec) -> Result<CreateOutcome, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if (self.fail_create)(spec) {
            return Err(StoreError::CommandFailed {
                message: format!("injected failure for {}", spec.display_name),
                stderr: None,
                exit_code: Some(1),
            });
        }
        self.inner.create_rule(spec).await
    }

    async fn query_rules(&self, pattern: &NamePattern) -> Result<Vec<RuleRecord>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.query_rules(pattern).await
    }

    async fn delete_rules(&self, records: &[RuleRecord]) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes {
            return Err(StoreError::Partial {
                failed: records
                    .iter()
                    .map(|r| (r.display_name.clone(), "injected failure".to_string()))
                    .collect(),
            });
        }
        self.inner.delete_rules(records).await
    }
}
