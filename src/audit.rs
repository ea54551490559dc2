/// Audit logging for rule-changing operations
///
/// Every block, remove and remove-all run is recorded as one JSON line,
/// including partial failures.
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Types of auditable events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    BlockApplication,
    RemoveApplication,
    RemoveAll,
}

/// A single audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Identifies one CLI invocation
    pub run_id: Uuid,

    /// When the event occurred (UTC)
    pub timestamp: chrono::DateTime<chrono::Utc>,

    pub event_type: EventType,

    /// Whether the operation succeeded completely
    pub success: bool,

    /// Additional structured data about the event
    pub details: serde_json::Value,

    /// Error message if operation failed
    pub error: Option<String>,
}

impl AuditEvent {
    pub fn new(
        run_id: Uuid,
        event_type: EventType,
        success: bool,
        details: serde_json::Value,
        error: Option<String>,
    ) -> Self {
        Self {
            run_id,
            timestamp: chrono::Utc::now(),
            event_type,
            success,
            details,
            error,
        }
    }
}

/// Audit log writer
pub struct AuditLog {
    log_path: PathBuf,
}

impl AuditLog {
    /// Opens the audit log in the state directory
    ///
    /// # Errors
    ///
    /// Returns `Err` if state directory cannot be determined
    pub fn new() -> std::io::Result<Self> {
        let mut log_path = crate::utils::get_state_dir().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "State directory not found")
        })?;
        log_path.push("audit.log");

        Ok(Self { log_path })
    }

    /// Uses an explicit log file
    pub fn at(log_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
        }
    }

    /// Appends an event to the audit log (JSON-lines format)
    ///
    /// # Errors
    ///
    /// Returns `Err` if file cannot be opened or written
    pub async fn log(&self, event: AuditEvent) -> std::io::Result<()> {
        let json = serde_json::to_string(&event)?;

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .await?;

        file.write_all(json.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.sync_all().await?;

        Ok(())
    }

    /// Reads the most recent events, newest first
    ///
    /// Lines that fail to parse are skipped.
    ///
    /// # Errors
    ///
    /// Returns `Err` if file cannot be read
    pub async fn read_recent(&self, count: usize) -> std::io::Result<Vec<AuditEvent>> {
        let content = tokio::fs::read_to_string(&self.log_path).await?;

        Ok(content
            .lines()
            .rev()
            .filter_map(|line| serde_json::from_str(line).ok())
            .take(count)
            .collect())
    }

    pub fn path(&self) -> &PathBuf {
        &self.log_path
    }
}

/// Writes `event` to the default audit log, logging (not returning) failures.
pub async fn record(event: AuditEvent) {
    match AuditLog::new() {
        Ok(audit) => {
            if let Err(e) = audit.log(event).await {
                tracing::warn!("Failed to write audit log: {}", e);
            }
        }
        Err(e) => tracing::warn!("Audit log unavailable: {}", e),
    }
}

/// Logs a block run
pub async fn log_block(run_id: Uuid, application: &str, report: &crate::ApplyReport) {
    record(AuditEvent::new(
        run_id,
        EventType::BlockApplication,
        report.is_complete(),
        serde_json::json!({
            "application": application,
            "created_pairs": report.created_pairs,
            "failed_files": report.failed_files,
            "skipped_files": report.skipped_files,
            "new_rules": report.new_rules,
        }),
        None,
    ))
    .await;
}

/// Logs a removal, for one application or all of them
pub async fn log_remove(
    run_id: Uuid,
    application: Option<&str>,
    removed: usize,
    error: Option<String>,
) {
    let event_type = if application.is_some() {
        EventType::RemoveApplication
    } else {
        EventType::RemoveAll
    };
    record(AuditEvent::new(
        run_id,
        event_type,
        error.is_none(),
        serde_json::json!({
            "application": application,
            "removed": removed,
        }),
        error,
    ))
    .await;
}
