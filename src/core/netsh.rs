//! Windows Defender Firewall backend driven through `netsh advfirewall`
//!
//! netsh cannot filter by name prefix, so prefix queries list every rule and
//! filter client-side. Rule names are not unique in Windows Firewall; a
//! delete removes every rule with the given name and direction.

use crate::core::store::{
    CreateOutcome, Direction, NamePattern, RuleRecord, RuleSpec, RuleStore, StoreError,
};
use crate::elevation::create_netsh_command;
use std::path::PathBuf;
use std::process::Output;
use tracing::{debug, error, info, warn};

/// Printed by netsh when a `show` or `delete` selects nothing
const NO_MATCH_MESSAGE: &str = "No rules match the specified criteria.";

/// Rule store backed by the host firewall
#[derive(Debug, Default, Clone)]
pub struct NetshRuleStore;

impl NetshRuleStore {
    pub fn new() -> Self {
        Self
    }

    async fn run(&self, args: Vec<String>) -> Result<Output, StoreError> {
        debug!("netsh {}", args.join(" "));

        let mut cmd = create_netsh_command(&args).map_err(|e| StoreError::Spawn(e.to_string()))?;
        cmd.stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());

        cmd.output().await.map_err(|e| {
            error!("Failed to spawn netsh: {e}");
            StoreError::Spawn(e.to_string())
        })
    }
}

impl RuleStore for NetshRuleStore {
    async fn create_rule(&self, spec: &RuleSpec) -> Result<CreateOutcome, StoreError> {
        let output = self.run(add_rule_args(spec)).await?;

        if output.status.success() {
            Ok(CreateOutcome::Created)
        } else {
            Err(command_failure(&output))
        }
    }

    async fn query_rules(&self, pattern: &NamePattern) -> Result<Vec<RuleRecord>, StoreError> {
        let output = self.run(show_rule_args(pattern)).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        if stdout.contains(NO_MATCH_MESSAGE) {
            return Ok(Vec::new());
        }
        if !output.status.success() {
            return Err(command_failure(&output));
        }

        let records = parse_show_rule_output(&stdout)?;
        Ok(records
            .into_iter()
            .filter(|r| pattern.matches(&r.display_name))
            .collect())
    }

    async fn delete_rules(&self, records: &[RuleRecord]) -> Result<(), StoreError> {
        let mut failed = Vec::new();

        for record in records {
            match self.run(delete_rule_args(record)).await {
                Ok(output) if output.status.success() => {
                    debug!("Deleted rule: {}", record.display_name);
                }
                Ok(output) => {
                    let stdout = String::from_utf8_lossy(&output.stdout);
                    if stdout.contains(NO_MATCH_MESSAGE) {
                        // Already gone; an earlier delete of the same name took it
                        debug!("Rule already removed: {}", record.display_name);
                        continue;
                    }
                    let err = command_failure(&output);
                    warn!("Failed to delete '{}': {err}", record.display_name);
                    failed.push((record.display_name.clone(), err.to_string()));
                }
                Err(e) => failed.push((record.display_name.clone(), e.to_string())),
            }
        }

        if failed.is_empty() {
            info!("Deleted {} rule(s)", records.len());
            Ok(())
        } else {
            Err(StoreError::Partial { failed })
        }
    }
}

/// `netsh advfirewall firewall add rule ...` arguments for one spec.
pub fn add_rule_args(spec: &RuleSpec) -> Vec<String> {
    vec![
        "advfirewall".into(),
        "firewall".into(),
        "add".into(),
        "rule".into(),
        format!("name={}", spec.display_name),
        format!("dir={}", spec.direction.netsh_value()),
        format!("program={}", spec.program_path.display()),
        format!("action={}", spec.action),
        format!("profile={}", spec.profile),
        "enable=yes".into(),
    ]
}

/// `netsh advfirewall firewall show rule ...` arguments for a name filter.
pub fn show_rule_args(pattern: &NamePattern) -> Vec<String> {
    let name = match pattern {
        NamePattern::Exact(name) => name.as_str(),
        NamePattern::Prefix(_) => "all",
    };
    vec![
        "advfirewall".into(),
        "firewall".into(),
        "show".into(),
        "rule".into(),
        format!("name={name}"),
        "verbose".into(),
    ]
}

/// `netsh advfirewall firewall delete rule ...` arguments for one record.
pub fn delete_rule_args(record: &RuleRecord) -> Vec<String> {
    vec![
        "advfirewall".into(),
        "firewall".into(),
        "delete".into(),
        "rule".into(),
        format!("name={}", record.display_name),
        format!("dir={}", record.direction.netsh_value()),
    ]
}

/// Parses the block-per-rule output of `show rule ... verbose`.
///
/// Only `Rule Name`, `Direction` and `Program` are read. Blocks without a
/// recognizable direction are skipped.
///
/// # Errors
///
/// Returns [`StoreError::Parse`] if the output is non-empty but contains no
/// rule blocks at all.
pub fn parse_show_rule_output(stdout: &str) -> Result<Vec<RuleRecord>, StoreError> {
    let mut records = Vec::new();
    let mut current: Option<PartialRecord> = None;
    let mut saw_block = false;

    for line in stdout.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();

        match key.trim() {
            "Rule Name" => {
                saw_block = true;
                if let Some(done) = current.take().and_then(PartialRecord::finish) {
                    records.push(done);
                }
                current = Some(PartialRecord::new(value));
            }
            "Direction" => {
                if let Some(rec) = current.as_mut() {
                    rec.direction = match value {
                        "In" => Some(Direction::Inbound),
                        "Out" => Some(Direction::Outbound),
                        _ => None,
                    };
                }
            }
            "Program" => {
                if let Some(rec) = current.as_mut()
                    && !value.is_empty()
                    && !value.eq_ignore_ascii_case("any")
                {
                    rec.program_path = Some(PathBuf::from(value));
                }
            }
            _ => {}
        }
    }

    if let Some(done) = current.and_then(PartialRecord::finish) {
        records.push(done);
    }

    if !saw_block && stdout.lines().any(|l| !l.trim().is_empty() && l.trim() != "Ok.") {
        return Err(StoreError::Parse(
            stdout.lines().next().unwrap_or_default().to_string(),
        ));
    }

    Ok(records)
}

struct PartialRecord {
    display_name: String,
    direction: Option<Direction>,
    program_path: Option<PathBuf>,
}

impl PartialRecord {
    fn new(display_name: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            direction: None,
            program_path: None,
        }
    }

    fn finish(self) -> Option<RuleRecord> {
        match self.direction {
            Some(direction) => Some(RuleRecord {
                display_name: self.display_name,
                program_path: self.program_path,
                direction,
            }),
            None => {
                warn!("Ignoring rule without direction: {}", self.display_name);
                None
            }
        }
    }
}

fn command_failure(output: &Output) -> StoreError {
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    // netsh reports most errors on stdout
    let message = if stderr.is_empty() {
        stdout.clone()
    } else {
        stderr.clone()
    };

    StoreError::CommandFailed {
        message: if message.is_empty() {
            format!("netsh exited with {}", output.status)
        } else {
            message
        },
        stderr: (!stderr.is_empty()).then_some(stderr),
        exit_code: output.status.code(),
    }
}
