//! appblock - per-application firewall blocking
//!
//! Blocks all network traffic for the executables of an application by
//! creating one inbound and one outbound Windows Defender Firewall rule per
//! file, and manages those rules afterwards.
//!
//! # Usage
//!
//! ```bash
//! appblock block MyGame "C:\Games\MyGame"             # Block every *.exe
//! appblock block MyGame "C:\Games\MyGame" -e "*.dll"  # Custom patterns
//! appblock block MyGame "C:\Games\MyGame" -k update   # Skip files containing "update"
//! appblock block MyGame "C:\Games\MyGame" --replace   # Remove old rules first
//! appblock block MyGame "C:\Games\MyGame" --dry-run   # Preview only
//! appblock list                                       # Rules grouped by application
//! appblock remove MyGame                              # Remove one application's rules
//! appblock remove-all                                 # Remove every appblock rule
//! appblock history                                    # Recent audit events
//! ```
//!
//! All decisions are passed as flags; appblock never prompts.

use appblock::audit::{self, AuditLog};
use appblock::config::{self, AppConfig};
use appblock::core::error::NetshErrorPattern;
use appblock::core::grouper::removed_count;
use appblock::core::netsh::NetshRuleStore;
use appblock::core::store::StoreError;
use appblock::{Application, ApplyReport, Error, RuleGrouper, RuleManager, RuleNamer};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;

shadow_rs::shadow!(build);

/// Exit code when some files could not be blocked
const EXIT_PARTIAL: u8 = 2;

#[derive(Parser)]
#[command(name = "appblock")]
#[command(version = build::PKG_VERSION)]
#[command(about = "Block network access for an application's executables", long_about = None)]
struct Cli {
    /// Log debug details to the log file
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create inbound and outbound block rules for every matching file
    Block {
        /// Application name used to group the rules
        name: String,
        /// Directory to scan recursively
        root: PathBuf,
        /// File pattern to block (repeatable, default from config: *.exe)
        #[arg(short, long = "ext", value_name = "GLOB")]
        extensions: Vec<String>,
        /// Skip files whose name contains this text, case-insensitive (repeatable)
        #[arg(short = 'k', long = "exclude-keyword", value_name = "KEYWORD")]
        excluded_keywords: Vec<String>,
        /// Skip files with exactly this name (repeatable)
        #[arg(short = 'x', long = "exclude-file", value_name = "FILE")]
        excluded_files: Vec<String>,
        /// Remove the application's existing rules first
        #[arg(long)]
        replace: bool,
        /// Show what would be blocked without touching the firewall
        #[arg(long)]
        dry_run: bool,
    },
    /// List appblock rules grouped by application
    List,
    /// Remove all rules of one application
    Remove {
        /// Application name as shown by `list`
        name: String,
    },
    /// Remove every rule created by appblock
    RemoveAll,
    /// Show recent audit events
    History {
        /// Number of events to show
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
    },
    /// Show the configuration, or write the defaults
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        init: bool,
    },
}

fn main() -> ExitCode {
    let _ = appblock::utils::ensure_dirs();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    tracing::info!(
        "appblock {} ({} built {})",
        build::PKG_VERSION,
        build::SHORT_COMMIT,
        build::BUILD_TIME
    );

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let config = config::load_config();
    match runtime.block_on(handle_cli(cli.command, &config)) {
        Ok(code) => code,
        Err(e) => {
            print_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    if let Some(mut log_path) = appblock::utils::get_state_dir() {
        log_path.push("appblock.log");
        if let Ok(file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
        {
            tracing_subscriber::fmt()
                .with_max_level(level)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
            return;
        }
    }

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn print_error(e: &Error) {
    eprintln!("Error: {e}");
    if let Error::Store(store_error) = e {
        let raw = match store_error {
            StoreError::CommandFailed {
                stderr: Some(stderr),
                ..
            } => stderr.clone(),
            StoreError::Partial { failed } => failed
                .first()
                .map(|(_, msg)| msg.clone())
                .unwrap_or_default(),
            other => other.to_string(),
        };
        let translation = NetshErrorPattern::match_error(&raw);
        eprintln!("{}", translation.user_message);
        for suggestion in &translation.suggestions {
            eprintln!("  - {suggestion}");
        }
        if let Some(url) = translation.help_url {
            eprintln!("  See: {url}");
        }
    }
}

async fn handle_cli(command: Commands, config: &AppConfig) -> Result<ExitCode, Error> {
    let namer = config.namer();
    let store = NetshRuleStore::new();
    let run_id = Uuid::new_v4();

    match command {
        Commands::Block {
            name,
            root,
            extensions,
            mut excluded_keywords,
            mut excluded_files,
            replace,
            dry_run,
        } => {
            let extensions = if extensions.is_empty() {
                config.default_extensions.clone()
            } else {
                extensions
            };
            excluded_keywords.extend(config.default_excluded_keywords.iter().cloned());
            excluded_files.extend(config.default_excluded_files.iter().cloned());

            let app = Application::new(&name, root, extensions, excluded_keywords, excluded_files)?;

            if dry_run {
                print_plan(&app, &namer)?;
                return Ok(ExitCode::SUCCESS);
            }

            if replace {
                let grouper = RuleGrouper::new(&store, &namer);
                let owned = grouper.list_owned_rules().await?;
                let requested = grouper.records_for(&owned, &app.name).len();
                let result = grouper.remove_for_application(&owned, &app.name).await;
                audit::log_remove(
                    run_id,
                    Some(&app.name),
                    removed_count(requested, &result),
                    result.as_ref().err().map(ToString::to_string),
                )
                .await;
                println!("Removed {} existing rule(s) for '{}'.", result?, app.name);
            }

            let report = RuleManager::new(&store, &namer).apply(&app).await?;
            audit::log_block(run_id, &app.name, &report).await;
            print_report(&app, &report);

            if report.is_complete() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(EXIT_PARTIAL))
            }
        }
        Commands::List => {
            let grouper = RuleGrouper::new(&store, &namer);
            let owned = grouper.list_owned_rules().await?;
            if owned.is_empty() {
                println!("No appblock rules found.");
                return Ok(ExitCode::SUCCESS);
            }

            for (application, records) in grouper.group_by_application(&owned) {
                println!("{application} ({} rule(s))", records.len());
                for record in records {
                    println!("    [{}] {}", record.direction, record.display_name);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Remove { name } => {
            let grouper = RuleGrouper::new(&store, &namer);
            let owned = grouper.list_owned_rules().await?;
            let requested = grouper.records_for(&owned, name.trim()).len();
            let result = grouper.remove_for_application(&owned, name.trim()).await;
            audit::log_remove(
                run_id,
                Some(name.trim()),
                removed_count(requested, &result),
                result.as_ref().err().map(ToString::to_string),
            )
            .await;

            match result? {
                0 => println!("No rules found for '{}'.", name.trim()),
                n => println!("✓ Removed {n} rule(s) for '{}'.", name.trim()),
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::RemoveAll => {
            let grouper = RuleGrouper::new(&store, &namer);
            let owned = grouper.list_owned_rules().await?;
            let result = grouper.remove_all(&owned).await;
            audit::log_remove(
                run_id,
                None,
                removed_count(owned.len(), &result),
                result.as_ref().err().map(ToString::to_string),
            )
            .await;
            result?;
            println!("✓ Removed {} rule(s).", owned.len());
            Ok(ExitCode::SUCCESS)
        }
        Commands::History { count } => {
            let audit = AuditLog::new()?;
            let events = match audit.read_recent(count).await {
                Ok(events) => events,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
                Err(e) => return Err(e.into()),
            };
            if events.is_empty() {
                println!("No audit events recorded yet.");
            }
            for event in events {
                println!(
                    "{} {:?} {} {}{}",
                    event.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    event.event_type,
                    if event.success { "ok" } else { "FAILED" },
                    event.details,
                    event.error.map(|e| format!(" ({e})")).unwrap_or_default()
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config { init } => {
            if init {
                config::save_config(config)?;
                println!("✓ Configuration saved.");
            }
            println!("{}", serde_json::to_string_pretty(config)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_plan(app: &Application, namer: &RuleNamer) -> Result<(), Error> {
    let store = appblock::MemoryRuleStore::new();
    let plan = RuleManager::new(&store, namer).plan(app)?;

    println!("Would block {} file(s) for '{}':", plan.files.len(), app.name);
    for file in &plan.files {
        println!("  {}", file.candidate.full_path.display());
        for spec in &file.specs {
            println!("      {}", spec.display_name);
        }
    }
    for skipped in &plan.skipped {
        println!(
            "  skip {} ({})",
            skipped.candidate.full_path.display(),
            skipped.reason
        );
    }
    Ok(())
}

fn print_report(app: &Application, report: &ApplyReport) {
    println!("Application: {}", app.name);
    println!("  Blocked:  {} file(s)", report.created_pairs);
    println!("  Skipped:  {} file(s)", report.skipped_files);
    println!("  Failed:   {} file(s)", report.failed_files);
    println!("  New rules: {}", report.new_rules);

    for failure in &report.failures {
        println!("  ✗ {}", failure.candidate.full_path.display());
        for err in &failure.errors {
            println!("      {}: {}", err.direction, err.error);
        }
    }

    if report.is_complete() {
        println!("✓ All files blocked.");
    }
}
