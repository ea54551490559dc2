//! Building netsh commands, optionally through an elevation helper
//!
//! Changing Windows Defender Firewall rules requires an elevated process.
//! appblock never prompts by itself: it runs netsh directly unless an
//! elevation helper is requested.
//!
//! # Environment Variables
//!
//! - `APPBLOCK_NETSH_COMMAND`: Path of the netsh binary (default `netsh`).
//!   Useful when netsh is not on PATH.
//! - `APPBLOCK_ELEVATION_METHOD`: Wrap netsh in `sudo` (Windows 11 24H2+)
//!   or `gsudo`. `none` or unset runs netsh directly.
//!
//! # Security
//!
//! Arguments are passed to the process without shell interpretation.

use tokio::process::Command;

/// Environment variable overriding the netsh binary
pub const NETSH_COMMAND_ENV: &str = "APPBLOCK_NETSH_COMMAND";

/// Environment variable selecting an elevation helper
pub const ELEVATION_METHOD_ENV: &str = "APPBLOCK_ELEVATION_METHOD";

/// Error type for building netsh commands
#[derive(Debug, thiserror::Error)]
pub enum ElevationError {
    /// Requested elevation method is not available (binary not found)
    #[error("Elevation method '{0}' is not available (binary not found)")]
    MethodNotAvailable(String),

    /// Invalid value for `APPBLOCK_ELEVATION_METHOD`
    #[error("Invalid APPBLOCK_ELEVATION_METHOD '{0}'. Valid options: none, sudo, gsudo")]
    InvalidMethod(String),
}

/// How netsh is launched
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(ascii_case_insensitive)]
pub enum ElevationMethod {
    #[strum(serialize = "none")]
    Direct,
    #[strum(serialize = "sudo")]
    Sudo,
    #[strum(serialize = "gsudo")]
    Gsudo,
}

/// Checks if a binary exists in PATH
///
/// On Windows the `.exe` suffix is tried as well.
fn binary_exists(name: &str) -> bool {
    std::env::var_os("PATH")
        .and_then(|paths| {
            std::env::split_paths(&paths).find_map(|dir| {
                let full_path = dir.join(name);
                if full_path.is_file() || (cfg!(windows) && full_path.with_extension("exe").is_file())
                {
                    Some(full_path)
                } else {
                    None
                }
            })
        })
        .is_some()
}

/// Reads `APPBLOCK_ELEVATION_METHOD`, defaulting to direct execution.
pub fn elevation_method() -> Result<ElevationMethod, ElevationError> {
    match std::env::var(ELEVATION_METHOD_ENV) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<ElevationMethod>()
            .map_err(|_| ElevationError::InvalidMethod(value)),
        _ => Ok(ElevationMethod::Direct),
    }
}

/// Path of the netsh binary to run.
pub fn netsh_program() -> String {
    std::env::var(NETSH_COMMAND_ENV)
        .ok()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| "netsh".to_string())
}

/// Creates a netsh command with the specified arguments
///
/// # Errors
///
/// Returns `Err` if the elevation method is unknown or its helper binary is
/// not in PATH.
pub fn create_netsh_command(args: &[String]) -> Result<Command, ElevationError> {
    let program = netsh_program();

    match elevation_method()? {
        ElevationMethod::Direct => {
            let mut cmd = Command::new(program);
            cmd.args(args);
            Ok(cmd)
        }
        method @ (ElevationMethod::Sudo | ElevationMethod::Gsudo) => {
            let helper = method.to_string();
            if !binary_exists(&helper) {
                return Err(ElevationError::MethodNotAvailable(helper));
            }
            let mut cmd = Command::new(helper);
            cmd.arg(program).args(args);
            Ok(cmd)
        }
    }
}
