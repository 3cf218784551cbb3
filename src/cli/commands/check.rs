use std::process::Command;

use crate::cli::output;
use crate::core::errors::{GpgPipeError, Result};

/// Execute the `gpgpipe check` command.
///
/// Resolves the configured executable and runs `--version` to confirm
/// it can be started.
pub fn execute() -> Result<()> {
    let config = crate::config::gpg_config::current();

    let resolved =
        which::which(&config.gpg_path).map_err(|e| GpgPipeError::SpawnFailed {
            path: config.gpg_path.clone(),
            reason: e.to_string(),
        })?;

    output::header("Checking gpg");
    output::detail(&format!("Executable: {}", resolved.display()));

    let out = Command::new(&resolved)
        .arg("--version")
        .output()
        .map_err(|e| GpgPipeError::SpawnFailed {
            path: resolved.clone(),
            reason: e.to_string(),
        })?;

    if !out.status.success() {
        return Err(GpgPipeError::ToolFailed {
            exit_code: out.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&out.stdout);
    let version = stdout.lines().next().unwrap_or("unknown version");
    output::success(&format!("{version} is ready"));
    Ok(())
}
