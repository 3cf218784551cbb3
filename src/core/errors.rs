use std::path::PathBuf;
use std::time::Duration;

use crate::core::models::operation::Operation;

/// All errors raised while driving the external pgp tool.
///
/// Messages never include the passphrase. Tool diagnostics are
/// carried verbatim so the caller sees exactly what gpg reported.
#[derive(Debug, thiserror::Error)]
pub enum GpgPipeError {
    #[error("No request was provided")]
    MissingRequest,

    #[error(
        "Invalid {operation} request: {field} is required\n\n  \
         Check the options passed for this operation:\n    \
         → encrypt, decrypt and sign-encrypt need a recipient (-r)\n    \
         → sign and sign-encrypt need a local user (-u)\n    \
         → every operation needs an input and an output file"
    )]
    Validation {
        operation: Operation,
        field: &'static str,
    },

    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Unsupported operation: {detail}")]
    Unsupported { detail: String },

    #[error("gpg failed (exit code {exit_code}): {stderr}")]
    ToolFailed { exit_code: i32, stderr: String },

    #[error("The gpg process has already been disposed")]
    Disposed,

    #[error(
        "Failed to start {path}: {reason}\n\n  \
         Solutions:\n    \
         → Install GnuPG and make sure 'gpg' is in PATH\n    \
         → Or point to the binary: --gpg-path /path/to/gpg (or GPGPIPE_GPG)\n    \
         → Run 'gpgpipe check' to test the configured binary"
    )]
    SpawnFailed { path: PathBuf, reason: String },

    #[error(
        "gpg did not exit within {limit:?} and was terminated\n\n  \
         Raise the limit with --timeout or timeout_secs in the config file."
    )]
    Timeout { limit: Duration },

    #[error("Invalid configuration: {detail}")]
    InvalidConfig { detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GpgPipeError>;
