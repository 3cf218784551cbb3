use std::ffi::OsString;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use crate::core::errors::Result;

/// One external process with redirected stdin, stdout and stderr.
///
/// Lifecycle: created, then `start`, then `wait_for_exit`, then `dispose`.
/// `dispose` may be called from any state and more than once. After it,
/// `start`, `input` and `wait_for_exit` fail with `GpgPipeError::Disposed`.
pub trait ToolProcess {
    /// Spawn the process and begin capturing its output.
    ///
    /// Returns `Ok(false)` if the OS refused to spawn it; the reason is
    /// then available from `start_error`.
    fn start(&mut self) -> Result<bool>;

    /// Why the last `start` returned `false`, if it did.
    fn start_error(&self) -> Option<&str>;

    /// Sink bound to the child's standard input.
    fn input(&mut self) -> Result<&mut dyn Write>;

    /// Close stdin, block until the child exits and all output is captured.
    fn wait_for_exit(&mut self) -> Result<()>;

    /// Exit code recorded by `wait_for_exit`; -1 if terminated by a signal.
    fn exit_code(&self) -> i32;

    /// Captured standard output, stable once `wait_for_exit` has returned.
    fn output(&self) -> String;

    /// Captured standard error, stable once `wait_for_exit` has returned.
    fn error(&self) -> String;

    /// Release the OS handle. Idempotent.
    fn dispose(&mut self);
}

/// Creates `ToolProcess` instances; the seam tests use to observe spawns.
pub trait ProcessFactory {
    type Process: ToolProcess;

    fn create(&self, program: &Path, args: &[OsString], timeout: Option<Duration>) -> Self::Process;
}
