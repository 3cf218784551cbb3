use std::io::{ErrorKind, Read, Write};
use std::ops::{Deref, DerefMut};

use secrecy::ExposeSecret;

use crate::adapters::gpg::command_builder;
use crate::adapters::process::redirected_process::OsProcessFactory;
use crate::config::gpg_config::GpgConfig;
use crate::core::errors::{GpgPipeError, Result};
use crate::core::models::data_request::{FileDataRequest, StreamDataRequest};
use crate::core::traits::pgp_tool::PgpTool;
use crate::core::traits::process::{ProcessFactory, ToolProcess};

/// `PgpTool` implemented by running a GnuPG-compatible binary.
///
/// Each call owns exactly one child process. Nothing is shared between
/// calls, so a single `GpgTool` can serve any number of requests.
pub struct GpgTool<F: ProcessFactory = OsProcessFactory> {
    config: GpgConfig,
    factory: F,
}

impl GpgTool {
    /// Create a tool that spawns real processes.
    pub fn new(config: GpgConfig) -> Self {
        Self::with_factory(config, OsProcessFactory)
    }
}

impl<F: ProcessFactory> GpgTool<F> {
    /// Create a tool with a custom process factory.
    pub fn with_factory(config: GpgConfig, factory: F) -> Self {
        Self { config, factory }
    }

    fn remove_partial_output(&self, request: &FileDataRequest) {
        if !self.config.cleanup_on_failure || !request.output_file.exists() {
            return;
        }
        match std::fs::remove_file(&request.output_file) {
            Ok(()) => tracing::debug!(
                path = %request.output_file.display(),
                "removed output left by failed gpg run"
            ),
            Err(e) => tracing::warn!(
                path = %request.output_file.display(),
                error = %e,
                "could not remove output left by failed gpg run"
            ),
        }
    }
}

impl<F: ProcessFactory> PgpTool for GpgTool<F> {
    fn process_file(&self, request: Option<&FileDataRequest>) -> Result<()> {
        let request = request.ok_or(GpgPipeError::MissingRequest)?;
        request.validate()?;

        let cmd = command_builder::for_file(request);
        tracing::debug!(gpg = %self.config.gpg_path.display(), args = %cmd, "gpg args");

        let mut proc = Scoped(self.factory.create(
            &self.config.gpg_path,
            cmd.args(),
            self.config.wait_timeout,
        ));

        if !proc.start()? {
            return Err(GpgPipeError::SpawnFailed {
                path: self.config.gpg_path.clone(),
                reason: proc.start_error().unwrap_or("unknown error").to_string(),
            });
        }

        if request.request.needs_passphrase() {
            if let Some(passphrase) = &request.request.passphrase {
                push_passphrase(proc.input()?, passphrase.expose_secret())?;
            }
        }

        proc.wait_for_exit()?;

        let exit_code = proc.exit_code();
        let stderr = proc.error();
        tracing::debug!(output = %proc.output(), "gpg output");
        tracing::debug!(exit_code, "gpg exit code");

        let outcome = classify(exit_code, stderr);
        if let Err(e) = &outcome {
            tracing::debug!(error = %e, "gpg error");
            self.remove_partial_output(request);
        }
        outcome
    }

    fn process_stream(&self, request: Option<StreamDataRequest>) -> Result<Box<dyn Read>> {
        if let Some(StreamDataRequest { request, input }) = request {
            tracing::debug!(operation = %request.operation, "rejecting stream request");
            drop(input);
        }
        Err(GpgPipeError::Unsupported {
            detail: "stream input cannot be processed; write the data to a file and \
                     submit a file request instead"
                .into(),
        })
    }
}

/// Write the passphrase line to gpg's stdin.
///
/// A closed pipe means gpg already gave up; its own diagnostics
/// are more useful than ours, so carry on to the wait.
fn push_passphrase(input: &mut dyn Write, passphrase: &str) -> Result<()> {
    let written = input
        .write_all(passphrase.as_bytes())
        .and_then(|()| input.write_all(b"\n"))
        .and_then(|()| input.flush());
    match written {
        Err(e) if e.kind() == ErrorKind::BrokenPipe => {
            tracing::debug!("gpg closed stdin before reading the passphrase");
            Ok(())
        }
        other => other.map_err(GpgPipeError::from),
    }
}

/// Decide whether a finished gpg run failed.
///
/// Only a non-zero exit together with stderr text counts as failure.
/// gpg writes warnings to stderr on success, and a non-zero exit with
/// silent stderr is passed through as success as well. The latter can
/// hide real failures.
fn classify(exit_code: i32, stderr: String) -> Result<()> {
    if exit_code != 0 && !stderr.is_empty() {
        return Err(GpgPipeError::ToolFailed { exit_code, stderr });
    }
    Ok(())
}

/// Disposes the wrapped process when it goes out of scope, on every path.
struct Scoped<P: ToolProcess>(P);

impl<P: ToolProcess> Deref for Scoped<P> {
    type Target = P;

    fn deref(&self) -> &P {
        &self.0
    }
}

impl<P: ToolProcess> DerefMut for Scoped<P> {
    fn deref_mut(&mut self) -> &mut P {
        &mut self.0
    }
}

impl<P: ToolProcess> Drop for Scoped<P> {
    fn drop(&mut self) {
        self.0.dispose();
    }
}
