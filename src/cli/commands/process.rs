use std::io::BufRead;
use std::path::{Path, PathBuf};

use secrecy::SecretString;

use crate::adapters::gpg::command_builder;
use crate::adapters::gpg::gpg_tool::GpgTool;
use crate::cli::IoArgs;
use crate::cli::output;
use crate::core::errors::{GpgPipeError, Result};
use crate::core::models::data_request::{DataRequest, FileDataRequest, StreamDataRequest};
use crate::core::models::operation::Operation;
use crate::core::traits::pgp_tool::PgpTool;

/// Identities named on the command line for one operation.
#[derive(Debug, Default)]
pub struct Identities<'a> {
    pub recipient: Option<&'a str>,
    pub originator: Option<&'a str>,
}

/// Execute one of the file operations (`gpgpipe encrypt`, `decrypt`, ...).
///
/// Builds a request from the CLI options and hands it to `GpgTool`.
/// With `--dry-run` the request is validated and the gpg command line
/// printed instead.
pub fn execute(operation: Operation, io: &IoArgs, ids: Identities<'_>) -> Result<()> {
    let config = crate::config::gpg_config::current();
    let tool = GpgTool::new(config.clone());

    let mut request = DataRequest::new(operation).armor(io.armor);
    if let Some(recipient) = ids.recipient {
        request = request.recipient(recipient);
    }
    if let Some(originator) = ids.originator {
        request = request.originator(originator);
    }
    if let Some(passphrase) = read_passphrase(io)? {
        request = request.passphrase(passphrase);
    }

    if io.input == Path::new("-") {
        let stream = StreamDataRequest::new(request, Box::new(std::io::stdin()));
        tool.process_stream(Some(stream))?;
        return Ok(());
    }

    let output_file = resolve_output(operation, io);
    let request = FileDataRequest::new(request, &io.input, output_file);

    if io.dry_run {
        request.validate()?;
        println!(
            "{} {}",
            config.gpg_path.display(),
            command_builder::for_file(&request)
        );
        return Ok(());
    }

    output::header(&format!("Running gpg {operation}"));
    output::detail(&format!("Input: {}", request.input_file.display()));
    output::detail(&format!("Output: {}", request.output_file.display()));

    tool.process_file(Some(&request))?;

    output::success(&format!("Wrote {}", request.output_file.display()));
    Ok(())
}

/// Output path for the request. Only verify has a default; for the
/// other operations a missing `-o` is left empty and fails validation.
fn resolve_output(operation: Operation, io: &IoArgs) -> PathBuf {
    match (&io.output, operation) {
        (Some(path), _) => path.clone(),
        (None, Operation::Verify) => {
            let mut name = io.input.clone().into_os_string();
            name.push(".out");
            PathBuf::from(name)
        }
        (None, _) => PathBuf::new(),
    }
}

/// Fetch the passphrase from stdin or an environment variable, if asked to.
fn read_passphrase(io: &IoArgs) -> Result<Option<SecretString>> {
    if io.passphrase_stdin {
        if io.input == Path::new("-") {
            return Err(GpgPipeError::InvalidConfig {
                detail: "--passphrase-stdin cannot be combined with input from stdin".into(),
            });
        }
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        let trimmed_len = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed_len);
        return Ok(Some(SecretString::from(line)));
    }

    if let Some(var) = &io.passphrase_env {
        let value = std::env::var(var).map_err(|_| GpgPipeError::InvalidConfig {
            detail: format!("environment variable {var} is not set"),
        })?;
        return Ok(Some(SecretString::from(value)));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn io_args(input: &str, output: Option<&str>) -> IoArgs {
        IoArgs {
            input: PathBuf::from(input),
            output: output.map(PathBuf::from),
            armor: false,
            passphrase_stdin: false,
            passphrase_env: None,
            dry_run: false,
        }
    }

    #[test]
    fn explicit_output_wins() {
        let io = io_args("msg.sig", Some("msg.txt"));
        assert_eq!(
            resolve_output(Operation::Verify, &io),
            PathBuf::from("msg.txt")
        );
    }

    #[test]
    fn verify_defaults_output_next_to_input() {
        let io = io_args("msg.sig", None);
        assert_eq!(
            resolve_output(Operation::Verify, &io),
            PathBuf::from("msg.sig.out")
        );
    }

    #[test]
    fn other_operations_leave_output_empty() {
        let io = io_args("msg.txt", None);
        assert!(
            resolve_output(Operation::Encrypt, &io)
                .as_os_str()
                .is_empty()
        );
    }

    #[test]
    fn passphrase_env_must_be_set() {
        let mut io = io_args("msg.txt", None);
        io.passphrase_env = Some("GPGPIPE_TEST_SURELY_UNSET_VAR".into());
        assert!(matches!(
            read_passphrase(&io),
            Err(GpgPipeError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn no_passphrase_options_means_none() {
        let io = io_args("msg.txt", None);
        assert!(read_passphrase(&io).unwrap().is_none());
    }
}
