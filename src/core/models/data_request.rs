use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};

use crate::core::errors::{GpgPipeError, Result};
use crate::core::models::operation::Operation;

/// Fields shared by every request variant.
///
/// The passphrase is held as a `SecretString` so it is redacted from
/// `Debug` output and wiped from memory on drop.
#[derive(Debug)]
pub struct DataRequest {
    pub operation: Operation,
    pub armorize: bool,
    pub recipient: Option<String>,
    pub originator: Option<String>,
    pub passphrase: Option<SecretString>,
}

impl DataRequest {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            armorize: false,
            recipient: None,
            originator: None,
            passphrase: None,
        }
    }

    pub fn armor(mut self, armorize: bool) -> Self {
        self.armorize = armorize;
        self
    }

    pub fn recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = Some(recipient.into());
        self
    }

    pub fn originator(mut self, originator: impl Into<String>) -> Self {
        self.originator = Some(originator.into());
        self
    }

    pub fn passphrase(mut self, passphrase: SecretString) -> Self {
        self.passphrase = Some(passphrase);
        self
    }

    /// True iff a non-empty passphrase was supplied.
    pub fn needs_passphrase(&self) -> bool {
        self.passphrase
            .as_ref()
            .is_some_and(|p| !p.expose_secret().is_empty())
    }

    /// Check the identity fields the operation depends on.
    pub fn validate(&self) -> Result<()> {
        if self.operation.needs_recipient() && is_blank(self.recipient.as_deref()) {
            return Err(GpgPipeError::Validation {
                operation: self.operation,
                field: "recipient",
            });
        }
        if self.operation.needs_originator() && is_blank(self.originator.as_deref()) {
            return Err(GpgPipeError::Validation {
                operation: self.operation,
                field: "originator",
            });
        }
        Ok(())
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

/// A request whose input and output are files on disk.
///
/// The output file is overwritten without asking.
#[derive(Debug)]
pub struct FileDataRequest {
    pub request: DataRequest,
    pub input_file: PathBuf,
    pub output_file: PathBuf,
}

impl FileDataRequest {
    pub fn new(
        request: DataRequest,
        input_file: impl Into<PathBuf>,
        output_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            request,
            input_file: input_file.into(),
            output_file: output_file.into(),
        }
    }

    /// Validate identity fields and both paths. The input must exist.
    pub fn validate(&self) -> Result<()> {
        self.request.validate()?;

        if is_empty_path(&self.input_file) {
            return Err(GpgPipeError::Validation {
                operation: self.request.operation,
                field: "input file",
            });
        }
        if is_empty_path(&self.output_file) {
            return Err(GpgPipeError::Validation {
                operation: self.request.operation,
                field: "output file",
            });
        }
        if !self.input_file.exists() {
            return Err(GpgPipeError::InputNotFound {
                path: self.input_file.clone(),
            });
        }
        Ok(())
    }
}

fn is_empty_path(path: &Path) -> bool {
    path.as_os_str().is_empty()
}

/// A request carrying its input as a byte stream.
///
/// Declared for API completeness; the tool rejects it. Reliable support
/// needs the stream spooled to a temporary file first.
pub struct StreamDataRequest {
    pub request: DataRequest,
    pub input: Box<dyn Read + Send>,
}

impl StreamDataRequest {
    pub fn new(request: DataRequest, input: Box<dyn Read + Send>) -> Self {
        Self { request, input }
    }
}

impl fmt::Debug for StreamDataRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamDataRequest")
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}
