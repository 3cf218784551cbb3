use std::io::Read;

use crate::core::errors::Result;
use crate::core::models::data_request::{FileDataRequest, StreamDataRequest};

/// Port for anything that can carry out pgp requests.
///
/// Implementations live in `adapters::gpg`. `None` stands for an absent
/// request and is rejected before any work is done.
pub trait PgpTool {
    /// Process a file-based request; the result is written to its output file.
    fn process_file(&self, request: Option<&FileDataRequest>) -> Result<()>;

    /// Process a stream-based request and return the output stream.
    fn process_stream(&self, request: Option<StreamDataRequest>) -> Result<Box<dyn Read>>;
}
