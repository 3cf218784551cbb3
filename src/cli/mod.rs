pub mod commands;
pub mod logging;
pub mod output;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Encrypt, decrypt, sign and verify files by driving gpg.
#[derive(Parser, Debug)]
#[command(name = "gpgpipe", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the gpg executable (default: gpg from PATH)
    #[arg(long, global = true, env = "GPGPIPE_GPG")]
    pub gpg_path: Option<PathBuf>,

    /// Path to alternative config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Give up on gpg after this many seconds (0 waits forever)
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Delete the output file if gpg reports an error
    #[arg(long, global = true)]
    pub cleanup_on_failure: bool,

    /// Verbose output (debug logs on stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Encrypt a file for a recipient
    Encrypt {
        #[command(flatten)]
        io: IoArgs,
        /// Recipient key id, fingerprint or email
        #[arg(short, long)]
        recipient: Option<String>,
    },

    /// Decrypt a file with a local secret key
    Decrypt {
        #[command(flatten)]
        io: IoArgs,
        /// Key used to decrypt
        #[arg(short, long)]
        recipient: Option<String>,
    },

    /// Sign a file
    Sign {
        #[command(flatten)]
        io: IoArgs,
        /// Signing key
        #[arg(short = 'u', long)]
        local_user: Option<String>,
    },

    /// Sign a file and encrypt it for a recipient
    SignEncrypt {
        #[command(flatten)]
        io: IoArgs,
        /// Recipient key id, fingerprint or email
        #[arg(short, long)]
        recipient: Option<String>,
        /// Signing key
        #[arg(short = 'u', long)]
        local_user: Option<String>,
    },

    /// Verify a signed file
    Verify {
        #[command(flatten)]
        io: IoArgs,
    },

    /// Check that the configured gpg binary can be run
    Check,
}

/// Input, output and secret options shared by every operation.
#[derive(Args, Debug)]
pub struct IoArgs {
    /// Input file ("-" for stdin)
    pub input: PathBuf,

    /// Output file, overwritten if it exists
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// ASCII-armored output
    #[arg(short, long)]
    pub armor: bool,

    /// Read the passphrase from the first line of stdin
    #[arg(long, conflicts_with = "passphrase_env")]
    pub passphrase_stdin: bool,

    /// Read the passphrase from this environment variable
    #[arg(long, value_name = "VAR")]
    pub passphrase_env: Option<String>,

    /// Print the gpg command line instead of running it
    #[arg(long)]
    pub dry_run: bool,
}
