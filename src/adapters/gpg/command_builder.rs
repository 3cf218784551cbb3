use std::ffi::{OsStr, OsString};
use std::fmt;

use crate::core::models::data_request::{DataRequest, FileDataRequest};
use crate::core::models::operation::Operation;

/// Flags that keep gpg from ever prompting: there is no terminal attached.
const UNATTENDED_FLAGS: [&str; 2] = ["--yes", "--batch"];

/// Passphrase is read from file descriptor 0, i.e. the child's stdin.
const PASSPHRASE_FD_FLAGS: [&str; 2] = ["--passphrase-fd", "0"];

/// An argument vector for the gpg binary and its quoted rendering.
///
/// `args` is handed to the OS unchanged, so no shell quoting applies.
/// The rendering quotes identities and paths, escaping embedded `"` and `\`,
/// and exists for tracing and `--dry-run` output:
///
/// ```text
/// --yes --batch -a -e -r "bob@example.com" -o "out.asc" "in.txt"
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    args: Vec<OsString>,
    rendered: String,
}

impl CommandLine {
    fn new() -> Self {
        Self {
            args: Vec::new(),
            rendered: String::new(),
        }
    }

    fn flag(&mut self, flag: &str) {
        self.push(OsString::from(flag), flag);
    }

    fn value(&mut self, value: impl AsRef<OsStr>) {
        let value = value.as_ref();
        let escaped = value
            .to_string_lossy()
            .replace('\\', "\\\\")
            .replace('"', "\\\"");
        let shown = format!("\"{escaped}\"");
        self.push(value.to_os_string(), &shown);
    }

    fn push(&mut self, arg: OsString, shown: &str) {
        if !self.rendered.is_empty() {
            self.rendered.push(' ');
        }
        self.rendered.push_str(shown);
        self.args.push(arg);
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

/// Build the gpg command line for a file-based request.
///
/// Assumes the request has been validated. Output is fully determined by
/// the request.
pub fn for_file(request: &FileDataRequest) -> CommandLine {
    let mut cmd = common(&request.request);
    cmd.flag("-o");
    cmd.value(&request.output_file);
    cmd.value(&request.input_file);
    cmd
}

/// Flags shared by every request variant, up to but excluding the I/O part.
fn common(request: &DataRequest) -> CommandLine {
    let mut cmd = CommandLine::new();
    for flag in UNATTENDED_FLAGS {
        cmd.flag(flag);
    }

    if request.armorize {
        cmd.flag("-a");
    }

    let recipient = request.recipient.as_deref().unwrap_or_default();
    let originator = request.originator.as_deref().unwrap_or_default();

    match request.operation {
        Operation::Decrypt => {
            cmd.flag("-d");
            cmd.flag("-u");
            cmd.value(recipient);
        }
        Operation::Encrypt => {
            cmd.flag("-e");
            cmd.flag("-r");
            cmd.value(recipient);
        }
        Operation::Sign => {
            cmd.flag("-s");
            cmd.flag("-u");
            cmd.value(originator);
        }
        Operation::SignAndEncrypt => {
            cmd.flag("-s");
            cmd.flag("-e");
            cmd.flag("-r");
            cmd.value(recipient);
            cmd.flag("-u");
            cmd.value(originator);
        }
        Operation::Verify => cmd.flag("--verify"),
    }

    if request.needs_passphrase() {
        for flag in PASSPHRASE_FD_FLAGS {
            cmd.flag(flag);
        }
    }

    cmd
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn file_request(request: DataRequest) -> FileDataRequest {
        FileDataRequest::new(request, "in.txt", "out.gpg")
    }

    fn rendered(request: DataRequest) -> String {
        for_file(&file_request(request)).to_string()
    }

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[test]
    fn encrypt_line() {
        let line = rendered(DataRequest::new(Operation::Encrypt).recipient("bob"));
        assert_eq!(line, r#"--yes --batch -e -r "bob" -o "out.gpg" "in.txt""#);
        assert!(!line.contains("--passphrase-fd 0"));
    }

    #[test]
    fn encrypt_with_passphrase_reads_fd_zero() {
        let line = rendered(
            DataRequest::new(Operation::Encrypt)
                .recipient("bob")
                .passphrase(secret("s3cret")),
        );
        assert!(line.contains(r#"-e -r "bob""#));
        assert!(line.contains("--passphrase-fd 0"));
        assert!(line.ends_with(r#"-o "out.gpg" "in.txt""#));
        assert!(!line.contains("s3cret"));
    }

    #[test]
    fn decrypt_uses_recipient_as_local_user() {
        let line = rendered(
            DataRequest::new(Operation::Decrypt)
                .recipient("alice")
                .passphrase(secret("pw")),
        );
        assert_eq!(
            line,
            r#"--yes --batch -d -u "alice" --passphrase-fd 0 -o "out.gpg" "in.txt""#
        );
    }

    #[test]
    fn sign_uses_originator() {
        let line = rendered(DataRequest::new(Operation::Sign).originator("alice"));
        assert_eq!(line, r#"--yes --batch -s -u "alice" -o "out.gpg" "in.txt""#);
    }

    #[test]
    fn sign_and_encrypt_orders_recipient_before_originator() {
        let line = rendered(
            DataRequest::new(Operation::SignAndEncrypt)
                .armor(true)
                .recipient("bob")
                .originator("alice"),
        );
        assert_eq!(
            line,
            r#"--yes --batch -a -s -e -r "bob" -u "alice" -o "out.gpg" "in.txt""#
        );
    }

    #[test]
    fn verify_has_no_identity_flags() {
        let line = rendered(DataRequest::new(Operation::Verify).recipient("ignored"));
        assert_eq!(line, r#"--yes --batch --verify -o "out.gpg" "in.txt""#);
    }

    #[test]
    fn armor_flag_follows_batch() {
        let line = rendered(DataRequest::new(Operation::Verify).armor(true));
        assert!(line.starts_with("--yes --batch -a --verify"));
    }

    #[test]
    fn argv_keeps_spaces_without_quotes() {
        let req = FileDataRequest::new(
            DataRequest::new(Operation::Encrypt).recipient("Bob Smith"),
            "my file.txt",
            "my file.gpg",
        );
        let cmd = for_file(&req);
        let args: Vec<_> = cmd.args().iter().map(|a| a.to_string_lossy()).collect();
        assert_eq!(
            args,
            [
                "--yes",
                "--batch",
                "-e",
                "-r",
                "Bob Smith",
                "-o",
                "my file.gpg",
                "my file.txt"
            ]
        );
        assert!(cmd.to_string().ends_with(r#"-o "my file.gpg" "my file.txt""#));
    }

    #[test]
    fn building_is_deterministic() {
        let req = file_request(DataRequest::new(Operation::Sign).originator("alice"));
        assert_eq!(for_file(&req), for_file(&req));
    }

    #[test]
    fn rendering_escapes_quotes_and_backslashes() {
        let req = FileDataRequest::new(
            DataRequest::new(Operation::Encrypt).recipient(r#"Bob "The Builder""#),
            r"C:\in.txt",
            "out.gpg",
        );
        let cmd = for_file(&req);
        assert_eq!(
            cmd.to_string(),
            r#"--yes --batch -e -r "Bob \"The Builder\"" -o "out.gpg" "C:\\in.txt""#
        );
        assert_eq!(cmd.args()[4], r#"Bob "The Builder""#);
        assert_eq!(cmd.args()[7], r"C:\in.txt");
    }
}
