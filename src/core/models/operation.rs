use std::fmt;
use std::str::FromStr;

/// The single action a request asks the pgp tool to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Decrypt,
    Encrypt,
    Sign,
    Verify,
    SignAndEncrypt,
}

impl Operation {
    /// Whether a recipient identity must be supplied.
    ///
    /// Decrypt counts here: the recipient names the key that unlocks the data.
    pub fn needs_recipient(self) -> bool {
        matches!(
            self,
            Operation::Decrypt | Operation::Encrypt | Operation::SignAndEncrypt
        )
    }

    /// Whether an originator (signing identity) must be supplied.
    pub fn needs_originator(self) -> bool {
        matches!(self, Operation::Sign | Operation::SignAndEncrypt)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Decrypt => "decrypt",
            Operation::Encrypt => "encrypt",
            Operation::Sign => "sign",
            Operation::Verify => "verify",
            Operation::SignAndEncrypt => "sign-and-encrypt",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    /// Accepts the display names, case-insensitively. `sign-encrypt` is
    /// taken as a shorthand for `sign-and-encrypt`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "decrypt" => Ok(Operation::Decrypt),
            "encrypt" => Ok(Operation::Encrypt),
            "sign" => Ok(Operation::Sign),
            "verify" => Ok(Operation::Verify),
            "sign-and-encrypt" | "sign-encrypt" => Ok(Operation::SignAndEncrypt),
            other => Err(format!("unknown operation '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_cli_names() {
        assert_eq!(Operation::SignAndEncrypt.to_string(), "sign-and-encrypt");
        assert_eq!(Operation::Verify.to_string(), "verify");
    }

    #[test]
    fn identity_requirements_per_operation() {
        assert!(Operation::Decrypt.needs_recipient());
        assert!(!Operation::Decrypt.needs_originator());
        assert!(Operation::Encrypt.needs_recipient());
        assert!(Operation::Sign.needs_originator());
        assert!(!Operation::Sign.needs_recipient());
        assert!(Operation::SignAndEncrypt.needs_recipient());
        assert!(Operation::SignAndEncrypt.needs_originator());
        assert!(!Operation::Verify.needs_recipient());
        assert!(!Operation::Verify.needs_originator());
    }

    #[test]
    fn parses_its_own_names() {
        for op in [
            Operation::Decrypt,
            Operation::Encrypt,
            Operation::Sign,
            Operation::Verify,
            Operation::SignAndEncrypt,
        ] {
            assert_eq!(op.as_str().parse::<Operation>(), Ok(op));
        }
    }

    #[test]
    fn parsing_ignores_case_and_accepts_shorthand() {
        assert_eq!(" Encrypt ".parse::<Operation>(), Ok(Operation::Encrypt));
        assert_eq!(
            "sign-encrypt".parse::<Operation>(),
            Ok(Operation::SignAndEncrypt)
        );
    }

    #[test]
    fn unknown_operation_is_rejected() {
        let err = "clearsign".parse::<Operation>().unwrap_err();
        assert!(err.contains("clearsign"));
    }
}
