use sha2::{Digest, Sha256};
use std::borrow::Cow;

pub fn sha256_hex(s: &str) -> String {
    let mut h = Sha256::new();
    h.update(s.as_bytes());
    hex::encode(h.finalize())
}

/// Short, log-safe identifier for a credential. Never log the key itself.
pub fn secret_fingerprint(secret: &str) -> String {
    if secret.is_empty() {
        return "none".to_string();
    }
    format!("sha256:{}", &sha256_hex(secret)[..12])
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RedactionPolicy {
    pub redact_credentials: bool,
}

impl RedactionPolicy {
    pub fn new(redact_credentials: bool) -> Self {
        Self { redact_credentials }
    }

    pub fn redact_key<'a>(&self, s: &'a str) -> Cow<'a, str> {
        if self.redact_credentials {
            "[REDACTED]".into()
        } else {
            s.into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable_and_short() {
        let a = secret_fingerprint("sk-test-123");
        let b = secret_fingerprint("sk-test-123");
        assert_eq!(a, b);
        assert!(a.starts_with("sha256:"));
        assert_eq!(a.len(), "sha256:".len() + 12);
        assert!(!a.contains("sk-test"));
    }

    #[test]
    fn test_fingerprint_empty() {
        assert_eq!(secret_fingerprint(""), "none");
    }

    #[test]
    fn test_redaction_on() {
        let policy = RedactionPolicy::new(true);
        assert_eq!(policy.redact_key("sk-live"), "[REDACTED]");
    }

    #[test]
    fn test_redaction_off() {
        let policy = RedactionPolicy::new(false);
        assert_eq!(policy.redact_key("sk-live"), "sk-live");
    }
}
