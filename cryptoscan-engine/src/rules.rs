//! Rule metadata and the immutable rule registry
//!
//! A [`Rule`] describes what a matcher reports: CWE mapping, default
//! severity, title and remediation guidance. The registry is populated once
//! at engine start and read-only afterwards, so scan workers share it by
//! reference without locking.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// Finding severity levels, ordered from informational to critical
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Weight contributed to the aggregate risk score
    pub const fn weight(self) -> u64 {
        match self {
            Self::Critical => 10,
            Self::High => 5,
            Self::Medium => 2,
            Self::Low => 1,
            Self::Info => 0,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Stable rule identifiers
pub mod rule_id {
    pub const HARDCODED_SECRET: &str = "hardcoded-secret";
    pub const HARDCODED_IV: &str = "hardcoded-iv";
    pub const WEAK_HASH: &str = "weak-hash";
    pub const WEAK_RANDOM: &str = "weak-random";
    pub const INSECURE_CIPHER_MODE: &str = "insecure-cipher-mode";
    pub const WEAK_ASYMMETRIC_KEY: &str = "weak-asymmetric-key";
    pub const WEAK_ENCODING: &str = "weak-encoding";

    // Diagnostic rules: scanner conditions, not code vulnerabilities
    pub const UNPARSEABLE: &str = "unparseable";
    pub const MATCHER_ERROR: &str = "matcher-error";
}

/// A registered detection rule
#[derive(Debug, Clone, Serialize)]
pub struct Rule {
    pub id: &'static str,
    pub cwe: Option<&'static str>,
    pub severity: Severity,
    pub title: &'static str,
    pub remediation: &'static str,
}

impl Rule {
    /// Diagnostic rules report scanner conditions and carry no matcher
    pub fn is_diagnostic(&self) -> bool {
        self.id == rule_id::UNPARSEABLE || self.id == rule_id::MATCHER_ERROR
    }
}

/// Immutable registry mapping rule ids to rules
#[derive(Debug, Clone)]
pub struct RuleRegistry {
    rules: Vec<Rule>,
}

impl RuleRegistry {
    /// Registry with every built-in rule, including the diagnostic rules
    pub fn with_default_rules() -> Self {
        Self {
            rules: default_rules(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Resolve an enabled-rule-id set
    ///
    /// An empty set means every detection rule. Unknown ids are a usage
    /// mistake and fail immediately, before any scanning.
    pub fn select(&self, enabled: &[String]) -> Result<Vec<&Rule>, ScanError> {
        if enabled.is_empty() {
            return Ok(self.rules.iter().filter(|r| !r.is_diagnostic()).collect());
        }
        enabled
            .iter()
            .map(|id| {
                self.get(id)
                    .ok_or_else(|| ScanError::Config(format!("unknown rule id '{id}'")))
            })
            .collect()
    }
}

fn default_rules() -> Vec<Rule> {
    vec![
        Rule {
            id: rule_id::HARDCODED_SECRET,
            cwe: Some("CWE-798"),
            severity: Severity::Critical,
            title: "Hardcoded secret",
            remediation: "Load secrets from the environment or a secret manager, never from source literals",
        },
        Rule {
            id: rule_id::HARDCODED_IV,
            cwe: Some("CWE-329"),
            severity: Severity::Critical,
            title: "Hardcoded IV or nonce",
            remediation: "Generate a unique random IV for each encryption operation",
        },
        Rule {
            id: rule_id::WEAK_HASH,
            cwe: Some("CWE-327"),
            severity: Severity::Critical,
            title: "Weak hash algorithm",
            remediation: "Use SHA-256 or SHA-3 for signatures and Argon2id or scrypt for password storage",
        },
        Rule {
            id: rule_id::WEAK_RANDOM,
            cwe: Some("CWE-338"),
            severity: Severity::High,
            title: "Weak random number generator",
            remediation: "Use a cryptographically secure source such as crypto.randomBytes or the secrets module",
        },
        Rule {
            id: rule_id::INSECURE_CIPHER_MODE,
            cwe: Some("CWE-327"),
            severity: Severity::High,
            title: "Insecure cipher mode",
            remediation: "Use authenticated encryption: AES-GCM or ChaCha20-Poly1305",
        },
        Rule {
            id: rule_id::WEAK_ASYMMETRIC_KEY,
            cwe: Some("CWE-326"),
            severity: Severity::High,
            title: "Weak asymmetric key",
            remediation: "Use RSA-3072 or stronger, or an approved curve, and plan migration to NIST PQC standards",
        },
        Rule {
            id: rule_id::WEAK_ENCODING,
            cwe: Some("CWE-311"),
            severity: Severity::Low,
            title: "Encoding used in place of encryption",
            remediation: "Base64/hex encoding is reversible; encrypt with AES-GCM before encoding",
        },
        Rule {
            id: rule_id::UNPARSEABLE,
            cwe: None,
            severity: Severity::Info,
            title: "File could not be parsed",
            remediation: "Fix the syntax errors or exclude the file from the scan",
        },
        Rule {
            id: rule_id::MATCHER_ERROR,
            cwe: None,
            severity: Severity::Info,
            title: "Matcher failed",
            remediation: "Report this as a scanner bug; the remaining rules still ran on the file",
        },
    ]
}
