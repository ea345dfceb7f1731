//! Weak hash algorithm detection
//!
//! A banned digest is only a finding when it handles material that matters:
//! the enclosing function/method name decides whether the call is password
//! storage (critical) or signature/generic hashing (medium). A weak digest
//! in an unrelated context, like a cache key, is left alone.

use regex::Regex;

use super::{callee_tail, callee_tail2, compile, first_string_arg};
use crate::adapter::{ArgValue, NodeKind, SourceUnit};
use crate::config::Config;
use crate::error::ScanError;
use crate::report::Finding;
use crate::rules::{Rule, Severity};

const BARE_DIGEST_NAMES: &[&str] = &[
    "md2", "md4", "md5", "sha1", "sha224", "sha256", "sha384", "sha512",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HashContext {
    Password,
    Signature,
    Generic,
}

#[derive(Debug)]
pub struct WeakHash {
    banned: Vec<String>,
    password_ctx: Regex,
    signature_ctx: Regex,
    generic_ctx: Regex,
}

impl WeakHash {
    pub fn new(config: &Config) -> Result<Self, ScanError> {
        Ok(Self {
            banned: config
                .banned_hash_algorithms
                .iter()
                .map(|a| a.to_ascii_lowercase())
                .collect(),
            password_ctx: compile(r"(?i)passw(or)?d")?,
            signature_ctx: compile(r"(?i)sign")?,
            generic_ctx: compile(r"(?i)hash")?,
        })
    }

    pub fn scan_unit(&self, rule: &Rule, unit: &SourceUnit) -> Result<Vec<Finding>, ScanError> {
        let mut findings = Vec::new();
        for node in &unit.nodes {
            let NodeKind::Call { callee, args } = &node.kind else {
                continue;
            };
            let Some(algorithm) = hash_algorithm(callee, args) else {
                continue;
            };
            if !self.banned.contains(&algorithm) {
                continue;
            }
            let Some(context) = self.classify(node.enclosing_function.as_deref()) else {
                continue;
            };
            let (severity, usage) = match context {
                HashContext::Password => (Severity::Critical, "password storage"),
                HashContext::Signature => (Severity::Medium, "signature material"),
                HashContext::Generic => (Severity::Medium, "hashing"),
            };
            findings.push(Finding::with_severity(
                rule,
                severity,
                unit,
                node,
                format!("{algorithm} used for {usage} in '{}'", node_context(node)),
            ));
        }
        Ok(findings)
    }

    fn classify(&self, enclosing: Option<&str>) -> Option<HashContext> {
        let name = enclosing?;
        if self.password_ctx.is_match(name) {
            Some(HashContext::Password)
        } else if self.signature_ctx.is_match(name) {
            Some(HashContext::Signature)
        } else if self.generic_ctx.is_match(name) {
            Some(HashContext::Generic)
        } else {
            None
        }
    }
}

fn node_context(node: &crate::adapter::AstNode) -> &str {
    node.enclosing_function.as_deref().unwrap_or("<module>")
}

/// Extract the digest algorithm from a hash-constructor call, if it is one
fn hash_algorithm(callee: &str, args: &[ArgValue]) -> Option<String> {
    let tail = callee_tail(callee);
    let tail2 = callee_tail2(callee);
    if tail == "createhash" || tail2 == "hashlib.new" {
        return first_string_arg(args).map(|s| s.to_ascii_lowercase());
    }
    if tail2.starts_with("hashlib.") {
        return Some(tail);
    }
    // `from hashlib import md5; md5(...)`
    if BARE_DIGEST_NAMES.contains(&tail.as_str()) && callee == tail {
        return Some(tail);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{parse, Language};
    use crate::rules::{rule_id, RuleRegistry};

    fn run(source: &str, language: Language) -> Vec<Finding> {
        let registry = RuleRegistry::with_default_rules();
        let rule = registry.get(rule_id::WEAK_HASH).unwrap();
        let unit = parse("t", source, language).unwrap();
        WeakHash::new(&Config::default())
            .unwrap()
            .scan_unit(rule, &unit)
            .unwrap()
    }

    #[test]
    fn test_md5_password_hashing_is_critical() {
        let source = r#"
function hashPassword(password) {
    return crypto.createHash('md5').update(password).digest('hex');
}
"#;
        let findings = run(source, Language::JavaScript);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Critical);
    }

    #[test]
    fn test_sha1_signature_is_medium() {
        let source = r#"
function signToken(payload) {
    return crypto.createHash('sha1').update(payload).digest('hex');
}
"#;
        let findings = run(source, Language::JavaScript);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Medium);
    }

    #[test]
    fn test_python_digest_in_callee_name() {
        let source = "def hash_password(p):\n    return hashlib.md5(p.encode()).hexdigest()\n";
        let findings = run(source, Language::Python);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Critical);
    }

    #[test]
    fn test_sha256_in_password_context_is_clean() {
        let source = "def hash_password(p):\n    return hashlib.sha256(p.encode()).hexdigest()\n";
        let findings = run(source, Language::Python);
        assert!(findings.is_empty());
    }

    #[test]
    fn test_weak_digest_outside_sensitive_context_is_clean() {
        let source = "function cacheBucket(u) {\n    return crypto.createHash('md5').update(u).digest('hex');\n}\n";
        let findings = run(source, Language::JavaScript);
        assert!(findings.is_empty());
    }
}
