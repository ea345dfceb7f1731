//! Weak randomness detection
//!
//! Non-cryptographic RNGs are fine for jitter and sampling; they become a
//! vulnerability when the enclosing code mints session identifiers or
//! tokens. The context heuristic mirrors that split.

use regex::Regex;

use super::compile;
use crate::adapter::{NodeKind, SourceUnit};
use crate::error::ScanError;
use crate::report::Finding;
use crate::rules::Rule;

/// Bare names exposed by `from random import ...`
const BARE_WEAK_RNG: &[&str] = &[
    "random",
    "randint",
    "randrange",
    "uniform",
    "choice",
    "getrandbits",
];

#[derive(Debug)]
pub struct WeakRandom {
    context: Regex,
}

impl WeakRandom {
    pub fn new() -> Result<Self, ScanError> {
        Ok(Self {
            context: compile(r"(?i:session|token)|(?:^|[_\-.])[iI][dD](?:$|[_\-.])|Id$|ID$")?,
        })
    }

    pub fn scan_unit(&self, rule: &Rule, unit: &SourceUnit) -> Result<Vec<Finding>, ScanError> {
        let mut findings = Vec::new();
        for node in &unit.nodes {
            let NodeKind::Call { callee, .. } = &node.kind else {
                continue;
            };
            if !is_weak_rng(callee) {
                continue;
            }
            let Some(context) = node.enclosing_function.as_deref() else {
                continue;
            };
            if !self.context.is_match(context) {
                continue;
            }
            findings.push(Finding::new(
                rule,
                unit,
                node,
                format!("non-cryptographic RNG '{callee}' feeds '{context}'"),
            ));
        }
        Ok(findings)
    }
}

fn is_weak_rng(callee: &str) -> bool {
    let normalized = callee.to_ascii_lowercase();
    normalized == "math.random"
        || normalized.starts_with("random.")
        || BARE_WEAK_RNG.contains(&normalized.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{parse, Language};
    use crate::rules::{rule_id, RuleRegistry, Severity};

    fn run(source: &str, language: Language) -> Vec<Finding> {
        let registry = RuleRegistry::with_default_rules();
        let rule = registry.get(rule_id::WEAK_RANDOM).unwrap();
        let unit = parse("t", source, language).unwrap();
        WeakRandom::new().unwrap().scan_unit(rule, &unit).unwrap()
    }

    #[test]
    fn test_math_random_session_id_is_high() {
        let source = r#"
function generateSessionId() {
    return Math.random().toString(36).substring(2);
}
"#;
        let findings = run(source, Language::JavaScript);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::High);
    }

    #[test]
    fn test_python_random_token_is_flagged() {
        let source = "def generate_token():\n    return str(random.random() * 1000000)\n";
        let findings = run(source, Language::Python);
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn test_weak_rng_outside_sensitive_context_is_clean() {
        let source = "function shuffleDeck(deck) {\n    return deck.sort(() => Math.random() - 0.5);\n}\n";
        let findings = run(source, Language::JavaScript);
        assert!(findings.is_empty());
    }

    #[test]
    fn test_secrets_module_is_not_flagged() {
        let source = "def generate_token():\n    return secrets.token_hex(32)\n";
        let findings = run(source, Language::Python);
        assert!(findings.is_empty());
    }
}
