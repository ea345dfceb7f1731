//! Hardcoded secret detection
//!
//! Flags string or byte literals assigned to identifiers whose names look
//! like credentials. Values that flow in from an environment or
//! configuration lookup are exempt; the point is literals baked into the
//! source.

use regex::Regex;

use super::compile;
use crate::adapter::{ArgValue, NodeKind, SourceUnit};
use crate::config::Config;
use crate::error::ScanError;
use crate::report::Finding;
use crate::rules::Rule;

#[derive(Debug)]
pub struct HardcodedSecret {
    name_pattern: Regex,
    config_source: Regex,
    min_length: usize,
}

impl HardcodedSecret {
    pub fn new(config: &Config) -> Result<Self, ScanError> {
        Ok(Self {
            name_pattern: compile(r"(?i)(secret|key|passw(or)?d|token|credential)")?,
            config_source: compile(r"(?i)(getenv|environ|process\.env|config|settings|vault)")?,
            min_length: config.min_secret_length,
        })
    }

    pub fn scan_unit(&self, rule: &Rule, unit: &SourceUnit) -> Result<Vec<Finding>, ScanError> {
        let mut findings = Vec::new();
        for node in &unit.nodes {
            let NodeKind::Assignment { target, value } = &node.kind else {
                continue;
            };
            if !self.name_pattern.is_match(target) {
                continue;
            }
            if self.from_external_config(value) {
                continue;
            }
            let Some(literal) = value.as_fixed_literal() else {
                continue;
            };
            let Some(text) = literal.as_text() else {
                continue;
            };
            if text.len() < self.min_length {
                continue;
            }
            findings.push(Finding::new(
                rule,
                unit,
                node,
                format!(
                    "'{}' is assigned a hardcoded {}-character literal",
                    target,
                    text.len()
                ),
            ));
        }
        Ok(findings)
    }

    fn from_external_config(&self, value: &ArgValue) -> bool {
        match value {
            ArgValue::Call { callee, .. } => self.config_source.is_match(callee),
            ArgValue::Ident(name) => self.config_source.is_match(name),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{parse, Language};
    use crate::rules::{rule_id, RuleRegistry, Severity};

    fn run(source: &str, language: Language) -> Vec<Finding> {
        let registry = RuleRegistry::with_default_rules();
        let rule = registry.get(rule_id::HARDCODED_SECRET).unwrap();
        let unit = parse("t", source, language).unwrap();
        HardcodedSecret::new(&Config::default())
            .unwrap()
            .scan_unit(rule, &unit)
            .unwrap()
    }

    #[test]
    fn test_detects_secret_named_string_literal() {
        let findings = run(
            "const API_SECRET = \"super-secret-api-key-2024\";\n",
            Language::JavaScript,
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Critical);
        assert!(findings[0].detail.contains("API_SECRET"));
    }

    #[test]
    fn test_detects_python_byte_string_key() {
        let findings = run(
            "class V:\n    def __init__(self):\n        self.encryption_key = b\"0123456789abcdef\"\n",
            Language::Python,
        );
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn test_short_literals_are_ignored() {
        let findings = run("const API_KEY = \"abc\";\n", Language::JavaScript);
        assert!(findings.is_empty());
    }

    #[test]
    fn test_environment_lookup_is_exempt() {
        let findings = run(
            "import os\nAPI_KEY = os.getenv(\"PAYMENT_API_KEY\")\n",
            Language::Python,
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn test_unrelated_names_are_ignored() {
        let findings = run(
            "const greeting = \"hello there, operator\";\n",
            Language::JavaScript,
        );
        assert!(findings.is_empty());
    }
}
