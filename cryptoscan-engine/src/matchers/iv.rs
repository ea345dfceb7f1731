//! Hardcoded IV/nonce detection
//!
//! Two triggers: a cipher-construction call whose IV argument resolves to a
//! fixed literal (directly, through a wrapper call, or through a one-hop
//! binding), and an assignment that pins an `iv`/`nonce`-named binding to a
//! literal. The second catches the common pattern of stashing the IV in a
//! field initializer and passing it around later.

use regex::Regex;

use super::{compile, is_cipher_ctor, keyword_arg};
use crate::adapter::{ArgValue, NodeKind, SourceUnit};
use crate::error::ScanError;
use crate::report::Finding;
use crate::rules::Rule;

#[derive(Debug)]
pub struct HardcodedIv {
    iv_name: Regex,
}

impl HardcodedIv {
    pub fn new() -> Result<Self, ScanError> {
        Ok(Self {
            iv_name: compile(r"(?i)(^|[._])(iv|nonce)s?$")?,
        })
    }

    pub fn scan_unit(&self, rule: &Rule, unit: &SourceUnit) -> Result<Vec<Finding>, ScanError> {
        let mut findings = Vec::new();
        for node in &unit.nodes {
            match &node.kind {
                NodeKind::Call { callee, args } if is_cipher_ctor(callee) => {
                    if let Some(value) = self.fixed_iv_argument(unit, args) {
                        findings.push(Finding::new(
                            rule,
                            unit,
                            node,
                            format!("cipher call receives the fixed IV \"{value}\""),
                        ));
                    }
                }
                NodeKind::Assignment { target, value } => {
                    if !self.iv_name.is_match(target) {
                        continue;
                    }
                    if let Some(text) = value.as_fixed_literal().and_then(|lit| lit.as_text()) {
                        findings.push(Finding::new(
                            rule,
                            unit,
                            node,
                            format!("'{target}' pins the IV to the fixed literal \"{text}\""),
                        ));
                    }
                }
                _ => {}
            }
        }
        Ok(findings)
    }

    /// The IV argument sits third in both `createCipheriv(algo, key, iv)`
    /// and `AES.new(key, mode, iv)`; keyword forms name it outright.
    fn fixed_iv_argument<'u>(&self, unit: &'u SourceUnit, args: &'u [ArgValue]) -> Option<&'u str> {
        let candidate = keyword_arg(args, &["iv", "nonce"]).or_else(|| args.get(2))?;
        if let Some(text) = candidate.as_fixed_literal().and_then(|lit| lit.as_text()) {
            return Some(text);
        }
        if let ArgValue::Ident(name) = candidate {
            return unit.resolve(name).and_then(|lit| lit.as_text());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{parse, Language};
    use crate::rules::{rule_id, RuleRegistry};

    fn run(source: &str, language: Language) -> Vec<Finding> {
        let registry = RuleRegistry::with_default_rules();
        let rule = registry.get(rule_id::HARDCODED_IV).unwrap();
        let unit = parse("t", source, language).unwrap();
        HardcodedIv::new().unwrap().scan_unit(rule, &unit).unwrap()
    }

    #[test]
    fn test_detects_literal_iv_argument() {
        let findings = run(
            "const c = crypto.createCipheriv('aes-256-cbc', key, Buffer.from('1234567890123456'));\n",
            Language::JavaScript,
        );
        assert_eq!(findings.len(), 1);
        assert!(findings[0].detail.contains("1234567890123456"));
    }

    #[test]
    fn test_detects_iv_through_one_hop_binding() {
        let source = "const iv = Buffer.from('1234567890123456');\nconst c = crypto.createCipheriv('aes-256-cbc', key, iv);\n";
        let findings = run(source, Language::JavaScript);
        // both the pinned binding and the call that consumes it
        assert_eq!(findings.len(), 2);
    }

    #[test]
    fn test_detects_field_initializer_iv() {
        let source = r#"
class Api {
    constructor() {
        this.iv = Buffer.from('abcdefghijklmnop');
    }
}
"#;
        let findings = run(source, Language::JavaScript);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].detail.contains("this.iv"));
    }

    #[test]
    fn test_detects_python_keyword_nonce() {
        let findings = run(
            "cipher = AES.new(key, AES.MODE_CTR, nonce=b\"fixed-nonce\")\n",
            Language::Python,
        );
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn test_random_iv_is_not_flagged() {
        let findings = run(
            "const c = crypto.createCipheriv('aes-256-cbc', key, crypto.randomBytes(16));\n",
            Language::JavaScript,
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn test_null_iv_is_not_flagged() {
        let findings = run(
            "const c = crypto.createCipheriv('aes-128-ecb', key, null);\n",
            Language::JavaScript,
        );
        assert!(findings.is_empty());
    }
}
