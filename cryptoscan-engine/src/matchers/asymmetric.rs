//! Weak asymmetric key detection
//!
//! Flags RSA key generation below the configured modulus floor and EC key
//! generation on denylisted curves. Option objects are probed textually:
//! the JS form buries `modulusLength`/`namedCurve` in an options literal,
//! the Python form passes them positionally or as keywords.

use regex::Regex;

use super::{callee_tail, callee_tail2, compile, first_int_arg, first_string_arg, keyword_arg};
use crate::adapter::{ArgValue, NodeKind, SourceUnit};
use crate::config::Config;
use crate::error::ScanError;
use crate::report::Finding;
use crate::rules::Rule;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAlgorithm {
    Rsa,
    Ec,
}

#[derive(Debug)]
pub struct WeakAsymmetricKey {
    min_rsa_bits: u32,
    weak_curves: Vec<String>,
    modulus_re: Regex,
    curve_re: Regex,
}

impl WeakAsymmetricKey {
    pub fn new(config: &Config) -> Result<Self, ScanError> {
        Ok(Self {
            min_rsa_bits: config.min_rsa_modulus_bits,
            weak_curves: config
                .weak_curves
                .iter()
                .map(|c| c.to_ascii_lowercase())
                .collect(),
            modulus_re: compile(r#"(?i)modulus_?length["']?\s*[:=]\s*([0-9]+)"#)?,
            curve_re: compile(r#"(?i)(?:named_?curve|curve)["']?\s*[:=]\s*["']([A-Za-z0-9_-]+)["']"#)?,
        })
    }

    pub fn scan_unit(&self, rule: &Rule, unit: &SourceUnit) -> Result<Vec<Finding>, ScanError> {
        let mut findings = Vec::new();
        for node in &unit.nodes {
            let NodeKind::Call { callee, args } = &node.kind else {
                continue;
            };
            let Some(algorithm) = keygen_algorithm(callee, args) else {
                continue;
            };
            match algorithm {
                KeyAlgorithm::Rsa => {
                    let Some(bits) = self.modulus_bits(node, args) else {
                        continue;
                    };
                    if bits < i64::from(self.min_rsa_bits) {
                        findings.push(Finding::new(
                            rule,
                            unit,
                            node,
                            format!(
                                "RSA key generated with a {bits}-bit modulus (minimum {})",
                                self.min_rsa_bits
                            ),
                        ));
                    }
                }
                KeyAlgorithm::Ec => {
                    let Some(curve) = self.curve_name(node, args) else {
                        continue;
                    };
                    if self.weak_curves.contains(&curve.to_ascii_lowercase()) {
                        findings.push(Finding::new(
                            rule,
                            unit,
                            node,
                            format!("EC key generated on denylisted curve '{curve}'"),
                        ));
                    }
                }
            }
        }
        Ok(findings)
    }

    fn modulus_bits(&self, node: &crate::adapter::AstNode, args: &[ArgValue]) -> Option<i64> {
        if let Some(bits) = first_int_arg(args) {
            return Some(bits);
        }
        if let Some(bits) = keyword_arg(args, &["bits", "key_size"])
            .and_then(|v| v.as_fixed_literal())
            .and_then(|lit| lit.as_int())
        {
            return Some(bits);
        }
        let probe = option_text(node, args);
        self.modulus_re
            .captures(probe)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    fn curve_name(&self, node: &crate::adapter::AstNode, args: &[ArgValue]) -> Option<String> {
        if let Some(curve) = keyword_arg(args, &["curve", "named_curve"])
            .and_then(|v| v.as_fixed_literal())
            .and_then(|lit| lit.as_text())
        {
            return Some(curve.to_string());
        }
        let probe = option_text(node, args);
        self.curve_re
            .captures(probe)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

/// Prefer the options-object literal; fall back to the whole call snippet
fn option_text<'a>(node: &'a crate::adapter::AstNode, args: &'a [ArgValue]) -> &'a str {
    args.iter()
        .find_map(|arg| match arg {
            ArgValue::Object(raw) => Some(raw.as_str()),
            _ => None,
        })
        .unwrap_or(&node.text)
}

fn keygen_algorithm(callee: &str, args: &[ArgValue]) -> Option<KeyAlgorithm> {
    let tail = callee_tail(callee);
    let tail2 = callee_tail2(callee);
    if tail == "generatekeypairsync" || tail == "generatekeypair" {
        return match first_string_arg(args)?.to_ascii_lowercase().as_str() {
            "rsa" | "rsa-pss" => Some(KeyAlgorithm::Rsa),
            "ec" | "ecdsa" | "ecdh" => Some(KeyAlgorithm::Ec),
            _ => None,
        };
    }
    if tail2 == "rsa.generate" {
        return Some(KeyAlgorithm::Rsa);
    }
    if tail2 == "ecc.generate" || tail2 == "ec.generate" {
        return Some(KeyAlgorithm::Ec);
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
        let rule = registry.get(rule_id::WEAK_ASYMMETRIC_KEY).unwrap();
        let unit = parse("t", source, language).unwrap();
        WeakAsymmetricKey::new(&Config::default())
            .unwrap()
            .scan_unit(rule, &unit)
            .unwrap()
    }

    #[test]
    fn test_rsa_2048_options_object() {
        let findings = run(
            "const k = crypto.generateKeyPairSync('rsa', { modulusLength: 2048 });\n",
            Language::JavaScript,
        );
        assert_eq!(findings.len(), 1);
        assert!(findings[0].detail.contains("2048"));
    }

    #[test]
    fn test_rsa_4096_is_clean() {
        let findings = run(
            "const k = crypto.generateKeyPairSync('rsa', { modulusLength: 4096 });\n",
            Language::JavaScript,
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn test_python_positional_modulus() {
        let findings = run("key = RSA.generate(2048)\n", Language::Python);
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn test_denylisted_curve() {
        let findings = run(
            "const k = crypto.generateKeyPairSync('ec', { namedCurve: 'secp256k1' });\n",
            Language::JavaScript,
        );
        assert_eq!(findings.len(), 1);
        assert!(findings[0].detail.contains("secp256k1"));
    }

    #[test]
    fn test_approved_curve_is_clean() {
        let findings = run("key = ECC.generate(curve='P-256')\n", Language::Python);
        assert!(findings.is_empty());
    }
}
