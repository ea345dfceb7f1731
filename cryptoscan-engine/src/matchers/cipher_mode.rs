//! Insecure cipher mode detection
//!
//! ECB is the one mode flagged unconditionally: identical plaintext blocks
//! produce identical ciphertext blocks. The mode can arrive as part of an
//! algorithm string (`aes-128-ecb`), as a mode constant (`AES.MODE_ECB`),
//! through a one-hop binding, or baked into a helper's name.

use regex::Regex;

use super::{callee_tail, compile, is_cipher_ctor};
use crate::adapter::{ArgValue, NodeKind, SourceUnit};
use crate::error::ScanError;
use crate::report::Finding;
use crate::rules::Rule;

#[derive(Debug)]
pub struct InsecureCipherMode {
    mode_marker: Regex,
    algo_shape: Regex,
}

impl InsecureCipherMode {
    pub fn new() -> Result<Self, ScanError> {
        Ok(Self {
            mode_marker: compile(r"(?i)(^|[-_.])ecb($|[-_.])")?,
            algo_shape: compile(r"(?i)^[a-z0-9]+(-[0-9]+)?-ecb$")?,
        })
    }

    pub fn scan_unit(&self, rule: &Rule, unit: &SourceUnit) -> Result<Vec<Finding>, ScanError> {
        let mut findings = Vec::new();
        for node in &unit.nodes {
            match &node.kind {
                NodeKind::Call { callee, args } => {
                    if is_cipher_ctor(callee) {
                        if let Some(marker) = self.ecb_argument(unit, args) {
                            findings.push(Finding::new(
                                rule,
                                unit,
                                node,
                                format!("cipher constructed in ECB mode ('{marker}')"),
                            ));
                            continue;
                        }
                    }
                    if self.mode_marker.is_match(&callee_tail(callee)) {
                        findings.push(Finding::new(
                            rule,
                            unit,
                            node,
                            format!("'{callee}' encrypts in ECB mode"),
                        ));
                    }
                }
                NodeKind::Literal(lit) => {
                    if let Some(text) = lit.as_text() {
                        if self.algo_shape.is_match(text) {
                            findings.push(Finding::new(
                                rule,
                                unit,
                                node,
                                format!("ECB-mode algorithm identifier '{text}'"),
                            ));
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(findings)
    }

    fn ecb_argument(&self, unit: &SourceUnit, args: &[ArgValue]) -> Option<String> {
        for arg in args {
            let arg = match arg {
                ArgValue::Keyword { value, .. } => value.as_ref(),
                other => other,
            };
            match arg {
                ArgValue::Literal(lit) => {
                    if let Some(text) = lit.as_text() {
                        if self.mode_marker.is_match(text) {
                            return Some(text.to_string());
                        }
                    }
                }
                ArgValue::Ident(name) => {
                    if self.mode_marker.is_match(name) {
                        return Some(name.clone());
                    }
                    if let Some(text) = unit.resolve(name).and_then(|lit| lit.as_text()) {
                        if self.mode_marker.is_match(text) {
                            return Some(text.to_string());
                        }
                    }
                }
                _ => {}
            }
        }
        None
    }
}
