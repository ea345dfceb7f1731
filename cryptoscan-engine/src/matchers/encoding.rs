//! Encoding-as-encryption detection
//!
//! Base64 and hex are transport encodings, not confidentiality. A function
//! whose name promises encryption but only encodes gets a low-severity
//! finding; the same encode call after a real cipher step is left alone.

use regex::Regex;

use super::{callee_tail, compile, first_string_arg, is_encryption_call};
use crate::adapter::{ArgValue, NodeKind, SourceUnit};
use crate::error::ScanError;
use crate::report::Finding;
use crate::rules::Rule;

#[derive(Debug)]
pub struct WeakEncoding {
    encrypt_name: Regex,
}

impl WeakEncoding {
    pub fn new() -> Result<Self, ScanError> {
        Ok(Self {
            encrypt_name: compile(r"(?i)encrypt")?,
        })
    }

    pub fn scan_unit(&self, rule: &Rule, unit: &SourceUnit) -> Result<Vec<Finding>, ScanError> {
        let mut findings = Vec::new();
        for node in &unit.nodes {
            let NodeKind::Call { callee, args } = &node.kind else {
                continue;
            };
            if !is_encoding_call(callee, args) {
                continue;
            }
            let Some(context) = node.enclosing_function.as_deref() else {
                continue;
            };
            if !self.encrypt_name.is_match(context) {
                continue;
            }
            if self.has_prior_encryption(unit, node, context) {
                continue;
            }
            findings.push(Finding::new(
                rule,
                unit,
                node,
                format!("'{context}' encodes with {} but never encrypts", callee_tail(callee)),
            ));
        }
        Ok(findings)
    }

    /// Any cipher/encrypt call earlier in the same function counts; a call
    /// on the same line counts too, since arguments evaluate first.
    fn has_prior_encryption(
        &self,
        unit: &SourceUnit,
        encode_node: &crate::adapter::AstNode,
        context: &str,
    ) -> bool {
        unit.calls().any(|(other, callee, _)| {
            other.enclosing_function.as_deref() == Some(context)
                && other.span != encode_node.span
                && other.span.start_line <= encode_node.span.start_line
                && is_encryption_call(callee)
        })
    }
}

fn is_encoding_call(callee: &str, args: &[ArgValue]) -> bool {
    let tail = callee_tail(callee);
    matches!(
        tail.as_str(),
        "b64encode" | "b16encode" | "b32encode" | "hexlify" | "btoa"
    ) || (tail == "tostring"
        && first_string_arg(args)
            .map(str::to_ascii_lowercase)
            .is_some_and(|enc| enc == "base64" || enc == "hex"))
}
