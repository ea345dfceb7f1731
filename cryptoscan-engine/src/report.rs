//! Findings, aggregation and the scan report
//!
//! Findings are append-only: matchers create them, the engine collects
//! them, [`aggregate`] orders and scores them. The report's ordering is a
//! property of its contents, never of task completion order, so identical
//! inputs serialize to byte-identical JSON.

use serde::{Deserialize, Serialize};

use crate::adapter::{AstNode, SourceUnit};
use crate::error::ScanError;
use crate::rules::{Rule, Severity};

/// A single reported instance of a detected vulnerability pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub rule_id: String,
    pub cwe: Option<String>,
    pub severity: Severity,
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub snippet: String,
    pub detail: String,
}

impl Finding {
    pub(crate) fn new(
        rule: &Rule,
        unit: &SourceUnit,
        node: &AstNode,
        detail: impl Into<String>,
    ) -> Self {
        Self::with_severity(rule, rule.severity, unit, node, detail)
    }

    pub(crate) fn with_severity(
        rule: &Rule,
        severity: Severity,
        unit: &SourceUnit,
        node: &AstNode,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule.id.to_string(),
            cwe: rule.cwe.map(str::to_string),
            severity,
            file: unit.path.clone(),
            line: node.span.start_line,
            column: node.span.start_col,
            snippet: node.text.clone(),
            detail: detail.into(),
        }
    }

    /// Duplicates sort highest-severity-first so deduplication keeps the
    /// most severe instance
    fn sort_key(&self) -> (&str, u32, u32, &str, std::cmp::Reverse<Severity>, &str) {
        (
            &self.file,
            self.line,
            self.column,
            &self.rule_id,
            std::cmp::Reverse(self.severity),
            &self.detail,
        )
    }

    /// Exact-repeat identity: same rule at the same location
    fn dedup_key(&self) -> (&str, &str, u32, u32) {
        (&self.rule_id, &self.file, self.line, self.column)
    }
}

/// Per-severity finding counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    #[serde(rename = "CRITICAL")]
    pub critical: u64,
    #[serde(rename = "HIGH")]
    pub high: u64,
    #[serde(rename = "MEDIUM")]
    pub medium: u64,
    #[serde(rename = "LOW")]
    pub low: u64,
    #[serde(rename = "INFO")]
    pub info: u64,
}

impl SeverityCounts {
    fn bump(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
            Severity::Info => self.info += 1,
        }
    }
}

/// A file skipped because its content could not be read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedFile {
    pub file: String,
    pub reason: String,
}

/// Immutable result of one scan invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub findings: Vec<Finding>,
    pub risk_score: u64,
    pub severity_counts: SeverityCounts,
    pub cancelled: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_files: Vec<SkippedFile>,
}

impl ScanReport {
    pub fn to_json(&self) -> Result<String, ScanError> {
        serde_json::to_string_pretty(self).map_err(Into::into)
    }
}

/// Merge findings into a report: order, drop exact repeats, score
///
/// Idempotent: aggregating a report's own findings again reproduces it.
/// The risk score is the severity-weighted sum, monotonic in the finding
/// count of every severity.
pub fn aggregate(
    mut findings: Vec<Finding>,
    cancelled: bool,
    skipped_files: Vec<SkippedFile>,
) -> ScanReport {
    findings.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    findings.dedup_by(|a, b| a.dedup_key() == b.dedup_key());

    let mut severity_counts = SeverityCounts::default();
    for finding in &findings {
        severity_counts.bump(finding.severity);
    }
    let risk_score = findings.iter().map(|f| f.severity.weight()).sum();

    ScanReport {
        findings,
        risk_score,
        severity_counts,
        cancelled,
        skipped_files,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(rule: &str, file: &str, line: u32, severity: Severity) -> Finding {
        Finding {
            rule_id: rule.to_string(),
            cwe: None,
            severity,
            file: file.to_string(),
            line,
            column: 1,
            snippet: String::new(),
            detail: String::new(),
        }
    }

    #[test]
    fn test_exact_repeats_collapse() {
        let findings = vec![
            finding("weak-hash", "a.js", 3, Severity::Critical),
            finding("weak-hash", "a.js", 3, Severity::Critical),
        ];
        let report = aggregate(findings, false, Vec::new());
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.risk_score, 10);
    }

    #[test]
    fn test_dedup_keeps_the_most_severe_instance() {
        let findings = vec![
            finding("weak-hash", "a.js", 3, Severity::Medium),
            finding("weak-hash", "a.js", 3, Severity::Critical),
        ];
        let report = aggregate(findings, false, Vec::new());
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].severity, Severity::Critical);
    }

    #[test]
    fn test_cross_rule_overlap_is_preserved() {
        let findings = vec![
            finding("weak-hash", "a.js", 3, Severity::Critical),
            finding("insecure-cipher-mode", "a.js", 3, Severity::High),
        ];
        let report = aggregate(findings, false, Vec::new());
        assert_eq!(report.findings.len(), 2);
    }

    #[test]
    fn test_ordering_is_by_file_then_position_then_rule() {
        let findings = vec![
            finding("b-rule", "z.js", 1, Severity::Low),
            finding("a-rule", "a.js", 9, Severity::Low),
            finding("a-rule", "a.js", 2, Severity::Low),
        ];
        let report = aggregate(findings, false, Vec::new());
        let order: Vec<(String, u32)> = report
            .findings
            .iter()
            .map(|f| (f.file.clone(), f.line))
            .collect();
        assert_eq!(
            order,
            vec![
                ("a.js".to_string(), 2),
                ("a.js".to_string(), 9),
                ("z.js".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_risk_score_and_counts() {
        let findings = vec![
            finding("r1", "a.js", 1, Severity::Critical),
            finding("r2", "a.js", 2, Severity::High),
            finding("r3", "a.js", 3, Severity::Medium),
            finding("r4", "a.js", 4, Severity::Low),
            finding("r5", "a.js", 5, Severity::Info),
        ];
        let report = aggregate(findings, false, Vec::new());
        assert_eq!(report.risk_score, 10 + 5 + 2 + 1);
        assert_eq!(report.severity_counts.critical, 1);
        assert_eq!(report.severity_counts.info, 1);
    }

    #[test]
    fn test_json_schema_field_names() {
        let report = aggregate(
            vec![finding("weak-hash", "a.js", 3, Severity::Critical)],
            false,
            Vec::new(),
        );
        let json = report.to_json().unwrap();
        assert!(json.contains("\"riskScore\""));
        assert!(json.contains("\"severityCounts\""));
        assert!(json.contains("\"CRITICAL\""));
        assert!(json.contains("\"ruleId\""));
        assert!(json.contains("\"cancelled\""));
    }
}
