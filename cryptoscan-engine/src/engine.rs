// Copyright 2025 Cryptoscan Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Scan orchestration
//!
//! Fans files out over a worker pool, recovers per-file and per-matcher
//! failures into findings, and imposes a deterministic ordering on the
//! result. Nothing here aborts a running scan: configuration mistakes fail
//! at construction, everything later degrades to a finding or a skip
//! record.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::adapter::{self, Language};
use crate::config::Config;
use crate::error::ScanError;
use crate::matchers::{self, RuleMatcher};
use crate::report::{self, Finding, ScanReport, SkippedFile};
use crate::rules::{rule_id, RuleRegistry, Severity};

/// Scan input: a path on disk or an in-memory source
#[derive(Debug, Clone)]
pub enum ScanInput {
    Path(PathBuf),
    Source {
        name: String,
        language: Language,
        text: String,
    },
}

impl ScanInput {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn source(name: impl Into<String>, language: Language, text: impl Into<String>) -> Self {
        Self::Source {
            name: name.into(),
            language,
            text: text.into(),
        }
    }
}

/// Cooperative cancellation flag, checked between files
///
/// In-flight files run to completion; whatever finished is still returned,
/// with the report's cancelled flag set.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

enum FileOutcome {
    Scanned(Vec<Finding>),
    Skipped(SkippedFile),
    Cancelled,
}

/// Orchestrates parsing and matching across files
pub struct ScanEngine {
    config: Config,
    registry: RuleRegistry,
    matchers: Vec<RuleMatcher>,
    pool: rayon::ThreadPool,
}

impl std::fmt::Debug for ScanEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanEngine")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("matchers", &self.matchers)
            .finish_non_exhaustive()
    }
}

impl ScanEngine {
    /// Build an engine; configuration mistakes fail here, before any file
    /// is touched
    pub fn new(config: Config) -> Result<Self, ScanError> {
        let registry = RuleRegistry::with_default_rules();
        config.validate(&registry)?;
        let matchers = matchers::build_enabled(&config, &registry)?;
        let threads = config.threads.unwrap_or_else(num_cpus::get);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| ScanError::Config(format!("worker pool: {e}")))?;
        debug!(rules = matchers.len(), threads, "scan engine ready");
        Ok(Self {
            config,
            registry,
            matchers,
            pool,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn scan(&self, inputs: &[ScanInput]) -> ScanReport {
        self.scan_with_cancel(inputs, &CancelToken::new())
    }

    pub fn scan_with_cancel(&self, inputs: &[ScanInput], cancel: &CancelToken) -> ScanReport {
        let started = Instant::now();
        let files = self.expand_inputs(inputs);
        info!(files = files.len(), "starting scan");

        let outcomes: Vec<FileOutcome> = self.pool.install(|| {
            files
                .par_iter()
                .map(|input| {
                    if cancel.is_cancelled() {
                        FileOutcome::Cancelled
                    } else {
                        self.scan_one(input)
                    }
                })
                .collect()
        });

        let mut findings = Vec::new();
        let mut skipped = Vec::new();
        for outcome in outcomes {
            match outcome {
                FileOutcome::Scanned(file_findings) => findings.extend(file_findings),
                FileOutcome::Skipped(record) => {
                    warn!(file = %record.file, reason = %record.reason, "file skipped");
                    skipped.push(record);
                }
                FileOutcome::Cancelled => {}
            }
        }
        skipped.sort_by(|a, b| a.file.cmp(&b.file));

        let report = report::aggregate(findings, cancel.is_cancelled(), skipped);
        info!(
            findings = report.findings.len(),
            risk_score = report.risk_score,
            cancelled = report.cancelled,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "scan complete"
        );
        report
    }

    /// Expand directories to supported source files; explicit paths pass
    /// through as given
    fn expand_inputs(&self, inputs: &[ScanInput]) -> Vec<ScanInput> {
        let mut files = Vec::new();
        for input in inputs {
            match input {
                ScanInput::Path(path) if path.is_dir() => {
                    for entry in WalkDir::new(path)
                        .sort_by_file_name()
                        .into_iter()
                        .filter_map(Result::ok)
                    {
                        if entry.file_type().is_file()
                            && Language::from_path(entry.path()).is_some()
                        {
                            files.push(ScanInput::Path(entry.path().to_path_buf()));
                        }
                    }
                }
                other => files.push(other.clone()),
            }
        }
        files
    }

    fn scan_one(&self, input: &ScanInput) -> FileOutcome {
        let (name, language, text) = match input {
            ScanInput::Path(path) => {
                let name = path.display().to_string();
                let Some(language) = Language::from_path(path) else {
                    return FileOutcome::Scanned(vec![self.diagnostic(
                        rule_id::UNPARSEABLE,
                        &name,
                        "unsupported or unrecognized language",
                    )]);
                };
                match std::fs::read_to_string(path) {
                    Ok(text) => (name, language, text),
                    Err(e) => {
                        return FileOutcome::Skipped(SkippedFile {
                            file: name,
                            reason: e.to_string(),
                        })
                    }
                }
            }
            ScanInput::Source {
                name,
                language,
                text,
            } => (name.clone(), *language, text.clone()),
        };

        let unit = match adapter::parse(&name, &text, language) {
            Ok(unit) => unit,
            Err(e) => {
                debug!(file = %name, error = %e, "parse failed");
                return FileOutcome::Scanned(vec![self.diagnostic(
                    rule_id::UNPARSEABLE,
                    &name,
                    e.to_string(),
                )]);
            }
        };

        let mut findings = Vec::new();
        for matcher in &self.matchers {
            let Some(rule) = self.registry.get(matcher.rule_id()) else {
                continue;
            };
            match matcher.scan_unit(rule, &unit) {
                Ok(mut matched) => findings.append(&mut matched),
                Err(e) => {
                    warn!(rule = matcher.rule_id(), file = %unit.path, error = %e, "matcher failed");
                    findings.push(self.diagnostic(
                        rule_id::MATCHER_ERROR,
                        &unit.path,
                        format!("rule '{}' failed: {e}", matcher.rule_id()),
                    ));
                }
            }
        }
        FileOutcome::Scanned(findings)
    }

    /// Synthetic finding for a scanner condition, anchored at the top of
    /// the file
    fn diagnostic(&self, id: &'static str, file: &str, detail: impl Into<String>) -> Finding {
        let (cwe, severity) = match self.registry.get(id) {
            Some(rule) => (rule.cwe.map(str::to_string), rule.severity),
            None => (None, Severity::Info),
        };
        Finding {
            rule_id: id.to_string(),
            cwe,
            severity,
            file: file.to_string(),
            line: 0,
            column: 0,
            snippet: String::new(),
            detail: detail.into(),
        }
    }
}
