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
//! Cryptoscan engine
//!
//! Static-analysis engine that inspects source code for insecure
//! cryptographic usage: weak hashes, hardcoded keys and IVs, weak
//! randomness, insecure cipher modes and undersized asymmetric keys.
//! Findings carry severity, CWE mapping and remediation guidance.
//!
//! The engine is a library. Callers hand it file paths or raw sources plus
//! an enabled-rule set and get back a [`report::ScanReport`] that
//! serializes to a stable JSON shape:
//!
//! ```no_run
//! use cryptoscan_engine::{Config, Language, ScanEngine, ScanInput};
//!
//! # fn main() -> Result<(), cryptoscan_engine::ScanError> {
//! let engine = ScanEngine::new(Config::default())?;
//! let report = engine.scan(&[ScanInput::source(
//!     "api.js",
//!     Language::JavaScript,
//!     "const API_SECRET = \"not-a-real-secret\";",
//! )]);
//! println!("{}", report.to_json()?);
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod matchers;
pub mod report;
pub mod rules;

pub use adapter::{AstNode, Language, NodeKind, SourceUnit, Span};
pub use config::Config;
pub use engine::{CancelToken, ScanEngine, ScanInput};
pub use error::{ScanError, ScanResult};
pub use report::{aggregate, Finding, ScanReport, SeverityCounts, SkippedFile};
pub use rules::{Rule, RuleRegistry, Severity};
