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
//! Configuration for the scan engine
//!
//! All defaults err on the side of flagging: the full rule set is enabled,
//! the RSA floor matches current key-size guidance and the curve denylist
//! covers the curves the rules reject out of the box. Callers (a CLI, a
//! service) load overrides from TOML and hand the result to
//! [`crate::engine::ScanEngine::new`], which validates it before any file
//! is touched.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ScanError;
use crate::rules::RuleRegistry;

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rule ids to run; empty means every detection rule
    pub enabled_rules: Vec<String>,

    /// Hash algorithms rejected in password and signature contexts
    pub banned_hash_algorithms: Vec<String>,

    /// EC curves rejected for key generation
    pub weak_curves: Vec<String>,

    /// Minimum acceptable RSA modulus length in bits
    pub min_rsa_modulus_bits: u32,

    /// Minimum literal length treated as a hardcoded secret
    pub min_secret_length: usize,

    /// Worker threads for the parallel scan phase (defaults to the CPU count)
    pub threads: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled_rules: Vec::new(),
            banned_hash_algorithms: vec![
                "md5".to_string(),
                "sha1".to_string(),
                "md4".to_string(),
            ],
            weak_curves: vec![
                "secp256k1".to_string(),
                "secp112r1".to_string(),
                "secp128r1".to_string(),
                "secp160r1".to_string(),
                "prime192v1".to_string(),
            ],
            min_rsa_modulus_bits: 3072,
            min_secret_length: 8,
            threads: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ScanError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ScanError::Config(format!("invalid config: {e}")))
    }

    /// Reject enabled rule ids that are not registered
    pub fn validate(&self, registry: &RuleRegistry) -> Result<(), ScanError> {
        for id in &self.enabled_rules {
            if registry.get(id).is_none() {
                return Err(ScanError::Config(format!(
                    "unknown rule id '{id}' in enabled_rules"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let registry = RuleRegistry::with_default_rules();
        Config::default().validate(&registry).unwrap();
    }

    #[test]
    fn test_unknown_rule_id_is_rejected() {
        let registry = RuleRegistry::with_default_rules();
        let config = Config {
            enabled_rules: vec!["weak-hash".to_string(), "not-a-rule".to_string()],
            ..Config::default()
        };
        let err = config.validate(&registry).unwrap_err();
        assert!(err.to_string().contains("not-a-rule"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cryptoscan.toml");
        std::fs::write(&path, "min_secret_length = 12\n").unwrap();
        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.min_secret_length, 12);

        std::fs::write(&path, "min_secret_length = \"tall\"\n").unwrap();
        let err = Config::load_from_file(&path).unwrap_err();
        assert!(matches!(err, ScanError::Config(_)));
    }

    #[test]
    fn test_toml_overrides_merge_with_defaults() {
        let config: Config = toml::from_str(
            r#"
            enabled_rules = ["weak-hash", "weak-random"]
            min_rsa_modulus_bits = 4096
            "#,
        )
        .unwrap();
        assert_eq!(config.enabled_rules.len(), 2);
        assert_eq!(config.min_rsa_modulus_bits, 4096);
        // untouched fields keep their defaults
        assert_eq!(config.min_secret_length, 8);
        assert!(config.weak_curves.contains(&"secp256k1".to_string()));
    }
}
