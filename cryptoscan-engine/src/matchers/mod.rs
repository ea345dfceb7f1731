//! Pattern matchers for insecure cryptographic usage
//!
//! One matcher per rule behind a closed dispatch enum: the rule set is
//! known at compile time, so dispatch is static rather than reflective.
//! Matchers hold only compiled patterns and configuration snapshots; they
//! keep no state between calls and can be re-run against any unit in any
//! order.

mod asymmetric;
mod cipher_mode;
mod encoding;
mod hash;
mod iv;
mod random;
mod secrets;

pub use asymmetric::WeakAsymmetricKey;
pub use cipher_mode::InsecureCipherMode;
pub use encoding::WeakEncoding;
pub use hash::WeakHash;
pub use iv::HardcodedIv;
pub use random::WeakRandom;
pub use secrets::HardcodedSecret;

use regex::Regex;

use crate::adapter::{ArgValue, SourceUnit};
use crate::config::Config;
use crate::error::ScanError;
use crate::report::Finding;
use crate::rules::{rule_id, Rule, RuleRegistry};

/// Closed set of matchers, one tagged variant per rule
#[derive(Debug)]
pub enum RuleMatcher {
    HardcodedSecret(HardcodedSecret),
    HardcodedIv(HardcodedIv),
    WeakHash(WeakHash),
    WeakRandom(WeakRandom),
    InsecureCipherMode(InsecureCipherMode),
    WeakAsymmetricKey(WeakAsymmetricKey),
    WeakEncoding(WeakEncoding),
}

impl RuleMatcher {
    /// Build the matcher for a rule id; diagnostic rules have none
    pub fn for_rule(id: &str, config: &Config) -> Result<Option<Self>, ScanError> {
        let matcher = match id {
            rule_id::HARDCODED_SECRET => Self::HardcodedSecret(HardcodedSecret::new(config)?),
            rule_id::HARDCODED_IV => Self::HardcodedIv(HardcodedIv::new()?),
            rule_id::WEAK_HASH => Self::WeakHash(WeakHash::new(config)?),
            rule_id::WEAK_RANDOM => Self::WeakRandom(WeakRandom::new()?),
            rule_id::INSECURE_CIPHER_MODE => Self::InsecureCipherMode(InsecureCipherMode::new()?),
            rule_id::WEAK_ASYMMETRIC_KEY => {
                Self::WeakAsymmetricKey(WeakAsymmetricKey::new(config)?)
            }
            rule_id::WEAK_ENCODING => Self::WeakEncoding(WeakEncoding::new()?),
            _ => return Ok(None),
        };
        Ok(Some(matcher))
    }

    pub const fn rule_id(&self) -> &'static str {
        match self {
            Self::HardcodedSecret(_) => rule_id::HARDCODED_SECRET,
            Self::HardcodedIv(_) => rule_id::HARDCODED_IV,
            Self::WeakHash(_) => rule_id::WEAK_HASH,
            Self::WeakRandom(_) => rule_id::WEAK_RANDOM,
            Self::InsecureCipherMode(_) => rule_id::INSECURE_CIPHER_MODE,
            Self::WeakAsymmetricKey(_) => rule_id::WEAK_ASYMMETRIC_KEY,
            Self::WeakEncoding(_) => rule_id::WEAK_ENCODING,
        }
    }

    /// Run the matcher over one source unit
    pub fn scan_unit(&self, rule: &Rule, unit: &SourceUnit) -> Result<Vec<Finding>, ScanError> {
        match self {
            Self::HardcodedSecret(m) => m.scan_unit(rule, unit),
            Self::HardcodedIv(m) => m.scan_unit(rule, unit),
            Self::WeakHash(m) => m.scan_unit(rule, unit),
            Self::WeakRandom(m) => m.scan_unit(rule, unit),
            Self::InsecureCipherMode(m) => m.scan_unit(rule, unit),
            Self::WeakAsymmetricKey(m) => m.scan_unit(rule, unit),
            Self::WeakEncoding(m) => m.scan_unit(rule, unit),
        }
    }
}

/// Build matchers for every enabled rule
pub fn build_enabled(
    config: &Config,
    registry: &RuleRegistry,
) -> Result<Vec<RuleMatcher>, ScanError> {
    let mut matchers = Vec::new();
    for rule in registry.select(&config.enabled_rules)? {
        if let Some(matcher) = RuleMatcher::for_rule(rule.id, config)? {
            matchers.push(matcher);
        }
    }
    Ok(matchers)
}

pub(crate) fn compile(pattern: &str) -> Result<Regex, ScanError> {
    Regex::new(pattern).map_err(|e| ScanError::Pattern(format!("{pattern}: {e}")))
}

/// Last dotted segment of a callee path, lowercased
pub(crate) fn callee_tail(callee: &str) -> String {
    callee
        .rsplit('.')
        .next()
        .unwrap_or(callee)
        .to_ascii_lowercase()
}

/// Last two dotted segments, lowercased (`hashlib.md5`, `aes.new`)
pub(crate) fn callee_tail2(callee: &str) -> String {
    let mut parts: Vec<&str> = callee.rsplit('.').take(2).collect();
    parts.reverse();
    parts.join(".").to_ascii_lowercase()
}

/// Cipher-construction entry points across the supported ecosystems
pub(crate) fn is_cipher_ctor(callee: &str) -> bool {
    let tail = callee_tail(callee);
    let tail2 = callee_tail2(callee);
    matches!(
        tail.as_str(),
        "createcipheriv" | "createdecipheriv" | "createcipher" | "createdecipher" | "cipher"
    ) || matches!(
        tail2.as_str(),
        "aes.new" | "des.new" | "des3.new" | "arc4.new" | "blowfish.new" | "chacha20.new"
    )
}

/// Calls that count as evidence of an actual encryption step
pub(crate) fn is_encryption_call(callee: &str) -> bool {
    let tail = callee_tail(callee);
    is_cipher_ctor(callee) || tail.contains("encrypt") || tail.contains("seal")
}

pub(crate) fn first_string_arg(args: &[ArgValue]) -> Option<&str> {
    args.iter().find_map(|arg| match arg {
        ArgValue::Literal(lit) => lit.as_text(),
        _ => None,
    })
}

pub(crate) fn first_int_arg(args: &[ArgValue]) -> Option<i64> {
    args.iter().find_map(|arg| match arg {
        ArgValue::Literal(lit) => lit.as_int(),
        _ => None,
    })
}

/// Value of a keyword argument whose name matches one of `names`
pub(crate) fn keyword_arg<'a>(args: &'a [ArgValue], names: &[&str]) -> Option<&'a ArgValue> {
    args.iter().find_map(|arg| match arg {
        ArgValue::Keyword { name, value } if names.contains(&name.to_ascii_lowercase().as_str()) => {
            Some(value.as_ref())
        }
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callee_tails() {
        assert_eq!(callee_tail("crypto.createHash"), "createhash");
        assert_eq!(callee_tail2("hashlib.md5"), "hashlib.md5");
        assert_eq!(callee_tail2("Crypto.Cipher.AES.new"), "aes.new");
        assert_eq!(callee_tail2("md5"), "md5");
    }

    #[test]
    fn test_cipher_ctor_detection() {
        assert!(is_cipher_ctor("crypto.createCipheriv"));
        assert!(is_cipher_ctor("AES.new"));
        assert!(!is_cipher_ctor("cipher.update"));
        assert!(!is_cipher_ctor("JSON.stringify"));
    }

    #[test]
    fn test_every_detection_rule_has_a_matcher() {
        let config = Config::default();
        let registry = RuleRegistry::with_default_rules();
        for rule in registry.rules() {
            let matcher = RuleMatcher::for_rule(rule.id, &config).unwrap();
            assert_eq!(
                matcher.is_some(),
                !rule.is_diagnostic(),
                "matcher coverage mismatch for {}",
                rule.id
            );
        }
    }
}
