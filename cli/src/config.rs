//! Instance configuration files

use serde::Deserialize;
use std::path::Path;
use strongbox_core::{TreasuryConfiguration, VendorConfiguration};

/// Context URI attached to metadata records when the file names none
pub const DEFAULT_CONTEXT: &str = "https://github.com/strongbox-treasury/metadata";

/// A treasury instance as written by an operator
#[derive(Debug, Clone, Deserialize)]
pub struct InstanceConfig {
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_context")]
    pub context: String,
    pub treasury: TreasuryConfiguration,
    pub vendor: VendorConfiguration,
}

fn default_context() -> String {
    DEFAULT_CONTEXT.to_string()
}

impl InstanceConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read {}: {}", path.as_ref().display(), e))?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(toml::from_str(contents)?)
    }
}

/// Replace `$HOME` in a configured path
pub fn expand_path(path: &str) -> String {
    path.replace("$HOME", &std::env::var("HOME").unwrap_or_default())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use strongbox_core::MultisigScript;

    pub(crate) const SAMPLE: &str = r#"
label = "Core development 2025"
description = "Funds the core team's roadmap"

[treasury]
registry_token = "04040404040404040404040404040404040404040404040404040404"
expiration = 1702592000000
payout_upperbound = 1705184000000

[treasury.permissions.reorganize]
type = "signature"
key_hash = "01010101010101010101010101010101010101010101010101010101"

[treasury.permissions.sweep]
type = "signature"
key_hash = "01010101010101010101010101010101010101010101010101010101"

[treasury.permissions.fund]
type = "at_least"
required = 1
scripts = [
    { type = "signature", key_hash = "01010101010101010101010101010101010101010101010101010101" },
    { type = "signature", key_hash = "02020202020202020202020202020202020202020202020202020202" },
]

[treasury.permissions.disburse]
type = "signature"
key_hash = "02020202020202020202020202020202020202020202020202020202"

[vendor]
registry_token = "04040404040404040404040404040404040404040404040404040404"
expiration = 1707776000000

[vendor.permissions.pause]
type = "signature"
key_hash = "03030303030303030303030303030303030303030303030303030303"

[vendor.permissions.resume]
type = "signature"
key_hash = "03030303030303030303030303030303030303030303030303030303"

[vendor.permissions.modify]
type = "all_of"
scripts = [
    { type = "signature", key_hash = "01010101010101010101010101010101010101010101010101010101" },
    { type = "signature", key_hash = "03030303030303030303030303030303030303030303030303030303" },
]
"#;

    #[test]
    fn test_parse_instance_config() {
        let config = InstanceConfig::parse(SAMPLE).unwrap();
        assert_eq!(config.label, "Core development 2025");
        assert_eq!(config.context, DEFAULT_CONTEXT);
        assert!(matches!(
            config.treasury.permissions.fund,
            MultisigScript::AtLeast { required: 1, .. }
        ));
        config.vendor.validate_against(&config.treasury).unwrap();
    }

    #[test]
    fn test_missing_vendor_section_is_rejected() {
        let truncated = SAMPLE.split("[vendor]").next().unwrap();
        assert!(InstanceConfig::parse(truncated).is_err());
    }

    #[test]
    fn test_expand_path() {
        std::env::set_var("HOME", "/home/operator");
        assert_eq!(expand_path("$HOME/.strongbox"), "/home/operator/.strongbox");
    }
}
