use std::{fs, path::Path};

use anyhow::{ensure, Context};
use bridge_core::{Address, Chain, CoreConfig};
use serde::{Deserialize, Serialize};

fn default_consistency_level() -> u8 {
    15
}

/// Instantiation parameters of a token bridge.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub core: CoreConfig,

    /// Emitter address of this bridge; also the address other chains register for it.
    pub bridge_address: Address,

    /// Token standing in for the chain's native currency, if the chain has one.
    #[serde(default)]
    pub wrapped_native: Option<Address>,

    /// Consistency level requested for outbound messages.
    #[serde(default = "default_consistency_level")]
    pub consistency_level: u8,
}

impl Config {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let config: Config =
            serde_json::from_str(json).context("failed to parse token bridge config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let core = &self.core;
        ensure!(core.chain_id != Chain::Any, "chain_id must not be 0");
        ensure!(
            core.governance_chain != Chain::Any,
            "governance_chain must not be 0"
        );
        ensure!(
            !core.initial_guardian_set.is_empty(),
            "initial_guardian_set is empty"
        );
        ensure!(
            core.initial_guardian_set.len() <= usize::from(u8::MAX),
            "initial_guardian_set has {} guardians, at most {} are addressable",
            core.initial_guardian_set.len(),
            u8::MAX
        );
        ensure!(!self.bridge_address.is_zero(), "bridge_address is zero");
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const CONFIG: &str = r#"{
        "core": {
            "chain_id": 2,
            "governance_chain": 1,
            "governance_contract": "0x0000000000000000000000000000000000000000000000000000000000000004",
            "guardian_set_expiry": 86400,
            "initial_guardian_set": ["befa429d57cd18b7f8a4d91a2da9ab4af05d0fbe"]
        },
        "bridge_address": "0000000000000000000000003ee18b2214aff97000d974cf647e7c347e8fa585"
    }"#;

    #[test]
    fn parse_with_defaults() {
        let config = Config::from_json(CONFIG).unwrap();
        assert_eq!(config.core.chain_id, Chain::Ethereum);
        assert_eq!(config.core.governance_chain, Chain::Solana);
        assert_eq!(config.core.governance_contract.0[31], 4);
        assert_eq!(config.core.initial_guardian_set.len(), 1);
        assert_eq!(config.wrapped_native, None);
        assert_eq!(config.consistency_level, 15);

        let again = Config::from_json(&serde_json::to_string(&config).unwrap()).unwrap();
        assert_eq!(again, config);
    }

    #[test]
    fn rejects_invalid() {
        let err = Config::from_json(&CONFIG.replace("\"chain_id\": 2", "\"chain_id\": 0"))
            .unwrap_err();
        assert!(err.to_string().contains("chain_id"));

        let err = Config::from_json(&CONFIG.replace(
            "[\"befa429d57cd18b7f8a4d91a2da9ab4af05d0fbe\"]",
            "[]",
        ))
        .unwrap_err();
        assert!(err.to_string().contains("empty"));

        let err = Config::from_json(&CONFIG.replace("\"core\"", "\"extra\": 1, \"core\""))
            .unwrap_err();
        assert!(format!("{err:#}").contains("unknown field"));
    }

    #[test]
    fn load_reports_path() {
        let err = Config::load("/nonexistent/bridge.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/bridge.json"));
    }
}
