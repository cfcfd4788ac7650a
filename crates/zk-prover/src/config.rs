//! Prover configuration
//!
//! Values come from a JSON file, the environment, or code. The binary layers
//! them as defaults, then `--config <file>`, then environment variables, then
//! command line arguments.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::circuits::EqualityGadget;
use crate::error::{ProverError, Result};

/// Environment variable holding the key file prefix
pub const KEY_PREFIX_ENV: &str = "MATCH_ZK_KEY_PREFIX";

/// Environment variable selecting the equality gadget
pub const GADGET_ENV: &str = "MATCH_ZK_GADGET";

/// Environment variable naming a JSON config file for the binary
pub const CONFIG_FILE_ENV: &str = "MATCH_ZK_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProverConfig {
    /// Prefix the key file suffixes are appended to
    pub key_prefix: PathBuf,
    /// Must match the gadget the keys were generated with
    pub gadget: EqualityGadget,
}

impl Default for ProverConfig {
    fn default() -> Self {
        Self {
            key_prefix: PathBuf::from("./"),
            gadget: EqualityGadget::default(),
        }
    }
}

impl ProverConfig {
    /// Load from `MATCH_ZK_KEY_PREFIX` and `MATCH_ZK_GADGET`
    pub fn from_env() -> Result<Self> {
        Self::default().with_env()
    }

    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| ProverError::Config {
            key: "config".into(),
            value: path.display().to_string(),
            expected: format!("a readable JSON file ({e})"),
        })?;
        Self::from_json(&json)
    }

    /// Override fields with whatever the environment sets
    pub fn with_env(self) -> Result<Self> {
        self.with_lookup(|key| env::var(key).ok())
    }

    fn with_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(prefix) = lookup(KEY_PREFIX_ENV).filter(|p| !p.is_empty()) {
            self.key_prefix = PathBuf::from(prefix);
        }
        if let Some(gadget) = lookup(GADGET_ENV) {
            self.gadget = gadget.parse()?;
        }

        Ok(self)
    }
}
