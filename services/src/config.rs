// Axon sidechain client implementing checker & collator roles
// Written in 2021 by
//     Axon Client developers
//
// To the extent possible under law, the author(s) have dedicated all
// copyright and related and neighboring rights to this software to
// the public domain worldwide. This software is distributed without
// any warranty.
//
// You should have received a copy of the MIT License
// along with this software.
// If not, see <https://opensource.org/licenses/MIT>.

use amplify::hex::FromHex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use axon::cell::CellTemplates;
use axon::ckb::CellDep;
use axon::{Composer, Secp256k1Signer};

use crate::error::{BootstrapError, ConfigInitError};

/// Prefix of the environment variables overriding the configuration file
pub const ENV_PREFIX: &str = "AXON";

#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Debug,
    Default,
    Display,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(crate = "serde_crate", rename_all = "lowercase")]
#[display(Debug)]
pub enum RoleKind {
    #[default]
    Checker,
    Collator,
}

/// Client configuration
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(crate = "serde_crate", default)]
pub struct Config {
    pub role: RoleKind,

    /// Sidechain served by the client
    pub chain_id: u8,

    /// Period of the role cycle, in milliseconds
    pub tick_interval: u64,

    /// Hex-encoded secp256k1 secret key of the role
    pub secret_key: String,

    pub ckb_rpc_url: String,
    pub ckb_indexer_url: String,

    /// Sidechain node providing the chain info and block range checks
    pub sidechain_rpc_url: String,

    /// Capacity of the task cells published by the collator, in shannons
    pub task_capacity: u64,

    /// Public RPC endpoint of the checker, announced when joining a sidechain
    pub checker_rpc_url: String,

    /// Capacity of the checker info cell created on join, in shannons
    pub checker_info_capacity: u64,

    /// Dependencies added to every composed transaction, i.e. secp256k1
    /// lock code
    pub cell_deps: Vec<CellDep>,

    pub templates: CellTemplates,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            role: RoleKind::Checker,
            chain_id: 0,
            tick_interval: 5000,
            secret_key: s!(""),
            ckb_rpc_url: s!("http://127.0.0.1:8114"),
            ckb_indexer_url: s!("http://127.0.0.1:8116"),
            sidechain_rpc_url: s!("http://127.0.0.1:8000"),
            task_capacity: 200_0000_0000,
            checker_rpc_url: s!("http://127.0.0.1:8001"),
            checker_info_capacity: 800_0000_0000,
            cell_deps: vec![],
            templates: CellTemplates::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the file (if it exists), `.env` file and
    /// `AXON_`-prefixed environment variables; nested keys are separated
    /// with `__`, i.e. `AXON_TEMPLATES__TASK__TYPE__CODE_HASH`
    pub fn load(path: &Path) -> Result<Config, settings::ConfigError> {
        if let Err(err) = dotenv::dotenv() {
            trace!("No .env file is loaded: {}", err);
        }
        settings::Config::builder()
            .add_source(
                settings::File::from(path)
                    .format(settings::FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                settings::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Writes configuration file with default values
    pub fn write_default(path: &Path) -> Result<(), ConfigInitError> {
        let toml = toml::to_string_pretty(&Config::default())?;
        fs::write(path, toml)?;
        info!("Default configuration is written to {}", path.display());
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval)
    }

    pub fn signer(&self) -> Result<Secp256k1Signer, BootstrapError> {
        let key = self.secret_key.trim_start_matches("0x");
        let data = Vec::<u8>::from_hex(key)
            .map_err(|err| BootstrapError::SecretKey(err.to_string()))?;
        Secp256k1Signer::from_slice(&data)
            .map_err(|err| BootstrapError::SecretKey(err.to_string()))
    }

    pub fn composer(&self) -> Result<Composer<Secp256k1Signer>, BootstrapError> {
        Ok(Composer::new(self.signer()?, self.cell_deps.clone()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use axon::ckb::{DepType, OutPoint, H256};
    use axon::Signer;
    use std::env;

    fn temp_path(name: &str) -> std::path::PathBuf {
        env::temp_dir().join(format!("axon-{}-{}.toml", name, std::process::id()))
    }

    #[test]
    fn test_default_roundtrip() {
        let path = temp_path("default");
        Config::write_default(&path).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.tick_interval(), Duration::from_secs(5));
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_file_values() {
        let path = temp_path("values");
        let mut config = Config::default();
        config.role = RoleKind::Collator;
        config.chain_id = 3;
        config.checker_rpc_url = s!("http://checker.example:8001");
        config.checker_info_capacity = 900_0000_0000;
        config.secret_key = format!("0x{}", "01".repeat(32));
        config.cell_deps.push(CellDep {
            out_point: OutPoint::new(H256([0x11; 32]), 2),
            dep_type: DepType::DepGroup,
        });
        fs::write(&path, toml::to_string(&config).unwrap()).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
        let signer = loaded.signer().unwrap();
        assert_eq!(loaded.composer().unwrap().signer().lock_arg(), signer.lock_arg());
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_bad_secret_key() {
        let mut config = Config::default();
        assert!(matches!(config.signer(), Err(BootstrapError::SecretKey(_))));
        config.secret_key = s!("0xzz");
        assert!(matches!(config.signer(), Err(BootstrapError::SecretKey(_))));
    }
}
