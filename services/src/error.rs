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

use std::io;

use axon::role::CycleError;
use settings::ConfigError;
use tokio::task::JoinError;

#[derive(Clone, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum ConfigInitError {
    /// I/O error during config file processing: {0}
    Io(String),

    /// Unable to produce TOML representation of the config: {0}
    #[from]
    Toml(toml::ser::Error),
}

impl From<io::Error> for ConfigInitError {
    fn from(err: io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[derive(Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum BootstrapError {
    /// Configuration file error: {0}
    #[from]
    Config(ConfigError),

    /// Error during initialization of the configuration file: {0}
    #[from]
    ConfigInit(ConfigInitError),

    /// Invalid secret key: {0}
    SecretKey(String),

    /// Unable to construct RPC client: {0}
    RpcClient(String),

    /// Unable to start async runtime: {0}
    Io(String),
}

impl From<io::Error> for BootstrapError {
    fn from(err: io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[derive(Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum RuntimeError {
    /// Role cycle has failed: {0}
    #[from]
    Cycle(CycleError),

    /// Role cycle task has terminated abnormally: {0}
    #[from]
    Join(JoinError),

    /// Command {0} is not supported by {1} role
    UnsupportedCommand(String, String),
}
