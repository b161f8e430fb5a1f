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

//! Service runtime of the Axon client: configuration, logging, the periodic
//! single-flight scheduler and JSON-RPC collaborators connecting checker &
//! collator roles to CKB and the sidechain.

#![recursion_limit = "256"]
#![deny(
    non_upper_case_globals,
    non_camel_case_types,
    non_snake_case,
    unused_mut,
    //unused_imports,
    dead_code,
    //missing_docs
)]

#[macro_use]
extern crate amplify;
#[macro_use]
extern crate serde_crate as serde;
#[macro_use]
extern crate log;

pub mod config;
pub mod error;
pub mod node;
pub mod rpc;
pub mod runtime;
pub mod shell;

pub use config::{Config, RoleKind};
pub use error::{BootstrapError, ConfigInitError, RuntimeError};
pub use node::{Cycle, Scheduler};
pub use runtime::Node;
pub use shell::{Command, LogLevel, Opts};
