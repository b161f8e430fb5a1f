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

#[macro_use]
extern crate log;

use clap::Parser;
use std::fmt::Display;
use std::process;

use axon_services::{Command, Config, Node, Opts};

fn exit_with(context: &str, err: impl Display) -> ! {
    error!("{}: {}", context, err);
    eprintln!("{}: {}", context, err);
    process::exit(1)
}

#[tokio::main]
async fn main() {
    let opts = Opts::parse();
    opts.log_level().apply();
    debug!("Command-line arguments: {:?}", opts);

    let command = opts.command();
    if command == Command::Init {
        if let Err(err) = Config::write_default(&opts.config) {
            exit_with("Unable to write configuration", err);
        }
        return;
    }

    let mut config = Config::load(&opts.config)
        .unwrap_or_else(|err| exit_with("Unable to load configuration", err));
    if let Some(role) = opts.role {
        config.role = role;
    }
    let node = Node::with(&config)
        .unwrap_or_else(|err| exit_with("Unable to start the node", err));
    if let Err(err) = node.exec(&command, config.tick_interval()).await {
        exit_with("Command has failed", err);
    }
}
