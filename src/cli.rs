use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::{config::Config, packet::Packet, port::OpenOptions};

/// The command line interface for serial switch.
#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to a configuration file
    pub config: Option<PathBuf>,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Commands available in the command line interface.
#[derive(Subcommand)]
pub enum Commands {
    /// Examples for user convenience.
    #[clap(subcommand)]
    Examples(Examples),
}

/// Helpful examples for users.
#[derive(Subcommand, Clone)]
pub enum Examples {
    /// Show an example of a configuration file's contents.
    Config,

    /// Show example JSON open options.
    OpenOptions,

    /// Show an example JSON packet as pushed by a backend.
    Packet,
}

/// Print whatever the given command asks for.
pub fn handle_command(command: Commands) {
    let Commands::Examples(example) = command;

    match example {
        Examples::Config => println!("{}", Config::example().serialize_pretty()),
        Examples::OpenOptions => println!(
            "{}",
            serde_json::to_string_pretty(&OpenOptions::new(115_200)).expect("Should serialize")
        ),
        Examples::Packet => println!(
            "{}",
            serde_json::to_string_pretty(&Packet::incoming("COM1", "hello world", 1_700_000_000))
                .expect("Should serialize")
        ),
    }
}
