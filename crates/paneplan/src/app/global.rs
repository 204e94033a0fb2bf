use std::path::PathBuf;

use clap::{Arg, ArgAction, Command};

pub fn root_command() -> Command {
    Command::new("paneplan")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Apply declarative pane layouts to tmux or WezTerm")
        .long_about("paneplan compiles layout presets from ~/.paneplan/config.toml and ./.paneplan/config.toml into a fixed sequence of split and focus commands, then previews or runs them against a terminal multiplexer.")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Read presets from this file instead of the user and project configs")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
}
