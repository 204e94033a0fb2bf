mod global;
mod layout;

#[cfg(test)]
mod tests;

use clap::Command;

pub fn build_cli() -> Command {
    global::root_command()
        .subcommand(layout::list_command())
        .subcommand(layout::validate_command())
        .subcommand(layout::apply_command())
}
