use clap::ArgMatches;
use tracing::error;

mod apply;
mod helpers;
mod list;
mod validate;

pub fn run_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let config = helpers::load_config(matches)?;

    match matches.subcommand() {
        Some(("list", _)) => list::handle_list_command(&config),
        Some(("validate", sub_matches)) => validate::handle_validate_command(&config, sub_matches),
        Some(("apply", sub_matches)) => apply::handle_apply_command(&config, sub_matches),
        _ => {
            error!(event = "cli.command_unknown");
            Err("Unknown command".into())
        }
    }
}
