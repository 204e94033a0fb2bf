use clap::{Arg, ArgAction, Command};

pub fn list_command() -> Command {
    Command::new("list").about("List configured presets")
}

pub fn validate_command() -> Command {
    Command::new("validate")
        .about("Compile presets and report their step counts and plan hashes")
        .arg(
            Arg::new("preset")
                .help("Preset key to validate (default: all presets)")
                .index(1),
        )
}

pub fn apply_command() -> Command {
    Command::new("apply")
        .about("Build a preset's layout in the current multiplexer")
        .arg(
            Arg::new("preset")
                .help("Preset key to apply")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Print the commands that would run without running them")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("backend")
                .long("backend")
                .help("Multiplexer to drive (overrides preset and config)")
                .value_parser(["tmux", "wezterm"]),
        )
        .arg(
            Arg::new("window-mode")
                .long("window-mode")
                .help("Open a new window or reuse the current one")
                .value_parser(["new-window", "current-window"]),
        )
        .arg(
            Arg::new("window-name")
                .long("window-name")
                .help("Name for the new window (default: preset name)"),
        )
        .arg(
            Arg::new("yes")
                .short('y')
                .long("yes")
                .help("Close existing panes without asking")
                .action(ArgAction::SetTrue),
        )
}
