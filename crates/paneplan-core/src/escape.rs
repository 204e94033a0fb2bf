/// Quote a string for a POSIX shell, escaping embedded single quotes.
pub fn shell_escape(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\"'\"'"))
}

/// Quote only when the string contains characters a shell would interpret.
///
/// Used when rendering argument vectors for humans; plain words stay readable.
pub fn shell_escape_if_needed(s: &str) -> String {
    let plain = !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@%+,".contains(c));
    if plain { s.to_string() } else { shell_escape(s) }
}

/// Render an argument vector as a single shell-safe command line.
pub fn render_command_line(argv: &[String]) -> String {
    argv.iter()
        .map(|arg| shell_escape_if_needed(arg))
        .collect::<Vec<_>>()
        .join(" ")
}
