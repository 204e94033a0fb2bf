use std::path::PathBuf;

use clap::ArgMatches;
use paneplan_core::{PaneplanConfig, PaneplanError};
use tracing::{error, info, warn};

/// Load the config named by `--config`, or the user/project hierarchy.
pub(crate) fn load_config(
    matches: &ArgMatches,
) -> Result<PaneplanConfig, Box<dyn std::error::Error>> {
    let explicit = matches.get_one::<PathBuf>("config");
    let result = match explicit {
        Some(path) => paneplan_config::load_file(path),
        None => PaneplanConfig::load_hierarchy(),
    };

    match result {
        Ok(config) => {
            info!(
                event = "cli.config.load_completed",
                explicit = explicit.is_some(),
                presets = config.presets.len()
            );
            Ok(config)
        }
        Err(e) => {
            report_error(&e);
            Err(e.into())
        }
    }
}

/// Print `error [CODE]: message` and log the failure at a level matching its cause.
pub(crate) fn report_error<E: PaneplanError>(e: &E) {
    eprintln!("{}", format_error(e));

    if e.is_user_error() {
        warn!(
            event = "cli.error_reported",
            error_code = e.error_code(),
            phase = %e.phase(),
            path = e.path(),
            error = %e
        );
    } else {
        error!(
            event = "cli.error_reported",
            error_code = e.error_code(),
            phase = %e.phase(),
            path = e.path(),
            error = %e
        );
    }
}

pub(crate) fn format_error<E: PaneplanError>(e: &E) -> String {
    format!("error [{}]: {}", e.error_code(), e)
}

/// Parse an optional flag value through the type's `FromStr`.
pub(crate) fn parse_optional<T>(
    matches: &ArgMatches,
    name: &str,
) -> Result<Option<T>, Box<dyn std::error::Error>>
where
    T: std::str::FromStr<Err = String>,
{
    matches
        .get_one::<String>(name)
        .map(|value| value.parse::<T>())
        .transpose()
        .map_err(Into::into)
}

/// First characters of a plan hash, enough to tell plans apart at a glance.
pub(crate) fn short_hash(hash: &str) -> &str {
    hash.get(..12).unwrap_or(hash)
}
