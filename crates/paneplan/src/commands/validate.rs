use clap::ArgMatches;
use paneplan_core::PaneplanConfig;
use paneplan_core::layout_ops::{self, PreparedLayout};
use tracing::{error, info};

use super::helpers::{report_error, short_hash};

pub(crate) fn handle_validate_command(
    config: &PaneplanConfig,
    matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(key) = matches.get_one::<String>("preset") {
        info!(event = "cli.validate_started", preset = %key);
        return match layout_ops::prepare_emission(config, key) {
            Ok(prepared) => {
                println!("{}", summary_line(key, &prepared));
                info!(event = "cli.validate_completed", preset = %key);
                Ok(())
            }
            Err(e) => {
                report_error(&e);
                Err(e.into())
            }
        };
    }

    info!(event = "cli.validate_all_started", presets = config.presets.len());

    let results = layout_ops::prepare_all(config);
    if results.is_empty() {
        println!("No presets configured.");
        return Ok(());
    }

    let total = results.len();
    let mut failed = 0;
    for (key, result) in &results {
        match result {
            Ok(prepared) => println!("{}", summary_line(key, prepared)),
            Err(e) => {
                failed += 1;
                report_error(e);
            }
        }
    }

    if failed > 0 {
        error!(event = "cli.validate_all_failed", failed = failed, total = total);
        return Err(format!("{} of {} preset(s) failed validation", failed, total).into());
    }

    info!(event = "cli.validate_all_completed", total = total);
    Ok(())
}

pub(crate) fn summary_line(key: &str, prepared: &PreparedLayout) -> String {
    let emission = &prepared.emission;
    format!(
        "ok {}: {} pane(s), {} split(s), {} step(s), hash {}",
        key,
        emission.terminals.len(),
        emission.split_count(),
        emission.steps.len(),
        short_hash(&emission.hash)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use paneplan_config::parse_config;

    #[test]
    fn test_summary_line_counts() {
        let config = parse_config(
            r#"
[presets.pair]
name = "Pair"

[presets.pair.layout]
type = "horizontal"
ratio = [3, 2]

[[presets.pair.layout.panes]]
name = "left"

[[presets.pair.layout.panes]]
name = "right"
"#,
            "test.toml",
        )
        .unwrap();
        let prepared = layout_ops::prepare_emission(&config, "pair").unwrap();
        let line = summary_line("pair", &prepared);
        assert!(
            line.starts_with("ok pair: 2 pane(s), 1 split(s), 2 step(s), hash "),
            "got: {line}"
        );
        assert_eq!(line.len(), "ok pair: 2 pane(s), 1 split(s), 2 step(s), hash ".len() + 12);
    }
}
