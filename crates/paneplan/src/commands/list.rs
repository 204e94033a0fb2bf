use paneplan_core::PaneplanConfig;
use serde_json::Value;
use tracing::info;

/// Key, display name and description of one configured preset.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PresetRow {
    pub key: String,
    pub name: String,
    pub description: String,
}

pub(crate) fn handle_list_command(
    config: &PaneplanConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    info!(event = "cli.list_started");

    let rows = preset_rows(config);
    if rows.is_empty() {
        println!("No presets configured.");
    } else {
        println!("Presets:");
        for line in format_rows(&rows) {
            println!("{}", line);
        }
    }

    info!(event = "cli.list_completed", count = rows.len());
    Ok(())
}

/// Rows read straight from the raw documents; invalid presets still list.
pub(crate) fn preset_rows(config: &PaneplanConfig) -> Vec<PresetRow> {
    config
        .presets
        .iter()
        .map(|(key, raw)| PresetRow {
            key: key.clone(),
            name: text_field(raw, "name").unwrap_or_else(|| key.clone()),
            description: text_field(raw, "description").unwrap_or_default(),
        })
        .collect()
}

fn text_field(raw: &Value, field: &str) -> Option<String> {
    raw.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub(crate) fn format_rows(rows: &[PresetRow]) -> Vec<String> {
    let key_width = rows.iter().map(|r| r.key.len()).max().unwrap_or(0);
    let name_width = rows.iter().map(|r| r.name.len()).max().unwrap_or(0);
    rows.iter()
        .map(|row| {
            let line = format!(
                "  {:<key_width$}  {:<name_width$}  {}",
                row.key, row.name, row.description
            );
            line.trim_end().to_string()
        })
        .collect()
}
