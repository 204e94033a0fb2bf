use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::executor::errors::ExecutionError;
use crate::plan::EmittedTerminal;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*(this_pane|focus_pane|pane_id\s*:\s*([^{}]*?))\s*\}\}")
        .expect("template token regex is valid")
});

/// Pane IDs available to `{{...}}` tokens while setting up one terminal.
#[derive(Debug, Clone, Copy)]
pub struct TemplateContext<'a> {
    pub this_pane: &'a str,
    pub focus_pane: &'a str,
    /// Terminal name to pane ID.
    pub panes_by_name: &'a BTreeMap<String, String>,
}

/// Build the name table for `{{pane_id:<name>}}` lookups.
///
/// Terminals are inserted in document order, so a later terminal with a duplicate name
/// replaces an earlier one.
pub fn build_name_table<'a, F>(
    terminals: &'a [EmittedTerminal],
    mut pane_for: F,
) -> Result<BTreeMap<String, String>, ExecutionError>
where
    F: FnMut(&'a EmittedTerminal) -> Result<String, ExecutionError>,
{
    let mut table = BTreeMap::new();
    for terminal in terminals {
        table.insert(terminal.name.clone(), pane_for(terminal)?);
    }
    Ok(table)
}

/// Substitute `{{this_pane}}`, `{{focus_pane}}` and `{{pane_id:<name>}}` in one pass.
///
/// Text without tokens is returned unchanged. Replaced values are never rescanned.
pub fn resolve_template_tokens(
    text: &str,
    context: &TemplateContext<'_>,
    path: &str,
) -> Result<String, ExecutionError> {
    let mut output = String::with_capacity(text.len());
    let mut last = 0;

    for caps in TOKEN.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        output.push_str(&text[last..whole.start()]);
        output.push_str(&replacement(&caps, context, path)?);
        last = whole.end();
    }
    output.push_str(&text[last..]);
    Ok(output)
}

fn replacement(
    caps: &Captures<'_>,
    context: &TemplateContext<'_>,
    path: &str,
) -> Result<String, ExecutionError> {
    if let Some(name) = caps.get(2) {
        let name = name.as_str().trim();
        return context
            .panes_by_name
            .get(name)
            .cloned()
            .ok_or_else(|| ExecutionError::TemplateTokenUnresolved {
                path: path.to_string(),
                token_kind: "pane_id".to_string(),
                name: name.to_string(),
                known: context.panes_by_name.keys().cloned().collect(),
            });
    }

    match caps.get(1).map(|m| m.as_str()) {
        Some("this_pane") => Ok(context.this_pane.to_string()),
        Some("focus_pane") => Ok(context.focus_pane.to_string()),
        other => Err(ExecutionError::TemplateTokenUnresolved {
            path: path.to_string(),
            token_kind: other.unwrap_or_default().to_string(),
            name: String::new(),
            known: context.panes_by_name.keys().cloned().collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("editor".to_string(), "%1".to_string()),
            ("server".to_string(), "%2".to_string()),
        ])
    }

    fn terminal(id: &str, name: &str) -> EmittedTerminal {
        EmittedTerminal {
            virtual_pane_id: id.to_string(),
            name: name.to_string(),
            command: None,
            cwd: None,
            env: BTreeMap::new(),
            focus: false,
            delay_ms: None,
            title: None,
            ephemeral: false,
            close_on_error: false,
        }
    }

    #[test]
    fn test_resolves_all_token_kinds() {
        let table = names();
        let ctx = TemplateContext {
            this_pane: "%3",
            focus_pane: "%1",
            panes_by_name: &table,
        };
        let out = resolve_template_tokens(
            "tail -f log --from {{this_pane}} --to {{ pane_id:server }} && echo {{focus_pane}}",
            &ctx,
            "root.2",
        )
        .unwrap();
        assert_eq!(out, "tail -f log --from %3 --to %2 && echo %1");
    }

    #[test]
    fn test_text_without_tokens_is_unchanged() {
        let table = names();
        let ctx = TemplateContext {
            this_pane: "%3",
            focus_pane: "%1",
            panes_by_name: &table,
        };
        let text = "echo '{not a token}' {{unknown}}";
        assert_eq!(resolve_template_tokens(text, &ctx, "root").unwrap(), text);
    }

    #[test]
    fn test_replacements_are_not_rescanned() {
        let table = BTreeMap::from([("weird".to_string(), "{{this_pane}}".to_string())]);
        let ctx = TemplateContext {
            this_pane: "%9",
            focus_pane: "%9",
            panes_by_name: &table,
        };
        let out = resolve_template_tokens("{{pane_id:weird}}", &ctx, "root").unwrap();
        assert_eq!(out, "{{this_pane}}");
    }

    #[test]
    fn test_unknown_name_reports_sorted_known_names() {
        let table = names();
        let ctx = TemplateContext {
            this_pane: "%3",
            focus_pane: "%1",
            panes_by_name: &table,
        };
        let error = resolve_template_tokens("{{pane_id:db}}", &ctx, "root.1").unwrap_err();
        assert_eq!(
            error,
            ExecutionError::TemplateTokenUnresolved {
                path: "root.1".to_string(),
                token_kind: "pane_id".to_string(),
                name: "db".to_string(),
                known: vec!["editor".to_string(), "server".to_string()],
            }
        );
    }

    #[test]
    fn test_name_table_last_duplicate_wins() {
        let terminals = vec![
            terminal("root.0", "shell"),
            terminal("root.1", "editor"),
            terminal("root.2", "shell"),
        ];
        let table = build_name_table(&terminals, |t| Ok(t.virtual_pane_id.clone())).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("shell").map(String::as_str), Some("root.2"));
    }
}
