//! Per-terminal setup actions shared by live execution and preview.

use crate::escape::shell_escape;
use crate::executor::errors::ExecutionError;
use crate::panes::{TemplateContext, resolve_template_tokens};
use crate::plan::EmittedTerminal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SetupAction {
    /// Text typed into the pane followed by Enter.
    SendText {
        kind: SetupKind,
        text: String,
        delay_ms: Option<u64>,
    },
    SetTitle { title: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SetupKind {
    Cwd,
    Env { key: String },
    Command,
}

/// Actions for one terminal, in the order they are applied: working directory,
/// environment, title, then the command after its delay.
pub(crate) fn plan_terminal_setup(
    terminal: &EmittedTerminal,
    context: &TemplateContext<'_>,
) -> Result<Vec<SetupAction>, ExecutionError> {
    let path = terminal.virtual_pane_id.as_str();
    let mut actions = Vec::new();

    if let Some(cwd) = &terminal.cwd {
        actions.push(SetupAction::SendText {
            kind: SetupKind::Cwd,
            text: format!("cd {}", shell_escape(cwd)),
            delay_ms: None,
        });
    }

    for (key, value) in &terminal.env {
        let value = resolve_template_tokens(value, context, path)?;
        actions.push(SetupAction::SendText {
            kind: SetupKind::Env { key: key.clone() },
            text: format!("export {}={}", key, shell_escape(&value)),
            delay_ms: None,
        });
    }

    if let Some(title) = &terminal.title {
        actions.push(SetupAction::SetTitle {
            title: title.clone(),
        });
    }

    if let Some(command) = &terminal.command {
        let resolved = resolve_template_tokens(command, context, path)?;
        let text = match (terminal.ephemeral, terminal.close_on_error) {
            (false, _) => resolved,
            (true, true) => format!("{resolved}; exit"),
            (true, false) => format!("{resolved} && exit"),
        };
        actions.push(SetupAction::SendText {
            kind: SetupKind::Command,
            text,
            delay_ms: terminal.delay_ms.filter(|ms| *ms > 0),
        });
    }

    Ok(actions)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn terminal() -> EmittedTerminal {
        EmittedTerminal {
            virtual_pane_id: "root.1".to_string(),
            name: "server".to_string(),
            command: Some("npm run dev --inspect {{this_pane}}".to_string()),
            cwd: Some("/srv/my app".to_string()),
            env: BTreeMap::from([
                ("PORT".to_string(), "3000".to_string()),
                ("EDITOR_PANE".to_string(), "{{pane_id:editor}}".to_string()),
            ]),
            focus: false,
            delay_ms: Some(250),
            title: Some("Server".to_string()),
            ephemeral: false,
            close_on_error: false,
        }
    }

    fn with_context<T>(f: impl FnOnce(&TemplateContext<'_>) -> T) -> T {
        let names = BTreeMap::from([
            ("editor".to_string(), "%1".to_string()),
            ("server".to_string(), "%2".to_string()),
        ]);
        f(&TemplateContext {
            this_pane: "%2",
            focus_pane: "%1",
            panes_by_name: &names,
        })
    }

    #[test]
    fn test_actions_follow_setup_order() {
        let actions = with_context(|ctx| plan_terminal_setup(&terminal(), ctx)).unwrap();
        assert_eq!(
            actions,
            vec![
                SetupAction::SendText {
                    kind: SetupKind::Cwd,
                    text: "cd '/srv/my app'".to_string(),
                    delay_ms: None,
                },
                SetupAction::SendText {
                    kind: SetupKind::Env {
                        key: "EDITOR_PANE".to_string()
                    },
                    text: "export EDITOR_PANE='%1'".to_string(),
                    delay_ms: None,
                },
                SetupAction::SendText {
                    kind: SetupKind::Env {
                        key: "PORT".to_string()
                    },
                    text: "export PORT='3000'".to_string(),
                    delay_ms: None,
                },
                SetupAction::SetTitle {
                    title: "Server".to_string()
                },
                SetupAction::SendText {
                    kind: SetupKind::Command,
                    text: "npm run dev --inspect %2".to_string(),
                    delay_ms: Some(250),
                },
            ]
        );
    }

    #[test]
    fn test_ephemeral_suffixes() {
        let mut spec = terminal();
        spec.cwd = None;
        spec.env.clear();
        spec.title = None;
        spec.command = Some("make test".to_string());
        spec.ephemeral = true;

        let actions = with_context(|ctx| plan_terminal_setup(&spec, ctx)).unwrap();
        assert!(matches!(
            &actions[0],
            SetupAction::SendText { text, .. } if text == "make test && exit"
        ));

        spec.close_on_error = true;
        let actions = with_context(|ctx| plan_terminal_setup(&spec, ctx)).unwrap();
        assert!(matches!(
            &actions[0],
            SetupAction::SendText { text, .. } if text == "make test; exit"
        ));
    }

    #[test]
    fn test_plain_shell_has_no_actions() {
        let spec = EmittedTerminal {
            command: None,
            cwd: None,
            env: BTreeMap::new(),
            title: None,
            delay_ms: Some(100),
            ..terminal()
        };
        assert!(
            with_context(|ctx| plan_terminal_setup(&spec, ctx))
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_unknown_token_in_command_fails() {
        let mut spec = terminal();
        spec.command = Some("attach {{pane_id:db}}".to_string());
        let error = with_context(|ctx| plan_terminal_setup(&spec, ctx)).unwrap_err();
        assert!(matches!(
            error,
            ExecutionError::TemplateTokenUnresolved { ref path, ref name, .. }
                if path == "root.1" && name == "db"
        ));
    }
}
