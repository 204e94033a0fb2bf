//! Validation of raw preset documents into [`CompiledPreset`]s.

use std::collections::BTreeMap;

use paneplan_config::{BackendKind, WindowMode};
use serde_json::{Map, Value};
use tracing::debug;

use super::errors::{CompileError, CompileErrorKind};
use super::types::{CompiledPreset, LayoutNode, Orientation, SplitSpec, TerminalSpec, WeightSpec};

type Object = Map<String, Value>;

/// Compile an already-parsed preset document.
///
/// `key` is the preset's key under `[presets]`; `source` labels where the
/// document came from and is used only in error messages.
pub fn compile_preset_from_value(
    key: &str,
    value: &Value,
    source: &str,
) -> Result<CompiledPreset, CompileError> {
    let compiler = Compiler { source };
    let path = format!("presets.{}", key);
    let preset = compiler.compile_preset(key, value, &path)?;

    debug!(
        event = "core.preset.compile_completed",
        preset = %key,
        terminals = preset.terminal_count()
    );

    Ok(preset)
}

struct Compiler<'a> {
    source: &'a str,
}

impl Compiler<'_> {
    fn error(&self, kind: CompileErrorKind, path: impl Into<String>) -> CompileError {
        CompileError {
            kind,
            path: path.into(),
            source_label: self.source.to_string(),
        }
    }

    fn compile_preset(&self, key: &str, value: &Value, path: &str) -> Result<CompiledPreset, CompileError> {
        let obj = self.table(value, path)?;

        let name = self
            .optional_string(obj, &["name"], path)?
            .ok_or_else(|| self.error(CompileErrorKind::MissingField, format!("{}.name", path)))?;
        if name.trim().is_empty() {
            return Err(self.error(CompileErrorKind::EmptyValue, format!("{}.name", path)));
        }

        let description = self.optional_string(obj, &["description"], path)?;

        let backend = match self.optional_string(obj, &["backend"], path)? {
            Some(raw) => Some(raw.parse::<BackendKind>().map_err(|_| {
                self.error(
                    CompileErrorKind::InvalidValue {
                        value: raw.clone(),
                        expected: format!("expected one of: {}", BackendKind::supported_string()),
                    },
                    format!("{}.backend", path),
                )
            })?),
            None => None,
        };

        let window_mode = match self.optional_string(obj, &["window_mode", "windowMode"], path)? {
            Some(raw) => Some(raw.parse::<WindowMode>().map_err(|_| {
                self.error(
                    CompileErrorKind::InvalidValue {
                        value: raw.clone(),
                        expected: "expected new-window or current-window".to_string(),
                    },
                    format!("{}.window_mode", path),
                )
            })?),
            None => None,
        };

        let layout_value = obj.get("layout");
        let command = self.optional_string(obj, &["command"], path)?;

        let layout = match (layout_value, command) {
            (Some(_), Some(_)) => {
                return Err(self.error(CompileErrorKind::LayoutCommandConflict, path));
            }
            (Some(layout), None) => self.compile_node(layout, &format!("{}.layout", path))?,
            (None, Some(command)) => LayoutNode::Terminal(TerminalSpec {
                command: Some(command),
                focus: true,
                ..TerminalSpec::shell(name.clone())
            }),
            (None, None) => LayoutNode::Terminal(TerminalSpec {
                focus: true,
                ..TerminalSpec::shell(name.clone())
            }),
        };

        Ok(CompiledPreset {
            key: key.to_string(),
            name,
            description,
            backend,
            window_mode,
            layout,
        })
    }

    fn compile_node(&self, value: &Value, path: &str) -> Result<LayoutNode, CompileError> {
        let obj = self.table(value, path)?;

        match self.optional_string(obj, &["type", "orientation"], path)? {
            Some(kind) => {
                let orientation = match kind.as_str() {
                    "horizontal" => Orientation::Horizontal,
                    "vertical" => Orientation::Vertical,
                    _ => {
                        return Err(self.error(
                            CompileErrorKind::UnknownNodeType { found: kind },
                            format!("{}.type", path),
                        ));
                    }
                };
                self.compile_split(obj, orientation, path)
            }
            None if obj.contains_key("panes") => {
                Err(self.error(CompileErrorKind::MissingField, format!("{}.type", path)))
            }
            None => self.compile_terminal(obj, path).map(LayoutNode::Terminal),
        }
    }

    fn compile_split(
        &self,
        obj: &Object,
        orientation: Orientation,
        path: &str,
    ) -> Result<LayoutNode, CompileError> {
        let panes_path = format!("{}.panes", path);
        let raw_panes = match obj.get("panes") {
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(self.error(
                    CompileErrorKind::InvalidType {
                        expected: "an array of panes",
                    },
                    panes_path,
                ));
            }
            None => return Err(self.error(CompileErrorKind::MissingField, panes_path)),
        };

        if raw_panes.len() < 2 {
            return Err(self.error(
                CompileErrorKind::TooFewPanes {
                    count: raw_panes.len(),
                },
                panes_path,
            ));
        }

        let ratio_path = format!("{}.ratio", path);
        let ratio = match obj.get("ratio") {
            Some(Value::Array(entries)) => {
                if entries.len() != raw_panes.len() {
                    return Err(self.error(
                        CompileErrorKind::RatioPanesMismatch {
                            ratio: entries.len(),
                            panes: raw_panes.len(),
                        },
                        ratio_path,
                    ));
                }
                entries
                    .iter()
                    .enumerate()
                    .map(|(i, entry)| self.compile_weight(entry, &format!("{}[{}]", ratio_path, i)))
                    .collect::<Result<Vec<_>, _>>()?
            }
            Some(_) => {
                return Err(self.error(
                    CompileErrorKind::InvalidType {
                        expected: "an array of weights",
                    },
                    ratio_path,
                ));
            }
            // Equal weights when no ratio is given.
            None => vec![WeightSpec::Weight { weight: 1.0 }; raw_panes.len()],
        };

        let panes = raw_panes
            .iter()
            .enumerate()
            .map(|(i, pane)| self.compile_node(pane, &format!("{}[{}]", panes_path, i)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(LayoutNode::Split(SplitSpec {
            orientation,
            ratio,
            panes,
        }))
    }

    fn compile_weight(&self, value: &Value, path: &str) -> Result<WeightSpec, CompileError> {
        let invalid = |value: &Value| {
            self.error(
                CompileErrorKind::InvalidRatio {
                    value: value.to_string(),
                },
                path,
            )
        };

        match value {
            Value::Number(_) => positive_number(value)
                .map(|weight| WeightSpec::Weight { weight })
                .ok_or_else(|| invalid(value)),
            Value::Object(obj) => {
                let kind = self.optional_string(obj, &["kind"], path)?;
                match (obj.get("weight"), obj.get("cells")) {
                    (Some(_), Some(_)) => Err(invalid(value)),
                    (Some(weight), None) => {
                        self.expect_kind(kind.as_deref(), "weight", path)?;
                        positive_number(weight)
                            .map(|weight| WeightSpec::Weight { weight })
                            .ok_or_else(|| invalid(weight))
                    }
                    (None, Some(cells)) => {
                        self.expect_kind(kind.as_deref(), "fixed-cells", path)?;
                        cells
                            .as_u64()
                            .filter(|c| *c > 0)
                            .and_then(|c| u32::try_from(c).ok())
                            .map(|cells| WeightSpec::FixedCells { cells })
                            .ok_or_else(|| invalid(cells))
                    }
                    (None, None) => Err(self.error(
                        CompileErrorKind::MissingField,
                        format!("{}.weight", path),
                    )),
                }
            }
            _ => Err(self.error(
                CompileErrorKind::InvalidType {
                    expected: "a number or a { weight } / { cells } table",
                },
                path,
            )),
        }
    }

    fn expect_kind(&self, kind: Option<&str>, expected: &str, path: &str) -> Result<(), CompileError> {
        match kind {
            Some(found) if found != expected => Err(self.error(
                CompileErrorKind::InvalidValue {
                    value: found.to_string(),
                    expected: format!("kind must be '{}' for this entry", expected),
                },
                format!("{}.kind", path),
            )),
            _ => Ok(()),
        }
    }

    fn compile_terminal(&self, obj: &Object, path: &str) -> Result<TerminalSpec, CompileError> {
        let name = self
            .optional_string(obj, &["name"], path)?
            .ok_or_else(|| self.error(CompileErrorKind::MissingField, format!("{}.name", path)))?;
        if name.trim().is_empty() {
            return Err(self.error(CompileErrorKind::EmptyValue, format!("{}.name", path)));
        }

        let delay_ms = match obj.get("delay") {
            Some(value) => Some(value.as_u64().ok_or_else(|| {
                self.error(
                    CompileErrorKind::InvalidType {
                        expected: "a non-negative integer of milliseconds",
                    },
                    format!("{}.delay", path),
                )
            })?),
            None => None,
        };

        Ok(TerminalSpec {
            name,
            command: self.optional_string(obj, &["command"], path)?,
            cwd: self.optional_string(obj, &["cwd"], path)?,
            env: self.compile_env(obj, path)?,
            focus: self.optional_bool(obj, &["focus"], path)?.unwrap_or(false),
            delay_ms,
            title: self.optional_string(obj, &["title"], path)?,
            ephemeral: self.optional_bool(obj, &["ephemeral"], path)?.unwrap_or(false),
            close_on_error: self
                .optional_bool(obj, &["close_on_error", "closeOnError"], path)?
                .unwrap_or(false),
        })
    }

    fn compile_env(&self, obj: &Object, path: &str) -> Result<BTreeMap<String, String>, CompileError> {
        let env_path = format!("{}.env", path);
        let table = match obj.get("env") {
            None => return Ok(BTreeMap::new()),
            Some(Value::Object(table)) => table,
            Some(_) => {
                return Err(self.error(
                    CompileErrorKind::InvalidType {
                        expected: "a table of environment variables",
                    },
                    env_path,
                ));
            }
        };

        table
            .iter()
            .map(|(key, value)| {
                let rendered = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => {
                        return Err(self.error(
                            CompileErrorKind::InvalidType {
                                expected: "a string, number or boolean",
                            },
                            format!("{}.{}", env_path, key),
                        ));
                    }
                };
                Ok((key.clone(), rendered))
            })
            .collect()
    }

    fn table<'v>(&self, value: &'v Value, path: &str) -> Result<&'v Object, CompileError> {
        value
            .as_object()
            .ok_or_else(|| self.error(CompileErrorKind::NotATable, path))
    }

    /// Read the first present alias as a string.
    fn optional_string(
        &self,
        obj: &Object,
        names: &[&'static str],
        path: &str,
    ) -> Result<Option<String>, CompileError> {
        match lookup(obj, names) {
            None => Ok(None),
            Some((_, Value::String(s))) => Ok(Some(s.clone())),
            Some((name, _)) => Err(self.error(
                CompileErrorKind::InvalidType {
                    expected: "a string",
                },
                format!("{}.{}", path, name),
            )),
        }
    }

    fn optional_bool(
        &self,
        obj: &Object,
        names: &[&'static str],
        path: &str,
    ) -> Result<Option<bool>, CompileError> {
        match lookup(obj, names) {
            None => Ok(None),
            Some((_, Value::Bool(b))) => Ok(Some(*b)),
            Some((name, _)) => Err(self.error(
                CompileErrorKind::InvalidType {
                    expected: "a boolean",
                },
                format!("{}.{}", path, name),
            )),
        }
    }
}

fn lookup<'v>(obj: &'v Object, names: &[&'static str]) -> Option<(&'static str, &'v Value)> {
    names
        .iter()
        .find_map(|name| obj.get(*name).map(|value| (*name, value)))
}

fn positive_number(value: &Value) -> Option<f64> {
    value.as_f64().filter(|v| v.is_finite() && *v > 0.0)
}
