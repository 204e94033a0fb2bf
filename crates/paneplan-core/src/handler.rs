//! Pipeline entry points used by the CLI: compile → plan → emit, then preview or apply.

use paneplan_config::{BackendKind, PaneplanConfig, WindowMode};
use tracing::{info, warn};

use crate::backends::{Backend, CommandRunner};
use crate::errors::{LayoutError, PaneplanError};
use crate::executor::{DryRunStep, ExecutionOptions, ExecutionResult};
use crate::plan::{LayoutPlan, PlanEmission, create_layout_plan, emit_plan};
use crate::preset::{CompiledPreset, compile_preset_from_value};
use crate::selection::{resolve_backend, resolve_window_mode};

/// A preset taken through every pure stage of the pipeline.
#[derive(Debug, Clone)]
pub struct PreparedLayout {
    pub preset: CompiledPreset,
    pub plan: LayoutPlan,
    pub emission: PlanEmission,
}

/// What to apply and how; `None` fields fall back to the preset, then config defaults.
#[derive(Debug, Clone, Default)]
pub struct ApplyRequest {
    pub preset_key: String,
    pub backend: Option<BackendKind>,
    pub window_mode: Option<WindowMode>,
    pub window_name: Option<String>,
}

impl ApplyRequest {
    pub fn new(preset_key: impl Into<String>) -> Self {
        Self {
            preset_key: preset_key.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Preview {
    pub backend: BackendKind,
    pub window_mode: WindowMode,
    pub prepared: PreparedLayout,
    pub steps: Vec<DryRunStep>,
}

#[derive(Debug, Clone)]
pub struct Applied {
    pub backend: BackendKind,
    pub window_mode: WindowMode,
    pub hash: String,
    pub result: ExecutionResult,
}

/// Compile, plan and emit one preset.
pub fn prepare_emission(config: &PaneplanConfig, key: &str) -> Result<PreparedLayout, LayoutError> {
    let raw = config.preset(key)?;
    let preset = compile_preset_from_value(key, raw, config.preset_source(key))?;
    let plan = create_layout_plan(&preset)?;
    let emission = emit_plan(&plan)?;

    info!(
        event = "core.handler.prepare_completed",
        preset = key,
        steps = emission.steps.len(),
        terminals = emission.terminals.len(),
        hash = %emission.hash
    );

    Ok(PreparedLayout {
        preset,
        plan,
        emission,
    })
}

/// Prepare every preset in key order, collecting failures instead of stopping at the first.
pub fn prepare_all(config: &PaneplanConfig) -> Vec<(String, Result<PreparedLayout, LayoutError>)> {
    config
        .preset_keys()
        .into_iter()
        .map(|key| {
            let result = prepare_emission(config, &key);
            if let Err(e) = &result {
                warn!(
                    event = "core.handler.prepare_failed",
                    preset = %key,
                    error = %e,
                    error_code = e.error_code()
                );
            }
            (key, result)
        })
        .collect()
}

/// Render the commands `apply` would run, without changing any multiplexer state.
pub fn preview<R: CommandRunner>(
    config: &PaneplanConfig,
    request: &ApplyRequest,
    runner: R,
    options: &ExecutionOptions<'_>,
) -> Result<Preview, LayoutError> {
    let prepared = prepare_emission(config, &request.preset_key)?;
    let (backend_kind, window_mode) = select(config, request, &prepared.preset);
    let backend = Backend::new(backend_kind, runner);
    let steps = backend.get_dry_run_steps(&prepared.emission, options)?;

    info!(
        event = "core.handler.preview_completed",
        preset = %request.preset_key,
        backend = %backend_kind,
        steps = steps.len()
    );

    Ok(Preview {
        backend: backend_kind,
        window_mode,
        prepared,
        steps,
    })
}

/// Build the preset's layout in a live multiplexer.
pub fn apply<R: CommandRunner>(
    config: &PaneplanConfig,
    request: &ApplyRequest,
    runner: R,
    options: &ExecutionOptions<'_>,
) -> Result<Applied, LayoutError> {
    let prepared = prepare_emission(config, &request.preset_key)?;
    let (backend_kind, window_mode) = select(config, request, &prepared.preset);
    let backend = Backend::new(backend_kind, runner);

    let window_name = request
        .window_name
        .as_deref()
        .unwrap_or(prepared.preset.name.as_str());
    let result = backend.apply_plan(&prepared.emission, window_mode, Some(window_name), options)?;

    Ok(Applied {
        backend: backend_kind,
        window_mode,
        hash: prepared.emission.hash,
        result,
    })
}

fn select(
    config: &PaneplanConfig,
    request: &ApplyRequest,
    preset: &CompiledPreset,
) -> (BackendKind, WindowMode) {
    (
        resolve_backend(request.backend, preset.backend, &config.defaults),
        resolve_window_mode(request.window_mode, preset.window_mode, &config.defaults),
    )
}
