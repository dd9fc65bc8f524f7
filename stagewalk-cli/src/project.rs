use std::path::{Path, PathBuf};

use anyhow::Context;
use stagewalk_core::{SessionConfig, StageDef, BUILTIN_STAGES};

/// Where a stage definition came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOrigin {
    Builtin,
    File(PathBuf),
}

/// Resolve a stage argument: an existing file wins over a built-in name.
pub fn load_stage(arg: &str) -> anyhow::Result<(StageDef, StageOrigin)> {
    let path = Path::new(arg);
    if path.is_file() {
        let stage = load_stage_file(path)?;
        return Ok((stage, StageOrigin::File(path.to_path_buf())));
    }
    if arg.ends_with(".toml") {
        anyhow::bail!("stage file {} does not exist", path.display());
    }
    let stage = StageDef::builtin(arg).with_context(|| {
        format!("'{arg}' is neither a stage file nor one of: {}", BUILTIN_STAGES.join(", "))
    })?;
    Ok((stage, StageOrigin::Builtin))
}

pub fn load_stage_file(path: &Path) -> anyhow::Result<StageDef> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let mut stage = StageDef::from_toml(&content)
        .with_context(|| format!("parsing {}", path.display()))?;
    if stage.name.is_empty() {
        if let Some(stem) = path.file_stem() {
            stage.name = stem.to_string_lossy().into_owned();
        }
    }
    Ok(stage)
}

/// Find `.stagewalk/config.toml` starting at `start` and walking up.
pub fn find_config_from(start: &Path) -> anyhow::Result<Option<(PathBuf, SessionConfig)>> {
    let mut dir = start.to_path_buf();
    loop {
        let config_path = dir.join(".stagewalk").join("config.toml");
        if config_path.is_file() {
            let config = load_config(&config_path)?;
            return Ok(Some((config_path, config)));
        }
        if !dir.pop() {
            return Ok(None);
        }
    }
}

pub fn load_config(path: &Path) -> anyhow::Result<SessionConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    SessionConfig::from_toml(&content).with_context(|| format!("parsing {}", path.display()))
}

/// An explicit `--config` path, else the nearest project config, else defaults.
pub fn resolve_config(explicit: Option<&Path>) -> anyhow::Result<SessionConfig> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    match find_config_from(&std::env::current_dir()?)? {
        Some((path, config)) => {
            log::info!("using config {}", path.display());
            Ok(config)
        }
        None => Ok(SessionConfig::default()),
    }
}
