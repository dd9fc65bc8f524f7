use std::collections::BTreeMap;
use std::path::PathBuf;

use stagewalk_core::{AudioError, AudioSink, ImmediateModels, PlayerInput, Session, SoundId};

use crate::project::{load_stage, resolve_config};
use crate::report::RunReport;

/// Sink that counts notes instead of playing them.
#[derive(Debug, Default)]
pub struct CountingSink {
    pub counts: BTreeMap<SoundId, u64>,
}

impl AudioSink for CountingSink {
    fn play(&mut self, sound: &SoundId) -> Result<(), AudioError> {
        *self.counts.entry(sound.clone()).or_default() += 1;
        Ok(())
    }
}

pub struct RunOptions {
    pub stage: String,
    pub seconds: f32,
    pub fps: f32,
    pub walk: bool,
    pub config: Option<PathBuf>,
    pub seed: Option<u64>,
    pub report: Option<PathBuf>,
}

/// Build the stage and step it at a fixed frame rate.
pub fn simulate(opts: &RunOptions) -> anyhow::Result<RunReport> {
    if opts.fps <= 0.0 {
        anyhow::bail!("--fps must be positive, got {}", opts.fps);
    }
    let (stage, origin) = load_stage(&opts.stage)?;
    log::debug!("stage {} from {origin:?}", stage.name);

    let mut config = resolve_config(opts.config.as_deref())?;
    if let Some(seed) = opts.seed {
        config.seed = seed;
    }

    let mut session = Session::new(config);
    stage.build(&mut session, &mut ImmediateModels::default())?;

    let input = PlayerInput {
        forward: opts.walk,
        pointer_locked: opts.walk,
        ..PlayerInput::default()
    };
    let delta = 1.0 / opts.fps;
    let frames = (opts.seconds.max(0.0) * opts.fps).round() as u64;

    let mut sink = CountingSink::default();
    let mut report = RunReport::new(&stage.name, chrono::Local::now());
    for _ in 0..frames {
        let stats = session.frame(delta, &input, &mut sink);
        report.record(delta, &stats);
    }
    report.retired_at_end = session.end();
    report.notes_by_sound = sink
        .counts
        .into_iter()
        .map(|(sound, count)| (sound.0, count))
        .collect();
    Ok(report)
}

pub fn run(opts: RunOptions) -> anyhow::Result<()> {
    let report = simulate(&opts)?;
    print!("{}", report.to_text());
    if let Some(path) = &opts.report {
        std::fs::write(path, report.to_toml()?)?;
        log::info!("report written to {}", path.display());
    }
    Ok(())
}
