use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;
use stagewalk_core::FrameStats;

// ─── Run Report ─────────────────────────────────────────────────────

/// Totals gathered over a headless run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub stage: String,
    pub started_at: String,
    pub frames: u64,
    pub simulated_seconds: f64,
    pub substeps: u64,
    pub spawned: u64,
    pub retired: u64,
    pub notes: u64,
    pub peak_particles: usize,
    pub models_loaded: u64,
    /// Particles still alive when the session ended.
    pub retired_at_end: usize,
    pub notes_by_sound: BTreeMap<String, u64>,
    /// Notes per piano key, keyed by the key's note name.
    pub notes_by_key: BTreeMap<String, u64>,
}

impl RunReport {
    pub fn new(stage: &str, started_at: chrono::DateTime<chrono::Local>) -> Self {
        Self {
            stage: stage.to_string(),
            started_at: started_at.to_rfc3339(),
            ..Self::default()
        }
    }

    pub fn record(&mut self, delta: f32, stats: &FrameStats) {
        self.frames += 1;
        self.simulated_seconds += delta as f64;
        self.substeps += stats.substeps as u64;
        self.spawned += stats.spawned as u64;
        self.retired += stats.retired as u64;
        self.notes += stats.plays as u64;
        self.models_loaded += stats.models_loaded as u64;
        self.peak_particles = self.peak_particles.max(stats.live_particles);
        for key in &stats.keys_played {
            *self.notes_by_key.entry(key.clone()).or_default() += 1;
        }
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "stage        {}", self.stage);
        let _ = writeln!(out, "frames       {} ({:.2}s simulated)", self.frames, self.simulated_seconds);
        let _ = writeln!(out, "substeps     {}", self.substeps);
        let _ = writeln!(out, "models       {}", self.models_loaded);
        let _ = writeln!(
            out,
            "particles    {} spawned, {} retired, {} peak, {} at end",
            self.spawned, self.retired, self.peak_particles, self.retired_at_end
        );
        let _ = writeln!(out, "notes        {}", self.notes);
        for (sound, count) in &self.notes_by_sound {
            let _ = writeln!(out, "  {count:>5}  {sound}");
        }
        if !self.notes_by_key.is_empty() {
            let keys: Vec<String> = self
                .notes_by_key
                .iter()
                .map(|(key, count)| format!("{key}={count}"))
                .collect();
            let _ = writeln!(out, "keys         {}", keys.join(" "));
        }
        out
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
